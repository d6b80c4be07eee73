//! Composable transforms over part streams.
//!
//! Each transform is a state object fed one [`Part`](crate::Part) at a time,
//! producing the parts (or lines, for printing) that pass downstream.
//! Pipelines are plain composition: feed the output of one transform into
//! the next.

pub mod filter;
pub mod insert;
pub mod print;

pub use filter::{FilterTransform, LocationEntry};
pub use insert::InsertTransform;
pub use print::{PrintOptions, PrintTransform};
