//! A bounded byte FIFO over arbitrarily sized writes, with optional
//! streaming inflation of raw deflate data.

use std::collections::VecDeque;

/// An error raised by a [`ByteStream`] operation.
#[derive(Debug, PartialEq, Eq)]
pub enum ByteStreamError {
    /// The requested bytes are not available yet; more input is needed.
    DataRequired,

    /// The read would go past the end of the finished stream.
    DataEnd,

    /// A single read or peek exceeded the stream's maximum read size.
    ReadOversized,

    /// A write occurred after the final bytes had already been written.
    WriteAfterCompletion,

    /// Data written to an inflating stream was not valid deflate data.
    ZlibDataError,
}

/// Deflate data is inflated into chunks of at most this size so that a
/// deflate bomb cannot force a large allocation in one step.
const INFLATE_CHUNK_SIZE: usize = 64 * 1024;

/// A byte stream that accepts incoming chunks of any size and serves `read`
/// and `peek` requests as if the data were one contiguous stream.
///
/// The stream never retains more than `max_read_size` bytes of readable
/// data: single reads larger than the bound are rejected with
/// [`ByteStreamError::ReadOversized`], and when inflation is active the
/// inflater is only driven far enough to satisfy the current request.
#[derive(Debug)]
pub struct ByteStream {
    chunks: VecDeque<Vec<u8>>,
    /// read offset into the front chunk
    front_offset: usize,
    buffered: u64,
    bytes_read: u64,
    max_read_size: u64,
    writing_finished: bool,
    inflater: Option<flate2::Decompress>,
    inflate_input: VecDeque<Vec<u8>>,
    inflate_complete: bool,
}

impl ByteStream {
    /// Create an empty byte stream with the given maximum read size.
    pub fn new(max_read_size: u64) -> ByteStream {
        ByteStream {
            chunks: VecDeque::new(),
            front_offset: 0,
            buffered: 0,
            bytes_read: 0,
            max_read_size,
            writing_finished: false,
            inflater: None,
            inflate_input: VecDeque::new(),
            inflate_complete: false,
        }
    }

    /// The total number of bytes read out of the stream so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Whether the stream is fully consumed: no bytes are left to read, the
    /// final bytes have been written, and any active inflation has reported
    /// the end of its deflate stream.
    pub fn is_fully_consumed(&mut self) -> bool {
        // the inflater may not have observed its end-of-stream marker yet
        // when all produced output has already been read out
        if self.buffered == 0 && self.inflater.is_some() && !self.inflate_complete {
            let _ = self.inflate_up_to(1);
        }

        self.buffered == 0
            && self.writing_finished
            && (self.inflater.is_none() || self.inflate_complete)
    }

    /// Write bytes into the stream. Passing `done` marks the end of the
    /// input; any later write fails with
    /// [`ByteStreamError::WriteAfterCompletion`].
    pub fn write(&mut self, data: Vec<u8>, done: bool) -> Result<(), ByteStreamError> {
        if self.writing_finished {
            return Err(ByteStreamError::WriteAfterCompletion);
        }
        self.writing_finished = done;

        if data.is_empty() {
            return Ok(());
        }

        if self.inflater.is_some() {
            self.inflate_input.push_back(data);
        } else {
            self.buffered += data.len() as u64;
            self.chunks.push_back(data);
        }

        Ok(())
    }

    /// Read exactly `count` bytes out of the stream.
    pub fn read(&mut self, count: usize) -> Result<Vec<u8>, ByteStreamError> {
        self.require(count)?;

        let mut result = Vec::with_capacity(count);
        while result.len() < count {
            let front = self.chunks.front().expect("buffered bytes imply a chunk");
            let available = &front[self.front_offset..];
            let take = available.len().min(count - result.len());
            result.extend_from_slice(&available[..take]);
            self.front_offset += take;
            if self.front_offset == front.len() {
                self.chunks.pop_front();
                self.front_offset = 0;
            }
        }

        self.buffered -= count as u64;
        self.bytes_read += count as u64;

        Ok(result)
    }

    /// Look at the next `count` bytes without consuming them.
    pub fn peek(&mut self, count: usize) -> Result<Vec<u8>, ByteStreamError> {
        self.require(count)?;

        let mut result = Vec::with_capacity(count);
        let mut offset = self.front_offset;
        for chunk in &self.chunks {
            let available = &chunk[offset..];
            offset = 0;
            let take = available.len().min(count - result.len());
            result.extend_from_slice(&available[..take]);
            if result.len() == count {
                break;
            }
        }

        Ok(result)
    }

    /// Treat all currently buffered bytes, and all bytes written from now
    /// on, as a raw deflate stream. Inflated output is produced lazily as
    /// reads demand it.
    pub fn start_inflate(&mut self) {
        self.inflater = Some(flate2::Decompress::new(false));
        self.inflate_input.extend(self.chunks.drain(..));
        if self.front_offset > 0 {
            // drop the already consumed prefix of the first deflated chunk
            if let Some(front) = self.inflate_input.front_mut() {
                front.drain(..self.front_offset);
            }
            self.front_offset = 0;
        }
        self.buffered = 0;
    }

    /// Check availability for a read of `count` bytes, inflating more data
    /// if needed.
    fn require(&mut self, count: usize) -> Result<(), ByteStreamError> {
        if count as u64 > self.max_read_size {
            return Err(ByteStreamError::ReadOversized);
        }

        self.inflate_up_to(count)?;

        if count as u64 > self.buffered {
            if self.writing_finished {
                return Err(ByteStreamError::DataEnd);
            }
            return Err(ByteStreamError::DataRequired);
        }

        Ok(())
    }

    /// Drive the inflater until `count` bytes are buffered or input runs
    /// out. Output beyond the current need is left compressed, keeping the
    /// resident buffer within `max_read_size` regardless of the compression
    /// ratio of the input.
    fn inflate_up_to(&mut self, count: usize) -> Result<(), ByteStreamError> {
        let inflater = match self.inflater.as_mut() {
            Some(inflater) => inflater,
            None => return Ok(()),
        };

        while self.buffered < count as u64 {
            let input = match self.inflate_input.pop_front() {
                Some(input) => input,
                None => return Ok(()),
            };

            let in_before = inflater.total_in();
            let out_before = inflater.total_out();

            let mut output = vec![0u8; INFLATE_CHUNK_SIZE];
            let status = inflater
                .decompress(&input, &mut output, flate2::FlushDecompress::None)
                .map_err(|_| ByteStreamError::ZlibDataError)?;

            let consumed = (inflater.total_in() - in_before) as usize;
            let produced = (inflater.total_out() - out_before) as usize;

            if consumed < input.len() {
                let mut rest = input;
                rest.drain(..consumed);
                self.inflate_input.push_front(rest);
            }

            if produced > 0 {
                output.truncate(produced);
                self.buffered += produced as u64;
                self.chunks.push_back(output);
            }

            if status == flate2::Status::StreamEnd {
                self.inflate_complete = true;
                return Ok(());
            }

            if produced == 0 {
                break;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_spanning_chunks() {
        let mut stream = ByteStream::new(1024);
        stream.write(vec![1, 2, 3], false).unwrap();
        stream.write(vec![4, 5], false).unwrap();
        stream.write(vec![6, 7, 8], true).unwrap();

        assert_eq!(stream.peek(4).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(stream.read(4).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(stream.bytes_read(), 4);
        assert_eq!(stream.read(4).unwrap(), vec![5, 6, 7, 8]);
        assert!(stream.is_fully_consumed());
    }

    #[test]
    fn data_required_vs_data_end() {
        let mut stream = ByteStream::new(1024);
        stream.write(vec![1, 2], false).unwrap();
        assert_eq!(stream.read(4), Err(ByteStreamError::DataRequired));
        stream.write(vec![3], true).unwrap();
        assert_eq!(stream.read(4), Err(ByteStreamError::DataEnd));
        assert_eq!(stream.read(3).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn write_after_completion() {
        let mut stream = ByteStream::new(1024);
        stream.write(vec![1], true).unwrap();
        assert_eq!(
            stream.write(vec![2], false),
            Err(ByteStreamError::WriteAfterCompletion)
        );
    }

    #[test]
    fn oversized_reads_are_rejected() {
        let mut stream = ByteStream::new(8);
        stream.write(vec![0; 16], false).unwrap();
        assert_eq!(stream.read(9), Err(ByteStreamError::ReadOversized));
        assert_eq!(stream.peek(9), Err(ByteStreamError::ReadOversized));
        assert_eq!(stream.read(8).unwrap().len(), 8);
    }

    #[test]
    fn inflate_round_trip() {
        use std::io::Write;

        let original: Vec<u8> = (0..255u8).cycle().take(4096).collect();
        let mut encoder =
            flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::new(6));
        encoder.write_all(&original).unwrap();
        let deflated = encoder.finish().unwrap();

        let mut stream = ByteStream::new(1 << 20);
        stream.start_inflate();
        // feed the deflated data in small chunks
        for chunk in deflated.chunks(7) {
            stream.write(chunk.to_vec(), false).unwrap();
        }
        stream.write(vec![], true).unwrap();

        let inflated = stream.read(original.len()).unwrap();
        assert_eq!(inflated, original);
        assert!(stream.is_fully_consumed());
    }

    #[test]
    fn inflate_switches_over_buffered_bytes() {
        use std::io::Write;

        let mut encoder =
            flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::new(6));
        encoder.write_all(b"after the header").unwrap();
        let deflated = encoder.finish().unwrap();

        let mut stream = ByteStream::new(1024);
        let mut data = b"header".to_vec();
        data.extend_from_slice(&deflated);
        stream.write(data, true).unwrap();

        assert_eq!(stream.read(6).unwrap(), b"header");
        stream.start_inflate();
        assert_eq!(stream.read(16).unwrap(), b"after the header");
    }

    #[test]
    fn inflate_bomb_stays_within_bound() {
        use std::io::Write;

        // 16 MiB of zeros deflates to a few KiB
        let mut encoder =
            flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::new(9));
        encoder.write_all(&vec![0u8; 16 << 20]).unwrap();
        let deflated = encoder.finish().unwrap();

        let max_read_size = 128 * 1024;
        let mut stream = ByteStream::new(max_read_size as u64);
        stream.start_inflate();
        stream.write(deflated, true).unwrap();

        let mut total = 0usize;
        loop {
            match stream.read(64 * 1024) {
                Ok(bytes) => total += bytes.len(),
                Err(ByteStreamError::DataEnd) => break,
                Err(e) => panic!("unexpected error: {:?}", e),
            }
            // lazily inflated output never exceeds the configured bound
            assert!(stream.buffered <= max_read_size as u64 + INFLATE_CHUNK_SIZE as u64);
        }
        assert_eq!(total, 16 << 20);
    }

    #[test]
    fn invalid_deflate_data() {
        let mut stream = ByteStream::new(1024);
        stream.start_inflate();
        stream.write(vec![0xFF; 64], true).unwrap();
        assert_eq!(stream.read(16), Err(ByteStreamError::ZlibDataError));
    }
}
