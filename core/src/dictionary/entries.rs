//! The static attribute table backing the dictionary.

use super::Entry;
use crate::tag::Tag;
use crate::vr::{ValueMultiplicity, VR};

const VM1: ValueMultiplicity = ValueMultiplicity { min: 1, max: Some(1) };
const VM2: ValueMultiplicity = ValueMultiplicity { min: 2, max: Some(2) };
const VM3: ValueMultiplicity = ValueMultiplicity { min: 3, max: Some(3) };
const VM6: ValueMultiplicity = ValueMultiplicity { min: 6, max: Some(6) };
const VM1N: ValueMultiplicity = ValueMultiplicity { min: 1, max: None };
const VM2N: ValueMultiplicity = ValueMultiplicity { min: 2, max: None };

macro_rules! e {
    ($g:literal, $el:literal, $vr:ident, $vm:ident, $kw:literal, $name:literal) => {
        Entry {
            tag: Tag($g, $el),
            keyword: $kw,
            name: $name,
            vr: VR::$vr,
            vm: $vm,
        }
    };
}

/// Dictionary entries in ascending tag order.
#[rustfmt::skip]
pub(crate) static ENTRIES: &[Entry] = &[
    e!(0x0002, 0x0000, UL, VM1, "FileMetaInformationGroupLength", "File Meta Information Group Length"),
    e!(0x0002, 0x0001, OB, VM1, "FileMetaInformationVersion", "File Meta Information Version"),
    e!(0x0002, 0x0002, UI, VM1, "MediaStorageSOPClassUID", "Media Storage SOP Class UID"),
    e!(0x0002, 0x0003, UI, VM1, "MediaStorageSOPInstanceUID", "Media Storage SOP Instance UID"),
    e!(0x0002, 0x0010, UI, VM1, "TransferSyntaxUID", "Transfer Syntax UID"),
    e!(0x0002, 0x0012, UI, VM1, "ImplementationClassUID", "Implementation Class UID"),
    e!(0x0002, 0x0013, SH, VM1, "ImplementationVersionName", "Implementation Version Name"),
    e!(0x0002, 0x0016, AE, VM1, "SourceApplicationEntityTitle", "Source Application Entity Title"),
    e!(0x0002, 0x0100, UI, VM1, "PrivateInformationCreatorUID", "Private Information Creator UID"),
    e!(0x0002, 0x0102, OB, VM1, "PrivateInformation", "Private Information"),
    e!(0x0008, 0x0005, CS, VM1N, "SpecificCharacterSet", "Specific Character Set"),
    e!(0x0008, 0x0008, CS, VM2N, "ImageType", "Image Type"),
    e!(0x0008, 0x0016, UI, VM1, "SOPClassUID", "SOP Class UID"),
    e!(0x0008, 0x0018, UI, VM1, "SOPInstanceUID", "SOP Instance UID"),
    e!(0x0008, 0x0020, DA, VM1, "StudyDate", "Study Date"),
    e!(0x0008, 0x0021, DA, VM1, "SeriesDate", "Series Date"),
    e!(0x0008, 0x0022, DA, VM1, "AcquisitionDate", "Acquisition Date"),
    e!(0x0008, 0x0023, DA, VM1, "ContentDate", "Content Date"),
    e!(0x0008, 0x0030, TM, VM1, "StudyTime", "Study Time"),
    e!(0x0008, 0x0031, TM, VM1, "SeriesTime", "Series Time"),
    e!(0x0008, 0x0032, TM, VM1, "AcquisitionTime", "Acquisition Time"),
    e!(0x0008, 0x0033, TM, VM1, "ContentTime", "Content Time"),
    e!(0x0008, 0x0050, SH, VM1, "AccessionNumber", "Accession Number"),
    e!(0x0008, 0x0060, CS, VM1, "Modality", "Modality"),
    e!(0x0008, 0x0064, CS, VM1, "ConversionType", "Conversion Type"),
    e!(0x0008, 0x0070, LO, VM1, "Manufacturer", "Manufacturer"),
    e!(0x0008, 0x0080, LO, VM1, "InstitutionName", "Institution Name"),
    e!(0x0008, 0x0081, ST, VM1, "InstitutionAddress", "Institution Address"),
    e!(0x0008, 0x0090, PN, VM1, "ReferringPhysicianName", "Referring Physician's Name"),
    e!(0x0008, 0x0100, SH, VM1, "CodeValue", "Code Value"),
    e!(0x0008, 0x0102, SH, VM1, "CodingSchemeDesignator", "Coding Scheme Designator"),
    e!(0x0008, 0x0104, LO, VM1, "CodeMeaning", "Code Meaning"),
    e!(0x0008, 0x1010, SH, VM1, "StationName", "Station Name"),
    e!(0x0008, 0x1030, LO, VM1, "StudyDescription", "Study Description"),
    e!(0x0008, 0x103E, LO, VM1, "SeriesDescription", "Series Description"),
    e!(0x0008, 0x1040, LO, VM1, "InstitutionalDepartmentName", "Institutional Department Name"),
    e!(0x0008, 0x1048, PN, VM1N, "PhysiciansOfRecord", "Physician(s) of Record"),
    e!(0x0008, 0x1050, PN, VM1N, "PerformingPhysicianName", "Performing Physician's Name"),
    e!(0x0008, 0x1060, PN, VM1N, "NameOfPhysiciansReadingStudy", "Name of Physician(s) Reading Study"),
    e!(0x0008, 0x1070, PN, VM1N, "OperatorsName", "Operators' Name"),
    e!(0x0008, 0x1080, LO, VM1N, "AdmittingDiagnosesDescription", "Admitting Diagnoses Description"),
    e!(0x0008, 0x1090, LO, VM1, "ManufacturerModelName", "Manufacturer's Model Name"),
    e!(0x0008, 0x1110, SQ, VM1, "ReferencedStudySequence", "Referenced Study Sequence"),
    e!(0x0008, 0x1111, SQ, VM1, "ReferencedPerformedProcedureStepSequence", "Referenced Performed Procedure Step Sequence"),
    e!(0x0008, 0x1115, SQ, VM1, "ReferencedSeriesSequence", "Referenced Series Sequence"),
    e!(0x0008, 0x1140, SQ, VM1, "ReferencedImageSequence", "Referenced Image Sequence"),
    e!(0x0008, 0x1150, UI, VM1, "ReferencedSOPClassUID", "Referenced SOP Class UID"),
    e!(0x0008, 0x1155, UI, VM1, "ReferencedSOPInstanceUID", "Referenced SOP Instance UID"),
    e!(0x0008, 0x2111, ST, VM1, "DerivationDescription", "Derivation Description"),
    e!(0x0008, 0x2218, SQ, VM1, "AnatomicRegionSequence", "Anatomic Region Sequence"),
    e!(0x0008, 0x9215, SQ, VM1, "DerivationCodeSequence", "Derivation Code Sequence"),
    e!(0x0010, 0x0010, PN, VM1, "PatientName", "Patient's Name"),
    e!(0x0010, 0x0020, LO, VM1, "PatientID", "Patient ID"),
    e!(0x0010, 0x0021, LO, VM1, "IssuerOfPatientID", "Issuer of Patient ID"),
    e!(0x0010, 0x0030, DA, VM1, "PatientBirthDate", "Patient's Birth Date"),
    e!(0x0010, 0x0032, TM, VM1, "PatientBirthTime", "Patient's Birth Time"),
    e!(0x0010, 0x0040, CS, VM1, "PatientSex", "Patient's Sex"),
    e!(0x0010, 0x1000, LO, VM1N, "OtherPatientIDs", "Other Patient IDs"),
    e!(0x0010, 0x1001, PN, VM1N, "OtherPatientNames", "Other Patient Names"),
    e!(0x0010, 0x1010, AS, VM1, "PatientAge", "Patient's Age"),
    e!(0x0010, 0x1020, DS, VM1, "PatientSize", "Patient's Size"),
    e!(0x0010, 0x1030, DS, VM1, "PatientWeight", "Patient's Weight"),
    e!(0x0010, 0x1040, LO, VM1, "PatientAddress", "Patient's Address"),
    e!(0x0010, 0x2154, SH, VM1N, "PatientTelephoneNumbers", "Patient's Telephone Numbers"),
    e!(0x0010, 0x2160, SH, VM1, "EthnicGroup", "Ethnic Group"),
    e!(0x0010, 0x21B0, LT, VM1, "AdditionalPatientHistory", "Additional Patient History"),
    e!(0x0010, 0x4000, LT, VM1, "PatientComments", "Patient Comments"),
    e!(0x0018, 0x0010, LO, VM1, "ContrastBolusAgent", "Contrast/Bolus Agent"),
    e!(0x0018, 0x0015, CS, VM1, "BodyPartExamined", "Body Part Examined"),
    e!(0x0018, 0x0020, CS, VM1N, "ScanningSequence", "Scanning Sequence"),
    e!(0x0018, 0x0021, CS, VM1N, "SequenceVariant", "Sequence Variant"),
    e!(0x0018, 0x0022, CS, VM1N, "ScanOptions", "Scan Options"),
    e!(0x0018, 0x0023, CS, VM1, "MRAcquisitionType", "MR Acquisition Type"),
    e!(0x0018, 0x0050, DS, VM1, "SliceThickness", "Slice Thickness"),
    e!(0x0018, 0x0060, DS, VM1, "KVP", "KVP"),
    e!(0x0018, 0x0080, DS, VM1, "RepetitionTime", "Repetition Time"),
    e!(0x0018, 0x0081, DS, VM1, "EchoTime", "Echo Time"),
    e!(0x0018, 0x0087, DS, VM1, "MagneticFieldStrength", "Magnetic Field Strength"),
    e!(0x0018, 0x0088, DS, VM1, "SpacingBetweenSlices", "Spacing Between Slices"),
    e!(0x0018, 0x1000, LO, VM1, "DeviceSerialNumber", "Device Serial Number"),
    e!(0x0018, 0x1020, LO, VM1N, "SoftwareVersions", "Software Versions"),
    e!(0x0018, 0x1030, LO, VM1, "ProtocolName", "Protocol Name"),
    e!(0x0018, 0x1050, DS, VM1, "SpatialResolution", "Spatial Resolution"),
    e!(0x0018, 0x1151, IS, VM1, "XRayTubeCurrent", "X-Ray Tube Current"),
    e!(0x0018, 0x1152, IS, VM1, "Exposure", "Exposure"),
    e!(0x0018, 0x5100, CS, VM1, "PatientPosition", "Patient Position"),
    e!(0x0018, 0x6011, SQ, VM1, "SequenceOfUltrasoundRegions", "Sequence of Ultrasound Regions"),
    e!(0x0018, 0x6012, US, VM1, "RegionSpatialFormat", "Region Spatial Format"),
    e!(0x0018, 0x6014, US, VM1, "RegionDataType", "Region Data Type"),
    e!(0x0020, 0x000D, UI, VM1, "StudyInstanceUID", "Study Instance UID"),
    e!(0x0020, 0x000E, UI, VM1, "SeriesInstanceUID", "Series Instance UID"),
    e!(0x0020, 0x0010, SH, VM1, "StudyID", "Study ID"),
    e!(0x0020, 0x0011, IS, VM1, "SeriesNumber", "Series Number"),
    e!(0x0020, 0x0012, IS, VM1, "AcquisitionNumber", "Acquisition Number"),
    e!(0x0020, 0x0013, IS, VM1, "InstanceNumber", "Instance Number"),
    e!(0x0020, 0x0020, CS, VM2, "PatientOrientation", "Patient Orientation"),
    e!(0x0020, 0x0032, DS, VM3, "ImagePositionPatient", "Image Position (Patient)"),
    e!(0x0020, 0x0037, DS, VM6, "ImageOrientationPatient", "Image Orientation (Patient)"),
    e!(0x0020, 0x0052, UI, VM1, "FrameOfReferenceUID", "Frame of Reference UID"),
    e!(0x0020, 0x1041, DS, VM1, "SliceLocation", "Slice Location"),
    e!(0x0020, 0x4000, LT, VM1, "ImageComments", "Image Comments"),
    e!(0x0028, 0x0002, US, VM1, "SamplesPerPixel", "Samples per Pixel"),
    e!(0x0028, 0x0004, CS, VM1, "PhotometricInterpretation", "Photometric Interpretation"),
    e!(0x0028, 0x0006, US, VM1, "PlanarConfiguration", "Planar Configuration"),
    e!(0x0028, 0x0008, IS, VM1, "NumberOfFrames", "Number of Frames"),
    e!(0x0028, 0x0010, US, VM1, "Rows", "Rows"),
    e!(0x0028, 0x0011, US, VM1, "Columns", "Columns"),
    e!(0x0028, 0x0030, DS, VM2, "PixelSpacing", "Pixel Spacing"),
    e!(0x0028, 0x0100, US, VM1, "BitsAllocated", "Bits Allocated"),
    e!(0x0028, 0x0101, US, VM1, "BitsStored", "Bits Stored"),
    e!(0x0028, 0x0102, US, VM1, "HighBit", "High Bit"),
    e!(0x0028, 0x0103, US, VM1, "PixelRepresentation", "Pixel Representation"),
    e!(0x0028, 0x0106, US, VM1, "SmallestImagePixelValue", "Smallest Image Pixel Value"),
    e!(0x0028, 0x0107, US, VM1, "LargestImagePixelValue", "Largest Image Pixel Value"),
    e!(0x0028, 0x1050, DS, VM1N, "WindowCenter", "Window Center"),
    e!(0x0028, 0x1051, DS, VM1N, "WindowWidth", "Window Width"),
    e!(0x0028, 0x1052, DS, VM1, "RescaleIntercept", "Rescale Intercept"),
    e!(0x0028, 0x1053, DS, VM1, "RescaleSlope", "Rescale Slope"),
    e!(0x0028, 0x1054, LO, VM1, "RescaleType", "Rescale Type"),
    e!(0x0028, 0x1101, US, VM3, "RedPaletteColorLookupTableDescriptor", "Red Palette Color Lookup Table Descriptor"),
    e!(0x0028, 0x1102, US, VM3, "GreenPaletteColorLookupTableDescriptor", "Green Palette Color Lookup Table Descriptor"),
    e!(0x0028, 0x1103, US, VM3, "BluePaletteColorLookupTableDescriptor", "Blue Palette Color Lookup Table Descriptor"),
    e!(0x0028, 0x1201, OW, VM1, "RedPaletteColorLookupTableData", "Red Palette Color Lookup Table Data"),
    e!(0x0028, 0x1202, OW, VM1, "GreenPaletteColorLookupTableData", "Green Palette Color Lookup Table Data"),
    e!(0x0028, 0x1203, OW, VM1, "BluePaletteColorLookupTableData", "Blue Palette Color Lookup Table Data"),
    e!(0x0028, 0x2110, CS, VM1, "LossyImageCompression", "Lossy Image Compression"),
    e!(0x0028, 0x2112, DS, VM1N, "LossyImageCompressionRatio", "Lossy Image Compression Ratio"),
    e!(0x0028, 0x3002, US, VM3, "LUTDescriptor", "LUT Descriptor"),
    e!(0x0028, 0x3003, LO, VM1, "LUTExplanation", "LUT Explanation"),
    e!(0x0028, 0x3006, OW, VM1, "LUTData", "LUT Data"),
    e!(0x0028, 0x3010, SQ, VM1, "VOILUTSequence", "VOI LUT Sequence"),
    e!(0x0032, 0x1032, PN, VM1, "RequestingPhysician", "Requesting Physician"),
    e!(0x0032, 0x1060, LO, VM1, "RequestedProcedureDescription", "Requested Procedure Description"),
    e!(0x0032, 0x4000, LT, VM1, "StudyComments", "Study Comments"),
    e!(0x0038, 0x0010, LO, VM1, "AdmissionID", "Admission ID"),
    e!(0x0038, 0x0300, LO, VM1, "CurrentPatientLocation", "Current Patient Location"),
    e!(0x0038, 0x0400, LO, VM1, "PatientInstitutionResidence", "Patient's Institution Residence"),
    e!(0x0038, 0x4000, LT, VM1, "VisitComments", "Visit Comments"),
    e!(0x0040, 0x0007, LO, VM1, "ScheduledProcedureStepDescription", "Scheduled Procedure Step Description"),
    e!(0x0040, 0x0254, LO, VM1, "PerformedProcedureStepDescription", "Performed Procedure Step Description"),
    e!(0x0040, 0x0275, SQ, VM1, "RequestAttributesSequence", "Request Attributes Sequence"),
    e!(0x0040, 0x0555, SQ, VM1, "AcquisitionContextSequence", "Acquisition Context Sequence"),
    e!(0x0040, 0x1001, SH, VM1, "RequestedProcedureID", "Requested Procedure ID"),
    e!(0x0040, 0xA124, UI, VM1, "UID", "UID"),
    e!(0x0040, 0xA730, SQ, VM1, "ContentSequence", "Content Sequence"),
    e!(0x2050, 0x0020, CS, VM1, "PresentationLUTShape", "Presentation LUT Shape"),
    e!(0x7FE0, 0x0008, OF, VM1, "FloatPixelData", "Float Pixel Data"),
    e!(0x7FE0, 0x0009, OD, VM1, "DoubleFloatPixelData", "Double Float Pixel Data"),
    e!(0x7FE0, 0x0010, OW, VM1, "PixelData", "Pixel Data"),
    e!(0xFFFC, 0xFFFC, OB, VM1, "DataSetTrailingPadding", "Data Set Trailing Padding"),
];
