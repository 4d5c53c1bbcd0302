//! Constants for the standard data elements used by this library,
//! plus a small table of well-known elements with their keywords and VRs.

use crate::header::{Tag, VR};

/// Item (FFFE,E000)
pub const ITEM: Tag = Tag(0xFFFE, 0xE000);
/// Item Delimitation Item (FFFE,E00D)
pub const ITEM_DELIMITATION_ITEM: Tag = Tag(0xFFFE, 0xE00D);
/// Sequence Delimitation Item (FFFE,E0DD)
pub const SEQUENCE_DELIMITATION_ITEM: Tag = Tag(0xFFFE, 0xE0DD);

/// Specific Character Set (0008,0005)
pub const SPECIFIC_CHARACTER_SET: Tag = Tag(0x0008, 0x0005);
/// Image Type (0008,0008)
pub const IMAGE_TYPE: Tag = Tag(0x0008, 0x0008);
/// Instance Creation Date (0008,0012)
pub const INSTANCE_CREATION_DATE: Tag = Tag(0x0008, 0x0012);
/// Instance Creation Time (0008,0013)
pub const INSTANCE_CREATION_TIME: Tag = Tag(0x0008, 0x0013);
/// SOP Class UID (0008,0016)
pub const SOP_CLASS_UID: Tag = Tag(0x0008, 0x0016);
/// SOP Instance UID (0008,0018)
pub const SOP_INSTANCE_UID: Tag = Tag(0x0008, 0x0018);
/// Study Date (0008,0020)
pub const STUDY_DATE: Tag = Tag(0x0008, 0x0020);
/// Series Date (0008,0021)
pub const SERIES_DATE: Tag = Tag(0x0008, 0x0021);
/// Content Date (0008,0023)
pub const CONTENT_DATE: Tag = Tag(0x0008, 0x0023);
/// Acquisition DateTime (0008,002A)
pub const ACQUISITION_DATE_TIME: Tag = Tag(0x0008, 0x002A);
/// Study Time (0008,0030)
pub const STUDY_TIME: Tag = Tag(0x0008, 0x0030);
/// Series Time (0008,0031)
pub const SERIES_TIME: Tag = Tag(0x0008, 0x0031);
/// Content Time (0008,0033)
pub const CONTENT_TIME: Tag = Tag(0x0008, 0x0033);
/// Accession Number (0008,0050)
pub const ACCESSION_NUMBER: Tag = Tag(0x0008, 0x0050);
/// Issuer of Accession Number Sequence (0008,0051)
pub const ISSUER_OF_ACCESSION_NUMBER_SEQUENCE: Tag = Tag(0x0008, 0x0051);
/// Query/Retrieve Level (0008,0052)
pub const QUERY_RETRIEVE_LEVEL: Tag = Tag(0x0008, 0x0052);
/// Modality (0008,0060)
pub const MODALITY: Tag = Tag(0x0008, 0x0060);
/// Manufacturer (0008,0070)
pub const MANUFACTURER: Tag = Tag(0x0008, 0x0070);
/// Institution Name (0008,0080)
pub const INSTITUTION_NAME: Tag = Tag(0x0008, 0x0080);
/// Referring Physician's Name (0008,0090)
pub const REFERRING_PHYSICIAN_NAME: Tag = Tag(0x0008, 0x0090);
/// Code Value (0008,0100)
pub const CODE_VALUE: Tag = Tag(0x0008, 0x0100);
/// Coding Scheme Designator (0008,0102)
pub const CODING_SCHEME_DESIGNATOR: Tag = Tag(0x0008, 0x0102);
/// Coding Scheme Version (0008,0103)
pub const CODING_SCHEME_VERSION: Tag = Tag(0x0008, 0x0103);
/// Code Meaning (0008,0104)
pub const CODE_MEANING: Tag = Tag(0x0008, 0x0104);
/// Long Code Value (0008,0119)
pub const LONG_CODE_VALUE: Tag = Tag(0x0008, 0x0119);
/// URN Code Value (0008,0120)
pub const URN_CODE_VALUE: Tag = Tag(0x0008, 0x0120);
/// Timezone Offset From UTC (0008,0201)
pub const TIMEZONE_OFFSET_FROM_UTC: Tag = Tag(0x0008, 0x0201);
/// Study Description (0008,1030)
pub const STUDY_DESCRIPTION: Tag = Tag(0x0008, 0x1030);
/// Procedure Code Sequence (0008,1032)
pub const PROCEDURE_CODE_SEQUENCE: Tag = Tag(0x0008, 0x1032);
/// Series Description (0008,103E)
pub const SERIES_DESCRIPTION: Tag = Tag(0x0008, 0x103E);
/// Referenced Study Sequence (0008,1110)
pub const REFERENCED_STUDY_SEQUENCE: Tag = Tag(0x0008, 0x1110);
/// Referenced Series Sequence (0008,1115)
pub const REFERENCED_SERIES_SEQUENCE: Tag = Tag(0x0008, 0x1115);
/// Referenced SOP Class UID (0008,1150)
pub const REFERENCED_SOP_CLASS_UID: Tag = Tag(0x0008, 0x1150);
/// Referenced SOP Instance UID (0008,1155)
pub const REFERENCED_SOP_INSTANCE_UID: Tag = Tag(0x0008, 0x1155);
/// Anatomic Region Sequence (0008,2218)
pub const ANATOMIC_REGION_SEQUENCE: Tag = Tag(0x0008, 0x2218);

/// Patient's Name (0010,0010)
pub const PATIENT_NAME: Tag = Tag(0x0010, 0x0010);
/// Patient ID (0010,0020)
pub const PATIENT_ID: Tag = Tag(0x0010, 0x0020);
/// Issuer of Patient ID (0010,0021)
pub const ISSUER_OF_PATIENT_ID: Tag = Tag(0x0010, 0x0021);
/// Type of Patient ID (0010,0022)
pub const TYPE_OF_PATIENT_ID: Tag = Tag(0x0010, 0x0022);
/// Issuer of Patient ID Qualifiers Sequence (0010,0024)
pub const ISSUER_OF_PATIENT_ID_QUALIFIERS_SEQUENCE: Tag = Tag(0x0010, 0x0024);
/// Patient's Birth Date (0010,0030)
pub const PATIENT_BIRTH_DATE: Tag = Tag(0x0010, 0x0030);
/// Patient's Birth Time (0010,0032)
pub const PATIENT_BIRTH_TIME: Tag = Tag(0x0010, 0x0032);
/// Patient's Sex (0010,0040)
pub const PATIENT_SEX: Tag = Tag(0x0010, 0x0040);
/// Other Patient IDs Sequence (0010,1002)
pub const OTHER_PATIENT_IDS_SEQUENCE: Tag = Tag(0x0010, 0x1002);
/// Patient's Age (0010,1010)
pub const PATIENT_AGE: Tag = Tag(0x0010, 0x1010);
/// Patient's Weight (0010,1030)
pub const PATIENT_WEIGHT: Tag = Tag(0x0010, 0x1030);

/// Slice Thickness (0018,0050)
pub const SLICE_THICKNESS: Tag = Tag(0x0018, 0x0050);

/// Study Instance UID (0020,000D)
pub const STUDY_INSTANCE_UID: Tag = Tag(0x0020, 0x000D);
/// Series Instance UID (0020,000E)
pub const SERIES_INSTANCE_UID: Tag = Tag(0x0020, 0x000E);
/// Study ID (0020,0010)
pub const STUDY_ID: Tag = Tag(0x0020, 0x0010);
/// Series Number (0020,0011)
pub const SERIES_NUMBER: Tag = Tag(0x0020, 0x0011);
/// Instance Number (0020,0013)
pub const INSTANCE_NUMBER: Tag = Tag(0x0020, 0x0013);
/// Image Position (Patient) (0020,0032)
pub const IMAGE_POSITION_PATIENT: Tag = Tag(0x0020, 0x0032);
/// Image Orientation (Patient) (0020,0037)
pub const IMAGE_ORIENTATION_PATIENT: Tag = Tag(0x0020, 0x0037);
/// Frame of Reference UID (0020,0052)
pub const FRAME_OF_REFERENCE_UID: Tag = Tag(0x0020, 0x0052);

/// Samples per Pixel (0028,0002)
pub const SAMPLES_PER_PIXEL: Tag = Tag(0x0028, 0x0002);
/// Photometric Interpretation (0028,0004)
pub const PHOTOMETRIC_INTERPRETATION: Tag = Tag(0x0028, 0x0004);
/// Number of Frames (0028,0008)
pub const NUMBER_OF_FRAMES: Tag = Tag(0x0028, 0x0008);
/// Frame Increment Pointer (0028,0009)
pub const FRAME_INCREMENT_POINTER: Tag = Tag(0x0028, 0x0009);
/// Rows (0028,0010)
pub const ROWS: Tag = Tag(0x0028, 0x0010);
/// Columns (0028,0011)
pub const COLUMNS: Tag = Tag(0x0028, 0x0011);
/// Pixel Spacing (0028,0030)
pub const PIXEL_SPACING: Tag = Tag(0x0028, 0x0030);
/// Bits Allocated (0028,0100)
pub const BITS_ALLOCATED: Tag = Tag(0x0028, 0x0100);
/// Bits Stored (0028,0101)
pub const BITS_STORED: Tag = Tag(0x0028, 0x0101);
/// Pixel Representation (0028,0103)
pub const PIXEL_REPRESENTATION: Tag = Tag(0x0028, 0x0103);
/// Window Center (0028,1050)
pub const WINDOW_CENTER: Tag = Tag(0x0028, 0x1050);
/// Window Width (0028,1051)
pub const WINDOW_WIDTH: Tag = Tag(0x0028, 0x1051);

/// Requested Procedure ID (0040,1001)
pub const REQUESTED_PROCEDURE_ID: Tag = Tag(0x0040, 0x1001);
/// Universal Entity ID (0040,0032)
pub const UNIVERSAL_ENTITY_ID: Tag = Tag(0x0040, 0x0032);
/// Universal Entity ID Type (0040,0033)
pub const UNIVERSAL_ENTITY_ID_TYPE: Tag = Tag(0x0040, 0x0033);
/// Local Namespace Entity ID (0040,0031)
pub const LOCAL_NAMESPACE_ENTITY_ID: Tag = Tag(0x0040, 0x0031);
/// Identifier Type Code (0040,0035)
pub const IDENTIFIER_TYPE_CODE: Tag = Tag(0x0040, 0x0035);
/// Scheduled Procedure Step Sequence (0040,0100)
pub const SCHEDULED_PROCEDURE_STEP_SEQUENCE: Tag = Tag(0x0040, 0x0100);
/// Request Attributes Sequence (0040,0275)
pub const REQUEST_ATTRIBUTES_SEQUENCE: Tag = Tag(0x0040, 0x0275);
/// Concept Name Code Sequence (0040,A043)
pub const CONCEPT_NAME_CODE_SEQUENCE: Tag = Tag(0x0040, 0xA043);
/// Content Sequence (0040,A730)
pub const CONTENT_SEQUENCE: Tag = Tag(0x0040, 0xA730);

/// Pixel Data (7FE0,0010)
pub const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);

/// Well-known elements with their keyword and VR.
pub(crate) const ENTRIES: &[(Tag, &str, VR)] = &[
    (SPECIFIC_CHARACTER_SET, "SpecificCharacterSet", VR::CS),
    (IMAGE_TYPE, "ImageType", VR::CS),
    (INSTANCE_CREATION_DATE, "InstanceCreationDate", VR::DA),
    (INSTANCE_CREATION_TIME, "InstanceCreationTime", VR::TM),
    (SOP_CLASS_UID, "SOPClassUID", VR::UI),
    (SOP_INSTANCE_UID, "SOPInstanceUID", VR::UI),
    (STUDY_DATE, "StudyDate", VR::DA),
    (SERIES_DATE, "SeriesDate", VR::DA),
    (CONTENT_DATE, "ContentDate", VR::DA),
    (ACQUISITION_DATE_TIME, "AcquisitionDateTime", VR::DT),
    (STUDY_TIME, "StudyTime", VR::TM),
    (SERIES_TIME, "SeriesTime", VR::TM),
    (CONTENT_TIME, "ContentTime", VR::TM),
    (ACCESSION_NUMBER, "AccessionNumber", VR::SH),
    (ISSUER_OF_ACCESSION_NUMBER_SEQUENCE, "IssuerOfAccessionNumberSequence", VR::SQ),
    (QUERY_RETRIEVE_LEVEL, "QueryRetrieveLevel", VR::CS),
    (MODALITY, "Modality", VR::CS),
    (MANUFACTURER, "Manufacturer", VR::LO),
    (INSTITUTION_NAME, "InstitutionName", VR::LO),
    (REFERRING_PHYSICIAN_NAME, "ReferringPhysicianName", VR::PN),
    (CODE_VALUE, "CodeValue", VR::SH),
    (CODING_SCHEME_DESIGNATOR, "CodingSchemeDesignator", VR::SH),
    (CODING_SCHEME_VERSION, "CodingSchemeVersion", VR::SH),
    (CODE_MEANING, "CodeMeaning", VR::LO),
    (LONG_CODE_VALUE, "LongCodeValue", VR::UC),
    (URN_CODE_VALUE, "URNCodeValue", VR::UR),
    (TIMEZONE_OFFSET_FROM_UTC, "TimezoneOffsetFromUTC", VR::SH),
    (STUDY_DESCRIPTION, "StudyDescription", VR::LO),
    (PROCEDURE_CODE_SEQUENCE, "ProcedureCodeSequence", VR::SQ),
    (SERIES_DESCRIPTION, "SeriesDescription", VR::LO),
    (REFERENCED_STUDY_SEQUENCE, "ReferencedStudySequence", VR::SQ),
    (REFERENCED_SERIES_SEQUENCE, "ReferencedSeriesSequence", VR::SQ),
    (REFERENCED_SOP_CLASS_UID, "ReferencedSOPClassUID", VR::UI),
    (REFERENCED_SOP_INSTANCE_UID, "ReferencedSOPInstanceUID", VR::UI),
    (ANATOMIC_REGION_SEQUENCE, "AnatomicRegionSequence", VR::SQ),
    (PATIENT_NAME, "PatientName", VR::PN),
    (PATIENT_ID, "PatientID", VR::LO),
    (ISSUER_OF_PATIENT_ID, "IssuerOfPatientID", VR::LO),
    (TYPE_OF_PATIENT_ID, "TypeOfPatientID", VR::CS),
    (ISSUER_OF_PATIENT_ID_QUALIFIERS_SEQUENCE, "IssuerOfPatientIDQualifiersSequence", VR::SQ),
    (PATIENT_BIRTH_DATE, "PatientBirthDate", VR::DA),
    (PATIENT_BIRTH_TIME, "PatientBirthTime", VR::TM),
    (PATIENT_SEX, "PatientSex", VR::CS),
    (OTHER_PATIENT_IDS_SEQUENCE, "OtherPatientIDsSequence", VR::SQ),
    (PATIENT_AGE, "PatientAge", VR::AS),
    (PATIENT_WEIGHT, "PatientWeight", VR::DS),
    (SLICE_THICKNESS, "SliceThickness", VR::DS),
    (STUDY_INSTANCE_UID, "StudyInstanceUID", VR::UI),
    (SERIES_INSTANCE_UID, "SeriesInstanceUID", VR::UI),
    (STUDY_ID, "StudyID", VR::SH),
    (SERIES_NUMBER, "SeriesNumber", VR::IS),
    (INSTANCE_NUMBER, "InstanceNumber", VR::IS),
    (IMAGE_POSITION_PATIENT, "ImagePositionPatient", VR::DS),
    (IMAGE_ORIENTATION_PATIENT, "ImageOrientationPatient", VR::DS),
    (FRAME_OF_REFERENCE_UID, "FrameOfReferenceUID", VR::UI),
    (SAMPLES_PER_PIXEL, "SamplesPerPixel", VR::US),
    (PHOTOMETRIC_INTERPRETATION, "PhotometricInterpretation", VR::CS),
    (NUMBER_OF_FRAMES, "NumberOfFrames", VR::IS),
    (FRAME_INCREMENT_POINTER, "FrameIncrementPointer", VR::AT),
    (ROWS, "Rows", VR::US),
    (COLUMNS, "Columns", VR::US),
    (PIXEL_SPACING, "PixelSpacing", VR::DS),
    (BITS_ALLOCATED, "BitsAllocated", VR::US),
    (BITS_STORED, "BitsStored", VR::US),
    (PIXEL_REPRESENTATION, "PixelRepresentation", VR::US),
    (WINDOW_CENTER, "WindowCenter", VR::DS),
    (WINDOW_WIDTH, "WindowWidth", VR::DS),
    (LOCAL_NAMESPACE_ENTITY_ID, "LocalNamespaceEntityID", VR::UT),
    (UNIVERSAL_ENTITY_ID, "UniversalEntityID", VR::UT),
    (UNIVERSAL_ENTITY_ID_TYPE, "UniversalEntityIDType", VR::CS),
    (IDENTIFIER_TYPE_CODE, "IdentifierTypeCode", VR::CS),
    (SCHEDULED_PROCEDURE_STEP_SEQUENCE, "ScheduledProcedureStepSequence", VR::SQ),
    (REQUEST_ATTRIBUTES_SEQUENCE, "RequestAttributesSequence", VR::SQ),
    (REQUESTED_PROCEDURE_ID, "RequestedProcedureID", VR::SH),
    (CONCEPT_NAME_CODE_SEQUENCE, "ConceptNameCodeSequence", VR::SQ),
    (CONTENT_SEQUENCE, "ContentSequence", VR::SQ),
    (PIXEL_DATA, "PixelData", VR::OW),
];
