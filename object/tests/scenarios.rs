use dicom_attrs_core::{tags, DictionaryRegistry, Tag, C, VR};
use dicom_attrs_encoding::{DicomReader, EncodeOptions};
use dicom_attrs_object::Attributes;
use pretty_assertions::assert_eq;

const JAPANESE_NAME: &str = "Yamada^Tarou=山田^太郎=やまだ^たろう";
const JAPANESE_BYTES: &[u8] =
    b"Yamada^Tarou=\x1b$B;3ED\x1b(B^\x1b$BB@O:\x1b(B=\x1b$B$d$^$@\x1b(B^\x1b$B$?$m$&\x1b(B";

fn read_back(bytes: &[u8], explicit_vr: bool) -> Attributes {
    let mut reader = if explicit_vr {
        DicomReader::explicit_le(bytes)
    } else {
        DicomReader::implicit_le(bytes)
    };
    Attributes::read_from(&mut reader, &DictionaryRegistry::new()).unwrap()
}

fn study_with_series(description: &str) -> Attributes {
    let mut attrs = Attributes::new();
    attrs.set_string(tags::PATIENT_ID, VR::LO, "123").unwrap();
    let seq = attrs.new_sequence(tags::REFERENCED_SERIES_SEQUENCE, 1).unwrap();
    let item = seq.new_item();
    item.set_string(tags::SERIES_INSTANCE_UID, VR::UI, "1.2.3").unwrap();
    item.set_string(tags::SERIES_DESCRIPTION, VR::LO, description).unwrap();
    attrs
}

#[test]
fn patient_id_survives_encoding() {
    let mut attrs = Attributes::new();
    attrs.set_string(tags::PATIENT_ID, VR::LO, "123").unwrap();

    for explicit_vr in [true, false] {
        let bytes = attrs
            .to_bytes(explicit_vr, false, EncodeOptions::default())
            .unwrap();
        let read = read_back(&bytes, explicit_vr);
        assert_eq!(read, attrs);
        assert_eq!(read.get_string(tags::PATIENT_ID).as_deref(), Some("123"));
    }
}

#[test]
fn nested_data_set_survives_encoding() {
    let attrs = study_with_series("CT");
    let options = EncodeOptions {
        undefined_sequence_length: true,
        undefined_item_length: true,
        ..EncodeOptions::default()
    };
    let bytes = attrs.to_bytes(true, false, options).unwrap();
    assert_eq!(bytes.len() as u32, attrs.calc_length(options, true));
    let read = read_back(&bytes, true);
    assert_eq!(read, attrs);
}

#[test]
fn single_item_sequences_merge_recursively() {
    let mut attrs = study_with_series("CT");

    let mut update = Attributes::new();
    let item = update
        .new_sequence(tags::REFERENCED_SERIES_SEQUENCE, 1)
        .unwrap()
        .new_item();
    item.set_string(tags::SERIES_NUMBER, VR::IS, "4").unwrap();
    item.set_string(tags::SERIES_DESCRIPTION, VR::LO, "MR").unwrap();

    assert!(attrs.update_recursive(&update).unwrap());
    let seq = attrs.get_sequence(tags::REFERENCED_SERIES_SEQUENCE).unwrap();
    assert_eq!(seq.len(), 1);
    let item = seq.first().unwrap();
    assert_eq!(item.get_string(tags::SERIES_INSTANCE_UID).as_deref(), Some("1.2.3"));
    assert_eq!(item.get_string(tags::SERIES_DESCRIPTION).as_deref(), Some("MR"));
    assert_eq!(item.get_int(tags::SERIES_NUMBER), Some(4));

    // a second run has nothing left to change
    assert!(!attrs.update_recursive(&update).unwrap());
}

#[test]
fn multi_item_sequences_are_replaced() {
    let mut attrs = study_with_series("CT");

    let mut update = Attributes::new();
    let seq = update.new_sequence(tags::REFERENCED_SERIES_SEQUENCE, 2).unwrap();
    seq.new_item()
        .set_string(tags::SERIES_NUMBER, VR::IS, "1")
        .unwrap();
    seq.new_item()
        .set_string(tags::SERIES_NUMBER, VR::IS, "2")
        .unwrap();

    assert!(attrs.update_recursive(&update).unwrap());
    let seq = attrs.get_sequence(tags::REFERENCED_SERIES_SEQUENCE).unwrap();
    assert_eq!(seq.len(), 2);
    let first = seq.first().unwrap();
    assert_eq!(first.get_string(tags::SERIES_INSTANCE_UID), None);
    assert_eq!(first.get_int(tags::SERIES_NUMBER), Some(1));
    assert_eq!(seq.get(1).unwrap().get_int(tags::SERIES_NUMBER), Some(2));
}

#[test]
fn numeric_strings_degrade_per_component() {
    let mut attrs = Attributes::new();
    attrs.set_string(tags::SLICE_THICKNESS, VR::DS, "").unwrap();
    attrs.set_string(tags::WINDOW_CENTER, VR::IS, "40\\abc\\60").unwrap();
    attrs.set_string(tags::PIXEL_SPACING, VR::DS, "3.14\\-2.5").unwrap();

    assert_eq!(attrs.get_doubles(tags::SLICE_THICKNESS), Some(C::new()));
    assert_eq!(attrs.get_double(tags::SLICE_THICKNESS), None);

    let ints = attrs.get_ints(tags::WINDOW_CENTER).unwrap();
    assert_eq!(ints.as_slice(), &[40, i32::MIN, 60]);
    assert_eq!(attrs.get_int_at(tags::WINDOW_CENTER, 0), Some(40));
    assert_eq!(attrs.get_int_at(tags::WINDOW_CENTER, 1), None);
    assert_eq!(attrs.get_int_at(tags::WINDOW_CENTER, 2), Some(60));

    let spacing = attrs.get_doubles(tags::PIXEL_SPACING).unwrap();
    assert_eq!(spacing.as_slice(), &[3.14, -2.5]);
}

#[test]
fn iso_2022_names_round_trip() {
    let mut attrs = Attributes::new();
    attrs
        .set_specific_character_set(&["", "ISO 2022 IR 87"])
        .unwrap();
    attrs
        .set_bytes(tags::PATIENT_NAME, VR::PN, JAPANESE_BYTES.to_vec())
        .unwrap();
    assert_eq!(attrs.get_string(tags::PATIENT_NAME).as_deref(), Some(JAPANESE_NAME));

    attrs
        .set_string(tags::PATIENT_NAME, VR::PN, JAPANESE_NAME)
        .unwrap();
    let bytes = attrs.to_bytes(true, false, EncodeOptions::default()).unwrap();
    assert!(bytes
        .windows(JAPANESE_BYTES.len())
        .any(|window| window == JAPANESE_BYTES));

    let read = read_back(&bytes, true);
    assert_eq!(read.get_string(tags::PATIENT_NAME).as_deref(), Some(JAPANESE_NAME));
}

#[test]
fn unencodable_characters_are_replaced() {
    let mut attrs = Attributes::new();
    attrs
        .set_specific_character_set(&["", "ISO 2022 IR 87"])
        .unwrap();
    attrs
        .set_string(tags::PATIENT_NAME, VR::PN, "A\u{263a}")
        .unwrap();
    let bytes = attrs.to_bytes(true, false, EncodeOptions::default()).unwrap();
    let read = read_back(&bytes, true);
    assert_eq!(read.get_string(tags::PATIENT_NAME).as_deref(), Some("A?"));
}

#[test]
fn date_ranges_cover_whole_days() {
    let mut attrs = Attributes::new();
    attrs.set_default_timezone(Some(chrono::FixedOffset::east_opt(0).unwrap()));
    attrs
        .set_string(tags::STUDY_DATE, VR::DA, "20200101-20200131")
        .unwrap();
    attrs.set_string(tags::SERIES_DATE, VR::DA, "-20200131").unwrap();

    let range = attrs.get_date_range(tags::STUDY_DATE).unwrap();
    assert_eq!(range.start().unwrap().to_rfc3339(), "2020-01-01T00:00:00+00:00");
    assert_eq!(
        range.end().unwrap().to_rfc3339(),
        "2020-01-31T23:59:59.999999+00:00"
    );

    let open = attrs.get_date_range(tags::SERIES_DATE).unwrap();
    assert!(open.start().is_none());
    assert_eq!(open.end(), range.end());
}

#[test]
fn merging_and_updating_with_itself_changes_nothing() {
    let original = study_with_series("CT");
    let mut attrs = original.clone();

    assert!(!attrs.merge(&original).unwrap());
    let mut modified = Attributes::new();
    assert!(!attrs.update(&original, Some(&mut modified)).unwrap());
    assert!(modified.is_empty());
    assert_eq!(attrs, original);
}

#[test]
fn private_elements_are_found_in_any_block() {
    let mut attrs = Attributes::new();
    for element in [0x0010, 0x0011, 0x0012] {
        attrs
            .set_string(Tag(0x0041, element), VR::LO, &format!("OTHER {}", element))
            .unwrap();
    }
    attrs
        .set_string(("ACME", Tag(0x0041, 0x0010)), VR::LO, "value")
        .unwrap();

    assert_eq!(attrs.get_string(Tag(0x0041, 0x0013)).as_deref(), Some("ACME"));
    assert_eq!(
        attrs.get_string(("ACME", Tag(0x0041, 0x0010))).as_deref(),
        Some("value")
    );

    let bytes = attrs.to_bytes(true, false, EncodeOptions::default()).unwrap();
    let read = read_back(&bytes, true);
    assert_eq!(
        read.get_string(("ACME", Tag(0x0041, 0x0010))).as_deref(),
        Some("value")
    );
    let tags = read.tags();
    assert!(tags.windows(2).all(|w| w[0] < w[1]));
}
