use std::path::Path;

use super::*;

fn contact(name: &str, phone: &str, is_primary: bool) -> Contact {
    Contact {
        name: name.to_string(),
        phone: phone.to_string(),
        is_primary,
    }
}

fn office(id: &str, lat: f64, lng: f64) -> Office {
    Office {
        id: id.to_string(),
        name: format!("Office {id}"),
        contacts: vec![contact("Desk", "040-1234", false)],
        maps_url: format!("https://maps.example.com/{id}"),
        coordinates: Coordinates::new(lat, lng),
    }
}

fn file(offices: Vec<Office>) -> OfficesFile {
    OfficesFile {
        offices,
        primary_contact: None,
    }
}

#[test]
fn display_contact_prefers_primary() {
    let mut o = office("hq", 0.0, 0.0);
    o.contacts = vec![
        contact("First", "111", false),
        contact("Boss", "222", true),
    ];
    assert_eq!(o.display_contact().map(|c| c.name.as_str()), Some("Boss"));
}

#[test]
fn display_contact_falls_back_to_first() {
    let mut o = office("hq", 0.0, 0.0);
    o.contacts = vec![contact("First", "111", false), contact("Second", "222", false)];
    assert_eq!(o.display_contact().map(|c| c.name.as_str()), Some("First"));
}

#[test]
fn display_contact_none_without_contacts() {
    let mut o = office("hq", 0.0, 0.0);
    o.contacts.clear();
    assert!(o.display_contact().is_none());
}

#[test]
fn directory_rejects_empty_list() {
    let err = OfficeDirectory::new(vec![]).unwrap_err();
    assert!(matches!(err, CoreError::EmptyOfficeList));
}

#[test]
fn directory_head_office_is_first_entry() {
    let dir = OfficeDirectory::new(vec![office("a", 1.0, 1.0), office("b", 2.0, 2.0)]).unwrap();
    assert_eq!(dir.head_office().id, "a");
    assert_eq!(dir.len(), 2);
    assert!(dir.get("b").is_some());
    assert!(dir.get("missing").is_none());
}

#[test]
fn directory_get_ignores_case() {
    let dir =
        OfficeDirectory::new(vec![office("head-office", 1.0, 1.0), office("b", 2.0, 2.0)]).unwrap();
    assert_eq!(
        dir.get("HEAD-Office").map(|o| o.id.as_str()),
        Some("head-office")
    );
}

#[test]
fn directory_nearest_returns_closest_with_distance() {
    let dir = OfficeDirectory::new(vec![office("far", 10.0, 10.0), office("near", 0.1, 0.1)])
        .unwrap();
    let (nearest, km) = dir.nearest(Coordinates::new(0.0, 0.0));
    assert_eq!(nearest.id, "near");
    assert!(km > 15.0 && km < 16.0, "got {km}");
}

#[test]
fn validate_rejects_empty_list() {
    let err = validate_offices(&file(vec![])).unwrap_err();
    assert!(err.to_string().contains("at least one office"));
}

#[test]
fn validate_rejects_duplicate_id() {
    let err = validate_offices(&file(vec![office("HQ", 0.0, 0.0), office("hq", 1.0, 1.0)]))
        .unwrap_err();
    assert!(err.to_string().contains("duplicate office id"));
}

#[test]
fn validate_rejects_blank_id() {
    let err = validate_offices(&file(vec![office("  ", 0.0, 0.0)])).unwrap_err();
    assert!(err.to_string().contains("id must be non-empty"));
}

#[test]
fn validate_rejects_out_of_range_coordinates() {
    let err = validate_offices(&file(vec![office("hq", 91.0, 0.0)])).unwrap_err();
    assert!(err.to_string().contains("out-of-range"));
}

#[test]
fn validate_rejects_two_primary_contacts() {
    let mut o = office("hq", 0.0, 0.0);
    o.contacts = vec![contact("A", "1", true), contact("B", "2", true)];
    let err = validate_offices(&file(vec![o])).unwrap_err();
    assert!(err.to_string().contains("at most one"));
}

#[test]
fn validate_rejects_office_without_contacts() {
    let mut o = office("hq", 0.0, 0.0);
    o.contacts.clear();
    let err = validate_offices(&file(vec![o])).unwrap_err();
    assert!(err.to_string().contains("at least one contact"));
}

#[test]
fn validate_rejects_phone_without_digits() {
    let mut o = office("hq", 0.0, 0.0);
    o.contacts = vec![contact("A", "call us", false)];
    let err = validate_offices(&file(vec![o])).unwrap_err();
    assert!(err.to_string().contains("no usable phone"));
}

#[test]
fn parse_offices_reads_optional_primary_flag() {
    let yaml = r#"
offices:
  - id: hq
    name: HQ
    maps_url: https://maps.example.com/hq
    coordinates: { lat: 17.0, lng: 78.0 }
    contacts:
      - { name: A, phone: "111" }
      - { name: B, phone: "222", is_primary: true }
"#;
    let parsed = parse_offices(yaml).expect("valid yaml");
    assert!(parsed.primary_contact.is_none());
    let hq = &parsed.offices[0];
    assert!(!hq.contacts[0].is_primary);
    assert!(hq.contacts[1].is_primary);
}

#[test]
fn parse_offices_surfaces_yaml_errors() {
    let err = parse_offices("offices: [").unwrap_err();
    assert!(matches!(err, ConfigError::OfficesFileParse(_)));
}

#[test]
fn contact_serializes_without_false_primary_flag() {
    let json = serde_json::to_string(&contact("A", "1", false)).unwrap();
    assert!(!json.contains("is_primary"));
    let json = serde_json::to_string(&contact("A", "1", true)).unwrap();
    assert!(json.contains("\"is_primary\":true"));
}

#[test]
fn load_offices_from_real_file() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("config")
        .join("offices.yaml");
    assert!(
        path.exists(),
        "offices.yaml missing at {path:?}, required for this test"
    );
    let offices_file = load_offices(&path).expect("failed to load offices.yaml");
    assert_eq!(offices_file.offices.len(), 3);
    assert_eq!(offices_file.offices[0].id, "head-office");
    assert_eq!(
        offices_file.primary_contact.map(|c| c.whatsapp),
        Some("919052772942".to_string())
    );
}

#[test]
fn load_offices_missing_file_is_io_error() {
    let err = load_offices(Path::new("/nonexistent/offices.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::OfficesFileIo { .. }));
}
