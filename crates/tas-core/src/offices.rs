use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::geo;
use crate::{ConfigError, CoreError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and inside the WGS84 latitude/longitude ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Office {
    pub id: String,
    pub name: String,
    pub contacts: Vec<Contact>,
    pub maps_url: String,
    pub coordinates: Coordinates,
}

impl Office {
    /// The contact shown for this office: the one flagged primary, else the first.
    #[must_use]
    pub fn display_contact(&self) -> Option<&Contact> {
        self.contacts
            .iter()
            .find(|c| c.is_primary)
            .or_else(|| self.contacts.first())
    }

    /// Great-circle distance from `point` to this office, in kilometres.
    #[must_use]
    pub fn distance_from(&self, point: Coordinates) -> f64 {
        geo::distance_km(
            point.lat,
            point.lng,
            self.coordinates.lat,
            self.coordinates.lng,
        )
    }
}

/// Company-wide contact used for the WhatsApp call-to-action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryContact {
    pub name: String,
    pub phone: String,
    /// Full international number, digits only.
    pub whatsapp: String,
}

#[derive(Debug, Deserialize)]
pub struct OfficesFile {
    pub offices: Vec<Office>,
    #[serde(default)]
    pub primary_contact: Option<PrimaryContact>,
}

impl OfficesFile {
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyOfficeList`] if the file lists no offices.
    pub fn into_directory(self) -> Result<OfficeDirectory, CoreError> {
        OfficeDirectory::new(self.offices)
    }
}

/// Immutable, non-empty office list. The first entry is the head office and
/// doubles as the fallback whenever a nearest office cannot be computed.
#[derive(Debug, Clone)]
pub struct OfficeDirectory {
    offices: Arc<[Office]>,
}

impl OfficeDirectory {
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyOfficeList`] when `offices` is empty.
    pub fn new(offices: Vec<Office>) -> Result<Self, CoreError> {
        if offices.is_empty() {
            return Err(CoreError::EmptyOfficeList);
        }
        Ok(Self {
            offices: offices.into(),
        })
    }

    #[must_use]
    pub fn head_office(&self) -> &Office {
        &self.offices[0]
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Office] {
        &self.offices
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Office> {
        self.offices.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.offices.len()
    }

    /// Never true for a constructed directory.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offices.is_empty()
    }

    /// Look up an office by id, ignoring ASCII case like the uniqueness check.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Office> {
        self.offices.iter().find(|o| o.id.eq_ignore_ascii_case(id))
    }

    /// Nearest office to `point` together with its distance in kilometres.
    #[must_use]
    pub fn nearest(&self, point: Coordinates) -> (&Office, f64) {
        // Non-empty by construction, so the scan always yields an office.
        geo::nearest_with_distance(point.lat, point.lng, &self.offices).unwrap_or_else(|| {
            let head = self.head_office();
            (head, head.distance_from(point))
        })
    }
}

impl<'a> IntoIterator for &'a OfficeDirectory {
    type Item = &'a Office;
    type IntoIter = std::slice::Iter<'a, Office>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Load and validate the office list from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_offices(path: &Path) -> Result<OfficesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::OfficesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_offices(&content)
}

/// Parse and validate office YAML that is already in memory.
///
/// # Errors
///
/// Returns `ConfigError` if the content cannot be parsed or fails validation.
pub fn parse_offices(content: &str) -> Result<OfficesFile, ConfigError> {
    let offices_file: OfficesFile =
        serde_yaml::from_str(content).map_err(ConfigError::OfficesFileParse)?;

    validate_offices(&offices_file)?;

    Ok(offices_file)
}

fn validate_offices(offices_file: &OfficesFile) -> Result<(), ConfigError> {
    if offices_file.offices.is_empty() {
        return Err(ConfigError::Validation(
            "at least one office must be configured".to_string(),
        ));
    }

    let mut seen_ids = HashSet::new();

    for office in &offices_file.offices {
        if office.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "office id must be non-empty".to_string(),
            ));
        }

        if office.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "office '{}' must have a non-empty name",
                office.id
            )));
        }

        if !seen_ids.insert(office.id.to_ascii_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate office id: '{}'",
                office.id
            )));
        }

        if !office.coordinates.is_valid() {
            return Err(ConfigError::Validation(format!(
                "office '{}' has out-of-range coordinates ({}, {})",
                office.id, office.coordinates.lat, office.coordinates.lng
            )));
        }

        if office.contacts.is_empty() {
            return Err(ConfigError::Validation(format!(
                "office '{}' must list at least one contact",
                office.id
            )));
        }

        let primaries = office.contacts.iter().filter(|c| c.is_primary).count();
        if primaries > 1 {
            return Err(ConfigError::Validation(format!(
                "office '{}' flags {primaries} primary contacts; at most one is allowed",
                office.id
            )));
        }

        for contact in &office.contacts {
            if !contact.phone.chars().any(|c| c.is_ascii_digit()) {
                return Err(ConfigError::Validation(format!(
                    "contact '{}' of office '{}' has no usable phone number",
                    contact.name, office.id
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "offices_test.rs"]
mod tests;
