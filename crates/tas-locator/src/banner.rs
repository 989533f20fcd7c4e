//! Which nearest-branch banner a page should show for a [`Resolution`].

use serde::Serialize;
use tas_core::{format_distance, Contact};

use crate::status::{LocationStatus, Resolution};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Banner {
    /// Lookup in flight.
    Finding,
    /// Permission undecided; offer an "enable location" action.
    EnableLocation,
    /// Permission refused; point at the head office contact.
    Denied { contact: Option<Contact> },
    /// Nearest (or fallback) office with its display contact.
    Branch {
        office_name: String,
        contact: Contact,
        distance_label: Option<String>,
        is_fallback: bool,
    },
    /// Nothing to show.
    Hidden,
}

impl Resolution {
    #[must_use]
    pub fn banner(&self) -> Banner {
        match self.status {
            LocationStatus::Loading => return Banner::Finding,
            LocationStatus::Prompt if !self.dismissed => return Banner::EnableLocation,
            LocationStatus::Denied if !self.dismissed => {
                return Banner::Denied {
                    contact: self
                        .office
                        .as_ref()
                        .and_then(|o| o.display_contact())
                        .cloned(),
                };
            }
            _ => {}
        }

        let Some(office) = &self.office else {
            return Banner::Hidden;
        };
        let Some(contact) = office.display_contact() else {
            return Banner::Hidden;
        };

        let distance_label = match self.status {
            LocationStatus::Granted => self.distance_km.map(format_distance),
            _ => None,
        };

        Banner::Branch {
            office_name: office.name.clone(),
            contact: contact.clone(),
            distance_label,
            is_fallback: self.is_fallback(),
        }
    }
}
