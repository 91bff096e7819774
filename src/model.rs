//! Core data model for the address book.

use serde::{Deserialize, Serialize};

/// One record from the external contact source.
///
/// The provider emits one row per phone number and per email address,
/// so several rows may carry the same `source_id`. Rows are allowed to
/// miss any field except the id; what a row is missing simply does not
/// contribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawContactRow {
    #[serde(rename = "id")]
    pub source_id: String,
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "number", default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(rename = "email", default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
}

/// A consolidated person entry.
///
/// Built by the consolidator, which owns it exclusively while numbers
/// and emails are appended. Once returned it is shared read-only state:
/// nothing downstream mutates a published contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub numbers: Vec<String>,
    #[serde(default)]
    pub emails: Vec<String>,
}

impl Contact {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            numbers: Vec::new(),
            emails: Vec::new(),
        }
    }
}
