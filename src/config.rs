//! Processing configuration.
//!
//! [`ProcessingConfig`] is an immutable value passed explicitly to every stage. The defaults
//! match a Google Forms registration export; any subset can be overridden from a JSON document
//! with [`ProcessingConfig::from_json_str`] or [`ProcessingConfig::from_json_path`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ProcessingResult;

/// Logical registration fields the pipeline knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalField {
    Timestamp,
    ChildName,
    ChildAge,
    ParentName,
    ParentEmail,
    Phone,
    Allergies,
    EmergencyContact,
}

impl LogicalField {
    /// All logical fields in resolution order.
    pub const ALL: [LogicalField; 8] = [
        LogicalField::Timestamp,
        LogicalField::ChildName,
        LogicalField::ChildAge,
        LogicalField::ParentName,
        LogicalField::ParentEmail,
        LogicalField::Phone,
        LogicalField::Allergies,
        LogicalField::EmergencyContact,
    ];

    /// Configuration key (`child_name`, `parent_email`, ...).
    pub fn key(self) -> &'static str {
        match self {
            LogicalField::Timestamp => "timestamp",
            LogicalField::ChildName => "child_name",
            LogicalField::ChildAge => "child_age",
            LogicalField::ParentName => "parent_name",
            LogicalField::ParentEmail => "parent_email",
            LogicalField::Phone => "phone",
            LogicalField::Allergies => "allergies",
            LogicalField::EmergencyContact => "emergency_contact",
        }
    }

    /// Human-readable name used in issue text (`child name`, `parent email`, ...).
    pub fn display_name(self) -> String {
        self.key().replace('_', " ")
    }

    /// Header a Google Forms export uses for this field.
    pub fn default_header(self) -> &'static str {
        match self {
            LogicalField::Timestamp => "Timestamp",
            LogicalField::ChildName => "Child Full Name",
            LogicalField::ChildAge => "Child Age",
            LogicalField::ParentName => "Parent/Guardian Name",
            LogicalField::ParentEmail => "Parent Email",
            LogicalField::Phone => "Phone Number",
            LogicalField::Allergies => "Allergies/Medical Info",
            LogicalField::EmergencyContact => "Emergency Contact",
        }
    }
}

impl fmt::Display for LogicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Worksheet names read and written by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetNames {
    /// Sheet holding the raw registrations.
    pub source: String,
    /// Sheet receiving invalid registrations.
    pub invalid: String,
    /// Sheet receiving sibling groups.
    pub siblings: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            source: "Registrations".to_string(),
            invalid: "Invalid_Registrations".to_string(),
            siblings: "Possible_Siblings".to_string(),
        }
    }
}

/// Static options consumed by the column resolver, validator and workbook I/O.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Expected header per logical field. Fields missing from the map are never resolved.
    pub columns: BTreeMap<LogicalField, String>,
    /// Fields that must be non-blank, checked in this order.
    pub required_fields: Vec<LogicalField>,
    /// Minimum accepted age; `None` disables the check.
    pub min_age: Option<i64>,
    /// Maximum accepted age; `None` disables the check.
    pub max_age: Option<i64>,
    pub sheets: SheetNames,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            columns: LogicalField::ALL
                .iter()
                .map(|&f| (f, f.default_header().to_string()))
                .collect(),
            required_fields: vec![
                LogicalField::ChildName,
                LogicalField::ParentName,
                LogicalField::ParentEmail,
                LogicalField::Phone,
            ],
            min_age: Some(5),
            max_age: Some(16),
            sheets: SheetNames::default(),
        }
    }
}

impl ProcessingConfig {
    /// Parse a configuration document. Omitted keys keep their defaults.
    ///
    /// A partial `columns` map replaces the whole default map, so list every field you want
    /// resolved.
    pub fn from_json_str(json: &str) -> ProcessingResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a configuration file.
    pub fn from_json_path(path: impl AsRef<Path>) -> ProcessingResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Expected header for `field`, if configured.
    pub fn expected_header(&self, field: LogicalField) -> Option<&str> {
        self.columns.get(&field).map(String::as_str)
    }
}
