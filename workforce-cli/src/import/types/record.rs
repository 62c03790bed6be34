//! Canonical workforce records produced by the normalizer

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FieldKey;
use super::value::format_number;
use crate::import::normalize::dates::parse_date_text;

/// Canonical date rendering
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Non-calendar business states a date column may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SentinelKind {
    /// `NA` - not applicable
    NotApplicable,
    /// `Milestone` - billed at project milestone
    Milestone,
    /// `SOW` - bound by the scope of work
    ScopeOfWork,
}

impl SentinelKind {
    /// Recognise a sentinel literal, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "na" => Some(SentinelKind::NotApplicable),
            "milestone" => Some(SentinelKind::Milestone),
            "sow" => Some(SentinelKind::ScopeOfWork),
            _ => None,
        }
    }

    /// Lower-cased comparison key
    pub fn key(self) -> &'static str {
        match self {
            SentinelKind::NotApplicable => "na",
            SentinelKind::Milestone => "milestone",
            SentinelKind::ScopeOfWork => "sow",
        }
    }
}

/// A date column value
///
/// Serialized as the string a user would type, so sentinels keep their
/// original spelling (`sow` stays `sow`) through storage and export.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum DateField {
    /// No value given
    #[default]
    Empty,
    /// A concrete calendar date
    Date(NaiveDate),
    /// `NA`, `Milestone` or `SOW`, with the literal as written
    Sentinel { kind: SentinelKind, literal: String },
    /// Text that is neither a date nor a sentinel; rejected by the validator
    Unparsed(String),
}

impl DateField {
    pub fn is_empty(&self) -> bool {
        matches!(self, DateField::Empty)
    }

    /// True for every state that is not a concrete date (empty or a sentinel)
    pub fn is_open(&self) -> bool {
        matches!(self, DateField::Empty | DateField::Sentinel { .. })
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            DateField::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Normalized comparison key: `DD-MM-YYYY`, a lower-cased sentinel, or the raw text
    pub fn comparison_key(&self) -> String {
        match self {
            DateField::Empty => String::new(),
            DateField::Date(d) => d.format(DATE_FORMAT).to_string(),
            DateField::Sentinel { kind, .. } => kind.key().to_string(),
            DateField::Unparsed(raw) => raw.trim().to_string(),
        }
    }
}

impl std::fmt::Display for DateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateField::Empty => Ok(()),
            DateField::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            DateField::Sentinel { literal, .. } => write!(f, "{}", literal),
            DateField::Unparsed(raw) => write!(f, "{}", raw),
        }
    }
}

impl From<DateField> for String {
    fn from(value: DateField) -> Self {
        value.to_string()
    }
}

impl From<String> for DateField {
    fn from(value: String) -> Self {
        parse_date_text(&value)
    }
}

impl From<&str> for DateField {
    fn from(value: &str) -> Self {
        parse_date_text(value)
    }
}

/// One project the employee is allocated to
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectAssignment {
    pub project_name: String,
    pub client: String,
    pub allocation_percentage: f64,
    pub start_date: DateField,
    pub end_date: DateField,
    pub role: String,
    pub po_number: String,
    pub billing_rate: f64,
}

impl ProjectAssignment {
    /// Check if every field is blank
    pub fn is_blank(&self) -> bool {
        self.project_name.is_empty()
            && self.client.is_empty()
            && self.allocation_percentage == 0.0
            && self.start_date.is_empty()
            && self.end_date.is_empty()
            && self.role.is_empty()
            && self.po_number.is_empty()
            && self.billing_rate == 0.0
    }

    /// Render one project-group column for this assignment
    pub fn field_text(&self, key: FieldKey) -> String {
        match key {
            FieldKey::ProjectName => self.project_name.clone(),
            FieldKey::Client => self.client.clone(),
            FieldKey::ProjectAllocation => format_number(self.allocation_percentage),
            FieldKey::ProjectStartDate => self.start_date.to_string(),
            FieldKey::ProjectEndDate => self.end_date.to_string(),
            FieldKey::ProjectRole => self.role.clone(),
            FieldKey::PoNumber => self.po_number.clone(),
            FieldKey::BillingRate => format_number(self.billing_rate),
            _ => String::new(),
        }
    }
}

/// A fully typed workforce record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanonicalRecord {
    /// Spreadsheet row this record came from (0 when submitted directly)
    pub row_number: usize,
    pub external_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: String,
    pub designation: String,
    pub location: String,
    pub skills: Vec<String>,
    pub management_mode: String,
    pub billability_status: String,
    pub experience_band: String,
    pub billability_percentage: f64,
    pub rate: f64,
    pub ctc: f64,
    pub ageing_days: u32,
    pub bench_days: u32,
    pub joining_date: DateField,
    pub separation_date: DateField,
    pub po_start_date: DateField,
    pub po_end_date: DateField,
    pub projects: Vec<ProjectAssignment>,
}

impl CanonicalRecord {
    /// Total allocation across all project assignments (derived, never stored)
    pub fn allocation_percentage(&self) -> f64 {
        self.projects.iter().map(|p| p.allocation_percentage).sum()
    }

    /// Lower-cased identifier used for matching
    pub fn id_key(&self) -> String {
        self.external_id.trim().to_lowercase()
    }

    /// Lower-cased email used for matching, `None` when absent
    pub fn email_key(&self) -> Option<String> {
        self.email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
    }

    /// Get a date column by key
    pub fn date(&self, key: FieldKey) -> Option<&DateField> {
        match key {
            FieldKey::JoiningDate => Some(&self.joining_date),
            FieldKey::SeparationDate => Some(&self.separation_date),
            FieldKey::PoStartDate => Some(&self.po_start_date),
            FieldKey::PoEndDate => Some(&self.po_end_date),
            _ => None,
        }
    }

    /// Render any column as the text a spreadsheet cell would hold.
    ///
    /// Project-group columns join every assignment's value with `"; "`.
    pub fn field_text(&self, key: FieldKey) -> String {
        match key {
            FieldKey::EmployeeId => self.external_id.clone(),
            FieldKey::Name => self.name.clone(),
            FieldKey::Email => self.email.clone().unwrap_or_default(),
            FieldKey::Phone => self.phone.clone().unwrap_or_default(),
            FieldKey::Department => self.department.clone(),
            FieldKey::Designation => self.designation.clone(),
            FieldKey::Location => self.location.clone(),
            FieldKey::Skills => self.skills.join("; "),
            FieldKey::ManagementMode => self.management_mode.clone(),
            FieldKey::BillabilityStatus => self.billability_status.clone(),
            FieldKey::ExperienceBand => self.experience_band.clone(),
            FieldKey::BillabilityPercentage => format_number(self.billability_percentage),
            FieldKey::Rate => format_number(self.rate),
            FieldKey::Ctc => format_number(self.ctc),
            FieldKey::AgeingDays => self.ageing_days.to_string(),
            FieldKey::BenchDays => self.bench_days.to_string(),
            FieldKey::JoiningDate
            | FieldKey::SeparationDate
            | FieldKey::PoStartDate
            | FieldKey::PoEndDate => self.date(key).map(|d| d.to_string()).unwrap_or_default(),
            group => self
                .projects
                .iter()
                .map(|p| p.field_text(group))
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

/// A record as it exists in the employee store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEmployee {
    /// Internal identifier
    pub id: Uuid,
    pub record: CanonicalRecord,
    pub created_at: String,
    pub created_by: String,
    pub updated_at: String,
    pub updated_by: String,
}
