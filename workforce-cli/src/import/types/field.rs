//! Canonical field keys for workforce records

use serde::{Deserialize, Serialize};

/// A canonical column of the workforce spreadsheet.
///
/// Declaration order is the canonical header order used by the template and
/// export writers, so `Ord` on this type sorts columns the way users see them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKey {
    EmployeeId,
    Name,
    Email,
    Phone,
    Department,
    Designation,
    Location,
    Skills,
    ManagementMode,
    BillabilityStatus,
    ExperienceBand,
    BillabilityPercentage,
    Rate,
    Ctc,
    AgeingDays,
    BenchDays,
    JoiningDate,
    SeparationDate,
    PoStartDate,
    PoEndDate,
    ProjectName,
    Client,
    ProjectAllocation,
    ProjectStartDate,
    ProjectEndDate,
    ProjectRole,
    PoNumber,
    BillingRate,
}

impl FieldKey {
    /// All keys in canonical header order
    pub const ALL: [FieldKey; 28] = [
        FieldKey::EmployeeId,
        FieldKey::Name,
        FieldKey::Email,
        FieldKey::Phone,
        FieldKey::Department,
        FieldKey::Designation,
        FieldKey::Location,
        FieldKey::Skills,
        FieldKey::ManagementMode,
        FieldKey::BillabilityStatus,
        FieldKey::ExperienceBand,
        FieldKey::BillabilityPercentage,
        FieldKey::Rate,
        FieldKey::Ctc,
        FieldKey::AgeingDays,
        FieldKey::BenchDays,
        FieldKey::JoiningDate,
        FieldKey::SeparationDate,
        FieldKey::PoStartDate,
        FieldKey::PoEndDate,
        FieldKey::ProjectName,
        FieldKey::Client,
        FieldKey::ProjectAllocation,
        FieldKey::ProjectStartDate,
        FieldKey::ProjectEndDate,
        FieldKey::ProjectRole,
        FieldKey::PoNumber,
        FieldKey::BillingRate,
    ];

    /// Keys that belong to a per-project assignment (split on `;` and zipped)
    pub const PROJECT_GROUP: [FieldKey; 8] = [
        FieldKey::ProjectName,
        FieldKey::Client,
        FieldKey::ProjectAllocation,
        FieldKey::ProjectStartDate,
        FieldKey::ProjectEndDate,
        FieldKey::ProjectRole,
        FieldKey::PoNumber,
        FieldKey::BillingRate,
    ];

    /// Header label written to templates and exports
    pub fn label(self) -> &'static str {
        match self {
            FieldKey::EmployeeId => "Employee ID",
            FieldKey::Name => "Name",
            FieldKey::Email => "Email",
            FieldKey::Phone => "Phone",
            FieldKey::Department => "Department",
            FieldKey::Designation => "Designation",
            FieldKey::Location => "Location",
            FieldKey::Skills => "Skills",
            FieldKey::ManagementMode => "Management Mode",
            FieldKey::BillabilityStatus => "Billability Status",
            FieldKey::ExperienceBand => "Experience Band",
            FieldKey::BillabilityPercentage => "Billability %",
            FieldKey::Rate => "Rate",
            FieldKey::Ctc => "CTC",
            FieldKey::AgeingDays => "Ageing Days",
            FieldKey::BenchDays => "Bench Days",
            FieldKey::JoiningDate => "Joining Date",
            FieldKey::SeparationDate => "Separation Date",
            FieldKey::PoStartDate => "PO Start Date",
            FieldKey::PoEndDate => "PO End Date",
            FieldKey::ProjectName => "Project Name",
            FieldKey::Client => "Client",
            FieldKey::ProjectAllocation => "Allocation %",
            FieldKey::ProjectStartDate => "Project Start Date",
            FieldKey::ProjectEndDate => "Project End Date",
            FieldKey::ProjectRole => "Project Role",
            FieldKey::PoNumber => "PO Number",
            FieldKey::BillingRate => "Billing Rate",
        }
    }

    /// Machine name used in field differences, violations and JSON
    pub fn name(self) -> &'static str {
        match self {
            FieldKey::EmployeeId => "employeeId",
            FieldKey::Name => "name",
            FieldKey::Email => "email",
            FieldKey::Phone => "phone",
            FieldKey::Department => "department",
            FieldKey::Designation => "designation",
            FieldKey::Location => "location",
            FieldKey::Skills => "skills",
            FieldKey::ManagementMode => "managementMode",
            FieldKey::BillabilityStatus => "billabilityStatus",
            FieldKey::ExperienceBand => "experienceBand",
            FieldKey::BillabilityPercentage => "billabilityPercentage",
            FieldKey::Rate => "rate",
            FieldKey::Ctc => "ctc",
            FieldKey::AgeingDays => "ageingDays",
            FieldKey::BenchDays => "benchDays",
            FieldKey::JoiningDate => "joiningDate",
            FieldKey::SeparationDate => "separationDate",
            FieldKey::PoStartDate => "poStartDate",
            FieldKey::PoEndDate => "poEndDate",
            FieldKey::ProjectName => "projectName",
            FieldKey::Client => "client",
            FieldKey::ProjectAllocation => "projectAllocation",
            FieldKey::ProjectStartDate => "projectStartDate",
            FieldKey::ProjectEndDate => "projectEndDate",
            FieldKey::ProjectRole => "projectRole",
            FieldKey::PoNumber => "poNumber",
            FieldKey::BillingRate => "billingRate",
        }
    }

    /// Name of this field on the project at `position` (0-based).
    ///
    /// The first project uses the plain name; later ones are numbered from 2,
    /// so the second project's end date is `projectEndDate[2]`.
    pub fn indexed_name(self, position: usize) -> String {
        if position == 0 {
            self.name().to_string()
        } else {
            format!("{}[{}]", self.name(), position + 1)
        }
    }

    /// Whether the column holds a date (or a date sentinel)
    pub fn is_date(self) -> bool {
        matches!(
            self,
            FieldKey::JoiningDate
                | FieldKey::SeparationDate
                | FieldKey::PoStartDate
                | FieldKey::PoEndDate
                | FieldKey::ProjectStartDate
                | FieldKey::ProjectEndDate
        )
    }

    pub fn is_project_group(self) -> bool {
        Self::PROJECT_GROUP.contains(&self)
    }

    /// Option-store category backing the template dropdown for this column
    pub fn option_category(self) -> Option<&'static str> {
        match self {
            FieldKey::Department => Some("department"),
            FieldKey::Designation => Some("designation"),
            FieldKey::Location => Some("location"),
            FieldKey::ManagementMode => Some("management_mode"),
            FieldKey::BillabilityStatus => Some("billability_status"),
            FieldKey::ExperienceBand => Some("experience_band"),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
