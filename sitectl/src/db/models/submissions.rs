//! Records for leads captured by the public contact form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::handlers::Record;
use crate::db::store::TableName;

/// A lead. Visitor-supplied fields never change after insert; the admin fields are edited from
/// the review screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ContactSubmission {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub business_name: String,
    pub message: Option<String>,
    pub admin_notes: Option<String>,
    pub checked: bool,
    pub status: Option<String>,
    #[serde(default)]
    pub services_of_interest: Vec<String>,
    pub follow_up_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assigned_to_emails: Vec<String>,
}

impl Record for ContactSubmission {
    const TABLE: TableName = TableName::ContactSubmissions;

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Which creatable option list an [`SubmissionOption`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum OptionList {
    Statuses,
    ServiceInterests,
}

impl OptionList {
    pub fn table(self) -> TableName {
        match self {
            OptionList::Statuses => TableName::SubmissionStatuses,
            OptionList::ServiceInterests => TableName::SubmissionServiceInterests,
        }
    }
}

/// A selectable value for a submission's status or services of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SubmissionOption {
    pub id: Uuid,
    pub name: String,
}
