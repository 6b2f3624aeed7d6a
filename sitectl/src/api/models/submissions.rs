//! API request/response models for contact submissions and their option lists.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::db::store::{Row, SortOrder};
use crate::errors::{Error, Result};
use crate::validation::{Validate, Validator, is_valid_phone, non_blank};

/// Body of the public contact form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ContactSubmissionCreate {
    #[schema(example = "Asha Verma")]
    pub full_name: String,
    pub email: String,
    #[schema(example = "+919876543210")]
    pub phone_number: String,
    pub business_name: String,
    pub message: Option<String>,
}

impl Validate for ContactSubmissionCreate {
    fn validate(&self) -> Result<()> {
        Validator::new()
            .min_chars("full_name", &self.full_name, 2, "Full Name must be at least 2 characters.")
            .email("email", &self.email, "Invalid email address.")
            .check(
                is_valid_phone(self.phone_number.trim()),
                "phone_number",
                "Phone number must start with +91 and be 10 digits long.",
            )
            .min_chars(
                "business_name",
                &self.business_name,
                2,
                "Business Name must be at least 2 characters.",
            )
            .finish()
    }
}

impl ContactSubmissionCreate {
    /// Trimmed copy with a blank message dropped.
    pub fn normalized(self) -> Self {
        Self {
            full_name: self.full_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
            business_name: self.business_name.trim().to_string(),
            message: non_blank(self.message),
        }
    }
}

/// Column the submission list is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionSort {
    Checked,
    #[default]
    CreatedAt,
}

/// Query parameters for listing submissions.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListSubmissionsQuery {
    /// Case-insensitive substring matched against every visible field
    pub search: Option<String>,
    /// First calendar day (UTC) to include
    pub from: Option<NaiveDate>,
    /// Last calendar day (UTC) to include
    pub to: Option<NaiveDate>,
    pub sort: Option<SubmissionSort>,
    /// Defaults to `desc`
    pub direction: Option<SortOrder>,
}

/// Accept `null` as "clear the field" while an absent key leaves it untouched.
fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update of the admin-owned fields of a submission. Visitor-supplied fields are not
/// part of this type and a body naming them is rejected.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SubmissionUpdate {
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub admin_notes: Option<Option<String>>,
    pub checked: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub status: Option<Option<String>>,
    pub services_of_interest: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub follow_up_date: Option<Option<DateTime<Utc>>>,
    pub assigned_to_emails: Option<Vec<String>>,
}

impl SubmissionUpdate {
    /// The columns this update writes. Fails when the body names none.
    pub fn into_patch(self) -> Result<Row> {
        let mut patch = Row::new();
        if let Some(notes) = self.admin_notes {
            patch.insert("admin_notes".into(), notes.map_or(Value::Null, Value::String));
        }
        if let Some(checked) = self.checked {
            patch.insert("checked".into(), Value::Bool(checked));
        }
        if let Some(status) = self.status {
            patch.insert("status".into(), status.map_or(Value::Null, Value::String));
        }
        if let Some(services) = self.services_of_interest {
            patch.insert("services_of_interest".into(), services.into());
        }
        if let Some(date) = self.follow_up_date {
            patch.insert(
                "follow_up_date".into(),
                date.map_or(Value::Null, |d| Value::String(d.to_rfc3339())),
            );
        }
        if let Some(emails) = self.assigned_to_emails {
            patch.insert("assigned_to_emails".into(), emails.into());
        }
        if patch.is_empty() {
            return Err(Error::BadRequest {
                message: "No fields to update".to_string(),
            });
        }
        Ok(patch)
    }
}

impl Validate for SubmissionUpdate {
    fn validate(&self) -> Result<()> {
        let mut v = Validator::new();
        for (i, email) in self.assigned_to_emails.iter().flatten().enumerate() {
            v.email(&format!("assigned_to_emails[{i}]"), email, "Invalid email address.");
        }
        v.finish()
    }
}

/// Body for creating a status or service-of-interest option.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct OptionCreate {
    #[schema(example = "Follow up")]
    pub name: String,
}

impl Validate for OptionCreate {
    fn validate(&self) -> Result<()> {
        Validator::new().required("name", &self.name, "Name is required").finish()
    }
}
