use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A content section or collection on the dashboard overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ContentStatus {
    /// Slug used by the admin screens and the content API
    pub key: String,
    pub title: String,
    /// Items stored; singletons count 0 or 1
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct SubmissionTotals {
    pub total: usize,
    pub unchecked: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DashboardSummary {
    pub sections: Vec<ContentStatus>,
    pub collections: Vec<ContentStatus>,
    pub submissions: SubmissionTotals,
}
