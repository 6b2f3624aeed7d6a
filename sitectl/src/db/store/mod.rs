//! The uniform table store boundary.
//!
//! Every content table is reached through the same small interface: a filtered, ordered
//! [`Store::select`] and an atomic [`Store::apply`] of a [`WriteBatch`]. Rows cross the boundary
//! as JSON objects keyed by column name; typed access lives one layer up in
//! [`crate::db::handlers::Table`].
//!
//! Two implementations exist:
//!
//! - [`PgStore`]: PostgreSQL through an sqlx pool. Rows are read with `to_jsonb` and written with
//!   `jsonb_populate_record`, so column types are coerced by the database.
//! - [`MemoryStore`]: a process-local store used for development and tests. It enforces primary
//!   and unique keys the same way the schema does.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use utoipa::ToSchema;

use crate::db::errors::{DbError, Result};

/// A row as it crosses the store boundary.
pub type Row = serde_json::Map<String, Value>;

/// Every table the store knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableName {
    HeroContent,
    AboutContent,
    FooterContent,
    WebsiteSettings,
    Services,
    Faqs,
    LogoCarousel,
    PainPoints,
    ProgressStages,
    AccordionContent,
    Clients,
    PricingPlans,
    CustomerReviews,
    ContactSubmissions,
    SubmissionStatuses,
    SubmissionServiceInterests,
    Users,
    Profiles,
    Invitations,
}

impl TableName {
    pub const ALL: [TableName; 19] = [
        TableName::HeroContent,
        TableName::AboutContent,
        TableName::FooterContent,
        TableName::WebsiteSettings,
        TableName::Services,
        TableName::Faqs,
        TableName::LogoCarousel,
        TableName::PainPoints,
        TableName::ProgressStages,
        TableName::AccordionContent,
        TableName::Clients,
        TableName::PricingPlans,
        TableName::CustomerReviews,
        TableName::ContactSubmissions,
        TableName::SubmissionStatuses,
        TableName::SubmissionServiceInterests,
        TableName::Users,
        TableName::Profiles,
        TableName::Invitations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableName::HeroContent => "hero_content",
            TableName::AboutContent => "about_content",
            TableName::FooterContent => "footer_content",
            TableName::WebsiteSettings => "website_settings",
            TableName::Services => "services",
            TableName::Faqs => "faqs",
            TableName::LogoCarousel => "logo_carousel",
            TableName::PainPoints => "pain_points",
            TableName::ProgressStages => "progress_stages",
            TableName::AccordionContent => "accordion_content",
            TableName::Clients => "clients",
            TableName::PricingPlans => "pricing_plans",
            TableName::CustomerReviews => "customer_reviews",
            TableName::ContactSubmissions => "contact_submissions",
            TableName::SubmissionStatuses => "submission_statuses",
            TableName::SubmissionServiceInterests => "submission_service_interests",
            TableName::Users => "users",
            TableName::Profiles => "profiles",
            TableName::Invitations => "invitations",
        }
    }

    /// Column names as they appear in the schema.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            TableName::HeroContent => &[
                "id",
                "singleton",
                "headline",
                "subheadline",
                "background_image_url",
                "cta_text",
                "cta_link",
            ],
            TableName::AboutContent => &["id", "singleton", "title", "description", "image_url"],
            TableName::FooterContent => &["id", "singleton", "company_name", "company_address", "links", "social_media"],
            TableName::WebsiteSettings => &["id", "setting_name", "setting_value"],
            TableName::Services => &["id", "title", "slug", "description", "image_url", "page_content", "order_index"],
            TableName::Faqs => &["id", "question", "answer", "order_index"],
            TableName::LogoCarousel => &["id", "image_url", "alt_text", "order_index"],
            TableName::PainPoints => &["id", "icon", "title", "description", "order_index"],
            TableName::ProgressStages => &["id", "title", "description", "order_index"],
            TableName::AccordionContent => &["id", "heading", "description", "image_url", "order_index"],
            TableName::Clients => &["id", "name", "logo_url", "description", "order_index"],
            TableName::PricingPlans => &[
                "id",
                "name",
                "price",
                "description",
                "icon",
                "is_featured",
                "choose_plan_link",
                "order_index",
            ],
            TableName::CustomerReviews => &[
                "id",
                "customer_name",
                "designation",
                "company_name",
                "review_text",
                "order_index",
            ],
            TableName::ContactSubmissions => &[
                "id",
                "created_at",
                "full_name",
                "email",
                "phone_number",
                "business_name",
                "message",
                "admin_notes",
                "checked",
                "status",
                "services_of_interest",
                "follow_up_date",
                "assigned_to_emails",
            ],
            TableName::SubmissionStatuses | TableName::SubmissionServiceInterests => &["id", "name"],
            TableName::Users => &["id", "email", "password_hash", "app_metadata", "created_at"],
            TableName::Profiles => &["id", "email", "full_name", "role", "created_at"],
            TableName::Invitations => &["id", "user_id", "token_hash", "expires_at", "created_at"],
        }
    }

    /// Columns carrying a unique constraint besides the primary key.
    pub fn unique_columns(&self) -> &'static [&'static str] {
        match self {
            TableName::HeroContent | TableName::AboutContent | TableName::FooterContent => &["singleton"],
            TableName::Services => &["slug"],
            TableName::WebsiteSettings => &["setting_name"],
            TableName::SubmissionStatuses | TableName::SubmissionServiceInterests => &["name"],
            TableName::Users => &["email"],
            _ => &[],
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns().contains(&column)
    }

    /// Fail with [`DbError::UnknownColumn`] unless `column` belongs to this table.
    pub fn check_column(&self, column: &str) -> Result<()> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(DbError::UnknownColumn {
                table: self.as_str().to_string(),
                column: column.to_string(),
            })
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction for ordered selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// One predicate of a filter. All predicates of a [`Filter`] must hold.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq { column: &'static str, value: Value },
    In { column: &'static str, values: Vec<Value> },
}

impl Condition {
    pub fn column(&self) -> &'static str {
        match self {
            Condition::Eq { column, .. } | Condition::In { column, .. } => column,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub conditions: Vec<Condition>,
}

impl Filter {
    /// Matches every row.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq {
            column,
            value: value.into(),
        });
        self
    }

    pub fn is_in<V: Into<Value>>(mut self, column: &'static str, values: impl IntoIterator<Item = V>) -> Self {
        self.conditions.push(Condition::In {
            column,
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn check(&self, table: TableName) -> Result<()> {
        self.conditions.iter().try_for_each(|c| table.check_column(c.column()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub order: SortOrder,
}

/// A select: filter, ordering and an optional row limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Filter,
    pub order: Vec<OrderBy>,
    pub limit: Option<i64>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn eq(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.filter = self.filter.eq(column, value);
        self
    }

    pub fn order_by(mut self, column: &'static str, order: SortOrder) -> Self {
        self.order.push(OrderBy { column, order });
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn check(&self, table: TableName) -> Result<()> {
        self.filter.check(table)?;
        self.order.iter().try_for_each(|o| table.check_column(o.column))
    }
}

/// A single write. Each op returns the rows it touched.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Insert {
        table: TableName,
        rows: Vec<Row>,
    },
    Update {
        table: TableName,
        filter: Filter,
        patch: Row,
    },
    /// Insert, or update every supplied column except `id` when a row with the same
    /// `conflict` value already exists.
    Upsert {
        table: TableName,
        rows: Vec<Row>,
        conflict: &'static str,
    },
    Delete {
        table: TableName,
        filter: Filter,
    },
}

impl WriteOp {
    pub fn table(&self) -> TableName {
        match self {
            WriteOp::Insert { table, .. }
            | WriteOp::Update { table, .. }
            | WriteOp::Upsert { table, .. }
            | WriteOp::Delete { table, .. } => *table,
        }
    }

    /// Validate every column the op references.
    pub fn check(&self) -> Result<()> {
        let table = self.table();
        let check_rows = |rows: &[Row]| -> Result<()> {
            rows.iter()
                .flat_map(|row| row.keys())
                .try_for_each(|column| table.check_column(column))
        };
        match self {
            WriteOp::Insert { rows, .. } => check_rows(rows),
            WriteOp::Update { filter, patch, .. } => {
                filter.check(table)?;
                patch.keys().try_for_each(|column| table.check_column(column))
            }
            WriteOp::Upsert { rows, conflict, .. } => {
                table.check_column(conflict)?;
                check_rows(rows)
            }
            WriteOp::Delete { filter, .. } => filter.check(table),
        }
    }
}

/// Writes applied all-or-nothing by [`Store::apply`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: WriteOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    pub fn insert(mut self, table: TableName, rows: Vec<Row>) -> Self {
        self.ops.push(WriteOp::Insert { table, rows });
        self
    }

    pub fn update(mut self, table: TableName, filter: Filter, patch: Row) -> Self {
        self.ops.push(WriteOp::Update { table, filter, patch });
        self
    }

    pub fn upsert(mut self, table: TableName, rows: Vec<Row>, conflict: &'static str) -> Self {
        self.ops.push(WriteOp::Upsert { table, rows, conflict });
        self
    }

    pub fn delete(mut self, table: TableName, filter: Filter) -> Self {
        self.ops.push(WriteOp::Delete { table, filter });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// The uniform query interface over every table.
#[async_trait::async_trait]
pub trait Store: Send + Sync + fmt::Debug {
    /// Rows of `table` matching the query, in the requested order.
    async fn select(&self, table: TableName, query: &Query) -> Result<Vec<Row>>;

    /// Apply every op of the batch atomically. The result holds, per op, the rows it wrote or
    /// removed. An empty batch touches nothing.
    async fn apply(&self, batch: WriteBatch) -> Result<Vec<Vec<Row>>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_table_has_an_id_column() {
        for table in TableName::ALL {
            assert!(table.has_column("id"), "{table} lacks id");
            for unique in table.unique_columns() {
                assert!(table.has_column(unique), "{table}.{unique} is not a column");
            }
        }
    }

    #[test]
    fn query_check_rejects_unknown_columns() {
        let ok = Query::new().eq("question", "q").order_by("order_index", SortOrder::Asc);
        assert!(ok.check(TableName::Faqs).is_ok());

        let bad = Query::new().order_by("position", SortOrder::Asc);
        assert!(matches!(
            bad.check(TableName::Faqs),
            Err(DbError::UnknownColumn { column, .. }) if column == "position"
        ));
    }

    #[test]
    fn write_op_check_covers_row_keys() {
        let mut row = Row::new();
        row.insert("id".into(), json!("x"));
        row.insert("nope".into(), json!(1));
        let op = WriteOp::Insert {
            table: TableName::Faqs,
            rows: vec![row],
        };
        assert!(op.check().is_err());
    }

    #[test]
    fn sort_order_toggles() {
        assert_eq!(SortOrder::Asc.toggled(), SortOrder::Desc);
        assert_eq!(SortOrder::Desc.toggled(), SortOrder::Asc);
    }
}
