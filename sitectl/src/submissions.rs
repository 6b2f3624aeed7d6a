//! Leads captured by the public contact form and their review by the admin team.
//!
//! The review list is derived from the full set of submissions on every request: free-text
//! search, an optional date range and a single sort key. There is no pagination.

use chrono::{NaiveDate, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::api::models::submissions::{
    ContactSubmissionCreate, ListSubmissionsQuery, OptionCreate, SubmissionSort, SubmissionUpdate,
};
use crate::db::handlers::{Table, table::from_row, table::to_row};
use crate::db::models::submissions::{ContactSubmission, OptionList, SubmissionOption};
use crate::db::store::{Filter, Query, SortOrder, Store, WriteBatch};
use crate::errors::{Error, Result};
use crate::types::abbrev_uuid;
use crate::validation::Validate;

/// Whether any visible field contains `needle`, ignoring case. `needle` must be lowercase.
pub fn matches_search(submission: &ContactSubmission, needle: &str) -> bool {
    let single = [
        Some(submission.full_name.as_str()),
        Some(submission.email.as_str()),
        Some(submission.phone_number.as_str()),
        Some(submission.business_name.as_str()),
        submission.message.as_deref(),
        submission.admin_notes.as_deref(),
        submission.status.as_deref(),
    ];
    single
        .into_iter()
        .flatten()
        .chain(submission.services_of_interest.iter().map(String::as_str))
        .chain(submission.assigned_to_emails.iter().map(String::as_str))
        .any(|field| field.to_lowercase().contains(needle))
}

/// Whether the submission was created on a UTC calendar day within `[from, to]`.
pub fn in_date_range(submission: &ContactSubmission, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    let day = submission.created_at.date_naive();
    from.is_none_or(|from| day >= from) && to.is_none_or(|to| day <= to)
}

/// Apply the review screen's search, date range and sort to `submissions`.
pub fn review(mut submissions: Vec<ContactSubmission>, query: &ListSubmissionsQuery) -> Vec<ContactSubmission> {
    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    submissions.retain(|s| {
        needle.as_deref().is_none_or(|n| matches_search(s, n)) && in_date_range(s, query.from, query.to)
    });

    let sort = query.sort.unwrap_or_default();
    let direction = query.direction.unwrap_or(SortOrder::Desc);
    submissions.sort_by(|a, b| {
        let ordering = match sort {
            SubmissionSort::Checked => a.checked.cmp(&b.checked),
            SubmissionSort::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        match direction {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
    submissions
}

pub struct Submissions<'s> {
    store: &'s dyn Store,
}

impl<'s> Submissions<'s> {
    pub fn new(store: &'s dyn Store) -> Self {
        Self { store }
    }

    fn table(&self) -> Table<'s, ContactSubmission> {
        Table::new(self.store)
    }

    fn not_found(id: Uuid) -> Error {
        Error::NotFound {
            resource: "Submission".to_string(),
            id: id.to_string(),
        }
    }

    /// Store a lead from the public form.
    #[instrument(skip(self, form), err)]
    pub async fn create(&self, form: ContactSubmissionCreate) -> Result<ContactSubmission> {
        form.validate()?;
        let form = form.normalized();
        let submission = ContactSubmission {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            full_name: form.full_name,
            email: form.email,
            phone_number: form.phone_number,
            business_name: form.business_name,
            message: form.message,
            admin_notes: None,
            checked: false,
            status: None,
            services_of_interest: Vec::new(),
            follow_up_date: None,
            assigned_to_emails: Vec::new(),
        };
        let stored = self.table().insert(&submission).await?;
        info!(id = %abbrev_uuid(&stored.id), "received contact submission");
        Ok(stored)
    }

    pub async fn get(&self, id: Uuid) -> Result<ContactSubmission> {
        self.table()
            .fetch_single(Query::new().eq("id", id.to_string()))
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    #[instrument(skip(self, query), err)]
    pub async fn list(&self, query: &ListSubmissionsQuery) -> Result<Vec<ContactSubmission>> {
        let all = self.table().select(&Query::new()).await?;
        Ok(review(all, query))
    }

    /// Write the admin-owned fields named by `update` in a single call.
    #[instrument(skip(self, update), fields(id = %abbrev_uuid(&id)), err)]
    pub async fn update(&self, id: Uuid, update: SubmissionUpdate) -> Result<ContactSubmission> {
        update.validate()?;
        let patch = update.into_patch()?;
        self.table()
            .update_fields(id, patch)
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    #[instrument(skip(self), fields(id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let removed = self.table().delete_where(Filter::all().eq("id", id.to_string())).await?;
        if removed.is_empty() {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    /// Every option of a list, alphabetically.
    pub async fn options(&self, list: OptionList) -> Result<Vec<SubmissionOption>> {
        let table = list.table();
        let rows = self
            .store
            .select(table, &Query::new().order_by("name", SortOrder::Asc))
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| from_row(table, row))
            .collect::<std::result::Result<_, _>>()?)
    }

    #[instrument(skip(self, input), err)]
    pub async fn create_option(&self, list: OptionList, input: OptionCreate) -> Result<SubmissionOption> {
        input.validate()?;
        let table = list.table();
        let option = SubmissionOption {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
        };
        let mut written = self
            .store
            .apply(WriteBatch::new().insert(table, vec![to_row(table, &option)?]))
            .await?;
        let row = written
            .pop()
            .and_then(|mut rows| rows.pop())
            .ok_or_else(|| Error::Internal {
                operation: format!("create option in {table}"),
            })?;
        Ok(from_row(table, row)?)
    }

    #[instrument(skip(self), err)]
    pub async fn delete_option(&self, list: OptionList, id: Uuid) -> Result<()> {
        let mut written = self
            .store
            .apply(WriteBatch::new().delete(list.table(), Filter::all().eq("id", id.to_string())))
            .await?;
        if written.pop().is_none_or(|rows| rows.is_empty()) {
            return Err(Error::NotFound {
                resource: "Option".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::DbError;
    use crate::db::store::{MemoryStore, TableName};
    use chrono::{DateTime, TimeZone};

    fn submission(name: &str, created_at: DateTime<Utc>) -> ContactSubmission {
        ContactSubmission {
            id: Uuid::new_v4(),
            created_at,
            full_name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone_number: "+919876543210".into(),
            business_name: format!("{name} Ltd"),
            message: None,
            admin_notes: None,
            checked: false,
            status: None,
            services_of_interest: Vec::new(),
            follow_up_date: None,
            assigned_to_emails: Vec::new(),
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn names(list: &[ContactSubmission]) -> Vec<&str> {
        list.iter().map(|s| s.full_name.as_str()).collect()
    }

    #[test]
    fn search_finds_admin_notes_case_insensitively() {
        let mut a = submission("Anil", at(1, 9));
        a.admin_notes = Some("Wants a QUOTE for SEO".into());
        let b = submission("Bela", at(2, 9));
        let mut c = submission("Chetan", at(3, 9));
        c.admin_notes = Some("sent quote already".into());

        let query = ListSubmissionsQuery {
            search: Some("Quote".into()),
            ..Default::default()
        };
        let found = review(vec![a, b, c], &query);
        assert_eq!(names(&found), vec!["Chetan", "Anil"]);
    }

    #[test]
    fn search_covers_list_fields() {
        let mut a = submission("Anil", at(1, 9));
        a.services_of_interest = vec!["Web Design".into()];
        let mut b = submission("Bela", at(2, 9));
        b.assigned_to_emails = vec!["sales@agency.test".into()];

        let by = |search: &str| ListSubmissionsQuery {
            search: Some(search.into()),
            ..Default::default()
        };
        assert_eq!(names(&review(vec![a.clone(), b.clone()], &by("web design"))), vec!["Anil"]);
        assert_eq!(names(&review(vec![a, b], &by("SALES@"))), vec!["Bela"]);
    }

    #[test]
    fn date_range_is_inclusive() {
        let all = vec![
            submission("One", at(1, 23)),
            submission("Two", at(2, 0)),
            submission("Three", at(3, 12)),
            submission("Four", at(4, 0)),
        ];
        let query = ListSubmissionsQuery {
            from: NaiveDate::from_ymd_opt(2024, 3, 2),
            to: NaiveDate::from_ymd_opt(2024, 3, 3),
            direction: Some(SortOrder::Asc),
            ..Default::default()
        };
        assert_eq!(names(&review(all, &query)), vec!["Two", "Three"]);
    }

    #[test]
    fn default_sort_is_newest_first() {
        let all = vec![submission("Old", at(1, 9)), submission("New", at(5, 9))];
        assert_eq!(names(&review(all, &ListSubmissionsQuery::default())), vec!["New", "Old"]);
    }

    #[test]
    fn sort_by_checked() {
        let mut done = submission("Done", at(1, 9));
        done.checked = true;
        let open = submission("Open", at(2, 9));
        let query = ListSubmissionsQuery {
            sort: Some(SubmissionSort::Checked),
            direction: Some(SortOrder::Asc),
            ..Default::default()
        };
        assert_eq!(names(&review(vec![done, open], &query)), vec!["Open", "Done"]);
    }

    #[tokio::test]
    async fn update_touches_only_admin_fields() {
        let store = MemoryStore::new();
        let submissions = Submissions::new(&store);
        let created = submissions
            .create(ContactSubmissionCreate {
                full_name: "Asha Verma".into(),
                email: "asha@example.com".into(),
                phone_number: "+919876543210".into(),
                business_name: "Verma Foods".into(),
                message: Some("  ".into()),
            })
            .await
            .unwrap();
        assert_eq!(created.message, None);

        let update: SubmissionUpdate =
            serde_json::from_str(r#"{"admin_notes": "Call Monday", "checked": true, "status": "Contacted"}"#).unwrap();
        let updated = submissions.update(created.id, update).await.unwrap();

        assert!(updated.checked);
        assert_eq!(updated.admin_notes.as_deref(), Some("Call Monday"));
        assert_eq!(updated.full_name, created.full_name);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn options_are_unique_by_name() {
        let store = MemoryStore::new();
        let submissions = Submissions::new(&store);
        let new = |name: &str| OptionCreate { name: name.into() };

        submissions.create_option(OptionList::Statuses, new("Won")).await.unwrap();
        submissions.create_option(OptionList::Statuses, new("Contacted")).await.unwrap();
        let err = submissions
            .create_option(OptionList::Statuses, new("Won"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Database(DbError::UniqueViolation { .. })));

        let statuses = submissions.options(OptionList::Statuses).await.unwrap();
        let names: Vec<_> = statuses.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Contacted", "Won"]);
        assert_eq!(store.row_count(TableName::SubmissionServiceInterests), 0);

        submissions.delete_option(OptionList::Statuses, statuses[0].id).await.unwrap();
        assert!(submissions.delete_option(OptionList::Statuses, statuses[0].id).await.is_err());
    }
}
