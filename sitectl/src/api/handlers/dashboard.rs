use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::{
        content::{CollectionKind, ListKind, SectionKind},
        dashboard::{ContentStatus, DashboardSummary, SubmissionTotals},
    },
    auth::guard::{Members, RequireRole},
    content::singletons,
    db::{
        handlers::{Record, Table},
        models::content::{
            AboutContent, AccordionItem, Client, Faq, FooterContent, HeroContent, LogoItem, PainPoint, PricingPlan,
            ProgressStage, Review, Service,
        },
        models::submissions::ContactSubmission,
        store::{Query, Store},
    },
    errors::Result,
};

async fn count<T: Record>(store: &dyn Store) -> Result<usize> {
    Ok(Table::<T>::new(store).select(&Query::new()).await?.len())
}

async fn collection_count(store: &dyn Store, kind: CollectionKind) -> Result<usize> {
    match kind {
        CollectionKind::Faqs => count::<Faq>(store).await,
        CollectionKind::Logos => count::<LogoItem>(store).await,
        CollectionKind::PainPoints => count::<PainPoint>(store).await,
        CollectionKind::ProgressStages => count::<ProgressStage>(store).await,
        CollectionKind::Services => count::<Service>(store).await,
        CollectionKind::Accordion => count::<AccordionItem>(store).await,
    }
}

async fn list_count(store: &dyn Store, kind: ListKind) -> Result<usize> {
    match kind {
        ListKind::Clients => count::<Client>(store).await,
        ListKind::PricingPlans => count::<PricingPlan>(store).await,
        ListKind::Reviews => count::<Review>(store).await,
    }
}

async fn section_configured(store: &dyn Store, kind: SectionKind) -> Result<bool> {
    Ok(match kind {
        SectionKind::Hero => singletons::current::<HeroContent>(store).await?.is_some(),
        SectionKind::About => singletons::current::<AboutContent>(store).await?.is_some(),
        SectionKind::Footer => singletons::current::<FooterContent>(store).await?.is_some(),
    })
}

/// Overview shared by the dashboard API and the dashboard screen.
#[tracing::instrument(skip_all, err)]
pub async fn load_summary(store: &dyn Store) -> Result<DashboardSummary> {
    let mut sections = Vec::with_capacity(SectionKind::ALL.len());
    for kind in SectionKind::ALL {
        sections.push(ContentStatus {
            key: kind.slug().to_string(),
            title: kind.title().to_string(),
            count: usize::from(section_configured(store, kind).await?),
        });
    }

    let mut collections = Vec::with_capacity(CollectionKind::ALL.len() + ListKind::ALL.len());
    for kind in CollectionKind::ALL {
        collections.push(ContentStatus {
            key: kind.slug().to_string(),
            title: kind.title().to_string(),
            count: collection_count(store, kind).await?,
        });
    }
    for kind in ListKind::ALL {
        collections.push(ContentStatus {
            key: kind.slug().to_string(),
            title: kind.title().to_string(),
            count: list_count(store, kind).await?,
        });
    }

    let leads = Table::<ContactSubmission>::new(store).select(&Query::new()).await?;
    let submissions = SubmissionTotals {
        total: leads.len(),
        unchecked: leads.iter().filter(|s| !s.checked).count(),
    };

    Ok(DashboardSummary {
        sections,
        collections,
        submissions,
    })
}

#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "dashboard",
    summary = "Content and lead overview",
    responses(
        (status = 200, description = "Overview", body = DashboardSummary),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_dashboard(State(state): State<AppState>, _: RequireRole<Members>) -> Result<Json<DashboardSummary>> {
    Ok(Json(load_summary(state.store.as_ref()).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::models::{
            content::FaqInput,
            submissions::{ContactSubmissionCreate, SubmissionUpdate},
            users::Role,
        },
        content::Collections,
        db::store::MemoryStore,
        submissions::Submissions,
        test_utils::*,
    };
    use axum::http::StatusCode;

    fn lead(name: &str) -> ContactSubmissionCreate {
        ContactSubmissionCreate {
            full_name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone_number: "+919876543210".into(),
            business_name: "Traders".into(),
            message: None,
        }
    }

    #[tokio::test]
    async fn summary_counts_content_and_leads() {
        let store = MemoryStore::new();
        let faqs = Collections::<Faq>::new(&store);
        for question in ["Why?", "How?"] {
            faqs.create(FaqInput {
                question: question.into(),
                answer: "Because".into(),
            })
            .await
            .unwrap();
        }
        let submissions = Submissions::new(&store);
        let first = submissions.create(lead("Anil")).await.unwrap();
        submissions.create(lead("Bela")).await.unwrap();
        let checked: SubmissionUpdate = serde_json::from_str(r#"{"checked": true}"#).unwrap();
        submissions.update(first.id, checked).await.unwrap();

        let summary = load_summary(&store).await.unwrap();

        assert!(summary.sections.iter().all(|s| s.count == 0));
        let faq_count = summary.collections.iter().find(|c| c.key == "faqs").unwrap().count;
        assert_eq!(faq_count, 2);
        assert_eq!(summary.collections.len(), 9);
        assert_eq!(summary.submissions, SubmissionTotals { total: 2, unchecked: 1 });
    }

    #[tokio::test]
    async fn dashboard_is_open_to_every_role() {
        let state = create_test_state();
        let viewer = create_test_user(&state, Role::Viewer).await;
        let cookie = session_cookie(&state, &viewer);
        let server = create_test_server(state);

        server.get("/admin/api/v1/dashboard").await.assert_status(StatusCode::UNAUTHORIZED);
        server
            .get("/admin/api/v1/dashboard")
            .add_header("cookie", &cookie)
            .await
            .assert_status_ok();
    }
}
