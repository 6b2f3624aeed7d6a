//! The section model the public landing page is rendered from.
//!
//! Every section is fetched independently. A section whose fetch fails carries an error
//! message instead of data and the rest of the page still renders.

use serde::Serialize;
use tracing::{instrument, warn};
use utoipa::ToSchema;

use crate::content::{defaults, settings, singletons};
use crate::db::handlers::{Ordered, Table};
use crate::db::models::content::{
    AboutContent, AccordionItem, Client, Faq, FooterContent, HeroContent, LogoItem, PainPoint, PricingPlan,
    ProgressStage, Review, Service,
};
use crate::db::store::Store;
use crate::errors::Result;

/// One section of the page: its data, or why it could not be loaded.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Section<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Section<T> {
    fn from_result(section: &'static str, result: Result<T>) -> Self {
        match result {
            Ok(data) => Self {
                data: Some(data),
                error: None,
            },
            Err(e) => {
                warn!(section, error = %e, "failed to load section");
                Self {
                    data: None,
                    error: Some(format!("Could not load {section}")),
                }
            }
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Pricing plans together with the fallback target of their buttons.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PricingSection {
    pub plans: Vec<PricingPlan>,
    pub contact_us_link: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Landing {
    /// Absent until configured; the page omits the banner
    pub hero: Section<Option<HeroContent>>,
    pub about: Section<AboutContent>,
    pub services: Section<Vec<Service>>,
    pub accordion: Section<Vec<AccordionItem>>,
    pub pain_points: Section<Vec<PainPoint>>,
    pub progress_stages: Section<Vec<ProgressStage>>,
    pub logos: Section<Vec<LogoItem>>,
    pub clients: Section<Vec<Client>>,
    pub pricing: Section<PricingSection>,
    pub reviews: Section<Vec<Review>>,
    pub faqs: Section<Vec<Faq>>,
    pub footer: Section<FooterContent>,
}

async fn ordered<T: Ordered>(store: &dyn Store) -> Result<Vec<T>> {
    Ok(Table::<T>::new(store).list_ordered().await?)
}

async fn pricing(store: &dyn Store) -> Result<PricingSection> {
    let (plans, contact_us_link) = tokio::try_join!(ordered::<PricingPlan>(store), settings::contact_us_link(store))?;
    Ok(PricingSection { plans, contact_us_link })
}

impl Landing {
    #[instrument(skip_all)]
    pub async fn load(store: &dyn Store) -> Self {
        let (hero, about, services, accordion, pain_points, progress_stages, logos, clients, pricing, reviews, faqs, footer) = tokio::join!(
            singletons::current::<HeroContent>(store),
            singletons::current::<AboutContent>(store),
            ordered::<Service>(store),
            ordered::<AccordionItem>(store),
            ordered::<PainPoint>(store),
            ordered::<ProgressStage>(store),
            ordered::<LogoItem>(store),
            ordered::<Client>(store),
            pricing(store),
            ordered::<Review>(store),
            ordered::<Faq>(store),
            singletons::current::<FooterContent>(store),
        );

        Self {
            hero: Section::from_result("hero", hero),
            about: Section::from_result("about", about.map(|a| a.unwrap_or_else(defaults::about))),
            services: Section::from_result("services", services),
            accordion: Section::from_result("accordion", accordion),
            pain_points: Section::from_result("pain points", pain_points),
            progress_stages: Section::from_result("progress stages", progress_stages),
            logos: Section::from_result("logos", logos),
            clients: Section::from_result("clients", clients),
            pricing: Section::from_result("pricing", pricing),
            reviews: Section::from_result("reviews", reviews),
            faqs: Section::from_result("FAQs", faqs),
            footer: Section::from_result("footer", footer.map(|f| f.unwrap_or_else(defaults::footer))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::content::FaqInput;
    use crate::content::collections::Collections;
    use crate::db::store::MemoryStore;
    use crate::test_utils::FailingStore;

    #[tokio::test]
    async fn empty_store_falls_back_to_defaults() {
        let store = MemoryStore::new();
        let landing = Landing::load(&store).await;

        assert_eq!(landing.hero.data, Some(None));
        assert_eq!(landing.about.data.unwrap().title, "About Our Digital Suite");
        assert_eq!(landing.footer.data.unwrap().company_name, "Digital Suite Pro");
        assert_eq!(landing.pricing.data.unwrap().contact_us_link, "#");
        assert!(landing.faqs.data.unwrap().is_empty());
    }

    #[tokio::test]
    async fn collections_come_in_display_order() {
        let store = MemoryStore::new();
        let faqs = Collections::<Faq>::new(&store);
        for q in ["First", "Second"] {
            faqs.create(FaqInput {
                question: q.into(),
                answer: "Yes".into(),
            })
            .await
            .unwrap();
        }
        let second = faqs.list().await.unwrap()[1].id;
        faqs.move_item(second, crate::content::reorder::Direction::Up).await.unwrap();

        let landing = Landing::load(&store).await;
        let questions: Vec<_> = landing.faqs.data.unwrap().into_iter().map(|f| f.question).collect();
        assert_eq!(questions, vec!["Second", "First"]);
    }

    #[tokio::test]
    async fn failed_sections_do_not_fail_the_page() {
        let landing = Landing::load(&FailingStore).await;
        assert!(landing.hero.is_failed());
        assert!(landing.faqs.is_failed());
        assert_eq!(landing.footer.error.as_deref(), Some("Could not load footer"));
    }
}
