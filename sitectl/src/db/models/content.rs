//! Records of the landing-page content tables.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::handlers::{Ordered, Record};
use crate::db::store::TableName;

/// Implements [`Record`] and [`Ordered`] for a struct with `id` and `order_index` fields.
macro_rules! ordered_record {
    ($ty:ty, $table:expr) => {
        impl Record for $ty {
            const TABLE: TableName = $table;

            fn id(&self) -> Uuid {
                self.id
            }
        }

        impl Ordered for $ty {
            fn order_index(&self) -> i32 {
                self.order_index
            }

            fn set_order_index(&mut self, order_index: i32) {
                self.order_index = order_index;
            }
        }
    };
}

macro_rules! record {
    ($ty:ty, $table:expr) => {
        impl Record for $ty {
            const TABLE: TableName = $table;

            fn id(&self) -> Uuid {
                self.id
            }
        }
    };
}

/// The hero banner at the top of the landing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HeroContent {
    pub id: Uuid,
    pub headline: String,
    /// HTML
    pub subheadline: String,
    pub background_image_url: String,
    pub cta_text: String,
    pub cta_link: String,
}
record!(HeroContent, TableName::HeroContent);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AboutContent {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: String,
}
record!(AboutContent, TableName::AboutContent);

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct FooterLink {
    pub text: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct SocialMedia {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FooterContent {
    pub id: Uuid,
    pub company_name: String,
    pub company_address: String,
    #[serde(default)]
    pub links: Vec<FooterLink>,
    #[serde(default)]
    pub social_media: SocialMedia,
}
record!(FooterContent, TableName::FooterContent);

/// A named site-wide value such as `contact_us_link`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WebsiteSetting {
    pub id: Uuid,
    pub setting_name: String,
    pub setting_value: String,
}
record!(WebsiteSetting, TableName::WebsiteSettings);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Service {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub image_url: String,
    /// HTML body of the service detail page
    pub page_content: String,
    pub order_index: i32,
}
ordered_record!(Service, TableName::Services);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Faq {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub order_index: i32,
}
ordered_record!(Faq, TableName::Faqs);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LogoItem {
    pub id: Uuid,
    pub image_url: String,
    pub alt_text: String,
    pub order_index: i32,
}
ordered_record!(LogoItem, TableName::LogoCarousel);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PainPoint {
    pub id: Uuid,
    /// Icon name understood by the front end, e.g. `Zap`
    pub icon: String,
    pub title: String,
    pub description: String,
    pub order_index: i32,
}
ordered_record!(PainPoint, TableName::PainPoints);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProgressStage {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub order_index: i32,
}
ordered_record!(ProgressStage, TableName::ProgressStages);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AccordionItem {
    pub id: Uuid,
    pub heading: String,
    /// HTML
    pub description: String,
    pub image_url: String,
    pub order_index: i32,
}
ordered_record!(AccordionItem, TableName::AccordionContent);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub logo_url: String,
    pub description: String,
    pub order_index: i32,
}
ordered_record!(Client, TableName::Clients);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PricingPlan {
    pub id: Uuid,
    pub name: String,
    /// Display price, e.g. `₹4,999/mo`
    pub price: String,
    /// HTML
    pub description: String,
    pub icon: String,
    pub is_featured: bool,
    /// Falls back to the `contact_us_link` setting when absent
    pub choose_plan_link: Option<String>,
    pub order_index: i32,
}
ordered_record!(PricingPlan, TableName::PricingPlans);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub id: Uuid,
    pub customer_name: String,
    pub designation: String,
    pub company_name: String,
    pub review_text: String,
    pub order_index: i32,
}
ordered_record!(Review, TableName::CustomerReviews);
