//! API request/response models for landing-page content.
//!
//! Missing string fields deserialize as empty strings, so a partially filled form reaches
//! validation and fails per field instead of failing to parse.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::content::reorder::Direction;
use crate::db::models::content::{FooterLink, SocialMedia};
use crate::errors::Result;
use crate::validation::{Validate, Validator, is_blank, is_valid_url, slugify};

/// Longest headline the hero banner accepts
pub const HEADLINE_MAX_CHARS: usize = 100;
/// Longest review text shown on a testimonial card
pub const REVIEW_TEXT_MAX_CHARS: usize = 186;

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct FaqInput {
    #[schema(example = "How long does onboarding take?")]
    pub question: String,
    pub answer: String,
}

impl Validate for FaqInput {
    fn validate(&self) -> Result<()> {
        Validator::new()
            .required("question", &self.question, "Question is required")
            .required("answer", &self.answer, "Answer is required")
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct LogoInput {
    pub image_url: String,
    pub alt_text: String,
}

impl Validate for LogoInput {
    fn validate(&self) -> Result<()> {
        Validator::new()
            .url("image_url", &self.image_url, "Invalid URL format")
            .required("alt_text", &self.alt_text, "Alt text is required")
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct PainPointInput {
    #[schema(example = "Zap")]
    pub icon: String,
    pub title: String,
    pub description: String,
}

impl Validate for PainPointInput {
    fn validate(&self) -> Result<()> {
        Validator::new()
            .required("icon", &self.icon, "Icon name is required")
            .required("title", &self.title, "Title is required")
            .required("description", &self.description, "Description is required")
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ProgressStageInput {
    pub title: String,
    pub description: String,
}

impl Validate for ProgressStageInput {
    fn validate(&self) -> Result<()> {
        Validator::new()
            .required("title", &self.title, "Title is required")
            .required("description", &self.description, "Description is required")
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ServiceInput {
    pub title: String,
    /// Generated from the title when left blank
    pub slug: String,
    /// Summary shown on the landing page card
    pub description: String,
    pub image_url: String,
    /// HTML body of the detail page
    pub page_content: String,
}

impl ServiceInput {
    /// The slug that will be stored: the given one made URL-safe, or one derived from the title.
    pub fn effective_slug(&self) -> String {
        if is_blank(&self.slug) {
            slugify(&self.title)
        } else {
            slugify(&self.slug)
        }
    }
}

impl Validate for ServiceInput {
    fn validate(&self) -> Result<()> {
        Validator::new()
            .required("title", &self.title, "Title is required")
            .required("slug", &self.effective_slug(), "Slug is required")
            .required("description", &self.description, "Summary description is required")
            .url("image_url", &self.image_url, "Must be a valid URL")
            .required("page_content", &self.page_content, "Page content is required")
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct AccordionInput {
    pub heading: String,
    pub description: String,
    pub image_url: String,
    /// Explicit position; appended after the last item when absent
    pub order_index: Option<i32>,
}

impl Validate for AccordionInput {
    fn validate(&self) -> Result<()> {
        Validator::new()
            .required("heading", &self.heading, "Heading is required.")
            .required("description", &self.description, "Description is required.")
            .url("image_url", &self.image_url, "Must be a valid URL.")
            .check(
                self.order_index.is_none_or(|i| i >= 0),
                "order_index",
                "Order index must be a non-negative integer.",
            )
            .finish()
    }
}

/// An entry of the clients editor. Entries without a name or logo are dropped on save.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ClientDraft {
    pub id: Option<Uuid>,
    pub name: String,
    pub logo_url: String,
    pub description: String,
}

/// An entry of the pricing editor. Entries without a name or price are dropped on save.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct PricingPlanDraft {
    pub id: Option<Uuid>,
    pub name: String,
    pub price: String,
    pub description: String,
    pub icon: String,
    pub is_featured: bool,
    pub choose_plan_link: Option<String>,
}

/// An entry of the reviews editor. Entries without a customer name or text, or with text over
/// the card limit, are dropped on save.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ReviewDraft {
    pub id: Option<Uuid>,
    pub customer_name: String,
    pub designation: String,
    pub company_name: String,
    pub review_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct HeroInput {
    pub headline: String,
    /// HTML
    pub subheadline: String,
    pub background_image_url: String,
    pub cta_text: String,
    pub cta_link: String,
}

impl Validate for HeroInput {
    fn validate(&self) -> Result<()> {
        Validator::new()
            .required("headline", &self.headline, "Headline is required")
            .max_chars(
                "headline",
                &self.headline,
                HEADLINE_MAX_CHARS,
                "Headline must be at most 100 characters",
            )
            .url("background_image_url", &self.background_image_url, "Must be a valid URL")
            .required("cta_text", &self.cta_text, "Button text is required")
            .required("cta_link", &self.cta_link, "Button link is required")
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct AboutInput {
    pub title: String,
    pub description: String,
    pub image_url: String,
}

impl Validate for AboutInput {
    fn validate(&self) -> Result<()> {
        Validator::new()
            .required("title", &self.title, "Title is required")
            .required("description", &self.description, "Description is required")
            .check(
                is_blank(&self.image_url) || is_valid_url(&self.image_url),
                "image_url",
                "Must be a valid URL",
            )
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct FooterInput {
    pub company_name: String,
    pub company_address: String,
    pub links: Vec<FooterLink>,
    pub social_media: SocialMedia,
}

impl Validate for FooterInput {
    fn validate(&self) -> Result<()> {
        let mut v = Validator::new();
        v.required("company_name", &self.company_name, "Company name is required")
            .required("company_address", &self.company_address, "Company address is required");
        for (i, link) in self.links.iter().enumerate() {
            v.required(&format!("links[{i}].text"), &link.text, "Link text is required")
                .required(&format!("links[{i}].url"), &link.url, "Link URL is required");
        }
        let socials = [
            ("social_media.instagram", &self.social_media.instagram),
            ("social_media.facebook", &self.social_media.facebook),
            ("social_media.whatsapp", &self.social_media.whatsapp),
        ];
        for (field, value) in socials {
            if let Some(url) = value.as_deref().filter(|u| !is_blank(u)) {
                v.url(field, url, "Must be a valid URL");
            }
        }
        v.finish()
    }
}

/// Request body for writing a site setting.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SettingInput {
    pub setting_value: String,
}

impl Validate for SettingInput {
    fn validate(&self) -> Result<()> {
        Validator::new()
            .required("setting_value", &self.setting_value, "Value is required")
            .finish()
    }
}

/// Request body for moving an item one position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct MoveRequest {
    pub direction: Direction,
}

/// A singleton section as the editor sees it. Unconfigured sections carry an empty draft.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SingletonView<I> {
    /// Whether a row exists yet
    pub configured: bool,
    pub id: Option<Uuid>,
    pub content: I,
}

/// Collections edited one item at a time, as named in URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionKind {
    Faqs,
    Logos,
    PainPoints,
    ProgressStages,
    Services,
    Accordion,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 6] = [
        CollectionKind::Services,
        CollectionKind::Accordion,
        CollectionKind::PainPoints,
        CollectionKind::ProgressStages,
        CollectionKind::Logos,
        CollectionKind::Faqs,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            CollectionKind::Faqs => "faqs",
            CollectionKind::Logos => "logos",
            CollectionKind::PainPoints => "pain-points",
            CollectionKind::ProgressStages => "progress-stages",
            CollectionKind::Services => "services",
            CollectionKind::Accordion => "accordion",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            CollectionKind::Faqs => "FAQs",
            CollectionKind::Logos => "Logo Carousel",
            CollectionKind::PainPoints => "Pain Points",
            CollectionKind::ProgressStages => "Progress Stages",
            CollectionKind::Services => "Services",
            CollectionKind::Accordion => "Accordion",
        }
    }
}

/// Collections saved as a whole list, as named in URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ListKind {
    Clients,
    PricingPlans,
    Reviews,
}

impl ListKind {
    pub const ALL: [ListKind; 3] = [ListKind::Clients, ListKind::PricingPlans, ListKind::Reviews];

    pub fn slug(&self) -> &'static str {
        match self {
            ListKind::Clients => "clients",
            ListKind::PricingPlans => "pricing-plans",
            ListKind::Reviews => "reviews",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ListKind::Clients => "Clients",
            ListKind::PricingPlans => "Pricing Plans",
            ListKind::Reviews => "Customer Reviews",
        }
    }
}

/// Single-row sections, as named in URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SectionKind {
    Hero,
    About,
    Footer,
}

impl SectionKind {
    pub const ALL: [SectionKind; 3] = [SectionKind::Hero, SectionKind::About, SectionKind::Footer];

    pub fn slug(&self) -> &'static str {
        match self {
            SectionKind::Hero => "hero",
            SectionKind::About => "about",
            SectionKind::Footer => "footer",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::Hero => "Hero Section",
            SectionKind::About => "About Section",
            SectionKind::Footer => "Footer",
        }
    }
}
