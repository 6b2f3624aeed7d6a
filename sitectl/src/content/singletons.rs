//! Sections stored as at most one row: hero, about and footer.
//!
//! Each table carries a `singleton` column that is always `true` and unique, and every save is an
//! upsert on it, so concurrent first saves still leave a single row.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::api::models::content::{AboutInput, FooterInput, HeroInput, SingletonView};
use crate::db::handlers::{
    Record, Table,
    table::{from_row, to_row},
};
use crate::db::models::content::{AboutContent, FooterContent, HeroContent};
use crate::db::errors::DbError;
use crate::db::store::{Query, Store, WriteBatch};
use crate::errors::Result;
use crate::types::abbrev_uuid;
use crate::validation::{Validate, is_blank};

/// Unique column holding `true` on the one row of a singleton table.
pub const SINGLETON_KEY: &str = "singleton";

/// A section with a single editable row.
pub trait Singleton: Record {
    type Input: Validate + Serialize + DeserializeOwned + Clone + Default + Send + Sync + 'static;

    /// The content an editor starts from before anything is saved.
    fn draft() -> Self::Input {
        Self::Input::default()
    }

    fn to_input(&self) -> Self::Input;

    fn from_input(id: Uuid, input: Self::Input) -> Self;
}

/// The stored row, if the section has been configured.
pub async fn current<T: Singleton>(store: &dyn Store) -> Result<Option<T>> {
    Ok(Table::<T>::new(store).fetch_single(Query::new()).await?)
}

/// What the editor shows: the stored content, or a draft when nothing is stored yet.
#[instrument(skip(store), fields(table = %T::TABLE), err)]
pub async fn fetch<T: Singleton>(store: &dyn Store) -> Result<SingletonView<T::Input>> {
    Ok(match current::<T>(store).await? {
        Some(row) => SingletonView {
            configured: true,
            id: Some(row.id()),
            content: row.to_input(),
        },
        None => SingletonView {
            configured: false,
            id: None,
            content: T::draft(),
        },
    })
}

/// Validate and store the section, updating the existing row in place or inserting the first.
///
/// The existing row keeps its id; the fresh id is used only when no row exists yet.
#[instrument(skip(store, input), fields(table = %T::TABLE), err)]
pub async fn save<T: Singleton>(store: &dyn Store, input: T::Input) -> Result<SingletonView<T::Input>> {
    input.validate()?;
    let mut row = to_row(T::TABLE, &T::from_input(Uuid::new_v4(), input))?;
    row.insert(SINGLETON_KEY.to_string(), Value::Bool(true));

    let mut written = store
        .apply(WriteBatch::new().upsert(T::TABLE, vec![row], SINGLETON_KEY))
        .await?;
    let row = written
        .pop()
        .and_then(|mut rows| rows.pop())
        .ok_or_else(|| DbError::Other(anyhow::anyhow!("upsert into {} returned no row", T::TABLE)))?;
    let saved: T = from_row(T::TABLE, row)?;
    info!(id = %abbrev_uuid(&saved.id()), "saved section");
    Ok(SingletonView {
        configured: true,
        id: Some(saved.id()),
        content: saved.to_input(),
    })
}

impl Singleton for HeroContent {
    type Input = HeroInput;

    fn draft() -> HeroInput {
        HeroInput {
            cta_text: "Get Started Now".to_string(),
            ..Default::default()
        }
    }

    fn to_input(&self) -> HeroInput {
        HeroInput {
            headline: self.headline.clone(),
            subheadline: self.subheadline.clone(),
            background_image_url: self.background_image_url.clone(),
            cta_text: self.cta_text.clone(),
            cta_link: self.cta_link.clone(),
        }
    }

    fn from_input(id: Uuid, input: HeroInput) -> Self {
        Self {
            id,
            headline: input.headline.trim().to_string(),
            subheadline: input.subheadline,
            background_image_url: input.background_image_url.trim().to_string(),
            cta_text: input.cta_text.trim().to_string(),
            cta_link: input.cta_link.trim().to_string(),
        }
    }
}

impl Singleton for AboutContent {
    type Input = AboutInput;

    fn to_input(&self) -> AboutInput {
        AboutInput {
            title: self.title.clone(),
            description: self.description.clone(),
            image_url: self.image_url.clone(),
        }
    }

    fn from_input(id: Uuid, input: AboutInput) -> Self {
        Self {
            id,
            title: input.title.trim().to_string(),
            description: input.description,
            image_url: input.image_url.trim().to_string(),
        }
    }
}

impl Singleton for FooterContent {
    type Input = FooterInput;

    fn to_input(&self) -> FooterInput {
        FooterInput {
            company_name: self.company_name.clone(),
            company_address: self.company_address.clone(),
            links: self.links.clone(),
            social_media: self.social_media.clone(),
        }
    }

    fn from_input(id: Uuid, mut input: FooterInput) -> Self {
        let social = &mut input.social_media;
        for handle in [&mut social.instagram, &mut social.facebook, &mut social.whatsapp] {
            if handle.as_deref().is_some_and(is_blank) {
                *handle = None;
            }
        }
        Self {
            id,
            company_name: input.company_name.trim().to_string(),
            company_address: input.company_address.trim().to_string(),
            links: input.links,
            social_media: input.social_media,
        }
    }
}
