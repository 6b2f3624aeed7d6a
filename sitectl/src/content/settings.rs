//! Named site-wide values.

use tracing::instrument;
use uuid::Uuid;

use crate::db::handlers::Table;
use crate::db::models::content::WebsiteSetting;
use crate::db::store::{Query, Store};
use crate::errors::{Error, Result};

/// Target of the pricing plans' "choose plan" buttons when a plan has no link of its own.
pub const CONTACT_US_LINK: &str = "contact_us_link";

pub async fn get(store: &dyn Store, name: &str) -> Result<WebsiteSetting> {
    Table::<WebsiteSetting>::new(store)
        .fetch_single(Query::new().eq("setting_name", name.to_string()))
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Setting".to_string(),
            id: name.to_string(),
        })
}

/// Write a setting, creating it on first use.
#[instrument(skip(store, value), err)]
pub async fn put(store: &dyn Store, name: &str, value: &str) -> Result<WebsiteSetting> {
    let setting = WebsiteSetting {
        id: Uuid::new_v4(),
        setting_name: name.to_string(),
        setting_value: value.trim().to_string(),
    };
    Table::<WebsiteSetting>::new(store)
        .upsert(std::slice::from_ref(&setting), "setting_name")
        .await?
        .pop()
        .ok_or_else(|| Error::Internal {
            operation: format!("save setting {name}"),
        })
}

/// The contact link shown on pricing plans, `#` until one is configured.
pub async fn contact_us_link(store: &dyn Store) -> Result<String> {
    match get(store, CONTACT_US_LINK).await {
        Ok(setting) => Ok(setting.setting_value),
        Err(Error::NotFound { .. }) => Ok("#".to_string()),
        Err(e) => Err(e),
    }
}
