//! Admin endpoints for landing-page content.
//!
//! Each family of tables shares one set of routes, keyed by a kind segment in the path:
//! `/content/{collection}` for item-at-a-time collections, `/lists/{list}` for collections saved
//! as a whole and `/sections/{section}` for single-row sections. Bodies are decoded into the
//! kind's own input type, so validation is the same as for a dedicated route.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    AppState,
    api::models::content::{CollectionKind, ListKind, MoveRequest, SectionKind, SettingInput},
    auth::guard::{Editors, Members, RequireRole},
    content::{
        Collection, Collections,
        bulk::{self, BulkCollection},
        settings, singletons,
    },
    db::{handlers::Table, models::content::WebsiteSetting},
    errors::{Error, Result},
    validation::Validate,
};

macro_rules! with_collection {
    ($kind:expr, $t:ident => $body:expr) => {
        match $kind {
            $crate::api::models::content::CollectionKind::Faqs => {
                type $t = $crate::db::models::content::Faq;
                $body
            }
            $crate::api::models::content::CollectionKind::Logos => {
                type $t = $crate::db::models::content::LogoItem;
                $body
            }
            $crate::api::models::content::CollectionKind::PainPoints => {
                type $t = $crate::db::models::content::PainPoint;
                $body
            }
            $crate::api::models::content::CollectionKind::ProgressStages => {
                type $t = $crate::db::models::content::ProgressStage;
                $body
            }
            $crate::api::models::content::CollectionKind::Services => {
                type $t = $crate::db::models::content::Service;
                $body
            }
            $crate::api::models::content::CollectionKind::Accordion => {
                type $t = $crate::db::models::content::AccordionItem;
                $body
            }
        }
    };
}
pub(crate) use with_collection;

macro_rules! with_list {
    ($kind:expr, $t:ident => $body:expr) => {
        match $kind {
            $crate::api::models::content::ListKind::Clients => {
                type $t = $crate::db::models::content::Client;
                $body
            }
            $crate::api::models::content::ListKind::PricingPlans => {
                type $t = $crate::db::models::content::PricingPlan;
                $body
            }
            $crate::api::models::content::ListKind::Reviews => {
                type $t = $crate::db::models::content::Review;
                $body
            }
        }
    };
}
pub(crate) use with_list;

macro_rules! with_section {
    ($kind:expr, $t:ident => $body:expr) => {
        match $kind {
            $crate::api::models::content::SectionKind::Hero => {
                type $t = $crate::db::models::content::HeroContent;
                $body
            }
            $crate::api::models::content::SectionKind::About => {
                type $t = $crate::db::models::content::AboutContent;
                $body
            }
            $crate::api::models::content::SectionKind::Footer => {
                type $t = $crate::db::models::content::FooterContent;
                $body
            }
        }
    };
}
pub(crate) use with_section;

fn to_json<T: Serialize>(value: T) -> Result<Json<Value>> {
    serde_json::to_value(value).map(Json).map_err(|e| Error::Internal {
        operation: format!("serialize response: {e}"),
    })
}

fn from_json<T: DeserializeOwned>(body: Value) -> Result<T> {
    serde_json::from_value(body).map_err(|e| Error::BadRequest {
        message: format!("Invalid request body: {e}"),
    })
}

async fn create_in<T: Collection>(state: &AppState, body: Value) -> Result<Json<Value>> {
    to_json(Collections::<T>::new(state.store.as_ref()).create(from_json(body)?).await?)
}

async fn update_in<T: Collection>(state: &AppState, id: Uuid, body: Value) -> Result<Json<Value>> {
    to_json(Collections::<T>::new(state.store.as_ref()).update(id, from_json(body)?).await?)
}

async fn replace_in<T: BulkCollection>(state: &AppState, body: Value) -> Result<Json<Value>>
where
    T::Draft: DeserializeOwned,
{
    to_json(bulk::replace_all::<T>(state.store.as_ref(), from_json(body)?).await?)
}

async fn save_section<T: singletons::Singleton>(state: &AppState, body: Value) -> Result<Json<Value>> {
    to_json(singletons::save::<T>(state.store.as_ref(), from_json(body)?).await?)
}

#[utoipa::path(
    get,
    path = "/content/{collection}",
    tag = "content",
    summary = "List a collection in display order",
    params(("collection" = CollectionKind, Path, description = "Collection name")),
    responses(
        (status = 200, description = "Items sorted by order_index", body = serde_json::Value),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(collection = ?kind))]
pub async fn list_items(
    State(state): State<AppState>,
    Path(kind): Path<CollectionKind>,
    _: RequireRole<Members>,
) -> Result<Json<Value>> {
    with_collection!(kind, T => to_json(Collections::<T>::new(state.store.as_ref()).list().await?))
}

#[utoipa::path(
    get,
    path = "/content/{collection}/{id}",
    tag = "content",
    summary = "Get one item",
    params(
        ("collection" = CollectionKind, Path, description = "Collection name"),
        ("id" = uuid::Uuid, Path, description = "Item ID"),
    ),
    responses(
        (status = 200, description = "The item", body = serde_json::Value),
        (status = 404, description = "No such item"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(collection = ?kind))]
pub async fn get_item(
    State(state): State<AppState>,
    Path((kind, id)): Path<(CollectionKind, Uuid)>,
    _: RequireRole<Members>,
) -> Result<Json<Value>> {
    with_collection!(kind, T => to_json(Collections::<T>::new(state.store.as_ref()).get(id).await?))
}

#[utoipa::path(
    post,
    path = "/content/{collection}",
    tag = "content",
    summary = "Append an item",
    params(("collection" = CollectionKind, Path, description = "Collection name")),
    request_body = serde_json::Value,
    responses(
        (status = 201, description = "Created item, placed after the last one", body = serde_json::Value),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Viewers cannot edit"),
        (status = 409, description = "Slug or requested position already taken"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(collection = ?kind))]
pub async fn create_item(
    State(state): State<AppState>,
    Path(kind): Path<CollectionKind>,
    _: RequireRole<Editors>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>)> {
    let created = with_collection!(kind, T => create_in::<T>(&state, body).await?);
    Ok((StatusCode::CREATED, created))
}

#[utoipa::path(
    put,
    path = "/content/{collection}/{id}",
    tag = "content",
    summary = "Replace an item's content",
    params(
        ("collection" = CollectionKind, Path, description = "Collection name"),
        ("id" = uuid::Uuid, Path, description = "Item ID"),
    ),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Updated item", body = serde_json::Value),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "No such item"),
        (status = 409, description = "Slug or requested position already taken"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(collection = ?kind))]
pub async fn update_item(
    State(state): State<AppState>,
    Path((kind, id)): Path<(CollectionKind, Uuid)>,
    _: RequireRole<Editors>,
    Json(body): Json<Value>,
) -> Result<Json<Value>> {
    with_collection!(kind, T => update_in::<T>(&state, id, body).await)
}

#[utoipa::path(
    delete,
    path = "/content/{collection}/{id}",
    tag = "content",
    summary = "Delete an item",
    params(
        ("collection" = CollectionKind, Path, description = "Collection name"),
        ("id" = uuid::Uuid, Path, description = "Item ID"),
    ),
    responses(
        (status = 204, description = "Deleted; other items keep their positions"),
        (status = 404, description = "No such item"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(collection = ?kind))]
pub async fn delete_item(
    State(state): State<AppState>,
    Path((kind, id)): Path<(CollectionKind, Uuid)>,
    _: RequireRole<Editors>,
) -> Result<StatusCode> {
    with_collection!(kind, T => Collections::<T>::new(state.store.as_ref()).delete(id).await?);
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/content/{collection}/{id}/move",
    tag = "content",
    summary = "Move an item one position up or down",
    params(
        ("collection" = CollectionKind, Path, description = "Collection name"),
        ("id" = uuid::Uuid, Path, description = "Item ID"),
    ),
    request_body = MoveRequest,
    responses(
        (status = 200, description = "The collection in its new order", body = serde_json::Value),
        (status = 404, description = "No such item"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(collection = ?kind))]
pub async fn move_item(
    State(state): State<AppState>,
    Path((kind, id)): Path<(CollectionKind, Uuid)>,
    _: RequireRole<Editors>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<Value>> {
    with_collection!(kind, T => to_json(
        Collections::<T>::new(state.store.as_ref())
            .move_item(id, request.direction)
            .await?
    ))
}

#[utoipa::path(
    get,
    path = "/lists/{list}",
    tag = "content",
    summary = "Get a whole-list collection",
    params(("list" = ListKind, Path, description = "List name")),
    responses((status = 200, description = "Items sorted by order_index", body = serde_json::Value)),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(list = ?kind))]
pub async fn get_list(
    State(state): State<AppState>,
    Path(kind): Path<ListKind>,
    _: RequireRole<Members>,
) -> Result<Json<Value>> {
    with_list!(kind, T => to_json(Table::<T>::new(state.store.as_ref()).list_ordered().await?))
}

#[utoipa::path(
    put,
    path = "/lists/{list}",
    tag = "content",
    summary = "Replace a whole-list collection",
    description = "Incomplete entries are dropped, the rest are renumbered in the given order. \
                   Entries carrying the id of a stored row update it; stored rows not mentioned are deleted.",
    params(("list" = ListKind, Path, description = "List name")),
    request_body = serde_json::Value,
    responses((status = 200, description = "The saved list", body = serde_json::Value)),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(list = ?kind))]
pub async fn replace_list(
    State(state): State<AppState>,
    Path(kind): Path<ListKind>,
    _: RequireRole<Editors>,
    Json(body): Json<Value>,
) -> Result<Json<Value>> {
    with_list!(kind, T => replace_in::<T>(&state, body).await)
}

#[utoipa::path(
    get,
    path = "/sections/{section}",
    tag = "content",
    summary = "Get a single-row section",
    params(("section" = SectionKind, Path, description = "Section name")),
    responses((status = 200, description = "Stored content, or a draft when unconfigured", body = serde_json::Value)),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(section = ?kind))]
pub async fn get_section(
    State(state): State<AppState>,
    Path(kind): Path<SectionKind>,
    _: RequireRole<Members>,
) -> Result<Json<Value>> {
    with_section!(kind, T => to_json(singletons::fetch::<T>(state.store.as_ref()).await?))
}

#[utoipa::path(
    put,
    path = "/sections/{section}",
    tag = "content",
    summary = "Save a single-row section",
    params(("section" = SectionKind, Path, description = "Section name")),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Saved content", body = serde_json::Value),
        (status = 400, description = "Validation failed"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(section = ?kind))]
pub async fn save_section_content(
    State(state): State<AppState>,
    Path(kind): Path<SectionKind>,
    _: RequireRole<Editors>,
    Json(body): Json<Value>,
) -> Result<Json<Value>> {
    with_section!(kind, T => save_section::<T>(&state, body).await)
}

#[utoipa::path(
    get,
    path = "/settings/{name}",
    tag = "content",
    summary = "Get a site setting",
    params(("name" = String, Path, description = "Setting name, e.g. contact_us_link")),
    responses(
        (status = 200, description = "The setting", body = WebsiteSetting),
        (status = 404, description = "Not set"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_setting(
    State(state): State<AppState>,
    Path(name): Path<String>,
    _: RequireRole<Members>,
) -> Result<Json<WebsiteSetting>> {
    Ok(Json(settings::get(state.store.as_ref(), &name).await?))
}

#[utoipa::path(
    put,
    path = "/settings/{name}",
    tag = "content",
    summary = "Write a site setting",
    params(("name" = String, Path, description = "Setting name")),
    request_body = SettingInput,
    responses(
        (status = 200, description = "The stored setting", body = WebsiteSetting),
        (status = 400, description = "Empty value"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn put_setting(
    State(state): State<AppState>,
    Path(name): Path<String>,
    _: RequireRole<Editors>,
    Json(input): Json<SettingInput>,
) -> Result<Json<WebsiteSetting>> {
    input.validate()?;
    Ok(Json(settings::put(state.store.as_ref(), &name, &input.setting_value).await?))
}
