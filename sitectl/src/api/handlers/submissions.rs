use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    AppState,
    api::models::submissions::{ContactSubmissionCreate, ListSubmissionsQuery, OptionCreate, SubmissionUpdate},
    auth::guard::{Editors, Members, RequireRole},
    db::models::submissions::{ContactSubmission, OptionList, SubmissionOption},
    errors::Result,
    submissions::Submissions,
};

/// Submit the public contact form
#[utoipa::path(
    post,
    path = "/contact-submissions",
    tag = "public",
    request_body = ContactSubmissionCreate,
    responses(
        (status = 201, description = "Submission received", body = ContactSubmission),
        (status = 400, description = "Validation failed"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn submit_contact_form(
    State(state): State<AppState>,
    Json(form): Json<ContactSubmissionCreate>,
) -> Result<(StatusCode, Json<ContactSubmission>)> {
    let submission = Submissions::new(state.store.as_ref()).create(form).await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

/// List submissions
///
/// The whole set is filtered and sorted on every call; there is no paging.
#[utoipa::path(
    get,
    path = "/submissions",
    tag = "submissions",
    params(ListSubmissionsQuery),
    responses(
        (status = 200, description = "Matching submissions", body = [ContactSubmission]),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_submissions(
    State(state): State<AppState>,
    Query(query): Query<ListSubmissionsQuery>,
    _: RequireRole<Members>,
) -> Result<Json<Vec<ContactSubmission>>> {
    Ok(Json(Submissions::new(state.store.as_ref()).list(&query).await?))
}

#[utoipa::path(
    get,
    path = "/submissions/{id}",
    tag = "submissions",
    params(("id" = uuid::Uuid, Path, description = "Submission ID")),
    responses(
        (status = 200, description = "The submission", body = ContactSubmission),
        (status = 404, description = "No such submission"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _: RequireRole<Members>,
) -> Result<Json<ContactSubmission>> {
    Ok(Json(Submissions::new(state.store.as_ref()).get(id).await?))
}

/// Update the admin fields of a submission
///
/// Only `admin_notes`, `checked`, `status`, `services_of_interest`, `follow_up_date` and
/// `assigned_to_emails` may be sent.
#[utoipa::path(
    patch,
    path = "/submissions/{id}",
    tag = "submissions",
    params(("id" = uuid::Uuid, Path, description = "Submission ID")),
    request_body = SubmissionUpdate,
    responses(
        (status = 200, description = "Updated submission", body = ContactSubmission),
        (status = 400, description = "Empty update or invalid email"),
        (status = 404, description = "No such submission"),
        (status = 422, description = "Body names a field that cannot be edited"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _: RequireRole<Editors>,
    Json(update): Json<SubmissionUpdate>,
) -> Result<Json<ContactSubmission>> {
    Ok(Json(Submissions::new(state.store.as_ref()).update(id, update).await?))
}

#[utoipa::path(
    delete,
    path = "/submissions/{id}",
    tag = "submissions",
    params(("id" = uuid::Uuid, Path, description = "Submission ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "No such submission"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _: RequireRole<Editors>,
) -> Result<StatusCode> {
    Submissions::new(state.store.as_ref()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/submission-options/{list}",
    tag = "submissions",
    params(("list" = OptionList, Path, description = "Option list")),
    responses((status = 200, description = "Options sorted by name", body = [SubmissionOption])),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_options(
    State(state): State<AppState>,
    Path(list): Path<OptionList>,
    _: RequireRole<Members>,
) -> Result<Json<Vec<SubmissionOption>>> {
    Ok(Json(Submissions::new(state.store.as_ref()).options(list).await?))
}

#[utoipa::path(
    post,
    path = "/submission-options/{list}",
    tag = "submissions",
    params(("list" = OptionList, Path, description = "Option list")),
    request_body = OptionCreate,
    responses(
        (status = 201, description = "Created option", body = SubmissionOption),
        (status = 409, description = "An option with this name exists"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_option(
    State(state): State<AppState>,
    Path(list): Path<OptionList>,
    _: RequireRole<Editors>,
    Json(input): Json<OptionCreate>,
) -> Result<(StatusCode, Json<SubmissionOption>)> {
    let option = Submissions::new(state.store.as_ref()).create_option(list, input).await?;
    Ok((StatusCode::CREATED, Json(option)))
}

#[utoipa::path(
    delete,
    path = "/submission-options/{list}/{id}",
    tag = "submissions",
    params(
        ("list" = OptionList, Path, description = "Option list"),
        ("id" = uuid::Uuid, Path, description = "Option ID"),
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "No such option"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_option(
    State(state): State<AppState>,
    Path((list, id)): Path<(OptionList, Uuid)>,
    _: RequireRole<Editors>,
) -> Result<StatusCode> {
    Submissions::new(state.store.as_ref()).delete_option(list, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
