use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;

use crate::{
    AppState,
    api::{
        handlers::auth::format_invitation_token,
        models::users::{InvitationResponse, InviteUser, ProfileResponse, RoleUpdate},
    },
    auth::{
        events::AuthEvent,
        guard::{Admins, RequireRole},
        password,
    },
    db::{
        handlers::{Invitations, Repository, Users, invitations::InvitationCreateRequest},
        models::users::UserCreateDBRequest,
    },
    email::EmailService,
    errors::{Error, Result},
    types::UserId,
    validation::{Validator, non_blank},
};

fn user_not_found(id: UserId) -> Error {
    Error::NotFound {
        resource: "User".to_string(),
        id: id.to_string(),
    }
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    summary = "List users with their roles",
    responses(
        (status = 200, description = "Every profile, oldest first", body = [ProfileResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not an admin"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(State(state): State<AppState>, _: RequireRole<Admins>) -> Result<Json<Vec<ProfileResponse>>> {
    let profiles = Users::new(state.store.as_ref()).list_profiles().await?;
    Ok(Json(profiles.into_iter().map(ProfileResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/users/invitations",
    tag = "users",
    summary = "Invite a user by email",
    request_body = InviteUser,
    responses(
        (status = 201, description = "User created and invitation sent", body = InvitationResponse),
        (status = 400, description = "Invalid email"),
        (status = 409, description = "Email already registered"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn invite_user(
    State(state): State<AppState>,
    RequireRole(admin, _): RequireRole<Admins>,
    Json(request): Json<InviteUser>,
) -> Result<(StatusCode, Json<InvitationResponse>)> {
    Validator::new()
        .email("email", request.email.trim(), "Invalid email address.")
        .finish()?;
    let role = request.role.unwrap_or_default();
    let full_name = non_blank(request.full_name);

    let mut users = Users::new(state.store.as_ref());
    let user = users
        .create(&UserCreateDBRequest {
            email: request.email,
            password_hash: None,
            role,
            full_name: full_name.clone(),
            app_metadata: Default::default(),
        })
        .await?;

    let native = &state.config.auth.native;
    let expires_at = Utc::now()
        + chrono::Duration::from_std(native.invitation_expiry).map_err(|e| Error::Internal {
            operation: format!("compute invitation expiry: {e}"),
        })?;
    let secret = password::generate_invitation_token();
    let invitation = Invitations::new(state.store.as_ref())
        .create(&InvitationCreateRequest {
            user_id: user.id,
            raw_token: secret.clone(),
            expires_at,
            argon2_params: native.password.argon2_params(),
        })
        .await?;

    let token = format_invitation_token(invitation.id, &secret);
    let link = state.config.public_link(&format!("/admin/accept-invitation?token={token}"));
    let sent = match EmailService::new(&state.config) {
        Ok(email) => {
            email
                .send_invitation_email(&user.email, full_name.as_deref(), &link, native.invitation_expiry)
                .await
        }
        Err(e) => Err(e),
    };
    if let Err(e) = sent {
        // Without the email nobody can redeem the invitation
        users.delete(user.id).await?;
        return Err(e);
    }

    let profile = users.get_profile(user.id).await?.ok_or_else(|| user_not_found(user.id))?;
    tracing::info!(invited = %user.id, by = %admin.id, %role, "user invited");
    Ok((
        StatusCode::CREATED,
        Json(InvitationResponse {
            id: invitation.id,
            profile: profile.into(),
            expires_at: invitation.expires_at,
        }),
    ))
}

#[utoipa::path(
    patch,
    path = "/users/{id}/role",
    tag = "users",
    summary = "Change a user's role",
    request_body = RoleUpdate,
    responses(
        (status = 200, description = "Role changed", body = ProfileResponse),
        (status = 400, description = "Admins cannot change their own role"),
        (status = 404, description = "User not found"),
    ),
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    RequireRole(admin, _): RequireRole<Admins>,
    Json(update): Json<RoleUpdate>,
) -> Result<Json<ProfileResponse>> {
    if id == admin.id {
        return Err(Error::BadRequest {
            message: "You cannot change your own role".to_string(),
        });
    }

    let profile = match Users::new(state.store.as_ref()).set_role(id, update.role).await {
        Ok(profile) => profile,
        Err(crate::db::errors::DbError::NotFound) => return Err(user_not_found(id)),
        Err(e) => return Err(e.into()),
    };
    state.auth_events.publish(AuthEvent::RoleChanged {
        user_id: id,
        role: update.role,
    });
    Ok(Json(profile.into()))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    summary = "Delete a user",
    responses(
        (status = 204, description = "User, profile and invitations removed"),
        (status = 400, description = "Admins cannot delete themselves"),
        (status = 404, description = "User not found"),
    ),
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    RequireRole(admin, _): RequireRole<Admins>,
) -> Result<StatusCode> {
    if id == admin.id {
        return Err(Error::BadRequest {
            message: "You cannot delete your own account".to_string(),
        });
    }

    if Users::new(state.store.as_ref()).delete(id).await? {
        state.auth_events.publish(AuthEvent::UserDeleted { user_id: id });
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(user_not_found(id))
    }
}
