//! OpenAPI documentation, served at `/admin/docs`.
//!
//! The document covers every JSON surface of the server:
//! - authentication at `/authentication/*`
//! - the role-gated admin API at `/admin/api/v1/*`
//! - the public API at `/api/v1/*`
//! - service-key functions at `/functions/v1/*`

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::{api, pages};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.security_schemes.insert(
            "BearerAuth".to_string(),
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some(
                        "Session token as issued by `/authentication/login`, sent as \
                         `Authorization: Bearer <token>`.",
                    ))
                    .build(),
            ),
        );
        components.security_schemes.insert(
            "CookieAuth".to_string(),
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "sitectl_session",
                "Session cookie set by the login endpoints.",
            ))),
        );
        components.security_schemes.insert(
            "ServiceKey".to_string(),
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("The configured `service_key`."))
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::dashboard::get_dashboard,
        api::handlers::content::list_items,
        api::handlers::content::get_item,
        api::handlers::content::create_item,
        api::handlers::content::update_item,
        api::handlers::content::delete_item,
        api::handlers::content::move_item,
        api::handlers::content::get_list,
        api::handlers::content::replace_list,
        api::handlers::content::get_section,
        api::handlers::content::save_section_content,
        api::handlers::content::get_setting,
        api::handlers::content::put_setting,
        api::handlers::submissions::list_submissions,
        api::handlers::submissions::get_submission,
        api::handlers::submissions::update_submission,
        api::handlers::submissions::delete_submission,
        api::handlers::submissions::list_options,
        api::handlers::submissions::create_option,
        api::handlers::submissions::delete_option,
        api::handlers::users::list_users,
        api::handlers::users::invite_user,
        api::handlers::users::update_role,
        api::handlers::users::delete_user,
    ),
    components(schemas(
        api::models::content::CollectionKind,
        api::models::content::ListKind,
        api::models::content::SectionKind,
        api::models::content::FaqInput,
        api::models::content::LogoInput,
        api::models::content::PainPointInput,
        api::models::content::ProgressStageInput,
        api::models::content::ServiceInput,
        api::models::content::AccordionInput,
        api::models::content::ClientDraft,
        api::models::content::PricingPlanDraft,
        api::models::content::ReviewDraft,
        api::models::content::HeroInput,
        api::models::content::AboutInput,
        api::models::content::FooterInput,
        crate::db::models::content::Faq,
        crate::db::models::content::LogoItem,
        crate::db::models::content::PainPoint,
        crate::db::models::content::ProgressStage,
        crate::db::models::content::Service,
        crate::db::models::content::AccordionItem,
        crate::db::models::content::Client,
        crate::db::models::content::PricingPlan,
        crate::db::models::content::Review,
    )),
    tags(
        (name = "dashboard", description = "Overview of configured sections, collection sizes and leads."),
        (name = "content", description = "Landing page content.

Collections under `/content/{collection}` are edited one item at a time and reordered with single-step moves.
Lists under `/lists/{list}` are saved as a whole: the stored rows are replaced by the submitted list.
Sections under `/sections/{section}` hold at most one row."),
        (name = "submissions", description = "Leads from the contact form and the option lists used to triage them."),
        (name = "users", description = "Administrator-only user management."),
    )
)]
pub struct AdminApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::submissions::submit_contact_form,
        pages::site::landing_json,
    ),
    tags((name = "public", description = "Unauthenticated endpoints used by the public site."))
)]
pub struct PublicApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::functions::create_admin_user,
        api::handlers::functions::set_admin_metadata,
    ),
    tags((name = "functions", description = "Privileged operations authorised by the service key rather than a session."))
)]
pub struct FunctionsApi;

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::auth::get_session,
        api::handlers::auth::refresh,
        api::handlers::auth::accept_invitation,
    ),
    nest(
        (path = "/admin/api/v1", api = AdminApi),
        (path = "/api/v1", api = PublicApi),
        (path = "/functions/v1", api = FunctionsApi),
    ),
    tags(
        (name = "authentication", description = "Sessions for the admin console.

Sign in with email and password to receive an HTTP-only session cookie; the same token may be sent as a bearer token.
Invited users set their password through the invitation endpoint before signing in."),
    ),
    info(
        title = "sitectl API",
        version = "1.0.0",
        description = "Content, lead and user management for the marketing site.

## Roles

- **viewer**: read content, leads and the dashboard
- **editor**: everything a viewer can, plus editing content and leads
- **admin**: everything an editor can, plus user management

## Errors

Validation failures answer 400 with per-field messages:

```json
{
  \"message\": \"Please correct the highlighted fields\",
  \"errors\": [{\"field\": \"question\", \"message\": \"Question is required\"}]
}
```

Other errors answer with a plain-text message and the matching status code."
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_surface() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/authentication/login",
            "/admin/api/v1/content/{collection}/{id}/move",
            "/admin/api/v1/lists/{list}",
            "/admin/api/v1/users/invitations",
            "/api/v1/contact-submissions",
            "/api/v1/landing",
            "/functions/v1/create-admin-user",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }

        let schemes = &doc.components.unwrap().security_schemes;
        assert!(schemes.contains_key("CookieAuth"));
        assert!(schemes.contains_key("ServiceKey"));
    }
}
