use axum::{
    Extension, Form,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use minijinja::context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    AppState,
    api::{
        handlers::{
            auth::{
                INVITATION_ACCEPTED, authenticate, create_session_cookie, expired_session_cookie, redeem_invitation,
            },
            content::{with_collection, with_list, with_section},
            dashboard::load_summary,
        },
        models::{
            auth::LoginRequest,
            content::{CollectionKind, ListKind, SectionKind},
            submissions::{ListSubmissionsQuery, SubmissionSort},
            users::{CurrentUser, ProfileResponse, Role},
        },
    },
    auth::{events::AuthEvent, session},
    content::{Collections, singletons},
    db::{
        handlers::{Table, Users},
        models::{content::WebsiteSetting, submissions::OptionList},
        store::{Query as StoreQuery, SortOrder},
    },
    errors::{Error, Result},
    pages::{not_found, render},
    submissions::Submissions,
};

const DASHBOARD_PATH: &str = "/admin/dashboard";

/// How a form control edits a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Input {
    Text,
    Textarea,
    Url,
    Number,
    Checkbox,
    Date,
    /// Comma-separated strings
    List,
    /// Free-form JSON value
    Json,
    Select,
    Multiselect,
}

/// One editable field of a screen's form.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Field {
    pub name: &'static str,
    pub label: &'static str,
    pub input: Input,
    /// Blank input is sent as `null`
    pub optional: bool,
}

const fn field(name: &'static str, label: &'static str, input: Input) -> Field {
    Field {
        name,
        label,
        input,
        optional: false,
    }
}

const fn optional(name: &'static str, label: &'static str, input: Input) -> Field {
    Field {
        name,
        label,
        input,
        optional: true,
    }
}

const HERO_FIELDS: &[Field] = &[
    field("headline", "Headline", Input::Text),
    field("subheadline", "Subheadline (HTML)", Input::Textarea),
    field("background_image_url", "Background image URL", Input::Url),
    field("cta_text", "Button text", Input::Text),
    field("cta_link", "Button link", Input::Text),
];
const ABOUT_FIELDS: &[Field] = &[
    field("title", "Title", Input::Text),
    field("description", "Description (HTML)", Input::Textarea),
    field("image_url", "Image URL", Input::Url),
];
const FOOTER_FIELDS: &[Field] = &[
    field("company_name", "Company name", Input::Text),
    field("company_address", "Company address", Input::Textarea),
    field("links", "Links (JSON list of {text, url})", Input::Json),
    field("social_media", "Social media (JSON object)", Input::Json),
];
const FAQ_FIELDS: &[Field] = &[
    field("question", "Question", Input::Text),
    field("answer", "Answer", Input::Textarea),
];
const LOGO_FIELDS: &[Field] = &[
    field("image_url", "Image URL", Input::Url),
    field("alt_text", "Alt text", Input::Text),
];
const PAIN_POINT_FIELDS: &[Field] = &[
    field("icon", "Icon", Input::Text),
    field("title", "Title", Input::Text),
    field("description", "Description", Input::Textarea),
];
const PROGRESS_STAGE_FIELDS: &[Field] = &[
    field("title", "Title", Input::Text),
    field("description", "Description", Input::Textarea),
];
const SERVICE_FIELDS: &[Field] = &[
    field("title", "Title", Input::Text),
    field("slug", "Slug (derived from the title when blank)", Input::Text),
    field("description", "Summary", Input::Textarea),
    field("image_url", "Image URL", Input::Url),
    field("page_content", "Page content (HTML)", Input::Textarea),
];
const ACCORDION_FIELDS: &[Field] = &[
    field("heading", "Heading", Input::Text),
    field("description", "Description", Input::Textarea),
    field("image_url", "Image URL", Input::Url),
    optional("order_index", "Position (appended when blank)", Input::Number),
];
const CLIENT_FIELDS: &[Field] = &[
    field("name", "Name", Input::Text),
    field("logo_url", "Logo URL", Input::Url),
    field("description", "Description", Input::Textarea),
];
const PRICING_PLAN_FIELDS: &[Field] = &[
    field("name", "Name", Input::Text),
    field("price", "Price", Input::Text),
    field("description", "Description", Input::Textarea),
    field("icon", "Icon", Input::Text),
    field("is_featured", "Featured", Input::Checkbox),
    optional("choose_plan_link", "Choose-plan link", Input::Url),
];
const REVIEW_FIELDS: &[Field] = &[
    field("customer_name", "Customer name", Input::Text),
    field("designation", "Designation", Input::Text),
    field("company_name", "Company", Input::Text),
    field("review_text", "Review", Input::Textarea),
];
// Only the admin-owned fields; the rest of a submission is read-only.
const SUBMISSION_FIELDS: &[Field] = &[
    optional("status", "Status", Input::Select),
    field("services_of_interest", "Services of interest", Input::Multiselect),
    field("checked", "Checked", Input::Checkbox),
    optional("follow_up_date", "Follow-up date", Input::Date),
    field("assigned_to_emails", "Assigned to (comma-separated emails)", Input::List),
    optional("admin_notes", "Notes", Input::Textarea),
];
const SETTING_FIELDS: &[Field] = &[field("setting_value", "Value", Input::Text)];

/// An admin screen, addressed by the last path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Section(SectionKind),
    Collection(CollectionKind),
    List(ListKind),
    Submissions,
    Settings,
}

impl Screen {
    pub fn all() -> Vec<Screen> {
        let mut screens: Vec<Screen> = SectionKind::ALL.into_iter().map(Screen::Section).collect();
        screens.extend(CollectionKind::ALL.into_iter().map(Screen::Collection));
        screens.extend(ListKind::ALL.into_iter().map(Screen::List));
        screens.extend([Screen::Submissions, Screen::Settings]);
        screens
    }

    pub fn parse(key: &str) -> Option<Screen> {
        Screen::all().into_iter().find(|screen| screen.key() == key)
    }

    pub fn key(&self) -> &'static str {
        match self {
            Screen::Section(kind) => kind.slug(),
            Screen::Collection(kind) => kind.slug(),
            Screen::List(kind) => kind.slug(),
            Screen::Submissions => "submissions",
            Screen::Settings => "settings",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Section(kind) => kind.title(),
            Screen::Collection(kind) => kind.title(),
            Screen::List(kind) => kind.title(),
            Screen::Submissions => "Contact Submissions",
            Screen::Settings => "Global Settings",
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Screen::Section(_) => "section",
            Screen::Collection(_) => "collection",
            Screen::List(_) => "list",
            Screen::Submissions => "submissions",
            Screen::Settings => "settings",
        }
    }

    /// JSON API base the screen edits through
    fn api(&self) -> String {
        match self {
            Screen::Section(kind) => format!("/admin/api/v1/sections/{}", kind.slug()),
            Screen::Collection(kind) => format!("/admin/api/v1/content/{}", kind.slug()),
            Screen::List(kind) => format!("/admin/api/v1/lists/{}", kind.slug()),
            Screen::Submissions => "/admin/api/v1/submissions".to_string(),
            Screen::Settings => "/admin/api/v1/settings".to_string(),
        }
    }

    /// Fields the screen's forms edit
    fn fields(&self) -> &'static [Field] {
        match self {
            Screen::Section(SectionKind::Hero) => HERO_FIELDS,
            Screen::Section(SectionKind::About) => ABOUT_FIELDS,
            Screen::Section(SectionKind::Footer) => FOOTER_FIELDS,
            Screen::Collection(CollectionKind::Faqs) => FAQ_FIELDS,
            Screen::Collection(CollectionKind::Logos) => LOGO_FIELDS,
            Screen::Collection(CollectionKind::PainPoints) => PAIN_POINT_FIELDS,
            Screen::Collection(CollectionKind::ProgressStages) => PROGRESS_STAGE_FIELDS,
            Screen::Collection(CollectionKind::Services) => SERVICE_FIELDS,
            Screen::Collection(CollectionKind::Accordion) => ACCORDION_FIELDS,
            Screen::List(ListKind::Clients) => CLIENT_FIELDS,
            Screen::List(ListKind::PricingPlans) => PRICING_PLAN_FIELDS,
            Screen::List(ListKind::Reviews) => REVIEW_FIELDS,
            Screen::Submissions => SUBMISSION_FIELDS,
            Screen::Settings => SETTING_FIELDS,
        }
    }

    /// Whether the JSON API has a per-item DELETE route for this screen.
    fn deletable(&self) -> bool {
        matches!(self, Screen::Collection(_) | Screen::Submissions)
    }

    /// Fields shown as table columns
    fn columns(&self) -> &'static [&'static str] {
        match self {
            Screen::Section(_) => &[],
            Screen::Collection(CollectionKind::Faqs) => &["question", "answer"],
            Screen::Collection(CollectionKind::Logos) => &["alt_text", "image_url"],
            Screen::Collection(CollectionKind::PainPoints) => &["icon", "title", "description"],
            Screen::Collection(CollectionKind::ProgressStages) => &["title", "description"],
            Screen::Collection(CollectionKind::Services) => &["title", "slug", "description"],
            Screen::Collection(CollectionKind::Accordion) => &["heading", "image_url"],
            Screen::List(ListKind::Clients) => &["name", "logo_url", "description"],
            Screen::List(ListKind::PricingPlans) => &["name", "price", "is_featured", "choose_plan_link"],
            Screen::List(ListKind::Reviews) => &["customer_name", "company_name", "review_text"],
            Screen::Submissions => &["created_at", "full_name", "email", "phone_number", "business_name", "status", "checked"],
            Screen::Settings => &["setting_name", "setting_value"],
        }
    }
}

#[derive(Debug, Serialize)]
struct NavEntry {
    key: &'static str,
    title: &'static str,
}

fn nav() -> Vec<NavEntry> {
    Screen::all()
        .into_iter()
        .map(|screen| NavEntry {
            key: screen.key(),
            title: screen.title(),
        })
        .collect()
}

fn json<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::Internal {
        operation: format!("serialize screen data: {e}"),
    })
}

/// Plain text for a table cell or a detail line.
fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items.iter().map(|v| cell_text(Some(v))).collect::<Vec<_>>().join(", "),
        Some(other) => other.to_string(),
    }
}

/// The value a form control starts from.
fn form_value(input: Input, value: Option<&Value>) -> Value {
    match (input, value) {
        (Input::Checkbox, None | Some(Value::Null)) => Value::Bool(false),
        (Input::Multiselect, None | Some(Value::Null)) => Value::Array(Vec::new()),
        (_, None | Some(Value::Null)) => Value::String(String::new()),
        (Input::Json, Some(v)) => Value::String(serde_json::to_string_pretty(v).unwrap_or_default()),
        (Input::List, Some(v)) => Value::String(cell_text(Some(v))),
        // `<input type="date">` wants the calendar day only
        (Input::Date, Some(Value::String(s))) => Value::String(s.chars().take(10).collect()),
        (_, Some(v)) => v.clone(),
    }
}

fn form_values(fields: &[Field], item: Option<&Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|f| (f.name.to_string(), form_value(f.input, item.and_then(|i| i.get(f.name)))))
        .collect()
}

/// One listed record, pre-rendered for the screen template.
#[derive(Debug, Serialize)]
struct ScreenRow {
    id: String,
    cells: Vec<String>,
    values: Map<String, Value>,
    /// `values` as JSON, read by the edit button
    values_json: String,
    details: Vec<(String, String)>,
}

fn screen_rows(screen: Screen, items: &Value) -> Vec<ScreenRow> {
    let Some(items) = items.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .map(|item| {
            let values = form_values(screen.fields(), Some(item));
            ScreenRow {
                id: cell_text(item.get("id")),
                cells: screen.columns().iter().map(|c| cell_text(item.get(*c))).collect(),
                values_json: Value::Object(values.clone()).to_string(),
                values,
                details: item
                    .as_object()
                    .map(|fields| fields.iter().map(|(k, v)| (k.clone(), cell_text(Some(v)))).collect())
                    .unwrap_or_default(),
            }
        })
        .collect()
}

/// Submission filters as typed into the screen's GET form. Blank or malformed inputs mean
/// "no filter" rather than a rejected page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionFilters {
    pub search: String,
    pub from: String,
    pub to: String,
    pub sort: String,
    pub direction: String,
}

impl SubmissionFilters {
    fn to_query(&self) -> ListSubmissionsQuery {
        let search = self.search.trim();
        ListSubmissionsQuery {
            search: (!search.is_empty()).then(|| search.to_string()),
            from: self.from.parse().ok(),
            to: self.to.parse().ok(),
            sort: match self.sort.as_str() {
                "checked" => Some(SubmissionSort::Checked),
                "created_at" => Some(SubmissionSort::CreatedAt),
                _ => None,
            },
            direction: match self.direction.as_str() {
                "asc" => Some(SortOrder::Asc),
                "desc" => Some(SortOrder::Desc),
                _ => None,
            },
        }
    }
}

/// What a screen lists: table rows, or the section view for singletons.
async fn screen_data(state: &AppState, screen: Screen, filters: &ListSubmissionsQuery) -> Result<Value> {
    let store = state.store.as_ref();
    match screen {
        Screen::Section(kind) => with_section!(kind, T => json(singletons::fetch::<T>(store).await?)),
        Screen::Collection(kind) => with_collection!(kind, T => json(Collections::<T>::new(store).list().await?)),
        Screen::List(kind) => with_list!(kind, T => json(Table::<T>::new(store).list_ordered().await?)),
        Screen::Submissions => json(Submissions::new(store).list(filters).await?),
        Screen::Settings => json(Table::<WebsiteSetting>::new(store).select(&StoreQuery::new()).await?),
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// The sign-in form. Signed-in members go straight to the dashboard.
#[tracing::instrument(skip_all)]
pub async fn login_page(State(state): State<AppState>, user: Option<CurrentUser>) -> Result<Response> {
    if user.is_some() {
        return Ok(Redirect::to(DASHBOARD_PATH).into_response());
    }
    render(&state, "login.html", context! {})
}

#[tracing::instrument(skip_all)]
pub async fn login_submit(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Result<Response> {
    let request = LoginRequest {
        email: form.email,
        password: form.password,
    };
    match authenticate(&state, &request).await {
        Ok(user) => {
            let token = session::create_session_token(&user, &state.config)?;
            let cookie = create_session_cookie(&token, &state.config);
            Ok(([(header::SET_COOKIE, cookie)], Redirect::to(DASHBOARD_PATH)).into_response())
        }
        Err(e @ Error::Unauthenticated { .. }) => render(
            &state,
            "login.html",
            context! { error => e.user_message(), email => request.email },
        ),
        Err(e) => Err(e),
    }
}

#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, user: Option<CurrentUser>) -> Response {
    if let Some(user) = user {
        state.auth_events.publish(AuthEvent::SignedOut { user_id: user.id });
    }
    (
        [(header::SET_COOKIE, expired_session_cookie(&state.config))],
        Redirect::to(crate::auth::guard::LOGIN_PATH),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct InvitationLink {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct AcceptInvitationForm {
    pub token: String,
    pub password: String,
}

fn password_bounds(state: &AppState) -> (usize, usize) {
    let password = &state.config.auth.native.password;
    (password.min_length, password.max_length)
}

#[tracing::instrument(skip_all)]
pub async fn accept_invitation_page(State(state): State<AppState>, Query(link): Query<InvitationLink>) -> Result<Response> {
    let (min_length, max_length) = password_bounds(&state);
    render(
        &state,
        "accept_invitation.html",
        context! { token => link.token, min_length, max_length },
    )
}

#[tracing::instrument(skip_all)]
pub async fn accept_invitation_submit(
    State(state): State<AppState>,
    Form(form): Form<AcceptInvitationForm>,
) -> Result<Response> {
    let (min_length, max_length) = password_bounds(&state);
    match redeem_invitation(&state, &form.token, form.password).await {
        Ok(()) => render(
            &state,
            "accept_invitation.html",
            context! { done => true, message => INVITATION_ACCEPTED },
        ),
        Err(e @ (Error::BadRequest { .. } | Error::Validation { .. })) => render(
            &state,
            "accept_invitation.html",
            context! { token => form.token, error => e.user_message(), min_length, max_length },
        ),
        Err(e) => Err(e),
    }
}

#[tracing::instrument(skip_all)]
pub async fn dashboard(State(state): State<AppState>, Extension(user): Extension<CurrentUser>) -> Result<Response> {
    let summary = load_summary(state.store.as_ref()).await?;
    render(
        &state,
        "admin/dashboard.html",
        context! { user, nav => nav(), active => "dashboard", summary },
    )
}

#[tracing::instrument(skip_all, fields(screen = %key))]
pub async fn screen(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(filters): Query<SubmissionFilters>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response> {
    let Some(screen) = Screen::parse(&key) else {
        return not_found(&state, "There is no admin screen at this address.");
    };
    let data = screen_data(&state, screen, &filters.to_query()).await?;
    let screen_info = context! {
        key => screen.key(),
        title => screen.title(),
        kind => screen.kind(),
        api => screen.api(),
        fields => screen.fields(),
        columns => screen.columns(),
        deletable => screen.deletable(),
    };
    let context = match screen {
        Screen::Section(_) => context! {
            screen => screen_info,
            configured => data.get("configured").cloned(),
            values => form_values(screen.fields(), data.get("content")),
        },
        Screen::Submissions => {
            let submissions = Submissions::new(state.store.as_ref());
            context! {
                screen => screen_info,
                rows => screen_rows(screen, &data),
                filters,
                statuses => submissions.options(OptionList::Statuses).await?,
                interests => submissions.options(OptionList::ServiceInterests).await?,
            }
        }
        _ => context! { screen => screen_info, rows => screen_rows(screen, &data) },
    };
    render(
        &state,
        "admin/screen.html",
        context! {
            user,
            nav => nav(),
            active => screen.key(),
            can_edit => user.role != Role::Viewer,
            ..context
        }
    )
}

#[tracing::instrument(skip_all)]
pub async fn users(State(state): State<AppState>, Extension(user): Extension<CurrentUser>) -> Result<Response> {
    let profiles: Vec<ProfileResponse> = Users::new(state.store.as_ref())
        .list_profiles()
        .await?
        .into_iter()
        .map(ProfileResponse::from)
        .collect();
    render(
        &state,
        "admin/users.html",
        context! { user, nav => nav(), active => "users", profiles, roles => Role::ALL },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{content::FaqInput, submissions::ContactSubmissionCreate};
    use crate::content::settings;
    use crate::db::models::content::Faq;
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::json;

    async fn submit(state: &AppState, name: &str, business: &str) {
        Submissions::new(state.store.as_ref())
            .create(ContactSubmissionCreate {
                full_name: name.into(),
                email: "lead@example.com".into(),
                phone_number: "+919876543210".into(),
                business_name: business.into(),
                message: None,
            })
            .await
            .unwrap();
    }

    #[test]
    fn every_screen_has_a_unique_key() {
        let screens = Screen::all();
        assert_eq!(screens.len(), 14);
        for screen in &screens {
            assert_eq!(Screen::parse(screen.key()), Some(*screen));
        }
        assert_eq!(Screen::parse("pain-points"), Some(Screen::Collection(CollectionKind::PainPoints)));
        assert_eq!(Screen::parse("widgets"), None);
    }

    #[test_log::test(tokio::test)]
    async fn anonymous_visitors_are_sent_to_login() {
        let server = create_test_server(create_test_state());
        let response = server.get("/admin/dashboard").await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/admin/login");
    }

    #[tokio::test]
    async fn viewers_cannot_open_user_management() {
        let state = create_test_state();
        let viewer = create_test_user(&state, Role::Viewer).await;
        let admin = create_test_user(&state, Role::Admin).await;
        let viewer_cookie = session_cookie(&state, &viewer);
        let admin_cookie = session_cookie(&state, &admin);
        let server = create_test_server(state);

        let response = server.get("/admin/users").add_header("cookie", &viewer_cookie).await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/admin/login");

        let response = server.get("/admin/users").add_header("cookie", &admin_cookie).await;
        response.assert_status_ok();
        assert!(response.text().contains(&viewer.email));
    }

    #[tokio::test]
    async fn viewers_see_content_screens() {
        let state = create_test_state();
        let viewer = create_test_user(&state, Role::Viewer).await;
        let cookie = session_cookie(&state, &viewer);
        let server = create_test_server(state);

        for path in ["/admin/dashboard", "/admin/faqs", "/admin/hero", "/admin/pricing-plans", "/admin/submissions"] {
            server.get(path).add_header("cookie", &cookie).await.assert_status_ok();
        }
        server
            .get("/admin/widgets")
            .add_header("cookie", &cookie)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn login_form_sets_cookie_and_redirects() {
        let state = create_test_state();
        let editor = create_test_user(&state, Role::Editor).await;
        let server = create_test_server(state);

        let response = server
            .post("/admin/login")
            .form(&[("email", editor.email.as_str()), ("password", TEST_PASSWORD)])
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/admin/dashboard");
        let cookie = response.header("set-cookie");
        assert!(cookie.to_str().unwrap().starts_with("sitectl_session="));

        let response = server
            .post("/admin/login")
            .form(&[("email", editor.email.as_str()), ("password", "wrong password")])
            .await;
        response.assert_status_ok();
        assert!(response.text().contains("Invalid email or password"));
    }

    #[tokio::test]
    async fn logout_clears_cookie() {
        let server = create_test_server(create_test_state());
        let response = server.post("/admin/logout").await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert!(response.header("set-cookie").to_str().unwrap().contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn invitation_form_rejects_bad_tokens() {
        let server = create_test_server(create_test_state());

        let page = server.get("/admin/accept-invitation?token=abc").await;
        page.assert_status_ok();
        assert!(page.text().contains("value=\"abc\""));

        let response = server
            .post("/admin/accept-invitation")
            .form(&[("token", "abc"), ("password", "long-enough-password")])
            .await;
        response.assert_status_ok();
        assert!(response.text().contains("invalid or has expired"));
    }

    #[test]
    fn form_values_match_their_controls() {
        let item = json!({
            "links": [{"text": "Home", "url": "/"}],
            "assigned_to_emails": ["a@example.com", "b@example.com"],
            "follow_up_date": "2026-03-04T00:00:00+00:00",
            "checked": null,
        });
        assert_eq!(
            form_value(Input::List, item.get("assigned_to_emails")),
            json!("a@example.com, b@example.com")
        );
        assert_eq!(form_value(Input::Date, item.get("follow_up_date")), json!("2026-03-04"));
        assert_eq!(form_value(Input::Checkbox, item.get("checked")), json!(false));
        assert_eq!(form_value(Input::Multiselect, None), json!([]));
        let links = form_value(Input::Json, item.get("links"));
        assert_eq!(
            serde_json::from_str::<Value>(links.as_str().unwrap()).unwrap(),
            json!([{"text": "Home", "url": "/"}])
        );
    }

    #[test]
    fn blank_filters_are_ignored() {
        let filters = SubmissionFilters {
            search: "  ".into(),
            from: "".into(),
            to: "2026-02-30".into(),
            sort: "checked".into(),
            direction: "sideways".into(),
        };
        let query = filters.to_query();
        assert_eq!(query.search, None);
        assert_eq!(query.from, None);
        assert_eq!(query.to, None);
        assert_eq!(query.sort, Some(SubmissionSort::Checked));
        assert_eq!(query.direction, None);
    }

    #[test]
    fn delete_buttons_only_where_a_route_exists() {
        let deletable: Vec<_> = Screen::all().into_iter().filter(Screen::deletable).collect();
        assert_eq!(deletable.len(), CollectionKind::ALL.len() + 1);
        assert!(!Screen::Settings.deletable());
        assert!(!Screen::List(ListKind::Reviews).deletable());
        for screen in Screen::all() {
            assert!(!screen.fields().is_empty(), "{} has no form", screen.key());
        }
    }

    #[tokio::test]
    async fn settings_screen_edits_without_delete() {
        let state = create_test_state();
        settings::put(state.store.as_ref(), settings::CONTACT_US_LINK, "mailto:hello@example.com")
            .await
            .unwrap();
        let editor = create_test_user(&state, Role::Editor).await;
        let cookie = session_cookie(&state, &editor);
        let server = create_test_server(state);

        let page = server.get("/admin/settings").add_header("cookie", &cookie).await.text();
        assert!(page.contains("contact_us_link\">"));
        assert!(page.contains("value=\"mailto:hello@example.com\""));
        assert!(page.contains("data-path-field=\"setting_name\""));
        assert!(!page.contains("data-delete"));
    }

    #[tokio::test]
    async fn collection_screen_has_edit_form_for_editors_only() {
        let state = create_test_state();
        Collections::<Faq>::new(state.store.as_ref())
            .create(FaqInput {
                question: "Do you ship?".into(),
                answer: "Worldwide".into(),
            })
            .await
            .unwrap();
        let editor = create_test_user(&state, Role::Editor).await;
        let viewer = create_test_user(&state, Role::Viewer).await;
        let editor_cookie = session_cookie(&state, &editor);
        let viewer_cookie = session_cookie(&state, &viewer);
        let server = create_test_server(state);

        let page = server.get("/admin/faqs").add_header("cookie", &editor_cookie).await.text();
        assert!(page.contains("class=\"editor record-form\" data-method=\"POST\""));
        assert!(page.contains("data-field=\"question\""));
        assert!(page.contains("data-edit"));
        assert!(page.contains("data-delete"));
        assert!(page.contains("Do you ship?"));

        let page = server.get("/admin/faqs").add_header("cookie", &viewer_cookie).await.text();
        assert!(page.contains("Do you ship?"));
        assert!(!page.contains("record-form"));
        assert!(!page.contains("data-delete"));
    }

    #[tokio::test]
    async fn list_and_section_screens_render_editors() {
        let state = create_test_state();
        let editor = create_test_user(&state, Role::Editor).await;
        let cookie = session_cookie(&state, &editor);
        let server = create_test_server(state);

        let page = server.get("/admin/pricing-plans").add_header("cookie", &cookie).await.text();
        assert!(page.contains("class=\"list-editor\""));
        assert!(page.contains("data-field=\"is_featured\" data-input=\"checkbox\""));
        assert!(page.contains("Save list"));

        let page = server.get("/admin/footer").add_header("cookie", &cookie).await.text();
        assert!(page.contains("class=\"editor\" data-method=\"PUT\""));
        assert!(page.contains("data-field=\"links\" data-input=\"json\""));
    }

    #[tokio::test]
    async fn submissions_screen_filters_and_edits() {
        let state = create_test_state();
        submit(&state, "Asha Verma", "Verma Foods").await;
        submit(&state, "Ravi Menon", "Menon Textiles").await;
        let editor = create_test_user(&state, Role::Editor).await;
        let cookie = session_cookie(&state, &editor);
        let server = create_test_server(state);

        let page = server.get("/admin/submissions").add_header("cookie", &cookie).await.text();
        assert!(page.contains("Verma Foods"));
        assert!(page.contains("Menon Textiles"));
        for name in ["search", "from", "to", "sort", "direction"] {
            assert!(page.contains(&format!("name=\"{name}\"")), "missing {name} filter");
        }
        assert!(page.contains("<details>"));
        assert!(page.contains("data-method=\"PATCH\""));
        assert!(page.contains("data-field=\"follow_up_date\" data-input=\"date\""));
        assert!(page.contains("data-delete"));

        let page = server
            .get("/admin/submissions?search=textiles&from=&to=&sort=created_at&direction=asc")
            .add_header("cookie", &cookie)
            .await;
        page.assert_status_ok();
        let page = page.text();
        assert!(page.contains("Menon Textiles"));
        assert!(!page.contains("Verma Foods"));
        assert!(page.contains("value=\"textiles\""));
    }
}
