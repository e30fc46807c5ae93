//! The professional dashboard: one page with overview, services, clients
//! and planning sections, driven by `action` form posts.

pub mod error;
pub mod types;
pub mod ui;

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Json, Router,
};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use diesel::PgConnection;
use log::warn;
use std::sync::Arc;
use uuid::Uuid;

use crate::calendar::{
    self, build_calendar_events_on, ensure_user_calendar, planner_hours, planner_week_summary,
    start_of_week, EventError, EventRequest,
};
use crate::catalog::{self, CatalogError};
use crate::contacts::error::MSG_CLIENT_NOT_FOUND;
use crate::contacts::{self, ClientError, ClientOption, ClientSummary};
use crate::core::shared::models::User;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::safe_int;
use crate::core::urls::ApiUrls;
use crate::forms::{CategoryForm, ClientForm, FormData, ServiceForm};
use crate::web::auth::{AuthenticatedUser, OptionalAuth};

pub use error::DashboardsError;
pub use types::*;

pub const MSG_EVENT_PROFESSIONAL_REQUIRED: &str =
    "Vous devez être un professionnel pour planifier un rendez-vous.";
pub const MSG_EVENT_FIELDS_REQUIRED: &str =
    "Veuillez sélectionner un horaire, une prestation et un client.";
pub const MSG_EVENT_CREATION_FAILED: &str =
    "Impossible de créer le rendez-vous. Vérifiez les informations fournies.";

pub fn configure_dashboard_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            ApiUrls::DASHBOARD,
            get(handle_dashboard).post(handle_dashboard_action),
        )
        .route(ApiUrls::PLANNING, get(handle_planning))
}

fn parse_uuid(value: Option<&str>) -> Option<Uuid> {
    value.and_then(|v| Uuid::parse_str(v.trim()).ok())
}

fn form_value<'a>(data: &'a FormData, key: &str) -> Option<&'a str> {
    data.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Largest week shift accepted from a query string, about twenty years.
pub const MAX_WEEK_OFFSET: i64 = 1040;

/// Parses `week_offset`; garbage and out-of-range values mean the current week.
pub fn week_offset_param(value: Option<&str>) -> i64 {
    safe_int(value)
        .filter(|offset| (-MAX_WEEK_OFFSET..=MAX_WEEK_OFFSET).contains(offset))
        .unwrap_or(0)
}

/// Reads the query string into the initial forms and flags.
pub fn initialize_dashboard_state(
    conn: &mut PgConnection,
    user: &User,
    query: &DashboardQuery,
) -> Result<DashboardState, DashboardsError> {
    let mut state = DashboardState {
        section: query
            .section
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| SECTION_OVERVIEW.to_string()),
        category_form: CategoryForm::default(),
        service_form: ServiceForm::default(),
        client_form: ClientForm::initial_for(user),
        show_category_form: query.show.as_deref() == Some(SHOW_CATEGORY_FORM),
        show_service_form: query.show.as_deref() == Some(SHOW_SERVICE_FORM),
        show_client_modal: false,
        calendar: None,
        messages: Vec::new(),
    };

    if let Some(service_id) = parse_uuid(query.service_id.as_deref()) {
        match catalog::prepare_service_form(conn, user, Some(service_id), None) {
            Ok((form, _)) => {
                state.service_form = form;
                state.show_service_form = true;
                state.section = SECTION_SERVICES.to_string();
            }
            Err(CatalogError::NotFound) => {
                warn!("User {} asked for unknown service {}", user.id, service_id);
            }
            Err(e) => return Err(DashboardsError::database(e)),
        }
    } else if state.show_service_form {
        if let Some(category_id) = parse_uuid(query.category.as_deref()) {
            if catalog::category_exists(conn, category_id).map_err(DashboardsError::database)? {
                state.service_form = ServiceForm::with_initial_category(category_id);
                state.section = SECTION_SERVICES.to_string();
            }
        }
    }

    Ok(state)
}

fn redirect_to(action: DashboardAction) -> ActionOutcome {
    ActionOutcome::Redirect(ApiUrls::dashboard_section(action.section()))
}

fn handle_add_category(
    conn: &mut PgConnection,
    state: &mut DashboardState,
    data: &FormData,
) -> Result<ActionOutcome, DashboardsError> {
    state.show_category_form = true;
    match catalog::save_category(conn, CategoryForm::bind(data)) {
        Ok(_) => Ok(redirect_to(DashboardAction::AddCategory)),
        Err(CatalogError::InvalidCategory(form)) => {
            state.category_form = form;
            Ok(ActionOutcome::Render)
        }
        Err(e) => Err(DashboardsError::database(e)),
    }
}

fn handle_save_service(
    conn: &mut PgConnection,
    user: &User,
    state: &mut DashboardState,
    data: &FormData,
    action: DashboardAction,
) -> Result<ActionOutcome, DashboardsError> {
    state.show_service_form = true;

    let form = if action == DashboardAction::UpdateService {
        let Some(service_id) = parse_uuid(form_value(data, "service_id")) else {
            state.messages.push(CatalogError::NotFound.to_string());
            return Ok(ActionOutcome::Render);
        };
        match catalog::prepare_service_form(conn, user, Some(service_id), Some(data)) {
            Ok((form, _)) => form,
            Err(CatalogError::NotFound) => {
                state.messages.push(CatalogError::NotFound.to_string());
                return Ok(ActionOutcome::Render);
            }
            Err(e) => return Err(DashboardsError::database(e)),
        }
    } else {
        ServiceForm::bind(data)
    };

    match catalog::save_service(conn, form, user) {
        Ok(_) => Ok(redirect_to(action)),
        Err(CatalogError::InvalidService(form)) => {
            state.service_form = form;
            Ok(ActionOutcome::Render)
        }
        Err(CatalogError::NotFound) => {
            state.messages.push(CatalogError::NotFound.to_string());
            Ok(ActionOutcome::Render)
        }
        Err(e) => Err(DashboardsError::database(e)),
    }
}

fn handle_delete_service(
    conn: &mut PgConnection,
    user: &User,
    state: &mut DashboardState,
    data: &FormData,
) -> Result<ActionOutcome, DashboardsError> {
    let Some(service_id) = parse_uuid(form_value(data, "service_id")) else {
        return Ok(redirect_to(DashboardAction::DeleteService));
    };
    match catalog::delete_service(conn, user, service_id) {
        Ok(_) => Ok(redirect_to(DashboardAction::DeleteService)),
        Err(CatalogError::NotFound) => {
            state.messages.push(CatalogError::NotFound.to_string());
            Ok(ActionOutcome::Render)
        }
        Err(e) => Err(DashboardsError::database(e)),
    }
}

/// Applies a client service result to the state. `Invalid` forms reopen the
/// client modal.
fn client_outcome<T>(
    state: &mut DashboardState,
    result: Result<T, ClientError>,
    action: DashboardAction,
) -> Result<ActionOutcome, DashboardsError> {
    match result {
        Ok(_) => Ok(redirect_to(action)),
        Err(ClientError::Invalid(form)) => {
            state.client_form = form;
            state.show_client_modal = true;
            Ok(ActionOutcome::Render)
        }
        Err(ClientError::NotFound) => {
            state.messages.push(MSG_CLIENT_NOT_FOUND.to_string());
            Ok(ActionOutcome::Render)
        }
        Err(e) => Err(DashboardsError::database(e)),
    }
}

fn handle_add_event(
    conn: &mut PgConnection,
    user: &User,
    state: &mut DashboardState,
    data: &FormData,
    tz: &Tz,
) -> Result<ActionOutcome, DashboardsError> {
    if !user.is_professional() {
        state.messages.push(MSG_EVENT_PROFESSIONAL_REQUIRED.to_string());
        return Ok(ActionOutcome::Render);
    }

    let calendar = ensure_user_calendar(conn, user).map_err(DashboardsError::database)?;
    state.calendar = Some(calendar);

    let (Some(start_at), Some(end_at), Some(service_id), Some(client_id)) = (
        form_value(data, "start_at"),
        form_value(data, "end_at"),
        form_value(data, "service_id"),
        form_value(data, "client_id"),
    ) else {
        state.messages.push(MSG_EVENT_FIELDS_REQUIRED.to_string());
        return Ok(ActionOutcome::Render);
    };

    let result = match (parse_uuid(Some(service_id)), parse_uuid(Some(client_id))) {
        (Some(service_id), Some(client_id)) => calendar::create_event(
            conn,
            user,
            state.calendar.as_ref(),
            EventRequest {
                start_at,
                end_at,
                service_id,
                client_id,
            },
            tz,
        ),
        _ => Err(EventError::InvalidSelection),
    };

    match result {
        Ok(_) => Ok(redirect_to(DashboardAction::AddEvent)),
        Err(EventError::Database(e)) => Err(DashboardsError::database(e)),
        Err(reason) => {
            state
                .messages
                .push(format!("{MSG_EVENT_CREATION_FAILED} {reason}"));
            Ok(ActionOutcome::Render)
        }
    }
}

fn handle_delete_event(
    conn: &mut PgConnection,
    user: &User,
    state: &mut DashboardState,
    data: &FormData,
) -> Result<ActionOutcome, DashboardsError> {
    let result = match parse_uuid(form_value(data, "event_id")) {
        Some(event_id) => calendar::delete_event(conn, user, event_id),
        None => Err(EventError::NotFound),
    };
    match result {
        Ok(()) => Ok(redirect_to(DashboardAction::DeleteEvent)),
        Err(EventError::Database(e)) => Err(DashboardsError::database(e)),
        Err(reason) => {
            state.messages.push(reason.to_string());
            Ok(ActionOutcome::Render)
        }
    }
}

/// Runs the handler named by the `action` field. Unknown or missing actions
/// leave the state untouched and render the page.
pub fn dispatch_action(
    conn: &mut PgConnection,
    user: &User,
    state: &mut DashboardState,
    data: &FormData,
    tz: &Tz,
) -> Result<ActionOutcome, DashboardsError> {
    let Some(action) = form_value(data, "action").and_then(|a| a.parse::<DashboardAction>().ok())
    else {
        return Ok(ActionOutcome::Render);
    };
    state.section = action.section().to_string();

    match action {
        DashboardAction::AddCategory => handle_add_category(conn, state, data),
        DashboardAction::AddService | DashboardAction::UpdateService => {
            handle_save_service(conn, user, state, data, action)
        }
        DashboardAction::DeleteService => handle_delete_service(conn, user, state, data),
        DashboardAction::AddClient => {
            state.show_client_modal = true;
            let result = contacts::create_client(conn, user, data);
            client_outcome(state, result, action)
        }
        DashboardAction::UpdateClient => {
            let result = match parse_uuid(form_value(data, "client_id")) {
                Some(client_id) => contacts::update_client(conn, user, client_id, data),
                None => Err(ClientError::NotFound),
            };
            client_outcome(state, result, action)
        }
        DashboardAction::DeleteClient => {
            let result = match parse_uuid(form_value(data, "client_id")) {
                Some(client_id) => contacts::delete_client(conn, user, client_id),
                None => Err(ClientError::NotFound),
            };
            client_outcome(state, result, action)
        }
        DashboardAction::AddEvent => handle_add_event(conn, user, state, data, tz),
        DashboardAction::DeleteEvent => handle_delete_event(conn, user, state, data),
    }
}

/// Everything the page needs, loaded for `user` as of `today`.
pub fn build_dashboard_context(
    conn: &mut PgConnection,
    user: &User,
    mut state: DashboardState,
    week_offset: i64,
    tz: &Tz,
    today: NaiveDate,
) -> Result<DashboardContext, DashboardsError> {
    let calendar = match state.calendar.take() {
        Some(calendar) => calendar,
        None => ensure_user_calendar(conn, user).map_err(DashboardsError::database)?,
    };

    let categories = catalog::list_user_categories(conn, user.id).map_err(DashboardsError::database)?;
    let all_categories = catalog::list_categories(conn).map_err(DashboardsError::database)?;
    let user_services = catalog::list_user_services(conn, user.id).map_err(DashboardsError::database)?;

    let is_professional = user.is_professional();
    let (clients, client_options) = if is_professional {
        let roster = contacts::list_clients(conn, user).map_err(DashboardsError::database)?;
        (
            roster.iter().map(ClientSummary::from).collect(),
            roster.iter().map(ClientOption::from).collect(),
        )
    } else {
        (Vec::new(), Vec::new())
    };

    let monday = start_of_week(today, week_offset);
    let planning_days = build_calendar_events_on(conn, Some(&calendar), week_offset, tz, today)
        .map_err(DashboardsError::database)?;

    Ok(DashboardContext {
        section: state.section,
        categories,
        all_categories,
        show_category_modal: state.show_category_form || !state.category_form.errors.is_empty(),
        category_form: state.category_form,
        show_category_form: state.show_category_form,
        show_service_modal: state.show_service_form || !state.service_form.errors.is_empty(),
        service_form: state.service_form,
        show_service_form: state.show_service_form,
        show_client_modal: state.show_client_modal || !state.client_form.errors.is_empty(),
        client_form: state.client_form,
        is_professional,
        planner_hours: planner_hours(),
        planning_days,
        week_offset,
        planner_week_summary: planner_week_summary(monday),
        user_services,
        clients,
        client_options,
        messages: state.messages,
    })
}

enum DashboardPage {
    Html(String),
    Redirect(String),
}

/// Full GET/POST pipeline on one pooled connection.
fn run_dashboard(
    state: &AppState,
    user: &User,
    query: &DashboardQuery,
    data: Option<&FormData>,
) -> Result<DashboardPage, DashboardsError> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| DashboardsError::Connection(e.to_string()))?;
    let tz = state.time_zone();

    let mut dashboard = initialize_dashboard_state(&mut conn, user, query)?;
    if let Some(data) = data {
        if let ActionOutcome::Redirect(location) =
            dispatch_action(&mut conn, user, &mut dashboard, data, &tz)?
        {
            return Ok(DashboardPage::Redirect(location));
        }
    }

    let week_offset = week_offset_param(query.week_offset.as_deref());
    let today = Utc::now().with_timezone(&tz).date_naive();
    let context = build_dashboard_context(&mut conn, user, dashboard, week_offset, &tz, today)?;
    Ok(DashboardPage::Html(ui::render_dashboard(&context, user)))
}

async fn dashboard_response(
    state: Arc<AppState>,
    user: User,
    query: DashboardQuery,
    data: Option<FormData>,
) -> Result<Response, DashboardsError> {
    let outcome = tokio::task::spawn_blocking(move || {
        run_dashboard(&state, &user, &query, data.as_ref())
    })
    .await
    .map_err(|e: tokio::task::JoinError| DashboardsError::Internal(e.to_string()))??;

    Ok(match outcome {
        DashboardPage::Html(html) => Html(html).into_response(),
        DashboardPage::Redirect(location) => Redirect::to(&location).into_response(),
    })
}

pub async fn handle_dashboard(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser { user }: AuthenticatedUser,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, DashboardsError> {
    dashboard_response(state, user, query, None).await
}

pub async fn handle_dashboard_action(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser { user }: AuthenticatedUser,
    Query(query): Query<DashboardQuery>,
    Form(data): Form<FormData>,
) -> Result<Response, DashboardsError> {
    tracing::debug!(
        "Dashboard action {:?} from {}",
        data.get("action"),
        user.id
    );
    dashboard_response(state, user, query, Some(data)).await
}

/// Planner week as JSON. Anonymous visitors get the sample week.
pub async fn handle_planning(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<PlanningQuery>,
) -> Result<Json<PlanningResponse>, DashboardsError> {
    let week_offset = week_offset_param(query.week_offset.as_deref());
    let tz = state.time_zone();
    let pool = state.conn.clone();

    let response = tokio::task::spawn_blocking(move || {
        let Some(user) = user else {
            return Ok::<_, DashboardsError>(PlanningResponse {
                week_offset,
                summary: planner_week_summary(calendar::planner::sample_week_monday()),
                hours: planner_hours(),
                days: calendar::planner::sample_week(&tz),
            });
        };

        let mut conn = pool
            .get()
            .map_err(|e| DashboardsError::Connection(e.to_string()))?;
        let today = Utc::now().with_timezone(&tz).date_naive();
        let calendar = ensure_user_calendar(&mut conn, &user).map_err(DashboardsError::database)?;
        let days = build_calendar_events_on(&mut conn, Some(&calendar), week_offset, &tz, today)
            .map_err(DashboardsError::database)?;

        Ok(PlanningResponse {
            week_offset,
            summary: planner_week_summary(start_of_week(today, week_offset)),
            hours: planner_hours(),
            days,
        })
    })
    .await
    .map_err(|e: tokio::task::JoinError| DashboardsError::Internal(e.to_string()))??;

    Ok(Json(response))
}
