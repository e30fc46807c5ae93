use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::calendar::DayGroup;
use crate::catalog::CategoryWithServices;
use crate::contacts::{ClientOption, ClientSummary};
use crate::core::shared::models::{Calendar, Category, Service};
use crate::forms::{CategoryForm, ClientForm, ServiceForm};

pub const SECTION_OVERVIEW: &str = "overview";
pub const SECTION_SERVICES: &str = "services";
pub const SECTION_CLIENTS: &str = "clients";
pub const SECTION_PLANNING: &str = "planning";

pub const SHOW_CATEGORY_FORM: &str = "category-form";
pub const SHOW_SERVICE_FORM: &str = "service-form";

/// Query string of `GET /` and `POST /`. Everything stays a raw string so a
/// malformed value falls back to its default instead of rejecting the
/// request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    pub section: Option<String>,
    pub show: Option<String>,
    pub service_id: Option<String>,
    pub category: Option<String>,
    pub week_offset: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanningQuery {
    pub week_offset: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardAction {
    AddCategory,
    AddService,
    UpdateService,
    DeleteService,
    AddClient,
    UpdateClient,
    DeleteClient,
    AddEvent,
    DeleteEvent,
}

impl DashboardAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddCategory => "add_category",
            Self::AddService => "add_service",
            Self::UpdateService => "update_service",
            Self::DeleteService => "delete_service",
            Self::AddClient => "add_client",
            Self::UpdateClient => "update_client",
            Self::DeleteClient => "delete_client",
            Self::AddEvent => "add_event",
            Self::DeleteEvent => "delete_event",
        }
    }

    /// Section the dashboard lands on after this action.
    pub fn section(&self) -> &'static str {
        match self {
            Self::AddCategory | Self::AddService | Self::UpdateService | Self::DeleteService => {
                SECTION_SERVICES
            }
            Self::AddClient | Self::UpdateClient | Self::DeleteClient => SECTION_CLIENTS,
            Self::AddEvent | Self::DeleteEvent => SECTION_PLANNING,
        }
    }
}

impl FromStr for DashboardAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add_category" => Ok(Self::AddCategory),
            "add_service" => Ok(Self::AddService),
            "update_service" => Ok(Self::UpdateService),
            "delete_service" => Ok(Self::DeleteService),
            "add_client" => Ok(Self::AddClient),
            "update_client" => Ok(Self::UpdateClient),
            "delete_client" => Ok(Self::DeleteClient),
            "add_event" => Ok(Self::AddEvent),
            "delete_event" => Ok(Self::DeleteEvent),
            _ => Err(()),
        }
    }
}

/// Forms and flags carried from request parsing through action dispatch to
/// rendering.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub section: String,
    pub category_form: CategoryForm,
    pub service_form: ServiceForm,
    pub client_form: ClientForm,
    pub show_category_form: bool,
    pub show_service_form: bool,
    pub show_client_modal: bool,
    pub calendar: Option<Calendar>,
    /// Flash-style error messages shown above the sections.
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// 303 to this location.
    Redirect(String),
    /// Re-render the dashboard with the updated state.
    Render,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardContext {
    pub section: String,
    pub categories: Vec<CategoryWithServices>,
    /// Every category, for the service form picker.
    pub all_categories: Vec<Category>,
    pub category_form: CategoryForm,
    pub show_category_form: bool,
    pub show_category_modal: bool,
    pub service_form: ServiceForm,
    pub show_service_form: bool,
    pub show_service_modal: bool,
    pub client_form: ClientForm,
    pub show_client_modal: bool,
    pub is_professional: bool,
    pub planner_hours: Vec<String>,
    pub planning_days: Vec<DayGroup>,
    pub week_offset: i64,
    pub planner_week_summary: String,
    pub user_services: Vec<Service>,
    pub clients: Vec<ClientSummary>,
    pub client_options: Vec<ClientOption>,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanningResponse {
    pub week_offset: i64,
    pub summary: String,
    pub hours: Vec<String>,
    pub days: Vec<DayGroup>,
}
