#[derive(Debug)]
pub struct ApiUrls;

impl ApiUrls {
    // Dashboard - HTML page and form actions
    pub const DASHBOARD: &'static str = "/";

    // Planner - JSON API
    pub const PLANNING: &'static str = "/planning/";

    // Session
    pub const LOGOUT: &'static str = "/logout/";

    // Workshops - HTML
    pub const WORKSHOP_DETAIL: &'static str = "/workshops/:id/";

    // Liveness
    pub const HEALTH: &'static str = "/health";
}

impl ApiUrls {
    pub fn with_params(url: &str, params: &[(&str, &str)]) -> String {
        let mut result = url.to_string();
        for (key, value) in params {
            result = result.replace(&format!(":{key}"), value);
        }
        result
    }

    pub fn with_query(url: &str, params: &[(&str, &str)]) -> String {
        if params.is_empty() {
            return url.to_string();
        }

        let query = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{url}?{query}")
    }

    /// Dashboard URL pointing at a section.
    pub fn dashboard_section(section: &str) -> String {
        Self::with_query(Self::DASHBOARD, &[("section", section)])
    }
}
