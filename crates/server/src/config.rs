use std::{fs, path::Path, str::FromStr, time::Duration};

use dashboard_api::{html::DEFAULT_PLOTLY_JS_URL, HtmlOptions, RenderOptions, SalesOrdering};
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "dashboard.toml";

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_bind: String,
    pub max_upload_bytes: usize,
    pub preview_rows: usize,
    pub top_products: usize,
    pub sort_sales_by_date: bool,
    pub session_ttl_seconds: u64,
    pub max_sessions: usize,
    pub plotly_js_url: String,
    pub log_filter: String,
    /// Config values that were present but unusable; logged once tracing is up.
    pub issues: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8501".into(),
            max_upload_bytes: 200 * 1024 * 1024,
            preview_rows: 5,
            top_products: 10,
            sort_sales_by_date: false,
            session_ttl_seconds: 1800,
            max_sessions: 256,
            plotly_js_url: DEFAULT_PLOTLY_JS_URL.into(),
            log_filter: "info".into(),
            issues: Vec::new(),
        }
    }
}

/// Keys accepted in `dashboard.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    bind_addr: Option<String>,
    max_upload_bytes: Option<usize>,
    preview_rows: Option<usize>,
    top_products: Option<usize>,
    sort_sales_by_date: Option<bool>,
    session_ttl_seconds: Option<u64>,
    max_sessions: Option<usize>,
    plotly_js_url: Option<String>,
    log_filter: Option<String>,
}

impl Settings {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            preview_rows: self.preview_rows,
            top_products: self.top_products,
            sales_ordering: if self.sort_sales_by_date {
                SalesOrdering::ByDate
            } else {
                SalesOrdering::RowOrder
            },
        }
    }

    pub fn html_options(&self) -> HtmlOptions {
        HtmlOptions {
            plotly_js_url: self.plotly_js_url.clone(),
            ..HtmlOptions::default()
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_seconds)
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    let config_path =
        std::env::var("DASHBOARD_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    if Path::new(&config_path).exists() {
        match fs::read_to_string(&config_path) {
            Ok(raw) => apply_file_settings(&mut settings, &raw),
            Err(err) => settings
                .issues
                .push(format!("could not read {config_path}: {err}")),
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    sanitize(&mut settings);
    settings
}

pub fn apply_file_settings(settings: &mut Settings, raw: &str) {
    let file_cfg = match toml::from_str::<FileSettings>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(err) => {
            settings
                .issues
                .push(format!("ignoring config file: {}", err.message()));
            return;
        }
    };

    if let Some(v) = file_cfg.bind_addr {
        settings.server_bind = v;
    }
    if let Some(v) = file_cfg.max_upload_bytes {
        settings.max_upload_bytes = v;
    }
    if let Some(v) = file_cfg.preview_rows {
        settings.preview_rows = v;
    }
    if let Some(v) = file_cfg.top_products {
        settings.top_products = v;
    }
    if let Some(v) = file_cfg.sort_sales_by_date {
        settings.sort_sales_by_date = v;
    }
    if let Some(v) = file_cfg.session_ttl_seconds {
        settings.session_ttl_seconds = v;
    }
    if let Some(v) = file_cfg.max_sessions {
        settings.max_sessions = v;
    }
    if let Some(v) = file_cfg.plotly_js_url {
        settings.plotly_js_url = v;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
}

pub fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("DASHBOARD_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = lookup("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    parse_env(&lookup, "APP__MAX_UPLOAD_BYTES", settings, |s, v| {
        s.max_upload_bytes = v
    });
    parse_env(&lookup, "APP__PREVIEW_ROWS", settings, |s, v| s.preview_rows = v);
    parse_env(&lookup, "APP__TOP_PRODUCTS", settings, |s, v| s.top_products = v);
    parse_env(&lookup, "APP__SORT_SALES_BY_DATE", settings, |s, v| {
        s.sort_sales_by_date = v
    });
    parse_env(&lookup, "APP__SESSION_TTL_SECONDS", settings, |s, v| {
        s.session_ttl_seconds = v
    });
    parse_env(&lookup, "APP__MAX_SESSIONS", settings, |s, v| s.max_sessions = v);

    if let Some(v) = lookup("APP__PLOTLY_JS_URL") {
        settings.plotly_js_url = v;
    }
    if let Some(v) = lookup("RUST_LOG").or_else(|| lookup("APP__LOG_FILTER")) {
        settings.log_filter = v;
    }
}

fn parse_env<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    settings: &mut Settings,
    apply: impl FnOnce(&mut Settings, T),
) {
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(parsed) => apply(settings, parsed),
        Err(_) => settings
            .issues
            .push(format!("ignoring {key}={raw:?}: not a valid value")),
    }
}

/// Zero limits would render an empty dashboard or drop every session.
fn sanitize(settings: &mut Settings) {
    let defaults = Settings::default();
    if settings.top_products == 0 {
        settings.issues.push("top_products must be positive".into());
        settings.top_products = defaults.top_products;
    }
    if settings.max_sessions == 0 {
        settings.issues.push("max_sessions must be positive".into());
        settings.max_sessions = defaults.max_sessions;
    }
    if settings.session_ttl_seconds == 0 {
        settings
            .issues
            .push("session_ttl_seconds must be positive".into());
        settings.session_ttl_seconds = defaults.session_ttl_seconds;
    }
    if settings.max_upload_bytes == 0 {
        settings.issues.push("max_upload_bytes must be positive".into());
        settings.max_upload_bytes = defaults.max_upload_bytes;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
