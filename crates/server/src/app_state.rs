use dashboard_api::{HtmlOptions, RenderOptions};

use crate::{config::Settings, session::SessionStore};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) max_upload_bytes: usize,
    pub(crate) render: RenderOptions,
    pub(crate) html: HtmlOptions,
    pub(crate) sessions: SessionStore,
}

impl AppState {
    pub(crate) fn from_settings(settings: &Settings) -> Self {
        Self {
            max_upload_bytes: settings.max_upload_bytes,
            render: settings.render_options(),
            html: settings.html_options(),
            sessions: SessionStore::new(settings.session_ttl(), settings.max_sessions),
        }
    }
}
