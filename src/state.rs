//! Shared application state
//!
//! Built once at startup and passed by reference into request handling.
//! Settings and the error-rendering strategy are immutable after boot.

use crate::error::ErrorRenderer;
use crate::settings::Settings;
use crate::store::SurveyStore;
use crate::views::Views;

pub struct AppState {
    pub settings: Settings,
    pub error_renderer: ErrorRenderer,
    pub views: Views,
    pub surveys: SurveyStore,
}

impl AppState {
    #[must_use]
    pub fn new(settings: Settings, surveys: SurveyStore) -> Self {
        let error_renderer = ErrorRenderer::for_environment(settings.env);
        let views = Views::new(&settings.app.views_dir);
        Self {
            settings,
            error_renderer,
            views,
            surveys,
        }
    }
}
