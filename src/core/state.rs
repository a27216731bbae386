use std::sync::Arc;

use crate::core::config::Settings;
use crate::services::providers::VisionProvider;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    provider: Arc<dyn VisionProvider>,
}

impl AppState {
    pub(crate) fn new(settings: Settings, provider: Arc<dyn VisionProvider>) -> Self {
        Self { inner: Arc::new(InnerState { settings, provider }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn provider(&self) -> &dyn VisionProvider {
        self.inner.provider.as_ref()
    }
}
