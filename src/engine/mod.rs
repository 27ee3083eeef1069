mod form;
mod loader;
mod picker;
mod submission;
mod waypoints;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    api::{DynDocument, DynMapRuntime, DynRecommendAPI},
    config::Config,
    external::recommend::RecommendClient,
};

pub use form::{ConfigurationForm, DEFAULT_DISTANCE_KM, DEFAULT_KEYWORDS};
pub use loader::{LoaderState, Mount, ProviderLoader, KAKAO_SDK_HOST};
pub use picker::{CoordinatePicker, PickHandler, PickerView, DEFAULT_CENTER, DEFAULT_LEVEL};
pub use submission::{FormInput, SubmissionController, SubmissionState};
pub use waypoints::{DragState, WaypointItem, WaypointSequence};

/// Process-wide pieces shared by every form: the provider loader and the
/// recommendation backend.
pub struct Engine {
    loader: ProviderLoader,
    api: Option<DynRecommendAPI>,
}

impl Engine {
    #[tracing::instrument(name = "Engine::new", skip_all)]
    pub fn new(config: &Config, document: DynDocument, runtime: DynMapRuntime) -> Self {
        let api = config
            .backend_url
            .as_ref()
            .map(|url| Arc::new(RecommendClient::new(url.clone())) as DynRecommendAPI);

        if api.is_none() {
            tracing::warn!("BACKEND_URL is not set, submissions will fail");
        }

        Self {
            loader: ProviderLoader::new(config, document, runtime),
            api,
        }
    }

    pub fn with_api(mut self, api: DynRecommendAPI) -> Self {
        self.api = Some(api);
        self
    }

    pub fn loader(&self) -> &ProviderLoader {
        &self.loader
    }

    pub fn form(&self) -> ConfigurationForm {
        ConfigurationForm::new(&self.loader, self.api.clone())
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
