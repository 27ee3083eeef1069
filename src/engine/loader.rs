use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;

use super::lock;
use crate::{
    api::{Document, DynDocument, DynMapRuntime, MapRuntime, ScriptId, ScriptTag},
    config::Config,
    error::{load_error, missing_api_key_error, unexpected_error, Error},
};

pub const KAKAO_SDK_HOST: &str = "dapi.kakao.com";

const KAKAO_SDK_URL: &str = "https://dapi.kakao.com/v2/maps/sdk.js";
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone, Debug, PartialEq)]
pub enum LoaderState {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

impl LoaderState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed(_))
    }
}

impl ScriptTag {
    pub fn kakao_sdk(api_key: &str) -> Result<Self, Error> {
        let url = reqwest::Url::parse_with_params(
            KAKAO_SDK_URL,
            &[("appkey", api_key), ("autoload", "false")],
        )
        .map_err(unexpected_error)?;

        Ok(Self {
            src: url.to_string(),
            is_async: true,
        })
    }
}

/// Loads the Kakao Maps SDK once and shares the outcome with every consumer.
///
/// Clones share one load. The first `ensure_loaded` call spawns the load on
/// its own task, so it runs to completion even if that caller is dropped;
/// every call then waits for the terminal state. A failed load is final.
#[derive(Clone)]
pub struct ProviderLoader {
    inner: Arc<Inner>,
}

struct Inner {
    document: DynDocument,
    runtime: DynMapRuntime,
    api_key: Option<String>,
    poll_interval: Duration,
    poll_attempts: u32,
    started: AtomicBool,
    state: watch::Sender<LoaderState>,
    consumers: Mutex<Consumers>,
}

#[derive(Default)]
struct Consumers {
    count: usize,
    injected: Option<ScriptId>,
}

impl ProviderLoader {
    pub fn new(config: &Config, document: DynDocument, runtime: DynMapRuntime) -> Self {
        let (state, _) = watch::channel(LoaderState::Idle);

        Self {
            inner: Arc::new(Inner {
                document,
                runtime,
                api_key: config.kakao_js_key.clone(),
                poll_interval: config.poll_interval,
                poll_attempts: config.poll_attempts,
                started: AtomicBool::new(false),
                state,
                consumers: Mutex::new(Consumers::default()),
            }),
        }
    }

    pub fn state(&self) -> LoaderState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoaderState> {
        self.inner.state.subscribe()
    }

    pub fn runtime(&self) -> DynMapRuntime {
        self.inner.runtime.clone()
    }

    /// Registers a consumer. The injected script is removed once every mount is dropped.
    pub fn mount(&self) -> Mount {
        lock(&self.inner.consumers).count += 1;

        Mount {
            loader: self.clone(),
            state: self.subscribe(),
        }
    }

    #[tracing::instrument(name = "ProviderLoader::ensure_loaded", skip(self))]
    pub async fn ensure_loaded(&self) -> LoaderState {
        if !self.inner.started.swap(true, Ordering::SeqCst) {
            let loader = self.clone();
            tokio::spawn(async move { loader.load().await });
        }

        let mut state = self.subscribe();
        let settled = match state.wait_for(LoaderState::is_terminal).await {
            Ok(settled) => settled.clone(),
            Err(_) => self.state(),
        };
        settled
    }

    async fn load(&self) {
        let state = match self.try_load().await {
            Ok(()) => LoaderState::Ready,
            Err(err) => {
                tracing::error!("failed to load Kakao Maps: {}", err);
                LoaderState::Failed(err.message)
            }
        };

        self.inner.state.send_replace(state);
    }

    async fn try_load(&self) -> Result<(), Error> {
        let api_key = self
            .inner
            .api_key
            .as_deref()
            .ok_or_else(missing_api_key_error)?;

        if self.inner.runtime.is_available() {
            tracing::info!("Kakao Maps already loaded");
            return Ok(());
        }

        self.inner.state.send_replace(LoaderState::Loading);

        if self.inner.document.find_script(KAKAO_SDK_HOST).is_some() {
            tracing::info!("Kakao script already present, waiting for it to finish loading");
            return self.poll_until_available().await;
        }

        let tag = ScriptTag::kakao_sdk(api_key)?;
        let id = self.inner.document.append_script(tag);
        lock(&self.inner.consumers).injected = Some(id);

        self.inner
            .document
            .script_loaded(id)
            .await
            .map_err(|reason| {
                tracing::error!("Kakao script failed to load: {}", reason);
                load_error("Failed to load Kakao Maps")
            })?;

        tracing::info!("Kakao script loaded, initializing");

        if self.inner.runtime.has_initializer() {
            self.inner.runtime.initialize().await;
            tracing::info!("Kakao Maps API fully loaded");
            return Ok(());
        }

        self.poll_until_available().await
    }

    async fn poll_until_available(&self) -> Result<(), Error> {
        let max_interval = MAX_POLL_INTERVAL.max(self.inner.poll_interval);
        let mut interval = self.inner.poll_interval;

        for attempt in 0..self.inner.poll_attempts {
            if self.inner.runtime.is_available() {
                tracing::info!(attempt, "Kakao Maps API ready");
                return Ok(());
            }

            tokio::time::sleep(interval).await;
            interval = interval.mul_f64(1.5).min(max_interval);
        }

        if self.inner.runtime.is_available() {
            return Ok(());
        }

        Err(load_error("Timed out waiting for Kakao Maps"))
    }

    fn release(&self) {
        let injected = {
            let mut consumers = lock(&self.inner.consumers);
            consumers.count = consumers.count.saturating_sub(1);

            match consumers.count {
                0 => consumers.injected.take(),
                _ => None,
            }
        };

        if let Some(id) = injected {
            tracing::debug!("last consumer unmounted, removing Kakao script");
            self.inner.document.remove_script(id);
        }
    }
}

/// A consumer's hold on the loader.
pub struct Mount {
    loader: ProviderLoader,
    state: watch::Receiver<LoaderState>,
}

impl Mount {
    pub fn state(&self) -> LoaderState {
        self.state.borrow().clone()
    }

    pub fn loader(&self) -> &ProviderLoader {
        &self.loader
    }

    /// Drives the shared load and returns its terminal state.
    pub async fn ready(&mut self) -> LoaderState {
        let state = self.loader.ensure_loaded().await;
        self.state.borrow_and_update();
        state
    }
}

impl Drop for Mount {
    fn drop(&mut self) {
        self.loader.release();
    }
}
