use async_trait::async_trait;
use std::sync::Arc;

use crate::entities::{Coordinates, Recommendation, RecommendationRequest};
use crate::error::Error;

#[async_trait]
pub trait RecommendAPI {
    async fn recommend(&self, request: &RecommendationRequest) -> Result<Recommendation, Error>;
}

pub type DynRecommendAPI = Arc<dyn RecommendAPI + Send + Sync>;

pub type ScriptId = u64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptTag {
    pub src: String,
    pub is_async: bool,
}

/// The page document the provider script is injected into.
#[async_trait]
pub trait Document {
    /// First script element whose `src` contains `host`.
    fn find_script(&self, host: &str) -> Option<ScriptId>;
    fn append_script(&self, tag: ScriptTag) -> ScriptId;
    /// Resolves on the element's load event, or with the failure detail on its error event.
    async fn script_loaded(&self, id: ScriptId) -> Result<(), String>;
    fn remove_script(&self, id: ScriptId);
}

/// The map provider's global object once its script has run.
#[async_trait]
pub trait MapRuntime {
    /// Whether the interactive map API can be used.
    fn is_available(&self) -> bool;
    fn has_initializer(&self) -> bool;
    /// Runs the provider's deferred initializer and resolves once the API is usable.
    async fn initialize(&self);
    fn create_map(&self, center: Coordinates, level: u8) -> Result<Arc<dyn MapSurface>, Error>;
}

pub type ClickHandler = Box<dyn Fn(Coordinates) + Send + Sync>;

pub trait MapSurface: Send + Sync {
    fn center(&self) -> Coordinates;
    fn add_marker(&self, position: Coordinates) -> Arc<dyn Marker>;
    fn on_click(&self, handler: ClickHandler);
}

pub trait Marker: Send + Sync {
    fn position(&self) -> Coordinates;
    fn set_position(&self, position: Coordinates);
}

pub type DynDocument = Arc<dyn Document + Send + Sync>;
pub type DynMapRuntime = Arc<dyn MapRuntime + Send + Sync>;
