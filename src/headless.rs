//! In-memory provider host for running the form outside a browser.
//!
//! The document records injected script tags, the runtime exposes a map API
//! whose surfaces receive clicks through [`HeadlessMap::click`].

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::{
    api::{ClickHandler, Document, MapRuntime, MapSurface, Marker, ScriptId, ScriptTag},
    engine::lock,
    entities::Coordinates,
    error::{invalid_state_error, Error},
};

#[derive(Default)]
pub struct HeadlessDocument {
    next_id: AtomicU64,
    scripts: Mutex<Vec<(ScriptId, ScriptTag)>>,
    failure: Mutex<Option<String>>,
}

impl HeadlessDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts injected from now on fire their error event with `reason`.
    pub fn fail_scripts(&self, reason: impl Into<String>) {
        *lock(&self.failure) = Some(reason.into());
    }

    pub fn scripts(&self) -> Vec<ScriptTag> {
        lock(&self.scripts)
            .iter()
            .map(|(_, tag)| tag.clone())
            .collect()
    }

    pub fn count_scripts(&self, host: &str) -> usize {
        lock(&self.scripts)
            .iter()
            .filter(|(_, tag)| tag.src.contains(host))
            .count()
    }
}

#[async_trait]
impl Document for HeadlessDocument {
    fn find_script(&self, host: &str) -> Option<ScriptId> {
        lock(&self.scripts)
            .iter()
            .find(|(_, tag)| tag.src.contains(host))
            .map(|(id, _)| *id)
    }

    fn append_script(&self, tag: ScriptTag) -> ScriptId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.scripts).push((id, tag));
        id
    }

    async fn script_loaded(&self, _id: ScriptId) -> Result<(), String> {
        match lock(&self.failure).clone() {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }

    fn remove_script(&self, id: ScriptId) {
        lock(&self.scripts).retain(|(script_id, _)| *script_id != id);
    }
}

pub struct HeadlessRuntime {
    available: AtomicBool,
    initializer: bool,
    maps: Mutex<Vec<Arc<HeadlessMap>>>,
}

impl HeadlessRuntime {
    /// Runtime whose script has not run yet; `initialize` makes it available.
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(false),
            initializer: true,
            maps: Mutex::new(vec![]),
        }
    }

    pub fn available() -> Self {
        let runtime = Self::new();
        runtime.make_available();
        runtime
    }

    /// Runtime without a deferred initializer; callers must poll.
    pub fn without_initializer() -> Self {
        Self {
            initializer: false,
            ..Self::new()
        }
    }

    pub fn make_available(&self) {
        self.available.store(true, Ordering::SeqCst);
    }

    pub fn maps(&self) -> Vec<Arc<HeadlessMap>> {
        lock(&self.maps).clone()
    }

    pub fn last_map(&self) -> Option<Arc<HeadlessMap>> {
        lock(&self.maps).last().cloned()
    }
}

impl Default for HeadlessRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MapRuntime for HeadlessRuntime {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn has_initializer(&self) -> bool {
        self.initializer
    }

    async fn initialize(&self) {
        self.make_available();
    }

    fn create_map(&self, center: Coordinates, level: u8) -> Result<Arc<dyn MapSurface>, Error> {
        if !self.is_available() {
            return Err(invalid_state_error());
        }

        let map = Arc::new(HeadlessMap::new(center, level));
        lock(&self.maps).push(map.clone());

        Ok(map)
    }
}

pub struct HeadlessMap {
    center: Coordinates,
    level: u8,
    markers: Mutex<Vec<Arc<HeadlessMarker>>>,
    handlers: Mutex<Vec<ClickHandler>>,
    clicks: AtomicUsize,
}

impl HeadlessMap {
    fn new(center: Coordinates, level: u8) -> Self {
        Self {
            center,
            level,
            markers: Mutex::new(vec![]),
            handlers: Mutex::new(vec![]),
            clicks: AtomicUsize::new(0),
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn marker_count(&self) -> usize {
        lock(&self.markers).len()
    }

    pub fn handler_count(&self) -> usize {
        lock(&self.handlers).len()
    }

    pub fn click_count(&self) -> usize {
        self.clicks.load(Ordering::SeqCst)
    }

    /// Delivers a click to every registered handler, in registration order.
    pub fn click(&self, position: Coordinates) {
        self.clicks.fetch_add(1, Ordering::SeqCst);
        for handler in lock(&self.handlers).iter() {
            handler(position);
        }
    }
}

impl MapSurface for HeadlessMap {
    fn center(&self) -> Coordinates {
        self.center
    }

    fn add_marker(&self, position: Coordinates) -> Arc<dyn Marker> {
        let marker = Arc::new(HeadlessMarker {
            position: Mutex::new(position),
        });
        lock(&self.markers).push(marker.clone());
        marker
    }

    fn on_click(&self, handler: ClickHandler) {
        lock(&self.handlers).push(handler);
    }
}

pub struct HeadlessMarker {
    position: Mutex<Coordinates>,
}

impl Marker for HeadlessMarker {
    fn position(&self) -> Coordinates {
        *lock(&self.position)
    }

    fn set_position(&self, position: Coordinates) {
        *lock(&self.position) = position;
    }
}
