use std::sync::{Arc, Mutex};

use super::lock;
use super::loader::{LoaderState, Mount};
use crate::{
    api::{MapRuntime, MapSurface, Marker},
    entities::Coordinates,
};

pub const DEFAULT_CENTER: Coordinates = Coordinates {
    lat: 37.5665,
    lng: 126.978,
};

pub const DEFAULT_LEVEL: u8 = 5;

pub type PickHandler = Arc<dyn Fn(Coordinates) + Send + Sync>;

#[derive(Clone, Debug, PartialEq)]
pub enum PickerView {
    Loading,
    Failed { reason: String },
    Ready { selected: Option<Coordinates> },
}

impl PickerView {
    pub fn caption(&self) -> String {
        match self {
            Self::Loading => "Loading Kakao map...".into(),
            Self::Failed { reason } => format!("{} (check the Kakao Maps API key)", reason),
            Self::Ready {
                selected: Some(c),
            } => format!("Selected location: {:.6}, {:.6}", c.lat, c.lng),
            Self::Ready { selected: None } => "Click the map to choose a starting point".into(),
        }
    }
}

/// Map surface that turns clicks into a single picked starting point.
pub struct CoordinatePicker {
    mount: Mount,
    on_pick: PickHandler,
    selected: Arc<Mutex<Option<Coordinates>>>,
    surface: Option<Arc<dyn MapSurface>>,
    marker: Option<Arc<dyn Marker>>,
}

impl CoordinatePicker {
    pub fn new(mount: Mount, on_pick: PickHandler) -> Self {
        Self {
            mount,
            on_pick,
            selected: Arc::new(Mutex::new(None)),
            surface: None,
            marker: None,
        }
    }

    /// Waits for the provider, attaches the map once it is ready and returns what to show.
    pub async fn ready(&mut self) -> PickerView {
        let state = self.mount.ready().await;
        self.sync(&state);
        self.view()
    }

    /// Non-blocking variant of [`CoordinatePicker::ready`].
    pub fn refresh(&mut self) -> PickerView {
        let state = self.mount.state();
        self.sync(&state);
        self.view()
    }

    pub fn view(&self) -> PickerView {
        match self.mount.state() {
            LoaderState::Idle | LoaderState::Loading => PickerView::Loading,
            LoaderState::Failed(reason) => PickerView::Failed { reason },
            LoaderState::Ready => PickerView::Ready {
                selected: *lock(&self.selected),
            },
        }
    }

    pub fn selected(&self) -> Option<Coordinates> {
        *lock(&self.selected)
    }

    pub fn marker_position(&self) -> Option<Coordinates> {
        self.marker.as_ref().map(|m| m.position())
    }

    pub fn surface(&self) -> Option<Arc<dyn MapSurface>> {
        self.surface.clone()
    }

    fn sync(&mut self, state: &LoaderState) {
        if *state == LoaderState::Ready && self.surface.is_none() {
            self.attach();
        }
    }

    #[tracing::instrument(name = "CoordinatePicker::attach", skip(self))]
    fn attach(&mut self) {
        tracing::info!("initializing Kakao map");

        let surface = match self
            .mount
            .loader()
            .runtime()
            .create_map(DEFAULT_CENTER, DEFAULT_LEVEL)
        {
            Ok(surface) => surface,
            Err(err) => {
                tracing::error!("error initializing Kakao map: {}", err);
                return;
            }
        };

        let marker = surface.add_marker(surface.center());

        let handler_marker = marker.clone();
        let selected = self.selected.clone();
        let on_pick = self.on_pick.clone();

        surface.on_click(Box::new(move |position: Coordinates| {
            handler_marker.set_position(position);
            *lock(&selected) = Some(position);
            tracing::debug!(lat = position.lat, lng = position.lng, "picked start");
            on_pick(position);
        }));

        self.surface = Some(surface);
        self.marker = Some(marker);

        tracing::info!("Kakao map initialized");
    }
}
