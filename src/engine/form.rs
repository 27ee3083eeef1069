use std::sync::{Arc, Mutex};

use super::lock;
use super::loader::ProviderLoader;
use super::picker::{CoordinatePicker, PickerView};
use super::submission::{FormInput, SubmissionController, SubmissionState};
use super::waypoints::WaypointSequence;
use crate::{api::DynRecommendAPI, entities::Coordinates};

pub const DEFAULT_DISTANCE_KM: f64 = 7.0;
pub const DEFAULT_KEYWORDS: [&str; 3] = ["카페", "맛집", "맥주"];

/// The course configuration screen: map picker, trip options, waypoint
/// editor and the submission that ties them together.
pub struct ConfigurationForm {
    picker: CoordinatePicker,
    start: Arc<Mutex<Option<Coordinates>>>,
    total_distance_km: f64,
    is_round_trip: bool,
    waypoints: WaypointSequence,
    submission: SubmissionController,
}

impl ConfigurationForm {
    pub fn new(loader: &ProviderLoader, api: Option<DynRecommendAPI>) -> Self {
        let start = Arc::new(Mutex::new(None));

        let sink = start.clone();
        let picker = CoordinatePicker::new(
            loader.mount(),
            Arc::new(move |position: Coordinates| {
                *lock(&sink) = Some(position);
            }),
        );

        Self {
            picker,
            start,
            total_distance_km: DEFAULT_DISTANCE_KM,
            is_round_trip: true,
            waypoints: WaypointSequence::from_keywords(DEFAULT_KEYWORDS),
            submission: SubmissionController::new(api),
        }
    }

    pub fn picker(&self) -> &CoordinatePicker {
        &self.picker
    }

    pub fn picker_mut(&mut self) -> &mut CoordinatePicker {
        &mut self.picker
    }

    pub async fn map_ready(&mut self) -> PickerView {
        self.picker.ready().await
    }

    pub fn start(&self) -> Option<Coordinates> {
        *lock(&self.start)
    }

    pub fn total_distance_km(&self) -> f64 {
        self.total_distance_km
    }

    pub fn set_total_distance_km(&mut self, km: f64) {
        self.total_distance_km = km;
    }

    pub fn is_round_trip(&self) -> bool {
        self.is_round_trip
    }

    pub fn set_round_trip(&mut self, is_round_trip: bool) {
        self.is_round_trip = is_round_trip;
    }

    pub fn waypoints(&self) -> &WaypointSequence {
        &self.waypoints
    }

    pub fn waypoints_mut(&mut self) -> &mut WaypointSequence {
        &mut self.waypoints
    }

    pub fn submission(&self) -> &SubmissionController {
        &self.submission
    }

    pub fn input(&self) -> FormInput {
        FormInput {
            start: self.start(),
            total_distance_km: self.total_distance_km,
            is_round_trip: self.is_round_trip,
            waypoints: self.waypoints.waypoints(),
        }
    }

    pub fn can_submit(&self) -> bool {
        self.input().can_submit()
    }

    pub fn submit_enabled(&self) -> bool {
        self.can_submit() && !self.submission.is_loading()
    }

    pub fn submit_label(&self) -> &'static str {
        match self.submission.is_loading() {
            true => "Recommending...",
            false => "Recommend running course",
        }
    }

    pub async fn submit(&self) -> bool {
        let input = self.input();
        self.submission.submit(&input).await
    }

    /// Text for the area below the form: the rendered course or the error.
    pub fn outcome(&self) -> Option<String> {
        match self.submission.state() {
            SubmissionState::Succeeded(recommendation) => Some(recommendation.to_string()),
            SubmissionState::Failed(message) => Some(message),
            SubmissionState::Idle | SubmissionState::Submitting => None,
        }
    }
}
