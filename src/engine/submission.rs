use tokio::sync::watch;

use crate::{
    api::DynRecommendAPI,
    entities::{Coordinates, Recommendation, RecommendationRequest, Waypoint},
    error::missing_backend_url_error,
};

#[derive(Clone, Debug, PartialEq)]
pub enum SubmissionState {
    Idle,
    Submitting,
    Succeeded(Recommendation),
    Failed(String),
}

/// Snapshot of the form taken when the user submits.
#[derive(Clone, Debug, PartialEq)]
pub struct FormInput {
    pub start: Option<Coordinates>,
    pub total_distance_km: f64,
    pub is_round_trip: bool,
    pub waypoints: Vec<Waypoint>,
}

impl FormInput {
    pub fn can_submit(&self) -> bool {
        self.start.is_some()
            && self.total_distance_km > 0.0
            && self.waypoints.iter().any(|w| !w.is_blank())
    }

    pub fn request(&self) -> Option<RecommendationRequest> {
        if !self.can_submit() {
            return None;
        }

        let start = self.start?;

        Some(RecommendationRequest::new(
            start,
            self.total_distance_km,
            self.is_round_trip,
            &self.waypoints,
        ))
    }
}

/// Sends recommendation requests and holds the latest outcome.
pub struct SubmissionController {
    api: Option<DynRecommendAPI>,
    state: watch::Sender<SubmissionState>,
}

impl SubmissionController {
    /// `api` is `None` when no backend URL is configured.
    pub fn new(api: Option<DynRecommendAPI>) -> Self {
        let (state, _) = watch::channel(SubmissionState::Idle);

        Self { api, state }
    }

    pub fn state(&self) -> SubmissionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.state.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        *self.state.borrow() == SubmissionState::Submitting
    }

    pub fn result(&self) -> Option<Recommendation> {
        match &*self.state.borrow() {
            SubmissionState::Succeeded(recommendation) => Some(recommendation.clone()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<String> {
        match &*self.state.borrow() {
            SubmissionState::Failed(message) => Some(message.clone()),
            _ => None,
        }
    }

    /// Submits `input` unless its preconditions fail or a submission is
    /// already running. Returns whether a submission was made.
    #[tracing::instrument(name = "SubmissionController::submit", skip_all)]
    pub async fn submit(&self, input: &FormInput) -> bool {
        let request = match input.request() {
            Some(request) => request,
            None => {
                tracing::debug!("submit ignored, form incomplete");
                return false;
            }
        };

        let api = match &self.api {
            Some(api) => api.clone(),
            None => {
                let err = missing_backend_url_error();
                tracing::error!("{}", err);
                return self.state.send_if_modified(|state| match state {
                    SubmissionState::Submitting => false,
                    _ => {
                        *state = SubmissionState::Failed(err.classify());
                        true
                    }
                });
            }
        };

        let started = self.state.send_if_modified(|state| match state {
            SubmissionState::Submitting => false,
            _ => {
                *state = SubmissionState::Submitting;
                true
            }
        });

        if !started {
            tracing::warn!("submit ignored, a recommendation is already in flight");
            return false;
        }

        let guard = InFlight { state: &self.state };

        tracing::info!(
            waypoints = request.waypoints.len(),
            total_distance_km = request.total_distance_km,
            is_round_trip = request.is_round_trip,
            "requesting recommendation"
        );

        let next = match api.recommend(&request).await {
            Ok(recommendation) => {
                tracing::info!(
                    actual_total_distance_km = recommendation.actual_total_distance_km,
                    candidates_considered = recommendation.candidates_considered,
                    "received recommendation"
                );
                SubmissionState::Succeeded(recommendation)
            }
            Err(err) => {
                tracing::warn!(code = err.code, "recommendation failed: {}", err);
                SubmissionState::Failed(err.classify())
            }
        };

        guard.finish(next);

        true
    }
}

/// Clears `Submitting` if the submission future is dropped before it settles.
struct InFlight<'a> {
    state: &'a watch::Sender<SubmissionState>,
}

impl InFlight<'_> {
    fn finish(self, next: SubmissionState) {
        self.state.send_replace(next);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state.send_if_modified(|state| match state {
            SubmissionState::Submitting => {
                *state = SubmissionState::Idle;
                true
            }
            _ => false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RecommendAPI;
    use crate::error::{transport_error, upstream_error, Error, SERVICE_NOT_ENABLED_MESSAGE};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    struct Scripted {
        requests: Mutex<Vec<RecommendationRequest>>,
        reply: Result<Recommendation, Error>,
        gate: Option<Arc<Notify>>,
    }

    impl Scripted {
        fn new(reply: Result<Recommendation, Error>) -> Self {
            Self {
                requests: Mutex::new(vec![]),
                reply,
                gate: None,
            }
        }
    }

    #[async_trait]
    impl RecommendAPI for Scripted {
        async fn recommend(
            &self,
            request: &RecommendationRequest,
        ) -> Result<Recommendation, Error> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.reply.clone()
        }
    }

    fn recommendation() -> Recommendation {
        Recommendation {
            total_distance_km: 7.0,
            actual_total_distance_km: 7.3,
            is_round_trip: true,
            waypoints: vec![],
            candidates_considered: 4,
            route_url: "https://map.kakao.com/link/by/walk/a,37.5,127.0".into(),
        }
    }

    fn input() -> FormInput {
        FormInput {
            start: Some(Coordinates::new(37.5, 127.0)),
            total_distance_km: 7.0,
            is_round_trip: true,
            waypoints: vec![Waypoint::new("카페", 1), Waypoint::new(" ", 2)],
        }
    }

    #[test]
    fn can_submit_requires_start_distance_and_keyword() {
        assert!(input().can_submit());

        let mut missing_start = input();
        missing_start.start = None;
        assert!(!missing_start.can_submit());

        let mut zero_distance = input();
        zero_distance.total_distance_km = 0.0;
        assert!(!zero_distance.can_submit());

        let mut negative_distance = input();
        negative_distance.total_distance_km = -3.0;
        assert!(!negative_distance.can_submit());

        let mut blank_keywords = input();
        blank_keywords.waypoints = vec![Waypoint::new("", 1), Waypoint::new("   ", 2)];
        assert!(!blank_keywords.can_submit());
    }

    #[tokio::test]
    async fn blank_waypoints_are_filtered_without_renumbering() {
        let api = Arc::new(Scripted::new(Ok(recommendation())));
        let controller = SubmissionController::new(Some(api.clone()));

        assert!(controller.submit(&input()).await);

        let requests = api.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].waypoints, vec![Waypoint::new("카페", 1)]);
        assert_eq!(controller.result(), Some(recommendation()));
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn incomplete_form_does_not_call_backend() {
        let api = Arc::new(Scripted::new(Ok(recommendation())));
        let controller = SubmissionController::new(Some(api.clone()));
        let mut form = input();
        form.start = None;

        assert!(!controller.submit(&form).await);

        assert!(api.requests.lock().unwrap().is_empty());
        assert_eq!(controller.state(), SubmissionState::Idle);
    }

    #[tokio::test]
    async fn missing_backend_is_a_configuration_failure() {
        let controller = SubmissionController::new(None);

        controller.submit(&input()).await;

        let message = controller.error().unwrap();
        assert!(message.contains("BACKEND_URL"));
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn disabled_local_service_is_classified() {
        let api = Arc::new(Scripted::new(Err(upstream_error(
            "{\"errorType\":\"NotAuthorizedError\",\"message\":\"App disabled OPEN_MAP_AND_LOCAL service.\"}",
        ))));
        let controller = SubmissionController::new(Some(api));

        controller.submit(&input()).await;

        assert_eq!(controller.error().as_deref(), Some(SERVICE_NOT_ENABLED_MESSAGE));
        assert!(controller.result().is_none());
    }

    #[tokio::test]
    async fn transport_failure_is_verbatim() {
        let api = Arc::new(Scripted::new(Err(transport_error("error sending request"))));
        let controller = SubmissionController::new(Some(api));

        controller.submit(&input()).await;

        assert_eq!(controller.error().as_deref(), Some("error sending request"));
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn second_submit_while_in_flight_is_rejected() {
        let gate = Arc::new(Notify::new());
        let api = Arc::new(Scripted {
            requests: Mutex::new(vec![]),
            reply: Ok(recommendation()),
            gate: Some(gate.clone()),
        });
        let controller = SubmissionController::new(Some(api.clone()));
        let form = input();

        let first = controller.submit(&form);
        let second = async {
            tokio::task::yield_now().await;
            assert!(controller.is_loading());
            let accepted = controller.submit(&form).await;
            gate.notify_one();
            accepted
        };

        let (first, second) = tokio::join!(first, second);

        assert!(first);
        assert!(!second);
        assert_eq!(api.requests.lock().unwrap().len(), 1);
        assert!(controller.result().is_some());
    }

    #[tokio::test]
    async fn new_submit_clears_previous_error() {
        let gate = Arc::new(Notify::new());
        let api = Arc::new(Scripted {
            requests: Mutex::new(vec![]),
            reply: Ok(recommendation()),
            gate: Some(gate.clone()),
        });
        let controller = SubmissionController::new(Some(api));
        controller
            .state
            .send_replace(SubmissionState::Failed("previous".into()));

        let form = input();
        let submit = controller.submit(&form);
        let observe = async {
            tokio::task::yield_now().await;
            let seen = controller.state();
            gate.notify_one();
            seen
        };

        let (_, seen) = tokio::join!(submit, observe);

        assert_eq!(seen, SubmissionState::Submitting);
        assert!(controller.error().is_none());
    }

    #[tokio::test]
    async fn dropped_submission_clears_loading() {
        let gate = Arc::new(Notify::new());
        let api = Arc::new(Scripted {
            requests: Mutex::new(vec![]),
            reply: Ok(recommendation()),
            gate: Some(gate),
        });
        let controller = SubmissionController::new(Some(api));
        let form = input();

        {
            let mut submit = tokio_test::task::spawn(controller.submit(&form));
            tokio_test::assert_pending!(submit.poll());
            assert!(controller.is_loading());
        }

        assert!(!controller.is_loading());
        assert_eq!(controller.state(), SubmissionState::Idle);
    }
}
