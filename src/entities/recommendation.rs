use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entities::{Coordinates, Waypoint};

/// Body of `POST /api/recommend`. Built once per submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub start_lat: f64,
    pub start_lng: f64,
    pub total_distance_km: f64,
    pub is_round_trip: bool,
    pub waypoints: Vec<Waypoint>,
}

impl RecommendationRequest {
    /// Blank keywords are dropped; the survivors keep their order values.
    pub fn new(
        start: Coordinates,
        total_distance_km: f64,
        is_round_trip: bool,
        waypoints: &[Waypoint],
    ) -> Self {
        Self {
            start_lat: start.lat,
            start_lng: start.lng,
            total_distance_km,
            is_round_trip,
            waypoints: waypoints.iter().filter(|w| !w.is_blank()).cloned().collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub total_distance_km: f64,
    pub actual_total_distance_km: f64,
    pub is_round_trip: bool,
    #[serde(default)]
    pub waypoints: Vec<ResolvedWaypoint>,
    pub candidates_considered: u32,
    pub route_url: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedWaypoint {
    pub order: u32,
    pub place_name: String,
    pub theme_keyword: String,
    pub distance_km: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.is_round_trip {
            true => "round trip",
            false => "one way",
        };

        writeln!(
            f,
            "Target distance: {}km | Actual distance: {}km ({})",
            self.total_distance_km, self.actual_total_distance_km, mode
        )?;

        if self.waypoints.is_empty() {
            writeln!(
                f,
                "No waypoints found. Try other keywords or a different distance."
            )?;
        } else {
            for waypoint in &self.waypoints {
                writeln!(f, "Waypoint {}: {}", waypoint.order, waypoint.place_name)?;
                writeln!(
                    f,
                    "  Theme: {} | Distance: {:.2}km",
                    waypoint.theme_keyword, waypoint.distance_km
                )?;
                if let Some(address) = &waypoint.address_name {
                    writeln!(f, "  Address: {}", address)?;
                }
                if let Some(phone) = &waypoint.phone {
                    writeln!(f, "  Phone: {}", phone)?;
                }
            }
            writeln!(
                f,
                "Chosen from {} candidate places",
                self.candidates_considered
            )?;
        }

        write!(f, "Walking directions: {}", self.route_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_drops_blank_keywords_without_renumbering() {
        let waypoints = vec![
            Waypoint::new("  ", 1),
            Waypoint::new("카페", 2),
            Waypoint::new("", 3),
            Waypoint::new("맥주", 4),
        ];

        let request = RecommendationRequest::new(Coordinates::new(37.5, 127.0), 7.0, true, &waypoints);

        assert_eq!(
            request.waypoints,
            vec![Waypoint::new("카페", 2), Waypoint::new("맥주", 4)]
        );
    }

    #[test]
    fn request_serializes_with_backend_field_names() {
        let request = RecommendationRequest::new(
            Coordinates::new(37.5, 127.0),
            7.0,
            false,
            &[Waypoint::new("카페", 1)],
        );

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "start_lat": 37.5,
                "start_lng": 127.0,
                "total_distance_km": 7.0,
                "is_round_trip": false,
                "waypoints": [{ "theme_keyword": "카페", "order": 1 }]
            })
        );
    }

    #[test]
    fn recommendation_accepts_missing_optional_fields() {
        let body = json!({
            "total_distance_km": 7.0,
            "actual_total_distance_km": 7.42,
            "is_round_trip": true,
            "waypoints": [{
                "order": 1,
                "place_name": "Blue Bottle",
                "theme_keyword": "카페",
                "distance_km": 1.234
            }],
            "candidates_considered": 15,
            "route_url": "https://map.kakao.com/?sName=a&eName=b"
        });

        let recommendation: Recommendation = serde_json::from_value(body).unwrap();

        assert_eq!(recommendation.waypoints.len(), 1);
        assert!(recommendation.waypoints[0].address_name.is_none());
        assert!(recommendation.waypoints[0].phone.is_none());
    }

    #[test]
    fn renders_course_summary() {
        let recommendation = Recommendation {
            total_distance_km: 7.0,
            actual_total_distance_km: 7.42,
            is_round_trip: false,
            waypoints: vec![ResolvedWaypoint {
                order: 1,
                place_name: "Blue Bottle".into(),
                theme_keyword: "카페".into(),
                distance_km: 1.234,
                address_name: Some("Seoul Jongno-gu".into()),
                phone: None,
            }],
            candidates_considered: 15,
            route_url: "https://map.kakao.com/".into(),
        };

        let text = recommendation.to_string();

        assert!(text.starts_with("Target distance: 7km | Actual distance: 7.42km (one way)"));
        assert!(text.contains("Waypoint 1: Blue Bottle"));
        assert!(text.contains("Theme: 카페 | Distance: 1.23km"));
        assert!(text.contains("Address: Seoul Jongno-gu"));
        assert!(!text.contains("Phone:"));
        assert!(text.contains("Chosen from 15 candidate places"));
        assert!(text.ends_with("Walking directions: https://map.kakao.com/"));
    }

    #[test]
    fn renders_empty_course_hint() {
        let recommendation = Recommendation {
            total_distance_km: 3.0,
            actual_total_distance_km: 0.0,
            is_round_trip: true,
            waypoints: vec![],
            candidates_considered: 0,
            route_url: String::new(),
        };

        assert!(recommendation
            .to_string()
            .contains("No waypoints found. Try other keywords or a different distance."));
    }
}
