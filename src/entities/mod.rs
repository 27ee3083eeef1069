mod coordinates;
mod recommendation;
mod waypoint;

pub use coordinates::Coordinates;
pub use recommendation::{Recommendation, RecommendationRequest, ResolvedWaypoint};
pub use waypoint::Waypoint;
