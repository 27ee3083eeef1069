use serde::{Deserialize, Serialize};

/// A themed stop as sent to the recommendation backend. `order` starts at 1.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waypoint {
    pub theme_keyword: String,
    pub order: u32,
}

impl Waypoint {
    pub fn new(theme_keyword: impl Into<String>, order: u32) -> Self {
        Self {
            theme_keyword: theme_keyword.into(),
            order,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.theme_keyword.trim().is_empty()
    }
}
