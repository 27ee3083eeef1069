use std::fmt::{self, Display};

pub const SERVICE_NOT_ENABLED_MARKER: &str = "OPEN_MAP_AND_LOCAL";

pub const SERVICE_NOT_ENABLED_MESSAGE: &str = "Kakao Local API is not enabled. Enable the \"OPEN_MAP_AND_LOCAL\" service in the Kakao developer console.";

#[derive(Clone, Debug, PartialEq)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        transport_error(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        unexpected_error(err)
    }
}

impl Error {
    pub fn is_configuration_error(&self) -> bool {
        self.code == 1
    }

    pub fn is_load_error(&self) -> bool {
        self.code == 2
    }

    pub fn is_transport_error(&self) -> bool {
        self.code == 3
    }

    pub fn is_upstream_error(&self) -> bool {
        self.code == 4
    }

    /// Message shown to the user. A rejected recommendation whose body names
    /// the disabled local search service is rewritten into the enablement
    /// instruction; every other message is passed through unchanged.
    pub fn classify(&self) -> String {
        if self.is_upstream_error() && self.message.contains(SERVICE_NOT_ENABLED_MARKER) {
            return SERVICE_NOT_ENABLED_MESSAGE.into();
        }

        self.message.clone()
    }
}

pub fn configuration_error(message: impl Into<String>) -> Error {
    Error {
        code: 1,
        message: message.into(),
    }
}

pub fn missing_api_key_error() -> Error {
    configuration_error(
        "Kakao Maps API key is not configured. Check the KAKAO_JS_KEY environment variable.",
    )
}

pub fn missing_backend_url_error() -> Error {
    configuration_error(
        "Backend URL is not configured. Check the BACKEND_URL environment variable.",
    )
}

pub fn load_error(message: impl Into<String>) -> Error {
    Error {
        code: 2,
        message: message.into(),
    }
}

pub fn transport_error<T: Display>(err: T) -> Error {
    Error {
        code: 3,
        message: err.to_string(),
    }
}

/// Non-success response from the recommendation backend; the raw body is the detail.
pub fn upstream_error(body: impl Into<String>) -> Error {
    Error {
        code: 4,
        message: body.into(),
    }
}

pub fn unexpected_error<T: Display>(err: T) -> Error {
    Error {
        code: 5,
        message: err.to_string(),
    }
}

pub fn invalid_state_error() -> Error {
    Error {
        code: 100,
        message: "invalid state".into(),
    }
}

pub fn invalid_input_error() -> Error {
    Error {
        code: 101,
        message: "invalid input".into(),
    }
}
