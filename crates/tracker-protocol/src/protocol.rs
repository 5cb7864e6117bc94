//! Request, response and result types.

use serde::{Deserialize, Serialize};

/// Methods served by the tracker language server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    #[serde(rename = "codecarbon.startTracker")]
    StartTracker,
    #[serde(rename = "codecarbon.stopTracker")]
    StopTracker,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::StartTracker => "codecarbon.startTracker",
            Method::StopTracker => "codecarbon.stopTracker",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Request ID for correlation.
    pub id: String,
    /// Method to invoke.
    pub method: Method,
    /// Method parameters; both tracker methods take `{}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl Request {
    /// Create a new request with an empty payload and auto-generated ID.
    pub fn new(method: Method) -> Self {
        Self::with_params(method, serde_json::json!({}))
    }

    /// Create a new request with parameters.
    pub fn with_params(method: Method, params: serde_json::Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            method,
            params: Some(params),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Response message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Request ID for correlation.
    pub id: String,
    /// Result data (if successful).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error information (if failed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

/// Error information in a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Response {
    /// Create a successful response.
    pub fn success(id: &str, result: serde_json::Value) -> Self {
        Self {
            id: id.to_string(),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: &str, code: i32, message: &str) -> Self {
        Self {
            id: id.to_string(),
            result: None,
            error: Some(ErrorInfo {
                code,
                message: message.to_string(),
                data: None,
            }),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of `codecarbon.stopTracker`.
///
/// Either field may be missing or null when the tracker measured nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StopTrackerResult {
    #[serde(default)]
    pub emissions: Option<f64>,
    #[serde(default)]
    pub emissions_file: Option<String>,
}

impl StopTrackerResult {
    /// Decode a stop result; a null result means nothing was measured.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value)
    }

    /// The report file path, unless it is absent or blank.
    pub fn emissions_file(&self) -> Option<&str> {
        self.emissions_file
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

// Standard error codes
pub mod error_codes {
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Stop requested while no tracker is running.
    pub const TRACKER_NOT_RUNNING: i32 = -32010;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = Request::new(Method::StopTracker);
        let json = request.to_json().unwrap();

        assert!(json.contains("\"method\":\"codecarbon.stopTracker\""));
        assert!(json.contains("\"params\":{}"));
        assert!(json.contains("\"id\":"));
    }

    #[test]
    fn test_method_names() {
        assert_eq!(Method::StartTracker.as_str(), "codecarbon.startTracker");
        assert_eq!(Method::StopTracker.to_string(), "codecarbon.stopTracker");

        let request = Request::from_json(r#"{"id":"1","method":"codecarbon.startTracker"}"#).unwrap();
        assert_eq!(request.method, Method::StartTracker);
        assert!(request.params.is_none());

        assert!(Request::from_json(r#"{"id":"1","method":"codecarbon.pause"}"#).is_err());
    }

    #[test]
    fn test_response_error() {
        let response = Response::error("7", error_codes::METHOD_NOT_FOUND, "Unknown method");
        let json = response.to_json().unwrap();

        assert!(json.contains("\"code\":-32601"));
        assert!(!json.contains("\"result\""));
        assert!(!response.is_success());

        let parsed = Response::from_json(&json).unwrap();
        assert_eq!(parsed.error.unwrap().message, "Unknown method");
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = Request::new(Method::StartTracker);
        let b = Request::new(Method::StartTracker);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_stop_result_with_emissions() {
        let result = StopTrackerResult::from_value(serde_json::json!({
            "emissions": 0.5,
            "emissions_file": "f.csv"
        }))
        .unwrap();

        assert_eq!(result.emissions, Some(0.5));
        assert_eq!(result.emissions_file(), Some("f.csv"));
    }

    #[test]
    fn test_stop_result_nothing_measured() {
        let zero = StopTrackerResult::from_value(serde_json::json!({
            "emissions": 0,
            "emissions_file": ""
        }))
        .unwrap();
        assert_eq!(zero.emissions, Some(0.0));
        assert_eq!(zero.emissions_file(), None);

        let null = StopTrackerResult::from_value(serde_json::Value::Null).unwrap();
        assert_eq!(null, StopTrackerResult::default());

        let partial =
            StopTrackerResult::from_value(serde_json::json!({ "emissions": null })).unwrap();
        assert_eq!(partial.emissions, None);
    }

    #[test]
    fn test_stop_result_rejects_wrong_types() {
        let result = StopTrackerResult::from_value(serde_json::json!({ "emissions": "lots" }));
        assert!(result.is_err());
    }
}
