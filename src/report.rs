//! Types for run results and the invocation response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a single pipeline stage or validation check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    /// The step completed as expected
    #[serde(rename = "SUCCESS")]
    Success,

    /// The step failed; details carry the underlying message
    #[serde(rename = "FAILURE")]
    Failure,
}

/// Record of one attempted pipeline stage or validation check.
///
/// Steps are appended in chronological (pipeline) order and never mutated
/// afterwards; the order is preserved in the final report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    /// Step identifier (pipeline stage or check name)
    pub name: String,

    /// Step outcome
    pub status: StepStatus,

    /// Human-readable detail (error message, artifact URL, warnings)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// Wall-clock duration of the step in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

impl StepResult {
    /// Create a successful step record
    pub fn success(name: impl Into<String>, elapsed_ms: Option<u64>) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Success,
            details: None,
            elapsed_ms,
        }
    }

    /// Create a successful step record with a detail string
    pub fn success_with_details(
        name: impl Into<String>,
        details: impl Into<String>,
        elapsed_ms: Option<u64>,
    ) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Success,
            details: Some(details.into()),
            elapsed_ms,
        }
    }

    /// Create a failed step record carrying the underlying error message
    pub fn failure(
        name: impl Into<String>,
        details: impl Into<String>,
        elapsed_ms: Option<u64>,
    ) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Failure,
            details: Some(details.into()),
            elapsed_ms,
        }
    }

    /// Whether this step succeeded
    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Success
    }
}

/// Aggregated output of one complete invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Overall outcome message ("Success" or the fatal error description)
    pub message: String,

    /// Completion timestamp (ISO-8601)
    pub completed_at: DateTime<Utc>,

    /// Durable locator of the uploaded capture, if the upload happened
    pub artifact_url: Option<String>,

    /// Total wall-clock duration of the run in milliseconds
    pub total_elapsed_ms: u64,

    /// Every attempted pipeline stage and validation check, in order
    pub steps: Vec<StepResult>,

    /// Raw inbound invocation payload, echoed for downstream debugging
    pub event: serde_json::Value,
}

/// HTTP-style response returned to the invoker
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    /// 200 on pipeline success, 500 on fatal failure
    pub status_code: u16,

    /// Response headers
    pub headers: ResponseHeaders,

    /// JSON-encoded [`RunReport`]
    pub body: String,
}

/// Fixed header set for the invocation response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseHeaders {
    #[serde(rename = "Content-Type")]
    pub content_type: String,
}

impl Default for ResponseHeaders {
    fn default() -> Self {
        Self {
            content_type: "application/json".to_string(),
        }
    }
}

impl InvocationResponse {
    /// Build the response from a finished report.
    ///
    /// The report is always serializable; should serialization fail anyway,
    /// the body degrades to a minimal JSON error so the invoker still
    /// receives well-formed JSON.
    pub fn from_report(status_code: u16, report: &RunReport) -> Self {
        let body = serde_json::to_string(report).unwrap_or_else(|err| {
            format!("{{\"message\":\"report serialization failed: {}\"}}", err)
        });
        Self {
            status_code,
            headers: ResponseHeaders::default(),
            body,
        }
    }

    /// Parse the body back into a [`RunReport`]
    pub fn report(&self) -> serde_json::Result<RunReport> {
        serde_json::from_str(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_status_serialization() {
        let step = StepResult::success("Navigate to page", Some(200));
        let json = serde_json::to_string(&step).unwrap();
        assert!(json.contains("\"SUCCESS\""));
        assert!(json.contains("\"elapsedMs\":200"));

        let step = StepResult::failure("Origin field", "element not found", None);
        let json = serde_json::to_string(&step).unwrap();
        assert!(json.contains("\"FAILURE\""));
        assert!(json.contains("element not found"));
        assert!(!json.contains("elapsedMs"));
    }

    #[test]
    fn test_response_roundtrip() {
        let report = RunReport {
            message: "Success".to_string(),
            completed_at: Utc::now(),
            artifact_url: Some("https://bucket.s3.us-east-1.amazonaws.com/p/a.png".to_string()),
            total_elapsed_ms: 1234,
            steps: vec![StepResult::success("Navigate to page", Some(200))],
            event: serde_json::json!({"source": "test"}),
        };

        let response = InvocationResponse::from_report(200, &report);
        assert_eq!(response.status_code, 200);
        assert_eq!(response.headers.content_type, "application/json");

        let parsed = response.report().unwrap();
        assert_eq!(parsed.message, "Success");
        assert_eq!(parsed.steps.len(), 1);
        assert_eq!(parsed.event["source"], "test");
    }

    #[test]
    fn test_response_serializes_status_code_field() {
        let report = RunReport {
            message: "Success".to_string(),
            completed_at: Utc::now(),
            artifact_url: None,
            total_elapsed_ms: 0,
            steps: vec![],
            event: serde_json::Value::Null,
        };
        let json = serde_json::to_string(&InvocationResponse::from_report(200, &report)).unwrap();
        assert!(json.contains("\"statusCode\":200"));
        assert!(json.contains("\"Content-Type\":\"application/json\""));
    }
}
