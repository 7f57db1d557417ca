//! GraphQL wire types and the transport seam.
//!
//! Everything above this module works with `serde_json::Value` payloads and
//! never sees HTTP. Tests substitute the transport with a mock or a scripted
//! fake.

use async_trait::async_trait;
use footfall_common::{ApiKey, FootfallError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of a GraphQL `POST` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphQlRequest {
    /// Query document text
    pub query: &'static str,
    /// Name of the operation to run within the document
    #[serde(rename = "operationName")]
    pub operation_name: &'static str,
    /// Bound variables
    pub variables: Map<String, Value>,
}

impl GraphQlRequest {
    /// Reads a bound variable as a string, when it is one.
    pub fn variable_str(&self, name: &str) -> Option<&str> {
        self.variables.get(name).and_then(Value::as_str)
    }
}

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GraphQlError {
    /// Human readable message
    pub message: String,
    /// Provider specific details such as an error `code`
    #[serde(default)]
    pub extensions: Option<Value>,
}

impl GraphQlError {
    fn code(&self) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .and_then(Value::as_str)
    }

    /// Whether the provider is rejecting the credential.
    pub fn is_auth(&self) -> bool {
        if matches!(self.code(), Some("UNAUTHENTICATED" | "FORBIDDEN")) {
            return true;
        }
        let message = self.message.to_ascii_lowercase();
        message.contains("api key") || message.contains("apikey") || message.contains("unauthorized")
    }
}

/// Body of a GraphQL response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphQlResponse {
    /// Result payload
    #[serde(default)]
    pub data: Option<Value>,
    /// Errors reported alongside or instead of data
    #[serde(default)]
    pub errors: Option<Vec<GraphQlError>>,
}

impl GraphQlResponse {
    /// Extracts the `data` payload, classifying reported errors.
    ///
    /// Authentication errors win over any partial data. Other errors are
    /// fatal only when no data came back.
    pub fn into_data(self) -> Result<Value> {
        let errors = self.errors.unwrap_or_default();

        if let Some(auth) = errors.iter().find(|e| e.is_auth()) {
            return Err(FootfallError::auth(auth.message.clone()));
        }

        match self.data {
            Some(Value::Null) | None if !errors.is_empty() => {
                let message = errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(FootfallError::query(message))
            }
            Some(Value::Null) | None => Err(FootfallError::malformed_at(
                "Response contained neither data nor errors",
                "data",
            )),
            Some(data) => {
                for error in &errors {
                    tracing::warn!("Provider reported a partial error: {}", error.message);
                }
                Ok(data)
            }
        }
    }
}

/// Executes one GraphQL request and returns its `data` payload.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueryTransport: Send + Sync {
    /// Sends `request` authenticated with `credential`.
    async fn execute(&self, credential: &ApiKey, request: &GraphQlRequest) -> Result<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let mut variables = Map::new();
        variables.insert("date".to_string(), json!("2022-01-02"));
        let request = GraphQlRequest {
            query: "query Q { x }",
            operation_name: "Q",
            variables,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["operationName"], "Q");
        assert_eq!(value["variables"]["date"], "2022-01-02");
        assert_eq!(request.variable_str("date"), Some("2022-01-02"));
        assert_eq!(request.variable_str("missing"), None);
    }

    #[test]
    fn test_data_is_returned() {
        let response: GraphQlResponse =
            serde_json::from_value(json!({"data": {"search": null}})).unwrap();
        assert_eq!(response.into_data().unwrap(), json!({"search": null}));
    }

    #[test]
    fn test_auth_errors_are_classified() {
        let response: GraphQlResponse = serde_json::from_value(json!({
            "data": null,
            "errors": [{"message": "Invalid API key provided"}]
        }))
        .unwrap();
        assert!(response.into_data().unwrap_err().is_auth());

        let response: GraphQlResponse = serde_json::from_value(json!({
            "errors": [{"message": "denied", "extensions": {"code": "UNAUTHENTICATED"}}]
        }))
        .unwrap();
        assert!(response.into_data().unwrap_err().is_auth());
    }

    #[test]
    fn test_query_errors_without_data() {
        let response: GraphQlResponse = serde_json::from_value(json!({
            "errors": [{"message": "Variable $date got invalid value"}, {"message": "second"}]
        }))
        .unwrap();
        let err = response.into_data().unwrap_err();
        assert!(matches!(err, FootfallError::Query { ref message } if message.contains("$date") && message.contains("second")));
    }

    #[test]
    fn test_empty_response_is_malformed() {
        let err = GraphQlResponse::default().into_data().unwrap_err();
        assert!(matches!(err, FootfallError::MalformedResponse { .. }));
    }

    #[test]
    fn test_partial_errors_keep_data() {
        let response: GraphQlResponse = serde_json::from_value(json!({
            "data": {"search": {}},
            "errors": [{"message": "field deprecated"}]
        }))
        .unwrap();
        assert!(response.into_data().is_ok());
    }
}
