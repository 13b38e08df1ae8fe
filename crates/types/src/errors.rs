use thiserror::Error;

// ============================================================================
// Main Error Enum
// ============================================================================

/// Error enum shared by the valuation crates
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValuationError {
    // ========================================================================
    // Curve Errors
    // ========================================================================

    /// One of the batched curve reads failed
    #[error("Failed to read curve field '{field}': {reason}")]
    CurveRead { field: String, reason: String },

    /// Curve has no collateral or no supply yet, so it cannot be priced
    #[error("Curve not seeded: reserve={reserve}, supply={supply}")]
    CurveNotSeeded { reserve: f64, supply: f64 },

    /// Curve parameters are outside their valid domain
    #[error("Invalid curve state: {reason}")]
    InvalidCurveState { reason: String },

    // ========================================================================
    // Validation Errors
    // ========================================================================

    /// Invalid parameter
    #[error("Invalid parameter '{parameter}': got '{value}', expected '{expected}'")]
    InvalidParameter { parameter: String, value: String, expected: String },

    /// Project has no bonding curve deployment recorded
    #[error("Project {project_id} has no ABC deployment")]
    MissingAbc { project_id: String },

    // ========================================================================
    // Network and Decoding Errors
    // ========================================================================

    /// JSON-RPC communication error
    #[error("RPC error (code {code:?}): {message}")]
    Rpc { message: String, code: Option<i64> },

    /// HTTP collaborator failed
    #[error("{service} request failed: {message}")]
    Http { service: String, message: String },

    /// Response could not be decoded
    #[error("Decode error in '{context}': {reason}")]
    Decode { context: String, reason: String },

    /// Aggregator returned no pool for the token
    #[error("No market data for token {token}")]
    NoMarketData { token: String },

    // ========================================================================
    // Configuration Errors
    // ========================================================================

    /// Invalid configuration
    #[error("Invalid configuration for '{component}': {reason}")]
    Configuration { component: String, reason: String },
}

impl ValuationError {
    /// Create a curve read error for a named field
    pub fn curve_read(field: &str, reason: &str) -> Self {
        Self::CurveRead {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a curve-not-seeded error
    pub fn curve_not_seeded(reserve: f64, supply: f64) -> Self {
        Self::CurveNotSeeded { reserve, supply }
    }

    /// Create an invalid curve state error
    pub fn invalid_curve_state(reason: &str) -> Self {
        Self::InvalidCurveState {
            reason: reason.to_string(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: &str, value: &str, expected: &str) -> Self {
        Self::InvalidParameter {
            parameter: parameter.to_string(),
            value: value.to_string(),
            expected: expected.to_string(),
        }
    }

    /// Create an RPC error
    pub fn rpc_error(message: &str, code: Option<i64>) -> Self {
        Self::Rpc {
            message: message.to_string(),
            code,
        }
    }

    /// Create an HTTP collaborator error
    pub fn http(service: &str, message: &str) -> Self {
        Self::Http {
            service: service.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a decode error
    pub fn decode(context: &str, reason: &str) -> Self {
        Self::Decode {
            context: context.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a missing-ABC error
    pub fn missing_abc(project_id: &str) -> Self {
        Self::MissingAbc {
            project_id: project_id.to_string(),
        }
    }

    /// Create a configuration error
    pub fn configuration(component: &str, reason: &str) -> Self {
        Self::Configuration {
            component: component.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<serde_json::Error> for ValuationError {
    fn from(err: serde_json::Error) -> Self {
        ValuationError::decode("json", &err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_read_names_field() {
        let err = ValuationError::curve_read("reserveRatio", "execution reverted");
        assert_eq!(
            err.to_string(),
            "Failed to read curve field 'reserveRatio': execution reverted"
        );
    }

    #[test]
    fn test_json_errors_become_decode_errors() {
        let err: ValuationError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(matches!(err, ValuationError::Decode { ref context, .. } if context == "json"));
    }
}
