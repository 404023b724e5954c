//! Marshalling boundary errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Malformed input payload: {0}")]
    MalformedInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_malformed_input() {
        let err = TransportError::MalformedInput("missing field `steps`".to_string());
        assert!(err.to_string().contains("Malformed input"));
        assert!(err.to_string().contains("steps"));
    }
}
