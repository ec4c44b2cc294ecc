//! Estimate error kinds.

use crate::positions::SnapshotError;

/// Why an estimate could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum EstimateError {
    /// No vehicle with that id in the current snapshot
    #[error("target bus not found")]
    BusNotFound,

    /// The stop is not on the vehicle's remaining path
    #[error("stop not in bus path")]
    StopNotInPath,

    /// Routing failed, or there was nothing to route
    #[error("unspecified estimate error")]
    UnspecifiedEstimate,

    /// The position snapshot could not be read
    #[error("position snapshot unavailable: {0}")]
    Snapshot(#[from] SnapshotError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(EstimateError::BusNotFound.to_string(), "target bus not found");
        assert_eq!(EstimateError::StopNotInPath.to_string(), "stop not in bus path");
        assert_eq!(
            EstimateError::UnspecifiedEstimate.to_string(),
            "unspecified estimate error"
        );

        let err = EstimateError::from(SnapshotError::Corrupt {
            message: "eof".into(),
        });
        assert!(err.to_string().starts_with("position snapshot unavailable"));
    }
}
