//! Error taxonomy for scan and prediction runs.
//!
//! Symbol-level problems (insufficient history) skip the symbol and the
//! batch continues; batch-level problems (empty fetch, retry exhaustion)
//! abort the run with nothing persisted; model problems are either an
//! explicit refusal (too few samples) or a hard failure (feature shape
//! mismatch, since a silent mispredict is worse than a crash).

/// Scan/prediction failure modes.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanError {
    InsufficientHistory {
        symbol: String,
        rows: usize,
        required: usize,
    },
    EmptyFetch,
    RetriesExhausted {
        attempts: u32,
    },
    ShapeMismatch {
        expected: usize,
        found: usize,
    },
    FeatureMismatch {
        index: usize,
        expected: String,
        found: String,
    },
    InsufficientSamples {
        available: usize,
        required: usize,
    },
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanError::InsufficientHistory {
                symbol,
                rows,
                required,
            } => {
                write!(
                    f,
                    "Insufficient history for {}: {} bars, need {}",
                    symbol, rows, required
                )
            }
            ScanError::EmptyFetch => {
                write!(f, "Market data fetch returned no bars for any symbol")
            }
            ScanError::RetriesExhausted { attempts } => {
                write!(f, "Market data fetch failed after {} attempts", attempts)
            }
            ScanError::ShapeMismatch { expected, found } => {
                write!(
                    f,
                    "Feature shape mismatch: model expects {} features, got {}",
                    expected, found
                )
            }
            ScanError::FeatureMismatch {
                index,
                expected,
                found,
            } => {
                write!(
                    f,
                    "Feature mismatch at column {}: model expects '{}', got '{}'",
                    index, expected, found
                )
            }
            ScanError::InsufficientSamples {
                available,
                required,
            } => {
                write!(
                    f,
                    "Insufficient training samples: have {}, need {}",
                    available, required
                )
            }
        }
    }
}

impl std::error::Error for ScanError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = ScanError::InsufficientSamples {
            available: 12,
            required: 50,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient training samples: have 12, need 50"
        );

        let err = ScanError::RetriesExhausted { attempts: 3 };
        assert!(err.to_string().contains("after 3 attempts"));
    }
}
