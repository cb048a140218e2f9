use std::fmt;

/// Errors raised by the engine at construction time.
///
/// Runtime conditions (unknown sound id, unavailable backend, redundant
/// stop) are never errors — they degrade to no-ops so the game keeps
/// running. The worst acceptable failure mode is "no sound played."
#[derive(Debug)]
pub enum EngineError {
    /// A synthesis parameter was zero or negative at construction.
    /// Buffers are precomputed, so this is a startup programming error
    /// and fails fast; there is no per-call validation afterward.
    InvalidParameter { name: &'static str, value: f64 },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidParameter { name, value } => {
                write!(f, "Invalid parameter {name}: {value}")
            }
        }
    }
}

impl std::error::Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_parameter() {
        let e = EngineError::InvalidParameter {
            name: "sample_rate",
            value: 0.0,
        };
        let msg = format!("{e}");
        assert!(msg.contains("sample_rate"), "message should name the parameter: {msg}");
    }
}
