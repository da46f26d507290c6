//! Error types for image metric evaluation.
//!
//! Every failure is either a *value* error (bad shape, bad parameter, empty
//! input) or a *type* error (mismatched element precision). [`ErrorKind`]
//! exposes that split so callers can match on the category without naming
//! each variant.

use thiserror::Error;

use crate::image::batch::Precision;

/// Result type alias for metric operations.
pub type MetricResult<T> = Result<T, MetricError>;

/// Broad category of a [`MetricError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The inputs have the right type but an unusable value or shape.
    Value,
    /// The inputs disagree on element precision.
    Type,
}

#[derive(Debug, Error)]
pub enum MetricError {
    /// Input rank is not what the operation accepts.
    #[error("expected `{argument}` to have {expected} dimensions, got {got}")]
    InvalidRank {
        argument: &'static str,
        expected: String,
        got: usize,
    },

    /// `preds` and `target` disagree on shape.
    #[error("expected `preds` and `target` to have the same shape, got {preds:?} and {target:?}")]
    ShapeMismatch {
        preds: Vec<usize>,
        target: Vec<usize>,
    },

    /// `preds` and `target` disagree on element precision.
    #[error("expected `preds` and `target` to have the same precision, got {preds} and {target}")]
    PrecisionMismatch { preds: Precision, target: Precision },

    /// A numeric parameter is outside its valid range.
    #[error("invalid `{parameter}` = {value}: {constraint}")]
    InvalidParameter {
        parameter: &'static str,
        value: String,
        constraint: &'static str,
    },

    /// The image plane cannot hold a single full window.
    #[error(
        "image plane of {height}x{width} is smaller than the \
         {kernel_height}x{kernel_width} window"
    )]
    WindowTooLarge {
        height: usize,
        width: usize,
        kernel_height: usize,
        kernel_width: usize,
    },

    /// A required axis or collection is empty.
    #[error("empty input: {what}")]
    EmptyInput { what: &'static str },

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}

impl MetricError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MetricError::PrecisionMismatch { .. } => ErrorKind::Type,
            _ => ErrorKind::Value,
        }
    }

    pub fn is_value_error(&self) -> bool {
        self.kind() == ErrorKind::Value
    }

    pub fn is_type_error(&self) -> bool {
        self.kind() == ErrorKind::Type
    }

    pub(crate) fn invalid_parameter(
        parameter: &'static str,
        value: impl ToString,
        constraint: &'static str,
    ) -> Self {
        MetricError::InvalidParameter {
            parameter,
            value: value.to_string(),
            constraint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precision_mismatch_is_a_type_error() {
        let err = MetricError::PrecisionMismatch {
            preds: Precision::F32,
            target: Precision::F64,
        };
        assert_eq!(err.kind(), ErrorKind::Type);
        assert!(err.to_string().contains("f32"));
        assert!(err.to_string().contains("f64"));
    }

    #[test]
    fn parameter_errors_are_value_errors() {
        let err = MetricError::invalid_parameter("p", 0, "must be a positive integer");
        assert!(err.is_value_error());
        assert_eq!(err.to_string(), "invalid `p` = 0: must be a positive integer");
    }
}
