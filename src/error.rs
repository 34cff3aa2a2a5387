//! Error types for the runtime core
//!
//! Every boundary-crossing function returns `Result<_, JsError>`; a value
//! thrown by script code travels inside `JsError::Thrown` with the original
//! `JsValue` preserved verbatim so host code can inspect it losslessly.

use thiserror::Error;

use crate::value::{JsValue, PropertyKey};

/// A thrown script value together with its captured short stack trace.
#[derive(Debug, Clone)]
pub struct Exception {
    /// The thrown value, exactly as thrown
    pub value: JsValue,
    /// Formatted short stack trace, when one was captured
    pub stack: Option<String>,
}

impl Exception {
    pub fn new(value: JsValue) -> Self {
        Self { value, stack: None }
    }

    pub fn with_stack(value: JsValue, stack: String) -> Self {
        Self {
            value,
            stack: Some(stack),
        }
    }
}

impl std::fmt::Display for Exception {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value.to_js_string())
    }
}

/// Main error type for the runtime
#[derive(Debug, Error)]
pub enum JsError {
    #[error("TypeError: {message}")]
    TypeError { message: String },

    #[error("ReferenceError: {message}")]
    ReferenceError { message: String },

    #[error("RangeError: {message}")]
    RangeError { message: String },

    /// Host-side misuse of the embedding API (e.g. a nil callable)
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Produced by the compiler collaborator; fatal to the triggering eval
    #[error("SyntaxError: {message}")]
    Parse { message: String },

    /// A value thrown by script code
    #[error("{0}")]
    Thrown(Exception),
}

impl JsError {
    pub fn type_error(message: impl Into<String>) -> Self {
        JsError::TypeError {
            message: message.into(),
        }
    }

    pub fn reference_error(message: impl Into<String>) -> Self {
        JsError::ReferenceError {
            message: message.into(),
        }
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        JsError::RangeError {
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        JsError::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        JsError::Parse {
            message: message.into(),
        }
    }

    /// TypeError for redefining a non-configurable property
    pub fn cannot_redefine(key: &PropertyKey) -> Self {
        JsError::type_error(format!("Cannot redefine property: {}", key))
    }

    /// Wrap a thrown script value
    pub fn thrown(value: JsValue) -> Self {
        JsError::Thrown(Exception::new(value))
    }

    /// Extract a JsValue form of this error, for catch handlers and
    /// custom-error formatting. Thrown values come back untouched.
    pub fn to_value(&self) -> JsValue {
        match self {
            JsError::Thrown(exception) => exception.value.clone(),
            other => JsValue::from(other.to_string()),
        }
    }
}
