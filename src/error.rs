// src/error.rs
//! Unified error handling for feature extraction
//!
//! Every fallible operation in the crate returns [`EmgResult`]. Configuration
//! problems are detected eagerly, before any array is allocated, and carry the
//! offending parameter and value so the call can be fixed.

use std::error::Error;
use std::fmt;
use std::time::SystemTime;

/// Unified error type for the feature extraction crate
#[derive(Debug, Clone)]
pub enum EmgError {
    /// Invalid parameters (window length, stride, smoothing width, cepstral
    /// band counts, ...)
    Configuration {
        component: String,
        reason: String,
        context: ErrorContext,
    },

    /// Signal processing errors
    Processing {
        stage: ProcessingStage,
        reason: String,
        context: ErrorContext,
    },

    /// Input arrays that do not match the configuration
    InvalidData {
        data_type: String,
        reason: String,
        expected: Option<String>,
        actual: Option<String>,
        context: ErrorContext,
    },

    /// Requested allocation exceeds a configured limit
    ResourceExhausted {
        resource_type: ResourceType,
        limit: usize,
        requested: usize,
        context: ErrorContext,
    },
}

/// Processing stages for error tracking
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessingStage {
    Windowing,
    FeatureExtraction,
}

/// Resource types for exhaustion tracking
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceType {
    Memory,
}

/// Error context for debugging and analysis
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub timestamp: SystemTime,
    pub thread_id: Option<String>,
    pub component: String,
    pub operation: String,
    pub file: Option<&'static str>,
    pub line: Option<u32>,
    pub additional_info: std::collections::HashMap<String, String>,
}

impl ErrorContext {
    /// Create a new error context
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            timestamp: SystemTime::now(),
            thread_id: Self::current_thread_id(),
            component: component.to_string(),
            operation: operation.to_string(),
            file: None,
            line: None,
            additional_info: std::collections::HashMap::new(),
        }
    }

    /// Create error context with file and line information
    pub fn with_location(
        component: &str,
        operation: &str,
        file: &'static str,
        line: u32,
    ) -> Self {
        let mut context = Self::new(component, operation);
        context.file = Some(file);
        context.line = Some(line);
        context
    }

    /// Add additional information to the context
    pub fn add_info<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.additional_info.insert(key.into(), value.into());
        self
    }

    fn current_thread_id() -> Option<String> {
        std::thread::current().name().map(|s| s.to_string())
    }
}

/// Macro for creating error context with file and line info
#[macro_export]
macro_rules! error_context {
    ($component:expr, $operation:expr) => {
        $crate::error::ErrorContext::with_location($component, $operation, file!(), line!())
    };
}

impl fmt::Display for EmgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmgError::Configuration { component, reason, context } => {
                write!(f, "[CONFIG] Configuration error in {}: {} ({})",
                       component, reason, context.operation)
            }
            EmgError::Processing { stage, reason, context } => {
                write!(f, "[PROCESSING] {:?} stage error: {} ({})",
                       stage, reason, context.operation)
            }
            EmgError::InvalidData { data_type, reason, expected, actual, context } => {
                match (expected, actual) {
                    (Some(exp), Some(act)) => write!(f, "[DATA] Invalid {}: {} (expected: {}, got: {}) ({})",
                                                     data_type, reason, exp, act, context.operation),
                    _ => write!(f, "[DATA] Invalid {}: {} ({})", data_type, reason, context.operation),
                }
            }
            EmgError::ResourceExhausted { resource_type, limit, requested, context } => {
                write!(f, "[RESOURCE] {:?} exhausted: requested {}, limit {} ({})",
                       resource_type, requested, limit, context.operation)
            }
        }
    }
}

impl Error for EmgError {}

impl EmgError {
    /// Whether this error was caused by the caller's parameters
    pub fn is_configuration(&self) -> bool {
        matches!(self, EmgError::Configuration { .. })
    }

    /// Context attached to the error
    pub fn context(&self) -> &ErrorContext {
        match self {
            EmgError::Configuration { context, .. }
            | EmgError::Processing { context, .. }
            | EmgError::InvalidData { context, .. }
            | EmgError::ResourceExhausted { context, .. } => context,
        }
    }
}

/// Result type alias for EMG operations
pub type EmgResult<T> = Result<T, EmgError>;

/// Error builder for convenient error construction
pub struct EmgErrorBuilder {
    component: String,
    operation: String,
}

impl EmgErrorBuilder {
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            component: component.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn configuration(self, reason: &str) -> EmgError {
        let context = ErrorContext::new(&self.component, &self.operation);
        EmgError::Configuration {
            component: self.component,
            reason: reason.to_string(),
            context,
        }
    }

    /// Configuration error naming the offending parameter and its value
    pub fn invalid_parameter(self, parameter: &str, value: impl fmt::Display, requirement: &str) -> EmgError {
        let context = ErrorContext::new(&self.component, &self.operation)
            .add_info("parameter", parameter)
            .add_info("value", value.to_string());
        EmgError::Configuration {
            component: self.component,
            reason: format!("{} = {} {}", parameter, value, requirement),
            context,
        }
    }

    pub fn processing(self, stage: ProcessingStage, reason: &str) -> EmgError {
        EmgError::Processing {
            stage,
            reason: reason.to_string(),
            context: ErrorContext::new(&self.component, &self.operation),
        }
    }

    pub fn invalid_data(self, data_type: &str, reason: &str) -> EmgError {
        EmgError::InvalidData {
            data_type: data_type.to_string(),
            reason: reason.to_string(),
            expected: None,
            actual: None,
            context: ErrorContext::new(&self.component, &self.operation),
        }
    }

    pub fn shape_mismatch(
        self,
        data_type: &str,
        reason: &str,
        expected: impl fmt::Display,
        actual: impl fmt::Display,
    ) -> EmgError {
        EmgError::InvalidData {
            data_type: data_type.to_string(),
            reason: reason.to_string(),
            expected: Some(expected.to_string()),
            actual: Some(actual.to_string()),
            context: ErrorContext::new(&self.component, &self.operation),
        }
    }

    pub fn resource_exhausted(self, resource_type: ResourceType, limit: usize, requested: usize) -> EmgError {
        EmgError::ResourceExhausted {
            resource_type,
            limit,
            requested,
            context: ErrorContext::new(&self.component, &self.operation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context_creation() {
        let context = ErrorContext::new("test_component", "test_operation");
        assert_eq!(context.component, "test_component");
        assert_eq!(context.operation, "test_operation");
        assert!(context.timestamp <= SystemTime::now());
    }

    #[test]
    fn test_error_context_macro_records_location() {
        let context = error_context!("windowing", "window");
        assert_eq!(context.file, Some(file!()));
        assert!(context.line.is_some());
    }

    #[test]
    fn test_error_builder() {
        let builder = EmgErrorBuilder::new("test_component", "test_op");
        let err = builder.configuration("test configuration error");

        match err {
            EmgError::Configuration { component, reason, .. } => {
                assert_eq!(component, "test_component");
                assert_eq!(reason, "test configuration error");
            }
            _ => panic!("Expected configuration error"),
        }
    }

    #[test]
    fn test_invalid_parameter_names_value() {
        let err = EmgErrorBuilder::new("windowing", "window")
            .invalid_parameter("stride", 0, "must be at least 1");

        assert!(err.is_configuration());
        let display = format!("{}", err);
        assert!(display.contains("stride = 0"));
        assert_eq!(err.context().additional_info.get("parameter").map(String::as_str), Some("stride"));
    }

    #[test]
    fn test_error_display() {
        let err = EmgErrorBuilder::new("pipeline", "run")
            .shape_mismatch("signal", "channel count mismatch", 8, 4);

        let display = format!("{}", err);
        assert!(display.contains("expected: 8"));
        assert!(display.contains("got: 4"));

        let err = EmgErrorBuilder::new("windowing", "window")
            .resource_exhausted(ResourceType::Memory, 1024, 2048);
        let display = format!("{}", err);
        assert!(display.contains("2048"));
        assert!(display.contains("1024"));
    }

    #[test]
    fn test_processing_error_names_stage() {
        let err = EmgErrorBuilder::new("savgol", "fit_weights")
            .processing(ProcessingStage::FeatureExtraction, "singular least-squares system");
        assert!(!err.is_configuration());
        assert!(format!("{}", err).starts_with("[PROCESSING] FeatureExtraction stage error"));
    }

    #[test]
    fn test_error_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EmgError>();
    }
}
