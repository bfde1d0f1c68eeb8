// tests/error_propagation_tests.rs
//! Error propagation and reporting tests
//!
//! This module checks that:
//! - Invalid parameters surface as configuration errors naming the parameter
//! - Shape problems surface as data errors with expected and actual values
//! - Oversized window tensors are refused before allocation
//! - Configuration loading wraps parse and validation failures

use emg_features::config::{ConfigError, ConfigLoader, FeatureConfig, FeatureSetKind};
use emg_features::error::{EmgError, EmgErrorBuilder, ProcessingStage, ResourceType};
use emg_features::processing::{activity_signal, FeatureExtractor, FeaturePipeline, Windower};
use emg_features::error_context;
use ndarray::Array2;
use std::io::Write;

#[test]
fn test_zero_stride_names_parameter() {
    let mut config = FeatureConfig::default();
    config.windowing.stride = 0;

    let err = FeatureExtractor::new(&config).unwrap_err();
    match &err {
        EmgError::Configuration { reason, context, .. } => {
            assert!(reason.contains("windowing.stride"));
            assert_eq!(context.additional_info.get("value").map(String::as_str), Some("0"));
        }
        other => panic!("Expected Configuration error, got: {:?}", other),
    }
    assert!(format!("{}", err).starts_with("[CONFIG]"));
}

#[test]
fn test_even_smoothing_width_rejected() {
    let mut config = FeatureConfig::default();
    config.time_domain.smoothing_width = 8;
    let err = FeaturePipeline::new(config).unwrap_err();
    assert!(err.is_configuration());
    assert!(format!("{}", err).contains("smoothing_width = 8"));
}

#[test]
fn test_too_few_frames_for_deltas() {
    let config = FeatureConfig {
        feature_set: FeatureSetKind::CepstralDelta,
        ..FeatureConfig::default()
    };
    let extractor = FeatureExtractor::new(&config).unwrap();

    // Default hop of 512 gives 2 frames over 1000 samples
    let err = extractor.extract(Array2::<f32>::zeros((1000, 8)).view()).unwrap_err();
    assert!(err.is_configuration());
    let message = format!("{}", err);
    assert!(message.contains("delta_width = 9"));
    assert!(message.contains("2 cepstral frames"));
}

#[test]
fn test_channel_count_mismatch() {
    let extractor = FeatureExtractor::new(&FeatureConfig::default()).unwrap();
    let err = extractor.extract(Array2::<f32>::zeros((500, 6)).view()).unwrap_err();

    match err {
        EmgError::InvalidData { data_type, expected, actual, .. } => {
            assert_eq!(data_type, "signal");
            assert_eq!(expected.as_deref(), Some("8"));
            assert_eq!(actual.as_deref(), Some("6"));
        }
        other => panic!("Expected InvalidData error, got: {:?}", other),
    }
}

#[test]
fn test_window_tensor_limit() {
    let windower = Windower::new(250, 1).with_max_elements(10_000);
    let err = windower.windows(Array2::<f32>::zeros((1000, 8)).view()).unwrap_err();

    match err {
        EmgError::ResourceExhausted { resource_type, limit, requested, .. } => {
            assert_eq!(resource_type, ResourceType::Memory);
            assert_eq!(limit, 10_000);
            assert_eq!(requested, 751 * 250 * 8);
        }
        other => panic!("Expected ResourceExhausted error, got: {:?}", other),
    }
}

#[test]
fn test_activity_channel_range() {
    let signal = Array2::<f32>::zeros((100, 4));
    let err = activity_signal(signal.view(), 0..8, 5).unwrap_err();
    assert!(matches!(err, EmgError::InvalidData { .. }));
}

#[test]
fn test_builder_and_context() {
    let err = EmgErrorBuilder::new("windowing", "windows")
        .processing(ProcessingStage::Windowing, "incompatible shape");
    assert_eq!(err.context().component, "windowing");
    assert!(format!("{}", err).contains("Windowing"));

    let context = error_context!("windowing", "windows");
    assert!(context.file.is_some());
    assert!(context.line.is_some());
}

#[test]
fn test_loader_reports_parse_errors() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[windowing]\nlength = \"long\"").unwrap();

    let err = ConfigLoader::new().add_path(file.path()).load().unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}

#[test]
fn test_loader_reports_validation_errors() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[cepstral]\nn_mfcc = 20\nn_mels = 15").unwrap();

    let err = ConfigLoader::new().add_path(file.path()).load().unwrap_err();
    match err {
        ConfigError::ValidationError(inner) => assert!(inner.is_configuration()),
        other => panic!("Expected ValidationError, got: {:?}", other),
    }
}

#[test]
fn test_required_file_missing() {
    let err = ConfigLoader::new()
        .add_path("/nonexistent/emg-features.toml")
        .require_files()
        .load()
        .unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound(_)));
}
