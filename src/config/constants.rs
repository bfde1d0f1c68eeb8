// src/config/constants.rs
//! Configuration constants and defaults for feature extraction

/// Acquisition-side signal constants
pub mod signal {
    /// Electrode channels on the acquisition board
    pub const DEFAULT_CHANNEL_COUNT: usize = 8;
    pub const MAX_CHANNEL_COUNT: usize = 64;
    pub const DEFAULT_SAMPLE_RATE_HZ: f32 = 250.0;
}

/// Windowing constants
pub mod windowing {
    /// One second at the default sample rate
    pub const DEFAULT_WINDOW_LENGTH: usize = 250;
    /// 50% overlap at the default window length
    pub const DEFAULT_WINDOW_STRIDE: usize = 125;
    /// Upper bound on W·L·C for a materialized window tensor (1 GiB of f32)
    pub const DEFAULT_MAX_WINDOW_ELEMENTS: usize = 1 << 28;
}

/// Time-domain feature constants
pub mod time_domain {
    /// Width of each pass of the double moving average
    pub const DEFAULT_SMOOTHING_WIDTH: usize = 9;
    /// Noise gate for zero crossings and slope sign changes, in raw ADC units
    pub const DEFAULT_TRANSITION_THRESHOLD: f32 = 20.0;
}

/// Cepstral transform constants
pub mod cepstral {
    pub const DEFAULT_N_MFCC: usize = 6;
    pub const DEFAULT_N_MELS: usize = 15;
    pub const DEFAULT_HOP_LENGTH: usize = 512;
    pub const DEFAULT_TOP_DB: f32 = 80.0;
    pub const DEFAULT_DELTA_WIDTH: usize = 9;

    /// Floor applied to mel power before taking the log
    pub const POWER_FLOOR: f32 = 1e-10;

    // Slaney mel scale
    pub const MEL_LINEAR_STEP_HZ: f64 = 200.0 / 3.0;
    pub const MEL_LOG_BREAK_HZ: f64 = 1000.0;
    pub const MEL_LOG_STEP_RATIO: f64 = 6.4;
    pub const MEL_LOG_STEP_COUNT: f64 = 27.0;
}

/// Energy envelope constants
pub mod envelope {
    pub const DEFAULT_RMS_WINDOW_SIZE: usize = 5;
    /// Channels summed by the activity detector (the first four electrodes)
    pub const DEFAULT_ACTIVITY_CHANNELS: usize = 4;
}
