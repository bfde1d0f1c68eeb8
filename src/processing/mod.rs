// src/processing/mod.rs
//! Signal processing for EMG recordings

pub mod envelope;
pub mod features;
pub mod pipeline;
pub mod preprocess;
pub mod windowing;

pub use envelope::rms_envelope;
pub use features::*;
pub use pipeline::*;
pub use preprocess::*;
pub use windowing::*;
