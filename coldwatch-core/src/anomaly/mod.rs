//! Windowed anomaly detection
//!
//! Samples are collected in fixed windows. The mean of the first full window
//! becomes the baseline for the lifetime of the detector; every later window
//! is classified by how far its mean has dropped below that baseline.

pub mod detector;

pub use detector::{
    AnomalyDetector, Classification, DetectorError, WindowReport, DEFAULT_MIN_BASELINE,
    DEFAULT_THRESHOLD_PERCENT, DEFAULT_WINDOW,
};
