//! One-shot baseline anomaly detector

use crate::config::DetectorConfig;
use crate::temperature::Temperature;

/// Samples per window
pub const DEFAULT_WINDOW: usize = 10;

/// Deviation above which a window is an anomaly (percent)
pub const DEFAULT_THRESHOLD_PERCENT: u8 = 5;

/// Smallest baseline magnitude accepted (1.0 °C)
pub const DEFAULT_MIN_BASELINE: Temperature = Temperature::from_celsius(1);

/// Basis points per percent
const BP_PER_PERCENT: i64 = 100;

/// Result of classifying one window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Classification {
    /// Within threshold of the baseline
    Nominal,
    /// Dropped further below the baseline than the threshold allows
    Anomaly,
}

impl Classification {
    /// Status payload published for this classification
    pub fn payload(&self) -> &'static str {
        match self {
            Classification::Nominal => "OK",
            Classification::Anomaly => "CHECK",
        }
    }
}

/// Summary of one completed window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WindowReport {
    /// Window mean, truncated to the nearest sixteenth toward zero
    pub mean: Temperature,
    /// Drop below the baseline in basis points (1/100 %); 0 for the baseline window
    pub deviation_bp: i32,
    pub classification: Classification,
}

/// Errors raised when a window completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DetectorError {
    /// The first window's mean is too close to zero to divide by
    DegenerateBaseline { mean: Temperature },
}

/// Fixed-window detector with a baseline captured exactly once
///
/// Window means are kept as exact sums of sixteenths; since every window
/// holds `N` samples, comparing sums is the same as comparing means and
/// nothing is lost to truncation.
#[derive(Debug, Clone)]
pub struct AnomalyDetector<const N: usize = DEFAULT_WINDOW> {
    samples: [Temperature; N],
    index: usize,
    baseline_sum: Option<i64>,
    threshold_bp: i64,
    min_baseline_sum: i64,
}

impl<const N: usize> AnomalyDetector<N> {
    const NON_EMPTY: () = assert!(N > 0, "window must hold at least one sample");

    pub fn new(config: &DetectorConfig) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NON_EMPTY;

        Self {
            samples: [Temperature::ZERO; N],
            index: 0,
            baseline_sum: None,
            threshold_bp: config.threshold_percent as i64 * BP_PER_PERCENT,
            min_baseline_sum: config.min_baseline.abs().sixteenths() as i64 * N as i64,
        }
    }

    /// Store one sample; classify the window if it is now full
    ///
    /// Returns `Ok(None)` while the window is filling. A degenerate first
    /// window is discarded and the next full window is tried as baseline.
    pub fn record(&mut self, sample: Temperature) -> Result<Option<WindowReport>, DetectorError> {
        self.samples[self.index] = sample;
        self.index += 1;
        if self.index < N {
            return Ok(None);
        }
        self.index = 0;

        let sum: i64 = self.samples.iter().map(|t| t.sixteenths() as i64).sum();
        let mean = Temperature::from_sixteenths((sum / N as i64) as i32);

        let Some(baseline_sum) = self.baseline_sum else {
            if sum.abs() < self.min_baseline_sum {
                warn!("baseline rejected, mean {} too close to zero", mean.celsius_x10());
                return Err(DetectorError::DegenerateBaseline { mean });
            }
            info!("baseline established at {} (x0.1 C)", mean.celsius_x10());
            self.baseline_sum = Some(sum);
            return Ok(Some(WindowReport {
                mean,
                deviation_bp: 0,
                classification: Classification::Nominal,
            }));
        };

        // A drop in temperature is a positive deviation
        let deviation = (baseline_sum - sum) * 10_000 / baseline_sum.abs();
        let classification = if deviation > self.threshold_bp {
            Classification::Anomaly
        } else {
            Classification::Nominal
        };
        debug!(
            "window mean {} deviation {} bp: {}",
            mean.celsius_x10(),
            deviation,
            classification
        );

        Ok(Some(WindowReport {
            mean,
            deviation_bp: deviation.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
            classification,
        }))
    }

    /// Baseline mean, once established
    pub fn baseline(&self) -> Option<Temperature> {
        self.baseline_sum
            .map(|sum| Temperature::from_sixteenths((sum / N as i64) as i32))
    }

    pub fn is_established(&self) -> bool {
        self.baseline_sum.is_some()
    }

    /// Samples stored in the current, incomplete window
    pub fn pending(&self) -> usize {
        self.index
    }

    pub const fn window_size(&self) -> usize {
        N
    }
}
