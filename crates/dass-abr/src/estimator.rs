#[cfg(test)]
use unimock::unimock;

use super::AbrOptions;

/// Trait for throughput estimation strategies.
///
/// Allows testing `AbrController` with mock estimators.
#[cfg_attr(test, unimock(api = EstimatorMock))]
pub trait Estimator {
    /// Ingest one completed download: duration in milliseconds, payload in bytes.
    fn sample(&mut self, duration_ms: f64, bytes: u64);

    /// Ingest one time-to-first-byte observation in milliseconds.
    fn sample_ttfb(&mut self, ttfb_ms: f64);

    /// Get estimated throughput in bits per second.
    fn estimate_bps(&self) -> f64;

    /// Get smoothed time to first byte in milliseconds.
    fn estimate_ttfb_ms(&self) -> f64;

    /// Whether enough samples exist to trust the estimate over the default.
    fn can_estimate(&self) -> bool;

    /// Number of throughput samples ingested since creation or reset.
    fn sample_count(&self) -> u64;

    /// Discard all samples and return to the configured defaults.
    fn reset(&mut self);
}

/// Dual-EWMA bandwidth estimator.
///
/// The reported estimate is the lower of a fast and a slow average, so a
/// throughput drop shows up quickly while a spike is absorbed slowly.
#[derive(Clone, Debug)]
pub struct EwmaBandwidthEstimator {
    fast: Ewma,
    slow: Ewma,
    ttfb: Ewma,
    fast_half_life_secs: f64,
    slow_half_life_secs: f64,
    default_estimate_bps: f64,
    default_ttfb_ms: f64,
    samples: u64,
}

impl EwmaBandwidthEstimator {
    const MIN_DELAY_MS: f64 = 50.0;
    const TTFB_HALF_LIFE_SECS: f64 = 3.0;
    const MIN_TTFB_MS: f64 = 5.0;
    const MIN_TTFB_WEIGHT: f64 = 0.001;

    #[must_use]
    pub fn new(cfg: &AbrOptions) -> Self {
        Self::with_params(
            cfg.fast_half_life_secs,
            cfg.slow_half_life_secs,
            cfg.default_estimate_bps,
            cfg.default_ttfb_ms,
        )
    }

    #[must_use]
    pub fn with_params(
        fast_half_life_secs: f64,
        slow_half_life_secs: f64,
        default_estimate_bps: f64,
        default_ttfb_ms: f64,
    ) -> Self {
        Self {
            fast: Ewma::new(fast_half_life_secs),
            slow: Ewma::new(slow_half_life_secs),
            ttfb: Ewma::new(Self::TTFB_HALF_LIFE_SECS),
            fast_half_life_secs,
            slow_half_life_secs,
            default_estimate_bps,
            default_ttfb_ms,
            samples: 0,
        }
    }

    pub fn sample(&mut self, duration_ms: f64, bytes: u64) {
        // NaN also lands on the floor
        let duration_ms = if duration_ms >= Self::MIN_DELAY_MS {
            duration_ms
        } else {
            Self::MIN_DELAY_MS
        };
        let weight_secs = duration_ms / 1000.0;
        #[expect(clippy::cast_precision_loss)] // payload sizes are far below 2^53
        let bps = (bytes as f64) * 8.0 / weight_secs;

        self.fast.sample(weight_secs, bps);
        self.slow.sample(weight_secs, bps);
        self.samples = self.samples.saturating_add(1);

        tracing::trace!(
            duration_ms,
            bytes,
            bps,
            fast_bps = self.fast.estimate(),
            slow_bps = self.slow.estimate(),
            "bandwidth sample"
        );
    }

    pub fn sample_ttfb(&mut self, ttfb_ms: f64) {
        if !ttfb_ms.is_finite() {
            return;
        }
        let secs = ttfb_ms / 1000.0;
        let weight = std::f64::consts::SQRT_2 * (-secs.powi(2) / 2.0).exp();
        self.ttfb.sample(weight, ttfb_ms.max(Self::MIN_TTFB_MS));
    }

    #[must_use]
    pub fn estimate_bps(&self) -> f64 {
        if self.can_estimate() {
            self.fast.estimate().min(self.slow.estimate())
        } else {
            self.default_estimate_bps
        }
    }

    #[must_use]
    pub fn estimate_ttfb_ms(&self) -> f64 {
        if self.ttfb.total_weight >= Self::MIN_TTFB_WEIGHT {
            self.ttfb.estimate()
        } else {
            self.default_ttfb_ms
        }
    }

    #[must_use]
    pub fn can_estimate(&self) -> bool {
        self.samples > 0
    }

    #[must_use]
    pub fn sample_count(&self) -> u64 {
        self.samples
    }

    /// Fast average in bits per second, `0.0` before the first sample.
    #[must_use]
    pub fn fast_estimate_bps(&self) -> f64 {
        self.fast.estimate()
    }

    /// Slow average in bits per second, `0.0` before the first sample.
    #[must_use]
    pub fn slow_estimate_bps(&self) -> f64 {
        self.slow.estimate()
    }

    /// EWMA variance of the fast average in (bits per second)².
    #[must_use]
    pub fn variance_bps2(&self) -> f64 {
        self.fast.variance
    }

    pub fn reset(&mut self) {
        *self = Self::with_params(
            self.fast_half_life_secs,
            self.slow_half_life_secs,
            self.default_estimate_bps,
            self.default_ttfb_ms,
        );
    }
}

impl Estimator for EwmaBandwidthEstimator {
    fn sample(&mut self, duration_ms: f64, bytes: u64) {
        self.sample(duration_ms, bytes);
    }

    fn sample_ttfb(&mut self, ttfb_ms: f64) {
        self.sample_ttfb(ttfb_ms);
    }

    fn estimate_bps(&self) -> f64 {
        self.estimate_bps()
    }

    fn estimate_ttfb_ms(&self) -> f64 {
        self.estimate_ttfb_ms()
    }

    fn can_estimate(&self) -> bool {
        self.can_estimate()
    }

    fn sample_count(&self) -> u64 {
        self.sample_count()
    }

    fn reset(&mut self) {
        self.reset();
    }
}

#[derive(Clone, Debug)]
struct Ewma {
    alpha: f64,
    last_estimate: f64,
    variance: f64,
    total_weight: f64,
}

impl Ewma {
    fn new(half_life_secs: f64) -> Self {
        Self {
            alpha: f64::exp(0.5_f64.ln() / half_life_secs.max(0.001)),
            last_estimate: 0.0,
            variance: 0.0,
            total_weight: 0.0,
        }
    }

    fn sample(&mut self, weight: f64, val: f64) {
        let weight = weight.max(0.0);
        let adj_alpha = self.alpha.powf(weight);
        let delta = if self.total_weight > 0.0 {
            val - self.estimate()
        } else {
            0.0
        };
        self.last_estimate = val * (1.0 - adj_alpha) + adj_alpha * self.last_estimate;
        self.variance = adj_alpha * (self.variance + (1.0 - adj_alpha) * delta * delta);
        self.total_weight += weight;
    }

    /// Zero-bias corrected estimate.
    fn estimate(&self) -> f64 {
        if self.total_weight <= 0.0 {
            0.0
        } else {
            let zero_factor = 1.0 - self.alpha.powf(self.total_weight);
            self.last_estimate / zero_factor.max(1e-6)
        }
    }
}
