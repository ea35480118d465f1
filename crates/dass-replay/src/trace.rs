//! Piecewise-constant bandwidth traces.
//!
//! One `<timestamp_ms> <bandwidth_kbps>` pair per line. Each bandwidth holds
//! from its timestamp until the next line; the last one holds forever.

use crate::{ReplayError, ReplayResult};

#[derive(Clone, Copy, Debug, PartialEq)]
struct Step {
    start_ms: f64,
    kbps: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BandwidthTrace {
    steps: Vec<Step>,
}

impl BandwidthTrace {
    /// Transfers never stall completely; zero bandwidth is treated as this.
    const FLOOR_KBPS: f64 = 1.0;

    /// Parse a trace file.
    ///
    /// Blank lines and `#` comments are skipped.
    ///
    /// # Errors
    ///
    /// Malformed lines, timestamps going backwards or an empty trace.
    pub fn parse(text: &str) -> ReplayResult<Self> {
        let mut steps: Vec<Step> = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let content = raw.trim();
            if content.is_empty() || content.starts_with('#') {
                continue;
            }

            let mut fields = content.split_whitespace().map(str::parse::<f64>);
            let (Some(Ok(start_ms)), Some(Ok(kbps)), None) =
                (fields.next(), fields.next(), fields.next())
            else {
                return Err(ReplayError::TraceLine {
                    line,
                    content: content.to_owned(),
                });
            };
            if !start_ms.is_finite() || !kbps.is_finite() || kbps < 0.0 {
                return Err(ReplayError::TraceLine {
                    line,
                    content: content.to_owned(),
                });
            }
            if steps.last().is_some_and(|prev| start_ms < prev.start_ms) {
                return Err(ReplayError::TraceOrder { line });
            }
            steps.push(Step { start_ms, kbps });
        }

        if steps.is_empty() {
            return Err(ReplayError::EmptyTrace);
        }
        Ok(Self { steps })
    }

    /// Constant bandwidth for the whole replay.
    #[must_use]
    pub fn constant(kbps: f64) -> Self {
        Self {
            steps: vec![Step {
                start_ms: 0.0,
                kbps,
            }],
        }
    }

    fn step_index(&self, at_ms: f64) -> usize {
        self.steps
            .partition_point(|step| step.start_ms <= at_ms)
            .saturating_sub(1)
    }

    /// Bandwidth in effect at `at_ms`. Times before the first step use it.
    #[must_use]
    pub fn kbps_at(&self, at_ms: f64) -> f64 {
        self.steps[self.step_index(at_ms)].kbps
    }

    /// Time needed to move `bytes` starting at `start_ms`, crossing steps.
    #[must_use]
    #[expect(clippy::cast_precision_loss)] // segment sizes are far below 2^53
    pub fn transfer_ms(&self, start_ms: f64, bytes: u64) -> f64 {
        let mut remaining_bits = bytes as f64 * 8.0;
        let mut now = start_ms;
        let mut index = self.step_index(start_ms);

        loop {
            let bits_per_ms = self.steps[index].kbps.max(Self::FLOOR_KBPS);
            let Some(next) = self.steps.get(index + 1) else {
                return now + remaining_bits / bits_per_ms - start_ms;
            };

            let window_ms = (next.start_ms - now).max(0.0);
            let window_bits = window_ms * bits_per_ms;
            if window_bits >= remaining_bits {
                return now + remaining_bits / bits_per_ms - start_ms;
            }
            remaining_bits -= window_bits;
            now = now.max(next.start_ms);
            index += 1;
        }
    }
}
