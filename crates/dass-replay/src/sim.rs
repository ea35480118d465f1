//! Sequential fetch simulation over a bandwidth trace.
//!
//! The simulation plays the host pipeline: it publishes the manifest and
//! every buffered fragment on an [`EventBus`], and asks the attached
//! controller which level to fetch next. Fetches run back to back; there is
//! no playback buffer model.

use std::sync::Arc;

use dass_abr::{
    AbrController, AbrOptions, EventBus, EwmaBandwidthEstimator, FirstLevel, Fragment, Level,
    LevelTable, LoadStats, PlaybackEvent, RiskTier, SegmentTags, StartLevel,
};
use tracing::debug;

use crate::{BandwidthTrace, ReplayError, ReplayResult, Segment};

const BUS_CAPACITY: usize = 64;

#[derive(Clone, Debug)]
pub struct ReplayConfig {
    pub options: AbrOptions,
    /// Time to first byte of every request.
    pub latency_ms: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            options: AbrOptions::default(),
            latency_ms: 50.0,
        }
    }
}

/// One simulated segment fetch.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchRecord {
    pub sn: u64,
    pub uri: String,
    pub level: usize,
    pub privacy: bool,
    /// Look-ahead hint in effect when the level was chosen.
    pub hint: Option<RiskTier>,
    /// Bandwidth estimate the level was chosen against.
    pub estimate_bps: f64,
    pub bytes: u64,
    pub start_ms: f64,
    pub total_ms: f64,
    pub tags: SegmentTags,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReplaySummary {
    /// Fetch count per level index.
    pub per_level: Vec<usize>,
    pub privacy_fetches: usize,
    pub mean_bitrate_bps: f64,
    /// Mean payload per fetch in bytes.
    pub mean_chunk_bytes: f64,
    /// Mean time each payload needs at the estimate it was chosen against,
    /// in seconds. Fetches without a positive estimate count as zero.
    pub mean_delay_secs: f64,
    pub elapsed_ms: f64,
}

impl ReplaySummary {
    #[must_use]
    #[expect(clippy::cast_precision_loss)] // fetch counts are tiny
    pub fn privacy_share(&self) -> f64 {
        let total: usize = self.per_level.iter().sum();
        if total == 0 {
            0.0
        } else {
            self.privacy_fetches as f64 / total as f64
        }
    }
}

pub struct Simulation {
    bus: EventBus,
    controller: AbrController<EwmaBandwidthEstimator>,
    start_level: StartLevel,
    levels: LevelTable,
    trace: BandwidthTrace,
    cfg: ReplayConfig,
}

impl Simulation {
    /// # Errors
    ///
    /// Invalid ABR options or an empty ladder.
    pub fn new(cfg: ReplayConfig, levels: Vec<Level>, trace: BandwidthTrace) -> ReplayResult<Self> {
        cfg.options.validate()?;
        if levels.is_empty() {
            return Err(ReplayError::EmptyLadder);
        }

        let bus = EventBus::new(BUS_CAPACITY);
        let start_level = StartLevel::new();
        let controller = AbrController::attached(cfg.options.clone(), &bus)
            .with_start_level(start_level.clone());

        Ok(Self {
            bus,
            controller,
            start_level,
            levels: Arc::from(levels),
            trace,
            cfg,
        })
    }

    #[must_use]
    pub fn controller(&self) -> &AbrController<EwmaBandwidthEstimator> {
        &self.controller
    }

    /// Fetch every segment in order, starting the clock at zero.
    pub fn run(&mut self, segments: &[Segment]) -> Vec<FetchRecord> {
        self.bus.publish(PlaybackEvent::ManifestParsed {
            levels: Arc::clone(&self.levels),
        });
        self.controller.poll_events();

        let mut clock_ms = 0.0;
        let mut records = Vec::with_capacity(segments.len());
        for (sn, segment) in (0_u64..).zip(segments) {
            let record = self.fetch(sn, segment, clock_ms);
            clock_ms += record.total_ms;
            records.push(record);
        }
        records
    }

    fn pick_level(&self, first: bool) -> usize {
        let level = if first {
            match self.controller.first_auto_level() {
                FirstLevel::Index(index) => Some(index),
                FirstLevel::HostConfigured => self.start_level.get(),
            }
        } else {
            self.controller.next_auto_level()
        };
        level.unwrap_or(0).min(self.levels.len() - 1)
    }

    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        reason = "segment sizes are positive and far below 2^53"
    )]
    fn fetch(&mut self, sn: u64, segment: &Segment, start_ms: f64) -> FetchRecord {
        let level = self.pick_level(sn == 0);
        let hint = self.controller.hint();
        let estimate_bps = self.controller.bandwidth_bps();

        let rendition = &self.levels[level];
        let bytes = (rendition.bitrate as f64 * segment.duration_secs / 8.0).round() as u64;
        let first_byte_ms = start_ms + self.cfg.latency_ms;
        let end_ms = first_byte_ms + self.trace.transfer_ms(first_byte_ms, bytes);

        debug!(
            sn,
            level,
            bytes,
            estimate_bps,
            hint = ?hint,
            risk = %segment.tags.risk_label(),
            "replay fetch"
        );

        let record = FetchRecord {
            sn,
            uri: segment.uri.clone(),
            level,
            privacy: rendition.is_privacy(&self.cfg.options.privacy_marker),
            hint,
            estimate_bps,
            bytes,
            start_ms,
            total_ms: end_ms - start_ms,
            tags: segment.tags,
        };

        self.bus.publish(PlaybackEvent::FragBuffered {
            frag: Fragment::main(sn).with_level(level).with_tags(segment.tags),
            stats: LoadStats::completed(start_ms, first_byte_ms, end_ms, bytes),
        });
        self.controller.poll_events();

        record
    }

    /// Aggregate a finished run.
    #[must_use]
    #[expect(clippy::cast_precision_loss)] // bitrate precision loss is negligible for ABR
    pub fn summarize(&self, records: &[FetchRecord]) -> ReplaySummary {
        let mut per_level = vec![0; self.levels.len()];
        for record in records {
            per_level[record.level] += 1;
        }

        let mean = |value: &dyn Fn(&FetchRecord) -> f64| {
            if records.is_empty() {
                0.0
            } else {
                records.iter().map(value).sum::<f64>() / records.len() as f64
            }
        };

        ReplaySummary {
            per_level,
            privacy_fetches: records.iter().filter(|record| record.privacy).count(),
            mean_bitrate_bps: mean(&|record| self.levels[record.level].bitrate as f64),
            mean_chunk_bytes: mean(&|record| record.bytes as f64),
            mean_delay_secs: mean(&|record| {
                if record.estimate_bps > 0.0 {
                    record.bytes as f64 * 8.0 / record.estimate_bps
                } else {
                    0.0
                }
            }),
            elapsed_ms: records.iter().map(|record| record.total_ms).sum(),
        }
    }
}
