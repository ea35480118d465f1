use std::sync::Arc;

use super::{
    AbrOptions, Estimator, EventBus, EwmaBandwidthEstimator, FirstLevel, Fragment, LevelTable,
    LoadStats, PlaybackEvent, Policy, RiskTier, StartLevel, Strategy, Subscription, TrackKind,
    bus::Polled,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DecisionReason {
    /// Highest eligible candidate whose bitrate fits the estimate.
    WithinEstimate,
    /// Nothing fits, lowest candidate chosen.
    LowestCandidate,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LevelDecision {
    pub level: usize,
    pub reason: DecisionReason,
    /// Bandwidth the decision was made against, in bits per second.
    pub estimate_bps: f64,
    pub hint: Option<RiskTier>,
    pub candidates: usize,
}

/// Per-session ABR controller.
///
/// Owns its estimator and the latest look-ahead hint. The level table and
/// start level belong to the host session and are shared by handle.
pub struct AbrController<E: Estimator> {
    cfg: AbrOptions,
    strategy: Strategy,
    estimator: E,
    hint: Option<RiskTier>,
    levels: LevelTable,
    start_level: Option<StartLevel>,
    subscription: Option<Subscription>,
}

impl<E: Estimator> AbrController<E> {
    pub fn with_estimator(cfg: AbrOptions, estimator: E) -> Self {
        let strategy = cfg.policy.strategy();
        Self {
            cfg,
            strategy,
            estimator,
            hint: None,
            levels: Arc::from([]),
            start_level: None,
            subscription: None,
        }
    }

    /// Give the controller the host's start level slot.
    #[must_use]
    pub fn with_start_level(mut self, start_level: StartLevel) -> Self {
        self.start_level = Some(start_level);
        self
    }

    pub fn policy(&self) -> Policy {
        self.cfg.policy
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    /// Latest look-ahead hint, `None` until a tagged fragment arrives.
    pub fn hint(&self) -> Option<RiskTier> {
        self.hint
    }

    pub fn levels(&self) -> &LevelTable {
        &self.levels
    }

    /// Replace the level table without the manifest side effects.
    pub fn set_levels(&mut self, levels: LevelTable) {
        self.levels = levels;
    }

    /// Adopt a freshly parsed level table.
    ///
    /// Privacy-aware policies also point the host's start level at the first
    /// privacy-redacted level.
    pub fn on_manifest_parsed(&mut self, levels: LevelTable) {
        self.levels = levels;
        let Some(index) = self
            .strategy
            .start_level(&self.levels, &self.cfg.privacy_marker)
        else {
            return;
        };
        if let Some(start_level) = &self.start_level {
            start_level.set(index);
        }
        tracing::debug!(
            policy = %self.cfg.policy,
            start_level = index,
            "ABR manifest parsed: privacy start level"
        );
    }

    /// Fold one completed fragment into the estimator and the hint.
    pub fn on_frag_buffered(&mut self, frag: &Fragment, stats: &LoadStats) {
        if frag.kind != TrackKind::Main || stats.aborted {
            tracing::trace!(
                sn = frag.sn,
                kind = ?frag.kind,
                aborted = stats.aborted,
                "ABR ignoring fragment"
            );
            return;
        }

        let ttfb_ms = stats.ttfb_ms();
        let download_ms = stats.total_ms() - ttfb_ms.min(self.estimator.estimate_ttfb_ms());
        self.estimator.sample(download_ms, stats.loaded);
        self.estimator.sample_ttfb(ttfb_ms);
        self.hint = frag.tags.hint();

        tracing::trace!(
            sn = frag.sn,
            download_ms,
            ttfb_ms,
            bytes = stats.loaded,
            hint = ?self.hint,
            "ABR fragment sampled"
        );
    }

    /// Bandwidth the next decision will use.
    pub fn bandwidth_bps(&self) -> f64 {
        if self.estimator.can_estimate() {
            self.estimator.estimate_bps()
        } else {
            self.cfg.default_estimate_bps
        }
    }

    /// Make a level decision, `None` when no level table is available.
    pub fn decide(&self) -> Option<LevelDecision> {
        if self.levels.is_empty() {
            return None;
        }

        let estimate_bps = self.bandwidth_bps();
        let hint = self.hint;
        let candidates = self
            .strategy
            .candidates(&self.levels, hint, &self.cfg.privacy_marker);
        let eligible = self.strategy.eligible(&candidates, hint);

        #[expect(clippy::cast_precision_loss)] // bitrate precision loss is negligible for ABR
        let fitting = eligible
            .iter()
            .rev()
            .copied()
            .find(|&index| self.levels[index].effective_bitrate() as f64 <= estimate_bps);

        let (level, reason) = match fitting {
            Some(index) => (index, DecisionReason::WithinEstimate),
            None => (*candidates.first()?, DecisionReason::LowestCandidate),
        };

        tracing::debug!(
            policy = %self.cfg.policy,
            estimate_bps,
            hint = ?hint,
            candidates = candidates.len(),
            eligible = eligible.len(),
            level,
            reason = ?reason,
            "ABR decide"
        );

        Some(LevelDecision {
            level,
            reason,
            estimate_bps,
            hint,
            candidates: candidates.len(),
        })
    }

    /// Level index for the next fragment request.
    pub fn next_auto_level(&self) -> Option<usize> {
        self.decide().map(|decision| decision.level)
    }

    /// Level for the very first fragment.
    pub fn first_auto_level(&self) -> FirstLevel {
        self.strategy
            .first_level(&self.levels, &self.cfg.privacy_marker)
    }

    /// Manual level forcing is not supported.
    pub fn forced_auto_level(&self) -> Option<usize> {
        None
    }

    /// Discard the estimator state; the hint survives.
    pub fn reset_estimator(&mut self) {
        self.estimator.reset();
        tracing::debug!(policy = %self.cfg.policy, "ABR estimator reset");
    }

    /// Subscribe to `bus`, replacing any previous subscription.
    pub fn attach(&mut self, bus: &EventBus) {
        self.subscription = Some(bus.subscribe());
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Dispatch every pending bus event. Returns the number handled.
    ///
    /// The start level is seeded only by the first manifest of a
    /// subscription; later manifests just refresh the level table.
    pub fn poll_events(&mut self) -> usize {
        let Some(mut subscription) = self.subscription.take() else {
            return 0;
        };

        let mut handled = 0;
        let closed = loop {
            match subscription.poll() {
                Polled::Event(PlaybackEvent::ManifestParsed { levels }) => {
                    if subscription.first_manifest() {
                        self.on_manifest_parsed(levels);
                    } else {
                        self.set_levels(levels);
                    }
                }
                Polled::Event(PlaybackEvent::FragBuffered { frag, stats }) => {
                    self.on_frag_buffered(&frag, &stats);
                }
                Polled::Empty => break false,
                Polled::Closed => break true,
            }
            handled += 1;
        };

        if closed {
            tracing::debug!("ABR event bus closed, detaching");
        } else {
            self.subscription = Some(subscription);
        }
        handled
    }

    /// Detach from the bus and release every handle into the host session:
    /// the start level slot and the level table.
    ///
    /// Safe to call more than once.
    pub fn destroy(&mut self) {
        self.subscription = None;
        self.start_level = None;
        self.levels = Arc::from([]);
    }
}

impl AbrController<EwmaBandwidthEstimator> {
    #[must_use]
    pub fn new(cfg: AbrOptions) -> Self {
        let estimator = EwmaBandwidthEstimator::new(&cfg);
        Self::with_estimator(cfg, estimator)
    }

    /// Controller already subscribed to `bus`.
    #[must_use]
    pub fn attached(cfg: AbrOptions, bus: &EventBus) -> Self {
        let mut controller = Self::new(cfg);
        controller.attach(bus);
        controller
    }
}
