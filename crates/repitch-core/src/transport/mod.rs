//! Host transport tracking
//!
//! The host reports its playback position and speed as sparse, irregularly
//! timed control events; between reports the tracker dead-reckons the
//! current beat and frame position from elapsed samples at the last known
//! rate. The event *encoding* is the host adapter's problem - this module
//! consumes already-typed [`PositionReport`] records.
//!
//! Position validity follows the host contract: a report only (re)synces
//! the tracker when every required field is present together and the frame
//! is non-negative. A complete report with a negative frame is the host
//! signalling "position unknown" and drops the tracker back to unsynced.
//! Anything incomplete updates at most the speed and is otherwise ignored.

/// One decoded host control event
///
/// All fields are optional because the host's event encoding is untyped:
/// a field that was absent, or present with the wrong type, arrives here
/// as `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PositionReport {
    /// Bar number (0-based)
    pub bar: Option<i64>,
    /// Beat within the bar (0-based, fractional)
    pub beat: Option<f64>,
    /// Note value of one beat (e.g. 4 = quarter note)
    pub beat_unit: Option<i32>,
    /// Beats per bar (time signature numerator)
    pub beats_per_bar: Option<f64>,
    /// Tempo in beats per minute
    pub beats_per_minute: Option<f64>,
    /// Transport speed: 1.0 = normal forward, 0 = stopped, negative = reverse
    pub speed: Option<f32>,
    /// Host-specific vari-speed scale override; takes precedence over
    /// `speed` when both are present in the same report
    pub scale: Option<f32>,
    /// Absolute frame (sample) position; negative = position unknown
    pub frame: Option<i64>,
}

impl PositionReport {
    /// A report carrying only a speed value
    pub fn speed_only(speed: f32) -> Self {
        Self {
            speed: Some(speed),
            ..Self::default()
        }
    }

    /// Whether every field required for a position transition is present
    ///
    /// `scale` is an optional extra and not required for completeness.
    pub fn is_complete(&self) -> bool {
        self.bar.is_some()
            && self.beat.is_some()
            && self.beat_unit.is_some()
            && self.beats_per_bar.is_some()
            && self.beats_per_minute.is_some()
            && self.speed.is_some()
            && self.frame.is_some()
    }
}

/// Sync state of the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    /// No valid position received yet; speed defaults to 1.0
    #[default]
    Unsynced,
    /// A complete position report with a non-negative frame has been seen
    Synced,
}

/// Dead-reckoning transport state tracker
///
/// Holds the last known host speed and position and advances an internal
/// beat/frame estimate every callback from elapsed samples. The advance
/// runs every callback regardless of sync state, so the estimate stays
/// consistent between sparse host reports.
#[derive(Debug)]
pub struct TransportTracker {
    sample_rate: f64,
    state: SyncState,
    speed: f32,
    beats_per_minute: f64,
    beat_unit: i32,
    /// Running beat position (double precision; accumulates across bars)
    bar_beats: f64,
    /// Running frame position, kept fractional so sub-sample drift from
    /// non-integer speeds does not accumulate into error
    frame: f64,
}

impl TransportTracker {
    /// Create a tracker for the given sample rate, unsynced, at speed 1.0
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate as f64,
            state: SyncState::Unsynced,
            speed: 1.0,
            beats_per_minute: 120.0,
            beat_unit: 4,
            bar_beats: 0.0,
            frame: 0.0,
        }
    }

    /// Current sync state
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Whether a valid position has been received
    pub fn is_synced(&self) -> bool {
        self.state == SyncState::Synced
    }

    /// Last known signed host speed (1.0 = normal forward playback)
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Magnitude of the current speed, substituting 1.0 for exact zero
    ///
    /// Stretching at zero rate is undefined; a stopped transport is
    /// treated as pass-through pitch.
    pub fn effective_speed(&self) -> f64 {
        let s = (self.speed as f64).abs();
        if s == 0.0 {
            1.0
        } else {
            s
        }
    }

    /// Last known tempo in beats per minute
    pub fn beats_per_minute(&self) -> f64 {
        self.beats_per_minute
    }

    /// Note value of one beat from the last complete report
    pub fn beat_unit(&self) -> i32 {
        self.beat_unit
    }

    /// Current running beat position estimate
    pub fn bar_beats(&self) -> f64 {
        self.bar_beats
    }

    /// Current running frame position estimate
    pub fn frame(&self) -> i64 {
        self.frame as i64
    }

    /// Apply one decoded control event
    ///
    /// Speed is taken from the most specific field available: the
    /// host-specific `scale` override wins over the standard `speed`.
    /// Position state only changes on a complete report.
    pub fn apply(&mut self, report: &PositionReport) {
        if let Some(scale) = report.scale {
            self.speed = scale;
        } else if let Some(speed) = report.speed {
            self.speed = speed;
        }

        if !report.is_complete() {
            return;
        }

        // `is_complete` guarantees every unwrap below.
        let frame = report.frame.unwrap_or(0);
        if frame < 0 {
            // Host signalling invalid/unknown position.
            self.state = SyncState::Unsynced;
            return;
        }

        self.state = SyncState::Synced;
        self.frame = frame as f64;
        self.beats_per_minute = report.beats_per_minute.unwrap_or(120.0);
        self.beat_unit = report.beat_unit.unwrap_or(4);
        self.bar_beats = report.bar.unwrap_or(0) as f64 * report.beats_per_bar.unwrap_or(4.0)
            + report.beat.unwrap_or(0.0);
    }

    /// Fold a callback's event sequence into the tracker
    ///
    /// Events arrive in time order; the last report with full position
    /// data wins.
    pub fn apply_events<'a>(&mut self, events: impl IntoIterator<Item = &'a PositionReport>) {
        for report in events {
            self.apply(report);
        }
    }

    /// Advance the position estimate by `n_samples` elapsed samples at the
    /// last known *signed* speed
    ///
    /// Runs every callback regardless of sync state.
    pub fn advance(&mut self, n_samples: usize) {
        let speed = self.speed as f64;
        let n = n_samples as f64;
        self.bar_beats += n * self.beats_per_minute * speed / (60.0 * self.sample_rate);
        self.frame += n * speed;
    }
}
