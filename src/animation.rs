use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Smallest step the schedule advances by, so a degenerate easing or a zero
/// `min_interval` cannot stall generation.
const MIN_STEP_MS: f64 = 1.0;

/// Starts fast and settles slowly; the default reveal curve.
pub fn ease_out_quart(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(4)
}

/// Sharper deceleration than [`ease_out_quart`].
pub fn ease_out_expo(t: f64) -> f64 {
    if t >= 1.0 {
        1.0
    } else {
        1.0 - 2f64.powf(-10.0 * t)
    }
}

pub fn linear(t: f64) -> f64 {
    t
}

/// Named easing curves selectable from the command line.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    ValueEnum,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    #[default]
    EaseOutQuart,
    EaseOutExpo,
    Linear,
}

impl Easing {
    pub fn as_fn(&self) -> fn(f64) -> f64 {
        match self {
            Easing::EaseOutQuart => ease_out_quart,
            Easing::EaseOutExpo => ease_out_expo,
            Easing::Linear => linear,
        }
    }

    pub fn apply(&self, t: f64) -> f64 {
        (self.as_fn())(t)
    }
}

/// Timing knobs for a reveal animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub duration: Duration,
    /// tick spacing at the start of the run
    pub min_interval: Duration,
    /// tick spacing as progress approaches 1
    pub max_interval: Duration,
}

pub const ANIMATION_CONFIG: ScheduleConfig = ScheduleConfig {
    duration: Duration::from_millis(2000),
    min_interval: Duration::from_millis(50),
    max_interval: Duration::from_millis(400),
};

impl Default for ScheduleConfig {
    fn default() -> Self {
        ANIMATION_CONFIG
    }
}

impl ScheduleConfig {
    pub fn with_duration(duration: Duration) -> Self {
        Self {
            duration,
            ..ANIMATION_CONFIG
        }
    }

    /// Build the tick timeline. Each step is
    /// `min + (max - min) * easing(elapsed / duration)`, so with an ease-out
    /// curve ticks bunch up early and spread toward the end. The final
    /// timestamp is always `duration` itself.
    pub fn generate<E: Fn(f64) -> f64>(&self, easing: E) -> AnimationSchedule {
        let duration_ms = as_ms(self.duration);
        let min_ms = as_ms(self.min_interval);
        let max_ms = as_ms(self.max_interval).max(min_ms);

        let mut timestamps = Vec::new();
        let mut elapsed = 0.0;

        while elapsed < duration_ms {
            timestamps.push(from_ms(elapsed));
            let eased = easing(elapsed / duration_ms);
            let interval = min_ms + (max_ms - min_ms) * eased;
            elapsed += interval.max(MIN_STEP_MS);
        }

        if timestamps.last().map_or(true, |last| *last < self.duration) {
            timestamps.push(self.duration);
        }

        log::debug!(
            "generated {} ticks over {:?}",
            timestamps.len(),
            self.duration
        );

        AnimationSchedule {
            timestamps,
            total_duration: self.duration,
        }
    }
}

fn as_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn from_ms(ms: f64) -> Duration {
    Duration::from_nanos((ms * 1_000_000.0).round() as u64)
}

/// Tick offsets from the start of a run. Immutable once generated.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationSchedule {
    pub timestamps: Vec<Duration>,
    pub total_duration: Duration,
}

impl AnimationSchedule {
    pub fn tick_count(&self) -> usize {
        self.timestamps.len()
    }

    /// Normalized position of a tick in the schedule, in `[0, 1]`.
    pub fn progress(&self, tick_index: usize) -> f64 {
        tick_progress(tick_index, self.tick_count())
    }
}

pub fn tick_progress(tick_index: usize, tick_count: usize) -> f64 {
    if tick_count > 1 {
        tick_index as f64 / (tick_count - 1) as f64
    } else {
        1.0
    }
}

/// Generate a schedule with the default tick spacing.
pub fn generate_schedule<E: Fn(f64) -> f64>(duration: Duration, easing: E) -> AnimationSchedule {
    ScheduleConfig::with_duration(duration).generate(easing)
}

/// Shared cancellation flag for a run. Cancelling is idempotent and may
/// happen before, during or after completion.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Rc<Cell<bool>>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Running,
    Complete,
    Cancelled,
}

/// A single pass over a schedule, advanced by the caller's frame clock.
#[derive(Debug)]
pub struct AnimationRun {
    schedule: AnimationSchedule,
    next_tick: usize,
    started_at: Option<Instant>,
    completed: bool,
    cancel: CancelHandle,
}

/// Begin a run. The clock starts on the first [`AnimationRun::frame`] call.
pub fn run(schedule: AnimationSchedule) -> AnimationRun {
    AnimationRun {
        schedule,
        next_tick: 0,
        started_at: None,
        completed: false,
        cancel: CancelHandle::default(),
    }
}

impl AnimationRun {
    pub fn schedule(&self) -> &AnimationSchedule {
        &self.schedule
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn ticks_fired(&self) -> usize {
        self.next_tick
    }

    pub fn is_done(&self) -> bool {
        self.completed || self.cancel.is_cancelled()
    }

    /// Advance to `now`: fire `on_tick` for every timestamp crossed since the
    /// previous frame, then `on_complete` once the total duration is reached.
    /// After completion or cancellation no callback fires again.
    pub fn frame<T, C>(&mut self, now: Instant, mut on_tick: T, on_complete: C) -> FrameStatus
    where
        T: FnMut(usize),
        C: FnOnce(),
    {
        if self.cancel.is_cancelled() {
            return FrameStatus::Cancelled;
        }
        if self.completed {
            return FrameStatus::Complete;
        }

        let started_at = *self.started_at.get_or_insert(now);
        let elapsed = now.saturating_duration_since(started_at);

        while self.next_tick < self.schedule.timestamps.len()
            && elapsed >= self.schedule.timestamps[self.next_tick]
        {
            on_tick(self.next_tick);
            self.next_tick += 1;

            // the tick callback may hold a handle and cancel mid-frame
            if self.cancel.is_cancelled() {
                return FrameStatus::Cancelled;
            }
        }

        if elapsed < self.schedule.total_duration {
            FrameStatus::Running
        } else {
            self.completed = true;
            on_complete();
            FrameStatus::Complete
        }
    }
}
