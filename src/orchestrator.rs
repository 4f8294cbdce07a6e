//! Ties the pool, the animation runner and an observer together for one
//! draw cycle.
//!
//! The real outcome is sampled the moment a draw starts. Ticks only show
//! noise from the full range, and the reveal reads the stored outcome, so
//! the announced number is always the one that gets committed.

use rand::rngs::ThreadRng;
use rand::Rng;
use std::time::Instant;

use crate::animation::{
    self, tick_progress, AnimationRun, CancelHandle, Easing, FrameStatus, ScheduleConfig,
};
use crate::pool;
use crate::runtime::Ticker;
use crate::settings::Settings;

/// Receives the cosmetic ticks and the final outcome of a draw.
pub trait DrawObserver {
    fn on_tick(&mut self, display: i32, progress: f64);
    fn on_complete(&mut self, numbers: &[i32]);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawStart {
    /// The reveal animation is running; drive it with `frame`.
    Animating,
    /// Nothing could be drawn; completion already fired with no numbers.
    Immediate,
    /// A draw is in progress, the request was ignored.
    AlreadyRunning,
}

#[derive(Debug)]
struct ActiveDraw {
    run: AnimationRun,
    outcome: Vec<i32>,
    start: i32,
    end: i32,
}

#[derive(Debug)]
pub struct DrawOrchestrator<R: Rng = ThreadRng> {
    rng: R,
    config: ScheduleConfig,
    easing: Easing,
    active: Option<ActiveDraw>,
    current_display: Option<i32>,
}

impl Default for DrawOrchestrator<ThreadRng> {
    fn default() -> Self {
        Self::new(rand::thread_rng(), ScheduleConfig::default(), Easing::default())
    }
}

impl<R: Rng> DrawOrchestrator<R> {
    pub fn new(rng: R, config: ScheduleConfig, easing: Easing) -> Self {
        Self {
            rng,
            config,
            easing,
            active: None,
            current_display: None,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    /// Number currently on screen: tick noise while animating, the first
    /// drawn number after the reveal.
    pub fn current_display(&self) -> Option<i32> {
        self.current_display
    }

    pub fn cancel_handle(&self) -> Option<CancelHandle> {
        self.active.as_ref().map(|a| a.run.cancel_handle())
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// Decide the outcome for `settings` against `excluded` and begin the
    /// reveal. An empty outcome completes immediately without animating.
    pub fn start<O: DrawObserver + ?Sized>(
        &mut self,
        settings: &Settings,
        excluded: &[i32],
        observer: &mut O,
    ) -> DrawStart {
        if self.active.is_some() {
            log::debug!("draw already in progress, ignoring start");
            return DrawStart::AlreadyRunning;
        }

        let outcome = pool::sample_many(
            &mut self.rng,
            settings.start_number,
            settings.end_number,
            settings.draw_count,
            excluded,
            settings.allow_duplicates,
        );

        if outcome.is_empty() {
            log::info!("nothing left to draw");
            observer.on_complete(&outcome);
            return DrawStart::Immediate;
        }

        let schedule = self.config.generate(self.easing.as_fn());
        self.active = Some(ActiveDraw {
            run: animation::run(schedule),
            outcome,
            start: settings.start_number,
            end: settings.end_number,
        });

        DrawStart::Animating
    }

    /// Advance the reveal to `now`. Returns `None` when no draw is running.
    pub fn frame<O: DrawObserver + ?Sized>(
        &mut self,
        now: Instant,
        observer: &mut O,
    ) -> Option<FrameStatus> {
        let active = self.active.as_mut()?;
        let (start, end) = (active.start, active.end);
        let tick_count = active.run.schedule().tick_count();
        let rng = &mut self.rng;
        let mut shown = None;

        let status = active.run.frame(
            now,
            |tick| {
                // display noise ignores exclusions on purpose
                if let Some(n) = pool::sample_one(rng, start, end, &[]) {
                    shown = Some(n);
                    observer.on_tick(n, tick_progress(tick, tick_count));
                }
            },
            || {},
        );

        if shown.is_some() {
            self.current_display = shown;
        }

        match status {
            FrameStatus::Running => {}
            FrameStatus::Complete => {
                if let Some(done) = self.active.take() {
                    self.current_display = done.outcome.first().copied();
                    observer.on_complete(&done.outcome);
                }
            }
            FrameStatus::Cancelled => {
                self.active = None;
                self.current_display = None;
            }
        }

        Some(status)
    }

    /// Cancel a running reveal. No callback fires afterwards; calling this
    /// while idle is a no-op.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            log::debug!("draw cancelled after {} ticks", active.run.ticks_fired());
            active.run.cancel();
        }
        self.current_display = None;
    }

    /// Drive the running reveal to completion on the calling thread, one
    /// frame per ticker interval.
    pub fn play<T: Ticker, O: DrawObserver + ?Sized>(&mut self, ticker: &T, observer: &mut O) {
        while self.frame(Instant::now(), observer).is_some() && self.active.is_some() {
            std::thread::sleep(ticker.interval());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::FixedTicker;
    use crate::settings::DEFAULT_SETTINGS;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        ticks: Vec<(i32, f64)>,
        completions: Vec<Vec<i32>>,
    }

    impl DrawObserver for Recorder {
        fn on_tick(&mut self, display: i32, progress: f64) {
            self.ticks.push((display, progress));
        }

        fn on_complete(&mut self, numbers: &[i32]) {
            self.completions.push(numbers.to_vec());
        }
    }

    fn orchestrator(seed: u64) -> DrawOrchestrator<StdRng> {
        DrawOrchestrator::new(
            StdRng::seed_from_u64(seed),
            ScheduleConfig::default(),
            Easing::default(),
        )
    }

    fn settings(start: i32, end: i32, count: usize) -> Settings {
        Settings {
            start_number: start,
            end_number: end,
            draw_count: count,
            ..DEFAULT_SETTINGS
        }
    }

    /// Feed frames every 16ms until the draw finishes.
    fn drive(orch: &mut DrawOrchestrator<StdRng>, rec: &mut Recorder) -> usize {
        let t0 = Instant::now();
        let mut frames = 0;
        while orch.is_animating() {
            orch.frame(t0 + Duration::from_millis(16 * frames as u64), rec);
            frames += 1;
            assert!(frames < 1000, "animation never completed");
        }
        frames
    }

    #[test]
    fn test_outcome_is_sampled_before_any_tick() {
        let mut orch = orchestrator(42);
        let mut rec = Recorder::default();
        let s = settings(1, 45, 6);

        assert_eq!(orch.start(&s, &[], &mut rec), DrawStart::Animating);
        drive(&mut orch, &mut rec);

        let expected = pool::sample_many(&mut StdRng::seed_from_u64(42), 1, 45, 6, &[], false);
        assert_eq!(rec.completions, vec![expected]);
    }

    #[test]
    fn test_full_cycle_reveals_first_number() {
        let mut orch = orchestrator(1);
        let mut rec = Recorder::default();
        let excluded = [1, 2, 3];

        orch.start(&settings(1, 10, 3), &excluded, &mut rec);
        assert!(orch.is_animating());
        drive(&mut orch, &mut rec);

        assert!(!orch.is_animating());
        assert_eq!(rec.completions.len(), 1);
        let numbers = &rec.completions[0];
        assert_eq!(numbers.len(), 3);
        assert!(numbers.iter().all(|n| (4..=10).contains(n)));
        assert_eq!(numbers.iter().collect::<HashSet<_>>().len(), 3);
        assert_eq!(orch.current_display(), Some(numbers[0]));
    }

    #[test]
    fn test_ticks_cover_schedule_with_normalized_progress() {
        let mut orch = orchestrator(3);
        let mut rec = Recorder::default();
        orch.start(&settings(1, 12, 1), &[], &mut rec);
        drive(&mut orch, &mut rec);

        let expected_ticks = ScheduleConfig::default()
            .generate(Easing::default().as_fn())
            .tick_count();
        assert_eq!(rec.ticks.len(), expected_ticks);
        assert_eq!(rec.ticks.first().map(|t| t.1), Some(0.0));
        assert_eq!(rec.ticks.last().map(|t| t.1), Some(1.0));
        assert!(rec.ticks.windows(2).all(|w| w[0].1 < w[1].1));
        assert!(rec.ticks.iter().all(|(n, _)| (1..=12).contains(n)));
    }

    #[test]
    fn test_tick_noise_ignores_exclusions() {
        let mut orch = orchestrator(5);
        let mut rec = Recorder::default();
        let excluded: Vec<i32> = (1..=9).collect();

        orch.start(&settings(1, 10, 1), &excluded, &mut rec);
        drive(&mut orch, &mut rec);

        assert_eq!(rec.completions, vec![vec![10]]);
        assert!(rec.ticks.iter().any(|(n, _)| *n != 10));
    }

    #[test]
    fn test_empty_outcome_completes_immediately() {
        let mut orch = orchestrator(9);
        let mut rec = Recorder::default();

        let started = orch.start(&settings(1, 3, 1), &[1, 2, 3], &mut rec);
        assert_eq!(started, DrawStart::Immediate);
        assert!(!orch.is_animating());
        assert!(rec.ticks.is_empty());
        assert_eq!(rec.completions, vec![Vec::<i32>::new()]);
        assert_eq!(orch.frame(Instant::now(), &mut rec), None);
    }

    #[test]
    fn test_second_start_is_ignored_while_animating() {
        let mut orch = orchestrator(11);
        let mut rec = Recorder::default();
        let s = settings(1, 12, 1);

        assert_eq!(orch.start(&s, &[], &mut rec), DrawStart::Animating);
        orch.frame(Instant::now(), &mut rec);
        assert_eq!(orch.start(&s, &[], &mut rec), DrawStart::AlreadyRunning);

        drive(&mut orch, &mut rec);
        assert_eq!(rec.completions.len(), 1);
    }

    #[test]
    fn test_stop_freezes_callbacks() {
        let mut orch = orchestrator(13);
        let mut rec = Recorder::default();
        let t0 = Instant::now();

        orch.start(&settings(1, 12, 1), &[], &mut rec);
        orch.frame(t0, &mut rec);
        orch.frame(t0 + Duration::from_millis(200), &mut rec);
        let ticks = rec.ticks.len();
        assert!(ticks > 0);

        orch.stop();
        orch.stop();
        assert!(!orch.is_animating());
        assert_eq!(orch.current_display(), None);
        assert_eq!(orch.frame(t0 + Duration::from_secs(5), &mut rec), None);
        assert_eq!(rec.ticks.len(), ticks);
        assert!(rec.completions.is_empty());
    }

    #[test]
    fn test_external_cancel_handle_stops_run() {
        let mut orch = orchestrator(17);
        let mut rec = Recorder::default();
        let t0 = Instant::now();

        orch.start(&settings(1, 12, 1), &[], &mut rec);
        let handle = orch.cancel_handle().unwrap();
        orch.frame(t0, &mut rec);
        handle.cancel();

        assert_eq!(
            orch.frame(t0 + Duration::from_secs(3), &mut rec),
            Some(FrameStatus::Cancelled)
        );
        assert!(!orch.is_animating());
        assert!(rec.completions.is_empty());
        assert_eq!(rec.ticks.len(), 1);
    }

    #[test]
    fn test_play_blocks_until_complete() {
        let mut orch = DrawOrchestrator::new(
            StdRng::seed_from_u64(21),
            ScheduleConfig::with_duration(Duration::from_millis(60)),
            Easing::Linear,
        );
        let mut rec = Recorder::default();

        orch.start(&settings(1, 12, 2), &[], &mut rec);
        orch.play(&FixedTicker::new(Duration::from_millis(5)), &mut rec);

        assert!(!orch.is_animating());
        assert_eq!(rec.completions.len(), 1);
        assert_eq!(rec.completions[0].len(), 2);
    }

    #[test]
    fn test_zero_duration_reveals_on_first_frame() {
        let mut orch = DrawOrchestrator::new(
            StdRng::seed_from_u64(23),
            ScheduleConfig::with_duration(Duration::ZERO),
            Easing::default(),
        );
        let mut rec = Recorder::default();

        orch.start(&settings(1, 12, 1), &[], &mut rec);
        assert_eq!(
            orch.frame(Instant::now(), &mut rec),
            Some(FrameStatus::Complete)
        );
        assert_eq!(rec.ticks.len(), 1);
        assert_eq!(rec.ticks[0].1, 1.0);
        assert_eq!(rec.completions.len(), 1);
    }
}
