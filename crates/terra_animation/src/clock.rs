//! Timeline clock
//!
//! Owns the playback state and advances progress from frame deltas supplied
//! by the host's frame loop. Every tick applies the policy and then notifies
//! the progress observer, in that order, before returning.

use std::fmt;

use tracing::{debug, info, trace, warn};

use crate::error::{Result, TimelineError};
use crate::playback::PlaybackControls;
use crate::policy::PhasePolicy;
use crate::registry::{EntityRegistry, EntitySnapshot};
use crate::schedule::{Phase, PhaseSchedule};

/// Callback receiving a progress report after every apply
pub type ProgressObserver = Box<dyn FnMut(&ProgressReport<'_>) + Send>;

/// Session-scoped playback state
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackState {
    /// Kept in f64 so slow speeds still advance near the end of the timeline
    pub progress: f64,
    pub is_playing: bool,
    pub speed: f32,
    pub duration_secs: f32,
}

/// What the UI shows after each update
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressReport<'a> {
    pub progress: f32,
    pub phase: &'a Phase,
    pub local_fraction: f32,
}

impl ProgressReport<'_> {
    /// Whole percentage for the progress bar
    pub fn percent(&self) -> u8 {
        (self.progress * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

impl fmt::Display for ProgressReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}% - {}", self.percent(), self.phase.display_label())
    }
}

/// Drives a phase schedule over an entity registry
pub struct TimelineClock {
    schedule: PhaseSchedule,
    policy: PhasePolicy,
    registry: EntityRegistry,
    state: PlaybackState,
    observer: Option<ProgressObserver>,
    /// Index of the phase last applied, for transition logging
    last_phase: Option<usize>,
}

impl TimelineClock {
    /// Create a clock with the default easing
    ///
    /// The registry is put into its progress-0 layout immediately.
    pub fn new(
        schedule: PhaseSchedule,
        registry: EntityRegistry,
        duration_secs: f32,
    ) -> Result<Self> {
        Self::with_policy(schedule, PhasePolicy::default(), registry, duration_secs)
    }

    pub fn with_policy(
        schedule: PhaseSchedule,
        policy: PhasePolicy,
        registry: EntityRegistry,
        duration_secs: f32,
    ) -> Result<Self> {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(TimelineError::InvalidDuration(duration_secs));
        }
        policy.check(&schedule)?;

        let mut clock = Self {
            schedule,
            policy,
            registry,
            state: PlaybackState {
                progress: 0.0,
                is_playing: false,
                speed: 1.0,
                duration_secs,
            },
            observer: None,
            last_phase: None,
        };
        clock.update()?;

        debug!(
            entities = clock.registry.len(),
            phases = clock.schedule.len(),
            duration_secs,
            "timeline clock created"
        );
        Ok(clock)
    }

    /// Register the progress observer, replacing any previous one
    pub fn set_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&ProgressReport<'_>) + Send + 'static,
    {
        self.observer = Some(Box::new(observer));
    }

    /// Command surface for UI bindings
    pub fn controls(&mut self) -> PlaybackControls<'_> {
        PlaybackControls::new(self)
    }

    /// Advance by `delta_secs` of wall-clock time
    ///
    /// No-op while paused. Progress saturates at 1.0, which stops playback.
    pub fn tick(&mut self, delta_secs: f32) -> Result<()> {
        if !self.state.is_playing {
            return Ok(());
        }

        let delta_secs = if delta_secs.is_finite() {
            delta_secs.max(0.0)
        } else {
            0.0
        };

        let step = delta_secs as f64 * self.state.speed as f64 / self.state.duration_secs as f64;
        self.state.progress = (self.state.progress + step).min(1.0);

        if self.state.progress >= 1.0 {
            self.state.progress = 1.0;
            self.state.is_playing = false;
            info!("timeline finished");
        }

        trace!(progress = self.state.progress, delta_secs, "tick");
        self.update()
    }

    pub(crate) fn play(&mut self) {
        if self.state.progress >= 1.0 {
            warn!("play ignored at 100%, reset first");
            return;
        }
        if !self.state.is_playing {
            debug!(progress = self.state.progress, "play");
        }
        self.state.is_playing = true;
    }

    pub(crate) fn pause(&mut self) {
        if self.state.is_playing {
            debug!(progress = self.state.progress, "pause");
        }
        self.state.is_playing = false;
    }

    pub(crate) fn reset(&mut self) -> Result<()> {
        debug!("reset");
        self.state.progress = 0.0;
        self.state.is_playing = false;
        self.update()
    }

    pub(crate) fn set_speed(&mut self, multiplier: f32) -> Result<()> {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            warn!(multiplier, "rejected speed multiplier");
            return Err(TimelineError::InvalidSpeed(multiplier));
        }
        debug!(multiplier, "speed changed");
        self.state.speed = multiplier;
        Ok(())
    }

    /// Apply the policy at the current progress and notify the observer
    fn update(&mut self) -> Result<()> {
        let resolved = self
            .policy
            .apply(self.progress(), &self.schedule, &mut self.registry)?;

        if self.last_phase != Some(resolved.index) {
            info!(
                phase = %resolved.phase.name,
                progress = self.state.progress,
                "entered phase"
            );
            self.last_phase = Some(resolved.index);
        }

        if let Some(observer) = self.observer.as_mut() {
            observer(&ProgressReport {
                progress: self.state.progress as f32,
                phase: resolved.phase,
                local_fraction: resolved.local_fraction,
            });
        }

        Ok(())
    }

    pub fn progress(&self) -> f32 {
        self.state.progress as f32
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    pub fn speed(&self) -> f32 {
        self.state.speed
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn schedule(&self) -> &PhaseSchedule {
        &self.schedule
    }

    pub fn policy(&self) -> &PhasePolicy {
        &self.policy
    }

    /// Entities as last written by the policy
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn snapshot(&self) -> Vec<EntitySnapshot> {
        self.registry.snapshot()
    }

    /// Current progress readout
    pub fn report(&self) -> ProgressReport<'_> {
        let progress = self.progress();
        let resolved = self.schedule.resolve(progress);
        ProgressReport {
            progress,
            phase: resolved.phase,
            local_fraction: resolved.local_fraction,
        }
    }
}

impl fmt::Debug for TimelineClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineClock")
            .field("state", &self.state)
            .field("policy", &self.policy)
            .field("entities", &self.registry.len())
            .field("has_observer", &self.observer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;
    use crate::registry::{EntityDef, EntityKind};
    use std::sync::{Arc, Mutex};

    fn clock() -> TimelineClock {
        let registry = EntityRegistry::from_defs([
            EntityDef::plate("pacific", Vec3::ZERO, Vec3::new(-6.0, 0.0, -2.0)),
            EntityDef::shell("earth", EntityKind::Globe),
        ])
        .unwrap();
        TimelineClock::new(PhaseSchedule::default(), registry, 30.0).unwrap()
    }

    #[test]
    fn test_starts_separated_and_paused() {
        let clock = clock();
        assert_eq!(clock.progress(), 0.0);
        assert!(!clock.is_playing());
        assert_eq!(clock.speed(), 1.0);

        let plate = clock.registry().get("pacific").unwrap();
        assert_eq!(plate.position(), Vec3::new(-6.0, 0.0, -2.0));
        assert!(plate.is_visible());
    }

    #[test]
    fn test_tick_while_paused_is_noop() {
        let mut clock = clock();
        clock.tick(5.0).unwrap();
        assert_eq!(clock.progress(), 0.0);
    }

    #[test]
    fn test_tick_advances_by_speed_over_duration() {
        let mut clock = clock();
        clock.controls().play();
        clock.tick(3.0).unwrap();
        assert!((clock.progress() - 0.1).abs() < 1e-6);

        clock.controls().set_speed(2.0).unwrap();
        clock.tick(3.0).unwrap();
        assert!((clock.progress() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_progress_monotonic_and_capped() {
        let mut clock = clock();
        clock.controls().play();

        let mut prev = clock.progress();
        for _ in 0..4000 {
            clock.tick(1.0 / 60.0).unwrap();
            assert!(clock.progress() >= prev);
            assert!(clock.progress() <= 1.0);
            prev = clock.progress();
        }
        assert_eq!(clock.progress(), 1.0);
    }

    #[test]
    fn test_auto_stop_at_end() {
        let mut clock = clock();
        clock.controls().play();
        clock.tick(29.0).unwrap();
        assert!(clock.is_playing());

        clock.tick(5.0).unwrap();
        assert_eq!(clock.progress(), 1.0);
        assert!(!clock.is_playing());

        clock.tick(1.0).unwrap();
        assert_eq!(clock.progress(), 1.0);

        // Stuck at 100% until reset
        clock.controls().play();
        assert!(!clock.is_playing());
    }

    #[test]
    fn test_slow_speed_keeps_advancing_late_in_timeline() {
        let mut clock = clock();
        clock.controls().play();
        clock.tick(18.0).unwrap();
        let start = clock.progress();
        assert!((start - 0.6).abs() < 1e-6);

        clock.controls().set_speed(4e-5).unwrap();
        for _ in 0..100_000 {
            clock.tick(1.0 / 60.0).unwrap();
        }

        // 100k frames at 1/60s * 4e-5 / 30s per frame
        let gained = clock.progress() - start;
        assert!(gained > 0.0020 && gained < 0.0025, "gained {gained}");
        assert!(clock.is_playing());
    }

    #[test]
    fn test_negative_and_nan_delta_ignored() {
        let mut clock = clock();
        clock.controls().play();
        clock.tick(3.0).unwrap();
        let p = clock.progress();

        clock.tick(-10.0).unwrap();
        clock.tick(f32::NAN).unwrap();
        assert_eq!(clock.progress(), p);
    }

    #[test]
    fn test_observer_sees_each_update() {
        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink = reports.clone();

        let mut clock = clock();
        clock.set_observer(move |report| {
            sink.lock().unwrap().push((report.percent(), report.phase.name.clone()));
        });

        clock.controls().play();
        clock.tick(3.0).unwrap();
        clock.tick(12.0).unwrap();
        clock.controls().reset().unwrap();

        let reports = reports.lock().unwrap();
        assert_eq!(
            *reports,
            [
                (10, "separated".to_string()),
                (50, "converging".to_string()),
                (0, "separated".to_string()),
            ]
        );
    }

    #[test]
    fn test_report_display() {
        let mut clock = clock();
        clock.controls().play();
        clock.tick(21.0).unwrap();
        assert_eq!(clock.report().to_string(), "70% - Joining & merging");
    }

    #[test]
    fn test_invalid_duration() {
        for duration in [0.0, -1.0, f32::INFINITY, f32::NAN] {
            let err = TimelineClock::new(PhaseSchedule::default(), EntityRegistry::new(), duration)
                .unwrap_err();
            assert!(matches!(err, TimelineError::InvalidDuration(_)));
        }
    }

    #[test]
    fn test_unknown_phase_fails_at_construction() {
        let schedule = PhaseSchedule::new([
            Phase::new("separated", 0.0, 0.5),
            Phase::new("cooling", 0.5, 1.0),
        ])
        .unwrap();
        let err = TimelineClock::new(schedule, EntityRegistry::new(), 30.0).unwrap_err();
        assert_eq!(err, TimelineError::UnknownPhase("cooling".into()));
    }
}
