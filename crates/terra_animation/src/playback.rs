//! Playback controls
//!
//! The only way UI code changes playback. Borrowed from a [`TimelineClock`]
//! for the duration of one command, holds no state of its own.

use crate::clock::TimelineClock;
use crate::error::Result;

/// Play / pause / reset / speed commands for a timeline clock
pub struct PlaybackControls<'a> {
    clock: &'a mut TimelineClock,
}

impl<'a> PlaybackControls<'a> {
    pub(crate) fn new(clock: &'a mut TimelineClock) -> Self {
        Self { clock }
    }

    /// Start or resume; ignored once progress has reached 100%
    pub fn play(&mut self) {
        self.clock.play();
    }

    /// Stop advancing, keeping the current progress
    pub fn pause(&mut self) {
        self.clock.pause();
    }

    /// Rewind to 0 and stop; the registry is updated before this returns
    pub fn reset(&mut self) -> Result<()> {
        self.clock.reset()
    }

    /// Change the playback rate; rejected values leave the old rate in place
    pub fn set_speed(&mut self, multiplier: f32) -> Result<()> {
        self.clock.set_speed(multiplier)
    }

    pub fn progress(&self) -> f32 {
        self.clock.progress()
    }
}

#[cfg(test)]
mod tests {
    use crate::error::TimelineError;
    use crate::registry::EntityRegistry;
    use crate::schedule::PhaseSchedule;
    use crate::TimelineClock;

    fn clock() -> TimelineClock {
        TimelineClock::new(PhaseSchedule::default(), EntityRegistry::new(), 10.0).unwrap()
    }

    #[test]
    fn test_redundant_commands_are_noops() {
        let mut clock = clock();

        clock.controls().pause();
        assert!(!clock.is_playing());

        clock.controls().play();
        clock.controls().play();
        assert!(clock.is_playing());

        clock.tick(1.0).unwrap();
        let mut controls = clock.controls();
        controls.pause();
        controls.pause();
        assert!((controls.progress() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_rejected_speed_keeps_previous() {
        let mut clock = clock();
        clock.controls().set_speed(1.5).unwrap();

        for bad in [0.0, -2.0, f32::NAN, f32::INFINITY] {
            let err = clock.controls().set_speed(bad).unwrap_err();
            assert!(matches!(err, TimelineError::InvalidSpeed(_)));
        }
        assert_eq!(clock.speed(), 1.5);
    }

    #[test]
    fn test_reset_then_play_again() {
        let mut clock = clock();
        clock.controls().play();
        clock.tick(20.0).unwrap();
        assert_eq!(clock.progress(), 1.0);

        let mut controls = clock.controls();
        controls.reset().unwrap();
        controls.play();
        assert_eq!(controls.progress(), 0.0);
        assert!(clock.is_playing());
    }
}
