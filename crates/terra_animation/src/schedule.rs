//! Phase schedule
//!
//! Splits timeline progress `[0, 1]` into contiguous named phases and maps a
//! progress value to its phase plus the fraction travelled inside it.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{Result, TimelineError};

/// Boundary equality tolerance for contiguity checks
const BOUNDARY_EPSILON: f32 = 1e-6;

/// A named sub-interval of the timeline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    /// Human-readable text for progress readouts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub start: f32,
    pub end: f32,
}

impl Phase {
    pub fn new(name: impl Into<String>, start: f32, end: f32) -> Self {
        Self {
            name: name.into(),
            label: None,
            start,
            end,
        }
    }

    /// Builder: set the readout label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Label for readouts, falling back to the phase name
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn span(&self) -> f32 {
        self.end - self.start
    }
}

/// Result of resolving a progress value
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolved<'a> {
    pub phase: &'a Phase,
    /// Position of the phase in the schedule
    pub index: usize,
    /// Fraction travelled inside the phase, in `[0, 1]`
    pub local_fraction: f32,
}

/// Ordered, contiguous phases covering `[0, 1]`
#[derive(Clone, Debug, PartialEq)]
pub struct PhaseSchedule {
    phases: SmallVec<[Phase; 4]>,
}

impl PhaseSchedule {
    /// Validate and build a schedule
    ///
    /// Phases must be non-empty intervals, in increasing order, each starting
    /// where the previous ended, with the first at 0 and the last at 1.
    pub fn new(phases: impl IntoIterator<Item = Phase>) -> Result<Self> {
        let phases: SmallVec<[Phase; 4]> = phases.into_iter().collect();

        let (Some(first), Some(last)) = (phases.first(), phases.last()) else {
            return Err(TimelineError::InvalidSchedule("no phases".into()));
        };

        if (first.start - 0.0).abs() > BOUNDARY_EPSILON {
            return Err(TimelineError::InvalidSchedule(format!(
                "first phase '{}' starts at {} instead of 0",
                first.name, first.start
            )));
        }

        if (last.end - 1.0).abs() > BOUNDARY_EPSILON {
            return Err(TimelineError::InvalidSchedule(format!(
                "last phase '{}' ends at {} instead of 1",
                last.name, last.end
            )));
        }

        for phase in &phases {
            if !phase.start.is_finite() || !phase.end.is_finite() || phase.start >= phase.end {
                return Err(TimelineError::InvalidSchedule(format!(
                    "phase '{}' has empty or reversed range {}..{}",
                    phase.name, phase.start, phase.end
                )));
            }
        }

        for pair in phases.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if (prev.end - next.start).abs() > BOUNDARY_EPSILON {
                let kind = if next.start > prev.end { "gap" } else { "overlap" };
                return Err(TimelineError::InvalidSchedule(format!(
                    "{} between '{}' (ends {}) and '{}' (starts {})",
                    kind, prev.name, prev.end, next.name, next.start
                )));
            }
        }

        for (i, phase) in phases.iter().enumerate() {
            if phases[..i].iter().any(|p| p.name == phase.name) {
                return Err(TimelineError::InvalidSchedule(format!(
                    "phase '{}' listed twice",
                    phase.name
                )));
            }
        }

        Ok(Self { phases })
    }

    /// Map progress to its phase and the local fraction inside it
    ///
    /// Progress is clamped to `[0, 1]` (NaN reads as 0). Each phase owns
    /// `[start, end)`, except the last which also owns 1.0.
    pub fn resolve(&self, progress: f32) -> Resolved<'_> {
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };

        let last = self.phases.len() - 1;
        let index = self
            .phases
            .iter()
            .position(|p| progress < p.end)
            .unwrap_or(last)
            .min(last);

        let phase = &self.phases[index];
        let local_fraction = ((progress - phase.start) / phase.span()).clamp(0.0, 1.0);

        Resolved {
            phase,
            index,
            local_fraction,
        }
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Look up a phase by name
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}

impl Default for PhaseSchedule {
    /// Separated 0-30%, converging 30-60%, merging 60-85%, complete 85-100%
    fn default() -> Self {
        Self {
            phases: SmallVec::from_buf([
                Phase::new("separated", 0.0, 0.3).with_label("Plates separated"),
                Phase::new("converging", 0.3, 0.6).with_label("Moving & converging"),
                Phase::new("merging", 0.6, 0.85).with_label("Joining & merging"),
                Phase::new("complete", 0.85, 1.0).with_label("Complete Earth"),
            ]),
        }
    }
}
