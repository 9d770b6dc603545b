//! Interpolation policy
//!
//! Four-state machine over {separated, converging, merging, complete}. The
//! state is derived from progress alone, so applying the same progress twice
//! always leaves the registry in the same state.
//!
//! | phase      | plates                          | globe              | atmosphere / clouds |
//! |------------|---------------------------------|--------------------|---------------------|
//! | separated  | at dispersed position, opaque   | hidden             | hidden              |
//! | converging | eased lerp dispersed -> rest    | hidden             | hidden              |
//! | merging    | at rest, fading out             | visible, fading in | hidden              |
//! | complete   | hidden                          | opaque             | visible             |

use std::f32::consts::TAU;

use tracing::error;

use crate::easing::Easing;
use crate::error::{Result, TimelineError};
use crate::math::Vec3;
use crate::registry::{Entity, EntityKind, EntityRegistry, Uniforms};
use crate::schedule::{PhaseSchedule, Resolved};

/// The phases the policy has blending rules for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    Separated,
    Converging,
    Merging,
    Complete,
}

impl PhaseKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "separated" => Some(PhaseKind::Separated),
            "converging" => Some(PhaseKind::Converging),
            "merging" => Some(PhaseKind::Merging),
            "complete" => Some(PhaseKind::Complete),
            _ => None,
        }
    }
}

/// Render state computed for one entity
#[derive(Clone, Copy, Debug, PartialEq)]
struct Target {
    position: Vec3,
    opacity: f32,
    visible: bool,
    uniforms: Uniforms,
}

/// Computes every entity's render state from timeline progress
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PhasePolicy {
    easing: Easing,
}

impl PhasePolicy {
    pub fn new(easing: Easing) -> Self {
        Self { easing }
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    /// Fail if any phase in `schedule` has no blending rule
    pub fn check(&self, schedule: &PhaseSchedule) -> Result<()> {
        match schedule
            .phases()
            .iter()
            .find(|p| PhaseKind::from_name(&p.name).is_none())
        {
            Some(phase) => Err(TimelineError::UnknownPhase(phase.name.clone())),
            None => Ok(()),
        }
    }

    /// Write the state for `progress` into every entity of `registry`
    ///
    /// On error the registry is left untouched.
    pub fn apply<'s>(
        &self,
        progress: f32,
        schedule: &'s PhaseSchedule,
        registry: &mut EntityRegistry,
    ) -> Result<Resolved<'s>> {
        let resolved = schedule.resolve(progress);

        let Some(kind) = PhaseKind::from_name(&resolved.phase.name) else {
            error!(phase = %resolved.phase.name, "no interpolation rule for phase");
            return Err(TimelineError::UnknownPhase(resolved.phase.name.clone()));
        };

        let eased = self.easing.apply(resolved.local_fraction);

        for entity in registry.all_mut() {
            let target = Self::target(entity, kind, resolved.local_fraction, eased);
            entity.position = target.position;
            entity.opacity = target.opacity;
            entity.visible = target.visible;
            entity.uniforms = target.uniforms;
        }

        Ok(resolved)
    }

    fn target(entity: &Entity, phase: PhaseKind, local: f32, eased: f32) -> Target {
        let rest = entity.rest_position();
        let hidden = Target {
            position: rest,
            opacity: 0.0,
            visible: false,
            uniforms: Uniforms::default(),
        };

        match (entity.kind(), phase) {
            (EntityKind::Plate, PhaseKind::Separated) => Target {
                position: entity.dispersed_position(),
                opacity: 1.0,
                visible: true,
                uniforms: Uniforms::default(),
            },
            (EntityKind::Plate, PhaseKind::Converging) => Target {
                position: entity.dispersed_position().lerp(rest, eased),
                opacity: 1.0,
                visible: true,
                uniforms: Uniforms::default(),
            },
            (EntityKind::Plate, PhaseKind::Merging) => Target {
                position: rest,
                opacity: 1.0 - eased,
                visible: true,
                uniforms: Uniforms {
                    transparent: true,
                    sun_direction: None,
                },
            },
            (EntityKind::Plate, PhaseKind::Complete) => hidden,

            (EntityKind::Globe, PhaseKind::Merging) => Target {
                opacity: eased,
                visible: true,
                uniforms: Uniforms {
                    transparent: true,
                    sun_direction: None,
                },
                ..hidden
            },
            (EntityKind::Globe, PhaseKind::Complete) => Target {
                opacity: 1.0,
                visible: true,
                ..hidden
            },

            (EntityKind::Atmosphere, PhaseKind::Complete) => Target {
                opacity: 1.0,
                visible: true,
                uniforms: Uniforms {
                    transparent: false,
                    sun_direction: Some(sun_orbit(local)),
                },
                ..hidden
            },
            (EntityKind::Clouds, PhaseKind::Complete) => Target {
                opacity: 1.0,
                visible: true,
                ..hidden
            },

            (EntityKind::Globe | EntityKind::Atmosphere | EntityKind::Clouds, _) => hidden,
        }
    }
}

/// Sun direction sweeping one full orbit across the complete phase
fn sun_orbit(local: f32) -> Vec3 {
    let angle = local * TAU;
    Vec3::new(angle.cos(), 0.3, angle.sin())
}
