//! Terra Timeline Core
//!
//! Phased interpolation of visual entities for the "plates assemble into
//! Earth" scene.
//!
//! # Features
//!
//! - **Entity Registry**: plain data table of plates and globe shells, read by the renderer
//! - **Phase Schedule**: contiguous named phases covering progress `[0, 1]`
//! - **Interpolation Policy**: pure function from progress to entity state
//! - **Clock**: advances progress from frame deltas, auto-stops at 100%
//! - **Playback Controls**: play / pause / reset / set-speed command surface
//!
//! # Example
//!
//! ```rust
//! use terra_animation::{plates, PhaseSchedule, TimelineClock};
//!
//! let registry = plates::default_registry().unwrap();
//! let mut clock = TimelineClock::new(PhaseSchedule::default(), registry, 30.0).unwrap();
//!
//! clock.controls().play();
//! clock.tick(1.0 / 60.0).unwrap();
//! assert!(clock.progress() > 0.0);
//! ```

pub mod clock;
pub mod easing;
pub mod error;
pub mod math;
pub mod playback;
pub mod plates;
pub mod policy;
pub mod registry;
pub mod schedule;

pub use clock::{PlaybackState, ProgressObserver, ProgressReport, TimelineClock};
pub use easing::Easing;
pub use error::{Result, TimelineError};
pub use math::Vec3;
pub use playback::PlaybackControls;
pub use policy::{PhaseKind, PhasePolicy};
pub use registry::{
    Capabilities, Entity, EntityDef, EntityId, EntityKey, EntityKind, EntityMeta,
    EntityRegistry, EntitySnapshot, Uniforms,
};
pub use schedule::{Phase, PhaseSchedule, Resolved};
