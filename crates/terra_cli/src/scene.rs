//! Scene assembly and headless frame loop

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, info};

use terra_animation::plates::{shell_defs, ATMOSPHERE_ID, CLOUDS_ID};
use terra_animation::{
    EntityDef, EntityRegistry, EntitySnapshot, Phase, PhasePolicy, PhaseSchedule, TimelineClock,
};

use crate::config::TerraConfig;

/// Longest run `FrameLoop::run` will attempt
const MAX_FRAMES: u64 = 10_000_000;

/// Build a ready-to-play clock from configuration
pub fn build_clock(config: &TerraConfig) -> Result<TimelineClock> {
    let schedule =
        PhaseSchedule::new(config.phases.iter().cloned()).context("Invalid [[phases]] table")?;

    let plates = config
        .plates
        .iter()
        .map(|p| EntityDef::plate(p.id.as_str(), p.rest, p.dispersed).with_meta(p.meta()));
    let shells = shell_defs().into_iter().filter(|def| match def.id.as_str() {
        ATMOSPHERE_ID => config.globe.atmosphere,
        CLOUDS_ID => config.globe.clouds,
        _ => true,
    });
    let registry = EntityRegistry::from_defs(plates.chain(shells)).context("Invalid scene")?;

    let policy = PhasePolicy::new(config.timeline.easing);
    let mut clock =
        TimelineClock::with_policy(schedule, policy, registry, config.timeline.duration_secs)?;
    clock.controls().set_speed(config.timeline.speed)?;

    Ok(clock)
}

/// How the frame loop produces deltas
#[derive(Debug, Clone, Copy)]
pub struct FrameLoop {
    pub fps: u32,
    /// Sleep between frames and feed measured wall-clock deltas
    pub realtime: bool,
}

/// Outcome of a simulation run
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub frames: u64,
    pub simulated_secs: f32,
    pub wall: Duration,
}

impl FrameLoop {
    /// Upper bound on frames for one full run at the clock's current speed
    fn frame_budget(&self, clock: &TimelineClock) -> Result<u64> {
        let state = clock.state();
        let secs = state.duration_secs as f64 / state.speed as f64;
        let frames = (secs * self.fps as f64 * 2.0).ceil() + 1.0;

        if !frames.is_finite() || frames > MAX_FRAMES as f64 {
            anyhow::bail!(
                "speed {} would need about {:.3e} frames at {} fps, the limit is {}",
                state.speed,
                frames,
                self.fps,
                MAX_FRAMES
            );
        }
        Ok(frames as u64)
    }

    /// Play the clock until it stops on its own
    pub fn run(&self, clock: &mut TimelineClock) -> Result<RunSummary> {
        let frame = Duration::from_secs_f32(1.0 / self.fps as f32);
        let budget = self.frame_budget(clock)?;
        let started = Instant::now();
        let mut last = started;
        let mut frames = 0;
        let mut simulated_secs = 0.0;

        clock.controls().play();
        while clock.is_playing() {
            if frames >= budget {
                anyhow::bail!(
                    "timeline still at {:.1}% after {} frames",
                    clock.progress() * 100.0,
                    frames
                );
            }

            let delta = if self.realtime {
                thread::sleep(frame);
                let now = Instant::now();
                let delta = (now - last).as_secs_f32();
                last = now;
                delta
            } else {
                frame.as_secs_f32()
            };

            clock.tick(delta)?;
            frames += 1;
            simulated_secs += delta;
        }

        let summary = RunSummary {
            frames,
            simulated_secs,
            wall: started.elapsed(),
        };
        info!(
            frames = summary.frames,
            simulated_secs = summary.simulated_secs,
            "simulation finished"
        );
        Ok(summary)
    }
}

/// State of the scene at an arbitrary progress value
#[derive(Debug, Clone)]
pub struct Scrubbed {
    pub phase: Phase,
    pub local_fraction: f32,
    pub snapshot: Vec<EntitySnapshot>,
}

/// Evaluate the scene at `progress` without playing the timeline
pub fn scrub(config: &TerraConfig, progress: f32) -> Result<Scrubbed> {
    let clock = build_clock(config)?;
    let mut registry = clock.registry().clone();
    let resolved = clock
        .policy()
        .apply(progress, clock.schedule(), &mut registry)?;
    debug!(phase = %resolved.phase.name, progress, "scrubbed");

    Ok(Scrubbed {
        phase: resolved.phase.clone(),
        local_fraction: resolved.local_fraction,
        snapshot: registry.snapshot(),
    })
}

/// Plain-text table of a snapshot
pub fn format_snapshot(snapshot: &[EntitySnapshot]) -> String {
    let mut out = format!(
        "{:<18} {:<11} {:<18} {:<8} {:>24} {:>8} {:>8}\n",
        "entity", "kind", "label", "color", "position", "opacity", "visible"
    );
    for e in snapshot {
        let kind = format!("{:?}", e.kind).to_lowercase();
        let position = format!(
            "({:.2}, {:.2}, {:.2})",
            e.position.x, e.position.y, e.position.z
        );
        out.push_str(&format!(
            "{:<18} {:<11} {:<18} {:<8} {:>24} {:>8.3} {:>8}\n",
            e.id,
            kind,
            e.meta.caption().unwrap_or("-"),
            e.meta.color.as_deref().unwrap_or("-"),
            position,
            e.opacity,
            e.visible
        ));
    }
    out
}
