use std::path::PathBuf;

use anyhow::Result;
use rand::Rng;

use crate::{
    rng::{RngManager, SystemRng},
    scenario::Tuning,
    snapshot::SnapshotWriter,
    systems::{
        BookkeepingSystem, CanopySystem, ClimateSystem, FruitingSystem, LifecycleSystem,
        ParticleSystem, RegenerationSystem, RegrowthSystem, SawSystem,
    },
    world::{FrameSnapshot, InputEvent, World},
};

/// Frame time is clamped into this window before any system sees it, so a
/// backgrounded tab or a stalled host cannot produce a runaway step.
pub const MIN_FRAME_MS: f64 = 8.0;
pub const MAX_FRAME_MS: f64 = 120.0;

pub fn clamp_elapsed(elapsed_ms: f64) -> f64 {
    if elapsed_ms.is_finite() {
        elapsed_ms.clamp(MIN_FRAME_MS, MAX_FRAME_MS)
    } else {
        MIN_FRAME_MS
    }
}

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub snapshot_interval_frames: u64,
    pub snapshot_dir: PathBuf,
    pub tuning: Tuning,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    /// Registers the full garden pipeline in frame order.
    pub fn with_garden_systems(self) -> Self {
        self.with_system(ClimateSystem::new())
            .with_system(LifecycleSystem::new())
            .with_system(RegenerationSystem::new())
            .with_system(RegrowthSystem::new())
            .with_system(FruitingSystem::new())
            .with_system(CanopySystem::new())
            .with_system(SawSystem::new())
            .with_system(ParticleSystem::new())
            .with_system(BookkeepingSystem::new())
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            snapshot_writer: SnapshotWriter::new(
                &self.settings.snapshot_dir,
                self.settings.snapshot_interval_frames,
            ),
            settings: self.settings,
        }
    }
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    snapshot_writer: SnapshotWriter,
    settings: EngineSettings,
}

impl Engine {
    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }

    /// Runs one frame: queued input first, then every system in order.
    pub fn frame(&mut self, world: &mut World, elapsed_ms: f64) -> Result<()> {
        let elapsed = clamp_elapsed(elapsed_ms);
        world.begin_frame(elapsed);

        for event in world.drain_inputs() {
            self.apply_input(world, event);
        }

        let ctx = SystemContext {
            frame: world.frame(),
            now_ms: world.now_ms(),
            elapsed_ms: elapsed,
            raw_elapsed_ms: elapsed_ms,
            tuning: &self.settings.tuning,
            scenario_name: &self.settings.scenario_name,
        };
        for system in &mut self.systems {
            let mut rng_stream = self.rng.stream(system.name());
            system.run(&ctx, world, &mut rng_stream)?;
        }

        self.snapshot_writer
            .maybe_write(world, &self.settings.scenario_name)?;
        Ok(())
    }

    pub fn run(&mut self, world: &mut World, frames: u64, frame_ms: f64) -> Result<()> {
        for _ in 0..frames {
            self.frame(world, frame_ms)?;
        }
        Ok(())
    }

    pub fn run_with_hook<F>(
        &mut self,
        world: &mut World,
        frames: u64,
        frame_ms: f64,
        mut hook: F,
    ) -> Result<()>
    where
        F: FnMut(FrameSnapshot),
    {
        for _ in 0..frames {
            self.frame(world, frame_ms)?;
            hook(world.snapshot(&self.settings.scenario_name, false));
        }
        Ok(())
    }

    fn apply_input(&mut self, world: &mut World, event: InputEvent) {
        match event {
            InputEvent::PointerDown { x, y } => world.pointer_down((x, y).into()),
            InputEvent::PointerMove { x, y } => world.pointer_move((x, y).into()),
            InputEvent::PointerUp => world.pointer_up(),
            InputEvent::Water => world.water(),
            InputEvent::Resize { width, height } => {
                let seed = self.rng.stream("viewport").gen_range(1.0..100_000.0);
                match world.resize(width, height, seed, &self.settings.tuning) {
                    Ok(()) => log::info!(
                        "viewport resized to {width}x{height}; regrowing from seed {seed:.2}"
                    ),
                    Err(err) => log::warn!("ignoring resize: {err}"),
                }
            }
        }
    }
}

pub struct SystemContext<'a> {
    pub frame: u64,
    pub now_ms: f64,
    /// Clamped frame time every system integrates with.
    pub elapsed_ms: f64,
    /// Unclamped host frame time, only used for the frame-rate readout.
    pub raw_elapsed_ms: f64,
    pub tuning: &'a Tuning,
    pub scenario_name: &'a str,
}

pub trait System: Send {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()>;
}
