use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    canopy::{DrawCommand, Point, Segment, Trace},
    hud::Hud,
    scenario::Tuning,
    tree::{BranchGenerator, BranchNode},
};

pub const MAX_GROWTH: f64 = 1.08;
pub const MAX_HYDRATION: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SurfaceError {
    #[error("viewport must have finite, positive dimensions (got {width}x{height})")]
    InvalidViewport { width: f64, height: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Result<Self, SurfaceError> {
        if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
            Ok(Self { width, height })
        } else {
            Err(SurfaceError::InvalidViewport { width, height })
        }
    }

    pub fn ground_y(&self) -> f64 {
        self.height * 0.9
    }

    pub fn trunk_base(&self) -> Point {
        Point::new(self.width * 0.5, self.ground_y())
    }

    /// Pixels per unit of branch length at full growth.
    pub fn branch_scale(&self) -> f64 {
        (self.height * 0.2).min(self.width * 0.28)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateState {
    pub growth: f64,
    pub target_growth: f64,
    pub hydration: f64,
    pub wind: f64,
    pub wind_target: f64,
    pub season: f64,
    pub simulated_age: f64,
    pub next_pulse_at: f64,
}

impl ClimateState {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            growth: tuning.start_growth,
            target_growth: tuning.start_target,
            hydration: 0.0,
            wind: 0.0,
            wind_target: 0.0,
            season: 0.0,
            simulated_age: 0.0,
            next_pulse_at: tuning.pulse_min_ms,
        }
    }

    /// Low starting point for a reborn tree. Season keeps running.
    pub fn reset_for_rebirth(&mut self, tuning: &Tuning) {
        self.growth = tuning.rebirth_growth;
        self.target_growth = tuning.rebirth_target;
        self.hydration = 0.0;
        self.simulated_age = 0.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeStage {
    Seed,
    Sprout,
    Young,
    Mature,
    Fruit,
    Decline,
    SeedFall,
    Rebirth,
}

impl LifeStage {
    pub fn label(self) -> &'static str {
        match self {
            LifeStage::Seed => "seed",
            LifeStage::Sprout => "sprout",
            LifeStage::Young => "young",
            LifeStage::Mature => "mature",
            LifeStage::Fruit => "fruit",
            LifeStage::Decline => "decline",
            LifeStage::SeedFall => "seed_fall",
            LifeStage::Rebirth => "rebirth",
        }
    }

    pub fn mood(self) -> &'static str {
        match self {
            LifeStage::Seed => "Dormant, waiting under the soil",
            LifeStage::Sprout => "A curious sprout reaching for light",
            LifeStage::Young => "Young and restless",
            LifeStage::Mature => "Broad, calm and steady",
            LifeStage::Fruit => "Heavy with fruit",
            LifeStage::Decline => "Tired, leaves turning dry",
            LifeStage::SeedFall => "Scattering its seeds",
            LifeStage::Rebirth => "Saplings racing skyward",
        }
    }

    pub fn permits_fruiting(self) -> bool {
        self == LifeStage::Fruit
    }

    pub fn shows_fruit(self) -> bool {
        matches!(self, LifeStage::Fruit | LifeStage::Decline)
    }

    pub fn shows_leaves(self) -> bool {
        matches!(
            self,
            LifeStage::Young | LifeStage::Mature | LifeStage::Fruit | LifeStage::Decline
        )
    }

    pub fn spawns_saplings(self) -> bool {
        matches!(self, LifeStage::SeedFall | LifeStage::Rebirth)
    }

    /// Multiplier applied to the periodic growth pulse.
    pub fn pulse_weight(self) -> f64 {
        match self {
            LifeStage::Seed => 1.2,
            LifeStage::Sprout => 1.1,
            LifeStage::Young => 1.0,
            LifeStage::Mature => 0.7,
            LifeStage::Fruit => 0.3,
            LifeStage::Decline | LifeStage::SeedFall => 0.0,
            LifeStage::Rebirth => 0.5,
        }
    }

    /// How far branch and leaf colors are pulled toward dry brown.
    pub fn decline_tint(self, growth: f64) -> f64 {
        match self {
            LifeStage::Decline => ((0.82 - growth) / 0.52).clamp(0.0, 1.0),
            LifeStage::SeedFall | LifeStage::Rebirth => 1.0,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageClock {
    pub current: LifeStage,
    pub stage_timer: f64,
    pub regen_countdown: f64,
    pub transitions: u64,
}

impl StageClock {
    pub fn new() -> Self {
        Self {
            current: LifeStage::Seed,
            stage_timer: 0.0,
            regen_countdown: 0.0,
            transitions: 0,
        }
    }

    pub fn enter(&mut self, next: LifeStage) {
        self.current = next;
        self.stage_timer = 0.0;
        self.transitions += 1;
        if !next.spawns_saplings() {
            self.regen_countdown = 0.0;
        }
    }
}

impl Default for StageClock {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sapling {
    pub position: Point,
    pub growth: f64,
    pub sway_phase: f64,
    pub sway_amplitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SawState {
    pub position: Point,
    pub active: bool,
    /// Set by pointer-down and consumed by the next cut attempt, so a tap
    /// released within the same frame still cuts.
    #[serde(default)]
    pub pending_cut: bool,
    pub last_cut: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub position: Point,
    pub velocity: Point,
    pub life_ms: f64,
    pub max_life_ms: f64,
    pub size: f64,
}

impl Particle {
    pub fn alpha(&self) -> f64 {
        if self.max_life_ms <= 0.0 {
            0.0
        } else {
            (self.life_ms / self.max_life_ms).clamp(0.0, 1.0)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Particles {
    pub sawdust: Vec<Particle>,
    pub trail: Vec<Particle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub text: String,
    pub expires_at: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp,
    Water,
    Resize { width: f64, height: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub scenario: String,
    pub frame: u64,
    pub now_ms: f64,
    pub generation: u64,
    pub viewport: Viewport,
    pub stage: LifeStage,
    pub stage_timer_ms: f64,
    pub climate: ClimateState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree: Option<BranchNode>,
    pub saplings: Vec<Sapling>,
    pub segments: Vec<Segment>,
    pub draws: Vec<DrawCommand>,
    pub particles: Particles,
    pub saw: SawState,
    pub fruits_ripened: u32,
    pub hud: Hud,
}

pub struct World {
    frame: u64,
    now_ms: f64,
    max_depth: u32,
    viewport: Viewport,
    generator: BranchGenerator,
    inputs: Vec<InputEvent>,
    pub(crate) generation: u64,
    pub(crate) tree: BranchNode,
    pub(crate) climate: ClimateState,
    pub(crate) stage: StageClock,
    pub(crate) saplings: Vec<Sapling>,
    pub(crate) fruits_ripened: u32,
    pub(crate) saw: SawState,
    pub(crate) particles: Particles,
    pub(crate) trace: Trace,
    pub(crate) feedback: Option<Feedback>,
    pub(crate) water_requests: u32,
    pub(crate) fps: f64,
    pub(crate) hud: Hud,
}

impl World {
    pub fn new(viewport: Viewport, max_depth: u32, root_seed: f64, tuning: &Tuning) -> Self {
        let mut generator = BranchGenerator::new(0);
        let tree = generator.generate(root_seed, max_depth);
        Self {
            frame: 0,
            now_ms: 0.0,
            max_depth,
            viewport,
            generator,
            inputs: Vec::new(),
            generation: 0,
            tree,
            climate: ClimateState::new(tuning),
            stage: StageClock::new(),
            saplings: Vec::new(),
            fruits_ripened: 0,
            saw: SawState::default(),
            particles: Particles::default(),
            trace: Trace::default(),
            feedback: None,
            water_requests: 0,
            fps: 0.0,
            hud: Hud::default(),
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Advances the frame counter and the simulated clock.
    pub fn begin_frame(&mut self, elapsed_ms: f64) {
        self.frame += 1;
        self.now_ms += elapsed_ms;
    }

    pub fn queue_input(&mut self, event: InputEvent) {
        self.inputs.push(event);
    }

    pub(crate) fn drain_inputs(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.inputs)
    }

    pub fn pointer_down(&mut self, position: Point) {
        self.saw.active = true;
        self.saw.pending_cut = true;
        self.saw.position = position;
    }

    pub fn pointer_move(&mut self, position: Point) {
        self.saw.position = position;
    }

    pub fn pointer_up(&mut self) {
        self.saw.active = false;
    }

    /// Requests a watering; the climate system applies it on the next frame.
    pub fn water(&mut self) {
        self.water_requests += 1;
    }

    /// Discards the tree and every derived layer, then rebuilds for the new
    /// viewport from `root_seed`.
    pub fn resize(
        &mut self,
        width: f64,
        height: f64,
        root_seed: f64,
        tuning: &Tuning,
    ) -> Result<(), SurfaceError> {
        let viewport = Viewport::new(width, height)?;
        self.viewport = viewport;
        self.tree = self.generator.generate(root_seed, self.max_depth);
        self.generation += 1;
        self.climate = ClimateState {
            next_pulse_at: self.now_ms + tuning.pulse_min_ms,
            ..ClimateState::new(tuning)
        };
        self.stage = StageClock::new();
        self.saplings.clear();
        self.fruits_ripened = 0;
        self.saw = SawState::default();
        self.particles = Particles::default();
        self.trace = Trace::default();
        self.feedback = None;
        self.water_requests = 0;
        Ok(())
    }

    /// Replaces the tree with a freshly generated one after a completed
    /// sapling cycle.
    pub(crate) fn regenerate_tree(&mut self, root_seed: f64, tuning: &Tuning) {
        self.tree = self.generator.generate(root_seed, self.max_depth);
        self.generation += 1;
        self.saplings.clear();
        self.climate.reset_for_rebirth(tuning);
    }

    pub fn tree(&self) -> &BranchNode {
        &self.tree
    }

    pub fn climate(&self) -> &ClimateState {
        &self.climate
    }

    pub fn climate_mut(&mut self) -> &mut ClimateState {
        &mut self.climate
    }

    pub fn stage(&self) -> LifeStage {
        self.stage.current
    }

    pub fn stage_clock(&self) -> &StageClock {
        &self.stage
    }

    pub fn stage_clock_mut(&mut self) -> &mut StageClock {
        &mut self.stage
    }

    pub fn saplings(&self) -> &[Sapling] {
        &self.saplings
    }

    pub fn saplings_mut(&mut self) -> &mut Vec<Sapling> {
        &mut self.saplings
    }

    pub fn fruits_ripened(&self) -> u32 {
        self.fruits_ripened
    }

    pub fn saw(&self) -> &SawState {
        &self.saw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.trace.segments
    }

    pub fn draws(&self) -> &[DrawCommand] {
        &self.trace.draws
    }

    pub fn particles(&self) -> &Particles {
        &self.particles
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn hud(&self) -> &Hud {
        &self.hud
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn snapshot(&self, scenario: &str, include_tree: bool) -> FrameSnapshot {
        FrameSnapshot {
            scenario: scenario.to_string(),
            frame: self.frame,
            now_ms: self.now_ms,
            generation: self.generation,
            viewport: self.viewport,
            stage: self.stage.current,
            stage_timer_ms: self.stage.stage_timer,
            climate: self.climate.clone(),
            tree: include_tree.then(|| self.tree.clone()),
            saplings: self.saplings.clone(),
            segments: self.trace.segments.clone(),
            draws: self.trace.draws.clone(),
            particles: self.particles.clone(),
            saw: self.saw.clone(),
            fruits_ripened: self.fruits_ripened,
            hud: self.hud.clone(),
        }
    }
}
