pub mod canopy;
pub mod engine;
pub mod hash;
pub mod hud;
pub mod pruning;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod systems;
pub mod tree;
pub mod web;
pub mod world;

pub use engine::{Engine, EngineBuilder, EngineSettings};
pub use scenario::{Scenario, ScenarioLoader, Tuning};
pub use tree::{generate, BranchGenerator, BranchNode};
pub use world::{InputEvent, LifeStage, Viewport, World};
