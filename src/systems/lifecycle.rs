use anyhow::Result;
use rand::Rng;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::{LifeStage, World},
};

use super::regeneration::{saplings_ready, spawn_saplings};

const SPROUT_AT: f64 = 0.18;
const YOUNG_AT: f64 = 0.42;
const MATURE_AT: f64 = 0.66;
const FRUIT_AT: f64 = 0.82;
const FRUIT_MIN_MS: f64 = 6_000.0;
const FRUIT_MAX_MS: f64 = 32_000.0;
const SEED_FALL_BELOW: f64 = 0.30;
const DECLINE_FLOOR: f64 = 0.24;
const REBIRTH_AFTER_MS: f64 = 18_000.0;

/// Drives the eight-stage life cycle. Runs once per frame after the climate
/// has been integrated and performs at most one transition.
pub struct LifecycleSystem;

impl LifecycleSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LifecycleSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for LifecycleSystem {
    fn name(&self) -> &str {
        "lifecycle"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let elapsed = ctx.elapsed_ms;
        let tuning = ctx.tuning;
        world.stage.stage_timer += elapsed;
        if !world.stage.current.spawns_saplings() {
            world.stage.regen_countdown = 0.0;
        }
        let growth = world.climate.growth;
        let timer = world.stage.stage_timer;
        let viewport = world.viewport();
        let current = world.stage.current;

        let next = match current {
            LifeStage::Seed => (growth > SPROUT_AT).then_some(LifeStage::Sprout),
            LifeStage::Sprout => (growth > YOUNG_AT).then_some(LifeStage::Young),
            LifeStage::Young => (growth > MATURE_AT).then_some(LifeStage::Mature),
            LifeStage::Mature => {
                (growth > FRUIT_AT && timer > FRUIT_MIN_MS).then_some(LifeStage::Fruit)
            }
            LifeStage::Fruit => {
                let withered = rng.gen_bool((elapsed * tuning.fruit_decline_chance).clamp(0.0, 1.0));
                (timer > FRUIT_MAX_MS || withered).then_some(LifeStage::Decline)
            }
            LifeStage::Decline => {
                let pulled = world.climate.target_growth - elapsed * tuning.decline_pull;
                world.climate.target_growth = pulled.max(DECLINE_FLOOR);
                (growth < SEED_FALL_BELOW).then_some(LifeStage::SeedFall)
            }
            LifeStage::SeedFall => {
                world.stage.regen_countdown += elapsed;
                if world.saplings.is_empty() {
                    world.saplings =
                        spawn_saplings(&mut world.fruits_ripened, viewport, tuning, rng);
                    log::info!("{} saplings took root", world.saplings.len());
                }
                (world.stage.regen_countdown > REBIRTH_AFTER_MS).then_some(LifeStage::Rebirth)
            }
            LifeStage::Rebirth => {
                world.stage.regen_countdown += elapsed;
                if world.saplings.is_empty() {
                    world.saplings =
                        spawn_saplings(&mut world.fruits_ripened, viewport, tuning, rng);
                    log::info!("{} saplings took root", world.saplings.len());
                }
                if saplings_ready(&world.saplings) {
                    let seed = rng.gen_range(1.0..100_000.0);
                    world.regenerate_tree(seed, tuning);
                    log::info!(
                        "generation {} grown from seed {seed:.2} ({} branches)",
                        world.generation,
                        world.tree.node_count()
                    );
                    Some(LifeStage::Sprout)
                } else {
                    None
                }
            }
        };

        if let Some(next) = next {
            log::info!(
                "stage {} -> {} at growth {:.3} after {:.0} ms",
                current.label(),
                next.label(),
                growth,
                timer
            );
            world.stage.enter(next);
        }
        Ok(())
    }
}
