use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    hud::Hud,
    rng::SystemRng,
    tree::MAX_RIPENESS,
    world::{World, MAX_GROWTH, MAX_HYDRATION},
};

const FPS_SMOOTHING: f64 = 0.1;

/// End-of-frame housekeeping: keeps every scalar in range, expires the
/// feedback message and refreshes the overlay text.
pub struct BookkeepingSystem;

impl BookkeepingSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BookkeepingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for BookkeepingSystem {
    fn name(&self) -> &str {
        "bookkeeping"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let climate = &mut world.climate;
        climate.growth = climate.growth.clamp(0.0, MAX_GROWTH);
        climate.target_growth = climate.target_growth.clamp(0.0, MAX_GROWTH);
        climate.hydration = climate.hydration.clamp(0.0, MAX_HYDRATION);
        climate.wind = climate.wind.clamp(-1.0, 1.0);
        climate.wind_target = climate.wind_target.clamp(-1.0, 1.0);

        world.tree.visit_mut(&mut |node| {
            for fruit in node.fruits.iter_mut().flatten() {
                fruit.ripeness = fruit.ripeness.clamp(0.0, MAX_RIPENESS);
            }
        });
        for sapling in &mut world.saplings {
            sapling.growth = sapling.growth.clamp(0.0, 1.0);
        }

        if world
            .feedback
            .as_ref()
            .is_some_and(|feedback| ctx.now_ms >= feedback.expires_at)
        {
            world.feedback = None;
        }

        if ctx.raw_elapsed_ms.is_finite() && ctx.raw_elapsed_ms > 0.0 {
            let instant = 1_000.0 / ctx.raw_elapsed_ms;
            world.fps = if world.fps > 0.0 {
                world.fps + (instant - world.fps) * FPS_SMOOTHING
            } else {
                instant
            };
        }

        world.hud = Hud::project(world);
        Ok(())
    }
}
