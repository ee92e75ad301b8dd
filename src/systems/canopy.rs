use anyhow::Result;

use crate::{
    canopy::{self, CanopyParams},
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Re-traces the tree into this frame's draw list and cuttable segments.
pub struct CanopySystem;

impl CanopySystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CanopySystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for CanopySystem {
    fn name(&self) -> &str {
        "canopy"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let params = CanopyParams {
            growth: world.climate.growth,
            wind: world.climate.wind,
            season: world.climate.season,
            stage: world.stage.current,
            viewport: world.viewport(),
            max_depth: world.max_depth(),
        };
        world.trace = canopy::trace(&world.tree, &params);
        Ok(())
    }
}
