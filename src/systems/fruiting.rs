use anyhow::Result;

use crate::{
    canopy::reveal,
    engine::{System, SystemContext},
    rng::SystemRng,
    tree::{BranchNode, MAX_RIPENESS},
    world::World,
};

/// Grows and ripens fruit on the outermost revealed branches while the tree
/// is in its fruiting stage.
pub struct FruitingSystem;

impl FruitingSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FruitingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for FruitingSystem {
    fn name(&self) -> &str {
        "fruiting"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        if !world.stage.current.permits_fruiting() {
            return Ok(());
        }
        let max_depth = world.max_depth();
        let ripened = ripen(
            &mut world.tree,
            world.climate.growth,
            max_depth,
            ctx.elapsed_ms * ctx.tuning.fruit_ripen_rate,
        );
        if ripened > 0 {
            world.fruits_ripened += ripened;
            log::debug!("{ripened} fruit ripened ({} total)", world.fruits_ripened);
        }
        Ok(())
    }
}

/// Ripens every fruit on revealed, unpruned terminal branches by `step` and
/// returns how many crossed full ripeness for the first time.
pub fn ripen(node: &mut BranchNode, growth: f64, max_depth: u32, step: f64) -> u32 {
    if node.pruned || reveal(growth, node.depth, max_depth) <= 0.0 {
        return 0;
    }
    let mut ripened = 0;
    if node.depth + 1 >= max_depth {
        for fruit in node.fruits_mut() {
            fruit.ripeness = (fruit.ripeness + step).min(MAX_RIPENESS);
            if fruit.ripeness >= 1.0 && !fruit.counted {
                fruit.counted = true;
                ripened += 1;
            }
        }
    }
    for child in &mut node.children {
        ripened += ripen(child, growth, max_depth, step);
    }
    ripened
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::{Engine, EngineBuilder, EngineSettings},
        scenario::Tuning,
        tree::generate,
        world::{LifeStage, Viewport},
    };
    use std::path::PathBuf;

    fn engine() -> Engine {
        EngineBuilder::new(EngineSettings {
            scenario_name: "fruiting".into(),
            seed: 5,
            snapshot_interval_frames: 0,
            snapshot_dir: PathBuf::from("unused"),
            tuning: Tuning::default(),
        })
        .with_system(FruitingSystem::new())
        .build()
    }

    fn grown_world(stage: LifeStage) -> World {
        let mut world = World::new(Viewport::new(800.0, 600.0).unwrap(), 4, 42.0, &Tuning::default());
        world.climate_mut().growth = 1.0;
        world.stage_clock_mut().enter(stage);
        world
    }

    #[test]
    fn fruit_stage_ripens_into_the_world_counter() {
        let mut engine = engine();
        let mut world = grown_world(LifeStage::Fruit);
        // 0.00006/ms at 120 ms needs 139 frames to reach full ripeness
        for _ in 0..150 {
            engine.frame(&mut world, 120.0).unwrap();
        }
        assert_eq!(world.fruits_ripened() as usize, fruit_count(world.tree()));
        assert!(world.fruits_ripened() > 0);
    }

    #[test]
    fn other_stages_bear_no_fruit() {
        let mut engine = engine();
        let mut world = grown_world(LifeStage::Mature);
        engine.run(&mut world, 20, 120.0).unwrap();
        assert_eq!(fruit_count(world.tree()), 0);
        assert_eq!(world.fruits_ripened(), 0);
    }

    fn fruit_count(tree: &BranchNode) -> usize {
        let mut count = 0;
        tree.visit(&mut |node| count += node.fruits.as_ref().map_or(0, Vec::len));
        count
    }

    #[test]
    fn fruit_only_on_terminal_branches() {
        let mut tree = generate(42.0, 4);
        ripen(&mut tree, 1.0, 4, 0.1);
        tree.visit(&mut |node| {
            assert_eq!(node.fruits.is_some(), node.depth >= 3, "depth {}", node.depth);
        });
    }

    #[test]
    fn each_fruit_counts_once() {
        let mut tree = generate(42.0, 4);
        let mut total = 0;
        for _ in 0..20 {
            total += ripen(&mut tree, 1.0, 4, 0.25);
        }
        assert_eq!(total as usize, fruit_count(&tree));
        tree.visit(&mut |node| {
            for fruit in node.fruits.iter().flatten() {
                assert_eq!(fruit.ripeness, MAX_RIPENESS);
                assert!(fruit.counted);
            }
        });
    }

    #[test]
    fn unrevealed_and_pruned_branches_bear_nothing() {
        let mut tree = generate(42.0, 4);
        assert_eq!(ripen(&mut tree, 0.3, 4, 2.0), 0);
        assert_eq!(fruit_count(&tree), 0);

        for child in &mut tree.children {
            child.prune(1e9);
        }
        assert_eq!(ripen(&mut tree, 1.0, 4, 2.0), 0);
        assert_eq!(fruit_count(&tree), 0);
    }
}
