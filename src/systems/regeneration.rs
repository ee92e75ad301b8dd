use anyhow::Result;
use rand::Rng;

use crate::{
    canopy::Point,
    engine::{System, SystemContext},
    rng::SystemRng,
    scenario::Tuning,
    world::{Sapling, Viewport, World},
};

pub const SAPLING_START: f64 = 0.02;
pub const SAPLING_READY: f64 = 0.98;

/// Extra saplings earned by fruit that ripened during the tree's life.
pub fn fruit_bonus(fruits_ripened: u32) -> u32 {
    (fruits_ripened / 6).min(3)
}

/// Spawns the next generation's saplings along the ground and spends the
/// fruit bonus that enlarged the batch.
pub fn spawn_saplings(
    fruits_ripened: &mut u32,
    viewport: Viewport,
    tuning: &Tuning,
    rng: &mut impl Rng,
) -> Vec<Sapling> {
    let bonus = fruit_bonus(*fruits_ripened);
    let low = tuning.sapling_min as f64;
    let high = tuning.sapling_max as f64 + 1.0;
    let rolled = (rng.gen_range(low..high) + bonus as f64).floor() as u32;
    let count = rolled.max(tuning.sapling_min).max(1);
    *fruits_ripened = fruits_ripened.saturating_sub(bonus * 3);

    let ground = viewport.ground_y();
    (0..count)
        .map(|_| Sapling {
            position: Point::new(
                rng.gen_range(0.12..0.88) * viewport.width,
                ground + rng.gen_range(-4.0..4.0),
            ),
            growth: SAPLING_START,
            sway_phase: rng.gen_range(0.0..std::f64::consts::TAU),
            sway_amplitude: rng.gen_range(0.04..0.12),
        })
        .collect()
}

/// True once every sapling has matured. An empty batch is never ready.
pub fn saplings_ready(saplings: &[Sapling]) -> bool {
    !saplings.is_empty() && saplings.iter().all(|s| s.growth > SAPLING_READY)
}

pub fn mature(sapling: &mut Sapling, elapsed_ms: f64, tuning: &Tuning) {
    let step = (elapsed_ms * tuning.sapling_growth_rate).clamp(0.0, 1.0);
    sapling.growth = (sapling.growth + (1.0 - sapling.growth) * step).clamp(0.0, 1.0);
    sapling.sway_phase = (sapling.sway_phase + elapsed_ms * 0.002) % std::f64::consts::TAU;
}

pub struct RegenerationSystem;

impl RegenerationSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RegenerationSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for RegenerationSystem {
    fn name(&self) -> &str {
        "regeneration"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        if !world.stage.current.spawns_saplings() {
            return Ok(());
        }
        for sapling in &mut world.saplings {
            mature(sapling, ctx.elapsed_ms, ctx.tuning);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn viewport() -> Viewport {
        Viewport::new(1000.0, 500.0).unwrap()
    }

    #[test]
    fn bonus_is_capped() {
        assert_eq!(fruit_bonus(0), 0);
        assert_eq!(fruit_bonus(5), 0);
        assert_eq!(fruit_bonus(6), 1);
        assert_eq!(fruit_bonus(17), 2);
        assert_eq!(fruit_bonus(400), 3);
    }

    #[test]
    fn spawn_count_within_bounds() {
        let tuning = Tuning::default();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        for _ in 0..200 {
            let mut ripened = 0;
            let saplings = spawn_saplings(&mut ripened, viewport(), &tuning, &mut rng);
            assert!((3..=6).contains(&saplings.len()), "{}", saplings.len());
            for sapling in &saplings {
                assert_eq!(sapling.growth, SAPLING_START);
                assert!(sapling.position.x >= 120.0 && sapling.position.x <= 880.0);
            }
        }
    }

    #[test]
    fn ripened_fruit_enlarges_batch_and_is_spent() {
        let tuning = Tuning::default();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut ripened = 20;
        let saplings = spawn_saplings(&mut ripened, viewport(), &tuning, &mut rng);
        assert!((6..=9).contains(&saplings.len()));
        assert_eq!(ripened, 11);

        let mut few = 7;
        spawn_saplings(&mut few, viewport(), &tuning, &mut rng);
        assert_eq!(few, 4);
    }

    #[test]
    fn saplings_mature_toward_one() {
        let tuning = Tuning::default();
        let mut sapling = Sapling {
            position: Point::new(0.0, 0.0),
            growth: SAPLING_START,
            sway_phase: 0.0,
            sway_amplitude: 0.1,
        };
        let mut previous = sapling.growth;
        for _ in 0..2_000 {
            mature(&mut sapling, 16.0, &tuning);
            assert!(sapling.growth >= previous && sapling.growth <= 1.0);
            previous = sapling.growth;
        }
        assert!(saplings_ready(std::slice::from_ref(&sapling)));
    }

    #[test]
    fn empty_range_still_spawns_one() {
        let tuning = Tuning {
            sapling_min: 0,
            sapling_max: 0,
            ..Tuning::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut ripened = 0;
        let saplings = spawn_saplings(&mut ripened, viewport(), &tuning, &mut rng);
        assert_eq!(saplings.len(), 1);
    }

    #[test]
    fn empty_batch_is_not_ready() {
        assert!(!saplings_ready(&[]));
    }
}
