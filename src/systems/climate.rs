use anyhow::Result;
use rand::Rng;

use crate::{
    engine::{clamp_elapsed, System, SystemContext},
    rng::SystemRng,
    scenario::Tuning,
    world::{ClimateState, LifeStage, World, MAX_GROWTH, MAX_HYDRATION},
};

pub struct ClimateSystem;

impl ClimateSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ClimateSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for ClimateSystem {
    fn name(&self) -> &str {
        "climate"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let waterings = std::mem::take(&mut world.water_requests);
        for _ in 0..waterings {
            water(&mut world.climate, ctx.tuning, rng);
            log::debug!(
                "watered: hydration {:.2}, target {:.3}",
                world.climate.hydration,
                world.climate.target_growth
            );
        }
        advance(&mut world.climate, ctx.elapsed_ms, ctx.tuning, rng);
        if growth_pulse(&mut world.climate, world.stage.current, ctx.now_ms, ctx.tuning, rng) {
            log::debug!(
                "growth pulse: target {:.3}, next at {:.0} ms",
                world.climate.target_growth,
                world.climate.next_pulse_at
            );
        }
        Ok(())
    }
}

/// Integrates one frame of growth easing, hydration, wind, season and age.
pub fn advance(climate: &mut ClimateState, elapsed_ms: f64, tuning: &Tuning, rng: &mut impl Rng) {
    let elapsed = clamp_elapsed(elapsed_ms);

    let step = (elapsed * tuning.growth_speed).clamp(0.0, tuning.max_growth_step);
    climate.growth = (climate.growth + (climate.target_growth - climate.growth) * step)
        .clamp(0.0, MAX_GROWTH);

    if climate.hydration > 0.0 {
        climate.target_growth = (climate.target_growth
            + climate.hydration * tuning.hydration_boost * elapsed)
            .clamp(0.0, MAX_GROWTH);
        climate.hydration = (climate.hydration - tuning.hydration_decay * elapsed).max(0.0);
    }

    if rng.gen_bool((tuning.gust_chance * elapsed).clamp(0.0, 1.0)) {
        // mature trees sway less erratically
        let calm = 1.0 - 0.6 * climate.growth.clamp(0.0, 1.0);
        climate.wind_target = rng.gen_range(-1.0..=1.0) * tuning.gust_strength * calm;
    }
    let ease = (elapsed * tuning.wind_ease).clamp(0.0, 1.0);
    climate.wind += (climate.wind_target - climate.wind) * ease;

    climate.season += elapsed * tuning.season_rate;
    climate.simulated_age += elapsed * tuning.age_rate;
}

pub fn water(climate: &mut ClimateState, tuning: &Tuning, rng: &mut impl Rng) {
    climate.hydration = (climate.hydration + tuning.water_amount).min(MAX_HYDRATION);
    climate.target_growth = (climate.target_growth + tuning.water_target_bump).min(MAX_GROWTH);
    climate.wind_target = rng.gen_range(-1.0..=1.0) * tuning.gust_strength;
}

/// Fires the autonomous growth pulse when it is due and schedules the next
/// one. Returns whether it fired.
pub fn growth_pulse(
    climate: &mut ClimateState,
    stage: LifeStage,
    now_ms: f64,
    tuning: &Tuning,
    rng: &mut impl Rng,
) -> bool {
    if now_ms < climate.next_pulse_at {
        return false;
    }
    let increment = rng.gen_range(tuning.pulse_increment_min..=tuning.pulse_increment_max);
    climate.target_growth =
        (climate.target_growth + stage.pulse_weight() * increment).clamp(0.0, MAX_GROWTH);
    climate.simulated_age += rng.gen_range(tuning.pulse_age_min..=tuning.pulse_age_max);
    climate.next_pulse_at = now_ms + rng.gen_range(tuning.pulse_min_ms..=tuning.pulse_max_ms);
    true
}
