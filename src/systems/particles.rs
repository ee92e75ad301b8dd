use anyhow::Result;
use rand::Rng;

use crate::{
    canopy::Point,
    engine::{System, SystemContext},
    rng::SystemRng,
    world::{Particle, World},
};

const GRAVITY: f64 = 0.0009;
const DRAG: f64 = 0.996;
const MAX_SAWDUST: usize = 240;
const MAX_TRAIL: usize = 24;
const TRAIL_LIFE_MS: f64 = 320.0;

/// A spray of sawdust thrown off the contact point of a cut.
pub(crate) fn sawdust_burst(at: Point, rng: &mut impl Rng) -> Vec<Particle> {
    let count = rng.gen_range(14..=22);
    (0..count)
        .map(|_| {
            let angle = rng.gen_range(-std::f64::consts::PI..std::f64::consts::PI);
            let speed = rng.gen_range(0.04..0.18);
            let life = rng.gen_range(450.0..900.0);
            Particle {
                position: at,
                velocity: Point::new(angle.cos() * speed, angle.sin() * speed - 0.05),
                life_ms: life,
                max_life_ms: life,
                size: rng.gen_range(1.0..2.6),
            }
        })
        .collect()
}

fn step(particle: &mut Particle, elapsed_ms: f64, gravity: f64) {
    particle.velocity.y += gravity * elapsed_ms;
    particle.velocity.x *= DRAG;
    particle.position.x += particle.velocity.x * elapsed_ms;
    particle.position.y += particle.velocity.y * elapsed_ms;
    particle.life_ms -= elapsed_ms;
}

/// Cap keeps the newest particles.
fn trim_oldest(particles: &mut Vec<Particle>, cap: usize) {
    if particles.len() > cap {
        let excess = particles.len() - cap;
        particles.drain(..excess);
    }
}

pub struct ParticleSystem;

impl ParticleSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for ParticleSystem {
    fn name(&self) -> &str {
        "particles"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let elapsed = ctx.elapsed_ms;
        let particles = &mut world.particles;

        for dust in &mut particles.sawdust {
            step(dust, elapsed, GRAVITY);
        }
        particles.sawdust.retain(|p| p.life_ms > 0.0);
        trim_oldest(&mut particles.sawdust, MAX_SAWDUST);

        for point in &mut particles.trail {
            point.life_ms -= elapsed;
        }
        particles.trail.retain(|p| p.life_ms > 0.0);
        if world.saw.active {
            particles.trail.push(Particle {
                position: world.saw.position,
                velocity: Point::default(),
                life_ms: TRAIL_LIFE_MS,
                max_life_ms: TRAIL_LIFE_MS,
                size: 3.0,
            });
        }
        trim_oldest(&mut particles.trail, MAX_TRAIL);
        Ok(())
    }
}
