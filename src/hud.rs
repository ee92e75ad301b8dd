use serde::{Deserialize, Serialize};

use crate::world::{LifeStage, World};

/// Read-only projection of the world for the overlay text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hud {
    pub age: String,
    pub mood: String,
    pub growth_percent: u32,
    pub fps: f64,
    pub hint: String,
}

impl Hud {
    pub fn project(world: &World) -> Self {
        let climate = world.climate();
        Self {
            age: format!("{:.1} yrs", climate.simulated_age),
            mood: world.stage().mood().to_string(),
            growth_percent: (climate.growth.clamp(0.0, 1.0) * 100.0).round() as u32,
            fps: world.fps(),
            hint: hint(world),
        }
    }
}

fn hint(world: &World) -> String {
    if let Some(feedback) = world.feedback() {
        return feedback.text.clone();
    }
    let thirsty = world.climate().hydration < 0.1;
    match world.stage() {
        LifeStage::Seed => "Water the soil to wake the seed".into(),
        LifeStage::Sprout | LifeStage::Young if thirsty => {
            "Water helps young wood grow faster".into()
        }
        LifeStage::Sprout | LifeStage::Young => "Growing nicely".into(),
        LifeStage::Mature | LifeStage::Fruit => "Drag the saw across a branch to prune it".into(),
        LifeStage::Decline => "The old tree is letting go".into(),
        LifeStage::SeedFall => "Seeds are falling and taking root".into(),
        LifeStage::Rebirth => format!(
            "{} saplings are racing to become the next tree",
            world.saplings().len()
        ),
    }
}
