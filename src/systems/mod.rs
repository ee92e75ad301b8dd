mod bookkeeping;
mod canopy;
pub mod climate;
pub mod fruiting;
mod lifecycle;
mod particles;
mod pruning;
pub mod regeneration;

pub use bookkeeping::BookkeepingSystem;
pub use canopy::CanopySystem;
pub use climate::ClimateSystem;
pub use fruiting::FruitingSystem;
pub use lifecycle::LifecycleSystem;
pub use particles::ParticleSystem;
pub use pruning::{RegrowthSystem, SawSystem};
pub use regeneration::RegenerationSystem;
