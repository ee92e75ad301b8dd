use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    engine::EngineSettings,
    world::{SurfaceError, Viewport, World},
};

pub const MAX_TREE_DEPTH: u32 = 12;

fn default_max_depth() -> u32 {
    7
}

fn default_frame_ms() -> f64 {
    16.0
}

fn default_viewport() -> ViewportConfig {
    ViewportConfig {
        width: 1280.0,
        height: 720.0,
    }
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("scenario validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    #[serde(default = "default_viewport")]
    pub viewport: ViewportConfig,
    #[serde(default = "default_frame_ms")]
    pub frame_ms: f64,
    #[serde(default)]
    pub frames: Option<u64>,
    #[serde(default)]
    pub snapshot_interval_frames: u64,
    #[serde(default)]
    pub tuning: Tuning,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ViewportConfig {
    pub width: f64,
    pub height: f64,
}

/// Rates and limits for the garden systems. Rates are per millisecond of
/// simulated time unless noted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub start_growth: f64,
    pub start_target: f64,
    pub growth_speed: f64,
    pub max_growth_step: f64,
    pub hydration_decay: f64,
    pub hydration_boost: f64,
    pub water_amount: f64,
    pub water_target_bump: f64,
    pub wind_ease: f64,
    pub gust_chance: f64,
    pub gust_strength: f64,
    pub season_rate: f64,
    pub age_rate: f64,
    pub pulse_min_ms: f64,
    pub pulse_max_ms: f64,
    pub pulse_increment_min: f64,
    pub pulse_increment_max: f64,
    pub pulse_age_min: f64,
    pub pulse_age_max: f64,
    pub decline_pull: f64,
    pub fruit_decline_chance: f64,
    pub fruit_ripen_rate: f64,
    pub sapling_min: u32,
    pub sapling_max: u32,
    pub sapling_growth_rate: f64,
    pub rebirth_growth: f64,
    pub rebirth_target: f64,
    pub cut_cooldown_ms: f64,
    pub cut_radius: f64,
    pub regrow_min_ms: f64,
    pub regrow_max_ms: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            start_growth: 0.02,
            start_target: 0.26,
            growth_speed: 0.000_12,
            max_growth_step: 0.04,
            hydration_decay: 0.000_06,
            hydration_boost: 0.000_018,
            water_amount: 0.55,
            water_target_bump: 0.06,
            wind_ease: 0.001_8,
            gust_chance: 0.000_75,
            gust_strength: 0.9,
            season_rate: 0.000_04,
            age_rate: 0.000_02,
            pulse_min_ms: 3_500.0,
            pulse_max_ms: 7_000.0,
            pulse_increment_min: 0.01,
            pulse_increment_max: 0.045,
            pulse_age_min: 0.05,
            pulse_age_max: 0.15,
            decline_pull: 0.000_04,
            fruit_decline_chance: 0.000_004,
            fruit_ripen_rate: 0.000_06,
            sapling_min: 3,
            sapling_max: 6,
            sapling_growth_rate: 0.000_16,
            rebirth_growth: 0.04,
            rebirth_target: 0.22,
            cut_cooldown_ms: 140.0,
            cut_radius: 28.0,
            regrow_min_ms: 18_000.0,
            regrow_max_ms: 32_000.0,
        }
    }
}

impl Tuning {
    /// Every sampled `[min, max]` pair, by name.
    fn ranges(&self) -> [(&'static str, f64, f64); 4] {
        [
            ("pulse_ms", self.pulse_min_ms, self.pulse_max_ms),
            ("pulse_increment", self.pulse_increment_min, self.pulse_increment_max),
            ("pulse_age", self.pulse_age_min, self.pulse_age_max),
            ("regrow_ms", self.regrow_min_ms, self.regrow_max_ms),
        ]
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario
            .validate()
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    pub fn validate(&self) -> Result<(), ScenarioError> {
        Viewport::new(self.viewport.width, self.viewport.height)?;
        if self.max_depth > MAX_TREE_DEPTH {
            return Err(ScenarioError::Validation(format!(
                "max_depth {} exceeds the limit of {MAX_TREE_DEPTH}",
                self.max_depth
            )));
        }
        if !(self.frame_ms.is_finite() && self.frame_ms > 0.0) {
            return Err(ScenarioError::Validation(format!(
                "frame_ms must be a finite positive number (got {})",
                self.frame_ms
            )));
        }
        let tuning = &self.tuning;
        if tuning.sapling_max == 0 {
            return Err(ScenarioError::Validation(
                "sapling_max must be at least 1".into(),
            ));
        }
        if tuning.sapling_min > tuning.sapling_max {
            return Err(ScenarioError::Validation(format!(
                "sapling_min {} is larger than sapling_max {}",
                tuning.sapling_min, tuning.sapling_max
            )));
        }
        if !(tuning.sapling_growth_rate.is_finite() && tuning.sapling_growth_rate > 0.0) {
            return Err(ScenarioError::Validation(
                "sapling_growth_rate must be a finite positive rate".into(),
            ));
        }
        for (name, min, max) in tuning.ranges() {
            if !(min.is_finite() && max.is_finite() && min <= max) {
                return Err(ScenarioError::Validation(format!(
                    "{name} range must be finite with min <= max (got {min}..{max})"
                )));
            }
        }
        Ok(())
    }

    pub fn build_world(&self) -> Result<World, ScenarioError> {
        let viewport = Viewport::new(self.viewport.width, self.viewport.height)?;
        Ok(World::new(
            viewport,
            self.max_depth,
            self.seed as f64,
            &self.tuning,
        ))
    }

    pub fn frames(&self, override_frames: Option<u64>) -> u64 {
        override_frames.or(self.frames).unwrap_or(3_600)
    }

    pub fn engine_settings(
        &self,
        snapshot_interval: Option<u64>,
        snapshot_dir: impl Into<PathBuf>,
    ) -> EngineSettings {
        EngineSettings {
            scenario_name: self.name.clone(),
            seed: self.seed,
            snapshot_interval_frames: snapshot_interval.unwrap_or(self.snapshot_interval_frames),
            snapshot_dir: snapshot_dir.into(),
            tuning: self.tuning.clone(),
        }
    }
}
