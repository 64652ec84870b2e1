//! Configuration for the scanmap node.
//!
//! The pipeline settings sit at the top level of the YAML file, next to a
//! `simulation` section describing the synthetic sensor.

use eyre::{Result, WrapErr, ensure};
use scanmap_core::Config as PipelineConfig;
use serde::Deserialize;
use std::{fs, path::Path, time::Duration};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub pipeline: PipelineConfig,

    /// Simulated sensor configuration.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&contents)
            .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate()?;

        let sim = &self.simulation;
        ensure!(
            !sim.scan_period.is_zero(),
            "simulation.scan_period must be greater than zero"
        );
        ensure!(sim.beams > 0, "simulation.beams must be greater than zero");
        ensure!(
            sim.room_width > 0.0 && sim.room_height > 0.0,
            "simulation room dimensions must be positive"
        );
        ensure!(
            sim.orbit_radius >= 0.0
                && 2.0 * sim.orbit_radius < sim.room_width.min(sim.room_height),
            "simulation.orbit_radius must keep the sensor inside the room"
        );
        ensure!(
            sim.range_min >= 0.0 && sim.range_min < sim.range_max,
            "simulation.range_min must be non-negative and below range_max"
        );

        Ok(())
    }
}

/// A sensor orbiting the center of a rectangular room.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Interval between scans.
    #[serde(with = "humantime_serde", default = "default_scan_period")]
    pub scan_period: Duration,

    /// Stop producing scans after this long. Runs until interrupted if unset.
    #[serde(with = "humantime_serde", default)]
    pub duration: Option<Duration>,

    /// Samples per revolution.
    #[serde(default = "default_beams")]
    pub beams: usize,

    #[serde(default = "default_room_width")]
    pub room_width: f64,

    #[serde(default = "default_room_height")]
    pub room_height: f64,

    #[serde(default = "default_orbit_radius")]
    pub orbit_radius: f64,

    /// Orbit speed in degrees per second.
    #[serde(default = "default_orbit_rate")]
    pub orbit_rate: f64,

    #[serde(default = "default_range_min")]
    pub range_min: f64,

    #[serde(default = "default_range_max")]
    pub range_max: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            scan_period: default_scan_period(),
            duration: None,
            beams: default_beams(),
            room_width: default_room_width(),
            room_height: default_room_height(),
            orbit_radius: default_orbit_radius(),
            orbit_rate: default_orbit_rate(),
            range_min: default_range_min(),
            range_max: default_range_max(),
        }
    }
}

fn default_scan_period() -> Duration {
    Duration::from_millis(25)
}

fn default_beams() -> usize {
    360
}

fn default_room_width() -> f64 {
    8.0
}

fn default_room_height() -> f64 {
    5.0
}

fn default_orbit_radius() -> f64 {
    1.5
}

fn default_orbit_rate() -> f64 {
    20.0
}

fn default_range_min() -> f64 {
    0.15
}

fn default_range_max() -> f64 {
    12.0
}
