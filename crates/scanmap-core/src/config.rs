//! Configuration parsing and validation for the scan pipeline.

use crate::{queue::DEFAULT_QUEUE_CAPACITY, transform::DEFAULT_CACHE_TIME};
use eyre::{Result, WrapErr, ensure};
use serde::Deserialize;
use std::{fs, num::NonZeroUsize, path::Path, time::Duration};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Where scan poses come from.
    #[serde(default)]
    pub pose_source: PoseSource,

    /// Frame names.
    #[serde(default)]
    pub frames: FramesConfig,

    /// Scan queue parameters.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Publishing timer parameters.
    #[serde(default)]
    pub publish: PublishConfig,

    /// Transform buffer parameters, used with the external pose source.
    #[serde(default)]
    pub transform: TransformConfig,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::from_yaml(&contents)
            .wrap_err_with(|| format!("Failed to load config file: {}", path.display()))?;
        Ok(config)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml).wrap_err("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.queue.capacity > 0,
            "queue.capacity must be greater than zero"
        );

        ensure!(
            !self.publish.period.is_zero(),
            "publish.period must be greater than zero"
        );

        ensure!(
            !self.transform.cache_time.is_zero(),
            "transform.cache_time must be greater than zero"
        );

        let FramesConfig {
            map,
            reference,
            sensor,
        } = &self.frames;
        for (name, value) in [("map", map), ("reference", reference), ("sensor", sensor)] {
            ensure!(!value.is_empty(), "frames.{} cannot be empty", name);
        }

        ensure!(
            reference != sensor,
            "frames.reference and frames.sensor must differ, both are '{}'",
            reference
        );

        Ok(())
    }

    /// The queue capacity as a validated non-zero value.
    pub fn queue_capacity(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.queue.capacity)
            .ok_or_else(|| eyre::eyre!("queue.capacity must be greater than zero"))
    }
}

/// Pose source selection, fixed for the lifetime of the pipeline.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PoseSource {
    /// Reuse the mapping engine's last accepted pose as the seed.
    #[default]
    Engine,
    /// Look up the sensor pose in the transform buffer.
    External,
}

/// Frame names.
#[derive(Debug, Clone, Deserialize)]
pub struct FramesConfig {
    /// Frame tag of every emitted artifact.
    #[serde(default = "default_map_frame")]
    pub map: String,

    /// Target frame of the external pose lookup.
    #[serde(default = "default_reference_frame")]
    pub reference: String,

    /// Source frame of the external pose lookup.
    #[serde(default = "default_sensor_frame")]
    pub sensor: String,
}

impl Default for FramesConfig {
    fn default() -> Self {
        Self {
            map: default_map_frame(),
            reference: default_reference_frame(),
            sensor: default_sensor_frame(),
        }
    }
}

fn default_map_frame() -> String {
    "map".to_string()
}

fn default_reference_frame() -> String {
    "odom".to_string()
}

fn default_sensor_frame() -> String {
    "base_link".to_string()
}

/// Scan queue parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of scans waiting to be processed.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

fn default_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

/// Publishing timer parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishConfig {
    /// Interval between consumer ticks.
    #[serde(with = "humantime_serde", default = "default_period")]
    pub period: Duration,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            period: default_period(),
        }
    }
}

fn default_period() -> Duration {
    Duration::from_millis(1)
}

/// Transform buffer parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct TransformConfig {
    /// History kept per frame edge.
    #[serde(with = "humantime_serde", default = "default_cache_time")]
    pub cache_time: Duration,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            cache_time: default_cache_time(),
        }
    }
}

fn default_cache_time() -> Duration {
    DEFAULT_CACHE_TIME
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
pose_source: external

frames:
  map: world
  reference: odom
  sensor: laser

queue:
  capacity: 64

publish:
  period: 5ms

transform:
  cache_time: 2s
"#;

        let config = Config::from_yaml(yaml).unwrap();

        assert_eq!(config.pose_source, PoseSource::External);
        assert_eq!(config.frames.map, "world");
        assert_eq!(config.frames.sensor, "laser");
        assert_eq!(config.queue.capacity, 64);
        assert_eq!(config.publish.period, Duration::from_millis(5));
        assert_eq!(config.transform.cache_time, Duration::from_secs(2));
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_yaml("{}").unwrap();

        assert_eq!(config.pose_source, PoseSource::Engine);
        assert_eq!(config.frames.map, "map");
        assert_eq!(config.frames.reference, "odom");
        assert_eq!(config.frames.sensor, "base_link");
        assert_eq!(config.queue.capacity, 1000);
        assert_eq!(config.publish.period, Duration::from_millis(1));
        assert_eq!(config.transform.cache_time, Duration::from_secs(10));
        assert_eq!(config.queue_capacity().unwrap().get(), 1000);
    }

    #[test]
    fn test_reject_zero_capacity() {
        let yaml = r#"
queue:
  capacity: 0
"#;
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_reject_zero_period() {
        let yaml = r#"
publish:
  period: 0s
"#;
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_reject_same_reference_and_sensor() {
        let yaml = r#"
frames:
  reference: base_link
  sensor: base_link
"#;
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_reject_empty_frame() {
        let yaml = r#"
frames:
  map: ""
"#;
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_reject_unknown_pose_source() {
        let yaml = "pose_source: odometry\n";
        assert!(Config::from_yaml(yaml).is_err());
    }
}
