//! Terra scene configuration file handling

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use terra_animation::plates::PLATES;
use terra_animation::{Easing, EntityMeta, Phase, PhaseSchedule, Vec3};

pub const CONFIG_FILE: &str = "terra.toml";

/// Top-level scene configuration (terra.toml)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TerraConfig {
    #[serde(default)]
    pub timeline: TimelineConfig,
    #[serde(default)]
    pub globe: GlobeConfig,
    #[serde(default = "default_phases")]
    pub phases: Vec<Phase>,
    #[serde(default = "default_plates")]
    pub plates: Vec<PlateConfig>,
}

/// Playback timing
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TimelineConfig {
    /// Seconds from 0% to 100% at speed 1.0
    #[serde(default = "default_duration")]
    pub duration_secs: f32,
    /// Initial speed multiplier
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default)]
    pub easing: Easing,
}

fn default_duration() -> f32 {
    30.0
}

fn default_speed() -> f32 {
    1.0
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_duration(),
            speed: default_speed(),
            easing: Easing::default(),
        }
    }
}

/// Which shells appear around the assembled globe
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GlobeConfig {
    #[serde(default = "default_true")]
    pub atmosphere: bool,
    #[serde(default = "default_true")]
    pub clouds: bool,
}

fn default_true() -> bool {
    true
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            atmosphere: true,
            clouds: true,
        }
    }
}

/// One tectonic plate
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlateConfig {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Legend caption, falls back to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub dispersed: Vec3,
    #[serde(default)]
    pub rest: Vec3,
}

impl PlateConfig {
    pub fn meta(&self) -> EntityMeta {
        EntityMeta {
            name: self.name.clone(),
            label: self.label.clone(),
            color: self.color.clone(),
        }
    }
}

fn default_phases() -> Vec<Phase> {
    PhaseSchedule::default().phases().to_vec()
}

fn default_plates() -> Vec<PlateConfig> {
    PLATES
        .iter()
        .map(|p| PlateConfig {
            id: p.id.to_string(),
            name: Some(p.name.to_string()),
            label: Some(p.label.to_string()),
            color: Some(p.color.to_string()),
            dispersed: p.dispersed,
            rest: Vec3::ZERO,
        })
        .collect()
}

impl Default for TerraConfig {
    fn default() -> Self {
        Self {
            timeline: TimelineConfig::default(),
            globe: GlobeConfig::default(),
            phases: default_phases(),
            plates: default_plates(),
        }
    }
}

impl TerraConfig {
    /// Resolve a user-supplied path to the config file it names
    ///
    /// Anything ending in `.toml` is taken as the file itself, even if it
    /// does not exist yet.
    pub fn path_in(path: &Path) -> PathBuf {
        if path.is_file() || path.extension().is_some_and(|ext| ext == "toml") {
            path.to_path_buf()
        } else {
            path.join(CONFIG_FILE)
        }
    }

    /// Load configuration from a file or a directory containing terra.toml
    pub fn load(path: &Path) -> Result<Self> {
        let config_path = Self::path_in(path);

        if !config_path.exists() {
            if config_path == path {
                anyhow::bail!("{} does not exist", path.display());
            }
            anyhow::bail!(
                "No {} found in {}. Run `terra init` to create one.",
                CONFIG_FILE,
                path.display()
            );
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))
    }

    /// Load from `path` if given, otherwise fall back to ./terra.toml or built-in defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(CONFIG_FILE).exists() => Self::load(Path::new(CONFIG_FILE)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = TerraConfig::from_toml("").unwrap();
        assert_eq!(config, TerraConfig::default());
        assert_eq!(config.plates.len(), 7);
        assert_eq!(config.phases.len(), 4);
    }

    #[test]
    fn test_default_survives_serialization() {
        let text = TerraConfig::default().to_toml().unwrap();
        assert!(text.contains("[[plates]]"));
        assert_eq!(TerraConfig::from_toml(&text).unwrap(), TerraConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let config = TerraConfig::from_toml(
            r#"
            [timeline]
            duration_secs = 12.0
            easing = "linear"

            [globe]
            clouds = false

            [[phases]]
            name = "separated"
            start = 0.0
            end = 0.5

            [[phases]]
            name = "complete"
            start = 0.5
            end = 1.0
            label = "Done"

            [[plates]]
            id = "pacific"
            dispersed = [-6.0, 0.0, -2.0]
            "#,
        )
        .unwrap();

        assert_eq!(config.timeline.duration_secs, 12.0);
        assert_eq!(config.timeline.speed, 1.0);
        assert_eq!(config.timeline.easing, Easing::Linear);
        assert!(config.globe.atmosphere);
        assert!(!config.globe.clouds);
        assert_eq!(config.phases[1].label.as_deref(), Some("Done"));
        assert_eq!(config.plates.len(), 1);
        assert_eq!(config.plates[0].rest, Vec3::ZERO);
        assert_eq!(config.plates[0].dispersed, Vec3::new(-6.0, 0.0, -2.0));
    }

    #[test]
    fn test_plate_metadata_is_parsed() {
        let config = TerraConfig::from_toml(
            r##"
            [[plates]]
            id = "nazca"
            name = "Nazca"
            label = "Nazca (vi)"
            color = "#ff8800"
            dispersed = [1.0, 0.0, 0.0]
            "##,
        )
        .unwrap();

        let meta = config.plates[0].meta();
        assert_eq!(meta.name.as_deref(), Some("Nazca"));
        assert_eq!(meta.caption(), Some("Nazca (vi)"));
        assert_eq!(meta.color.as_deref(), Some("#ff8800"));
    }

    #[test]
    fn test_toml_path_is_taken_as_file() {
        let dir = std::env::temp_dir().join(format!("terra-config-{}", std::process::id()));
        let missing = dir.join("missing.toml");
        assert_eq!(TerraConfig::path_in(&missing), missing);
        assert_eq!(TerraConfig::path_in(&dir), dir.join(CONFIG_FILE));

        let err = TerraConfig::load(&missing).unwrap_err().to_string();
        assert!(err.contains("missing.toml"), "{err}");
        assert!(!err.contains("missing.toml/terra.toml"), "{err}");
        assert!(!err.contains("terra init"), "{err}");
    }

    #[test]
    fn test_bad_easing_is_rejected() {
        let err = TerraConfig::from_toml("[timeline]\neasing = \"bouncy\"\n").unwrap_err();
        assert!(err.to_string().contains("bouncy"));
    }
}
