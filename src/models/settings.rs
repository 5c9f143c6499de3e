use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{EngineChoice, QualityPreset};

/// User configuration from pdfpress-settings.yaml
///
/// Contains the defaults the front ends start from. The file is optional;
/// every field has a sensible default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(rename = "Pdfpress_Settings")]
    pub settings: AppSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(rename = "Default Quality", default)]
    pub quality: QualityPreset,

    #[serde(rename = "Default Engine", default)]
    pub engine: EngineChoice,

    /// Destination folder for compressed files. Empty means "next to each
    /// source file".
    #[serde(rename = "Output Folder", default)]
    pub output_dir: String,

    #[serde(rename = "Auto Install Ghostscript", default = "default_auto_install")]
    pub auto_install_ghostscript: bool,

    /// Wall-clock bound for one Ghostscript run, in seconds. Absent means
    /// unbounded.
    #[serde(rename = "Ghostscript Timeout", default)]
    pub ghostscript_timeout_secs: Option<u64>,

    #[serde(rename = "Debug Mode", default)]
    pub debug_mode: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Balanced,
            engine: EngineChoice::Auto,
            output_dir: String::new(),
            auto_install_ghostscript: true,
            ghostscript_timeout_secs: None,
            debug_mode: false,
        }
    }
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            settings: AppSettings::default(),
        }
    }
}

fn default_auto_install() -> bool {
    true
}

impl AppSettings {
    pub fn ghostscript_timeout(&self) -> Option<Duration> {
        self.ghostscript_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_settings_defaults() {
        let settings = AppSettings::default();
        assert_eq!(settings.quality, QualityPreset::Balanced);
        assert_eq!(settings.engine, EngineChoice::Auto);
        assert!(settings.output_dir.is_empty());
        assert!(settings.auto_install_ghostscript);
        assert!(settings.ghostscript_timeout().is_none());
        assert!(!settings.debug_mode);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let yaml = "Pdfpress_Settings:\n  Default Quality: high\n";
        let config: UserSettings = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.settings.quality, QualityPreset::High);
        assert_eq!(config.settings.engine, EngineChoice::Auto);
        assert!(config.settings.auto_install_ghostscript);
    }

    #[test]
    fn test_timeout_conversion() {
        let yaml = "Pdfpress_Settings:\n  Ghostscript Timeout: 120\n";
        let config: UserSettings = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(
            config.settings.ghostscript_timeout(),
            Some(Duration::from_secs(120))
        );
    }

    #[test]
    fn test_round_trip() {
        let mut config = UserSettings::default();
        config.settings.quality = QualityPreset::Extreme;
        config.settings.output_dir = "C:/compressed".to_string();

        let yaml = serde_yaml_ng::to_string(&config).unwrap();
        let back: UserSettings = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(back.settings.quality, QualityPreset::Extreme);
        assert_eq!(back.settings.output_dir, "C:/compressed");
    }
}
