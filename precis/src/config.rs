use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use precis_ipc::SubmitParams;
use ratatui::style::Color;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::session::SessionSettings;
use crate::timer::PhaseDurations;

/// Overrides `service.backend_url` when set.
pub const BACKEND_URL_ENV: &str = "PRECIS_BACKEND_URL";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub theme: Theme,
    pub icons: Icons,
    pub timer: TimerConfig,
    pub focus: FocusConfig,
    pub service: ServiceConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Theme {
    #[serde(deserialize_with = "hex_to_color")]
    pub background: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub foreground: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub selection: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub black: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub red: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub green: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub yellow: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub blue: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub magenta: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub cyan: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub gray: Color,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Icons {
    pub timer: String,
    pub summary: String,
    pub notes: String,
    pub play: String,
    pub pause: String,
    pub away: String,
    pub input_cursor: String,
    pub separator: String,
    pub header_left: String,
    pub header_right: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TimerConfig {
    pub work_minutes: u64,
    pub break_minutes: u64,
    pub auto_start: bool,
    pub notify_on_phase_end: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FocusConfig {
    pub enabled: bool,
    pub debounce_ms: u64,
    pub message: String,
    pub desktop_alerts: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    pub backend_url: String,
    pub timeout_secs: u64,
    pub min_length: u32,
    pub max_length: u32,
    pub num_beams: u32,
    pub extractive_k: u32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::Rgb(9, 14, 19),
            foreground: Color::Rgb(197, 201, 199),
            selection: Color::Rgb(230, 195, 132),
            black: Color::Rgb(13, 12, 12),
            red: Color::Rgb(228, 104, 118),
            green: Color::Rgb(138, 154, 123),
            yellow: Color::Rgb(196, 178, 138),
            blue: Color::Rgb(127, 180, 202),
            magenta: Color::Rgb(162, 146, 163),
            cyan: Color::Rgb(122, 168, 159),
            gray: Color::Rgb(164, 167, 164),
        }
    }
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            timer: "Δ".to_string(),
            summary: "⬢".to_string(),
            notes: "✎".to_string(),
            play: "▶".to_string(),
            pause: "⏸".to_string(),
            away: "⚑".to_string(),
            input_cursor: "▊".to_string(),
            separator: "│".to_string(),
            header_left: "⟪ ".to_string(),
            header_right: " ⟫".to_string(),
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            break_minutes: 5,
            auto_start: false,
            notify_on_phase_end: true,
        }
    }
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 300,
            message: "Focus: stay on the summarizer".to_string(),
            desktop_alerts: true,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_string(),
            timeout_secs: 120,
            min_length: 40,
            max_length: 160,
            num_beams: 6,
            extractive_k: 2,
        }
    }
}

impl Config {
    /// Validated session settings. Zero durations are rejected here, before
    /// any session exists.
    pub fn session_settings(&self) -> Result<SessionSettings, ConfigError> {
        let durations =
            PhaseDurations::from_minutes(self.timer.work_minutes, self.timer.break_minutes)?;
        if self.focus.debounce_ms == 0 {
            return Err(ConfigError::NonPositiveDebounce);
        }
        let mut settings = SessionSettings::new(durations);
        settings.auto_start = self.timer.auto_start;
        settings.notify_on_phase_end = self.timer.notify_on_phase_end;
        settings.focus_enabled = self.focus.enabled;
        settings.focus_debounce = Duration::from_millis(self.focus.debounce_ms);
        settings.focus_message = self.focus.message.clone();
        Ok(settings)
    }

    pub fn backend_url(&self) -> String {
        std::env::var(BACKEND_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.service.backend_url.clone())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.service.timeout_secs.max(1))
    }

    /// Pre-filled fields for the submit form.
    pub fn default_params(&self) -> SubmitParams {
        SubmitParams {
            text: String::new(),
            min_length: self.service.min_length.to_string(),
            max_length: self.service.max_length.to_string(),
            num_beams: self.service.num_beams.to_string(),
            extractive_k: self.service.extractive_k.to_string(),
        }
    }
}

fn hex_to_color<'de, D>(deserializer: D) -> Result<Color, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = serde::Deserialize::deserialize(deserializer)?;
    if !s.is_ascii() || !s.starts_with('#') || s.len() != 7 {
        return Err(serde::de::Error::custom("invalid hex color format"));
    }
    let r = u8::from_str_radix(&s[1..3], 16).map_err(serde::de::Error::custom)?;
    let g = u8::from_str_radix(&s[3..5], 16).map_err(serde::de::Error::custom)?;
    let b = u8::from_str_radix(&s[5..7], 16).map_err(serde::de::Error::custom)?;
    Ok(Color::Rgb(r, g, b))
}

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "pabloagn", "Precis")
}

pub fn config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("precis.toml"))
}

pub fn load_config() -> Result<Config> {
    match config_path() {
        Some(path) if path.exists() => {
            let config_str = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file at {:?}", path))?;
            parse_config(&config_str)
                .with_context(|| format!("Failed to parse config file at {:?}", path))
        }
        _ => Ok(Config::default()),
    }
}

pub fn parse_config(source: &str) -> Result<Config> {
    Ok(toml::from_str(source)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use precis_ipc::Phase;

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.timer.work_minutes, 25);
        assert_eq!(config.focus.debounce_ms, 300);
        assert_eq!(config.service.backend_url, "http://localhost:8000");
        let params = config.default_params();
        assert_eq!(params.min_length, "40");
        assert_eq!(params.num_beams, "6");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = parse_config(
            r##"
            [timer]
            work_minutes = 50

            [theme]
            red = "#ff0000"
            "##,
        )
        .unwrap();
        assert_eq!(config.timer.work_minutes, 50);
        assert_eq!(config.timer.break_minutes, 5);
        assert_eq!(config.theme.red, Color::Rgb(255, 0, 0));

        let settings = config.session_settings().unwrap();
        assert_eq!(settings.durations.of(Phase::Work), 3000);
        assert_eq!(settings.durations.of(Phase::Break), 300);
    }

    #[test]
    fn bad_hex_color_is_a_parse_error() {
        assert!(parse_config("[theme]\nred = \"red\"").is_err());
    }

    #[test]
    fn non_ascii_hex_color_is_a_parse_error() {
        // Seven bytes, but the slice boundaries fall inside 'é'.
        assert!(parse_config("[theme]\nred = \"#aé123\"").is_err());
    }

    #[test]
    fn zero_durations_fail_fast() {
        let config = parse_config("[timer]\nbreak_minutes = 0").unwrap();
        assert_eq!(
            config.session_settings().unwrap_err(),
            ConfigError::NonPositiveDuration {
                phase: Phase::Break
            }
        );

        let config = parse_config("[focus]\ndebounce_ms = 0").unwrap();
        assert_eq!(
            config.session_settings().unwrap_err(),
            ConfigError::NonPositiveDebounce
        );
    }
}
