use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// User preferences consulted during scenario setup and progression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Settings {
    /// Don't track monsters per standee at all.
    pub disable_standees: bool,
    /// Place monsters room by room as doors open.
    pub scenario_rooms: bool,
    /// Add standees automatically when a room is revealed.
    pub automatic_standees: bool,
    /// Draw standee numbers at random instead of counting down from -1.
    pub random_standees: bool,
    /// Edition codes whose scenarios are offered.
    pub editions: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            disable_standees: false,
            scenario_rooms: true,
            automatic_standees: true,
            random_standees: false,
            editions: Vec::new(),
        }
    }
}

impl Settings {
    pub fn with_editions<I, S>(mut self, editions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.editions = editions.into_iter().map(Into::into).collect();
        self
    }

    pub fn edition_enabled(&self, edition: &str) -> bool {
        self.editions.iter().any(|code| code == edition)
    }
}

/// On-disk formats accepted for content, settings and campaign files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    Yaml,
}

impl DataFormat {
    /// `.yaml`/`.yml` is YAML; anything else is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                DataFormat::Yaml
            }
            _ => DataFormat::Json,
        }
    }
}

/// Parse `text` in the given format; `origin` names the source in errors.
pub fn parse_document<T: DeserializeOwned>(text: &str, format: DataFormat, origin: &str) -> Result<T> {
    match format {
        DataFormat::Json => serde_json::from_str(text)
            .with_context(|| format!("failed to parse JSON: {}", origin)),
        DataFormat::Yaml => serde_yaml::from_str(text)
            .with_context(|| format!("failed to parse YAML: {}", origin)),
    }
}

/// Render `value` in the given format, e.g. when writing a campaign file back.
pub fn render_document<T: Serialize>(value: &T, format: DataFormat) -> Result<String> {
    match format {
        DataFormat::Json => serde_json::to_string_pretty(value).context("failed to render JSON"),
        DataFormat::Yaml => serde_yaml::to_string(value).context("failed to render YAML"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_round_trip_keeps_settings() {
        let settings = Settings {
            random_standees: true,
            ..Settings::default()
        }
        .with_editions(["demo"]);
        let text = render_document(&settings, DataFormat::Yaml).unwrap();
        let back: Settings = parse_document(&text, DataFormat::Yaml, "inline").unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let settings: Settings =
            parse_document(r#"{"theme":"dark","scenario_rooms":false}"#, DataFormat::Json, "inline")
                .unwrap();
        assert!(!settings.scenario_rooms);
    }
}
