use serde::{Deserialize, Serialize};

/// Configuration from `.tally/config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub heatmap: HeatmapConfig,
    #[serde(default)]
    pub list: ListConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapConfig {
    /// Maximum number of week columns to show. Oldest weeks are dropped first.
    #[serde(default = "default_max_weeks")]
    pub max_weeks: usize,
    /// Color cells when stdout is a terminal
    #[serde(default = "default_true")]
    pub color: bool,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        HeatmapConfig {
            max_weeks: default_max_weeks(),
            color: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListConfig {
    /// Display width for task text in listings
    #[serde(default = "default_list_width")]
    pub width: usize,
}

impl Default for ListConfig {
    fn default() -> Self {
        ListConfig {
            width: default_list_width(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// A year never spans more than 53 week columns
fn default_max_weeks() -> usize {
    53
}

fn default_list_width() -> usize {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.heatmap.max_weeks, 53);
        assert!(config.heatmap.color);
        assert_eq!(config.list.width, 60);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: Config = toml::from_str("[heatmap]\nmax_weeks = 26\n").unwrap();
        assert_eq!(config.heatmap.max_weeks, 26);
        assert!(config.heatmap.color);
    }
}
