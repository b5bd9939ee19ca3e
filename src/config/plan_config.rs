use crate::models::{DEFAULT_BUSINESS_AREA, DEFAULT_PLAN_TYPE};
use serde::{Deserialize, Serialize};

/// Pipeline configuration. Everything has a default, so running without a
/// config file is fine; the file only overrides labels and paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanConfig {
    #[serde(default)]
    pub labels: LabelConfig,
    #[serde(default)]
    pub io: IoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfig {
    /// Plan-type line printed in red on every page.
    #[serde(default = "default_plan_type")]
    pub plan_type: String,
    /// Business-area subtitle.
    #[serde(default = "default_business_area")]
    pub business_area: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IoConfig {
    /// Identity columns every usable sheet must carry.
    #[serde(default = "default_required_columns")]
    pub required_columns: Vec<String>,
    #[serde(default = "default_rows_path")]
    pub rows_path: String,
    #[serde(default = "default_output_path")]
    pub output_path: String,
}

fn default_plan_type() -> String {
    DEFAULT_PLAN_TYPE.to_string()
}

fn default_business_area() -> String {
    DEFAULT_BUSINESS_AREA.to_string()
}

fn default_required_columns() -> Vec<String> {
    ["Nr", "SAP-Nr.", "Name", "Strasse", "Plz", "Ort"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_rows_path() -> String {
    "data/kunden.json".to_string()
}

fn default_output_path() -> String {
    "data/sendeplan.json".to_string()
}

impl Default for LabelConfig {
    fn default() -> Self {
        LabelConfig {
            plan_type: default_plan_type(),
            business_area: default_business_area(),
        }
    }
}

impl Default for IoConfig {
    fn default() -> Self {
        IoConfig {
            required_columns: default_required_columns(),
            rows_path: default_rows_path(),
            output_path: default_output_path(),
        }
    }
}

impl Default for PlanConfig {
    fn default() -> Self {
        PlanConfig {
            labels: LabelConfig::default(),
            io: IoConfig::default(),
        }
    }
}

impl PlanConfig {
    pub fn from_file(path: &str) -> Result<Self, anyhow::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: PlanConfig = toml::from_str(&content)?;
        Ok(config)
    }
}
