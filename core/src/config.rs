use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub gold: GoldConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldConfig {
    /// Category label for valid rows that arrived without one.
    pub uncategorized_label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// How many rows each top-N section of the insight report shows.
    pub top_n: usize,
}

impl Default for GoldConfig {
    fn default() -> Self {
        Self {
            uncategorized_label: "uncategorized".to_string(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { top_n: 5 }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            gold: GoldConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from the data/ directory.
    /// In tests, use PipelineConfig::default().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/pipeline/pipeline_config.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        Ok(config)
    }
}
