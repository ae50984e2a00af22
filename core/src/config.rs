use crate::{
    clock::SimSpeed,
    error::{PurifierError, SimResult},
    recommendation::{default_catalog, FilterProfile},
    stage_sequencer::{default_stage_plan, EfficiencyModel, StageConfig},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
struct FilterCatalogFile {
    filters: Vec<FilterProfile>,
}

#[derive(Debug, Clone, Deserialize)]
struct StagePlanFile {
    stages:     Vec<StageConfig>,
    #[serde(default)]
    efficiency: EfficiencyModel,
}

/// Target for the optional row-store mirror.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncConfig {
    pub db_path:         String,
    pub sheet:           String,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_busy_timeout_ms() -> u64 {
    2_000
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimConfig {
    /// Ordered; the first entry wins exact ties.
    pub catalog:    Vec<FilterProfile>,
    pub stages:     Vec<StageConfig>,
    pub efficiency: EfficiencyModel,
    pub speed:      SimSpeed,
    pub sync:       Option<SyncConfig>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            catalog:    default_catalog(),
            stages:     default_stage_plan(),
            efficiency: EfficiencyModel::default(),
            speed:      SimSpeed::Normal,
            sync:       None,
        }
    }
}

impl SimConfig {
    /// Load from the data/ directory.
    /// In tests, use SimConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let catalog_path = format!("{data_dir}/filters/filter_catalog.json");
        let catalog_content = std::fs::read_to_string(&catalog_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {catalog_path}: {e}"))?;
        let catalog_file: FilterCatalogFile = serde_json::from_str(&catalog_content)?;

        let stage_path = format!("{data_dir}/stages/stage_plan.json");
        let stage_content = std::fs::read_to_string(&stage_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {stage_path}: {e}"))?;
        let stage_file: StagePlanFile = serde_json::from_str(&stage_content)?;

        let config = Self {
            catalog:    catalog_file.filters,
            stages:     stage_file.stages,
            efficiency: stage_file.efficiency,
            ..Self::default()
        };
        config.validate()?;
        log::info!(
            "config: loaded {} filters and {} stages from {data_dir}",
            config.catalog.len(),
            config.stages.len()
        );
        Ok(config)
    }

    /// Config with hardcoded defaults and no pacing, for unit tests.
    pub fn default_test() -> Self {
        Self { speed: SimSpeed::Instant, ..Self::default() }
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.catalog.is_empty() {
            return Err(PurifierError::InvalidConfig("filter catalog is empty".into()));
        }
        if let Some(f) = self.catalog.iter().find(|f| !(f.efficiency > 0.0 && f.efficiency < 1.0)) {
            return Err(PurifierError::InvalidConfig(format!(
                "{} efficiency {} is outside (0, 1)",
                f.name(),
                f.efficiency
            )));
        }
        if self.stages.is_empty() {
            return Err(PurifierError::InvalidConfig("stage plan is empty".into()));
        }
        if let Some(s) = self.stages.iter().find(|s| s.weight == 0) {
            return Err(PurifierError::InvalidConfig(format!("stage '{}' has zero weight", s.name)));
        }
        let e = &self.efficiency;
        if !(e.min <= e.max && e.std_dev >= 0.0 && e.mean.is_finite()) {
            return Err(PurifierError::InvalidConfig(format!(
                "efficiency model {e:?} is not usable"
            )));
        }
        Ok(())
    }
}
