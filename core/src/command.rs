use crate::sample::Odor;
use serde::{Deserialize, Serialize};

/// Operator input as it arrives over IPC. Missing fields take the form
/// defaults; validation happens when it becomes a `WaterSample`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleInput {
    pub ph:            f64,
    pub turbidity_ntu: f64,
    pub coliforms:     u32,
    pub metals_ppm:    f64,
    pub tds_mg_l:      u32,
    pub odor:          Odor,
}

impl Default for SampleInput {
    fn default() -> Self {
        let d = crate::sample::WaterSample::default();
        Self {
            ph:            d.ph(),
            turbidity_ntu: d.turbidity_ntu(),
            coliforms:     d.coliforms(),
            metals_ppm:    d.metals_ppm(),
            tds_mg_l:      d.tds_mg_l(),
            odor:          d.odor(),
        }
    }
}

impl SampleInput {
    pub fn into_sample(self) -> crate::error::SimResult<crate::sample::WaterSample> {
        crate::sample::WaterSample::new(
            self.ph,
            self.turbidity_ntu,
            self.coliforms,
            self.metals_ppm,
            self.tds_mg_l,
            self.odor,
        )
    }
}

/// All operator-issued commands.
/// Variants are added over time, never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum SessionCommand {
    // ── Views ─────────────────────────────────────
    Analyze { sample: SampleInput },
    CompareFilters { sample: SampleInput },
    TdsFocus,

    // ── Runs ──────────────────────────────────────
    Run { sample: SampleInput },

    // ── Exports ───────────────────────────────────
    ExportCsv,
    Report { out_dir: String },

    Quit,
}
