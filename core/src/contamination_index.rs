//! Contamination index: one 0–100 score per sample.
//!
//! index = 100 × mean(turbidity/50, coliforms/2000, metals/2, TDS/1000)
//!
//! The individual ratios are not clamped (TDS alone can exceed 1.0);
//! only the final score is.

use crate::sample::WaterSample;
use serde::{Deserialize, Serialize};

pub const TURBIDITY_REFERENCE: f64 = 50.0;
pub const COLIFORMS_REFERENCE: f64 = 2000.0;
pub const METALS_REFERENCE: f64 = 2.0;
pub const TDS_REFERENCE: f64 = 1000.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, PartialOrd)]
pub struct ContaminationIndex(f64);

impl ContaminationIndex {
    pub fn compute(sample: &WaterSample) -> Self {
        let ratios = contaminant_ratios(sample);
        let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
        let index = (mean * 100.0).clamp(0.0, 100.0);
        log::debug!("contamination index: ratios={ratios:?} index={index:.3}");
        Self(index)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Headroom left for a filter to act on: 100 − index.
    pub fn remaining(&self) -> f64 {
        100.0 - self.0
    }
}

/// Raw normalized ratios in order turbidity, coliforms, metals, TDS.
/// These are also the radar chart's axes.
pub fn contaminant_ratios(sample: &WaterSample) -> [f64; 4] {
    [
        sample.turbidity_ntu() / TURBIDITY_REFERENCE,
        sample.coliforms() as f64 / COLIFORMS_REFERENCE,
        sample.metals_ppm() / METALS_REFERENCE,
        sample.tds_mg_l() as f64 / TDS_REFERENCE,
    ]
}
