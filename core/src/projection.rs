//! Contaminant projector: post-filter estimates.
//!
//!   after = before × (1 − efficiency)
//!
//! applied independently to turbidity, coliforms, metals and TDS.

use crate::{
    recommendation::FilterEvaluation, risk::TdsCompliance, sample::ContaminantLevels,
    types::Percent,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ProjectedSample {
    pub before:     ContaminantLevels,
    pub after:      ContaminantLevels,
    pub efficiency: f64,
}

impl ProjectedSample {
    pub fn project(before: ContaminantLevels, efficiency: f64) -> Self {
        let keep = 1.0 - efficiency;
        let after = ContaminantLevels {
            turbidity_ntu: before.turbidity_ntu * keep,
            coliforms:     before.coliforms * keep,
            metals_ppm:    before.metals_ppm * keep,
            tds_mg_l:      before.tds_mg_l * keep,
        };
        Self { before, after, efficiency }
    }

    pub fn tds_reduction_pct(&self) -> Percent {
        reduction_pct(self.before.tds_mg_l, self.after.tds_mg_l)
    }
}

/// TDS deep-dive: the recommended filter's effect on dissolved solids.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TdsFocus {
    pub tds_before:            f64,
    pub tds_after:             f64,
    pub filter:                String,
    pub filter_efficiency_pct: Percent,
    pub reduction_pct:         Percent,
    pub compliance:            TdsCompliance,
}

impl TdsFocus {
    pub fn from_projection(projected: &ProjectedSample, recommendation: &FilterEvaluation) -> Self {
        Self {
            tds_before:            projected.before.tds_mg_l,
            tds_after:             projected.after.tds_mg_l,
            filter:                recommendation.filter.name().to_string(),
            filter_efficiency_pct: recommendation.base_efficiency_pct,
            reduction_pct:         projected.tds_reduction_pct(),
            compliance:            TdsCompliance::classify(projected.before.tds_mg_l),
        }
    }
}

/// 100 × (1 − after/before). A zero (or negative) baseline reports 0%.
pub fn reduction_pct(before: f64, after: f64) -> Percent {
    if before > 0.0 {
        100.0 * (1.0 - after / before)
    } else {
        0.0
    }
}
