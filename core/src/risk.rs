//! Risk classifier: per-parameter risk before and after filtering,
//! plus qualitative bands.
//!
//! Per-parameter risk is `min(100, 100 × value / reference)` using the same
//! references as the contamination index, but kept per parameter so the
//! reduction can be read independently of the aggregate index.

use crate::{
    contamination_index::{
        COLIFORMS_REFERENCE, METALS_REFERENCE, TDS_REFERENCE, TURBIDITY_REFERENCE,
    },
    projection::{reduction_pct, ProjectedSample},
    sample::ContaminantLevels,
    types::Percent,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ParameterRisk {
    pub turbidity: f64,
    pub coliforms: f64,
    pub metals:    f64,
    pub tds:       f64,
}

impl ParameterRisk {
    pub fn from_levels(levels: &ContaminantLevels) -> Self {
        Self {
            turbidity: normalized_risk(levels.turbidity_ntu, TURBIDITY_REFERENCE),
            coliforms: normalized_risk(levels.coliforms, COLIFORMS_REFERENCE),
            metals:    normalized_risk(levels.metals_ppm, METALS_REFERENCE),
            tds:       normalized_risk(levels.tds_mg_l, TDS_REFERENCE),
        }
    }

    /// Arithmetic mean of the four risks.
    pub fn aggregate(&self) -> f64 {
        (self.turbidity + self.coliforms + self.metals + self.tds) / 4.0
    }
}

pub fn normalized_risk(value: f64, reference_max: f64) -> f64 {
    (100.0 * value / reference_max).min(100.0)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RiskProfile {
    pub before:           ParameterRisk,
    pub after:            ParameterRisk,
    pub aggregate_before: f64,
    pub aggregate_after:  f64,
}

impl RiskProfile {
    pub fn assess(projected: &ProjectedSample) -> Self {
        let before = ParameterRisk::from_levels(&projected.before);
        let after = ParameterRisk::from_levels(&projected.after);
        let profile = Self {
            aggregate_before: before.aggregate(),
            aggregate_after:  after.aggregate(),
            before,
            after,
        };
        log::debug!(
            "risk: aggregate before={:.2} after={:.2}",
            profile.aggregate_before,
            profile.aggregate_after
        );
        profile
    }

    pub fn aggregate_reduction_pct(&self) -> Percent {
        reduction_pct(self.aggregate_before, self.aggregate_after)
    }

    pub fn bands(&self, raw: &ContaminantLevels) -> RiskBands {
        RiskBands {
            turbidity:        TurbidityBand::classify(raw.turbidity_ntu),
            coliforms:        ColiformBand::classify(raw.coliforms),
            metals:           MetalsBand::classify(raw.metals_ppm),
            tds:              TdsBand::classify(raw.tds_mg_l),
            aggregate_before: RiskBeforeBand::classify(self.aggregate_before),
            aggregate_after:  RiskAfterBand::classify(self.aggregate_after),
        }
    }
}

/// All qualitative bands for one run. Each is evaluated on its own.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RiskBands {
    pub turbidity:        TurbidityBand,
    pub coliforms:        ColiformBand,
    pub metals:           MetalsBand,
    pub tds:              TdsBand,
    pub aggregate_before: RiskBeforeBand,
    pub aggregate_after:  RiskAfterBand,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TurbidityBand {
    Excellent,
    Acceptable,
    High,
}

impl TurbidityBand {
    pub fn classify(ntu: f64) -> Self {
        if ntu < 1.0 {
            Self::Excellent
        } else if ntu <= 5.0 {
            Self::Acceptable
        } else {
            Self::High
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            Self::Excellent  => "Turbidity is excellent.",
            Self::Acceptable => "Turbidity is acceptable.",
            Self::High       => "Turbidity is high; prefiltration is needed.",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ColiformBand {
    None,
    Low,
    High,
}

impl ColiformBand {
    pub fn classify(count: f64) -> Self {
        if count <= 0.0 {
            Self::None
        } else if count < 200.0 {
            Self::Low
        } else {
            Self::High
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            Self::None => "No fecal coliforms detected.",
            Self::Low  => "Low coliform presence; UV disinfection is required.",
            Self::High => "High coliform load; intensive treatment is mandatory.",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MetalsBand {
    WithinLimit,
    Moderate,
    Elevated,
}

impl MetalsBand {
    pub fn classify(ppm: f64) -> Self {
        if ppm < 0.01 {
            Self::WithinLimit
        } else if ppm < 0.05 {
            Self::Moderate
        } else {
            Self::Elevated
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            Self::WithinLimit => "Heavy metals are within the limit.",
            Self::Moderate    => "Moderate heavy metals; nanofiltration is advised.",
            Self::Elevated    => "Elevated heavy metals; possible arsenic or lead.",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TdsBand {
    Excellent,
    Good,
    High,
    Unsuitable,
}

impl TdsBand {
    pub fn classify(mg_l: f64) -> Self {
        if mg_l < 300.0 {
            Self::Excellent
        } else if mg_l < 600.0 {
            Self::Good
        } else if mg_l < 900.0 {
            Self::High
        } else {
            Self::Unsuitable
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            Self::Excellent  => "TDS is excellent.",
            Self::Good       => "TDS is good.",
            Self::High       => "TDS is high; a salty or bitter taste is likely.",
            Self::Unsuitable => "TDS is unsuitable for direct consumption.",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RiskBeforeBand {
    Low,
    Moderate,
    VeryHigh,
}

impl RiskBeforeBand {
    pub fn classify(aggregate: f64) -> Self {
        if aggregate >= 70.0 {
            Self::VeryHigh
        } else if aggregate >= 40.0 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            Self::Low      => "Raw water risk is low.",
            Self::Moderate => "Raw water risk is moderate; treatment is advised before drinking.",
            Self::VeryHigh => "Raw water risk is very high; do not drink it untreated.",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RiskAfterBand {
    Low,
    AcceptableWithMonitoring,
    StillConsiderable,
}

impl RiskAfterBand {
    pub fn classify(aggregate: f64) -> Self {
        if aggregate <= 20.0 {
            Self::Low
        } else if aggregate <= 40.0 {
            Self::AcceptableWithMonitoring
        } else {
            Self::StillConsiderable
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            Self::Low => "Residual risk is low; water is acceptable.",
            Self::AcceptableWithMonitoring => "Acceptable with periodic monitoring.",
            Self::StillConsiderable => "Risk is still considerable; further filtration is recommended.",
        }
    }
}

/// NOM-127 reading of raw TDS used by the analysis view and the report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TdsCompliance {
    /// ≤ 500 mg/L
    Acceptable,
    /// 501–900 mg/L
    HighMineralization,
    /// > 900 mg/L
    Unsuitable,
}

impl TdsCompliance {
    pub fn classify(mg_l: f64) -> Self {
        if mg_l <= 500.0 {
            Self::Acceptable
        } else if mg_l <= 900.0 {
            Self::HighMineralization
        } else {
            Self::Unsuitable
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            Self::Acceptable => "Acceptable for consumption under NOM-127 (<= 500 mg/L).",
            Self::HighMineralization => "High mineralization (possible unpleasant taste).",
            Self::Unsuitable => "Not recommended for direct consumption (> 900 mg/L).",
        }
    }

    /// Interpretation line for the report's TDS section.
    pub fn interpretation(&self) -> &'static str {
        match self {
            Self::Acceptable => {
                "- The water already meets the NOM-127 TDS guide value (<= 500 mg/L); filtering improves quality further."
            }
            Self::HighMineralization => {
                "- Initial TDS indicates high mineralization; filtering yields a significant improvement."
            }
            Self::Unsuitable => {
                "- Initial TDS is very high; filtering removes much of the dissolved load, but additional treatment is recommended to fully meet the standard."
            }
        }
    }
}
