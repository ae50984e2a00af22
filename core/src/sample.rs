//! Measurement model: one immutable water sample.
//!
//! A sample is built once per run from operator input and passed by value
//! into the pipeline. Construction validates every field against the input
//! ranges; nothing downstream re-checks them.

use crate::error::{PurifierError, SimResult};
use serde::{Deserialize, Serialize};

pub const PH_RANGE: (f64, f64) = (4.0, 9.0);
pub const TURBIDITY_RANGE: (f64, f64) = (0.1, 50.0);
pub const COLIFORMS_RANGE: (u32, u32) = (0, 2000);
pub const METALS_RANGE: (f64, f64) = (0.0, 2.0);
pub const TDS_RANGE: (u32, u32) = (50, 1500);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Odor {
    No,
    Yes,
}

impl Odor {
    pub fn label(&self) -> &'static str {
        match self {
            Self::No => "No",
            Self::Yes => "Yes",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "No" | "no" | "false" | "0" => Some(Self::No),
            "Yes" | "yes" | "true" | "1" => Some(Self::Yes),
            _ => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Yes)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WaterSample {
    ph:            f64,
    turbidity_ntu: f64,
    coliforms:     u32,
    metals_ppm:    f64,
    tds_mg_l:      u32,
    odor:          Odor,
}

impl Default for WaterSample {
    /// The operator form defaults.
    fn default() -> Self {
        Self {
            ph:            7.0,
            turbidity_ntu: 10.0,
            coliforms:     500,
            metals_ppm:    0.4,
            tds_mg_l:      650,
            odor:          Odor::No,
        }
    }
}

impl WaterSample {
    pub fn new(
        ph: f64,
        turbidity_ntu: f64,
        coliforms: u32,
        metals_ppm: f64,
        tds_mg_l: u32,
        odor: Odor,
    ) -> SimResult<Self> {
        check("ph", ph, PH_RANGE)?;
        check("turbidity_ntu", turbidity_ntu, TURBIDITY_RANGE)?;
        check(
            "coliforms",
            coliforms as f64,
            (COLIFORMS_RANGE.0 as f64, COLIFORMS_RANGE.1 as f64),
        )?;
        check("metals_ppm", metals_ppm, METALS_RANGE)?;
        check(
            "tds_mg_l",
            tds_mg_l as f64,
            (TDS_RANGE.0 as f64, TDS_RANGE.1 as f64),
        )?;
        Ok(Self { ph, turbidity_ntu, coliforms, metals_ppm, tds_mg_l, odor })
    }

    pub fn ph(&self) -> f64            { self.ph }
    pub fn turbidity_ntu(&self) -> f64 { self.turbidity_ntu }
    pub fn coliforms(&self) -> u32     { self.coliforms }
    pub fn metals_ppm(&self) -> f64    { self.metals_ppm }
    pub fn tds_mg_l(&self) -> u32      { self.tds_mg_l }
    pub fn odor(&self) -> Odor         { self.odor }

    /// The four contaminant readings that filtering acts on.
    pub fn contaminants(&self) -> ContaminantLevels {
        ContaminantLevels {
            turbidity_ntu: self.turbidity_ntu,
            coliforms:     self.coliforms as f64,
            metals_ppm:    self.metals_ppm,
            tds_mg_l:      self.tds_mg_l as f64,
        }
    }
}

/// Contaminant values as reals. Used for both raw and projected readings,
/// since projected coliform and TDS values are no longer whole numbers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ContaminantLevels {
    pub turbidity_ntu: f64,
    pub coliforms:     f64,
    pub metals_ppm:    f64,
    pub tds_mg_l:      f64,
}

impl ContaminantLevels {
    /// Values in display order: turbidity, coliforms, metals, TDS.
    pub fn as_array(&self) -> [f64; 4] {
        [self.turbidity_ntu, self.coliforms, self.metals_ppm, self.tds_mg_l]
    }
}

fn check(field: &'static str, value: f64, (min, max): (f64, f64)) -> SimResult<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(PurifierError::InvalidSample { field, value, min, max })
    }
}
