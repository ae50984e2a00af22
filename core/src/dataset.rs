//! Labelled training samples for an offline filter classifier.
//!
//! Draws uniform readings over the operator input ranges and labels each
//! one with the expert rule below. The classifier itself lives outside
//! this crate; only the dataset is produced here.

use crate::{
    recommendation::FilterKind,
    rng::SubsystemRng,
    sample::{COLIFORMS_RANGE, METALS_RANGE, TDS_RANGE, TURBIDITY_RANGE},
};
use serde::{Deserialize, Serialize};

pub const DATASET_COLUMNS: [&str; 6] = ["turbidity", "coliforms", "metals", "tds", "odor", "filter"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LabeledSample {
    pub turbidity: f64,
    pub coliforms: f64,
    pub metals:    f64,
    pub tds:       f64,
    pub odor:      bool,
    pub filter:    FilterKind,
}

/// Expert rule, first match wins:
///   reverse osmosis    TDS > 700 or metals > 1.0
///   activated carbon   odor and turbidity < 15
///   zeolite            turbidity < 25 and 0.2 < metals < 0.8
///   nanofiber          coliforms > 800
///   ultrafiltration    turbidity > 20
///   reverse osmosis    otherwise
pub fn expert_label(turbidity: f64, coliforms: f64, metals: f64, tds: f64, odor: bool) -> FilterKind {
    if tds > 700.0 || metals > 1.0 {
        FilterKind::ReverseOsmosis
    } else if odor && turbidity < 15.0 {
        FilterKind::ActivatedCarbon
    } else if turbidity < 25.0 && metals > 0.2 && metals < 0.8 {
        FilterKind::Zeolite
    } else if coliforms > 800.0 {
        FilterKind::Nanofiber
    } else if turbidity > 20.0 {
        FilterKind::Ultrafiltration
    } else {
        FilterKind::ReverseOsmosis
    }
}

pub fn generate(count: usize, rng: &mut SubsystemRng) -> Vec<LabeledSample> {
    let samples: Vec<LabeledSample> = (0..count)
        .map(|_| {
            let turbidity = rng.uniform(TURBIDITY_RANGE.0, TURBIDITY_RANGE.1);
            let coliforms = rng.uniform(COLIFORMS_RANGE.0 as f64, COLIFORMS_RANGE.1 as f64);
            let metals = rng.uniform(METALS_RANGE.0, METALS_RANGE.1);
            let tds = rng.uniform(TDS_RANGE.0 as f64, TDS_RANGE.1 as f64);
            let odor = rng.chance(0.5);
            LabeledSample {
                turbidity,
                coliforms,
                metals,
                tds,
                odor,
                filter: expert_label(turbidity, coliforms, metals, tds, odor),
            }
        })
        .collect();
    log::info!("dataset: generated {count} labelled samples");
    samples
}

pub fn write_csv(samples: &[LabeledSample]) -> String {
    let mut csv = String::new();
    csv.push_str(&DATASET_COLUMNS.join(","));
    csv.push('\n');
    for s in samples {
        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            s.turbidity,
            s.coliforms,
            s.metals,
            s.tds,
            u8::from(s.odor),
            s.filter.label(),
        ));
    }
    csv
}
