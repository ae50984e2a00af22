//! Filter catalog and recommendation engine.
//!
//! Every catalog entry is evaluated against the contamination index:
//!
//!   purification_estimate = efficiency × (100 − index)
//!
//! The recommendation is the entry with the largest estimate. On an exact
//! tie the entry listed first in the catalog wins; see `prefer`.

use crate::{contamination_index::ContaminationIndex, types::Percent};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    ActivatedCarbon,
    ReverseOsmosis,
    Zeolite,
    Nanofiber,
    Ultrafiltration,
}

impl FilterKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ActivatedCarbon => "Activated carbon",
            Self::ReverseOsmosis  => "Reverse osmosis",
            Self::Zeolite         => "Zeolite",
            Self::Nanofiber       => "Nanofiber",
            Self::Ultrafiltration => "Ultrafiltration",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        [
            Self::ActivatedCarbon,
            Self::ReverseOsmosis,
            Self::Zeolite,
            Self::Nanofiber,
            Self::Ultrafiltration,
        ]
        .into_iter()
        .find(|k| k.label() == label.trim())
    }
}

/// A catalog entry. The catalog is an ordered list; order is significant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterProfile {
    pub kind:       FilterKind,
    /// Base efficiency as a fraction in (0, 1).
    pub efficiency: f64,
}

impl FilterProfile {
    pub fn new(kind: FilterKind, efficiency: f64) -> Self {
        Self { kind, efficiency }
    }

    pub fn name(&self) -> &'static str {
        self.kind.label()
    }
}

/// The fixed catalog in its canonical order.
pub fn default_catalog() -> Vec<FilterProfile> {
    vec![
        FilterProfile::new(FilterKind::ActivatedCarbon, 0.70),
        FilterProfile::new(FilterKind::ReverseOsmosis,  0.97),
        FilterProfile::new(FilterKind::Zeolite,         0.80),
        FilterProfile::new(FilterKind::Nanofiber,       0.92),
        FilterProfile::new(FilterKind::Ultrafiltration, 0.88),
    ]
}

/// One row of the comparison table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterEvaluation {
    pub filter:                FilterProfile,
    pub base_efficiency_pct:   Percent,
    pub purification_estimate: Percent,
}

impl FilterEvaluation {
    pub fn evaluate(filter: &FilterProfile, index: ContaminationIndex) -> Self {
        Self {
            filter:                filter.clone(),
            base_efficiency_pct:   filter.efficiency * 100.0,
            purification_estimate: filter.efficiency * index.remaining(),
        }
    }
}

/// The full evaluation table plus the position of the selected entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterComparison {
    pub evaluations: Vec<FilterEvaluation>,
    recommended:     usize,
}

impl FilterComparison {
    /// Returns None only for an empty catalog.
    pub fn evaluate(catalog: &[FilterProfile], index: ContaminationIndex) -> Option<Self> {
        let evaluations: Vec<FilterEvaluation> = catalog
            .iter()
            .map(|f| FilterEvaluation::evaluate(f, index))
            .collect();

        let mut best: Option<usize> = None;
        for (i, candidate) in evaluations.iter().enumerate() {
            best = match best {
                Some(b) if prefer(&evaluations[b], candidate) != Ordering::Less => Some(b),
                _ => Some(i),
            };
        }

        let recommended = best?;
        let chosen = &evaluations[recommended];
        log::debug!(
            "recommendation: {} estimate={:.3}% (index={:.3})",
            chosen.filter.name(),
            chosen.purification_estimate,
            index.value()
        );
        Some(Self { evaluations, recommended })
    }

    pub fn recommendation(&self) -> &FilterEvaluation {
        &self.evaluations[self.recommended]
    }

    pub fn recommended_position(&self) -> usize {
        self.recommended
    }
}

/// Tie-break comparator between the current best (`incumbent`, earlier in
/// the catalog) and a later `challenger`.
///
/// Returns `Less` only when the challenger has a strictly larger estimate;
/// an exact tie keeps the incumbent.
pub fn prefer(incumbent: &FilterEvaluation, challenger: &FilterEvaluation) -> Ordering {
    if challenger.purification_estimate > incumbent.purification_estimate {
        Ordering::Less
    } else if challenger.purification_estimate == incumbent.purification_estimate {
        Ordering::Equal
    } else {
        Ordering::Greater
    }
}
