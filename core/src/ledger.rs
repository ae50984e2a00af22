//! History ledger: append-only record of completed runs.
//!
//! RULES:
//!   - `record` is the only mutation. Nothing is updated, reordered or
//!     pruned for the lifetime of the session.
//!   - The local append happens before the optional row-store write, and
//!     a failed write never undoes it.

use crate::{
    contamination_index::ContaminationIndex,
    error::{PurifierError, SimResult},
    recommendation::FilterEvaluation,
    sample::{Odor, WaterSample},
    sync::{self, RowSink, SyncOutcome},
    types::RunNumber,
};
use serde::{Deserialize, Serialize};

/// Export columns, in contract order. The row store expects exactly these.
pub const EXPORT_COLUMNS: [&str; 10] = [
    "pH",
    "Turbidez_NTU",
    "Coliformes_NMP_100ml",
    "Metales_ppm",
    "TDS_mgL",
    "Olor",
    "Nivel_contaminacion_%",
    "Filtro_recomendado",
    "Purificacion_recomendada_%",
    "TDS_filtrado_mgL",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryRecord {
    pub run:            RunNumber,
    pub sample:         WaterSample,
    pub index:          ContaminationIndex,
    pub recommendation: FilterEvaluation,
    pub projected_tds:  f64,
}

impl HistoryRecord {
    /// Flat tabular form. Purification is rounded to 0.1 and projected
    /// TDS to 0.01, as shown to the operator.
    pub fn to_row(&self) -> LedgerRow {
        LedgerRow {
            ph:                 self.sample.ph(),
            turbidity_ntu:      self.sample.turbidity_ntu(),
            coliforms:          self.sample.coliforms(),
            metals_ppm:         self.sample.metals_ppm(),
            tds_mg_l:           self.sample.tds_mg_l(),
            odor:               self.sample.odor(),
            contamination_pct:  self.index.value(),
            recommended_filter: self.recommendation.filter.name().to_string(),
            purification_pct:   round_to(self.recommendation.purification_estimate, 1),
            filtered_tds_mg_l:  round_to(self.projected_tds, 2),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerRow {
    pub ph:                 f64,
    pub turbidity_ntu:      f64,
    pub coliforms:          u32,
    pub metals_ppm:         f64,
    pub tds_mg_l:           u32,
    pub odor:               Odor,
    pub contamination_pct:  f64,
    pub recommended_filter: String,
    pub purification_pct:   f64,
    pub filtered_tds_mg_l:  f64,
}

impl LedgerRow {
    /// Cell values in `EXPORT_COLUMNS` order.
    pub fn cells(&self) -> [String; 10] {
        [
            self.ph.to_string(),
            self.turbidity_ntu.to_string(),
            self.coliforms.to_string(),
            self.metals_ppm.to_string(),
            self.tds_mg_l.to_string(),
            self.odor.label().to_string(),
            self.contamination_pct.to_string(),
            self.recommended_filter.clone(),
            self.purification_pct.to_string(),
            self.filtered_tds_mg_l.to_string(),
        ]
    }

    fn parse(line_no: usize, line: &str) -> SimResult<Self> {
        let cells: Vec<&str> = line.split(',').collect();
        if cells.len() != EXPORT_COLUMNS.len() {
            return Err(PurifierError::MalformedExport {
                line:   line_no,
                reason: format!("expected {} cells, found {}", EXPORT_COLUMNS.len(), cells.len()),
            });
        }
        let bad = |col: usize| PurifierError::MalformedExport {
            line:   line_no,
            reason: format!("cannot parse {} from '{}'", EXPORT_COLUMNS[col], cells[col]),
        };
        Ok(Self {
            ph:                 cells[0].parse().map_err(|_| bad(0))?,
            turbidity_ntu:      cells[1].parse().map_err(|_| bad(1))?,
            coliforms:          cells[2].parse().map_err(|_| bad(2))?,
            metals_ppm:         cells[3].parse().map_err(|_| bad(3))?,
            tds_mg_l:           cells[4].parse().map_err(|_| bad(4))?,
            odor:               Odor::from_label(cells[5]).ok_or_else(|| bad(5))?,
            contamination_pct:  cells[6].parse().map_err(|_| bad(6))?,
            recommended_filter: cells[7].to_string(),
            purification_pct:   cells[8].parse().map_err(|_| bad(8))?,
            filtered_tds_mg_l:  cells[9].parse().map_err(|_| bad(9))?,
        })
    }
}

/// Render rows as CSV with the contract header.
/// No cell contains a comma: numbers, odor labels and catalog names only.
pub fn write_csv(rows: &[LedgerRow]) -> String {
    let mut csv = String::new();
    csv.push_str(&EXPORT_COLUMNS.join(","));
    csv.push('\n');
    for row in rows {
        csv.push_str(&row.cells().join(","));
        csv.push('\n');
    }
    csv
}

/// Parse a CSV produced by `write_csv`. The header must match exactly.
pub fn parse_csv(text: &str) -> SimResult<Vec<LedgerRow>> {
    let mut lines = text.lines();
    let header = lines.next().unwrap_or_default();
    let expected = EXPORT_COLUMNS.join(",");
    if header.trim_end() != expected {
        return Err(PurifierError::MalformedExport {
            line:   1,
            reason: format!("header '{header}' does not match '{expected}'"),
        });
    }
    lines
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| LedgerRow::parse(i + 2, l.trim_end()))
        .collect()
}

#[derive(Default)]
pub struct HistoryLedger {
    records: Vec<HistoryRecord>,
    sink:    Option<Box<dyn RowSink>>,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger that mirrors every append to an external row store.
    pub fn with_sink(sink: Box<dyn RowSink>) -> Self {
        Self { records: Vec::new(), sink: Some(sink) }
    }

    pub fn set_sink(&mut self, sink: Option<Box<dyn RowSink>>) {
        self.sink = sink;
    }

    /// Append one completed run, then mirror it best-effort.
    pub fn record(
        &mut self,
        sample: WaterSample,
        index: ContaminationIndex,
        recommendation: &FilterEvaluation,
        projected_tds: f64,
    ) -> SyncOutcome {
        let record = HistoryRecord {
            run: self.records.len() as RunNumber + 1,
            sample,
            index,
            recommendation: recommendation.clone(),
            projected_tds,
        };
        let row = record.to_row();
        self.records.push(record);
        log::info!(
            "history: recorded run {} ({} -> {})",
            self.records.len(),
            row.recommended_filter,
            row.purification_pct
        );

        match self.sink.as_deref_mut() {
            Some(sink) => sync::best_effort(sink, &row),
            None => SyncOutcome::Disabled,
        }
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn latest(&self) -> Option<&HistoryRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn rows(&self) -> Vec<LedgerRow> {
        self.records.iter().map(HistoryRecord::to_row).collect()
    }

    pub fn export_csv(&self) -> String {
        write_csv(&self.rows())
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_matches_display_precision() {
        assert_eq!(round_to(65.475, 1), 65.5);
        assert_eq!(round_to(19.500000000000018, 2), 19.5);
    }

    #[test]
    fn header_mismatch_is_rejected() {
        let err = parse_csv("pH,Turbidez\n7,1\n").unwrap_err();
        assert!(matches!(err, PurifierError::MalformedExport { line: 1, .. }));
    }

    #[test]
    fn empty_ledger_exports_header_only() {
        let csv = HistoryLedger::new().export_csv();
        assert_eq!(csv.lines().count(), 1);
        assert!(parse_csv(&csv).unwrap().is_empty());
    }
}
