//! The session: one operator's purification workspace.
//!
//! PIPELINE ORDER (fixed, documented, never reordered):
//!   1. Stage sequencer          (narration only)
//!   2. Contamination index
//!   3. Filter recommendation
//!   4. Contaminant projection
//!   5. Risk profile and charts
//!   6. History ledger append, then best-effort row-store sync
//!
//! RULES:
//!   - All state lives on the session: ledger, cached artifacts, RNG bank.
//!     Two sessions never share anything.
//!   - The report reads the artifacts snapshotted by the last `run`, never
//!     the comparison cache, so it always describes the latest ledger row.
//!   - All randomness flows through the session's RngBank.
//!   - Runs execute one at a time, start to finish.

use crate::{
    charts::{default_rasterizer, ChartArtifact, ChartKind, Rasterizer},
    clock::Pacer,
    config::SimConfig,
    contamination_index::{contaminant_ratios, ContaminationIndex},
    error::{PurifierError, SimResult},
    event::PurificationEvent,
    ledger::HistoryLedger,
    projection::{ProjectedSample, TdsFocus},
    recommendation::{FilterComparison, FilterEvaluation},
    report::{self, ReportDocument, ReportInputs},
    rng::{RngBank, RngSlot},
    risk::{RiskBands, RiskProfile, TdsCompliance},
    sample::WaterSample,
    stage_sequencer::{NormalEfficiency, SequenceReport, StageSequencer},
    store::SqliteRowSink,
    sync::{RowSink, SyncOutcome},
    types::{RunNumber, SessionId},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The analysis view: index and TDS reading for a sample.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Analysis {
    pub index:          ContaminationIndex,
    pub ratios:         [f64; 4],
    pub tds_compliance: TdsCompliance,
}

/// Everything derived from the latest filter comparison. Cached on the
/// session; the report reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunArtifacts {
    pub sample:     WaterSample,
    pub index:      ContaminationIndex,
    pub comparison: FilterComparison,
    pub projected:  ProjectedSample,
    pub risk:       RiskProfile,
    pub bands:      RiskBands,
    pub tds:        TdsFocus,
    pub charts:     BTreeMap<ChartKind, ChartArtifact>,
}

impl RunArtifacts {
    pub fn recommendation(&self) -> &FilterEvaluation {
        self.comparison.recommendation()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub run:            RunNumber,
    pub sequence:       SequenceReport,
    pub index:          ContaminationIndex,
    pub recommendation: FilterEvaluation,
    pub projected:      ProjectedSample,
    pub risk:           RiskProfile,
    pub bands:          RiskBands,
    pub sync:           SyncOutcome,
    pub events:         Vec<PurificationEvent>,
}

pub struct SimSession {
    pub session_id: SessionId,
    config:         SimConfig,
    rng_bank:       RngBank,
    ledger:         HistoryLedger,
    artifacts:      Option<RunArtifacts>,
    /// Artifacts of the run behind `ledger.latest()`; written only by `run`.
    recorded:       Option<RunArtifacts>,
    rasterizer:     Box<dyn Rasterizer>,
}

impl SimSession {
    pub fn new(config: SimConfig, seed: u64) -> SimResult<Self> {
        config.validate()?;
        let session_id = uuid::Uuid::new_v4().to_string();
        log::info!("session {session_id}: started with seed {seed}");

        let mut ledger = HistoryLedger::new();
        if let Some(sync) = &config.sync {
            match SqliteRowSink::from_config(sync) {
                Ok(sink) => ledger.set_sink(Some(Box::new(sink))),
                Err(e) => log::warn!(
                    "session {session_id}: row store '{}' unavailable, sync disabled: {e}",
                    sync.sheet
                ),
            }
        }

        Ok(Self {
            session_id,
            config,
            rng_bank: RngBank::new(seed),
            ledger,
            artifacts: None,
            recorded: None,
            rasterizer: default_rasterizer(),
        })
    }

    pub fn with_sink(mut self, sink: Box<dyn RowSink>) -> Self {
        self.ledger.set_sink(Some(sink));
        self
    }

    pub fn with_rasterizer(mut self, rasterizer: Box<dyn Rasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.rng_bank.master_seed()
    }

    pub fn ledger(&self) -> &HistoryLedger {
        &self.ledger
    }

    pub fn artifacts(&self) -> Option<&RunArtifacts> {
        self.artifacts.as_ref()
    }

    pub fn analyze(&self, sample: &WaterSample) -> Analysis {
        Analysis {
            index:          ContaminationIndex::compute(sample),
            ratios:         contaminant_ratios(sample),
            tds_compliance: TdsCompliance::classify(sample.tds_mg_l() as f64),
        }
    }

    /// Evaluate every filter, project the recommended one and rebuild the
    /// cached artifacts. Does not touch the ledger.
    pub fn compare_filters(&mut self, sample: WaterSample) -> SimResult<&RunArtifacts> {
        let index = ContaminationIndex::compute(&sample);
        let comparison = FilterComparison::evaluate(&self.config.catalog, index)
            .ok_or_else(|| PurifierError::InvalidConfig("filter catalog is empty".into()))?;
        let recommendation = comparison.recommendation();
        let projected = ProjectedSample::project(sample.contaminants(), recommendation.filter.efficiency);
        let risk = RiskProfile::assess(&projected);
        let bands = risk.bands(&projected.before);
        let tds = TdsFocus::from_projection(&projected, recommendation);

        let charts = [
            ChartArtifact::filter_comparison(&comparison),
            ChartArtifact::contamination_radar(&sample),
            ChartArtifact::before_after(&projected),
            ChartArtifact::tds_before_after(&projected),
        ]
        .into_iter()
        .map(|c| (c.kind, c))
        .collect();

        Ok(&*self.artifacts.insert(RunArtifacts {
            sample,
            index,
            comparison,
            projected,
            risk,
            bands,
            tds,
            charts,
        }))
    }

    /// One full simulation run: narrate the stages, score, recommend and
    /// append to the ledger. Always runs to completion once started.
    pub fn run(
        &mut self,
        sample: WaterSample,
        pacer: &mut dyn Pacer,
        observer: &mut dyn FnMut(&PurificationEvent),
    ) -> SimResult<RunSummary> {
        let run = self.ledger.len() as RunNumber + 1;
        let mut events = Vec::new();
        let mut emit = |event: PurificationEvent, events: &mut Vec<PurificationEvent>| {
            observer(&event);
            events.push(event);
        };
        emit(PurificationEvent::RunStarted { run }, &mut events);

        let mut source = NormalEfficiency::new(
            self.rng_bank.for_run(RngSlot::Stages, run),
            &self.config.efficiency,
        )?;
        let sequencer = StageSequencer::new(
            &self.config.stages,
            self.config.efficiency,
            self.config.speed.sub_step_interval(),
        );
        let sequence = sequencer.run(&mut source, pacer, &mut |e| emit(e.clone(), &mut events));

        let artifacts = self.compare_filters(sample)?.clone();
        let recommendation = artifacts.recommendation().clone();
        emit(
            PurificationEvent::RecommendationComputed {
                filter:                recommendation.filter.name().to_string(),
                purification_estimate: recommendation.purification_estimate,
                index:                 artifacts.index.value(),
            },
            &mut events,
        );

        let sync = self.ledger.record(
            sample,
            artifacts.index,
            &recommendation,
            artifacts.projected.after.tds_mg_l,
        );
        self.recorded = Some(artifacts.clone());
        emit(
            PurificationEvent::HistoryRecorded { run, ledger_len: self.ledger.len() },
            &mut events,
        );
        if let SyncOutcome::Failed { sink, reason } = &sync {
            emit(
                PurificationEvent::SyncFailed { sink: sink.clone(), reason: reason.clone() },
                &mut events,
            );
        }

        log::info!(
            "session {}: run {run} complete, recommended {} ({:.1}%)",
            self.session_id,
            recommendation.filter.name(),
            recommendation.purification_estimate
        );

        Ok(RunSummary {
            run,
            sequence,
            index: artifacts.index,
            recommendation,
            projected: artifacts.projected,
            risk: artifacts.risk,
            bands: artifacts.bands,
            sync,
            events,
        })
    }

    /// The recommendation from the latest filter comparison.
    pub fn recommendation(&self) -> SimResult<&FilterEvaluation> {
        self.artifacts
            .as_ref()
            .map(RunArtifacts::recommendation)
            .ok_or_else(|| PurifierError::MissingPrerequisiteState {
                missing: "filter comparison".into(),
            })
    }

    pub fn tds_focus(&self) -> SimResult<&TdsFocus> {
        self.artifacts
            .as_ref()
            .map(|a| &a.tds)
            .ok_or_else(|| PurifierError::MissingPrerequisiteState {
                missing: "recommended filter for the TDS analysis".into(),
            })
    }

    pub fn export_history_csv(&self) -> String {
        self.ledger.export_csv()
    }

    /// Assemble the report for the latest recorded run. A `compare_filters`
    /// issued after that run does not leak into the report.
    pub fn generate_report(&self) -> SimResult<ReportDocument> {
        let inputs = ReportInputs {
            latest:     self.ledger.latest(),
            comparison: self.recorded.as_ref().map(|a| &a.comparison),
            charts:     self.recorded.as_ref().map(|a| &a.charts),
            tds:        self.recorded.as_ref().map(|a| &a.tds),
        };
        let result = report::assemble(inputs, self.rasterizer.as_ref());
        if let Err(e) = &result {
            if e.is_advisory() {
                log::warn!("session {}: report skipped: {e}", self.session_id);
            } else {
                log::error!("session {}: report failed: {e}", self.session_id);
            }
        }
        result
    }
}
