//! Stage sequencer: the narrated purification process.
//!
//! A linear state machine over the configured stages:
//!
//!   NotStarted → Running{stage 0} → … → Running{stage n-1} → Completed
//!
//! Each stage runs `weight` sub-steps. Every sub-step pauses once and adds
//! 1/total_weight to the progress. When a stage's sub-steps are done, one
//! efficiency is drawn and clipped to the model's range.
//!
//! RULES:
//!   - Once `run` is called the sequence always reaches Completed.
//!   - Stages never reorder and never overlap.
//!   - Nothing here feeds back into scoring or recommendation.

use crate::{
    clock::Pacer,
    error::{PurifierError, SimResult},
    event::PurificationEvent,
    types::Percent,
};
use rand::RngCore;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageConfig {
    pub name:    String,
    /// Duration units; one sub-step each.
    pub weight:  u32,
    pub message: String,
}

impl StageConfig {
    fn new(name: &str, weight: u32, message: &str) -> Self {
        Self { name: name.into(), weight, message: message.into() }
    }
}

pub fn default_stage_plan() -> Vec<StageConfig> {
    vec![
        StageConfig::new("Pre-filtration", 2, "Removing large solids and visible debris..."),
        StageConfig::new("Sedimentation", 3, "Separating suspended particles..."),
        StageConfig::new("Nanotechnological adsorption", 4, "Capturing heavy metals..."),
        StageConfig::new("UV disinfection", 4, "Inactivating bacteria, viruses and coliforms..."),
        StageConfig::new("Final polishing", 2, "Improving odor, color and taste..."),
    ]
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EfficiencyModel {
    pub mean:    f64,
    pub std_dev: f64,
    pub min:     Percent,
    pub max:     Percent,
}

impl Default for EfficiencyModel {
    fn default() -> Self {
        Self { mean: 85.0, std_dev: 10.0, min: 60.0, max: 99.9 }
    }
}

impl EfficiencyModel {
    pub fn clip(&self, raw: f64) -> Percent {
        raw.clamp(self.min, self.max)
    }
}

/// Supplies raw (unclipped) per-stage efficiency draws.
pub trait EfficiencySource {
    fn draw(&mut self) -> f64;
}

/// Normal(mean, std_dev) over an injected random stream.
pub struct NormalEfficiency<R> {
    rng:    R,
    normal: Normal<f64>,
}

impl<R: RngCore> NormalEfficiency<R> {
    pub fn new(rng: R, model: &EfficiencyModel) -> SimResult<Self> {
        let normal = Normal::new(model.mean, model.std_dev)
            .map_err(|e| PurifierError::InvalidConfig(format!("efficiency model: {e}")))?;
        Ok(Self { rng, normal })
    }
}

impl<R: RngCore> EfficiencySource for NormalEfficiency<R> {
    fn draw(&mut self) -> f64 {
        self.normal.sample(&mut self.rng)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SequencerState {
    NotStarted,
    Running { stage: usize, sub_step: u32 },
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageResult {
    pub name:       String,
    pub weight:     u32,
    pub efficiency: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SequenceReport {
    pub stages:   Vec<StageResult>,
    pub events:   Vec<PurificationEvent>,
    /// Accumulated progress, capped at 1.0.
    pub progress: f64,
    pub final_state: SequencerState,
}

pub struct StageSequencer<'a> {
    plan:         &'a [StageConfig],
    model:        EfficiencyModel,
    interval:     Duration,
    state:        SequencerState,
    progress:     f64,
    total_weight: u32,
}

impl<'a> StageSequencer<'a> {
    pub fn new(plan: &'a [StageConfig], model: EfficiencyModel, interval: Duration) -> Self {
        Self {
            plan,
            model,
            interval,
            state: SequencerState::NotStarted,
            progress: 0.0,
            total_weight: plan.iter().map(|s| s.weight).sum(),
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn total_weight(&self) -> u32 {
        self.total_weight
    }

    /// Trigger the sequence and drive it to completion.
    pub fn run(
        mut self,
        source: &mut dyn EfficiencySource,
        pacer: &mut dyn Pacer,
        observer: &mut dyn FnMut(&PurificationEvent),
    ) -> SequenceReport {
        let mut events = Vec::new();
        let mut emit = |event: PurificationEvent, events: &mut Vec<PurificationEvent>| {
            observer(&event);
            events.push(event);
        };
        let step = if self.total_weight > 0 { 1.0 / self.total_weight as f64 } else { 0.0 };
        let mut results = Vec::with_capacity(self.plan.len());

        for (index, stage) in self.plan.iter().enumerate() {
            self.state = SequencerState::Running { stage: index, sub_step: 0 };
            emit(
                PurificationEvent::StageStarted {
                    stage:   stage.name.clone(),
                    message: stage.message.clone(),
                },
                &mut events,
            );

            for sub_step in 0..stage.weight {
                self.state = SequencerState::Running { stage: index, sub_step };
                pacer.pause(self.interval);
                self.progress += step;
                log::debug!(
                    "stage {} sub-step {}/{} progress={:.3}",
                    stage.name,
                    sub_step + 1,
                    stage.weight,
                    self.progress
                );
                emit(
                    PurificationEvent::ProgressAdvanced {
                        stage:    stage.name.clone(),
                        progress: self.progress.min(1.0),
                    },
                    &mut events,
                );
            }

            let efficiency = self.model.clip(source.draw());
            emit(
                PurificationEvent::StageCompleted { stage: stage.name.clone(), efficiency },
                &mut events,
            );
            results.push(StageResult {
                name: stage.name.clone(),
                weight: stage.weight,
                efficiency,
            });
        }

        self.state = SequencerState::Completed;
        emit(PurificationEvent::SequenceCompleted { stages: results.len() }, &mut events);

        SequenceReport {
            stages:   results,
            events,
            progress: self.progress.min(1.0),
            final_state: self.state,
        }
    }
}
