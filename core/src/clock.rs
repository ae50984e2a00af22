//! Stage clock: pacing speed and the pause between stage sub-steps.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SimSpeed {
    #[default]
    Normal,       // 700 ms per sub-step, the narrated pace
    Accelerated,  // 100 ms per sub-step
    Instant,      // no pause; batch runs and tests
}

impl SimSpeed {
    pub fn sub_step_interval(&self) -> Duration {
        match self {
            Self::Normal      => Duration::from_millis(700),
            Self::Accelerated => Duration::from_millis(100),
            Self::Instant     => Duration::ZERO,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "normal"      => Some(Self::Normal),
            "accelerated" => Some(Self::Accelerated),
            "instant"     => Some(Self::Instant),
            _ => None,
        }
    }
}

/// Suspends the sequencer between sub-steps.
pub trait Pacer {
    fn pause(&mut self, interval: Duration);
}

/// Blocks the calling thread for the full interval.
pub struct ThreadSleepPacer;

impl Pacer for ThreadSleepPacer {
    fn pause(&mut self, interval: Duration) {
        if !interval.is_zero() {
            std::thread::sleep(interval);
        }
    }
}

/// Records requested pauses without sleeping.
#[derive(Debug, Default)]
pub struct RecordingPacer {
    pub pauses: Vec<Duration>,
}

impl Pacer for RecordingPacer {
    fn pause(&mut self, interval: Duration) {
        self.pauses.push(interval);
    }
}
