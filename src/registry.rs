//! Cross-trial score registry
//!
//! One entry per trial, written when the trial finishes and read by the
//! diagnosis screen. Lives for a single in-memory playthrough.

use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;

/// The three trials of a playthrough
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrialId {
    /// Motor-control: push a ball onto a target
    Telekinesis,
    /// Forced-choice perception: find the target symbol among 3 cards
    Clairvoyance,
    /// Prediction: guess a digit before it is drawn
    Precognition,
}

impl TrialId {
    pub const ALL: [TrialId; 3] = [
        TrialId::Telekinesis,
        TrialId::Clairvoyance,
        TrialId::Precognition,
    ];

    /// Registry key
    pub fn key(self) -> &'static str {
        match self {
            TrialId::Telekinesis => "telekinesis",
            TrialId::Clairvoyance => "clairvoyance",
            TrialId::Precognition => "precognition",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            TrialId::Telekinesis => "Telekinesis Test",
            TrialId::Clairvoyance => "Clairvoyance Test",
            TrialId::Precognition => "Precognition Test",
        }
    }
}

impl fmt::Display for TrialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Stored outcome of a finished trial
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TrialResult {
    /// Already on a 0-100 scale
    Score { points: u32 },
    /// Correct answers out of trials
    Tally { correct: u32, trials: u32 },
}

impl TrialResult {
    /// Value used for a trial that never finished: 0 points, or 0 of 1
    pub fn neutral(trial: TrialId) -> Self {
        match trial {
            TrialId::Telekinesis => TrialResult::Score { points: 0 },
            TrialId::Clairvoyance | TrialId::Precognition => {
                TrialResult::Tally { correct: 0, trials: 1 }
            }
        }
    }
}

/// Process-wide key/value store of finished-trial results
#[derive(Clone, Debug, Default)]
pub struct ScoreRegistry {
    entries: FxHashMap<TrialId, TrialResult>,
}

impl ScoreRegistry {
    pub fn new() -> Self {
        ScoreRegistry {
            entries: FxHashMap::default(),
        }
    }

    /// Unconditional overwrite; a replayed trial replaces its earlier result
    pub fn set(&mut self, trial: TrialId, result: TrialResult) {
        tracing::info!(trial = %trial, ?result, "recorded trial result");
        self.entries.insert(trial, result);
    }

    /// Stored result, or `default` when the trial has not finished yet
    pub fn get(&self, trial: TrialId, default: TrialResult) -> TrialResult {
        self.entries.get(&trial).copied().unwrap_or(default)
    }

    pub fn get_or_neutral(&self, trial: TrialId) -> TrialResult {
        self.get(trial, TrialResult::neutral(trial))
    }

    pub fn contains(&self, trial: TrialId) -> bool {
        self.entries.contains_key(&trial)
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            telekinesis: self.get_or_neutral(TrialId::Telekinesis),
            clairvoyance: self.get_or_neutral(TrialId::Clairvoyance),
            precognition: self.get_or_neutral(TrialId::Precognition),
        }
    }
}

/// Registry contents at the moment the diagnosis is requested
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegistrySnapshot {
    pub telekinesis: TrialResult,
    pub clairvoyance: TrialResult,
    pub precognition: TrialResult,
}

/// Shared state handed to every trial of a playthrough.
///
/// Each trial writes only its own key, and only from its runner once the
/// session reaches `Finished`.
#[derive(Debug)]
pub struct PlaythroughContext {
    pub registry: ScoreRegistry,
}

impl PlaythroughContext {
    pub fn new() -> Self {
        PlaythroughContext {
            registry: ScoreRegistry::new(),
        }
    }

    pub fn completed(&self) -> Vec<TrialId> {
        TrialId::ALL
            .into_iter()
            .filter(|&t| self.registry.contains(t))
            .collect()
    }
}
