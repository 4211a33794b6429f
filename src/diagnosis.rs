//! Result aggregation and diagnosis tiers
//!
//! Normalizes each trial to 0-100, averages the three, and maps the
//! composite onto five ordered tiers:
//! - >= 80: Super esper
//! - >= 60: Advanced esper candidate
//! - >= 40: Intermediate esper
//! - >= 20: Novice esper
//! - otherwise: Ordinary human

use crate::registry::{RegistrySnapshot, TrialResult};
use serde::Serialize;

/// Diagnosis tier, lowest to highest
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Tier {
    OrdinaryHuman,
    NoviceEsper,
    IntermediateEsper,
    AdvancedEsper,
    SuperEsper,
}

impl Tier {
    /// Highest tier whose inclusive lower bound the score reaches
    pub fn from_score(score: u32) -> Self {
        match score {
            80.. => Tier::SuperEsper,
            60..=79 => Tier::AdvancedEsper,
            40..=59 => Tier::IntermediateEsper,
            20..=39 => Tier::NoviceEsper,
            _ => Tier::OrdinaryHuman,
        }
    }

    /// 1 (lowest) through 5 (highest)
    pub fn rank(self) -> u8 {
        match self {
            Tier::OrdinaryHuman => 1,
            Tier::NoviceEsper => 2,
            Tier::IntermediateEsper => 3,
            Tier::AdvancedEsper => 4,
            Tier::SuperEsper => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::OrdinaryHuman => "Ordinary human",
            Tier::NoviceEsper => "Novice esper",
            Tier::IntermediateEsper => "Intermediate esper",
            Tier::AdvancedEsper => "Advanced esper candidate",
            Tier::SuperEsper => "Super esper",
        }
    }

    pub fn remark(self) -> &'static str {
        match self {
            Tier::OrdinaryHuman => "no special abilities, for now",
            Tier::NoviceEsper => "latent potential detected",
            Tier::IntermediateEsper => "a little sharper than most",
            Tier::AdvancedEsper => "remarkably high ability",
            Tier::SuperEsper => "report to the research institute",
        }
    }
}

/// `x / y * 100` rounded half up, in integers
fn rounded_percent(numerator: u32, denominator: u32) -> u32 {
    if denominator == 0 {
        return 0;
    }
    let n = numerator as u64;
    let d = denominator as u64;
    ((200 * n + d) / (2 * d)) as u32
}

/// Map one registry entry onto 0-100
pub fn normalize(result: TrialResult) -> u32 {
    match result {
        TrialResult::Score { points } => points.min(100),
        TrialResult::Tally { correct, trials } => rounded_percent(correct.min(trials), trials),
    }
}

/// One trial's line on the result screen
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TrialLine {
    pub raw: TrialResult,
    pub percent: u32,
}

impl TrialLine {
    fn from_result(raw: TrialResult) -> Self {
        TrialLine {
            raw,
            percent: normalize(raw),
        }
    }
}

/// Read-only composite view handed to the presentation layer
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CompositeView {
    pub telekinesis: TrialLine,
    pub clairvoyance: TrialLine,
    pub precognition: TrialLine,
    pub composite_score: u32,
    pub tier: Tier,
    pub tier_label: &'static str,
}

impl CompositeView {
    pub fn percentages(&self) -> [u32; 3] {
        [
            self.telekinesis.percent,
            self.clairvoyance.percent,
            self.precognition.percent,
        ]
    }
}

/// Pure function of the registry snapshot
pub fn diagnose(snapshot: &RegistrySnapshot) -> CompositeView {
    let telekinesis = TrialLine::from_result(snapshot.telekinesis);
    let clairvoyance = TrialLine::from_result(snapshot.clairvoyance);
    let precognition = TrialLine::from_result(snapshot.precognition);

    let sum = telekinesis.percent + clairvoyance.percent + precognition.percent;
    let composite_score = rounded_percent(sum, 300);
    let tier = Tier::from_score(composite_score);

    CompositeView {
        telekinesis,
        clairvoyance,
        precognition,
        composite_score,
        tier,
        tier_label: tier.label(),
    }
}
