//! Random sampling for trial payloads
//!
//! All trials draw through `RandomSource`, so a test can swap in a scripted
//! sequence and a run can be reproduced from a seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform integer source shared by every trial
pub trait RandomSource {
    /// Uniform integer in `[min, max]`, both inclusive
    fn uniform_int(&mut self, min: i64, max: i64) -> i64;

    /// Uniform index into a collection of `len` items
    fn choice_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.uniform_int(0, len as i64 - 1) as usize
    }
}

/// Uniform pick from a non-empty ordered collection
pub fn choice<'a, T, R>(rng: &mut R, items: &'a [T]) -> Option<&'a T>
where
    R: RandomSource + ?Sized,
{
    if items.is_empty() {
        return None;
    }
    items.get(rng.choice_index(items.len()))
}

/// Uniform pick from `items` with every element equal to `excluded` removed
pub fn choice_excluding<'a, T, R>(rng: &mut R, items: &'a [T], excluded: &T) -> Option<&'a T>
where
    T: PartialEq,
    R: RandomSource + ?Sized,
{
    let complement: Vec<&'a T> = items.iter().filter(|item| *item != excluded).collect();
    if complement.is_empty() {
        return None;
    }
    Some(complement[rng.choice_index(complement.len())])
}

/// `StdRng`-backed source, from entropy or a fixed seed
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    pub fn from_entropy() -> Self {
        StdRandom {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        StdRandom {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for StdRandom {
    fn uniform_int(&mut self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }
}

/// Replays a fixed sequence of draws; panics when a draw falls outside the
/// requested range or the script runs out.
#[cfg(test)]
pub struct ScriptedRandom {
    values: std::collections::VecDeque<i64>,
}

#[cfg(test)]
impl ScriptedRandom {
    pub fn new(values: &[i64]) -> Self {
        ScriptedRandom {
            values: values.iter().copied().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
impl RandomSource for ScriptedRandom {
    fn uniform_int(&mut self, min: i64, max: i64) -> i64 {
        let value = self.values.pop_front().expect("scripted random exhausted");
        assert!(
            (min..=max).contains(&value),
            "scripted value {value} outside [{min}, {max}]"
        );
        value
    }
}
