//! Injectable randomness for synthetic output.
//!
//! Every function that jitters or synthesizes values takes a
//! `&mut dyn RandomSource`. Production code hands in a thread-local RNG;
//! tests use a seeded `StdRng` or a [`ScriptedSource`].
use rand::rngs::{StdRng, ThreadRng};
use rand::Rng;

/// A source of uniform floats in `[0, 1)`.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

impl RandomSource for ThreadRng {
    fn next_f64(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

impl RandomSource for StdRng {
    fn next_f64(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Replays a fixed list of values, cycling when exhausted.
///
/// Values are clamped into `[0, 1)`. An empty script always yields `0.0`.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedSource {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, cursor: 0 }
    }

    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for ScriptedSource {
    fn next_f64(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0 - f64::EPSILON)
        }
    }
}

/// Uniform float in `[low, high)`.
pub fn uniform(rng: &mut dyn RandomSource, low: f64, high: f64) -> f64 {
    low + (high - low) * rng.next_f64()
}

/// Uniform integer in `[low, high]` (both ends inclusive).
pub fn int_inclusive(rng: &mut dyn RandomSource, low: u64, high: u64) -> u64 {
    debug_assert!(low <= high);
    let span = high - low;
    let offset = (rng.next_f64() * (span + 1) as f64) as u64;
    low + offset.min(span)
}
