//! Dice Engine - uniform die rolls with visible faces
//!
//! All randomness in a duel flows through a [`DiceSource`]. The default
//! source wraps any `rand` RNG; [`ScriptedDice`] replays fixed faces for
//! deterministic tests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Result of a composite roll: the sum plus every individual face
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRoll {
    pub total: i32,
    pub faces: Vec<u32>,
}

impl DiceRoll {
    fn from_faces(faces: Vec<u32>) -> Self {
        let total = faces.iter().map(|&f| f as i32).sum();
        DiceRoll { total, faces }
    }

    /// Whether any die shows the given face
    pub fn has_face(&self, face: u32) -> bool {
        self.faces.contains(&face)
    }
}

/// Injectable source of die rolls
pub trait DiceSource {
    /// Roll a single die, uniform in `[1, faces]`
    fn roll_d(&mut self, faces: u32) -> u32;

    /// Roll two dice of the same size
    fn roll_pair(&mut self, faces: u32) -> DiceRoll {
        let first = self.roll_d(faces);
        let second = self.roll_d(faces);
        DiceRoll::from_faces(vec![first, second])
    }

    /// Roll three dice of the same size
    fn roll_triple(&mut self, faces: u32) -> DiceRoll {
        let first = self.roll_d(faces);
        let second = self.roll_d(faces);
        let third = self.roll_d(faces);
        DiceRoll::from_faces(vec![first, second, third])
    }

    /// Pick an index uniformly from `0..len` (len must be non-zero)
    fn pick_index(&mut self, len: usize) -> usize {
        (self.roll_d(len as u32) - 1) as usize
    }
}

/// Dice backed by any `rand` RNG
#[derive(Debug, Clone)]
pub struct RngDice<R: Rng> {
    rng: R,
}

impl<R: Rng> RngDice<R> {
    /// Wrap an existing RNG
    pub fn new(rng: R) -> Self {
        RngDice { rng }
    }

    /// Give the RNG back
    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl RngDice<ChaCha8Rng> {
    /// Reproducible dice from a seed
    pub fn seeded(seed: u64) -> Self {
        RngDice::new(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> DiceSource for RngDice<R> {
    fn roll_d(&mut self, faces: u32) -> u32 {
        if faces <= 1 {
            return 1;
        }
        self.rng.gen_range(1..=faces)
    }
}

/// Dice that replay a queue of faces
///
/// Each queued value is clamped into the requested die's range. Once the
/// queue runs dry every roll returns the die's maximum face.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    queue: VecDeque<u32>,
    rolls_made: usize,
}

impl ScriptedDice {
    /// Dice that always roll the maximum face
    pub fn max_rolls() -> Self {
        ScriptedDice::default()
    }

    /// Dice that replay `faces` in order, then roll maximums
    pub fn from_faces(faces: impl IntoIterator<Item = u32>) -> Self {
        ScriptedDice {
            queue: faces.into_iter().collect(),
            rolls_made: 0,
        }
    }

    /// Append more faces to the queue
    pub fn push(&mut self, face: u32) {
        self.queue.push_back(face);
    }

    /// Faces still queued
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Total rolls served so far
    pub fn rolls_made(&self) -> usize {
        self.rolls_made
    }
}

impl DiceSource for ScriptedDice {
    fn roll_d(&mut self, faces: u32) -> u32 {
        self.rolls_made += 1;
        let faces = faces.max(1);
        match self.queue.pop_front() {
            Some(face) => face.clamp(1, faces),
            None => faces,
        }
    }
}
