use core::fmt;

use serde::{Deserialize, Serialize};

/// Index vector recording the level of a graded element, one component per slot.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Level(Vec<u32>);

impl Level {
    pub fn new(components: Vec<u32>) -> Self {
        Self(components)
    }

    /// The all-zero index (plaintext constants).
    pub fn zero(slots: usize) -> Self {
        Self(vec![0; slots])
    }

    /// Count vector over `slots` components with one increment per listed
    /// slot; slots past the end are ignored.
    pub fn covering(slots: usize, covered: impl IntoIterator<Item = usize>) -> Self {
        let mut v = vec![0; slots];
        for slot in covered {
            if let Some(c) = v.get_mut(slot) {
                *c += 1;
            }
        }
        Self(v)
    }

    pub fn components(&self) -> &[u32] {
        &self.0
    }

    pub fn slots(&self) -> usize {
        self.0.len()
    }

    /// Component-wise sum; `None` on slot-count mismatch or overflow.
    pub fn checked_add(&self, other: &Level) -> Option<Level> {
        if self.slots() != other.slots() {
            return None;
        }
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| a.checked_add(*b))
            .collect::<Option<Vec<_>>>()
            .map(Level)
    }

    /// Component-wise difference; `None` if any component would go negative.
    pub fn checked_sub(&self, other: &Level) -> Option<Level> {
        if self.slots() != other.slots() {
            return None;
        }
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| a.checked_sub(*b))
            .collect::<Option<Vec<_>>>()
            .map(Level)
    }

    /// True iff every component is at most the corresponding `top` component.
    pub fn fits_within(&self, top: &Level) -> bool {
        self.slots() == top.slots() && self.0.iter().zip(&top.0).all(|(a, t)| a <= t)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Level{:?}", self.0)
    }
}

impl From<Vec<u32>> for Level {
    fn from(v: Vec<u32>) -> Self {
        Level(v)
    }
}
