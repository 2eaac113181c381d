use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::definitions::{GRID_HEIGHT, GRID_WIDTH};
use crate::GrayGrid;

/// A 64-bit gradient-based perceptual hash of one image.
///
/// Each bit encodes the sign of one horizontal intensity gradient in the
/// 9x8 grid: within each of the 8 rows, each of the 8 adjacent column
/// pairs contributes a set bit when the left pixel is strictly darker
/// than the right. Bits accumulate row-major, left to right, most
/// significant bit first.
///
/// The same encoder must produce both the table and the query
/// fingerprints; distances between fingerprints from different encoders
/// are meaningless.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Encode a grayscale grid. Deterministic: a pure function of the
    /// input pixels.
    #[must_use]
    pub fn from_grid(grid: &GrayGrid) -> Self {
        let mut hash = 0u64;
        for row in 0..GRID_HEIGHT {
            for col in 0..GRID_WIDTH - 1 {
                let rising = grid.intensity(row, col) < grid.intensity(row, col + 1);
                hash = (hash << 1) | u64::from(rising);
            }
        }
        Self(hash)
    }

    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn to_raw(self) -> u64 {
        self.0
    }

    /// The number of differing bits between two fingerprints. Always in
    /// `0..=64`; zero against itself; symmetric.
    #[must_use]
    pub const fn hamming_distance(self, other: Self) -> u32 {
        (self.0 ^ other.0).count_ones()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({:016x})", self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str_radix(s, 16).map(Self)
    }
}

//Fingerprints travel as 16-digit hex strings so that table files remain
//greppable against the hashes the indexer logs.
impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

//Utilities for testing
#[doc(hidden)]
#[cfg(any(feature = "test-util", test))]
pub mod test_util {
    use rand::prelude::*;

    use super::Fingerprint;

    impl Fingerprint {
        #[must_use]
        pub fn random_fingerprint(rng: &mut StdRng) -> Self {
            Self(rng.random())
        }

        //derive a fingerprint at an exact hamming distance by flipping
        //that many distinct bits
        #[must_use]
        pub fn with_distance(self, target_distance: u32, rng: &mut StdRng) -> Self {
            let mut ret = self;
            for bit in rand::seq::index::sample(rng, 64, target_distance as usize) {
                ret.0 ^= 1u64 << bit;
            }
            assert_eq!(self.hamming_distance(ret), target_distance);
            ret
        }
    }
}
