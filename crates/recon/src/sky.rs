//! Seven-field sky-condition codes and their comparison algebra.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ReconError;

/// Number of digits in a rendered code.
pub const CODE_LEN: usize = 7;

/// Field value produced by [`CompareMode::Match`] when the inputs disagree.
pub const MISMATCH: u8 = 9;

// ---------------------------------------------------------------------------
// SkyCondition
// ---------------------------------------------------------------------------

/// Cloud and haze reading: four horizon quadrants, overhead coverage,
/// a thickness flag (stars not visible) and a haze flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SkyCondition {
    pub north: u8,
    pub east: u8,
    pub south: u8,
    pub west: u8,
    pub overhead: u8,
    pub thickness: u8,
    pub haze: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SumKind {
    Total,
    Horizon,
    Overhead,
}

impl SkyCondition {
    /// All-clear conditions.
    pub fn clear() -> Self {
        Self::default()
    }

    pub fn from_fields(f: [u8; CODE_LEN]) -> Self {
        Self {
            north: f[0],
            east: f[1],
            south: f[2],
            west: f[3],
            overhead: f[4],
            thickness: f[5],
            haze: f[6],
        }
    }

    /// Fields in serialization order.
    pub fn fields(&self) -> [u8; CODE_LEN] {
        [
            self.north,
            self.east,
            self.south,
            self.west,
            self.overhead,
            self.thickness,
            self.haze,
        ]
    }

    /// Parse a code such as `"0010000"`. Exactly seven ASCII digits.
    pub fn from_digits(s: &str) -> Result<Self, ReconError> {
        let bytes = s.as_bytes();
        if bytes.len() != CODE_LEN || !bytes.iter().all(u8::is_ascii_digit) {
            return Err(ReconError::FormatError(s.to_string()));
        }
        let mut fields = [0u8; CODE_LEN];
        for (slot, b) in fields.iter_mut().zip(bytes) {
            *slot = b - b'0';
        }
        Ok(Self::from_fields(fields))
    }

    pub fn to_digits(&self, include_haze: bool) -> String {
        let fields = self.fields();
        let take = if include_haze { CODE_LEN } else { CODE_LEN - 1 };
        fields[..take].iter().map(|d| char::from(b'0' + d)).collect()
    }

    pub fn sum(&self, kind: SumKind) -> u32 {
        let f = self.fields().map(u32::from);
        match kind {
            SumKind::Total => f.iter().sum(),
            SumKind::Horizon => f[0] + f[1] + f[2] + f[3],
            SumKind::Overhead => f[4] + f[5],
        }
    }

    /// Combine two readings field by field.
    ///
    /// `weight_first` / `weight_second` are only consulted by
    /// [`CompareMode::TimeWeighted`], where each weight is the distance of that
    /// reading from the target time: the nearer reading dominates.
    pub fn compare(
        first: &SkyCondition,
        second: &SkyCondition,
        weight_first: f64,
        weight_second: f64,
        mode: CompareMode,
    ) -> Result<SkyCondition, ReconError> {
        let total_weight = weight_first + weight_second;
        if mode == CompareMode::TimeWeighted && !(total_weight > 0.0) {
            return Err(ReconError::UnsupportedAlgorithm(format!(
                "twavg needs a positive total weight, got {weight_first} + {weight_second}"
            )));
        }

        let a = first.fields();
        let b = second.fields();
        let mut out = [0u8; CODE_LEN];
        for i in 0..CODE_LEN {
            let (x, y) = (f64::from(a[i]), f64::from(b[i]));
            out[i] = match mode {
                CompareMode::Match => {
                    if a[i] == b[i] {
                        b[i]
                    } else {
                        MISMATCH
                    }
                }
                CompareMode::Worse => a[i].max(b[i]),
                CompareMode::Average => round_half_up(0.5 * (x + y)),
                CompareMode::Latest => b[i],
                CompareMode::TimeWeighted => {
                    round_half_up((x * weight_second + y * weight_first) / total_weight)
                }
            };
        }
        Ok(SkyCondition::from_fields(out))
    }
}

/// `f64::round` rounds half away from zero, which is round-half-up for the
/// non-negative values produced here (2.5 -> 3, never banker's 2).
fn round_half_up(v: f64) -> u8 {
    v.round().clamp(0.0, f64::from(u8::MAX)) as u8
}

impl fmt::Display for SkyCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_digits(true))
    }
}

impl FromStr for SkyCondition {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_digits(s)
    }
}

impl Serialize for SkyCondition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SkyCondition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_digits(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Compare modes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareMode {
    Match,
    Worse,
    Average,
    Latest,
    #[default]
    #[serde(rename = "twavg")]
    TimeWeighted,
}

impl CompareMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::Worse => "worse",
            Self::Average => "average",
            Self::Latest => "latest",
            Self::TimeWeighted => "twavg",
        }
    }
}

impl fmt::Display for CompareMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CompareMode {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "match" => Ok(Self::Match),
            "worse" => Ok(Self::Worse),
            "average" => Ok(Self::Average),
            "latest" => Ok(Self::Latest),
            "twavg" => Ok(Self::TimeWeighted),
            other => Err(ReconError::UnsupportedAlgorithm(format!(
                "algorithm '{other}' is not implemented"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
