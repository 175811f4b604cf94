//! Score calculation for dyed craft works.
//!
//! A work is built from 1 to 8 dye layers. Four components, each `0..=100`,
//! are weighted into the final score:
//!
//! | Component | Weight | Rewards |
//! |-----------|--------|---------|
//! | depth     | 30 | total dips, saturating at 24 |
//! | evenness  | 30 | oxidation close to 90 seconds per layer |
//! | craft     | 25 | technique variety and difficulty |
//! | balance   | 15 | mean coverage close to 70% |
//!
//! All arithmetic is integer; the same layers always produce the same score.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_LAYERS: usize = 8;
pub const MAX_DIPS: i64 = 12;
pub const MAX_OXIDATION_SECS: i64 = 600;
pub const MAX_COVERAGE: i64 = 100;

const DEPTH_SATURATION: i64 = 24;
const IDEAL_OXIDATION_SECS: i64 = 90;
const IDEAL_COVERAGE: i64 = 70;

/// Invalid craft input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("a work needs between 1 and {MAX_LAYERS} layers (got {0})")]
    LayerCount(usize),

    #[error("layer {layer}: {field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        layer: usize,
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}

/// Resist technique applied to a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technique {
    Plain,
    Itajime,
    Kumo,
    Arashi,
    Shibori,
}

impl Technique {
    /// Difficulty bonus added to the craft component.
    #[must_use]
    pub const fn bonus(self) -> i64 {
        match self {
            Self::Plain => 0,
            Self::Itajime => 10,
            Self::Kumo => 15,
            Self::Arashi => 20,
            Self::Shibori => 25,
        }
    }
}

/// One dye layer as submitted by the game client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftLayer {
    pub technique: Technique,
    pub dip_count: i64,
    pub oxidation_secs: i64,
    pub coverage: i64,
}

/// Quality label derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    S,
    A,
    B,
    C,
    D,
}

impl Grade {
    #[must_use]
    pub const fn from_score(score: i64) -> Self {
        match score {
            90.. => Self::S,
            75..=89 => Self::A,
            60..=74 => Self::B,
            40..=59 => Self::C,
            _ => Self::D,
        }
    }

    /// Suggested listing price in coins.
    #[must_use]
    pub const fn suggested_price(self) -> i64 {
        match self {
            Self::S => 800,
            Self::A => 450,
            Self::B => 250,
            Self::C => 120,
            Self::D => 50,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::S => "S",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score with its components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreCard {
    pub depth: i64,
    pub evenness: i64,
    pub craft: i64,
    pub balance: i64,
    pub score: i64,
    pub grade: Grade,
    pub suggested_price: i64,
}

/// Validate layers and compute the score card.
///
/// # Errors
///
/// Returns `ScoringError` if the layer count or any field is out of range.
pub fn score(layers: &[CraftLayer]) -> Result<ScoreCard, ScoringError> {
    validate(layers)?;

    #[allow(clippy::cast_possible_wrap)] // at most MAX_LAYERS
    let n = layers.len() as i64;

    let total_dips: i64 = layers.iter().map(|l| l.dip_count).sum();
    let depth = total_dips.min(DEPTH_SATURATION) * 100 / DEPTH_SATURATION;

    let evenness = layers
        .iter()
        .map(|l| 100 - ((l.oxidation_secs - IDEAL_OXIDATION_SECS).abs() * 100 / IDEAL_OXIDATION_SECS).min(100))
        .sum::<i64>()
        / n;

    let distinct: HashSet<Technique> = layers.iter().map(|l| l.technique).collect();
    let max_bonus = layers.iter().map(|l| l.technique.bonus()).max().unwrap_or(0);
    #[allow(clippy::cast_possible_wrap)]
    let craft = (distinct.len() as i64 * 20 + max_bonus).min(100);

    let mean_coverage = layers.iter().map(|l| l.coverage).sum::<i64>() / n;
    let balance = 100 - ((mean_coverage - IDEAL_COVERAGE).abs() * 100 / IDEAL_COVERAGE).min(100);

    let score = (30 * depth + 30 * evenness + 25 * craft + 15 * balance + 50) / 100;
    let grade = Grade::from_score(score);

    Ok(ScoreCard {
        depth,
        evenness,
        craft,
        balance,
        score,
        grade,
        suggested_price: grade.suggested_price(),
    })
}

fn validate(layers: &[CraftLayer]) -> Result<(), ScoringError> {
    if layers.is_empty() || layers.len() > MAX_LAYERS {
        return Err(ScoringError::LayerCount(layers.len()));
    }

    for (i, layer) in layers.iter().enumerate() {
        let layer_no = i + 1;
        check(layer_no, "dip_count", layer.dip_count, 1, MAX_DIPS)?;
        check(layer_no, "oxidation_secs", layer.oxidation_secs, 0, MAX_OXIDATION_SECS)?;
        check(layer_no, "coverage", layer.coverage, 0, MAX_COVERAGE)?;
    }
    Ok(())
}

const fn check(
    layer: usize,
    field: &'static str,
    value: i64,
    min: i64,
    max: i64,
) -> Result<(), ScoringError> {
    if value < min || value > max {
        return Err(ScoringError::OutOfRange {
            layer,
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn layer(technique: Technique, dip_count: i64, oxidation_secs: i64, coverage: i64) -> CraftLayer {
        CraftLayer {
            technique,
            dip_count,
            oxidation_secs,
            coverage,
        }
    }

    #[test]
    fn test_ideal_work_scores_s() {
        let layers = vec![
            layer(Technique::Shibori, 6, 90, 70),
            layer(Technique::Arashi, 6, 90, 70),
            layer(Technique::Kumo, 6, 90, 70),
            layer(Technique::Itajime, 6, 90, 70),
        ];
        let card = score(&layers).unwrap();
        assert_eq!(card.depth, 100);
        assert_eq!(card.evenness, 100);
        assert_eq!(card.craft, 100);
        assert_eq!(card.balance, 100);
        assert_eq!(card.score, 100);
        assert_eq!(card.grade, Grade::S);
        assert_eq!(card.suggested_price, 800);
    }

    #[test]
    fn test_single_plain_layer() {
        // depth 2*100/24 = 8, evenness 100 - 30*100/90 = 67,
        // craft 20, balance 100 - 20*100/70 = 72
        let card = score(&[layer(Technique::Plain, 2, 60, 50)]).unwrap();
        assert_eq!(card.depth, 8);
        assert_eq!(card.evenness, 67);
        assert_eq!(card.craft, 20);
        assert_eq!(card.balance, 72);
        // (240 + 2010 + 500 + 1080 + 50) / 100
        assert_eq!(card.score, 38);
        assert_eq!(card.grade, Grade::D);
        assert_eq!(card.suggested_price, 50);
    }

    #[test]
    fn test_far_oxidation_and_coverage_floor_at_zero() {
        let card = score(&[layer(Technique::Plain, 1, 600, 0)]).unwrap();
        assert_eq!(card.evenness, 0);
        assert_eq!(card.balance, 0);
    }

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(Grade::from_score(90), Grade::S);
        assert_eq!(Grade::from_score(89), Grade::A);
        assert_eq!(Grade::from_score(75), Grade::A);
        assert_eq!(Grade::from_score(74), Grade::B);
        assert_eq!(Grade::from_score(60), Grade::B);
        assert_eq!(Grade::from_score(59), Grade::C);
        assert_eq!(Grade::from_score(40), Grade::C);
        assert_eq!(Grade::from_score(39), Grade::D);
    }

    #[test]
    fn test_rejects_bad_layer_counts() {
        assert_eq!(score(&[]).unwrap_err(), ScoringError::LayerCount(0));
        let nine = vec![layer(Technique::Plain, 1, 90, 70); 9];
        assert_eq!(score(&nine).unwrap_err(), ScoringError::LayerCount(9));
    }

    #[test]
    fn test_rejects_out_of_range_fields() {
        let err = score(&[layer(Technique::Kumo, 0, 90, 70)]).unwrap_err();
        assert!(matches!(
            err,
            ScoringError::OutOfRange {
                field: "dip_count",
                ..
            }
        ));

        let err = score(&[
            layer(Technique::Kumo, 3, 90, 70),
            layer(Technique::Kumo, 3, 90, 101),
        ])
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "layer 2: coverage must be between 0 and 100 (got 101)"
        );
    }

    #[test]
    fn test_technique_deserializes_snake_case() {
        let parsed: CraftLayer = serde_json::from_str(
            r#"{"technique":"shibori","dip_count":3,"oxidation_secs":80,"coverage":60}"#,
        )
        .unwrap();
        assert_eq!(parsed.technique, Technique::Shibori);
    }
}
