//! Score bands shown on the results screen.
//!
//! Four bands split `[0, total]` at three configurable thresholds
//! `T1 < T2 < T3`:
//!
//! | band            | scores              |
//! |-----------------|---------------------|
//! | `KeepStudying`  | `score < T1`        |
//! | `Good`          | `T1 <= score <= T2` |
//! | `Great`         | `T2 < score <= T3`  |
//! | `Outstanding`   | `score > T3`        |

use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThresholdError {
    #[error("thresholds must be strictly increasing, got {low}, {mid}, {high}")]
    Unordered { low: usize, mid: usize, high: usize },
    #[error("highest threshold {high} must be below the number of questions ({total})")]
    ExceedsTotal { high: usize, total: usize },
    #[error("expected three comma separated thresholds, got {0:?}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "[usize; 3]", into = "[usize; 3]")]
pub struct Thresholds {
    low: usize,
    mid: usize,
    high: usize,
}

impl Thresholds {
    pub fn new(low: usize, mid: usize, high: usize) -> Result<Self, ThresholdError> {
        if low < mid && mid < high {
            Ok(Self { low, mid, high })
        } else {
            Err(ThresholdError::Unordered { low, mid, high })
        }
    }

    pub fn low(&self) -> usize {
        self.low
    }

    pub fn mid(&self) -> usize {
        self.mid
    }

    pub fn high(&self) -> usize {
        self.high
    }

    /// Every band has to be reachable for a quiz of `total` questions.
    pub fn check_total(&self, total: usize) -> Result<(), ThresholdError> {
        if self.high < total {
            Ok(())
        } else {
            Err(ThresholdError::ExceedsTotal {
                high: self.high,
                total,
            })
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low: 10,
            mid: 15,
            high: 18,
        }
    }
}

impl TryFrom<[usize; 3]> for Thresholds {
    type Error = ThresholdError;

    fn try_from([low, mid, high]: [usize; 3]) -> Result<Self, Self::Error> {
        Self::new(low, mid, high)
    }
}

impl From<Thresholds> for [usize; 3] {
    fn from(t: Thresholds) -> Self {
        [t.low, t.mid, t.high]
    }
}

/// Parses `"10,15,18"`.
impl FromStr for Thresholds {
    type Err = ThresholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ThresholdError::Malformed(s.to_string());
        let values = s
            .split(',')
            .map(|part| part.trim().parse::<usize>().map_err(|_| malformed()))
            .collect::<Result<Vec<_>, _>>()?;
        let values: [usize; 3] = values.try_into().map_err(|_| malformed())?;
        Self::try_from(values)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeedbackTier {
    KeepStudying,
    Good,
    Great,
    Outstanding,
}

impl FeedbackTier {
    /// 1-based band number, lowest band first.
    pub fn rank(&self) -> u8 {
        match self {
            FeedbackTier::KeepStudying => 1,
            FeedbackTier::Good => 2,
            FeedbackTier::Great => 3,
            FeedbackTier::Outstanding => 4,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            FeedbackTier::KeepStudying => Severity::Danger,
            FeedbackTier::Good => Severity::Neutral,
            FeedbackTier::Great => Severity::Success,
            FeedbackTier::Outstanding => Severity::Highlight,
        }
    }
}

/// Styling hint for the results card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Danger,
    Neutral,
    Success,
    Highlight,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Danger => "danger",
            Severity::Neutral => "neutral",
            Severity::Success => "success",
            Severity::Highlight => "highlight",
        }
    }
}

pub fn classify(score: usize, thresholds: &Thresholds) -> FeedbackTier {
    if score < thresholds.low {
        FeedbackTier::KeepStudying
    } else if score <= thresholds.mid {
        FeedbackTier::Good
    } else if score <= thresholds.high {
        FeedbackTier::Great
    } else {
        FeedbackTier::Outstanding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band(score: usize, t: &Thresholds) -> u8 {
        classify(score, t).rank()
    }

    #[test]
    fn band_edges_with_9_15_18() {
        let t = Thresholds::new(9, 15, 18).unwrap();
        assert_eq!(band(0, &t), 1);
        assert_eq!(band(8, &t), 1);
        assert_eq!(band(9, &t), 2);
        assert_eq!(band(10, &t), 2);
        assert_eq!(band(15, &t), 2);
        assert_eq!(band(16, &t), 3);
        assert_eq!(band(18, &t), 3);
        assert_eq!(band(19, &t), 4);
        assert_eq!(band(20, &t), 4);
    }

    #[test]
    fn every_score_lands_in_exactly_one_band_and_bands_never_go_down() {
        let t = Thresholds::new(9, 15, 18).unwrap();
        let bands = (0..=20).map(|s| band(s, &t)).collect::<Vec<_>>();
        assert!(bands.windows(2).all(|w| w[0] <= w[1]));
        for rank in 1..=4 {
            assert!(bands.contains(&rank), "band {rank} unreachable");
        }
    }

    #[test]
    fn default_matches_the_original_cutoffs() {
        let t = Thresholds::default();
        assert_eq!(classify(9, &t), FeedbackTier::KeepStudying);
        assert_eq!(classify(10, &t), FeedbackTier::Good);
        assert_eq!(classify(15, &t), FeedbackTier::Good);
        assert_eq!(classify(16, &t), FeedbackTier::Great);
        assert_eq!(classify(18, &t), FeedbackTier::Great);
        assert_eq!(classify(19, &t), FeedbackTier::Outstanding);
    }

    #[test]
    fn zero_low_threshold_leaves_band_one_empty() {
        let t = Thresholds::new(0, 1, 2).unwrap();
        assert_eq!(classify(0, &t), FeedbackTier::Good);
    }

    #[test]
    fn thresholds_must_increase() {
        assert!(Thresholds::new(5, 5, 8).is_err());
        assert!(Thresholds::new(9, 8, 10).is_err());
        assert_eq!(
            Thresholds::new(3, 2, 1),
            Err(ThresholdError::Unordered {
                low: 3,
                mid: 2,
                high: 1
            })
        );
    }

    #[test]
    fn highest_threshold_must_be_below_total() {
        let t = Thresholds::default();
        assert!(t.check_total(19).is_ok());
        assert_eq!(
            t.check_total(18),
            Err(ThresholdError::ExceedsTotal { high: 18, total: 18 })
        );
    }

    #[test]
    fn parses_from_env_style_string() {
        assert_eq!(
            " 4, 6 ,8".parse::<Thresholds>(),
            Ok(Thresholds::new(4, 6, 8).unwrap())
        );
        assert!(matches!(
            "4,6".parse::<Thresholds>(),
            Err(ThresholdError::Malformed(_))
        ));
        assert!(matches!(
            "a,b,c".parse::<Thresholds>(),
            Err(ThresholdError::Malformed(_))
        ));
        assert!(matches!(
            "8,6,4".parse::<Thresholds>(),
            Err(ThresholdError::Unordered { .. })
        ));
    }

    #[test]
    fn deserializes_from_array_and_rejects_bad_order() {
        let t: Thresholds = serde_json::from_str("[3, 5, 7]").unwrap();
        assert_eq!((t.low(), t.mid(), t.high()), (3, 5, 7));
        assert!(serde_json::from_str::<Thresholds>("[7, 5, 3]").is_err());
    }

    #[test]
    fn severity_follows_rank() {
        assert_eq!(FeedbackTier::KeepStudying.severity(), Severity::Danger);
        assert_eq!(FeedbackTier::Outstanding.severity().as_str(), "highlight");
        assert!(FeedbackTier::Good < FeedbackTier::Great);
    }
}
