//! Agatston 总分的临床分级.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::consts::grading::{MILD_UPPER, MINIMAL_UPPER, MODERATE_UPPER};

/// 临床分级.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Grading {
    /// 无钙化.
    Zero,
    /// (下界, 10].
    Minimal,
    /// (10, 100].
    Mild,
    /// (100, 400].
    Moderate,
    /// (400, ∞).
    Severe,
}

impl Grading {
    /// 小写名称.
    pub const fn name(&self) -> &'static str {
        match self {
            Grading::Zero => "zero",
            Grading::Minimal => "minimal",
            Grading::Mild => "mild",
            Grading::Moderate => "moderate",
            Grading::Severe => "severe",
        }
    }
}

impl fmt::Display for Grading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `zero` 与 `minimal` 之间的边界约定.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GradingConvention {
    /// 总分 ≤ 1 即为 `zero`.
    #[default]
    ZeroAtMostOne,

    /// 仅总分为 0 时为 `zero`.
    ZeroOnlyAtZero,
}

impl GradingConvention {
    /// `zero` 的上界 (闭).
    pub const fn zero_upper(&self) -> f64 {
        match self {
            GradingConvention::ZeroAtMostOne => 1.0,
            GradingConvention::ZeroOnlyAtZero => 0.0,
        }
    }

    /// 对 Agatston 总分分级.
    pub fn grade(&self, total: f64) -> Grading {
        match total {
            t if t <= self.zero_upper() => Grading::Zero,
            t if t <= MINIMAL_UPPER => Grading::Minimal,
            t if t <= MILD_UPPER => Grading::Mild,
            t if t <= MODERATE_UPPER => Grading::Moderate,
            _ => Grading::Severe,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_boundaries() {
        let c = GradingConvention::default();
        assert_eq!(c.grade(0.0), Grading::Zero);
        assert_eq!(c.grade(1.0), Grading::Zero);
        assert_eq!(c.grade(1.5), Grading::Minimal);
        assert_eq!(c.grade(10.0), Grading::Minimal);
        assert_eq!(c.grade(10.1), Grading::Mild);
        assert_eq!(c.grade(100.0), Grading::Mild);
        assert_eq!(c.grade(400.0), Grading::Moderate);
        assert_eq!(c.grade(400.5), Grading::Severe);
        assert_eq!(c.grade(800.0), Grading::Severe);
    }

    #[test]
    fn test_zero_only_at_zero() {
        let c = GradingConvention::ZeroOnlyAtZero;
        assert_eq!(c.grade(0.0), Grading::Zero);
        assert_eq!(c.grade(0.5), Grading::Minimal);
        assert_eq!(c.grade(1.0), Grading::Minimal);
    }
}
