//! 评分配置.
//!
//! 配置是不可变的值, 构造 (或反序列化) 之后调用 [`ScoringConfig::validate`],
//! 再作为参数传入每一次评分.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{CacsError, CacsResult};
use crate::lesion::LesionExtractor;
use crate::score::{GradingConvention, ScoreKind, ScoreScheme};
use crate::taxonomy::Taxonomy;

/// 一次评分所需的全部配置.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct ScoringConfig {
    /// 标注所属的标签体系.
    pub taxonomy: Taxonomy,

    /// 评分方案.
    pub scheme: ScoreScheme,

    /// 启用的评分, 按输出顺序.
    pub scores: Vec<ScoreKind>,

    /// Agatston 切片步长. 只有 `z % slice_step == 0` 的切片参与计分.
    pub slice_step: usize,

    /// 密度分数的层厚 (毫米). 缺省时使用体积的 z 方向分辨率.
    pub slice_thickness_mm: Option<f64>,

    /// 临床分级的零分边界约定.
    pub grading: GradingConvention,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            taxonomy: Taxonomy::SegmentLevel,
            scheme: ScoreScheme::Cacs,
            scores: ScoreKind::ALL.to_vec(),
            slice_step: 1,
            slice_thickness_mm: None,
            grading: GradingConvention::default(),
        }
    }
}

impl ScoringConfig {
    /// 检查配置能否用于评分.
    pub fn validate(&self) -> CacsResult<()> {
        LesionExtractor::new(self.taxonomy, self.scheme.taxonomy())?;
        if self.slice_step == 0 {
            return Err(CacsError::InvalidConfig("sliceStep must be at least 1".into()));
        }
        match self.slice_thickness_mm {
            Some(t) if !(t > 0.0) => {
                return Err(CacsError::InvalidConfig(format!(
                    "sliceThicknessMm must be positive, got {t}"
                )));
            }
            _ => {}
        }
        if self.scores.is_empty() {
            return Err(CacsError::InvalidConfig("no score enabled".into()));
        }
        Ok(())
    }

    /// 从 JSON 文件读取并检查配置.
    #[cfg(feature = "serde")]
    pub fn from_json_file<P: AsRef<std::path::Path>>(path: P) -> CacsResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CacsError::MissingFile(path.to_path_buf()));
        }
        let reader = std::io::BufReader::new(std::fs::File::open(path)?);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        ScoringConfig::default().validate().unwrap();
    }

    #[test]
    fn test_invalid_values() {
        let bad = [
            ScoringConfig {
                slice_step: 0,
                ..Default::default()
            },
            ScoringConfig {
                slice_thickness_mm: Some(0.0),
                ..Default::default()
            },
            ScoringConfig {
                scores: vec![],
                ..Default::default()
            },
        ];
        for c in bad {
            assert!(matches!(c.validate(), Err(CacsError::InvalidConfig(_))), "{c:?}");
        }
    }

    #[test]
    fn test_refining_pair_rejected() {
        let c = ScoringConfig {
            taxonomy: Taxonomy::ArteryLevel,
            scheme: ScoreScheme::CacsTreeCumulative,
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"taxonomy": "17Segment", "scheme": "CACS_17SEGMENT",
                "scores": ["AGATSTON_SCORE", "LESIONVOLUME"], "sliceStep": 2}}"#
        )
        .unwrap();
        let c = ScoringConfig::from_json_file(file.path()).unwrap();
        assert_eq!(c.taxonomy, Taxonomy::Segment17);
        assert_eq!(c.scheme, ScoreScheme::Cacs17Segment);
        assert_eq!(c.scores, [ScoreKind::Agatston, ScoreKind::LesionVolume]);
        assert_eq!(c.slice_step, 2);
        assert_eq!(c.slice_thickness_mm, None);
        assert_eq!(c.grading, GradingConvention::ZeroAtMostOne);
    }
}
