//! 标签体系及体系间的转换.
//!
//! 体系按粒度全序排列 (由粗到细):
//! `ArteryLevel` < `ArteryLevelWithLM` < `SegmentLevelDLNExport` <
//! `SegmentLevelOnlyArteries` < `SegmentLevel` < `17SegmentOnlyArteries` < `17Segment`.
//!
//! 向更粗的体系转换只能通过 [`remap`] 中显式给出的规则进行;
//! 向更细的体系转换总是被拒绝.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{CacsError, CacsResult};

pub mod remap;
mod tables;

pub use remap::{
    check_conversion, conversion_rule, convert, relabel_for_scoring, Fallback, RemapEntry,
    RemapRule, RemapTarget,
};
pub use tables::LabelDef;

/// 标签体系.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Taxonomy {
    /// LAD / LCX / RCA.
    ArteryLevel,

    /// LAD / LCX / RCA / LM.
    ArteryLevelWithLM,

    /// 供网络训练导出的紧凑分段体系.
    SegmentLevelDLNExport,

    /// 仅含冠脉节点的分段体系.
    SegmentLevelOnlyArteries,

    /// 完整的分段体系 (冠脉树及非冠脉结构).
    SegmentLevel,

    /// 仅含冠脉节点的 SCCT 17 分段体系.
    #[cfg_attr(feature = "serde", serde(rename = "17SegmentOnlyArteries"))]
    Segment17OnlyArteries,

    /// SCCT 17 分段体系.
    #[cfg_attr(feature = "serde", serde(rename = "17Segment"))]
    Segment17,
}

static NAME_INDEX: Lazy<HashMap<Taxonomy, HashMap<&'static str, u8>>> = Lazy::new(|| {
    Taxonomy::ALL
        .into_iter()
        .map(|t| (t, t.labels().iter().map(|d| (d.name, d.value)).collect()))
        .collect()
});

impl Taxonomy {
    /// 全部体系, 由粗到细.
    pub const ALL: [Taxonomy; 7] = [
        Taxonomy::ArteryLevel,
        Taxonomy::ArteryLevelWithLM,
        Taxonomy::SegmentLevelDLNExport,
        Taxonomy::SegmentLevelOnlyArteries,
        Taxonomy::SegmentLevel,
        Taxonomy::Segment17OnlyArteries,
        Taxonomy::Segment17,
    ];

    /// 体系名称.
    pub const fn name(&self) -> &'static str {
        match self {
            Taxonomy::ArteryLevel => "ArteryLevel",
            Taxonomy::ArteryLevelWithLM => "ArteryLevelWithLM",
            Taxonomy::SegmentLevelDLNExport => "SegmentLevelDLNExport",
            Taxonomy::SegmentLevelOnlyArteries => "SegmentLevelOnlyArteries",
            Taxonomy::SegmentLevel => "SegmentLevel",
            Taxonomy::Segment17OnlyArteries => "17SegmentOnlyArteries",
            Taxonomy::Segment17 => "17Segment",
        }
    }

    /// 该体系的全部标签 (不含 0), 按值升序.
    pub fn labels(&self) -> &'static [LabelDef] {
        match self {
            Taxonomy::ArteryLevel => &tables::ARTERY_LEVEL,
            Taxonomy::ArteryLevelWithLM => &tables::ARTERY_LEVEL_WITH_LM,
            Taxonomy::SegmentLevelDLNExport => &tables::SEGMENT_LEVEL_DLN_EXPORT,
            Taxonomy::SegmentLevelOnlyArteries => &tables::SEGMENT_LEVEL[..23],
            Taxonomy::SegmentLevel => &tables::SEGMENT_LEVEL,
            Taxonomy::Segment17OnlyArteries => &tables::SEGMENT_17[..18],
            Taxonomy::Segment17 => &tables::SEGMENT_17,
        }
    }

    /// 按名称查找标签值.
    pub fn value_of(&self, name: &str) -> CacsResult<u8> {
        NAME_INDEX
            .get(self)
            .and_then(|m| m.get(name))
            .copied()
            .ok_or_else(|| CacsError::UnknownLabel {
                taxonomy: *self,
                name: name.to_owned(),
            })
    }

    /// 按标签值查找名称. 0 或未定义的值返回 `None`.
    pub fn name_of(&self, value: u8) -> Option<&'static str> {
        self.def_of(value).map(|d| d.name)
    }

    /// 按标签值查找完整定义.
    pub fn def_of(&self, value: u8) -> Option<&'static LabelDef> {
        // 所有表都是从 1 开始的稠密表.
        (value as usize)
            .checked_sub(1)
            .and_then(|i| self.labels().get(i))
    }

    /// 是否属于 `SegmentLevel` 家族.
    #[inline]
    pub const fn is_segment_family(&self) -> bool {
        matches!(
            self,
            Taxonomy::SegmentLevel | Taxonomy::SegmentLevelOnlyArteries
        )
    }

    /// 是否属于 17 分段家族.
    #[inline]
    pub const fn is_17_segment_family(&self) -> bool {
        matches!(self, Taxonomy::Segment17 | Taxonomy::Segment17OnlyArteries)
    }

    /// `self` 的每个标签在 `other` 中都有同名同值的定义.
    pub fn is_value_subset_of(&self, other: Taxonomy) -> bool {
        *self == other
            || self
                .labels()
                .iter()
                .all(|d| other.def_of(d.value).map(|o| o.name) == Some(d.name))
    }
}

impl fmt::Display for Taxonomy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Taxonomy {
    type Err = CacsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Taxonomy::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| CacsError::InvalidConfig(format!("unknown taxonomy `{s}`")))
    }
}
