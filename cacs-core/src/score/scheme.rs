//! 评分方案: 评分体系及其区域树.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::OnceCell;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{CacsError, CacsResult};
use crate::grouping::{ArteryGrouping, Territory};
use crate::taxonomy::Taxonomy;

/// 评分方案. 决定导出体系、区域树和 CSV 列.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ScoreScheme {
    /// `ArteryLevel`: CC = RCA + LAD + LCX.
    #[cfg_attr(feature = "serde", serde(rename = "CACS"))]
    Cacs,

    /// `ArteryLevelWithLM`: CC = RCA + LM + LAD + LCX.
    #[cfg_attr(feature = "serde", serde(rename = "CACS_LM"))]
    CacsLm,

    /// `SegmentLevel` 累积树, 每个冠脉节点都携带自身的标签值.
    #[cfg_attr(feature = "serde", serde(rename = "CACSTREE_CUMULATIVE"))]
    CacsTreeCumulative,

    /// SCCT 17 分段.
    #[cfg_attr(feature = "serde", serde(rename = "CACS_17SEGMENT"))]
    Cacs17Segment,
}

static CACS: OnceCell<ArteryGrouping> = OnceCell::new();
static CACS_LM: OnceCell<ArteryGrouping> = OnceCell::new();
static CACS_TREE: OnceCell<ArteryGrouping> = OnceCell::new();
static CACS_17: OnceCell<ArteryGrouping> = OnceCell::new();

impl ScoreScheme {
    /// 全部方案.
    pub const ALL: [ScoreScheme; 4] = [
        ScoreScheme::Cacs,
        ScoreScheme::CacsLm,
        ScoreScheme::CacsTreeCumulative,
        ScoreScheme::Cacs17Segment,
    ];

    /// 方案名称, 也用于输出文件名.
    pub const fn name(&self) -> &'static str {
        match self {
            ScoreScheme::Cacs => "CACS",
            ScoreScheme::CacsLm => "CACS_LM",
            ScoreScheme::CacsTreeCumulative => "CACSTREE_CUMULATIVE",
            ScoreScheme::Cacs17Segment => "CACS_17SEGMENT",
        }
    }

    /// 区域名称所属的标签体系.
    pub const fn taxonomy(&self) -> Taxonomy {
        match self {
            ScoreScheme::Cacs => Taxonomy::ArteryLevel,
            ScoreScheme::CacsLm => Taxonomy::ArteryLevelWithLM,
            ScoreScheme::CacsTreeCumulative => Taxonomy::SegmentLevel,
            ScoreScheme::Cacs17Segment => Taxonomy::Segment17,
        }
    }

    /// 该方案的区域树. 首次调用时构建, 之后复用.
    pub fn grouping(&self) -> CacsResult<&'static ArteryGrouping> {
        let cell = match self {
            ScoreScheme::Cacs => &CACS,
            ScoreScheme::CacsLm => &CACS_LM,
            ScoreScheme::CacsTreeCumulative => &CACS_TREE,
            ScoreScheme::Cacs17Segment => &CACS_17,
        };
        cell.get_or_try_init(|| self.build_grouping())
    }

    fn build_grouping(&self) -> CacsResult<ArteryGrouping> {
        let t = self.taxonomy();
        match self {
            ScoreScheme::Cacs => {
                ArteryGrouping::new(t, "CC", [("CC", Territory::group(["RCA", "LAD", "LCX"]))])
            }
            ScoreScheme::CacsLm => ArteryGrouping::new(
                t,
                "CC",
                [("CC", Territory::group(["RCA", "LM", "LAD", "LCX"]))],
            ),
            ScoreScheme::CacsTreeCumulative => ArteryGrouping::new(
                t,
                "CC",
                [
                    ("CC", Territory::cumulative(["RCA", "LM", "LAD", "LCX", "RIM"])),
                    (
                        "RCA",
                        Territory::cumulative([
                            "RCA_PROXIMAL",
                            "RCA_MID",
                            "RCA_DISTAL",
                            "RCA_SIDE_BRANCH",
                        ]),
                    ),
                    (
                        "LM",
                        Territory::cumulative([
                            "LM_BIF_LAD_LCX",
                            "LM_BIF_LAD",
                            "LM_BIF_LCX",
                            "LM_BRANCH",
                        ]),
                    ),
                    (
                        "LAD",
                        Territory::cumulative([
                            "LAD_PROXIMAL",
                            "LAD_MID",
                            "LAD_DISTAL",
                            "LAD_SIDE_BRANCH",
                        ]),
                    ),
                    (
                        "LCX",
                        Territory::cumulative([
                            "LCX_PROXIMAL",
                            "LCX_MID",
                            "LCX_DISTAL",
                            "LCX_SIDE_BRANCH",
                        ]),
                    ),
                ],
            ),
            ScoreScheme::Cacs17Segment => ArteryGrouping::new(
                t,
                "CC",
                [
                    ("CC", Territory::group(["RCA", "LM", "LAD", "LCX"])),
                    (
                        "RCA",
                        Territory::group(["RCA_PROXIMAL", "RCA_MID", "RCA_DISTAL", "R_PDA", "R_PLB"]),
                    ),
                    (
                        "LAD",
                        Territory::group(["LAD_PROXIMAL", "LAD_MID", "LAD_DISTAL", "D1", "D2", "RIM"]),
                    ),
                    (
                        "LCX",
                        Territory::group(["LCX_PROXIMAL", "OM1", "LCX_DISTAL", "OM2", "L_PDA"]),
                    ),
                ],
            ),
        }
    }

    /// 按先序排列的区域 (CSV 列) 名称.
    pub fn columns(&self) -> CacsResult<Vec<String>> {
        Ok(self.grouping()?.columns().map(str::to_owned).collect())
    }
}

impl fmt::Display for ScoreScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScoreScheme {
    type Err = CacsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScoreScheme::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| CacsError::InvalidConfig(format!("unknown score scheme `{s}`")))
    }
}
