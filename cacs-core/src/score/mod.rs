//! 钙化评分.
//!
//! 所有评分共用同一个模板 [`evaluate`]: 自底向上遍历区域树, 对携带标签值的节点调用
//! [`CalciumScore::leaf`], 再对每个节点调用 [`CalciumScore::aggregate`] 合并
//! 自身分数与子区域分数.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;
use crate::data::{CtData3d, Spacing};
use crate::error::{CacsError, CacsResult};
use crate::grouping::ArteryGrouping;
use crate::lesion::{Hit, LesionDecomposition, LesionExtractor};

mod agatston;
mod density;
mod grading;
mod lesion_volume;
mod num_lesions;
mod scheme;
mod volume;

pub use agatston::{density_factor, Agatston};
pub use density::DensityScore;
pub use grading::{Grading, GradingConvention};
pub use lesion_volume::{LesionVolume, LesionVolumes};
pub use num_lesions::NumLesions;
pub use scheme::ScoreScheme;
pub use volume::VolumeScore;

/// 评分种类.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ScoreKind {
    /// Agatston 分数.
    #[cfg_attr(feature = "serde", serde(rename = "AGATSTON_SCORE"))]
    Agatston,

    /// 体积分数.
    #[cfg_attr(feature = "serde", serde(rename = "VOLUME_SCORE"))]
    Volume,

    /// 密度分数.
    #[cfg_attr(feature = "serde", serde(rename = "DENSITY_SCORE"))]
    Density,

    /// 病灶个数.
    #[cfg_attr(feature = "serde", serde(rename = "NUMLESIONS"))]
    NumLesions,

    /// 逐病灶体积.
    #[cfg_attr(feature = "serde", serde(rename = "LESIONVOLUME"))]
    LesionVolume,
}

impl ScoreKind {
    /// 全部评分种类.
    pub const ALL: [ScoreKind; 5] = [
        ScoreKind::Agatston,
        ScoreKind::Volume,
        ScoreKind::Density,
        ScoreKind::NumLesions,
        ScoreKind::LesionVolume,
    ];

    /// 名称.
    pub const fn name(&self) -> &'static str {
        match self {
            ScoreKind::Agatston => "AGATSTON_SCORE",
            ScoreKind::Volume => "VOLUME_SCORE",
            ScoreKind::Density => "DENSITY_SCORE",
            ScoreKind::NumLesions => "NUMLESIONS",
            ScoreKind::LesionVolume => "LESIONVOLUME",
        }
    }

    /// 输出文件名前缀.
    pub const fn file_stem(&self) -> &'static str {
        match self {
            ScoreKind::LesionVolume => "LESION_VOLUME",
            other => other.name(),
        }
    }
}

impl fmt::Display for ScoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScoreKind {
    type Err = CacsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScoreKind::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| CacsError::InvalidConfig(format!("unknown score `{s}`")))
    }
}

/// 评分时需要的病例级参数.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScoreContext {
    /// 体素分辨率.
    pub spacing: Spacing,

    /// Agatston 切片步长, 至少为 1.
    pub slice_step: usize,

    /// 密度分数使用的层厚.
    pub slice_thickness_mm: f64,
}

impl ScoreContext {
    /// 层厚未配置时使用 z 方向分辨率.
    pub fn new(spacing: Spacing, config: &ScoringConfig) -> Self {
        Self {
            spacing,
            slice_step: config.slice_step.max(1),
            slice_thickness_mm: config.slice_thickness_mm.unwrap_or(spacing.z_mm),
        }
    }
}

/// 一种钙化评分.
pub trait CalciumScore {
    /// 每个区域的分数类型.
    type Value: Clone;

    /// 评分种类.
    const KIND: ScoreKind;

    /// 叶子 (携带标签值的) 区域的分数. `hits` 可能为空, 此时应返回 "零分".
    fn leaf(&self, hits: &[Hit], ctx: &ScoreContext) -> Self::Value;

    /// 合并自身分数 (若有) 与所有子区域分数.
    fn aggregate(&self, parts: Vec<Self::Value>) -> Self::Value;
}

/// 按区域树先序排列的分数.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TerritoryScores<V> {
    /// `(区域名称, 分数)`.
    pub entries: Vec<(String, V)>,
}

impl<V> TerritoryScores<V> {
    /// 按区域名称查找.
    pub fn get(&self, name: &str) -> Option<&V> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// 根区域 (总) 分数.
    pub fn total(&self) -> Option<&V> {
        self.entries.first().map(|(_, v)| v)
    }
}

/// 评分模板. 自底向上求出区域树上每个节点的分数.
pub fn evaluate<S: CalciumScore>(
    score: &S,
    grouping: &ArteryGrouping,
    hits: &BTreeMap<String, Vec<Hit>>,
    ctx: &ScoreContext,
) -> TerritoryScores<S::Value> {
    let values = grouping.fold(|node, children: Vec<&S::Value>| {
        let own = node.value().map(|_| {
            let leaf_hits = hits.get(node.name()).map(Vec::as_slice).unwrap_or(&[]);
            score.leaf(leaf_hits, ctx)
        });
        let parts = own.into_iter().chain(children.into_iter().cloned()).collect();
        score.aggregate(parts)
    });
    let entries = grouping
        .preorder()
        .iter()
        .map(|&i| (grouping.node(i).name().to_owned(), values[i].clone()))
        .collect();
    TerritoryScores { entries }
}

/// 一种标量评分在一个病例上的结果.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScoreRecord {
    /// 评分种类.
    pub kind: ScoreKind,

    /// 评分方案.
    pub scheme: ScoreScheme,

    /// 各区域分数.
    pub values: TerritoryScores<f64>,

    /// 临床分级, 仅 Agatston 有.
    pub grading: Option<Grading>,
}

impl ScoreRecord {
    /// 总分.
    #[inline]
    pub fn total(&self) -> f64 {
        self.values.total().copied().unwrap_or(0.0)
    }
}

/// 逐病灶体积在一个病例上的结果.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LesionVolumeRecord {
    /// 评分方案.
    pub scheme: ScoreScheme,

    /// 各区域的病灶体积.
    pub values: TerritoryScores<LesionVolumes>,
}

/// 一个病例的全部评分.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CaseScores {
    /// 标量评分, 按配置顺序.
    pub scores: Vec<ScoreRecord>,

    /// 逐病灶体积 (若启用).
    pub lesion_volumes: Option<LesionVolumeRecord>,
}

impl CaseScores {
    /// 按种类查找标量评分.
    pub fn get(&self, kind: ScoreKind) -> Option<&ScoreRecord> {
        self.scores.iter().find(|r| r.kind == kind)
    }
}

fn scalar_record<S: CalciumScore<Value = f64>>(
    score: S,
    scheme: ScoreScheme,
    grouping: &ArteryGrouping,
    hits: &BTreeMap<String, Vec<Hit>>,
    ctx: &ScoreContext,
) -> ScoreRecord {
    ScoreRecord {
        kind: S::KIND,
        scheme,
        values: evaluate(&score, grouping, hits, ctx),
        grading: None,
    }
}

/// 对已分解的病灶评分.
///
/// 病灶分解的命名体系必须与评分方案一致, 否则返回 [`CacsError::InvalidConfig`].
pub fn score_lesions(
    decomposition: &LesionDecomposition,
    config: &ScoringConfig,
) -> CacsResult<CaseScores> {
    let scheme = config.scheme;
    if decomposition.taxonomy != scheme.taxonomy() {
        return Err(CacsError::InvalidConfig(format!(
            "lesions are named in {} but {scheme} scores {}",
            decomposition.taxonomy,
            scheme.taxonomy()
        )));
    }
    let grouping = scheme.grouping()?;
    let ctx = ScoreContext::new(decomposition.spacing, config);
    let hits = decomposition.hits_by_name();

    let mut ans = CaseScores::default();
    for kind in config.scores.iter() {
        let record = match kind {
            ScoreKind::Agatston => {
                let mut r = scalar_record(Agatston, scheme, grouping, &hits, &ctx);
                r.grading = Some(config.grading.grade(r.total()));
                r
            }
            ScoreKind::Volume => scalar_record(VolumeScore, scheme, grouping, &hits, &ctx),
            ScoreKind::Density => scalar_record(DensityScore, scheme, grouping, &hits, &ctx),
            ScoreKind::NumLesions => scalar_record(NumLesions, scheme, grouping, &hits, &ctx),
            ScoreKind::LesionVolume => {
                ans.lesion_volumes = Some(LesionVolumeRecord {
                    scheme,
                    values: evaluate(&LesionVolume, grouping, &hits, &ctx),
                });
                continue;
            }
        };
        ans.scores.push(record);
    }
    Ok(ans)
}

/// 对一个病例完成病灶分解和评分.
pub fn score_case(
    data: &CtData3d,
    config: &ScoringConfig,
) -> CacsResult<(LesionDecomposition, CaseScores)> {
    let extractor = LesionExtractor::new(config.taxonomy, config.scheme.taxonomy())?;
    let decomposition = extractor.decompose(data)?;
    let scores = score_lesions(&decomposition, config)?;
    log::debug!(
        "scored {} lesions with {}",
        decomposition.num_lesions(),
        config.scheme
    );
    Ok((decomposition, scores))
}
