//! 标签值重映射规则.
//!
//! 一条规则是有序的 `(闭区间 -> 新值)` 条目列表, 加上未匹配时的回退策略.
//! 每个输出体素只由对应的输入体素决定: 取第一个匹配的条目, 否则使用回退策略.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::Taxonomy;
use super::Taxonomy::*;
use crate::error::{CacsError, CacsResult};
use crate::CtLabel;

/// 区间的映射目标.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RemapTarget {
    /// 区间内所有值都映射为同一个值.
    Const(u8),

    /// 区间逐个平移, 区间下界映射为给定值.
    Shift(u8),
}

/// 一个重映射条目.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RemapEntry {
    lo: u8,
    hi: u8,
    target: RemapTarget,
}

impl RemapEntry {
    /// `value -> to`.
    pub const fn one(value: u8, to: u8) -> Self {
        Self::range(value, value, to)
    }

    /// `lo..=hi` 全部映射为 `to`.
    pub const fn range(lo: u8, hi: u8, to: u8) -> Self {
        Self {
            lo,
            hi,
            target: RemapTarget::Const(to),
        }
    }

    /// `lo..=hi` 逐个平移到 `start..`.
    pub const fn shift(lo: u8, hi: u8, start: u8) -> Self {
        Self {
            lo,
            hi,
            target: RemapTarget::Shift(start),
        }
    }

    /// 保持 `lo..=hi` 不变.
    pub const fn keep(lo: u8, hi: u8) -> Self {
        Self::shift(lo, hi, lo)
    }

    /// 若 `v` 落在区间内, 返回映射结果.
    #[inline]
    pub fn apply(&self, v: u8) -> Option<u8> {
        if v < self.lo || v > self.hi {
            return None;
        }
        Some(match self.target {
            RemapTarget::Const(to) => to,
            RemapTarget::Shift(start) => start + (v - self.lo),
        })
    }
}

/// 没有条目匹配时的策略.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Fallback {
    /// 保持原值.
    Keep,

    /// 置为 0 (体积外部).
    Clear,
}

/// 完整的重映射规则.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemapRule {
    entries: Vec<RemapEntry>,
    fallback: Fallback,
}

impl RemapRule {
    /// 由条目和回退策略构建规则. 条目按给定顺序匹配.
    pub fn new(entries: impl IntoIterator<Item = RemapEntry>, fallback: Fallback) -> Self {
        Self {
            entries: entries.into_iter().collect(),
            fallback,
        }
    }

    /// 以 `1 -> 0` 开头的规则. 任何转换都先清除 "OTHER".
    pub(crate) fn clearing_other(
        entries: impl IntoIterator<Item = RemapEntry>,
        fallback: Fallback,
    ) -> Self {
        Self::new(
            std::iter::once(RemapEntry::one(crate::consts::label::OTHER, 0)).chain(entries),
            fallback,
        )
    }

    /// 条目.
    #[inline]
    pub fn entries(&self) -> &[RemapEntry] {
        &self.entries
    }

    /// 回退策略.
    #[inline]
    pub fn fallback(&self) -> Fallback {
        self.fallback
    }

    /// 映射单个值.
    pub fn apply(&self, v: u8) -> u8 {
        self.entries
            .iter()
            .find_map(|e| e.apply(v))
            .unwrap_or(match self.fallback {
                Fallback::Keep => v,
                Fallback::Clear => 0,
            })
    }

    /// 展开为 256 项查找表.
    pub fn lut(&self) -> [u8; 256] {
        let mut lut = [0u8; 256];
        for (v, out) in lut.iter_mut().enumerate() {
            *out = self.apply(v as u8);
        }
        lut
    }
}

fn segment_to_artery() -> RemapRule {
    RemapRule::clearing_other(
        [
            RemapEntry::range(3, 7, 4),
            RemapEntry::range(8, 17, 2),
            RemapEntry::range(18, 22, 3),
            RemapEntry::one(23, 2),
        ],
        Fallback::Clear,
    )
}

fn segment_to_artery_lm() -> RemapRule {
    RemapRule::clearing_other(
        [
            RemapEntry::range(3, 7, 4),
            RemapEntry::range(8, 12, 5),
            RemapEntry::range(13, 17, 2),
            RemapEntry::range(18, 22, 3),
            RemapEntry::one(23, 2),
        ],
        Fallback::Clear,
    )
}

fn segment_to_dln() -> RemapRule {
    RemapRule::clearing_other(
        [
            RemapEntry::one(2, 0),
            RemapEntry::one(3, 13),
            RemapEntry::shift(4, 7, 14),
            RemapEntry::range(8, 12, 2),
            RemapEntry::shift(13, 17, 3),
            RemapEntry::shift(18, 22, 8),
            RemapEntry::one(23, 18),
            RemapEntry::range(24, 29, 1),
        ],
        Fallback::Clear,
    )
}

pub(crate) fn dln_to_artery_lm() -> RemapRule {
    RemapRule::clearing_other(
        [
            RemapEntry::one(2, 5),
            RemapEntry::range(3, 7, 2),
            RemapEntry::range(8, 12, 3),
            RemapEntry::range(13, 17, 4),
            RemapEntry::one(18, 2),
        ],
        Fallback::Clear,
    )
}

pub(crate) fn dln_to_artery() -> RemapRule {
    RemapRule::clearing_other(
        [
            RemapEntry::range(2, 7, 2),
            RemapEntry::range(8, 12, 3),
            RemapEntry::range(13, 17, 4),
            RemapEntry::one(18, 2),
        ],
        Fallback::Clear,
    )
}

/// 所有合法的 (源体系, 目标体系) 转换规则. 同体系转换不在表中.
static CONVERSIONS: Lazy<HashMap<(Taxonomy, Taxonomy), RemapRule>> = Lazy::new(|| {
    let mut m = HashMap::new();
    for seg in [SegmentLevel, SegmentLevelOnlyArteries] {
        m.insert((seg, ArteryLevel), segment_to_artery());
        m.insert((seg, ArteryLevelWithLM), segment_to_artery_lm());
        m.insert((seg, SegmentLevelDLNExport), segment_to_dln());
    }
    m.insert(
        (SegmentLevel, SegmentLevelOnlyArteries),
        RemapRule::clearing_other([RemapEntry::range(24, 29, 0)], Fallback::Keep),
    );
    m.insert((SegmentLevelDLNExport, ArteryLevelWithLM), dln_to_artery_lm());
    m.insert((SegmentLevelDLNExport, ArteryLevel), dln_to_artery());
    m.insert(
        (ArteryLevelWithLM, ArteryLevel),
        RemapRule::clearing_other([RemapEntry::one(5, 2)], Fallback::Keep),
    );
    m.insert(
        (Segment17, Segment17OnlyArteries),
        RemapRule::clearing_other([RemapEntry::range(19, 23, 0)], Fallback::Keep),
    );
    m
});

/// 查找 `from -> to` 的转换规则. 同体系转换返回 `Ok(None)`.
///
/// 目标体系比源体系更细时返回 [`CacsError::RefiningConversion`];
/// 其它没有规则的组合返回 [`CacsError::InvalidConversion`].
pub fn conversion_rule(from: Taxonomy, to: Taxonomy) -> CacsResult<Option<&'static RemapRule>> {
    if from == to {
        return Ok(None);
    }
    if let Some(rule) = CONVERSIONS.get(&(from, to)) {
        return Ok(Some(rule));
    }
    let err = if to > from {
        CacsError::RefiningConversion { from, to }
    } else {
        CacsError::InvalidConversion { from, to }
    };
    log::error!("{err}");
    Err(err)
}

/// 检查 `from -> to` 的转换是否合法.
#[inline]
pub fn check_conversion(from: Taxonomy, to: Taxonomy) -> CacsResult<()> {
    conversion_rule(from, to).map(|_| ())
}

/// 将 `label` 从 `from` 体系转换到 `to` 体系, 返回新的标注. `label` 保持不变.
///
/// 转换失败时不产生任何部分结果.
pub fn convert(label: &CtLabel, from: Taxonomy, to: Taxonomy) -> CacsResult<CtLabel> {
    match conversion_rule(from, to)? {
        None => Ok(label.clone()),
        Some(rule) => {
            log::debug!("converting labels from {from} to {to}");
            Ok(remap(label, rule))
        }
    }
}

/// 为评分命名而转换标签体系.
///
/// 与 [`convert`] 不同, 源体系是目标体系的值子集时 (如 `17SegmentOnlyArteries`
/// 之于 `17Segment`), 直接沿用原值.
pub fn relabel_for_scoring(label: &CtLabel, from: Taxonomy, to: Taxonomy) -> CacsResult<CtLabel> {
    if from.is_value_subset_of(to) {
        return Ok(label.clone());
    }
    convert(label, from, to)
}

/// 按是否启用 `rayon` 选择串行或并行重映射.
pub(crate) fn remap(label: &CtLabel, rule: &RemapRule) -> CtLabel {
    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            label.par_remapped(rule)
        } else {
            label.remapped(rule)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Spacing;
    use ndarray::Array3;

    fn label_with(values: &[u8]) -> CtLabel {
        let data = Array3::from_shape_vec((1, 1, values.len()), values.to_vec()).unwrap();
        CtLabel::from_raw(data, Spacing::new(0.5, 0.5, 3.0)).unwrap()
    }

    fn all_values(t: Taxonomy) -> Vec<u8> {
        std::iter::once(0)
            .chain(t.labels().iter().map(|d| d.value))
            .collect()
    }

    #[test]
    fn test_entry_apply() {
        let e = RemapEntry::shift(4, 7, 14);
        assert_eq!(e.apply(3), None);
        assert_eq!(e.apply(4), Some(14));
        assert_eq!(e.apply(7), Some(17));
        assert_eq!(RemapEntry::range(8, 12, 2).apply(10), Some(2));
        assert_eq!(RemapEntry::keep(2, 5).apply(5), Some(5));
    }

    #[test]
    fn test_identity_idempotent() {
        for t in Taxonomy::ALL {
            let label = label_with(&all_values(t));
            assert_eq!(convert(&label, t, t).unwrap(), label);
        }
    }

    #[test]
    fn test_refining_rejected() {
        for from in Taxonomy::ALL {
            for to in Taxonomy::ALL.into_iter().filter(|to| *to > from) {
                let label = label_with(&all_values(from));
                assert!(matches!(
                    convert(&label, from, to),
                    Err(CacsError::RefiningConversion { .. })
                ));
            }
        }
    }

    #[test]
    fn test_unrelated_rejected() {
        let label = label_with(&[0, 1, 2]);
        assert!(matches!(
            convert(&label, Taxonomy::Segment17, Taxonomy::ArteryLevel),
            Err(CacsError::InvalidConversion { .. })
        ));
    }

    #[test]
    fn test_rules_land_in_target() {
        for ((from, to), rule) in CONVERSIONS.iter() {
            assert!(to < from, "{from} -> {to} must coarsen");
            let valid = all_values(*to);
            for v in all_values(*from) {
                let out = rule.apply(v);
                assert!(valid.contains(&out), "{from}:{v} -> {to}:{out}");
            }
            // OTHER 永远被清除.
            assert_eq!(rule.apply(1), 0);
        }
    }

    #[test]
    fn test_conversion_deterministic() {
        let values = all_values(Taxonomy::SegmentLevel);
        let label = label_with(&values);
        for to in [
            Taxonomy::SegmentLevelOnlyArteries,
            Taxonomy::SegmentLevelDLNExport,
            Taxonomy::ArteryLevelWithLM,
            Taxonomy::ArteryLevel,
        ] {
            let a = convert(&label, Taxonomy::SegmentLevel, to).unwrap();
            let b = convert(&label, Taxonomy::SegmentLevel, to).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_segment_to_artery_values() {
        let seg = Taxonomy::SegmentLevel;
        let label = label_with(&[
            seg.value_of("OTHER").unwrap(),
            seg.value_of("RCA_MID").unwrap(),
            seg.value_of("LM_BIF_LAD").unwrap(),
            seg.value_of("LAD_DISTAL").unwrap(),
            seg.value_of("LCX_PROXIMAL").unwrap(),
            seg.value_of("RIM").unwrap(),
            seg.value_of("AORTA").unwrap(),
        ]);
        let out = convert(&label, seg, Taxonomy::ArteryLevel).unwrap();
        let names: Vec<_> = out
            .data()
            .iter()
            .map(|v| Taxonomy::ArteryLevel.name_of(*v).unwrap_or("-"))
            .collect();
        assert_eq!(names, ["-", "RCA", "LAD", "LAD", "LCX", "LAD", "-"]);

        let out = convert(&label, seg, Taxonomy::ArteryLevelWithLM).unwrap();
        assert_eq!(out.data()[(0, 0, 2)], 5);
    }

    #[test]
    fn test_segment_to_dln_shift() {
        let label = label_with(&[3, 4, 7, 9, 13, 17, 18, 22, 23, 25]);
        let out = convert(
            &label,
            Taxonomy::SegmentLevel,
            Taxonomy::SegmentLevelDLNExport,
        )
        .unwrap();
        let dln = Taxonomy::SegmentLevelDLNExport;
        let names: Vec<_> = out.data().iter().map(|v| dln.name_of(*v).unwrap()).collect();
        assert_eq!(
            names,
            [
                "RCA",
                "RCA_PROXIMAL",
                "RCA_SIDE_BRANCH",
                "LM",
                "LAD",
                "LAD_SIDE_BRANCH",
                "LCX",
                "LCX_SIDE_BRANCH",
                "RIM",
                "OTHER",
            ]
        );
    }

    #[test]
    fn test_chain_agrees_with_direct() {
        // SegmentLevel -> DLN -> ArteryLevelWithLM 与直接转换一致 (CC 除外).
        let values: Vec<u8> = (3..=29).collect();
        let label = label_with(&values);
        let via = convert(
            &convert(&label, SegmentLevel, SegmentLevelDLNExport).unwrap(),
            SegmentLevelDLNExport,
            ArteryLevelWithLM,
        )
        .unwrap();
        let direct = convert(&label, SegmentLevel, ArteryLevelWithLM).unwrap();
        assert_eq!(via, direct);
    }

    #[test]
    fn test_relabel_subset_keeps_values() {
        let label = label_with(&[1, 5, 18]);
        let out = relabel_for_scoring(&label, Segment17OnlyArteries, Segment17).unwrap();
        assert_eq!(out, label);
    }
}
