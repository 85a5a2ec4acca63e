//! 病灶合并阶段使用的动脉分组规则.
//!
//! 将细粒度标签合并为 LAD / LCX / RCA / LM 四个动脉组, 非冠脉结构一律清除.
//! SegmentLevel 中未细分的 `CC` 单独成组.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::consts::artery::{CC, LAD, LCX, LM, RCA};
use crate::error::{CacsError, CacsResult};
use crate::taxonomy::remap::{dln_to_artery, dln_to_artery_lm};
use crate::taxonomy::{Fallback, RemapEntry, RemapRule, Taxonomy};

use Taxonomy::*;

/// 动脉组的名称. 非动脉组的值返回 `None`.
pub fn artery_name(group: u8) -> Option<&'static str> {
    match group {
        LAD => Some("LAD"),
        LCX => Some("LCX"),
        RCA => Some("RCA"),
        LM => Some("LM"),
        CC => Some("CC"),
        _ => None,
    }
}

fn segment_rule(with_lm: bool) -> RemapRule {
    RemapRule::clearing_other(
        [
            RemapEntry::one(2, CC),
            RemapEntry::range(3, 7, RCA),
            RemapEntry::range(8, 12, if with_lm { LM } else { LAD }),
            RemapEntry::range(13, 17, LAD),
            RemapEntry::range(18, 22, LCX),
            RemapEntry::one(23, LAD),
        ],
        Fallback::Clear,
    )
}

fn segment_17_rule() -> RemapRule {
    RemapRule::clearing_other(
        [
            RemapEntry::range(2, 5, RCA),
            RemapEntry::one(17, RCA),
            RemapEntry::one(6, LM),
            RemapEntry::range(7, 11, LAD),
            RemapEntry::one(18, LAD),
            RemapEntry::range(12, 16, LCX),
        ],
        Fallback::Clear,
    )
}

static COLLAPSE: Lazy<HashMap<(Taxonomy, Taxonomy), RemapRule>> = Lazy::new(|| {
    let mut m = HashMap::new();
    for seg in [SegmentLevel, SegmentLevelOnlyArteries] {
        m.insert((seg, ArteryLevel), segment_rule(false));
        for export in [
            ArteryLevelWithLM,
            SegmentLevelDLNExport,
            SegmentLevelOnlyArteries,
            SegmentLevel,
        ] {
            m.insert((seg, export), segment_rule(true));
        }
    }

    m.insert((SegmentLevelDLNExport, ArteryLevel), dln_to_artery());
    m.insert((SegmentLevelDLNExport, ArteryLevelWithLM), dln_to_artery_lm());
    m.insert((SegmentLevelDLNExport, SegmentLevelDLNExport), dln_to_artery_lm());

    m.insert(
        (ArteryLevelWithLM, ArteryLevel),
        RemapRule::clearing_other(
            [RemapEntry::keep(LAD, RCA), RemapEntry::one(LM, LAD)],
            Fallback::Clear,
        ),
    );
    m.insert(
        (ArteryLevelWithLM, ArteryLevelWithLM),
        RemapRule::clearing_other([RemapEntry::keep(LAD, LM)], Fallback::Clear),
    );
    m.insert(
        (ArteryLevel, ArteryLevel),
        RemapRule::clearing_other([RemapEntry::keep(LAD, RCA)], Fallback::Clear),
    );

    for src in [Segment17, Segment17OnlyArteries] {
        for export in [Segment17, Segment17OnlyArteries] {
            m.insert((src, export), segment_17_rule());
        }
    }
    m
});

/// 查找 `(source, export)` 的动脉分组规则.
pub fn collapse_rule(source: Taxonomy, export: Taxonomy) -> CacsResult<&'static RemapRule> {
    COLLAPSE.get(&(source, export)).ok_or_else(|| {
        let err = CacsError::InvalidConversion {
            from: source,
            to: export,
        };
        log::error!("{err}");
        err
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(source: Taxonomy, export: Taxonomy) -> Vec<(&'static str, Option<&'static str>)> {
        let rule = collapse_rule(source, export).unwrap();
        source
            .labels()
            .iter()
            .map(|d| (d.name, artery_name(rule.apply(d.value))))
            .collect()
    }

    #[test]
    fn test_non_coronary_cleared() {
        for (name, group) in groups(SegmentLevel, ArteryLevel) {
            let value = SegmentLevel.value_of(name).unwrap();
            if value == 1 || value >= 24 {
                assert_eq!(group, None, "{name}");
            } else {
                assert!(group.is_some(), "{name}");
            }
        }
        for (name, group) in groups(Segment17, Segment17) {
            assert_eq!(group.is_none(), name == "OTHER" || Segment17.value_of(name).unwrap() > 18);
        }
    }

    #[test]
    fn test_lm_folding() {
        let lm = SegmentLevel.value_of("LM_BIF_LAD_LCX").unwrap();
        assert_eq!(collapse_rule(SegmentLevel, ArteryLevel).unwrap().apply(lm), LAD);
        assert_eq!(collapse_rule(SegmentLevel, SegmentLevel).unwrap().apply(lm), LM);
        assert_eq!(collapse_rule(ArteryLevelWithLM, ArteryLevel).unwrap().apply(LM), LAD);
        assert_eq!(collapse_rule(ArteryLevelWithLM, ArteryLevelWithLM).unwrap().apply(LM), LM);
    }

    #[test]
    fn test_unspecified_coronary_kept() {
        let cc = SegmentLevel.value_of("CC").unwrap();
        for export in [ArteryLevel, ArteryLevelWithLM, SegmentLevel, SegmentLevelDLNExport] {
            let rule = collapse_rule(SegmentLevel, export).unwrap();
            assert_eq!(artery_name(rule.apply(cc)), Some("CC"), "{export:?}");
        }
    }

    #[test]
    fn test_17_segment_groups() {
        let g: HashMap<_, _> = groups(Segment17, Segment17).into_iter().collect();
        assert_eq!(g["R_PLB"], Some("RCA"));
        assert_eq!(g["R_PDA"], Some("RCA"));
        assert_eq!(g["LM"], Some("LM"));
        assert_eq!(g["D2"], Some("LAD"));
        assert_eq!(g["RIM"], Some("LAD"));
        assert_eq!(g["L_PDA"], Some("LCX"));
    }

    #[test]
    fn test_unsupported_pair() {
        assert!(matches!(
            collapse_rule(ArteryLevel, SegmentLevel),
            Err(CacsError::InvalidConversion { .. })
        ));
        assert!(collapse_rule(SegmentLevel, Segment17).is_err());
    }
}
