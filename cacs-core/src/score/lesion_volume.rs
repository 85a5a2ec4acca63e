use std::collections::BTreeMap;

use super::{CalciumScore, ScoreContext, ScoreKind};
use crate::lesion::Hit;

/// 病灶编号 -> 体积 (立方毫米).
pub type LesionVolumes = BTreeMap<u32, f64>;

/// 逐病灶体积. 汇总区域按病灶编号合并, 同一病灶的体积相加.
#[derive(Copy, Clone, Debug, Default)]
pub struct LesionVolume;

impl CalciumScore for LesionVolume {
    type Value = LesionVolumes;

    const KIND: ScoreKind = ScoreKind::LesionVolume;

    fn leaf(&self, hits: &[Hit], ctx: &ScoreContext) -> LesionVolumes {
        let voxel = ctx.spacing.voxel_volume();
        let mut ans = LesionVolumes::new();
        for h in hits {
            *ans.entry(h.lesion).or_default() += h.voxel_count as f64 * voxel;
        }
        ans
    }

    fn aggregate(&self, parts: Vec<LesionVolumes>) -> LesionVolumes {
        let mut ans = LesionVolumes::new();
        for (id, v) in parts.into_iter().flatten() {
            *ans.entry(id).or_default() += v;
        }
        ans
    }
}
