use super::{CalciumScore, ScoreContext, ScoreKind};
use crate::lesion::Hit;

/// 体积分数: 病灶体素数乘以单个体素体积 (立方毫米).
#[derive(Copy, Clone, Debug, Default)]
pub struct VolumeScore;

impl CalciumScore for VolumeScore {
    type Value = f64;

    const KIND: ScoreKind = ScoreKind::Volume;

    fn leaf(&self, hits: &[Hit], ctx: &ScoreContext) -> f64 {
        let voxel = ctx.spacing.voxel_volume();
        hits.iter().fold(0.0, |a, h| a + h.voxel_count as f64 * voxel)
    }

    fn aggregate(&self, parts: Vec<f64>) -> f64 {
        parts.into_iter().fold(0.0, |a, b| a + b)
    }
}
