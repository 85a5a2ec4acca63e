use super::{Agatston, CalciumScore, ScoreContext, ScoreKind, VolumeScore};
use crate::lesion::Hit;

/// 密度分数: `Agatston / (体积 / 层厚)`. 体积为 0 时为 0.
///
/// 汇总区域直接累加子区域的密度分数, 而不是用汇总后的 Agatston 和体积重新计算.
#[derive(Copy, Clone, Debug, Default)]
pub struct DensityScore;

impl CalciumScore for DensityScore {
    type Value = f64;

    const KIND: ScoreKind = ScoreKind::Density;

    fn leaf(&self, hits: &[Hit], ctx: &ScoreContext) -> f64 {
        let volume = VolumeScore.leaf(hits, ctx);
        if volume == 0.0 {
            return 0.0;
        }
        Agatston.leaf(hits, ctx) / (volume * (1.0 / ctx.slice_thickness_mm))
    }

    fn aggregate(&self, parts: Vec<f64>) -> f64 {
        parts.into_iter().fold(0.0, |a, b| a + b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Spacing;

    #[test]
    fn test_density_leaf() {
        let ctx = ScoreContext {
            spacing: Spacing::new(0.5, 0.5, 3.0),
            slice_step: 1,
            slice_thickness_mm: 3.0,
        };
        let hits = [Hit {
            lesion: 1,
            slice: 0,
            voxel_count: 8,
            max_hu: 310,
        }];
        // Agatston = 8 * 0.25 * 3 = 6; volume = 8 * 0.75 = 6.
        assert!((DensityScore.leaf(&hits, &ctx) - 3.0).abs() < 1e-9);
        assert_eq!(DensityScore.leaf(&[], &ctx), 0.0);
    }
}
