use super::{CalciumScore, ScoreContext, ScoreKind};
use crate::consts::hu::{CALCIUM, WEIGHT_2, WEIGHT_3, WEIGHT_4};
use crate::lesion::Hit;

/// Agatston 密度权重.
///
/// | 峰值 HU      | 权重 |
/// |--------------|------|
/// | < 130        | 0    |
/// | \[130, 200)  | 1    |
/// | \[200, 300)  | 2    |
/// | \[300, 400)  | 3    |
/// | ≥ 400        | 4    |
#[inline]
pub fn density_factor(hu: i16) -> u8 {
    match hu {
        h if h < CALCIUM => 0,
        h if h < WEIGHT_2 => 1,
        h if h < WEIGHT_3 => 2,
        h if h < WEIGHT_4 => 3,
        _ => 4,
    }
}

/// Agatston 分数: 每个 (病灶, 切片, 区域) 的面积乘以该区域峰值 HU 对应的权重.
///
/// 只有满足 `z % slice_step == 0` 的切片参与计算.
#[derive(Copy, Clone, Debug, Default)]
pub struct Agatston;

impl CalciumScore for Agatston {
    type Value = f64;

    const KIND: ScoreKind = ScoreKind::Agatston;

    fn leaf(&self, hits: &[Hit], ctx: &ScoreContext) -> f64 {
        let pixel_area = ctx.spacing.pixel_area();
        hits.iter()
            .filter(|h| h.slice % ctx.slice_step == 0)
            .map(|h| h.voxel_count as f64 * pixel_area * density_factor(h.max_hu) as f64)
            .fold(0.0, |a, b| a + b)
    }

    fn aggregate(&self, parts: Vec<f64>) -> f64 {
        parts.into_iter().fold(0.0, |a, b| a + b)
    }
}
