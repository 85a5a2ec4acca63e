use std::collections::BTreeSet;

use super::{CalciumScore, ScoreContext, ScoreKind};
use crate::lesion::Hit;

/// 病灶个数. 叶子区域计不同的 3D 病灶, 汇总区域累加.
///
/// 跨越多个分段的病灶在每个分段都计一次.
#[derive(Copy, Clone, Debug, Default)]
pub struct NumLesions;

impl CalciumScore for NumLesions {
    type Value = f64;

    const KIND: ScoreKind = ScoreKind::NumLesions;

    fn leaf(&self, hits: &[Hit], _: &ScoreContext) -> f64 {
        hits.iter().map(|h| h.lesion).collect::<BTreeSet<_>>().len() as f64
    }

    fn aggregate(&self, parts: Vec<f64>) -> f64 {
        parts.into_iter().fold(0.0, |a, b| a + b)
    }
}
