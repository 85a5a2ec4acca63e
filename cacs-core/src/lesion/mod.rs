//! 病灶提取与逐切片分解.
//!
//! 1. 按 (源体系, 导出体系) 把标注合并为动脉组, 并清除非冠脉结构;
//! 2. 对每个动脉组值 **分别** 做 3D 6-邻接连通域分析, 再以递增偏移合并编号;
//! 3. 对每个病灶的每个切片做 2D 4-邻接连通域分析, 并按原始标签给出动脉名称分解.
//!
//! 第 2, 3 步在开启 `rayon` 时分别按动脉组和按病灶并行.

use std::collections::BTreeMap;

use itertools::Itertools;
use ndarray::{Array2, Array3, Zip};

use crate::components::{areas_2d, label_3d};
use crate::consts::label::is_scorable;
use crate::data::{CtData3d, CtLabel, LabelSlice, ScanSlice};
use crate::error::CacsResult;
use crate::taxonomy::remap::remap;
use crate::taxonomy::{check_conversion, relabel_for_scoring, Taxonomy};
use crate::{Idx2d, Idx3d};

mod collapse;
mod record;

pub use collapse::{artery_name, collapse_rule};
pub use record::{ArteryStat, Hit, Lesion, LesionDecomposition, SliceComponent, SliceRecord};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// 提取病灶. 返回与 `label` 同形状的病灶编号体积 (0 为背景) 和病灶个数.
///
/// 编号本身没有约定, 调用方只应依赖病灶个数和各病灶的体素集合.
pub fn extract_lesions(
    label: &CtLabel,
    source: Taxonomy,
    export: Taxonomy,
) -> CacsResult<(Array3<u32>, usize)> {
    let (components, groups) = extract_groups(label, source, export)?;
    Ok((components, groups.len()))
}

/// 同 [`extract_lesions`], 但额外返回每个病灶 (编号 `i + 1`) 所属的动脉组值.
fn extract_groups(
    label: &CtLabel,
    source: Taxonomy,
    export: Taxonomy,
) -> CacsResult<(Array3<u32>, Vec<u8>)> {
    let collapsed = remap(label, collapse_rule(source, export)?);
    let values: Vec<u8> = collapsed
        .distinct_values()
        .into_iter()
        .filter(|v| is_scorable(*v))
        .collect();

    let label_value = |v: u8| {
        let mask = collapsed.data().mapv(|p| p == v);
        label_3d(mask.view())
    };

    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            let parts: Vec<_> = values.par_iter().map(|v| label_value(*v)).collect();
        } else {
            let parts: Vec<_> = values.iter().map(|v| label_value(*v)).collect();
        }
    }

    let mut merged = Array3::<u32>::zeros(collapsed.data().dim());
    let mut groups: Vec<u8> = Vec::new();
    for (&value, (labels, n)) in values.iter().zip(parts) {
        let offset = groups.len() as u32;
        Zip::from(&mut merged).and(&labels).for_each(|m, &l| {
            if l != 0 {
                *m = offset + l;
            }
        });
        groups.extend(std::iter::repeat(value).take(n));
        log::debug!("artery group {value}: {n} lesions");
    }
    Ok((merged, groups))
}

/// 病灶提取与分解器.
#[derive(Copy, Clone, Debug)]
pub struct LesionExtractor {
    source: Taxonomy,
    taxonomy: Taxonomy,
}

impl LesionExtractor {
    /// `source` 为标注所属体系, `taxonomy` 为评分 (导出) 体系.
    ///
    /// 两者之间不存在合并规则或命名转换时返回错误.
    pub fn new(source: Taxonomy, taxonomy: Taxonomy) -> CacsResult<Self> {
        collapse_rule(source, taxonomy)?;
        if !source.is_value_subset_of(taxonomy) {
            check_conversion(source, taxonomy)?;
        }
        Ok(Self { source, taxonomy })
    }

    /// 标注所属体系.
    #[inline]
    pub fn source(&self) -> Taxonomy {
        self.source
    }

    /// 评分体系.
    #[inline]
    pub fn taxonomy(&self) -> Taxonomy {
        self.taxonomy
    }

    /// 分解一个病例.
    pub fn decompose(&self, data: &CtData3d) -> CacsResult<LesionDecomposition> {
        let (components, groups) = extract_groups(&data.label, self.source, self.taxonomy)?;
        let naming = relabel_for_scoring(&data.label, self.source, self.taxonomy)?;

        let mut voxels: Vec<Vec<Idx3d>> = vec![Vec::new(); groups.len()];
        for (pos, &id) in components.indexed_iter() {
            if id != 0 {
                voxels[id as usize - 1].push(pos);
            }
        }

        let describe = |(i, positions): (usize, Vec<Idx3d>)| {
            let lesion = describe_lesion(groups[i], &positions, data, &naming, self.taxonomy);
            (i as u32 + 1, lesion)
        };

        cfg_if::cfg_if! {
            if #[cfg(feature = "rayon")] {
                let lesions: BTreeMap<u32, Lesion> =
                    voxels.into_par_iter().enumerate().map(describe).collect();
            } else {
                let lesions: BTreeMap<u32, Lesion> =
                    voxels.into_iter().enumerate().map(describe).collect();
            }
        }

        log::debug!(
            "{} lesions in {} slices ({} -> {})",
            lesions.len(),
            data.len_z(),
            self.source,
            self.taxonomy
        );
        Ok(LesionDecomposition {
            spacing: data.spacing(),
            source: self.source,
            taxonomy: self.taxonomy,
            lesions,
        })
    }
}

/// `positions` 按行优先排列, 因此同一切片的体素是连续的.
fn describe_lesion(
    group: u8,
    positions: &[Idx3d],
    data: &CtData3d,
    naming: &CtLabel,
    taxonomy: Taxonomy,
) -> Lesion {
    let mut slices = BTreeMap::new();
    for (z, voxels) in &positions.iter().group_by(|p| p.0) {
        let pixels: Vec<Idx2d> = voxels.map(|&(_, h, w)| (h, w)).collect();
        let record = describe_slice(
            z,
            &pixels,
            &data.scan.slice_at(z),
            &naming.slice_at(z),
            taxonomy,
        );
        slices.insert(z, record);
    }
    Lesion {
        artery: artery_name(group).unwrap_or("OTHER").to_owned(),
        voxel_count: positions.len(),
        slices,
    }
}

fn describe_slice(
    z: usize,
    pixels: &[Idx2d],
    scan: &ScanSlice,
    naming: &LabelSlice,
    taxonomy: Taxonomy,
) -> SliceRecord {
    // 只在病灶的包围盒内做 2D 连通域分析.
    let (h0, w0) = pixels
        .iter()
        .fold((usize::MAX, usize::MAX), |(h, w), p| (h.min(p.0), w.min(p.1)));
    let (h1, w1) = pixels
        .iter()
        .fold((0, 0), |(h, w), p| (h.max(p.0), w.max(p.1)));
    let mut mask = Array2::<bool>::default((h1 - h0 + 1, w1 - w0 + 1));
    for &(h, w) in pixels {
        mask[(h - h0, w - w0)] = true;
    }

    let mut total = ArteryStat::default();
    let mut labeled_as: BTreeMap<String, ArteryStat> = BTreeMap::new();
    let mut components = Vec::new();
    for area in areas_2d(mask.view()) {
        let mut comp_total = ArteryStat::default();
        let mut comp_labeled: BTreeMap<String, ArteryStat> = BTreeMap::new();
        for (h, w) in area {
            let pos = (h + h0, w + w0);
            let hu = scan[pos];
            comp_total.add(hu);
            if let Some(name) = taxonomy.name_of(naming[pos]) {
                comp_labeled.entry(name.to_owned()).or_default().add(hu);
            }
        }
        total.merge(&comp_total);
        for (name, stat) in comp_labeled.iter() {
            labeled_as.entry(name.clone()).or_default().merge(stat);
        }
        components.push(SliceComponent {
            voxel_count_2d: comp_total.voxel_count,
            max_hu: comp_total.max_hu,
            labeled_as: comp_labeled,
        });
    }

    SliceRecord {
        slice_number: z,
        voxel_count_2d: total.voxel_count,
        max_hu: total.max_hu,
        labeled_as,
        components,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CtScan, Spacing};

    fn case(label: Array3<u8>, hu: i16) -> CtData3d {
        let spacing = Spacing::new(1.0, 1.0, 1.0);
        let scan = CtScan::from_raw(Array3::from_elem(label.dim(), hu), spacing).unwrap();
        CtData3d::new(scan, CtLabel::from_raw(label, spacing).unwrap()).unwrap()
    }

    #[test]
    fn test_values_labelled_separately() {
        // 两个相接的不同动脉组不会合并.
        let mut label = Array3::<u8>::zeros((1, 3, 4));
        label[(0, 1, 0)] = 2;
        label[(0, 1, 1)] = 2;
        label[(0, 1, 2)] = 3;
        label[(0, 1, 3)] = 1;
        let label = CtLabel::from_raw(label, Spacing::new(1.0, 1.0, 1.0)).unwrap();
        let (ids, n) =
            extract_lesions(&label, Taxonomy::ArteryLevel, Taxonomy::ArteryLevel).unwrap();
        assert_eq!(n, 2);
        assert_ne!(ids[(0, 1, 1)], ids[(0, 1, 2)]);
        assert_eq!(ids[(0, 1, 3)], 0);
    }

    #[test]
    fn test_segments_collapse_into_one_lesion() {
        let seg = Taxonomy::SegmentLevel;
        let mut label = Array3::<u8>::zeros((2, 3, 3));
        label[(0, 1, 1)] = seg.value_of("LAD_PROXIMAL").unwrap();
        label[(1, 1, 1)] = seg.value_of("LAD_MID").unwrap();
        label[(1, 0, 0)] = seg.value_of("AORTA").unwrap();
        let label = CtLabel::from_raw(label, Spacing::new(1.0, 1.0, 1.0)).unwrap();
        let (_, n) = extract_lesions(&label, seg, seg).unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn test_empty_volume() {
        let data = case(Array3::from_elem((3, 4, 4), 1), 500);
        let d = LesionExtractor::new(Taxonomy::ArteryLevel, Taxonomy::ArteryLevel)
            .unwrap()
            .decompose(&data)
            .unwrap();
        assert_eq!(d.num_lesions(), 0);
        assert!(d.hits_by_name().is_empty());
    }

    #[test]
    fn test_slice_breakdown() {
        let seg = Taxonomy::SegmentLevel;
        let prox = seg.value_of("LAD_PROXIMAL").unwrap();
        let mid = seg.value_of("LAD_MID").unwrap();

        // z=0: 一个区域, 其中两个分段相接; z=1: 两个不相邻的区域, 经 z=0 在 3D 中相连.
        let mut label = Array3::<u8>::zeros((2, 3, 5));
        label[(0, 1, 1)] = prox;
        label[(0, 1, 2)] = prox;
        label[(0, 1, 3)] = mid;
        label[(1, 1, 1)] = prox;
        label[(1, 1, 3)] = mid;
        let mut scan = Array3::<i16>::from_elem(label.dim(), 100);
        scan[(0, 1, 3)] = 420;
        scan[(1, 1, 1)] = 210;
        let spacing = Spacing::new(1.0, 1.0, 1.0);
        let data = CtData3d::new(
            CtScan::from_raw(scan, spacing).unwrap(),
            CtLabel::from_raw(label, spacing).unwrap(),
        )
        .unwrap();

        let d = LesionExtractor::new(seg, seg).unwrap().decompose(&data).unwrap();
        assert_eq!(d.num_lesions(), 1);
        let lesion = &d.lesions[&1];
        assert_eq!(lesion.artery, "LAD");
        assert_eq!(lesion.voxel_count, 5);

        let s0 = &lesion.slices[&0];
        assert_eq!(s0.components.len(), 1);
        assert_eq!(s0.voxel_count_2d, 3);
        assert_eq!(s0.max_hu, 420);
        assert_eq!(s0.labeled_as["LAD_PROXIMAL"].voxel_count, 2);
        assert_eq!(s0.labeled_as["LAD_PROXIMAL"].max_hu, 100);
        assert_eq!(s0.labeled_as["LAD_MID"].max_hu, 420);

        let s1 = &lesion.slices[&1];
        assert_eq!(s1.slice_number, 1);
        assert_eq!(s1.components.len(), 2);
        assert_eq!(s1.components[0].max_hu, 210);
        assert!(s1.components[0].labeled_as.contains_key("LAD_PROXIMAL"));
        assert!(s1.components[1].labeled_as.contains_key("LAD_MID"));
    }

    #[test]
    fn test_names_follow_score_taxonomy() {
        let seg = Taxonomy::SegmentLevel;
        let mut label = Array3::<u8>::zeros((1, 2, 2));
        label[(0, 0, 0)] = seg.value_of("LM_BRANCH").unwrap();
        label[(0, 0, 1)] = seg.value_of("RCA_DISTAL").unwrap();
        let data = case(label, 300);
        let d = LesionExtractor::new(seg, Taxonomy::ArteryLevel)
            .unwrap()
            .decompose(&data)
            .unwrap();
        let names: Vec<_> = d.names().into_iter().collect();
        assert_eq!(names, ["LAD", "RCA"]);
    }

    #[test]
    fn test_invalid_pair() {
        assert!(LesionExtractor::new(Taxonomy::ArteryLevel, Taxonomy::SegmentLevel).is_err());
    }
}
