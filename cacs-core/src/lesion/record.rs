//! 病灶分解记录. 开启 `serde` 时即为中间 JSON 缓存的格式:
//!
//! ```text
//! {
//!   "spacing": {..}, "source": "..", "taxonomy": "..",
//!   "lesions": {
//!     "<病灶编号>": {
//!       "artery": "LAD", "voxelCount": 12,
//!       "slices": {
//!         "<切片序号>": {
//!           "sliceNumber": 3, "voxelCount2D": 4, "maxHU": 310,
//!           "labeledAs": {"<动脉名称>": {"voxelCount": 4, "maxHU": 310}},
//!           "components": [{"voxelCount2D": 4, "maxHU": 310, "labeledAs": {..}}]
//!         }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! 即 `lesions → 病灶编号 → slices → 切片序号 → 切片记录`. 每个病灶在切片之上
//! 多一层, 携带所属动脉组和体素总数.

use std::collections::{BTreeMap, BTreeSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::data::Spacing;
use crate::taxonomy::Taxonomy;

/// 某条动脉在一个 2D 区域内的统计.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ArteryStat {
    /// 体素个数.
    pub voxel_count: usize,

    /// 最大 HU 值.
    #[cfg_attr(feature = "serde", serde(rename = "maxHU"))]
    pub max_hu: i16,
}

impl ArteryStat {
    pub(crate) fn add(&mut self, hu: i16) {
        self.voxel_count += 1;
        self.max_hu = self.max_hu.max(hu);
    }

    pub(crate) fn merge(&mut self, other: &ArteryStat) {
        self.voxel_count += other.voxel_count;
        self.max_hu = self.max_hu.max(other.max_hu);
    }
}

impl Default for ArteryStat {
    fn default() -> Self {
        Self {
            voxel_count: 0,
            max_hu: i16::MIN,
        }
    }
}

/// 病灶在某个水平切片上的一个 4-连通区域.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SliceComponent {
    /// 区域体素个数.
    #[cfg_attr(feature = "serde", serde(rename = "voxelCount2D"))]
    pub voxel_count_2d: usize,

    /// 区域最大 HU 值.
    #[cfg_attr(feature = "serde", serde(rename = "maxHU"))]
    pub max_hu: i16,

    /// 按原始标签解析出的动脉名称分解.
    pub labeled_as: BTreeMap<String, ArteryStat>,
}

/// 病灶在某个水平切片上的全部体素.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SliceRecord {
    /// 切片序号 (z 下标).
    pub slice_number: usize,

    /// 该切片上的体素个数.
    #[cfg_attr(feature = "serde", serde(rename = "voxelCount2D"))]
    pub voxel_count_2d: usize,

    /// 该切片上的最大 HU 值.
    #[cfg_attr(feature = "serde", serde(rename = "maxHU"))]
    pub max_hu: i16,

    /// 整个切片的动脉名称分解.
    pub labeled_as: BTreeMap<String, ArteryStat>,

    /// 各 4-连通区域, 按首个像素的行优先顺序.
    pub components: Vec<SliceComponent>,
}

/// 一个 3D 病灶.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Lesion {
    /// 所属动脉组 (LAD / LCX / RCA / LM / CC).
    pub artery: String,

    /// 体素总数.
    pub voxel_count: usize,

    /// 切片序号 -> 切片记录.
    pub slices: BTreeMap<usize, SliceRecord>,
}

/// 评分用的最小单元: 一个病灶在一个切片上一个区域内属于某条动脉的部分.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Hit {
    /// 病灶编号.
    pub lesion: u32,

    /// 切片序号.
    pub slice: usize,

    /// 体素个数.
    pub voxel_count: usize,

    /// 最大 HU 值.
    pub max_hu: i16,
}

/// 一个病例的完整病灶分解.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct LesionDecomposition {
    /// 体素分辨率.
    pub spacing: Spacing,

    /// 标注原本所属的体系.
    pub source: Taxonomy,

    /// `labeledAs` 中动脉名称所属的体系.
    pub taxonomy: Taxonomy,

    /// 病灶编号 -> 病灶.
    pub lesions: BTreeMap<u32, Lesion>,
}

impl LesionDecomposition {
    /// 病灶个数.
    #[inline]
    pub fn num_lesions(&self) -> usize {
        self.lesions.len()
    }

    /// 出现过的所有动脉名称.
    pub fn names(&self) -> BTreeSet<&str> {
        self.lesions
            .values()
            .flat_map(|l| l.slices.values())
            .flat_map(|s| s.components.iter())
            .flat_map(|c| c.labeled_as.keys())
            .map(String::as_str)
            .collect()
    }

    /// 以动脉名称聚合所有评分单元. 同一名称下的单元按 (病灶, 切片) 升序.
    pub fn hits_by_name(&self) -> BTreeMap<String, Vec<Hit>> {
        let mut ans: BTreeMap<String, Vec<Hit>> = BTreeMap::new();
        for (&lesion, l) in self.lesions.iter() {
            for (&slice, record) in l.slices.iter() {
                for comp in record.components.iter() {
                    for (name, stat) in comp.labeled_as.iter() {
                        ans.entry(name.clone()).or_default().push(Hit {
                            lesion,
                            slice,
                            voxel_count: stat.voxel_count,
                            max_hu: stat.max_hu,
                        });
                    }
                }
            }
        }
        ans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(voxel_count: usize, max_hu: i16) -> ArteryStat {
        ArteryStat {
            voxel_count,
            max_hu,
        }
    }

    fn sample() -> LesionDecomposition {
        let comp = |pairs: &[(&str, ArteryStat)]| SliceComponent {
            voxel_count_2d: pairs.iter().map(|(_, s)| s.voxel_count).sum(),
            max_hu: pairs.iter().map(|(_, s)| s.max_hu).max().unwrap(),
            labeled_as: pairs.iter().map(|(n, s)| (n.to_string(), *s)).collect(),
        };
        let slice = |z, comps: Vec<SliceComponent>| SliceRecord {
            slice_number: z,
            voxel_count_2d: comps.iter().map(|c| c.voxel_count_2d).sum(),
            max_hu: comps.iter().map(|c| c.max_hu).max().unwrap(),
            labeled_as: BTreeMap::new(),
            components: comps,
        };
        let lesion = Lesion {
            artery: "LAD".into(),
            voxel_count: 6,
            slices: BTreeMap::from([
                (3, slice(3, vec![comp(&[("LAD_PROXIMAL", stat(2, 300))])])),
                (
                    4,
                    slice(
                        4,
                        vec![
                            comp(&[("LAD_PROXIMAL", stat(1, 180))]),
                            comp(&[("LAD_MID", stat(3, 450))]),
                        ],
                    ),
                ),
            ]),
        };
        LesionDecomposition {
            spacing: Spacing::new(0.5, 0.5, 3.0),
            source: Taxonomy::SegmentLevel,
            taxonomy: Taxonomy::SegmentLevel,
            lesions: BTreeMap::from([(1, lesion)]),
        }
    }

    #[test]
    fn test_hits_by_name() {
        let d = sample();
        let hits = d.hits_by_name();
        assert_eq!(hits.len(), 2);
        let prox = &hits["LAD_PROXIMAL"];
        assert_eq!(prox.len(), 2);
        assert_eq!((prox[0].slice, prox[0].voxel_count, prox[0].max_hu), (3, 2, 300));
        assert_eq!((prox[1].slice, prox[1].voxel_count, prox[1].max_hu), (4, 1, 180));
        assert_eq!(hits["LAD_MID"][0].max_hu, 450);
        assert_eq!(d.names().into_iter().collect::<Vec<_>>(), ["LAD_MID", "LAD_PROXIMAL"]);
    }

    #[test]
    fn test_artery_stat_merge() {
        let mut a = ArteryStat::default();
        a.add(200);
        a.add(150);
        assert_eq!(a, stat(2, 200));
        a.merge(&stat(3, 500));
        assert_eq!(a, stat(5, 500));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        let lesion = &json["lesions"]["1"];
        assert_eq!(lesion["artery"], "LAD");
        assert_eq!(lesion["voxelCount"], 6);
        assert!(json["lesions"]["3"].is_null());
        let slice = &lesion["slices"]["3"];
        assert_eq!(slice["sliceNumber"], 3);
        assert_eq!(slice["voxelCount2D"], 2);
        assert_eq!(slice["maxHU"], 300);
        assert!(slice["components"][0]["labeledAs"]["LAD_PROXIMAL"]["voxelCount"].is_number());
    }
}
