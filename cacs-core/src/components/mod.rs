//! 连通域分析.
//!
//! 3D 采用 6-邻接 (仅面相邻), 2D 采用 4-邻接. 两者都显式排除对角相邻,
//! 以免把相互接触但不同的动脉合并成一个病灶.
//!
//! 编号从 1 开始, 0 代表背景. 编号按照行优先扫描时第一次遇到该连通域的顺序分配,
//! 因此相同输入总是产生相同的编号.

use std::collections::VecDeque;

use ndarray::{Array2, Array3, ArrayView2, ArrayView3};

use crate::{Idx2d, Idx3d};

/// 一个 2D 连通区域内所有像素的位置 (行优先, 按 BFS 访问顺序).
pub type Area2d = Vec<Idx2d>;

/// 多个 2D 连通区域.
pub type Areas2d = Vec<Area2d>;

/// 获得 `(h, w)` 的 4-邻居索引. 不检查越界.
#[inline]
pub(crate) fn neighbour4((h, w): Idx2d) -> [Idx2d; 4] {
    [
        (h.wrapping_sub(1), w),
        (h.saturating_add(1), w),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
    ]
}

/// 获得 `(z, h, w)` 的 6-邻居索引. 不检查越界.
#[inline]
pub(crate) fn neighbour6((z, h, w): Idx3d) -> [Idx3d; 6] {
    [
        (z.wrapping_sub(1), h, w),
        (z.saturating_add(1), h, w),
        (z, h.wrapping_sub(1), w),
        (z, h.saturating_add(1), w),
        (z, h, w.wrapping_sub(1)),
        (z, h, w.saturating_add(1)),
    ]
}

/// 对 3D 掩码做 6-邻接连通域标记.
///
/// 返回与 `mask` 同形状的编号数组, 以及连通域个数. 全 `false` 的掩码返回 0 个连通域.
pub fn label_3d(mask: ArrayView3<bool>) -> (Array3<u32>, usize) {
    let mut labels = Array3::<u32>::zeros(mask.dim());
    let mut q: VecDeque<Idx3d> = VecDeque::with_capacity(16);
    let mut n = 0u32;

    for (seed, &on) in mask.indexed_iter() {
        if !on || labels[seed] != 0 {
            continue;
        }
        n += 1;
        labels[seed] = n;
        q.push_back(seed);
        while let Some(cur) = q.pop_front() {
            for neigh in neighbour6(cur) {
                if matches!(mask.get(neigh), Some(true)) && labels[neigh] == 0 {
                    labels[neigh] = n;
                    q.push_back(neigh);
                }
            }
        }
    }
    (labels, n as usize)
}

/// 对 2D 掩码做 4-邻接连通域标记.
///
/// 返回与 `mask` 同形状的编号数组, 以及连通域个数.
pub fn label_2d(mask: ArrayView2<bool>) -> (Array2<u32>, usize) {
    let mut labels = Array2::<u32>::zeros(mask.dim());
    let mut n = 0u32;
    for area in areas_2d(mask) {
        n += 1;
        for pos in area {
            labels[pos] = n;
        }
    }
    (labels, n as usize)
}

/// 按照 4-相邻规则获取 2D 掩码中的所有区域. 两个像素属于同一个区域,
/// 当且仅当存在一条连接二者的 4-相邻路径, 且路径上的所有像素都为 `true`.
///
/// 区域按照各自第一个像素的行优先顺序排列.
pub fn areas_2d(mask: ArrayView2<bool>) -> Areas2d {
    let mut ans = Areas2d::new();
    let mut visited = Array2::<bool>::default(mask.dim());
    let mut q: VecDeque<Idx2d> = VecDeque::with_capacity(4);

    for pos in crate::data::slice::PosIter::new(mask.dim()) {
        if !mask[pos] || visited[pos] {
            continue;
        }
        visited[pos] = true;
        q.push_back(pos);
        let mut this_area = Area2d::with_capacity(1);
        while let Some(cur) = q.pop_front() {
            this_area.push(cur);
            for neigh in neighbour4(cur) {
                if matches!(mask.get(neigh), Some(true)) && !visited[neigh] {
                    visited[neigh] = true;
                    q.push_back(neigh);
                }
            }
        }
        ans.push(this_area);
    }
    ans
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};
    use std::collections::BTreeSet;

    fn point_sets(labels: &Array3<u32>, n: usize) -> BTreeSet<Vec<Idx3d>> {
        (1..=n as u32)
            .map(|id| {
                labels
                    .indexed_iter()
                    .filter_map(|(p, &v)| (v == id).then_some(p))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_empty_mask() {
        let mask = Array3::<bool>::default((3, 4, 4));
        let (labels, n) = label_3d(mask.view());
        assert_eq!(n, 0);
        assert!(labels.iter().all(|v| *v == 0));

        let (_, n) = label_2d(Array2::<bool>::default((0, 0)).view());
        assert_eq!(n, 0);
    }

    #[test]
    fn test_no_diagonal_merge_3d() {
        let mut mask = Array3::<bool>::default((2, 2, 2));
        // 仅通过边或顶点相接, 不共面.
        mask[(0, 0, 0)] = true;
        mask[(0, 1, 1)] = true;
        mask[(1, 1, 0)] = true;
        let (_, n) = label_3d(mask.view());
        assert_eq!(n, 3);

        // 面相邻则合并.
        mask[(0, 1, 0)] = true;
        let (labels, n) = label_3d(mask.view());
        assert_eq!(n, 1);
        assert_eq!(labels[(1, 1, 0)], labels[(0, 0, 0)]);
    }

    #[test]
    fn test_k_components() {
        // 三根互不相邻的竖直柱, 外加一个跨层相连的 L 形.
        let mut mask = Array3::<bool>::default((4, 6, 6));
        for z in 0..4 {
            mask[(z, 0, 0)] = true;
            mask[(z, 0, 5)] = true;
            mask[(z, 5, 0)] = true;
        }
        mask[(0, 3, 3)] = true;
        mask[(1, 3, 3)] = true;
        mask[(1, 3, 4)] = true;

        let (labels, n) = label_3d(mask.view());
        assert_eq!(n, 4);
        let sets = point_sets(&labels, n);
        assert_eq!(sets.len(), 4);
        assert!(sets.contains(&vec![(0, 3, 3), (1, 3, 3), (1, 3, 4)]));

        // 遍历顺序无关: 反转 z 轴后个数和点集大小不变.
        let mut flipped = mask.clone();
        flipped.invert_axis(ndarray::Axis(0));
        let (labels2, n2) = label_3d(flipped.view());
        assert_eq!(n2, n);
        let mut sizes: Vec<_> = point_sets(&labels2, n2).iter().map(Vec::len).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![3, 4, 4, 4]);
    }

    #[test]
    fn test_label_2d_four_connectivity() {
        let mask = array![
            [true, false, true],
            [false, true, false],
            [true, true, false],
        ];
        let (labels, n) = label_2d(mask.view());
        assert_eq!(n, 3);
        assert_eq!(labels[(0, 0)], 1);
        assert_eq!(labels[(0, 2)], 2);
        assert_eq!(labels[(1, 1)], 3);
        assert_eq!(labels[(2, 0)], 3);
        assert_eq!(labels[(2, 1)], 3);
        assert_eq!(labels[(1, 0)], 0);
    }

    #[test]
    fn test_areas_2d_order() {
        let mask = array![[false, true], [true, true]];
        let areas = areas_2d(mask.view());
        assert_eq!(areas.len(), 1);
        assert_eq!(areas[0][0], (0, 1));
        assert_eq!(areas[0].len(), 3);
    }
}
