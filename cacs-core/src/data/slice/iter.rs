use crate::Idx2d;

/// 行优先的二维索引迭代器.
///
/// 与 `(0..h).flat_map(..)` 组合出的迭代器相比, 该结构体积更小,
/// 并且能精确报告剩余长度.
#[derive(Debug, Clone)]
pub struct PosIter {
    next: usize,
    h: usize,
    w: usize,
}

impl PosIter {
    /// 迭代形状为 `(h, w)` 的图像的所有索引.
    #[inline]
    pub fn new((h, w): Idx2d) -> Self {
        Self { next: 0, h, w }
    }
}

impl Iterator for PosIter {
    type Item = Idx2d;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.h * self.w {
            return None;
        }
        let pos = (self.next / self.w, self.next % self.w);
        self.next += 1;
        Some(pos)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = (self.h * self.w).saturating_sub(self.next);
        (rest, Some(rest))
    }
}

impl ExactSizeIterator for PosIter {}
