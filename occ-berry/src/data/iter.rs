use crate::Idx2d;

/// 行优先的步长网格索引迭代器.
///
/// 产生 `range(0, h, stride) × range(0, w, stride)` 的笛卡尔积, 即网格锚定在第
/// 0 行 / 第 0 列, 与遮挡窗口大小无关. 如下写法结果相同:
///
/// ```
/// use itertools::iproduct;
///
/// fn grid_auto((h, w): (usize, usize), stride: usize) -> impl Iterator<Item = (usize, usize)> {
///     iproduct!((0..h).step_by(stride), (0..w).step_by(stride))
/// }
/// ```
///
/// 但我们需要 `ExactSizeIterator` 来估计进度, 因此保留手写结构.
#[derive(Debug, Clone)]
pub struct GridIter {
    cur_h: usize,
    cur_w: usize,
    h: usize,
    w: usize,
    stride: usize,
}

impl GridIter {
    /// 构建网格迭代器. `stride` 为 0 时程序 panic.
    #[inline]
    pub fn new((h, w): Idx2d, stride: usize) -> Self {
        assert_ne!(stride, 0, "步长不能为 0");
        Self {
            cur_h: 0,
            cur_w: 0,
            h,
            w,
            stride,
        }
    }

    /// 单轴上的网格点个数, 即 `ceil(len / stride)`.
    #[inline]
    fn axis_len(len: usize, stride: usize) -> usize {
        len.div_ceil(stride)
    }
}

impl Iterator for GridIter {
    type Item = Idx2d;

    fn next(&mut self) -> Option<Self::Item> {
        if self.h == 0 || self.w == 0 || self.cur_h >= self.h {
            return None;
        }
        let ret_pos = (self.cur_h, self.cur_w);
        if self.cur_w + self.stride >= self.w {
            self.cur_w = 0;
            self.cur_h = self.cur_h.saturating_add(self.stride);
        } else {
            self.cur_w += self.stride;
        }
        Some(ret_pos)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.len();
        (n, Some(n))
    }
}

impl ExactSizeIterator for GridIter {
    fn len(&self) -> usize {
        if self.h == 0 || self.w == 0 || self.cur_h >= self.h {
            return 0;
        }
        let cols = Self::axis_len(self.w, self.stride);
        let rows_left = Self::axis_len(self.h - self.cur_h, self.stride);
        rows_left * cols - self.cur_w / self.stride
    }
}

#[cfg(test)]
mod completeness_tests {
    use super::GridIter;
    use crate::Idx2d;
    use itertools::iproduct;

    fn grid_builtin((h, w): Idx2d, stride: usize) -> impl Iterator<Item = Idx2d> {
        iproduct!((0..h).step_by(stride), (0..w).step_by(stride))
    }

    #[test]
    fn test_grid_iter() {
        for h in 0..=7 {
            for w in 0..=7 {
                for stride in 1..=4 {
                    assert!(Iterator::eq(
                        grid_builtin((h, w), stride),
                        GridIter::new((h, w), stride)
                    ));
                }
            }
        }
    }

    #[test]
    fn test_grid_iter_len() {
        for h in 0..=7 {
            for w in 0..=7 {
                for stride in 1..=4 {
                    let mut it = GridIter::new((h, w), stride);
                    let mut expected = grid_builtin((h, w), stride).count();
                    assert_eq!(it.len(), expected);
                    while it.next().is_some() {
                        expected -= 1;
                        assert_eq!(it.len(), expected);
                    }
                }
            }
        }
    }

    #[test]
    fn test_grid_anchored_at_zero() {
        // 网格不因窗口大小而偏移.
        let v: Vec<Idx2d> = GridIter::new((10, 10), 3).collect();
        assert_eq!(v.len(), 16);
        assert_eq!(v[0], (0, 0));
        assert_eq!(v[1], (0, 3));
        assert_eq!(v[4], (3, 0));
        assert_eq!(v[15], (9, 9));
    }

    #[test]
    fn test_grid_huge_stride() {
        let mut it = GridIter::new((10, 10), usize::MAX);
        assert_eq!(it.len(), 1);
        assert_eq!(it.next(), Some((0, 0)));
        assert_eq!(it.len(), 0);
        assert_eq!(it.next(), None);

        let it = GridIter::new((usize::MAX, 3), usize::MAX - 1);
        assert_eq!(it.len(), 2);
    }

    #[test]
    fn test_grid_non_square() {
        // 列方向按宽度遍历, 行方向按高度遍历.
        let v: Vec<Idx2d> = GridIter::new((2, 5), 2).collect();
        assert_eq!(v, vec![(0, 0), (0, 2), (0, 4)]);
    }
}
