use crate::Idx2d;
use std::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 遮挡窗口. 由窗口中心和已经按图像边界截断的行列范围组成.
///
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Window {
    center: Idx2d,
    rows: Range<usize>,
    cols: Range<usize>,
}

/// 窗口半径. 对奇数边长向下取整, 即窗口在奇数边长时是不对称的.
#[inline]
pub const fn half_of(mask_size: usize) -> usize {
    mask_size / 2
}

impl Window {
    /// 构建以 `center` 为中心、边长为 `mask_size` 的窗口, 并截断到 `(h, w)` 图像内.
    ///
    /// 行范围为 `[max(x - half, 0), min(x + half, h))`, 列范围同理.
    /// `center` 越界时程序 panic.
    pub fn clamped(center: Idx2d, mask_size: usize, (h, w): Idx2d) -> Self {
        let (x, y) = center;
        assert!(x < h && y < w, "窗口中心 {center:?} 越界 ({h}, {w})");
        let half = half_of(mask_size);
        Self {
            center,
            rows: x.saturating_sub(half)..(x + half).min(h),
            cols: y.saturating_sub(half)..(y + half).min(w),
        }
    }

    /// 构建完全位于 `(h, w)` 图像内部的窗口, 不做截断.
    ///
    /// 要求 `half <= x <= h - half` 且 `x < h` (列方向同理), 否则返回 `None`.
    pub fn inner(center: Idx2d, mask_size: usize, (h, w): Idx2d) -> Option<Self> {
        let (x, y) = center;
        let half = half_of(mask_size);
        let fits = |c: usize, len: usize| c < len && c >= half && c + half <= len;
        (fits(x, h) && fits(y, w)).then(|| Self {
            center,
            rows: x - half..x + half,
            cols: y - half..y + half,
        })
    }

    /// 窗口中心 (行, 列).
    #[inline]
    pub fn center(&self) -> Idx2d {
        self.center
    }

    /// 被遮挡的行范围.
    #[inline]
    pub fn rows(&self) -> Range<usize> {
        self.rows.clone()
    }

    /// 被遮挡的列范围.
    #[inline]
    pub fn cols(&self) -> Range<usize> {
        self.cols.clone()
    }

    /// 被遮挡的像素个数 (不计通道).
    #[inline]
    pub fn area(&self) -> usize {
        self.rows.len() * self.cols.len()
    }

    /// 判断 `(h, w)` 是否位于遮挡区域内.
    #[inline]
    pub fn contains(&self, (h, w): Idx2d) -> bool {
        self.rows.contains(&h) && self.cols.contains(&w)
    }
}

#[cfg(test)]
mod tests {
    use super::Window;

    #[test]
    fn test_window_clamped_corners() {
        let w = Window::clamped((0, 0), 4, (10, 10));
        assert_eq!(w.rows(), 0..2);
        assert_eq!(w.cols(), 0..2);

        let w = Window::clamped((9, 9), 4, (10, 10));
        assert_eq!(w.rows(), 7..10);
        assert_eq!(w.cols(), 7..10);
        assert_eq!(w.area(), 9);
    }

    #[test]
    fn test_window_odd_mask_is_asymmetric() {
        // half = 5 / 2 = 2, 窗口实际只有 4 个像素宽.
        let w = Window::clamped((5, 5), 5, (20, 20));
        assert_eq!(w.rows(), 3..7);
        assert_eq!(w.cols(), 3..7);
        assert!(w.contains((3, 6)));
        assert!(!w.contains((7, 5)));
    }

    #[test]
    fn test_window_non_square_image() {
        let w = Window::clamped((1, 7), 6, (3, 8));
        assert_eq!(w.rows(), 0..3);
        assert_eq!(w.cols(), 4..8);
    }

    #[test]
    #[should_panic]
    fn test_window_center_out_of_bounds() {
        Window::clamped((10, 0), 4, (10, 10));
    }

    #[test]
    fn test_window_inner() {
        assert!(Window::inner((1, 5), 4, (10, 10)).is_none());
        assert!(Window::inner((2, 9), 4, (10, 10)).is_none());
        let w = Window::inner((2, 8), 4, (10, 10)).unwrap();
        assert_eq!(w.rows(), 0..4);
        assert_eq!(w.cols(), 6..10);
    }

    #[test]
    fn test_window_zero_mask() {
        let w = Window::clamped((3, 3), 0, (10, 10));
        assert_eq!(w.area(), 0);
    }
}
