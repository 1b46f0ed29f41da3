//! 遮挡窗口采样.
//!
//! 在步长网格上枚举窗口中心, 将窗口截断到图像内, 生成被遮挡的图像副本,
//! 并按固定大小分批输出.

use crate::config::{SweepSpec, TrailingBatch};
use crate::data::{GridIter, Image, MaskedImage, Window};
use crate::Idx2d;
use itertools::iproduct;

/// 一批被遮挡的图像, 按采样顺序排列.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    items: Vec<MaskedImage>,
}

impl Batch {
    #[inline]
    fn with_capacity(n: usize) -> Self {
        Self {
            items: Vec::with_capacity(n),
        }
    }

    /// 批内图像个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// 是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 按顺序获取所有被遮挡图像的引用.
    pub fn images(&self) -> Vec<&Image> {
        self.items.iter().map(MaskedImage::image).collect()
    }

    /// 按顺序获取所有窗口中心.
    pub fn positions(&self) -> Vec<Idx2d> {
        self.items.iter().map(MaskedImage::center).collect()
    }

    /// 迭代批内元素.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, MaskedImage> {
        self.items.iter()
    }
}

/// 惰性的, 只能遍历一次的遮挡批次序列.
///
/// 每次调用 `next` 时才生成下一批的图像副本, 因此任一时刻最多只有
/// `batch_size` 份副本存活. 该结构不实现 `Clone`; 若要重新采样,
/// 请构建新的实例.
#[derive(Debug)]
pub struct WindowSampler<'a> {
    image: &'a Image,
    grid: GridIter,
    mask_size: usize,
    batch_size: usize,
    trailing: TrailingBatch,
}

impl<'a> WindowSampler<'a> {
    /// 按 `spec` 给出的窗口边长, 步长, 批大小构建采样器.
    ///
    /// `spec` 应当已经通过 [`SweepSpec::validate`], 否则程序 panic.
    pub fn new(image: &'a Image, spec: &SweepSpec) -> Self {
        assert_ne!(spec.batch_size(), 0, "批大小不能为 0");
        Self {
            image,
            grid: GridIter::new(image.shape(), spec.stride()),
            mask_size: spec.mask_size(),
            batch_size: spec.batch_size(),
            trailing: spec.trailing(),
        }
    }

    /// 剩余网格点个数.
    #[inline]
    pub fn remaining_centers(&self) -> usize {
        self.grid.len()
    }

    /// 剩余批次中将实际输出的窗口个数.
    ///
    /// 在 [`TrailingBatch::Drop`] 模式下, 这不包括最后被丢弃的不完整批次.
    pub fn expected_windows(&self) -> usize {
        let n = self.remaining_centers();
        match self.trailing {
            TrailingBatch::Drop => n - n % self.batch_size,
            TrailingBatch::Flush => n,
        }
    }
}

impl Iterator for WindowSampler<'_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Self::Item> {
        let shape = self.image.shape();
        let mut batch = Batch::with_capacity(self.batch_size);
        for center in self.grid.by_ref() {
            let window = Window::clamped(center, self.mask_size, shape);
            batch.items.push(self.image.masked(window));
            if batch.len() == self.batch_size {
                return Some(batch);
            }
        }
        // 网格已耗尽.
        match self.trailing {
            TrailingBatch::Flush if !batch.is_empty() => Some(batch),
            _ => None,
        }
    }
}

/// 边界回避模式的一次性采样.
///
/// 只保留整个窗口都位于图像内部的中心 (`half <= x <= H - half`, 列方向同理),
/// 中心从 `half` 开始以 `stride` 为步长. 返回全部被遮挡的图像, 不分批.
///
/// `stride` 为 0 时程序 panic.
pub fn sample_inner(image: &Image, mask_size: usize, stride: usize) -> Vec<MaskedImage> {
    assert_ne!(stride, 0, "步长不能为 0");
    let shape @ (h, w) = image.shape();
    let half = crate::data::window::half_of(mask_size);
    iproduct!(
        (half..=h.saturating_sub(half)).step_by(stride),
        (half..=w.saturating_sub(half)).step_by(stride)
    )
    .filter_map(|center| Window::inner(center, mask_size, shape))
    .map(|window| image.masked(window))
    .collect()
}
