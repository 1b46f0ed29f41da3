//! 热力图的累积与规范化.
//!
//! 以原图像素坐标为索引, 用四张形状相同的二维图记录每个窗口中心的采样结果:
//! 真值类别概率, 平均特征激活, 预测类别, 采样次数.

mod finalize;

use crate::Idx2d;
use ndarray::{Array2, ArrayView2};

pub use finalize::FinalizedHeatMaps;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 单个窗口中心的采样结果.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleResult {
    /// 真值类别的概率.
    pub probability: f32,

    /// 所选滤波器特征图的平均激活值.
    pub feature_mean: f64,

    /// 概率最大的类别索引.
    pub predicted_class: usize,
}

/// 未规范化的热力图.
///
/// 所有条目初始为 0, 只有采样器访问过的坐标才会被写入. 同一坐标被多次访问时,
/// 概率和特征值累加, 预测类别取最后一次, 采样次数加一; 规范化时再除以次数.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct HeatMap {
    prob_sum: Array2<f64>,
    feature_sum: Array2<f64>,
    predicted_class: Array2<usize>,
    sample_count: Array2<u32>,
}

impl HeatMap {
    /// 创建 `(h, w)` 大小的全零热力图.
    pub fn new(shape: Idx2d) -> Self {
        Self {
            prob_sum: Array2::zeros(shape),
            feature_sum: Array2::zeros(shape),
            predicted_class: Array2::zeros(shape),
            sample_count: Array2::zeros(shape),
        }
    }

    /// 从按采样顺序排列的 `(窗口中心, 采样结果)` 序列构建热力图.
    ///
    /// 如果存在越界的中心, 则程序 panic.
    pub fn from_samples<I>(shape: Idx2d, samples: I) -> Self
    where
        I: IntoIterator<Item = (Idx2d, SampleResult)>,
    {
        let mut map = Self::new(shape);
        for (pos, r) in samples {
            map.record(pos, &r);
        }
        map
    }

    /// 记录 `pos` 处的一次采样结果.
    ///
    /// `pos` 越界时程序 panic.
    pub fn record(&mut self, pos: Idx2d, r: &SampleResult) {
        self.prob_sum[pos] += r.probability as f64;
        self.feature_sum[pos] += r.feature_mean;
        self.predicted_class[pos] = r.predicted_class;
        self.sample_count[pos] += 1;
    }

    /// 热力图的分辨率 (高, 宽), 与原图一致.
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.sample_count.dim()
    }

    /// 已采样 (采样次数至少为 1) 的坐标个数.
    pub fn sampled(&self) -> usize {
        self.sample_count.iter().filter(|&&c| c > 0).count()
    }

    /// 真值类别概率之和.
    #[inline]
    pub fn prob_sum(&self) -> ArrayView2<'_, f64> {
        self.prob_sum.view()
    }

    /// 平均特征激活之和.
    #[inline]
    pub fn feature_sum(&self) -> ArrayView2<'_, f64> {
        self.feature_sum.view()
    }

    /// 预测类别.
    #[inline]
    pub fn predicted_class(&self) -> ArrayView2<'_, usize> {
        self.predicted_class.view()
    }

    /// 采样次数.
    #[inline]
    pub fn sample_count(&self) -> ArrayView2<'_, u32> {
        self.sample_count.view()
    }

    /// 规范化并裁剪, 见 [`FinalizedHeatMaps`].
    #[inline]
    pub fn finalize(self) -> FinalizedHeatMaps {
        FinalizedHeatMaps::from_raw(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::GridIter;

    fn sample(p: f32, f: f64, c: usize) -> SampleResult {
        SampleResult {
            probability: p,
            feature_mean: f,
            predicted_class: c,
        }
    }

    #[test]
    fn test_scenario_counts() {
        let map = HeatMap::from_samples(
            (10, 10),
            GridIter::new((10, 10), 3).map(|pos| (pos, sample(0.5, 1.0, 7))),
        );
        assert_eq!(map.sampled(), 16);
        assert!(map.sample_count().iter().all(|&c| c <= 1));
        for ((i, j), &c) in map.sample_count().indexed_iter() {
            assert_eq!(c == 1, i % 3 == 0 && j % 3 == 0);
        }
        assert_eq!(map.predicted_class()[(9, 9)], 7);
        assert_eq!(map.predicted_class()[(1, 1)], 0);
    }

    #[test]
    fn test_repeated_visits_accumulate() {
        let mut map = HeatMap::new((2, 2));
        map.record((0, 1), &sample(0.2, 1.0, 3));
        map.record((0, 1), &sample(0.4, 3.0, 5));
        assert_eq!(map.sample_count()[(0, 1)], 2);
        assert!((map.prob_sum()[(0, 1)] - 0.6).abs() < 1e-6);
        assert_eq!(map.feature_sum()[(0, 1)], 4.0);
        assert_eq!(map.predicted_class()[(0, 1)], 5);
    }

    #[test]
    #[should_panic]
    fn test_record_out_of_bounds() {
        HeatMap::new((2, 2)).record((2, 0), &sample(0.0, 0.0, 0));
    }
}
