use super::HeatMap;
use crate::Idx2d;
use itertools::{Itertools, MinMaxResult};
use ndarray::{Array2, ArrayView2, Axis, Zip};
use num::Float;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 规范化并裁剪后的热力图.
///
/// 由 [`HeatMap`] 经过如下步骤得到:
///
/// 1. 概率和特征值除以采样次数, `0 / 0` 等非有限结果置 0;
/// 2. 删除采样次数平均值为 0 的行, 再在删行后的次数图上删除平均值为 0 的列.
///   所有图删除同样的行列, 因此形状始终一致;
/// 3. 特征图除以其全局最大值. 最大值为 0 或非有限时保持不变.
///
/// 预测类别保留原始整数值, 颜色归一化由使用者按类别总数自行完成.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedHeatMaps {
    prob_avg: Array2<f64>,
    feature: Array2<f64>,
    predicted_class: Array2<usize>,
    sample_count: Array2<u32>,
    kept_rows: Vec<usize>,
    kept_cols: Vec<usize>,
}

/// 非有限值 (NaN, inf) 置 0.
#[inline]
fn finite_or_zero<T: Float>(v: T) -> T {
    if v.is_finite() {
        v
    } else {
        T::zero()
    }
}

/// `sum / count`, 结果非有限时置 0.
fn average(sum: ArrayView2<f64>, count: ArrayView2<u32>) -> Array2<f64> {
    let mut out = Array2::zeros(sum.raw_dim());
    Zip::from(&mut out)
        .and(sum)
        .and(count)
        .for_each(|o, &s, &c| *o = finite_or_zero(s / c as f64));
    out
}

/// 沿 `axis` 方向采样次数之和不为 0 的索引.
///
/// 等价于 "平均值不为 0"; 当另一维长度为 0 时, 所有索引都被视为未采样.
fn sampled_indices(count: ArrayView2<u32>, axis: Axis) -> Vec<usize> {
    count
        .axis_iter(axis)
        .enumerate()
        .filter_map(|(i, lane)| lane.iter().any(|&c| c > 0).then_some(i))
        .collect()
}

impl FinalizedHeatMaps {
    pub(super) fn from_raw(raw: HeatMap) -> Self {
        let HeatMap {
            prob_sum,
            feature_sum,
            predicted_class,
            sample_count,
        } = raw;

        let prob_avg = average(prob_sum.view(), sample_count.view());
        let feature = average(feature_sum.view(), sample_count.view());

        let kept_rows = sampled_indices(sample_count.view(), Axis(0));
        let sample_count = sample_count.select(Axis(0), &kept_rows);
        let kept_cols = sampled_indices(sample_count.view(), Axis(1));
        let sample_count = sample_count.select(Axis(1), &kept_cols);

        let trim = |a: Array2<f64>| a.select(Axis(0), &kept_rows).select(Axis(1), &kept_cols);
        let prob_avg = trim(prob_avg);
        let mut feature = trim(feature);
        let predicted_class = predicted_class
            .select(Axis(0), &kept_rows)
            .select(Axis(1), &kept_cols);

        let max = feature.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if max != 0.0 && max.is_finite() {
            feature.mapv_inplace(|v| v / max);
        }

        Self {
            prob_avg,
            feature,
            predicted_class,
            sample_count,
            kept_rows,
            kept_cols,
        }
    }

    /// 裁剪后的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.sample_count.dim()
    }

    /// 真值类别的平均概率. 输入为合法概率分布时, 所有值位于 `[0, 1]`.
    #[inline]
    pub fn prob_avg(&self) -> ArrayView2<'_, f64> {
        self.prob_avg.view()
    }

    /// 以全局最大值归一化的平均特征激活.
    #[inline]
    pub fn feature(&self) -> ArrayView2<'_, f64> {
        self.feature.view()
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

    /// 保留下来的行在原图中的索引 (升序).
    #[inline]
    pub fn kept_rows(&self) -> &[usize] {
        &self.kept_rows
    }

    /// 保留下来的列在原图中的索引 (升序).
    #[inline]
    pub fn kept_cols(&self) -> &[usize] {
        &self.kept_cols
    }

    /// 已采样位置上出现过的预测类别, 升序且不重复. 用于构建图例.
    pub fn distinct_classes(&self) -> Vec<usize> {
        self.predicted_class
            .iter()
            .zip(self.sample_count.iter())
            .filter_map(|(&cls, &n)| (n > 0).then_some(cls))
            .sorted_unstable()
            .dedup()
            .collect()
    }

    /// 已采样位置上平均概率的 (最小值, 最大值). 没有采样时返回 `None`.
    pub fn prob_range(&self) -> Option<(f64, f64)> {
        let it = self
            .prob_avg
            .iter()
            .zip(self.sample_count.iter())
            .filter_map(|(&p, &n)| (n > 0).then_some(p));
        match it.minmax_by(|a, b| a.total_cmp(b)) {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(v) => Some((v, v)),
            MinMaxResult::MinMax(lo, hi) => Some((lo, hi)),
        }
    }

}
