//! 推理适配层.
//!
//! 流水线只通过 [`InferenceAdapter`] 使用分类网络. 网络结构, 权重加载和设备选择
//! 都封装在适配器内部.

mod layers;
mod tiny;

use crate::data::Image;
use crate::error::OcclusionResult;
use ndarray::{Array1, Array3, Array4, ArrayView1};
use ordered_float::OrderedFloat;
use std::cmp::Reverse;

pub use tiny::TinyNet;

#[cfg(test)]
pub(crate) use tiny::fixture;

/// 单张图像在某一层的特征图, 以 `(C, h, w)` 格式存储.
pub type FeatureMap = Array3<f32>;

/// 单张图像的类别概率分布.
pub type Probabilities = Array1<f32>;

/// 分类网络推理能力的集合.
///
/// 所有方法都是阻塞调用. 对于输入的 `n` 张图像, 返回的结果个数也必须是 `n`,
/// 并保持输入顺序.
pub trait InferenceAdapter {
    /// 将原始图像转换为网络输入张量, 格式为 `(N, C, H, W)`.
    fn preprocess(&self, images: &[&Image]) -> OcclusionResult<Array4<f32>>;

    /// 提取 `layer` 层的特征图, 每张图像一个. 若给出 `filter`,
    /// 则只保留该通道, 即返回 `(1, h, w)` 的特征图.
    fn extract_features(
        &self,
        input: &Array4<f32>,
        layer: &str,
        filter: Option<usize>,
    ) -> OcclusionResult<Vec<FeatureMap>>;

    /// 对每张图像, 按平均激活值降序给出通道索引. 平均值相同时索引小者在前;
    /// NaN 视为最小.
    fn most_active_filters(&self, features: &[FeatureMap]) -> Vec<Vec<usize>> {
        features
            .iter()
            .map(|f| {
                let means: Vec<f32> = f
                    .outer_iter()
                    .map(|ch| ch.mean().unwrap_or(f32::NEG_INFINITY))
                    .collect();
                rank_desc(&means)
            })
            .collect()
    }

    /// 每张图像的类别概率分布.
    fn probabilities(&self, input: &Array4<f32>) -> OcclusionResult<Vec<Probabilities>>;
}

/// 降序排名. 稳定排序, NaN 视为最小.
fn rank_desc(values: &[f32]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by_key(|&i| {
        let v = values[i];
        Reverse(OrderedFloat(if v.is_nan() { f32::NEG_INFINITY } else { v }))
    });
    idx
}

/// 最大值所在的索引. 存在多个最大值时取第一个; 忽略 NaN.
/// 若 `probs` 为空或全为 NaN, 则返回 `None`.
pub fn argmax(probs: ArrayView1<f32>) -> Option<usize> {
    probs
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.is_nan())
        .fold(None, |best: Option<(usize, f32)>, (i, &p)| match best {
            Some((_, b)) if b >= p => best,
            _ => Some((i, p)),
        })
        .map(|(i, _)| i)
}

/// 特征图全部元素的平均值. 空特征图返回 0.
#[inline]
pub fn feature_mean(feature: &FeatureMap) -> f64 {
    if feature.is_empty() {
        return 0.0;
    }
    feature.iter().map(|&v| v as f64).sum::<f64>() / feature.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, Array3};

    struct Dummy;

    impl InferenceAdapter for Dummy {
        fn preprocess(&self, _: &[&Image]) -> OcclusionResult<Array4<f32>> {
            unimplemented!()
        }

        fn extract_features(
            &self,
            _: &Array4<f32>,
            _: &str,
            _: Option<usize>,
        ) -> OcclusionResult<Vec<FeatureMap>> {
            unimplemented!()
        }

        fn probabilities(&self, _: &Array4<f32>) -> OcclusionResult<Vec<Probabilities>> {
            unimplemented!()
        }
    }

    #[test]
    fn test_argmax() {
        assert_eq!(argmax(arr1(&[0.1, 0.7, 0.2]).view()), Some(1));
        assert_eq!(argmax(arr1(&[0.4, 0.2, 0.4]).view()), Some(0));
        assert_eq!(argmax(arr1(&[f32::NAN, 0.2]).view()), Some(1));
        assert_eq!(argmax(arr1(&[] as &[f32]).view()), None);
    }

    #[test]
    fn test_most_active_filters() {
        // 通道平均值: 1.0, 3.0, 2.0, 3.0
        let f = Array3::from_shape_fn((4, 2, 2), |(c, _, _)| [1.0, 3.0, 2.0, 3.0][c]);
        let ranked = Dummy.most_active_filters(&[f]);
        assert_eq!(ranked, vec![vec![1, 3, 2, 0]]);
    }

    #[test]
    fn test_rank_desc_nan_last() {
        assert_eq!(rank_desc(&[f32::NAN, 0.5, -1.0]), vec![1, 2, 0]);
    }

    #[test]
    fn test_feature_mean() {
        let f = Array3::from_shape_vec((1, 2, 2), vec![1.0, 2.0, 3.0, 6.0]).unwrap();
        assert!((feature_mean(&f) - 3.0).abs() < 1e-12);
        assert_eq!(feature_mean(&Array3::zeros((0, 2, 2))), 0.0);
    }
}
