//! 一次完整的遮挡扫描.
//!
//! 数据严格单向流动: 采样器 -> 推理适配器 -> 热力图累积 -> 规范化.
//! 所有推理调用都是阻塞的, 并严格按照采样顺序执行.

use crate::config::SweepSpec;
use crate::data::Image;
use crate::error::{OcclusionError, OcclusionResult};
use crate::heatmap::{FinalizedHeatMaps, HeatMap, SampleResult};
use crate::infer::{argmax, feature_mean, InferenceAdapter};
use crate::sampler::WindowSampler;
use log::{debug, info, warn};

/// 扫描结果.
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    /// 规范化并裁剪后的热力图.
    pub maps: FinalizedHeatMaps,

    /// 在未遮挡图像上选出的最活跃滤波器.
    pub filter: usize,

    /// 实际送入网络的遮挡图像个数.
    pub processed: usize,

    /// 已采样位置上出现过的预测类别 (升序), 用于构建图例.
    pub classes: Vec<usize>,
}

/// 检查适配器返回的结果个数.
#[inline]
fn expect_len<T>(v: Vec<T>, expected: usize) -> OcclusionResult<Vec<T>> {
    if v.len() == expected {
        Ok(v)
    } else {
        Err(OcclusionError::AdapterMismatch {
            expected,
            got: v.len(),
        })
    }
}

/// 在 `image` 上执行一次遮挡扫描. `true_class` 为真值类别索引.
///
/// 适配器在扫描中途出错时, 整个扫描中止, 不返回部分结果.
pub fn run_sweep<A: InferenceAdapter + ?Sized>(
    adapter: &A,
    image: &Image,
    true_class: usize,
    spec: &SweepSpec,
) -> OcclusionResult<SweepOutcome> {
    spec.validate()?;
    let layer = spec.layer();

    // 在未遮挡图像上选取代表性滤波器.
    let input = adapter.preprocess(&[image])?;
    let features = expect_len(adapter.extract_features(&input, layer, None)?, 1)?;
    let filter = adapter
        .most_active_filters(&features)
        .first()
        .and_then(|ranked| ranked.first().copied())
        .ok_or_else(|| OcclusionError::ModelFormat(format!("层 `{layer}` 没有任何通道")))?;
    info!("Most active filter of `{layer}`: {filter}");

    let sampler = WindowSampler::new(image, spec);
    let expected = sampler.expected_windows();
    if let Some(total) = spec.total_images() {
        if total as usize != expected {
            warn!("`total_images` = {total} is advisory only; the grid yields {expected} windows");
        }
    }

    let mut heat_map = HeatMap::new(image.shape());
    let mut processed = 0usize;
    for batch in sampler {
        let n = batch.len();
        let input = adapter.preprocess(&batch.images())?;
        let features = expect_len(adapter.extract_features(&input, layer, Some(filter))?, n)?;
        let probs = expect_len(adapter.probabilities(&input)?, n)?;

        for ((masked, feature), prob) in batch.iter().zip(features.iter()).zip(probs.iter()) {
            let classes = prob.len();
            let probability = *prob
                .get(true_class)
                .ok_or(OcclusionError::ClassOutOfRange {
                    class: true_class,
                    classes,
                })?;
            let predicted_class = argmax(prob.view()).ok_or(OcclusionError::ClassOutOfRange {
                class: true_class,
                classes,
            })?;
            heat_map.record(
                masked.center(),
                &SampleResult {
                    probability,
                    feature_mean: feature_mean(feature),
                    predicted_class,
                },
            );
        }
        processed += n;
        debug!("{processed} of {expected}");
    }

    let maps = heat_map.finalize();
    let classes = maps.distinct_classes();
    info!(
        "Sweep finished: {processed} windows, heat map {:?}, {} distinct classes",
        maps.shape(),
        classes.len()
    );
    Ok(SweepOutcome {
        maps,
        filter,
        processed,
        classes,
    })
}
