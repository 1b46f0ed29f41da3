//! 遮挡采样参数与推理设备.

use crate::consts::*;
use crate::error::{OcclusionError, OcclusionResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 网格遍历结束时, 不足 `batch_size` 的最后一批的处理方式.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrailingBatch {
    /// 丢弃. 这会舍弃网格末尾最多 `batch_size - 1` 个窗口.
    #[default]
    Drop,

    /// 作为最后一批照常输出.
    Flush,
}

/// 一次遮挡扫描的参数.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SweepSpec {
    mask_size: usize,
    stride: usize,
    batch_size: usize,
    trailing: TrailingBatch,
    layer: String,
    total_images: Option<u32>,
}

impl Default for SweepSpec {
    fn default() -> Self {
        Self {
            mask_size: DEFAULT_MASK_SIZE,
            stride: DEFAULT_STRIDE,
            batch_size: DEFAULT_BATCH_SIZE,
            trailing: TrailingBatch::Drop,
            layer: DEFAULT_LAYER.to_owned(),
            total_images: Some(DEFAULT_TOTAL_IMAGES),
        }
    }
}

impl SweepSpec {
    /// 以窗口边长 `mask_size`, 步长 `stride`, 批大小 `batch_size`
    /// 构建参数. 其余参数取默认值.
    ///
    /// 任一参数为 0 时返回 `Err`.
    pub fn new(mask_size: usize, stride: usize, batch_size: usize) -> OcclusionResult<Self> {
        let spec = Self {
            mask_size,
            stride,
            batch_size,
            ..Self::default()
        };
        spec.validate()?;
        Ok(spec)
    }

    /// 检查参数是否合法.
    pub fn validate(&self) -> OcclusionResult<()> {
        let check = |name: &str, v: usize| {
            if v == 0 {
                Err(OcclusionError::InvalidConfig(format!("`{name}` 必须为正数")))
            } else {
                Ok(())
            }
        };
        check("mask_size", self.mask_size)?;
        check("stride", self.stride)?;
        check("batch_size", self.batch_size)?;
        if self.layer.is_empty() {
            return Err(OcclusionError::InvalidConfig("特征层名不能为空".to_owned()));
        }
        Ok(())
    }

    /// 指定特征提取层.
    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = layer.into();
        self
    }

    /// 指定最后一批的处理方式.
    pub fn with_trailing(mut self, trailing: TrailingBatch) -> Self {
        self.trailing = trailing;
        self
    }

    /// 指定 `total_images`.
    pub fn with_total_images(mut self, total_images: Option<u32>) -> Self {
        self.total_images = total_images;
        self
    }

    /// 窗口边长.
    #[inline]
    pub fn mask_size(&self) -> usize {
        self.mask_size
    }

    /// 窗口中心步长.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// 批大小.
    #[inline]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// 最后一批的处理方式.
    #[inline]
    pub fn trailing(&self) -> TrailingBatch {
        self.trailing
    }

    /// 特征提取层.
    #[inline]
    pub fn layer(&self) -> &str {
        &self.layer
    }

    /// 期望处理的图像个数.
    ///
    /// 该值只用于日志提示, 网格遍历不受它约束.
    #[inline]
    pub fn total_images(&self) -> Option<u32> {
        self.total_images
    }
}

/// 推理设备. 只在构建推理适配器时使用, 采样与聚合部分对其不可见.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Device {
    /// CPU.
    #[default]
    Cpu,

    /// 给定编号的 GPU.
    Gpu(u32),
}

impl Device {
    /// 从整数编号构建设备. 负数 (惯例为 `-1`) 代表关闭 GPU.
    #[inline]
    pub fn from_flag(gpu: i32) -> Self {
        if gpu > GPU_DISABLED {
            Self::Gpu(gpu as u32)
        } else {
            Self::Cpu
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_rejects_zero() {
        assert!(SweepSpec::new(0, 1, 1).is_err());
        assert!(SweepSpec::new(1, 0, 1).is_err());
        assert!(SweepSpec::new(1, 1, 0).is_err());
        assert!(SweepSpec::new(4, 3, 4).is_ok());
        assert!(SweepSpec::new(4, 3, 4).unwrap().with_layer("").validate().is_err());
    }

    #[test]
    fn test_spec_defaults() {
        let spec = SweepSpec::default();
        assert_eq!(spec.mask_size(), 200);
        assert_eq!(spec.stride(), 150);
        assert_eq!(spec.batch_size(), 1);
        assert_eq!(spec.layer(), "pool5");
        assert_eq!(spec.trailing(), TrailingBatch::Drop);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_device_from_flag() {
        assert_eq!(Device::from_flag(-1), Device::Cpu);
        assert_eq!(Device::from_flag(-7), Device::Cpu);
        assert_eq!(Device::from_flag(0), Device::Gpu(0));
        assert_eq!(Device::from_flag(2), Device::Gpu(2));
    }
}
