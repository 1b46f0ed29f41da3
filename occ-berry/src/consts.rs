//! 通用常量.

/// 单通道颜色.
pub mod gray {
    /// 遮挡区域的像素值 (黑色).
    pub const BLACK: f32 = 0.0;

    /// 8-bit 像素的最大值. 解码图像时用于归一化到 `[0, 1]`.
    pub const U8_MAX: f32 = 255.0;
}

/// 默认遮挡窗口边长 (像素).
pub const DEFAULT_MASK_SIZE: usize = 200;

/// 默认窗口中心步长 (像素).
pub const DEFAULT_STRIDE: usize = 150;

/// 默认批大小.
pub const DEFAULT_BATCH_SIZE: usize = 1;

/// 默认特征提取层.
pub const DEFAULT_LAYER: &str = "pool5";

/// 默认 `total_images`. 该值仅作参考, 不约束网格遍历.
pub const DEFAULT_TOTAL_IMAGES: u32 = 100;

/// 关闭 GPU 时的设备编号.
pub const GPU_DISABLED: i32 = -1;
