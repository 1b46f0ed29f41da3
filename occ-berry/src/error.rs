//! 运行时错误.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 遮挡采样流水线的运行时错误.
///
/// 配置类错误 (模型缺失, 图像无法读取, 标签未知等) 都应在采样开始前暴露;
/// 数值退化 (如某行从未采样) 不属于错误, 由各模块就地置 0 处理.
#[derive(Error, Debug)]
pub enum OcclusionError {
    /// 模型文件不存在.
    #[error("模型文件不存在: `{0}`")]
    ModelNotFound(PathBuf),

    /// 模型文件存在, 但内容不符合约定.
    #[error("模型格式错误: {0}")]
    ModelFormat(String),

    /// 读取 npz 归档错误.
    #[error("读取 npz 归档失败: {0}")]
    Npz(#[from] ndarray_npy::ReadNpzError),

    /// 图像无法打开或解码.
    #[error("无法打开图像 `{0}`: {1}")]
    ImageOpen(PathBuf, #[source] image::ImageError),

    /// 标签表文件读取失败.
    #[error("无法读取标签表 `{0}`: {1}")]
    LabelTableIo(PathBuf, #[source] io::Error),

    /// 标签表内容格式错误.
    ///
    /// `line` 从 1 开始计数.
    #[error("标签表第 {line} 行格式错误: {reason}")]
    LabelTableFormat {
        /// 出错行号.
        line: usize,
        /// 错误原因.
        reason: String,
    },

    /// 真值标签不在类别映射表中.
    #[error("类别映射表中不存在标签 `{0}`")]
    UnknownLabel(String),

    /// 采样参数非法.
    #[error("非法配置: {0}")]
    InvalidConfig(String),

    /// 模型中不存在给定名字的层.
    #[error("模型中不存在层 `{0}`")]
    UnknownLayer(String),

    /// 滤波器 (通道) 索引越界.
    #[error("滤波器索引 {filter} 越界, 该层共 {channels} 个通道")]
    FilterOutOfRange {
        /// 请求的通道索引.
        filter: usize,
        /// 实际通道数.
        channels: usize,
    },

    /// 类别索引越界.
    #[error("类别索引 {class} 越界, 模型共 {classes} 个类别")]
    ClassOutOfRange {
        /// 请求的类别索引.
        class: usize,
        /// 模型的类别总数.
        classes: usize,
    },

    /// 推理适配器返回的结果个数与输入不符.
    #[error("推理结果个数不符: 期望 {expected}, 实际 {got}")]
    AdapterMismatch {
        /// 输入图像个数.
        expected: usize,
        /// 返回结果个数.
        got: usize,
    },
}

/// 遮挡采样流水线的运行结果.
pub type OcclusionResult<T> = Result<T, OcclusionError>;
