#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 通过遮挡采样构建图像分类网络的显著性热力图.
//!
//! 用一个固定大小的黑色方块按固定步长滑过输入图像, 把每张遮挡后的图像送入分类网络,
//! 记录真值类别的概率, 某一代表性滤波器的平均激活, 以及预测类别.
//! 所有结果以遮挡窗口中心为坐标汇总成热力图, 规范化后供外部绘制.
//!
//! # 注意
//!
//! 1. 该 crate 不负责绘图, 也不负责网络训练. 分类网络通过
//!   [`infer::InferenceAdapter`] 接入, 本 crate 只附带一个纯 Rust 的参考实现
//!   [`infer::TinyNet`].
//! 2. 索引越界等非期望情况下, 程序会直接 panic; 其它错误以 [`error::OcclusionError`] 返回.
//!
//! # 流水线
//!
//! ### 遮挡采样 ✅
//!
//! 在 `range(0, H, stride) × range(0, W, stride)` 网格上生成遮挡窗口,
//! 窗口在图像边界处截断. 以惰性批次的方式单次遍历.
//!
//! 实现位于 `occ-berry/src/sampler.rs` 和 `occ-berry/src/data`.
//!
//! ### 推理 ✅
//!
//! 预处理, 特征提取, 最活跃滤波器选择, 类别概率.
//!
//! 实现位于 `occ-berry/src/infer`.
//!
//! ### 热力图累积与规范化 ✅
//!
//! 按窗口中心累加, 求平均, 裁剪掉从未采样的行列, 特征图按最大值归一化.
//!
//! 实现位于 `occ-berry/src/heatmap`.
//!
//! ### 类别映射表 ✅
//!
//! synset 列表与可读名称, 用于图例与真值解析.
//!
//! 实现位于 `occ-berry/src/labels.rs`.

/// 二维索引 (行, 列), 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 图像, 遮挡窗口与网格迭代器.
mod data;

pub use data::{GridIter, Image, MaskedImage, Window};

pub use data::window;

pub mod config;
pub mod consts;
pub mod dataset;
pub mod error;
pub mod heatmap;
pub mod infer;
pub mod labels;
pub mod prelude;
pub mod sampler;
pub mod sweep;
