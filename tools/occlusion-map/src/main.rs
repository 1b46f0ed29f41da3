//! 遮挡热力图构建程序.
//!
//! 对单张图像执行一次遮挡扫描, 并打印热力图概要与图例.

mod result;
mod runner;

use clap::Parser;
use log::LevelFilter;
use occ_berry::consts::{
    DEFAULT_BATCH_SIZE, DEFAULT_LAYER, DEFAULT_MASK_SIZE, DEFAULT_STRIDE, DEFAULT_TOTAL_IMAGES,
    GPU_DISABLED,
};
use simple_logger::SimpleLogger;
use std::path::PathBuf;

/// 命令行参数.
#[derive(Debug, Parser)]
#[command(version, about = "Build occlusion sensitivity heat maps for an image classifier")]
pub struct Args {
    /// 模型文件 (.npz). 缺省时依次查找 `$OCCLUSION_MODEL` 和 `$HOME/dataset/models/occlusion.npz`.
    #[arg(short, long)]
    pub weights: Option<PathBuf>,

    /// 输入图像. 文件名中第一个 `_` 之前的部分为真值 synset.
    #[arg(short, long)]
    pub image_path: PathBuf,

    /// 提取特征的层名.
    #[arg(short, long, default_value = DEFAULT_LAYER)]
    pub layer: String,

    /// GPU 编号, 负数表示只用 CPU.
    #[arg(short, long, default_value_t = GPU_DISABLED, allow_negative_numbers = true)]
    pub gpu: i32,

    /// 期望的遮挡图像个数. 仅作参考, 实际个数由网格决定.
    #[arg(long, default_value_t = DEFAULT_TOTAL_IMAGES)]
    pub total_images: u32,

    /// 每批次送入网络的图像个数.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// 遮挡方块边长 (像素).
    #[arg(long, default_value_t = DEFAULT_MASK_SIZE)]
    pub mask_size: usize,

    /// 遮挡方块移动步长 (像素).
    #[arg(long, default_value_t = DEFAULT_STRIDE)]
    pub stride: usize,

    /// 末尾不足一批的窗口也送入网络.
    #[arg(long)]
    pub flush_partial: bool,

    /// synset 列表文件.
    #[arg(long)]
    pub synsets: Option<PathBuf>,

    /// synset 名称表文件.
    #[arg(long)]
    pub synset_words: Option<PathBuf>,

    /// 日志详细程度, 可重复.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

fn level_of(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    SimpleLogger::new().with_level(level_of(args.verbose)).init()?;

    let report = runner::run(&args)?;
    report.analyze()?;
    Ok(())
}
