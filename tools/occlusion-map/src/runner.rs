//! 程序运行函数.

use crate::result::SweepReport;
use crate::Args;
use anyhow::{anyhow, Context};
use log::info;
use occ_berry::prelude::*;
use utils::loader;

/// 由命令行参数构建扫描配置.
pub fn sweep_spec(args: &Args) -> OcclusionResult<SweepSpec> {
    let trailing = if args.flush_partial {
        TrailingBatch::Flush
    } else {
        TrailingBatch::Drop
    };
    Ok(SweepSpec::new(args.mask_size, args.stride, args.batch_size)?
        .with_layer(args.layer.as_str())
        .with_trailing(trailing)
        .with_total_images(Some(args.total_images)))
}

/// 实际运行. 配置错误在采样开始前即返回.
pub fn run(args: &Args) -> anyhow::Result<SweepReport> {
    let spec = sweep_spec(args).context("Invalid sweep configuration")?;

    // 短路判断: 模型必须先于一切加载成功.
    let model = loader::model_path(args.weights.clone())
        .ok_or_else(|| anyhow!("No model path given and no home directory found"))?;
    let net = TinyNet::open(&model, Device::from_flag(args.gpu))
        .with_context(|| format!("Loading model `{}` error", model.display()))?;

    let synsets = loader::synsets_path(args.synsets.clone())
        .ok_or_else(|| anyhow!("No synset list path found"))?;
    let words = loader::synset_words_path(args.synset_words.clone())
        .ok_or_else(|| anyhow!("No synset words path found"))?;
    let labels = LabelTable::open(&synsets, &words).context("Loading label tables error")?;

    let image = Image::open(&args.image_path).context("Loading image error")?;
    let true_class = labels
        .true_class(&args.image_path)
        .context("Resolving true label error")?;
    info!(
        "Image {:?}, true class {true_class} ({})",
        image.shape(),
        labels.class_name(true_class).unwrap_or("?")
    );

    println!("Running occlusion sweep...");
    let outcome = run_sweep(&net, &image, true_class, &spec).context("Occlusion sweep error")?;
    let legend = labels.legend(outcome.classes.iter().copied());
    Ok(SweepReport::new(
        args.image_path.display().to_string(),
        true_class,
        outcome,
        legend,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_sweep_spec_from_args() {
        let args =
            Args::try_parse_from(["occlusion-map", "-i", "x.png", "--flush-partial", "-l", "conv1"])
                .unwrap();
        let spec = sweep_spec(&args).unwrap();
        assert_eq!(spec.trailing(), TrailingBatch::Flush);
        assert_eq!(spec.layer(), "conv1");
        assert_eq!(spec.total_images(), Some(args.total_images));
    }

    #[test]
    fn test_zero_stride_rejected() {
        let args = Args::try_parse_from(["occlusion-map", "-i", "x.png", "--stride", "0"]).unwrap();
        assert!(matches!(
            sweep_spec(&args),
            Err(OcclusionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_missing_model_fails_fast() {
        let args = Args::try_parse_from([
            "occlusion-map",
            "-i",
            "/no/such/n01440764_1.JPEG",
            "-w",
            "/no/such/model.npz",
        ])
        .unwrap();
        let err = run(&args).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<OcclusionError>(),
            Some(OcclusionError::ModelNotFound(_))
        ));
    }
}
