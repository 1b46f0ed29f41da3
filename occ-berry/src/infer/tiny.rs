//! 纯 Rust 的小型卷积分类网络, 作为参考推理适配器.
//!
//! 网络以单个 npz 归档存储, 其中包含:
//!
//! 1. `mean.npy`: `(C,)`, 每通道均值, 预处理时减去;
//! 2. `input_shape.npy`: `(2,)` 的 `i64`, 网络输入的 (高, 宽);
//! 3. `conv{i}_w.npy` / `conv{i}_b.npy`: 第 `i` 个卷积块 (从 1 开始) 的
//!   `(O, I, kh, kw)` 权重与 `(O,)` 偏置;
//! 4. `fc_w.npy` / `fc_b.npy`: `(K, D)` 全连接权重与 `(K,)` 偏置.
//!
//! 每个卷积块依次为卷积, ReLU (输出名为 `conv{i}`), 2x2 最大池化 (输出名为
//! `pool{i}`). 之后是全连接层 `fc` 和 softmax 层 `prob`.

use super::layers::{conv2d, dense, max_pool, out_len, relu, softmax};
use super::{FeatureMap, InferenceAdapter, Probabilities};
use crate::config::Device;
use crate::data::Image;
use crate::error::{OcclusionError, OcclusionResult};
use crate::Idx2d;
use log::{info, warn};
use ndarray::{s, Array1, Array2, Array3, Array4, ArrayView3, Axis, Ix1, Ix2, Ix4, OwnedRepr};
use ndarray_npy::NpzReader;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
    }
}

/// 池化窗口大小.
const POOL: usize = 2;

/// 全连接层名.
const FC: &str = "fc";

/// softmax 层名.
const PROB: &str = "prob";

/// 卷积块: 卷积 + ReLU + 最大池化.
#[derive(Debug, Clone)]
struct ConvBlock {
    weight: Array4<f32>,
    bias: Array1<f32>,
}

/// 小型卷积分类网络.
#[derive(Debug, Clone)]
pub struct TinyNet {
    mean: Array1<f32>,
    input_hw: Idx2d,
    convs: Vec<ConvBlock>,
    fc_w: Array2<f32>,
    fc_b: Array1<f32>,
}

/// 构造 npz 归档内的文件名.
#[inline]
fn entry(name: &str) -> String {
    format!("{name}.npy")
}

#[inline]
fn format_err(msg: impl Into<String>) -> OcclusionError {
    OcclusionError::ModelFormat(msg.into())
}

impl TinyNet {
    /// 从 `path` 处的 npz 文件加载网络.
    ///
    /// 文件不存在时返回 [`OcclusionError::ModelNotFound`]. 该网络只在 CPU
    /// 上运行, 请求 GPU 时会给出警告并回退到 CPU.
    pub fn open<P: AsRef<Path>>(path: P, device: Device) -> OcclusionResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(OcclusionError::ModelNotFound(path.to_owned()));
        }
        info!("Model found: {}", path.display());
        let file = File::open(path).map_err(|e| format_err(format!("{}: {e}", path.display())))?;
        Self::from_reader(file, device)
    }

    /// 从任意 npz 数据源加载网络.
    pub fn from_reader<R: Read + Seek>(reader: R, device: Device) -> OcclusionResult<Self> {
        if let Device::Gpu(id) = device {
            warn!("TinyNet runs on CPU only, ignoring GPU #{id}");
        }
        let mut npz = NpzReader::new(reader)?;
        let names = npz.names()?;

        let mean = npz.by_name::<OwnedRepr<f32>, Ix1>(&entry("mean"))?;
        let shape = npz.by_name::<OwnedRepr<i64>, Ix1>(&entry("input_shape"))?;
        let input_hw = match shape.as_slice() {
            Some(&[h, w]) if h > 0 && w > 0 => (h as usize, w as usize),
            _ => return Err(format_err("`input_shape` 必须是两个正整数")),
        };

        let mut convs = Vec::new();
        for i in 1.. {
            let w_base = format!("conv{i}_w");
            let (w_name, b_name) = (entry(&w_base), entry(&format!("conv{i}_b")));
            // 归档内的名字可能带或不带 `.npy` 后缀.
            if !names.iter().any(|n| *n == w_base || *n == w_name) {
                break;
            }
            convs.push(ConvBlock {
                weight: npz.by_name::<OwnedRepr<f32>, Ix4>(&w_name)?,
                bias: npz.by_name::<OwnedRepr<f32>, Ix1>(&b_name)?,
            });
        }

        let fc_w = npz.by_name::<OwnedRepr<f32>, Ix2>(&entry("fc_w"))?;
        let fc_b = npz.by_name::<OwnedRepr<f32>, Ix1>(&entry("fc_b"))?;

        let net = Self {
            mean,
            input_hw,
            convs,
            fc_w,
            fc_b,
        };
        net.check_shapes()?;
        info!(
            "TinyNet loaded: {} conv blocks, {} classes, input {:?}",
            net.convs.len(),
            net.classes(),
            net.input_hw
        );
        Ok(net)
    }

    /// 检查各层形状是否衔接.
    fn check_shapes(&self) -> OcclusionResult<()> {
        let (mut c, (mut h, mut w)) = (self.mean.len(), self.input_hw);
        for (i, block) in self.convs.iter().enumerate() {
            let (o, ic, kh, kw) = block.weight.dim();
            if ic != c || block.bias.len() != o {
                return Err(format_err(format!("conv{} 形状不符", i + 1)));
            }
            (h, w) = (out_len(h, kh) / POOL, out_len(w, kw) / POOL);
            c = o;
        }
        let (k, d) = self.fc_w.dim();
        if d != c * h * w || self.fc_b.len() != k || k == 0 {
            return Err(format_err(format!(
                "fc 形状不符: 期望输入 {}, 实际 {d}",
                c * h * w
            )));
        }
        Ok(())
    }

    /// 类别总数.
    #[inline]
    pub fn classes(&self) -> usize {
        self.fc_b.len()
    }

    /// 网络输入的 (高, 宽).
    #[inline]
    pub fn input_shape(&self) -> Idx2d {
        self.input_hw
    }

    /// 按前向顺序列出所有层名.
    pub fn layer_names(&self) -> Vec<String> {
        let mut v = Vec::with_capacity(self.convs.len() * 2 + 2);
        for i in 1..=self.convs.len() {
            v.push(format!("conv{i}"));
            v.push(format!("pool{i}"));
        }
        v.push(FC.to_owned());
        v.push(PROB.to_owned());
        v
    }

    /// 单张图像前向计算, 返回 `layer` 层的输出. 全连接层和 softmax 层的输出为
    /// `(K, 1, 1)`.
    fn forward(&self, input: ArrayView3<f32>, layer: &str) -> Array3<f32> {
        let mut x = input.to_owned();
        for (i, block) in self.convs.iter().enumerate() {
            x = relu(conv2d(x.view(), block.weight.view(), block.bias.view()));
            if layer == format!("conv{}", i + 1) {
                return x;
            }
            x = max_pool(x.view(), POOL);
            if layer == format!("pool{}", i + 1) {
                return x;
            }
        }
        let flat = Array1::from_iter(x.iter().copied());
        let mut out = dense(flat.view(), self.fc_w.view(), self.fc_b.view());
        if layer == PROB {
            out = softmax(out.view());
        }
        out.insert_axis(Axis(1)).insert_axis(Axis(2))
    }

    /// 对 `input` 中的每张图像求 `layer` 层输出, 保持输入顺序.
    fn forward_all(&self, input: &Array4<f32>, layer: &str) -> OcclusionResult<Vec<Array3<f32>>> {
        if !self.layer_names().iter().any(|n| n == layer) {
            return Err(OcclusionError::UnknownLayer(layer.to_owned()));
        }
        if input.dim().1 != self.mean.len() {
            return Err(format_err("输入张量通道数与网络不符"));
        }
        cfg_if::cfg_if! {
            if #[cfg(feature = "rayon")] {
                Ok(input
                    .axis_iter(Axis(0))
                    .into_par_iter()
                    .map(|img| self.forward(img, layer))
                    .collect())
            } else {
                Ok(input
                    .axis_iter(Axis(0))
                    .map(|img| self.forward(img, layer))
                    .collect())
            }
        }
    }
}

impl InferenceAdapter for TinyNet {
    /// 最近邻缩放到网络输入大小, 转换为 `(C, H, W)` 并减去每通道均值.
    fn preprocess(&self, images: &[&Image]) -> OcclusionResult<Array4<f32>> {
        let c = self.mean.len();
        let (ih, iw) = self.input_hw;
        let mut out = Array4::<f32>::zeros((images.len(), c, ih, iw));
        for (img, mut slot) in images.iter().zip(out.outer_iter_mut()) {
            let (h, w) = img.shape();
            if img.channels() != c {
                return Err(format_err(format!(
                    "图像有 {} 个通道, 网络需要 {c} 个",
                    img.channels()
                )));
            }
            if h == 0 || w == 0 {
                return Err(OcclusionError::InvalidConfig("图像为空".to_owned()));
            }
            let src = img.view();
            for ((ch, y, x), v) in slot.indexed_iter_mut() {
                *v = src[(y * h / ih, x * w / iw, ch)] - self.mean[ch];
            }
        }
        Ok(out)
    }

    fn extract_features(
        &self,
        input: &Array4<f32>,
        layer: &str,
        filter: Option<usize>,
    ) -> OcclusionResult<Vec<FeatureMap>> {
        let maps = self.forward_all(input, layer)?;
        let Some(k) = filter else {
            return Ok(maps);
        };
        maps.into_iter()
            .map(|m| {
                let channels = m.dim().0;
                if k >= channels {
                    Err(OcclusionError::FilterOutOfRange {
                        filter: k,
                        channels,
                    })
                } else {
                    Ok(m.slice(s![k..k + 1, .., ..]).to_owned())
                }
            })
            .collect()
    }

    fn probabilities(&self, input: &Array4<f32>) -> OcclusionResult<Vec<Probabilities>> {
        Ok(self
            .forward_all(input, PROB)?
            .into_iter()
            .map(|p| Array1::from_iter(p.iter().copied()))
            .collect())
    }
}

/// 在内存中构建 npz 格式的参考网络, 供测试使用.
#[cfg(test)]
pub(crate) mod fixture {
    use ndarray::{arr1, Array1, Array2, Array4};
    use ndarray_npy::NpzWriter;
    use std::io::Cursor;

    /// 单卷积块网络: 输入 `(1, 4, 4)`, 卷积核 `(2, 1, 1, 1)` 分别为 `+1` 和 `-1`,
    /// 池化后 `(2, 2, 2)`, 全连接 3 类.
    ///
    /// 类别 0 偏好亮图像, 类别 1 偏好暗图像, 类别 2 恒定为 0.
    pub(crate) fn tiny_npz() -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut npz = NpzWriter::new(&mut buf);
            npz.add_array("mean.npy", &arr1(&[0.5f32])).unwrap();
            npz.add_array("input_shape.npy", &arr1(&[4i64, 4])).unwrap();
            let conv_w =
                Array4::from_shape_vec((2, 1, 1, 1), vec![1.0f32, -1.0]).unwrap();
            npz.add_array("conv1_w.npy", &conv_w).unwrap();
            npz.add_array("conv1_b.npy", &Array1::<f32>::zeros(2)).unwrap();

            let mut fc_w = Array2::<f32>::zeros((3, 8));
            fc_w.row_mut(0).slice_mut(ndarray::s![0..4]).fill(4.0);
            fc_w.row_mut(1).slice_mut(ndarray::s![4..8]).fill(4.0);
            npz.add_array("fc_w.npy", &fc_w).unwrap();
            npz.add_array("fc_b.npy", &Array1::<f32>::zeros(3)).unwrap();
            npz.finish().unwrap();
        }
        buf.into_inner()
    }
}
