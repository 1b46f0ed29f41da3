//! 参考网络用到的基础层. 全部按 `(C, h, w)` 格式计算, 不考虑性能.

use ndarray::{s, Array1, Array3, ArrayView1, ArrayView2, ArrayView3, ArrayView4, Axis};

/// 无填充, 步长为 1 的二维卷积. `weight` 格式为 `(O, I, kh, kw)`.
///
/// 输入通道数与 `I` 不符时程序 panic.
pub(crate) fn conv2d(
    input: ArrayView3<f32>,
    weight: ArrayView4<f32>,
    bias: ArrayView1<f32>,
) -> Array3<f32> {
    let (c, h, w) = input.dim();
    let (o, i, kh, kw) = weight.dim();
    assert_eq!(c, i, "卷积输入通道数不符");
    let (oh, ow) = (out_len(h, kh), out_len(w, kw));

    let mut output = Array3::<f32>::zeros((o, oh, ow));
    for (oc, kernel) in weight.axis_iter(Axis(0)).enumerate() {
        for y in 0..oh {
            for x in 0..ow {
                let window = input.slice(s![.., y..y + kh, x..x + kw]);
                output[(oc, y, x)] = (&window * &kernel).sum() + bias[oc];
            }
        }
    }
    output
}

/// 卷积输出边长.
#[inline]
pub(crate) fn out_len(len: usize, k: usize) -> usize {
    (len + 1).saturating_sub(k)
}

/// 就地 ReLU.
#[inline]
pub(crate) fn relu(mut input: Array3<f32>) -> Array3<f32> {
    input.mapv_inplace(|x| x.max(0.0));
    input
}

/// 窗口与步长均为 `size` 的最大池化. 不足一个窗口的边缘被舍弃.
pub(crate) fn max_pool(input: ArrayView3<f32>, size: usize) -> Array3<f32> {
    let (c, h, w) = input.dim();
    let (oh, ow) = (h / size, w / size);
    let mut output = Array3::<f32>::zeros((c, oh, ow));
    for z in 0..c {
        for i in 0..oh {
            for j in 0..ow {
                let patch = input.slice(s![z, i * size..(i + 1) * size, j * size..(j + 1) * size]);
                output[(z, i, j)] = patch.iter().copied().fold(f32::MIN, f32::max);
            }
        }
    }
    output
}

/// 全连接层. `weight` 格式为 `(K, D)`.
#[inline]
pub(crate) fn dense(
    input: ArrayView1<f32>,
    weight: ArrayView2<f32>,
    bias: ArrayView1<f32>,
) -> Array1<f32> {
    weight.dot(&input) + bias
}

/// 数值稳定的 softmax.
pub(crate) fn softmax(logits: ArrayView1<f32>) -> Array1<f32> {
    let max_logit = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exp = logits.mapv(|x| (x - max_logit).exp());
    let sum_exp = exp.sum();
    exp / sum_exp
}
