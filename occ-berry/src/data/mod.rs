use std::path::Path;

use ndarray::{s, Array2, Array3, ArrayView3, Axis};

use crate::consts::gray::{BLACK, U8_MAX};
use crate::error::{OcclusionError, OcclusionResult};
use crate::Idx2d;

mod iter;
pub mod window;

pub use iter::GridIter;
pub use window::Window;

/// 不可变的输入图像, 以 `(H, W, C)` 格式保存 `f32` 像素值.
///
/// 灰度图像 `C = 1`, 彩色图像 `C = 3`. 从文件解码的图像像素值位于 `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    data: Array3<f32>,
}

impl Image {
    /// 打开并解码 `path` 处的图像文件. 彩色图像统一转换为 RGB,
    /// 灰度图像保持单通道.
    pub fn open<P: AsRef<Path>>(path: P) -> OcclusionResult<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|e| OcclusionError::ImageOpen(path.to_owned(), e))?;
        let (w, h) = (img.width() as usize, img.height() as usize);

        // 该操作不会生成 `Err`: 缓冲区长度由 image 保证.
        let data = if img.color().has_color() {
            let buf = img.into_rgb8().into_raw();
            Array3::from_shape_vec((h, w, 3), buf).unwrap()
        } else {
            let buf = img.into_luma8().into_raw();
            Array3::from_shape_vec((h, w, 1), buf).unwrap()
        };
        Ok(Self {
            data: data.mapv(|p| p as f32 / U8_MAX),
        })
    }

    /// 直接以 `(H, W, C)` 数组构建图像.
    #[inline]
    pub fn from_array(data: Array3<f32>) -> Self {
        Self { data }
    }

    /// 以 `(H, W)` 单通道数组构建灰度图像.
    #[inline]
    pub fn from_gray(data: Array2<f32>) -> Self {
        Self {
            data: data.insert_axis(Axis(2)),
        }
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        let (h, w, _) = self.data.dim();
        (h, w)
    }

    /// 通道数.
    #[inline]
    pub fn channels(&self) -> usize {
        self.data.dim().2
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn view(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    /// 复制一份图像, 并将 `window` 覆盖的区域 (所有通道) 置为黑色.
    /// `self` 不会被修改.
    pub fn masked(&self, window: Window) -> MaskedImage {
        let mut data = self.data.clone();
        data.slice_mut(s![window.rows(), window.cols(), ..])
            .fill(BLACK);
        MaskedImage {
            image: Self { data },
            window,
        }
    }
}

/// 一份被遮挡的图像副本, 以及产生它的遮挡窗口.
#[derive(Debug, Clone)]
pub struct MaskedImage {
    image: Image,
    window: Window,
}

impl MaskedImage {
    /// 遮挡后的图像.
    #[inline]
    pub fn image(&self) -> &Image {
        &self.image
    }

    /// 遮挡窗口.
    #[inline]
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// 遮挡窗口中心, 即热力图中的写入位置.
    #[inline]
    pub fn center(&self) -> Idx2d {
        self.window.center()
    }
}
