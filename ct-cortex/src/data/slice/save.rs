//! 图像的持久化存储. 主要用于调试时导出中间结果.

use crate::{DisplayRange, MaskSlice, MaskSliceMut, ScanSlice, ScanSliceMut};
use image::ImageResult;
use std::path::Path;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// 对于 `MaskSlice`, `MaskSliceMut` 这类仅存在 0 / 255 像素值的网格,
/// 保存时按原样写入; 对于 `ScanSlice`, `ScanSliceMut` 这类以强度值存储的切片,
/// 保存时会以切片自身的强度范围规范化到 8-bit 灰度.
pub trait ImgWriteVis {
    /// 按照一定的可视化规则将图片保存到 `path` 路径.
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

macro_rules! impl_mask_vis {
    ($($slice: ty),+) => {
        $(
            /// 二值网格本身就是黑白图像, 按原样存储.
            impl ImgWriteVis for $slice {
                fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
                    let (height, width) = self.shape();
                    let mut buf = image::GrayImage::new(width as u32, height as u32);
                    for ((h, w), &pix) in self.indexed_iter() {
                        buf.put_pixel(w as u32, h as u32, image::Luma([pix]));
                    }
                    buf.save(path)
                }
            }
        )+
    };
}

macro_rules! impl_scan_vis {
    ($($scan: ty),+) => {
        $(
            /// 以切片自身的 (最小值, 最大值) 为显示范围.
            impl ImgWriteVis for $scan {
                fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
                    let (height, width) = self.shape();
                    let mut buf = image::GrayImage::new(width as u32, height as u32);
                    let range = self
                        .value_range()
                        .and_then(|(lo, hi)| DisplayRange::new(lo as f64, hi as f64));
                    for ((h, w), &v) in self.indexed_iter() {
                        let gray = range.and_then(|r| r.eval(v as f64)).unwrap_or(u8::MIN);
                        buf.put_pixel(w as u32, h as u32, image::Luma([gray]));
                    }
                    buf.save(path)
                }
            }
        )+
    };
}

impl_mask_vis!(MaskSlice<'_>, MaskSliceMut<'_>);
impl_scan_vis!(ScanSlice<'_>, ScanSliceMut<'_>);
