//! 切片镜像. 用于在预览着色前保存原切片, 并在预览结束后复原.

use super::{ScanSlice, ScanSliceMut};

/// 一个拥有所有权的 CT 扫描切片的不透明镜像.
///
/// 阈值预览会把 ROI 内的像素就地改写为显示范围的两端,
/// 该结构用于在改写前保存强度值并随后恢复.
#[derive(Clone, Debug)]
pub struct ScanMirror(pub(crate) Vec<f32>);

impl From<&ScanSlice<'_>> for ScanMirror {
    fn from(value: &ScanSlice<'_>) -> Self {
        Self(value.iter().copied().collect())
    }
}

impl From<&ScanSliceMut<'_>> for ScanMirror {
    fn from(value: &ScanSliceMut<'_>) -> Self {
        Self(value.iter().copied().collect())
    }
}

impl ScanMirror {
    /// 镜像保存的像素个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 镜像是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
