use crate::consts::gray::{is_inside, SOFT};
use crate::consts::ElemType;
use crate::roi::RoiMask;
use crate::{DisplayRange, OwnedMask, ScanSlice, ScanSliceMut};
use ndarray::Array2;

/// 在 ROI 外接矩形内对切片做阈值二值化. 返回与矩形同形状的二值图.
///
/// 掩膜内的像素强度严格低于 `t` 时为 `SOFT` (黑), 否则为 `BONE` (白);
/// 掩膜外的像素一律为 `SOFT`.
///
/// `roi` 须由与 `scan` 同形状的图像栅格化得到, 否则可能越界 panic.
pub fn threshold(scan: &ScanSlice, roi: &RoiMask, t: i32) -> OwnedMask {
    let rect = roi.rect();
    let mask = roi.mask();
    OwnedMask::from_raw(Array2::from_shape_fn(rect.shape(), |pos| {
        if is_inside(mask[pos]) {
            ElemType::classify(scan[rect.to_image(pos)], t).gray()
        } else {
            SOFT
        }
    }))
}

/// 预览用: 把掩膜内的源像素就地改写为显示范围的两端 (截断为整数).
/// 低于 `t` 的像素写为 `range.min()`, 其余写为 `range.max()`.
///
/// 若需要复原, 调用方应事先用 [`ScanSliceMut::mirror`] 保存切片.
pub fn paint_threshold(scan: &mut ScanSliceMut, roi: &RoiMask, t: i32, range: DisplayRange) {
    let rect = roi.rect();
    let mask = roi.mask();
    for pos in mask.pos_iter().filter(|p| is_inside(mask[*p])) {
        let img_pos = rect.to_image(pos);
        scan[img_pos] = if ElemType::classify(scan[img_pos], t).is_bone() {
            range.max().trunc() as f32
        } else {
            range.min().trunc() as f32
        };
    }
}
