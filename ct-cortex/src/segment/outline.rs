use crate::consts::gray::{is_bone, is_soft, BLANK, BOUNDARY};
use crate::{MaskSlice, OwnedMask};
use ndarray::Array2;

/// 轮廓提取能力. 输入阈值二值图, 输出同形状的边缘图
/// (`BOUNDARY` 为轮廓像素, `BLANK` 为其它像素).
///
/// 实现需要是 `Sync` 的, 以便在多张切片上并行调用.
pub trait BoundaryExtractor: Sync {
    /// 提取 `binary` 中骨区域的单像素轮廓.
    fn outline(&self, binary: MaskSlice) -> OwnedMask;
}

impl<F> BoundaryExtractor for F
where
    F: Fn(MaskSlice) -> OwnedMask + Sync,
{
    #[inline]
    fn outline(&self, binary: MaskSlice) -> OwnedMask {
        self(binary)
    }
}

/// 默认的轮廓提取实现.
///
/// 一个骨像素是轮廓, 当且仅当它的 8-邻域中存在非骨像素, 或存在越界的邻居.
/// 这样得到的轮廓是 4-连通的.
#[derive(Copy, Clone, Debug, Default)]
pub struct Outline;

impl BoundaryExtractor for Outline {
    fn outline(&self, binary: MaskSlice) -> OwnedMask {
        OwnedMask::from_raw(Array2::from_shape_fn(binary.shape(), |pos| {
            let on_edge = is_bone(binary[pos])
                && (binary.is_at_border(pos) || binary.is_n8_having(pos, is_soft));
            if on_edge {
                BOUNDARY
            } else {
                BLANK
            }
        }))
    }
}
