//! 通用常量.

/// 单通道颜色与二值图像素值.
pub mod gray {
    /// 单通道黑色.
    pub const BLACK: u8 = 0b_0000_0000;

    /// 单通道白色.
    pub const WHITE: u8 = 0b_1111_1111;

    /// 二值图中, 低于阈值 (或不在 ROI 掩膜内) 的像素值.
    pub const SOFT: u8 = BLACK;

    /// 二值图中, 不低于阈值的骨像素值.
    pub const BONE: u8 = WHITE;

    /// 边缘图中, 轮廓像素的值.
    pub const BOUNDARY: u8 = BLACK;

    /// 边缘图中, 非轮廓像素的值.
    pub const BLANK: u8 = WHITE;

    /// ROI 掩膜中, 位于多边形内部的像素值.
    pub const INSIDE: u8 = WHITE;

    /// ROI 掩膜中, 位于多边形外部的像素值.
    pub const OUTSIDE: u8 = BLACK;

    /// 像素是否是骨?
    #[inline]
    pub const fn is_bone(p: u8) -> bool {
        matches!(p, BONE)
    }

    /// 像素是否是软组织 (低于阈值)?
    #[inline]
    pub const fn is_soft(p: u8) -> bool {
        !is_bone(p)
    }

    /// 像素是否是轮廓?
    #[inline]
    pub const fn is_boundary(p: u8) -> bool {
        matches!(p, BOUNDARY)
    }

    /// 像素是否位于 ROI 掩膜内部?
    #[inline]
    pub const fn is_inside(p: u8) -> bool {
        !matches!(p, OUTSIDE)
    }
}

/// 每个 ROI 的顶点个数.
pub const ROI_VERTICES: usize = 4;

/// 每个轮廓点的距离补偿 (像素). 用于抵消 1 像素宽轮廓的栅格化损失.
pub const RASTER_OFFSET: f64 = 1.0;

/// 二值图像素类型.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ElemType {
    /// `SOFT`, 低于阈值.
    Soft,

    /// `BONE`, 不低于阈值.
    Bone,
}

impl ElemType {
    /// 根据强度值 `value` 和阈值 `threshold` 分类. 严格低于阈值的像素为软组织.
    #[inline]
    pub fn classify(value: f32, threshold: i32) -> Self {
        if value < threshold as f32 {
            Self::Soft
        } else {
            Self::Bone
        }
    }

    /// 是否为骨.
    #[inline]
    pub fn is_bone(&self) -> bool {
        matches!(self, Self::Bone)
    }

    /// 对应的二值图像素值.
    #[inline]
    pub fn gray(&self) -> u8 {
        match self {
            Self::Soft => gray::SOFT,
            Self::Bone => gray::BONE,
        }
    }
}
