//! 运行时错误.

/// 单张切片的测量错误. 批量模式下仅导致该切片被排除.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum SliceError {
    /// 修剪后的轮廓分量不足两个. 参数为实际分量个数.
    #[error("轮廓分量不足两个 (实际 {0} 个)")]
    TooFewComponents(usize),
}

/// 测量输入不合法.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    /// 切片堆栈为空.
    #[error("切片堆栈为空")]
    EmptyStack,

    /// ROI 所在切片超出堆栈范围.
    #[error("切片 {slice} 越界 (共 {len} 张)")]
    SliceOutOfRange {
        /// 越界的切片索引.
        slice: usize,

        /// 堆栈切片数.
        len: usize,
    },

    /// 第一个 ROI 所在切片位于第二个之后.
    #[error("第一个 ROI 所在切片 ({first}) 位于第二个 ({second}) 之后")]
    ReversedRange {
        /// 第一个 ROI 所在切片.
        first: usize,

        /// 第二个 ROI 所在切片.
        second: usize,
    },

    /// 像素物理尺寸不是正的有限值.
    #[error("像素物理尺寸必须是正的有限值")]
    BadScale,

    /// 阈值不满足 `min <= value <= max`, 或无法由显示范围和标定推出.
    #[error("阈值状态不合法")]
    BadThreshold,
}

/// 整体测量错误.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeasureError {
    /// 所有切片均被排除.
    #[error("全部 {slices} 张切片均无法测量")]
    AllSlicesInvalid {
        /// 参与测量的切片数.
        slices: usize,
    },

    /// 输入不合法.
    #[error(transparent)]
    Input(#[from] InputError),

    /// 调用方中途取消.
    #[error("测量已取消")]
    Cancelled,
}
