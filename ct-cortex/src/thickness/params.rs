use super::ThresholdState;
use crate::roi::AnchoredRoi;
use crate::PhysicalScale;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 运行模式.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Mode {
    /// 测量范围内的全部切片, 失败的切片直接排除, 不调整阈值.
    #[default]
    Batch,

    /// 只测量范围内的最后一张切片. 失败时自适应地调整阈值.
    Preview,
}

/// 一次测量的全部参数.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeasureSpec {
    /// 图像标题, 用于输出报告.
    pub title: String,

    /// 第一个 ROI. 所在切片为测量范围起点.
    pub first: AnchoredRoi,

    /// 第二个 ROI. 所在切片为测量范围终点 (包含).
    pub second: AnchoredRoi,

    /// 阈值.
    pub threshold: ThresholdState,

    /// 像素物理尺寸.
    pub scale: PhysicalScale,

    /// 运行模式.
    #[cfg_attr(feature = "serde", serde(default))]
    pub mode: Mode,
}
