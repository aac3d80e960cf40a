//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d, Point};

pub use crate::data::{
    Calibration, CtStack, DisplayRange, ImgWriteVis, MaskSlice, MaskSliceMut, OwnedMask,
    OwnedScanSlice, PhysicalScale, ScanMirror, ScanSlice, ScanSliceMut, StackAttr,
};

pub use crate::consts::gray::{BLANK, BONE, BOUNDARY, SOFT};
pub use crate::consts::ElemType;

pub use crate::roi::{AnchoredRoi, InitRoiError, Quad, RoiCapture};
pub use crate::segment::{BoundaryExtractor, Outline};
pub use crate::thickness::{
    MeasureError, MeasureSpec, Mode, Preview, SliceAggregator, Thickness, ThresholdState,
};
