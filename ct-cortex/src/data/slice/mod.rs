//! CT 扫描切片与二值网格对象的操作.

mod core;
mod iter;
mod mirror;
mod save;

pub use self::core::{MaskSlice, MaskSliceMut, OwnedMask, OwnedScanSlice, ScanSlice, ScanSliceMut};

pub use mirror::ScanMirror;

pub use save::ImgWriteVis;
