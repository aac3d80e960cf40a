//! 骨层厚度测量: 轮廓间距估计, 自适应阈值搜索, 以及多切片汇总.

mod aggregate;
mod distance;
mod error;
mod params;
mod search;

pub use aggregate::{Outcome, Preview, PreviewPaint, SliceAggregator, Thickness};
pub use distance::contour_gap;
pub use error::{InputError, MeasureError, SliceError};
pub use params::{MeasureSpec, Mode};
pub use search::{SearchState, SearchStep, ThresholdState};

/// 单张切片测量结果.
pub type SliceResult<T> = Result<T, SliceError>;

/// 整体测量结果.
pub type MeasureResult<T> = Result<T, MeasureError>;
