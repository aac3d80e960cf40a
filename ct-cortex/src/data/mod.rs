use std::ops::{Index, IndexMut, Range};
use std::path::Path;

use ndarray::{Array2, Array3, ArrayView, ArrayView2, ArrayViewMut, Axis, Ix3, ShapeError, Slice};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::{Idx2d, Idx3d};

pub mod display;
pub mod slice;

pub use display::{Calibration, DisplayRange};

pub use slice::{
    ImgWriteVis, MaskSlice, MaskSliceMut, OwnedMask, OwnedScanSlice, ScanMirror, ScanSlice,
    ScanSliceMut,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 将 nifti header 中的 (W, H, z) 转换成 (z, H, W). 以后均按照该模式访问.
#[inline]
fn get_shape_from_header(h: &NiftiHeader) -> Idx3d {
    // [W, H, z]. 体素个数数组.
    let [_, w, h, z, ..] = h.dim;
    (z as usize, h as usize, w as usize)
}

/// 从 nifti header 的 `xyzt_units` 中解析空间单位.
fn space_unit_from_header(h: &NiftiHeader) -> &'static str {
    match h.xyzt_units & 0x07 {
        1 => "m",
        2 => "mm",
        3 => "micron",
        _ => "pixel",
    }
}

/// 像素/体素到物理尺寸的换算信息.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhysicalScale {
    /// 切片平面内的像素尺寸 (水平方向).
    pub in_plane: f64,

    /// 相邻切片之间的距离.
    pub inter_slice: f64,

    /// 以上两个值共同的单位标签.
    pub unit: String,
}

impl PhysicalScale {
    /// 直接初始化. 不检查合法性.
    pub fn new(in_plane: f64, inter_slice: f64, unit: impl Into<String>) -> Self {
        Self {
            in_plane,
            inter_slice,
            unit: unit.into(),
        }
    }

    /// 以像素为单位的换算, 两个方向均为 1.
    #[inline]
    pub fn pixel() -> Self {
        Self::new(1.0, 1.0, "pixel")
    }

    /// 两个尺寸是否均为正的有限值.
    #[inline]
    pub fn is_valid(&self) -> bool {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        ok(self.in_plane) && ok(self.inter_slice)
    }
}

/// 切片堆栈的共用属性和部分通用操作.
pub trait StackAttr {
    /// 获取数据形状大小 (z, h, w).
    fn shape(&self) -> Idx3d;

    /// 获取单个体素分辨率. 分别代表空间 (相邻切片方向),
    /// 高 (自然图像的垂直方向), 宽 (自然图像的水平方向).
    fn pix_dim(&self) -> [f64; 3];

    /// 获取数据水平切片形状大小.
    #[inline]
    fn slice_shape(&self) -> Idx2d {
        let (_, h, w) = self.shape();
        (h, w)
    }

    /// 获取切片个数.
    #[inline]
    fn len_z(&self) -> usize {
        self.shape().0
    }

    /// 获取数据体素个数.
    #[inline]
    fn size(&self) -> usize {
        let (z, h, w) = self.shape();
        z * h * w
    }

    /// 检查索引是否合法.
    #[inline]
    fn check(&self, (z0, h0, w0): &Idx3d) -> bool {
        let (z, h, w) = self.shape();
        *z0 < z && *h0 < h && *w0 < w
    }

    /// 获取 width 方向 (自然 2D 图像的水平方向) 体素分辨率.
    #[inline]
    fn width_dim(&self) -> f64 {
        self.pix_dim()[2]
    }

    /// 获取空间方向 (相邻 2D 切片的方向) 体素分辨率.
    #[inline]
    fn z_dim(&self) -> f64 {
        self.pix_dim()[0]
    }

    /// 体素分辨率在三个维度上是否是各向同的?
    #[inline]
    fn is_isotropic(&self) -> bool {
        let [z, h, w] = self.pix_dim();
        z == h && z == w
    }
}

/// 3D 切片堆栈. 强度值以 `f32` 保存, 按 (z, H, W) 组织.
#[derive(Debug, Clone)]
pub struct CtStack {
    data: Array3<f32>,

    /// [z, h, w]
    pix_dim: [f64; 3],

    unit: String,

    /// 文件中记录的显示范围 (若有).
    display: Option<DisplayRange>,
}

impl StackAttr for CtStack {
    #[inline]
    fn shape(&self) -> Idx3d {
        let &[z, h, w] = self.data.shape() else {
            unreachable!()
        };
        (z, h, w)
    }

    #[inline]
    fn pix_dim(&self) -> [f64; 3] {
        self.pix_dim
    }
}

impl Index<Idx3d> for CtStack {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for CtStack {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl CtStack {
    /// 打开 nii 文件格式的 3D 扫描. `path` 为 nii 文件的本地路径.
    /// 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
    ///
    /// 强度值已经过文件中的 `scl_slope` / `scl_inter` 标定.
    pub fn open<P: AsRef<Path>>(path: P) -> nifti::Result<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let header = obj.header().clone();

        // [W, H, z] -> [z, H, W].
        // hint: 原第一维向下增长, 原第二维向右增长.
        let data = obj
            .into_volume()
            .into_ndarray::<f32>()?
            .permuted_axes([2, 1, 0].as_slice());
        let data = data
            .as_standard_layout()
            .to_owned()
            .into_shape(get_shape_from_header(&header))
            .map_err(|e| nifti::NiftiError::from(std::io::Error::other(e)))?;

        let [_, w, h, z, ..] = header.pixdim;
        let display = DisplayRange::new(header.cal_min as f64, header.cal_max as f64);
        Ok(Self {
            data,
            pix_dim: [z as f64, h as f64, w as f64],
            unit: space_unit_from_header(&header).to_string(),
            display,
        })
    }

    /// 以 (z, H, W) 形状和行优先的强度数据直接创建堆栈.
    ///
    /// `pix_dim` 按照 \[z, h, w\] 格式存储.
    pub fn from_shape_vec(
        shape: Idx3d,
        data: Vec<f32>,
        pix_dim: [f64; 3],
        unit: impl Into<String>,
    ) -> Result<Self, ShapeError> {
        Ok(Self {
            data: Array3::from_shape_vec(shape, data)?,
            pix_dim,
            unit: unit.into(),
            display: None,
        })
    }

    /// 同 [`Self::from_shape_vec`], 但接受 16-bit 原始数据.
    pub fn from_u16(
        shape: Idx3d,
        data: Vec<u16>,
        pix_dim: [f64; 3],
        unit: impl Into<String>,
    ) -> Result<Self, ShapeError> {
        let data = data.into_iter().map(f32::from).collect();
        Self::from_shape_vec(shape, data, pix_dim, unit)
    }

    /// 将若干形状一致的切片沿 z 方向堆叠. 没有切片或形状不一致时返回 `Err`.
    pub fn from_slices<I: IntoIterator<Item = Array2<f32>>>(
        slices: I,
        pix_dim: [f64; 3],
        unit: impl Into<String>,
    ) -> Result<Self, ShapeError> {
        let slices: Vec<Array2<f32>> = slices.into_iter().collect();
        let views: Vec<ArrayView2<f32>> = slices.iter().map(|s| s.view()).collect();
        Ok(Self {
            data: ndarray::stack(Axis(0), &views)?,
            pix_dim,
            unit: unit.into(),
            display: None,
        })
    }

    /// 覆盖显示范围.
    #[inline]
    pub fn with_display_range(mut self, range: DisplayRange) -> Self {
        self.display = Some(range);
        self
    }

    /// 获取显示范围. 文件中未记录时, 以全部有限强度值的 (最小值, 最大值) 代替.
    /// 若仍无法构成合法范围, 返回 `None`.
    pub fn display_range(&self) -> Option<DisplayRange> {
        self.display.or_else(|| {
            let (lo, hi) = self
                .data
                .iter()
                .copied()
                .filter(|v| v.is_finite())
                .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                });
            DisplayRange::new(lo as f64, hi as f64)
        })
    }

    /// 空间单位标签.
    #[inline]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// 由体素分辨率构造的物理换算信息.
    #[inline]
    pub fn physical_scale(&self) -> PhysicalScale {
        PhysicalScale::new(self.width_dim(), self.z_dim(), self.unit.as_str())
    }

    /// 获取 3D 堆栈 z 空间的第 `z_index` 层切片视图.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> ScanSlice<'_> {
        ScanSlice::new(self.data.index_axis(Axis(0), z_index))
    }

    /// 获取 3D 堆栈 z 空间的第 `z_index` 层可变切片视图.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at_mut(&mut self, z_index: usize) -> ScanSliceMut<'_> {
        ScanSliceMut::new(self.data.index_axis_mut(Axis(0), z_index))
    }

    /// 获取能按升序迭代不可变切片的迭代器.
    #[inline]
    pub fn slice_iter(&self) -> impl ExactSizeIterator<Item = ScanSlice> {
        self.data.axis_iter(Axis(0)).map(ScanSlice::new)
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, f32, Ix3> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut<'_, f32, Ix3> {
        self.data.view_mut()
    }

    /// 依次对 `range` 内的每个切片实施 `op` 操作, 按切片顺序收集结果.
    /// `op` 同时携带切片的 z 方向索引.
    ///
    /// `range` 越界时 panic.
    pub fn map_slices<T, F>(&self, range: Range<usize>, op: F) -> Vec<T>
    where
        F: Fn(usize, ScanSlice) -> T,
    {
        let start = range.start;
        let view = self.data.slice_axis(Axis(0), Slice::from(range));
        view.axis_iter(Axis(0))
            .enumerate()
            .map(|(i, v)| op(start + i, ScanSlice::new(v)))
            .collect()
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
    }
}

/// 并发操作部分
#[cfg(feature = "rayon")]
impl CtStack {
    /// 借助 `rayon`, 并行地对 `range` 内的每个切片实施 `op` 操作,
    /// 按切片顺序收集结果. `op` 同时携带切片的 z 方向索引.
    ///
    /// `range` 越界时 panic.
    pub fn par_map_slices<T, F>(&self, range: Range<usize>, op: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize, ScanSlice) -> T + Sync + Send,
    {
        let start = range.start;
        let view = self.data.slice_axis(Axis(0), Slice::from(range));
        view.axis_iter(Axis(0))
            .into_par_iter()
            .enumerate()
            .map(|(i, v)| op(start + i, ScanSlice::new(v)))
            .collect()
    }
}
