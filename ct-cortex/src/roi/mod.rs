//! 四边形 ROI: 几何判定, 栅格化掩膜, 相邻切片间的线性插值, 以及 ROI 采集协议.

mod capture;

pub use capture::{CaptureError, CaptureStage, RoiCapture};

use crate::consts::gray::{INSIDE, OUTSIDE};
use crate::consts::ROI_VERTICES;
use crate::{Idx2d, MaskSlice, OwnedMask, Point};
use itertools::{Itertools, MinMaxResult};
use ndarray::Array2;
use num::ToPrimitive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 构建 ROI 时的错误.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InitRoiError {
    /// 顶点个数不是 4. 参数为实际个数.
    #[error("ROI 需要恰好 4 个顶点, 实际为 {0} 个")]
    VertexCount(usize),

    /// 顶点坐标含有 NaN 或 inf.
    #[error("ROI 顶点坐标必须是有限值")]
    NotFinite,
}

/// 平面四边形 ROI. 顶点坐标以 `(x, y)` 像素坐标存储, 按给定顺序首尾相连.
///
/// 构造时保证所有坐标都是有限值.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "Vec<Point>", into = "Vec<Point>")
)]
pub struct Quad {
    points: [Point; ROI_VERTICES],
}

impl TryFrom<&[Point]> for Quad {
    type Error = InitRoiError;

    fn try_from(value: &[Point]) -> Result<Self, Self::Error> {
        let points: [Point; ROI_VERTICES] = value
            .try_into()
            .map_err(|_| InitRoiError::VertexCount(value.len()))?;
        Self::new(points)
    }
}

impl TryFrom<Vec<Point>> for Quad {
    type Error = InitRoiError;

    #[inline]
    fn try_from(value: Vec<Point>) -> Result<Self, Self::Error> {
        Self::try_from(value.as_slice())
    }
}

impl From<Quad> for Vec<Point> {
    #[inline]
    fn from(value: Quad) -> Self {
        value.points.to_vec()
    }
}

/// 将浮点坐标裁剪到 `[0, len]` 内的整数.
fn clip(v: f64, len: usize) -> usize {
    if v <= 0.0 {
        0
    } else {
        v.to_usize().map_or(len, |v| v.min(len))
    }
}

impl Quad {
    /// 以 4 个顶点构建 ROI. 若任一坐标不是有限值, 返回 `Err`.
    pub fn new(points: [Point; ROI_VERTICES]) -> Result<Self, InitRoiError> {
        if points.iter().all(|(x, y)| x.is_finite() && y.is_finite()) {
            Ok(Self { points })
        } else {
            Err(InitRoiError::NotFinite)
        }
    }

    /// 获取顶点.
    #[inline]
    pub fn points(&self) -> &[Point; ROI_VERTICES] {
        &self.points
    }

    /// 按奇偶规则判断点 `(x, y)` 是否位于四边形内部.
    pub fn contains(&self, (x, y): Point) -> bool {
        self.points
            .iter()
            .circular_tuple_windows()
            .filter(|&(&(xi, yi), &(xj, yj))| {
                (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi
            })
            .count()
            % 2
            == 1
    }

    /// 获取外接矩形, 并裁剪到形状为 `(高, 宽)` 的图像内.
    ///
    /// 左上角取坐标最小值向下取整, 右下角取坐标最大值向上取整.
    /// 若 ROI 与图像不相交, 返回面积为 0 的矩形.
    pub fn bounds(&self, (height, width): Idx2d) -> Rect {
        let span = |it: MinMaxResult<f64>, len: usize| match it {
            MinMaxResult::NoElements => (0, 0),
            MinMaxResult::OneElement(v) => {
                let v = clip(v.floor(), len);
                (v, v)
            }
            MinMaxResult::MinMax(lo, hi) => (clip(lo.floor(), len), clip(hi.ceil(), len)),
        };
        let (x0, x1) = span(self.points.iter().map(|p| p.0).minmax(), width);
        let (y0, y1) = span(self.points.iter().map(|p| p.1).minmax(), height);
        Rect {
            x: x0,
            y: y0,
            width: x1.saturating_sub(x0),
            height: y1.saturating_sub(y0),
        }
    }

    /// 在形状为 `(高, 宽)` 的图像上栅格化. 矩形内的像素中心 `(x + 0.5, y + 0.5)`
    /// 位于四边形内部时, 该像素为 `INSIDE`, 否则为 `OUTSIDE`.
    pub fn rasterize(&self, shape: Idx2d) -> RoiMask {
        let rect = self.bounds(shape);
        let mask = Array2::from_shape_fn(rect.shape(), |(h, w)| {
            let centre = ((rect.x + w) as f64 + 0.5, (rect.y + h) as f64 + 0.5);
            if self.contains(centre) {
                INSIDE
            } else {
                OUTSIDE
            }
        });
        RoiMask {
            rect,
            mask: OwnedMask::from_raw(mask),
        }
    }

    /// 在 `first` 和 `second` 之间, 对共 `count` 张切片中的第 `i` 张做线性插值.
    /// 对每个顶点分量 `v`: `v(i) = first - i * ((first - second) / count)`.
    ///
    /// `i = 0` 时得到 `first` 本身. 注意 `i = count - 1` 时并不精确等于 `second`.
    ///
    /// 当 `count` 为 0 时 panic.
    pub fn interpolate(first: &Quad, second: &Quad, count: usize, i: usize) -> Quad {
        assert_ne!(count, 0, "插值切片数不能为 0");
        let (n, i) = (count as f64, i as f64);
        let lerp = |a: f64, b: f64| a - i * ((a - b) / n);
        let mut points = first.points;
        for (p, q) in points.iter_mut().zip(second.points.iter()) {
            *p = (lerp(p.0, q.0), lerp(p.1, q.1));
        }
        Quad { points }
    }
}

/// 附着在某张切片上的 ROI.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnchoredRoi {
    /// 切片索引 (从 0 开始).
    pub slice: usize,

    /// 四边形.
    pub quad: Quad,
}

impl AnchoredRoi {
    /// 直接初始化.
    #[inline]
    pub fn new(slice: usize, quad: Quad) -> Self {
        Self { slice, quad }
    }
}

/// 图像坐标系下的整数矩形.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect {
    /// 左上角列号.
    pub x: usize,

    /// 左上角行号.
    pub y: usize,

    /// 宽.
    pub width: usize,

    /// 高.
    pub height: usize,
}

impl Rect {
    /// 矩形形状 `(高, 宽)`.
    #[inline]
    pub fn shape(&self) -> Idx2d {
        (self.height, self.width)
    }

    /// 面积是否为 0.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// 将矩形内的局部索引转为图像索引.
    #[inline]
    pub fn to_image(&self, (h, w): Idx2d) -> Idx2d {
        (h + self.y, w + self.x)
    }
}

/// 栅格化后的 ROI: 外接矩形和其上的 `INSIDE` / `OUTSIDE` 掩膜.
#[derive(Clone, Debug, PartialEq)]
pub struct RoiMask {
    rect: Rect,
    mask: OwnedMask,
}

impl RoiMask {
    /// 矩形内所有像素都位于 ROI 内部. 用于没有掩膜的场景.
    pub fn full(rect: Rect) -> Self {
        Self {
            rect,
            mask: OwnedMask::filled(rect.shape(), INSIDE),
        }
    }

    /// 外接矩形.
    #[inline]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// 掩膜的不可变视图. 形状与 `rect().shape()` 一致.
    #[inline]
    pub fn mask(&self) -> MaskSlice<'_> {
        self.mask.as_immut()
    }

    /// 位于 ROI 内部的像素个数.
    #[inline]
    pub fn active_count(&self) -> usize {
        self.mask.as_immut().count(INSIDE)
    }
}

#[cfg(test)]
mod tests {
    use super::{InitRoiError, Quad, Rect, RoiMask};
    use crate::Point;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn square(lo: f64, hi: f64) -> Quad {
        Quad::new([(lo, lo), (hi, lo), (hi, hi), (lo, hi)]).unwrap()
    }

    #[test]
    fn test_vertex_count() {
        let three: Vec<Point> = vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)];
        assert_eq!(Quad::try_from(three), Err(InitRoiError::VertexCount(3)));
        let five = [(0.0, 0.0); 5];
        assert_eq!(
            Quad::try_from(five.as_slice()),
            Err(InitRoiError::VertexCount(5))
        );
        let nan = [(0.0, f64::NAN); 4];
        assert_eq!(Quad::try_from(nan.as_slice()), Err(InitRoiError::NotFinite));
    }

    #[test]
    fn test_contains() {
        let q = square(0.0, 4.0);
        assert!(q.contains((2.0, 2.0)));
        assert!(q.contains((0.5, 3.5)));
        assert!(!q.contains((4.5, 2.0)));
        assert!(!q.contains((-0.1, 2.0)));

        // 凹四边形.
        let arrow = Quad::new([(0.0, 0.0), (4.0, 2.0), (0.0, 4.0), (2.0, 2.0)]).unwrap();
        assert!(arrow.contains((3.0, 2.0)));
        assert!(!arrow.contains((1.0, 2.0)));
    }

    #[test]
    fn test_bounds_clipped() {
        let q = square(-2.5, 7.2);
        assert_eq!(
            q.bounds((5, 6)),
            Rect {
                x: 0,
                y: 0,
                width: 6,
                height: 5
            }
        );
        let q = Quad::new([(1.2, 2.7), (3.9, 2.7), (3.9, 4.1), (1.2, 4.1)]).unwrap();
        assert_eq!(
            q.bounds((20, 20)),
            Rect {
                x: 1,
                y: 2,
                width: 3,
                height: 3
            }
        );
        // 完全在图像之外.
        assert!(square(30.0, 40.0).bounds((20, 20)).is_empty());
    }

    #[test]
    fn test_rasterize_full_square() {
        let m = square(0.0, 20.0).rasterize((20, 20));
        assert_eq!(m.rect().shape(), (20, 20));
        assert_eq!(m.active_count(), 400);
        assert_eq!(m, RoiMask::full(m.rect()));
    }

    #[test]
    fn test_rasterize_triangle_like() {
        // 退化为三角形: 右上角在对角线上.
        let q = Quad::new([(0.0, 0.0), (4.0, 4.0), (0.0, 4.0), (0.0, 2.0)]).unwrap();
        let m = q.rasterize((10, 10));
        // 像素中心严格位于对角线下方: 每行 0, 1, 2, 3 个.
        assert_eq!(m.active_count(), 1 + 2 + 3);
        assert_eq!(m.rect().shape(), (4, 4));
    }

    #[test]
    fn test_rasterize_empty() {
        let m = square(30.0, 40.0).rasterize((20, 20));
        assert_eq!(m.active_count(), 0);
        assert_eq!(m.mask().size(), 0);
    }

    #[test]
    fn test_interpolate() {
        let a = square(0.0, 10.0);
        let b = square(5.0, 15.0);
        assert_eq!(Quad::interpolate(&a, &b, 1, 0), a);
        assert_eq!(Quad::interpolate(&a, &b, 5, 0), a);

        let q = Quad::interpolate(&a, &b, 5, 2);
        // 0 - 2 * ((0 - 5) / 5) = 2.
        assert!(f64_eq(q.points()[0].0, 2.0));
        assert!(f64_eq(q.points()[2].1, 12.0));

        // 最后一张切片停在 second 前一个步长.
        let q = Quad::interpolate(&a, &b, 5, 4);
        assert!(f64_eq(q.points()[0].0, 4.0));
    }
}
