use crate::consts::gray::{is_boundary, is_inside, BLANK, BOUNDARY, INSIDE, OUTSIDE};
use crate::roi::RoiMask;
use crate::{Idx2d, MaskSlice, OwnedMask};
use ndarray::Array2;

/// 轮廓上的一个 4-连通分量.
#[derive(Clone, Debug, PartialEq)]
pub struct Component {
    label: u32,
    points: Vec<Idx2d>,
}

impl Component {
    /// 标签. 从 1 开始, 按发现顺序递增.
    #[inline]
    pub fn label(&self) -> u32 {
        self.label
    }

    /// 分量包含的像素 (矩形内的局部索引), 没有重复.
    #[inline]
    pub fn points(&self) -> &[Idx2d] {
        &self.points
    }

    /// 像素个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 是否为空. 由 [`label_components`] 得到的分量永远非空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// 按标签顺序排列的全部分量.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Components(Vec<Component>);

impl Components {
    /// 分量个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 是否没有任何分量.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 按标签顺序迭代.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Component> {
        self.0.iter()
    }

    /// 所有分量的像素总数.
    pub fn total_points(&self) -> usize {
        self.0.iter().map(Component::len).sum()
    }
}

impl<'a> IntoIterator for &'a Components {
    type Item = &'a Component;
    type IntoIter = std::slice::Iter<'a, Component>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// 掩膜的边缘: 位于 ROI 内部, 且 (未越界的) 8-邻域中存在外部像素.
/// 边缘像素为 `BOUNDARY`, 其余为 `BLANK`.
pub fn mask_edge(mask: &MaskSlice) -> OwnedMask {
    OwnedMask::from_raw(Array2::from_shape_fn(mask.shape(), |pos| {
        if is_inside(mask[pos]) && mask.is_n8_having(pos, |p| !is_inside(p)) {
            BOUNDARY
        } else {
            BLANK
        }
    }))
}

/// 修剪后的掩膜: 去掉矩形最外一圈和 ROI 掩膜边缘后剩下的内部像素为 `INSIDE`,
/// 其余为 `OUTSIDE`.
pub fn trimmed(roi: &RoiMask) -> OwnedMask {
    let mask = roi.mask();
    let edge = mask_edge(&mask);
    let edge = edge.as_immut();
    OwnedMask::from_raw(Array2::from_shape_fn(mask.shape(), |pos| {
        if !mask.is_at_border(pos) && is_inside(mask[pos]) && !is_boundary(edge[pos]) {
            INSIDE
        } else {
            OUTSIDE
        }
    }))
}

/// 对边缘图 `boundary` 中位于修剪后掩膜内的轮廓像素做 4-连通标记.
///
/// 种子按列优先顺序 (先宽后高) 发现, 标签从 1 开始.
/// 返回的分量两两不相交, 其并集恰为修剪后掩膜内的全部轮廓像素.
///
/// 当 `boundary` 与 `roi` 的矩形形状不一致时 panic.
pub fn label_components(boundary: MaskSlice, roi: &RoiMask) -> Components {
    assert_eq!(boundary.shape(), roi.rect().shape(), "边缘图与 ROI 形状不符");
    let keep = trimmed(roi);
    let keep = keep.as_immut();
    let cleaned = OwnedMask::from_raw(Array2::from_shape_fn(boundary.shape(), |pos| {
        if is_boundary(boundary[pos]) && is_inside(keep[pos]) {
            BOUNDARY
        } else {
            BLANK
        }
    }));
    let cleaned = cleaned.as_immut();

    Components(
        cleaned
            .areas_from_local(cleaned.col_pos_iter(), is_boundary)
            .into_iter()
            .zip(1..)
            .map(|(points, label)| Component { label, points })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::{label_components, mask_edge, trimmed};
    use crate::consts::gray::*;
    use crate::roi::{Quad, Rect, RoiMask};
    use crate::{Idx2d, OwnedMask};
    use ndarray::Array2;
    use std::collections::HashSet;

    fn full(h: usize, w: usize) -> RoiMask {
        RoiMask::full(Rect {
            x: 0,
            y: 0,
            width: w,
            height: h,
        })
    }

    fn edge_map(shape: Idx2d, pixels: &[Idx2d]) -> OwnedMask {
        let mut m = OwnedMask::filled(shape, BLANK);
        m.as_mutable().fill_batch(pixels.iter().copied(), BOUNDARY);
        m
    }

    #[test]
    fn test_trim_rect_border() {
        let roi = full(5, 6);
        let t = trimmed(&roi);
        assert_eq!(t.as_immut().count(INSIDE), 3 * 4);

        // 位于矩形最外圈的轮廓像素不参与标记.
        let e = edge_map((5, 6), &[(0, 2), (4, 4), (2, 2)]);
        let c = label_components(e.as_immut(), &roi);
        assert_eq!(c.len(), 1);
        assert_eq!(c.iter().next().unwrap().points(), &[(2, 2)]);
    }

    #[test]
    fn test_trim_mask_edge() {
        // 对角线下方的三角形掩膜.
        let roi = Quad::new([(0.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 5.0)])
            .unwrap()
            .rasterize((20, 20));
        let mask = roi.mask();
        let edge = mask_edge(&mask);
        let edge = edge.as_immut();
        // 紧贴对角线的掩膜内像素是边缘.
        assert!(is_inside(mask[(5, 4)]));
        assert_eq!(edge[(5, 4)], BOUNDARY);
        // 左下角像素的邻居均在掩膜内 (越界的不算).
        assert_eq!(edge[(9, 0)], BLANK);

        let t = trimmed(&roi);
        let t = t.as_immut();
        assert_eq!(t[(5, 4)], OUTSIDE);
        assert_eq!(t[(9, 0)], OUTSIDE);
        assert_eq!(t[(8, 1)], INSIDE);
        assert_eq!(t[(3, 3)], OUTSIDE);
    }

    #[test]
    fn test_n4_not_n8() {
        let roi = full(6, 6);
        let e = edge_map((6, 6), &[(1, 1), (2, 2), (3, 3), (3, 4)]);
        let c = label_components(e.as_immut(), &roi);
        assert_eq!(c.len(), 3);
        assert_eq!(c.total_points(), 4);
    }

    #[test]
    fn test_labels_column_major() {
        let roi = full(8, 8);
        // 第一个分量位于第 5 行但更靠左.
        let e = edge_map((8, 8), &[(1, 4), (1, 5), (5, 2), (6, 2)]);
        let c = label_components(e.as_immut(), &roi);
        let v: Vec<_> = c.iter().map(|c| (c.label(), c.points()[0])).collect();
        assert_eq!(v, vec![(1, (5, 2)), (2, (1, 4))]);
    }

    #[test]
    fn test_partition_and_disjoint() {
        let shape = (16, 16);
        // 伪随机图案.
        let e = OwnedMask::from_raw(Array2::from_shape_fn(shape, |(h, w)| {
            if (h * 7 + w * 13 + h * w) % 5 < 2 {
                BOUNDARY
            } else {
                BLANK
            }
        }));
        let roi = Quad::new([(1.0, 0.0), (16.0, 3.0), (14.0, 16.0), (0.0, 12.0)])
            .unwrap()
            .rasterize(shape);
        let keep = trimmed(&roi);
        let keep = keep.as_immut();
        let expected: HashSet<Idx2d> = e
            .as_immut()
            .pos_iter()
            .filter(|p| is_boundary(e.as_immut()[*p]) && is_inside(keep[*p]))
            .collect();

        let c = label_components(e.as_immut(), &roi);
        let mut seen = HashSet::new();
        for comp in &c {
            assert!(!comp.is_empty());
            for p in comp.points() {
                assert!(seen.insert(*p));
            }
        }
        assert_eq!(seen, expected);
        assert_eq!(label_components(e.as_immut(), &roi).len(), c.len());
    }
}
