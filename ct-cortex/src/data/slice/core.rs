use super::iter::{ColPosIter, PosIter};
use super::ScanMirror;
use crate::{Area2d, Areas2d, Idx2d, Predicate};
use ndarray::iter::{Iter, IterMut};
use ndarray::{Array2, ArrayView2, ArrayViewMut2, Ix2};
use std::collections::{HashSet, VecDeque};
use std::ops::{Index, IndexMut};

/// 不可变、借用的二维字节网格 (二值图, 边缘图或 ROI 掩膜).
pub struct MaskSlice<'a> {
    /// 底层数据的轻量级视图.
    ///
    /// 这里有意把代码写死为 `ArrayView` 降低灵活性, 但使结构的意图更加明确.
    data: ArrayView2<'a, u8>,
}

impl Index<Idx2d> for MaskSlice<'_> {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

/// 可变、借用的二维字节网格.
pub struct MaskSliceMut<'a> {
    /// 底层数据的轻量级视图.
    data: ArrayViewMut2<'a, u8>,
}

/// 可变方法集合.
impl<'a> MaskSliceMut<'a> {
    /// 获得 **底层** 数据的一份可变 shallow copy.
    #[inline]
    pub fn array_view_mut(&mut self) -> ArrayViewMut2<u8> {
        self.data.view_mut()
    }

    /// 获取可以迭代并修改像素的迭代器.
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, u8, Ix2> {
        self.data.iter_mut()
    }

    /// 获取给定位置 (高, 宽) 的像素值, 并可就地修改. 越界时返回 `None`.
    #[inline]
    pub fn get_mut(&mut self, pos: Idx2d) -> Option<&mut u8> {
        self.data.get_mut(pos)
    }

    /// 将 `it` 中的每个索引对应的像素改为 `new`.
    pub fn fill_batch<I: IntoIterator<Item = Idx2d>>(&mut self, it: I, new: u8) {
        for pos in it.into_iter() {
            self[pos] = new;
        }
    }
}

impl Index<Idx2d> for MaskSliceMut<'_> {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx2d> for MaskSliceMut<'_> {
    #[inline]
    fn index_mut(&mut self, index: Idx2d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

/// mask 不可变方法集合.
macro_rules! impl_mask_slice_immut {
    ($life: lifetime, $slice: ty, $array: ty) => {
        /// 不可变方法集合.
        impl<$life> $slice {
            /// 直接初始化.
            #[inline]
            pub(crate) fn new(data: $array) -> Self {
                Self { data }
            }

            /// 获得 **底层** 数据的一份不可变 shallow copy.
            #[inline]
            pub fn array_view(&self) -> ArrayView2<u8> {
                self.data.view()
            }

            /// 获取可以迭代像素的迭代器.
            #[inline]
            pub fn iter(&self) -> Iter<'_, u8, Ix2> {
                self.data.iter()
            }

            /// 获取给定位置 (高, 宽) 的像素值. 越界时返回 `None`.
            #[inline]
            pub fn get(&self, pos: Idx2d) -> Option<&u8> {
                self.data.get(pos)
            }

            /// 网格的分辨率 (高, 宽).
            #[inline]
            pub fn shape(&self) -> Idx2d {
                let &[h, w] = self.data.shape() else {
                    unreachable!()
                };
                (h, w)
            }

            /// 网格的像素个数.
            #[inline]
            pub fn size(&self) -> usize {
                let (h, w) = self.shape();
                h * w
            }

            /// 判断一个索引是否合法 (未越界).
            #[inline]
            pub fn check(&self, (h, w): Idx2d) -> bool {
                let (h_len, w_len) = self.shape();
                h < h_len && w < w_len
            }

            /// 统计值为 `value` 的像素总个数.
            #[inline]
            pub fn count(&self, value: u8) -> usize {
                self.data.iter().filter(|&p| *p == value).count()
            }

            /// 获得一份不可变的 **本体** shallow copy.
            #[inline]
            pub fn shallow_copy(&self) -> MaskSlice {
                MaskSlice { data: self.array_view() }
            }

            /// 克隆自己, 获得一个拥有所有权的网格.
            pub fn to_owned(&self) -> OwnedMask {
                OwnedMask {
                    data: self.data.to_owned(),
                }
            }

            /// 获得网格的高.
            #[inline]
            pub fn height(&self) -> usize {
                self.shape().0
            }

            /// 获得网格的宽.
            #[inline]
            pub fn width(&self) -> usize {
                self.shape().1
            }

            /// 判断一个索引是否位于网格最外一圈.
            #[inline]
            pub fn is_at_border(&self, (h, w): Idx2d) -> bool {
                h == 0
                    || h.saturating_add(1) == self.height()
                    || w == 0
                    || w.saturating_add(1) == self.width()
            }

            /// 获得 `pos` 的 4-邻域像素索引. 保证返回的索引都不越界.
            pub fn n4_positions(&self, pos: Idx2d) -> Vec<Idx2d> {
                crate::segment::neighbour4(pos)
                    .into_iter()
                    .filter(|p| self.check(*p))
                    .collect()
            }

            /// 获得 `pos` 的 8-邻域像素索引. 保证返回的索引都不越界.
            pub fn n8_positions(&self, pos: Idx2d) -> Vec<Idx2d> {
                crate::segment::neighbour8(pos)
                    .into_iter()
                    .filter(|p| self.check(*p))
                    .collect()
            }

            /// 判断 `pos` 的 (未越界的) 8-邻域是否有满足谓词 `pred` 的像素.
            pub fn is_n8_having(&self, pos: Idx2d, mut pred: impl FnMut(u8) -> bool) -> bool {
                crate::segment::neighbour8(pos)
                    .into_iter()
                    .any(|p| matches!(self.get(p), Some(&v) if pred(v)))
            }

            /// 以行优先规则, 获取能迭代所有索引的迭代器.
            #[inline]
            pub fn pos_iter(&self) -> impl Iterator<Item = Idx2d> {
                PosIter::new(self.shape())
            }

            /// 以列优先规则 (先宽后高), 获取能迭代所有索引的迭代器.
            #[inline]
            pub fn col_pos_iter(&self) -> impl Iterator<Item = Idx2d> {
                ColPosIter::new(self.shape())
            }

            /// 以行优先规则, 获取能迭代所有 `(索引, 像素值)` 的迭代器.
            #[inline]
            pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &u8)> {
                self.data.indexed_iter()
            }

            /// 按照 4-相邻规则获取所有区域, 但种子范围和发现顺序由 `it` 指定.
            /// 两个像素 `p1` 和 `p2` 属于同一个区域, 当且仅当存在一条从 `p1` 到
            /// `p2` 的 4-相邻路径, 且路径上的所有像素 (包括 `p1` 和 `p2`)
            /// 都满足谓词 `pred`.
            ///
            /// 返回的区域按首次发现的顺序排列, 区域内部没有重复索引.
            pub fn areas_from_local<I: IntoIterator<Item = Idx2d>>(
                &self,
                it: I,
                pred: Predicate,
            ) -> Areas2d {
                let mut ans = Areas2d::with_capacity(2);
                let mut bfs_q = VecDeque::with_capacity(4);
                let mut set = HashSet::with_capacity(16);

                for pos in it.into_iter() {
                    if set.contains(&pos) || !pred(self[pos]) {
                        continue;
                    }
                    bfs_q.push_back(pos);
                    let mut this_area = Area2d::with_capacity(1);
                    while let Some(cur_pos) = bfs_q.pop_front() {
                        if !set.insert(cur_pos) {
                            continue;
                        }
                        this_area.push(cur_pos);

                        // bfs
                        for neigh in self.n4_positions(cur_pos) {
                            if pred(self[neigh]) && !set.contains(&neigh) {
                                bfs_q.push_back(neigh);
                            }
                        }
                    }
                    ans.push(this_area);
                }
                ans
            }
        }
    };
}
impl_mask_slice_immut!('a, MaskSlice<'a>, ArrayView2<'a, u8>);
impl_mask_slice_immut!('a, MaskSliceMut<'a>, ArrayViewMut2<'a, u8>);

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 拥有所有权的二维字节网格.
///
/// `OwnedMask` 仅提供到 `MaskSlice` 和 `MaskSliceMut`
/// 的轻量转换和底层数据移动, 不提供任何其它方法.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct OwnedMask {
    data: Array2<u8>,
}

impl OwnedMask {
    /// 创建形状为 `(h, w)`, 所有像素均为 `value` 的网格.
    #[inline]
    pub fn filled(shape: Idx2d, value: u8) -> Self {
        Self {
            data: Array2::from_elem(shape, value),
        }
    }

    /// 直接以底层数据初始化.
    #[inline]
    pub fn from_raw(data: Array2<u8>) -> Self {
        Self { data }
    }

    /// 获得不可变切片引用.
    #[inline]
    pub fn as_immut(&self) -> MaskSlice<'_> {
        MaskSlice::new(self.data.view())
    }

    /// 获得可变切片引用.
    #[inline]
    pub fn as_mutable(&mut self) -> MaskSliceMut<'_> {
        MaskSliceMut::new(self.data.view_mut())
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<u8> {
        self.data
    }
}

/// 不可变、借用的二维 CT 扫描切片 (强度值).
pub struct ScanSlice<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::CtStack`].
    ///
    /// 这里有意把代码写死为 `ArrayView` 降低灵活性, 但使结构的意图更加明确.
    data: ArrayView2<'a, f32>,
}

impl Index<Idx2d> for ScanSlice<'_> {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

/// 可变、借用的二维 CT 扫描切片.
pub struct ScanSliceMut<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::CtStack`].
    data: ArrayViewMut2<'a, f32>,
}

/// 可变方法集合.
impl<'a> ScanSliceMut<'a> {
    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut2<f32> {
        self.data.view_mut()
    }

    /// 获取可以迭代并修改像素的迭代器.
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, f32, Ix2> {
        self.data.iter_mut()
    }

    /// 获取给定位置 (高, 宽) 的像素值, 并可就地修改. 越界时返回 `None`.
    #[inline]
    pub fn get_mut(&mut self, pos: Idx2d) -> Option<&mut f32> {
        self.data.get_mut(pos)
    }

    /// 用 `mirror` 覆写原本 `self` 的内容.
    ///
    /// 如果 `mirror` 大小与 `self.size()` 不符, 则程序 panic.
    pub fn resume(&mut self, mirror: &ScanMirror) {
        assert_eq!(self.size(), mirror.0.len(), "镜像大小不符");
        for (r, w) in mirror.0.iter().zip(self.iter_mut()) {
            *w = *r;
        }
    }
}

impl Index<Idx2d> for ScanSliceMut<'_> {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx2d> for ScanSliceMut<'_> {
    #[inline]
    fn index_mut(&mut self, index: Idx2d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

/// scan 不可变方法集合.
macro_rules! impl_scan_slice_immut {
    ($life: lifetime, $scan: ty, $array: ty) => {
        /// 不可变方法集合.
        impl<$life> $scan {
            /// 直接初始化.
            #[inline]
            pub(crate) fn new(data: $array) -> Self {
                Self { data }
            }

            /// 获得数据的一份不可变 shallow copy.
            #[inline]
            pub fn data(&self) -> ArrayView2<f32> {
                self.data.view()
            }

            /// 获取可以迭代像素的迭代器.
            #[inline]
            pub fn iter(&self) -> Iter<'_, f32, Ix2> {
                self.data.iter()
            }

            /// 获取给定位置 (高, 宽) 的像素值. 越界时返回 `None`.
            #[inline]
            pub fn get(&self, pos: Idx2d) -> Option<&f32> {
                self.data.get(pos)
            }

            /// 图像的分辨率 (高, 宽).
            #[inline]
            pub fn shape(&self) -> Idx2d {
                let &[h, w] = self.data.shape() else {
                    unreachable!()
                };
                (h, w)
            }

            /// 图像的像素个数.
            #[inline]
            pub fn size(&self) -> usize {
                let (h, w) = self.shape();
                h * w
            }

            /// 获取拥有所有权的镜像, 供以后可能的恢复.
            #[inline]
            pub fn mirror(&self) -> ScanMirror {
                self.into()
            }

            /// 克隆自己, 获得一个拥有所有权的切片对象.
            pub fn to_owned(&self) -> OwnedScanSlice {
                OwnedScanSlice {
                    data: self.data.to_owned(),
                }
            }

            /// 以行优先规则, 获取能迭代图像所有 `(索引, 强度值)` 的迭代器.
            #[inline]
            pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &f32)> {
                self.data.indexed_iter()
            }

            /// 获取切片中有限强度值的 `(最小值, 最大值)`. 不存在有限值时返回 `None`.
            pub fn value_range(&self) -> Option<(f32, f32)> {
                self.data
                    .iter()
                    .copied()
                    .filter(|v| v.is_finite())
                    .fold(None, |acc, v| match acc {
                        None => Some((v, v)),
                        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                    })
            }
        }
    };
}

impl_scan_slice_immut!('a, ScanSlice<'a>, ArrayView2<'a, f32>);
impl_scan_slice_immut!('a, ScanSliceMut<'a>, ArrayViewMut2<'a, f32>);

/// 拥有所有权的二维 CT 扫描切片.
///
/// `OwnedScanSlice` 仅提供到 `ScanSlice` 和 `ScanSliceMut`
/// 的轻量转换和底层数据移动, 不提供任何其它方法.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OwnedScanSlice {
    data: Array2<f32>,
}

impl OwnedScanSlice {
    /// 直接以底层数据初始化.
    #[inline]
    pub fn from_raw(data: Array2<f32>) -> Self {
        Self { data }
    }

    /// 获得不可变切片引用.
    #[inline]
    pub fn as_immutable(&self) -> ScanSlice<'_> {
        ScanSlice::new(self.data.view())
    }

    /// 获得可变切片引用.
    #[inline]
    pub fn as_mutable(&mut self) -> ScanSliceMut<'_> {
        ScanSliceMut::new(self.data.view_mut())
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<f32> {
        self.data
    }
}
