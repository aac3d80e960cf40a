use crate::Idx2d;

/// 行优先索引迭代器.
///
/// 虽然如下函数也能实现相同的功能:
///
/// ```
/// type Idx2d = (usize, usize);
///
/// fn pos_iter_auto((h, w): Idx2d) -> impl Iterator<Item = Idx2d> {
///     (0..h).flat_map(move |first| (0..w).map(move |second| (first, second)))
/// }
///
/// // ...
/// ```
///
/// 但该迭代器对象占用的空间是手写 `PosIter` 的三倍. 因此为性能考虑,
/// 我们保留该结构.
#[derive(Debug)]
pub struct PosIter {
    cur_h: usize,
    cur_w: usize,
    h: usize,
    w: usize,
}

impl PosIter {
    #[inline]
    pub fn new((h, w): Idx2d) -> Self {
        Self {
            cur_h: 0,
            cur_w: 0,
            h,
            w,
        }
    }
}

impl Iterator for PosIter {
    type Item = Idx2d;

    fn next(&mut self) -> Option<Self::Item> {
        if self.h == 0 || self.w == 0 || self.cur_h == self.h {
            return None;
        }
        let ret_pos = (self.cur_h, self.cur_w);
        if self.cur_w + 1 == self.w {
            self.cur_w = 0;
            self.cur_h += 1;
        } else {
            self.cur_w += 1;
        }
        Some(ret_pos)
    }
}

/// 列优先索引迭代器: 外层遍历宽 (x), 内层遍历高 (y).
///
/// 连通分量标号按照该顺序发现种子.
#[derive(Debug)]
pub struct ColPosIter {
    cur_h: usize,
    cur_w: usize,
    h: usize,
    w: usize,
}

impl ColPosIter {
    #[inline]
    pub fn new((h, w): Idx2d) -> Self {
        Self {
            cur_h: 0,
            cur_w: 0,
            h,
            w,
        }
    }
}

impl Iterator for ColPosIter {
    type Item = Idx2d;

    fn next(&mut self) -> Option<Self::Item> {
        if self.h == 0 || self.w == 0 || self.cur_w == self.w {
            return None;
        }
        let ret_pos = (self.cur_h, self.cur_w);
        if self.cur_h + 1 == self.h {
            self.cur_h = 0;
            self.cur_w += 1;
        } else {
            self.cur_h += 1;
        }
        Some(ret_pos)
    }
}
