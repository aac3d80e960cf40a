use super::distance::contour_gap;
use super::{
    InputError, MeasureError, MeasureResult, MeasureSpec, Mode, SearchState, SearchStep,
    SliceResult, ThresholdState,
};
use crate::roi::{Quad, RoiMask};
use crate::segment::{label_components, paint_threshold, threshold, BoundaryExtractor, Outline};
use crate::{CtStack, DisplayRange, PhysicalScale, ScanMirror, ScanSlice, StackAttr};
use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "serde")]
use serde::Serialize;

/// 批量测量的汇总结果. 只能由 [`SliceAggregator`] 产生, 至少含一张有效切片.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Thickness {
    title: String,

    /// 有效切片的像素间距之和.
    total_pixels: f64,
    valid: usize,
    excluded: usize,
    scale: PhysicalScale,
}

impl Thickness {
    /// 图像标题.
    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// 有效切片数.
    #[inline]
    pub fn valid_slices(&self) -> usize {
        self.valid
    }

    /// 被排除的切片数.
    #[inline]
    pub fn excluded_slices(&self) -> usize {
        self.excluded
    }

    /// 以像素为单位的平均厚度.
    #[inline]
    pub fn average_pixels(&self) -> f64 {
        self.total_pixels / self.valid as f64
    }

    /// 平均物理厚度.
    #[inline]
    pub fn average(&self) -> f64 {
        self.average_pixels() * self.scale.in_plane
    }

    /// 物理深度: 有效切片数乘以切片间距.
    #[inline]
    pub fn depth(&self) -> f64 {
        self.valid as f64 * self.scale.inter_slice
    }

    /// 物理单位.
    #[inline]
    pub fn unit(&self) -> &str {
        &self.scale.unit
    }
}

impl fmt::Display for Thickness {
    /// 单行报告. 数值按最短可回读形式输出, 整数值保留 `.0`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Image: {} Average thickness: {:?} {} depth: {:?} {}",
            self.title,
            self.average(),
            self.unit(),
            self.depth(),
            self.unit()
        )
    }
}

/// 预览结果.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Preview {
    /// 在 `state` 的阈值下得到了有效间距 `gap` (像素).
    Converged {
        /// 像素间距.
        gap: f64,

        /// 收敛时的阈值状态.
        state: ThresholdState,
    },

    /// 阈值区间耗尽.
    Exhausted {
        /// 耗尽时的阈值状态.
        state: ThresholdState,
    },
}

impl Preview {
    /// 预览结束时的阈值状态, 供调用方同步阈值控件.
    pub fn state(&self) -> ThresholdState {
        match self {
            Self::Converged { state, .. } | Self::Exhausted { state } => *state,
        }
    }
}

/// 按运行模式得到的结果.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// 批量模式.
    Batch(Thickness),

    /// 预览模式.
    Preview(Preview),
}

/// 预览着色所需的全部信息. 与 [`SliceAggregator`] 分离,
/// 以便在聚合器释放对堆栈的借用之后再修改堆栈.
#[derive(Clone, Debug)]
pub struct PreviewPaint {
    slice: usize,
    roi: RoiMask,
    threshold: i32,
    range: DisplayRange,
}

impl PreviewPaint {
    /// 被着色的切片索引.
    #[inline]
    pub fn slice(&self) -> usize {
        self.slice
    }

    /// 对堆栈中的预览切片着色, 返回着色前的镜像.
    /// 之后可用 [`crate::ScanSliceMut::resume`] 复原.
    pub fn apply(&self, stack: &mut CtStack) -> ScanMirror {
        let mut scan = stack.slice_at_mut(self.slice);
        let mirror = scan.mirror();
        paint_threshold(&mut scan, &self.roi, self.threshold, self.range);
        mirror
    }
}

/// 单张切片的测量结果.
struct SliceReport {
    slice: usize,
    gap: SliceResult<f64>,
}

/// 切片汇总器. 负责 ROI 插值, 持有阈值状态, 并汇总各切片结果.
pub struct SliceAggregator<'a, E = Outline> {
    stack: &'a CtStack,
    spec: MeasureSpec,
    extractor: E,

    /// 范围内的切片数.
    count: usize,
}

impl<'a> SliceAggregator<'a, Outline> {
    /// 以默认的轮廓提取实现创建汇总器. 输入不合法时返回 `Err`.
    pub fn new(stack: &'a CtStack, spec: MeasureSpec) -> Result<Self, InputError> {
        Self::with_extractor(stack, spec, Outline)
    }
}

impl<'a, E: BoundaryExtractor> SliceAggregator<'a, E> {
    /// 以给定的轮廓提取实现创建汇总器.
    ///
    /// 要求堆栈非空, `first.slice <= second.slice < len_z`,
    /// 像素物理尺寸为正的有限值, 阈值状态合法.
    pub fn with_extractor(
        stack: &'a CtStack,
        spec: MeasureSpec,
        extractor: E,
    ) -> Result<Self, InputError> {
        let len = stack.len_z();
        if len == 0 {
            return Err(InputError::EmptyStack);
        }
        if let Some(slice) = [spec.first.slice, spec.second.slice]
            .into_iter()
            .find(|s| *s >= len)
        {
            return Err(InputError::SliceOutOfRange { slice, len });
        }
        if spec.first.slice > spec.second.slice {
            return Err(InputError::ReversedRange {
                first: spec.first.slice,
                second: spec.second.slice,
            });
        }
        if !spec.scale.is_valid() {
            return Err(InputError::BadScale);
        }
        if !spec.threshold.is_consistent() {
            return Err(InputError::BadThreshold);
        }
        let count = spec.second.slice - spec.first.slice + 1;
        Ok(Self {
            stack,
            spec,
            extractor,
            count,
        })
    }

    /// 范围内的切片数 `i1 - i0 + 1`.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// 测量参数.
    #[inline]
    pub fn spec(&self) -> &MeasureSpec {
        &self.spec
    }

    /// 当前阈值状态.
    #[inline]
    pub fn threshold(&self) -> ThresholdState {
        self.spec.threshold
    }

    /// 修改阈值, 区间保持不变. 不在区间内时返回 `Err`.
    pub fn set_threshold(&mut self, value: i32) -> Result<(), InputError> {
        self.spec.threshold = self.spec.threshold.with_value(value)?;
        Ok(())
    }

    /// 范围内第 `i` 张切片 (相对于 `first.slice`) 上的 ROI.
    #[inline]
    pub fn interpolate(&self, i: usize) -> Quad {
        Quad::interpolate(&self.spec.first.quad, &self.spec.second.quad, self.count, i)
    }

    /// 以阈值 `t` 测量范围内第 `i` 张切片的像素间距.
    ///
    /// `i >= count()` 时 panic.
    pub fn measure_slice(&self, i: usize, t: i32) -> SliceResult<f64> {
        assert!(i < self.count, "切片 {i} 超出测量范围");
        self.measure_on(&self.stack.slice_at(self.spec.first.slice + i), i, t)
    }

    fn measure_on(&self, scan: &ScanSlice, i: usize, t: i32) -> SliceResult<f64> {
        let roi = self.interpolate(i).rasterize(scan.shape());
        let binary = threshold(scan, &roi, t);
        let boundary = self.extractor.outline(binary.as_immut());
        let components = label_components(boundary.as_immut(), &roi);
        contour_gap(&components)
    }

    #[inline]
    fn range(&self) -> Range<usize> {
        self.spec.first.slice..self.spec.second.slice + 1
    }

    #[cfg(feature = "rayon")]
    fn map_range<T, F>(&self, op: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize, ScanSlice) -> T + Sync + Send,
    {
        self.stack.par_map_slices(self.range(), op)
    }

    #[cfg(not(feature = "rayon"))]
    fn map_range<T, F>(&self, op: F) -> Vec<T>
    where
        F: Fn(usize, ScanSlice) -> T,
    {
        self.stack.map_slices(self.range(), op)
    }

    /// 测量范围内的每张切片. 被取消时返回 `None`.
    fn reports(&self, cancel: Option<&AtomicBool>) -> Option<Vec<SliceReport>> {
        let t = self.spec.threshold.value();
        let i0 = self.spec.first.slice;
        self.map_range(|slice, scan| {
            if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
                return None;
            }
            let gap = self.measure_on(&scan, slice - i0, t);
            log::debug!("切片 {slice}: {gap:?}");
            Some(SliceReport { slice, gap })
        })
        .into_iter()
        .collect()
    }

    fn aggregate(&self, reports: Vec<SliceReport>) -> MeasureResult<Thickness> {
        let mut total_pixels = 0.0;
        let mut valid = 0;
        let mut excluded = 0;
        for r in reports {
            match r.gap {
                Ok(gap) => {
                    total_pixels += gap;
                    valid += 1;
                }
                Err(e) => {
                    log::warn!(
                        "切片 {} 已被排除: {e}. 可能是阈值过大或过小, \
                         或 ROI 边缘与骨外壳之间没有足够的间隙",
                        r.slice
                    );
                    excluded += 1;
                }
            }
        }
        if valid == 0 {
            return Err(MeasureError::AllSlicesInvalid {
                slices: self.count,
            });
        }
        let ans = Thickness {
            title: self.spec.title.clone(),
            total_pixels,
            valid,
            excluded,
            scale: self.spec.scale.clone(),
        };
        log::info!("{ans} (排除 {excluded} 张切片)");
        Ok(ans)
    }

    /// 批量测量. 各切片互相独立 (打开 `rayon` feature 时并行),
    /// 结果按切片顺序汇总. 所有切片都失败时返回 `Err`.
    pub fn run_batch(&self) -> MeasureResult<Thickness> {
        let reports = self.reports(None).ok_or(MeasureError::Cancelled)?;
        self.aggregate(reports)
    }

    /// 同 [`Self::run_batch`], 但每张切片开始前检查 `cancel`.
    /// `cancel` 被置为 `true` 后返回 `MeasureError::Cancelled`.
    pub fn run_batch_with(&self, cancel: &AtomicBool) -> MeasureResult<Thickness> {
        let reports = self.reports(Some(cancel)).ok_or(MeasureError::Cancelled)?;
        self.aggregate(reports)
    }

    /// 预览: 只测量范围内的最后一张切片. 失败时按 [`ThresholdState::step_after_failure`]
    /// 调整阈值并重试, 直到成功或区间耗尽. 调整后的阈值保留在汇总器中.
    pub fn run_preview(&mut self) -> Preview {
        let i = self.count - 1;
        let stack = self.stack;
        let scan = stack.slice_at(self.spec.first.slice + i);

        let mut search = SearchState::Searching;
        while search == SearchState::Searching {
            search = match self.measure_on(&scan, i, self.spec.threshold.value()) {
                Ok(gap) => SearchState::Converged(gap),
                Err(e) => match self.spec.threshold.step_after_failure() {
                    SearchStep::Adjusted(v) => {
                        log::debug!("预览失败 ({e}), 阈值调整为 {v}");
                        SearchState::Searching
                    }
                    SearchStep::Exhausted => SearchState::Exhausted,
                },
            };
        }

        let state = self.spec.threshold;
        match search {
            SearchState::Converged(gap) => Preview::Converged { gap, state },
            _ => Preview::Exhausted { state },
        }
    }

    /// 按 `spec().mode` 运行.
    pub fn run(&mut self) -> MeasureResult<Outcome> {
        match self.spec.mode {
            Mode::Batch => self.run_batch().map(Outcome::Batch),
            Mode::Preview => Ok(Outcome::Preview(self.run_preview())),
        }
    }

    /// 以当前阈值对预览切片着色的计划. 堆栈没有可用的显示范围时返回 `None`.
    pub fn preview_paint(&self) -> Option<PreviewPaint> {
        let i = self.count - 1;
        Some(PreviewPaint {
            slice: self.spec.first.slice + i,
            roi: self.interpolate(i).rasterize(self.stack.slice_shape()),
            threshold: self.spec.threshold.value(),
            range: self.stack.display_range()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Outcome, Preview, SliceAggregator};
    use crate::consts::gray::BLANK;
    use crate::roi::{AnchoredRoi, Quad};
    use crate::segment::{label_components, threshold, BoundaryExtractor, Outline};
    use crate::thickness::{InputError, MeasureError, MeasureSpec, Mode, SliceError, ThresholdState};
    use crate::{CtStack, MaskSlice, OwnedMask, PhysicalScale};
    use ndarray::Array2;
    use std::sync::atomic::AtomicBool;

    /// 圆环 (外半径 6, 内半径 2.5, 圆心 (10, 10)) 在 20x20 切片上的像素间距.
    const RING_GAP: f64 = 3.0487846415677766;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn ring(bone: f32, inner: f64) -> Array2<f32> {
        Array2::from_shape_fn((20, 20), |(h, w)| {
            let (dh, dw) = (h as f64 - 10.0, w as f64 - 10.0);
            let d = dh * dh + dw * dw;
            if inner * inner <= d && d <= 36.0 {
                bone
            } else {
                100.0
            }
        })
    }

    fn blank() -> Array2<f32> {
        Array2::from_elem((20, 20), 100.0)
    }

    fn stack_of(slices: Vec<Array2<f32>>) -> CtStack {
        CtStack::from_slices(slices, [2.0, 0.5, 0.5], "mm").unwrap()
    }

    fn square(lo: f64, hi: f64) -> Quad {
        Quad::new([(lo, lo), (hi, lo), (hi, hi), (lo, hi)]).unwrap()
    }

    fn spec(first: usize, second: usize, state: ThresholdState) -> MeasureSpec {
        MeasureSpec {
            title: "ring".to_string(),
            first: AnchoredRoi::new(first, square(0.0, 20.0)),
            second: AnchoredRoi::new(second, square(0.0, 20.0)),
            threshold: state,
            scale: PhysicalScale::new(0.5, 2.0, "mm"),
            mode: Mode::Batch,
        }
    }

    fn mid() -> ThresholdState {
        ThresholdState::new(500, 0, 1000).unwrap()
    }

    /// 被排除切片的 `warn!` 输出到终端.
    fn init_log() {
        let _ = simple_logger::SimpleLogger::new()
            .with_level(log::LevelFilter::Warn)
            .init();
    }

    #[test]
    fn test_ring_end_to_end() {
        let stack = stack_of(vec![ring(1000.0, 2.5); 5]);
        let agg = SliceAggregator::new(&stack, spec(0, 4, mid())).unwrap();
        assert_eq!(agg.count(), 5);
        for i in 0..5 {
            assert!(f64_eq(agg.measure_slice(i, 500).unwrap(), RING_GAP));
        }
        // 外轮廓和内轮廓.
        let scan = stack.slice_at(2);
        let roi = agg.interpolate(2).rasterize(scan.shape());
        let binary = threshold(&scan, &roi, 500);
        let boundary = Outline.outline(binary.as_immut());
        let components = label_components(boundary.as_immut(), &roi);
        assert_eq!(components.len(), 2);
        let sizes: Vec<_> = components.iter().map(|c| c.len()).collect();
        assert_eq!(sizes, [44, 24]);

        let t = agg.run_batch().unwrap();
        assert_eq!((t.valid_slices(), t.excluded_slices()), (5, 0));
        assert!(f64_eq(t.average_pixels(), RING_GAP));
        assert!(f64_eq(t.average(), RING_GAP * 0.5));
        assert!(f64_eq(t.depth(), 10.0));
        let line = t.to_string();
        assert!(line.starts_with("Image: ring Average thickness: 1.52439232"));
        assert!(line.ends_with(" mm depth: 10.0 mm"));
    }

    #[test]
    fn test_degenerate_range() {
        let stack = stack_of(vec![blank(), blank(), ring(1000.0, 2.5), blank()]);
        let agg = SliceAggregator::new(&stack, spec(2, 2, mid())).unwrap();
        assert_eq!(agg.interpolate(0), agg.spec().first.quad);
        let t = agg.run_batch().unwrap();
        assert_eq!(t.valid_slices(), 1);
        assert!(f64_eq(t.depth(), 2.0));
    }

    #[test]
    fn test_partially_invalid() {
        init_log();
        let stack = stack_of(vec![ring(1000.0, 2.5), blank(), ring(1000.0, 2.5), blank()]);
        let t = SliceAggregator::new(&stack, spec(0, 3, mid()))
            .unwrap()
            .run_batch()
            .unwrap();
        assert_eq!((t.valid_slices(), t.excluded_slices()), (2, 2));
        assert!(f64_eq(t.average_pixels(), RING_GAP));
        assert!(f64_eq(t.depth(), 4.0));
    }

    #[test]
    fn test_solid_disc_is_invalid() {
        init_log();
        // 实心圆只有一条轮廓.
        let stack = stack_of(vec![ring(1000.0, 0.0); 3]);
        let agg = SliceAggregator::new(&stack, spec(0, 2, mid())).unwrap();
        assert_eq!(agg.measure_slice(1, 500), Err(SliceError::TooFewComponents(1)));
        assert_eq!(
            agg.run_batch(),
            Err(MeasureError::AllSlicesInvalid { slices: 3 })
        );
    }

    #[test]
    fn test_empty_mask() {
        let stack = stack_of(vec![ring(1000.0, 2.5); 2]);
        let mut s = spec(0, 1, mid());
        s.first.quad = square(30.0, 40.0);
        s.second.quad = square(30.0, 40.0);
        let agg = SliceAggregator::new(&stack, s).unwrap();
        assert_eq!(agg.measure_slice(0, 500), Err(SliceError::TooFewComponents(0)));
        assert_eq!(
            agg.run_batch(),
            Err(MeasureError::AllSlicesInvalid { slices: 2 })
        );
    }

    #[test]
    fn test_input_validation() {
        let stack = stack_of(vec![blank(); 3]);
        let new = |s| SliceAggregator::new(&stack, s).err();
        assert_eq!(
            new(spec(0, 3, mid())),
            Some(InputError::SliceOutOfRange { slice: 3, len: 3 })
        );
        assert_eq!(
            new(spec(2, 1, mid())),
            Some(InputError::ReversedRange {
                first: 2,
                second: 1
            })
        );
        let mut s = spec(0, 1, mid());
        s.scale.inter_slice = 0.0;
        assert_eq!(new(s), Some(InputError::BadScale));
        let mut s = spec(0, 1, mid());
        s.scale.in_plane = f64::NAN;
        assert_eq!(new(s), Some(InputError::BadScale));

        let empty = CtStack::from_shape_vec((0, 20, 20), vec![], [1.0; 3], "pixel").unwrap();
        assert_eq!(
            SliceAggregator::new(&empty, spec(0, 0, mid())).err(),
            Some(InputError::EmptyStack)
        );
    }

    #[test]
    fn test_cancelled() {
        let stack = stack_of(vec![ring(1000.0, 2.5); 4]);
        let agg = SliceAggregator::new(&stack, spec(0, 3, mid())).unwrap();
        assert_eq!(
            agg.run_batch_with(&AtomicBool::new(true)),
            Err(MeasureError::Cancelled)
        );
        assert!(agg.run_batch_with(&AtomicBool::new(false)).is_ok());
    }

    #[test]
    fn test_preview_converges() {
        let stack = stack_of(vec![blank(), ring(600.0, 2.5), ring(600.0, 2.5)]);
        let state = ThresholdState::new(601, 0, 1000).unwrap();
        let mut agg = SliceAggregator::new(&stack, spec(0, 2, state)).unwrap();
        match agg.run_preview() {
            Preview::Converged { gap, state } => {
                assert!(f64_eq(gap, RING_GAP));
                assert_eq!((state.value(), state.min(), state.max()), (600, 0, 600));
            }
            p => panic!("unexpected {p:?}"),
        }
        assert_eq!(agg.threshold().value(), 600);
    }

    #[test]
    fn test_preview_exhausted() {
        let stack = stack_of(vec![ring(1000.0, 2.5), blank()]);
        let state = ThresholdState::new(5, 0, 10).unwrap();
        let mut s = spec(0, 1, state);
        s.mode = Mode::Preview;
        let mut agg = SliceAggregator::new(&stack, s).unwrap();
        let expected = ThresholdState::new(4, 0, 4).unwrap();
        assert_eq!(
            agg.run().unwrap(),
            Outcome::Preview(Preview::Exhausted { state: expected })
        );
    }

    #[test]
    fn test_preview_paint() {
        let mut stack = stack_of(vec![blank(), ring(1000.0, 2.5)]);
        let before = stack.clone();
        let paint = SliceAggregator::new(&stack, spec(0, 1, mid()))
            .unwrap()
            .preview_paint()
            .unwrap();
        assert_eq!(paint.slice(), 1);

        let mirror = paint.apply(&mut stack);
        assert_eq!(stack[(1, 10, 4)], 1000.0);
        assert_eq!(stack[(1, 10, 10)], 100.0);
        assert_eq!(stack[(0, 10, 4)], 100.0);

        stack.slice_at_mut(1).resume(&mirror);
        assert_eq!(stack.data(), before.data());
    }

    #[test]
    fn test_custom_extractor() {
        let stack = stack_of(vec![ring(1000.0, 2.5); 2]);
        fn nothing(b: MaskSlice) -> OwnedMask {
            OwnedMask::filled(b.shape(), BLANK)
        }
        let agg = SliceAggregator::with_extractor(&stack, spec(0, 1, mid()), nothing).unwrap();
        assert!(agg.run_batch().is_err());
    }
}
