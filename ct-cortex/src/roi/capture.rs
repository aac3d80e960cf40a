//! ROI 采集协议. 调用方把画布上的点击和 "确认" 操作依次交给 [`RoiCapture`],
//! 依次得到第一个和第二个 ROI.

use super::{AnchoredRoi, Quad};
use crate::consts::ROI_VERTICES;
use crate::Point;

/// 采集阶段.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CaptureStage {
    /// 正在采集第一个 ROI.
    CollectingFirst,

    /// 正在采集第二个 ROI.
    CollectingSecond,

    /// 两个 ROI 均已采集完成.
    Done,
}

/// 确认当前阶段时的错误. 出错后当前阶段已采集的点被清空, 需要重新点击.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum CaptureError {
    /// 点击次数不足 4 次.
    #[error("You need to specify 4 points")]
    NeedFourPoints,

    /// 第二个 ROI 与第一个 ROI 完全相同 (同一张切片, 同一组顶点).
    #[error("第二个 ROI 不能与第一个 ROI 相同")]
    SameAsFirst,
}

/// 两阶段 ROI 采集状态机.
///
/// `CollectingFirst -> CollectingSecond -> Done`.
#[derive(Clone, Debug)]
pub struct RoiCapture {
    stage: CaptureStage,
    pending: Vec<Point>,
    first: Option<AnchoredRoi>,
    second: Option<AnchoredRoi>,
}

impl Default for RoiCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl RoiCapture {
    /// 从第一阶段开始.
    pub fn new() -> Self {
        Self {
            stage: CaptureStage::CollectingFirst,
            pending: Vec::with_capacity(ROI_VERTICES),
            first: None,
            second: None,
        }
    }

    /// 当前阶段.
    #[inline]
    pub fn stage(&self) -> CaptureStage {
        self.stage
    }

    /// 当前阶段已采集的点.
    #[inline]
    pub fn pending(&self) -> &[Point] {
        &self.pending
    }

    /// 记录一次画布点击. 画布坐标按缩放倍率 `magnification` 换算回图像坐标.
    ///
    /// 当前阶段已满 4 个点, 或采集已经完成时, 点击被忽略并返回 `false`.
    pub fn click(&mut self, x: f64, y: f64, magnification: f64) -> bool {
        if self.stage == CaptureStage::Done || self.pending.len() >= ROI_VERTICES {
            return false;
        }
        self.pending.push((x / magnification, y / magnification));
        true
    }

    /// 确认当前阶段, ROI 附着在第 `slice` 张切片上. 成功时返回新的阶段.
    ///
    /// 点数不足或坐标非法时返回 `CaptureError::NeedFourPoints`,
    /// 第二个 ROI 与第一个相同时返回 `CaptureError::SameAsFirst`.
    /// 两种情况下当前阶段的点都被清空, 阶段保持不变.
    pub fn confirm(&mut self, slice: usize) -> Result<CaptureStage, CaptureError> {
        if self.stage == CaptureStage::Done {
            return Ok(self.stage);
        }
        let points = std::mem::take(&mut self.pending);
        let quad = Quad::try_from(points).map_err(|_| CaptureError::NeedFourPoints)?;
        let roi = AnchoredRoi::new(slice, quad);
        match self.stage {
            CaptureStage::CollectingFirst => {
                self.first = Some(roi);
                self.stage = CaptureStage::CollectingSecond;
            }
            CaptureStage::CollectingSecond => {
                if self.first.as_ref() == Some(&roi) {
                    return Err(CaptureError::SameAsFirst);
                }
                self.second = Some(roi);
                self.stage = CaptureStage::Done;
            }
            CaptureStage::Done => unreachable!(),
        }
        log::debug!("ROI 已确认, 切片 {slice}, 进入 {:?}", self.stage);
        Ok(self.stage)
    }

    /// 第一个 ROI.
    #[inline]
    pub fn first(&self) -> Option<&AnchoredRoi> {
        self.first.as_ref()
    }

    /// 第二个 ROI.
    #[inline]
    pub fn second(&self) -> Option<&AnchoredRoi> {
        self.second.as_ref()
    }

    /// 采集完成时, 取出两个 ROI.
    pub fn into_pair(self) -> Option<(AnchoredRoi, AnchoredRoi)> {
        self.first.zip(self.second)
    }
}

#[cfg(test)]
mod tests {
    use super::{CaptureError, CaptureStage, RoiCapture};

    fn click_square(c: &mut RoiCapture, magnification: f64) {
        for (x, y) in [(0.0, 0.0), (8.0, 0.0), (8.0, 8.0), (0.0, 8.0)] {
            assert!(c.click(x, y, magnification));
        }
    }

    #[test]
    fn test_capture_two_stages() {
        let mut c = RoiCapture::new();
        click_square(&mut c, 2.0);
        assert_eq!(c.pending()[2], (4.0, 4.0));
        assert_eq!(c.confirm(1), Ok(CaptureStage::CollectingSecond));

        click_square(&mut c, 1.0);
        assert_eq!(c.confirm(3), Ok(CaptureStage::Done));
        assert!(!c.click(1.0, 1.0, 1.0));

        let (a, b) = c.into_pair().unwrap();
        assert_eq!((a.slice, b.slice), (1, 3));
        assert_eq!(a.quad.points()[1], (4.0, 0.0));
        assert_eq!(b.quad.points()[1], (8.0, 0.0));
    }

    #[test]
    fn test_capture_need_four_points() {
        let mut c = RoiCapture::new();
        c.click(1.0, 1.0, 1.0);
        c.click(2.0, 1.0, 1.0);
        assert_eq!(c.confirm(0), Err(CaptureError::NeedFourPoints));
        assert_eq!(c.stage(), CaptureStage::CollectingFirst);
        assert!(c.pending().is_empty());
    }

    #[test]
    fn test_capture_fifth_click_ignored() {
        let mut c = RoiCapture::new();
        click_square(&mut c, 1.0);
        assert!(!c.click(100.0, 100.0, 1.0));
        assert_eq!(c.pending().len(), 4);
    }

    #[test]
    fn test_capture_same_as_first() {
        let mut c = RoiCapture::new();
        click_square(&mut c, 1.0);
        c.confirm(2).unwrap();
        click_square(&mut c, 1.0);
        assert_eq!(c.confirm(2), Err(CaptureError::SameAsFirst));
        assert_eq!(c.stage(), CaptureStage::CollectingSecond);

        // 同一组顶点但位于不同切片, 可以接受.
        click_square(&mut c, 1.0);
        assert_eq!(c.confirm(4), Ok(CaptureStage::Done));
    }
}
