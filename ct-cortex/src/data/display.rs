#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 显示范围, 即查看器映射为纯黑 (`min`) 与纯白 (`max`) 的强度区间.
///
/// 该结构是只读的. 若要修改参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisplayRange {
    min: f64,
    max: f64,
}

impl DisplayRange {
    /// 构建显示范围.
    ///
    /// `min` 和 `max` 必须是有限值, 且 `min < max`, 否则返回 `None`.
    pub fn new(min: f64, max: f64) -> Option<DisplayRange> {
        if min.is_finite() && max.is_finite() && min < max {
            Some(Self { min, max })
        } else {
            None
        }
    }

    /// 下限.
    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 上限.
    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// 区间宽度.
    #[inline]
    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// 求在当前显示范围下, 强度值 `v` 对应的灰度图像素整数值 (0 <= value <= 255).
    ///
    /// 如果 `v` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn eval(&self, v: f64) -> Option<u8> {
        if !v.is_finite() {
            return None;
        }
        if v <= self.min {
            Some(u8::MIN)
        } else if v >= self.max {
            Some(u8::MAX)
        } else {
            // 255, not 256.
            Some((((v - self.min) / self.width()) * 255.0) as u8)
        }
    }
}

/// 线性标定 `calibrated = intercept + slope * raw`.
///
/// 与 DICOM 的 rescale intercept / slope 含义一致.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Calibration {
    /// 截距.
    pub intercept: f64,

    /// 斜率. 合法的标定要求斜率是非零有限值.
    pub slope: f64,
}

impl Calibration {
    /// 恒等标定.
    #[inline]
    pub const fn identity() -> Self {
        Self {
            intercept: 0.0,
            slope: 1.0,
        }
    }

    /// 标定是否可用于反算阈值边界.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.intercept.is_finite() && self.slope.is_finite() && self.slope != 0.0
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::{Calibration, DisplayRange};

    fn is_valid_init(min: f64, max: f64) -> bool {
        DisplayRange::new(min, max).is_some()
    }

    #[test]
    fn test_display_range_invalid_input() {
        assert!(!is_valid_init(0.0, -1.0));
        assert!(!is_valid_init(0.0, 0.0));
        assert!(!is_valid_init(f64::NAN, 1.0));
        assert!(!is_valid_init(0.0, f64::INFINITY));
    }

    #[test]
    fn test_display_range_generic() {
        // [60, 100]
        let r = DisplayRange::new(60.0, 100.0).unwrap();
        assert_eq!(r.eval(f64::NAN), None);
        assert_eq!(r.eval(f64::MIN), Some(0));
        assert_eq!(r.eval(f64::MAX), Some(255));

        assert_eq!(r.eval(50.0), Some(0));
        assert_eq!(r.eval(60.0), Some(0));
        assert_eq!(r.eval(60.1), Some(0));
        assert_eq!(r.eval(70.0).unwrap(), (255.0 * 0.25) as u8);
        assert_eq!(r.eval(80.0).unwrap(), (255.0 * 0.5) as u8);
        assert_eq!(r.eval(99.999), Some(254));
        assert_eq!(r.eval(100.0).unwrap(), u8::MAX);
    }

    #[test]
    fn test_calibration_valid() {
        assert!(Calibration::identity().is_valid());
        assert!(!Calibration {
            intercept: 0.0,
            slope: 0.0
        }
        .is_valid());
    }
}
