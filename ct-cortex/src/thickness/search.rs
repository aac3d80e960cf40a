use super::InputError;
use crate::{Calibration, DisplayRange};
use num::ToPrimitive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 阈值及其闭区间 `[min, max]`.
///
/// 满足 `min <= value <= max`. 搜索过程中区间只会收缩.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ThresholdState {
    value: i32,
    min: i32,
    max: i32,
}

/// 一次失败后的调整结果.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SearchStep {
    /// 阈值已调整为新值.
    Adjusted(i32),

    /// 区间已无法继续调整.
    Exhausted,
}

/// 自适应搜索的状态.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SearchState {
    /// 仍在调整阈值.
    Searching,

    /// 在当前阈值下得到了有效间距.
    Converged(f64),

    /// 搜索区间耗尽, 没有得到有效间距.
    Exhausted,
}

impl ThresholdState {
    /// 直接初始化. 不满足 `min <= value <= max` 时返回 `Err`.
    pub fn new(value: i32, min: i32, max: i32) -> Result<Self, InputError> {
        let s = Self { value, min, max };
        if s.is_consistent() {
            Ok(s)
        } else {
            Err(InputError::BadThreshold)
        }
    }

    /// 由显示范围和线性标定推出阈值区间, 初始阈值取区间中点 (整数除法).
    ///
    /// 每个边界为 `trunc(trunc(trunc(display) + intercept) / slope)`.
    /// 标定不可用, 边界超出 `i32` 范围或推出的区间为空 (如斜率为负) 时返回 `Err`.
    pub fn from_display_range(range: DisplayRange, cal: Calibration) -> Result<Self, InputError> {
        if !cal.is_valid() {
            return Err(InputError::BadThreshold);
        }
        let bound = |d: f64| {
            let raw = (d.trunc() + cal.intercept).trunc();
            (raw / cal.slope).trunc().to_i32().ok_or(InputError::BadThreshold)
        };
        let (min, max) = (bound(range.min())?, bound(range.max())?);
        let value = (i64::from(min) + i64::from(max)) / 2;
        // `min <= value <= max` 时 value 必在 i32 范围内.
        Self::new(value.to_i32().ok_or(InputError::BadThreshold)?, min, max)
    }

    /// 保持区间不变, 修改阈值. 新阈值不在区间内时返回 `Err`.
    pub fn with_value(self, value: i32) -> Result<Self, InputError> {
        Self::new(value, self.min, self.max)
    }

    /// 当前阈值.
    #[inline]
    pub fn value(&self) -> i32 {
        self.value
    }

    /// 区间下限.
    #[inline]
    pub fn min(&self) -> i32 {
        self.min
    }

    /// 区间上限.
    #[inline]
    pub fn max(&self) -> i32 {
        self.max
    }

    /// 是否满足 `min <= value <= max`.
    #[inline]
    pub fn is_consistent(&self) -> bool {
        self.min <= self.value && self.value <= self.max
    }

    /// 区间内的整数个数, 即最多可能尝试的阈值个数.
    #[inline]
    pub fn span(&self) -> u64 {
        (i64::from(self.max) - i64::from(self.min) + 1) as u64
    }

    /// 当前阈值下测量失败后, 向区间中心方向移动一步并收缩区间.
    ///
    /// - 阈值更靠近下限且未到下限: 阈值加 1, 下限随之上移到阈值处;
    /// - 否则若阈值未到上限: 阈值减 1, 上限随之下移到阈值处;
    /// - 否则区间耗尽, 状态保持不变.
    pub fn step_after_failure(&mut self) -> SearchStep {
        let (v, lo, hi) = (
            i64::from(self.value),
            i64::from(self.min),
            i64::from(self.max),
        );
        if v - lo < hi - v && self.value > self.min {
            self.value += 1;
            self.min = self.value;
        } else if v - lo >= hi - v && self.value < self.max {
            self.value -= 1;
            self.max = self.value;
        } else {
            return SearchStep::Exhausted;
        }
        SearchStep::Adjusted(self.value)
    }
}
