use super::{SliceError, SliceResult};
use crate::consts::RASTER_OFFSET;
use crate::segment::{Component, Components};
use crate::Idx2d;

#[inline]
fn dist_sq((a, b): Idx2d, (c, d): Idx2d) -> f64 {
    let (dh, dw) = (a.abs_diff(c) as f64, b.abs_diff(d) as f64);
    dh * dh + dw * dw
}

/// 按标签顺序单次遍历, 选出最大和第二大的分量. 大小相同时保留先发现的分量.
///
/// 分量不足两个时返回 `None`.
pub(crate) fn top_two(components: &Components) -> Option<(&Component, &Component)> {
    let (largest, second) = components.iter().fold(
        (None, None),
        |(largest, second): (Option<&Component>, Option<&Component>), c| match largest {
            Some(l) if c.len() <= l.len() => match second {
                Some(s) if c.len() <= s.len() => (largest, second),
                _ => (largest, Some(c)),
            },
            _ => (Some(c), largest),
        },
    );
    largest.zip(second)
}

/// 两个主要轮廓之间的平均间距 (像素).
///
/// 对最大分量的每个像素, 求它到第二大分量的最近欧氏距离, 加上 1 像素的补偿后累加,
/// 最后除以最大分量的像素数. 距离只沿 "最大到第二大" 一个方向计算.
///
/// 分量不足两个时返回 `SliceError::TooFewComponents`.
pub fn contour_gap(components: &Components) -> SliceResult<f64> {
    let (largest, second) =
        top_two(components).ok_or(SliceError::TooFewComponents(components.len()))?;
    let total: f64 = largest
        .points()
        .iter()
        .map(|&p| {
            let nearest = second
                .points()
                .iter()
                .map(|&q| dist_sq(p, q))
                .fold(f64::INFINITY, f64::min);
            nearest.sqrt() + RASTER_OFFSET
        })
        .sum();
    Ok(total / largest.len() as f64)
}
