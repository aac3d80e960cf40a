#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 基于 CT 切片堆栈, 测量两个四边形 ROI 之间骨层 (如软骨下骨)
//! 的平均厚度.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 流程
//!
//! 对 `[i0, i1]` 范围内的每张切片:
//!
//! 1. 按切片位置在两个 ROI 之间线性插值, 并栅格化为掩膜;
//! 2. 以标量阈值将掩膜内的像素分为骨 (白) 和软组织 (黑);
//! 3. 提取骨区域的单像素轮廓;
//! 4. 去除矩形最外圈和掩膜边缘上的轮廓像素, 按 4-相邻规则标记连通分量;
//! 5. 求最大两个分量之间的平均最近距离, 作为该切片的骨层厚度 (像素).
//!
//! 所有有效切片的厚度取平均后, 再乘以像素物理尺寸.
//!
//! # 注意
//!
//! 1. 在非期望情况下 (如索引越界), 程序会直接 panic, 而不会导致内存错误.
//! 2. 单张切片失败 (分量不足两个) 不会中止整体测量, 该切片仅被排除.
//!
//! # 模块
//!
//! - `data`: 切片堆栈, 切片视图, 显示范围.
//! - [`roi`]: 四边形 ROI, 栅格化掩膜, 插值, ROI 采集协议.
//! - [`segment`]: 阈值分割, 轮廓提取, 连通分量标记.
//! - [`thickness`]: 轮廓间距, 自适应阈值搜索, 切片汇总.

/// 二维索引 `(高, 宽)`, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引 `(z, 高, 宽)`, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 图像平面上的浮点坐标 `(x, y)`. `x` 对应列 (宽), `y` 对应行 (高).
pub type Point = (f64, f64);

type Predicate = fn(u8) -> bool;

type Area2d = Vec<Idx2d>;
type Areas2d = Vec<Area2d>;

/// 3D 切片堆栈基础数据结构.
mod data;

pub use data::{
    Calibration, CtStack, DisplayRange, ImgWriteVis, MaskSlice, MaskSliceMut, OwnedMask,
    OwnedScanSlice, PhysicalScale, ScanMirror, ScanSlice, ScanSliceMut, StackAttr,
};

pub mod consts;

pub mod roi;

pub mod segment;

pub mod thickness;

pub mod prelude;
