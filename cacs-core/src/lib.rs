#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 对冠状动脉 CT 钙化标注体积进行病灶提取、标签体系转换和钙化评分.
//!
//! 该 crate 只提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 体积统一以 `(z, h, w)` 轴序存储, 分辨率从 NIfTI 头读取.
//! 2. 对不合法的输入数据返回 [`CacsError`], 不会 panic.
//!
//! # 流程
//!
//! ### 标签体系与转换 ✅
//!
//! 七种标签体系 ([`Taxonomy`]) 之间的粗化转换, 以 `(源, 目标)` 为键的查表规则实现.
//!
//! 实现位于 `cacs-core/src/taxonomy`.
//!
//! ### 病灶提取与逐切片分解 ✅
//!
//! 对每个动脉组分别做 3D 6-邻接连通域分析, 再对每个病灶的每个切片做 2D 4-邻接分析.
//!
//! 实现位于 `cacs-core/src/lesion`, 连通域算法位于 `cacs-core/src/components`.
//!
//! ### 区域树与评分 ✅
//!
//! Agatston、体积、密度、病灶个数、逐病灶体积共用同一个自底向上的评分模板.
//!
//! 实现位于 `cacs-core/src/grouping.rs` 和 `cacs-core/src/score`.
//!
//! ### 导出与缓存 ✅
//!
//! CSV 导出位于 `cacs-core/src/export.rs`, 病灶分解的 JSON 缓存位于
//! `cacs-core/src/cache.rs` (需要 `serde` feature).

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 3D CT nii 文件基础数据结构.
mod data;

pub use data::{CtData3d, CtLabel, CtScan, LabelSlice, NiftiHeaderAttr, ScanSlice, Spacing};

pub mod consts;

mod error;

pub use error::{CacsError, CacsResult};

pub mod components;

pub mod taxonomy;

pub use taxonomy::Taxonomy;

pub mod grouping;

pub mod lesion;

pub mod score;

pub mod config;

pub use config::ScoringConfig;

#[cfg(feature = "serde")]
pub mod cache;

pub mod export;

pub mod dataset;

pub mod prelude;
