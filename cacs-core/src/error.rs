//! 运行时错误.

use std::path::PathBuf;

use thiserror::Error;

use crate::taxonomy::Taxonomy;
use crate::Idx3d;

/// 评分、标签转换和批量导出过程中的错误.
///
/// 单个病例的错误 (如 [`CacsError::MissingFile`], [`CacsError::SpacingMismatch`])
/// 只影响该病例本身, 由调用方决定跳过还是中止.
#[derive(Error, Debug)]
pub enum CacsError {
    /// 两个标签体系之间不存在转换规则.
    #[error("no conversion rule from {from} to {to}")]
    InvalidConversion {
        /// 源体系.
        from: Taxonomy,
        /// 目标体系.
        to: Taxonomy,
    },

    /// 试图从较粗的标签体系转换到较细的体系.
    #[error("cannot refine labels from coarser {from} into finer {to}")]
    RefiningConversion {
        /// 源体系.
        from: Taxonomy,
        /// 目标体系.
        to: Taxonomy,
    },

    /// 病例的图像或标注文件不存在.
    #[error("missing file: {}", .0.display())]
    MissingFile(PathBuf),

    /// CT 扫描和标注的形状或体素分辨率不一致.
    #[error(
        "scan {scan_shape:?} @ {scan_spacing:?} mm does not match label {label_shape:?} @ {label_spacing:?} mm"
    )]
    SpacingMismatch {
        /// 扫描形状 (z, h, w).
        scan_shape: Idx3d,
        /// 扫描体素分辨率 (z, h, w).
        scan_spacing: [f64; 3],
        /// 标注形状 (z, h, w).
        label_shape: Idx3d,
        /// 标注体素分辨率 (z, h, w).
        label_spacing: [f64; 3],
    },

    /// 标签名或标签值不属于给定体系.
    #[error("label `{name}` is not defined in {taxonomy}")]
    UnknownLabel {
        /// 所在体系.
        taxonomy: Taxonomy,
        /// 标签名 (或值的文本形式).
        name: String,
    },

    /// 分组引用了未定义的区域.
    #[error("territory `{0}` is referenced but never defined")]
    UnknownTerritory(String),

    /// 分组中存在环, 或某个区域有多个父区域.
    #[error("territory grouping is not a tree at `{0}`")]
    CyclicGrouping(String),

    /// 体积数据无法按 header 给出的形状解析.
    #[error("malformed volume: {0}")]
    MalformedVolume(String),

    /// 配置非法.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// nifti 读取错误.
    #[error("nifti error: {0}")]
    Nifti(#[from] nifti::NiftiError),

    /// 底层 I/O 错误.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV 写入错误.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON 序列化/反序列化错误.
    #[cfg(feature = "serde")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// 本 crate 的通用返回值.
pub type CacsResult<T> = Result<T, CacsError>;
