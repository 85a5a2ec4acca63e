//! 数据集操作: 病例文件的发现与加载.
//!
//! 病例影像命名为 `{PatientID}_{SeriesInstanceUID}.nii[.gz]`, 位于影像目录下;
//! 对应标注命名为 `{PatientID}_{SeriesInstanceUID}-label.nii[.gz]`, 位于标注目录下.

use std::fmt;
use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::data::CtData3d;
use crate::error::{CacsError, CacsResult};

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_dataset_dir()?;
    ans.extend(it);
    Some(ans)
}

/// 病例标识.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CaseId {
    /// 病人编号.
    pub patient_id: String,

    /// DICOM 序列 UID.
    pub series_uid: String,
}

impl CaseId {
    /// 从文件名主干 `{PatientID}_{SeriesInstanceUID}` 解析.
    ///
    /// 以第一个 `_` 分隔, 因为序列 UID 只含数字和 `.`.
    pub fn from_stem(stem: &str) -> Option<Self> {
        let (patient, series) = stem.split_once('_')?;
        if patient.is_empty() || series.is_empty() {
            return None;
        }
        Some(Self {
            patient_id: patient.to_owned(),
            series_uid: series.to_owned(),
        })
    }

    /// 文件名主干.
    pub fn stem(&self) -> String {
        format!("{}_{}", self.patient_id, self.series_uid)
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.patient_id, self.series_uid)
    }
}

/// 去掉 `.nii` 或 `.nii.gz` 后缀.
fn nifti_stem(name: &str) -> Option<(&str, &'static str)> {
    if let Some(s) = name.strip_suffix(".nii.gz") {
        Some((s, ".nii.gz"))
    } else {
        name.strip_suffix(".nii").map(|s| (s, ".nii"))
    }
}

/// 一个病例的文件.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CasePaths {
    /// 病例标识.
    pub id: CaseId,

    /// 影像文件.
    pub image: PathBuf,

    /// 标注文件. 不一定存在.
    pub label: PathBuf,
}

impl CasePaths {
    /// 读取影像和标注. 任一文件缺失时返回 [`CacsError::MissingFile`].
    pub fn load(&self) -> CacsResult<CtData3d> {
        CtData3d::open(&self.image, &self.label)
    }
}

/// 扫描影像目录, 按病例标识排序返回全部病例.
///
/// 标注路径优先选择与影像相同的后缀; 两种后缀都不存在时仍返回与影像同后缀的路径,
/// 由 [`CasePaths::load`] 报告缺失.
pub fn discover_cases<P: AsRef<Path>, Q: AsRef<Path>>(
    image_dir: P,
    label_dir: Q,
) -> CacsResult<Vec<CasePaths>> {
    let image_dir = image_dir.as_ref();
    let label_dir = label_dir.as_ref();
    if !image_dir.is_dir() {
        return Err(CacsError::MissingFile(image_dir.to_path_buf()));
    }

    let mut ans = Vec::new();
    for entry in std::fs::read_dir(image_dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some((stem, suffix)) = nifti_stem(name) else {
            continue;
        };
        if stem.ends_with("-label") {
            continue;
        }
        let Some(id) = CaseId::from_stem(stem) else {
            log::warn!("skip unrecognized file name {name}");
            continue;
        };

        let label = [suffix, ".nii.gz", ".nii"]
            .into_iter()
            .map(|s| label_dir.join(format!("{stem}-label{s}")))
            .find(|p| p.is_file())
            .unwrap_or_else(|| label_dir.join(format!("{stem}-label{suffix}")));
        ans.push(CasePaths {
            id,
            image: path,
            label,
        });
    }
    ans.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(ans)
}
