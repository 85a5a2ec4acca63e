//! 对 `cacs-core::dataset` 的更一层封装. 提供默认数据集目录.

use std::env;
use std::path::PathBuf;

use cacs_core::dataset;

/// 数据集根目录的环境变量.
pub const DATASET_DIR_ENV: &str = "CACS_DATASET_DIR";

/// 获取数据集根目录.
///
/// 1. 若环境变量 `$CACS_DATASET_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/cacs`;
/// 3. 无法确定用户主目录时返回 `None`.
pub fn dataset_dir_from_env_or_home() -> Option<PathBuf> {
    match env::var(DATASET_DIR_ENV) {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => dataset::home_dataset_dir_with(["cacs"]),
    }
}

/// 获取影像目录 `{数据集根目录}/images`.
pub fn image_dir_from_env_or_home() -> Option<PathBuf> {
    dataset_dir_from_env_or_home().map(|d| d.join("images"))
}

/// 获取标注目录 `{数据集根目录}/labels`.
pub fn label_dir_from_env_or_home() -> Option<PathBuf> {
    dataset_dir_from_env_or_home().map(|d| d.join("labels"))
}

