//! 导出设置.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use cacs_core::dataset::CaseId;
use cacs_core::export::NumberFormat;
use cacs_core::ScoringConfig;
use serde::{Deserialize, Serialize};
use utils::loader;

/// 批量导出设置, 从 JSON 文件读取.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    /// 数据集名称.
    pub dataset: String,

    /// 标注者.
    pub observer: String,

    /// 影像目录. 缺省为 `{数据集根目录}/images`.
    #[serde(default)]
    pub image_dir: Option<PathBuf>,

    /// 标注目录. 缺省为 `{数据集根目录}/labels`.
    #[serde(default)]
    pub label_dir: Option<PathBuf>,

    /// 输出根目录. 实际输出位于 `{output_dir}/{dataset}/{observer}`.
    pub output_dir: PathBuf,

    /// 使用逗号作为小数点.
    #[serde(default)]
    pub decimal_comma: bool,

    /// 保存并复用病灶分解缓存.
    #[serde(default)]
    pub lesion_cache: bool,

    /// 病灶分解缓存使用 gzip 压缩.
    #[serde(default)]
    pub compress_cache: bool,

    /// 工作线程数. 缺省或 `0` 表示使用全部核心.
    #[serde(default)]
    pub workers: Option<usize>,

    /// 评分配置.
    #[serde(default)]
    pub scoring: ScoringConfig,
}

impl ExportSettings {
    /// 读取并检查设置, 同时补全缺省目录.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(
            File::open(path).with_context(|| format!("cannot open {}", path.display()))?,
        );
        let mut settings: Self = serde_json::from_reader(reader)
            .with_context(|| format!("malformed settings in {}", path.display()))?;
        settings.resolve_dirs()?;
        settings.scoring.validate().context("invalid scoring configuration")?;
        Ok(settings)
    }

    fn resolve_dirs(&mut self) -> anyhow::Result<()> {
        if self.image_dir.is_none() {
            self.image_dir = loader::image_dir_from_env_or_home();
        }
        if self.label_dir.is_none() {
            self.label_dir = loader::label_dir_from_env_or_home();
        }
        if self.image_dir.is_none() || self.label_dir.is_none() {
            bail!("no image/label directory configured and no home directory found");
        }
        Ok(())
    }

    /// 影像目录.
    pub fn image_dir(&self) -> &Path {
        self.image_dir.as_deref().unwrap_or_else(|| Path::new("images"))
    }

    /// 标注目录.
    pub fn label_dir(&self) -> &Path {
        self.label_dir.as_deref().unwrap_or_else(|| Path::new("labels"))
    }

    /// CSV 输出目录.
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.join(&self.dataset).join(&self.observer)
    }

    /// 病灶分解缓存目录. 未启用缓存时为 `None`.
    pub fn cache_dir(&self) -> Option<PathBuf> {
        self.lesion_cache.then(|| self.output_dir().join("lesions"))
    }

    /// 某个病例的缓存文件.
    pub fn cache_path(&self, dir: &Path, case: &CaseId) -> PathBuf {
        let ext = if self.compress_cache { "json.gz" } else { "json" };
        dir.join(format!("{}.{ext}", case.stem()))
    }

    /// 数值格式.
    #[inline]
    pub fn number_format(&self) -> NumberFormat {
        NumberFormat {
            decimal_comma: self.decimal_comma,
        }
    }
}
