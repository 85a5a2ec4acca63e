//! CSV 导出.
//!
//! 每种评分一个文件 `{output}/{SCORE}_{scheme}.csv`, 每个病例一行;
//! 逐病灶体积写入 `LESION_VOLUME_{scheme}.csv`, 每个 (区域, 病灶) 一行.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::dataset::CaseId;
use crate::error::CacsResult;
use crate::score::{CaseScores, LesionVolumeRecord, ScoreKind, ScoreRecord, ScoreScheme};

const ID_COLUMNS: [&str; 2] = ["PatientID", "SeriesInstanceUID"];
const LESION_VOLUME_COLUMNS: [&str; 5] = [
    "PatientID",
    "SeriesInstanceUID",
    "Territory",
    "LesionID",
    "Volume",
];

/// 数值格式.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NumberFormat {
    /// 使用逗号作为小数点. 此时 CSV 分隔符改为 `;`.
    pub decimal_comma: bool,
}

impl NumberFormat {
    /// CSV 分隔符.
    #[inline]
    pub const fn delimiter(&self) -> u8 {
        if self.decimal_comma {
            b';'
        } else {
            b','
        }
    }

    /// 格式化一个数值. `-0` 写作 `0`.
    pub fn fmt(&self, v: f64) -> String {
        let s = (v + 0.0).to_string();
        if self.decimal_comma {
            s.replace('.', ",")
        } else {
            s
        }
    }
}

/// 标量评分文件的表头. Agatston 额外带一列 `Grading`.
pub fn score_header(kind: ScoreKind, scheme: ScoreScheme) -> CacsResult<Vec<String>> {
    let mut ans: Vec<String> = ID_COLUMNS.iter().map(|s| s.to_string()).collect();
    ans.extend(scheme.columns()?);
    if kind == ScoreKind::Agatston {
        ans.push("Grading".to_owned());
    }
    Ok(ans)
}

/// 标量评分的一行.
pub fn score_row(case: &CaseId, record: &ScoreRecord, format: NumberFormat) -> Vec<String> {
    let mut ans = vec![case.patient_id.clone(), case.series_uid.clone()];
    ans.extend(record.values.entries.iter().map(|(_, v)| format.fmt(*v)));
    if record.kind == ScoreKind::Agatston {
        ans.push(record.grading.map(|g| g.name().to_owned()).unwrap_or_default());
    }
    ans
}

/// 逐病灶体积的若干行. 按区域先序, 区域内按病灶编号.
pub fn lesion_volume_rows(
    case: &CaseId,
    record: &LesionVolumeRecord,
    format: NumberFormat,
) -> Vec<Vec<String>> {
    record
        .values
        .entries
        .iter()
        .flat_map(|(territory, volumes)| {
            volumes.iter().map(move |(id, v)| {
                vec![
                    case.patient_id.clone(),
                    case.series_uid.clone(),
                    territory.clone(),
                    id.to_string(),
                    format.fmt(*v),
                ]
            })
        })
        .collect()
}

/// 输出文件路径.
pub fn output_path<P: AsRef<Path>>(output_dir: P, kind: ScoreKind, scheme: ScoreScheme) -> PathBuf {
    output_dir
        .as_ref()
        .join(format!("{}_{}.csv", kind.file_stem(), scheme.name()))
}

/// 拥有全部 CSV 写入器. 同一时刻只应有一个所有者写入.
pub struct ExportSink {
    scheme: ScoreScheme,
    format: NumberFormat,
    writers: BTreeMap<ScoreKind, csv::Writer<File>>,
}

impl ExportSink {
    /// 在 `output_dir` 下为每种评分创建 CSV 文件并写入表头.
    pub fn create<P: AsRef<Path>>(
        output_dir: P,
        scheme: ScoreScheme,
        kinds: &[ScoreKind],
        format: NumberFormat,
    ) -> CacsResult<Self> {
        let output_dir = output_dir.as_ref();
        std::fs::create_dir_all(output_dir)?;

        let mut writers = BTreeMap::new();
        for &kind in kinds {
            let path = output_path(output_dir, kind, scheme);
            let mut w = csv::WriterBuilder::new()
                .delimiter(format.delimiter())
                .from_path(&path)?;
            if kind == ScoreKind::LesionVolume {
                w.write_record(LESION_VOLUME_COLUMNS)?;
            } else {
                w.write_record(score_header(kind, scheme)?)?;
            }
            log::debug!("writing {}", path.display());
            writers.insert(kind, w);
        }
        Ok(Self {
            scheme,
            format,
            writers,
        })
    }

    /// 评分方案.
    #[inline]
    pub fn scheme(&self) -> ScoreScheme {
        self.scheme
    }

    /// 写入一个病例的全部评分.
    pub fn write_case(&mut self, case: &CaseId, scores: &CaseScores) -> CacsResult<()> {
        for record in scores.scores.iter() {
            if let Some(w) = self.writers.get_mut(&record.kind) {
                w.write_record(score_row(case, record, self.format))?;
            }
        }
        if let (Some(record), Some(w)) = (
            scores.lesion_volumes.as_ref(),
            self.writers.get_mut(&ScoreKind::LesionVolume),
        ) {
            for row in lesion_volume_rows(case, record, self.format) {
                w.write_record(row)?;
            }
        }
        Ok(())
    }

    /// 刷新全部写入器.
    pub fn flush(&mut self) -> CacsResult<()> {
        for w in self.writers.values_mut() {
            w.flush()?;
        }
        Ok(())
    }
}
