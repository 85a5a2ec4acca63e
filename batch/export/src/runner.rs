//! 程序运行函数.
//!
//! 病例在 rayon 线程池中并行评分, 结果经 channel 发送给唯一的写入线程,
//! 该线程拥有全部 CSV 写入器.

use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use anyhow::{anyhow, Context};
use cacs_core::cache::{load_lesions, save_lesions};
use cacs_core::dataset::{discover_cases, CaseId, CasePaths};
use cacs_core::export::ExportSink;
use cacs_core::score::{score_case, score_lesions, CaseScores};
use cacs_core::{CacsError, CacsResult, ScoringConfig};
use rayon::prelude::*;

use crate::result::ExportSummary;
use crate::settings::ExportSettings;

/// 单个病例的处理结果.
#[derive(Debug)]
pub enum CaseOutcome {
    /// 评分完成.
    Scored {
        /// 病例.
        id: CaseId,
        /// 评分.
        scores: CaseScores,
    },

    /// 文件缺失, 跳过.
    Skipped {
        /// 病例.
        id: CaseId,
        /// 原因.
        reason: CacsError,
    },

    /// 处理失败.
    Failed {
        /// 病例.
        id: CaseId,
        /// 错误.
        error: CacsError,
    },
}

/// 优先复用与配置一致的缓存.
fn cached_scores(path: &Path, config: &ScoringConfig) -> Option<CaseScores> {
    if !path.is_file() {
        return None;
    }
    let d = match load_lesions(path) {
        Ok(d) => d,
        Err(e) => {
            log::warn!("ignore unreadable cache {}: {e}", path.display());
            return None;
        }
    };
    if d.source != config.taxonomy {
        return None;
    }
    score_lesions(&d, config).ok()
}

fn score_one(case: &CasePaths, settings: &ExportSettings, cache_dir: Option<&Path>) -> CacsResult<CaseScores> {
    let cache_path = cache_dir.map(|dir| settings.cache_path(dir, &case.id));
    if let Some(scores) = cache_path
        .as_deref()
        .and_then(|p| cached_scores(p, &settings.scoring))
    {
        log::debug!("{}: scored from lesion cache", case.id);
        return Ok(scores);
    }

    let data = case.load()?;
    let (decomposition, scores) = score_case(&data, &settings.scoring)?;
    if let Some(path) = cache_path {
        if let Err(e) = save_lesions(&decomposition, &path) {
            log::warn!("{}: cannot write lesion cache: {e}", case.id);
        }
    }
    log::info!(
        "{}: {} lesions, {} slices",
        case.id,
        decomposition.num_lesions(),
        data.len_z()
    );
    Ok(scores)
}

/// 处理一个病例. 不会失败, 错误归入 [`CaseOutcome`].
pub fn process_case(case: &CasePaths, settings: &ExportSettings, cache_dir: Option<&Path>) -> CaseOutcome {
    let id = case.id.clone();
    match score_one(case, settings, cache_dir) {
        Ok(scores) => CaseOutcome::Scored { id, scores },
        Err(reason @ CacsError::MissingFile(_)) => CaseOutcome::Skipped { id, reason },
        Err(error) => CaseOutcome::Failed { id, error },
    }
}

/// 实际运行.
pub fn run(settings: &ExportSettings, workers: usize) -> anyhow::Result<ExportSummary> {
    let start = Instant::now();
    let cases = discover_cases(settings.image_dir(), settings.label_dir())
        .with_context(|| format!("cannot list cases in {}", settings.image_dir().display()))?;
    log::info!("{} cases found, {workers} workers", cases.len());

    let output_dir = settings.output_dir();
    let cache_dir = settings.cache_dir();
    if let Some(dir) = cache_dir.as_deref() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("cannot create {}", dir.display()))?;
    }
    let mut sink = ExportSink::create(
        &output_dir,
        settings.scoring.scheme,
        &settings.scoring.scores,
        settings.number_format(),
    )
    .with_context(|| format!("cannot create outputs in {}", output_dir.display()))?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .context("cannot build thread pool")?;

    let (tx, rx) = mpsc::channel::<CaseOutcome>();
    let writer = thread::spawn(move || -> CacsResult<ExportSummary> {
        let mut summary = ExportSummary::default();
        for outcome in rx {
            match outcome {
                CaseOutcome::Scored { id, scores } => {
                    sink.write_case(&id, &scores)?;
                    summary.written += 1;
                }
                CaseOutcome::Skipped { id, reason } => {
                    log::warn!("{id}: skipped, {reason}");
                    summary.skipped += 1;
                }
                CaseOutcome::Failed { id, error } => {
                    log::error!("{id}: {error}");
                    summary.failed += 1;
                }
            }
        }
        sink.flush()?;
        Ok(summary)
    });

    // 写入线程提前退出时 send 失败, 此时停止派发剩余病例.
    let cache_dir = cache_dir.as_deref();
    let dispatched = pool.install(|| {
        cases.par_iter().try_for_each_with(tx, |tx, case| {
            tx.send(process_case(case, settings, cache_dir))
                .map_err(|_| ())
        })
    });

    let mut summary = writer
        .join()
        .map_err(|_| anyhow!("writer thread panicked"))?
        .context("cannot write outputs")?;
    if dispatched.is_err() {
        return Err(anyhow!("writer stopped before all cases were dispatched"));
    }
    summary.elapsed = start.elapsed();
    Ok(summary)
}
