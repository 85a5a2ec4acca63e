//! 病灶分解的 JSON 缓存.
//!
//! 路径以 `.gz` 结尾时使用 gzip 压缩. 读取缓存即可重新评分, 不必再做连通域分析.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{CacsError, CacsResult};
use crate::lesion::LesionDecomposition;

#[inline]
fn is_gzip(path: &Path) -> bool {
    path.extension().map_or(false, |e| e == "gz")
}

/// 保存病灶分解.
pub fn save_lesions<P: AsRef<Path>>(decomposition: &LesionDecomposition, path: P) -> CacsResult<()> {
    let path = path.as_ref();
    let writer = BufWriter::new(File::create(path)?);
    if is_gzip(path) {
        let mut e = GzEncoder::new(writer, Compression::default());
        serde_json::to_writer(&mut e, decomposition)?;
        e.finish()?.flush()?;
    } else {
        let mut writer = writer;
        serde_json::to_writer_pretty(&mut writer, decomposition)?;
        writer.flush()?;
    }
    log::debug!("lesion cache written to {}", path.display());
    Ok(())
}

/// 读取病灶分解.
pub fn load_lesions<P: AsRef<Path>>(path: P) -> CacsResult<LesionDecomposition> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(CacsError::MissingFile(path.to_path_buf()));
    }
    let reader = BufReader::new(File::open(path)?);
    let decomposition = if is_gzip(path) {
        serde_json::from_reader(GzDecoder::new(reader))?
    } else {
        serde_json::from_reader(reader)?
    };
    Ok(decomposition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;
    use crate::data::{CtData3d, CtLabel, CtScan, Spacing};
    use crate::score::{score_case, score_lesions, ScoreScheme};
    use crate::taxonomy::Taxonomy;
    use ndarray::Array3;

    fn decomposed() -> (LesionDecomposition, ScoringConfig) {
        let seg = Taxonomy::SegmentLevel;
        let spacing = Spacing::new(0.5, 0.5, 3.0);
        let mut label = Array3::<u8>::from_elem((3, 4, 4), 1);
        label[(0, 1, 1)] = seg.value_of("RCA_MID").unwrap();
        label[(1, 1, 1)] = seg.value_of("RCA_DISTAL").unwrap();
        label[(2, 3, 3)] = seg.value_of("LCX_PROXIMAL").unwrap();
        let scan = Array3::<i16>::from_elem((3, 4, 4), 330);
        let data = CtData3d::new(
            CtScan::from_raw(scan, spacing).unwrap(),
            CtLabel::from_raw(label, spacing).unwrap(),
        )
        .unwrap();
        let config = ScoringConfig {
            taxonomy: seg,
            scheme: ScoreScheme::CacsTreeCumulative,
            ..Default::default()
        };
        let (d, _) = score_case(&data, &config).unwrap();
        (d, config)
    }

    #[test]
    fn test_cache_round_trip() {
        let (d, config) = decomposed();
        let dir = tempfile::tempdir().unwrap();
        for name in ["case.json", "case.json.gz"] {
            let path = dir.path().join(name);
            save_lesions(&d, &path).unwrap();
            let loaded = load_lesions(&path).unwrap();
            assert_eq!(loaded, d);
            assert_eq!(
                score_lesions(&loaded, &config).unwrap(),
                score_lesions(&d, &config).unwrap()
            );
        }
    }

    #[test]
    fn test_missing_cache() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_lesions(dir.path().join("nope.json")),
            Err(CacsError::MissingFile(_))
        ));
    }
}
