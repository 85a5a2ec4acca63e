//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};

pub use crate::data::{CtData3d, CtLabel, CtScan, LabelSlice, NiftiHeaderAttr, ScanSlice, Spacing};
pub use crate::error::{CacsError, CacsResult};

pub use crate::config::ScoringConfig;
pub use crate::grouping::{ArteryGrouping, Territory};
pub use crate::lesion::{LesionDecomposition, LesionExtractor};
pub use crate::score::{
    score_case, score_lesions, CaseScores, Grading, GradingConvention, ScoreKind, ScoreScheme,
};
pub use crate::taxonomy::{convert, Taxonomy};

pub use crate::dataset::{self, discover_cases, home_dataset_dir_with, CaseId};
pub use crate::export::{ExportSink, NumberFormat};
