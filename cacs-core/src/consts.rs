//! 通用常量.

/// 标签体素值约定. 对所有标签体系都成立.
pub mod label {
    /// 体积外部 (未标注) 的体素值.
    pub const OUTSIDE: u8 = 0;

    /// "OTHER" 的体素值, 即非冠脉的背景组织. 任何转换开始前都会被清零.
    pub const OTHER: u8 = 1;

    /// 第一个可以参与评分的标签值. 小于该值的体素永远不属于病灶.
    pub const FIRST_SCORED: u8 = 2;

    /// 体素是否可能属于某条动脉 (从而参与评分)?
    #[inline]
    pub const fn is_scorable(p: u8) -> bool {
        p >= FIRST_SCORED
    }
}

/// 病灶合并阶段使用的动脉分组值.
///
/// 与 `ArteryLevelWithLM` 标签体系中的取值一致. 当导出体系为 `ArteryLevel` 时,
/// `LM` 会被并入 `LAD`.
pub mod artery {
    /// 左前降支.
    pub const LAD: u8 = 2;

    /// 左回旋支.
    pub const LCX: u8 = 3;

    /// 右冠状动脉.
    pub const RCA: u8 = 4;

    /// 左主干.
    pub const LM: u8 = 5;

    /// 未细分的冠脉 (SegmentLevel 中的 `CC`).
    pub const CC: u8 = 6;
}

/// Agatston 评分的 CT HU 阈值.
pub mod hu {
    /// 钙化阈值. 低于该值的峰值密度不计分.
    pub const CALCIUM: i16 = 130;

    /// 密度权重 2 的下限.
    pub const WEIGHT_2: i16 = 200;

    /// 密度权重 3 的下限.
    pub const WEIGHT_3: i16 = 300;

    /// 密度权重 4 的下限.
    pub const WEIGHT_4: i16 = 400;
}

/// Agatston 总分的临床分级边界 (左开右闭).
pub mod grading {
    /// `minimal` 的上界.
    pub const MINIMAL_UPPER: f64 = 10.0;

    /// `mild` 的上界.
    pub const MILD_UPPER: f64 = 100.0;

    /// `moderate` 的上界. 超过该值即为 `severe`.
    pub const MODERATE_UPPER: f64 = 400.0;
}
