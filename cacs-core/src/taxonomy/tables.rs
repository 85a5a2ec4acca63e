//! 各标签体系的标签值与显示颜色.
//!
//! 0 永远代表体积外部, 不在表中列出.

/// 一个具名标签.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LabelDef {
    /// 语义名称, 如 `"LAD_PROXIMAL"`.
    pub name: &'static str,

    /// 标注体积中的体素值.
    pub value: u8,

    /// 显示颜色 (RGB).
    pub color: [u8; 3],
}

const fn def(name: &'static str, value: u8, color: [u8; 3]) -> LabelDef {
    LabelDef { name, value, color }
}

const OTHER: [u8; 3] = [128, 174, 128];

pub(super) static ARTERY_LEVEL: [LabelDef; 4] = [
    def("OTHER", 1, OTHER),
    def("LAD", 2, [241, 214, 145]),
    def("LCX", 3, [177, 122, 101]),
    def("RCA", 4, [111, 184, 210]),
];

pub(super) static ARTERY_LEVEL_WITH_LM: [LabelDef; 5] = [
    def("OTHER", 1, OTHER),
    def("LAD", 2, [241, 214, 145]),
    def("LCX", 3, [177, 122, 101]),
    def("RCA", 4, [111, 184, 210]),
    def("LM", 5, [216, 101, 79]),
];

pub(super) static SEGMENT_LEVEL: [LabelDef; 29] = [
    def("OTHER", 1, OTHER),
    def("CC", 2, [250, 250, 210]),
    def("RCA", 3, [111, 184, 210]),
    def("RCA_PROXIMAL", 4, [66, 135, 245]),
    def("RCA_MID", 5, [44, 102, 196]),
    def("RCA_DISTAL", 6, [24, 70, 150]),
    def("RCA_SIDE_BRANCH", 7, [150, 200, 240]),
    def("LM", 8, [216, 101, 79]),
    def("LM_BIF_LAD_LCX", 9, [230, 80, 60]),
    def("LM_BIF_LAD", 10, [200, 60, 40]),
    def("LM_BIF_LCX", 11, [170, 40, 30]),
    def("LM_BRANCH", 12, [240, 140, 120]),
    def("LAD", 13, [241, 214, 145]),
    def("LAD_PROXIMAL", 14, [250, 200, 60]),
    def("LAD_MID", 15, [220, 170, 30]),
    def("LAD_DISTAL", 16, [180, 140, 20]),
    def("LAD_SIDE_BRANCH", 17, [250, 230, 150]),
    def("LCX", 18, [177, 122, 101]),
    def("LCX_PROXIMAL", 19, [160, 100, 70]),
    def("LCX_MID", 20, [140, 80, 50]),
    def("LCX_DISTAL", 21, [110, 60, 35]),
    def("LCX_SIDE_BRANCH", 22, [200, 150, 130]),
    def("RIM", 23, [144, 238, 144]),
    def("NCC", 24, [183, 156, 220]),
    def("AORTA", 25, [255, 0, 0]),
    def("VALVES", 26, [255, 0, 255]),
    def("BONE", 27, [241, 214, 145]),
    def("LUNG", 28, [197, 165, 145]),
    def("PAPILLARY_MUSCLE", 29, [255, 128, 0]),
];

pub(super) static SEGMENT_LEVEL_DLN_EXPORT: [LabelDef; 18] = [
    def("OTHER", 1, OTHER),
    def("LM", 2, [216, 101, 79]),
    def("LAD", 3, [241, 214, 145]),
    def("LAD_PROXIMAL", 4, [250, 200, 60]),
    def("LAD_MID", 5, [220, 170, 30]),
    def("LAD_DISTAL", 6, [180, 140, 20]),
    def("LAD_SIDE_BRANCH", 7, [250, 230, 150]),
    def("LCX", 8, [177, 122, 101]),
    def("LCX_PROXIMAL", 9, [160, 100, 70]),
    def("LCX_MID", 10, [140, 80, 50]),
    def("LCX_DISTAL", 11, [110, 60, 35]),
    def("LCX_SIDE_BRANCH", 12, [200, 150, 130]),
    def("RCA", 13, [111, 184, 210]),
    def("RCA_PROXIMAL", 14, [66, 135, 245]),
    def("RCA_MID", 15, [44, 102, 196]),
    def("RCA_DISTAL", 16, [24, 70, 150]),
    def("RCA_SIDE_BRANCH", 17, [150, 200, 240]),
    def("RIM", 18, [144, 238, 144]),
];

pub(super) static SEGMENT_17: [LabelDef; 23] = [
    def("OTHER", 1, OTHER),
    def("RCA_PROXIMAL", 2, [66, 135, 245]),
    def("RCA_MID", 3, [44, 102, 196]),
    def("RCA_DISTAL", 4, [24, 70, 150]),
    def("R_PDA", 5, [0, 150, 200]),
    def("LM", 6, [216, 101, 79]),
    def("LAD_PROXIMAL", 7, [250, 200, 60]),
    def("LAD_MID", 8, [220, 170, 30]),
    def("LAD_DISTAL", 9, [180, 140, 20]),
    def("D1", 10, [255, 220, 120]),
    def("D2", 11, [255, 240, 180]),
    def("LCX_PROXIMAL", 12, [160, 100, 70]),
    def("OM1", 13, [190, 120, 90]),
    def("LCX_DISTAL", 14, [110, 60, 35]),
    def("OM2", 15, [210, 160, 130]),
    def("L_PDA", 16, [130, 90, 60]),
    def("R_PLB", 17, [100, 170, 230]),
    def("RIM", 18, [144, 238, 144]),
    def("AORTA", 19, [255, 0, 0]),
    def("VALVES", 20, [255, 0, 255]),
    def("BONE", 21, [241, 214, 145]),
    def("LUNG", 22, [197, 165, 145]),
    def("PAPILLARY_MUSCLE", 23, [255, 128, 0]),
];
