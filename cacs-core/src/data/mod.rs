use std::collections::BTreeSet;
use std::path::Path;

use ndarray::{Array3, ArrayView, Axis, Ix3};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::error::{CacsError, CacsResult};
use crate::taxonomy::RemapRule;
use crate::Idx3d;

pub mod slice;

pub use slice::{LabelSlice, ScanSlice};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// 比较两个体素分辨率时允许的误差 (毫米).
const SPACING_TOLERANCE: f64 = 1e-4;

/// 体素分辨率, 以毫米为单位.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Spacing {
    /// width 方向 (自然 2D 图像的水平方向).
    pub width_mm: f64,

    /// height 方向 (自然 2D 图像的垂直方向).
    pub height_mm: f64,

    /// 空间方向 (相邻 2D 切片的方向), 即层厚.
    pub z_mm: f64,
}

impl Spacing {
    /// 直接构建.
    #[inline]
    pub const fn new(width_mm: f64, height_mm: f64, z_mm: f64) -> Self {
        Self {
            width_mm,
            height_mm,
            z_mm,
        }
    }

    /// 水平切片上单个像素的面积, 以平方毫米为单位.
    #[inline]
    pub fn pixel_area(&self) -> f64 {
        self.width_mm * self.height_mm
    }

    /// 单个体素的体积, 以立方毫米为单位.
    #[inline]
    pub fn voxel_volume(&self) -> f64 {
        self.pixel_area() * self.z_mm
    }

    /// 按 \[z, h, w\] 顺序排列.
    #[inline]
    pub fn to_zhw(&self) -> [f64; 3] {
        [self.z_mm, self.height_mm, self.width_mm]
    }

    /// 两个分辨率在误差范围内是否一致?
    pub fn approx_eq(&self, other: &Spacing) -> bool {
        self.to_zhw()
            .iter()
            .zip(other.to_zhw().iter())
            .all(|(a, b)| (a - b).abs() <= SPACING_TOLERANCE)
    }
}

/// 将 (W, H, z) 转换成 (z, H, W). 以后均按照该模式访问.
#[inline]
fn get_shape_from_header(h: &NiftiHeader) -> Idx3d {
    // [W, H, z]. 体素个数数组.
    let [_, w, h, z, ..] = h.dim;
    (z as usize, h as usize, w as usize)
}

/// 为内存中直接构建的体积生成最小可用的 header.
///
/// nifti-1 的每一维最多 `u16::MAX` 个体素, 超出时返回 [`CacsError::MalformedVolume`].
fn header_from_raw((z, h, w): Idx3d, spacing: Spacing) -> CacsResult<BoxedHeader> {
    let dim = |n: usize, axis: &str| {
        u16::try_from(n).map_err(|_| {
            CacsError::MalformedVolume(format!("{axis} dimension {n} exceeds {}", u16::MAX))
        })
    };
    let mut header = Box::<NiftiHeader>::default();
    header.dim = [3, dim(w, "width")?, dim(h, "height")?, dim(z, "z")?, 1, 1, 1, 1];
    header.pixdim[1] = spacing.width_mm as f32;
    header.pixdim[2] = spacing.height_mm as f32;
    header.pixdim[3] = spacing.z_mm as f32;
    Ok(header)
}

/// 3D CT nii 文件 header 的共用属性和部分通用操作.
pub trait NiftiHeaderAttr {
    /// 获取 header 部分.
    fn header(&self) -> &NiftiHeader;

    /// 获取数据形状大小.
    #[inline]
    fn shape(&self) -> Idx3d {
        get_shape_from_header(self.header())
    }

    /// 获取水平切片个数.
    #[inline]
    fn len_z(&self) -> usize {
        self.shape().0
    }

    /// 获取单个体素分辨率. 该分辨率以毫米为单位, 分别代表空间 (相邻切片方向),
    /// 高 (自然图像的垂直方向), 宽 (自然图像的水平方向).
    #[inline]
    fn pix_dim(&self) -> [f64; 3] {
        let [_, w, h, z, ..] = self.header().pixdim;
        [z as f64, h as f64, w as f64]
    }

    /// 获取 width 方向体素分辨率, 以毫米为单位.
    #[inline]
    fn width_mm(&self) -> f64 {
        self.header().pixdim[1] as f64
    }

    /// 获取 height 方向体素分辨率, 以毫米为单位.
    #[inline]
    fn height_mm(&self) -> f64 {
        self.header().pixdim[2] as f64
    }

    /// 获取空间方向 (相邻 2D 切片的方向) 体素分辨率, 即层厚, 以毫米为单位.
    #[inline]
    fn z_mm(&self) -> f64 {
        self.header().pixdim[3] as f64
    }

    /// 以 [`Spacing`] 形式获取体素分辨率.
    #[inline]
    fn spacing(&self) -> Spacing {
        Spacing::new(self.width_mm(), self.height_mm(), self.z_mm())
    }
}

/// nii 格式 3D CT 扫描, 包括 header 和 CT 扫描 (HU). HU 值以 `i16` 保存.
#[derive(Debug, Clone)]
pub struct CtScan {
    header: BoxedHeader,
    data: Array3<i16>,
}

impl NiftiHeaderAttr for CtScan {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl CtScan {
    /// 打开 nii 文件格式的 3D CT 扫描. `path` 为 nii 文件的本地路径.
    /// 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> CacsResult<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let header = Box::new(obj.header().clone());

        // [W, H, z] -> [z, H, W].
        // hint: 原第一维向下增长, 原第二维向右增长.
        let data = obj
            .into_volume()
            .into_ndarray::<i16>()?
            .permuted_axes([2, 1, 0].as_slice());

        // The nature of nifti data field layout.
        debug_assert!(data.is_standard_layout());
        let data = Array3::<i16>::from_shape_vec(get_shape_from_header(&header), data.into_raw_vec())
            .map_err(|e| CacsError::MalformedVolume(format!("scan: {e}")))?;

        Ok(Self { header, data })
    }

    /// 根据内存中的 HU 数据 (按 \[z, h, w\] 组织) 和体素分辨率直接创建扫描.
    pub fn from_raw(data: Array3<i16>, spacing: Spacing) -> CacsResult<Self> {
        let header = header_from_raw(data.dim(), spacing)?;
        Ok(Self { header, data })
    }

    /// 获取 3D 扫描 z 空间的第 `z_index` 层切片视图.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> ScanSlice<'_> {
        ScanSlice::new(self.data.index_axis(Axis(0), z_index))
    }
}

/// nii 格式 3D CT 标注, 包括 header 和标签. 标签值以 `u8` 保存,
/// 其含义由所属的 [`crate::Taxonomy`] 决定.
#[derive(Debug, Clone)]
pub struct CtLabel {
    header: BoxedHeader,
    data: Array3<u8>,
}

impl NiftiHeaderAttr for CtLabel {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl PartialEq for CtLabel {
    /// 仅比较形状, 体素分辨率和标签数据.
    fn eq(&self, other: &Self) -> bool {
        self.spacing().approx_eq(&other.spacing()) && self.data == other.data
    }
}

impl CtLabel {
    /// 打开 nii 文件格式的 3D CT 标注. `path` 为 nii 文件的本地路径. 如果打开成功,
    /// 则返回 `Ok(Self)`, 否则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> CacsResult<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let header = Box::new(obj.header().clone());

        // [W, H, z] -> [z, H, W]
        // hint: 原第一维向下增长, 原第二维向右增长.
        let data = obj
            .into_volume()
            .into_ndarray::<u8>()?
            .permuted_axes([2, 1, 0].as_slice());

        debug_assert!(data.is_standard_layout());
        let data = Array3::<u8>::from_shape_vec(get_shape_from_header(&header), data.into_raw_vec())
            .map_err(|e| CacsError::MalformedVolume(format!("label: {e}")))?;

        Ok(Self { header, data })
    }

    /// 根据内存中的标签数据 (按 \[z, h, w\] 组织) 和体素分辨率直接创建标注.
    pub fn from_raw(data: Array3<u8>, spacing: Spacing) -> CacsResult<Self> {
        let header = header_from_raw(data.dim(), spacing)?;
        Ok(Self { header, data })
    }

    /// 获取 3D 标注 z 空间的第 `z_index` 层不可变切片.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> LabelSlice {
        LabelSlice::new(self.data.index_axis(Axis(0), z_index))
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, u8, Ix3> {
        self.data.view()
    }

    /// 获取标注中出现过的所有不同的标签值, 升序.
    pub fn distinct_values(&self) -> BTreeSet<u8> {
        let mut seen = [false; 256];
        self.data.iter().for_each(|&p| seen[p as usize] = true);
        (0..=u8::MAX).filter(|v| seen[*v as usize]).collect()
    }

    /// 按 `rule` 重映射所有体素, 返回新的标注. `self` 保持不变.
    ///
    /// 每个输出体素只由对应的 **输入** 体素决定, 因此规则中各条目的顺序
    /// 只影响匹配优先级, 不存在前后替换互相覆盖的问题.
    pub fn remapped(&self, rule: &RemapRule) -> CtLabel {
        let lut = rule.lut();
        Self {
            header: self.header.clone(),
            data: self.data.mapv(|v| lut[v as usize]),
        }
    }
}

/// 并发操作部分
#[cfg(feature = "rayon")]
impl CtLabel {
    /// 借助 `rayon`, 并行地执行 [`Self::remapped`].
    pub fn par_remapped(&self, rule: &RemapRule) -> CtLabel {
        let lut = rule.lut();
        let mut data = self.data.clone();
        data.par_mapv_inplace(|v| lut[v as usize]);
        Self {
            header: self.header.clone(),
            data,
        }
    }
}

/// nii 格式的 3D CT 扫描与对应的标注.
///
/// 该结构完全透明, 仅包含两个公开的 `scan` 和 `label` 子结构.
/// 通过 [`CtData3d::new`] 或 [`CtData3d::open`] 构建时,
/// 两者的形状与体素分辨率保证一致.
#[derive(Debug, Clone)]
pub struct CtData3d {
    /// 3D CT 扫描.
    pub scan: CtScan,

    /// 3D CT 标注.
    pub label: CtLabel,
}

impl CtData3d {
    /// 组合扫描和标注. 若二者形状或体素分辨率不一致, 返回
    /// [`CacsError::SpacingMismatch`].
    pub fn new(scan: CtScan, label: CtLabel) -> CacsResult<Self> {
        if scan.shape() != label.shape() || !scan.spacing().approx_eq(&label.spacing()) {
            return Err(CacsError::SpacingMismatch {
                scan_shape: scan.shape(),
                scan_spacing: scan.pix_dim(),
                label_shape: label.shape(),
                label_spacing: label.pix_dim(),
            });
        }
        Ok(Self { scan, label })
    }

    /// 分别打开 nii 文件格式的 3D CT 扫描和对应标注. 如果任一文件不存在,
    /// 返回 [`CacsError::MissingFile`]; 若二者不一致, 返回
    /// [`CacsError::SpacingMismatch`].
    pub fn open(scan_path: impl AsRef<Path>, label_path: impl AsRef<Path>) -> CacsResult<Self> {
        for p in [scan_path.as_ref(), label_path.as_ref()] {
            if !p.is_file() {
                return Err(CacsError::MissingFile(p.to_owned()));
            }
        }
        let scan = CtScan::open(scan_path.as_ref())?;
        let label = CtLabel::open(label_path.as_ref())?;
        Self::new(scan, label)
    }

    /// 体素分辨率.
    #[inline]
    pub fn spacing(&self) -> Spacing {
        self.label.spacing()
    }

    /// 获取水平切片个数.
    #[inline]
    pub fn len_z(&self) -> usize {
        self.label.len_z()
    }
}
