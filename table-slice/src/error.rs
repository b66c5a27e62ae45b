use thiserror::Error;

use crate::geometry::BoundingBox;

/// 切分流程中可能出现的错误，均携带足以定位问题的尺寸或数量信息。
///
/// 任一错误都会中止当前页面的处理；这些都是确定性的几何问题，不做重试。
#[derive(Debug, Error)]
pub enum SliceError {
    /// 输入图像为空、通道数不对，或配置取值非法。
    #[error("输入无效：{reason}")]
    InvalidInput { reason: String },

    /// 网格掩膜中没有任何轮廓通过尺寸过滤。
    #[error(
        "未找到可用的单元格边框（页面 {width}x{height}，共 {contours} 个轮廓，过滤后为 0），请检查扫描质量或调整尺寸过滤参数"
    )]
    NoContoursFound {
        width: u32,
        height: u32,
        contours: usize,
    },

    /// 严格模式下某一行的单元格数与列锚点数不一致。
    #[error("第 {row} 行检测到 {actual} 个单元格，而列数为 {expected}，表格边框可能印刷不清")]
    GridTransposeFailure {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// 单元格外接矩形与页面没有交集。
    #[error("单元格 (行 {row}, 列 {column}) 的裁剪区域为空：{bbox}，页面尺寸 {width}x{height}")]
    EmptyCellRegion {
        row: usize,
        column: usize,
        bbox: BoundingBox,
        width: u32,
        height: u32,
    },

    /// 单元格数量与标签数量不符合约定比例。
    #[error("单元格数量不匹配：{labels} 条标签需要 {expected} 个单元格，实际得到 {cells} 个")]
    CountMismatch {
        labels: usize,
        cells: usize,
        expected: usize,
    },

    /// 复核人员拒绝了预览图。
    #[error("人工复核未通过：{reason}")]
    ReviewRejected { reason: String },

    /// 复核过程本身失败（例如无法读取确认输入）。
    #[error("人工复核过程失败")]
    Review(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SliceError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}
