use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Result, SliceError};

/// 轮廓排序方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortAxis {
    LeftToRight,
    RightToLeft,
    #[default]
    TopToBottom,
    BottomToTop,
}

impl SortAxis {
    /// 按外接矩形的 y 坐标排序（否则按 x）。
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::TopToBottom | Self::BottomToTop)
    }

    /// 是否降序排列。
    pub fn is_descending(self) -> bool {
        matches!(self, Self::RightToLeft | Self::BottomToTop)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LeftToRight => "left-to-right",
            Self::RightToLeft => "right-to-left",
            Self::TopToBottom => "top-to-bottom",
            Self::BottomToTop => "bottom-to-top",
        }
    }
}

impl fmt::Display for SortAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortAxis {
    type Err = SliceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "left-to-right" => Ok(Self::LeftToRight),
            "right-to-left" => Ok(Self::RightToLeft),
            "top-to-bottom" => Ok(Self::TopToBottom),
            "bottom-to-top" => Ok(Self::BottomToTop),
            other => Err(SliceError::invalid(format!(
                "未知的排序方向：{other}（可选 left-to-right / right-to-left / top-to-bottom / bottom-to-top）"
            ))),
        }
    }
}

/// 切分流程的全部可调参数。
///
/// 每个字段都有默认值，JSON 配置文件中只需写出需要覆盖的项。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceConfig {
    /// 轮廓遍历顺序，行聚类依赖 `top-to-bottom`。
    pub sort_axis: SortAxis,
    /// 单元格最小宽度（不含），过滤细碎轮廓。
    pub width_min: u32,
    /// 单元格最小高度（不含）。
    pub height_min: u32,
    /// 单元格最大高度（不含），避免把整张表格外框当作单元格。
    pub height_max: u32,
    /// 为 true 时不裁剪，返回标注了检测框的二值图用于目视检查。
    pub debug: bool,
    /// 列匹配时取 `x + width * fraction` 作为单元格位置。
    pub column_offset_fraction: f64,
    /// Otsu 无法分割（整页单一灰度）时使用的阈值。
    pub seed_threshold: u8,
    /// 线段核长度 = 页面宽度 / 该值。
    pub line_scale_divisor: u32,
    /// 提取横/竖线时腐蚀与膨胀的迭代次数。
    pub line_iterations: u32,
    /// 合并后的线条掩膜用 2x2 核腐蚀的次数。
    pub cleanup_iterations: u32,
    /// 单元格四周补边宽度（像素）。
    pub cell_border: u32,
    /// 补边像素值（在墨迹为亮色的工作图上）。
    pub cell_border_value: u8,
    /// 单元格放大倍数。
    pub upscale_factor: f64,
    /// 为 true 时要求每行单元格数都等于列数。
    pub require_rectangular: bool,
    /// 复核预览图的缩放比例。
    pub preview_scale: f64,
    /// 每条标签对应的单元格数（印刷样例 + 手写）。
    pub cells_per_label: usize,
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            sort_axis: SortAxis::TopToBottom,
            width_min: 100,
            height_min: 50,
            height_max: 500,
            debug: false,
            column_offset_fraction: 0.25,
            seed_threshold: 128,
            line_scale_divisor: 200,
            line_iterations: 3,
            cleanup_iterations: 2,
            cell_border: 2,
            cell_border_value: 255,
            upscale_factor: 2.0,
            require_rectangular: false,
            preview_scale: 0.2,
            cells_per_label: 2,
        }
    }
}

impl SliceConfig {
    /// 校验参数组合，数值不合理时返回 `InvalidInput`。
    pub fn validate(&self) -> Result<()> {
        if self.height_min >= self.height_max {
            return Err(SliceError::invalid(format!(
                "height_min ({}) 必须小于 height_max ({})",
                self.height_min, self.height_max
            )));
        }
        if self.line_scale_divisor == 0 {
            return Err(SliceError::invalid("line_scale_divisor 不能为 0"));
        }
        if !self.column_offset_fraction.is_finite() {
            return Err(SliceError::invalid("column_offset_fraction 必须是有限数值"));
        }
        if !(self.upscale_factor.is_finite() && self.upscale_factor > 0.0) {
            return Err(SliceError::invalid(format!(
                "upscale_factor 必须为正数，当前为 {}",
                self.upscale_factor
            )));
        }
        if !(self.preview_scale.is_finite() && self.preview_scale > 0.0) {
            return Err(SliceError::invalid(format!(
                "preview_scale 必须为正数，当前为 {}",
                self.preview_scale
            )));
        }
        if self.cells_per_label == 0 {
            return Err(SliceError::invalid("cells_per_label 不能为 0"));
        }
        Ok(())
    }
}
