use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use tracing::debug;

use crate::config::SliceConfig;
use crate::geometry::BoundingBox;
use crate::grid::CellGrid;
use crate::morphology::{self, rect_element};
use crate::{Result, SliceError};

/// 裁剪并清理后的单元格图像。
#[derive(Debug, Clone)]
pub struct Cell {
    /// 行号（0-based，从上到下）。
    pub row: usize,
    /// 列号（0-based，从左到右）。
    pub column: usize,
    /// 单元格在页面上的外接矩形。
    pub bbox: BoundingBox,
    /// 白底黑字的单元格图像。
    pub image: GrayImage,
}

/// 单元格裁剪：补边、放大、闭运算修补断笔、反相。
#[derive(Debug, Clone, Copy)]
pub struct CellCropper {
    border: u32,
    border_value: u8,
    upscale_factor: f64,
}

impl Default for CellCropper {
    fn default() -> Self {
        Self::from_config(&SliceConfig::default())
    }
}

impl CellCropper {
    pub fn from_config(config: &SliceConfig) -> Self {
        Self {
            border: config.cell_border,
            border_value: config.cell_border_value,
            upscale_factor: config.upscale_factor,
        }
    }

    /// 按行优先、列次之的顺序裁剪网格中的全部单元格。
    ///
    /// `content` 为去线后的内容图（墨迹为暗色）。
    pub fn crop_all(&self, content: &GrayImage, grid: &CellGrid) -> Result<Vec<Cell>> {
        let ink_bright = morphology::invert(content);
        let cells = grid
            .iter()
            .map(|placed| -> Result<Cell> {
                let image = self.process(&ink_bright, placed.bbox).map_err(|err| match err {
                    SliceError::EmptyCellRegion {
                        bbox,
                        width,
                        height,
                        ..
                    } => SliceError::EmptyCellRegion {
                        row: placed.row,
                        column: placed.column,
                        bbox,
                        width,
                        height,
                    },
                    other => other,
                })?;
                Ok(Cell {
                    row: placed.row,
                    column: placed.column,
                    bbox: placed.bbox,
                    image,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(cells = cells.len(), "cropped cells");
        Ok(cells)
    }

    /// 裁剪并补边，尺寸为 `(w + 2 * border, h + 2 * border)`。
    ///
    /// `ink_bright` 为墨迹 255、背景 0 的工作图。
    pub fn pad_cell(&self, ink_bright: &GrayImage, bbox: BoundingBox) -> Result<GrayImage> {
        let (width, height) = ink_bright.dimensions();
        let region = bbox
            .clamp_to(width, height)
            .ok_or(SliceError::EmptyCellRegion {
                row: 0,
                column: 0,
                bbox,
                width,
                height,
            })?;
        let crop =
            imageops::crop_imm(ink_bright, region.x, region.y, region.width, region.height).to_image();

        let mut padded = GrayImage::from_pixel(
            region.width + 2 * self.border,
            region.height + 2 * self.border,
            Luma([self.border_value]),
        );
        imageops::replace(&mut padded, &crop, i64::from(self.border), i64::from(self.border));
        Ok(padded)
    }

    /// 单个单元格的完整处理，返回白底黑字图像。
    pub fn process(&self, ink_bright: &GrayImage, bbox: BoundingBox) -> Result<GrayImage> {
        let padded = self.pad_cell(ink_bright, bbox)?;
        let target_w = scaled(padded.width(), self.upscale_factor);
        let target_h = scaled(padded.height(), self.upscale_factor);
        let resized = imageops::resize(&padded, target_w, target_h, FilterType::CatmullRom);

        let element = rect_element(2, 1);
        let closed = morphology::erode(&morphology::dilate(&resized, &element, 1), &element, 1);
        Ok(morphology::invert(&closed))
    }
}

fn scaled(len: u32, factor: f64) -> u32 {
    ((f64::from(len) * factor).round() as u32).max(1)
}
