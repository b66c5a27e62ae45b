use image::{DynamicImage, GrayImage};
use tracing::{debug, warn};

use crate::binarize::{as_single_channel, binarize};
use crate::config::SliceConfig;
use crate::contours::sort_contours;
use crate::crop::{Cell, CellCropper};
use crate::debug::annotate_boxes;
use crate::geometry::BoundingBox;
use crate::grid::{CellGrid, GridReconstructor};
use crate::lines::LineExtractor;
use crate::{Result, SliceError};

/// 调试图中检测框的线宽。
const DEBUG_FRAME_THICKNESS: u32 = 20;

/// 一页的处理结果。
#[derive(Debug, Clone)]
pub enum SliceOutcome {
    /// 按行优先顺序排列的单元格。
    Cells(Vec<Cell>),
    /// 调试模式：标注了检测框的二值图。
    Debug(GrayImage),
}

/// 网格重建之前的中间结果。
#[derive(Debug, Clone)]
pub struct PreparedPage {
    pub binary: GrayImage,
    pub grid_mask: GrayImage,
    pub content: GrayImage,
    /// 轮廓外接矩形，已按 `sort_axis` 排序、尚未做尺寸过滤。
    pub boxes: Vec<BoundingBox>,
}

/// 单页切分流程：二值化 -> 表格线 -> 轮廓排序 -> 网格重建 -> 裁剪。
///
/// 只持有不可变配置，可以在多个线程间共享，每页使用各自的缓冲区。
#[derive(Debug, Clone)]
pub struct TableSlicer {
    config: SliceConfig,
}

impl TableSlicer {
    /// 校验配置后创建切分器。
    pub fn new(config: SliceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SliceConfig {
        &self.config
    }

    /// 执行到轮廓排序为止。
    pub fn prepare(&self, page: &GrayImage) -> Result<PreparedPage> {
        let binary = binarize(page, self.config.seed_threshold)?;
        let masks = LineExtractor::from_config(&self.config).extract(page, &binary)?;
        let boxes = sort_contours(&masks.grid, self.config.sort_axis)
            .into_iter()
            .map(|c| c.bbox)
            .collect::<Vec<_>>();
        debug!(contours = boxes.len(), axis = %self.config.sort_axis, "sorted contours");
        Ok(PreparedPage {
            binary,
            grid_mask: masks.grid,
            content: masks.content,
            boxes,
        })
    }

    /// 从预处理结果重建网格。
    ///
    /// # 错误
    /// - 没有矩形通过尺寸过滤时返回 `NoContoursFound`
    pub fn reconstruct(&self, prepared: &PreparedPage) -> Result<CellGrid> {
        let grid = GridReconstructor::from_config(&self.config).reconstruct(&prepared.boxes)?;
        if grid.is_empty() {
            let (width, height) = prepared.binary.dimensions();
            return Err(SliceError::NoContoursFound {
                width,
                height,
                contours: prepared.boxes.len(),
            });
        }
        Ok(grid)
    }

    /// 处理整页。调试模式下返回标注图，不做裁剪。
    pub fn slice(&self, page: &GrayImage) -> Result<SliceOutcome> {
        let prepared = self.prepare(page)?;

        if self.config.debug {
            return Ok(SliceOutcome::Debug(self.debug_view(&prepared)));
        }

        let grid = self.reconstruct(&prepared)?;
        let cells = CellCropper::from_config(&self.config).crop_all(&prepared.content, &grid)?;
        Ok(SliceOutcome::Cells(cells))
    }

    /// 同 [`TableSlicer::slice`]，输入必须是 8 位单通道图像。
    pub fn slice_dynamic(&self, page: &DynamicImage) -> Result<SliceOutcome> {
        self.slice(as_single_channel(page)?)
    }

    /// 非调试模式下的便捷入口，直接返回单元格。
    pub fn cells(&self, page: &GrayImage) -> Result<Vec<Cell>> {
        let prepared = self.prepare(page)?;
        let grid = self.reconstruct(&prepared)?;
        CellCropper::from_config(&self.config).crop_all(&prepared.content, &grid)
    }

    fn debug_view(&self, prepared: &PreparedPage) -> GrayImage {
        let filter = GridReconstructor::from_config(&self.config).filter();
        let kept = filter.apply(&prepared.boxes);
        if kept.is_empty() {
            let (width, height) = prepared.binary.dimensions();
            warn!(
                width,
                height,
                contours = prepared.boxes.len(),
                "no cell borders found, returning plain binary mask"
            );
            return prepared.binary.clone();
        }
        annotate_boxes(&prepared.binary, &kept, DEBUG_FRAME_THICKNESS)
    }
}
