use image::GrayImage;
use image::imageops::{self, FilterType};
use tracing::{debug, info};

use crate::config::SliceConfig;
use crate::crop::Cell;
use crate::{Result, SliceError};

/// 复核人员的结论。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    Approved,
    Rejected(String),
}

/// 人工复核能力：查看预览图后给出通过或拒绝。
///
/// 调用会阻塞直到复核完成，没有超时；取消只能由调用进程终止本次运行。
pub trait Reviewer {
    fn review(&mut self, preview: &Preview) -> Result<ReviewDecision>;
}

/// 自动通过的复核器，用于测试和无人值守的批处理。
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl Reviewer for AutoApprove {
    fn review(&mut self, _preview: &Preview) -> Result<ReviewDecision> {
        Ok(ReviewDecision::Approved)
    }
}

/// 复核用的拼接预览图。
#[derive(Debug, Clone)]
pub struct Preview {
    /// 缩小后的纵向拼接图。
    pub image: GrayImage,
    /// 参与拼接的单元格在输出序列中的下标。
    pub cell_indices: Vec<usize>,
}

/// 标签与其手写单元格的对应关系。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledCell {
    pub label: String,
    pub cell_index: usize,
}

/// 通过复核的页面。
#[derive(Debug, Clone)]
pub struct VerifiedPage {
    pub pairs: Vec<LabeledCell>,
    pub preview: Preview,
}

/// 校验单元格数量并生成预览供人工确认。
///
/// 表格每行先是一格印刷样例、再是一格手写内容，因此单元格数应为标签数的两倍，
/// 复核只看手写那一格。
#[derive(Debug, Clone, Copy)]
pub struct VerificationGate {
    cells_per_label: usize,
    preview_scale: f64,
}

impl Default for VerificationGate {
    fn default() -> Self {
        Self::from_config(&SliceConfig::default())
    }
}

impl VerificationGate {
    pub fn from_config(config: &SliceConfig) -> Self {
        Self {
            cells_per_label: config.cells_per_label.max(1),
            preview_scale: config.preview_scale,
        }
    }

    /// 要求 `cells == cells_per_label * labels`。
    pub fn check_counts(&self, labels: usize, cells: usize) -> Result<()> {
        let expected = labels * self.cells_per_label;
        if cells != expected {
            return Err(SliceError::CountMismatch {
                labels,
                cells,
                expected,
            });
        }
        Ok(())
    }

    /// 需要复核的单元格下标：每组的最后一格。
    pub fn reviewed_indices(&self, cell_count: usize) -> Vec<usize> {
        (self.cells_per_label - 1..cell_count)
            .step_by(self.cells_per_label)
            .collect()
    }

    /// 将需要复核的单元格裁到共同的最小尺寸，纵向拼接后按比例缩小。
    ///
    /// # 错误
    /// - 没有可复核的单元格时返回 `InvalidInput`。
    pub fn build_preview(&self, cells: &[Cell]) -> Result<Preview> {
        let cell_indices = self.reviewed_indices(cells.len());
        let reviewed: Vec<&GrayImage> = cell_indices.iter().map(|&i| &cells[i].image).collect();

        let min_w = reviewed.iter().map(|img| img.width()).min();
        let min_h = reviewed.iter().map(|img| img.height()).min();
        let (Some(min_w), Some(min_h)) = (min_w, min_h) else {
            return Err(SliceError::invalid(format!(
                "没有可供复核的单元格（共 {} 个单元格）",
                cells.len()
            )));
        };

        let mut stack = GrayImage::new(min_w, min_h * reviewed.len() as u32);
        for (i, img) in reviewed.iter().enumerate() {
            let trimmed = imageops::crop_imm(*img, 0, 0, min_w, min_h).to_image();
            imageops::replace(&mut stack, &trimmed, 0, i64::from(min_h) * i as i64);
        }

        let target_w = ((f64::from(stack.width()) * self.preview_scale).round() as u32).max(1);
        let target_h = ((f64::from(stack.height()) * self.preview_scale).round() as u32).max(1);
        let image = imageops::resize(&stack, target_w, target_h, FilterType::Triangle);
        debug!(
            cells = cell_indices.len(),
            width = target_w,
            height = target_h,
            "built review preview"
        );
        Ok(Preview {
            image,
            cell_indices,
        })
    }

    /// 数量校验 -> 生成预览 -> 阻塞等待复核。
    ///
    /// # 错误
    /// - 数量不符返回 `CountMismatch`，不会截断或补齐
    /// - 复核人员拒绝返回 `ReviewRejected`
    pub fn verify<R: Reviewer + ?Sized>(
        &self,
        labels: &[String],
        cells: &[Cell],
        reviewer: &mut R,
    ) -> Result<VerifiedPage> {
        self.check_counts(labels.len(), cells.len())?;
        let preview = self.build_preview(cells)?;

        match reviewer.review(&preview)? {
            ReviewDecision::Approved => {
                info!(labels = labels.len(), cells = cells.len(), "review approved");
            }
            ReviewDecision::Rejected(reason) => {
                return Err(SliceError::ReviewRejected { reason });
            }
        }

        let pairs = labels
            .iter()
            .zip(preview.cell_indices.iter())
            .map(|(label, &cell_index)| LabeledCell {
                label: label.clone(),
                cell_index,
            })
            .collect();
        Ok(VerifiedPage { pairs, preview })
    }
}
