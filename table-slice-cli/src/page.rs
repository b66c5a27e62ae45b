use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::GrayImage;
use table_slice::{Cell, Reviewer, SliceOutcome, VerificationGate};
use tracing::info;

use crate::enhance::enhance;
use crate::markup::{MarkupEntry, append_markup};
use crate::review::SavePreview;

/// 复核预览图的文件名。
pub const CONTROL_FILE: &str = "control.png";
/// 调试模式下标注图的文件名。
pub const DEBUG_FILE: &str = "debug.png";

/// 单页的处理结果摘要。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageReport {
    /// 调试模式，只写出了标注图。
    Debug { path: PathBuf },
    /// 单元格已写出，复核通过并追加到标注清单。
    Sliced { cells: usize, labeled: usize },
}

/// 以灰度方式读取扫描页。
pub fn load_page(path: &Path) -> Result<GrayImage> {
    let image = image::open(path).with_context(|| format!("载入图像失败：{}", path.display()))?;
    Ok(image.into_luma8())
}

/// 单元格文件名：`000.png`、`001.png`……
pub fn cell_file_name(index: usize) -> String {
    format!("{index:03}.png")
}

/// 按序写出全部单元格，返回写出的路径。
pub fn write_cells(cells: &[Cell], dir: &Path, enhanced: bool) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("无法创建输出目录 {}", dir.display()))?;
    cells
        .iter()
        .enumerate()
        .map(|(index, cell)| -> Result<PathBuf> {
            let path = dir.join(cell_file_name(index));
            let result = if enhanced {
                enhance(&cell.image).save(&path)
            } else {
                cell.image.save(&path)
            };
            result.with_context(|| format!("写入单元格失败：{}", path.display()))?;
            Ok(path)
        })
        .collect()
}

/// 切分之后的收尾：写单元格 -> 写预览并复核 -> 追加标注清单。
///
/// - 调试模式只写 `debug.png`，不读标签也不复核
/// - 数量不符或复核被拒时不写清单，已写出的单元格保留以便排查
pub fn finish_page<R: Reviewer + ?Sized>(
    outcome: SliceOutcome,
    labels: &[String],
    gate: &VerificationGate,
    reviewer: &mut R,
    out_dir: &Path,
    markup: &Path,
    enhanced: bool,
) -> Result<PageReport> {
    let cells = match outcome {
        SliceOutcome::Debug(annotated) => {
            fs::create_dir_all(out_dir)
                .with_context(|| format!("无法创建输出目录 {}", out_dir.display()))?;
            let path = out_dir.join(DEBUG_FILE);
            annotated
                .save(&path)
                .with_context(|| format!("写入调试图失败：{}", path.display()))?;
            return Ok(PageReport::Debug { path });
        }
        SliceOutcome::Cells(cells) => cells,
    };

    let paths = write_cells(&cells, out_dir, enhanced)?;
    let mut reviewer = SavePreview {
        path: out_dir.join(CONTROL_FILE),
        inner: reviewer,
    };
    let verified = gate
        .verify(labels, &cells, &mut reviewer)
        .with_context(|| format!("页面校验失败：{}", out_dir.display()))?;

    let entries: Vec<MarkupEntry> = verified
        .pairs
        .iter()
        .map(|pair| MarkupEntry {
            label: pair.label.clone(),
            image: paths[pair.cell_index].clone(),
        })
        .collect();
    append_markup(markup, &entries)?;
    info!(
        cells = cells.len(),
        labeled = entries.len(),
        output = %out_dir.display(),
        "page written"
    );
    Ok(PageReport::Sliced {
        cells: cells.len(),
        labeled: entries.len(),
    })
}
