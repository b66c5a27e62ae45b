use std::path::Path;

use anyhow::{Context, Result};

/// 默认每页表格的标签行数。
pub const DEFAULT_ROWS_PER_PAGE: usize = 20;

/// 读取第 `page` 页（从 1 开始）对应的标签。
///
/// - 标签文件为无表头的 CSV，每条记录取第一列
/// - 第 `p` 页覆盖记录 `(p - 1) * rows_per_page .. p * rows_per_page`
/// - 页码超出文件末尾时返回空列表，由校验环节报告数量不符
///
/// # 错误
/// - 页码为 0、`rows_per_page` 为 0 或文件无法解析时返回错误。
pub fn load_page_labels(path: &Path, page: usize, rows_per_page: usize) -> Result<Vec<String>> {
    anyhow::ensure!(page >= 1, "页码从 1 开始，收到 {page}");
    anyhow::ensure!(rows_per_page >= 1, "每页标签数必须大于 0");

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("打开标签文件失败：{}", path.display()))?;

    let offset = (page - 1) * rows_per_page;
    let mut labels = Vec::with_capacity(rows_per_page);
    for record in reader.records().skip(offset).take(rows_per_page) {
        let record = record.with_context(|| format!("解析标签文件失败：{}", path.display()))?;
        labels.push(record.get(0).unwrap_or_default().to_string());
    }
    Ok(labels)
}
