use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// 标注清单中的一条记录：标签文本与对应的手写单元格图像。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupEntry {
    pub label: String,
    pub image: PathBuf,
}

/// 追加写入 `label,image` 清单，文件首次创建时写表头。
///
/// 路径统一使用 `/` 分隔，便于跨平台读取。
pub fn append_markup(path: &Path, entries: &[MarkupEntry]) -> Result<()> {
    anyhow::ensure!(!entries.is_empty(), "没有可写入的标注记录");

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("无法创建清单目录 {}", parent.display()))?;
        }
    }

    let is_new = !path.exists();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("打开清单文件失败：{}", path.display()))?;
    let mut wtr = csv::Writer::from_writer(file);
    if is_new {
        wtr.write_record(["label", "image"])?;
    }
    for entry in entries {
        let image = entry.image.to_string_lossy().replace('\\', "/");
        wtr.write_record([entry.label.as_str(), image.as_str()])?;
    }
    wtr.flush()
        .with_context(|| format!("写入清单文件失败：{}", path.display()))?;
    Ok(())
}
