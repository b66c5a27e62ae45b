use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use table_slice::{SliceConfig, SortAxis};

use crate::labels::{DEFAULT_ROWS_PER_PAGE, load_page_labels};

/// 切分参数：可从 JSON 配置读取，命令行参数覆盖同名字段。
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SliceOptions {
    /// JSON 配置文件，缺省字段使用内置默认值
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// 轮廓排序方向：left-to-right、right-to-left、top-to-bottom、bottom-to-top
    #[arg(long)]
    pub sort_axis: Option<SortAxis>,

    /// 单元格最小宽度（不含）
    #[arg(long)]
    pub width_min: Option<u32>,

    /// 单元格最小高度（不含）
    #[arg(long)]
    pub height_min: Option<u32>,

    /// 单元格最大高度（不含）
    #[arg(long)]
    pub height_max: Option<u32>,

    /// 只输出标注了检测框的二值图 debug.png
    #[arg(long, default_value_t = false)]
    pub debug: bool,

    /// 要求每行单元格数一致，否则报错
    #[arg(long, default_value_t = false)]
    pub strict: bool,
}

impl SliceOptions {
    /// 合并配置文件与命令行覆盖项后校验。
    pub fn load(&self) -> Result<SliceConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("打开配置文件失败：{}", path.display()))?;
                serde_json::from_reader(BufReader::new(file))
                    .with_context(|| format!("解析配置文件失败：{}", path.display()))?
            }
            None => SliceConfig::default(),
        };

        if let Some(axis) = self.sort_axis {
            config.sort_axis = axis;
        }
        if let Some(width_min) = self.width_min {
            config.width_min = width_min;
        }
        if let Some(height_min) = self.height_min {
            config.height_min = height_min;
        }
        if let Some(height_max) = self.height_max {
            config.height_max = height_max;
        }
        config.debug |= self.debug;
        config.require_rectangular |= self.strict;

        config.validate().context("切分配置无效")?;
        Ok(config)
    }
}

/// 标签、复核与输出相关的参数。
#[derive(clap::Args, Debug, Clone)]
pub struct OutputOptions {
    /// 标签 CSV（无表头，每行一条，取第一列）；调试模式下可省略
    #[arg(long, required_unless_present = "debug")]
    pub labels: Option<PathBuf>,

    /// 每页表格对应的标签数
    #[arg(long, default_value_t = DEFAULT_ROWS_PER_PAGE)]
    pub rows_per_page: usize,

    /// 标注清单路径，默认为输出目录下的 markup.csv
    #[arg(long)]
    pub markup: Option<PathBuf>,

    /// 写盘前拉伸对比度并加粗笔画
    #[arg(long, default_value_t = false)]
    pub enhance: bool,

    /// 跳过人工复核，直接通过
    #[arg(long, short = 'y', default_value_t = false)]
    pub yes: bool,

    /// 使用 OpenCV 窗口展示预览图进行复核
    #[cfg(feature = "highgui")]
    #[arg(long, default_value_t = false)]
    pub window: bool,
}

impl OutputOptions {
    /// 读取第 `page` 页的标签。
    pub fn page_labels(&self, page: usize) -> Result<Vec<String>> {
        let path = self
            .labels
            .as_deref()
            .context("缺少 --labels，非调试模式需要标签文件")?;
        load_page_labels(path, page, self.rows_per_page)
    }
}
