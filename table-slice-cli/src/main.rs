mod enhance;
mod labels;
mod markup;
mod options;
mod page;
mod review;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use table_slice::{AutoApprove, Reviewer, SliceOutcome, TableSlicer, VerificationGate};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use crate::options::{OutputOptions, SliceOptions};
use crate::page::{PageReport, finish_page, load_page};
use crate::review::PromptReviewer;

/// 命令行入口：单页切分或整目录批处理。
#[derive(Parser, Debug)]
#[command(
    name = "table-slice",
    version,
    about = "将扫描的手写表格切分为单元格图像并生成标注清单"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 切分单张扫描页
    Slice(SliceCommand),
    /// 切分目录下所有以页码命名的扫描页
    Batch(BatchCommand),
}

#[derive(clap::Args, Debug)]
struct SliceCommand {
    /// 扫描页图像
    #[arg(long)]
    image: PathBuf,

    /// 页码（从 1 开始），决定读取哪一段标签
    #[arg(long)]
    page: usize,

    /// 单元格输出目录
    #[arg(long)]
    output: PathBuf,

    #[command(flatten)]
    slice: SliceOptions,

    #[command(flatten)]
    out: OutputOptions,
}

#[derive(clap::Args, Debug)]
struct BatchCommand {
    /// 输入目录，文件名（不含扩展名）即页码，如 `3.png`
    #[arg(long)]
    input: PathBuf,

    /// 输出目录，每页写入 `<output>/<页码>/`
    #[arg(long)]
    output: PathBuf,

    #[command(flatten)]
    slice: SliceOptions,

    #[command(flatten)]
    out: OutputOptions,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Slice(cmd) => run_slice(cmd),
        Command::Batch(cmd) => run_batch(cmd),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("table_slice=info,table_slice_cli=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

/// `--yes` 自动通过；启用 highgui 且指定 `--window` 时使用窗口；否则在终端提问。
fn make_reviewer(out: &OutputOptions) -> Box<dyn Reviewer> {
    if out.yes {
        return Box::new(AutoApprove);
    }
    #[cfg(feature = "highgui")]
    if out.window {
        return Box::new(review::WindowReviewer::new("control"));
    }
    Box::new(PromptReviewer::stdin())
}

fn markup_path(out: &OutputOptions, output: &Path) -> PathBuf {
    out.markup
        .clone()
        .unwrap_or_else(|| output.join("markup.csv"))
}

/// 切分单页并写出结果。
fn run_slice(cmd: SliceCommand) -> Result<()> {
    let config = cmd.slice.load()?;
    let gate = VerificationGate::from_config(&config);
    let slicer = TableSlicer::new(config)?;

    let page = load_page(&cmd.image)?;
    let outcome = slicer
        .slice(&page)
        .with_context(|| format!("切分失败：{}", cmd.image.display()))?;
    let labels = match outcome {
        SliceOutcome::Debug(_) => Vec::new(),
        SliceOutcome::Cells(_) => cmd.out.page_labels(cmd.page)?,
    };

    let mut reviewer = make_reviewer(&cmd.out);
    let markup = markup_path(&cmd.out, &cmd.output);
    let report = finish_page(
        outcome,
        &labels,
        &gate,
        reviewer.as_mut(),
        &cmd.output,
        &markup,
        cmd.out.enhance,
    )?;

    match report {
        PageReport::Debug { path } => println!("调试图已生成：{}", path.display()),
        PageReport::Sliced { cells, labeled } => println!(
            "完成切分：{} 个单元格，{} 条标注写入 {}",
            cells,
            labeled,
            markup.display()
        ),
    }
    Ok(())
}

/// 按线程数分批并行切分页面，每批再按页码顺序逐页复核与写出。
///
/// - 同一时刻只保留一批页面的单元格图像
/// - 单页失败只记录错误并继续，结束时汇总失败页数
/// - 标注清单只在主线程写入
fn run_batch(cmd: BatchCommand) -> Result<()> {
    anyhow::ensure!(
        cmd.input.is_dir(),
        "输入路径必须是有效目录：{}",
        cmd.input.display()
    );
    let config = cmd.slice.load()?;
    let gate = VerificationGate::from_config(&config);
    let slicer = TableSlicer::new(config)?;

    let pages = collect_pages(&cmd.input)?;
    anyhow::ensure!(!pages.is_empty(), "目录中没有以页码命名的图像：{}", cmd.input.display());
    info!(pages = pages.len(), "slicing pages");

    let markup = markup_path(&cmd.out, &cmd.output);
    let mut reviewer = make_reviewer(&cmd.out);
    let mut written_cells = 0usize;
    let mut labeled = 0usize;
    let mut failed = 0usize;

    for_each_chunk(
        &pages,
        rayon::current_num_threads(),
        |(_, path)| {
            load_page(path).and_then(|page| {
                slicer
                    .slice(&page)
                    .with_context(|| format!("切分失败：{}", path.display()))
            })
        },
        |(number, path), outcome| {
            let number = *number;
            let out_dir = cmd.output.join(number.to_string());
            let result = outcome.and_then(|outcome| -> Result<PageReport> {
                let labels = match outcome {
                    SliceOutcome::Debug(_) => Vec::new(),
                    SliceOutcome::Cells(_) => cmd.out.page_labels(number)?,
                };
                finish_page(
                    outcome,
                    &labels,
                    &gate,
                    reviewer.as_mut(),
                    &out_dir,
                    &markup,
                    cmd.out.enhance,
                )
            });

            match result {
                Ok(PageReport::Sliced { cells, labeled: n }) => {
                    written_cells += cells;
                    labeled += n;
                }
                Ok(PageReport::Debug { path }) => {
                    info!(page = number, debug = %path.display(), "debug image written");
                }
                Err(err) => {
                    failed += 1;
                    error!(page = number, image = %path.display(), "page failed: {err:#}");
                }
            }
        },
    );

    println!(
        "完成批处理：{} 个单元格，{} 条标注，失败 {} 页，输出目录：{}",
        written_cells,
        labeled,
        failed,
        cmd.output.display()
    );
    anyhow::ensure!(failed == 0, "{failed} 页处理失败，详见日志");
    Ok(())
}

/// 每批 `chunk_size` 项：先并行执行 `work`，再按原顺序依次交给 `finish`。
///
/// 下一批开始前，上一批的结果都已交给 `finish` 处理完毕。
fn for_each_chunk<T, U>(
    items: &[T],
    chunk_size: usize,
    work: impl Fn(&T) -> U + Sync,
    mut finish: impl FnMut(&T, U),
) where
    T: Sync,
    U: Send,
{
    for chunk in items.chunks(chunk_size.max(1)) {
        let results: Vec<U> = chunk.par_iter().map(&work).collect();
        for (item, result) in chunk.iter().zip(results) {
            finish(item, result);
        }
    }
}

/// 收集文件名为页码的图像，按页码升序返回。
fn collect_pages(input: &Path) -> Result<Vec<(usize, PathBuf)>> {
    let mut pages = Vec::new();
    for entry in WalkDir::new(input)
        .max_depth(1)
        .into_iter()
        .filter_map(|res| res.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() || !is_supported_image(path) {
            continue;
        }
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .context("文件名需为有效的 UTF-8 字符串")?;
        match stem.parse::<usize>() {
            Ok(number) if number >= 1 => pages.push((number, path.to_path_buf())),
            _ => warn!(image = %path.display(), "file name is not a page number, skipped"),
        }
    }
    pages.sort_by_key(|(number, _)| *number);
    Ok(pages)
}

/// 过滤文件扩展名，仅允许 PNG/JPG/JPEG。
fn is_supported_image(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if ext == "png" || ext == "jpg" || ext == "jpeg"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn chunks_are_finished_before_next_chunk_starts() {
        let events = std::sync::Mutex::new(Vec::new());
        let items: Vec<usize> = (0..5).collect();
        for_each_chunk(
            &items,
            2,
            |&i| {
                events.lock().unwrap().push(format!("slice {i}"));
                i * 10
            },
            |&i, result| {
                assert_eq!(result, i * 10);
                events.lock().unwrap().push(format!("write {i}"));
            },
        );

        let events = events.into_inner().unwrap();
        let position = |name: &str| events.iter().position(|e| e == name).unwrap();
        assert!(position("write 1") < position("slice 2"));
        assert!(position("write 3") < position("slice 4"));
        let writes: Vec<&str> = events
            .iter()
            .map(String::as_str)
            .filter(|e| e.starts_with("write"))
            .collect();
        assert_eq!(writes, vec!["write 0", "write 1", "write 2", "write 3", "write 4"]);
    }

    #[test]
    fn debug_run_does_not_need_labels() {
        let cli = Cli::try_parse_from([
            "table-slice",
            "slice",
            "--image",
            "scan.png",
            "--page",
            "1",
            "--output",
            "out",
            "--debug",
        ])
        .unwrap();
        let Command::Slice(cmd) = cli.command else {
            panic!("expected slice command");
        };
        assert!(cmd.out.labels.is_none());
        assert!(cmd.out.page_labels(1).is_err());

        let missing = Cli::try_parse_from([
            "table-slice",
            "slice",
            "--image",
            "scan.png",
            "--page",
            "1",
            "--output",
            "out",
        ]);
        assert!(missing.is_err());
    }

    #[test]
    fn pages_are_collected_by_number() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["10.jpg", "2.png", "cover.png", "3.txt", "0.png"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("7.png")).unwrap();

        let pages = collect_pages(dir.path()).unwrap();
        let numbers: Vec<usize> = pages.iter().map(|(n, _)| *n).collect();
        assert_eq!(numbers, vec![2, 10]);
    }

    #[test]
    fn slice_command_parses_overrides() {
        let cli = Cli::try_parse_from([
            "table-slice",
            "slice",
            "--image",
            "scan.png",
            "--page",
            "3",
            "--output",
            "out",
            "--labels",
            "labels.csv",
            "--sort-axis",
            "left-to-right",
            "--height-max",
            "450",
            "--yes",
        ])
        .unwrap();
        let Command::Slice(cmd) = cli.command else {
            panic!("expected slice command");
        };
        assert_eq!(cmd.page, 3);
        assert!(cmd.out.yes);
        assert_eq!(cmd.out.rows_per_page, 20);
        let config = cmd.slice.load().unwrap();
        assert_eq!(config.height_max, 450);
        assert_eq!(config.sort_axis, table_slice::SortAxis::LeftToRight);
    }

    #[test]
    fn unknown_sort_axis_is_a_usage_error() {
        let result = Cli::try_parse_from([
            "table-slice",
            "batch",
            "--input",
            "scans",
            "--output",
            "out",
            "--labels",
            "labels.csv",
            "--sort-axis",
            "diagonal",
        ]);
        assert!(result.is_err());
    }
}
