//! 扫描表格页面的单元格切分：二值化、提取表格线、轮廓排序、
//! 按行列重建网格，再裁剪出可供标注的单元格图像。
//!
//! 典型用法：先用 [`TableSlicer`] 处理整页得到单元格序列，
//! 再交给 [`VerificationGate`] 做数量校验与人工复核。

mod binarize;
mod config;
mod contours;
mod crop;
mod debug;
mod error;
mod geometry;
mod grid;
mod lines;
mod morphology;
mod slicer;
mod verify;

pub use binarize::{binarize, binarize_dynamic};
pub use config::{SliceConfig, SortAxis};
pub use contours::{SortedContour, sort_contours};
pub use crop::{Cell, CellCropper};
pub use debug::annotate_boxes;
pub use error::SliceError;
pub use geometry::BoundingBox;
pub use grid::{BoxFilter, CellGrid, GridReconstructor, GridRow, PlacedBox, column_anchors, segment_rows};
pub use lines::{LineExtractor, LineMasks};
pub use slicer::{PreparedPage, SliceOutcome, TableSlicer};
pub use verify::{
    AutoApprove, LabeledCell, Preview, ReviewDecision, Reviewer, VerificationGate, VerifiedPage,
};

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, SliceError>;
