//! 单元格外接矩形 -> 行列网格。

use tracing::debug;

use crate::config::SliceConfig;
use crate::geometry::BoundingBox;
use crate::{Result, SliceError};

/// 单元格尺寸过滤：宽度 > `width_min`，`height_min` < 高度 < `height_max`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxFilter {
    pub width_min: u32,
    pub height_min: u32,
    pub height_max: u32,
}

impl BoxFilter {
    pub fn from_config(config: &SliceConfig) -> Self {
        Self {
            width_min: config.width_min,
            height_min: config.height_min,
            height_max: config.height_max,
        }
    }

    pub fn accepts(&self, bbox: &BoundingBox) -> bool {
        bbox.width > self.width_min && bbox.height > self.height_min && bbox.height < self.height_max
    }

    /// 保留通过过滤的矩形，顺序不变。
    pub fn apply(&self, boxes: &[BoundingBox]) -> Vec<BoundingBox> {
        boxes.iter().copied().filter(|b| self.accepts(b)).collect()
    }
}

impl Default for BoxFilter {
    fn default() -> Self {
        Self::from_config(&SliceConfig::default())
    }
}

/// 单个矩形及其所在的行列。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedBox {
    pub row: usize,
    pub column: usize,
    pub bbox: BoundingBox,
}

/// 一行中的列槽位；槽位为空表示该列缺失，多个矩形表示重叠。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridRow {
    slots: Vec<Vec<BoundingBox>>,
}

impl GridRow {
    pub fn slots(&self) -> &[Vec<BoundingBox>] {
        &self.slots
    }

    /// 指定列的矩形（0-based）。
    pub fn slot(&self, column: usize) -> Option<&[BoundingBox]> {
        self.slots.get(column).map(|s| s.as_slice())
    }

    /// 非空槽位数量。
    pub fn populated(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_empty()).count()
    }
}

/// 重建后的表格网格，按行存储。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellGrid {
    rows: Vec<GridRow>,
    anchors: Vec<f64>,
}

impl CellGrid {
    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// 列数，即列锚点数量。
    pub fn column_count(&self) -> usize {
        self.anchors.len()
    }

    /// 列锚点（各列中心 x，升序）。
    pub fn anchors(&self) -> &[f64] {
        &self.anchors
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 按行、列、槽内发现顺序遍历所有矩形，空槽位自动跳过。
    pub fn iter(&self) -> impl Iterator<Item = PlacedBox> + '_ {
        self.rows.iter().enumerate().flat_map(|(row, grid_row)| {
            grid_row
                .slots
                .iter()
                .enumerate()
                .flat_map(move |(column, slot)| {
                    slot.iter().map(move |bbox| PlacedBox {
                        row,
                        column,
                        bbox: *bbox,
                    })
                })
        })
    }
}

/// 逐个扫描矩形、把纵坐标相近的归入同一行的累加器。
struct RowAccumulator {
    tolerance: f64,
    rows: Vec<Vec<BoundingBox>>,
    current: Vec<BoundingBox>,
    previous_y: Option<u32>,
}

impl RowAccumulator {
    fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            rows: Vec::new(),
            current: Vec::new(),
            previous_y: None,
        }
    }

    fn push(&mut self, bbox: BoundingBox) {
        if let Some(prev) = self.previous_y {
            if f64::from(bbox.y.abs_diff(prev)) > self.tolerance {
                self.rows.push(std::mem::take(&mut self.current));
            }
        }
        self.previous_y = Some(bbox.y);
        self.current.push(bbox);
    }

    fn finish(mut self) -> Vec<Vec<BoundingBox>> {
        if !self.current.is_empty() {
            self.rows.push(self.current);
        }
        self.rows
    }
}

/// 所有矩形的平均高度；无矩形时为 0。
pub fn mean_height(boxes: &[BoundingBox]) -> f64 {
    if boxes.is_empty() {
        return 0.0;
    }
    boxes.iter().map(|b| f64::from(b.height)).sum::<f64>() / boxes.len() as f64
}

/// 按 y 聚类为行。
///
/// - 输入需已按从上到下排序
/// - 与上一个矩形的 y 相差不超过平均高度一半时归入当前行，否则另起一行
/// - 每行内保持输入顺序，列位置稍后由锚点决定
pub fn segment_rows(boxes: &[BoundingBox]) -> Vec<Vec<BoundingBox>> {
    let mut acc = RowAccumulator::new(mean_height(boxes) / 2.0);
    for bbox in boxes {
        acc.push(*bbox);
    }
    acc.finish()
}

/// 取矩形最多的一行（并列时取最先出现的），以其各矩形中心 x 作为列锚点，升序。
pub fn column_anchors(rows: &[Vec<BoundingBox>]) -> Vec<f64> {
    let mut widest: Option<&Vec<BoundingBox>> = None;
    for row in rows {
        if widest.is_none_or(|w| row.len() > w.len()) {
            widest = Some(row);
        }
    }
    let mut anchors: Vec<f64> = widest
        .map(|row| row.iter().map(BoundingBox::center_x).collect())
        .unwrap_or_default();
    anchors.sort_by(f64::total_cmp);
    anchors
}

/// 距离 `position` 最近的锚点下标；距离相同时取靠左的一个。
fn nearest_anchor(anchors: &[f64], position: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, anchor) in anchors.iter().enumerate() {
        let distance = (anchor - position).abs();
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((idx, distance));
        }
    }
    best.map(|(idx, _)| idx)
}

/// 网格重建：尺寸过滤、行聚类、列锚点、逐个分配列。
#[derive(Debug, Clone, Copy)]
pub struct GridReconstructor {
    filter: BoxFilter,
    column_offset_fraction: f64,
    require_rectangular: bool,
}

impl Default for GridReconstructor {
    fn default() -> Self {
        Self::from_config(&SliceConfig::default())
    }
}

impl GridReconstructor {
    pub fn from_config(config: &SliceConfig) -> Self {
        Self {
            filter: BoxFilter::from_config(config),
            column_offset_fraction: config.column_offset_fraction,
            require_rectangular: config.require_rectangular,
        }
    }

    pub fn filter(&self) -> BoxFilter {
        self.filter
    }

    /// 从已排序的外接矩形重建网格。
    ///
    /// - 过滤后没有矩形时返回空网格
    /// - 每个矩形用 `x + width * column_offset_fraction` 与列锚点比较，归入最近的一列
    ///
    /// # 错误
    /// - 严格模式下某行矩形数与列数不同，返回 `GridTransposeFailure`。
    pub fn reconstruct(&self, sorted: &[BoundingBox]) -> Result<CellGrid> {
        let boxes = self.filter.apply(sorted);
        let ragged = segment_rows(&boxes);
        let anchors = column_anchors(&ragged);

        if self.require_rectangular {
            if let Some((row, cells)) = ragged
                .iter()
                .enumerate()
                .find(|(_, r)| r.len() != anchors.len())
            {
                return Err(SliceError::GridTransposeFailure {
                    row,
                    expected: anchors.len(),
                    actual: cells.len(),
                });
            }
        }

        let rows = ragged
            .iter()
            .map(|row| {
                let mut slots = vec![Vec::new(); anchors.len()];
                for bbox in row {
                    let position =
                        f64::from(bbox.x) + f64::from(bbox.width) * self.column_offset_fraction;
                    if let Some(column) = nearest_anchor(&anchors, position) {
                        slots[column].push(*bbox);
                    }
                }
                GridRow { slots }
            })
            .collect::<Vec<_>>();

        debug!(
            boxes = boxes.len(),
            rows = rows.len(),
            columns = anchors.len(),
            "reconstructed grid"
        );
        Ok(CellGrid { rows, anchors })
    }
}
