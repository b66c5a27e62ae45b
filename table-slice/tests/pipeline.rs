mod common;

use common::{TableSpec, grid_mask, scanned_page};
use pretty_assertions::assert_eq;
use table_slice::{
    AutoApprove, BoundingBox, GridReconstructor, SliceConfig, SliceError, SliceOutcome, SortAxis,
    TableSlicer, VerificationGate, sort_contours,
};

fn three_by_two() -> TableSpec {
    TableSpec {
        rows: 3,
        cols: 2,
        cell_w: 500,
        cell_h: 200,
        line: 3,
        margin: 100,
    }
}

fn labels(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("样例 {i}")).collect()
}

#[test]
fn ruled_page_yields_row_major_cells_and_passes_gate() {
    let spec = three_by_two();
    let page = scanned_page(&spec);
    let slicer = TableSlicer::new(SliceConfig::default()).unwrap();

    let cells = slicer.cells(&page).unwrap();
    assert_eq!(cells.len(), 6);

    let positions: Vec<(usize, usize)> = cells.iter().map(|c| (c.row, c.column)).collect();
    assert_eq!(
        positions,
        vec![(0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (2, 1)]
    );

    for cell in &cells {
        assert_eq!(cell.image.width(), 2 * (cell.bbox.width + 4));
        assert_eq!(cell.image.height(), 2 * (cell.bbox.height + 4));

        // 去掉补边后，内部的暗像素只可能来自墨迹
        let (w, h) = cell.image.dimensions();
        let inked = (12..h - 12)
            .flat_map(|y| (12..w - 12).map(move |x| (x, y)))
            .filter(|&(x, y)| cell.image.get_pixel(x, y)[0] < 128)
            .count();
        assert!(inked > 0, "cell ({}, {}) lost its ink", cell.row, cell.column);
        assert!(cell.image.get_pixel(w / 2, 14)[0] > 128);
    }

    let verified = VerificationGate::default()
        .verify(&labels(3), &cells, &mut AutoApprove)
        .unwrap();
    let indices: Vec<usize> = verified.pairs.iter().map(|p| p.cell_index).collect();
    assert_eq!(indices, vec![1, 3, 5]);
}

#[test]
fn gate_rejects_off_by_one_label_counts() {
    let page = scanned_page(&three_by_two());
    let cells = TableSlicer::new(SliceConfig::default())
        .unwrap()
        .cells(&page)
        .unwrap();
    let gate = VerificationGate::default();

    for n in [2, 4] {
        let err = gate.verify(&labels(n), &cells, &mut AutoApprove).unwrap_err();
        assert!(matches!(err, SliceError::CountMismatch { cells: 6, .. }));
    }
}

#[test]
fn slicing_is_deterministic() {
    let page = scanned_page(&three_by_two());
    let slicer = TableSlicer::new(SliceConfig::default()).unwrap();
    let first: Vec<BoundingBox> = slicer.cells(&page).unwrap().iter().map(|c| c.bbox).collect();
    let second: Vec<BoundingBox> = slicer.cells(&page).unwrap().iter().map(|c| c.bbox).collect();
    assert_eq!(first, second);
}

#[test]
fn grid_mask_reconstructs_every_row_and_column() {
    let spec = TableSpec {
        rows: 4,
        cols: 3,
        cell_w: 200,
        cell_h: 150,
        line: 4,
        margin: 50,
    };
    let mask = grid_mask(&spec);
    let boxes: Vec<BoundingBox> = sort_contours(&mask, SortAxis::TopToBottom)
        .into_iter()
        .map(|c| c.bbox)
        .collect();

    let grid = GridReconstructor::default().reconstruct(&boxes).unwrap();
    assert_eq!(grid.row_count(), 4);
    assert_eq!(grid.column_count(), 3);
    for row in grid.rows() {
        assert_eq!(row.populated(), 3);
    }

    let first = grid.iter().next().unwrap();
    let (x, y) = spec.cell_origin(0, 0);
    assert_eq!((first.bbox.x, first.bbox.y), (x, y));
    assert_eq!((first.bbox.width, first.bbox.height), (196, 146));
}

#[test]
fn debug_mode_returns_annotated_mask() {
    let spec = three_by_two();
    let page = scanned_page(&spec);
    let config = SliceConfig {
        debug: true,
        ..SliceConfig::default()
    };
    let slicer = TableSlicer::new(config).unwrap();

    let SliceOutcome::Debug(annotated) = slicer.slice(&page).unwrap() else {
        panic!("debug mode must return the annotated mask");
    };
    assert_eq!(annotated.dimensions(), spec.page_size());

    // 单元格中部在二值图里是背景，标注框的边落在单元格上沿
    let prepared = slicer.prepare(&page).unwrap();
    let (x, y) = spec.cell_origin(0, 0);
    assert_eq!(prepared.binary.get_pixel(x + 250, y + 100)[0], 0);
    assert_eq!(annotated.get_pixel(x + 250, y + 100)[0], 0);
    assert_eq!(annotated.get_pixel(x + 250, y + 5)[0], 255);
}
