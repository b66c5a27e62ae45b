#![allow(dead_code)]

use image::{GrayImage, Luma};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

/// 合成表格的几何参数。
pub struct TableSpec {
    pub rows: u32,
    pub cols: u32,
    pub cell_w: u32,
    pub cell_h: u32,
    pub line: u32,
    pub margin: u32,
}

impl TableSpec {
    pub fn page_size(&self) -> (u32, u32) {
        (
            2 * self.margin + self.cols * self.cell_w + self.line,
            2 * self.margin + self.rows * self.cell_h + self.line,
        )
    }

    /// 第 `(row, col)` 个单元格左上角（表格线内侧）。
    pub fn cell_origin(&self, row: u32, col: u32) -> (u32, u32) {
        (
            self.margin + col * self.cell_w + self.line,
            self.margin + row * self.cell_h + self.line,
        )
    }
}

/// 白底 `background`、线条 `ink` 的规则表格。
fn draw_table(spec: &TableSpec, background: u8, ink: u8) -> GrayImage {
    let (width, height) = spec.page_size();
    let mut page = GrayImage::from_pixel(width, height, Luma([background]));
    let table_w = spec.cols * spec.cell_w + spec.line;
    let table_h = spec.rows * spec.cell_h + spec.line;
    for r in 0..=spec.rows {
        let y = spec.margin + r * spec.cell_h;
        draw_filled_rect_mut(
            &mut page,
            Rect::at(spec.margin as i32, y as i32).of_size(table_w, spec.line),
            Luma([ink]),
        );
    }
    for c in 0..=spec.cols {
        let x = spec.margin + c * spec.cell_w;
        draw_filled_rect_mut(
            &mut page,
            Rect::at(x as i32, spec.margin as i32).of_size(spec.line, table_h),
            Luma([ink]),
        );
    }
    page
}

/// 直接构造网格掩膜：背景 255，线条 0。
pub fn grid_mask(spec: &TableSpec) -> GrayImage {
    draw_table(spec, 255, 0)
}

/// 模拟扫描页：表格线加上每格里几块小墨迹。
pub fn scanned_page(spec: &TableSpec) -> GrayImage {
    let mut page = draw_table(spec, 245, 10);
    for r in 0..spec.rows {
        for c in 0..spec.cols {
            let (x, y) = spec.cell_origin(r, c);
            for i in 0..3 {
                let dot_x = x + 40 + i * 30;
                let dot_y = y + spec.cell_h / 2 - 10 + (i % 2) * 8;
                draw_filled_rect_mut(
                    &mut page,
                    Rect::at(dot_x as i32, dot_y as i32).of_size(8, 8),
                    Luma([30]),
                );
            }
        }
    }
    page
}
