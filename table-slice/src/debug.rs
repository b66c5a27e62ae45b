use image::{GrayImage, Luma};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use crate::geometry::BoundingBox;

/// 在二值图副本上用粗线框标出每个检测框，便于目视检查尺寸过滤是否合适。
///
/// 线宽以矩形边为中心，超出画布的部分自动裁掉。
pub fn annotate_boxes(binary: &GrayImage, boxes: &[BoundingBox], thickness: u32) -> GrayImage {
    let mut canvas = binary.clone();
    let color = Luma([255u8]);
    let half = (thickness / 2) as i32;
    let t = thickness.max(1);

    for bbox in boxes {
        let left = bbox.x as i32 - half;
        let top = bbox.y as i32 - half;
        let outer_w = bbox.width + t;
        let outer_h = bbox.height + t;
        let right = bbox.right() as i32 - half;
        let bottom = bbox.bottom() as i32 - half;

        draw_filled_rect_mut(&mut canvas, Rect::at(left, top).of_size(outer_w, t), color);
        draw_filled_rect_mut(&mut canvas, Rect::at(left, bottom).of_size(outer_w, t), color);
        draw_filled_rect_mut(&mut canvas, Rect::at(left, top).of_size(t, outer_h), color);
        draw_filled_rect_mut(&mut canvas, Rect::at(right, top).of_size(t, outer_h), color);
    }
    canvas
}
