use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};
use imageproc::point::Point;

use crate::config::SortAxis;
use crate::geometry::BoundingBox;

/// 一条轮廓及其外接矩形。
#[derive(Debug, Clone)]
pub struct SortedContour {
    pub points: Vec<Point<u32>>,
    pub border_type: BorderType,
    pub bbox: BoundingBox,
}

/// 提取掩膜中非零区域的全部轮廓（外边界与孔洞边界），并按外接矩形排序。
///
/// - 水平方向按 `x`、竖直方向按 `y` 排序
/// - `right-to-left` / `bottom-to-top` 为降序
/// - 稳定排序，坐标相同的轮廓保持发现顺序
pub fn sort_contours(mask: &GrayImage, axis: SortAxis) -> Vec<SortedContour> {
    let mut contours: Vec<SortedContour> = find_contours::<u32>(mask)
        .into_iter()
        .filter_map(|contour| {
            let bbox = bounding_rect(&contour.points)?;
            Some(SortedContour {
                points: contour.points,
                border_type: contour.border_type,
                bbox,
            })
        })
        .collect();

    let key = |c: &SortedContour| {
        if axis.is_vertical() {
            c.bbox.y
        } else {
            c.bbox.x
        }
    };
    if axis.is_descending() {
        contours.sort_by(|a, b| key(b).cmp(&key(a)));
    } else {
        contours.sort_by_key(key);
    }
    contours
}

/// 点集的最小外接矩形（含端点）。
fn bounding_rect(points: &[Point<u32>]) -> Option<BoundingBox> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(BoundingBox::new(
        min_x,
        min_y,
        max_x - min_x + 1,
        max_y - min_y + 1,
    ))
}
