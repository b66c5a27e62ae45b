//! 矩形结构元素的形态学运算与逐像素运算。

use image::{GrayImage, Luma};
use imageproc::morphology::{Mask, grayscale_dilate, grayscale_erode};

/// `Mask` 支持的最大边长。
pub(crate) const MAX_ELEMENT: u32 = 511;

/// 构造 `width x height` 的全 1 矩形结构元素，锚点位于 `(width / 2, height / 2)`。
pub(crate) fn rect_element(width: u32, height: u32) -> Mask {
    let width = width.clamp(1, MAX_ELEMENT);
    let height = height.clamp(1, MAX_ELEMENT);
    let pattern = GrayImage::from_pixel(width, height, Luma([255]));
    Mask::from_image(&pattern, (width / 2) as u8, (height / 2) as u8)
}

/// 连续腐蚀 `iterations` 次。
pub(crate) fn erode(image: &GrayImage, element: &Mask, iterations: u32) -> GrayImage {
    let mut output = image.clone();
    for _ in 0..iterations {
        output = grayscale_erode(&output, element);
    }
    output
}

/// 连续膨胀 `iterations` 次。
pub(crate) fn dilate(image: &GrayImage, element: &Mask, iterations: u32) -> GrayImage {
    let mut output = image.clone();
    for _ in 0..iterations {
        output = grayscale_dilate(&output, element);
    }
    output
}

pub(crate) fn invert(image: &GrayImage) -> GrayImage {
    let mut output = image.clone();
    image::imageops::invert(&mut output);
    output
}

/// 两幅图等权重相加（各 0.5），结果四舍五入。
pub(crate) fn blend_equal(a: &GrayImage, b: &GrayImage) -> GrayImage {
    zip_pixels(a, b, |p, q| ((p as u16 + q as u16 + 1) / 2) as u8)
}

pub(crate) fn bitwise_xor(a: &GrayImage, b: &GrayImage) -> GrayImage {
    zip_pixels(a, b, |p, q| p ^ q)
}

/// 调用方保证两幅图尺寸一致。
fn zip_pixels(a: &GrayImage, b: &GrayImage, op: impl Fn(u8, u8) -> u8) -> GrayImage {
    debug_assert_eq!(a.dimensions(), b.dimensions());
    let raw = a
        .as_raw()
        .iter()
        .zip(b.as_raw().iter())
        .map(|(&p, &q)| op(p, q))
        .collect();
    GrayImage::from_raw(a.width(), a.height(), raw).unwrap_or_else(|| GrayImage::new(0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_image(height: u32, ink_rows: std::ops::Range<u32>) -> GrayImage {
        GrayImage::from_fn(3, height, |_, y| {
            if ink_rows.contains(&y) { Luma([255]) } else { Luma([0]) }
        })
    }

    #[test]
    fn vertical_opening_keeps_long_strokes_only() {
        let element = rect_element(1, 4);
        let long = column_image(40, 5..30);
        let opened = dilate(&erode(&long, &element, 2), &element, 2);
        assert_eq!(opened.get_pixel(1, 15)[0], 255);

        let short = column_image(40, 5..9);
        let opened = dilate(&erode(&short, &element, 2), &element, 2);
        assert!(opened.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn blend_rounds_half_up() {
        let a = GrayImage::from_pixel(2, 1, Luma([255]));
        let b = GrayImage::from_raw(2, 1, vec![0, 255]).unwrap();
        let blended = blend_equal(&a, &b);
        assert_eq!(blended.as_raw(), &vec![128, 255]);
    }

    #[test]
    fn xor_then_invert_cancels_matching_ink() {
        let page = GrayImage::from_raw(3, 1, vec![0, 255, 0]).unwrap();
        let lines = GrayImage::from_raw(3, 1, vec![0, 255, 255]).unwrap();
        let content = invert(&bitwise_xor(&page, &lines));
        assert_eq!(content.as_raw(), &vec![255, 255, 0]);
    }
}
