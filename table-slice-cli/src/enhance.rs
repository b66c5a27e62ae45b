use image::{GrayImage, Luma};
use imageproc::morphology::{Mask, grayscale_erode};

/// 提高对比度并加粗笔画，只作用于写盘的单元格图像。
///
/// - 将 `[min, max]` 线性拉伸到 `[0, 255]`，纯色图像保持不变
/// - 再做一次 3x3 灰度腐蚀，使暗色笔画变粗
pub fn enhance(cell: &GrayImage) -> GrayImage {
    grayscale_erode(&stretch_contrast(cell), &Mask::square(1))
}

/// 线性拉伸灰度范围。
pub fn stretch_contrast(image: &GrayImage) -> GrayImage {
    let mut pixels = image.pixels().map(|p| p[0]);
    let Some(first) = pixels.next() else {
        return image.clone();
    };
    let (min, max) = pixels.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if min == max {
        return image.clone();
    }

    let range = f32::from(max - min);
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let scaled = f32::from(pixel[0] - min) / range * 255.0;
        *pixel = Luma([scaled.round() as u8]);
    }
    out
}
