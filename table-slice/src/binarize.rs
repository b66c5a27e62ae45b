use image::{DynamicImage, GrayImage};
use imageproc::contrast::{ThresholdType, otsu_level, threshold};
use tracing::debug;

use crate::{Result, SliceError};

/// 反相二值化：不高于阈值的暗像素记为墨迹 255，其余为 0。
///
/// 阈值由 Otsu 自动选取；整页只有一种灰度时 Otsu 无从分割，改用 `seed_threshold`。
///
/// # 错误
/// - 图像宽或高为 0 时返回 `InvalidInput`。
pub fn binarize(page: &GrayImage, seed_threshold: u8) -> Result<GrayImage> {
    let (width, height) = page.dimensions();
    if width == 0 || height == 0 {
        return Err(SliceError::invalid(format!(
            "页面图像为空（{width}x{height}）"
        )));
    }

    let level = if is_flat(page) {
        seed_threshold
    } else {
        otsu_level(page)
    };
    debug!(width, height, level, "binarize page");
    Ok(threshold(page, level, ThresholdType::BinaryInverted))
}

/// 接受 `DynamicImage`，仅允许 8 位单通道灰度图。
pub fn binarize_dynamic(page: &DynamicImage, seed_threshold: u8) -> Result<GrayImage> {
    let gray = as_single_channel(page)?;
    binarize(gray, seed_threshold)
}

pub(crate) fn as_single_channel(page: &DynamicImage) -> Result<&GrayImage> {
    page.as_luma8().ok_or_else(|| {
        SliceError::invalid(format!(
            "页面必须是 8 位单通道灰度图，实际为 {:?}（{}x{}）",
            page.color(),
            page.width(),
            page.height()
        ))
    })
}

fn is_flat(page: &GrayImage) -> bool {
    let mut pixels = page.as_raw().iter();
    match pixels.next() {
        Some(&first) => pixels.all(|&p| p == first),
        None => true,
    }
}
