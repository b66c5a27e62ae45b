use image::GrayImage;
use imageproc::contrast::{ThresholdType, otsu_level, threshold};
use tracing::debug;

use crate::config::SliceConfig;
use crate::morphology::{self, MAX_ELEMENT, rect_element};
use crate::{Result, SliceError};

/// 表格线提取结果。
#[derive(Debug, Clone)]
pub struct LineMasks {
    /// 仅含表格线的掩膜：背景 255，线条 0。
    pub grid: GrayImage,
    /// 去掉表格线后的原图（墨迹为暗色）。
    pub content: GrayImage,
}

/// 通过方向性形态学开运算分离横线与竖线。
#[derive(Debug, Clone, Copy)]
pub struct LineExtractor {
    scale_divisor: u32,
    line_iterations: u32,
    cleanup_iterations: u32,
}

impl Default for LineExtractor {
    fn default() -> Self {
        Self::from_config(&SliceConfig::default())
    }
}

impl LineExtractor {
    pub fn from_config(config: &SliceConfig) -> Self {
        Self {
            scale_divisor: config.line_scale_divisor.max(1),
            line_iterations: config.line_iterations,
            cleanup_iterations: config.cleanup_iterations,
        }
    }

    /// 线段核长度：页面宽度 / 200，过窄的页面退化为 1。
    pub fn kernel_len(&self, page_width: u32) -> u32 {
        (page_width / self.scale_divisor).clamp(1, MAX_ELEMENT)
    }

    /// 从原图与二值图中得到网格掩膜和去线后的内容图。
    ///
    /// - 竖线：用 `1 x k` 竖向核先腐蚀再膨胀，只有足够长的竖向笔画能保留
    /// - 横线：对称地使用 `k x 1` 横向核
    /// - 两者等权合并后反相，用 2x2 核腐蚀加粗线条，再以 Otsu 重新二值化
    /// - 内容图 = NOT(原图 XOR 网格掩膜)
    ///
    /// # 错误
    /// - 原图与二值图尺寸不一致时返回 `InvalidInput`。
    pub fn extract(&self, page: &GrayImage, binary: &GrayImage) -> Result<LineMasks> {
        if page.dimensions() != binary.dimensions() {
            return Err(SliceError::invalid(format!(
                "原图 {:?} 与二值图 {:?} 尺寸不一致",
                page.dimensions(),
                binary.dimensions()
            )));
        }

        let k = self.kernel_len(page.width());
        let vertical_element = rect_element(1, k);
        let horizontal_element = rect_element(k, 1);

        let vertical = morphology::dilate(
            &morphology::erode(binary, &vertical_element, self.line_iterations),
            &vertical_element,
            self.line_iterations,
        );
        let horizontal = morphology::dilate(
            &morphology::erode(binary, &horizontal_element, self.line_iterations),
            &horizontal_element,
            self.line_iterations,
        );

        let combined = morphology::blend_equal(&vertical, &horizontal);
        let thickened = morphology::erode(
            &morphology::invert(&combined),
            &rect_element(2, 2),
            self.cleanup_iterations,
        );
        let level = otsu_level(&thickened);
        let grid = threshold(&thickened, level, ThresholdType::Binary);
        debug!(kernel_len = k, level, "extracted ruling lines");

        let content = morphology::invert(&morphology::bitwise_xor(page, &grid));
        Ok(LineMasks { grid, content })
    }
}
