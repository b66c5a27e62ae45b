use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use table_slice::{Preview, ReviewDecision, Reviewer, SliceError};
use tracing::debug;

/// 在终端提示复核：`Enter`/`y` 通过，`n` 拒绝。
///
/// 预览图已由 [`SavePreview`] 写到磁盘，这里只负责读取答复。
pub struct PromptReviewer<R, W> {
    input: R,
    output: W,
}

impl PromptReviewer<io::StdinLock<'static>, io::Stdout> {
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> PromptReviewer<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, preview: &Preview) -> io::Result<ReviewDecision> {
        loop {
            write!(
                self.output,
                "共 {} 个手写单元格，预览是否对齐？[Y/n] ",
                preview.cell_indices.len()
            )?;
            self.output.flush()?;

            let mut answer = String::new();
            if self.input.read_line(&mut answer)? == 0 {
                return Ok(ReviewDecision::Rejected("输入已结束".to_string()));
            }
            match answer.trim().to_ascii_lowercase().as_str() {
                "" | "y" | "yes" => return Ok(ReviewDecision::Approved),
                "n" | "no" => return Ok(ReviewDecision::Rejected("人工复核未通过".to_string())),
                other => writeln!(self.output, "无法识别的答复：{other}")?,
            }
        }
    }
}

impl<R: BufRead, W: Write> Reviewer for PromptReviewer<R, W> {
    fn review(&mut self, preview: &Preview) -> table_slice::Result<ReviewDecision> {
        self.ask(preview).map_err(|err| SliceError::Review(Box::new(err)))
    }
}

/// 复核前先把预览图写成 `control.png`，再交给内层复核器。
pub struct SavePreview<'a, R: ?Sized> {
    pub path: PathBuf,
    pub inner: &'a mut R,
}

impl<R: Reviewer + ?Sized> Reviewer for SavePreview<'_, R> {
    fn review(&mut self, preview: &Preview) -> table_slice::Result<ReviewDecision> {
        preview
            .image
            .save(&self.path)
            .map_err(|err| SliceError::Review(Box::new(err)))?;
        debug!(path = %self.path.display(), "saved review preview");
        self.inner.review(preview)
    }
}

#[cfg(feature = "highgui")]
pub use window::WindowReviewer;

#[cfg(feature = "highgui")]
mod window {
    use image::GrayImage;
    use opencv::core::{CV_8UC1, Mat, Scalar};
    use opencv::highgui;
    use opencv::prelude::*;
    use table_slice::{Preview, ReviewDecision, Reviewer, SliceError};

    const KEY_ENTER: i32 = 13;
    const KEY_ENTER_LF: i32 = 10;
    const KEY_ESC: i32 = 27;

    /// 用 OpenCV 窗口展示预览图，按键决定结果：`y`/回车通过，`n`/Esc 拒绝。
    pub struct WindowReviewer {
        title: String,
    }

    impl WindowReviewer {
        pub fn new(title: impl Into<String>) -> Self {
            Self {
                title: title.into(),
            }
        }

        fn show(&self, image: &GrayImage) -> opencv::Result<ReviewDecision> {
            let (width, height) = image.dimensions();
            let mut mat = Mat::new_rows_cols_with_default(
                height as i32,
                width as i32,
                CV_8UC1,
                Scalar::all(0.0),
            )?;
            mat.data_bytes_mut()?.copy_from_slice(image.as_raw());

            highgui::named_window(&self.title, highgui::WINDOW_AUTOSIZE)?;
            highgui::imshow(&self.title, &mat)?;
            let decision = loop {
                match highgui::wait_key(0)? {
                    KEY_ENTER | KEY_ENTER_LF => break ReviewDecision::Approved,
                    key if key == i32::from(b'y') => break ReviewDecision::Approved,
                    KEY_ESC => break ReviewDecision::Rejected("复核窗口已取消".to_string()),
                    key if key == i32::from(b'n') => {
                        break ReviewDecision::Rejected("人工复核未通过".to_string());
                    }
                    _ => continue,
                }
            };
            highgui::destroy_window(&self.title)?;
            Ok(decision)
        }
    }

    impl Reviewer for WindowReviewer {
        fn review(&mut self, preview: &Preview) -> table_slice::Result<ReviewDecision> {
            self.show(&preview.image)
                .map_err(|err| SliceError::Review(Box::new(err)))
        }
    }
}
