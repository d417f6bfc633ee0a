//! OCR stage: run tesseract over one rendered page.
//!
//! The page is PNG-encoded and piped to `tesseract stdin stdout -l sin`.
//! Nothing is retried: a non-zero exit or a spawn failure surfaces as a
//! [`Pdf2DocxError`] and aborts the conversion.

use crate::config::ConversionConfig;
use crate::error::Pdf2DocxError;
use crate::pipeline::encode;
use async_trait::async_trait;
use image::DynamicImage;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Turns one page image into text.
#[async_trait]
pub trait TextRecogniser: Send + Sync {
    /// Recognise the text on `image`. `page_num` is 1-indexed and only used
    /// for error context.
    async fn recognise(&self, page_num: usize, image: &DynamicImage)
        -> Result<String, Pdf2DocxError>;
}

/// Recogniser that shells out to the tesseract binary.
#[derive(Debug, Clone)]
pub struct TesseractRecogniser {
    program: PathBuf,
    tessdata_dir: Option<PathBuf>,
    language: String,
    psm: Option<u8>,
}

/// What `tesseract --version` / `--list-langs` reported.
#[derive(Debug, Clone)]
pub struct TesseractProbe {
    /// First line of `--version`, e.g. `tesseract 5.3.4`.
    pub version: String,
    /// Whether the configured language model is installed.
    pub language_available: bool,
}

impl TesseractRecogniser {
    pub fn new(program: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            tessdata_dir: None,
            language: language.into(),
            psm: None,
        }
    }

    pub fn from_config(config: &ConversionConfig) -> Self {
        Self {
            program: config.tesseract_path.clone(),
            tessdata_dir: config.tessdata_dir.clone(),
            language: config.language.clone(),
            psm: config.page_segmentation_mode,
        }
    }

    /// Arguments passed for a single stdin→stdout recognition.
    fn args(&self) -> Vec<String> {
        let mut args = vec!["stdin".to_string(), "stdout".to_string()];
        if let Some(ref dir) = self.tessdata_dir {
            args.push("--tessdata-dir".into());
            args.push(dir.display().to_string());
        }
        args.push("-l".into());
        args.push(self.language.clone());
        if let Some(psm) = self.psm {
            args.push("--psm".into());
            args.push(psm.to_string());
        }
        args
    }

    fn unavailable(&self, source: std::io::Error) -> Pdf2DocxError {
        Pdf2DocxError::RecogniserUnavailable {
            program: self.program.clone(),
            source,
        }
    }

    /// Check the binary runs and the configured language is installed.
    pub async fn probe(&self) -> Result<TesseractProbe, Pdf2DocxError> {
        let output = Command::new(&self.program)
            .arg("--version")
            .output()
            .await
            .map_err(|e| self.unavailable(e))?;
        // Older releases print the version banner on stderr.
        let banner = if output.stdout.is_empty() {
            String::from_utf8_lossy(&output.stderr).to_string()
        } else {
            String::from_utf8_lossy(&output.stdout).to_string()
        };
        let version = banner.lines().next().unwrap_or("").trim().to_string();

        let mut list = Command::new(&self.program);
        if let Some(ref dir) = self.tessdata_dir {
            list.arg("--tessdata-dir").arg(dir);
        }
        let langs = list
            .arg("--list-langs")
            .output()
            .await
            .map_err(|e| self.unavailable(e))?;
        let listing = String::from_utf8_lossy(&langs.stdout);

        Ok(TesseractProbe {
            version,
            language_available: language_listed(&listing, &self.language),
        })
    }
}

/// `--list-langs` prints a header line followed by one code per line.
fn language_listed(listing: &str, language: &str) -> bool {
    // `-l sin+eng` needs every component installed.
    language
        .split('+')
        .all(|wanted| listing.lines().skip(1).any(|l| l.trim() == wanted))
}

#[async_trait]
impl TextRecogniser for TesseractRecogniser {
    async fn recognise(
        &self,
        page_num: usize,
        image: &DynamicImage,
    ) -> Result<String, Pdf2DocxError> {
        let png = encode::encode_page(image).map_err(|e| Pdf2DocxError::ImageEncodingFailed {
            page: page_num,
            detail: e.to_string(),
        })?;

        let mut child = Command::new(&self.program)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.unavailable(e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&png)
                .await
                .map_err(|e| Pdf2DocxError::RecognitionFailed {
                    page: page_num,
                    detail: format!("failed to pipe page image: {e}"),
                })?;
            // Dropping stdin closes the pipe so tesseract sees EOF.
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| Pdf2DocxError::RecognitionFailed {
                page: page_num,
                detail: format!("failed to wait for tesseract: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Pdf2DocxError::RecognitionFailed {
                page: page_num,
                detail: format!("{} ({})", stderr.trim(), output.status),
            });
        }

        if !output.stderr.is_empty() {
            // Tesseract chats on stderr ("Estimating resolution as ...").
            debug!(
                "Page {}: tesseract: {}",
                page_num,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let text = String::from_utf8(output.stdout).unwrap_or_else(|e| {
            warn!("Page {}: OCR output was not valid UTF-8", page_num);
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        });
        debug!("Page {}: recognised {} bytes", page_num, text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_args_use_sinhala() {
        let r = TesseractRecogniser::from_config(&ConversionConfig::default());
        assert_eq!(r.args(), vec!["stdin", "stdout", "-l", "sin"]);
    }

    #[test]
    fn args_include_tessdata_and_psm() {
        let config = ConversionConfig::builder()
            .tessdata_dir("/usr/share/tessdata")
            .page_segmentation_mode(6)
            .build()
            .unwrap();
        let r = TesseractRecogniser::from_config(&config);
        assert_eq!(
            r.args(),
            vec![
                "stdin",
                "stdout",
                "--tessdata-dir",
                "/usr/share/tessdata",
                "-l",
                "sin",
                "--psm",
                "6"
            ]
        );
    }

    #[test]
    fn language_listing_parsing() {
        let listing = "List of available languages in \"/usr/share/tessdata/\" (3):\neng\nosd\nsin\n";
        assert!(language_listed(listing, "sin"));
        assert!(language_listed(listing, "sin+eng"));
        assert!(!language_listed(listing, "tam"));
        // The header line never counts as a language.
        assert!(!language_listed("sin\n", "sin"));
    }

    #[tokio::test]
    async fn missing_binary_is_unavailable() {
        let r = TesseractRecogniser::new("/definitely/not/tesseract", "sin");
        let img = DynamicImage::new_rgb8(4, 4);
        let err = r.recognise(1, &img).await.unwrap_err();
        assert!(
            matches!(err, Pdf2DocxError::RecogniserUnavailable { .. }),
            "got: {err:?}"
        );
    }
}
