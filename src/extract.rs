//! Study-text extraction from source documents.
//!
//! Two front ends with the same contract, `bytes → text`: vision OCR for
//! images and a local parser for PDFs. Unreadable input fails with
//! [`MelodyError::Extraction`] before any provider interaction happens.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use lopdf::Document;

use crate::completion::CompletionClient;
use crate::error::MelodyError;

const OCR_SYSTEM: &str =
    "You are a high-precision OCR assistant. Reproduce letters, numbers, and symbols exactly.";

const OCR_PROMPT: &str = "Extract only the readable text from this image. \
Preserve line breaks where possible, drop decorative elements, and return the \
characters exactly as written. Output nothing besides the extracted text.";

/// A source document handed to the pipeline.
#[derive(Debug, Clone)]
pub enum StudyDocument {
    /// Raw image bytes plus their MIME type, e.g. `image/png`.
    Image { bytes: Vec<u8>, mime: String },
    /// Raw PDF bytes.
    Pdf(Vec<u8>),
}

impl StudyDocument {
    /// Classifies raw bytes, using the `%PDF-` magic and, as a fallback,
    /// the file name. Anything that is not a PDF is treated as an image.
    pub fn from_bytes(bytes: Vec<u8>, filename: Option<&str>) -> Self {
        let is_pdf = bytes.starts_with(b"%PDF-")
            || filename
                .map(|name| name.to_lowercase().ends_with(".pdf"))
                .unwrap_or(false);
        if is_pdf {
            StudyDocument::Pdf(bytes)
        } else {
            let mime = filename
                .map(|name| {
                    mime_guess::from_path(name)
                        .first_or_octet_stream()
                        .to_string()
                })
                .filter(|mime| mime.starts_with("image/"))
                .unwrap_or_else(|| "image/png".to_string());
            StudyDocument::Image { bytes, mime }
        }
    }
}

/// Extracts study text from a document, dispatching on its kind.
pub async fn study_text_from_document(
    completion: &CompletionClient,
    document: &StudyDocument,
) -> Result<String, MelodyError> {
    match document {
        StudyDocument::Image { bytes, mime } => {
            study_text_from_image(completion, bytes, mime).await
        }
        StudyDocument::Pdf(bytes) => study_text_from_pdf(bytes),
    }
}

/// OCR over raw image bytes via the vision completion endpoint.
pub async fn study_text_from_image(
    completion: &CompletionClient,
    image_bytes: &[u8],
    mime: &str,
) -> Result<String, MelodyError> {
    if image_bytes.is_empty() {
        return Err(MelodyError::Extraction {
            message: "image is empty".to_string(),
        });
    }

    let image_b64 = BASE64.encode(image_bytes);
    let text = completion
        .complete_with_image(OCR_SYSTEM, OCR_PROMPT, &image_b64, mime, 0.0)
        .await?;

    if text.trim().is_empty() {
        return Err(MelodyError::Extraction {
            message: "no text could be read from the image".to_string(),
        });
    }
    Ok(text)
}

/// OCR over a base64-encoded image, tolerating an optional
/// `data:<mime>;base64,` header as sent by browser frontends.
pub async fn study_text_from_base64(
    completion: &CompletionClient,
    image_b64: &str,
) -> Result<String, MelodyError> {
    let encoded = image_b64
        .split_once(',')
        .map(|(_, data)| data)
        .unwrap_or(image_b64);

    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|err| MelodyError::Extraction {
            message: format!("invalid base64 image: {err}"),
        })?;

    study_text_from_image(completion, &bytes, "image/png").await
}

/// Extracts text from a PDF, page by page. Pages that fail to parse are
/// skipped; only a document with zero readable pages is an error.
pub fn study_text_from_pdf(pdf_bytes: &[u8]) -> Result<String, MelodyError> {
    if pdf_bytes.is_empty() {
        return Err(MelodyError::Extraction {
            message: "PDF is empty".to_string(),
        });
    }

    let document = Document::load_mem(pdf_bytes).map_err(|err| MelodyError::Extraction {
        message: format!("could not open PDF: {err}"),
    })?;

    let mut parts: Vec<String> = Vec::new();
    for page_number in document.get_pages().keys() {
        match document.extract_text(&[*page_number]) {
            Ok(text) if !text.trim().is_empty() => parts.push(text.trim().to_string()),
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(page = page_number, error = %err, "skipping unreadable PDF page");
            }
        }
    }

    if parts.is_empty() {
        return Err(MelodyError::Extraction {
            message: "PDF contains no extractable text; it may be image-only".to_string(),
        });
    }

    Ok(parts.join("\n\n"))
}
