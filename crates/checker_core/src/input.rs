use std::fmt;

use url::Url;

use crate::ValidationError;

/// Largest image accepted for upload (5 MiB, inclusive).
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Which of the three mutually exclusive inputs a submission carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Text,
    Url,
    File,
}

impl PayloadKind {
    /// Multipart field name the backend expects for this kind.
    pub fn field_name(self) -> &'static str {
        match self {
            PayloadKind::Text => "text",
            PayloadKind::Url => "url",
            PayloadKind::File => "file",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// An image picked by the user, already read into memory.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

// Keeps image bytes out of debug logs.
impl fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// The single payload sent with a create-submission request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Url(String),
    File(ImageFile),
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Text(_) => PayloadKind::Text,
            Payload::Url(_) => PayloadKind::Url,
            Payload::File(_) => PayloadKind::File,
        }
    }
}

/// Classifies raw input as a URL when it parses as an absolute URL, otherwise text.
pub fn classify_input(raw: &str) -> PayloadKind {
    if Url::parse(raw.trim()).is_ok() {
        PayloadKind::Url
    } else {
        PayloadKind::Text
    }
}

/// Picks the payload for a submission. A file always wins over the text box.
pub fn choose_payload(text: &str, file: Option<ImageFile>) -> Result<Payload, ValidationError> {
    if let Some(file) = file {
        validate_image(&file.mime_type, file.size())?;
        return Ok(Payload::File(file));
    }

    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationError::EmptyInput);
    }
    Ok(match classify_input(text) {
        PayloadKind::Url => Payload::Url(text.to_owned()),
        _ => Payload::Text(text.to_owned()),
    })
}

/// Checks the upload constraints: an `image/*` MIME type and at most [`MAX_IMAGE_BYTES`].
pub fn validate_image(mime_type: &str, size: u64) -> Result<(), ValidationError> {
    let is_image = mime_type
        .trim()
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"));
    if !is_image {
        return Err(ValidationError::NotAnImage {
            mime_type: mime_type.to_owned(),
        });
    }
    if size > MAX_IMAGE_BYTES {
        return Err(ValidationError::FileTooLarge {
            size,
            max: MAX_IMAGE_BYTES,
        });
    }
    Ok(())
}
