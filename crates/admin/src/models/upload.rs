//! Image files submitted with product and category forms.

/// Maximum accepted size for a single image (2 MiB).
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

/// An image file attached to a form submission.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Original file name as sent by the browser.
    pub file_name: String,
    /// MIME type (e.g. `image/png`).
    pub content_type: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Create an upload from its parts.
    #[must_use]
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// File extension taken from the original name, lowercased.
    ///
    /// Falls back to `bin` when the name has no usable extension.
    #[must_use]
    pub fn extension(&self) -> String {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map_or_else(|| "bin".to_string(), str::to_ascii_lowercase)
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the file has no contents (browsers send these for empty inputs).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Don't dump image bytes into logs.
impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension() {
        let upload = ImageUpload::new("Photo.JPG", "image/jpeg", vec![1]);
        assert_eq!(upload.extension(), "jpg");

        let upload = ImageUpload::new("archive.tar.gz", "application/gzip", vec![1]);
        assert_eq!(upload.extension(), "gz");
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(ImageUpload::new("noext", "image/png", vec![]).extension(), "bin");
        assert_eq!(ImageUpload::new("trailing.", "image/png", vec![]).extension(), "bin");
        assert_eq!(ImageUpload::new("bad.p/ng", "image/png", vec![]).extension(), "bin");
    }

    #[test]
    fn test_debug_omits_bytes() {
        let upload = ImageUpload::new("a.png", "image/png", vec![0xde, 0xad]);
        let debug = format!("{upload:?}");
        assert!(debug.contains("len: 2"));
        assert!(!debug.contains("222"));
    }
}
