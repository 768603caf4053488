use crate::request::ReferenceKind;

/// Sniffs the mime type from file bytes. `infer` does not know HEIC/HEIF
/// brands inside the ftyp box, so those are checked by hand first.
pub fn detect_mime_type(data: &[u8]) -> Option<String> {
    if data.len() > 12 {
        let ftyp = &data[4..12];
        if ftyp.starts_with(b"ftyp") {
            let brand = &ftyp[4..8];
            if brand == b"heic" || brand == b"heif" || brand == b"hevc" {
                return Some("image/heic".to_string());
            }
        }
    }

    infer::get(data).map(|kind| kind.mime_type().to_string())
}

/// A reference image read from disk, ready to attach to the image-generation
/// call as an inline part.
#[derive(Debug, Clone)]
pub struct LoadedReference {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub kind: ReferenceKind,
    pub label: String,
}

impl LoadedReference {
    pub fn new(bytes: Vec<u8>, kind: ReferenceKind, label: String) -> Self {
        let mime_type = detect_mime_type(&bytes).unwrap_or_else(|| "image/png".to_string());
        Self {
            bytes,
            mime_type,
            kind,
            label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_png_magic() {
        let png_header = [
            0x89u8, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0, 0,
        ];
        assert_eq!(detect_mime_type(&png_header).as_deref(), Some("image/png"));
    }

    #[test]
    fn unknown_bytes_default_to_png_on_load() {
        let loaded = LoadedReference::new(vec![0u8; 4], ReferenceKind::Staff, "x".to_string());
        assert_eq!(loaded.mime_type, "image/png");
    }
}
