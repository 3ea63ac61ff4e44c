//! Content-type sniffing for served pastes.
//!
//! Pastes are stored as opaque bytes; the type is guessed on every read from
//! leading magic numbers, falling back to a scan of the first
//! [`SNIFF_LEN`] bytes for binary control characters.

/// Guessed type of a paste body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sniffed {
    pub content_type: &'static str,
    /// File extension (with dot) used for download names.
    pub extension: Option<&'static str>,
    pub is_text: bool,
}

/// Bytes inspected by the text check.
pub const SNIFF_LEN: usize = 512;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const OCTET_STREAM: &str = "application/octet-stream";

struct Signature {
    /// Required leading bytes of an enclosing container format.
    container: &'static [u8],
    offset: usize,
    magic: &'static [u8],
    content_type: &'static str,
    extension: &'static str,
}

const SIGNATURES: &[Signature] = &[
    Signature {
        container: b"",
        offset: 0,
        magic: b"\x89PNG\r\n\x1a\n",
        content_type: "image/png",
        extension: ".png",
    },
    Signature {
        container: b"",
        offset: 0,
        magic: b"\xff\xd8\xff",
        content_type: "image/jpeg",
        extension: ".jpg",
    },
    Signature {
        container: b"",
        offset: 0,
        magic: b"GIF87a",
        content_type: "image/gif",
        extension: ".gif",
    },
    Signature {
        container: b"",
        offset: 0,
        magic: b"GIF89a",
        content_type: "image/gif",
        extension: ".gif",
    },
    Signature {
        container: b"RIFF",
        offset: 8,
        magic: b"WEBP",
        content_type: "image/webp",
        extension: ".webp",
    },
    Signature {
        container: b"",
        offset: 0,
        magic: b"%PDF-",
        content_type: "application/pdf",
        extension: ".pdf",
    },
    Signature {
        container: b"",
        offset: 0,
        magic: b"PK\x03\x04",
        content_type: "application/zip",
        extension: ".zip",
    },
    Signature {
        container: b"",
        offset: 0,
        magic: b"\x1f\x8b\x08",
        content_type: "application/gzip",
        extension: ".gz",
    },
    Signature {
        container: b"",
        offset: 0,
        magic: b"OggS\x00",
        content_type: "application/ogg",
        extension: ".ogg",
    },
    Signature {
        container: b"",
        offset: 0,
        magic: b"ID3",
        content_type: "audio/mpeg",
        extension: ".mp3",
    },
];

fn matches_signature(content: &[u8], signature: &Signature) -> bool {
    content.starts_with(signature.container)
        && content
            .get(signature.offset..signature.offset + signature.magic.len())
            .is_some_and(|window| window == signature.magic)
}

/// C0 control bytes other than tab, LF, FF, CR and ESC mark content as binary.
fn is_binary_control(byte: u8) -> bool {
    byte < 0x20 && !matches!(byte, b'\t' | b'\n' | 0x0c | b'\r' | 0x1b)
}

/// Guess the type of `content`.
pub fn sniff(content: &[u8]) -> Sniffed {
    if let Some(signature) = SIGNATURES
        .iter()
        .find(|signature| matches_signature(content, signature))
    {
        return Sniffed {
            content_type: signature.content_type,
            extension: Some(signature.extension),
            is_text: false,
        };
    }

    let prefix = &content[..content.len().min(SNIFF_LEN)];
    let is_text = !prefix.iter().copied().any(is_binary_control);
    Sniffed {
        content_type: if is_text { TEXT_PLAIN } else { OCTET_STREAM },
        extension: None,
        is_text,
    }
}
