//! Binary payload validation for embedded parts (ECMA-376 §4.8): magic-byte
//! sniffing for image/OLE formats keyed by content type or extension, plus
//! the `.fntdata`/obfuscated-font special cases.

use crate::ooxml::fonts::obfuscation::deobfuscate_font_data_bytes;
use crate::validate::error::Severity;

const JPEG_MAGIC: &[&[u8]] = &[b"\xFF\xD8\xFF"];
const PNG_MAGIC: &[&[u8]] = &[b"\x89PNG\r\n\x1a\n"];
const GIF_MAGIC: &[&[u8]] = &[b"GIF87a", b"GIF89a"];
const BMP_MAGIC: &[&[u8]] = &[b"BM"];
const TIFF_MAGIC: &[&[u8]] = &[b"II*\x00", b"MM\x00*"];
const OLE_MAGIC: &[&[u8]] = &[b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1"];
const WMF_PLACEABLE_MAGIC: &[u8] = b"\xD7\xCD\xC6\x9A";
const FONT_MAGIC: &[&[u8]] = &[b"\x00\x01\x00\x00", b"OTTO", b"ttcf", b"true", b"typ1"];

const FONT_CONTENT_TYPES: &[&str] = &[
    "application/vnd.ms-opentype",
    "application/x-font-ttf",
    "application/x-font-opentype",
    "application/x-fontdata",
];
const OBFUSCATED_FONT_CONTENT_TYPES: &[&str] = &["application/vnd.openxmlformats-officedocument.obfuscatedFont"];
const FONT_EXTENSIONS: &[&str] = &[".ttf", ".otf", ".ttc", ".otc", ".fntdata", ".odttf"];
const OBFUSCATED_FONT_EXTENSIONS: &[&str] = &[".odttf"];

/// Outcome of validating one binary part: `None` means the payload passed
/// (or the format/content-type combination isn't one this module checks).
pub struct BinaryValidationResult {
    pub message: String,
    pub severity: Severity,
}

struct BinaryFormat {
    name: &'static str,
    content_types: &'static [&'static str],
    extensions: &'static [&'static str],
    validator: fn(&[u8]) -> bool,
}

const BINARY_FORMATS: &[BinaryFormat] = &[
    BinaryFormat { name: "jpeg", content_types: &["image/jpeg", "image/pjpeg"], extensions: &[".jpg", ".jpeg"], validator: is_jpeg },
    BinaryFormat { name: "png", content_types: &["image/png"], extensions: &[".png"], validator: is_png },
    BinaryFormat { name: "gif", content_types: &["image/gif"], extensions: &[".gif"], validator: is_gif },
    BinaryFormat { name: "bmp", content_types: &["image/bmp", "image/x-bmp"], extensions: &[".bmp"], validator: is_bmp },
    BinaryFormat { name: "tiff", content_types: &["image/tiff"], extensions: &[".tif", ".tiff"], validator: is_tiff },
    BinaryFormat { name: "emf", content_types: &["image/emf", "image/x-emf"], extensions: &[".emf"], validator: is_emf },
    BinaryFormat { name: "wmf", content_types: &["image/wmf", "image/x-wmf"], extensions: &[".wmf"], validator: is_wmf },
    BinaryFormat {
        name: "ole",
        content_types: &["application/vnd.openxmlformats-officedocument.oleObject", "application/vnd.ms-office.activeX"],
        extensions: &[".bin", ".ole"],
        validator: is_ole,
    },
];

fn starts_with_any(data: &[u8], candidates: &[&[u8]]) -> bool {
    candidates.iter().any(|prefix| data.starts_with(prefix))
}

fn is_jpeg(data: &[u8]) -> bool {
    starts_with_any(data, JPEG_MAGIC)
}

fn is_png(data: &[u8]) -> bool {
    starts_with_any(data, PNG_MAGIC)
}

fn is_gif(data: &[u8]) -> bool {
    starts_with_any(data, GIF_MAGIC)
}

fn is_bmp(data: &[u8]) -> bool {
    starts_with_any(data, BMP_MAGIC)
}

fn is_tiff(data: &[u8]) -> bool {
    starts_with_any(data, TIFF_MAGIC)
}

/// EMF signature appears at offset 40 as " EMF", behind a 4-byte record type.
fn is_emf(data: &[u8]) -> bool {
    data.len() >= 44 && data[0..4] == [0x01, 0x00, 0x00, 0x00] && &data[40..44] == b" EMF"
}

fn is_wmf(data: &[u8]) -> bool {
    if data.len() < 4 {
        return false;
    }
    if data.starts_with(WMF_PLACEABLE_MAGIC) {
        return true;
    }
    (data[0..2] == [0x01, 0x00] || data[0..2] == [0x02, 0x00]) && data[2..4] == [0x09, 0x00]
}

fn is_ole(data: &[u8]) -> bool {
    starts_with_any(data, OLE_MAGIC)
}

fn is_font_header(data: &[u8]) -> bool {
    starts_with_any(data, FONT_MAGIC)
}

/// `.fntdata` wraps the real font behind an 8-byte little-endian
/// `(total, font_len)` header; the font payload is the trailing `font_len`
/// bytes, at offset `total - font_len`.
fn extract_fntdata_payload(data: &[u8]) -> Option<&[u8]> {
    if data.len() < 8 {
        return None;
    }
    let total = u32::from_le_bytes(data[0..4].try_into().unwrap()) as usize;
    let font_len = u32::from_le_bytes(data[4..8].try_into().unwrap()) as usize;
    if total == 0 || font_len == 0 || total > data.len() {
        return None;
    }
    let offset = total.checked_sub(font_len)?;
    if offset < 8 || offset >= data.len() {
        return None;
    }
    Some(&data[offset..])
}

fn extension_of(part_uri: &str) -> String {
    match part_uri.rfind('.') {
        Some(idx) if idx + 1 < part_uri.len() => format!(".{}", part_uri[idx + 1..].to_lowercase()),
        _ => String::new(),
    }
}

fn is_font_candidate(content_type: Option<&str>, part_uri: &str) -> bool {
    let ext = extension_of(part_uri);
    if let Some(ct) = content_type {
        if FONT_CONTENT_TYPES.contains(&ct) || OBFUSCATED_FONT_CONTENT_TYPES.contains(&ct) {
            return true;
        }
    }
    FONT_EXTENSIONS.contains(&ext.as_str())
}

fn is_obfuscated_font(content_type: Option<&str>, part_uri: &str) -> bool {
    let ext = extension_of(part_uri);
    if let Some(ct) = content_type {
        if OBFUSCATED_FONT_CONTENT_TYPES.contains(&ct) {
            return true;
        }
    }
    OBFUSCATED_FONT_EXTENSIONS.contains(&ext.as_str())
}

fn deobfuscate_prefix(data: &[u8], key: &[u8; 16]) -> Vec<u8> {
    let limit = data.len().min(32);
    (0..limit).map(|i| data[i] ^ key[i % 16]).collect()
}

fn match_format(content_type: Option<&str>, part_uri: &str) -> Option<&'static BinaryFormat> {
    let ext = extension_of(part_uri);
    for fmt in BINARY_FORMATS {
        if let Some(ct) = content_type {
            if fmt.content_types.contains(&ct) {
                return Some(fmt);
            }
        }
        if !ext.is_empty() && fmt.extensions.contains(&ext.as_str()) {
            return Some(fmt);
        }
    }
    None
}

/// Validates one binary part's raw bytes. `font_key` is the 16-byte
/// deobfuscation key recovered from the owning document's font table, if
/// any applies to this part.
pub fn validate_binary_content(
    content_type: Option<&str>,
    part_uri: &str,
    data: &[u8],
    font_key: Option<&[u8; 16]>,
) -> Option<BinaryValidationResult> {
    if is_font_candidate(content_type, part_uri) {
        if extension_of(part_uri) == ".fntdata" || content_type == Some("application/x-fontdata") {
            if let Some(payload) = extract_fntdata_payload(data) {
                if is_font_header(payload) {
                    return None;
                }
            }
        }
        if is_font_header(data) {
            return None;
        }
        if is_obfuscated_font(content_type, part_uri) {
            return match font_key {
                None => Some(BinaryValidationResult {
                    message: "Obfuscated font payload missing fontKey; unable to validate.".to_string(),
                    severity: Severity::Warning,
                }),
                Some(key) => {
                    let deobfuscated = deobfuscate_prefix(data, key);
                    if is_font_header(&deobfuscated) {
                        None
                    } else {
                        Some(BinaryValidationResult {
                            message: "Invalid obfuscated font payload after deobfuscation.".to_string(),
                            severity: Severity::Error,
                        })
                    }
                }
            };
        }
        return Some(BinaryValidationResult { message: "Invalid font payload.".to_string(), severity: Severity::Error });
    }

    let fmt = match_format(content_type, part_uri)?;
    if (fmt.validator)(data) {
        return None;
    }
    let hint = content_type.map(|ct| format!(" (content type {ct})")).unwrap_or_default();
    Some(BinaryValidationResult { message: format!("Invalid {} payload{hint}.", fmt.name), severity: Severity::Error })
}

/// Recovers the obfuscation key for `part_uri` from a font table's
/// `embedRegular`/`embedBold`/`embedItalic`/`embedBoldItalic` entries, each
/// of which pairs a relationship id with a `w:fontKey` GUID attribute. The
/// word-processing document profile builds this map once per document and
/// passes the relevant key down when validating each referenced font part.
pub fn deobfuscation_key_for(font_keys_by_target: &std::collections::HashMap<String, [u8; 16]>, part_uri: &str) -> Option<[u8; 16]> {
    font_keys_by_target.get(part_uri).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::fonts::obfuscation::{obfuscate_font_data_bytes, parse_guid};

    #[test]
    fn jpeg_magic_is_recognized() {
        let data = [0xFF, 0xD8, 0xFF, 0xE0, 0x00];
        assert!(validate_binary_content(Some("image/jpeg"), "/media/image1.jpeg", &data, None).is_none());
    }

    #[test]
    fn png_with_wrong_extension_is_reported() {
        let data = [0x00u8; 10];
        let result = validate_binary_content(None, "/media/image1.png", &data, None);
        assert!(result.is_some());
        assert_eq!(result.unwrap().severity, Severity::Error);
    }

    #[test]
    fn non_image_content_type_is_skipped() {
        let data = [0x00u8; 4];
        assert!(validate_binary_content(Some("text/plain"), "/word/theme/theme1.xml", &data, None).is_none());
    }

    #[test]
    fn emf_requires_signature_at_offset_forty() {
        let mut data = vec![0u8; 44];
        data[0..4].copy_from_slice(&[0x01, 0x00, 0x00, 0x00]);
        data[40..44].copy_from_slice(b" EMF");
        assert!(validate_binary_content(Some("image/emf"), "/media/image1.emf", &data, None).is_none());
    }

    #[test]
    fn obfuscated_font_without_key_is_warning() {
        let data = vec![0u8; 64];
        let result = validate_binary_content(None, "/word/fonts/font1.odttf", &data, None).unwrap();
        assert_eq!(result.severity, Severity::Warning);
    }

    #[test]
    fn obfuscated_font_with_correct_key_validates() {
        let guid = parse_guid("{00112233-4455-6677-8899-AABBCCDDEEFF}").unwrap();
        let mut data = vec![0u8; 64];
        data[0..4].copy_from_slice(b"OTTO");
        obfuscate_font_data_bytes(&mut data, &guid);
        assert!(validate_binary_content(None, "/word/fonts/font1.odttf", &data, Some(&guid)).is_none());
    }

    #[test]
    fn fntdata_payload_is_extracted_before_sniffing() {
        let font = b"OTTO-rest-of-font-data";
        let total = (8 + font.len()) as u32;
        let mut data = Vec::new();
        data.extend_from_slice(&total.to_le_bytes());
        data.extend_from_slice(&(font.len() as u32).to_le_bytes());
        data.extend_from_slice(font);
        assert!(validate_binary_content(None, "/word/fonts/font1.fntdata", &data, None).is_none());
    }
}
