//! Font obfuscation support for OOXML font-part validation.
//!
//! Office obfuscates embedded font binaries (ISO/IEC 29500-1:2016, 15.2.14) by
//! XOR-ing the first 32 bytes with a key derived from the `fontKey` GUID. This
//! module exposes the byte-level deobfuscation primitive the binary payload
//! validator needs to recover a real font header before sniffing its magic bytes.

pub mod obfuscation;

pub use obfuscation::{deobfuscate_font_data_bytes, obfuscate_font_data_bytes};

use std::collections::HashMap;

use crate::ooxml::namespaces::WORDPROCESSINGML;
use crate::ooxml::opc::{OpcPackage, PackURI};
use crate::ooxml::xmltree;
use obfuscation::parse_guid;

const FONT_TABLE_PART: &str = "/word/fontTable.xml";
const EMBED_ELEMENTS: &[&str] = &["embedRegular", "embedBold", "embedItalic", "embedBoldItalic"];

/// Builds the obfuscation key map a word-processing document's font table
/// declares: each `embedRegular`/`embedBold`/`embedItalic`/`embedBoldItalic`
/// element pairs a relationship id (its embedded font part) with a
/// `w:fontKey` GUID, keyed here by the target part's URI so the binary
/// payload phase can look a part's key up directly.
pub fn collect_word_font_keys(package: &OpcPackage) -> HashMap<String, [u8; 16]> {
    let mut keys = HashMap::new();

    let Ok(font_table_uri) = PackURI::new(FONT_TABLE_PART.to_string()) else { return keys };
    let Ok(part) = package.get_part(&font_table_uri) else { return keys };
    let Ok(root) = xmltree::parse(part.blob()) else { return keys };

    for node in root.iter() {
        if node.namespace() != Some(WORDPROCESSINGML) || !EMBED_ELEMENTS.contains(&node.local_name()) {
            continue;
        }
        let Some(r_id) = node.attr(&format!("{{{}}}id", crate::ooxml::namespaces::OFFICE_DOC_RELATIONSHIPS)) else { continue };
        let Some(font_key) = node.attr(&format!("{{{WORDPROCESSINGML}}}fontKey")) else { continue };
        let Ok(key) = parse_guid(font_key) else { continue };

        let Some(rel) = part.rels().get(r_id) else { continue };
        if rel.is_external() {
            continue;
        }
        let Ok(target) = rel.target_partname() else { continue };
        keys.insert(target.as_str().to_string(), key);
    }

    keys
}
