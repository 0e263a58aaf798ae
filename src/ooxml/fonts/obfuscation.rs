use crate::common::encoding::decode_hex_data;
use crate::common::simd::xor::xor_32_bytes_inplace;
use crate::ooxml::error::{OoxmlError, Result};

/// Derives the 16-byte obfuscation key from a GUID's raw byte layout
/// (`XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX`, 4-2-2-2-6 bytes once hyphens are
/// stripped): the first three segments are each byte-reversed, the last two
/// are appended verbatim (ISO/IEC 29500-1:2016, 15.2.14).
pub fn guid_bytes_to_key(guid_bytes: &[u8; 16]) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[0..4].copy_from_slice(&guid_bytes[0..4]);
    key[0..4].reverse();
    key[4..6].copy_from_slice(&guid_bytes[4..6]);
    key[4..6].reverse();
    key[6..8].copy_from_slice(&guid_bytes[6..8]);
    key[6..8].reverse();
    key[8..16].copy_from_slice(&guid_bytes[8..16]);
    key
}

/// Obfuscates font data according to OOXML specification (ISO/IEC 29500-1:2016, 15.2.14).
///
/// The obfuscation is a simple XOR of the first 32 bytes of the font data
/// with the key derived from the `fontKey` GUID by [`guid_bytes_to_key`].
///
/// This implementation uses SIMD instructions (AVX2/SSE2/NEON) when available
/// for optimal performance, with automatic fallback to scalar code.
#[inline]
pub fn obfuscate_font_data_bytes(data: &mut [u8], guid_bytes: &[u8; 16]) {
    if data.len() < 32 {
        return;
    }

    let key = guid_bytes_to_key(guid_bytes);

    // XOR the first 32 bytes with the 16-byte key (repeated twice)
    // Uses SIMD acceleration (AVX2/SSE2 on x86_64, NEON on aarch64)
    xor_32_bytes_inplace(&mut data[..32], &key);
}

/// De-obfuscates font data. Since it's XOR, it's the same operation as obfuscation.
#[inline]
pub fn deobfuscate_font_data_bytes(data: &mut [u8], guid_bytes: &[u8; 16]) {
    obfuscate_font_data_bytes(data, guid_bytes)
}

/// Obfuscates font data using a GUID string (for backward compatibility).
///
/// For better performance, prefer using `obfuscate_font_data_bytes` directly.
pub fn obfuscate_font_data(data: &mut [u8], guid_str: &str) -> Result<()> {
    if data.len() < 32 {
        return Ok(());
    }

    // Parse GUID string: {XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX} or XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX
    let clean_guid = guid_str
        .trim_matches(|c| c == '{' || c == '}')
        .replace('-', "");
    let guid_bytes = decode_hex_data(&clean_guid)
        .map_err(|e| OoxmlError::Other(format!("Invalid GUID format: {}", e)))?;

    if guid_bytes.len() != 16 {
        return Err(OoxmlError::Other(format!(
            "Invalid GUID length: expected 16 bytes, got {}",
            guid_bytes.len()
        )));
    }

    let guid_array: [u8; 16] = guid_bytes.try_into().unwrap();
    obfuscate_font_data_bytes(data, &guid_array);
    Ok(())
}

/// De-obfuscates font data using a GUID string.
pub fn deobfuscate_font_data(data: &mut [u8], guid_str: &str) -> Result<()> {
    obfuscate_font_data(data, guid_str)
}

/// Parses a braced or bare GUID string into its raw 16-byte layout.
pub fn parse_guid(guid_str: &str) -> Result<[u8; 16]> {
    let clean_guid = guid_str.trim_matches(|c| c == '{' || c == '}').replace('-', "");
    let bytes = decode_hex_data(&clean_guid).map_err(|e| OoxmlError::Other(format!("Invalid GUID format: {}", e)))?;
    bytes
        .try_into()
        .map_err(|v: Vec<u8>| OoxmlError::Other(format!("Invalid GUID length: expected 16 bytes, got {}", v.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_reverses_first_three_segments_and_keeps_last_two() {
        let guid = parse_guid("{00112233-4455-6677-8899-AABBCCDDEEFF}").unwrap();
        let key = guid_bytes_to_key(&guid);
        assert_eq!(key, [0x33, 0x22, 0x11, 0x00, 0x55, 0x44, 0x77, 0x66, 0x88, 0x99, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    }

    #[test]
    fn deobfuscate_after_obfuscate_recovers_original_prefix() {
        let original = vec![0x42u8; 64];
        let guid = parse_guid("{00112233-4455-6677-8899-AABBCCDDEEFF}").unwrap();
        let mut payload = original.clone();
        obfuscate_font_data_bytes(&mut payload, &guid);
        assert_ne!(payload[..32], original[..32]);
        deobfuscate_font_data_bytes(&mut payload, &guid);
        assert_eq!(payload, original);
    }
}
