use crate::error::Result;
use encoding_rs::{UTF_8, WINDOWS_1252};
use std::path::Path;

/// Read a spreadsheet export as text.
///
/// UTF-8 (with or without BOM) is tried first; anything that does not decode
/// cleanly is treated as Windows-1252, which is what Excel writes for "CSV"
/// on most Windows locales.
pub fn read_spreadsheet_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(decode_spreadsheet_bytes(&bytes))
}

pub fn decode_spreadsheet_bytes(bytes: &[u8]) -> String {
    let (text, had_errors) = UTF_8.decode_with_bom_removal(bytes);
    if !had_errors {
        return text.into_owned();
    }

    tracing::debug!("input is not valid UTF-8, decoding as Windows-1252");
    let (text, _, _) = WINDOWS_1252.decode(bytes);
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_with_bom() {
        let bytes = b"\xEF\xBB\xBFListed,Actual\n";
        assert_eq!(decode_spreadsheet_bytes(bytes), "Listed,Actual\n");
    }

    #[test]
    fn test_windows_1252_degree_sign() {
        // 0xB0 is the degree sign in Windows-1252 and invalid on its own in UTF-8
        let bytes = b"Tilt\n10\xB0\n";
        assert_eq!(decode_spreadsheet_bytes(bytes), "Tilt\n10\u{00b0}\n");
    }
}
