//! CMap parsing and character-code lookup.
//!
//! A CMap maps character codes to CIDs or Unicode through a small declarative
//! language: codespace ranges declare which byte-widths form valid codes, and
//! the `bf`/`cid`/`notdef` sections populate the code map. ToUnicode streams
//! embedded in font dictionaries and the predefined CJK CMaps shipped as
//! resource files both go through this parser.

mod parser;

pub use parser::{CMapParser, CMapToken};

use crate::core::error::{PdfError, Result};
use rustc_hash::FxHashMap;

const BEGIN_CODESPACE_RANGE: &str = "begincodespacerange";
const END_CODESPACE_RANGE: &str = "endcodespacerange";
const BEGIN_BF_CHAR: &str = "beginbfchar";
const END_BF_CHAR: &str = "endbfchar";
const BEGIN_BF_RANGE: &str = "beginbfrange";
const END_BF_RANGE: &str = "endbfrange";
const BEGIN_CID_CHAR: &str = "begincidchar";
const END_CID_CHAR: &str = "endcidchar";
const BEGIN_CID_RANGE: &str = "begincidrange";
const END_CID_RANGE: &str = "endcidrange";
const BEGIN_NOTDEF_RANGE: &str = "beginnotdefrange";
const END_NOTDEF_RANGE: &str = "endnotdefrange";
const CMAP_NAME: &[u8] = b"CMapName";
const CMAP_TYPE: &[u8] = b"CMapType";

/// A single codespace range. The width is the byte length of the high end's
/// hex string; ranges whose low and high ends differ in width are not
/// modelled separately.
#[derive(Debug, Clone, PartialEq)]
pub struct Codespace {
    pub low: u64,
    pub high: u64,
    pub width: u8,
}

/// A character-code map loaded from CMap data.
pub struct CMap {
    name: String,
    ctype: i64,
    codespaces: Vec<Codespace>,
    code_map: FxHashMap<u64, String>,
    /// Bitset of byte widths (bit `1 << w` for width `w`) used by any
    /// codespace range; lookups only fire at declared widths.
    code_span: u8,
}

impl CMap {
    fn new() -> Self {
        CMap {
            name: String::new(),
            ctype: 0,
            codespaces: Vec::new(),
            code_map: FxHashMap::default(),
            code_span: 0,
        }
    }

    /// Parses CMap data held in memory.
    pub fn parse(data: &[u8]) -> Result<CMap> {
        let mut cmap = CMap::new();
        let mut parser = CMapParser::new(data.to_vec());

        while let Some(token) = parser.next_token()? {
            match token {
                CMapToken::Operand(op) => match op.as_str() {
                    BEGIN_CODESPACE_RANGE => cmap.parse_codespace_range(&mut parser)?,
                    BEGIN_BF_CHAR => cmap.parse_bfchar(&mut parser)?,
                    BEGIN_BF_RANGE => cmap.parse_bfrange(&mut parser)?,
                    BEGIN_CID_CHAR => cmap.parse_cidchar(&mut parser)?,
                    BEGIN_CID_RANGE => cmap.parse_cidrange(&mut parser)?,
                    BEGIN_NOTDEF_RANGE => cmap.parse_notdefrange(&mut parser)?,
                    _ => {}
                },
                CMapToken::Name(name) if name == CMAP_NAME => {
                    if let Some(token) = parser.next_token()? {
                        cmap.name = match token {
                            CMapToken::Name(bytes) => {
                                String::from_utf8_lossy(&bytes).into_owned()
                            }
                            other => format!("{:?}", other),
                        };
                    }
                }
                CMapToken::Name(name) if name == CMAP_TYPE => match parser.next_token()? {
                    Some(CMapToken::Int(value)) => cmap.ctype = value,
                    Some(other) => {
                        return Err(PdfError::CMapParse(format!(
                            "CMapType is not an integer: {:?}",
                            other
                        )))
                    }
                    None => break,
                },
                _ => {}
            }
        }

        Ok(cmap)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ctype(&self) -> i64 {
        self.ctype
    }

    pub fn codespaces(&self) -> &[Codespace] {
        &self.codespaces
    }

    pub fn code_map(&self) -> &FxHashMap<u64, String> {
        &self.code_map
    }

    pub fn is_empty(&self) -> bool {
        self.code_map.is_empty()
    }

    fn parse_codespace_range(&mut self, parser: &mut CMapParser) -> Result<()> {
        loop {
            let low = match parser.next_token()? {
                None => break,
                Some(CMapToken::Operand(op)) if op == END_CODESPACE_RANGE => return Ok(()),
                Some(CMapToken::Hex(bytes)) => bytes,
                Some(other) => {
                    return Err(PdfError::CMapParse(format!(
                        "unexpected token in codespace range: {:?}",
                        other
                    )))
                }
            };
            let high = match parser.next_token()? {
                None => break,
                Some(CMapToken::Hex(bytes)) => bytes,
                Some(other) => {
                    return Err(PdfError::CMapParse(format!(
                        "codespace high end is not hex: {:?}",
                        other
                    )))
                }
            };

            let width = high.len().min(4) as u8;
            self.codespaces.push(Codespace {
                low: hex_to_u64(&low),
                high: hex_to_u64(&high),
                width,
            });
            self.code_span |= 1 << width;
        }
        Ok(())
    }

    fn parse_bfchar(&mut self, parser: &mut CMapParser) -> Result<()> {
        loop {
            let src_code = match parser.next_token()? {
                None => break,
                Some(CMapToken::Operand(op)) if op == END_BF_CHAR => return Ok(()),
                Some(CMapToken::Hex(bytes)) => hex_to_u64(&bytes),
                Some(other) => {
                    return Err(PdfError::CMapParse(format!(
                        "unexpected bfchar source: {:?}",
                        other
                    )))
                }
            };

            let target = match parser.next_token()? {
                None => break,
                Some(CMapToken::Operand(op)) if op == END_BF_CHAR => return Ok(()),
                Some(CMapToken::Hex(bytes)) => utf16_be_to_string(&bytes),
                Some(CMapToken::Int(value)) => {
                    let v = value as u64;
                    if v <= 0xFF {
                        format!("00{:X}", v)
                    } else if v <= 0xFFF {
                        format!("0{:X}", v)
                    } else {
                        format!("{:X}", v)
                    }
                }
                // Glyph names resolve through a name-to-rune table; none is
                // configured here, so the target degrades to a placeholder.
                Some(CMapToken::Name(_)) => "?".to_string(),
                Some(other) => {
                    return Err(PdfError::CMapParse(format!(
                        "unexpected bfchar target: {:?}",
                        other
                    )))
                }
            };

            self.code_map.insert(src_code, target);
        }
        Ok(())
    }

    fn parse_bfrange(&mut self, parser: &mut CMapParser) -> Result<()> {
        loop {
            let from = match parser.next_token()? {
                None => break,
                Some(CMapToken::Operand(op)) if op == END_BF_RANGE => return Ok(()),
                Some(CMapToken::Hex(bytes)) => hex_to_u64(&bytes),
                Some(other) => {
                    return Err(PdfError::CMapParse(format!(
                        "unexpected bfrange start: {:?}",
                        other
                    )))
                }
            };
            let to = match parser.next_token()? {
                None => break,
                Some(CMapToken::Operand(op)) if op == END_BF_RANGE => return Ok(()),
                Some(CMapToken::Hex(bytes)) => hex_to_u64(&bytes),
                Some(other) => {
                    return Err(PdfError::CMapParse(format!(
                        "unexpected bfrange end: {:?}",
                        other
                    )))
                }
            };

            match parser.next_token()? {
                None => break,
                Some(CMapToken::Array(items)) => {
                    let mut code = from;
                    for item in &items {
                        match item {
                            CMapToken::Hex(bytes) => {
                                self.code_map.insert(code, utf16_be_to_string(bytes));
                                code += 1;
                            }
                            other => {
                                return Err(PdfError::CMapParse(format!(
                                    "non-hex entry in bfrange array: {:?}",
                                    other
                                )))
                            }
                        }
                    }
                    if code != to + 1 {
                        return Err(PdfError::CMapParse(format!(
                            "bfrange array has {} items for a range of {}",
                            items.len(),
                            to - from + 1
                        )));
                    }
                }
                Some(CMapToken::Hex(bytes)) => {
                    // The raw value plus delta is taken as a Unicode scalar.
                    let base = hex_to_u64(&bytes);
                    for (i, code) in (from..=to).enumerate() {
                        self.code_map
                            .insert(code, scalar_to_string(base + i as u64));
                    }
                }
                Some(CMapToken::Int(value)) => {
                    let base = value as u64;
                    for (i, code) in (from..=to).enumerate() {
                        let r = base + i as u64;
                        let target = if r <= 0xFF {
                            format!("00{:X}", r)
                        } else if r <= 0xFFF {
                            format!("0{:X}", r)
                        } else {
                            format!("{:X}", r)
                        };
                        self.code_map.insert(code, target);
                    }
                }
                Some(other) => {
                    return Err(PdfError::CMapParse(format!(
                        "unexpected bfrange target: {:?}",
                        other
                    )))
                }
            }
        }
        Ok(())
    }

    fn parse_cidchar(&mut self, parser: &mut CMapParser) -> Result<()> {
        loop {
            let src_code = match parser.next_token()? {
                None => break,
                Some(CMapToken::Operand(op)) if op == END_CID_CHAR => return Ok(()),
                // Some generators close cidchar sections with endbfchar;
                // accept it so their CMaps still load.
                Some(CMapToken::Operand(op)) if op == END_BF_CHAR => {
                    log::warn!("cidchar section terminated by endbfchar");
                    return Ok(());
                }
                Some(CMapToken::Hex(bytes)) => hex_to_u64(&bytes),
                Some(other) => {
                    return Err(PdfError::CMapParse(format!(
                        "unexpected cidchar source: {:?}",
                        other
                    )))
                }
            };

            let target = match parser.next_token()? {
                None => break,
                Some(CMapToken::Operand(op)) if op == END_CID_CHAR || op == END_BF_CHAR => {
                    if op == END_BF_CHAR {
                        log::warn!("cidchar section terminated by endbfchar");
                    }
                    return Ok(());
                }
                Some(CMapToken::Hex(bytes)) => cid_hex_text(hex_to_u64(&bytes)),
                Some(CMapToken::Int(value)) => cid_hex_text(value as u64),
                Some(CMapToken::Name(_)) => "?".to_string(),
                Some(other) => {
                    return Err(PdfError::CMapParse(format!(
                        "unexpected cidchar target: {:?}",
                        other
                    )))
                }
            };

            self.code_map.insert(src_code, target);
        }
        Ok(())
    }

    fn parse_cidrange(&mut self, parser: &mut CMapParser) -> Result<()> {
        loop {
            let from = match parser.next_token()? {
                None => break,
                Some(CMapToken::Operand(op)) if op == END_CID_RANGE => return Ok(()),
                Some(CMapToken::Hex(bytes)) => hex_to_u64(&bytes),
                Some(other) => {
                    return Err(PdfError::CMapParse(format!(
                        "unexpected cidrange start: {:?}",
                        other
                    )))
                }
            };
            let to = match parser.next_token()? {
                None => break,
                Some(CMapToken::Operand(op)) if op == END_CID_RANGE => return Ok(()),
                Some(CMapToken::Hex(bytes)) => hex_to_u64(&bytes),
                Some(other) => {
                    return Err(PdfError::CMapParse(format!(
                        "unexpected cidrange end: {:?}",
                        other
                    )))
                }
            };

            match parser.next_token()? {
                None => break,
                Some(CMapToken::Array(items)) => {
                    let mut code = from;
                    for item in &items {
                        match item {
                            CMapToken::Hex(bytes) => {
                                self.code_map.insert(code, cid_hex_text(hex_to_u64(bytes)));
                                code += 1;
                            }
                            other => {
                                return Err(PdfError::CMapParse(format!(
                                    "non-hex entry in cidrange array: {:?}",
                                    other
                                )))
                            }
                        }
                    }
                    if code != to + 1 {
                        return Err(PdfError::CMapParse(
                            "cidrange array length mismatch".to_string(),
                        ));
                    }
                }
                Some(CMapToken::Hex(bytes)) => {
                    let base = hex_to_u64(&bytes);
                    for (i, code) in (from..=to).enumerate() {
                        self.code_map.insert(code, cid_hex_text(base + i as u64));
                    }
                }
                Some(CMapToken::Int(value)) => {
                    let base = value as u64;
                    for (i, code) in (from..=to).enumerate() {
                        self.code_map.insert(code, cid_hex_text(base + i as u64));
                    }
                }
                Some(other) => {
                    return Err(PdfError::CMapParse(format!(
                        "unexpected cidrange target: {:?}",
                        other
                    )))
                }
            }
        }
        Ok(())
    }

    fn parse_notdefrange(&mut self, parser: &mut CMapParser) -> Result<()> {
        loop {
            let from = match parser.next_token()? {
                None => break,
                Some(CMapToken::Operand(op)) if op == END_NOTDEF_RANGE => return Ok(()),
                Some(CMapToken::Hex(bytes)) => hex_to_u64(&bytes),
                Some(other) => {
                    return Err(PdfError::CMapParse(format!(
                        "unexpected notdefrange start: {:?}",
                        other
                    )))
                }
            };
            let to = match parser.next_token()? {
                None => break,
                Some(CMapToken::Operand(op)) if op == END_NOTDEF_RANGE => return Ok(()),
                Some(CMapToken::Hex(bytes)) => hex_to_u64(&bytes),
                Some(other) => {
                    return Err(PdfError::CMapParse(format!(
                        "unexpected notdefrange end: {:?}",
                        other
                    )))
                }
            };

            let target = match parser.next_token()? {
                None => break,
                Some(CMapToken::Hex(bytes)) => hex_to_u64(&bytes),
                Some(CMapToken::Int(value)) => value as u64,
                Some(other) => {
                    return Err(PdfError::CMapParse(format!(
                        "unexpected notdefrange target: {:?}",
                        other
                    )))
                }
            };

            let text = if target <= 0xFF {
                format!("00{:X}", target)
            } else {
                format!("{:X}", target)
            };
            for code in from..=to {
                self.code_map.insert(code, text.clone());
            }
        }
        Ok(())
    }

    /// Decodes charcode bytes to the mapped strings.
    ///
    /// Bytes accumulate into a rolling code of up to four bytes; a lookup
    /// only fires at widths declared by a codespace range. When no width
    /// matches, the consumed bytes yield either nothing or (when
    /// `use_simple`) the simple-encoding rendition of each consumed byte.
    pub fn decode(
        &self,
        src: &[u8],
        simple_encoding: Option<&[u32; 256]>,
        use_simple: bool,
    ) -> String {
        let mut out = String::new();
        let mut i = 0;

        while i < src.len() {
            let mut code: u64 = 0;
            let mut j = 0;
            let mut fallback = [0u32; 4];

            loop {
                let b = src[i + j];
                if use_simple {
                    if let Some(table) = simple_encoding {
                        fallback[j] = table[b as usize];
                    }
                }
                code = (code << 8) | b as u64;

                let width_bit = 1u8 << (j + 1);
                if self.code_span & width_bit != 0 {
                    if let Some(target) = self.code_map.get(&code) {
                        out.push_str(target);
                        break;
                    }
                }

                if j == 3 || i + j == src.len() - 1 {
                    if use_simple && simple_encoding.is_some() {
                        for &cp in &fallback[..=j] {
                            push_scalar(&mut out, cp);
                        }
                    }
                    break;
                }
                j += 1;
            }

            i += j + 1;
        }

        out
    }

    /// Like [`decode`](Self::decode), but the mapped target is hex-decoded to
    /// raw CID bytes. Unmapped spans fall back to the trailing raw source
    /// bytes of the consumed window.
    pub fn decode_to_cid(&self, src: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut i = 0;

        while i < src.len() {
            let mut code: u64 = 0;
            let mut j = 0;

            loop {
                let b = src[i + j];
                code = (code << 8) | b as u64;

                let width_bit = 1u8 << (j + 1);
                if self.code_span & width_bit != 0 {
                    if let Some(target) = self.code_map.get(&code) {
                        if let Some(bytes) = hex_text_to_bytes(target) {
                            out.extend_from_slice(&bytes);
                        }
                        break;
                    }
                }

                if j == 3 || i + j == src.len() - 1 {
                    log::debug!("no CID mapping for code 0x{:X}", code);
                    let end = i + j;
                    let start = if end > 3 { end - 3 } else { 0 };
                    out.extend_from_slice(&src[start..=end]);
                    break;
                }
                j += 1;
            }

            i += j + 1;
        }

        out
    }

    /// Single-code lookup, `?` when unmapped.
    pub fn code_to_unicode(&self, code: u64) -> &str {
        self.code_map.get(&code).map(String::as_str).unwrap_or("?")
    }
}

/// Big-endian accumulation of hex-string bytes into a code value.
pub(crate) fn hex_to_u64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

/// Interprets hex-string bytes as UTF-16BE code units, two bytes per rune.
/// A trailing odd byte is dropped.
fn utf16_be_to_string(bytes: &[u8]) -> String {
    let mut out = String::new();
    for pair in bytes.chunks_exact(2) {
        let v = ((pair[0] as u32) << 8) | pair[1] as u32;
        push_scalar(&mut out, v);
    }
    out
}

fn scalar_to_string(v: u64) -> String {
    let mut out = String::new();
    push_scalar(&mut out, v.min(u32::MAX as u64) as u32);
    out
}

fn push_scalar(out: &mut String, v: u32) {
    out.push(char::from_u32(v).unwrap_or('\u{FFFD}'));
}

/// Zero-padded uppercase hex text for CID targets, four digits wide up to
/// 0xFFFF.
fn cid_hex_text(v: u64) -> String {
    if v <= 0xF {
        format!("000{:X}", v)
    } else if v <= 0xFF {
        format!("00{:X}", v)
    } else if v <= 0xFFF {
        format!("0{:X}", v)
    } else {
        format!("{:X}", v)
    }
}

fn hex_text_to_bytes(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 {
        return None;
    }
    let mut out = Vec::with_capacity(text.len() / 2);
    let bytes = text.as_bytes();
    for pair in bytes.chunks_exact(2) {
        let hi = (pair[0] as char).to_digit(16)?;
        let lo = (pair[1] as char).to_digit(16)?;
        out.push(((hi << 4) | lo) as u8);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDENTITY_HEADER: &str = "\
/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
";

    fn cmap(body: &str) -> CMap {
        let data = format!("{}{}endcmap\nend\nend\n", IDENTITY_HEADER, body);
        CMap::parse(data.as_bytes()).unwrap()
    }

    #[test]
    fn metadata_and_codespace() {
        let c = cmap("");
        assert_eq!(c.name(), "Adobe-Identity-UCS");
        assert_eq!(c.ctype(), 2);
        assert_eq!(
            c.codespaces(),
            &[Codespace { low: 0, high: 0xFFFF, width: 2 }]
        );
    }

    #[test]
    fn bfchar_hex_targets() {
        let c = cmap("2 beginbfchar\n<0041> <0041>\n<0042> <0062>\nendbfchar\n");
        assert_eq!(c.decode(&[0x00, 0x41, 0x00, 0x42], None, false), "Ab");
    }

    #[test]
    fn bfchar_utf16_pair_target() {
        let c = cmap("1 beginbfchar\n<0001> <4E2D>\nendbfchar\n");
        assert_eq!(c.decode(&[0x00, 0x01], None, false), "中");
    }

    #[test]
    fn bfrange_hex_target_applies_delta() {
        let c = cmap("1 beginbfrange\n<0010> <0012> <0061>\nendbfrange\n");
        assert_eq!(c.decode(&[0x00, 0x10, 0x00, 0x11, 0x00, 0x12], None, false), "abc");
    }

    #[test]
    fn bfrange_array_target_is_elementwise() {
        let c = cmap("1 beginbfrange\n<0001> <0002> [<0058> <0059>]\nendbfrange\n");
        assert_eq!(c.decode(&[0x00, 0x01, 0x00, 0x02], None, false), "XY");
    }

    #[test]
    fn bfrange_array_length_mismatch_is_an_error() {
        let data = format!(
            "{}1 beginbfrange\n<0001> <0003> [<0058> <0059>]\nendbfrange\nendcmap\n",
            IDENTITY_HEADER
        );
        assert!(CMap::parse(data.as_bytes()).is_err());
    }

    #[test]
    fn bfchar_integer_target_formats_as_hex_text() {
        let c = cmap("1 beginbfchar\n<0003> 65\nendbfchar\n");
        // 65 = 0x41, padded to "0041": the literal text, not "A".
        assert_eq!(c.decode(&[0x00, 0x03], None, false), "0041");
    }

    #[test]
    fn lookup_honours_codespace_width() {
        // Mapping exists for single-byte code 0x41 but the codespace is
        // two bytes wide, so width 1 never fires.
        let data = "\
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
1 beginbfchar
<41> <005A>
endbfchar
endcmap
";
        let c = CMap::parse(data.as_bytes()).unwrap();
        assert_eq!(c.decode(&[0x41], None, false), "");
        // The same mapping with a one-byte codespace fires at width 1.
        let data = "\
1 begincodespacerange
<00> <FF>
endcodespacerange
1 beginbfchar
<41> <005A>
endbfchar
endcmap
";
        let c = CMap::parse(data.as_bytes()).unwrap();
        assert_eq!(c.decode(&[0x41], None, false), "Z");
    }

    #[test]
    fn decode_consumes_every_byte() {
        let c = cmap("1 beginbfchar\n<0041> <0058>\nendbfchar\n");
        // Mapped pair, then an unmappable tail; the loop must terminate
        // having walked the full input.
        assert_eq!(c.decode(&[0x00, 0x41, 0xDE, 0xAD, 0xBE], None, false), "X");
    }

    #[test]
    fn decode_is_deterministic() {
        let c = cmap("1 beginbfchar\n<0041> <0058>\nendbfchar\n");
        let input = [0x00, 0x41, 0x00, 0x41];
        assert_eq!(c.decode(&input, None, false), c.decode(&input, None, false));
    }

    #[test]
    fn simple_encoding_fallback_at_exhaustion() {
        let mut table = [0u32; 256];
        table[0x41] = 'A' as u32;
        table[0x42] = 'B' as u32;
        let c = cmap("1 beginbfchar\n<0043> <0058>\nendbfchar\n");
        // 0x41 0x42 never matches any mapped code, so both consumed bytes
        // fall back to the simple encoding.
        assert_eq!(c.decode(&[0x41, 0x42], Some(&table), true), "AB");
    }

    #[test]
    fn cidchar_accepts_endbfchar_terminator() {
        let data = "\
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
1 begincidchar
<0041> 7
endbfchar
endcmap
";
        let c = CMap::parse(data.as_bytes()).unwrap();
        assert_eq!(c.code_to_unicode(0x41), "0007");
    }

    #[test]
    fn decode_to_cid_hex_decodes_targets() {
        let c = cmap("1 begincidrange\n<0020> <0022> 100\nendcidrange\n");
        // Codes 0x20..0x22 map to CIDs 100..102 = 0x64..0x66.
        assert_eq!(
            c.decode_to_cid(&[0x00, 0x20, 0x00, 0x22]),
            vec![0x00, 0x64, 0x00, 0x66]
        );
    }

    #[test]
    fn decode_to_cid_falls_back_to_raw_bytes() {
        let c = cmap("1 begincidchar\n<0041> 7\nendcidchar\n");
        assert_eq!(c.decode_to_cid(&[0xAA, 0xBB]), vec![0xAA, 0xBB]);
    }

    #[test]
    fn notdefrange_populates_codes() {
        let c = cmap("1 beginnotdefrange\n<00F0> <00F2> 0\nendnotdefrange\n");
        assert_eq!(c.code_to_unicode(0xF0), "000");
        assert_eq!(c.code_to_unicode(0xF2), "000");
    }
}
