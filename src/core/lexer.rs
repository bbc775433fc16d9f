//! Lexical primitives shared by the object parser and the content-stream
//! tokenizer: byte classification, whitespace/comment skipping and the
//! parsers for names, numbers and both string forms.

use super::error::{PdfError, Result};
use super::object::{Name, PdfObject};
use super::source::ByteSource;

/// PDF whitespace: NUL, TAB, LF, FF, CR, SPACE.
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, 0x00 | 0x09 | 0x0A | 0x0C | 0x0D | 0x20)
}

/// PDF delimiters: `( ) < > [ ] { } / %`.
pub fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

pub fn is_decimal_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

pub fn is_octal_digit(b: u8) -> bool {
    (b'0'..=b'7').contains(&b)
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Skips whitespace bytes, returning how many were consumed.
pub fn skip_spaces(src: &mut ByteSource) -> usize {
    let mut count = 0;
    while let Some(b) = src.peek() {
        if !is_whitespace(b) {
            break;
        }
        src.discard(1);
        count += 1;
    }
    count
}

/// Skips whitespace and `%` comments, including consecutive comment lines.
pub fn skip_comments(src: &mut ByteSource) {
    loop {
        skip_spaces(src);
        match src.peek() {
            Some(b'%') => {
                while let Some(b) = src.peek() {
                    if b == b'\r' || b == b'\n' {
                        break;
                    }
                    src.discard(1);
                }
            }
            _ => return,
        }
    }
}

/// Parses a name. The cursor may sit on (or before) the leading `/`; the
/// name runs until whitespace or a delimiter, with `#xx` escapes decoded.
pub fn parse_name(src: &mut ByteSource) -> Result<Name> {
    loop {
        match src.peek() {
            Some(b'/') => {
                src.discard(1);
                break;
            }
            Some(_) => src.discard(1),
            None => return Err(PdfError::UnexpectedEof),
        }
    }

    let mut out = Vec::new();
    while let Some(b) = src.peek() {
        if is_whitespace(b) {
            src.discard(1);
            break;
        }
        if is_delimiter(b) {
            break;
        }
        src.discard(1);
        if b == b'#' {
            // Like /A#42 = AB
            let first = src.read_byte()?;
            let second = src.read_byte()?;
            match (hex_value(first), hex_value(second)) {
                (Some(hi), Some(lo)) => out.push((hi << 4) | lo),
                _ => {
                    return Err(PdfError::UnexpectedToken(format!(
                        "invalid #xx escape in name: #{}{}",
                        first as char, second as char
                    )))
                }
            }
        } else {
            out.push(b);
        }
    }

    Ok(Name::new(out))
}

/// Parses an integer or real.
///
/// A leading sign is accepted, as is a second sign directly after an `e`;
/// exponential form is not legal in a conforming writer but shows up in the
/// wild, so the reader accepts it. EOF closes the token instead of failing,
/// which matters for objects sitting at the very end of a decoded stream.
pub fn parse_number(src: &mut ByteSource) -> Result<PdfObject> {
    let mut buf = String::new();
    let mut is_real = false;
    let mut allow_signs = true;

    while let Some(b) = src.peek() {
        if allow_signs && (b == b'-' || b == b'+') {
            src.discard(1);
            buf.push(b as char);
            allow_signs = false;
        } else if is_decimal_digit(b) {
            src.discard(1);
            buf.push(b as char);
        } else if b == b'.' {
            src.discard(1);
            buf.push('.');
            is_real = true;
        } else if b == b'e' {
            src.discard(1);
            buf.push('e');
            is_real = true;
            allow_signs = true;
        } else {
            break;
        }
    }

    if is_real {
        buf.parse::<f64>()
            .map(PdfObject::Real)
            .map_err(|_| PdfError::UnexpectedToken(format!("invalid number: {:?}", buf)))
    } else {
        buf.parse::<i64>()
            .map(PdfObject::Integer)
            .map_err(|_| PdfError::UnexpectedToken(format!("invalid number: {:?}", buf)))
    }
}

/// Parses a hex string `<...>` into its decoded bytes. Whitespace inside the
/// brackets is ignored; other non-hex bytes are skipped with a note; an odd
/// number of digits is right-padded with `0`.
pub fn parse_hex_string(src: &mut ByteSource) -> Result<Vec<u8>> {
    src.discard(1); // '<'

    let mut out = Vec::new();
    let mut pending: Option<u8> = None;
    loop {
        let b = src.read_byte()?;
        if b == b'>' {
            break;
        }
        if is_whitespace(b) {
            continue;
        }
        match hex_value(b) {
            Some(digit) => match pending.take() {
                Some(hi) => out.push((hi << 4) | digit),
                None => pending = Some(digit),
            },
            None => log::debug!("skipping non-hex byte 0x{:02X} in hex string", b),
        }
    }
    if let Some(hi) = pending {
        out.push(hi << 4);
    }

    Ok(out)
}

/// Parses a literal string `(...)`, honouring balanced parentheses, the
/// named escapes, and octal `\ddd` up to three digits. Escaped line breaks
/// and unknown escapes vanish from the output.
pub fn parse_literal_string(src: &mut ByteSource) -> Result<Vec<u8>> {
    src.discard(1); // '('

    let mut out = Vec::new();
    let mut depth = 1u32;
    loop {
        let b = src.read_byte()?;
        if b == b'\\' {
            let esc = src.read_byte()?;
            if is_octal_digit(esc) {
                let mut code = (esc - b'0') as u32;
                for _ in 0..2 {
                    match src.peek() {
                        Some(d) if is_octal_digit(d) => {
                            src.discard(1);
                            code = (code << 3) | (d - b'0') as u32;
                        }
                        _ => break,
                    }
                }
                out.push(code as u8);
                continue;
            }
            match esc {
                b'n' => out.push(b'\n'),
                b'r' => out.push(b'\r'),
                b't' => out.push(b'\t'),
                b'b' => out.push(0x08),
                b'f' => out.push(0x0C),
                b'(' => out.push(b'('),
                b')' => out.push(b')'),
                b'\\' => out.push(b'\\'),
                _ => {}
            }
        } else if b == b'(' {
            depth += 1;
            out.push(b);
        } else if b == b')' {
            depth -= 1;
            if depth == 0 {
                break;
            }
            out.push(b);
        } else {
            out.push(b);
        }
    }

    Ok(out)
}

/// Parses `true` or `false`.
pub fn parse_bool(src: &mut ByteSource) -> Result<PdfObject> {
    let ahead = src.peek_ahead(5);
    if ahead.starts_with(b"true") {
        src.discard(4);
        Ok(PdfObject::Bool(true))
    } else if ahead.starts_with(b"false") {
        src.discard(5);
        Ok(PdfObject::Bool(false))
    } else {
        Err(PdfError::UnexpectedToken(format!(
            "expected boolean, got {:?}",
            String::from_utf8_lossy(ahead)
        )))
    }
}

/// Parses `null`.
pub fn parse_null(src: &mut ByteSource) -> Result<PdfObject> {
    let ahead = src.peek_ahead(4);
    if ahead != b"null" {
        return Err(PdfError::UnexpectedToken(format!(
            "expected null, got {:?}",
            String::from_utf8_lossy(ahead)
        )));
    }
    src.discard(4);
    Ok(PdfObject::Null)
}
