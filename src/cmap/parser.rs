//! Tokenizer for the CMap mini-language.
//!
//! CMaps are written in a small PostScript-flavoured syntax; the parser only
//! needs a flat token stream: hex strings, integers, names, literal strings,
//! arrays and bare operands. Dictionary delimiters surface as operands so the
//! driver loop can skip `/CIDSystemInfo << ... >>` blocks without modelling
//! them.

use crate::core::error::{PdfError, Result};
use crate::core::lexer;
use crate::core::object::PdfObject;
use crate::core::source::ByteSource;

#[derive(Debug, Clone, PartialEq)]
pub enum CMapToken {
    /// `<00FF>`: raw bytes of the hex string.
    Hex(Vec<u8>),
    /// Bare integer (reals are truncated; CMaps only use whole numbers).
    Int(i64),
    /// `/Name`: byte content with escapes decoded.
    Name(Vec<u8>),
    /// `(string)`.
    String(Vec<u8>),
    /// `[ ... ]` of nested tokens.
    Array(Vec<CMapToken>),
    /// Any bare word, including `<<` and `>>`.
    Operand(String),
}

pub struct CMapParser {
    src: ByteSource,
}

impl CMapParser {
    pub fn new(data: Vec<u8>) -> Self {
        CMapParser {
            src: ByteSource::from_bytes(data),
        }
    }

    /// Returns the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<CMapToken>> {
        lexer::skip_comments(&mut self.src);

        let b = match self.src.peek() {
            Some(b) => b,
            None => return Ok(None),
        };

        match b {
            b'/' => Ok(Some(CMapToken::Name(
                lexer::parse_name(&mut self.src)?.as_bytes().to_vec(),
            ))),
            b'<' => {
                if self.src.peek_ahead(2) == b"<<" {
                    self.src.discard(2);
                    Ok(Some(CMapToken::Operand("<<".to_string())))
                } else {
                    Ok(Some(CMapToken::Hex(lexer::parse_hex_string(&mut self.src)?)))
                }
            }
            b'>' => {
                if self.src.peek_ahead(2) == b">>" {
                    self.src.discard(2);
                    Ok(Some(CMapToken::Operand(">>".to_string())))
                } else {
                    Err(PdfError::CMapParse("stray '>'".to_string()))
                }
            }
            b'(' => Ok(Some(CMapToken::String(lexer::parse_literal_string(
                &mut self.src,
            )?))),
            b'[' => {
                self.src.discard(1);
                let mut items = Vec::new();
                loop {
                    lexer::skip_comments(&mut self.src);
                    match self.src.peek() {
                        Some(b']') => {
                            self.src.discard(1);
                            break;
                        }
                        Some(_) => match self.next_token()? {
                            Some(token) => items.push(token),
                            None => {
                                return Err(PdfError::CMapParse(
                                    "unterminated array".to_string(),
                                ))
                            }
                        },
                        None => {
                            return Err(PdfError::CMapParse("unterminated array".to_string()))
                        }
                    }
                }
                Ok(Some(CMapToken::Array(items)))
            }
            b']' => Err(PdfError::CMapParse("stray ']'".to_string())),
            b'+' | b'-' | b'.' | b'0'..=b'9' => {
                let number = lexer::parse_number(&mut self.src)
                    .map_err(|e| PdfError::CMapParse(e.to_string()))?;
                let value = match number {
                    PdfObject::Integer(v) => v,
                    PdfObject::Real(v) => v as i64,
                    _ => unreachable!(),
                };
                Ok(Some(CMapToken::Int(value)))
            }
            _ => {
                let mut word = Vec::new();
                while let Some(b) = self.src.peek() {
                    if lexer::is_whitespace(b) || lexer::is_delimiter(b) {
                        break;
                    }
                    self.src.discard(1);
                    word.push(b);
                }
                if word.is_empty() {
                    return Err(PdfError::CMapParse(format!(
                        "unexpected byte 0x{:02X}",
                        b
                    )));
                }
                Ok(Some(CMapToken::Operand(
                    String::from_utf8_lossy(&word).into_owned(),
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<CMapToken> {
        let mut parser = CMapParser::new(input.as_bytes().to_vec());
        let mut out = Vec::new();
        while let Some(token) = parser.next_token().unwrap() {
            out.push(token);
        }
        out
    }

    #[test]
    fn tokenizes_section_header() {
        assert_eq!(
            tokens("2 beginbfchar"),
            vec![
                CMapToken::Int(2),
                CMapToken::Operand("beginbfchar".to_string()),
            ]
        );
    }

    #[test]
    fn tokenizes_hex_and_names() {
        assert_eq!(
            tokens("<0041> /Adobe-Identity-UCS"),
            vec![
                CMapToken::Hex(vec![0x00, 0x41]),
                CMapToken::Name(b"Adobe-Identity-UCS".to_vec()),
            ]
        );
    }

    #[test]
    fn tokenizes_arrays() {
        assert_eq!(
            tokens("[<01> <02>]"),
            vec![CMapToken::Array(vec![
                CMapToken::Hex(vec![0x01]),
                CMapToken::Hex(vec![0x02]),
            ])]
        );
    }

    #[test]
    fn dict_delimiters_become_operands() {
        let toks = tokens("<< /Registry (Adobe) >>");
        assert_eq!(toks[0], CMapToken::Operand("<<".to_string()));
        assert_eq!(toks[1], CMapToken::Name(b"Registry".to_vec()));
        assert_eq!(toks[2], CMapToken::String(b"Adobe".to_vec()));
        assert_eq!(toks[3], CMapToken::Operand(">>".to_string()));
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            tokens("%%Comment line\n7 endcmap"),
            vec![CMapToken::Int(7), CMapToken::Operand("endcmap".to_string())]
        );
    }
}
