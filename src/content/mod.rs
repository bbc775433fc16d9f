//! Content-stream tokenization.
//!
//! A content stream is a flat sequence of operands followed by an operator.
//! The tokenizer reuses the object parser's lexical layer for the operands;
//! any bare word that is not `true`/`false`/`null` is an operator and closes
//! the current operation. `BI` hands off to the inline-image sub-parser.

mod inline_image;
pub mod processor;

pub use processor::{ContentStreamProcessor, HandlerCondition};

use crate::core::error::{PdfError, Result};
use crate::core::lexer;
use crate::core::object::PdfObject;
use crate::core::source::ByteSource;
use smallvec::SmallVec;

/// One operator with the operands that preceded it.
#[derive(Debug, Clone)]
pub struct Operation {
    pub operator: String,
    pub operands: SmallVec<[PdfObject; 8]>,
}

pub(crate) enum Element {
    Object(PdfObject),
    Operator(String),
}

/// Splits content-stream bytes into operator/operand records.
pub struct ContentStreamParser {
    pub(crate) src: ByteSource,
}

impl ContentStreamParser {
    pub fn new(data: Vec<u8>) -> Self {
        ContentStreamParser {
            src: ByteSource::from_bytes(data),
        }
    }

    /// Tokenizes the whole stream.
    pub fn parse(mut self) -> Result<Vec<Operation>> {
        let mut operations = Vec::new();
        let mut operands: SmallVec<[PdfObject; 8]> = SmallVec::new();

        loop {
            match self.parse_element()? {
                None => break,
                Some(Element::Object(obj)) => operands.push(obj),
                Some(Element::Operator(word)) => {
                    if word == "BI" {
                        if !operands.is_empty() {
                            log::debug!(
                                "discarding {} stray operands before inline image",
                                operands.len()
                            );
                            operands.clear();
                        }
                        let image = self.parse_inline_image()?;
                        let mut image_operand: SmallVec<[PdfObject; 8]> = SmallVec::new();
                        image_operand.push(PdfObject::Stream(image));
                        operations.push(Operation {
                            operator: word,
                            operands: image_operand,
                        });
                    } else {
                        operations.push(Operation {
                            operator: word,
                            operands: std::mem::take(&mut operands),
                        });
                    }
                }
            }
        }

        if !operands.is_empty() {
            return Err(PdfError::UnexpectedToken(
                "content stream ended with operands but no operator".to_string(),
            ));
        }

        Ok(operations)
    }

    /// Reads the next operand or operator. `None` at end of stream.
    pub(crate) fn parse_element(&mut self) -> Result<Option<Element>> {
        lexer::skip_comments(&mut self.src);

        let b = match self.src.peek() {
            Some(b) => b,
            None => return Ok(None),
        };

        let obj = match b {
            b'/' => PdfObject::Name(lexer::parse_name(&mut self.src)?),
            b'(' => PdfObject::String(lexer::parse_literal_string(&mut self.src)?),
            b'<' => {
                if self.src.peek_ahead(2) == b"<<" {
                    self.parse_dict()?
                } else {
                    PdfObject::String(lexer::parse_hex_string(&mut self.src)?)
                }
            }
            b'[' => self.parse_array()?,
            b'+' | b'-' | b'.' | b'0'..=b'9' => lexer::parse_number(&mut self.src)?,
            _ => {
                let word = self.read_word()?;
                return Ok(Some(match word.as_str() {
                    "true" => Element::Object(PdfObject::Bool(true)),
                    "false" => Element::Object(PdfObject::Bool(false)),
                    "null" => Element::Object(PdfObject::Null),
                    _ => Element::Operator(word),
                }));
            }
        };
        Ok(Some(Element::Object(obj)))
    }

    /// Reads an operand, treating a bare operator word as an error. Used
    /// inside arrays and dictionaries where operators cannot appear.
    fn parse_operand(&mut self) -> Result<PdfObject> {
        match self.parse_element()? {
            Some(Element::Object(obj)) => Ok(obj),
            Some(Element::Operator(word)) => Err(PdfError::UnexpectedToken(format!(
                "operator {:?} inside a composite operand",
                word
            ))),
            None => Err(PdfError::UnexpectedEof),
        }
    }

    fn parse_array(&mut self) -> Result<PdfObject> {
        self.src.discard(1); // '['
        let mut items = Vec::new();
        loop {
            lexer::skip_comments(&mut self.src);
            match self.src.peek() {
                Some(b']') => {
                    self.src.discard(1);
                    break;
                }
                Some(_) => items.push(self.parse_operand()?),
                None => return Err(PdfError::UnexpectedEof),
            }
        }
        Ok(PdfObject::Array(items))
    }

    fn parse_dict(&mut self) -> Result<PdfObject> {
        self.src.discard(2); // '<<'
        let mut dict = crate::core::object::Dict::new();
        loop {
            lexer::skip_comments(&mut self.src);
            if self.src.peek_ahead(2) == b">>" {
                self.src.discard(2);
                break;
            }
            if self.src.peek().is_none() {
                return Err(PdfError::UnexpectedEof);
            }
            let key = lexer::parse_name(&mut self.src)?;
            lexer::skip_comments(&mut self.src);
            let value = self.parse_operand()?;
            dict.set(key, value);
        }
        Ok(PdfObject::Dict(dict))
    }

    fn read_word(&mut self) -> Result<String> {
        let mut word = Vec::new();
        while let Some(b) = self.src.peek() {
            if lexer::is_whitespace(b) || lexer::is_delimiter(b) {
                break;
            }
            self.src.discard(1);
            word.push(b);
        }
        if word.is_empty() {
            return Err(PdfError::UnexpectedToken(format!(
                "unexpected byte 0x{:02X} in content stream",
                self.src.peek().unwrap_or(0)
            )));
        }
        Ok(String::from_utf8_lossy(&word).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Vec<Operation> {
        ContentStreamParser::new(content.as_bytes().to_vec())
            .parse()
            .unwrap()
    }

    #[test]
    fn operands_accumulate_until_operator() {
        let ops = parse("10 20 m\n30 40 l\nS");
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0].operator, "m");
        assert_eq!(ops[0].operands.len(), 2);
        assert_eq!(ops[1].operator, "l");
        assert_eq!(ops[2].operator, "S");
        assert!(ops[2].operands.is_empty());
    }

    #[test]
    fn text_block_tokenizes() {
        let ops = parse("BT /F1 12 Tf (Hello) Tj ET");
        let operators: Vec<_> = ops.iter().map(|op| op.operator.as_str()).collect();
        assert_eq!(operators, vec!["BT", "Tf", "Tj", "ET"]);
        assert_eq!(ops[1].operands.len(), 2);
        assert_eq!(ops[2].operands[0], PdfObject::String(b"Hello".to_vec()));
    }

    #[test]
    fn tj_array_with_mixed_elements() {
        let ops = parse("[(He) -50 (llo)] TJ");
        assert_eq!(ops[0].operator, "TJ");
        let items = ops[0].operands[0].as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[1], PdfObject::Integer(-50));
    }

    #[test]
    fn booleans_and_null_are_operands() {
        let ops = parse("true false null gs");
        assert_eq!(ops[0].operator, "gs");
        assert_eq!(ops[0].operands.len(), 3);
    }

    #[test]
    fn dict_operand_for_marked_content() {
        let ops = parse("/OC << /Type /OCG >> BDC EMC");
        assert_eq!(ops[0].operator, "BDC");
        assert_eq!(ops[0].operands.len(), 2);
        assert!(ops[0].operands[1].as_dict().is_some());
        assert_eq!(ops[1].operator, "EMC");
    }

    #[test]
    fn dangling_operands_are_an_error() {
        let result = ContentStreamParser::new(b"1 2 3".to_vec()).parse();
        assert!(result.is_err());
    }

    #[test]
    fn starred_operators_parse_as_words() {
        let ops = parse("T* f* W* n");
        let operators: Vec<_> = ops.iter().map(|op| op.operator.as_str()).collect();
        assert_eq!(operators, vec!["T*", "f*", "W*", "n"]);
    }

    #[test]
    fn quote_operators() {
        let ops = parse("(a) ' 1 2 (b) \"");
        assert_eq!(ops[0].operator, "'");
        assert_eq!(ops[1].operator, "\"");
        assert_eq!(ops[1].operands.len(), 3);
    }
}
