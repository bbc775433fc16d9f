//! Inline image parsing: everything between the `BI` and `EI` operators.
//!
//! After `ID` there is no reliable length, so the data runs until a
//! whitespace-bounded `EI` token, found with a small state machine that
//! pushes any partial match back into the image data.

use super::{ContentStreamParser, Element};
use crate::core::error::{PdfError, Result};
use crate::core::lexer;
use crate::core::object::{Dict, Name, PdfObject, Stream};

impl ContentStreamParser {
    /// Parses an inline image. `BI` has already been consumed; this reads
    /// the parameter entries, `ID`, the raw data and the closing `EI`.
    pub(crate) fn parse_inline_image(&mut self) -> Result<Stream> {
        let mut dict = Dict::new();

        loop {
            lexer::skip_spaces(&mut self.src);
            let element = self
                .parse_element()?
                .ok_or(PdfError::UnexpectedEof)?;

            match element {
                Element::Object(PdfObject::Name(param)) => {
                    let value = match self.parse_element()? {
                        Some(Element::Object(value)) => value,
                        Some(Element::Operator(op)) => {
                            return Err(PdfError::UnexpectedToken(format!(
                                "operator {:?} where an image parameter value was expected",
                                op
                            )))
                        }
                        None => return Err(PdfError::UnexpectedEof),
                    };

                    // Both abbreviated and long parameter names occur.
                    let key: &[u8] = match param.as_bytes() {
                        b"BPC" | b"BitsPerComponent" => b"BitsPerComponent",
                        b"CS" | b"ColorSpace" => b"ColorSpace",
                        b"D" | b"Decode" => b"Decode",
                        b"DP" | b"DecodeParms" => b"DecodeParms",
                        b"F" | b"Filter" => b"Filter",
                        b"H" | b"Height" => b"Height",
                        b"IM" => b"ImageMask",
                        b"Intent" => b"Intent",
                        b"I" | b"Interpolate" => b"Interpolate",
                        b"W" | b"Width" => b"Width",
                        other => {
                            return Err(PdfError::UnexpectedToken(format!(
                                "unknown inline image parameter /{}",
                                String::from_utf8_lossy(other)
                            )))
                        }
                    };
                    dict.set(Name::new(key), value);
                }
                Element::Object(other) => {
                    return Err(PdfError::UnexpectedToken(format!(
                        "inline image property is not a name: {:?}",
                        other
                    )))
                }
                Element::Operator(op) if op == "EI" => {
                    // Image fully defined with no data section.
                    return Ok(Stream {
                        dict,
                        data: Vec::new(),
                        obj_num: 0,
                        gen: 0,
                    });
                }
                Element::Operator(op) if op == "ID" => {
                    // A single whitespace byte separates ID from the data.
                    if let Some(b) = self.src.peek() {
                        if lexer::is_whitespace(b) {
                            self.src.discard(1);
                        }
                    }
                    let data = self.read_image_data()?;
                    return Ok(Stream {
                        dict,
                        data,
                        obj_num: 0,
                        gen: 0,
                    });
                }
                Element::Operator(op) => {
                    log::debug!("ignoring operator {:?} inside inline image", op);
                }
            }
        }
    }

    /// Scans the raw data for a whitespace-bounded `EI` token.
    ///
    /// States: data → whitespace seen → `E` seen → `I` seen → trailing
    /// whitespace ends the image. A failed partial match flushes the
    /// buffered bytes back into the data.
    fn read_image_data(&mut self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        let mut skipped: Vec<u8> = Vec::new();
        let mut state = 0u8;

        loop {
            let c = self.src.read_byte().map_err(|_| {
                log::debug!("inline image data ran past end of stream");
                PdfError::UnexpectedEof
            })?;

            match state {
                0 => {
                    if lexer::is_whitespace(c) {
                        skipped.clear();
                        skipped.push(c);
                        state = 1;
                    } else {
                        data.push(c);
                    }
                }
                1 => {
                    skipped.push(c);
                    if c == b'E' {
                        state = 2;
                    } else {
                        data.append(&mut skipped);
                        state = if lexer::is_whitespace(c) { 1 } else { 0 };
                    }
                }
                2 => {
                    skipped.push(c);
                    if c == b'I' {
                        state = 3;
                    } else {
                        data.append(&mut skipped);
                        state = 0;
                    }
                }
                _ => {
                    skipped.push(c);
                    if lexer::is_whitespace(c) {
                        return Ok(data);
                    }
                    // "<ws>EI" was part of the data after all.
                    data.append(&mut skipped);
                    state = 0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Operation;

    fn parse_ops(content: &[u8]) -> Vec<Operation> {
        ContentStreamParser::new(content.to_vec()).parse().unwrap()
    }

    fn image_of(ops: &[Operation]) -> &Stream {
        assert_eq!(ops[0].operator, "BI");
        ops[0].operands[0].as_stream().unwrap()
    }

    #[test]
    fn parses_parameters_and_data() {
        let ops = parse_ops(b"BI /W 4 /H 2 /BPC 8 /CS /G ID \x01\x02\x03\x04 EI Q");
        let image = image_of(&ops);
        assert_eq!(image.dict.get(b"Width"), Some(&PdfObject::Integer(4)));
        assert_eq!(image.dict.get(b"Height"), Some(&PdfObject::Integer(2)));
        assert_eq!(
            image.dict.get(b"BitsPerComponent"),
            Some(&PdfObject::Integer(8))
        );
        assert_eq!(image.data, vec![1, 2, 3, 4]);
        // Parsing resumes cleanly after EI.
        assert_eq!(ops[1].operator, "Q");
    }

    #[test]
    fn long_parameter_names_accepted() {
        let ops = parse_ops(b"BI /Width 1 /Height 1 ID x EI");
        let image = image_of(&ops);
        assert_eq!(image.dict.get(b"Width"), Some(&PdfObject::Integer(1)));
        assert_eq!(image.data, b"x");
    }

    #[test]
    fn embedded_near_miss_ei_stays_in_data() {
        // " Ex" and " EIx" both look like terminators until the last byte.
        let ops = parse_ops(b"BI /W 1 ID a Ex b EIx c EI ");
        let image = image_of(&ops);
        assert_eq!(image.data, b"a Ex b EIx c");
    }

    #[test]
    fn unknown_parameter_is_an_error() {
        let result = ContentStreamParser::new(b"BI /Bogus 1 ID x EI".to_vec()).parse();
        assert!(result.is_err());
    }

    #[test]
    fn unterminated_data_is_an_error() {
        let result = ContentStreamParser::new(b"BI /W 1 ID endless data".to_vec()).parse();
        assert!(result.is_err());
    }
}
