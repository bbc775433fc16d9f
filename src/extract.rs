//! Text assembly.
//!
//! Content streams carry no spaces or line breaks; the assembler watches the
//! text-positioning operators and infers them. A drop in the `Tm` y
//! translation or a `T*`/`'`/`"` line advance becomes `\n`, a rightward jump
//! of the x translation becomes `\t`. Comparing the current `re` rectangle
//! against the one completed at the previous `ET` suppresses the newlines
//! that decorative clipped boxes would otherwise inject between glyphs of
//! one visual line.

use crate::content::{
    ContentStreamParser, ContentStreamProcessor, HandlerCondition, Operation,
};
use crate::core::error::{PdfError, Result};
use crate::core::object::PdfObject;
use crate::font::{Font, FontTable};
use std::rc::Rc;

/// Decodes show-text operators into a growing Unicode buffer.
pub struct TextAssembler {
    buf: String,
    in_text: bool,
    current_font: Option<Rc<Font>>,
    x_pos: Option<f64>,
    y_pos: Option<f64>,
    cur_rect: [f64; 4],
    last_rect: Option<[f64; 4]>,
}

impl Default for TextAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl TextAssembler {
    pub fn new() -> Self {
        TextAssembler {
            buf: String::new(),
            in_text: false,
            current_font: None,
            x_pos: None,
            y_pos: None,
            cur_rect: [-1.0; 4],
            // Unset compares unequal to any rectangle: before the first ET
            // there is no completed clip region to suppress breaks against.
            last_rect: None,
        }
    }

    pub fn into_text(self) -> String {
        self.buf
    }

    fn rect_changed(&self) -> bool {
        self.last_rect.map_or(true, |rect| rect != self.cur_rect)
    }

    /// Handles one operation. Registered for all operations; everything
    /// outside the table below is ignored at this layer.
    pub fn handle(&mut self, op: &Operation, fonts: &FontTable) -> Result<()> {
        match op.operator.as_str() {
            "re" => {
                if self.in_text {
                    log::debug!("re operator inside a text object");
                    return Ok(());
                }
                if op.operands.len() != 4 {
                    return Err(PdfError::TypeMismatch(format!(
                        "re expects 4 operands, got {}",
                        op.operands.len()
                    )));
                }
                for (i, operand) in op.operands.iter().enumerate() {
                    match operand.as_number() {
                        Some(value) => self.cur_rect[i] = value,
                        None => {
                            log::debug!("re operand {} is not a number", i);
                            return Ok(());
                        }
                    }
                }
            }
            "BT" => self.in_text = true,
            "ET" => {
                self.in_text = false;
                self.last_rect = Some(self.cur_rect);
            }
            "Tf" => {
                if !self.in_text {
                    log::debug!("Tf operator outside a text object");
                    return Ok(());
                }
                if op.operands.len() != 2 {
                    return Err(PdfError::TypeMismatch(format!(
                        "Tf expects 2 operands, got {}",
                        op.operands.len()
                    )));
                }
                let name = op.operands[0].as_name().ok_or_else(|| {
                    PdfError::TypeMismatch("Tf font operand is not a name".to_string())
                })?;
                self.current_font = Some(Rc::clone(fonts.get(name.as_bytes()).ok_or_else(
                    || PdfError::FontNotFound(name.to_string_lossy()),
                )?));
            }
            "T*" => {
                if !self.in_text {
                    return Ok(());
                }
                if self.rect_changed() {
                    self.buf.push('\n');
                }
            }
            "'" => {
                if !self.in_text {
                    return Ok(());
                }
                if self.rect_changed() {
                    self.buf.push('\n');
                }
                if let Some(bytes) = op.operands.first().and_then(PdfObject::as_string) {
                    self.show_text(bytes);
                }
            }
            "\"" => {
                if !self.in_text {
                    return Ok(());
                }
                if self.rect_changed() {
                    self.buf.push('\n');
                }
                if let Some(bytes) = op.operands.get(2).and_then(PdfObject::as_string) {
                    self.show_text(bytes);
                }
            }
            "Td" | "TD" => {
                if !self.in_text {
                    return Ok(());
                }
                if op.operands.len() != 2 {
                    log::debug!("{} with {} operands", op.operator, op.operands.len());
                    return Ok(());
                }
                let ty = match op.operands[1].as_number() {
                    Some(value) => value,
                    None => return Ok(()),
                };
                if ty < 0.0 && self.rect_changed() {
                    self.buf.push('\n');
                }
            }
            "Tm" => {
                if !self.in_text {
                    return Ok(());
                }
                if op.operands.len() != 6 {
                    return Err(PdfError::TypeMismatch(format!(
                        "Tm expects 6 operands, got {}",
                        op.operands.len()
                    )));
                }
                let e = match op.operands[4].as_number() {
                    Some(value) => value,
                    None => return Ok(()),
                };
                let f = match op.operands[5].as_number() {
                    Some(value) => value,
                    None => return Ok(()),
                };

                match self.y_pos {
                    None => self.y_pos = Some(f),
                    Some(y) if y > f => {
                        if self.rect_changed() {
                            self.buf.push('\n');
                        }
                        self.x_pos = Some(e);
                        self.y_pos = Some(f);
                        return Ok(());
                    }
                    _ => self.y_pos = Some(f),
                }

                match self.x_pos {
                    None => self.x_pos = Some(e),
                    Some(x) if x < e => {
                        self.buf.push('\t');
                        self.x_pos = Some(e);
                    }
                    _ => {}
                }
            }
            "Tj" => {
                if !self.in_text {
                    log::debug!("Tj operator outside a text object");
                    return Ok(());
                }
                let bytes = match op.operands.first() {
                    Some(operand) => operand.as_string().ok_or_else(|| {
                        PdfError::TypeMismatch("Tj operand is not a string".to_string())
                    })?,
                    None => return Ok(()),
                };
                self.show_text(bytes);
            }
            "TJ" => {
                if !self.in_text {
                    return Ok(());
                }
                let items = match op.operands.first() {
                    Some(operand) => operand.as_array().ok_or_else(|| {
                        PdfError::TypeMismatch("TJ operand is not an array".to_string())
                    })?,
                    None => return Ok(()),
                };
                for item in items {
                    match item {
                        PdfObject::String(bytes) => self.show_text(bytes),
                        // Numeric displacements adjust glyph positions;
                        // values below -100 often mark word gaps, but no
                        // whitespace is emitted for them.
                        PdfObject::Integer(_) | PdfObject::Real(_) => {}
                        _ => {}
                    }
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// The shared show-string pipeline: predefined-CJK CID remap, then the
    /// ToUnicode CMap (with simple-encoding fallback), then the plain
    /// simple-encoding table, then raw bytes as a last resort.
    fn show_text(&mut self, bytes: &[u8]) {
        let font = match &self.current_font {
            Some(font) => font,
            None => {
                self.buf.push_str(&String::from_utf8_lossy(bytes));
                return;
            }
        };

        let remapped: Option<Vec<u8>> = if font.has_predefined_cmap() {
            font.cid_cmap().map(|cid_cmap| cid_cmap.decode_to_cid(bytes))
        } else {
            None
        };
        let bytes: &[u8] = remapped.as_deref().unwrap_or(bytes);

        if let Some(cmap) = font.to_unicode() {
            self.buf.push_str(&cmap.decode(
                bytes,
                font.simple_encoding(),
                font.simple_encoding_active(),
            ));
        } else if font.simple_encoding_active() {
            if let Some(table) = font.simple_encoding() {
                for &b in bytes {
                    self.buf
                        .push(char::from_u32(table[b as usize]).unwrap_or('\u{FFFD}'));
                }
            }
        } else {
            self.buf.push_str(&String::from_utf8_lossy(bytes));
        }
    }
}

/// Tokenizes one decoded content stream and runs the text assembler over it
/// with the page's font table.
pub fn extract_stream_text(data: Vec<u8>, fonts: &FontTable) -> Result<String> {
    let operations = ContentStreamParser::new(data).parse()?;

    let mut assembler = TextAssembler::new();
    {
        let mut processor = ContentStreamProcessor::new(operations);
        processor.add_handler(HandlerCondition::All, |op, fonts| {
            assembler.handle(op, fonts)
        });
        processor.process(fonts)?;
    }

    Ok(assembler.into_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::PdfError;
    use crate::core::object::{Dict, Name};
    use crate::core::parser::tests::bare_parser;
    use crate::font::{CMapResourceLoader, FsCMapLoader};

    fn winansi_font() -> Rc<Font> {
        let dict = match bare_parser(b"<< /Subtype /Type1 /Encoding /WinAnsiEncoding >>")
            .parse_object()
            .unwrap()
        {
            PdfObject::Dict(dict) => dict,
            _ => unreachable!(),
        };
        let mut parser = bare_parser(b"");
        Rc::new(Font::load(dict, &mut parser, &FsCMapLoader::default()).unwrap())
    }

    fn fonts_with_f1() -> FontTable {
        let mut fonts = FontTable::new();
        fonts.insert(Name::new(*b"F1"), winansi_font());
        fonts
    }

    fn extract(content: &str, fonts: &FontTable) -> String {
        extract_stream_text(content.as_bytes().to_vec(), fonts).unwrap()
    }

    #[test]
    fn plain_show_text() {
        let fonts = fonts_with_f1();
        assert_eq!(extract("BT /F1 12 Tf (Hello) Tj ET", &fonts), "Hello");
    }

    #[test]
    fn no_positioning_means_no_whitespace() {
        let fonts = fonts_with_f1();
        assert_eq!(
            extract("BT /F1 12 Tf (Hel) Tj (lo) Tj ET", &fonts),
            "Hello"
        );
    }

    #[test]
    fn tm_y_drop_emits_newline() {
        let fonts = fonts_with_f1();
        assert_eq!(
            extract(
                "BT /F1 12 Tf 1 0 0 1 0 100 Tm (A) Tj 1 0 0 1 0 50 Tm (B) Tj ET",
                &fonts
            ),
            "A\nB"
        );
    }

    #[test]
    fn tm_x_advance_emits_tab() {
        let fonts = fonts_with_f1();
        assert_eq!(
            extract(
                "BT /F1 12 Tf 1 0 0 1 0 100 Tm (A) Tj 1 0 0 1 200 100 Tm (B) Tj ET",
                &fonts
            ),
            "A\tB"
        );
    }

    #[test]
    fn next_line_operator_emits_newline() {
        let fonts = fonts_with_f1();
        assert_eq!(
            extract("BT /F1 12 Tf (x) Tj T* (y) Tj ET", &fonts),
            "x\ny"
        );
    }

    #[test]
    fn quote_operators_show_after_line_break() {
        let fonts = fonts_with_f1();
        assert_eq!(
            extract("BT /F1 12 Tf (a) Tj (b) ' ET", &fonts),
            "a\nb"
        );
        assert_eq!(
            extract("BT /F1 12 Tf (a) Tj 2 3 (b) \" ET", &fonts),
            "a\nb"
        );
    }

    #[test]
    fn unchanged_clip_rect_suppresses_newline() {
        let fonts = fonts_with_f1();
        // Same rectangle completed before both text objects: the y drop in
        // the second block is decoration-relative, not a real line break.
        assert_eq!(
            extract(
                "0 0 10 10 re BT /F1 12 Tf 1 0 0 1 0 100 Tm (A) Tj ET \
                 0 0 10 10 re BT /F1 12 Tf 1 0 0 1 0 50 Tm (B) Tj ET",
                &fonts
            ),
            "AB"
        );
    }

    #[test]
    fn changed_clip_rect_allows_newline() {
        let fonts = fonts_with_f1();
        assert_eq!(
            extract(
                "0 0 10 10 re BT /F1 12 Tf 1 0 0 1 0 100 Tm (A) Tj ET \
                 0 0 20 20 re BT /F1 12 Tf 1 0 0 1 0 50 Tm (B) Tj ET",
                &fonts
            ),
            "A\nB"
        );
    }

    #[test]
    fn td_negative_y_emits_newline() {
        let fonts = fonts_with_f1();
        assert_eq!(
            extract("BT /F1 12 Tf (a) Tj 0 -14 Td (b) Tj ET", &fonts),
            "a\nb"
        );
        // Positive ty moves up; no break.
        assert_eq!(
            extract("BT /F1 12 Tf (a) Tj 0 14 Td (b) Tj ET", &fonts),
            "ab"
        );
    }

    #[test]
    fn tj_array_concatenates_without_spacing() {
        let fonts = fonts_with_f1();
        // Large negative displacements currently add nothing.
        assert_eq!(
            extract("BT /F1 12 Tf [(He) -250 (llo)] TJ ET", &fonts),
            "Hello"
        );
    }

    #[test]
    fn unknown_font_fails_the_stream() {
        let fonts = fonts_with_f1();
        let result = extract_stream_text(
            b"BT /Nope 12 Tf (x) Tj ET".to_vec(),
            &fonts,
        );
        assert!(matches!(result, Err(PdfError::FontNotFound(_))));
    }

    #[test]
    fn no_font_falls_back_to_raw_bytes() {
        let fonts = FontTable::new();
        assert_eq!(extract("BT (raw) Tj ET", &fonts), "raw");
    }

    #[test]
    fn simple_encoding_maps_bytes() {
        // Differences remap byte 0x41 to /space, leaving 0x42 at WinAnsi B.
        let dict = match bare_parser(
            b"<< /Subtype /Type1 /Encoding << /BaseEncoding /WinAnsiEncoding \
              /Differences [65 /space] >> >>",
        )
        .parse_object()
        .unwrap()
        {
            PdfObject::Dict(dict) => dict,
            _ => unreachable!(),
        };
        let mut parser = bare_parser(b"");
        let font =
            Rc::new(Font::load(dict, &mut parser, &FsCMapLoader::default()).unwrap());
        let mut fonts = FontTable::new();
        fonts.insert(Name::new(*b"F1"), font);

        assert_eq!(extract("BT /F1 12 Tf (AB) Tj ET", &fonts), " B");
    }

    #[test]
    fn tounicode_cmap_drives_decoding() {
        struct Inline;
        impl CMapResourceLoader for Inline {
            fn load_cmap(&self, name: &str) -> crate::core::error::Result<Vec<u8>> {
                Err(PdfError::ResourceMissing(name.to_string()))
            }
        }

        // A Type0 font whose ToUnicode stream lives at object 7.
        let cmap_body = b"1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n\
2 beginbfchar\n<0041> <0041>\n<0042> <0042>\nendbfchar\n";
        let mut fixture = Vec::new();
        fixture.extend_from_slice(
            format!("7 0 obj\n<< /Length {} >>\nstream\n", cmap_body.len()).as_bytes(),
        );
        fixture.extend_from_slice(cmap_body);
        fixture.extend_from_slice(b"\nendstream\nendobj\n");

        let mut parser = bare_parser(&fixture);
        parser.xrefs.insert(
            7,
            crate::core::xref::XrefEntry::InUse { offset: 0, gen: 0 },
        );

        let mut font_dict = Dict::new();
        font_dict.set(
            Name::new(*b"Subtype"),
            PdfObject::Name(Name::new(*b"Type0")),
        );
        font_dict.set(
            Name::new(*b"ToUnicode"),
            PdfObject::Reference { obj_num: 7, gen: 0 },
        );

        let font = Rc::new(Font::load(font_dict, &mut parser, &Inline).unwrap());
        assert!(font.to_unicode().is_some());

        let mut fonts = FontTable::new();
        fonts.insert(Name::new(*b"F1"), font);

        assert_eq!(extract("BT /F1 12 Tf <00410042> Tj ET", &fonts), "AB");
    }
}
