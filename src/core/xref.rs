//! Cross-reference loading: `startxref` discovery, classic xref tables,
//! compressed xref streams, and the `Prev`/`XRefStm` chain walk.

use super::decode;
use super::error::{PdfError, Result};
use super::lexer;
use super::object::{PdfObject, Stream};
use super::parser::Parser;
use regex::Regex;
use rustc_hash::FxHashMap;
use std::sync::LazyLock;

static RE_STARTXREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"startx?ref\s*(\d+)").unwrap());
static RE_SUBSECTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s+(\d+)$").unwrap());
static RE_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s+(\d+)\s+([nf])$").unwrap());

/// Window scanned backwards from EOF for the `startxref` pointer.
const STARTXREF_WINDOW: usize = 32;

/// Maximum `Size` accepted from a compressed xref stream. Sanity cap against
/// denial-of-service sized tables (maximum object count on a 32-bit system).
const MAX_XREF_SIZE: i64 = 8_388_607;

/// Where an indirect object lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XrefEntry {
    /// Stored uncompressed at a byte offset (classic entry or stream type 1).
    InUse { offset: u64, gen: u16 },
    /// Stored inside an object stream (stream type 2).
    Compressed { stream_obj_num: u32, index: u32 },
    /// Free slot.
    Free,
}

impl XrefEntry {
    /// Generation for supersession checks; compressed and free entries count
    /// as generation 0.
    pub fn gen(&self) -> u16 {
        match self {
            XrefEntry::InUse { gen, .. } => *gen,
            _ => 0,
        }
    }
}

/// Object number to entry. A newer generation supersedes an older one.
pub type XrefTable = FxHashMap<u32, XrefEntry>;

impl Parser {
    /// Locates `startxref` and walks the whole xref chain, populating the
    /// table, the trailer and the document root.
    pub(crate) fn load_xref(&mut self) -> Result<()> {
        let tail = self.src.tail(STARTXREF_WINDOW);
        let tail_text = String::from_utf8_lossy(tail).into_owned();
        let matches: Vec<_> = RE_STARTXREF.captures_iter(&tail_text).collect();
        let mut offset: u64 = match matches.as_slice() {
            [] => return Err(PdfError::XrefNotFound),
            [single] => single[1]
                .parse()
                .map_err(|_| PdfError::XrefMalformed("bad startxref offset".to_string()))?,
            _ => {
                return Err(PdfError::XrefMalformed(
                    "multiple startxref entries".to_string(),
                ))
            }
        };
        log::trace!("xref starts at {}", offset);

        let mut visited = vec![offset];
        // XRefStm points back into a hybrid file; once taken, the *trailer's*
        // Prev drives the rest of the chain.
        let mut backward_compatibility = false;

        loop {
            self.src.seek(offset as usize)?;

            let next_offset = if self.src.peek() == Some(b'x') {
                self.load_classic_section()?
            } else {
                self.load_stream_section(backward_compatibility)?
            };

            let next = match next_offset {
                NextSection::XRefStm(n) => {
                    backward_compatibility = true;
                    n
                }
                NextSection::Prev(n) => n,
                NextSection::End => break,
            };

            if visited.contains(&next) {
                log::trace!("xref chain closed at revisited offset {}", next);
                break;
            }
            visited.push(next);
            offset = next;
        }

        Ok(())
    }

    /// Parses one classic `xref` section and its trailer at the current
    /// position. Returns where the chain continues.
    fn load_classic_section(&mut self) -> Result<NextSection> {
        let first_line = self.src.read_line();
        let first_line = String::from_utf8_lossy(&first_line).into_owned();
        let trimmed = first_line.trim();
        if !trimmed.starts_with("xref") {
            return Err(PdfError::XrefMalformed(format!(
                "invalid xref keyword: {:?}",
                trimmed
            )));
        }
        // Writers occasionally jam the first subsection onto the keyword
        // line, separated by bare carriage returns.
        let remainder = trimmed.trim_start_matches("xref");
        self.read_xref_table(remainder)?;

        // read_xref_table left the cursor just past the `trailer` keyword.
        lexer::skip_spaces(&mut self.src);
        let dict = self.parse_dict()?;

        if self.trailer.is_none() {
            self.trailer = Some(dict.clone());
        }

        if self.root.is_none() {
            if let Some(root_obj) = dict.get(b"Root") {
                let root_obj = root_obj.clone();
                match self.trace(&root_obj)? {
                    PdfObject::Dict(root) => {
                        self.root = Some(root);
                        self.trailer = Some(dict.clone());
                    }
                    other => log::debug!("trailer Root is not a dictionary: {:?}", other),
                }
            }
        }

        if let Some(xref_stm) = dict.get(b"XRefStm") {
            let n = xref_stm.as_integer().ok_or_else(|| {
                PdfError::TypeMismatch("XRefStm is not an integer".to_string())
            })?;
            return Ok(NextSection::XRefStm(n as u64));
        }
        if let Some(prev) = dict.get(b"Prev") {
            let n = prev
                .as_integer()
                .ok_or_else(|| PdfError::TypeMismatch("Prev is not an integer".to_string()))?;
            return Ok(NextSection::Prev(n as u64));
        }
        Ok(NextSection::End)
    }

    /// Parses subsection headers and entries until the `trailer` keyword.
    ///
    /// Lines are additionally split on embedded carriage returns: writers
    /// exist that emit `34 45\r111 000 n` as one "line".
    fn read_xref_table(&mut self, keyword_line_rest: &str) -> Result<()> {
        let mut cur_obj: i64 = -1;
        let mut inside_subsection = false;

        let mut handle_piece = |piece: &str,
                               cur_obj: &mut i64,
                               inside: &mut bool,
                               xrefs: &mut XrefTable|
         -> Result<()> {
            let piece = piece.trim();
            if piece.is_empty() {
                return Ok(());
            }

            if let Some(caps) = RE_SUBSECTION.captures(piece) {
                *cur_obj = caps[1].parse().unwrap_or(0);
                *inside = true;
                log::trace!("xref subsection: first {} count {}", &caps[1], &caps[2]);
                return Ok(());
            }

            if let Some(caps) = RE_ENTRY.captures(piece) {
                if !*inside {
                    return Err(PdfError::XrefMalformed(
                        "entry before subsection header".to_string(),
                    ));
                }
                let offset: u64 = caps[1].parse().unwrap_or(0);
                let gen: u32 = caps[2].parse().unwrap_or(0);
                let gen = gen.min(u16::MAX as u32) as u16;
                let kind = &caps[3];

                // Malformed writers mark free slots as `n` with offset 0 (or
                // 1, pointing into the version header); treat those as free.
                if kind == "n" && offset > 1 {
                    let obj_num = *cur_obj as u32;
                    let newer = xrefs
                        .get(&obj_num)
                        .map_or(true, |existing| gen > existing.gen());
                    if newer {
                        xrefs.insert(obj_num, XrefEntry::InUse { offset, gen });
                    }
                }
                *cur_obj += 1;
            }
            Ok(())
        };

        for piece in keyword_line_rest.split('\r') {
            handle_piece(piece, &mut cur_obj, &mut inside_subsection, &mut self.xrefs)?;
        }

        loop {
            let line_start = self.src.pos();
            if line_start >= self.src.len() {
                return Err(PdfError::XrefMalformed(
                    "end of file before trailer".to_string(),
                ));
            }
            let line = self.src.read_line();
            let line = String::from_utf8_lossy(&line).into_owned();
            let trimmed = line.trim();

            if trimmed.starts_with("trailer") {
                // Reposition just past `trailer` when the dictionary shares
                // the line (e.g. `trailer<< /Size ... >>`).
                if trimmed.len() > "trailer".len() {
                    let in_line = line.find("trailer").unwrap_or(0);
                    self.src.seek(line_start + in_line + "trailer".len())?;
                }
                lexer::skip_spaces(&mut self.src);
                return Ok(());
            }

            if trimmed == "%%EOF" {
                return Err(PdfError::XrefMalformed(
                    "end of file marker before trailer".to_string(),
                ));
            }

            for piece in line.split('\r') {
                handle_piece(piece, &mut cur_obj, &mut inside_subsection, &mut self.xrefs)?;
            }
        }
    }

    /// Parses a compressed xref stream section at the current position.
    fn load_stream_section(&mut self, backward_compatibility: bool) -> Result<NextSection> {
        let obj = self.parse_indirect_object().map_err(|e| {
            log::debug!("failed to read xref stream object: {}", e);
            PdfError::XrefMalformed("xref offset points at an unreadable object".to_string())
        })?;
        let stream = match obj {
            PdfObject::Stream(stream) => stream,
            other => {
                return Err(PdfError::XrefMalformed(format!(
                    "xref offset points at a non-stream object: {:?}",
                    other
                )))
            }
        };

        // In the hybrid fork the chain continues from the *trailer's* Prev,
        // not this stream's.
        let next = if backward_compatibility {
            self.trailer.as_ref().and_then(|t| t.get(b"Prev")).cloned()
        } else {
            stream.dict.get(b"Prev").cloned()
        };
        let next = match next {
            Some(obj) => Some(obj.as_integer().ok_or_else(|| {
                PdfError::TypeMismatch("Prev is not an integer".to_string())
            })? as u64),
            None => None,
        };

        self.read_xref_stream(&stream)?;

        if self.trailer.is_none() {
            self.trailer = Some(stream.dict.clone());
        }
        if self.root.is_none() {
            if let Some(root_obj) = stream.dict.get(b"Root") {
                let root_obj = root_obj.clone();
                match self.trace(&root_obj)? {
                    PdfObject::Dict(root) => {
                        self.root = Some(root);
                        self.trailer = Some(stream.dict.clone());
                    }
                    other => log::debug!("xref stream Root is not a dictionary: {:?}", other),
                }
            }
        }

        Ok(match next {
            Some(n) => NextSection::Prev(n),
            None => NextSection::End,
        })
    }

    /// Decodes a compressed xref stream and merges its entries.
    fn read_xref_stream(&mut self, stream: &Stream) -> Result<()> {
        let size = stream
            .dict
            .get(b"Size")
            .and_then(PdfObject::as_integer)
            .ok_or_else(|| PdfError::XrefMalformed("xref stream missing Size".to_string()))?;
        if size > MAX_XREF_SIZE {
            return Err(PdfError::SizeLimitExceeded(format!(
                "xref stream Size {} exceeds {}",
                size, MAX_XREF_SIZE
            )));
        }

        let widths = stream
            .dict
            .get(b"W")
            .and_then(PdfObject::as_array)
            .ok_or_else(|| PdfError::XrefMalformed("xref stream missing W".to_string()))?;
        if widths.len() != 3 {
            return Err(PdfError::XrefMalformed(format!(
                "xref stream W has {} entries, expected 3",
                widths.len()
            )));
        }
        let mut w = [0usize; 3];
        for (i, width) in widths.iter().enumerate() {
            let value = width.as_integer().ok_or_else(|| {
                PdfError::XrefMalformed("xref stream W entry not an integer".to_string())
            })?;
            if !(0..=4).contains(&value) {
                return Err(PdfError::XrefMalformed(format!(
                    "xref stream W entry {} out of range",
                    value
                )));
            }
            w[i] = value as usize;
        }

        let row_len = w[0] + w[1] + w[2];
        if row_len == 0 {
            log::debug!("xref stream carries no entries (W sums to 0)");
            return Ok(());
        }

        let data = decode::decode_stream(stream)?;
        let entries = data.len() / row_len;

        // Flatten Index (default [0 Size]) into the object-number list.
        let mut index_list: Vec<u32> = Vec::new();
        match stream.dict.get(b"Index") {
            Some(PdfObject::Array(pairs)) => {
                if pairs.len() % 2 != 0 {
                    return Err(PdfError::XrefMalformed(
                        "xref stream Index length is odd".to_string(),
                    ));
                }
                for pair in pairs.chunks(2) {
                    let start = pair[0].as_integer().ok_or_else(|| {
                        PdfError::XrefMalformed("Index entry not an integer".to_string())
                    })?;
                    let count = pair[1].as_integer().ok_or_else(|| {
                        PdfError::XrefMalformed("Index entry not an integer".to_string())
                    })?;
                    for j in 0..count {
                        index_list.push((start + j) as u32);
                    }
                }
            }
            Some(other) => {
                return Err(PdfError::XrefMalformed(format!(
                    "Index is not an array: {:?}",
                    other
                )))
            }
            None => index_list.extend(0..size as u32),
        }

        // Some writers omit themselves from Index; allow exactly one
        // trailing extra entry.
        if entries == index_list.len() + 1 {
            log::debug!("xref stream has one extra entry; extending index for compatibility");
            index_list.push(index_list.len() as u32);
        }
        if entries != index_list.len() {
            return Err(PdfError::XrefMalformed(format!(
                "xref stream has {} entries but index names {}",
                entries,
                index_list.len()
            )));
        }

        for (row, &obj_num) in data.chunks_exact(row_len).zip(index_list.iter()) {
            let (field0, rest) = row.split_at(w[0]);
            let (field1, field2) = rest.split_at(w[1]);

            // When the type column is absent the entry defaults to type 1.
            let ftype = if w[0] == 0 { 1 } else { be_bytes_to_u64(field0) };
            let second = be_bytes_to_u64(field1);
            let third = be_bytes_to_u64(field2);

            match ftype {
                0 => {
                    log::trace!("xref stream: {} free", obj_num);
                }
                1 => {
                    let gen = third.min(u16::MAX as u64) as u16;
                    let newer = self
                        .xrefs
                        .get(&obj_num)
                        .map_or(true, |existing| gen > existing.gen());
                    if newer {
                        self.xrefs
                            .insert(obj_num, XrefEntry::InUse { offset: second, gen });
                    }
                }
                2 => {
                    if !self.xrefs.contains_key(&obj_num) {
                        self.xrefs.insert(
                            obj_num,
                            XrefEntry::Compressed {
                                stream_obj_num: second as u32,
                                index: third as u32,
                            },
                        );
                    }
                }
                other => {
                    // Future entry types read as references to null.
                    log::debug!("xref stream: unknown entry type {}, skipping", other);
                }
            }
        }

        Ok(())
    }
}

enum NextSection {
    Prev(u64),
    XRefStm(u64),
    End,
}

fn be_bytes_to_u64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::source::ByteSource;

    fn parser_over(data: &[u8]) -> Result<Parser> {
        Parser::new(ByteSource::from_bytes(data.to_vec()))
    }

    /// Minimal classic-xref document: header, one object, table, trailer.
    fn classic_pdf() -> Vec<u8> {
        let mut pdf = Vec::new();
        pdf.extend_from_slice(b"%PDF-1.4\n");
        let obj_offset = pdf.len();
        pdf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog >>\nendobj\n");
        let xref_offset = pdf.len();
        pdf.extend_from_slice(b"xref\n0 2\n0000000000 65535 f \n");
        pdf.extend_from_slice(format!("{:010} 00000 n \n", obj_offset).as_bytes());
        pdf.extend_from_slice(b"trailer\n<< /Size 2 /Root 1 0 R >>\n");
        pdf.extend_from_slice(format!("startxref\n{}\n%%EOF\n", xref_offset).as_bytes());
        pdf
    }

    #[test]
    fn loads_classic_table() {
        let mut parser = parser_over(&classic_pdf()).unwrap();
        assert_eq!(parser.version(), (1, 4));
        assert!(matches!(
            parser.xrefs.get(&1),
            Some(XrefEntry::InUse { gen: 0, .. })
        ));
        // Entry 0 is free and offset 0, so it is not recorded.
        assert!(parser.xrefs.get(&0).is_none());

        let root = parser.root_dict().expect("root dictionary");
        assert!(root.contains_key(b"Type"));

        let obj = parser.lookup(1, 0).unwrap();
        match obj {
            PdfObject::Indirect(ind) => assert!(ind.inner.as_dict().is_some()),
            other => panic!("expected indirect object, got {:?}", other),
        }
    }

    #[test]
    fn missing_startxref_is_an_error() {
        assert!(matches!(
            parser_over(b"%PDF-1.4\nno xref here"),
            Err(PdfError::XrefNotFound)
        ));
    }

    #[test]
    fn trailer_keyword_fused_with_dict() {
        let mut pdf = Vec::new();
        pdf.extend_from_slice(b"%PDF-1.2\n");
        let obj_offset = pdf.len();
        pdf.extend_from_slice(b"1 0 obj\n(x)\nendobj\n");
        let xref_offset = pdf.len();
        pdf.extend_from_slice(b"xref\n0 2\n0000000000 65535 f \n");
        pdf.extend_from_slice(format!("{:010} 00000 n \n", obj_offset).as_bytes());
        pdf.extend_from_slice(b"trailer<< /Size 2 /Root 1 0 R >>\n");
        pdf.extend_from_slice(format!("startxref\n{}\n%%EOF\n", xref_offset).as_bytes());

        let parser = parser_over(&pdf).unwrap();
        assert!(parser.trailer().unwrap().contains_key(b"Size"));
    }

    #[test]
    fn newer_generation_supersedes() {
        let mut pdf = Vec::new();
        pdf.extend_from_slice(b"%PDF-1.4\n");
        let obj_offset = pdf.len();
        pdf.extend_from_slice(b"1 0 obj\n(new)\nendobj\n");
        let xref_offset = pdf.len();
        // Two entries for object 1 in one table; the generation-5 entry wins
        // regardless of order.
        pdf.extend_from_slice(b"xref\n1 1\n");
        pdf.extend_from_slice(format!("{:010} 00005 n \n", obj_offset).as_bytes());
        pdf.extend_from_slice(b"1 1\n");
        pdf.extend_from_slice(format!("{:010} 00001 n \n", obj_offset + 1).as_bytes());
        pdf.extend_from_slice(b"trailer\n<< /Size 2 /Root 1 5 R >>\n");
        pdf.extend_from_slice(format!("startxref\n{}\n%%EOF\n", xref_offset).as_bytes());

        let parser = parser_over(&pdf).unwrap();
        match parser.xrefs.get(&1) {
            Some(XrefEntry::InUse { gen, offset }) => {
                assert_eq!(*gen, 5);
                assert_eq!(*offset, obj_offset as u64);
            }
            other => panic!("expected in-use entry, got {:?}", other),
        }
    }

    #[test]
    fn prev_chain_and_cycle_guard() {
        // Newest section Prev-points at the oldest; the oldest has no Prev.
        // A file whose sections Prev-point at each other must still
        // terminate, which the visited-offset list guarantees.
        let mut pdf = Vec::new();
        pdf.extend_from_slice(b"%PDF-1.4\n");
        let obj1 = pdf.len();
        pdf.extend_from_slice(b"1 0 obj\n<< /Kind /Old >>\nendobj\n");
        let obj2 = pdf.len();
        pdf.extend_from_slice(b"2 0 obj\n(second)\nendobj\n");

        let old_xref = pdf.len();
        pdf.extend_from_slice(b"xref\n0 2\n0000000000 65535 f \n");
        pdf.extend_from_slice(format!("{:010} 00000 n \n", obj1).as_bytes());
        pdf.extend_from_slice(b"trailer\n<< /Size 2 /Root 1 0 R >>\n");

        let new_xref = pdf.len();
        pdf.extend_from_slice(b"xref\n2 1\n");
        pdf.extend_from_slice(format!("{:010} 00000 n \n", obj2).as_bytes());
        pdf.extend_from_slice(
            format!("trailer\n<< /Size 3 /Root 1 0 R /Prev {} >>\n", old_xref).as_bytes(),
        );
        pdf.extend_from_slice(format!("startxref\n{}\n%%EOF\n", new_xref).as_bytes());

        let mut parser = parser_over(&pdf).unwrap();
        assert!(parser.xrefs.contains_key(&1));
        assert!(parser.xrefs.contains_key(&2));
        assert_eq!(
            parser.lookup(2, 0).unwrap(),
            PdfObject::Indirect(Box::new(crate::core::object::Indirect {
                obj_num: 2,
                gen: 0,
                inner: PdfObject::String(b"second".to_vec()),
            }))
        );
    }

    #[test]
    fn be_conversion() {
        assert_eq!(be_bytes_to_u64(&[0x01, 0x02]), 0x0102);
        assert_eq!(be_bytes_to_u64(&[]), 0);
        assert_eq!(be_bytes_to_u64(&[0xFF]), 255);
    }
}
