//! The low-level object parser and resolver.
//!
//! [`Parser`] owns the byte source and the document's structural state: the
//! cross-reference table (loaded by `core::xref`), the object cache, the
//! trailer and root dictionaries, and the optional decryption collaborator.
//! It parses direct objects by dispatching on the first significant byte,
//! reads indirect objects and streams, and resolves references with cycle
//! protection.

use super::crypt::Crypt;
use super::error::{PdfError, Result};
use super::lexer;
use super::object::{Dict, Indirect, Name, PdfObject, Stream};
use super::source::ByteSource;
use super::xref::{XrefEntry, XrefTable};
use regex::bytes::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::LazyLock;

static RE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%PDF-(\d)\.(\d)").unwrap());
static RE_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s+(\d+)\s+R").unwrap());
static RE_INDIRECT_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s+(\d+)\s+obj").unwrap());

/// Size of the trailing `\nendstream\nendobj\n` used when shrinking a stream
/// length that overshoots the next object.
const STREAM_TRAILER_LEN: u64 = 17;

pub struct Parser {
    pub(crate) src: ByteSource,
    pub(crate) xrefs: XrefTable,
    pub(crate) trailer: Option<Dict>,
    pub(crate) root: Option<Dict>,
    version: (u8, u8),
    crypt: Option<Box<dyn Crypt>>,
    cache: FxHashMap<u32, PdfObject>,
    /// Tracker for `Length` reference lookups of stream objects. A reference
    /// seen while already in progress is a hard cycle.
    stream_length_in_progress: FxHashMap<u32, bool>,
    /// Object streams currently being unpacked (guards type-2 recursion).
    objstm_in_progress: FxHashSet<u32>,
}

impl Parser {
    /// Creates a parser over a byte source, loading the cross-reference
    /// chain, trailer and version header.
    pub fn new(src: ByteSource) -> Result<Self> {
        let mut parser = Parser {
            src,
            xrefs: XrefTable::default(),
            trailer: None,
            root: None,
            version: (0, 0),
            crypt: None,
            cache: FxHashMap::default(),
            stream_length_in_progress: FxHashMap::default(),
            objstm_in_progress: FxHashSet::default(),
        };

        parser.load_xref()?;
        if parser.xrefs.is_empty() {
            return Err(PdfError::XrefMalformed(
                "empty cross-reference table".to_string(),
            ));
        }
        parser.version = parser.parse_version()?;
        Ok(parser)
    }

    pub fn version(&self) -> (u8, u8) {
        self.version
    }

    pub fn trailer(&self) -> Option<&Dict> {
        self.trailer.as_ref()
    }

    pub fn root_dict(&self) -> Option<&Dict> {
        self.root.as_ref()
    }

    /// Whether the trailer names an `Encrypt` dictionary.
    pub fn is_encrypted(&self) -> bool {
        self.trailer
            .as_ref()
            .map_or(false, |t| t.contains_key(b"Encrypt"))
    }

    /// Installs the decryption collaborator.
    pub fn set_crypt(&mut self, crypt: Box<dyn Crypt>) {
        self.crypt = Some(crypt);
    }

    /// Authenticates with `password`, retrying with the empty password the
    /// way viewers do. Errors if no collaborator is installed.
    pub fn authenticate(&mut self, password: &[u8]) -> Result<bool> {
        let crypt = self
            .crypt
            .as_mut()
            .ok_or(PdfError::EncryptedAndUnauthenticated)?;
        if crypt.authenticate(password)? {
            return Ok(true);
        }
        crypt.authenticate(b"")
    }

    fn parse_version(&mut self) -> Result<(u8, u8)> {
        let head = &self.src.as_slice()[..self.src.len().min(20)];
        let caps = RE_VERSION
            .captures(head)
            .ok_or(PdfError::MalformedHeader)?;
        let major = caps[1][0] - b'0';
        let minor = caps[2][0] - b'0';
        log::trace!("pdf version {}.{}", major, minor);
        Ok((major, minor))
    }

    /// Parses a direct object at the current position, dispatching on the
    /// first significant byte.
    pub fn parse_object(&mut self) -> Result<PdfObject> {
        let ahead = self.src.peek_ahead(2);
        if ahead.is_empty() {
            return Err(PdfError::UnexpectedEof);
        }

        match ahead[0] {
            b'/' => Ok(PdfObject::Name(lexer::parse_name(&mut self.src)?)),
            b'<' => {
                if ahead.get(1) == Some(&b'<') {
                    Ok(PdfObject::Dict(self.parse_dict()?))
                } else {
                    Ok(PdfObject::String(lexer::parse_hex_string(&mut self.src)?))
                }
            }
            b'(' => Ok(PdfObject::String(lexer::parse_literal_string(
                &mut self.src,
            )?)),
            b't' | b'f' => lexer::parse_bool(&mut self.src),
            b'[' => self.parse_array(),
            b'n' => lexer::parse_null(&mut self.src),
            b'+' | b'-' | b'.' | b'0'..=b'9' => {
                // Reference or number? Peek far enough to tell `3 0 R` from
                // a plain numeric operand.
                let window = self.src.peek_ahead(15);
                if RE_REFERENCE.is_match(window) {
                    let text = self.src.read_until(b'R')?;
                    parse_reference(&text)
                } else {
                    lexer::parse_number(&mut self.src)
                }
            }
            other => Err(PdfError::UnexpectedToken(format!(
                "unexpected byte 0x{:02X} at start of object",
                other
            ))),
        }
    }

    fn parse_array(&mut self) -> Result<PdfObject> {
        self.src.discard(1); // '['
        let mut items = Vec::new();
        loop {
            let b = self.src.read_byte()?;
            if lexer::is_whitespace(b) {
                continue;
            }
            if b == b']' {
                break;
            }
            self.src.unread();
            items.push(self.parse_object()?);
        }
        Ok(PdfObject::Array(items))
    }

    /// Parses a dictionary enclosed in `<< >>`.
    ///
    /// Recognises the writer bug where a key is emitted with a fused `null`
    /// value (`/Boundsnull`): the suffix is stripped and `Null` stored.
    pub fn parse_dict(&mut self) -> Result<Dict> {
        if self.src.read_byte()? != b'<' || self.src.read_byte()? != b'<' {
            return Err(PdfError::UnexpectedToken("expected <<".to_string()));
        }

        let mut dict = Dict::new();
        let mut reading_key = true;
        let mut key = Name::new(Vec::new());
        let mut prev: u8;
        let mut cur = 0u8;

        loop {
            prev = cur;
            cur = self.src.read_byte()?;

            if prev == b'>' && cur == b'>' {
                break;
            }

            if cur == b'%' {
                self.src.unread();
                lexer::skip_comments(&mut self.src);
            } else if cur == b'/' && reading_key {
                self.src.unread();
                key = lexer::parse_name(&mut self.src)?;
                reading_key = false;

                // Some writers fuse the null value onto the key name.
                let bytes = key.as_bytes();
                if bytes.len() > 4 && bytes.ends_with(b"null") {
                    log::debug!("truncating fused-null key {:?}", key);
                    let mut fixed = key.clone();
                    fixed.truncate(bytes.len() - 4);
                    dict.set(fixed, PdfObject::Null);
                    reading_key = true;
                }
            } else if !reading_key && !lexer::is_whitespace(cur) {
                self.src.unread();
                let value = self.parse_object()?;
                dict.set(key.clone(), value);
                reading_key = true;
                cur = 0; // `>>` detection needs two fresh reads after a value
            }
        }

        Ok(dict)
    }

    /// Parses an indirect object (`N G obj ... endobj`), or a stream object
    /// when the inner dictionary is followed by the `stream` keyword.
    pub fn parse_indirect_object(&mut self) -> Result<PdfObject> {
        let window = self.src.peek_ahead(20);
        let m = RE_INDIRECT_HEADER
            .find(window)
            .ok_or_else(|| {
                PdfError::UnexpectedToken(format!(
                    "indirect object signature not found in {:?}",
                    String::from_utf8_lossy(window)
                ))
            })?;
        let (start, end) = (m.start(), m.end());
        self.src.discard(start);
        let header = self.src.read_exact(end - start)?.to_vec();

        let caps = RE_INDIRECT_HEADER.captures(&header).ok_or_else(|| {
            PdfError::UnexpectedToken("indirect object header mismatch".to_string())
        })?;
        let obj_num = ascii_to_u32(&caps[1]);
        let gen = ascii_to_u32(&caps[2]).min(u16::MAX as u32) as u16;

        let mut inner = PdfObject::Null;
        loop {
            let ch = self.src.read_byte()?;
            if lexer::is_whitespace(ch) {
                continue;
            }
            match ch {
                b'%' => {
                    self.src.unread();
                    lexer::skip_comments(&mut self.src);
                }
                b'/' | b'(' | b'[' | b'<' | b'n' | b'f' | b't' => {
                    self.src.unread();
                    inner = self.parse_object()?;
                }
                b'e' => {
                    let line = self.src.read_until(b'j')?;
                    let trimmed: Vec<u8> = line
                        .iter()
                        .copied()
                        .filter(|b| !lexer::is_whitespace(*b))
                        .collect();
                    if trimmed == b"ndobj" {
                        return Ok(PdfObject::Indirect(Box::new(Indirect {
                            obj_num,
                            gen,
                            inner,
                        })));
                    }
                }
                b's' => {
                    let keyword = self.src.read_exact(5)?;
                    if keyword != b"tream" {
                        return Err(PdfError::UnexpectedToken(
                            "expected 'stream' keyword".to_string(),
                        ));
                    }
                    // Consume the rest of the line so the payload starts
                    // cleanly; skipping whitespace instead would eat real
                    // data bytes.
                    self.src.read_line();
                    return self.parse_stream_payload(obj_num, gen, inner);
                }
                _ => {
                    self.src.unread();
                    inner = self.parse_object()?;
                    return Ok(PdfObject::Indirect(Box::new(Indirect {
                        obj_num,
                        gen,
                        inner,
                    })));
                }
            }
        }
    }

    fn parse_stream_payload(
        &mut self,
        obj_num: u32,
        gen: u16,
        inner: PdfObject,
    ) -> Result<PdfObject> {
        let mut dict = match inner {
            PdfObject::Dict(dict) => dict,
            other => {
                return Err(PdfError::TypeMismatch(format!(
                    "stream object missing dictionary, got {:?}",
                    other
                )))
            }
        };

        let length_obj = dict.get(b"Length").cloned();
        let mut length = self.trace_stream_length(length_obj)?;
        if length < 0 {
            return Err(PdfError::XrefMalformed(
                "negative stream length".to_string(),
            ));
        }

        // Validate the length against the next object's offset and shrink it
        // when the declared value would run past that object.
        let stream_start = self.src.pos() as u64;
        let next_offset = self.xref_next_object_offset(stream_start);
        if next_offset > stream_start && stream_start + length as u64 > next_offset {
            let corrected = next_offset as i64 - stream_start as i64 - STREAM_TRAILER_LEN as i64;
            if corrected < 0 {
                return Err(PdfError::XrefMalformed(
                    "stream length runs past file boundaries".to_string(),
                ));
            }
            log::debug!(
                "shrinking stream {} length {} -> {}",
                obj_num,
                length,
                corrected
            );
            length = corrected;
            dict.set(Name::new(*b"Length"), PdfObject::Integer(length));
        }

        let mut data = self.src.read_exact(length as usize)?.to_vec();
        if let Some(crypt) = &self.crypt {
            data = crypt.decrypt(obj_num, gen, &data)?;
        }

        lexer::skip_spaces(&mut self.src);
        self.src.discard(9); // endstream
        lexer::skip_spaces(&mut self.src);

        Ok(PdfObject::Stream(Stream {
            dict,
            data,
            obj_num,
            gen,
        }))
    }

    /// Traces a stream's `Length` entry to a direct integer. Length lookups
    /// are the one place a reference can legally require parsing another
    /// object mid-object, so re-entry on the same object number is a cycle.
    fn trace_stream_length(&mut self, length_obj: Option<PdfObject>) -> Result<i64> {
        let length_obj = length_obj.ok_or_else(|| {
            PdfError::TypeMismatch("stream dictionary has no Length".to_string())
        })?;

        let ref_num = length_obj.as_reference().map(|(num, _)| num);
        if let Some(num) = ref_num {
            if self.stream_length_in_progress.get(&num) == Some(&true) {
                log::debug!("stream length reference {} loops back on itself", num);
                return Err(PdfError::CycleDetected);
            }
            self.stream_length_in_progress.insert(num, true);
        }

        let resolved = self.trace(&length_obj);

        if let Some(num) = ref_num {
            self.stream_length_in_progress.insert(num, false);
        }

        resolved?.as_integer().ok_or_else(|| {
            PdfError::TypeMismatch("stream Length is not an integer".to_string())
        })
    }

    /// The smallest in-use xref offset strictly greater than `offset`, or 0.
    fn xref_next_object_offset(&self, offset: u64) -> u64 {
        let mut next = 0u64;
        for entry in self.xrefs.values() {
            if let XrefEntry::InUse { offset: o, .. } = entry {
                if *o > offset && (*o < next || next == 0) {
                    next = *o;
                }
            }
        }
        next
    }

    /// Resolves an object number through the xref table, caching the result.
    /// Free and absent entries resolve to `Null`.
    pub fn lookup(&mut self, obj_num: u32, gen: u16) -> Result<PdfObject> {
        if let Some(cached) = self.cache.get(&obj_num) {
            return Ok(cached.clone());
        }

        let entry = match self.xrefs.get(&obj_num) {
            Some(entry) => entry.clone(),
            None => {
                log::debug!("object {} not in xref table", obj_num);
                return Ok(PdfObject::Null);
            }
        };

        let object = match entry {
            XrefEntry::Free => PdfObject::Null,
            XrefEntry::InUse { offset, gen: entry_gen } => {
                if entry_gen != gen {
                    log::warn!(
                        "generation mismatch for object {}: xref has {}, reference has {}",
                        obj_num,
                        entry_gen,
                        gen
                    );
                }
                let saved_pos = self.src.pos();
                self.src.seek(offset as usize)?;
                let parsed = self.parse_indirect_object();
                self.src.seek(saved_pos)?;
                let parsed = parsed?;
                let parsed_num = match &parsed {
                    PdfObject::Indirect(ind) => ind.obj_num,
                    PdfObject::Stream(stream) => stream.obj_num,
                    _ => obj_num,
                };
                if parsed_num != obj_num {
                    return Err(PdfError::XrefMalformed(format!(
                        "object number mismatch at offset {}: expected {}, found {}",
                        offset, obj_num, parsed_num
                    )));
                }
                parsed
            }
            XrefEntry::Compressed {
                stream_obj_num,
                index,
            } => self.lookup_compressed(obj_num, stream_obj_num, index)?,
        };

        self.cache.insert(obj_num, object.clone());
        Ok(object)
    }

    /// Loads an object out of a compressed object stream (xref type 2).
    fn lookup_compressed(
        &mut self,
        obj_num: u32,
        stream_obj_num: u32,
        index: u32,
    ) -> Result<PdfObject> {
        if !self.objstm_in_progress.insert(stream_obj_num) {
            return Err(PdfError::CycleDetected);
        }
        let result = self.lookup_compressed_inner(obj_num, stream_obj_num, index);
        self.objstm_in_progress.remove(&stream_obj_num);
        result
    }

    fn lookup_compressed_inner(
        &mut self,
        obj_num: u32,
        stream_obj_num: u32,
        index: u32,
    ) -> Result<PdfObject> {
        let container = self.lookup(stream_obj_num, 0)?;
        let stream = container.as_stream().ok_or_else(|| {
            PdfError::TypeMismatch(format!(
                "object stream {} is not a stream",
                stream_obj_num
            ))
        })?;

        let count = stream
            .dict
            .get(b"N")
            .and_then(PdfObject::as_integer)
            .ok_or_else(|| PdfError::TypeMismatch("object stream missing N".to_string()))?
            as usize;
        let first = stream
            .dict
            .get(b"First")
            .and_then(PdfObject::as_integer)
            .ok_or_else(|| PdfError::TypeMismatch("object stream missing First".to_string()))?
            as usize;

        let decoded = super::decode::decode_stream(stream)?;

        // Header: N pairs of (object number, offset relative to First).
        let mut header = ByteSource::from_bytes(decoded.clone());
        let mut pairs = Vec::with_capacity(count);
        for _ in 0..count {
            lexer::skip_spaces(&mut header);
            let num = lexer::parse_number(&mut header)?
                .as_integer()
                .ok_or_else(|| {
                    PdfError::TypeMismatch("object stream header entry not an integer".to_string())
                })?;
            lexer::skip_spaces(&mut header);
            let offset = lexer::parse_number(&mut header)?
                .as_integer()
                .ok_or_else(|| {
                    PdfError::TypeMismatch("object stream header entry not an integer".to_string())
                })?;
            pairs.push((num as u32, offset as usize));
        }

        let (embedded_num, offset) = *pairs.get(index as usize).ok_or_else(|| {
            PdfError::XrefMalformed(format!(
                "object stream {} has no slot {}",
                stream_obj_num, index
            ))
        })?;
        if embedded_num != obj_num {
            log::warn!(
                "object stream slot {} holds {} where xref expected {}",
                index,
                embedded_num,
                obj_num
            );
        }

        let mut body = ByteSource::from_bytes(decoded);
        body.seek(first + offset)?;
        lexer::skip_spaces(&mut body);

        // Embedded objects are direct; parse with a throwaway sub-parser that
        // shares no positional state with the main source.
        let mut sub = Parser {
            src: body,
            xrefs: XrefTable::default(),
            trailer: None,
            root: None,
            version: (0, 0),
            crypt: None,
            cache: FxHashMap::default(),
            stream_length_in_progress: FxHashMap::default(),
            objstm_in_progress: FxHashSet::default(),
        };
        let inner = sub.parse_object()?;
        Ok(PdfObject::Indirect(Box::new(Indirect {
            obj_num,
            gen: 0,
            inner,
        })))
    }

    /// Follows a reference chain to a direct object, unwrapping `Indirect`
    /// shells. A per-call visited set turns loops into `CycleDetected`.
    pub fn trace(&mut self, obj: &PdfObject) -> Result<PdfObject> {
        let mut current = obj.clone();
        let mut visited: FxHashSet<(u32, u16)> = FxHashSet::default();
        loop {
            match current {
                PdfObject::Reference { obj_num, gen } => {
                    if !visited.insert((obj_num, gen)) {
                        return Err(PdfError::CycleDetected);
                    }
                    current = self.lookup(obj_num, gen)?;
                }
                PdfObject::Indirect(indirect) => {
                    current = indirect.inner;
                }
                other => return Ok(other),
            }
        }
    }
}

fn parse_reference(text: &[u8]) -> Result<PdfObject> {
    let caps = RE_REFERENCE.captures(text).ok_or_else(|| {
        PdfError::UnexpectedToken(format!(
            "malformed reference: {:?}",
            String::from_utf8_lossy(text)
        ))
    })?;
    Ok(PdfObject::Reference {
        obj_num: ascii_to_u32(&caps[1]),
        gen: ascii_to_u32(&caps[2]).min(u16::MAX as u32) as u16,
    })
}

fn ascii_to_u32(digits: &[u8]) -> u32 {
    let mut value = 0u32;
    for &d in digits {
        value = value.saturating_mul(10).saturating_add((d - b'0') as u32);
    }
    value
}
