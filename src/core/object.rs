use std::fmt;

/// A PDF name: raw byte content with `#xx` escapes already decoded.
///
/// Names compare by byte content. Most names are ASCII, but the format does
/// not require it, so the bytes are kept as-is and only rendered lossily for
/// display.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(Vec<u8>);

impl Name {
    pub fn new<B: Into<Vec<u8>>>(bytes: B) -> Self {
        Name(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }

    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl PartialEq<[u8]> for Name {
    fn eq(&self, other: &[u8]) -> bool {
        self.0 == other
    }
}

impl PartialEq<&[u8]> for Name {
    fn eq(&self, other: &&[u8]) -> bool {
        self.0 == *other
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

/// A PDF dictionary.
///
/// Entries keep their source order; lookups are linear, which is fine at the
/// sizes dictionaries actually have. `set` replaces an existing key in place
/// so re-writing `Length` after a stream-length correction does not reorder
/// the dictionary.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dict {
    entries: Vec<(Name, PdfObject)>,
}

impl Dict {
    pub fn new() -> Self {
        Dict::default()
    }

    pub fn get(&self, key: &[u8]) -> Option<&PdfObject> {
        self.entries
            .iter()
            .find(|(name, _)| name.as_bytes() == key)
            .map(|(_, value)| value)
    }

    pub fn set(&mut self, key: Name, value: PdfObject) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|(name, _)| name.as_bytes() == key.as_bytes())
        {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &PdfObject)> {
        self.entries.iter().map(|(name, value)| (name, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A stream object: a dictionary plus its raw (still encoded) byte payload.
/// Carries the identity of the indirect object it was parsed from, which the
/// decryption collaborator needs for its per-object keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    pub dict: Dict,
    pub data: Vec<u8>,
    pub obj_num: u32,
    pub gen: u16,
}

/// An indirect object wrapper: `N G obj ... endobj`.
#[derive(Debug, Clone, PartialEq)]
pub struct Indirect {
    pub obj_num: u32,
    pub gen: u16,
    pub inner: PdfObject,
}

/// PDF object types as defined in the PDF specification.
///
/// The complete set of primitive objects that can appear in a PDF file, as a
/// closed sum. Hex strings are decoded at parse time and land in `String`;
/// strings are raw bytes and are never reinterpreted as UTF-8 by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfObject {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Name(Name),
    String(Vec<u8>),
    Array(Vec<PdfObject>),
    Dict(Dict),
    /// Placeholder that must be resolved through the xref table before use.
    Reference { obj_num: u32, gen: u16 },
    Stream(Stream),
    Indirect(Box<Indirect>),
}

impl PdfObject {
    pub fn is_null(&self) -> bool {
        matches!(self, PdfObject::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PdfObject::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric value of either an `Integer` or a `Real`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PdfObject::Integer(value) => Some(*value as f64),
            PdfObject::Real(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&Name> {
        match self {
            PdfObject::Name(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            PdfObject::String(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[PdfObject]> {
        match self {
            PdfObject::Array(items) => Some(items),
            _ => None,
        }
    }

    /// The dictionary of either a `Dict` or a `Stream` (their dictionary
    /// lookups share code paths).
    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            PdfObject::Dict(dict) => Some(dict),
            PdfObject::Stream(stream) => Some(&stream.dict),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            PdfObject::Stream(stream) => Some(stream),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<(u32, u16)> {
        match self {
            PdfObject::Reference { obj_num, gen } => Some((*obj_num, *gen)),
            _ => None,
        }
    }
}
