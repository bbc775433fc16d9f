use thiserror::Error;

/// Universal error type for PDF operations.
///
/// Covers everything that can go wrong while loading the object graph,
/// decoding content streams and assembling text. The parser is deliberately
/// tolerant of a handful of well-known writer bugs (odd-length hex strings,
/// `/Boundsnull` keys, overshooting stream lengths); every other malformation
/// surfaces here.
#[derive(Debug, Error)]
pub enum PdfError {
    /// The `%PDF-M.N` version header could not be located.
    #[error("malformed or missing PDF header")]
    MalformedHeader,

    /// `startxref` was not found near the end of the file.
    #[error("startxref not found")]
    XrefNotFound,

    /// The cross-reference table or stream is structurally invalid.
    #[error("malformed cross-reference data: {0}")]
    XrefMalformed(String),

    /// A structural size exceeded its sanity limit.
    #[error("size limit exceeded: {0}")]
    SizeLimitExceeded(String),

    /// The parser met a token it could not place.
    #[error("unexpected token: {0}")]
    UnexpectedToken(String),

    /// End of input reached in the middle of an object.
    #[error("unexpected end of file")]
    UnexpectedEof,

    /// A reference chain or stream-length lookup looped back on itself.
    #[error("reference cycle detected")]
    CycleDetected,

    /// An object had the wrong variant for its context.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// The document is encrypted and could not be authenticated.
    #[error("document is encrypted and could not be authenticated")]
    EncryptedAndUnauthenticated,

    /// A stream uses a filter this crate does not decode.
    #[error("unsupported stream filter: {0}")]
    FilterUnsupported(String),

    /// A supported filter met data it could not decode.
    #[error("corrupt stream data: {0}")]
    FilterCorrupt(String),

    /// `Tf` named a font missing from the page's font table.
    #[error("font not found: {0}")]
    FontNotFound(String),

    /// The CMap mini-language parser failed.
    #[error("CMap parse error: {0}")]
    CMapParse(String),

    /// A predefined CMap resource file could not be loaded.
    #[error("CMap resource missing: {0}")]
    ResourceMissing(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;
