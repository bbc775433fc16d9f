//! PDF text extraction.
//!
//! `pdftext` reads a PDF byte stream and returns the textual content of each
//! page, with line and tab breaks inferred from the page's text-positioning
//! operators. Character decoding follows the font's encoding: embedded
//! ToUnicode CMaps, predefined CJK CMap pairs loaded from resource files, or
//! simple single-byte encodings with `Differences` overrides.
//!
//! # Quick start
//!
//! ```no_run
//! use pdftext::PdfReader;
//!
//! let data = std::fs::read("document.pdf")?;
//! let mut reader = PdfReader::from_bytes(data)?;
//! print!("{}", reader.extract_text()?);
//! # Ok::<(), pdftext::PdfError>(())
//! ```
//!
//! # Layers
//!
//! - [`core`]: the object graph: lexer, object parser, cross-reference
//!   loading, object cache and resolver, stream filters.
//! - [`cmap`]: the CMap mini-language and charcode lookup.
//! - [`font`]: font dictionaries and encoding selection.
//! - [`content`]: content-stream tokenization and handler dispatch.
//! - [`extract`]: the text-assembly state machine.
//! - [`document`]: the reader that ties the pipeline together.

pub mod cmap;
pub mod content;
pub mod core;
pub mod document;
pub mod extract;
pub mod font;

// The PDF fixture builder lives with the integration tests; a `cfg(test)`
// module cannot be shared across the crate boundary, so the unit tests
// compile the same file in here.
#[cfg(test)]
#[path = "../tests/common/mod.rs"]
pub(crate) mod test_pdf;

pub use crate::core::{Crypt, PdfError, Result};
pub use document::{extract_text_from_bytes, Page, PdfReader, ReaderOptions};
pub use extract::TextAssembler;
pub use font::{CMapResourceLoader, Font, FontTable, FsCMapLoader};
