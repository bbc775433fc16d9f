//! The object-graph layer: byte source, lexical primitives, the object
//! parser and resolver, cross-reference loading, stream filters and the
//! encryption collaborator interface.

pub mod crypt;
pub mod decode;
pub mod error;
pub mod lexer;
pub mod object;
pub mod parser;
pub mod source;
pub mod xref;

pub use crypt::Crypt;
pub use error::{PdfError, Result};
pub use object::{Dict, Indirect, Name, PdfObject, Stream};
pub use parser::Parser;
pub use source::ByteSource;
pub use xref::{XrefEntry, XrefTable};
