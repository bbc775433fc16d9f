//! Document reader and extraction orchestrator.
//!
//! [`PdfReader`] opens the object graph, walks the page tree (inheriting
//! `Resources` from ancestor nodes), builds the per-page font tables (fonts
//! shared across pages by object number so CMaps parse once) and drives the
//! text assembler over every content stream.

use crate::core::crypt::Crypt;
use crate::core::decode;
use crate::core::error::{PdfError, Result};
use crate::core::object::{Dict, PdfObject, Stream};
use crate::core::parser::Parser;
use crate::core::source::ByteSource;
use crate::extract::extract_stream_text;
use crate::font::{CMapResourceLoader, Font, FontTable, FsCMapLoader};
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::PathBuf;
use std::rc::Rc;

/// Reader configuration.
pub struct ReaderOptions {
    /// Directory the predefined CMap resources are loaded from.
    pub cmap_dir: PathBuf,
    /// Decryption collaborator for encrypted documents.
    pub crypt: Option<Box<dyn Crypt>>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            cmap_dir: PathBuf::from("resources"),
            crypt: None,
        }
    }
}

/// A leaf of the page tree with its effective (possibly inherited)
/// resources.
pub struct Page {
    pub obj_num: u32,
    pub gen: u16,
    pub dict: Dict,
    pub resources: Option<Dict>,
}

pub struct PdfReader {
    parser: Parser,
    pages: Vec<Page>,
    fonts_for_pages: Vec<FontTable>,
    fonts_by_obj: FxHashMap<u32, Rc<Font>>,
    loader: Box<dyn CMapResourceLoader>,
}

impl PdfReader {
    /// Opens a document from a byte buffer with default options.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::with_options(ByteSource::from_bytes(data), ReaderOptions::default())
    }

    /// Opens a document from a file with default options.
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Self::with_options(ByteSource::open(path)?, ReaderOptions::default())
    }

    /// Opens a document, authenticating through the configured crypt
    /// collaborator when the trailer names an `Encrypt` dictionary.
    pub fn with_options(src: ByteSource, options: ReaderOptions) -> Result<Self> {
        let mut parser = Parser::new(src)?;

        if parser.is_encrypted() {
            match options.crypt {
                Some(crypt) => {
                    parser.set_crypt(crypt);
                    if !parser.authenticate(b"")? {
                        return Err(PdfError::EncryptedAndUnauthenticated);
                    }
                }
                None => return Err(PdfError::EncryptedAndUnauthenticated),
            }
        }

        let mut reader = PdfReader {
            parser,
            pages: Vec::new(),
            fonts_for_pages: Vec::new(),
            fonts_by_obj: FxHashMap::default(),
            loader: Box::new(FsCMapLoader::new(options.cmap_dir)),
        };
        reader.load_structure()?;
        reader.parse_fonts()?;
        Ok(reader)
    }

    pub fn version(&self) -> (u8, u8) {
        self.parser.version()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn trailer(&self) -> Option<&Dict> {
        self.parser.trailer()
    }

    /// Collects the leaf pages of the page tree.
    fn load_structure(&mut self) -> Result<()> {
        let root = self
            .parser
            .root_dict()
            .cloned()
            .ok_or_else(|| PdfError::TypeMismatch("document has no root".to_string()))?;

        let pages_ref = root
            .get(b"Pages")
            .and_then(PdfObject::as_reference)
            .ok_or_else(|| {
                PdfError::TypeMismatch("Pages in the root should be a reference".to_string())
            })?;

        let mut visited = FxHashSet::default();
        self.build_page_list(pages_ref.0, pages_ref.1, None, &mut visited)
    }

    /// Recursive page-tree walk. `Resources` inherit from the nearest
    /// ancestor that declares one; a visited set makes cyclic trees
    /// terminate.
    fn build_page_list(
        &mut self,
        obj_num: u32,
        gen: u16,
        inherited_resources: Option<Dict>,
        visited: &mut FxHashSet<u32>,
    ) -> Result<()> {
        if !visited.insert(obj_num) {
            log::debug!("page tree cycles at object {}, skipping", obj_num);
            return Ok(());
        }

        let node = match self.parser.lookup(obj_num, gen)? {
            PdfObject::Indirect(indirect) => match indirect.inner {
                PdfObject::Dict(dict) => dict,
                other => {
                    return Err(PdfError::TypeMismatch(format!(
                        "page tree node {} is not a dictionary: {:?}",
                        obj_num, other
                    )))
                }
            },
            other => {
                return Err(PdfError::TypeMismatch(format!(
                    "page tree node {} is not a dictionary: {:?}",
                    obj_num, other
                )))
            }
        };

        let mut resources = inherited_resources;
        if let Some(resources_obj) = node.get(b"Resources").cloned() {
            if let Ok(PdfObject::Dict(own)) = self.parser.trace(&resources_obj) {
                resources = Some(own);
            }
        }

        let node_type = node
            .get(b"Type")
            .and_then(PdfObject::as_name)
            .map(|name| name.as_bytes().to_vec())
            .ok_or_else(|| {
                PdfError::TypeMismatch(format!("page tree node {} has no Type", obj_num))
            })?;

        match node_type.as_slice() {
            b"Pages" => {
                let kids = match node.get(b"Kids") {
                    Some(PdfObject::Array(kids)) => kids.clone(),
                    _ => {
                        return Err(PdfError::TypeMismatch(format!(
                            "Kids of pages node {} is not an array",
                            obj_num
                        )))
                    }
                };
                for kid in kids {
                    let (kid_num, kid_gen) = kid.as_reference().ok_or_else(|| {
                        PdfError::TypeMismatch("page tree kid is not a reference".to_string())
                    })?;
                    self.build_page_list(kid_num, kid_gen, resources.clone(), visited)?;
                }
            }
            b"Page" => {
                self.pages.push(Page {
                    obj_num,
                    gen,
                    dict: node,
                    resources,
                });
            }
            other => {
                return Err(PdfError::TypeMismatch(format!(
                    "page tree contains a non-page node: {:?}",
                    String::from_utf8_lossy(other)
                )))
            }
        }

        Ok(())
    }

    /// Builds one font table per page. Fonts referenced indirectly are
    /// shared by object number so repeated pages do not re-parse CMaps.
    fn parse_fonts(&mut self) -> Result<()> {
        for index in 0..self.pages.len() {
            let mut table = FontTable::new();

            let font_dict_obj = self.pages[index]
                .resources
                .as_ref()
                .and_then(|resources| resources.get(b"Font"))
                .cloned();

            if let Some(obj) = font_dict_obj {
                match self.parser.trace(&obj) {
                    Ok(PdfObject::Dict(font_dict)) => {
                        for (resource_name, value) in font_dict.iter() {
                            let font = self.load_font(value)?;
                            table.insert(resource_name.clone(), font);
                        }
                    }
                    Ok(other) => {
                        log::debug!("page {} Font resource is not a dictionary: {:?}", index, other)
                    }
                    Err(e) => log::debug!("page {} Font resource unresolvable: {}", index, e),
                }
            }

            self.fonts_for_pages.push(table);
        }
        Ok(())
    }

    fn load_font(&mut self, value: &PdfObject) -> Result<Rc<Font>> {
        if let Some((obj_num, _)) = value.as_reference() {
            if let Some(existing) = self.fonts_by_obj.get(&obj_num) {
                return Ok(Rc::clone(existing));
            }
        }

        let dict = match self.parser.trace(value)? {
            PdfObject::Dict(dict) => dict,
            other => {
                return Err(PdfError::TypeMismatch(format!(
                    "font resource is not a dictionary: {:?}",
                    other
                )))
            }
        };

        let font = Rc::new(Font::load(dict, &mut self.parser, self.loader.as_ref())?);
        if let Some((obj_num, _)) = value.as_reference() {
            self.fonts_by_obj.insert(obj_num, Rc::clone(&font));
        }
        Ok(font)
    }

    /// Resolves a page's `Contents` into decoded-ready stream objects. A
    /// single stream or an array of stream references are both accepted;
    /// unresolvable array elements are skipped.
    fn content_streams(&mut self, index: usize) -> Result<Vec<Stream>> {
        let contents = match self.pages[index].dict.get(b"Contents").cloned() {
            Some(contents) => contents,
            None => return Ok(Vec::new()),
        };

        let mut streams = Vec::new();
        let elements: Vec<PdfObject> = match &contents {
            PdfObject::Array(items) => items.clone(),
            other => vec![(*other).clone()],
        };

        for element in elements {
            match self.parser.trace(&element) {
                Ok(PdfObject::Stream(stream)) => streams.push(stream),
                Ok(other) => {
                    log::debug!("page {} content entry is not a stream: {:?}", index, other)
                }
                Err(e) => log::debug!("page {} content entry unresolvable: {}", index, e),
            }
        }
        Ok(streams)
    }

    /// Extracts the document's text: every page, every content stream, each
    /// stream's output followed by a blank line. A stream that fails to
    /// decode or assemble aborts the whole document.
    pub fn extract_text(&mut self) -> Result<String> {
        let mut out = String::new();

        for index in 0..self.pages.len() {
            let streams = self.content_streams(index)?;
            let fonts = &self.fonts_for_pages[index];

            for stream in streams {
                let data = decode::decode_stream(&stream)?;
                let text = extract_stream_text(data, fonts)?;
                out.push_str(&text);
                out.push_str("\n\n");
            }
        }

        Ok(out)
    }
}

/// One-call extraction from raw PDF bytes.
pub fn extract_text_from_bytes(data: Vec<u8>) -> Result<String> {
    PdfReader::from_bytes(data)?.extract_text()
}

// Integration-grade coverage for the reader lives in tests/extraction.rs,
// built on whole in-memory documents; the unit tests here pin the page-tree
// mechanics that are awkward to reach from full files.
#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_pdf(content: &[u8]) -> Vec<u8> {
        let mut builder = crate::test_pdf::PdfBuilder::new();
        let contents_id = builder.add_stream(b"", content);
        let font_id = builder.add_object(
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
        );
        let page_id = builder.reserve();
        let pages_id = builder.add_object_fmt(format_args!(
            "<< /Type /Pages /Kids [{} 0 R] /Count 1 >>",
            page_id
        ));
        builder.fill_object_fmt(
            page_id,
            format_args!(
                "<< /Type /Page /Parent {} 0 R /Resources << /Font << /F1 {} 0 R >> >> /Contents {} 0 R >>",
                pages_id, font_id, contents_id
            ),
        );
        let catalog_id =
            builder.add_object_fmt(format_args!("<< /Type /Catalog /Pages {} 0 R >>", pages_id));
        builder.finish_classic(catalog_id)
    }

    #[test]
    fn reads_pages_and_fonts() {
        let pdf = minimal_pdf(b"BT /F1 12 Tf (Hi) Tj ET");
        let reader = PdfReader::from_bytes(pdf).unwrap();
        assert_eq!(reader.page_count(), 1);
        assert_eq!(reader.fonts_for_pages[0].len(), 1);
        assert!(reader.fonts_for_pages[0].get(b"F1").is_some());
    }

    #[test]
    fn extracts_simple_text() {
        let pdf = minimal_pdf(b"BT /F1 12 Tf (Hello) Tj ET");
        let mut reader = PdfReader::from_bytes(pdf).unwrap();
        assert_eq!(reader.extract_text().unwrap(), "Hello\n\n");
    }

    #[test]
    fn xref_stream_document_loads() {
        let mut builder = crate::test_pdf::PdfBuilder::new();
        let contents_id = builder.add_stream(b"", b"BT /F1 12 Tf (via stream) Tj ET");
        let font_id = builder.add_object(
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
        );
        let page_id = builder.reserve();
        let pages_id = builder.add_object_fmt(format_args!(
            "<< /Type /Pages /Kids [{} 0 R] /Count 1 >>",
            page_id
        ));
        builder.fill_object_fmt(
            page_id,
            format_args!(
                "<< /Type /Page /Parent {} 0 R /Resources << /Font << /F1 {} 0 R >> >> /Contents {} 0 R >>",
                pages_id, font_id, contents_id
            ),
        );
        let catalog_id =
            builder.add_object_fmt(format_args!("<< /Type /Catalog /Pages {} 0 R >>", pages_id));
        let pdf = builder.finish_xref_stream(catalog_id);

        let mut reader = PdfReader::from_bytes(pdf).unwrap();
        assert_eq!(reader.page_count(), 1);
        assert_eq!(reader.extract_text().unwrap(), "via stream\n\n");
    }

    #[test]
    fn encrypted_without_collaborator_is_rejected() {
        // Splice an Encrypt entry into a valid document's trailer.
        let pdf = minimal_pdf(b"BT /F1 12 Tf (x) Tj ET");
        let text = String::from_utf8(pdf).unwrap();
        let patched = text.replace("trailer\n<< ", "trailer\n<< /Encrypt 99 0 R ");
        assert!(matches!(
            PdfReader::from_bytes(patched.into_bytes()),
            Err(PdfError::EncryptedAndUnauthenticated)
        ));
    }

    #[test]
    fn fonts_shared_across_pages_by_object_number() {
        let mut builder = crate::test_pdf::PdfBuilder::new();
        let font_id = builder.add_object(
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
        );
        let c1 = builder.reserve();
        let c2 = builder.reserve();
        builder.fill_stream(c1, b"", b"BT /F1 10 Tf (one) Tj ET");
        builder.fill_stream(c2, b"", b"BT /F1 10 Tf (two) Tj ET");
        let p1 = builder.reserve();
        let p2 = builder.reserve();
        let pages_id = builder.add_object_fmt(format_args!(
            "<< /Type /Pages /Kids [{} 0 R {} 0 R] /Count 2 /Resources << /Font << /F1 {} 0 R >> >> >>",
            p1, p2, font_id
        ));
        builder.fill_object_fmt(
            p1,
            format_args!("<< /Type /Page /Parent {} 0 R /Contents {} 0 R >>", pages_id, c1),
        );
        builder.fill_object_fmt(
            p2,
            format_args!("<< /Type /Page /Parent {} 0 R /Contents {} 0 R >>", pages_id, c2),
        );
        let catalog_id =
            builder.add_object_fmt(format_args!("<< /Type /Catalog /Pages {} 0 R >>", pages_id));
        let pdf = builder.finish_classic(catalog_id);

        let mut reader = PdfReader::from_bytes(pdf).unwrap();
        assert_eq!(reader.page_count(), 2);

        // Resources inherited from the Pages node; one Font instance backs
        // both tables.
        let f1 = reader.fonts_for_pages[0].get(b"F1").unwrap();
        let f2 = reader.fonts_for_pages[1].get(b"F1").unwrap();
        assert!(Rc::ptr_eq(f1, f2));

        assert_eq!(reader.extract_text().unwrap(), "one\n\ntwo\n\n");
    }

    #[test]
    fn cyclic_page_tree_terminates() {
        let mut builder = crate::test_pdf::PdfBuilder::new();
        let pages_id = builder.reserve();
        // The pages node lists itself as a kid.
        builder.fill_object_fmt(
            pages_id,
            format_args!(
                "<< /Type /Pages /Kids [{} 0 R] /Count 1 >>",
                pages_id
            ),
        );
        let catalog_id =
            builder.add_object_fmt(format_args!("<< /Type /Catalog /Pages {} 0 R >>", pages_id));
        let pdf = builder.finish_classic(catalog_id);

        let reader = PdfReader::from_bytes(pdf).unwrap();
        assert_eq!(reader.page_count(), 0);
    }
}
