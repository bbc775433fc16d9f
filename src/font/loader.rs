//! Predefined CMap resource loading.
//!
//! Predefined CJK encodings name CMap files that ship outside the PDF (the
//! charcode-to-CID table and the paired `<collection>-UCS2` table). Where
//! those files live is the caller's business, so loading goes through a
//! trait; the default implementation reads `<root>/<name>` from disk.

use crate::core::error::{PdfError, Result};
use std::path::PathBuf;

pub trait CMapResourceLoader {
    /// Returns the raw bytes of the named CMap resource.
    fn load_cmap(&self, name: &str) -> Result<Vec<u8>>;
}

/// Loads CMap resources from a directory, `resources/` by default.
pub struct FsCMapLoader {
    root: PathBuf,
}

impl FsCMapLoader {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        FsCMapLoader { root: root.into() }
    }
}

impl Default for FsCMapLoader {
    fn default() -> Self {
        FsCMapLoader::new("resources")
    }
}

impl CMapResourceLoader for FsCMapLoader {
    fn load_cmap(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.root.join(name);
        std::fs::read(&path).map_err(|e| {
            log::debug!("CMap resource {} unreadable: {}", path.display(), e);
            PdfError::ResourceMissing(name.to_string())
        })
    }
}
