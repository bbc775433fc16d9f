//! Font loading.
//!
//! A [`Font`] bundles everything text assembly needs to turn show-string
//! bytes into Unicode: the ToUnicode CMap when the font embeds one, the
//! charcode-to-CID CMap pair for predefined CJK encodings, or a 256-entry
//! simple-encoding table (shared predefined table or a private copy patched
//! by a `Differences` array). Descriptor metrics ride along for callers that
//! want them.

pub mod encodings;
mod loader;

pub use loader::{CMapResourceLoader, FsCMapLoader};

use crate::cmap::CMap;
use crate::core::decode;
use crate::core::error::{PdfError, Result};
use crate::core::object::{Dict, Name, PdfObject};
use crate::core::parser::Parser;
use std::borrow::Cow;
use std::rc::Rc;

/// Recognised font subtypes. Anything else reads as `Type1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontSubtype {
    Type0,
    Type1,
    Type3,
    MMType1,
    TrueType,
}

impl FontSubtype {
    fn from_name(name: &[u8]) -> FontSubtype {
        match name {
            b"Type0" => FontSubtype::Type0,
            b"Type3" => FontSubtype::Type3,
            b"MMType1" => FontSubtype::MMType1,
            b"TrueType" => FontSubtype::TrueType,
            _ => FontSubtype::Type1,
        }
    }
}

/// Descriptor-level metrics plus the width table.
#[derive(Debug, Clone, Default)]
pub struct FontMetrics {
    pub font_name: String,
    pub flags: u32,
    pub ascent: f64,
    pub descent: f64,
    pub cap_height: f64,
    pub x_height: f64,
    pub italic_angle: f64,
    pub leading: u32,
    pub missing_width: u32,
    pub first_char: u32,
    pub last_char: u32,
    pub widths: Vec<u32>,
    pub font_bbox: [f64; 4],
    pub font_matrix: [f64; 6],
    pub hscale: f64,
    pub vscale: f64,
}

/// A loaded font. Construction resolves the encoding strategy once; decoding
/// during text assembly is lookup-only, so fonts are shared read-only across
/// pages.
pub struct Font {
    dict: Dict,
    subtype: FontSubtype,
    base_font: String,
    encoding_name: String,
    to_unicode: Option<CMap>,
    cid_cmap: Option<CMap>,
    simple_encoding: Option<Cow<'static, [u32; 256]>>,
    simple_encoding_active: bool,
    predefined_cmap: bool,
    metrics: FontMetrics,
    descriptor: Option<Dict>,
}

impl Font {
    /// Loads a font from its dictionary, resolving references through
    /// `parser` and predefined CMaps through `loader`.
    pub fn load(
        dict: Dict,
        parser: &mut Parser,
        loader: &dyn CMapResourceLoader,
    ) -> Result<Font> {
        let mut font = Font {
            dict,
            subtype: FontSubtype::Type1,
            base_font: "unknown".to_string(),
            encoding_name: String::new(),
            to_unicode: None,
            cid_cmap: None,
            simple_encoding: None,
            simple_encoding_active: false,
            predefined_cmap: false,
            metrics: FontMetrics::default(),
            descriptor: None,
        };
        font.load_encoding(parser, loader)?;
        font.load_info(parser, loader)?;
        Ok(font)
    }

    pub fn subtype(&self) -> FontSubtype {
        self.subtype
    }

    pub fn base_font(&self) -> &str {
        &self.base_font
    }

    pub fn encoding_name(&self) -> &str {
        &self.encoding_name
    }

    /// The ToUnicode CMap (or, for predefined CJK encodings, the
    /// CID-to-Unicode CMap loaded from resources).
    pub fn to_unicode(&self) -> Option<&CMap> {
        self.to_unicode.as_ref()
    }

    /// The charcode-to-CID CMap of a predefined CJK encoding.
    pub fn cid_cmap(&self) -> Option<&CMap> {
        self.cid_cmap.as_ref()
    }

    pub fn simple_encoding(&self) -> Option<&[u32; 256]> {
        self.simple_encoding.as_deref()
    }

    pub fn simple_encoding_active(&self) -> bool {
        self.simple_encoding_active
    }

    pub fn has_predefined_cmap(&self) -> bool {
        self.predefined_cmap
    }

    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    pub fn descriptor(&self) -> Option<&Dict> {
        self.descriptor.as_ref()
    }

    pub fn dict(&self) -> &Dict {
        &self.dict
    }

    /// Resolves the encoding strategy: ToUnicode stream, predefined simple
    /// encoding, predefined CJK CMap pair, or a Differences-patched table.
    fn load_encoding(
        &mut self,
        parser: &mut Parser,
        loader: &dyn CMapResourceLoader,
    ) -> Result<()> {
        if let Some(to_unicode_obj) = self.dict.get(b"ToUnicode").cloned() {
            match parser.trace(&to_unicode_obj)? {
                PdfObject::Stream(stream) => {
                    let data = decode::decode_stream(&stream)?;
                    self.to_unicode = Some(CMap::parse(&data)?);
                }
                other => {
                    return Err(PdfError::TypeMismatch(format!(
                        "ToUnicode is not a stream: {:?}",
                        other
                    )))
                }
            }
        }

        let encoding_obj = match self.dict.get(b"Encoding").cloned() {
            Some(obj) => parser.trace(&obj)?,
            None => return Ok(()),
        };

        match encoding_obj {
            PdfObject::Name(name) => {
                self.encoding_name = name.to_string_lossy();
                if let Some(table) = encodings::predefined_simple_encoding(name.as_bytes()) {
                    self.simple_encoding = Some(Cow::Borrowed(table));
                    self.simple_encoding_active = true;
                } else if let Some(unicode_name) =
                    encodings::cid_to_unicode_name(name.as_bytes())
                {
                    match self.load_predefined_cmaps(loader, unicode_name) {
                        Ok(()) => self.predefined_cmap = true,
                        Err(e) => log::debug!(
                            "predefined CMap pair for {} unavailable: {}",
                            self.encoding_name,
                            e
                        ),
                    }
                }
            }
            PdfObject::Dict(encoding_dict) => {
                self.simple_encoding_active = true;

                let mut table: [u32; 256] = *encodings::predefined_simple_encoding(
                    encoding_dict
                        .get(b"BaseEncoding")
                        .and_then(PdfObject::as_name)
                        .map(Name::as_bytes)
                        .unwrap_or(b"StandardEncoding"),
                )
                .unwrap_or(&encodings::STANDARD_ENCODING);

                if let Some(PdfObject::Array(differences)) = encoding_dict.get(b"Differences")
                {
                    let mut slot: usize = 0;
                    for item in differences {
                        match item {
                            PdfObject::Integer(code) => {
                                slot = *code as usize;
                                if slot > 255 {
                                    slot = 0;
                                }
                            }
                            PdfObject::Name(glyph) => {
                                if let Some(cp) =
                                    encodings::glyph_name_to_codepoint(glyph.as_bytes())
                                {
                                    table[slot] = cp;
                                    slot += 1;
                                    if slot > 255 {
                                        slot = 0;
                                    }
                                }
                            }
                            other => {
                                log::debug!("ignoring Differences entry {:?}", other)
                            }
                        }
                    }
                }

                self.simple_encoding = Some(Cow::Owned(table));
            }
            _ => {}
        }

        Ok(())
    }

    /// Loads the charcode-to-CID CMap (named by the encoding) and the
    /// CID-to-Unicode CMap for a predefined CJK encoding.
    fn load_predefined_cmaps(
        &mut self,
        loader: &dyn CMapResourceLoader,
        unicode_name: &str,
    ) -> Result<()> {
        let data = loader.load_cmap(&self.encoding_name)?;
        self.cid_cmap = Some(CMap::parse(&data)?);

        let data = loader.load_cmap(unicode_name)?;
        self.to_unicode = Some(CMap::parse(&data)?);
        Ok(())
    }

    /// Reads subtype, descriptor and metric information.
    fn load_info(
        &mut self,
        parser: &mut Parser,
        loader: &dyn CMapResourceLoader,
    ) -> Result<()> {
        if let Some(subtype) = self.dict.get(b"Subtype").and_then(PdfObject::as_name) {
            self.subtype = FontSubtype::from_name(subtype.as_bytes());
        }

        if let Some(descriptor_obj) = self.dict.get(b"FontDescriptor").cloned() {
            if let PdfObject::Dict(descriptor) = parser.trace(&descriptor_obj)? {
                self.descriptor = Some(descriptor);
            }
        }

        if let Some(base) = self.dict.get(b"BaseFont").and_then(PdfObject::as_name) {
            self.base_font = base.to_string_lossy();
        }

        match self.subtype {
            FontSubtype::Type0 => self.load_type0_info(parser, loader)?,
            FontSubtype::Type3 => self.load_type3_info(),
            _ => self.load_simple_info(),
        }

        Ok(())
    }

    fn load_type0_info(
        &mut self,
        parser: &mut Parser,
        loader: &dyn CMapResourceLoader,
    ) -> Result<()> {
        let descendants = match self.dict.get(b"DescendantFonts") {
            Some(PdfObject::Array(items)) if !items.is_empty() => items[0].clone(),
            _ => return Ok(()),
        };
        // Only one descendant is allowed.
        let descendant = match parser.trace(&descendants)? {
            PdfObject::Dict(dict) => dict,
            other => {
                return Err(PdfError::TypeMismatch(format!(
                    "descendant font is not a dictionary: {:?}",
                    other
                )))
            }
        };

        if let Some(PdfObject::Dict(system_info)) = descendant.get(b"CIDSystemInfo") {
            let registry = match system_info.get(b"Registry") {
                Some(obj) => parser.trace(obj)?.as_string().map(|s| s.to_vec()),
                None => None,
            };
            let ordering = match system_info.get(b"Ordering") {
                Some(obj) => parser.trace(obj)?.as_string().map(|s| s.to_vec()),
                None => None,
            };
            let supplement = system_info
                .get(b"Supplement")
                .and_then(PdfObject::as_integer)
                .unwrap_or(0);

            if let (Some(registry), Some(ordering)) = (registry, ordering) {
                let collection = format!(
                    "{}-{}",
                    String::from_utf8_lossy(&registry),
                    String::from_utf8_lossy(&ordering)
                );
                if matches!(
                    collection.as_str(),
                    "Adobe-GB1" | "Adobe-CNS1" | "Adobe-Japan1" | "Adobe-Korea1"
                ) {
                    self.encoding_name = format!("{}-{}", collection, supplement);
                    let unicode_name = format!("{}-UCS2", collection);
                    if !self.predefined_cmap {
                        match self.load_predefined_cmaps(loader, &unicode_name) {
                            Ok(()) => self.predefined_cmap = true,
                            Err(e) => log::debug!(
                                "predefined CMap pair for {} unavailable: {}",
                                self.encoding_name,
                                e
                            ),
                        }
                    }
                }
            }
        }

        if let Some(descriptor_obj) = descendant.get(b"FontDescriptor").cloned() {
            if let PdfObject::Dict(descriptor) = parser.trace(&descriptor_obj)? {
                self.descriptor = Some(descriptor);
            }
        }

        self.metrics.missing_width = descendant
            .get(b"DW")
            .and_then(PdfObject::as_integer)
            .unwrap_or(1000) as u32;

        if let Some(PdfObject::Array(w_array)) = descendant.get(b"W") {
            self.parse_cid_widths(w_array);
        }

        self.load_font_descriptor();
        Ok(())
    }

    /// Parses a CID `W` array. Two forms: `c [w1 w2 ...]` gives explicit
    /// widths starting at CID c; `c1 c2 w` assigns w to every CID in the
    /// range. Gaps pad with the default width; a group that starts at or
    /// below the filled length overwrites the existing slots.
    fn parse_cid_widths(&mut self, w_array: &[PdfObject]) {
        let missing = self.metrics.missing_width;
        let widths = &mut self.metrics.widths;
        let mut got_values = 0u32;
        let mut first_value = 0usize;
        let mut to_range = 0usize;

        for item in w_array {
            match item {
                PdfObject::Array(sub) if got_values == 1 => {
                    if first_value > widths.len() {
                        widths.resize(first_value, missing);
                    }
                    for (k, entry) in sub.iter().enumerate() {
                        let cid = first_value + k;
                        let width = entry.as_integer().unwrap_or(0) as u32;
                        if cid < widths.len() {
                            widths[cid] = width;
                        } else {
                            widths.push(width);
                        }
                    }
                    got_values = 0;
                }
                PdfObject::Integer(v) => {
                    got_values += 1;
                    match got_values {
                        1 => first_value = *v as usize,
                        2 => to_range = *v as usize,
                        _ => {
                            got_values = 0;
                            if to_range < first_value {
                                to_range = first_value;
                            }
                            if to_range >= widths.len() {
                                widths.resize(to_range + 1, missing);
                            }
                            for slot in widths[first_value..=to_range].iter_mut() {
                                *slot = *v as u32;
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn load_type3_info(&mut self) {
        self.metrics.first_char = self
            .dict
            .get(b"FirstChar")
            .and_then(PdfObject::as_integer)
            .unwrap_or(0) as u32;
        self.metrics.last_char = self
            .dict
            .get(b"LastChar")
            .and_then(PdfObject::as_integer)
            .unwrap_or(0) as u32;

        if self.descriptor.is_some() {
            self.load_font_descriptor();
        } else if let Some(PdfObject::Array(bbox)) = self.dict.get(b"FontBBox") {
            for (i, value) in bbox.iter().take(4).enumerate() {
                self.metrics.font_bbox[i] = value.as_number().unwrap_or(0.0);
            }
        }

        self.metrics.ascent = self.metrics.font_bbox[3];
        self.metrics.descent = self.metrics.font_bbox[1];

        if let Some(PdfObject::Array(matrix)) = self.dict.get(b"FontMatrix") {
            if matrix.len() == 6 {
                for (i, value) in matrix.iter().enumerate() {
                    self.metrics.font_matrix[i] = value.as_number().unwrap_or(0.0);
                }
            }
            self.metrics.vscale = self.metrics.font_matrix[1] + self.metrics.font_matrix[3];
            self.metrics.hscale = self.metrics.font_matrix[0] + self.metrics.font_matrix[2];
        }
    }

    fn load_simple_info(&mut self) {
        if let Some(builtin) = builtin_font_metrics(&self.base_font) {
            self.metrics = builtin;
            return;
        }

        self.metrics.first_char = self
            .dict
            .get(b"FirstChar")
            .and_then(PdfObject::as_integer)
            .unwrap_or(0) as u32;
        self.metrics.last_char = self
            .dict
            .get(b"LastChar")
            .and_then(PdfObject::as_integer)
            .unwrap_or(255) as u32;
        if self.metrics.first_char > self.metrics.last_char {
            self.metrics.last_char = self.metrics.first_char;
        }

        if let Some(PdfObject::Array(widths)) = self.dict.get(b"Widths") {
            for value in widths {
                self.metrics
                    .widths
                    .push(value.as_integer().unwrap_or(0) as u32);
            }
        }

        self.load_font_descriptor();
    }

    fn load_font_descriptor(&mut self) {
        let descriptor = match &self.descriptor {
            Some(descriptor) => descriptor,
            None => return,
        };

        self.metrics.font_name = descriptor
            .get(b"FontName")
            .and_then(PdfObject::as_name)
            .map(Name::to_string_lossy)
            .unwrap_or_else(|| "unknown".to_string());
        self.metrics.flags = descriptor
            .get(b"Flags")
            .and_then(PdfObject::as_integer)
            .unwrap_or(0) as u32;
        self.metrics.ascent = descriptor
            .get(b"Ascent")
            .and_then(PdfObject::as_number)
            .unwrap_or(0.0);
        self.metrics.descent = descriptor
            .get(b"Descent")
            .and_then(PdfObject::as_number)
            .unwrap_or(0.0);
        self.metrics.italic_angle = descriptor
            .get(b"ItalicAngle")
            .and_then(PdfObject::as_number)
            .unwrap_or(0.0);
        self.metrics.x_height = descriptor
            .get(b"XHeight")
            .and_then(PdfObject::as_number)
            .unwrap_or(0.0);
        self.metrics.cap_height = descriptor
            .get(b"CapHeight")
            .and_then(PdfObject::as_number)
            .unwrap_or(0.0);
        self.metrics.missing_width = descriptor
            .get(b"MissingWidth")
            .and_then(PdfObject::as_integer)
            .unwrap_or(self.metrics.missing_width as i64) as u32;
        self.metrics.leading = descriptor
            .get(b"Leading")
            .and_then(PdfObject::as_integer)
            .unwrap_or(0) as u32;

        let bbox = descriptor
            .get(b"FontBBox")
            .or_else(|| self.dict.get(b"FontBBox"));
        if let Some(PdfObject::Array(bbox)) = bbox {
            for (i, value) in bbox.iter().take(4).enumerate() {
                self.metrics.font_bbox[i] = value.as_number().unwrap_or(0.0);
            }
        }
    }
}

/// Per-page font table: resource name to shared font, in resource order.
#[derive(Default)]
pub struct FontTable {
    entries: Vec<(Name, Rc<Font>)>,
}

impl FontTable {
    pub fn new() -> Self {
        FontTable::default()
    }

    pub fn get(&self, name: &[u8]) -> Option<&Rc<Font>> {
        self.entries
            .iter()
            .find(|(key, _)| key.as_bytes() == name)
            .map(|(_, font)| font)
    }

    pub fn insert(&mut self, name: Name, font: Rc<Font>) {
        self.entries.push((name, font));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Descriptor metrics for the standard 14 fonts. Width arrays are not
/// carried; they only feed layout.
fn builtin_font_metrics(base_font: &str) -> Option<FontMetrics> {
    let (ascent, descent, cap_height, italic_angle, flags, missing_width, bbox): (
        f64,
        f64,
        f64,
        f64,
        u32,
        u32,
        [f64; 4],
    ) = match base_font {
        "Helvetica" => (718.0, -207.0, 718.0, 0.0, 32, 0, [-166.0, -225.0, 1000.0, 931.0]),
        "Helvetica-Bold" => (718.0, -207.0, 718.0, 0.0, 32, 0, [-170.0, -228.0, 1003.0, 962.0]),
        "Helvetica-Oblique" => {
            (718.0, -207.0, 718.0, -12.0, 96, 0, [-170.0, -225.0, 1116.0, 931.0])
        }
        "Helvetica-BoldOblique" => {
            (718.0, -207.0, 718.0, -12.0, 96, 0, [-174.0, -228.0, 1114.0, 962.0])
        }
        "Courier" => (629.0, -157.0, 562.0, 0.0, 33, 600, [-23.0, -250.0, 715.0, 805.0]),
        "Courier-Bold" => (629.0, -157.0, 562.0, 0.0, 33, 600, [-113.0, -250.0, 749.0, 801.0]),
        "Courier-Oblique" => {
            (629.0, -157.0, 562.0, -12.0, 97, 600, [-27.0, -250.0, 849.0, 805.0])
        }
        "Courier-BoldOblique" => {
            (629.0, -157.0, 562.0, -12.0, 97, 600, [-57.0, -250.0, 869.0, 801.0])
        }
        "Times-Roman" => (683.0, -217.0, 662.0, 0.0, 34, 0, [-168.0, -218.0, 1000.0, 898.0]),
        "Times-Bold" => (683.0, -217.0, 676.0, 0.0, 34, 0, [-168.0, -218.0, 1000.0, 935.0]),
        "Times-Italic" => (683.0, -217.0, 653.0, -15.5, 98, 0, [-169.0, -217.0, 1010.0, 883.0]),
        "Times-BoldItalic" => {
            (683.0, -217.0, 669.0, -15.0, 98, 0, [-200.0, -218.0, 996.0, 921.0])
        }
        "Symbol" => (0.0, 0.0, 0.0, 0.0, 4, 0, [-180.0, -293.0, 1090.0, 1010.0]),
        "ZapfDingbats" => (0.0, 0.0, 0.0, 0.0, 4, 0, [-1.0, -143.0, 981.0, 820.0]),
        _ => return None,
    };

    Some(FontMetrics {
        font_name: base_font.to_string(),
        flags,
        ascent,
        descent,
        cap_height,
        italic_angle,
        missing_width,
        first_char: 0,
        last_char: 255,
        font_bbox: bbox,
        ..FontMetrics::default()
    })
}
