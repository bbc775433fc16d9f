//! In-memory PDF fixture builder. Shared by the integration tests as
//! `common` and compiled into the library's unit tests via a `#[path]`
//! module in `lib.rs`.
//!
//! Offsets are recorded as objects are appended, so cross-reference tables
//! come out correct without hand-counted byte positions. `finish_classic`
//! closes the file with a classic xref table, `finish_xref_stream` with a
//! compressed xref stream (`W [1 2 1]`, uncompressed payload).

use std::fmt;

pub struct PdfBuilder {
    buf: Vec<u8>,
    offsets: Vec<Option<usize>>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        PdfBuilder {
            buf: b"%PDF-1.4\n".to_vec(),
            offsets: vec![None], // slot 0 is the free head
        }
    }

    /// Allocates an object number to be filled later.
    pub fn reserve(&mut self) -> u32 {
        self.offsets.push(None);
        (self.offsets.len() - 1) as u32
    }

    pub fn fill_object(&mut self, id: u32, body: &[u8]) {
        self.offsets[id as usize] = Some(self.buf.len());
        self.buf
            .extend_from_slice(format!("{} 0 obj\n", id).as_bytes());
        self.buf.extend_from_slice(body);
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    pub fn fill_object_fmt(&mut self, id: u32, args: fmt::Arguments) {
        self.fill_object(id, args.to_string().as_bytes());
    }

    pub fn add_object(&mut self, body: &[u8]) -> u32 {
        let id = self.reserve();
        self.fill_object(id, body);
        id
    }

    pub fn add_object_fmt(&mut self, args: fmt::Arguments) -> u32 {
        let id = self.reserve();
        self.fill_object_fmt(id, args);
        id
    }

    /// Writes a stream object. `extra_dict` is spliced into the dictionary
    /// after `/Length` (e.g. `/Filter /FlateDecode`).
    pub fn fill_stream(&mut self, id: u32, extra_dict: &[u8], data: &[u8]) {
        self.offsets[id as usize] = Some(self.buf.len());
        self.buf
            .extend_from_slice(format!("{} 0 obj\n<< /Length {}", id, data.len()).as_bytes());
        if !extra_dict.is_empty() {
            self.buf.push(b' ');
            self.buf.extend_from_slice(extra_dict);
        }
        self.buf.extend_from_slice(b" >>\nstream\n");
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\nendstream\nendobj\n");
    }

    pub fn add_stream(&mut self, extra_dict: &[u8], data: &[u8]) -> u32 {
        let id = self.reserve();
        self.fill_stream(id, extra_dict, data);
        id
    }

    /// Closes the file with a classic xref table and trailer.
    pub fn finish_classic(mut self, root_id: u32) -> Vec<u8> {
        let xref_offset = self.buf.len();
        let size = self.offsets.len();
        self.buf
            .extend_from_slice(format!("xref\n0 {}\n", size).as_bytes());
        self.buf.extend_from_slice(b"0000000000 65535 f \n");
        for id in 1..size {
            let offset = self.offsets[id].expect("object reserved but never filled");
            self.buf
                .extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        self.buf.extend_from_slice(
            format!("trailer\n<< /Size {} /Root {} 0 R >>\n", size, root_id).as_bytes(),
        );
        self.buf
            .extend_from_slice(format!("startxref\n{}\n%%EOF\n", xref_offset).as_bytes());
        self.buf
    }

    /// Closes the file with a compressed xref stream: `W [1 2 1]`, type-1
    /// rows, no filter.
    pub fn finish_xref_stream(mut self, root_id: u32) -> Vec<u8> {
        let xref_id = self.reserve();
        let xref_offset = self.buf.len();
        self.offsets[xref_id as usize] = Some(xref_offset);
        let size = self.offsets.len();

        let mut rows: Vec<u8> = Vec::with_capacity(size * 4);
        rows.extend_from_slice(&[0, 0, 0, 0]); // object 0: free
        for id in 1..size {
            let offset = self.offsets[id].expect("object reserved but never filled");
            assert!(offset <= u16::MAX as usize, "fixture too large for W [1 2 1]");
            rows.push(1);
            rows.extend_from_slice(&(offset as u16).to_be_bytes());
            rows.push(0);
        }

        self.buf.extend_from_slice(
            format!(
                "{} 0 obj\n<< /Type /XRef /Size {} /W [1 2 1] /Root {} 0 R /Length {} >>\nstream\n",
                xref_id,
                size,
                root_id,
                rows.len()
            )
            .as_bytes(),
        );
        self.buf.extend_from_slice(&rows);
        self.buf.extend_from_slice(b"\nendstream\nendobj\n");
        self.buf
            .extend_from_slice(format!("startxref\n{}\n%%EOF\n", xref_offset).as_bytes());
        self.buf
    }
}
