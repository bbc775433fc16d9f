//! Stream filter decoding.
//!
//! The extraction pipeline treats filter decoding as a collaborator with a
//! single entry point, [`decode_stream`]. FlateDecode (with the PNG and TIFF
//! predictors) and ASCIIHexDecode are implemented here. Unimplemented
//! filters surface as [`PdfError::FilterUnsupported`]; bad data inside a
//! supported filter is [`PdfError::FilterCorrupt`], so the caller can tell
//! "corrupt" apart from "not implemented".

use super::error::{PdfError, Result};
use super::object::{Dict, PdfObject, Stream};
use flate2::read::{DeflateDecoder, ZlibDecoder};
use std::io::Read;

/// Decodes a stream's payload according to its `Filter` entry.
///
/// `Filter` may be a single name or an array of names applied in order;
/// `DecodeParms` lines up with it either as a single dictionary or an array.
pub fn decode_stream(stream: &Stream) -> Result<Vec<u8>> {
    let filters = filter_names(&stream.dict)?;
    if filters.is_empty() {
        return Ok(stream.data.clone());
    }

    let parms = decode_parms(&stream.dict);
    let mut data = stream.data.clone();
    for (index, filter) in filters.iter().enumerate() {
        let parm = parms.get(index).copied().flatten();
        data = apply_filter(filter, &data, parm)?;
    }
    Ok(data)
}

fn filter_names(dict: &Dict) -> Result<Vec<String>> {
    match dict.get(b"Filter") {
        None | Some(PdfObject::Null) => Ok(Vec::new()),
        Some(PdfObject::Name(name)) => Ok(vec![name.to_string_lossy()]),
        Some(PdfObject::Array(items)) => {
            let mut names = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    PdfObject::Name(name) => names.push(name.to_string_lossy()),
                    other => {
                        return Err(PdfError::TypeMismatch(format!(
                            "Filter array entry is not a name: {:?}",
                            other
                        )))
                    }
                }
            }
            Ok(names)
        }
        Some(other) => Err(PdfError::TypeMismatch(format!(
            "Filter is neither a name nor an array: {:?}",
            other
        ))),
    }
}

fn decode_parms(dict: &Dict) -> Vec<Option<&Dict>> {
    match dict.get(b"DecodeParms").or_else(|| dict.get(b"DP")) {
        Some(PdfObject::Dict(parm)) => vec![Some(parm)],
        Some(PdfObject::Array(items)) => items
            .iter()
            .map(|item| match item {
                PdfObject::Dict(parm) => Some(parm),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn apply_filter(filter: &str, data: &[u8], parm: Option<&Dict>) -> Result<Vec<u8>> {
    match filter {
        "FlateDecode" | "Fl" => {
            let inflated = decode_flate(data)?;
            apply_predictor(inflated, parm)
        }
        "ASCIIHexDecode" | "AHx" => decode_ascii_hex(data),
        other => Err(PdfError::FilterUnsupported(other.to_string())),
    }
}

/// Inflates FlateDecode data. Tries the zlib container first, then falls
/// back to a raw deflate stream, which some writers emit without the header.
pub fn decode_flate(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    match ZlibDecoder::new(data).read_to_end(&mut out) {
        Ok(_) => Ok(out),
        Err(zlib_err) => {
            out.clear();
            match DeflateDecoder::new(data).read_to_end(&mut out) {
                Ok(_) => Ok(out),
                Err(deflate_err) => {
                    log::debug!(
                        "flate decode failed: zlib: {}, raw deflate: {}",
                        zlib_err,
                        deflate_err
                    );
                    Err(PdfError::FilterCorrupt(
                        "FlateDecode: bad deflate data".to_string(),
                    ))
                }
            }
        }
    }
}

/// Decodes ASCIIHexDecode data: hex digit pairs up to an optional `>` EOD
/// marker, whitespace ignored, odd trailing digit padded with `0`.
pub fn decode_ascii_hex(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut pending: Option<u8> = None;
    for &b in data {
        if b == b'>' {
            break;
        }
        if super::lexer::is_whitespace(b) {
            continue;
        }
        let digit = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => {
                return Err(PdfError::FilterCorrupt(format!(
                    "ASCIIHexDecode: invalid byte 0x{:02X}",
                    b
                )))
            }
        };
        match pending.take() {
            Some(hi) => out.push((hi << 4) | digit),
            None => pending = Some(digit),
        }
    }
    if let Some(hi) = pending {
        out.push(hi << 4);
    }
    Ok(out)
}

fn parm_int(parm: Option<&Dict>, key: &[u8], default: i64) -> i64 {
    parm.and_then(|p| p.get(key))
        .and_then(PdfObject::as_integer)
        .unwrap_or(default)
}

fn apply_predictor(data: Vec<u8>, parm: Option<&Dict>) -> Result<Vec<u8>> {
    let predictor = parm_int(parm, b"Predictor", 1);
    if predictor <= 1 {
        return Ok(data);
    }

    let colors = parm_int(parm, b"Colors", 1) as usize;
    let bpc = parm_int(parm, b"BitsPerComponent", 8) as usize;
    let columns = parm_int(parm, b"Columns", 1) as usize;
    let pix_bytes = (colors * bpc + 7) / 8;
    let row_bytes = (columns * colors * bpc + 7) / 8;

    if predictor == 2 {
        return decode_tiff_predictor(data, pix_bytes, row_bytes, bpc);
    }
    decode_png_predictor(&data, pix_bytes, row_bytes)
}

/// TIFF predictor 2 (horizontal differencing). Only 8-bit components are
/// handled, which covers what xref and content streams actually use.
fn decode_tiff_predictor(
    mut data: Vec<u8>,
    pix_bytes: usize,
    row_bytes: usize,
    bpc: usize,
) -> Result<Vec<u8>> {
    if bpc != 8 {
        return Err(PdfError::FilterUnsupported(format!(
            "TIFF predictor with {} bits per component",
            bpc
        )));
    }
    for row in data.chunks_mut(row_bytes) {
        for i in pix_bytes..row.len() {
            row[i] = row[i].wrapping_add(row[i - pix_bytes]);
        }
    }
    Ok(data)
}

/// PNG predictors (per-row tag byte, algorithms None/Sub/Up/Average/Paeth).
fn decode_png_predictor(data: &[u8], pix_bytes: usize, row_bytes: usize) -> Result<Vec<u8>> {
    let stride = row_bytes + 1;
    if stride == 1 || data.len() % stride != 0 {
        return Err(PdfError::FilterCorrupt(format!(
            "PNG predictor data length {} does not divide into rows of {}",
            data.len(),
            stride
        )));
    }

    let mut out = Vec::with_capacity(data.len() - data.len() / stride);
    let mut prev_row = vec![0u8; row_bytes];

    for chunk in data.chunks(stride) {
        let tag = chunk[0];
        let raw = &chunk[1..];
        let mut row = vec![0u8; row_bytes];
        match tag {
            0 => row.copy_from_slice(raw),
            1 => {
                for i in 0..row_bytes {
                    let left = if i >= pix_bytes { row[i - pix_bytes] } else { 0 };
                    row[i] = raw[i].wrapping_add(left);
                }
            }
            2 => {
                for i in 0..row_bytes {
                    row[i] = raw[i].wrapping_add(prev_row[i]);
                }
            }
            3 => {
                for i in 0..row_bytes {
                    let left = if i >= pix_bytes { row[i - pix_bytes] } else { 0 };
                    let avg = ((left as u16 + prev_row[i] as u16) / 2) as u8;
                    row[i] = raw[i].wrapping_add(avg);
                }
            }
            4 => {
                for i in 0..row_bytes {
                    let left = if i >= pix_bytes { row[i - pix_bytes] } else { 0 };
                    let up = prev_row[i];
                    let up_left = if i >= pix_bytes { prev_row[i - pix_bytes] } else { 0 };
                    row[i] = raw[i].wrapping_add(paeth(left, up, up_left));
                }
            }
            other => {
                return Err(PdfError::FilterCorrupt(format!(
                    "PNG predictor row tag {}",
                    other
                )))
            }
        }
        out.extend_from_slice(&row);
        prev_row = row;
    }

    Ok(out)
}

fn paeth(left: u8, up: u8, up_left: u8) -> u8 {
    let p = left as i32 + up as i32 - up_left as i32;
    let pa = (p - left as i32).abs();
    let pb = (p - up as i32).abs();
    let pc = (p - up_left as i32).abs();
    if pa <= pb && pa <= pc {
        left
    } else if pb <= pc {
        up
    } else {
        up_left
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::object::Name;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    fn stream_with(filter: Option<&str>, data: Vec<u8>) -> Stream {
        let mut dict = Dict::new();
        if let Some(name) = filter {
            dict.set(Name::new(*b"Filter"), PdfObject::Name(Name::new(name.as_bytes())));
        }
        dict.set(Name::new(*b"Length"), PdfObject::Integer(data.len() as i64));
        Stream { dict, data, obj_num: 1, gen: 0 }
    }

    #[test]
    fn flate_round_trip() {
        let original = b"BT /F1 12 Tf (Hello) Tj ET";
        let stream = stream_with(Some("FlateDecode"), deflate(original));
        assert_eq!(decode_stream(&stream).unwrap(), original);
    }

    #[test]
    fn no_filter_passes_through() {
        let stream = stream_with(None, b"plain".to_vec());
        assert_eq!(decode_stream(&stream).unwrap(), b"plain");
    }

    #[test]
    fn unsupported_filter_is_reported() {
        let stream = stream_with(Some("JBIG2Decode"), vec![0]);
        match decode_stream(&stream) {
            Err(PdfError::FilterUnsupported(name)) => assert_eq!(name, "JBIG2Decode"),
            other => panic!("expected FilterUnsupported, got {:?}", other),
        }
    }

    #[test]
    fn ascii_hex_decode() {
        assert_eq!(decode_ascii_hex(b"48 65 6C 6C 6F>").unwrap(), b"Hello");
        assert_eq!(decode_ascii_hex(b"414>").unwrap(), b"A@");
        assert!(matches!(
            decode_ascii_hex(b"4G>"),
            Err(PdfError::FilterCorrupt(_))
        ));
    }

    #[test]
    fn corrupt_flate_data_is_not_unsupported() {
        let stream = stream_with(Some("FlateDecode"), b"not deflate at all".to_vec());
        assert!(matches!(
            decode_stream(&stream),
            Err(PdfError::FilterCorrupt(_))
        ));
    }

    #[test]
    fn filter_chain_applies_in_order() {
        let hex: String = deflate(b"chained").iter().map(|b| format!("{:02X}", b)).collect();
        let mut dict = Dict::new();
        dict.set(
            Name::new(*b"Filter"),
            PdfObject::Array(vec![
                PdfObject::Name(Name::new(*b"ASCIIHexDecode")),
                PdfObject::Name(Name::new(*b"FlateDecode")),
            ]),
        );
        let stream = Stream {
            dict,
            data: format!("{}>", hex).into_bytes(),
            obj_num: 1,
            gen: 0,
        };
        assert_eq!(decode_stream(&stream).unwrap(), b"chained");
    }

    #[test]
    fn png_up_predictor() {
        // Two rows of 3 bytes, predictor rows tagged Up (2).
        // Row 1 raw: 1 2 3 (prev row is zeros) -> 1 2 3
        // Row 2 raw: 1 1 1 -> 2 3 4
        let mut dict = Dict::new();
        dict.set(Name::new(*b"Filter"), PdfObject::Name(Name::new(*b"FlateDecode")));
        let mut parm = Dict::new();
        parm.set(Name::new(*b"Predictor"), PdfObject::Integer(12));
        parm.set(Name::new(*b"Columns"), PdfObject::Integer(3));
        dict.set(Name::new(*b"DecodeParms"), PdfObject::Dict(parm));

        let raw = vec![2, 1, 2, 3, 2, 1, 1, 1];
        let stream = Stream { dict, data: deflate(&raw), obj_num: 1, gen: 0 };
        assert_eq!(decode_stream(&stream).unwrap(), vec![1, 2, 3, 2, 3, 4]);
    }
}
