//! Embedded image extraction: walk a PDF's pages and decode image XObjects.
//!
//! ## Why content-stream order?
//!
//! A page's `XObject` resource dictionary is an unordered name→object map;
//! iterating it would yield images in arbitrary order. The content stream,
//! however, paints images with `/Name Do` operators in drawing order, which
//! is what a reader perceives. We therefore tokenise each page's content
//! stream, record images as their `Do` operators appear, and recurse into
//! `Form` XObjects the same way (cycle-guarded, forms can nest).
//!
//! ## Decoding strategy
//!
//! PDF image streams come in three shapes we handle:
//! - `DCTDecode` — the stream *is* a JPEG file; hand it to the `image` crate.
//! - `JPXDecode` — JPEG 2000; best-effort decode via the `image` crate.
//! - `FlateDecode` / no filter — raw samples; interpretation depends on
//!   `ColorSpace` and `BitsPerComponent` (DeviceRGB, DeviceGray,
//!   DeviceCMYK→RGB, ICCBased guessed from the data stride).
//!
//! An image that cannot be decoded is skipped with a warning rather than
//! failing the run; only a document that cannot be parsed at all is fatal.

use crate::error::AltTextError;
use crate::output::DocumentSummary;
use flate2::read::ZlibDecoder;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use tracing::{debug, warn};

/// Decoded images grouped by 1-indexed page number, in encounter order.
pub type PageImages = BTreeMap<u32, Vec<DynamicImage>>;

/// Parse the document and decode every embedded image, grouped by page.
///
/// Fatal only when the PDF itself cannot be parsed; individual images that
/// fail to decode are logged and skipped.
pub fn extract_images(bytes: &[u8], name: &str) -> Result<PageImages, AltTextError> {
    let doc = load_document(bytes, name)?;
    let mut result = PageImages::new();

    for (page_num, ids) in collect_image_ids(&doc) {
        let mut images = Vec::with_capacity(ids.len());
        for (pos, id) in ids.iter().enumerate() {
            let stream = match doc.get_object(*id) {
                Ok(Object::Stream(s)) => s,
                _ => continue,
            };
            match decode_image_stream(&doc, stream) {
                Ok(img) => {
                    debug!(
                        "Page {} image {}: decoded {}x{}",
                        page_num,
                        pos + 1,
                        img.width(),
                        img.height()
                    );
                    images.push(img);
                }
                Err(e) => {
                    warn!("Page {} image {}: skipping undecodable image: {}", page_num, pos + 1, e);
                }
            }
        }
        if !images.is_empty() {
            result.insert(page_num, images);
        }
    }

    Ok(result)
}

/// Count pages and embedded images without decoding pixel data.
///
/// Used by `inspect`, which needs a fast, network-free preview.
pub fn summarize(bytes: &[u8], name: &str) -> Result<DocumentSummary, AltTextError> {
    let doc = load_document(bytes, name)?;
    let page_count = doc.get_pages().len();
    let images_per_page: Vec<(u32, usize)> = collect_image_ids(&doc)
        .into_iter()
        .filter(|(_, ids)| !ids.is_empty())
        .map(|(page, ids)| (page, ids.len()))
        .collect();
    let total_images = images_per_page.iter().map(|(_, n)| n).sum();
    Ok(DocumentSummary {
        name: name.to_string(),
        page_count,
        images_per_page,
        total_images,
    })
}

fn load_document(bytes: &[u8], name: &str) -> Result<Document, AltTextError> {
    Document::load_mem(bytes).map_err(|e| AltTextError::CorruptPdf {
        name: name.to_string(),
        detail: e.to_string(),
    })
}

/// Walk every page and return image XObject ids in content-stream
/// encounter order.
fn collect_image_ids(doc: &Document) -> BTreeMap<u32, Vec<ObjectId>> {
    let mut result = BTreeMap::new();

    for (page_num, page_id) in doc.get_pages() {
        let page_dict = match doc.get_object(page_id) {
            Ok(Object::Dictionary(d)) => d,
            _ => continue,
        };

        let resources = page_resources(doc, page_dict);
        let content = page_content(doc, page_dict);

        let mut scanner = ContentScanner {
            doc,
            found: Vec::new(),
            visited_forms: HashSet::new(),
        };
        scanner.scan(&content, resources.as_ref());

        // Fallback: a content stream our tokeniser could not follow (e.g.
        // images painted only via inline operators we don't parse) still has
        // its images listed in the resource dictionary. Name-ordered, so the
        // same document always yields the same image numbering.
        if scanner.found.is_empty() {
            if let Some(ref res) = resources {
                for (_, id) in xobjects_of(doc, res) {
                    if is_image_stream(doc, id) {
                        scanner.found.push(id);
                    }
                }
            }
        }

        result.insert(page_num, scanner.found);
    }

    result
}

/// Resolve a page's `Resources`, falling back to the parent node for
/// inherited resources.
fn page_resources(doc: &Document, page_dict: &Dictionary) -> Option<Object> {
    if let Ok(res) = page_dict.get(b"Resources") {
        return Some(res.clone());
    }
    if let Ok(Object::Reference(parent_id)) = page_dict.get(b"Parent") {
        if let Ok(Object::Dictionary(parent)) = doc.get_object(*parent_id) {
            if let Ok(res) = parent.get(b"Resources") {
                return Some(res.clone());
            }
        }
    }
    None
}

/// Concatenate and decompress a page's content stream(s).
fn page_content(doc: &Document, page_dict: &Dictionary) -> Vec<u8> {
    match page_dict.get(b"Contents") {
        Ok(contents) => content_data(doc, contents),
        Err(_) => Vec::new(),
    }
}

fn content_data(doc: &Document, contents: &Object) -> Vec<u8> {
    match contents {
        Object::Reference(id) => match doc.get_object(*id) {
            Ok(obj) => content_data(doc, obj),
            Err(_) => Vec::new(),
        },
        Object::Stream(stream) => decompress_stream(stream),
        Object::Array(arr) => {
            let mut combined = Vec::new();
            for item in arr {
                combined.extend(content_data(doc, item));
                combined.push(b'\n');
            }
            combined
        }
        _ => Vec::new(),
    }
}

/// Scanner state for one page: walks content streams recording `Do`
/// invocations of image XObjects.
struct ContentScanner<'a> {
    doc: &'a Document,
    found: Vec<ObjectId>,
    visited_forms: HashSet<ObjectId>,
}

impl ContentScanner<'_> {
    fn scan(&mut self, content: &[u8], resources: Option<&Object>) {
        let Some(resources) = resources else { return };
        let xobjects = xobjects_of(self.doc, resources);
        if xobjects.is_empty() {
            return;
        }

        let tokens = tokenize(content);
        for i in 1..tokens.len() {
            if tokens[i] != "Do" {
                continue;
            }
            let name = tokens[i - 1].trim_start_matches('/');
            let Some(&obj_id) = xobjects.get(name) else { continue };

            match self.doc.get_object(obj_id) {
                Ok(Object::Stream(stream)) => match subtype_of(stream) {
                    Some("Image") => self.found.push(obj_id),
                    Some("Form") => self.scan_form(obj_id, stream.clone()),
                    _ => {}
                },
                _ => {}
            }
        }
    }

    fn scan_form(&mut self, form_id: ObjectId, stream: Stream) {
        // Forms can reference each other; guard against cycles.
        if !self.visited_forms.insert(form_id) {
            return;
        }
        let resources = stream.dict.get(b"Resources").ok().cloned();
        let content = decompress_stream(&stream);
        self.scan(&content, resources.as_ref());
    }
}

/// Extract the `XObject` name→id map from a resources object.
///
/// A `BTreeMap` so iteration is name-ordered: the resource-dictionary
/// fallback below depends on a stable order.
fn xobjects_of(doc: &Document, resources: &Object) -> BTreeMap<String, ObjectId> {
    let mut result = BTreeMap::new();
    let Some(res_dict) = as_dict(doc, resources) else {
        return result;
    };
    let Ok(xobjects) = res_dict.get(b"XObject") else {
        return result;
    };
    let Some(xobj_dict) = as_dict(doc, xobjects) else {
        return result;
    };
    for (name, value) in xobj_dict.iter() {
        if let Object::Reference(id) = value {
            result.insert(String::from_utf8_lossy(name).to_string(), *id);
        }
    }
    result
}

fn as_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Dictionary(d) => Some(d),
        Object::Reference(id) => match doc.get_object(*id) {
            Ok(Object::Dictionary(d)) => Some(d),
            _ => None,
        },
        _ => None,
    }
}

fn is_image_stream(doc: &Document, id: ObjectId) -> bool {
    matches!(
        doc.get_object(id),
        Ok(Object::Stream(s)) if subtype_of(s) == Some("Image")
    )
}

fn subtype_of(stream: &Stream) -> Option<&str> {
    match stream.dict.get(b"Subtype") {
        Ok(Object::Name(n)) => std::str::from_utf8(n).ok(),
        _ => None,
    }
}

/// Split a content stream into operator/operand tokens.
///
/// Simplified PDF syntax: handles whitespace, `(…)` strings (with nesting),
/// and array brackets. Enough for locating `Do` operators; full content
/// interpretation is out of scope.
fn tokenize(content: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(content);
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut paren_depth = 0usize;

    for ch in text.chars() {
        if paren_depth > 0 {
            match ch {
                '(' => paren_depth += 1,
                ')' => {
                    paren_depth -= 1;
                    if paren_depth == 0 {
                        current.clear();
                        continue;
                    }
                }
                _ => {}
            }
            continue;
        }
        match ch {
            '(' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                paren_depth = 1;
            }
            ' ' | '\t' | '\n' | '\r' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            '[' | ']' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

// ── Stream decoding ──────────────────────────────────────────────────────

/// First filter name applied to a stream, if any.
fn first_filter(stream: &Stream) -> Option<String> {
    match stream.dict.get(b"Filter") {
        Ok(Object::Name(n)) => Some(String::from_utf8_lossy(n).to_string()),
        Ok(Object::Array(arr)) => arr.first().and_then(|f| match f {
            Object::Name(n) => Some(String::from_utf8_lossy(n).to_string()),
            _ => None,
        }),
        _ => None,
    }
}

/// Decompress a (content or image) stream's bytes.
fn decompress_stream(stream: &Stream) -> Vec<u8> {
    match first_filter(stream).as_deref() {
        Some("FlateDecode") => {
            let mut decoder = ZlibDecoder::new(&stream.content[..]);
            let mut decoded = Vec::new();
            match decoder.read_to_end(&mut decoded) {
                Ok(_) => decoded,
                Err(_) => stream.content.clone(),
            }
        }
        _ => stream.content.clone(),
    }
}

fn dict_u32(dict: &Dictionary, key: &[u8]) -> Option<u32> {
    match dict.get(key) {
        Ok(Object::Integer(n)) if *n >= 0 => Some(*n as u32),
        _ => None,
    }
}

/// Resolve a `ColorSpace` entry to its base name, following references and
/// array forms like `[/ICCBased 12 0 R]`.
fn color_space_name(doc: &Document, obj: &Object) -> String {
    match obj {
        Object::Name(name) => String::from_utf8_lossy(name).to_string(),
        Object::Array(arr) => match arr.first() {
            Some(Object::Name(name)) => String::from_utf8_lossy(name).to_string(),
            _ => "Unknown".to_string(),
        },
        Object::Reference(id) => match doc.get_object(*id) {
            Ok(resolved) => color_space_name(doc, resolved),
            Err(_) => "Unknown".to_string(),
        },
        _ => "Unknown".to_string(),
    }
}

/// Decode one image XObject stream into pixels.
pub(crate) fn decode_image_stream(doc: &Document, stream: &Stream) -> Result<DynamicImage, String> {
    let width = dict_u32(&stream.dict, b"Width").ok_or("missing Width")?;
    let height = dict_u32(&stream.dict, b"Height").ok_or("missing Height")?;
    if width == 0 || height == 0 {
        return Err(format!("degenerate dimensions {}x{}", width, height));
    }

    let filter = first_filter(stream);
    let data = match filter.as_deref() {
        Some("DCTDecode") => {
            return image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
                .map_err(|e| format!("JPEG decode failed: {}", e));
        }
        Some("JPXDecode") => {
            return image::load_from_memory(&stream.content)
                .map_err(|e| format!("JPEG 2000 decode failed: {}", e));
        }
        Some("FlateDecode") => {
            let mut decoder = ZlibDecoder::new(&stream.content[..]);
            let mut decoded = Vec::new();
            decoder
                .read_to_end(&mut decoded)
                .map_err(|e| format!("FlateDecode failed: {}", e))?;
            decoded
        }
        None => stream.content.clone(),
        Some(other) => return Err(format!("unsupported filter: {}", other)),
    };

    let bits = dict_u32(&stream.dict, b"BitsPerComponent").unwrap_or(8);
    if bits != 8 {
        return Err(format!("unsupported bits per component: {}", bits));
    }

    let color_space = stream
        .dict
        .get(b"ColorSpace")
        .map(|cs| color_space_name(doc, cs))
        .unwrap_or_else(|_| "DeviceRGB".to_string());

    raw_samples_to_image(&data, width, height, &color_space)
}

/// Interpret raw 8-bit samples according to the declared colour space.
fn raw_samples_to_image(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &str,
) -> Result<DynamicImage, String> {
    let pixels = (width as usize) * (height as usize);
    match color_space {
        "DeviceRGB" | "CalRGB" => {
            if data.len() < pixels * 3 {
                return Err(format!("RGB data too short: {} < {}", data.len(), pixels * 3));
            }
            RgbImage::from_raw(width, height, data[..pixels * 3].to_vec())
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| "RGB buffer construction failed".to_string())
        }
        "DeviceGray" | "CalGray" => {
            if data.len() < pixels {
                return Err(format!("grayscale data too short: {} < {}", data.len(), pixels));
            }
            GrayImage::from_raw(width, height, data[..pixels].to_vec())
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(|| "grayscale buffer construction failed".to_string())
        }
        "DeviceCMYK" => {
            if data.len() < pixels * 4 {
                return Err(format!("CMYK data too short: {} < {}", data.len(), pixels * 4));
            }
            let mut rgb = Vec::with_capacity(pixels * 3);
            for chunk in data[..pixels * 4].chunks_exact(4) {
                let c = chunk[0] as f32 / 255.0;
                let m = chunk[1] as f32 / 255.0;
                let y = chunk[2] as f32 / 255.0;
                let k = chunk[3] as f32 / 255.0;
                rgb.push(((1.0 - c) * (1.0 - k) * 255.0) as u8);
                rgb.push(((1.0 - m) * (1.0 - k) * 255.0) as u8);
                rgb.push(((1.0 - y) * (1.0 - k) * 255.0) as u8);
            }
            RgbImage::from_raw(width, height, rgb)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| "CMYK conversion failed".to_string())
        }
        // ICCBased gives no component count without chasing the profile
        // stream; guess from the data stride.
        "ICCBased" => {
            if data.len() >= pixels * 3 {
                raw_samples_to_image(data, width, height, "DeviceRGB")
            } else if data.len() >= pixels {
                raw_samples_to_image(data, width, height, "DeviceGray")
            } else {
                Err("ICCBased data too short for any known stride".to_string())
            }
        }
        other => Err(format!("unsupported color space: {}", other)),
    }
}
