//! Minimal PDF 1.4 document writer.
//!
//! Produces uncompressed object bodies with Flate-compressed page content
//! streams and a classic cross-reference table. Only the two standard
//! Helvetica faces are referenced, so no font embedding is needed; text is
//! encoded as WinAnsi (Windows-1252), which covers the degree sign.
//!
//! Object numbering:
//! 1. Catalog
//! 2. Pages tree
//! 3. Helvetica (`/F1`)
//! 4. Helvetica-Bold (`/F2`)
//! 5. Info dictionary
//! 6.. page object followed by its content stream, per page

use std::fmt::Write as _;
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::RenderResult;

/// A4 portrait in points.
pub const A4: (f64, f64) = (595.28, 841.89);

const FIRST_PAGE_OBJECT: usize = 6;

/// Base-14 fonts available to page content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Helvetica,
    HelveticaBold,
}

impl Font {
    fn resource_name(self) -> &'static str {
        match self {
            Font::Helvetica => "F1",
            Font::HelveticaBold => "F2",
        }
    }

    fn base_font(self) -> &'static str {
        match self {
            Font::Helvetica => "Helvetica",
            Font::HelveticaBold => "Helvetica-Bold",
        }
    }

    fn widths(self) -> &'static [u16; 95] {
        match self {
            Font::Helvetica => &HELVETICA_WIDTHS,
            Font::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
        }
    }

    /// Advance width of `text` at `size` points.
    pub fn text_width(self, text: &str, size: f64) -> f64 {
        let units: u32 = text.chars().map(|c| self.char_width(c) as u32).sum();
        units as f64 * size / 1000.0
    }

    fn char_width(self, c: char) -> u16 {
        match c {
            ' '..='~' => self.widths()[c as usize - 32],
            '°' => 400,
            _ => 556,
        }
    }
}

/// Fill color in DeviceRGB, components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f64, pub f64, pub f64);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb(1.0, 1.0, 1.0);
    pub const GREY: Rgb = Rgb(0.5, 0.5, 0.5);
    pub const WHITESMOKE: Rgb = Rgb(0.961, 0.961, 0.961);
    pub const BEIGE: Rgb = Rgb(0.961, 0.961, 0.863);
}

/// Horizontal anchor for text placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Drawing operations for one page, in PDF user space (origin bottom-left).
#[derive(Debug, Default, Clone)]
pub struct PageContent {
    ops: String,
}

impl PageContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgb) {
        let _ = writeln!(
            self.ops,
            "{} {} {} rg\n{} {} {} {} re f",
            num(color.0),
            num(color.1),
            num(color.2),
            num(x),
            num(y),
            num(width),
            num(height)
        );
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, width: f64, color: Rgb) {
        let _ = writeln!(
            self.ops,
            "{} w {} {} {} RG\n{} {} m {} {} l S",
            num(width),
            num(color.0),
            num(color.1),
            num(color.2),
            num(x1),
            num(y1),
            num(x2),
            num(y2)
        );
    }

    /// Draw `text` with its baseline at `y`; `x` is interpreted per `align`.
    #[allow(clippy::too_many_arguments)]
    pub fn text(&mut self, font: Font, size: f64, x: f64, y: f64, align: Align, color: Rgb, text: &str) {
        let width = font.text_width(text, size);
        let left = match align {
            Align::Left => x,
            Align::Center => x - width / 2.0,
            Align::Right => x - width,
        };
        let _ = writeln!(
            self.ops,
            "BT\n{} {} {} rg\n/{} {} Tf\n{} {} Td\n({}) Tj\nET",
            num(color.0),
            num(color.1),
            num(color.2),
            font.resource_name(),
            num(size),
            num(left),
            num(y),
            escape_text(text)
        );
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Raw content stream operators.
    pub fn operators(&self) -> &str {
        &self.ops
    }
}

/// Document metadata written to the Info dictionary.
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub title: String,
    pub producer: String,
    /// PDF date string body, e.g. `20240601120000`.
    pub creation_date: Option<String>,
}

/// An in-memory PDF document.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    page_size: (f64, f64),
    info: DocumentInfo,
    pages: Vec<PageContent>,
}

impl PdfDocument {
    pub fn new(page_size: (f64, f64), info: DocumentInfo) -> Self {
        Self {
            page_size,
            info,
            pages: Vec::new(),
        }
    }

    pub fn add_page(&mut self, page: PageContent) {
        self.pages.push(page);
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Serialize the document.
    pub fn to_bytes(&self) -> RenderResult<Vec<u8>> {
        let mut out = Vec::new();
        let mut offsets = Vec::new();

        out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

        let kids: Vec<String> = (0..self.pages.len())
            .map(|i| format!("{} 0 R", FIRST_PAGE_OBJECT + 2 * i))
            .collect();

        write_object(&mut out, &mut offsets, b"<< /Type /Catalog /Pages 2 0 R >>");
        write_object(
            &mut out,
            &mut offsets,
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids.join(" "),
                self.pages.len()
            )
            .as_bytes(),
        );
        for font in [Font::Helvetica, Font::HelveticaBold] {
            write_object(
                &mut out,
                &mut offsets,
                format!(
                    "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                    font.base_font()
                )
                .as_bytes(),
            );
        }
        write_object(&mut out, &mut offsets, &self.info_dictionary());

        for (i, page) in self.pages.iter().enumerate() {
            let content_id = FIRST_PAGE_OBJECT + 2 * i + 1;
            write_object(
                &mut out,
                &mut offsets,
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                     /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                    num(self.page_size.0),
                    num(self.page_size.1),
                    content_id
                )
                .as_bytes(),
            );

            let compressed = deflate_content(page.operators().as_bytes())?;
            let mut stream = format!(
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            )
            .into_bytes();
            stream.extend_from_slice(&compressed);
            stream.extend_from_slice(b"\nendstream");
            write_object(&mut out, &mut offsets, &stream);
        }

        let xref_offset = out.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", offsets.len() + 1);
        for offset in &offsets {
            let _ = writeln!(xref, "{:010} 00000 n ", offset);
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root 1 0 R /Info 5 0 R >>\nstartxref\n{}\n%%EOF\n",
            offsets.len() + 1,
            xref_offset
        );
        out.extend_from_slice(xref.as_bytes());

        Ok(out)
    }

    fn info_dictionary(&self) -> Vec<u8> {
        let mut dict = format!(
            "<< /Title ({}) /Producer ({})",
            escape_text(&self.info.title),
            escape_text(&self.info.producer)
        );
        if let Some(date) = &self.info.creation_date {
            let _ = write!(dict, " /CreationDate (D:{})", escape_text(date));
        }
        dict.push_str(" >>");
        dict.into_bytes()
    }
}

/// Append `N 0 obj ... endobj`, recording the object's byte offset.
fn write_object(out: &mut Vec<u8>, offsets: &mut Vec<usize>, body: &[u8]) {
    offsets.push(out.len());
    out.extend_from_slice(format!("{} 0 obj\n", offsets.len()).as_bytes());
    out.extend_from_slice(body);
    out.extend_from_slice(b"\nendobj\n");
}

fn deflate_content(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Compact decimal for content streams: at most 3 decimals, no trailing zeros.
fn num(v: f64) -> String {
    let s = format!("{:.3}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Escape a literal string, mapping to WinAnsi and octal-escaping bytes
/// outside printable ASCII.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            _ => {
                let byte = win_ansi_byte(c);
                let _ = write!(out, "\\{:03o}", byte);
            }
        }
    }
    out
}

fn win_ansi_byte(c: char) -> u8 {
    match c as u32 {
        0xA0..=0xFF => c as u32 as u8,
        _ => match c {
            '€' => 0x80,
            '–' => 0x96,
            '—' => 0x97,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            _ => b'?',
        },
    }
}

/// Helvetica advance widths for ASCII 32..=126 (AFM units).
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Helvetica-Bold advance widths for ASCII 32..=126 (AFM units).
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    333, 333, 584, 584, 584, 611, 975, // ':'..'@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    333, 278, 333, 584, 556, 333, // '['..'`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // 'a'..'m'
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // 'n'..'z'
    389, 280, 389, 584, // '{'..'~'
];
