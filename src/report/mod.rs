//! PDF report assembly.
//!
//! A report is a title page header followed by one section per page: section
//! title, chart image and a word-wrapped summary.

mod raster;

pub use raster::{rasterize, ChartSpec, RasterImage, Series};

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};
use printpdf::image_crate::{DynamicImage, RgbImage};
use printpdf::{BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use tracing::info;

use crate::error::{Error, Result};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const IMAGE_WIDTH_MM: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const SUMMARY_FONT_SIZE: f32 = 11.0;
const LINE_HEIGHT_MM: f32 = 5.5;
const WRAP_COLUMNS: usize = 95;

/// Default raster size for report charts
pub const CHART_SIZE: (u32, u32) = (1000, 600);

/// One page of the report
#[derive(Debug, Clone)]
pub struct ReportSection {
    pub title: String,
    pub image: RasterImage,
    pub summary: String,
}

/// A rendered report, ready to be written out
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub title: String,
    pub generated_at: DateTime<Local>,
    pub sections: Vec<ReportSection>,
}

impl ReportDocument {
    pub fn new(title: impl Into<String>) -> Self {
        ReportDocument {
            title: title.into(),
            generated_at: Local::now(),
            sections: Vec::new(),
        }
    }

    pub fn push_section(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    /// Lay out every section and serialize the PDF
    pub fn to_pdf_bytes(&self) -> Result<Vec<u8>> {
        if self.sections.is_empty() {
            return Err(Error::Render("report has no sections".to_string()));
        }

        let (doc, first_page, first_layer) =
            PdfDocument::new(&self.title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_err)?;

        for (i, section) in self.sections.iter().enumerate() {
            let layer = if i == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page, layer) =
                    doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), format!("Layer {}", i + 1));
                doc.get_page(page).get_layer(layer)
            };

            let mut cursor = PAGE_HEIGHT - MARGIN;
            if i == 0 {
                cursor -= 8.0;
                layer.use_text(&self.title, 20.0, Mm(MARGIN), Mm(cursor), &bold);
                cursor -= 7.0;
                let stamp = format!("Generated {}", self.generated_at.format("%Y-%m-%d %H:%M"));
                layer.use_text(stamp, 10.0, Mm(MARGIN), Mm(cursor), &regular);
                cursor -= 6.0;
            }

            cursor -= 8.0;
            layer.use_text(&section.title, 15.0, Mm(MARGIN), Mm(cursor), &bold);
            cursor -= 4.0;

            cursor = place_image(&layer, &section.image, cursor)?;
            cursor -= 8.0;

            write_paragraph(&layer, &regular, &section.summary, cursor);
        }

        doc.save_to_bytes().map_err(pdf_err)
    }

    /// Write the PDF to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_pdf_bytes()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)?;
        info!(path = %path.display(), sections = self.sections.len(), bytes = bytes.len(), "Wrote report");
        Ok(())
    }
}

fn pdf_err<E: std::fmt::Display>(err: E) -> Error {
    Error::Render(err.to_string())
}

/// Draw an image scaled to the text width with its top edge at `top` (mm).
/// Returns the y coordinate of the bottom edge.
fn place_image(layer: &PdfLayerReference, image: &RasterImage, top: f32) -> Result<f32> {
    let buffer = RgbImage::from_raw(image.width, image.height, image.rgb.clone()).ok_or_else(|| {
        Error::Render(format!(
            "image buffer does not match {}x{}",
            image.width, image.height
        ))
    })?;
    let dynamic = DynamicImage::ImageRgb8(buffer);

    // Pick the dpi that makes the image exactly IMAGE_WIDTH_MM wide
    let dpi = image.width as f32 * 25.4 / IMAGE_WIDTH_MM;
    let height_mm = image.height as f32 * 25.4 / dpi;
    let bottom = top - height_mm;

    Image::from_dynamic_image(&dynamic).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(MARGIN)),
            translate_y: Some(Mm(bottom)),
            dpi: Some(dpi),
            ..Default::default()
        },
    );
    Ok(bottom)
}

fn write_paragraph(layer: &PdfLayerReference, font: &IndirectFontRef, text: &str, top: f32) {
    let mut y = top;
    for line in wrap_text(text, WRAP_COLUMNS) {
        if y < MARGIN {
            break;
        }
        layer.use_text(line, SUMMARY_FONT_SIZE, Mm(MARGIN), Mm(y), font);
        y -= LINE_HEIGHT_MM;
    }
}

/// Greedy word wrap. Words longer than `width` get a line of their own.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }
    lines
}

/// Collects charts and summaries, rasterizing each chart into a section
#[derive(Debug)]
pub struct ReportBuilder {
    title: String,
    size: (u32, u32),
    entries: Vec<(ChartSpec, String)>,
}

impl ReportBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        ReportBuilder {
            title: title.into(),
            size: CHART_SIZE,
            entries: Vec::new(),
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn chart_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn section(&mut self, chart: ChartSpec, summary: impl Into<String>) -> &mut Self {
        self.entries.push((chart, summary.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rasterize all charts. The first failure aborts the report.
    pub fn build(&self) -> Result<ReportDocument> {
        let mut document = ReportDocument::new(&self.title);
        for (chart, summary) in &self.entries {
            let image = rasterize(chart, self.size.0, self.size.1)?;
            document.push_section(ReportSection {
                title: chart.title().to_string(),
                image,
                summary: summary.clone(),
            });
        }
        Ok(document)
    }
}
