//! printpdf backend for the drawing canvas.

use ::image::{Rgb as PixelRgb, RgbImage, Rgba};
use printpdf::*;
use std::io::{BufWriter, Cursor};

use crate::canvas::{aligned_x, Canvas, FontWeight, TextAlign, TextStyle};
use crate::error::AppError;
use crate::metrics::{self, PT_TO_MM};
use crate::model::ImageAsset;

/// A4 dimensions in mm
pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;

const LAYER_NAME: &str = "Layer 1";

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Canvas writing into a printpdf document.
///
/// printpdf measures from the bottom-left corner in its own units, so every
/// call flips the y axis here and nowhere else.
pub struct PdfCanvas {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    fonts: Fonts,
    width: f32,
    height: f32,
    style: TextStyle,
    line_width: f32,
}

impl PdfCanvas {
    pub fn new(title: &str, width_mm: f32, height_mm: f32) -> Result<Self, AppError> {
        let (doc, page1, layer1) =
            PdfDocument::new(title, Mm(width_mm), Mm(height_mm), LAYER_NAME);
        let layer = doc.get_page(page1).get_layer(layer1);

        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| AppError::PdfError(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| AppError::PdfError(e.to_string()))?;

        let mut canvas = Self {
            doc,
            layer,
            fonts: Fonts { regular, bold },
            width: width_mm,
            height: height_mm,
            style: TextStyle::default(),
            line_width: 0.2,
        };
        canvas.apply_graphics_state();
        Ok(canvas)
    }

    /// Serialize the finished document.
    pub fn into_bytes(self) -> Result<Vec<u8>, AppError> {
        let mut buf = Vec::new();
        {
            let mut writer = BufWriter::new(Cursor::new(&mut buf));
            self.doc
                .save(&mut writer)
                .map_err(|e| AppError::PdfError(e.to_string()))?;
        }
        Ok(buf)
    }

    // A fresh layer starts with default graphics state.
    fn apply_graphics_state(&mut self) {
        self.layer
            .set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        self.layer.set_outline_thickness(self.line_width / PT_TO_MM);
        self.apply_fill_color();
    }

    fn apply_fill_color(&mut self) {
        let (r, g, b) = self.style.color;
        self.layer.set_fill_color(Color::Rgb(Rgb::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            None,
        )));
    }

    fn font(&self) -> &IndirectFontRef {
        match self.style.weight {
            FontWeight::Normal => &self.fonts.regular,
            FontWeight::Bold => &self.fonts.bold,
        }
    }

    fn flip(&self, y: f32) -> f32 {
        self.height - y
    }

    fn add_polyline(&self, points: &[(f32, f32)], is_closed: bool) {
        let points = points
            .iter()
            .map(|&(x, y)| (Point::new(Mm(x), Mm(self.flip(y))), false))
            .collect();
        self.layer.add_line(Line { points, is_closed });
    }
}

impl Canvas for PdfCanvas {
    fn page_width(&self) -> f32 {
        self.width
    }

    fn page_height(&self) -> f32 {
        self.height
    }

    fn set_line_width(&mut self, width_mm: f32) {
        self.line_width = width_mm;
        self.layer.set_outline_thickness(width_mm / PT_TO_MM);
    }

    fn set_font(&mut self, weight: FontWeight) {
        self.style.weight = weight;
    }

    fn set_font_size(&mut self, size_pt: f32) {
        self.style.size = size_pt;
    }

    fn set_text_color(&mut self, r: u8, g: u8, b: u8) {
        self.style.color = (r, g, b);
        self.apply_fill_color();
    }

    fn text_style(&self) -> TextStyle {
        self.style
    }

    fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.add_polyline(
            &[
                (x, y),
                (x + width, y),
                (x + width, y + height),
                (x, y + height),
            ],
            true,
        );
    }

    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.add_polyline(&[(x1, y1), (x2, y2)], false);
    }

    fn text(&mut self, text: &str, x: f32, y: f32, align: TextAlign) {
        if text.is_empty() {
            return;
        }
        let width = metrics::string_width(text, self.style.weight, self.style.size);
        let x = aligned_x(x, width, align);
        self.layer.use_text(
            text,
            self.style.size,
            Mm(x),
            Mm(self.flip(y)),
            self.font(),
        );
    }

    fn image(
        &mut self,
        image: &ImageAsset,
        x: f32,
        y: f32,
        width: f32,
        _height: f32,
    ) -> Result<(), AppError> {
        if width <= 0.0 {
            return Err(AppError::ImageError(format!(
                "{}: non-positive target width",
                image.name()
            )));
        }

        // Convert to RGBA first to handle transparency
        let rgba_image = image.image().to_rgba8();
        let (width_px, height_px) = rgba_image.dimensions();

        // Composite against white background
        let mut rgb_image = RgbImage::new(width_px, height_px);
        for (px, py, pixel) in rgba_image.enumerate_pixels() {
            let Rgba([r, g, b, a]) = *pixel;
            let alpha = a as f32 / 255.0;
            let blend = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)) as u8;
            rgb_image.put_pixel(px, py, PixelRgb([blend(r), blend(g), blend(b)]));
        }

        let xobject = Image::from(ImageXObject {
            width: Px(width_px as usize),
            height: Px(height_px as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: rgb_image.into_raw(),
            image_filter: None,
            clipping_bbox: None,
            smask: None,
        });

        // Aspect ratio is preserved by the caller, so one DPI fixes both axes.
        let dpi = (width_px as f32) / (width / 25.4);
        let rendered_height = height_px as f32 / dpi * 25.4;

        xobject.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(x)),
                translate_y: Some(Mm(self.flip(y + rendered_height))),
                dpi: Some(dpi),
                ..Default::default()
            },
        );

        Ok(())
    }

    fn add_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(self.width), Mm(self.height), LAYER_NAME);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.apply_graphics_state();
    }
}
