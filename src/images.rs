//! Scaling and placement of screenshots in the page flow.

use crate::canvas::Canvas;
use crate::error::AppError;
use crate::model::ImageAsset;
use crate::pagination::Paginator;

/// Screen pixels (96 dpi) to millimetres
pub const PX_TO_MM: f32 = 25.4 / 96.0;

/// Absolute ceiling on a placed image's height, in mm
const MAX_IMAGE_HEIGHT_MM: f32 = 160.0;
/// Share of the usable page height an image may take
const MAX_IMAGE_PAGE_FRACTION: f32 = 0.8;

/// Space left below each placed image
pub const IMAGE_GAP_MM: f32 = 5.0;

/// Final size and horizontal position of an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub width: f32,
    pub height: f32,
}

/// Tallest an image may be drawn on a page with `usable_height` mm of content area.
pub fn height_cap(usable_height: f32) -> f32 {
    (usable_height * MAX_IMAGE_PAGE_FRACTION).min(MAX_IMAGE_HEIGHT_MM)
}

/// Size an image of the given pixel dimensions for the content column.
///
/// Images shrink to the content width first, then to `max_height`; both
/// steps scale the two axes together. Images never grow.
pub fn fit_image(
    width_px: u32,
    height_px: u32,
    content_x: f32,
    content_width: f32,
    max_height: f32,
) -> Placement {
    let mut width = width_px as f32 * PX_TO_MM;
    let mut height = height_px as f32 * PX_TO_MM;

    if width > content_width {
        let scale = content_width / width;
        width = content_width;
        height *= scale;
    }

    if height > max_height {
        let scale = max_height / height;
        height = max_height;
        width *= scale;
    }

    let x = if width < content_width {
        content_x + (content_width - width) / 2.0
    } else {
        content_x
    };

    Placement { x, width, height }
}

/// Place `images` one after another, breaking pages as needed.
///
/// Order is preserved and no image is skipped; an embed failure aborts the
/// whole layout.
pub fn place_images<C: Canvas>(
    pg: &mut Paginator<'_, C>,
    images: &[ImageAsset],
    content_x: f32,
    content_width: f32,
    max_height: f32,
) -> Result<usize, AppError> {
    for image in images {
        let placement = fit_image(
            image.width_px(),
            image.height_px(),
            content_x,
            content_width,
            max_height,
        );

        pg.ensure_fits(placement.height);
        let y = pg.y();
        pg.canvas()
            .image(image, placement.x, y, placement.width, placement.height)?;
        pg.advance(placement.height + IMAGE_GAP_MM);

        log::debug!(
            "Placed {} at ({:.1}, {:.1}) size {:.1}x{:.1}mm",
            image.name(),
            placement.x,
            y,
            placement.width,
            placement.height
        );
    }
    Ok(images.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DrawOp, RecordingCanvas};
    use crate::chrome::Footer;
    use crate::pagination::LayoutCursor;
    use ::image::DynamicImage;

    const CONTENT_X: f32 = 15.0;
    const CONTENT_WIDTH: f32 = 180.0;

    #[test]
    fn test_height_cap() {
        assert_eq!(height_cap(257.0), 160.0);
        assert_eq!(height_cap(100.0), 80.0);
    }

    #[test]
    fn test_small_image_is_centered_at_natural_size() {
        let p = fit_image(378, 189, CONTENT_X, CONTENT_WIDTH, 160.0);
        assert!((p.width - 378.0 * PX_TO_MM).abs() < 1e-3);
        assert!((p.height - 189.0 * PX_TO_MM).abs() < 1e-3);
        assert!((p.x - (CONTENT_X + (CONTENT_WIDTH - p.width) / 2.0)).abs() < 1e-4);
    }

    #[test]
    fn test_wide_image_fits_width() {
        let p = fit_image(1920, 480, CONTENT_X, CONTENT_WIDTH, 160.0);
        assert_eq!(p.width, CONTENT_WIDTH);
        assert_eq!(p.x, CONTENT_X);
        assert!((p.width / p.height - 4.0).abs() < 1e-3);
    }

    #[test]
    fn test_oversized_image_fits_both_limits() {
        let p = fit_image(2400, 3200, CONTENT_X, CONTENT_WIDTH, 160.0);
        assert!(p.width <= CONTENT_WIDTH);
        assert!(p.height <= 160.0 + 1e-4);
        assert!((p.width / p.height - 0.75).abs() < 1e-3);
        assert!(p.x > CONTENT_X);
    }

    #[test]
    fn test_images_paginate_in_order() {
        let mut canvas = RecordingCanvas::new(210.0, 297.0);
        let footer = Footer {
            identifier: String::new(),
            label: "Lab Record".to_string(),
            timestamp: String::new(),
            credit: Vec::new(),
        };
        let images: Vec<ImageAsset> = (0..3)
            .map(|i| ImageAsset::new(format!("shot{}.png", i), DynamicImage::new_rgb8(800, 600)).unwrap())
            .collect();

        let summary = {
            let mut pg = Paginator::begin(&mut canvas, footer, LayoutCursor::new(20.0, 20.0, 277.0));
            let placed = place_images(&mut pg, &images, CONTENT_X, CONTENT_WIDTH, 160.0).unwrap();
            assert_eq!(placed, 3);
            pg.finish()
        };

        let drawn: Vec<(usize, String, f32)> = canvas
            .ops()
            .iter()
            .filter_map(|r| match &r.op {
                DrawOp::Image { name, y, .. } => Some((r.page, name.clone(), *y)),
                _ => None,
            })
            .collect();

        // 800x600px is 180x135mm after fitting, so one image per page
        assert_eq!(summary.pages, 3);
        assert_eq!(drawn.len(), 3);
        for (i, (page, name, y)) in drawn.iter().enumerate() {
            assert_eq!(*page, i + 1);
            assert_eq!(name, &format!("shot{}.png", i));
            assert_eq!(*y, 20.0);
        }
    }

    #[test]
    fn test_embed_failure_aborts() {
        let mut canvas = RecordingCanvas::new(210.0, 297.0).with_failing_images();
        let footer = Footer {
            identifier: String::new(),
            label: String::new(),
            timestamp: String::new(),
            credit: Vec::new(),
        };
        let images = vec![ImageAsset::new("a.png", DynamicImage::new_rgb8(10, 10)).unwrap()];
        let mut pg = Paginator::begin(&mut canvas, footer, LayoutCursor::new(20.0, 20.0, 277.0));
        assert!(place_images(&mut pg, &images, CONTENT_X, CONTENT_WIDTH, 160.0).is_err());
    }
}
