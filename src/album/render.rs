use image::{imageops, DynamicImage, Pixel, Rgba, RgbaImage};

use super::layout::CellPlacement;

/// Canvas-style drop shadow. `blur` follows the canvas convention where the
/// Gaussian sigma is half the blur length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropShadow {
    pub blur: f32,
    pub offset_x: i64,
    pub offset_y: i64,
    pub color: Rgba<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Border {
    pub width: u32,
    pub color: Rgba<u8>,
}

/// Drawing state for a single cell. Each cell gets its own copy, so nothing
/// set for one image carries into the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellStyle {
    pub shadow: DropShadow,
    pub border: Border,
}

impl Default for CellStyle {
    fn default() -> Self {
        Self {
            shadow: DropShadow {
                blur: 40.0,
                offset_x: 10,
                offset_y: 10,
                color: Rgba([0, 0, 0, 128]),
            },
            border: Border {
                width: 5,
                color: Rgba([255, 255, 255, 77]),
            },
        }
    }
}

/// Blur scale for shadows keeps the reduced sigma near this value.
const TARGET_REDUCED_SIGMA: f32 = 4.0;

/// Draws one cell, rasterizing only the part that can land on the page.
///
/// Cells starting below the page are skipped. A cell running past the bottom
/// is cut just far enough below the edge that its shadow still reaches it.
pub(super) fn draw_cell(
    page: &mut RgbaImage,
    image: &DynamicImage,
    cell: &CellPlacement,
    style: CellStyle,
) {
    let page_height = f64::from(page.height());
    if cell.y >= page_height || cell.height <= 0.0 || image.height() == 0 {
        return;
    }

    let margin = shadow_margin(&style.shadow);
    let visible = (page_height - cell.y + f64::from(margin)).min(cell.height);
    let width = (cell.width.round() as u32).max(1);
    let height = (visible.round() as u32).max(1);
    let x = cell.x.round() as i64;
    let y = cell.y.round() as i64;

    draw_shadow(page, x, y, width, height, &style.shadow);
    let scaled = visible_slice(image, visible / cell.height)
        .resize_exact(width, height, imageops::FilterType::CatmullRom)
        .to_rgba8();
    imageops::overlay(page, &scaled, x, y);
    draw_border(page, x, y, width, height, &style.border);
}

/// Top `fraction` of the source image, at least one row tall.
fn visible_slice(image: &DynamicImage, fraction: f64) -> DynamicImage {
    if fraction >= 1.0 {
        return image.clone();
    }
    let rows = (f64::from(image.height()) * fraction).ceil() as u32;
    image.crop_imm(0, 0, image.width(), rows.clamp(1, image.height()))
}

fn shadow_margin(shadow: &DropShadow) -> u32 {
    (shadow.blur / 2.0 * 3.0).ceil() as u32
}

fn draw_shadow(page: &mut RgbaImage, x: i64, y: i64, width: u32, height: u32, shadow: &DropShadow) {
    let sigma = shadow.blur / 2.0;
    let margin = shadow_margin(shadow);
    let layer_width = width.saturating_add(margin.saturating_mul(2));
    let layer_height = height.saturating_add(margin.saturating_mul(2));
    let mut layer = RgbaImage::new(layer_width, layer_height);
    for py in margin..margin.saturating_add(height).min(layer_height) {
        for px in margin..margin.saturating_add(width).min(layer_width) {
            layer.put_pixel(px, py, shadow.color);
        }
    }

    let blurred = if sigma > 0.0 {
        blur_shadow_layer(&layer, sigma)
    } else {
        layer
    };
    imageops::overlay(
        page,
        &blurred,
        x - i64::from(margin) + shadow.offset_x,
        y - i64::from(margin) + shadow.offset_y,
    );
}

fn draw_border(page: &mut RgbaImage, x: i64, y: i64, width: u32, height: u32, border: &Border) {
    if border.width == 0 {
        return;
    }
    let page_width = i64::from(page.width());
    let page_height = i64::from(page.height());
    let band = i64::from(border.width.min(width / 2).min(height / 2).max(1));
    let (width, height) = (i64::from(width), i64::from(height));

    for dy in 0..height {
        let py = y + dy;
        if py < 0 || py >= page_height {
            continue;
        }
        let on_horizontal_band = dy < band || dy >= height - band;
        for dx in 0..width {
            if !on_horizontal_band && dx >= band && dx < width - band {
                continue;
            }
            let px = x + dx;
            if px < 0 || px >= page_width {
                continue;
            }
            page.get_pixel_mut(px as u32, py as u32).blend(&border.color);
        }
    }
}

/// A shadow layer is a flat rectangle, so its blur can run on a reduced copy
/// without visible loss. The factor never shrinks the short side below 8 px.
fn shadow_downsample_factor(width: u32, height: u32, sigma: f32) -> u32 {
    let by_sigma = (sigma / TARGET_REDUCED_SIGMA).floor().max(1.0) as u32;
    let by_size = (width.min(height) / 8).max(1);
    by_sigma.min(by_size)
}

fn blur_shadow_layer(layer: &RgbaImage, sigma: f32) -> RgbaImage {
    let (width, height) = layer.dimensions();
    let factor = shadow_downsample_factor(width, height, sigma);
    if factor <= 1 {
        return imageops::blur(layer, sigma);
    }

    let reduced = imageops::resize(
        layer,
        (width / factor).max(1),
        (height / factor).max(1),
        imageops::FilterType::Triangle,
    );
    let blurred = imageops::blur(&reduced, sigma / factor as f32);
    imageops::resize(&blurred, width, height, imageops::FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dark_page(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([18, 18, 18, 255]))
    }

    #[test]
    fn shadow_downsample_factor_follows_sigma_and_size() {
        assert_eq!(shadow_downsample_factor(1240, 1800, 20.0), 5);
        assert_eq!(shadow_downsample_factor(300, 300, 3.0), 1);
        assert_eq!(shadow_downsample_factor(16, 400, 20.0), 2);
        assert_eq!(shadow_downsample_factor(4, 4, 20.0), 1);
    }

    #[test]
    fn shadow_blur_preserves_layer_size() {
        let layer = RgbaImage::from_pixel(600, 500, Rgba([0, 0, 0, 128]));
        let blurred = blur_shadow_layer(&layer, 20.0);
        assert_eq!(blurred.dimensions(), (600, 500));
    }

    #[test]
    fn draw_cell_paints_image_inside_border() {
        let mut page = dark_page(200, 200);
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([200, 0, 0, 255])));
        let cell = CellPlacement {
            index: 0,
            row: 0,
            column: 0,
            x: 40.0,
            y: 40.0,
            width: 100.0,
            height: 100.0,
        };
        draw_cell(&mut page, &image, &cell, CellStyle::default());

        let center = page.get_pixel(90, 90).0;
        assert!(center[0] >= 198 && center[1] == 0 && center[3] == 255);

        // Border lightens the edge of the image.
        let edge = page.get_pixel(41, 90).0;
        assert!(edge[1] > 0 && edge[0] > center[0]);
    }

    #[test]
    fn shadow_darkens_below_right_and_leaves_far_corner() {
        let mut page = RgbaImage::from_pixel(300, 300, Rgba([255, 255, 255, 255]));
        let shadow = CellStyle::default().shadow;
        draw_shadow(&mut page, 50, 50, 100, 100, &shadow);

        // Just past the bottom-right corner, inside the offset shadow.
        assert!(page.get_pixel(155, 155).0[0] < 255);
        assert_eq!(page.get_pixel(299, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn cell_below_page_is_skipped() {
        let mut page = dark_page(100, 100);
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([200, 0, 0, 255])));
        let cell = CellPlacement {
            index: 0,
            row: 0,
            column: 0,
            x: 10.0,
            y: 100.0,
            width: 50.0,
            height: 50.0,
        };
        draw_cell(&mut page, &image, &cell, CellStyle::default());
        assert!(page.pixels().all(|pixel| pixel.0 == [18, 18, 18, 255]));
    }

    #[test]
    fn tall_cell_is_cut_near_page_bottom() {
        let mut page = dark_page(200, 200);
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 4, Rgba([200, 0, 0, 255])));
        let cell = CellPlacement {
            index: 0,
            row: 0,
            column: 0,
            x: 20.0,
            y: 20.0,
            width: 100.0,
            height: f64::from(u32::MAX) * 4.0,
        };
        draw_cell(&mut page, &image, &cell, CellStyle::default());

        let bottom = page.get_pixel(70, 199).0;
        assert!(bottom[0] >= 198 && bottom[1] == 0, "{bottom:?}");
    }

    #[test]
    fn visible_slice_keeps_at_least_one_row() {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(3, 100_000));
        assert_eq!(visible_slice(&image, 1e-9).height(), 1);
        assert_eq!(visible_slice(&image, 0.5).height(), 50_000);
        assert_eq!(visible_slice(&image, 2.0).height(), 100_000);
    }

    #[test]
    fn border_is_clipped_to_page() {
        let mut page = dark_page(50, 50);
        let border = CellStyle::default().border;
        draw_border(&mut page, -10, -10, 100, 100, &border);
        assert_eq!(page.dimensions(), (50, 50));
    }
}
