//! Saved looks and the printable album page they compose into.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use thiserror::Error;

mod header;
pub mod layout;
pub mod render;

pub use layout::{AlbumLayout, CellPlacement};
pub use render::{Border, CellStyle, DropShadow};

use crate::image_ref::{ImageRef, ImageRefError};

pub const JPEG_QUALITY: u8 = 92;
pub const DEFAULT_TITLE: &str = "Mi Álbum Virtual";
pub const DEFAULT_SUBTITLE: &str = "PROBADOR VIRTUAL";
const BACKGROUND: Rgba<u8> = Rgba([18, 18, 18, 255]);

#[derive(Debug, Error)]
pub enum AlbumError {
    #[error("album has no images to compose")]
    Empty,
    #[error("failed to decode album image {index}: {source}")]
    Decode {
        index: usize,
        #[source]
        source: ImageRefError,
    },
    #[error("image loader for album image {index} panicked")]
    LoaderPanicked { index: usize },
    #[error("failed to render album header: {message}")]
    Header { message: String },
    #[error("failed to encode album page: {message}")]
    Encode { message: String },
}

pub type AlbumResult<T> = std::result::Result<T, AlbumError>;

/// Ordered collection of saved looks. Grows by appending; never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Album {
    images: Vec<ImageRef>,
}

impl Album {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub(crate) fn push(&mut self, image: ImageRef) {
        self.images.push(image);
    }

    /// Swaps in a whole new collection.
    pub fn replace(&mut self, images: Vec<ImageRef>) {
        self.images = images;
    }

    pub fn compose(&self, style: &AlbumStyle) -> AlbumResult<ImageRef> {
        compose(&self.images, style)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumStyle {
    pub title: String,
    pub subtitle: String,
}

impl Default for AlbumStyle {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            subtitle: DEFAULT_SUBTITLE.to_string(),
        }
    }
}

/// Lays the images out on one A4 portrait page and encodes it as JPEG.
///
/// Any image that fails to decode aborts the page.
pub fn compose(images: &[ImageRef], style: &AlbumStyle) -> AlbumResult<ImageRef> {
    if images.is_empty() {
        return Err(AlbumError::Empty);
    }

    let decoded = decode_all(images)?;
    let sizes = decoded
        .iter()
        .map(|image| (image.width(), image.height()))
        .collect::<Vec<_>>();
    let layout = AlbumLayout::compute(&sizes);
    if layout.content_bottom() > f64::from(layout::PAGE_HEIGHT) {
        tracing::warn!(
            images = images.len(),
            bottom = layout.content_bottom(),
            "album content runs past the page and will be clipped"
        );
    }

    let mut page = RgbaImage::from_pixel(layout::PAGE_WIDTH, layout::PAGE_HEIGHT, BACKGROUND);
    header::draw_header(&mut page, &style.title, &style.subtitle)?;
    for (cell, image) in layout.cells.iter().zip(&decoded) {
        render::draw_cell(&mut page, image, cell, CellStyle::default());
    }

    let bytes = encode_jpeg(page, JPEG_QUALITY)?;
    tracing::info!(
        images = images.len(),
        rows = layout.rows,
        bytes = bytes.len(),
        "album page composed"
    );
    Ok(ImageRef::from_bytes("image/jpeg", &bytes))
}

/// Decodes every image on its own thread and waits for all of them.
fn decode_all(images: &[ImageRef]) -> AlbumResult<Vec<DynamicImage>> {
    std::thread::scope(|scope| {
        let handles = images
            .iter()
            .enumerate()
            .map(|(index, image)| {
                (
                    index,
                    scope.spawn(move || {
                        image
                            .decode_image()
                            .map_err(|source| AlbumError::Decode { index, source })
                    }),
                )
            })
            .collect::<Vec<_>>();

        let results = handles
            .into_iter()
            .map(|(index, handle)| {
                handle
                    .join()
                    .unwrap_or(Err(AlbumError::LoaderPanicked { index }))
            })
            .collect::<Vec<_>>();
        results.into_iter().collect()
    })
}

fn encode_jpeg(page: RgbaImage, quality: u8) -> AlbumResult<Vec<u8>> {
    let rgb = DynamicImage::ImageRgba8(page).to_rgb8();
    let mut buf = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buf, quality)
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|err| AlbumError::Encode {
            message: err.to_string(),
        })?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_ref::solid_png;

    #[test]
    fn compose_rejects_empty_album() {
        let err = Album::new()
            .compose(&AlbumStyle::default())
            .expect_err("empty album has nothing to draw");
        assert!(matches!(err, AlbumError::Empty));
    }

    #[test]
    fn compose_produces_a4_jpeg() {
        let images = vec![
            solid_png(40, 60, [200, 40, 40, 255]),
            solid_png(40, 60, [40, 200, 40, 255]),
            solid_png(40, 60, [40, 40, 200, 255]),
        ];
        let page = compose(&images, &AlbumStyle::default()).expect("page should compose");

        assert_eq!(page.mime_type().unwrap(), "image/jpeg");
        let decoded = page.decode_image().expect("page should decode");
        assert_eq!(
            (decoded.width(), decoded.height()),
            (layout::PAGE_WIDTH, layout::PAGE_HEIGHT)
        );

        // Middle of the first cell carries the first image's color.
        let first = decoded.to_rgb8();
        let pixel = first.get_pixel(80 + 560, 430 + 840).0;
        assert!(pixel[0] > 150 && pixel[1] < 100 && pixel[2] < 100, "{pixel:?}");
    }

    #[test]
    fn extreme_aspect_ratio_is_clipped_to_page() {
        let images = vec![
            solid_png(1, 100_000, [200, 40, 40, 255]),
            solid_png(40, 60, [40, 200, 40, 255]),
            solid_png(40, 60, [40, 40, 200, 255]),
        ];
        let page = compose(&images, &AlbumStyle::default()).expect("tall image should clip");
        let decoded = page.decode_image().expect("page should decode").to_rgb8();
        assert_eq!(decoded.dimensions(), (layout::PAGE_WIDTH, layout::PAGE_HEIGHT));

        let bottom = decoded.get_pixel(80 + 560, layout::PAGE_HEIGHT - 1).0;
        assert!(bottom[0] > 150 && bottom[1] < 100, "{bottom:?}");
    }

    #[test]
    fn compose_fails_fast_on_undecodable_image() {
        let images = vec![
            solid_png(4, 4, [0, 0, 0, 255]),
            ImageRef::from_bytes("image/png", b"definitely not a png"),
        ];
        let err = compose(&images, &AlbumStyle::default()).expect_err("bad image should abort");
        assert!(matches!(err, AlbumError::Decode { index: 1, .. }));
    }

    #[test]
    fn album_replace_swaps_whole_collection() {
        let mut album = Album::new();
        album.push(solid_png(1, 1, [0, 0, 0, 255]));
        album.replace(vec![
            solid_png(1, 1, [1, 1, 1, 255]),
            solid_png(1, 1, [2, 2, 2, 255]),
        ]);
        assert_eq!(album.len(), 2);
        assert!(!album.is_empty());
    }
}
