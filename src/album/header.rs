use std::sync::{Arc, OnceLock};

use image::{imageops, Rgba, RgbaImage};

use super::layout::{HEADER_MARGIN, PAGE_WIDTH};
use super::{AlbumError, AlbumResult};

const TITLE_BASELINE: f64 = 190.0;
const SUBTITLE_BASELINE: f64 = 280.0;
const TITLE_FONT_SIZE: u32 = 120;
const SUBTITLE_FONT_SIZE: u32 = 48;

static FONT_DB: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();

fn system_fontdb() -> Arc<usvg::fontdb::Database> {
    FONT_DB
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            tracing::debug!(faces = db.len(), "loaded system fonts for album header");
            Arc::new(db)
        })
        .clone()
}

pub(super) fn header_svg(title: &str, subtitle: &str) -> String {
    let width = PAGE_WIDTH;
    let height = HEADER_MARGIN as u32;
    let center = f64::from(width) / 2.0;
    format!(
        concat!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"##,
            r##"<text x="{cx}" y="{ty}" text-anchor="middle" font-family="Georgia, serif" "##,
            r##"font-size="{ts}" font-weight="bold" fill="#f5f5f5">{title}</text>"##,
            r##"<text x="{cx}" y="{sy}" text-anchor="middle" font-family="Helvetica, Arial, sans-serif" "##,
            r##"font-size="{ss}" letter-spacing="6" fill="#a8a8a8">{subtitle}</text>"##,
            "</svg>"
        ),
        w = width,
        h = height,
        cx = center,
        ty = TITLE_BASELINE,
        ts = TITLE_FONT_SIZE,
        sy = SUBTITLE_BASELINE,
        ss = SUBTITLE_FONT_SIZE,
        title = escape_xml(title),
        subtitle = escape_xml(subtitle),
    )
}

/// Rasterizes the title band and draws it over the top of the page.
pub(super) fn draw_header(page: &mut RgbaImage, title: &str, subtitle: &str) -> AlbumResult<()> {
    let svg = header_svg(title, subtitle);
    let opts = usvg::Options {
        fontdb: system_fontdb(),
        ..Default::default()
    };
    let tree = usvg::Tree::from_data(svg.as_bytes(), &opts).map_err(|err| AlbumError::Header {
        message: err.to_string(),
    })?;

    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height()).ok_or_else(|| {
        AlbumError::Header {
            message: "failed to allocate header pixmap".to_string(),
        }
    })?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::identity(),
        &mut pixmap.as_mut(),
    );

    let mut layer = RgbaImage::new(size.width(), size.height());
    for (pixel, source) in layer.pixels_mut().zip(pixmap.pixels()) {
        let color = source.demultiply();
        *pixel = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
    }
    imageops::overlay(page, &layer, 0, 0);
    Ok(())
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_svg_centers_both_lines() {
        let svg = header_svg("Mi Álbum", "Probador virtual");
        assert_eq!(svg.matches(r#"text-anchor="middle""#).count(), 2);
        assert!(svg.contains(r#"x="1240""#));
        assert!(svg.contains(r#"height="350""#));
        assert!(svg.contains(">Mi Álbum</text>"));
    }

    #[test]
    fn header_svg_escapes_markup() {
        let svg = header_svg("Looks <&> \"2026\"", "it's");
        assert!(svg.contains("Looks &lt;&amp;&gt; &quot;2026&quot;"));
        assert!(svg.contains("it&apos;s"));
    }

    #[test]
    fn draw_header_keeps_page_size() {
        let mut page = RgbaImage::from_pixel(PAGE_WIDTH, 400, Rgba([18, 18, 18, 255]));
        draw_header(&mut page, "Title", "Subtitle").expect("header svg should render");
        assert_eq!(page.dimensions(), (PAGE_WIDTH, 400));
        // Nothing is drawn below the header band.
        assert_eq!(page.get_pixel(10, 390).0, [18, 18, 18, 255]);
    }
}
