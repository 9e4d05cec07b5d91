use std::{
    path::{Path, PathBuf},
    sync::{Arc, OnceLock},
};

use anyhow::Context as _;
use chrono::NaiveDate;
use image::{Rgb, RgbImage};

use crate::{
    PhotostripError, PhotostripResult,
    blend::over_layer_in_place,
    compose::layout::CAPTION_HEIGHT,
};

pub const DEFAULT_CAPTION_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/liberation/LiberationSerif-Italic.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSerif-Regular.ttf",
];

pub const CAPTION_TITLE: &str = "\"about you...\"";
const CAPTION_FAMILY: &str = "Liberation Serif";

// Fraction of the font size between the top of a line and its baseline.
const ASCENT_RATIO: f32 = 0.8;

// DejaVu Serif, bundled so a caption always has a face to render with.
const BUNDLED_FAMILY: &str = "DejaVu Serif";
const BUNDLED_FACES: [&[u8]; 2] = [
    include_bytes!("../../assets/fonts/DejaVuSerif-Italic.ttf"),
    include_bytes!("../../assets/fonts/DejaVuSerif.ttf"),
];

/// Font database used for caption text, built once and shared between compositions.
///
/// Always holds the bundled serif faces, so captions render even on hosts without fonts.
#[derive(Clone)]
pub struct CaptionFonts {
    db: Arc<usvg::fontdb::Database>,
    named_faces: usize,
}

impl std::fmt::Debug for CaptionFonts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionFonts")
            .field("faces", &self.db.len())
            .field("named_faces", &self.named_faces)
            .finish()
    }
}

impl CaptionFonts {
    /// Loads the named font assets, optionally on top of the system fonts. A named asset that
    /// is missing or unreadable is logged and skipped; text then renders with whatever face
    /// the database can offer, the bundled serif at worst.
    pub fn load<P: AsRef<Path>>(named: &[P], load_system_fonts: bool) -> Self {
        let mut db = bundled_database();
        if load_system_fonts {
            db.load_system_fonts();
        }

        let mut named_faces = 0usize;
        for path in named {
            match load_named_font(&mut db, path.as_ref()) {
                Ok(n) => named_faces += n,
                Err(err) => {
                    tracing::warn!(%err, "falling back to default caption font");
                }
            }
        }

        tracing::debug!(
            faces = db.len(),
            named_faces,
            "caption font database ready"
        );

        Self {
            db: Arc::new(db),
            named_faces,
        }
    }

    /// Only the bundled serif faces. Cheap, and independent of the host.
    pub fn bundled() -> Self {
        Self {
            db: Arc::new(bundled_database()),
            named_faces: 0,
        }
    }

    /// Default assets plus system fonts. Scanning system fonts is slow, so the database is
    /// built on first use and shared by every later call.
    pub fn shared_default() -> &'static CaptionFonts {
        static DEFAULT_FONTS: OnceLock<CaptionFonts> = OnceLock::new();
        DEFAULT_FONTS.get_or_init(|| {
            let named: Vec<PathBuf> = DEFAULT_CAPTION_FONTS.iter().map(PathBuf::from).collect();
            Self::load(named.as_slice(), true)
        })
    }

    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    pub fn has_named_faces(&self) -> bool {
        self.named_faces > 0
    }
}

impl Default for CaptionFonts {
    fn default() -> Self {
        Self::shared_default().clone()
    }
}

fn bundled_database() -> usvg::fontdb::Database {
    let mut db = usvg::fontdb::Database::new();
    for face in BUNDLED_FACES {
        db.load_font_data(face.to_vec());
    }
    db.set_serif_family(BUNDLED_FAMILY);
    db
}

fn load_named_font(db: &mut usvg::fontdb::Database, path: &Path) -> PhotostripResult<usize> {
    let before = db.len();
    db.load_font_file(path).map_err(|e| {
        PhotostripError::asset_unavailable(format!("font '{}': {e}", path.display()))
    })?;
    let added = db.len() - before;
    if added == 0 {
        return Err(PhotostripError::asset_unavailable(format!(
            "font '{}' contains no usable faces",
            path.display()
        )));
    }
    Ok(added)
}

#[derive(Clone, Debug, PartialEq)]
pub struct CaptionLine {
    pub text: String,
    /// Horizontal center, canvas pixels.
    pub center_x: f32,
    /// Top of the line box, canvas pixels.
    pub top_y: f32,
    pub font_size: f32,
    pub italic: bool,
    pub fill: Rgb<u8>,
}

impl CaptionLine {
    pub fn baseline_y(&self) -> f32 {
        self.top_y + self.font_size * ASCENT_RATIO
    }
}

/// Two-line caption for the bottom margin of a strip.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptionLayout {
    pub width: u32,
    pub height: u32,
    pub lines: [CaptionLine; 2],
}

impl CaptionLayout {
    pub fn new(width: u32, height: u32, layout_name: &str, date: NaiveDate) -> Self {
        let center_x = width as f32 / 2.0;
        let bottom = height as f32;
        let title = CaptionLine {
            text: CAPTION_TITLE.to_string(),
            center_x,
            top_y: bottom - 45.0,
            font_size: 16.0,
            italic: true,
            fill: Rgb([100, 100, 100]),
        };
        let footer = CaptionLine {
            text: format!("- {} • {layout_name} -", date.format("%B %d, %Y")),
            center_x,
            top_y: bottom - 20.0,
            font_size: 10.0,
            italic: false,
            fill: Rgb([150, 150, 150]),
        };
        Self {
            width,
            height,
            lines: [title, footer],
        }
    }

    pub fn band_top(&self) -> u32 {
        self.height.saturating_sub(CAPTION_HEIGHT)
    }

    pub fn band_height(&self) -> u32 {
        self.height - self.band_top()
    }

    /// SVG document covering only the caption band.
    pub fn to_svg(&self) -> String {
        let band_top = self.band_top() as f32;
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.band_height()
        );
        for line in &self.lines {
            let [r, g, b] = line.fill.0;
            svg.push_str(&format!(
                r#"<text x="{x}" y="{y}" text-anchor="middle" font-family="'{CAPTION_FAMILY}', serif" font-style="{style}" font-size="{size}" fill="rgb({r},{g},{b})">{text}</text>"#,
                x = line.center_x,
                y = line.baseline_y() - band_top,
                style = if line.italic { "italic" } else { "normal" },
                size = line.font_size,
                text = escape_xml(&line.text),
            ));
        }
        svg.push_str("</svg>");
        svg
    }
}

/// Horizontal extent of one laid-out caption line, canvas pixels. Built from glyph advances,
/// not ink, so it is the box `text-anchor="middle"` centers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineExtent {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl LineExtent {
    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }
}

impl CaptionLayout {
    /// Lays the caption out with `fonts` and reports each rendered line's extent, top to
    /// bottom. Lines no face could shape are absent.
    pub fn measure(&self, fonts: &CaptionFonts) -> PhotostripResult<Vec<LineExtent>> {
        let Some(tree) = self.parse(fonts)? else {
            return Ok(Vec::new());
        };
        let band_top = self.band_top() as f32;
        let mut out = Vec::new();
        for node in tree.root().children() {
            if let usvg::Node::Text(text) = node {
                let bbox = text.abs_bounding_box();
                out.push(LineExtent {
                    left: bbox.left(),
                    right: bbox.right(),
                    top: bbox.top() + band_top,
                    bottom: bbox.bottom() + band_top,
                });
            }
        }
        Ok(out)
    }

    fn parse(&self, fonts: &CaptionFonts) -> PhotostripResult<Option<usvg::Tree>> {
        if self.width == 0 || self.band_height() == 0 {
            return Ok(None);
        }
        let opts = usvg::Options {
            fontdb: fonts.db.clone(),
            font_resolver: make_caption_font_resolver(),
            ..Default::default()
        };
        let svg = self.to_svg();
        let tree = usvg::Tree::from_str(&svg, &opts).context("parse caption svg")?;
        Ok(Some(tree))
    }
}

/// Draws the caption into the bottom band of `canvas`.
pub fn render_caption(
    canvas: &mut RgbImage,
    caption: &CaptionLayout,
    fonts: &CaptionFonts,
) -> PhotostripResult<()> {
    if canvas.dimensions() != (caption.width, caption.height) {
        return Err(PhotostripError::validation(
            "caption layout does not match canvas size",
        ));
    }
    let Some(tree) = caption.parse(fonts)? else {
        return Ok(());
    };
    let band_height = caption.band_height();

    let mut pixmap = resvg::tiny_skia::Pixmap::new(caption.width, band_height)
        .ok_or_else(|| PhotostripError::validation("failed to allocate caption pixmap"))?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::identity(),
        &mut pixmap.as_mut(),
    );

    over_layer_in_place(
        canvas,
        pixmap.data(),
        caption.width,
        band_height,
        0,
        caption.band_top(),
    )
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

fn make_caption_font_resolver() -> usvg::FontResolver<'static> {
    use usvg::FontResolver;

    FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families = Vec::<usvg::fontdb::Family<'_>>::new();
            for family in font.families() {
                families.push(match family {
                    usvg::FontFamily::Serif => usvg::fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => usvg::fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => usvg::fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => usvg::fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => usvg::fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => usvg::fontdb::Family::Name(s),
                });
            }

            families.push(usvg::fontdb::Family::Name(BUNDLED_FAMILY));
            families.push(usvg::fontdb::Family::Serif);
            families.push(usvg::fontdb::Family::SansSerif);
            families.push(usvg::fontdb::Family::Monospace);

            let style = match font.style() {
                usvg::FontStyle::Normal => usvg::fontdb::Style::Normal,
                usvg::FontStyle::Italic => usvg::fontdb::Style::Italic,
                usvg::FontStyle::Oblique => usvg::fontdb::Style::Oblique,
            };

            let query = usvg::fontdb::Query {
                families: &families,
                weight: usvg::fontdb::Weight(font.weight()),
                stretch: usvg::fontdb::Stretch::Normal,
                style,
            };

            if let Some(id) = fontdb.query(&query) {
                return Some(id);
            }
            // Any face beats no caption at all.
            fontdb.faces().next().map(|f| f.id)
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
    }

    #[test]
    fn lines_are_centered_and_anchored_to_bottom() {
        let c = CaptionLayout::new(400, 850, "Classic Duo", date());
        assert_eq!(c.lines[0].text, "\"about you...\"");
        assert_eq!(c.lines[0].center_x, 200.0);
        assert_eq!(c.lines[1].center_x, 200.0);
        assert_eq!(c.lines[0].top_y, 805.0);
        assert_eq!(c.lines[1].top_y, 830.0);
        assert!(c.lines[0].italic);
        assert!(c.lines[1].font_size < c.lines[0].font_size);
    }

    #[test]
    fn footer_has_date_and_layout_name() {
        let c = CaptionLayout::new(400, 850, "Quad Vision", date());
        assert_eq!(c.lines[1].text, "- March 07, 2024 • Quad Vision -");
    }

    #[test]
    fn svg_escapes_layout_name() {
        let c = CaptionLayout::new(400, 850, "<Tom & Jerry>", date());
        let svg = c.to_svg();
        assert!(svg.contains("&lt;Tom &amp; Jerry&gt;"));
        assert!(svg.contains("&quot;about you...&quot;"));
        assert!(!svg.contains("<Tom"));
    }

    #[test]
    fn missing_named_font_is_recovered_with_bundled_faces() {
        let fonts = CaptionFonts::load(&["/nonexistent/NoSuchSerif.ttf"], false);
        assert!(!fonts.has_named_faces());
        assert_eq!(fonts.face_count(), BUNDLED_FACES.len());
    }

    #[test]
    fn missing_named_font_reports_asset_unavailable() {
        let mut db = usvg::fontdb::Database::new();
        let err = load_named_font(&mut db, Path::new("/nonexistent/NoSuchSerif.ttf")).unwrap_err();
        assert!(matches!(err, PhotostripError::AssetUnavailable(_)));
    }

    #[test]
    fn default_fonts_are_loaded_once() {
        let a = CaptionFonts::default();
        let b = CaptionFonts::default();
        assert!(Arc::ptr_eq(&a.db, &b.db));
        assert!(Arc::ptr_eq(&a.db, &CaptionFonts::shared_default().db));
        assert!(a.face_count() >= BUNDLED_FACES.len());
    }

    #[test]
    fn bundled_faces_always_draw_ink() {
        let paper = Rgb([255, 248, 244]);
        let mut canvas = RgbImage::from_pixel(400, 120, paper);
        let c = CaptionLayout::new(400, 120, "Classic Duo", date());
        let fonts = CaptionFonts::load(&["/nonexistent/NoSuchSerif.ttf"], false);
        render_caption(&mut canvas, &c, &fonts).unwrap();

        let ink_rows = |ys: std::ops::Range<u32>| {
            ys.flat_map(|y| (0..400).map(move |x| (x, y)))
                .filter(|&(x, y)| *canvas.get_pixel(x, y) != paper)
                .count()
        };
        assert!(ink_rows(60..100) > 0, "title left no ink");
        assert!(ink_rows(100..120) > 0, "footer left no ink");
    }

    #[test]
    fn measured_lines_are_centered() {
        let c = CaptionLayout::new(400, 850, "Memory Gallery", date());
        let lines = c.measure(&CaptionFonts::bundled()).unwrap();
        assert_eq!(lines.len(), 2);
        for line in &lines {
            assert!((line.center_x() - 200.0).abs() <= 1.0, "{line:?}");
            assert!(line.right > line.left);
        }
        assert!(lines[0].bottom <= lines[1].top + 1.0);
        assert!(lines[1].top >= 790.0);
    }

    #[test]
    fn render_rejects_mismatched_canvas() {
        let mut canvas = RgbImage::new(10, 10);
        let c = CaptionLayout::new(400, 120, "x", date());
        assert!(render_caption(&mut canvas, &c, &CaptionFonts::bundled()).is_err());
    }
}
