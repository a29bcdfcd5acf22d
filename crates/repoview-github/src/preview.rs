use anyhow::{Context, Result};
use chrono::DateTime;

/// Everything the preview panel needs to show one file.
#[derive(Debug, Clone)]
pub struct PreviewData {
    /// Display name (last path segment).
    pub name: String,
    /// Full repository path.
    pub path: String,
    /// Raw-content URL the bytes were fetched from.
    pub raw_url: String,
    /// From the `content-length` header, when present.
    pub size_bytes: Option<u64>,
    /// Formatted `last-modified` header, when present and parseable.
    pub last_modified: Option<String>,
    pub content: PreviewContent,
}

/// The rendering path a raw-content response takes, decided by the
/// response `content-type`.
#[derive(Debug, Clone)]
pub enum PreviewContent {
    Text {
        text: String,
        /// Newline-split line count.
        lines: usize,
    },
    Image {
        width: u32,
        height: u32,
        /// Scaled-up percentage for small images, always >= 100 when set.
        zoom: Option<u32>,
    },
}

impl PreviewContent {
    pub fn type_label(&self) -> &'static str {
        match self {
            PreviewContent::Text { .. } => "Text File",
            PreviewContent::Image { .. } => "Image",
        }
    }
}

/// Decide the rendering path for a raw-content response. Image bodies are
/// decoded to obtain pixel dimensions; anything else is treated as text
/// (lossy UTF-8).
pub fn classify_content(content_type: Option<&str>, bytes: &[u8]) -> Result<PreviewContent> {
    if content_type.is_some_and(|ct| ct.contains("image")) {
        let img = image::load_from_memory(bytes).context("Failed to decode image")?;
        let (width, height) = (img.width(), img.height());
        return Ok(PreviewContent::Image {
            width,
            height,
            zoom: zoom_for(width, height),
        });
    }

    let text = String::from_utf8_lossy(bytes).into_owned();
    let lines = text.split('\n').count();
    Ok(PreviewContent::Text { text, lines })
}

/// Zoom percentage for images under 100 px in either dimension: the image
/// is displayed scaled up to roughly 200 px, and the annotation reports
/// `round(max(200/w, 200/h) * 100)`.
pub fn zoom_for(width: u32, height: u32) -> Option<u32> {
    if width == 0 || height == 0 {
        return None;
    }
    if width < 100 || height < 100 {
        let scale_x = 200.0 / width as f64;
        let scale_y = 200.0 / height as f64;
        let scale = scale_x.max(scale_y);
        return Some((scale * 100.0).round() as u32);
    }
    None
}

/// Human-readable size: bytes up to 1024, two-decimal KB above.
pub fn format_size(bytes: u64) -> String {
    if bytes > 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Format an RFC 2822 `last-modified` header value for display.
/// Returns None when the header does not parse.
pub fn format_last_modified(header: &str) -> Option<String> {
    DateTime::parse_from_rfc2822(header)
        .ok()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_only_for_small_images() {
        assert_eq!(zoom_for(100, 100), None);
        assert_eq!(zoom_for(800, 600), None);
        // 50x50 -> scale 4.0 -> 400%
        assert_eq!(zoom_for(50, 50), Some(400));
        // 40x200 -> max(5.0, 1.0) -> 500%
        assert_eq!(zoom_for(40, 200), Some(500));
        // 99x4000 -> the small dimension drives the scale
        assert_eq!(zoom_for(99, 4000), Some(202));
    }

    #[test]
    fn test_zoom_is_at_least_100_percent() {
        for (w, h) in [(99, 99), (1, 1), (99, 5000), (5000, 99)] {
            let zoom = zoom_for(w, h).unwrap();
            assert!(zoom >= 100, "zoom {zoom}% for {w}x{h}");
        }
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 bytes");
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(1024), "1024 bytes");
        assert_eq!(format_size(1536), "1.50 KB");
    }

    #[test]
    fn test_format_last_modified() {
        assert_eq!(
            format_last_modified("Wed, 21 Oct 2015 07:28:00 GMT").as_deref(),
            Some("2015-10-21 07:28:00")
        );
        assert_eq!(format_last_modified("not a date"), None);
    }

    #[test]
    fn test_classify_text() {
        let content = classify_content(Some("text/plain; charset=utf-8"), b"one\ntwo\nthree").unwrap();
        let PreviewContent::Text { text, lines } = content else {
            panic!("expected text");
        };
        assert_eq!(text, "one\ntwo\nthree");
        assert_eq!(lines, 3);
    }

    #[test]
    fn test_text_line_count_matches_newline_split() {
        let PreviewContent::Text { lines, .. } =
            classify_content(None, b"one\ntwo\n").unwrap()
        else {
            panic!("expected text");
        };
        // Trailing newline yields an empty final segment.
        assert_eq!(lines, 3);

        let PreviewContent::Text { lines, .. } = classify_content(None, b"").unwrap() else {
            panic!("expected text");
        };
        assert_eq!(lines, 1);
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::new_rgba8(width, height);
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_classify_small_png_gets_zoom_annotation() {
        let bytes = png_bytes(40, 50);
        let content = classify_content(Some("image/png"), &bytes).unwrap();
        let PreviewContent::Image {
            width,
            height,
            zoom,
        } = content
        else {
            panic!("expected image");
        };
        assert_eq!((width, height), (40, 50));
        // max(200/40, 200/50) = 5.0
        assert_eq!(zoom, Some(500));
    }

    #[test]
    fn test_classify_large_png_has_no_zoom() {
        let bytes = png_bytes(120, 150);
        let PreviewContent::Image { zoom, .. } =
            classify_content(Some("image/png"), &bytes).unwrap()
        else {
            panic!("expected image");
        };
        assert_eq!(zoom, None);
    }

    #[test]
    fn test_classify_bad_image_bytes_is_an_error() {
        assert!(classify_content(Some("image/png"), b"definitely not a png").is_err());
    }
}
