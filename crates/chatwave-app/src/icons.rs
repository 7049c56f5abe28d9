//! Window, tray and overlay icons
//!
//! The window and tray icons are drawn procedurally; overlay and notification icons arrive from
//! the page as PNG data URLs.

use base64::Engine as _;

const SIZE: u32 = 32;

/// RGBA pixels of the app glyph: a speech bubble on a blue gradient
fn glyph_rgba(badge: bool) -> Vec<u8> {
    let mut data = Vec::with_capacity((SIZE * SIZE * 4) as usize);
    let center = (SIZE as f32 - 1.0) / 2.0;

    for y in 0..SIZE {
        for x in 0..SIZE {
            let ratio = y as f32 / (SIZE as f32 - 1.0);
            let dx = x as f32 - center;
            let dy = y as f32 - center;
            let in_bubble = dx * dx + dy * dy <= 14.5 * 14.5;
            let in_tail = x < 10 && y > 22 && x + (SIZE - y) > 8;
            let in_wave = (y as f32 - (center + 3.0 * (x as f32 / 4.0).sin())).abs() < 1.6
                && (8..24).contains(&x);
            let in_badge = badge && (x as f32 - 25.0).powi(2) + (y as f32 - 6.0).powi(2) <= 36.0;

            let (r, g, b, a) = if in_badge {
                (235.0, 64.0, 52.0, 255)
            } else if in_wave {
                (255.0, 255.0, 255.0, 255)
            } else if in_bubble || in_tail {
                (0.0 + 40.0 * ratio, 120.0 + 60.0 * ratio, 255.0, 255)
            } else {
                (0.0, 0.0, 0.0, 0)
            };

            data.push(r as u8);
            data.push(g as u8);
            data.push(b as u8);
            data.push(a);
        }
    }
    data
}

pub fn create_window_icon() -> Option<tao::window::Icon> {
    tao::window::Icon::from_rgba(glyph_rgba(false), SIZE, SIZE).ok()
}

/// Tray icon, with a red dot when there are unread messages
pub fn create_tray_icon(unread: bool) -> Option<tray_icon::Icon> {
    tray_icon::Icon::from_rgba(glyph_rgba(unread), SIZE, SIZE).ok()
}

/// Raw bytes of a base64 `data:` URL
pub fn decode_data_url(url: &str) -> Option<Vec<u8>> {
    let rest = url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    if !meta.ends_with(";base64") {
        return None;
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .ok()
}

/// Decoded RGBA image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decode a PNG data URL into RGBA pixels
pub fn decode_png_data_url(url: &str) -> Option<RgbaImage> {
    let bytes = decode_data_url(url)?;
    let image = image::load_from_memory_with_format(&bytes, image::ImageFormat::Png).ok()?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    Some(RgbaImage {
        rgba: rgba.into_raw(),
        width,
        height,
    })
}
