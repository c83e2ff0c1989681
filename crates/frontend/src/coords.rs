//! Coordinate engine: browser glue between client coordinates, the field
//! surface, and the shared relative-coordinate math.

use touchline_shared::geometry;
use touchline_shared::models::RelPoint;
use wasm_bindgen::JsCast;
use web_sys::HtmlCanvasElement;

/// The div the canvas fills. Resize observation targets this element,
/// since the canvas itself always matches it.
pub const FIELD_CONTAINER_ID: &str = "field-canvas-container";

pub const FIELD_CANVAS_ID: &str = "field-canvas";

fn element_by_id(id: &str) -> Option<web_sys::Element> {
    web_sys::window()?.document()?.get_element_by_id(id)
}

/// Bounding client rect of the field container.
pub fn container_rect() -> Option<web_sys::DomRect> {
    Some(element_by_id(FIELD_CONTAINER_ID)?.get_bounding_client_rect())
}

/// The live field canvas element, for read access by the host (e.g.
/// embedding the board into a larger screenshot) and for export sizing.
pub fn field_canvas() -> Option<HtmlCanvasElement> {
    element_by_id(FIELD_CANVAS_ID)?.dyn_into().ok()
}

/// Convert client (viewport) coordinates to container-relative pixels.
pub fn client_to_container(client_x: f64, client_y: f64) -> Option<(f64, f64)> {
    let rect = container_rect()?;
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return None;
    }
    Some((client_x - rect.left(), client_y - rect.top()))
}

/// Convert client coordinates to a clamped relative field point. `None`
/// until the container has a layout.
pub fn client_to_relative(client_x: f64, client_y: f64) -> Option<RelPoint> {
    let rect = container_rect()?;
    geometry::to_relative(
        client_x - rect.left(),
        client_y - rect.top(),
        rect.width(),
        rect.height(),
    )
}

/// Container CSS pixel size, for hit tests and the draw pass.
pub fn container_size() -> Option<(f64, f64)> {
    let rect = container_rect()?;
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return None;
    }
    Some((rect.width(), rect.height()))
}

pub fn device_pixel_ratio() -> f64 {
    web_sys::window()
        .map(|w| w.device_pixel_ratio())
        .unwrap_or(1.0)
        .max(1.0)
}

/// Size the canvas backing store to `css × dpr` device pixels.
///
/// Assigning `width`/`height` clears the canvas, so this only writes when
/// the required size actually changed; returns whether it did. Draw calls
/// afterwards run under a `dpr` transform and think in CSS pixels.
pub fn sync_backing_store(canvas: &HtmlCanvasElement, css_w: f64, css_h: f64, dpr: f64) -> bool {
    let (bw, bh) = backing_store_size(css_w, css_h, dpr);
    if canvas.width() == bw && canvas.height() == bh {
        return false;
    }
    canvas.set_width(bw);
    canvas.set_height(bh);
    true
}

/// Backing-store dimensions for a CSS size at a pixel ratio. Pure, so the
/// rounding behavior is testable.
pub fn backing_store_size(css_w: f64, css_h: f64, dpr: f64) -> (u32, u32) {
    (
        (css_w * dpr).round().max(0.0) as u32,
        (css_h * dpr).round().max(0.0) as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backing_store_size_scales_by_dpr() {
        assert_eq!(backing_store_size(800.0, 600.0, 2.0), (1600, 1200));
        assert_eq!(backing_store_size(800.0, 600.0, 1.0), (800, 600));
    }

    #[test]
    fn test_backing_store_size_rounds() {
        // 413.5 * 1.5 = 620.25 -> 620; 413.9 * 1.5 = 620.85 -> 621
        assert_eq!(backing_store_size(413.5, 413.9, 1.5).0, 620);
        assert_eq!(backing_store_size(413.5, 413.9, 1.5).1, 621);
    }

    #[test]
    fn test_backing_store_size_never_negative() {
        assert_eq!(backing_store_size(-10.0, -10.0, 2.0), (0, 0));
    }
}
