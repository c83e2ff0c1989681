//! Render pipeline for the field canvas.
//!
//! This module is the only place that touches
//! [`web_sys::CanvasRenderingContext2d`]. It receives a read-only
//! [`FieldScene`] snapshot and produces pixels; it never mutates entity
//! state. Fallible Canvas2D calls propagate `Result<(), JsValue>` with
//! `?`; the public entry points absorb the result and log, so a bad draw
//! degrades to a stale frame instead of a crash.

use std::cell::RefCell;
use std::f64::consts::PI;

use dioxus::logger::tracing::warn;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use touchline_shared::geometry::{is_sideline_x, to_pixel};
use touchline_shared::hit::{is_occupied, MARKER_RADIUS, OCCUPANCY_THRESHOLD, SMALL_MARKER_RADIUS};
use touchline_shared::models::{
    DiscType, FormationAnchor, GameType, Opponent, Player, RelPoint, Stroke, SubSlot, TacticalDisc,
};

use crate::cache::{BackgroundKey, RenderCache, BACKGROUND_CACHE_CAPACITY};
use crate::coords;

/// Ball draw radius. Hit-testing uses the larger [`MARKER_RADIUS`] so the
/// smallest marker keeps a forgiving touch target.
pub const BALL_RADIUS: f64 = 12.0;

/// Tactics-mode alignment grid spacing in CSS pixels.
const GRID_SPACING_PX: f64 = 40.0;

const GRASS_LIGHT: &str = "#459a4c";
const GRASS_DARK: &str = "#2e6f38";
const LINE_COLOR: &str = "rgba(255,255,255,0.85)";
const GRID_LINE_COLOR: &str = "rgba(255,255,255,0.08)";
const GRID_BORDER_COLOR: &str = "rgba(255,255,255,0.35)";
const DRAWING_COLOR: &str = "#fb923c";
const DRAWING_WIDTH: f64 = 3.0;
const OPPONENT_COLOR: &str = "#b91c1c";
const DISC_HOME_COLOR: &str = "#7e22ce";
const DISC_OPPONENT_COLOR: &str = "#dc2626";
const DISC_GOALIE_COLOR: &str = "#f59e0b";
const GOALIE_COLOR: &str = "#f59e0b";
const DEFAULT_PLAYER_COLOR: &str = "#7e22ce";
const SELECTION_COLOR: &str = "#fde047";

thread_local! {
    static BACKGROUND_CACHE: RefCell<RenderCache<HtmlCanvasElement>> =
        RefCell::new(RenderCache::new(BACKGROUND_CACHE_CAPACITY));
    static BALL_IMAGE: RefCell<Option<HtmlImageElement>> = const { RefCell::new(None) };
    static BALL_REQUESTED: std::cell::Cell<bool> = const { std::cell::Cell::new(false) };
}

/// Drop every cached background. Called on visibility-resume, where a
/// backgrounded tab may have invalidated the cached surfaces.
pub fn invalidate_background_cache() {
    BACKGROUND_CACHE.with(|c| c.borrow_mut().clear());
}

/// Kick off the ball texture load once. Until it resolves (or if it never
/// does) ball rendering is simply skipped. `on_loaded` fires after the
/// image arrives so the caller can schedule a redraw.
pub fn ensure_ball_image(src: &str, on_loaded: impl FnOnce() + 'static) {
    if BALL_REQUESTED.with(|r| r.replace(true)) {
        return;
    }
    let Ok(image) = HtmlImageElement::new() else {
        warn!("ball image element could not be created; ball will not render");
        return;
    };
    let loaded = image.clone();
    let cb = wasm_bindgen::closure::Closure::once(move || {
        BALL_IMAGE.with(|b| *b.borrow_mut() = Some(loaded));
        on_loaded();
    });
    image.set_onload(Some(cb.as_ref().unchecked_ref()));
    cb.forget();
    image.set_src(src);
}

fn ball_image() -> Option<HtmlImageElement> {
    BALL_IMAGE.with(|b| b.borrow().clone())
}

/// Read-only snapshot of everything a draw pass needs.
pub struct FieldScene<'a> {
    pub players: &'a [Player],
    pub opponents: &'a [Opponent],
    pub discs: &'a [TacticalDisc],
    pub drawings: &'a [Stroke],
    pub ball: Option<RelPoint>,
    pub anchors: &'a [FormationAnchor],
    pub sub_slots: &'a [SubSlot],
    pub tactics_view: bool,
    pub show_names: bool,
    pub game_type: GameType,
    pub selected_player: Option<&'a str>,
}

struct DrawOpts {
    /// Device pixels per CSS pixel (DPR on screen, export scale offline).
    pixel_scale: f64,
    use_cache: bool,
    /// Tactics grid/border; omitted from exports.
    overlays: bool,
}

/// Full on-screen draw pass against the live canvas.
pub fn draw_field(canvas: &HtmlCanvasElement, scene: &FieldScene) {
    let Some((css_w, css_h)) = coords::container_size() else {
        warn!("field surface has no layout yet; skipping draw pass");
        return;
    };
    let dpr = coords::device_pixel_ratio();
    coords::sync_backing_store(canvas, css_w, css_h, dpr);
    let Some(ctx) = context_2d(canvas) else {
        warn!("2d context unavailable; skipping draw pass");
        return;
    };
    let opts = DrawOpts {
        pixel_scale: dpr,
        use_cache: true,
        overlays: true,
    };
    if let Err(err) = draw_scene(&ctx, scene, css_w, css_h, &opts) {
        warn!("field draw pass failed: {err:?}");
    }
}

/// Render the scene fresh at `css × scale` onto a new offscreen surface,
/// bypassing the background cache and omitting tactics overlays. Returns
/// `None` while the live surface has no layout size.
pub fn render_for_export(
    live: &HtmlCanvasElement,
    scene: &FieldScene,
    scale: f64,
) -> Option<HtmlCanvasElement> {
    let css_w = f64::from(live.client_width());
    let css_h = f64::from(live.client_height());
    if css_w <= 0.0 || css_h <= 0.0 {
        warn!("export requested before the field surface had a size");
        return None;
    }

    let document = web_sys::window()?.document()?;
    let surface: HtmlCanvasElement = document
        .create_element("canvas")
        .ok()?
        .dyn_into()
        .ok()?;
    let (bw, bh) = coords::backing_store_size(css_w, css_h, scale);
    surface.set_width(bw);
    surface.set_height(bh);

    let ctx = context_2d(&surface)?;
    let opts = DrawOpts {
        pixel_scale: scale,
        use_cache: false,
        overlays: false,
    };
    match draw_scene(&ctx, scene, css_w, css_h, &opts) {
        Ok(()) => Some(surface),
        Err(err) => {
            warn!("export render failed: {err:?}");
            None
        }
    }
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
    canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|o| o.dyn_into().ok())
}

/// Draw everything back to front. Coordinates are CSS pixels; the
/// transform maps them onto the device-pixel backing store.
fn draw_scene(
    ctx: &CanvasRenderingContext2d,
    scene: &FieldScene,
    w: f64,
    h: f64,
    opts: &DrawOpts,
) -> Result<(), JsValue> {
    ctx.set_transform(opts.pixel_scale, 0.0, 0.0, opts.pixel_scale, 0.0, 0.0)?;
    ctx.clear_rect(0.0, 0.0, w, h);

    let background = background_for(w, h, scene, opts)?;
    ctx.save();
    ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
    ctx.draw_image_with_html_canvas_element(&background, 0.0, 0.0)?;
    ctx.restore();

    if scene.tactics_view && opts.overlays {
        draw_tactics_overlays(ctx, w, h)?;
    }

    draw_strokes(ctx, scene.drawings, w, h);

    if scene.tactics_view {
        draw_discs(ctx, scene.discs, w, h)?;
        draw_ball(ctx, scene, w, h)?;
    } else {
        draw_opponents(ctx, scene.opponents, w, h)?;
        draw_anchor_indicators(ctx, scene, w, h)?;
        draw_sub_slots(ctx, scene, w, h)?;
        draw_players(ctx, scene, w, h)?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Background (cached)
// ---------------------------------------------------------------------------

fn background_for(
    css_w: f64,
    css_h: f64,
    scene: &FieldScene,
    opts: &DrawOpts,
) -> Result<HtmlCanvasElement, JsValue> {
    let (bw, bh) = coords::backing_store_size(css_w, css_h, opts.pixel_scale);
    let key = BackgroundKey {
        width: bw,
        height: bh,
        tactics_view: scene.tactics_view,
        game_type: scene.game_type,
    };

    if opts.use_cache {
        if let Some(hit) = BACKGROUND_CACHE.with(|c| c.borrow_mut().get(&key).cloned()) {
            return Ok(hit);
        }
    }
    let surface = render_background(bw, bh, scene.game_type)?;
    if opts.use_cache {
        BACKGROUND_CACHE.with(|c| c.borrow_mut().insert(key, surface.clone()));
    }
    Ok(surface)
}

/// Render the grass and field markings at full device-pixel resolution on
/// an offscreen surface.
fn render_background(w: u32, h: u32, game_type: GameType) -> Result<HtmlCanvasElement, JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let surface: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
    surface.set_width(w.max(1));
    surface.set_height(h.max(1));
    let ctx = context_2d(&surface).ok_or_else(|| JsValue::from_str("no 2d context"))?;

    let w = f64::from(w.max(1));
    let h = f64::from(h.max(1));
    paint_grass(&ctx, w, h)?;
    paint_markings(&ctx, w, h, game_type)?;
    Ok(surface)
}

fn paint_grass(ctx: &CanvasRenderingContext2d, w: f64, h: f64) -> Result<(), JsValue> {
    // Base: vertical light-to-dark gradient.
    let base = ctx.create_linear_gradient(0.0, 0.0, 0.0, h);
    base.add_color_stop(0.0, GRASS_LIGHT)?;
    base.add_color_stop(1.0, GRASS_DARK)?;
    ctx.set_fill_style_canvas_gradient(&base);
    ctx.fill_rect(0.0, 0.0, w, h);

    // Procedural noise at two scales breaks up the gradient banding.
    paint_noise(ctx, w, h, 2.0, 0.045, ((w * h) / 900.0) as usize);
    paint_noise(ctx, w, h, 5.0, 0.03, ((w * h) / 3600.0) as usize);

    // Mowing stripes: alternating horizontal bands under soft-light.
    ctx.set_global_composite_operation("soft-light")?;
    let band_h = h / 12.0;
    ctx.set_fill_style_str("rgba(255,255,255,0.35)");
    let mut band = 0;
    while f64::from(band) * band_h < h {
        if band % 2 == 0 {
            ctx.fill_rect(0.0, f64::from(band) * band_h, w, band_h);
        }
        band += 1;
    }

    // Directional light from the top-left.
    let light = ctx.create_linear_gradient(0.0, 0.0, w, h);
    light.add_color_stop(0.0, "rgba(255,255,255,0.18)")?;
    light.add_color_stop(0.5, "rgba(255,255,255,0.0)")?;
    light.add_color_stop(1.0, "rgba(0,0,0,0.18)")?;
    ctx.set_fill_style_canvas_gradient(&light);
    ctx.fill_rect(0.0, 0.0, w, h);
    ctx.set_global_composite_operation("source-over")?;

    // Radial vignette keeps the eye on the middle of the pitch.
    let vignette = ctx.create_radial_gradient(
        w / 2.0,
        h / 2.0,
        (w.min(h)) * 0.25,
        w / 2.0,
        h / 2.0,
        (w.max(h)) * 0.75,
    )?;
    vignette.add_color_stop(0.0, "rgba(0,0,0,0)")?;
    vignette.add_color_stop(1.0, "rgba(0,0,0,0.16)")?;
    ctx.set_fill_style_canvas_gradient(&vignette);
    ctx.fill_rect(0.0, 0.0, w, h);
    Ok(())
}

fn paint_noise(ctx: &CanvasRenderingContext2d, w: f64, h: f64, size: f64, alpha: f64, count: usize) {
    let count = count.min(4000);
    for i in 0..count {
        let x = js_sys::Math::random() * w;
        let y = js_sys::Math::random() * h;
        let shade = if i % 2 == 0 { "255,255,255" } else { "0,0,0" };
        ctx.set_fill_style_str(&format!("rgba({shade},{alpha})"));
        ctx.fill_rect(x, y, size, size);
    }
}

/// Marking dimensions as fractions of the playable rect.
struct MarkingDims {
    penalty_w: f64,
    penalty_d: f64,
    goal_area_w: f64,
    goal_area_d: f64,
    spot_d: f64,
    circle_r: f64,
    goal_mouth_w: f64,
    /// Futsal draws its penalty area as posts-centred arcs, not a box.
    boxed_area: bool,
}

fn marking_dims(game_type: GameType) -> MarkingDims {
    match game_type {
        GameType::Soccer => MarkingDims {
            penalty_w: 0.6,
            penalty_d: 0.16,
            goal_area_w: 0.28,
            goal_area_d: 0.055,
            spot_d: 0.105,
            circle_r: 0.09,
            goal_mouth_w: 0.11,
            boxed_area: true,
        },
        GameType::Futsal => MarkingDims {
            penalty_w: 0.0,
            penalty_d: 0.15,
            goal_area_w: 0.0,
            goal_area_d: 0.0,
            spot_d: 0.15,
            circle_r: 0.075,
            goal_mouth_w: 0.15,
            boxed_area: false,
        },
    }
}

fn paint_markings(
    ctx: &CanvasRenderingContext2d,
    w: f64,
    h: f64,
    game_type: GameType,
) -> Result<(), JsValue> {
    let dims = marking_dims(game_type);
    let margin = 0.035 * w.min(h);
    let x0 = margin;
    let y0 = margin;
    let fw = w - 2.0 * margin;
    let fh = h - 2.0 * margin;
    let lw = (w.min(h) / 220.0).max(1.5);

    ctx.set_stroke_style_str(LINE_COLOR);
    ctx.set_fill_style_str(LINE_COLOR);
    ctx.set_line_width(lw);

    // Boundary and halfway line.
    ctx.stroke_rect(x0, y0, fw, fh);
    let mid_y = y0 + fh / 2.0;
    ctx.begin_path();
    ctx.move_to(x0, mid_y);
    ctx.line_to(x0 + fw, mid_y);
    ctx.stroke();

    // Centre circle and spot.
    let cx = x0 + fw / 2.0;
    ctx.begin_path();
    ctx.arc(cx, mid_y, dims.circle_r * fh, 0.0, 2.0 * PI)?;
    ctx.stroke();
    spot(ctx, cx, mid_y, lw * 1.6)?;

    // Goal-end markings, top then bottom.
    for top in [true, false] {
        let goal_y = if top { y0 } else { y0 + fh };
        let dir = if top { 1.0 } else { -1.0 };
        let spot_y = goal_y + dir * dims.spot_d * fh;

        if dims.boxed_area {
            let pw = dims.penalty_w * fw;
            let pd = dims.penalty_d * fh;
            stroke_box(ctx, cx - pw / 2.0, goal_y, pw, dir * pd);
            let gw = dims.goal_area_w * fw;
            let gd = dims.goal_area_d * fh;
            stroke_box(ctx, cx - gw / 2.0, goal_y, gw, dir * gd);
            spot(ctx, cx, spot_y, lw * 1.6)?;
            penalty_arc(ctx, cx, spot_y, dims.circle_r * fh, goal_y + dir * pd, top)?;
        } else {
            // Futsal: quarter arcs from each post joined across the goal mouth.
            let half_mouth = dims.goal_mouth_w * fw / 2.0;
            let r = dims.penalty_d * fh;
            let edge_y = goal_y + dir * r;
            ctx.begin_path();
            if top {
                ctx.arc(cx - half_mouth, goal_y, r, PI / 2.0, PI)?;
            } else {
                ctx.arc(cx - half_mouth, goal_y, r, PI, 3.0 * PI / 2.0)?;
            }
            ctx.stroke();
            ctx.begin_path();
            if top {
                ctx.arc(cx + half_mouth, goal_y, r, 0.0, PI / 2.0)?;
            } else {
                ctx.arc(cx + half_mouth, goal_y, r, 3.0 * PI / 2.0, 2.0 * PI)?;
            }
            ctx.stroke();
            ctx.begin_path();
            ctx.move_to(cx - half_mouth, edge_y);
            ctx.line_to(cx + half_mouth, edge_y);
            ctx.stroke();
            spot(ctx, cx, spot_y, lw * 1.6)?;
        }

        // Goal mouth drawn just outside the goal line.
        let gm = dims.goal_mouth_w * fw;
        let depth = 0.025 * fh;
        let gy = if top { y0 - depth } else { y0 + fh };
        ctx.stroke_rect(cx - gm / 2.0, gy, gm, depth);
    }

    // Corner arcs.
    let corner_r = 0.02 * fw;
    for (corner_x, corner_y, start) in [
        (x0, y0, 0.0),
        (x0 + fw, y0, PI / 2.0),
        (x0 + fw, y0 + fh, PI),
        (x0, y0 + fh, 3.0 * PI / 2.0),
    ] {
        ctx.begin_path();
        ctx.arc(corner_x, corner_y, corner_r, start, start + PI / 2.0)?;
        ctx.stroke();
    }

    Ok(())
}

fn stroke_box(ctx: &CanvasRenderingContext2d, x: f64, goal_y: f64, w: f64, signed_depth: f64) {
    // Three sides: the goal line itself is already drawn by the boundary.
    let inner_y = goal_y + signed_depth;
    ctx.begin_path();
    ctx.move_to(x, goal_y);
    ctx.line_to(x, inner_y);
    ctx.line_to(x + w, inner_y);
    ctx.line_to(x + w, goal_y);
    ctx.stroke();
}

fn spot(ctx: &CanvasRenderingContext2d, x: f64, y: f64, r: f64) -> Result<(), JsValue> {
    ctx.begin_path();
    ctx.arc(x, y, r, 0.0, 2.0 * PI)?;
    ctx.fill();
    Ok(())
}

/// The D outside the penalty box: the part of the spot-centred circle
/// beyond the box edge.
fn penalty_arc(
    ctx: &CanvasRenderingContext2d,
    cx: f64,
    spot_y: f64,
    r: f64,
    box_edge_y: f64,
    top: bool,
) -> Result<(), JsValue> {
    let delta = ((box_edge_y - spot_y).abs() / r).clamp(-1.0, 1.0);
    let s = delta.asin();
    ctx.begin_path();
    if top {
        ctx.arc(cx, spot_y, r, s, PI - s)?;
    } else {
        ctx.arc(cx, spot_y, r, PI + s, 2.0 * PI - s)?;
    }
    ctx.stroke();
    Ok(())
}

// ---------------------------------------------------------------------------
// Tactics overlays (never cached, never exported)
// ---------------------------------------------------------------------------

fn draw_tactics_overlays(ctx: &CanvasRenderingContext2d, w: f64, h: f64) -> Result<(), JsValue> {
    ctx.set_stroke_style_str(GRID_LINE_COLOR);
    ctx.set_line_width(1.0);
    let mut x = GRID_SPACING_PX;
    while x < w {
        ctx.begin_path();
        ctx.move_to(x, 0.0);
        ctx.line_to(x, h);
        ctx.stroke();
        x += GRID_SPACING_PX;
    }
    let mut y = GRID_SPACING_PX;
    while y < h {
        ctx.begin_path();
        ctx.move_to(0.0, y);
        ctx.line_to(w, y);
        ctx.stroke();
        y += GRID_SPACING_PX;
    }

    ctx.set_stroke_style_str(GRID_BORDER_COLOR);
    ctx.set_line_width(2.0);
    ctx.stroke_rect(1.0, 1.0, w - 2.0, h - 2.0);
    Ok(())
}

// ---------------------------------------------------------------------------
// Drawing strokes
// ---------------------------------------------------------------------------

fn draw_strokes(ctx: &CanvasRenderingContext2d, drawings: &[Stroke], w: f64, h: f64) {
    ctx.set_stroke_style_str(DRAWING_COLOR);
    ctx.set_line_width(DRAWING_WIDTH);
    ctx.set_line_cap("round");
    ctx.set_line_join("round");

    for stroke in drawings {
        let mut started = false;
        ctx.begin_path();
        for point in stroke {
            if !point.is_finite() {
                // Close out what we have and start a fresh subpath after
                // the bad vertex instead of poisoning the whole stroke.
                warn!("drawing stroke contains a non-finite point; splitting path");
                if started {
                    ctx.stroke();
                    ctx.begin_path();
                    started = false;
                }
                continue;
            }
            let (x, y) = to_pixel(*point, w, h);
            if started {
                ctx.line_to(x, y);
            } else {
                ctx.move_to(x, y);
                started = true;
            }
        }
        if started {
            ctx.stroke();
        }
    }
}

// ---------------------------------------------------------------------------
// Markers
// ---------------------------------------------------------------------------

/// Disc with a top-left sheen and bottom-right inner shadow, the shared
/// look for player and opponent markers.
fn draw_enamel_disc(
    ctx: &CanvasRenderingContext2d,
    x: f64,
    y: f64,
    r: f64,
    color: &str,
) -> Result<(), JsValue> {
    ctx.begin_path();
    ctx.arc(x, y, r, 0.0, 2.0 * PI)?;
    ctx.set_fill_style_str(color);
    ctx.fill();

    ctx.save();
    ctx.begin_path();
    ctx.arc(x, y, r, 0.0, 2.0 * PI)?;
    ctx.clip();

    let sheen = ctx.create_radial_gradient(x - r * 0.4, y - r * 0.4, r * 0.1, x, y, r * 1.2)?;
    sheen.add_color_stop(0.0, "rgba(255,255,255,0.5)")?;
    sheen.add_color_stop(0.5, "rgba(255,255,255,0.08)")?;
    sheen.add_color_stop(1.0, "rgba(255,255,255,0)")?;
    ctx.set_fill_style_canvas_gradient(&sheen);
    ctx.fill_rect(x - r, y - r, 2.0 * r, 2.0 * r);

    let shade = ctx.create_radial_gradient(x + r * 0.35, y + r * 0.35, r * 0.2, x, y, r * 1.2)?;
    shade.add_color_stop(0.0, "rgba(0,0,0,0)")?;
    shade.add_color_stop(0.75, "rgba(0,0,0,0.06)")?;
    shade.add_color_stop(1.0, "rgba(0,0,0,0.32)")?;
    ctx.set_fill_style_canvas_gradient(&shade);
    ctx.fill_rect(x - r, y - r, 2.0 * r, 2.0 * r);
    ctx.restore();

    ctx.begin_path();
    ctx.arc(x, y, r, 0.0, 2.0 * PI)?;
    ctx.set_stroke_style_str("rgba(255,255,255,0.6)");
    ctx.set_line_width(1.5);
    ctx.stroke();
    Ok(())
}

fn draw_opponents(
    ctx: &CanvasRenderingContext2d,
    opponents: &[Opponent],
    w: f64,
    h: f64,
) -> Result<(), JsValue> {
    for o in opponents {
        if !o.position.is_finite() {
            warn!("skipping opponent {} with non-finite position", o.id);
            continue;
        }
        let (x, y) = to_pixel(o.position, w, h);
        draw_enamel_disc(ctx, x, y, SMALL_MARKER_RADIUS, OPPONENT_COLOR)?;
    }
    Ok(())
}

fn disc_color(disc_type: DiscType) -> &'static str {
    match disc_type {
        DiscType::Home => DISC_HOME_COLOR,
        DiscType::Opponent => DISC_OPPONENT_COLOR,
        DiscType::Goalie => DISC_GOALIE_COLOR,
    }
}

fn draw_discs(
    ctx: &CanvasRenderingContext2d,
    discs: &[TacticalDisc],
    w: f64,
    h: f64,
) -> Result<(), JsValue> {
    for d in discs {
        if !d.position.is_finite() {
            warn!("skipping tactical disc {} with non-finite position", d.id);
            continue;
        }
        let (x, y) = to_pixel(d.position, w, h);

        ctx.save();
        ctx.set_shadow_color("rgba(0,0,0,0.45)");
        ctx.set_shadow_blur(6.0);
        ctx.set_shadow_offset_y(2.0);
        ctx.begin_path();
        ctx.arc(x, y, SMALL_MARKER_RADIUS, 0.0, 2.0 * PI)?;
        ctx.set_fill_style_str(disc_color(d.disc_type));
        ctx.fill();
        ctx.restore();

        ctx.begin_path();
        ctx.arc(x, y, SMALL_MARKER_RADIUS, 0.0, 2.0 * PI)?;
        ctx.set_stroke_style_str("rgba(255,255,255,0.65)");
        ctx.set_line_width(1.5);
        ctx.stroke();
    }
    Ok(())
}

fn draw_ball(
    ctx: &CanvasRenderingContext2d,
    scene: &FieldScene,
    w: f64,
    h: f64,
) -> Result<(), JsValue> {
    let (Some(pos), Some(image)) = (scene.ball, ball_image()) else {
        // Image not loaded yet or no position set: skip, don't block.
        return Ok(());
    };
    if !pos.is_finite() {
        warn!("skipping ball with non-finite position");
        return Ok(());
    }
    let (x, y) = to_pixel(pos, w, h);

    ctx.save();
    ctx.set_shadow_color("rgba(0,0,0,0.4)");
    ctx.set_shadow_blur(5.0);
    ctx.set_shadow_offset_y(2.0);
    ctx.begin_path();
    ctx.arc(x, y, BALL_RADIUS, 0.0, 2.0 * PI)?;
    ctx.set_fill_style_str("#f5f5f4");
    ctx.fill();
    ctx.restore();

    ctx.save();
    ctx.begin_path();
    ctx.arc(x, y, BALL_RADIUS, 0.0, 2.0 * PI)?;
    ctx.clip();
    // Overdraw the clip slightly so the image's own edges never show.
    let img_r = BALL_RADIUS * 1.15;
    ctx.draw_image_with_html_image_element_and_dw_and_dh(
        &image,
        x - img_r,
        y - img_r,
        2.0 * img_r,
        2.0 * img_r,
    )?;
    ctx.restore();

    ctx.begin_path();
    ctx.arc(x, y, BALL_RADIUS, 0.0, 2.0 * PI)?;
    ctx.set_stroke_style_str("rgba(0,0,0,0.5)");
    ctx.set_line_width(1.0);
    ctx.stroke();
    Ok(())
}

fn draw_anchor_indicators(
    ctx: &CanvasRenderingContext2d,
    scene: &FieldScene,
    w: f64,
    h: f64,
) -> Result<(), JsValue> {
    for anchor in scene.anchors {
        if anchor.is_goalkeeper() || is_sideline_x(anchor.point.x) {
            continue;
        }
        let occupied = is_occupied(
            scene.players,
            anchor.point.x,
            anchor.point.y,
            OCCUPANCY_THRESHOLD,
        );
        // Dim taken positions so the open ones read at a glance.
        let alpha = if occupied { 0.18 } else { 0.45 };
        let (x, y) = to_pixel(anchor.point, w, h);
        ctx.begin_path();
        ctx.arc(x, y, MARKER_RADIUS, 0.0, 2.0 * PI)?;
        ctx.set_stroke_style_str(&format!("rgba(255,255,255,{alpha})"));
        ctx.set_line_width(2.0);
        ctx.stroke();
    }
    Ok(())
}

fn draw_sub_slots(
    ctx: &CanvasRenderingContext2d,
    scene: &FieldScene,
    w: f64,
    h: f64,
) -> Result<(), JsValue> {
    let dash = js_sys::Array::of2(&JsValue::from_f64(5.0), &JsValue::from_f64(4.0));
    for slot in scene.sub_slots {
        let occupied = is_occupied(
            scene.players,
            slot.point.x,
            slot.point.y,
            OCCUPANCY_THRESHOLD,
        );
        let alpha = if occupied { 0.18 } else { 0.45 };
        let (x, y) = to_pixel(slot.point, w, h);

        ctx.set_line_dash(&dash)?;
        ctx.begin_path();
        ctx.arc(x, y, MARKER_RADIUS, 0.0, 2.0 * PI)?;
        ctx.set_stroke_style_str(&format!("rgba(255,255,255,{alpha})"));
        ctx.set_line_width(2.0);
        ctx.stroke();
        ctx.set_line_dash(&js_sys::Array::new())?;

        ctx.set_fill_style_str(&format!("rgba(255,255,255,{alpha})"));
        ctx.set_font("600 10px sans-serif");
        ctx.set_text_align("right");
        ctx.set_text_baseline("middle");
        ctx.fill_text(&slot.label, x - MARKER_RADIUS - 6.0, y)?;
    }
    Ok(())
}

fn draw_players(
    ctx: &CanvasRenderingContext2d,
    scene: &FieldScene,
    w: f64,
    h: f64,
) -> Result<(), JsValue> {
    for player in scene.players {
        let Some(pos) = player.position else {
            continue;
        };
        if !pos.is_finite() {
            warn!("skipping player {} with non-finite position", player.id);
            continue;
        }
        let (x, y) = to_pixel(pos, w, h);

        let base_color = if player.is_goalie {
            GOALIE_COLOR.to_string()
        } else {
            player
                .color
                .clone()
                .unwrap_or_else(|| DEFAULT_PLAYER_COLOR.to_string())
        };
        let color = if is_sideline_x(pos.x) {
            desaturate(&base_color)
        } else {
            base_color
        };

        if scene.selected_player == Some(player.id.as_str()) {
            ctx.save();
            ctx.set_shadow_color(SELECTION_COLOR);
            ctx.set_shadow_blur(10.0);
            ctx.begin_path();
            ctx.arc(x, y, MARKER_RADIUS + 4.0, 0.0, 2.0 * PI)?;
            ctx.set_stroke_style_str(SELECTION_COLOR);
            ctx.set_line_width(2.5);
            ctx.stroke();
            ctx.restore();
        }

        draw_enamel_disc(ctx, x, y, MARKER_RADIUS, &color)?;

        if scene.show_names {
            draw_engraved_name(ctx, player.display_label(), x, y)?;
        }

        if !player.is_goalie {
            if let Some(label) = position_label_for(pos, scene.anchors, scene.sub_slots) {
                draw_position_label(ctx, &label, x, y, is_sideline_x(pos.x))?;
            }
        }
    }
    Ok(())
}

/// Engraved text: dark shadow below, light highlight above, solid fill on
/// top. Three overlapping fills read as carved into the disc.
fn draw_engraved_name(
    ctx: &CanvasRenderingContext2d,
    label: &str,
    x: f64,
    y: f64,
) -> Result<(), JsValue> {
    ctx.set_font("600 10px sans-serif");
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    ctx.set_fill_style_str("rgba(0,0,0,0.55)");
    ctx.fill_text(label, x, y + 0.8)?;
    ctx.set_fill_style_str("rgba(255,255,255,0.3)");
    ctx.fill_text(label, x, y - 0.8)?;
    ctx.set_fill_style_str("#f8fafc");
    ctx.fill_text(label, x, y)?;
    Ok(())
}

/// Position abbreviation with a contrasting outline, below the disc on
/// the field and to the left on the sideline strip.
fn draw_position_label(
    ctx: &CanvasRenderingContext2d,
    label: &str,
    x: f64,
    y: f64,
    sideline: bool,
) -> Result<(), JsValue> {
    ctx.set_font("700 10px sans-serif");
    let (lx, ly) = if sideline {
        ctx.set_text_align("right");
        ctx.set_text_baseline("middle");
        (x - MARKER_RADIUS - 6.0, y)
    } else {
        ctx.set_text_align("center");
        ctx.set_text_baseline("top");
        (x, y + MARKER_RADIUS + 4.0)
    };
    ctx.set_line_width(3.0);
    ctx.set_stroke_style_str("rgba(0,0,0,0.7)");
    ctx.stroke_text(label, lx, ly)?;
    ctx.set_fill_style_str("#ffffff");
    ctx.fill_text(label, lx, ly)?;
    Ok(())
}

/// The position abbreviation for a player parked on a (non-goalkeeper)
/// formation anchor or a sub-slot, if any.
fn position_label_for(
    pos: RelPoint,
    anchors: &[FormationAnchor],
    sub_slots: &[SubSlot],
) -> Option<String> {
    let near = |p: RelPoint| {
        (p.x - pos.x).abs() <= OCCUPANCY_THRESHOLD && (p.y - pos.y).abs() <= OCCUPANCY_THRESHOLD
    };
    for anchor in anchors {
        if !anchor.is_goalkeeper() && near(anchor.point) {
            return Some(anchor.label.clone());
        }
    }
    for slot in sub_slots {
        if near(slot.point) {
            return Some(slot.label.clone());
        }
    }
    None
}

/// Pull a hex color halfway toward its own gray, the washed-out look for
/// placed-but-benched players.
fn desaturate(hex: &str) -> String {
    let Some((r, g, b)) = parse_hex(hex) else {
        return hex.to_string();
    };
    let gray = 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b);
    let mix = |c: u8| ((f64::from(c) * 0.45 + gray * 0.55).round() as u8).min(255);
    format!("#{:02x}{:02x}{:02x}", mix(r), mix(g), mix(b))
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#ff0080"), Some((255, 0, 128)));
        assert_eq!(parse_hex("ff0080"), None);
        assert_eq!(parse_hex("#abc"), None);
        assert_eq!(parse_hex("#zzzzzz"), None);
    }

    #[test]
    fn test_desaturate_moves_toward_gray() {
        // Pure red: gray is ~76, so red falls and green/blue rise.
        let out = desaturate("#ff0000");
        let (r, g, b) = parse_hex(&out).unwrap();
        assert!(r < 255);
        assert!(g > 0);
        assert_eq!(g, b);
    }

    #[test]
    fn test_desaturate_gray_is_stable() {
        let out = desaturate("#808080");
        let (r, g, b) = parse_hex(&out).unwrap();
        assert_eq!((r, g, b), (128, 128, 128));
    }

    #[test]
    fn test_desaturate_passes_through_invalid() {
        assert_eq!(desaturate("rebeccapurple"), "rebeccapurple");
    }

    #[test]
    fn test_position_label_skips_goalkeeper_anchor() {
        let anchors = vec![
            FormationAnchor {
                point: RelPoint::new(0.5, 0.9),
                label: "GK".to_string(),
            },
            FormationAnchor {
                point: RelPoint::new(0.5, 0.7),
                label: "CB".to_string(),
            },
        ];
        assert_eq!(position_label_for(RelPoint::new(0.5, 0.9), &anchors, &[]), None);
        assert_eq!(
            position_label_for(RelPoint::new(0.51, 0.71), &anchors, &[]),
            Some("CB".to_string())
        );
    }

    #[test]
    fn test_position_label_from_sub_slot() {
        let slots = vec![SubSlot {
            point: RelPoint::new(0.97, 0.3),
            label: "S1".to_string(),
        }];
        assert_eq!(
            position_label_for(RelPoint::new(0.97, 0.3), &[], &slots),
            Some("S1".to_string())
        );
        assert_eq!(position_label_for(RelPoint::new(0.97, 0.5), &[], &slots), None);
    }

    #[test]
    fn test_marking_dims_differ_by_game_type() {
        let soccer = marking_dims(GameType::Soccer);
        let futsal = marking_dims(GameType::Futsal);
        assert!(soccer.boxed_area);
        assert!(!futsal.boxed_area);
        assert!(soccer.circle_r > futsal.circle_r);
        assert!(futsal.goal_mouth_w > soccer.goal_mouth_w);
    }

    #[test]
    fn test_disc_color_mapping() {
        assert_eq!(disc_color(DiscType::Home), DISC_HOME_COLOR);
        assert_eq!(disc_color(DiscType::Opponent), DISC_OPPONENT_COLOR);
        assert_eq!(disc_color(DiscType::Goalie), DISC_GOALIE_COLOR);
    }
}
