pub mod control_bar;
pub mod field_canvas;
pub mod field_renderer;
pub mod help_overlay;
pub mod roster_bar;
