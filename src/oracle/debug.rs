use crate::core::types::Vec2;

/// Write-only diagnostics; nothing drawn here is ever read back
pub trait DebugSink {
    fn draw_circle(&mut self, center: Vec2, radius: f32, label: &str);
    fn draw_line(&mut self, from: Vec2, to: Vec2);
    fn draw_text(&mut self, at: Vec2, text: &str);
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDebugSink;

impl DebugSink for NullDebugSink {
    fn draw_circle(&mut self, _center: Vec2, _radius: f32, _label: &str) {}
    fn draw_line(&mut self, _from: Vec2, _to: Vec2) {}
    fn draw_text(&mut self, _at: Vec2, _text: &str) {}
}
