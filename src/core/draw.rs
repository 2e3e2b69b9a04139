//! Shape and text primitives built on the depth-tested cell write.
//!
//! All cells of one draw call share the call's depth. Cells falling outside
//! the grid are clipped.

use std::ops::Range;

use super::buffer::FrameBuffer;
use super::geometry::{Rect, Vector};

/// Glyphs for the sides and corners of a box.
#[derive(Debug, Clone, Copy)]
struct BoxGlyphs {
    top: u32,
    bottom: u32,
    left: u32,
    right: u32,
    top_left: u32,
    top_right: u32,
    bottom_left: u32,
    bottom_right: u32,
}

const OUTLINE: BoxGlyphs = BoxGlyphs {
    top: 0x2500,          // ─
    bottom: 0x2500,       // ─
    left: 0x2502,         // │
    right: 0x2502,        // │
    top_left: 0x250C,     // ┌
    top_right: 0x2510,    // ┐
    bottom_left: 0x2514,  // └
    bottom_right: 0x2518, // ┘
};

const BLOCK: BoxGlyphs = BoxGlyphs {
    top: 0x2584,          // ▄
    bottom: 0x2580,       // ▀
    left: 0x2590,         // ▐
    right: 0x258C,        // ▌
    top_left: 0x2597,     // ▗
    top_right: 0x2596,    // ▖
    bottom_left: 0x259D,  // ▝
    bottom_right: 0x2598, // ▘
};

/// Interior of a filled rectangle.
pub const FILL: u32 = 0x2588; // █

/// Cells strictly between `min` and `max` that lie inside `0..limit`.
fn between(min: i64, max: i64, limit: u16) -> Range<i64> {
    min.saturating_add(1).max(0)..max.min(limit as i64)
}

impl FrameBuffer {
    fn put(&mut self, x: i64, y: i64, codepoint: u32, z: f32) {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return;
        }
        let idx = x as usize + y as usize * self.width() as usize;
        self.write_index(idx, codepoint, z);
    }

    fn draw_box(&mut self, rect: Rect, glyphs: BoxGlyphs) {
        let (min_x, min_y) = rect.min();
        let (max_x, max_y) = rect.max();
        let z = rect.depth();

        self.put(min_x, min_y, glyphs.top_left, z);
        self.put(max_x, min_y, glyphs.top_right, z);
        self.put(min_x, max_y, glyphs.bottom_left, z);
        self.put(max_x, max_y, glyphs.bottom_right, z);

        for y in between(min_y, max_y, self.height()) {
            self.put(min_x, y, glyphs.left, z);
            self.put(max_x, y, glyphs.right, z);
        }
        for x in between(min_x, max_x, self.width()) {
            self.put(x, min_y, glyphs.top, z);
            self.put(x, max_y, glyphs.bottom, z);
        }
    }

    /// Draw the single-line outline of a rectangle.
    pub fn draw_rect(&mut self, rect: Rect) {
        self.draw_box(rect, OUTLINE);
    }

    /// Draw a solid rectangle: half-block border plus a full-block interior.
    pub fn fill_rect(&mut self, rect: Rect) {
        self.draw_box(rect, BLOCK);

        let (min_x, min_y) = rect.min();
        let (max_x, max_y) = rect.max();
        let z = rect.depth();
        for y in between(min_y, max_y, self.height()) {
            for x in between(min_x, max_x, self.width()) {
                self.put(x, y, FILL, z);
            }
        }
    }

    /// Draw a single code point.
    pub fn draw_char(&mut self, codepoint: u32, pos: Vector) {
        let (x, y) = pos.cell();
        self.put(x, y, codepoint, pos.z);
    }

    /// Place text into consecutive cells starting at `pos`.
    ///
    /// Text advances by linear index, so it continues on the next row once it
    /// passes the right edge, and stops at the last cell of the grid.
    pub fn draw_text(&mut self, text: &str, pos: Vector) {
        let Some(start) = self.index_of(pos) else {
            return;
        };
        let end = self.len();
        for (idx, ch) in (start..end).zip(text.chars()) {
            self.write_index(idx, ch as u32, pos.z);
        }
    }
}
