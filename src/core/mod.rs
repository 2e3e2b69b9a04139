//! Off-screen drawing surface.
//!
//! - **utf8**: code point to UTF-8 byte encoding
//! - **geometry**: `Vector` and `Rect` in cell space
//! - **buffer**: character grid with per-cell depth testing
//! - **draw**: rectangle and text primitives on top of the buffer
//!
//! # Architecture
//!
//! ```text
//! FrameBuffer
//! ├── cells  (Option<u32> per cell)
//! └── depth  (f32 per cell, -inf when empty)
//! ```

pub mod buffer;
pub mod draw;
pub mod geometry;
pub mod utf8;

pub use buffer::FrameBuffer;
pub use geometry::{Rect, Vector};
