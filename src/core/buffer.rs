//! Off-screen character grid with a parallel depth grid.
//!
//! Every cell write is depth-tested: a write is dropped when the cell already
//! holds content from a strictly higher `z`. Equal depth overwrites, so the
//! later of two same-layer draws wins.

use std::io::{self, Write};

use crossterm::{cursor::MoveTo, queue};
use tracing::error;

use super::geometry::Vector;
use super::utf8;
use crate::error::{Error, Result};

/// Depth of a cell nothing has been drawn to since the last clear.
pub const EMPTY_DEPTH: f32 = f32::NEG_INFINITY;

/// Frame buffer holding one code point (or nothing) per cell.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<Option<u32>>,
    depth: Vec<f32>,
}

impl FrameBuffer {
    /// Allocate a cleared buffer of `width x height` cells.
    pub fn new(width: u16, height: u16) -> Result<Self> {
        let count = width as usize * height as usize;

        let mut cells = Vec::new();
        cells
            .try_reserve_exact(count)
            .map_err(|_| Error::Allocation { cells: count })?;
        cells.resize(count, None);

        let mut depth = Vec::new();
        depth
            .try_reserve_exact(count)
            .map_err(|_| Error::Allocation { cells: count })?;
        depth.resize(count, EMPTY_DEPTH);

        Ok(Self {
            width,
            height,
            cells,
            depth,
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Linear index of a position, or `None` when it falls outside the grid.
    pub fn index_of(&self, pos: Vector) -> Option<usize> {
        let (x, y) = pos.cell();
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(x as usize + y as usize * self.width as usize)
    }

    /// Depth-tested write of one code point.
    ///
    /// Returns `Ok(false)` when the write lost the depth test.
    pub fn write(&mut self, pos: Vector, codepoint: u32) -> Result<bool> {
        let idx = self.index_of(pos).ok_or_else(|| {
            let (x, y) = pos.cell();
            Error::OutOfBounds { x, y }
        })?;
        Ok(self.write_index(idx, codepoint, pos.z))
    }

    /// Depth-tested write by linear index. Indices past the end and NaN
    /// depths are ignored.
    pub fn write_index(&mut self, idx: usize, codepoint: u32, z: f32) -> bool {
        let Some(current) = self.depth.get(idx) else {
            return false;
        };
        if z.is_nan() || *current > z {
            return false;
        }
        self.cells[idx] = Some(codepoint);
        self.depth[idx] = z;
        true
    }

    /// Content of the cell at `(x, y)`.
    pub fn get(&self, x: u16, y: u16) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells[x as usize + y as usize * self.width as usize]
    }

    /// Depth of the cell at `(x, y)`.
    pub fn depth_at(&self, x: u16, y: u16) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.depth[x as usize + y as usize * self.width as usize])
    }

    /// Reset every cell and its depth.
    pub fn clear(&mut self) {
        self.cells.fill(None);
        self.depth.fill(EMPTY_DEPTH);
    }

    /// Free both grids. The buffer is zero-sized afterwards.
    pub fn release(&mut self) {
        self.width = 0;
        self.height = 0;
        self.cells = Vec::new();
        self.depth = Vec::new();
    }

    /// Compose one frame: cursor to origin, then every row followed by `\r\n`.
    ///
    /// Fails on the first cell holding a value that is not a Unicode scalar.
    pub fn compose(&self) -> std::result::Result<Vec<u8>, utf8::EncodeError> {
        let mut out = Vec::with_capacity(self.cells.len() + 2 * self.height as usize + 8);
        // Writing into a Vec cannot fail.
        let _ = queue!(out, MoveTo(0, 0));

        for row in self.cells.chunks(self.width.max(1) as usize) {
            for cell in row {
                match cell {
                    None => out.push(b' '),
                    Some(c) => out.extend_from_slice(utf8::encode(*c)?.as_bytes()),
                }
            }
            out.extend_from_slice(b"\r\n");
        }

        Ok(out)
    }

    /// Render the frame to `out`.
    ///
    /// A cell that cannot be encoded aborts the frame before anything is
    /// written: the error is logged and the buffer cleared so the next frame
    /// starts clean.
    pub fn render_to<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        match self.compose() {
            Ok(frame) => out.write_all(&frame),
            Err(e) => {
                error!("{}", e);
                self.clear();
                Ok(())
            }
        }
    }
}
