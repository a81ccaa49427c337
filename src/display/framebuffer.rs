//! RGB565 framebuffer and the renderer that paints the logo into it
//!
//! Every paint clears the console first, then blits the logo through its
//! palette converted to RGB565, so exactly one copy of the marker is
//! visible after each tick.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use super::{Bounds, Logo, Position, Renderer, Surface};
use crate::error::RenderError;

/// RGB565 color (16-bit: 5 red, 6 green, 5 blue)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb565(pub u16);

impl Rgb565 {
    pub const BLACK: Self = Self(0x0000);
    pub const WHITE: Self = Self(0xFFFF);
    pub const RED: Self = Self(0xF800);
    pub const GREEN: Self = Self(0x07E0);
    pub const BLUE: Self = Self(0x001F);

    /// Create RGB565 from RGB888 components
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let r5 = (r >> 3) as u16;
        let g6 = (g >> 2) as u16;
        let b5 = (b >> 3) as u16;
        Self((r5 << 11) | (g6 << 5) | b5)
    }

    /// Expand back to RGB888, replicating the high bits into the low ones
    pub const fn to_rgb(self) -> (u8, u8, u8) {
        let r5 = ((self.0 >> 11) & 0x1f) as u8;
        let g6 = ((self.0 >> 5) & 0x3f) as u8;
        let b5 = (self.0 & 0x1f) as u8;
        ((r5 << 3) | (r5 >> 2), (g6 << 2) | (g6 >> 4), (b5 << 3) | (b5 >> 2))
    }
}

/// Heap framebuffer of arbitrary size
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    buffer: Vec<u16>,
}

impl Framebuffer {
    /// Create a new framebuffer initialized to black
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            buffer: vec![0; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get pixel at coordinates
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Rgb565> {
        if x < self.width && y < self.height {
            let idx = (y as usize) * (self.width as usize) + (x as usize);
            Some(Rgb565(self.buffer[idx]))
        } else {
            None
        }
    }

    /// Set pixel at coordinates (bounds-checked)
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgb565) -> bool {
        if x < self.width && y < self.height {
            let idx = (y as usize) * (self.width as usize) + (x as usize);
            self.buffer[idx] = color.0;
            true
        } else {
            false
        }
    }

    /// Clear framebuffer to a solid color
    pub fn clear(&mut self, color: Rgb565) {
        self.buffer.fill(color.0);
    }

    /// Get raw buffer for DMA transfer
    pub fn as_slice(&self) -> &[u16] {
        &self.buffer
    }

    /// Copy `logo` with its top-left corner at (`x`, `y`). Fails without
    /// touching any pixel if the logo would not fit entirely.
    pub fn blit(&mut self, x: u32, y: u32, logo: &Logo, palette: &[Rgb565]) -> bool {
        if x + logo.width() > self.width || y + logo.height() > self.height {
            return false;
        }

        for row in 0..logo.height() {
            let start = ((y + row) as usize) * (self.width as usize) + x as usize;
            for col in 0..logo.width() {
                let color = logo
                    .index_at(col, row)
                    .and_then(|i| palette.get(i as usize))
                    .copied()
                    .unwrap_or(Rgb565::BLACK);
                self.buffer[start + col as usize] = color.0;
            }
        }
        true
    }

    /// Write a binary PPM (P6) snapshot
    pub fn write_ppm(&self, path: &Path) -> std::io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;
        for &pixel in &self.buffer {
            let (r, g, b) = Rgb565(pixel).to_rgb();
            out.write_all(&[r, g, b])?;
        }
        out.flush()
    }
}

/// [`Renderer`] backed by an in-memory [`Framebuffer`].
///
/// The framebuffer and logo can be detached to model a console without
/// a bound display or a missing boot logo.
pub struct FramebufferRenderer {
    fb: Option<Framebuffer>,
    logo: Option<Arc<Logo>>,
    paints: u64,
    last_painted: Option<Position>,
}

impl FramebufferRenderer {
    pub fn new(fb: Framebuffer, logo: Logo) -> Self {
        Self {
            fb: Some(fb),
            logo: Some(Arc::new(logo)),
            paints: 0,
            last_painted: None,
        }
    }

    pub fn framebuffer(&self) -> Option<&Framebuffer> {
        self.fb.as_ref()
    }

    /// Unbind the framebuffer, returning it
    pub fn detach_framebuffer(&mut self) -> Option<Framebuffer> {
        self.fb.take()
    }

    pub fn attach_framebuffer(&mut self, fb: Framebuffer) {
        self.fb = Some(fb);
    }

    pub fn detach_logo(&mut self) -> Option<Arc<Logo>> {
        self.logo.take()
    }

    /// Number of successful paints
    pub fn paint_count(&self) -> u64 {
        self.paints
    }

    pub fn last_painted(&self) -> Option<Position> {
        self.last_painted
    }
}

impl Renderer for FramebufferRenderer {
    fn surface(&self) -> Option<Surface> {
        self.fb.as_ref().map(|fb| Surface {
            width: fb.width(),
            height: fb.height(),
        })
    }

    fn logo(&self) -> Option<Arc<Logo>> {
        self.logo.clone()
    }

    fn paint(&mut self, position: Position, logo: &Logo) -> Result<(), RenderError> {
        let fb = self.fb.as_mut().ok_or(RenderError::SurfaceUnavailable)?;

        let surface = Surface {
            width: fb.width(),
            height: fb.height(),
        };
        let bounds = Bounds::for_logo(surface, logo).map_err(|_| RenderError::LogoUnavailable)?;
        if bounds.out_of_range(position) {
            return Err(RenderError::OutOfRange {
                x: position.x,
                y: position.y,
            });
        }

        fb.clear(Rgb565::BLACK);
        let palette = logo.true_palette();
        fb.blit(position.x as u32, position.y as u32, logo, &palette);

        self.paints += 1;
        self.last_painted = Some(position);
        Ok(())
    }
}
