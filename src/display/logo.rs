//! Logo assets
//!
//! Logos are stored as 8-bit palette indices with a colour lookup table,
//! like the boot logos they stand in for.

use super::framebuffer::Rgb565;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logo {
    width: u32,
    height: u32,
    /// One CLUT index per pixel, row-major
    data: Vec<u8>,
    /// Colour lookup table, RGB888
    clut: Vec<[u8; 3]>,
}

// CLUT slots used by the built-in penguin
const BACKGROUND: u8 = 0;
const FEATHERS: u8 = 1;
const BELLY: u8 = 2;
const BEAK: u8 = 3;

impl Logo {
    /// Single-colour rectangle
    pub fn solid(width: u32, height: u32, color: Rgb565) -> Self {
        let (r, g, b) = color.to_rgb();
        Self {
            width,
            height,
            data: vec![0; (width as usize) * (height as usize)],
            clut: vec![[r, g, b]],
        }
    }

    /// Procedural penguin filling a `width` x `height` box
    pub fn tux(width: u32, height: u32) -> Self {
        let w = width as i64;
        let h = height as i64;
        let mut data = vec![BACKGROUND; (width as usize) * (height as usize)];

        // ellipse test in doubled coordinates to stay in integers
        let inside = |px: i64, py: i64, cx: i64, cy: i64, rx: i64, ry: i64| {
            if rx == 0 || ry == 0 {
                return false;
            }
            let dx = (2 * px + 1) - 2 * cx;
            let dy = (2 * py + 1) - 2 * cy;
            dx * dx * ry * ry + dy * dy * rx * rx <= 4 * rx * rx * ry * ry
        };

        for py in 0..h {
            for px in 0..w {
                let idx = (py * w + px) as usize;
                if inside(px, py, w / 2, h * 3 / 5, w * 2 / 5, h * 2 / 5) {
                    data[idx] = FEATHERS;
                }
                if inside(px, py, w / 2, h * 2 / 9, w / 4, h / 5) {
                    data[idx] = FEATHERS;
                }
                if inside(px, py, w / 2, h * 13 / 20, w / 4, h * 3 / 10) {
                    data[idx] = BELLY;
                }
                if inside(px, py, w / 2, h * 3 / 10, w / 10, h / 20) {
                    data[idx] = BEAK;
                }
                if inside(px, py, w * 3 / 10, h * 19 / 20, w / 8, h / 20)
                    || inside(px, py, w * 7 / 10, h * 19 / 20, w / 8, h / 20)
                {
                    data[idx] = BEAK;
                }
            }
        }

        Self {
            width,
            height,
            data,
            clut: vec![[0x00, 0x00, 0x00], [0x20, 0x20, 0x28], [0xf0, 0xf0, 0xf0], [0xf8, 0xc0, 0x10]],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Half extent per axis, used to centre the logo on a touch point
    pub fn half_extent(&self) -> (i32, i32) {
        ((self.width / 2) as i32, (self.height / 2) as i32)
    }

    /// CLUT converted to the display's pixel format
    pub fn true_palette(&self) -> Vec<Rgb565> {
        self.clut
            .iter()
            .map(|&[r, g, b]| Rgb565::from_rgb(r, g, b))
            .collect()
    }

    /// Palette index of the pixel at (`x`, `y`)
    pub fn index_at(&self, x: u32, y: u32) -> Option<u8> {
        if x < self.width && y < self.height {
            Some(self.data[(y * self.width + x) as usize])
        } else {
            None
        }
    }
}
