//! Display geometry and rendering
//!
//! The engine never draws pixels itself. It asks a [`Renderer`] for the
//! active surface and logo asset, and hands it the position to paint.

pub mod framebuffer;
pub mod logo;

use std::sync::Arc;

use crate::error::{Error, RenderError, Result};

pub use framebuffer::{Framebuffer, FramebufferRenderer, Rgb565};
pub use logo::Logo;

/// Top-left corner of the marker, in surface pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Visible surface size in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
}

/// Largest legal marker coordinate on each axis
/// (surface extent minus marker extent)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
}

impl Bounds {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Bounds for a `logo` moving over `surface`. Fails if the logo does
    /// not fit.
    pub fn for_logo(surface: Surface, logo: &Logo) -> Result<Self> {
        if logo.width() > surface.width || logo.height() > surface.height {
            return Err(Error::init_failure(format!(
                "logo {}x{} does not fit surface {}x{}",
                logo.width(),
                logo.height(),
                surface.width,
                surface.height
            )));
        }
        Ok(Self {
            x: (surface.width - logo.width()) as i32,
            y: (surface.height - logo.height()) as i32,
        })
    }

    /// Sitting exactly on an edge of either axis
    pub fn reaches_edge(&self, p: Position) -> bool {
        p.x == 0 || p.x == self.x || p.y == 0 || p.y == self.y
    }

    /// Outside the legal area on either axis
    pub fn out_of_range(&self, p: Position) -> bool {
        p.x < 0 || p.x > self.x || p.y < 0 || p.y > self.y
    }

    /// Marker position centred on a touch point, kept inside the bounds.
    ///
    /// `half` is half the marker extent per axis. Each axis goes to `0`
    /// when centring would cross the low edge, to the bound when the touch
    /// itself lies past the bound, and to `touch - half` otherwise.
    pub fn touch_target(&self, touch_x: i32, touch_y: i32, half: (i32, i32)) -> Position {
        Position {
            x: centre_on_touch(touch_x, half.0, self.x),
            y: centre_on_touch(touch_y, half.1, self.y),
        }
    }
}

fn centre_on_touch(touch: i32, half: i32, bound: i32) -> i32 {
    let centred = touch.saturating_sub(half);
    if centred < 0 {
        0
    } else if touch > bound {
        bound
    } else {
        centred
    }
}

/// Paints the marker on the active display.
///
/// Implementations report missing resources per call; the engine logs and
/// skips the tick rather than failing.
pub trait Renderer {
    /// Geometry of the surface bound to the active console
    fn surface(&self) -> Option<Surface>;

    /// Handle to the logo asset
    fn logo(&self) -> Option<Arc<Logo>>;

    /// Draw `logo` with its top-left corner at `position`
    fn paint(&mut self, position: Position, logo: &Logo) -> std::result::Result<(), RenderError>;
}

impl<T: Renderer + ?Sized> Renderer for Box<T> {
    fn surface(&self) -> Option<Surface> {
        (**self).surface()
    }

    fn logo(&self) -> Option<Arc<Logo>> {
        (**self).logo()
    }

    fn paint(&mut self, position: Position, logo: &Logo) -> std::result::Result<(), RenderError> {
        (**self).paint(position, logo)
    }
}
