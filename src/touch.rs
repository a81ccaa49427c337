//! Touch input types
//!
//! Touch controllers report events; the engine only needs the latest
//! coordinates and whether a finger is down, kept in [`TouchState`].

/// Touch point with screen coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TouchPoint {
    /// X coordinate
    pub x: u16,
    /// Y coordinate
    pub y: u16,
    /// Pressure (0 = no touch, higher = more pressure)
    pub pressure: u16,
}

impl TouchPoint {
    /// Create a touch point with default pressure
    pub const fn at(x: u16, y: u16) -> Self {
        Self { x, y, pressure: 255 }
    }
}

/// Touch event types
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchEvent {
    /// Finger touched the screen
    Down(TouchPoint),
    /// Finger moved while touching
    Move(TouchPoint),
    /// Finger lifted from screen
    Up,
}

impl TouchEvent {
    /// Get the touch point if this is a Down or Move event
    pub fn point(&self) -> Option<TouchPoint> {
        match self {
            TouchEvent::Down(p) | TouchEvent::Move(p) => Some(*p),
            TouchEvent::Up => None,
        }
    }
}

/// Latest touch report as seen by the engine
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TouchState {
    pub x: i32,
    pub y: i32,
    pub active: bool,
}

impl TouchState {
    /// Fold one report into the state. Returns `true` if anything changed.
    ///
    /// A release clears `active` but keeps the last coordinates; a report
    /// at the stored coordinates while already active is ignored.
    pub fn update(&mut self, x: i32, y: i32, detected: bool) -> bool {
        if !detected {
            let was_active = self.active;
            self.active = false;
            return was_active;
        }

        if self.active && self.x == x && self.y == y {
            return false;
        }

        self.x = x;
        self.y = y;
        self.active = true;
        true
    }
}
