//! Desired motion of the drone
//!
//! The velocity is never sent on its own: the keepalive loop picks up
//! whatever is stored here on its next tick.

/// Four-axis drive intensity. All zero means hover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Velocity {
    /// Roll (left/right)
    pub x: i8,
    /// Pitch (forward/back)
    pub y: i8,
    /// Vertical (up/down)
    pub z: i8,
    /// Yaw rotation
    pub w: i8,
}

impl Velocity {
    /// Hover in place
    pub const HOVER: Velocity = Velocity { x: 0, y: 0, z: 0, w: 0 };

    /// Whether any axis asks for motion
    pub fn is_moving(&self) -> bool {
        self.x != 0 || self.y != 0 || self.z != 0 || self.w != 0
    }

    /// Reset all four axes to zero
    pub fn hover(&mut self) {
        *self = Self::HOVER;
    }

    /// Replace the vector with `drive`; axes it leaves unset become zero.
    ///
    /// Magnitudes are passed through unchecked, the firmware clamps them.
    pub fn drive(&mut self, drive: DriveVector) {
        self.hover();

        if let Some(x) = drive.x {
            self.x = x;
        }
        if let Some(y) = drive.y {
            self.y = y;
        }
        if let Some(z) = drive.z {
            self.z = z;
        }
        if let Some(w) = drive.w {
            self.w = w;
        }
    }
}

/// A possibly partial drive request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriveVector {
    pub x: Option<i8>,
    pub y: Option<i8>,
    pub z: Option<i8>,
    pub w: Option<i8>,
}

impl DriveVector {
    /// Empty request (equivalent to hover)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn x(mut self, value: i8) -> Self {
        self.x = Some(value);
        self
    }

    pub fn y(mut self, value: i8) -> Self {
        self.y = Some(value);
        self
    }

    pub fn z(mut self, value: i8) -> Self {
        self.z = Some(value);
        self
    }

    pub fn w(mut self, value: i8) -> Self {
        self.w = Some(value);
        self
    }
}

impl From<Velocity> for DriveVector {
    fn from(v: Velocity) -> Self {
        Self {
            x: Some(v.x),
            y: Some(v.y),
            z: Some(v.z),
            w: Some(v.w),
        }
    }
}
