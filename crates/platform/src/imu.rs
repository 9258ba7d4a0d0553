//! Inertial measurement unit abstraction

/// Acceleration on three axes, in g.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Acceleration {
    /// X axis
    pub x: f32,
    /// Y axis
    pub y: f32,
    /// Z axis
    pub z: f32,
}

/// Accelerometer driver (MPU6886 on the handheld).
pub trait Accelerometer {
    /// Error type
    type Error: core::fmt::Debug;

    /// Sample all three axes.
    fn acceleration(&mut self) -> Result<Acceleration, Self::Error>;
}
