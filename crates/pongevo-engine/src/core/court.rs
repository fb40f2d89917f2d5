//! Court dimensions.

/// Horizontal extent of the court, goal line to goal line.
pub const WIDTH: f64 = 800.0;

/// Vertical extent of the court, top wall to bottom wall.
///
/// Observations are normalized by this value.
pub const HEIGHT: f64 = 600.0;

/// Horizontal coordinate of the serve point.
pub const CENTER_X: f64 = WIDTH / 2.0;

/// Vertical coordinate of the serve point.
pub const CENTER_Y: f64 = HEIGHT / 2.0;
