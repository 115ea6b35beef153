/// A colored point of the initial point cloud.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    /// Normalized
    pub color_rgb: [f32; 3],
    pub position: [f64; 3],
}
