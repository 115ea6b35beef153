//! Splat property import implementation.

pub use super::*;

use crate::spherical_harmonics::{rgb_to_sh_dc, SH_COUNT_MAX};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// `[P, 3]`
pub const MEANS: &str = "means";
/// `[P, 1]`
pub const OPACITIES: &str = "opacities";
/// `[P, 4]` (x, y, z, w)
pub const ROTATIONS: &str = "rotations";
/// `[P, 3]`
pub const SCALES: &str = "scales";
/// `[P, 1, 3]`
pub const SHS_DC: &str = "shs_dc";
/// `[P, M - 1, 3]`
pub const SHS_REST: &str = "shs_rest";

/// The seed of the random scales.
pub const SEED: u64 = 0x3D65;

/// The initial opacity before the logit.
pub const OPACITY_INIT: f32 = 0.1;

/// Splat importers
impl<B: Backend> PropertySet<B> {
    /// Import the splat properties from the point cloud.
    ///
    /// All the values are inner values, i.e., before any activation.
    pub fn from_points(
        points: &[Point],
        device: &B::Device,
    ) -> Result<Self, Error> {
        // P
        let point_count = points.len();

        // ([P, 3], [P, 3])
        let (colors_sh_dc, positions) = points.iter().fold(
            (
                Vec::<f32>::with_capacity(point_count * 3),
                Vec::<f64>::with_capacity(point_count * 3),
            ),
            |(mut colors_sh_dc, mut positions), point| {
                colors_sh_dc.extend(point.color_rgb.map(rgb_to_sh_dc));
                positions.extend(point.position);
                (colors_sh_dc, positions)
            },
        );

        // [P, 3]
        let means = Tensor::<B, 2>::from_data(
            TensorData::new(positions, [point_count, 3]),
            device,
        );

        // [P, 1, 3]
        let shs_dc = Tensor::<B, 3>::from_data(
            TensorData::new(colors_sh_dc, [point_count, 1, 3]),
            device,
        );

        // [P, M - 1, 3]
        let shs_rest =
            Tensor::<B, 3>::zeros([point_count, SH_COUNT_MAX - 1, 3], device);

        // [P, 1]
        let opacities = Tensor::<B, 2>::full(
            [point_count, 1],
            (OPACITY_INIT / (1.0 - OPACITY_INIT)).ln(),
            device,
        );

        // [P, 4] (x, y, z, w)
        let rotations = Tensor::<B, 2>::from_data(
            TensorData::new(
                [0.0, 0.0, 0.0, 1.0_f32].repeat(point_count),
                [point_count, 4],
            ),
            device,
        );

        // [P, 3]
        let scales = {
            let distribution =
                rand_distr::LogNormal::new(0.0, std::f32::consts::E)?;
            let mut sample_max = f32::EPSILON;
            let samples = StdRng::seed_from_u64(SEED)
                .sample_iter(distribution)
                .take(point_count)
                .map(|mut sample| {
                    sample = sample.max(f32::EPSILON);
                    sample_max = sample_max.max(sample);
                    sample
                })
                .collect::<Vec<_>>();

            Tensor::<B, 2>::from_data(
                TensorData::new(samples, [point_count, 1]),
                device,
            )
            .div_scalar(sample_max)
            .sqrt()
            .clamp_min(f32::EPSILON)
            .log()
            .repeat_dim(1, 3)
        };

        let properties = Self::default()
            .with(MEANS, means)?
            .with(OPACITIES, opacities)?
            .with(ROTATIONS, rotations)?
            .with(SCALES, scales)?
            .with(SHS_DC, shs_dc)?
            .with(SHS_REST, shs_rest)?;

        #[cfg(all(debug_assertions, not(test)))]
        log::debug!(
            target: "gausplat::refiner::scene",
            "from_points > {} points ({})",
            properties.point_count(),
            properties.size_readable(),
        );

        Ok(properties)
    }
}
