/// The count of spherical harmonics coefficients per color channel
pub const SH_COUNT_MAX: usize = (SH_DEGREE_MAX as usize + 1).pow(2);

/// The maximum degree of spherical harmonics
pub const SH_DEGREE_MAX: u32 = 3;

/// The real coefficient of orthonormalized spherical harmonic of degree 0,
/// i.e., `sqrt(1 / 4π)`.
///
/// ## Examples
///
/// ```rust
/// use gausplat_refiner::spherical_harmonics::SH_COEF_DC;
///
/// assert!((SH_COEF_DC - (1.0 / 4.0 / std::f64::consts::PI).sqrt()).abs() < 1e-15);
/// ```
pub const SH_COEF_DC: f64 = 0.28209479177387814;

/// Converting the normalized RGB color into the SH coefficient of degree 0.
#[inline]
pub fn rgb_to_sh_dc(color: f32) -> f32 {
    ((color as f64 - 0.5) / SH_COEF_DC) as f32
}
