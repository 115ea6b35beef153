pub use super::*;
pub use burn::config::Config;

use std::{collections::HashMap, fs::File, io::BufReader, path::Path};

#[derive(Config, Debug, PartialEq)]
pub struct DepthLoaderConfig {
    /// The directory of the depth maps relative to the root.
    ///
    /// Each image has a depth map named `<image_name>.npy`.
    #[config(default = "String::from(\"estimated_depths\")")]
    pub depth_dir: String,

    /// Rescaling the depth maps with the per-image corrections.
    #[config(default = true)]
    pub depth_rescaling: bool,

    /// The file stem of the per-image corrections relative to the root.
    ///
    /// The file is in JSON, i.e., `{ <image_name>: { "scale": .., "offset": .. } }`.
    #[config(default = "String::from(\"estimated_depth_scales\")")]
    pub depth_scale_name: String,

    /// The lower bound of a scale relative to the median scale.
    #[config(default = 0.2)]
    pub depth_scale_lower_bound: f64,

    /// The upper bound of a scale relative to the median scale.
    #[config(default = 5.0)]
    pub depth_scale_upper_bound: f64,
}

impl DepthLoaderConfig {
    /// Locating the usable depth map of each image in `image_names`.
    ///
    /// An image is skipped with a warning if it has no depth map,
    /// has no correction, or has a scale out of the bounds.
    ///
    /// ## Errors
    ///
    /// - [`Error::MissingDepthScale`] if the corrections file is absent.
    /// - [`Error::NoDepthMaps`] if no image has a usable depth map.
    pub fn load<S: AsRef<str>>(
        &self,
        root: impl AsRef<Path>,
        image_names: impl IntoIterator<Item = S>,
    ) -> Result<DepthMaps, Error> {
        let root = root.as_ref();

        let scales = if self.depth_rescaling {
            let path = root.join(format!("{}.json", self.depth_scale_name));
            if !path.is_file() {
                return Err(Error::MissingDepthScale(path));
            }
            let reader = BufReader::new(File::open(&path)?);
            let scales = serde_json::from_reader::<_, HashMap<String, DepthScale>>(reader)?;
            let median = median(scales.values().map(|scale| scale.scale).collect());
            Some((scales, median))
        } else {
            None
        };

        let entries = image_names
            .into_iter()
            .map(|image_name| {
                let image_name = image_name.as_ref();
                let path = root.join(&self.depth_dir).join(format!("{image_name}.npy"));
                if !path.is_file() {
                    log::warn!(
                        target: "gausplat::refiner::depth",
                        "{image_name} does not have a depth map",
                    );
                    return None;
                }

                let scale = match &scales {
                    Some((scales, median)) => {
                        let Some(scale) = scales.get(image_name) else {
                            log::warn!(
                                target: "gausplat::refiner::depth",
                                "{image_name} does not have a depth scale",
                            );
                            return None;
                        };
                        if scale.scale < self.depth_scale_lower_bound * median
                            || scale.scale > self.depth_scale_upper_bound * median
                        {
                            log::warn!(
                                target: "gausplat::refiner::depth",
                                "The depth scale of {image_name} is out of bound",
                            );
                            return None;
                        }
                        *scale
                    },
                    None => DepthScale::default(),
                };

                Some(DepthEntry { path, scale })
            })
            .collect::<Vec<_>>();

        let maps = DepthMaps { entries };
        let count = maps.count();
        if count == 0 {
            return Err(Error::NoDepthMaps);
        }

        log::info!(
            target: "gausplat::refiner::depth",
            "Found {count} depth maps",
        );

        Ok(maps)
    }
}

impl Default for DepthLoaderConfig {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// The median of `values`.
///
/// It is the mean of the two middle values if the count is even,
/// and `NaN` if there is no value.
fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);

    let count = values.len();
    match count {
        0 => f64::NAN,
        _ if count % 2 == 1 => values[count / 2],
        _ => (values[count / 2 - 1] + values[count / 2]) / 2.0,
    }
}
