//! Depth supervision loading.
//!
//! The depth maps are estimated per image and stored as NPY matrices.
//! Each map is corrected by an affine transform, i.e., `depth * scale + offset`.

pub mod config;
pub mod npy;

pub use crate::error::Error;
pub use burn::tensor::{backend::Backend, DType, Tensor, TensorData};
pub use config::*;

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::Deserialize;
use std::{fs::File, io::BufReader, path::PathBuf};

/// The affine correction of an estimated depth map.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct DepthScale {
    pub scale: f64,
    pub offset: f64,
}

impl Default for DepthScale {
    #[inline]
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: 0.0,
        }
    }
}

/// The location and the correction of a usable depth map.
#[derive(Clone, Debug, PartialEq)]
pub struct DepthEntry {
    pub path: PathBuf,
    pub scale: DepthScale,
}

/// Lazily loaded depth maps aligned with the image names.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DepthMaps {
    entries: Vec<Option<DepthEntry>>,
}

impl DepthMaps {
    /// The entry of the image at `index`.
    ///
    /// `None` means that the image has no usable depth map.
    #[inline]
    pub fn entry(
        &self,
        index: usize,
    ) -> Option<&DepthEntry> {
        self.entries.get(index)?.as_ref()
    }

    #[inline]
    pub fn entries(&self) -> &[Option<DepthEntry>] {
        &self.entries
    }

    /// Number of images.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of usable depth maps.
    pub fn count(&self) -> usize {
        self.entries.iter().flatten().count()
    }

    /// Loading the corrected depth map of the image at `index`.
    ///
    /// The shape is `[H, W]`.
    pub fn load<B: Backend>(
        &self,
        index: usize,
        device: &B::Device,
    ) -> Result<Option<Tensor<B, 2>>, Error> {
        self.entry(index)
            .map(|entry| {
                Ok(Tensor::from_data(entry.decode()?, device)
                    .mul_scalar(entry.scale.scale)
                    .add_scalar(entry.scale.offset))
            })
            .transpose()
    }

    /// Decoding every usable depth map in parallel.
    ///
    /// The corrections are applied.
    pub fn decode_all(&self) -> Result<Vec<Option<TensorData>>, Error> {
        let maps = self
            .entries
            .par_iter()
            .map(|entry| {
                entry
                    .as_ref()
                    .map(|entry| {
                        let DepthScale { scale, offset } = entry.scale;
                        let data = entry.decode()?;
                        let shape = data.shape.to_owned();
                        let values = data
                            .iter::<f64>()
                            .map(|depth| (depth * scale + offset) as f32)
                            .collect::<Vec<_>>();
                        Ok(TensorData::new(values, shape))
                    })
                    .transpose()
            })
            .collect::<Result<Vec<_>, Error>>()?;

        #[cfg(all(debug_assertions, not(test)))]
        log::debug!(
            target: "gausplat::refiner::depth",
            "DepthMaps::decode_all > {} maps",
            self.count(),
        );

        Ok(maps)
    }
}

impl DepthEntry {
    /// Decoding the uncorrected depth map.
    pub fn decode(&self) -> Result<TensorData, Error> {
        let reader = &mut BufReader::new(File::open(&self.path)?);
        npy::decode(reader)
    }
}
