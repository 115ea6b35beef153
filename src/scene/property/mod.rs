//! Per-point property implementation.

pub mod import;
pub mod set;

pub use super::*;
pub use import::*;
pub use set::*;

use std::fmt;

/// A tensor whose first dimension is the point dimension.
///
/// The value is stored in the shape of `[N, C]`, which derives from `[N, ...]`.
/// - `N` is [`Self::point_count`].
/// - `C` is [`Self::item_size`], the product of [`Self::item_dims`].
///
/// Every row operation (concatenation, selection, masking) acts on the
/// first dimension only, so the flattening never reorders any element.
#[derive(Clone)]
pub struct Property<B: Backend> {
    value: Tensor<B, 2>,
    item_dims: Vec<usize>,
}

impl<B: Backend> Property<B> {
    /// Wrapping a tensor of any rank.
    ///
    /// A tensor of shape `[N]` has no item dimensions and `C = 1`.
    pub fn new<const D: usize>(tensor: Tensor<B, D>) -> Self {
        let dims = tensor.dims();
        let point_count = dims[0];
        let item_dims = dims[1..].to_vec();
        let item_size = item_dims.iter().product::<usize>();

        Self {
            value: tensor.reshape([point_count, item_size]),
            item_dims,
        }
    }

    /// Wrapping a flattened value of the shape `[N, C]`.
    pub fn from_value(
        value: Tensor<B, 2>,
        item_dims: Vec<usize>,
    ) -> Result<Self, Error> {
        let item_size = item_dims.iter().product::<usize>();
        let [point_count, item_size_value] = value.dims();
        if item_size_value != item_size {
            return Err(Error::ShapeMismatch(
                "value".into(),
                vec![point_count, item_size],
                vec![point_count, item_size_value],
            ));
        }

        Ok(Self { value, item_dims })
    }

    /// Wrapping a flattened value without validation.
    ///
    /// The caller guarantees that the item size matches `item_dims`.
    #[inline]
    pub(crate) fn from_parts(
        value: Tensor<B, 2>,
        item_dims: Vec<usize>,
    ) -> Self {
        debug_assert_eq!(value.dims()[1], item_dims.iter().product::<usize>());
        Self { value, item_dims }
    }

    /// The flattened value.
    ///
    /// The shape is `[N, C]`.
    #[inline]
    pub fn value(&self) -> &Tensor<B, 2> {
        &self.value
    }

    #[inline]
    pub fn into_value(self) -> Tensor<B, 2> {
        self.value
    }

    /// Dimensions after the point dimension.
    #[inline]
    pub fn item_dims(&self) -> &[usize] {
        &self.item_dims
    }

    /// Number of elements per point.
    #[inline]
    pub fn item_size(&self) -> usize {
        self.value.dims()[1]
    }

    /// Number of points.
    #[inline]
    pub fn point_count(&self) -> usize {
        self.value.dims()[0]
    }

    /// The unflattened dimensions, i.e., `[N, ...]`.
    pub fn dims(&self) -> Vec<usize> {
        [&[self.point_count()], self.item_dims.as_slice()].concat()
    }

    /// Restoring the tensor in its original rank.
    pub fn to_tensor<const D: usize>(&self) -> Result<Tensor<B, D>, Error> {
        let dims_source = self.dims();
        if dims_source.len() != D {
            return Err(Error::ShapeMismatch(
                "rank".into(),
                vec![dims_source.len()],
                vec![D],
            ));
        }

        let mut dims = [0; D];
        dims.copy_from_slice(&dims_source);

        Ok(self.value.to_owned().reshape(dims))
    }
}

impl<B: Backend> fmt::Debug for Property<B> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("Property")
            .field("dims()", &self.dims())
            .field("value.dims()", &self.value.dims())
            .finish()
    }
}
