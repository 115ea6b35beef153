//! Named property collection implementation.

pub use super::*;

use humansize::{format_size, BINARY};
use std::collections::{btree_map, BTreeMap};

/// Named per-point properties sharing the same point count.
///
/// It is never mutated in place after construction. The refiner produces
/// a new set instead.
#[derive(Clone)]
pub struct PropertySet<B: Backend> {
    properties: BTreeMap<String, Property<B>>,
}

impl<B: Backend> PropertySet<B> {
    /// Collecting the properties.
    ///
    /// ## Errors
    ///
    /// - [`Error::ShapeMismatch`] if the point counts differ.
    /// - [`Error::DuplicateProperty`] if a name repeats.
    pub fn new<S: Into<String>>(
        properties: impl IntoIterator<Item = (S, Property<B>)>
    ) -> Result<Self, Error> {
        properties
            .into_iter()
            .try_fold(Self::default(), |set, (name, property)| {
                set.with_property(name, property)
            })
    }

    /// Collecting the properties without validation.
    ///
    /// The caller guarantees that the point counts are the same.
    #[inline]
    pub(crate) fn from_parts(properties: BTreeMap<String, Property<B>>) -> Self {
        debug_assert!(properties
            .values()
            .zip(properties.values().skip(1))
            .all(|(a, b)| a.point_count() == b.point_count()));
        Self { properties }
    }

    /// Adding a tensor of any rank as a property.
    #[inline]
    pub fn with<const D: usize>(
        self,
        name: impl Into<String>,
        tensor: Tensor<B, D>,
    ) -> Result<Self, Error> {
        self.with_property(name, Property::new(tensor))
    }

    /// Adding a property.
    pub fn with_property(
        mut self,
        name: impl Into<String>,
        property: Property<B>,
    ) -> Result<Self, Error> {
        let name = name.into();

        if self.properties.contains_key(&name) {
            return Err(Error::DuplicateProperty(name));
        }
        if !self.is_empty() && property.point_count() != self.point_count() {
            let mut dims_expected = property.dims();
            dims_expected[0] = self.point_count();
            return Err(Error::ShapeMismatch(
                name,
                dims_expected,
                property.dims(),
            ));
        }

        self.properties.insert(name, property);
        Ok(self)
    }
}

/// Read access
impl<B: Backend> PropertySet<B> {
    #[inline]
    pub fn contains(
        &self,
        name: &str,
    ) -> bool {
        self.properties.contains_key(name)
    }

    #[inline]
    pub fn get(
        &self,
        name: &str,
    ) -> Option<&Property<B>> {
        self.properties.get(name)
    }

    /// Restoring the tensor of the property in its original rank.
    pub fn tensor<const D: usize>(
        &self,
        name: &str,
    ) -> Result<Tensor<B, D>, Error> {
        self.get(name)
            .ok_or_else(|| Error::KeyMismatch(self.names(), vec![name.into()]))?
            .to_tensor()
    }

    #[inline]
    pub fn iter(&self) -> btree_map::Iter<'_, String, Property<B>> {
        self.properties.iter()
    }

    /// Property names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.properties.keys().cloned().collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Number of points, or `0` if there is no property.
    #[inline]
    pub fn point_count(&self) -> usize {
        self.properties
            .values()
            .next()
            .map(Property::point_count)
            .unwrap_or_default()
    }

    /// Size of the properties in bytes.
    pub fn size(&self) -> usize {
        self.properties
            .values()
            .map(|property| property.point_count() * property.item_size())
            .sum::<usize>()
            * size_of::<B::FloatElem>()
    }

    /// Readable size of the properties.
    #[inline]
    pub fn size_readable(&self) -> String {
        format_size(self.size(), BINARY.decimal_places(1))
    }
}

impl<B: Backend> Default for PropertySet<B> {
    fn default() -> Self {
        Self {
            properties: Default::default(),
        }
    }
}

impl<B: Backend> fmt::Debug for PropertySet<B> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct(&format!("PropertySet<{}>", B::name()))
            .field("point_count", &self.point_count())
            .field("size", &self.size_readable())
            .field("properties", &self.properties)
            .finish()
    }
}

impl<B: Backend> IntoIterator for PropertySet<B> {
    type IntoIter = btree_map::IntoIter<String, Property<B>>;
    type Item = (String, Property<B>);

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.properties.into_iter()
    }
}

impl<'a, B: Backend> IntoIterator for &'a PropertySet<B> {
    type IntoIter = btree_map::Iter<'a, String, Property<B>>;
    type Item = (&'a String, &'a Property<B>);

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.properties.iter()
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn new_with_common_point_count() {
        use super::*;
        use burn::{backend::NdArray, tensor::Distribution};

        let device = Default::default();

        let set = PropertySet::<NdArray<f32>>::default()
            .with(
                "means",
                Tensor::<_, 2>::random([8, 3], Distribution::Default, &device),
            )
            .unwrap()
            .with(
                "shs_rest",
                Tensor::<_, 3>::random([8, 15, 3], Distribution::Default, &device),
            )
            .unwrap()
            .with("no_state", Tensor::<_, 1>::zeros([8], &device))
            .unwrap();

        assert_eq!(set.len(), 3);
        assert_eq!(set.point_count(), 8);
        assert_eq!(set.names(), ["means", "no_state", "shs_rest"]);
        assert_eq!(set.size(), 8 * (3 + 1 + 45) * 4);
        assert_eq!(set.tensor::<3>("shs_rest").unwrap().dims(), [8, 15, 3]);
        assert!(set.contains("no_state"));
        assert!(!set.contains("scales"));
    }

    #[test]
    fn new_with_mismatched_point_count() {
        use super::*;
        use burn::backend::NdArray;

        let device = Default::default();

        let output = PropertySet::new([
            (
                "means",
                Property::new(Tensor::<NdArray<f32>, 2>::zeros([8, 3], &device)),
            ),
            (
                "scales",
                Property::new(Tensor::<NdArray<f32>, 2>::zeros([7, 3], &device)),
            ),
        ]);

        match output {
            Err(Error::ShapeMismatch(name, expected, actual)) => {
                assert_eq!(name, "scales");
                assert_eq!(expected, [8, 3]);
                assert_eq!(actual, [7, 3]);
            },
            other => panic!("Unexpected output: {other:?}"),
        }
    }

    #[test]
    fn new_with_duplicate_name() {
        use super::*;
        use burn::backend::NdArray;

        let device = Default::default();

        let output = PropertySet::<NdArray<f32>>::default()
            .with("means", Tensor::<_, 2>::zeros([2, 3], &device))
            .unwrap()
            .with("means", Tensor::<_, 2>::zeros([2, 3], &device));

        assert!(
            matches!(output, Err(Error::DuplicateProperty(ref name)) if name == "means"),
            "{output:?}"
        );
    }

    #[test]
    fn tensor_with_unknown_name() {
        use super::*;
        use burn::backend::NdArray;

        let set = PropertySet::<NdArray<f32>>::default();

        let output = set.tensor::<2>("means");
        assert!(matches!(output, Err(Error::KeyMismatch(..))), "{output:?}");
    }
}
