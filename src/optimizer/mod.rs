//! Optimizer handles owning named parameters and their momentum states.

pub mod state;

pub use crate::{
    error::Error,
    scene::{Property, PropertySet},
};
pub use burn::{
    module::{Param, ParamId},
    tensor::{
        backend::{AutodiffBackend, Backend},
        Tensor,
    },
};
pub use state::*;

/// A name bound to the parameter an optimizer currently optimizes.
#[derive(Clone, Debug)]
pub struct ParamGroup<B: AutodiffBackend> {
    name: String,
    /// `[N, C]`
    parameter: Param<Tensor<B, 2>>,
    item_dims: Vec<usize>,
}

impl<B: AutodiffBackend> ParamGroup<B> {
    /// Binding `name` to a fresh parameter holding the value of `property`.
    pub fn new(
        name: impl Into<String>,
        property: &Property<B>,
    ) -> Self {
        Self {
            name: name.into(),
            parameter: make_leaf(property.value().to_owned().inner()),
            item_dims: property.item_dims().to_vec(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The identity of the current parameter.
    #[inline]
    pub fn id(&self) -> &ParamId {
        &self.parameter.id
    }

    #[inline]
    pub fn parameter(&self) -> &Param<Tensor<B, 2>> {
        &self.parameter
    }

    #[inline]
    pub fn item_dims(&self) -> &[usize] {
        &self.item_dims
    }

    /// The shape is `[N, C]`.
    #[inline]
    pub fn dims(&self) -> [usize; 2] {
        self.parameter.val().dims()
    }

    /// Number of points.
    #[inline]
    pub fn point_count(&self) -> usize {
        self.dims()[0]
    }

    /// The current parameter as a property.
    #[inline]
    pub fn to_property(&self) -> Property<B> {
        Property::from_parts(self.parameter.val(), self.item_dims.to_owned())
    }

    /// Installing a fresh parameter holding `value`.
    ///
    /// It returns the identity of the installed parameter.
    pub(crate) fn install(
        &mut self,
        value: Tensor<B::InnerBackend, 2>,
    ) -> ParamId {
        self.parameter = make_leaf(value);
        self.parameter.id.to_owned()
    }
}

/// An optimizer instance owning an ordered list of parameter groups
/// and the momentum states of them.
#[derive(Clone, Debug)]
pub struct OptimizerHandle<B: AutodiffBackend> {
    groups: Vec<ParamGroup<B>>,
    states: StateStore<B::InnerBackend>,
}

impl<B: AutodiffBackend> OptimizerHandle<B> {
    /// Creating a stateless optimizer over `groups`.
    ///
    /// ## Errors
    ///
    /// - [`Error::DuplicateProperty`] if a name repeats.
    pub fn new(groups: Vec<ParamGroup<B>>) -> Result<Self, Error> {
        for (index, group) in groups.iter().enumerate() {
            if groups[..index].iter().any(|other| other.name == group.name) {
                return Err(Error::DuplicateProperty(group.name.to_owned()));
            }
        }

        Ok(Self {
            groups,
            states: Default::default(),
        })
    }

    /// Creating a stateless optimizer over the properties named `names`.
    ///
    /// ## Errors
    ///
    /// - [`Error::KeyMismatch`] if a name is absent from `properties`.
    /// - [`Error::DuplicateProperty`] if a name repeats.
    pub fn from_properties(
        properties: &PropertySet<B>,
        names: &[&str],
    ) -> Result<Self, Error> {
        let groups = names
            .iter()
            .map(|&name| {
                properties
                    .get(name)
                    .map(|property| ParamGroup::new(name, property))
                    .ok_or_else(|| {
                        Error::KeyMismatch(properties.names(), vec![name.into()])
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(groups)
    }
}

/// Parameter group access
impl<B: AutodiffBackend> OptimizerHandle<B> {
    #[inline]
    pub fn groups(&self) -> &[ParamGroup<B>] {
        &self.groups
    }

    pub fn group(
        &self,
        name: &str,
    ) -> Option<&ParamGroup<B>> {
        self.groups.iter().find(|group| group.name == name)
    }

    /// Group names in group order.
    pub fn names(&self) -> Vec<String> {
        self.groups.iter().map(|group| group.name.to_owned()).collect()
    }

    #[inline]
    pub(crate) fn group_mut(
        &mut self,
        index: usize,
    ) -> &mut ParamGroup<B> {
        &mut self.groups[index]
    }
}

/// Momentum state access
impl<B: AutodiffBackend> OptimizerHandle<B> {
    #[inline]
    pub fn states(&self) -> &StateStore<B::InnerBackend> {
        &self.states
    }

    #[inline]
    pub(crate) fn states_mut(&mut self) -> &mut StateStore<B::InnerBackend> {
        &mut self.states
    }

    /// The momentum state of the current parameter named `name`.
    pub fn state(
        &self,
        name: &str,
    ) -> Option<&MomentumState<B::InnerBackend>> {
        self.states.get(self.group(name)?.id())
    }

    #[inline]
    pub fn has_state(
        &self,
        name: &str,
    ) -> bool {
        self.state(name).is_some()
    }

    /// Recording the momentum state of the current parameter named `name`.
    ///
    /// It returns the previous state if any.
    ///
    /// ## Errors
    ///
    /// - [`Error::KeyMismatch`] if no group is named `name`.
    /// - [`Error::ShapeMismatch`] if the moments are not shaped like the parameter.
    pub fn insert_state(
        &mut self,
        name: &str,
        state: MomentumState<B::InnerBackend>,
    ) -> Result<Option<MomentumState<B::InnerBackend>>, Error> {
        let group = self
            .group(name)
            .ok_or_else(|| Error::KeyMismatch(self.names(), vec![name.into()]))?;

        let dims = group.dims();
        for dims_moment in [state.exp_avg.dims(), state.exp_avg_sq.dims()] {
            if dims_moment != dims {
                return Err(Error::ShapeMismatch(
                    name.into(),
                    dims.into(),
                    dims_moment.into(),
                ));
            }
        }

        let id = group.id().to_owned();
        Ok(self.states.insert(id, state))
    }

    /// Forgetting the momentum state of the current parameter named `name`.
    pub fn remove_state(
        &mut self,
        name: &str,
    ) -> Option<MomentumState<B::InnerBackend>> {
        let id = self.group(name)?.id().to_owned();
        self.states.take(&id)
    }
}

/// Making a fresh leaf parameter with gradient tracking and a new identity.
#[inline]
pub(crate) fn make_leaf<B: AutodiffBackend>(
    value: Tensor<B::InnerBackend, 2>
) -> Param<Tensor<B, 2>> {
    Param::initialized(ParamId::new(), Tensor::from_inner(value).require_grad())
}
