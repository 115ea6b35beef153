//! Synchronized surgery on parameters and their momentum states.
//!
//! When the point count of a scene changes, every optimized property
//! is rebuilt as a fresh leaf, and its momentum state (if any) is re-keyed
//! to the new parameter and reshaped in the same way.

pub mod config;
pub mod grow;
pub mod replace;
pub mod shrink;

pub use crate::{
    error::Error,
    optimizer::{MomentumState, OptimizerHandle, ParamGroup, ParamId},
    scene::{Property, PropertySet},
};
pub use burn::tensor::{
    backend::{AutodiffBackend, Backend},
    Bool, Tensor,
};
pub use config::*;

use std::collections::BTreeMap;

/// The location of the group owning a property.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Owner {
    /// The index of the optimizer.
    pub optimizer: usize,
    /// The index of the group in the optimizer.
    pub group: usize,
}

/// Keeping the parameters and the momentum states of several optimizers
/// consistent while the point set grows, shrinks, or gets replaced.
///
/// Each property is owned by exactly one group of one optimizer.
/// The ownership is resolved once in [`StateSurgeonConfig::init`].
#[derive(Clone, Debug)]
pub struct StateSurgeon<B: AutodiffBackend> {
    pub config: StateSurgeonConfig,
    directory: BTreeMap<String, Owner>,
    optimizers: Vec<OptimizerHandle<B>>,
}

/// Accessors
impl<B: AutodiffBackend> StateSurgeon<B> {
    #[inline]
    pub fn optimizers(&self) -> &[OptimizerHandle<B>] {
        &self.optimizers
    }

    #[inline]
    pub fn optimizer(
        &self,
        index: usize,
    ) -> Option<&OptimizerHandle<B>> {
        self.optimizers.get(index)
    }

    /// The optimizer at `index`, e.g., for recording momentum states.
    ///
    /// Its groups stay fixed, so the directory stays valid.
    #[inline]
    pub fn optimizer_mut(
        &mut self,
        index: usize,
    ) -> Option<&mut OptimizerHandle<B>> {
        self.optimizers.get_mut(index)
    }

    #[inline]
    pub fn into_optimizers(self) -> Vec<OptimizerHandle<B>> {
        self.optimizers
    }

    /// The group owning the property named `name`.
    #[inline]
    pub fn owner(
        &self,
        name: &str,
    ) -> Option<Owner> {
        self.directory.get(name).copied()
    }

    /// Property names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.directory.keys().cloned().collect()
    }

    /// Number of points, or `0` if there is no property.
    pub fn point_count(&self) -> usize {
        self.groups().next().map_or(0, |(_, group)| group.point_count())
    }

    /// The current parameters as the canonical property set.
    pub fn properties(&self) -> PropertySet<B> {
        PropertySet::from_parts(
            self.groups()
                .map(|(name, group)| (name.to_owned(), group.to_property()))
                .collect(),
        )
    }

    fn groups(&self) -> impl Iterator<Item = (&String, &ParamGroup<B>)> {
        self.directory.iter().map(|(name, owner)| {
            (name, &self.optimizers[owner.optimizer].groups()[owner.group])
        })
    }
}

/// Shared surgery steps
impl<B: AutodiffBackend> StateSurgeon<B> {
    /// Checking that `names` are exactly the owned names.
    fn validate_names(
        &self,
        names: Vec<String>,
    ) -> Result<(), Error> {
        let names_expected = self.names();
        if names != names_expected {
            return Err(Error::KeyMismatch(names_expected, names));
        }
        Ok(())
    }

    /// Checking that `property` fits the group named `name`
    /// with `point_count` points.
    fn validate_property(
        &self,
        name: &str,
        property: &Property<B>,
        point_count: usize,
    ) -> Result<(), Error> {
        let Some((_, group)) = self.groups().find(|(other, _)| *other == name) else {
            return Err(Error::KeyMismatch(self.names(), vec![name.into()]));
        };

        let dims_expected = [&[point_count], group.item_dims()].concat();
        let dims = property.dims();
        if dims != dims_expected {
            return Err(Error::ShapeMismatch(name.into(), dims_expected, dims));
        }
        Ok(())
    }

    /// Checking that `mask` spans the point dimension.
    fn validate_mask(
        &self,
        name: &str,
        mask: &Tensor<B::InnerBackend, 1, Bool>,
    ) -> Result<(), Error> {
        let point_count = self.point_count();
        let [mask_count] = mask.dims();
        if mask_count != point_count {
            return Err(Error::ShapeMismatch(
                name.into(),
                vec![point_count],
                vec![mask_count],
            ));
        }
        Ok(())
    }

    /// Rewriting every owned parameter and its momentum state.
    ///
    /// `inputs` are aligned with the sorted property names.
    /// `rewrite` receives the old parameter value and the old state,
    /// where `None` means that the parameter is stateless so far.
    /// A stateless parameter must stay stateless.
    ///
    /// It must run only after every validation has passed.
    fn rewrite<I>(
        &mut self,
        inputs: Vec<I>,
        mut rewrite: impl FnMut(
            I,
            Tensor<B::InnerBackend, 2>,
            Option<MomentumState<B::InnerBackend>>,
        ) -> (
            Tensor<B::InnerBackend, 2>,
            Option<MomentumState<B::InnerBackend>>,
        ),
    ) -> PropertySet<B> {
        debug_assert_eq!(inputs.len(), self.directory.len());

        let mut properties = BTreeMap::new();

        for ((name, owner), input) in self.directory.iter().zip(inputs) {
            let optimizer = &mut self.optimizers[owner.optimizer];

            let group = optimizer.group_mut(owner.group);
            let value = group.parameter().val().inner();
            let id_retired = group.id().to_owned();
            let state = optimizer.states_mut().take(&id_retired);
            let is_stateful = state.is_some();

            let (value, state) = rewrite(input, value, state);
            debug_assert_eq!(state.is_some(), is_stateful);

            let group = optimizer.group_mut(owner.group);
            let id_installed = group.install(value);
            properties.insert(name.to_owned(), group.to_property());

            if let Some(state) = state {
                optimizer.states_mut().insert(id_installed, state);
            }
        }

        PropertySet::from_parts(properties)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub use super::*;
    pub use crate::optimizer::Param;
    pub use burn::{
        backend::{Autodiff, NdArray},
        tensor::Distribution,
    };

    pub type B = Autodiff<NdArray<f32>>;
    pub type I = NdArray<f32>;

    pub const STEP: usize = 10_000;

    /// Seven random properties of `point_count` points.
    pub fn properties(point_count: usize) -> PropertySet<B> {
        let device = Default::default();
        let n = point_count;

        PropertySet::default()
            .with(
                "means",
                Tensor::<B, 2>::random([n, 3], Distribution::Default, &device)
                    .sub_scalar(0.5)
                    .mul_scalar(16.0),
            )
            .unwrap()
            .with(
                "scales",
                Tensor::<B, 2>::random([n, 3], Distribution::Default, &device),
            )
            .unwrap()
            .with(
                "rotations",
                Tensor::<B, 2>::random([n, 4], Distribution::Default, &device),
            )
            .unwrap()
            .with(
                "opacities",
                Tensor::<B, 2>::random([n, 1], Distribution::Default, &device),
            )
            .unwrap()
            .with(
                "shs_dc",
                Tensor::<B, 3>::random([n, 1, 3], Distribution::Default, &device),
            )
            .unwrap()
            .with(
                "shs_rest",
                Tensor::<B, 3>::random([n, 15, 3], Distribution::Default, &device),
            )
            .unwrap()
            .with(
                "no_state",
                Tensor::<B, 1>::random([n], Distribution::Default, &device),
            )
            .unwrap()
    }

    /// One optimizer owns `means`, and another owns the rest,
    /// where `no_state` has never been stepped.
    pub fn optimizers(properties: &PropertySet<B>) -> Vec<OptimizerHandle<B>> {
        let device = Default::default();

        let mut optimizers = vec![
            OptimizerHandle::from_properties(properties, &["means"]).unwrap(),
            OptimizerHandle::from_properties(
                properties,
                &[
                    "scales",
                    "rotations",
                    "opacities",
                    "shs_dc",
                    "shs_rest",
                    "no_state",
                ],
            )
            .unwrap(),
        ];

        for optimizer in optimizers.iter_mut() {
            for name in optimizer.names() {
                if name == "no_state" {
                    continue;
                }
                let dims = optimizer.group(&name).unwrap().dims();
                let state = MomentumState {
                    step: STEP,
                    exp_avg: Tensor::<I, 2>::random(dims, Distribution::Default, &device),
                    exp_avg_sq: Tensor::<I, 2>::random(dims, Distribution::Default, &device),
                };
                optimizer.insert_state(&name, state).unwrap();
            }
        }

        optimizers
    }

    pub fn surgeon(properties: &PropertySet<B>) -> StateSurgeon<B> {
        StateSurgeonConfig::new().init(optimizers(properties)).unwrap()
    }

    /// Every momentum state keyed by the name of its parameter.
    pub fn states(surgeon: &StateSurgeon<B>) -> BTreeMap<String, MomentumState<I>> {
        surgeon
            .optimizers()
            .iter()
            .flat_map(|optimizer| {
                optimizer.names().into_iter().filter_map(|name| {
                    optimizer.state(&name).cloned().map(|state| (name, state))
                })
            })
            .collect()
    }

    /// `properties` whose property named `name` holds `value` instead.
    pub fn substitute(
        properties: &PropertySet<B>,
        name: &str,
        value: Tensor<B, 2>,
    ) -> PropertySet<B> {
        PropertySet::new(properties.iter().map(|(other, property)| {
            let property = if other == name {
                Property::from_value(value.to_owned(), property.item_dims().to_vec()).unwrap()
            } else {
                property.to_owned()
            };
            (other.to_owned(), property)
        }))
        .unwrap()
    }

    /// The current parameter of the property named `name`.
    pub fn parameter(
        surgeon: &StateSurgeon<B>,
        name: &str,
    ) -> Param<Tensor<B, 2>> {
        let owner = surgeon.owner(name).unwrap();
        surgeon.optimizers()[owner.optimizer].groups()[owner.group]
            .parameter()
            .to_owned()
    }
}
