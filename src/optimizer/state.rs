//! Momentum state implementation.

pub use super::*;

use std::collections::HashMap;

/// Adam-style running averages of a parameter.
///
/// The moment buffers are shaped like the flattened parameter, i.e., `[N, C]`.
#[derive(Clone, Debug)]
pub struct MomentumState<B: Backend> {
    /// The count of optimizer steps taken so far.
    pub step: usize,
    /// The first moment.
    pub exp_avg: Tensor<B, 2>,
    /// The second moment.
    pub exp_avg_sq: Tensor<B, 2>,
}

impl<B: Backend> MomentumState<B> {
    /// Zero moments of the shape `[N, C]`.
    pub fn zeros(
        step: usize,
        dims: [usize; 2],
        device: &B::Device,
    ) -> Self {
        Self {
            step,
            exp_avg: Tensor::zeros(dims, device),
            exp_avg_sq: Tensor::zeros(dims, device),
        }
    }

    /// Applying `f` to both moments. The step is kept.
    #[inline]
    pub fn map(
        self,
        f: impl Fn(Tensor<B, 2>) -> Tensor<B, 2>,
    ) -> Self {
        Self {
            step: self.step,
            exp_avg: f(self.exp_avg),
            exp_avg_sq: f(self.exp_avg_sq),
        }
    }

    /// The shape of the moments.
    #[inline]
    pub fn dims(&self) -> [usize; 2] {
        self.exp_avg.dims()
    }
}

/// Momentum states keyed by parameter identity.
///
/// A parameter that the optimizer has never stepped has no entry.
#[derive(Clone, Debug)]
pub struct StateStore<B: Backend> {
    states: HashMap<ParamId, MomentumState<B>>,
}

impl<B: Backend> StateStore<B> {
    #[inline]
    pub fn get(
        &self,
        id: &ParamId,
    ) -> Option<&MomentumState<B>> {
        self.states.get(id)
    }

    #[inline]
    pub fn contains(
        &self,
        id: &ParamId,
    ) -> bool {
        self.states.contains_key(id)
    }

    /// Returning the previous state of `id` if any.
    #[inline]
    pub fn insert(
        &mut self,
        id: ParamId,
        state: MomentumState<B>,
    ) -> Option<MomentumState<B>> {
        self.states.insert(id, state)
    }

    /// Detaching the state from `id`.
    ///
    /// `None` means that the parameter is stateless so far.
    #[inline]
    pub fn take(
        &mut self,
        id: &ParamId,
    ) -> Option<MomentumState<B>> {
        self.states.remove(id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl<B: Backend> Default for StateStore<B> {
    fn default() -> Self {
        Self {
            states: Default::default(),
        }
    }
}
