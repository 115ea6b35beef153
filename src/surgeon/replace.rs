pub use super::*;

impl<B: AutodiffBackend> StateSurgeon<B> {
    /// Replacing the values of every property with `new_values`.
    ///
    /// The values are replaced at every row. The momentum rows where `selector`
    /// is `true` are reset to zero, and the others are kept.
    /// Without a selector, every momentum row is reset.
    ///
    /// The step is kept unless [`StateSurgeonConfig::reset_step_on_full_replace`]
    /// is set and no selector is given.
    ///
    /// ## Errors
    ///
    /// - [`Error::KeyMismatch`] if the names of `new_values` differ from [`Self::names`].
    /// - [`Error::ShapeMismatch`] if the shape of a property differs,
    ///   or the length of `selector` differs from [`Self::point_count`].
    ///
    /// Nothing changes on error.
    pub fn replace(
        &mut self,
        new_values: &PropertySet<B>,
        selector: Option<Tensor<B::InnerBackend, 1, Bool>>,
    ) -> Result<PropertySet<B>, Error> {
        self.validate_names(new_values.names())?;

        let point_count = self.point_count();
        for (name, property) in new_values.iter() {
            self.validate_property(name, property, point_count)?;
        }
        if let Some(selector) = &selector {
            self.validate_mask("selector", selector)?;
        }

        let reset_step = selector.is_none() && self.config.reset_step_on_full_replace;

        #[cfg(all(debug_assertions, not(test)))]
        log::debug!(
            target: "gausplat::refiner::surgeon",
            "StateSurgeon::replace > {point_count} points (selective: {}, reset step: {reset_step})",
            selector.is_some(),
        );

        // [N, C]
        let new_values = new_values
            .iter()
            .map(|(_, property)| property.value().to_owned().inner())
            .collect::<Vec<_>>();

        let properties = self.rewrite(new_values, |new_value, _, state| {
            let state = state.map(|state| {
                let step = if reset_step { 0 } else { state.step };
                let state = match &selector {
                    Some(selector) => state.map(|moment| {
                        let [_, item_size] = moment.dims();
                        let mask = selector
                            .to_owned()
                            .unsqueeze_dim::<2>(1)
                            .repeat_dim(1, item_size);
                        moment.mask_fill(mask, 0.0)
                    }),
                    None => state.map(|moment| moment.zeros_like()),
                };

                MomentumState { step, ..state }
            });

            (new_value, state)
        });

        Ok(properties)
    }
}
