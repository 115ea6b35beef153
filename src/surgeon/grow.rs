pub use super::*;

impl<B: AutodiffBackend> StateSurgeon<B> {
    /// Appending the rows of `appended` to every property.
    ///
    /// The appended rows start with zero momentum,
    /// and the step of each state is kept.
    ///
    /// ## Errors
    ///
    /// - [`Error::KeyMismatch`] if the names of `appended` differ from [`Self::names`].
    /// - [`Error::ShapeMismatch`] if the item dimensions of a property differ.
    ///
    /// Nothing changes on error.
    pub fn grow(
        &mut self,
        appended: &PropertySet<B>,
    ) -> Result<PropertySet<B>, Error> {
        self.validate_names(appended.names())?;

        let appended_count = appended.point_count();
        for (name, property) in appended.iter() {
            self.validate_property(name, property, appended_count)?;
        }

        #[cfg(all(debug_assertions, not(test)))]
        let point_count = self.point_count();

        // [M, C]
        let appended = appended
            .iter()
            .map(|(_, property)| property.value().to_owned().inner())
            .collect::<Vec<_>>();

        let properties = self.rewrite(appended, |appended, value, state| {
            let state = state.map(|state| {
                state.map(|moment| {
                    let zeros = Tensor::zeros(appended.dims(), &moment.device());
                    Tensor::cat(vec![moment, zeros], 0)
                })
            });
            let value = Tensor::cat(vec![value, appended], 0);

            (value, state)
        });

        #[cfg(all(debug_assertions, not(test)))]
        log::debug!(
            target: "gausplat::refiner::surgeon",
            "StateSurgeon::grow > {point_count} + {appended_count} points",
        );

        Ok(properties)
    }
}
