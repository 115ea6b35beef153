pub use super::*;

impl<B: AutodiffBackend> StateSurgeon<B> {
    /// Keeping the rows where `keep_mask` is `true` in every property.
    ///
    /// The rows keep their order, and so do the momentum rows.
    ///
    /// ## Errors
    ///
    /// - [`Error::ShapeMismatch`] if the length of `keep_mask` differs from
    ///   [`Self::point_count`].
    ///
    /// Nothing changes on error.
    pub fn shrink(
        &mut self,
        keep_mask: Tensor<B::InnerBackend, 1, Bool>,
    ) -> Result<PropertySet<B>, Error> {
        self.validate_mask("keep_mask", &keep_mask)?;

        #[cfg(all(debug_assertions, not(test)))]
        let point_count = self.point_count();

        // [P]
        let indices = keep_mask.argwhere().squeeze::<1>(1);
        let inputs = vec![(); self.names().len()];

        let properties = self.rewrite(inputs, |_, value, state| {
            let state =
                state.map(|state| state.map(|moment| moment.select(0, indices.to_owned())));
            let value = value.select(0, indices.to_owned());

            (value, state)
        });

        #[cfg(all(debug_assertions, not(test)))]
        log::debug!(
            target: "gausplat::refiner::surgeon",
            "StateSurgeon::shrink > {point_count} -> {} points",
            properties.point_count(),
        );

        Ok(properties)
    }
}
