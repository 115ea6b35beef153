pub use super::*;
pub use burn::config::Config;

#[derive(Config, Copy, Debug)]
pub struct StateSurgeonConfig {
    /// Resetting the step of every stateful parameter to zero
    /// when [`StateSurgeon::replace`] is called without a selector.
    ///
    /// The step is kept by default.
    #[config(default = false)]
    pub reset_step_on_full_replace: bool,
}

impl StateSurgeonConfig {
    /// Building the ownership directory over `optimizers`.
    ///
    /// ## Errors
    ///
    /// - [`Error::DuplicateProperty`] if a name is owned by more than one group.
    /// - [`Error::ShapeMismatch`] if the point counts of the parameters differ.
    pub fn init<B: AutodiffBackend>(
        &self,
        optimizers: Vec<OptimizerHandle<B>>,
    ) -> Result<StateSurgeon<B>, Error> {
        let mut directory = BTreeMap::new();
        let mut point_count = None;

        for (optimizer_index, optimizer) in optimizers.iter().enumerate() {
            for (group_index, group) in optimizer.groups().iter().enumerate() {
                let point_count = *point_count.get_or_insert(group.point_count());
                if group.point_count() != point_count {
                    let dims = [&[group.point_count()], group.item_dims()].concat();
                    let mut dims_expected = dims.to_owned();
                    dims_expected[0] = point_count;
                    return Err(Error::ShapeMismatch(
                        group.name().into(),
                        dims_expected,
                        dims,
                    ));
                }

                let owner = Owner {
                    optimizer: optimizer_index,
                    group: group_index,
                };
                if directory.insert(group.name().to_owned(), owner).is_some() {
                    return Err(Error::DuplicateProperty(group.name().into()));
                }
            }
        }

        #[cfg(all(debug_assertions, not(test)))]
        log::debug!(
            target: "gausplat::refiner::surgeon",
            "StateSurgeonConfig::init > {} properties over {} optimizers",
            directory.len(),
            optimizers.len(),
        );

        Ok(StateSurgeon {
            config: *self,
            directory,
            optimizers,
        })
    }
}

impl Default for StateSurgeonConfig {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
