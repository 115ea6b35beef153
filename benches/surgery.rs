use burn::{
    backend::{Autodiff, NdArray},
    tensor::{Bool, Distribution, Tensor},
};
use divan::Bencher;
use gausplat_refiner::{
    optimizer::{MomentumState, OptimizerHandle},
    scene::{Point, PropertySet},
    surgeon::{StateSurgeon, StateSurgeonConfig},
};
use rand::{rngs::StdRng, Rng, SeedableRng};

type B = Autodiff<NdArray<f32>>;
type I = NdArray<f32>;

fn main() {
    divan::main();
}

#[divan::bench(args = [1 << 12, 1 << 16], sample_count = 20)]
fn grow(
    bencher: Bencher,
    point_count: usize,
) {
    bencher
        .with_inputs(|| (data::surgeon(point_count), data::properties(point_count)))
        .bench_local_values(|(mut surgeon, appended)| surgeon.grow(&appended));
}

#[divan::bench(args = [1 << 12, 1 << 16], sample_count = 20)]
fn shrink(
    bencher: Bencher,
    point_count: usize,
) {
    bencher
        .with_inputs(|| (data::surgeon(point_count), data::mask(point_count)))
        .bench_local_values(|(mut surgeon, keep_mask)| surgeon.shrink(keep_mask));
}

#[divan::bench(args = [1 << 12, 1 << 16], sample_count = 20)]
fn replace_selective(
    bencher: Bencher,
    point_count: usize,
) {
    bencher
        .with_inputs(|| {
            (
                data::surgeon(point_count),
                data::properties(point_count),
                data::mask(point_count),
            )
        })
        .bench_local_values(|(mut surgeon, new_values, selector)| {
            surgeon.replace(&new_values, Some(selector))
        });
}

mod data {
    use super::*;

    pub fn properties(point_count: usize) -> PropertySet<B> {
        let mut rng = StdRng::seed_from_u64(0x3D65);
        let points = (0..point_count)
            .map(|_| Point {
                color_rgb: rng.gen(),
                position: rng.gen(),
            })
            .collect::<Vec<_>>();

        PropertySet::from_points(&points, &Default::default()).unwrap()
    }

    pub fn surgeon(point_count: usize) -> StateSurgeon<B> {
        let device = Default::default();
        let properties = properties(point_count);

        let names = properties.names();
        let names = names.iter().map(String::as_str).collect::<Vec<_>>();

        let mut optimizer = OptimizerHandle::from_properties(&properties, &names).unwrap();
        for name in optimizer.names() {
            let dims = optimizer.group(&name).unwrap().dims();
            let state = MomentumState {
                step: 1,
                exp_avg: Tensor::<I, 2>::random(dims, Distribution::Default, &device),
                exp_avg_sq: Tensor::<I, 2>::random(dims, Distribution::Default, &device),
            };
            optimizer.insert_state(&name, state).unwrap();
        }

        StateSurgeonConfig::new().init(vec![optimizer]).unwrap()
    }

    pub fn mask(point_count: usize) -> Tensor<I, 1, Bool> {
        Tensor::<I, 1>::random([point_count], Distribution::Default, &Default::default())
            .lower_elem(0.5)
    }
}
