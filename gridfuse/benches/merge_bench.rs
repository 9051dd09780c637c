use criterion::{Criterion, criterion_group, criterion_main};
use glam::IVec3;
use gridfuse::{Grid, vector_from_scalar};

fn prepare_grids() -> (Grid<f32>, Grid<f32>, Grid<f32>) {
    let mut x = Grid::empty(-0.1f32);
    let mut y = Grid::empty(-0.2f32);
    let mut z = Grid::empty(-0.3f32);

    for i in 0..32 {
        for j in 0..32 {
            x.tree_mut().set_value(IVec3::new(i, j, 0), (i + j) as f32);
            y.tree_mut().set_value(IVec3::new(i, 0, j), (i * j) as f32);
        }
    }

    let root_level = z.tree().config().root_level();
    let stride = z.tree().config().root_stride();
    z.tree_mut()
        .add_tile(root_level, IVec3::new(stride, 0, 0), 5.0, true);

    (x, y, z)
}

fn benchmark_vector_from_scalar(c: &mut Criterion) {
    c.bench_function("vector_from_scalar", |b| {
        let (x, y, z) = prepare_grids();
        b.iter(|| vector_from_scalar(&x, &y, &z).unwrap())
    });
}

criterion_group!(benches, benchmark_vector_from_scalar);
criterion_main!(benches);
