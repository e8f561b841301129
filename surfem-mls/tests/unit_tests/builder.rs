use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use surfem_mls::{MlsError, MlsSettings, MovingLeastSquares};

#[test]
fn default_settings_sample_size() {
    let settings = MlsSettings::default();
    // 10 cubic polynomials in 2D plus 5 extra samples
    assert_eq!(settings.samples_per_cell(), 15);
}

#[test]
fn reconstruction_reproduces_cubic() {
    let settings = MlsSettings::default();
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let (mls, samples) = settings.build(&mut rng).unwrap();

    let values = mls.reconstruct(&samples, |x| x[0].powi(3));
    for node in 0..mls.grid().num_nodes() {
        let x = mls.grid().node_position(node);
        let expected = x[0].powi(3);
        assert!(
            (values[node] - expected).abs() < 1e-6,
            "node {}: {} vs {}",
            node,
            values[node],
            expected
        );
    }
}

#[test]
fn reconstruction_reproduces_mixed_polynomial_in_3d() {
    let settings = MlsSettings {
        nodes: vec![0.0, 0.4, 1.0],
        supports: vec![0.4, 0.5, 0.6],
        degree: 2,
        dimension: 3,
        extra_samples_per_cell: 8,
    };
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let (mls, samples) = settings.build(&mut rng).unwrap();

    let f = |x: &[f64]| 1.0 + x[0] * x[1] - 2.0 * x[2] * x[2] + 0.5 * x[1];
    let values = mls.reconstruct(&samples, f);
    for node in 0..mls.grid().num_nodes() {
        let x = mls.grid().node_position(node);
        assert!((values[node] - f(&x)).abs() < 1e-6);
    }
}

#[test]
fn shape_functions_form_partition_of_unity_on_nodes() {
    let settings = MlsSettings::default();
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let (mls, samples) = settings.build(&mut rng).unwrap();

    // Reconstructing the constant one sums the shape functions over all samples
    let ones = mls.reconstruct(&samples, |_| 1.0);
    assert!(ones.iter().all(|&v| (v - 1.0).abs() < 1e-8));

    let cell = 5;
    let node = mls.grid().cell_dofs(cell)[0];
    let direct: f64 = samples[cell]
        .iter()
        .map(|p| mls.shape_value(node, cell, p))
        .sum();
    assert!(direct.is_finite());
}

#[test]
fn too_few_samples_is_singular() {
    let settings = MlsSettings::default();
    let grid = settings.grid().unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    // Two samples per cell cannot determine ten coefficients at a corner node
    let samples = grid.sample_cells(2, &mut rng);
    let result = MovingLeastSquares::build(grid, settings.degree, &samples);
    assert!(matches!(result, Err(MlsError::SingularSystem { .. })));
}

#[test]
fn sample_count_mismatch_is_reported() {
    let settings = MlsSettings::default();
    let grid = settings.grid().unwrap();
    let result = MovingLeastSquares::build(grid, 3, &[]);
    assert_eq!(
        result.err(),
        Some(MlsError::SampleMismatch {
            expected: 16,
            actual: 0
        })
    );
}

#[test]
fn samples_lie_in_their_cells() {
    let settings = MlsSettings::default();
    let grid = settings.grid().unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let samples = grid.sample_cells(4, &mut rng);
    for (cell, cell_samples) in samples.iter().enumerate() {
        let idx = grid.cell_multi_index(cell);
        for p in cell_samples {
            for d in 0..2 {
                let lo = settings.nodes[idx[d]];
                let hi = settings.nodes[idx[d] + 1];
                assert!(p[d] >= lo && p[d] <= hi);
            }
        }
    }
}
