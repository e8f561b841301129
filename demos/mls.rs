use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use surfem::mls::MlsSettings;

fn main() -> eyre::Result<()> {
    let settings = MlsSettings::default();
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let (mls, samples) = settings.build(&mut rng)?;

    // Polynomials up to the degree of the basis are reproduced at the nodes
    let f = |x: &[f64]| 1.0 + x[0] - 2.0 * x[0] * x[1] + x[1] * x[1] * x[1];
    let reconstructed = mls.reconstruct(&samples, f);

    let grid = mls.grid();
    let mut max_error: f64 = 0.0;
    for node in 0..grid.num_nodes() {
        let x = grid.node_position(node);
        let error = (reconstructed[node] - f(x.as_slice())).abs();
        println!("node {:2} at {:?}: {:.12} (error {:.2e})", node, x, reconstructed[node], error);
        max_error = max_error.max(error);
    }
    println!("Maximum nodal error: {:.2e}", max_error);

    Ok(())
}
