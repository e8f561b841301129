use surfem::laplace::{solve_laplace, LaplaceSettings};
use surfem::procedural::{create_unit_square_quad_mesh, create_unit_square_tri_mesh};

fn main() -> eyre::Result<()> {
    // u = 0 on all four sides of the unit square
    let settings = LaplaceSettings {
        source: 1.0,
        dirichlet_faces: vec![1, 2, 3, 4],
        ..LaplaceSettings::default()
    };

    for cells_per_dim in [4, 8, 16] {
        let quads = create_unit_square_quad_mesh(cells_per_dim);
        let tris = create_unit_square_tri_mesh(cells_per_dim);
        let center = (cells_per_dim + 1) * (cells_per_dim / 2) + cells_per_dim / 2;

        let quad_solution = solve_laplace(&quads, &settings)?;
        let tri_solution = solve_laplace(&tris, &settings)?;
        println!(
            "n = {:2}: u(0.5, 0.5) = {:.6} (quads, {} iterations), {:.6} (triangles, {} iterations)",
            cells_per_dim,
            quad_solution.values()[center],
            quad_solution.report.iterations,
            tri_solution.values()[center],
            tri_solution.report.iterations
        );
    }

    Ok(())
}
