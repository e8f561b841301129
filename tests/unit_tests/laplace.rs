use matrixcompare::assert_scalar_eq;
use surfem::laplace::{solve_laplace, LaplaceSettings};
use surfem::procedural::{
    create_unit_cube_hex_mesh, create_unit_line_mesh, create_unit_square_quad_mesh, create_unit_square_tri_mesh,
};

fn all_faces(n: i32) -> LaplaceSettings {
    LaplaceSettings {
        dirichlet_faces: (1..=n).collect(),
        ..LaplaceSettings::default()
    }
}

#[test]
fn single_quad_with_dirichlet_boundary_is_zero() {
    let mesh = create_unit_square_quad_mesh(1);
    let solution = solve_laplace(&mesh, &all_faces(4)).unwrap();
    assert!(solution.report.converged);
    assert!(solution.values().iter().all(|&u| u == 0.0));
}

#[test]
fn quad_grid_center_value() {
    let mesh = create_unit_square_quad_mesh(2);
    let solution = solve_laplace(&mesh, &all_faces(4)).unwrap();
    let u = solution.values();
    assert_scalar_eq!(u[4], 3.0 / 32.0, comp = abs, tol = 1e-12);
    for (i, &u_i) in u.iter().enumerate() {
        if i != 4 {
            assert_eq!(u_i, 0.0);
        }
    }
}

#[test]
fn hex_grid_center_value() {
    let mesh = create_unit_cube_hex_mesh(2);
    let solution = solve_laplace(&mesh, &all_faces(6)).unwrap();
    // The center vertex (1, 1, 1) of the 3 x 3 x 3 vertex grid
    assert_scalar_eq!(solution.values()[13], 3.0 / 32.0, comp = abs, tol = 1e-12);
}

#[test]
fn line_with_natural_boundary_is_nodally_exact() {
    let mesh = create_unit_line_mesh(4);
    let solution = solve_laplace(&mesh, &LaplaceSettings::default()).unwrap();
    for (v, &u) in mesh.vertices().iter().zip(solution.values().iter()) {
        let x = v.x;
        assert_scalar_eq!(u, x - x * x / 2.0, comp = abs, tol = 1e-12);
    }
}

#[test]
fn triangle_grid_is_symmetric() {
    let mesh = create_unit_square_tri_mesh(4);
    let solution = solve_laplace(&mesh, &all_faces(4)).unwrap();
    let u = solution.values();
    let v = |i: usize, j: usize| 5 * j + i;
    // The diagonal split is symmetric under reflection in the diagonal x = y
    for j in 0..5 {
        for i in 0..5 {
            assert_scalar_eq!(u[v(i, j)], u[v(j, i)], comp = abs, tol = 1e-12);
        }
    }
    assert!(u[v(2, 2)] > 0.0);
}
