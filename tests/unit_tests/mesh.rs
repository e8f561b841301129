use matrixcompare::assert_scalar_eq;
use std::f64::consts::PI;
use surfem::element::CellKind;
use surfem::mesh::{Cell, Mesh};
use surfem::procedural::{
    create_cube_sphere_mesh, create_icosphere_mesh, create_unit_line_mesh, create_unit_square_quad_mesh,
};

#[test]
fn icosphere_counts_and_valences() {
    let mesh = create_icosphere_mesh(1, 1.0);
    assert_eq!(mesh.num_vertices(), 42);
    assert_eq!(mesh.num_cells(), 80);
    mesh.validate().unwrap();

    let valences = mesh.vertex_valences();
    assert_eq!(valences.iter().filter(|&&n| n == 5).count(), 12);
    assert_eq!(valences.iter().filter(|&&n| n == 6).count(), 30);
    for v in mesh.vertices() {
        assert_scalar_eq!(v.coords.norm(), 1.0, comp = abs, tol = 1e-12);
    }
}

#[test]
fn cube_sphere_counts_and_valences() {
    let mesh = create_cube_sphere_mesh(2, 2.0);
    assert_eq!(mesh.num_vertices(), 26);
    assert_eq!(mesh.num_cells(), 24);
    assert!(mesh
        .cells()
        .iter()
        .all(|cell| cell.kind() == CellKind::Quad4));

    let valences = mesh.vertex_valences();
    // The cube corners are shared by three cells
    assert_eq!(valences.iter().filter(|&&n| n == 3).count(), 8);
    assert_eq!(valences.iter().filter(|&&n| n == 4).count(), 18);
    for v in mesh.vertices() {
        assert_scalar_eq!(v.coords.norm(), 2.0, comp = abs, tol = 1e-12);
    }
}

#[test]
fn sphere_cells_are_outward_oriented() {
    for mesh in [create_icosphere_mesh(1, 1.0), create_cube_sphere_mesh(3, 1.0)] {
        for cell in 0..mesh.num_cells() {
            let v: Vec<_> = mesh.cell_vertices(cell).collect();
            let normal = (v[1] - v[0]).cross(&(v[2] - v[0]));
            assert!(normal.dot(&mesh.cell_centroid(cell).coords) > 0.0);
        }
    }
}

#[test]
fn icosphere_area_approaches_sphere() {
    let mesh = create_icosphere_mesh(3, 1.0);
    let area: f64 = (0..mesh.num_cells())
        .map(|cell| {
            let v: Vec<_> = mesh.cell_vertices(cell).collect();
            0.5 * (v[1] - v[0]).cross(&(v[2] - v[0])).norm()
        })
        .sum();
    assert!((area - 4.0 * PI).abs() / (4.0 * PI) < 0.02);
}

#[test]
fn unit_square_boundary_faces() {
    let mesh = create_unit_square_quad_mesh(2);
    assert_eq!(mesh.num_vertices(), 9);
    assert_eq!(mesh.num_cells(), 4);

    let vertex_faces = mesh.boundary_vertex_faces();
    // Every vertex except the center lies on the boundary, corners on two faces
    assert_eq!(vertex_faces.len(), 12);
    assert!(vertex_faces.iter().all(|&(v, _)| v != 4));
    assert!(vertex_faces.contains(&(0, 1)));
    assert!(vertex_faces.contains(&(0, 4)));
    assert!(vertex_faces.contains(&(8, 2)));
    assert!(vertex_faces.contains(&(8, 3)));
}

#[test]
fn unit_line_faces() {
    let mesh = create_unit_line_mesh(4);
    assert_eq!(mesh.boundary_vertex_faces(), vec![(0, 1), (4, 2)]);
}

#[test]
fn validate_rejects_missing_vertices() {
    let mesh = Mesh::from_vertices_and_cells(Vec::new(), vec![Cell::new(CellKind::Segment2, vec![0, 1])]);
    assert!(mesh.validate().is_err());
}

#[test]
fn mesh_roundtrips_through_json() {
    let mesh = create_unit_square_quad_mesh(1);
    let json = serde_json::to_string(&mesh).unwrap();
    let deserialized: Mesh = serde_json::from_str(&json).unwrap();
    assert_eq!(mesh, deserialized);
}
