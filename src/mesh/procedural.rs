//! Basic procedural mesh generation routines.
use crate::element::CellKind;
use crate::mesh::{BoundaryFacet, Cell, Mesh};
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;

/// A uniform mesh of `[0, 1]` along the x-axis.
///
/// The vertex at `x = 0` lies on face 1 and the vertex at `x = 1` on face 2.
pub fn create_unit_line_mesh(cells: usize) -> Mesh {
    let h = 1.0 / cells as f64;
    let vertices = (0..=cells)
        .map(|i| Point3::new(i as f64 * h, 0.0, 0.0))
        .collect();
    let segments = (0..cells)
        .map(|i| Cell::new(CellKind::Segment2, vec![i, i + 1]))
        .collect();
    let boundary = vec![
        BoundaryFacet {
            vertices: vec![0],
            face: 1,
        },
        BoundaryFacet {
            vertices: vec![cells],
            face: 2,
        },
    ];
    Mesh::from_vertices_and_cells(vertices, segments).with_boundary(boundary)
}

/// A uniform quadrilateral mesh of the unit square in the plane `z = 0`.
///
/// Boundary faces are numbered 1 (bottom, `y = 0`), 2 (right), 3 (top) and 4 (left).
pub fn create_unit_square_quad_mesh(cells_per_dim: usize) -> Mesh {
    let n = cells_per_dim;
    let (vertices, boundary) = unit_square_vertices_and_boundary(n);
    let v = |i: usize, j: usize| (n + 1) * j + i;
    let mut cells = Vec::with_capacity(n * n);
    for j in 0..n {
        for i in 0..n {
            cells.push(Cell::new(
                CellKind::Quad4,
                vec![v(i, j), v(i + 1, j), v(i + 1, j + 1), v(i, j + 1)],
            ));
        }
    }
    Mesh::from_vertices_and_cells(vertices, cells).with_boundary(boundary)
}

/// Same as [`create_unit_square_quad_mesh`], with every quadrilateral split into two triangles.
pub fn create_unit_square_tri_mesh(cells_per_dim: usize) -> Mesh {
    let n = cells_per_dim;
    let (vertices, boundary) = unit_square_vertices_and_boundary(n);
    let v = |i: usize, j: usize| (n + 1) * j + i;
    let mut cells = Vec::with_capacity(2 * n * n);
    for j in 0..n {
        for i in 0..n {
            let (a, b, c, d) = (v(i, j), v(i + 1, j), v(i + 1, j + 1), v(i, j + 1));
            cells.push(Cell::new(CellKind::Tri3, vec![a, b, c]));
            cells.push(Cell::new(CellKind::Tri3, vec![a, c, d]));
        }
    }
    Mesh::from_vertices_and_cells(vertices, cells).with_boundary(boundary)
}

fn unit_square_vertices_and_boundary(n: usize) -> (Vec<Point3<f64>>, Vec<BoundaryFacet>) {
    let h = 1.0 / n as f64;
    let v = |i: usize, j: usize| (n + 1) * j + i;
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            vertices.push(Point3::new(i as f64 * h, j as f64 * h, 0.0));
        }
    }

    let mut boundary = Vec::with_capacity(4 * n);
    for k in 0..n {
        let facet = |vertices: Vec<usize>, face: i32| BoundaryFacet { vertices, face };
        boundary.push(facet(vec![v(k, 0), v(k + 1, 0)], 1));
        boundary.push(facet(vec![v(n, k), v(n, k + 1)], 2));
        boundary.push(facet(vec![v(k + 1, n), v(k, n)], 3));
        boundary.push(facet(vec![v(0, k + 1), v(0, k)], 4));
    }
    (vertices, boundary)
}

/// A uniform hexahedral mesh of the unit cube.
///
/// Boundary faces are numbered 1 (`x = 0`), 2 (`x = 1`), 3 (`y = 0`), 4 (`y = 1`),
/// 5 (`z = 0`) and 6 (`z = 1`).
pub fn create_unit_cube_hex_mesh(cells_per_dim: usize) -> Mesh {
    let n = cells_per_dim;
    let h = 1.0 / n as f64;
    let v = |i: usize, j: usize, k: usize| (n + 1) * (n + 1) * k + (n + 1) * j + i;

    let mut vertices = Vec::with_capacity((n + 1).pow(3));
    for k in 0..=n {
        for j in 0..=n {
            for i in 0..=n {
                vertices.push(Point3::new(i as f64 * h, j as f64 * h, k as f64 * h));
            }
        }
    }

    let mut cells = Vec::with_capacity(n * n * n);
    for k in 0..n {
        for j in 0..n {
            for i in 0..n {
                cells.push(Cell::new(
                    CellKind::Hex8,
                    vec![
                        v(i, j, k),
                        v(i + 1, j, k),
                        v(i + 1, j + 1, k),
                        v(i, j + 1, k),
                        v(i, j, k + 1),
                        v(i + 1, j, k + 1),
                        v(i + 1, j + 1, k + 1),
                        v(i, j + 1, k + 1),
                    ],
                ));
            }
        }
    }

    let mut boundary = Vec::with_capacity(6 * n * n);
    for a in 0..n {
        for b in 0..n {
            let quad = |f: &dyn Fn(usize, usize) -> usize| vec![f(a, b), f(a + 1, b), f(a + 1, b + 1), f(a, b + 1)];
            let facets = [
                (quad(&|p, q| v(0, p, q)), 1),
                (quad(&|p, q| v(n, p, q)), 2),
                (quad(&|p, q| v(p, 0, q)), 3),
                (quad(&|p, q| v(p, n, q)), 4),
                (quad(&|p, q| v(p, q, 0)), 5),
                (quad(&|p, q| v(p, q, n)), 6),
            ];
            boundary.extend(
                facets
                    .into_iter()
                    .map(|(vertices, face)| BoundaryFacet { vertices, face }),
            );
        }
    }

    Mesh::from_vertices_and_cells(vertices, cells).with_boundary(boundary)
}

/// A closed quadrilateral surface mesh of the sphere, obtained by projecting the uniformly
/// subdivided surface of the cube `[-1, 1]^3` onto the sphere.
///
/// Every cell is oriented so that the cross product of its parametric tangents points outward.
pub fn create_cube_sphere_mesh(cells_per_face: usize, radius: f64) -> Mesh {
    let n = cells_per_face as i64;
    // Per cube face: the normal axis, its sign, and the two in-face axes ordered such that
    // e_u x e_v equals the outward normal
    let faces: [(usize, i64, usize, usize); 6] = [
        (0, 1, 1, 2),
        (0, -1, 2, 1),
        (1, 1, 2, 0),
        (1, -1, 0, 2),
        (2, 1, 0, 1),
        (2, -1, 1, 0),
    ];

    let mut vertices = Vec::new();
    let mut lattice_index = HashMap::new();
    let mut cells = Vec::with_capacity(6 * cells_per_face * cells_per_face);

    for (normal_axis, sign, u_axis, v_axis) in faces {
        let mut vertex = |i: i64, j: i64| -> usize {
            let mut lattice = [0i64; 3];
            lattice[normal_axis] = sign * n;
            lattice[u_axis] = -n + 2 * i;
            lattice[v_axis] = -n + 2 * j;
            *lattice_index.entry(lattice).or_insert_with(|| {
                let p = Vector3::new(lattice[0] as f64, lattice[1] as f64, lattice[2] as f64);
                vertices.push(Point3::from(p.normalize() * radius));
                vertices.len() - 1
            })
        };

        for j in 0..n {
            for i in 0..n {
                let cell_vertices = vec![vertex(i, j), vertex(i + 1, j), vertex(i + 1, j + 1), vertex(i, j + 1)];
                cells.push(Cell::new(CellKind::Quad4, cell_vertices));
            }
        }
    }

    Mesh::from_vertices_and_cells(vertices, cells)
}

/// A closed triangle surface mesh of the sphere, obtained by repeatedly subdividing an
/// icosahedron and projecting the new vertices onto the sphere.
///
/// Every triangle is oriented counter-clockwise when seen from outside.
pub fn create_icosphere_mesh(subdivisions: usize, radius: f64) -> Mesh {
    let t = (1.0 + 5.0_f64.sqrt()) / 2.0;
    #[rustfmt::skip]
    let mut positions: Vec<Vector3<f64>> = [
        [-1.0, t, 0.0], [1.0, t, 0.0], [-1.0, -t, 0.0], [1.0, -t, 0.0],
        [0.0, -1.0, t], [0.0, 1.0, t], [0.0, -1.0, -t], [0.0, 1.0, -t],
        [t, 0.0, -1.0], [t, 0.0, 1.0], [-t, 0.0, -1.0], [-t, 0.0, 1.0],
    ]
    .iter()
    .map(|&[x, y, z]| Vector3::new(x, y, z).normalize())
    .collect();

    #[rustfmt::skip]
    let mut triangles: Vec<[usize; 3]> = vec![
        [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
        [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
        [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
        [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        let mut midpoints = HashMap::new();
        let mut midpoint = |a: usize, b: usize, positions: &mut Vec<Vector3<f64>>| -> usize {
            let key = (a.min(b), a.max(b));
            *midpoints.entry(key).or_insert_with(|| {
                let m = ((positions[a] + positions[b]) / 2.0).normalize();
                positions.push(m);
                positions.len() - 1
            })
        };

        let mut refined = Vec::with_capacity(4 * triangles.len());
        for [a, b, c] in triangles {
            let ab = midpoint(a, b, &mut positions);
            let bc = midpoint(b, c, &mut positions);
            let ca = midpoint(c, a, &mut positions);
            refined.push([a, ab, ca]);
            refined.push([b, bc, ab]);
            refined.push([c, ca, bc]);
            refined.push([ab, bc, ca]);
        }
        triangles = refined;
    }

    let vertices = positions
        .into_iter()
        .map(|p| Point3::from(p * radius))
        .collect();
    let cells = triangles
        .into_iter()
        .map(|tri| Cell::new(CellKind::Tri3, tri.to_vec()))
        .collect();
    Mesh::from_vertices_and_cells(vertices, cells)
}
