use matrixcompare::assert_scalar_eq;
use nalgebra::DMatrix;
use surfem::element::{CellKind, ElementTables, TabulatedElement};

const KINDS: [CellKind; 4] = [CellKind::Segment2, CellKind::Tri3, CellKind::Quad4, CellKind::Hex8];

#[test]
fn basis_is_partition_of_unity_at_quadrature_points() {
    for kind in KINDS {
        let element = TabulatedElement::with_default_quadrature(kind).unwrap();
        for q in 0..element.num_quadrature_points() {
            assert_scalar_eq!(element.basis(q).sum(), 1.0, comp = abs, tol = 1e-14);
            for row in element.gradients(q).row_iter() {
                assert_scalar_eq!(row.sum(), 0.0, comp = abs, tol = 1e-14);
            }
        }
    }
}

#[test]
fn basis_is_nodal() {
    for kind in KINDS {
        let n = kind.num_vertices();
        for (i, xi) in kind.reference_vertices().iter().enumerate() {
            let mut phi = vec![0.0; n];
            kind.populate_basis(&mut phi, xi);
            for (j, &phi_j) in phi.iter().enumerate() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_scalar_eq!(phi_j, expected, comp = abs, tol = 1e-14);
            }
        }
    }
}

#[test]
fn default_weights_sum_to_reference_volume() {
    let tables = ElementTables::new().unwrap();
    let expected = [2.0, 0.5, 4.0, 8.0];
    for (kind, volume) in KINDS.into_iter().zip(expected) {
        let sum: f64 = tables.get(kind).weights().iter().sum();
        assert_scalar_eq!(sum, volume, comp = abs, tol = 1e-13);
    }
}

#[test]
fn quad_gradients_match_finite_differences() {
    let kind = CellKind::Quad4;
    let xi = [0.3, -0.2];
    let h = 1e-6;
    let mut gradients = DMatrix::zeros(2, 4);
    kind.populate_basis_gradients(&mut gradients, &xi);

    for d in 0..2 {
        let (mut plus, mut minus) = (xi, xi);
        plus[d] += h;
        minus[d] -= h;
        let (mut phi_plus, mut phi_minus) = ([0.0; 4], [0.0; 4]);
        kind.populate_basis(&mut phi_plus, &plus);
        kind.populate_basis(&mut phi_minus, &minus);
        for i in 0..4 {
            let fd = (phi_plus[i] - phi_minus[i]) / (2.0 * h);
            assert_scalar_eq!(gradients[(d, i)], fd, comp = abs, tol = 1e-8);
        }
    }
}
