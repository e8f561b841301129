use std::collections::BTreeSet;
use surfem_mls::grid::{cell_dofs, multi_index};
use surfem_mls::{MlsError, TensorGrid};

#[test]
fn multi_index_is_most_significant_first() {
    assert_eq!(multi_index(0, 5, 2), vec![0, 0]);
    assert_eq!(multi_index(7, 5, 2), vec![1, 2]);
    assert_eq!(multi_index(24, 5, 2), vec![4, 4]);
    assert_eq!(multi_index(13, 3, 3), vec![1, 1, 1]);
}

#[test]
fn cell_dofs_of_first_cell() {
    let dofs: BTreeSet<_> = cell_dofs(&[0, 0], 4).into_iter().collect();
    assert_eq!(dofs, [0, 1, 4, 5].into_iter().collect());

    let dofs: BTreeSet<_> = cell_dofs(&[0, 0], 5).into_iter().collect();
    assert_eq!(dofs, [0, 1, 5, 6].into_iter().collect());
}

#[test]
fn cell_dofs_2d_corner_order() {
    let n = 5;
    let dofs = cell_dofs(&[2, 3], n);
    let expected = vec![2 * n + 3, 2 * n + 4, 3 * n + 3, 3 * n + 4];
    assert_eq!(dofs, expected);
}

#[test]
fn cell_dofs_3d_match_direct_formula() {
    let n = 4;
    for i0 in 0..n - 1 {
        for i1 in 0..n - 1 {
            for i2 in 0..n - 1 {
                let dofs = cell_dofs(&[i0, i1, i2], n);
                let mut expected = Vec::new();
                for a in 0..2 {
                    for b in 0..2 {
                        for c in 0..2 {
                            expected.push((i0 + a) * n * n + (i1 + b) * n + (i2 + c));
                        }
                    }
                }
                assert_eq!(dofs, expected);
            }
        }
    }
}

#[test]
fn cell_dofs_1d() {
    assert_eq!(cell_dofs(&[3], 6), vec![3, 4]);
}

#[test]
fn grid_counts_and_positions() {
    let grid = TensorGrid::new(vec![0.0, 0.1, 0.5, 1.0, 1.3], vec![0.1, 0.4, 0.5, 0.5, 0.3], 2).unwrap();
    assert_eq!(grid.num_nodes(), 25);
    assert_eq!(grid.num_cells(), 16);
    assert_eq!(grid.node_position(7), vec![0.1, 0.5]);
    assert_eq!(grid.node_supports(7), vec![0.4, 0.5]);
    assert!((grid.cell_width(2) - 0.5).abs() < 1e-15);
}

#[test]
fn grid_rejects_inconsistent_input() {
    assert!(matches!(
        TensorGrid::new(vec![0.0, 1.0], vec![1.0], 2),
        Err(MlsError::InvalidGrid(_))
    ));
    assert!(matches!(
        TensorGrid::new(vec![0.0, 0.0], vec![1.0, 1.0], 2),
        Err(MlsError::InvalidGrid(_))
    ));
    assert!(matches!(
        TensorGrid::new(vec![0.0, 1.0], vec![1.0, 1.0], 0),
        Err(MlsError::InvalidGrid(_))
    ));
}
