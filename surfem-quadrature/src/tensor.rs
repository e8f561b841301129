//! Tensor-product rules for quadrilaterals and hexahedra.

use crate::univariate::gauss;
use crate::Rule;

/// Gauss rule on the reference quadrilateral with `n` points per dimension.
///
/// Points are ordered with the first coordinate varying slowest.
pub fn quadrilateral_gauss(num_points_per_dim: usize) -> Rule<2> {
    let (weights1d, points1d) = gauss(num_points_per_dim);
    let rule1d = || weights1d.iter().zip(&points1d);

    rule1d()
        .flat_map(|(&wx, &[x])| rule1d().map(move |(&wy, &[y])| (wx * wy, [x, y])))
        .unzip()
}

/// Gauss rule on the reference hexahedron with `n` points per dimension.
pub fn hexahedron_gauss(num_points_per_dim: usize) -> Rule<3> {
    let (weights1d, points1d) = gauss(num_points_per_dim);
    let rule1d = || weights1d.iter().zip(&points1d);

    let mut weights = Vec::new();
    let mut points = Vec::new();
    for (&wx, &[x]) in rule1d() {
        for (&wy, &[y]) in rule1d() {
            for (&wz, &[z]) in rule1d() {
                weights.push(wx * wy * wz);
                points.push([x, y, z]);
            }
        }
    }
    (weights, points)
}
