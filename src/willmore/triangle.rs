//! Valence-dependent reference triangles for the conformal reparametrization.
//!
//! A conformal map preserves the angles of the reference cell. Reference triangles whose
//! angle at each vertex is close to `2π / valence` let the mesh relax towards triangles that
//! tile the neighborhood of every vertex evenly.
use nalgebra::{DMatrix, Matrix2, Vector2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// How the angles of a reference triangle are chosen from the valences of its vertices.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriangleHeuristic {
    /// Keeps the angle of the vertex with the smallest valence and rescales the others. Ties
    /// between two vertices fix the third angle from the tied ones.
    ValenceLeading,
    /// Keeps the angle of a unique leading vertex, otherwise rescales all three angles.
    ValenceRescaled,
    /// Every reference triangle is equilateral.
    Equilateral,
}

impl Default for TriangleHeuristic {
    fn default() -> Self {
        TriangleHeuristic::ValenceLeading
    }
}

impl TriangleHeuristic {
    /// The interior angles of the reference triangle of a cell with the given vertex valences.
    ///
    /// The returned angles always sum to `π`.
    pub fn angles(&self, valences: [usize; 3]) -> [f64; 3] {
        let mut angle = valences.map(|n| 2.0 * PI / n as f64);
        match self {
            TriangleHeuristic::ValenceLeading => valence_leading(valences, &mut angle),
            TriangleHeuristic::ValenceRescaled => valence_rescaled(valences, &mut angle),
            TriangleHeuristic::Equilateral => angle = [PI / 3.0; 3],
        }
        angle
    }

    /// The vertices of the reference triangle, scaled to the area of the equilateral triangle
    /// with unit edges.
    ///
    /// The first edge lies on the x-axis and starts at `(-0.5, 0)`.
    pub fn reference_triangle(&self, valences: [usize; 3]) -> [[f64; 2]; 3] {
        shaped_triangle(self.angles(valences))
    }
}

/// Keeps angle `fixed` and rescales the other two such that all three sum to `π`.
fn rescale_others(angle: &mut [f64; 3], fixed: usize) {
    let (a, b) = ((fixed + 1) % 3, (fixed + 2) % 3);
    let scale = (PI - angle[fixed]) / (angle[a] + angle[b]);
    angle[a] *= scale;
    angle[b] *= scale;
}

fn valence_leading(n: [usize; 3], angle: &mut [f64; 3]) {
    if n[0] < n[1] && n[0] < n[2] {
        rescale_others(angle, 0);
    } else if n[0] < n[1] && n[0] == n[2] {
        angle[1] = PI - 2.0 * angle[0];
    } else if n[0] <= n[1] && n[0] > n[2] {
        rescale_others(angle, 2);
    } else if n[0] == n[1] && n[0] < n[2] {
        angle[2] = PI - 2.0 * angle[0];
    } else if n[0] == n[1] && n[0] == n[2] {
        *angle = [PI / 3.0; 3];
    } else if n[0] > n[1] && n[0] <= n[2] {
        rescale_others(angle, 1);
    } else if n[0] > n[1] && n[0] > n[2] {
        if n[1] < n[2] {
            rescale_others(angle, 1);
        } else if n[1] == n[2] {
            angle[0] = PI - 2.0 * angle[1];
        } else {
            rescale_others(angle, 2);
        }
    }
}

fn valence_rescaled(n: [usize; 3], angle: &mut [f64; 3]) {
    let leading = if n[0] < n[1] {
        if n[0] < n[2] {
            Some(0)
        } else if n[0] > n[2] {
            Some(2)
        } else {
            None
        }
    } else if n[0] > n[1] {
        if n[1] < n[2] {
            Some(1)
        } else if n[1] > n[2] {
            Some(2)
        } else {
            None
        }
    } else if n[0] > n[2] {
        Some(2)
    } else {
        None
    };

    match leading {
        Some(fixed) => rescale_others(angle, fixed),
        None => {
            let scale = PI / (angle[0] + angle[1] + angle[2]);
            angle.iter_mut().for_each(|a| *a *= scale);
        }
    }
}

/// A triangle with the given angles at its first two vertices and the area `√3 / 4`.
fn shaped_triangle(angle: [f64; 3]) -> [[f64; 2]; 3] {
    let x0 = -0.5;
    let l = 1.0;
    let d = l * angle[0].sin() * angle[1].sin() / (angle[0] + angle[1]).sin();
    let scale = ((3.0f64.sqrt() / 2.0) / (l * d)).sqrt();
    let (l, d) = (l * scale, d * scale);
    [[x0, 0.0], [x0 + l, 0.0], [x0 + d / angle[0].tan(), d]]
}

/// Maps the reference gradients of a triangle (one column per basis function) to gradients on
/// the given triangle, and returns them with the area ratio `|det J|`.
pub fn physical_gradients(vertices: &[[f64; 2]; 3], reference_gradients: &DMatrix<f64>) -> Option<(DMatrix<f64>, f64)> {
    let [v0, v1, v2] = vertices.map(|v| Vector2::new(v[0], v[1]));
    let jacobian = Matrix2::from_columns(&[v1 - v0, v2 - v0]);
    let determinant = jacobian.determinant();
    let jacobian_inv_t = jacobian.try_inverse()?.transpose();
    let mut gradients = DMatrix::zeros(2, reference_gradients.ncols());
    for (i, grad_ref) in reference_gradients.column_iter().enumerate() {
        let g = jacobian_inv_t * Vector2::new(grad_ref[0], grad_ref[1]);
        gradients.set_column(i, &g);
    }
    Some((gradients, determinant.abs()))
}
