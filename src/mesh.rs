use crate::element::CellKind;
use eyre::eyre;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub mod procedural;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    kind: CellKind,
    vertices: Vec<usize>,
}

impl Cell {
    /// # Panics
    ///
    /// Panics if the number of vertices does not match the kind.
    pub fn new(kind: CellKind, vertices: Vec<usize>) -> Self {
        assert_eq!(vertices.len(), kind.num_vertices(), "Vertex count must match cell kind");
        Self { kind, vertices }
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn vertices(&self) -> &[usize] {
        &self.vertices
    }
}

/// A facet on the boundary of a mesh, tagged with the id of the face it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryFacet {
    pub vertices: Vec<usize>,
    pub face: i32,
}

/// An unstructured mesh embedded in 3D, possibly mixing cell kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    vertices: Vec<Point3<f64>>,
    cells: Vec<Cell>,
    boundary: Vec<BoundaryFacet>,
}

impl Mesh {
    pub fn from_vertices_and_cells(vertices: Vec<Point3<f64>>, cells: Vec<Cell>) -> Self {
        Self {
            vertices,
            cells,
            boundary: Vec::new(),
        }
    }

    pub fn with_boundary(mut self, boundary: Vec<BoundaryFacet>) -> Self {
        self.boundary = boundary;
        self
    }

    /// Checks that every cell and facet references existing vertices.
    pub fn validate(&self) -> eyre::Result<()> {
        let n = self.vertices.len();
        for (i, cell) in self.cells.iter().enumerate() {
            if let Some(&v) = cell.vertices.iter().find(|&&v| v >= n) {
                return Err(eyre!("Cell {} references vertex {}, but the mesh has {} vertices", i, v, n));
            }
        }
        for facet in &self.boundary {
            if let Some(&v) = facet.vertices.iter().find(|&&v| v >= n) {
                return Err(eyre!("Boundary facet on face {} references missing vertex {}", facet.face, v));
            }
        }
        Ok(())
    }

    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn boundary_facets(&self) -> &[BoundaryFacet] {
        &self.boundary
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// The number of cells sharing each vertex.
    pub fn vertex_valences(&self) -> Vec<usize> {
        let mut valences = vec![0; self.vertices.len()];
        for cell in &self.cells {
            for &v in &cell.vertices {
                valences[v] += 1;
            }
        }
        valences
    }

    /// All distinct `(vertex, face)` pairs of the boundary, sorted by vertex.
    ///
    /// A vertex on the intersection of several faces appears once per face.
    pub fn boundary_vertex_faces(&self) -> Vec<(usize, i32)> {
        self.boundary
            .iter()
            .flat_map(|facet| facet.vertices.iter().map(move |&v| (v, facet.face)))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn cell_vertices(&self, cell: usize) -> impl Iterator<Item = &Point3<f64>> {
        self.cells[cell].vertices.iter().map(move |&v| &self.vertices[v])
    }

    /// The arithmetic mean of the cell's vertices.
    pub fn cell_centroid(&self, cell: usize) -> Point3<f64> {
        let n = self.cells[cell].vertices.len() as f64;
        let sum = self
            .cell_vertices(cell)
            .fold(Vector3::zeros(), |acc, v| acc + v.coords);
        Point3::from(sum / n)
    }

    pub fn transform_vertices(&mut self, mut transformation: impl FnMut(&mut Point3<f64>)) {
        for v in &mut self.vertices {
            transformation(v);
        }
    }
}
