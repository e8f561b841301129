//! Assembly of element contributions into global systems.
//!
//! A [`DofMap`] numbers the degrees of freedom of an ordered list of unknown fields. Every cell
//! then has a [`LocalLayout`](local::LocalLayout) listing its global dofs, which is used both
//! to record the local unknowns and to scatter the local residual and Jacobian.
use crate::field::{FieldId, FieldKind, FieldRegistry};
use crate::mesh::Mesh;
use nalgebra::{DVector, DVectorView};

pub mod global;
pub mod local;

pub use global::*;
pub use local::*;

/// Global numbering of the dofs of a set of unknown fields.
///
/// Dofs are numbered field by field in the given order. Within a field, the dofs of one entity
/// are contiguous: `offset + entity * components + component`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DofMap {
    unknowns: Vec<FieldId>,
    kinds: Vec<FieldKind>,
    components: Vec<usize>,
    offsets: Vec<usize>,
}

impl DofMap {
    pub fn new(registry: &FieldRegistry, unknowns: &[FieldId]) -> Self {
        let mut offsets = Vec::with_capacity(unknowns.len() + 1);
        offsets.push(0);
        let mut kinds = Vec::with_capacity(unknowns.len());
        let mut components = Vec::with_capacity(unknowns.len());
        for &id in unknowns {
            let field = registry.field(id);
            kinds.push(field.kind());
            components.push(field.components());
            let next = offsets[offsets.len() - 1] + field.values().len();
            offsets.push(next);
        }
        Self {
            unknowns: unknowns.to_vec(),
            kinds,
            components,
            offsets,
        }
    }

    pub fn unknowns(&self) -> &[FieldId] {
        &self.unknowns
    }

    pub fn num_dofs(&self) -> usize {
        self.offsets[self.offsets.len() - 1]
    }

    pub fn kind(&self, block: usize) -> FieldKind {
        self.kinds[block]
    }

    pub fn components(&self, block: usize) -> usize {
        self.components[block]
    }

    /// The global index of a component of an entity of the `block`-th unknown.
    pub fn global_index(&self, block: usize, entity: usize, component: usize) -> usize {
        self.offsets[block] + entity * self.components[block] + component
    }

    /// The entities of the `block`-th unknown that are supported on the given cell.
    pub fn cell_entities(&self, mesh: &Mesh, block: usize, cell: usize) -> Vec<usize> {
        match self.kinds[block] {
            FieldKind::Nodal => mesh.cells()[cell].vertices().to_vec(),
            FieldKind::Elementwise => vec![cell],
            FieldKind::Global => vec![0],
        }
    }

    pub fn local_layout(&self, mesh: &Mesh, cell: usize) -> LocalLayout {
        LocalLayout::new(self, mesh, cell)
    }

    pub fn local_layouts(&self, mesh: &Mesh) -> Vec<LocalLayout> {
        (0..mesh.num_cells())
            .map(|cell| self.local_layout(mesh, cell))
            .collect()
    }

    /// Collects the current values of all unknowns into a single vector.
    pub fn gather(&self, registry: &FieldRegistry) -> DVector<f64> {
        let mut x = DVector::zeros(self.num_dofs());
        for (block, &id) in self.unknowns.iter().enumerate() {
            let values = registry.field(id).values();
            x.rows_mut(self.offsets[block], values.len())
                .copy_from(values);
        }
        x
    }

    /// Writes a global vector back into the current values of the unknowns.
    pub fn scatter(&self, x: &DVectorView<f64>, registry: &mut FieldRegistry) {
        assert_eq!(x.len(), self.num_dofs(), "Vector length must match the number of dofs");
        for (block, &id) in self.unknowns.iter().enumerate() {
            let values = registry.field_mut(id).values_mut();
            let n = values.len();
            values.copy_from(&x.rows(self.offsets[block], n));
        }
    }

    /// Prescribed values of all unknowns, as sorted `(global dof, value)` pairs.
    pub fn dirichlet_values(&self, registry: &FieldRegistry, mesh: &Mesh, time: f64) -> Vec<(usize, f64)> {
        self.unknowns
            .iter()
            .enumerate()
            .flat_map(|(block, &id)| {
                let offset = self.offsets[block];
                registry
                    .dirichlet_values(mesh, id, time)
                    .into_iter()
                    .map(move |(index, value)| (offset + index, value))
            })
            .collect()
    }
}
