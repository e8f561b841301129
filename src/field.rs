//! Named unknown fields with current and previous values.
//!
//! Fields are registered once while a problem is set up. The returned [`FieldId`]s are the only
//! handle used afterwards, so no name lookup happens during assembly.
use crate::mesh::Mesh;
use eyre::eyre;
use nalgebra::{DVector, Point3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a registered field.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldId(usize);

impl FieldId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Where the values of a field live.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// One entity per mesh vertex, interpolated with the cell basis.
    Nodal,
    /// One entity per cell, constant on the cell.
    Elementwise,
    /// A single entity shared by all cells.
    Global,
}

impl FieldKind {
    pub fn num_entities(&self, mesh: &Mesh) -> usize {
        match self {
            FieldKind::Nodal => mesh.num_vertices(),
            FieldKind::Elementwise => mesh.num_cells(),
            FieldKind::Global => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    pub components: usize,
}

/// The arguments of a boundary condition predicate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryQuery {
    pub position: Point3<f64>,
    pub face: i32,
    pub time: f64,
    pub component: usize,
}

/// Returns the prescribed value for a boundary dof, or `None` if the dof is free.
pub type BoundaryCondition = Box<dyn Fn(&BoundaryQuery) -> Option<f64> + Send + Sync>;

pub struct Field {
    descriptor: FieldDescriptor,
    values: DVector<f64>,
    old_values: DVector<f64>,
    boundary_condition: Option<BoundaryCondition>,
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("descriptor", &self.descriptor)
            .field("values", &self.values)
            .field("old_values", &self.old_values)
            .field("has_boundary_condition", &self.boundary_condition.is_some())
            .finish()
    }
}

impl Field {
    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn kind(&self) -> FieldKind {
        self.descriptor.kind
    }

    pub fn components(&self) -> usize {
        self.descriptor.components
    }

    pub fn num_entities(&self) -> usize {
        self.values.len() / self.descriptor.components
    }

    /// Current values, stored entity by entity: `values[entity * components + component]`.
    pub fn values(&self) -> &DVector<f64> {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut DVector<f64> {
        &mut self.values
    }

    /// Values at the previous time step.
    pub fn old_values(&self) -> &DVector<f64> {
        &self.old_values
    }

    pub fn value(&self, entity: usize, component: usize) -> f64 {
        self.values[entity * self.descriptor.components + component]
    }

    pub fn old_value(&self, entity: usize, component: usize) -> f64 {
        self.old_values[entity * self.descriptor.components + component]
    }

    /// The current value of a 3-component field at the given entity.
    pub fn vector(&self, entity: usize) -> [f64; 3] {
        debug_assert_eq!(self.descriptor.components, 3);
        [0, 1, 2].map(|c| self.value(entity, c))
    }

    pub fn old_vector(&self, entity: usize) -> [f64; 3] {
        debug_assert_eq!(self.descriptor.components, 3);
        [0, 1, 2].map(|c| self.old_value(entity, c))
    }
}

/// Registry of all fields of a simulation, indexed by [`FieldId`].
#[derive(Debug, Default)]
pub struct FieldRegistry {
    fields: Vec<Field>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a zero-initialized field sized for the given mesh.
    pub fn register(&mut self, mesh: &Mesh, name: &str, kind: FieldKind, components: usize) -> eyre::Result<FieldId> {
        if components == 0 {
            return Err(eyre!("Field {} must have at least one component", name));
        }
        if self.find(name).is_some() {
            return Err(eyre!("A field named {} is already registered", name));
        }
        let n = kind.num_entities(mesh) * components;
        self.fields.push(Field {
            descriptor: FieldDescriptor {
                name: name.to_string(),
                kind,
                components,
            },
            values: DVector::zeros(n),
            old_values: DVector::zeros(n),
            boundary_condition: None,
        });
        Ok(FieldId(self.fields.len() - 1))
    }

    pub fn find(&self, name: &str) -> Option<FieldId> {
        self.fields
            .iter()
            .position(|field| field.name() == name)
            .map(FieldId)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// # Panics
    ///
    /// Panics if the id was issued by a different registry.
    pub fn field(&self, id: FieldId) -> &Field {
        &self.fields[id.0]
    }

    pub fn field_mut(&mut self, id: FieldId) -> &mut Field {
        &mut self.fields[id.0]
    }

    pub fn initialize_constant(&mut self, id: FieldId, value: f64) {
        let field = self.field_mut(id);
        field.values.fill(value);
        field.old_values.fill(value);
    }

    /// Initializes every component from a function of position and component index.
    ///
    /// The position is the vertex for nodal fields, the cell centroid for elementwise fields
    /// and the origin for global fields.
    pub fn initialize_with<F>(&mut self, mesh: &Mesh, id: FieldId, f: F)
    where
        F: Fn(&Point3<f64>, usize) -> f64,
    {
        let field = &mut self.fields[id.0];
        let c = field.descriptor.components;
        for entity in 0..field.num_entities() {
            let position = match field.descriptor.kind {
                FieldKind::Nodal => mesh.vertices()[entity],
                FieldKind::Elementwise => mesh.cell_centroid(entity),
                FieldKind::Global => Point3::origin(),
            };
            for component in 0..c {
                field.values[entity * c + component] = f(&position, component);
            }
        }
        field.old_values.copy_from(&field.values);
    }

    pub fn attach_boundary_condition(&mut self, id: FieldId, condition: BoundaryCondition) {
        self.field_mut(id).boundary_condition = Some(condition);
    }

    /// The prescribed boundary values of a nodal field, as `(entity * components + component,
    /// value)` pairs sorted by index.
    ///
    /// A vertex on several faces is prescribed by the first face whose condition applies.
    pub fn dirichlet_values(&self, mesh: &Mesh, id: FieldId, time: f64) -> Vec<(usize, f64)> {
        let field = self.field(id);
        let condition = match (&field.boundary_condition, field.kind()) {
            (Some(condition), FieldKind::Nodal) => condition,
            _ => return Vec::new(),
        };
        let c = field.components();
        let mut prescribed: Vec<(usize, f64)> = Vec::new();
        for (vertex, face) in mesh.boundary_vertex_faces() {
            for component in 0..c {
                let index = vertex * c + component;
                if prescribed.iter().any(|&(i, _)| i == index) {
                    continue;
                }
                let query = BoundaryQuery {
                    position: mesh.vertices()[vertex],
                    face,
                    time,
                    component,
                };
                if let Some(value) = condition(&query) {
                    prescribed.push((index, value));
                }
            }
        }
        prescribed.sort_unstable_by_key(|&(i, _)| i);
        prescribed
    }

    /// Copies current values into the previous-step values of the given fields.
    pub fn copy_to_old(&mut self, ids: &[FieldId]) {
        for &id in ids {
            let field = self.field_mut(id);
            field.old_values.copy_from(&field.values);
        }
    }

    /// Overwrites the current values of `to` with those of `from`.
    pub fn copy_values(&mut self, from: FieldId, to: FieldId) -> eyre::Result<()> {
        if from == to {
            return Ok(());
        }
        let source = self.field(from);
        let target = self.field(to);
        if source.kind() != target.kind() || source.values.len() != target.values.len() {
            return Err(eyre!("Cannot copy field {} into incompatible field {}", source.name(), target.name()));
        }
        let values = source.values.clone();
        self.field_mut(to).values.copy_from(&values);
        Ok(())
    }
}
