use crate::assembly::DofMap;
use crate::element::{ElementTables, TabulatedElement};
use crate::field::{FieldId, FieldRegistry};
use crate::mesh::Mesh;
use nalgebra::{DMatrix, DVector};
use surfem_autodiff::{Real, Tape, Var};

/// Everything an element assembler may read while assembling a single cell.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyContext<'a> {
    pub mesh: &'a Mesh,
    pub elements: &'a ElementTables,
    pub fields: &'a FieldRegistry,
    pub time: f64,
}

impl<'a> AssemblyContext<'a> {
    pub fn element(&self, cell: usize) -> &'a TabulatedElement {
        self.elements.get(self.mesh.cells()[cell].kind())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LocalBlock {
    field: FieldId,
    entities: Vec<usize>,
    components: usize,
    offset: usize,
}

/// The global dofs of a single cell, in unknown/component/entity order.
///
/// The local index of component `c` of the `e`-th entity of the `b`-th unknown is
/// `offset_b + c * n_b + e`, where `n_b` is the number of entities of the block on the cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalLayout {
    blocks: Vec<LocalBlock>,
    global_dofs: Vec<usize>,
}

impl LocalLayout {
    pub fn new(dofs: &DofMap, mesh: &Mesh, cell: usize) -> Self {
        let mut blocks = Vec::with_capacity(dofs.unknowns().len());
        let mut global_dofs = Vec::new();
        for (block, &field) in dofs.unknowns().iter().enumerate() {
            let entities = dofs.cell_entities(mesh, block, cell);
            let components = dofs.components(block);
            let offset = global_dofs.len();
            for c in 0..components {
                global_dofs.extend(
                    entities
                        .iter()
                        .map(|&entity| dofs.global_index(block, entity, c)),
                );
            }
            blocks.push(LocalBlock {
                field,
                entities,
                components,
                offset,
            });
        }
        Self { blocks, global_dofs }
    }

    pub fn len(&self) -> usize {
        self.global_dofs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.global_dofs.is_empty()
    }

    pub fn global_dofs(&self) -> &[usize] {
        &self.global_dofs
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// The entities (vertices, the cell, or the single global entity) of a block.
    pub fn entities(&self, block: usize) -> &[usize] {
        &self.blocks[block].entities
    }

    pub fn local_index(&self, block: usize, component: usize, local_entity: usize) -> usize {
        let b = &self.blocks[block];
        debug_assert!(component < b.components);
        debug_assert!(local_entity < b.entities.len());
        b.offset + component * b.entities.len() + local_entity
    }

    /// Current values of the cell's unknowns, read from the registry.
    pub fn gather(&self, registry: &FieldRegistry) -> Vec<f64> {
        let mut values = vec![0.0; self.len()];
        for (block, b) in self.blocks.iter().enumerate() {
            let field = registry.field(b.field);
            for c in 0..b.components {
                for (e, &entity) in b.entities.iter().enumerate() {
                    values[self.local_index(block, c, e)] = field.value(entity, c);
                }
            }
        }
        values
    }
}

/// Local unknown values of one cell, either plain or recorded on a tape.
#[derive(Debug, Clone)]
pub struct LocalValues<'l, T> {
    layout: &'l LocalLayout,
    values: Vec<T>,
}

impl<'l, T: Real> LocalValues<'l, T> {
    /// # Panics
    ///
    /// Panics if the number of values does not match the layout.
    pub fn new(layout: &'l LocalLayout, values: Vec<T>) -> Self {
        assert_eq!(layout.len(), values.len(), "Local values must match the layout");
        Self { layout, values }
    }

    pub fn layout(&self) -> &'l LocalLayout {
        self.layout
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn scalar(&self, block: usize, component: usize, local_entity: usize) -> T {
        self.values[self.layout.local_index(block, component, local_entity)]
    }

    /// The values of a scalar block, one per entity.
    pub fn scalars(&self, block: usize) -> Vec<T> {
        (0..self.layout.entities(block).len())
            .map(|e| self.scalar(block, 0, e))
            .collect()
    }

    /// The values of a 3-component block, one vector per entity.
    pub fn vectors(&self, block: usize) -> Vec<[T; 3]> {
        (0..self.layout.entities(block).len())
            .map(|e| [0, 1, 2].map(|c| self.scalar(block, c, e)))
            .collect()
    }
}

/// Local residual of one cell, laid out like the local unknowns.
#[derive(Debug, Clone)]
pub struct LocalResidual<'l, T> {
    layout: &'l LocalLayout,
    values: Vec<T>,
}

impl<'l, T: Real> LocalResidual<'l, T> {
    pub fn zeros(layout: &'l LocalLayout) -> Self {
        Self {
            layout,
            values: vec![T::zero(); layout.len()],
        }
    }

    pub fn add(&mut self, block: usize, component: usize, local_entity: usize, value: T) {
        self.values[self.layout.local_index(block, component, local_entity)] += value;
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn into_values(self) -> Vec<T> {
        self.values
    }
}

/// The dense local system of one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementContribution {
    pub residual: DVector<f64>,
    pub jacobian: DMatrix<f64>,
}

/// Computes the local residual and Jacobian of a cell.
pub trait ElementAssembler: Sync {
    /// The unknown fields, in the order of the global system.
    fn unknowns(&self) -> Vec<FieldId>;

    /// Assembles the local system. Row and column `i` of the result correspond to
    /// `layout.global_dofs()[i]`.
    fn assemble_element(
        &self,
        context: &AssemblyContext,
        layout: &LocalLayout,
        cell: usize,
    ) -> eyre::Result<ElementContribution>;
}

/// A local residual written once for any [`Real`] scalar.
///
/// Evaluated with `f64` it gives the residual, evaluated with recorded [`Var`]s it gives the
/// exact Jacobian through [`AutodiffAssembler`].
pub trait ResidualKernel: Sync {
    fn unknowns(&self) -> Vec<FieldId>;

    fn residual<'l, T: Real>(
        &self,
        context: &AssemblyContext,
        cell: usize,
        unknowns: &LocalValues<'l, T>,
    ) -> eyre::Result<LocalResidual<'l, T>>;
}

/// Evaluates a kernel with plain values, for instance to check a Jacobian or compute a
/// residual norm.
pub fn evaluate_residual<K: ResidualKernel>(
    kernel: &K,
    context: &AssemblyContext,
    layout: &LocalLayout,
    cell: usize,
    values: Vec<f64>,
) -> eyre::Result<DVector<f64>> {
    let unknowns = LocalValues::new(layout, values);
    let residual = kernel.residual(context, cell, &unknowns)?;
    Ok(DVector::from_vec(residual.into_values()))
}

/// Turns a [`ResidualKernel`] into an [`ElementAssembler`] by recording each cell on a fresh
/// tape.
#[derive(Debug, Clone)]
pub struct AutodiffAssembler<K> {
    kernel: K,
}

impl<K> AutodiffAssembler<K> {
    pub fn new(kernel: K) -> Self {
        Self { kernel }
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }
}

impl<K: ResidualKernel> ElementAssembler for AutodiffAssembler<K> {
    fn unknowns(&self) -> Vec<FieldId> {
        self.kernel.unknowns()
    }

    fn assemble_element(
        &self,
        context: &AssemblyContext,
        layout: &LocalLayout,
        cell: usize,
    ) -> eyre::Result<ElementContribution> {
        let values = layout.gather(context.fields);

        let tape = Tape::new();
        let independents: Vec<Var> = tape.independents(&values);
        let unknowns = LocalValues::new(layout, independents);
        let residual = self.kernel.residual(context, cell, &unknowns)?;
        let dependents = residual.values();

        let jacobian = tape.jacobian(dependents, unknowns.values());
        let residual = DVector::from_iterator(dependents.len(), dependents.iter().map(|r| r.value()));
        Ok(ElementContribution { residual, jacobian })
    }
}
