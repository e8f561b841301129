use matrixcompare::assert_matrix_eq;
use nalgebra::{DMatrix, DVector, DVectorView};
use surfem::assembly::{
    apply_homogeneous_dirichlet_bc_csr, evaluate_residual, AssemblyContext, AutodiffAssembler, CsrAssembler,
    DofMap, ElementAssembler, LocalResidual, LocalValues, ResidualKernel,
};
use surfem::autodiff::Real;
use surfem::element::ElementTables;
use surfem::field::{FieldId, FieldKind, FieldRegistry};
use surfem::optimize::calculus::approximate_jacobian_fd;
use surfem::procedural::{create_unit_line_mesh, create_unit_square_quad_mesh};

/// `r_u[e] = u_e² g + u_0 / 2` per cell vertex and `r_g = Σ_e u_e²` per cell.
struct QuadraticKernel {
    u: FieldId,
    g: FieldId,
}

impl ResidualKernel for QuadraticKernel {
    fn unknowns(&self) -> Vec<FieldId> {
        vec![self.u, self.g]
    }

    fn residual<'l, T: Real>(
        &self,
        _context: &AssemblyContext,
        _cell: usize,
        unknowns: &LocalValues<'l, T>,
    ) -> eyre::Result<LocalResidual<'l, T>> {
        let u = unknowns.scalars(0);
        let g = unknowns.scalar(1, 0, 0);
        let mut residual = LocalResidual::zeros(unknowns.layout());
        for (e, &u_e) in u.iter().enumerate() {
            residual.add(0, 0, e, u_e * u_e * g + u[0] * 0.5);
            residual.add(1, 0, 0, u_e * u_e);
        }
        Ok(residual)
    }
}

fn line_problem() -> (surfem::mesh::Mesh, FieldRegistry, QuadraticKernel) {
    let mesh = create_unit_line_mesh(2);
    let mut fields = FieldRegistry::new();
    let u = fields.register(&mesh, "u", FieldKind::Nodal, 1).unwrap();
    let g = fields.register(&mesh, "g", FieldKind::Global, 1).unwrap();
    fields
        .field_mut(u)
        .values_mut()
        .copy_from_slice(&[1.0, 2.0, 3.0]);
    fields.initialize_constant(g, 2.0);
    (mesh, fields, QuadraticKernel { u, g })
}

#[test]
fn dof_map_numbers_fields_in_order() {
    let mesh = create_unit_square_quad_mesh(1);
    let mut fields = FieldRegistry::new();
    let x = fields.register(&mesh, "x", FieldKind::Nodal, 3).unwrap();
    let l = fields.register(&mesh, "l", FieldKind::Elementwise, 1).unwrap();
    let lambda = fields.register(&mesh, "lambda", FieldKind::Global, 1).unwrap();

    let dofs = DofMap::new(&fields, &[x, l, lambda]);
    assert_eq!(dofs.num_dofs(), 4 * 3 + 1 + 1);
    assert_eq!(dofs.global_index(0, 2, 1), 7);
    assert_eq!(dofs.global_index(1, 0, 0), 12);
    assert_eq!(dofs.global_index(2, 0, 0), 13);

    let layout = dofs.local_layout(&mesh, 0);
    assert_eq!(layout.len(), 14);
    assert_eq!(layout.num_blocks(), 3);
    // Component-major within the nodal block
    assert_eq!(layout.local_index(0, 1, 2), 6);
    assert_eq!(layout.global_dofs()[6], dofs.global_index(0, 2, 1));
    assert_eq!(layout.local_index(1, 0, 0), 12);
    assert_eq!(layout.local_index(2, 0, 0), 13);
}

#[test]
fn gather_and_scatter_roundtrip() {
    let (mesh, mut fields, kernel) = line_problem();
    let dofs = DofMap::new(&fields, &kernel.unknowns());
    let x = dofs.gather(&fields);
    assert_eq!(x, DVector::from_column_slice(&[1.0, 2.0, 3.0, 2.0]));

    let y = DVector::from_column_slice(&[4.0, 5.0, 6.0, 7.0]);
    dofs.scatter(&DVectorView::from(&y), &mut fields);
    assert_eq!(fields.field(kernel.u).value(1, 0), 5.0);
    assert_eq!(fields.field(kernel.g).value(0, 0), 7.0);

    let layout = dofs.local_layout(&mesh, 1);
    assert_eq!(layout.gather(&fields), vec![5.0, 6.0, 7.0]);
}

#[test]
fn autodiff_jacobian_matches_finite_differences() {
    let (mesh, fields, kernel) = line_problem();
    let elements = ElementTables::new().unwrap();
    let context = AssemblyContext {
        mesh: &mesh,
        elements: &elements,
        fields: &fields,
        time: 0.0,
    };
    let dofs = DofMap::new(&fields, &kernel.unknowns());
    let layout = dofs.local_layout(&mesh, 1);
    let mut values = DVector::from_vec(layout.gather(&fields));

    let fd = approximate_jacobian_fd(
        layout.len(),
        |x, mut f| {
            let r = evaluate_residual(&kernel, &context, &layout, 1, x.iter().copied().collect()).unwrap();
            f.copy_from(&r);
        },
        &mut values,
        1e-6,
    );

    let assembler = AutodiffAssembler::new(kernel);
    let contribution = assembler.assemble_element(&context, &layout, 1).unwrap();
    assert_matrix_eq!(contribution.jacobian, fd, comp = abs, tol = 1e-8);
}

#[test]
fn csr_assembly_sums_cell_contributions() {
    let (mesh, fields, kernel) = line_problem();
    let elements = ElementTables::new().unwrap();
    let context = AssemblyContext {
        mesh: &mesh,
        elements: &elements,
        fields: &fields,
        time: 0.0,
    };
    let dofs = DofMap::new(&fields, &kernel.unknowns());
    let layouts = dofs.local_layouts(&mesh);
    let assembler = AutodiffAssembler::new(kernel);

    let mut csr_assembler = CsrAssembler::default();
    let system = csr_assembler
        .assemble(&assembler, &context, &layouts, dofs.num_dofs())
        .unwrap();

    let expected_residual = DVector::from_column_slice(&[2.5, 17.5, 19.0, 18.0]);
    #[rustfmt::skip]
    let expected_matrix = DMatrix::from_row_slice(4, 4, &[
        4.5, 0.0, 0.0, 1.0,
        0.5, 16.5, 0.0, 8.0,
        0.0, 0.5, 12.0, 9.0,
        2.0, 8.0, 6.0, 0.0,
    ]);
    assert_matrix_eq!(system.residual, expected_residual, comp = abs, tol = 1e-12);
    assert_matrix_eq!(system.dense_matrix(), expected_matrix, comp = abs, tol = 1e-12);

    // The u dofs at both ends do not couple
    assert_eq!(system.matrix.nnz(), 16 - 2);

    // Assembling again reuses the pattern and gives identical results
    let again = csr_assembler
        .assemble(&assembler, &context, &layouts, dofs.num_dofs())
        .unwrap();
    assert_eq!(again, system);
}

#[test]
fn dirichlet_rows_and_columns_are_replaced_by_scaled_identity() {
    let pattern = CsrAssembler::assemble_pattern(3, &[]).unwrap();
    assert_eq!(pattern.nnz(), 0);

    let dense = DMatrix::from_row_slice(3, 3, &[2.0, 1.0, 0.0, 1.0, 3.0, 1.0, 0.0, 1.0, 4.0]);
    let mut csr = nalgebra_sparse::CsrMatrix::from(&dense);
    apply_homogeneous_dirichlet_bc_csr(&mut csr, &[1]);

    let expected = DMatrix::from_row_slice(3, 3, &[2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 4.0]);
    assert_matrix_eq!(DMatrix::from(&csr), expected, comp = abs, tol = 1e-15);
}
