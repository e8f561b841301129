use crate::var::Var;
use nalgebra::DMatrix;
use std::cell::RefCell;

/// A recorded operation with up to two parents and the local partial derivatives
/// with respect to them.
#[derive(Debug, Clone, Copy)]
struct Node {
    parents: [usize; 2],
    partials: [f64; 2],
    arity: u8,
}

impl Node {
    fn leaf() -> Self {
        Self {
            parents: [0, 0],
            partials: [0.0, 0.0],
            arity: 0,
        }
    }
}

/// Recording of the operations performed on variables descending from independent variables.
///
/// Operations that only involve constants are never recorded. A tape is meant to live for the
/// duration of a single element assembly: create it, declare the local unknowns as
/// independents, evaluate the residual, extract the Jacobian and drop (or [`clear`](Self::clear))
/// it.
#[derive(Debug, Default)]
pub struct Tape {
    nodes: RefCell<Vec<Node>>,
}

impl Tape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded nodes, including independent variables.
    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discards the recording.
    ///
    /// Requires exclusive access, so no variable recorded on the tape can survive the call.
    pub fn clear(&mut self) {
        self.nodes.get_mut().clear();
    }

    /// Declares a new independent variable with the given value.
    pub fn independent(&self, value: f64) -> Var<'_> {
        let index = self.push(Node::leaf());
        Var::recorded(self, index, value)
    }

    /// Declares a block of independent variables, in order.
    pub fn independents(&self, values: &[f64]) -> Vec<Var<'_>> {
        values.iter().map(|&v| self.independent(v)).collect()
    }

    pub(crate) fn push_unary(&self, parent: usize, partial: f64) -> usize {
        self.push(Node {
            parents: [parent, 0],
            partials: [partial, 0.0],
            arity: 1,
        })
    }

    pub(crate) fn push_binary(&self, a: usize, da: f64, b: usize, db: f64) -> usize {
        self.push(Node {
            parents: [a, b],
            partials: [da, db],
            arity: 2,
        })
    }

    fn push(&self, node: Node) -> usize {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(node);
        nodes.len() - 1
    }

    /// Computes the Jacobian of `dependents` with respect to `independents`.
    ///
    /// Row `i` holds the derivatives of `dependents[i]` and column `j` the derivatives with
    /// respect to `independents[j]`. Dependents that are constants produce zero rows.
    ///
    /// # Panics
    ///
    /// Panics if one of the independents was not declared with
    /// [`independent`](Self::independent) on this tape.
    pub fn jacobian(&self, dependents: &[Var<'_>], independents: &[Var<'_>]) -> DMatrix<f64> {
        let nodes = self.nodes.borrow();
        let mut column_of = vec![None; nodes.len()];
        for (j, var) in independents.iter().enumerate() {
            let index = var
                .index_on(self)
                .expect("Independent variable must be recorded on this tape");
            assert_eq!(nodes[index].arity, 0, "Independent variable must be a leaf of the tape");
            column_of[index] = Some(j);
        }

        let mut jacobian = DMatrix::zeros(dependents.len(), independents.len());
        let mut adjoints = vec![0.0; nodes.len()];
        for (i, dependent) in dependents.iter().enumerate() {
            let root = match dependent.index_on(self) {
                Some(root) => root,
                None => continue,
            };

            adjoints[..=root].iter_mut().for_each(|a| *a = 0.0);
            adjoints[root] = 1.0;

            for k in (0..=root).rev() {
                let adjoint = adjoints[k];
                // Skipping zero adjoints also keeps infinite partials (e.g. sqrt at zero)
                // of unused branches from polluting the result with NaN
                if adjoint == 0.0 {
                    continue;
                }
                if let Some(j) = column_of[k] {
                    jacobian[(i, j)] += adjoint;
                }
                let node = &nodes[k];
                for p in 0..node.arity as usize {
                    adjoints[node.parents[p]] += adjoint * node.partials[p];
                }
            }
        }

        jacobian
    }
}
