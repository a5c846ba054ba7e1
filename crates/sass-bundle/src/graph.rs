//! Dependency resolution and emission ordering for consolidated variables.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Edges point from a record to the records it needs emitted first:
//!
//! - a variable depends on every variable its value reads
//! - a conditional depends on the variables its conditions and bodies read
//! - a variable assigned inside a conditional depends on that conditional
//!   (the "depender" edge, inverted relative to the others)
//!
//! The graph is only built once the whole stream, imports included, has
//! been read, so forward references resolve.

use crate::error::{BundleError, excerpt};
use crate::variable::{VariableId, VariableKind, VariableTable};

/// Resolved dependency edges of a [`VariableTable`].
#[derive(Debug)]
pub struct DependencyGraph {
    edges: Vec<Vec<VariableId>>,
}

/// Explicit DFS frame: a node and how many of its edges were followed.
#[derive(Debug, Clone, Copy)]
struct Frame {
    node: VariableId,
    cursor: usize,
}

impl DependencyGraph {
    /// Resolve every raw dependency name against the table.
    ///
    /// Fails with [`BundleError::UndefinedVariable`] on the first name that
    /// is not declared anywhere in the bundle.
    pub fn build(table: &VariableTable) -> Result<Self, BundleError> {
        let mut edges: Vec<Vec<VariableId>> = vec![Vec::new(); table.len()];

        let resolve = |name: &str, declaration: &str| {
            table
                .lookup(name)
                .ok_or_else(|| BundleError::UndefinedVariable {
                    name: name.to_string(),
                    declaration: excerpt(declaration),
                })
        };

        for (id, variable) in table.iter() {
            for branch in variable.branches() {
                for name in &branch.raw_dependencies {
                    edges[id.index()].push(resolve(name, &branch.declaration)?);
                }

                if let VariableKind::Conditional {
                    condition_dependencies,
                    assignees,
                    ..
                } = &branch.kind
                {
                    for name in condition_dependencies {
                        edges[id.index()].push(resolve(name, &branch.declaration)?);
                    }
                    for name in assignees {
                        let assignee = resolve(name, &branch.declaration)?;
                        edges[assignee.index()].push(id);
                    }
                }
            }
        }

        for list in &mut edges {
            let mut seen = Vec::with_capacity(list.len());
            list.retain(|id| {
                if seen.contains(id) {
                    false
                } else {
                    seen.push(*id);
                    true
                }
            });
        }

        Ok(Self { edges })
    }

    /// Direct dependencies of a record.
    pub fn dependencies(&self, id: VariableId) -> &[VariableId] {
        &self.edges[id.index()]
    }

    /// Order every record so dependencies come before dependents.
    ///
    /// Depth-first over an explicit stack, visiting roots in declaration
    /// order. Reaching a node that is on the current path is a cycle and
    /// fails with the declaration where it was detected.
    pub fn topological_order(&self, table: &VariableTable) -> Result<Vec<VariableId>, BundleError> {
        let count = self.edges.len();
        let mut visited = vec![false; count];
        let mut yielded = vec![false; count];
        let mut order = Vec::with_capacity(count);
        let mut stack: Vec<Frame> = Vec::new();

        for (root, _) in table.iter() {
            if visited[root.index()] {
                continue;
            }
            visited[root.index()] = true;
            stack.push(Frame {
                node: root,
                cursor: 0,
            });

            while let Some(frame) = stack.last_mut() {
                let node = frame.node;
                match self.edges[node.index()].get(frame.cursor).copied() {
                    Some(dependency) => {
                        frame.cursor += 1;
                        if !visited[dependency.index()] {
                            visited[dependency.index()] = true;
                            stack.push(Frame {
                                node: dependency,
                                cursor: 0,
                            });
                        } else if !yielded[dependency.index()] {
                            return Err(BundleError::DependencyCycle {
                                declaration: excerpt(&table.get(node).emitted_text()),
                                dependency: table.get(dependency).key.clone(),
                            });
                        }
                    }
                    None => {
                        stack.pop();
                        yielded[node.index()] = true;
                        order.push(node);
                    }
                }
            }
        }

        Ok(order)
    }
}
