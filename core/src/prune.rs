//! Node pruning
//!
//! A node is dead when it has no mesh and every child (if any) is dead.
//! Dead nodes can never contribute geometry, so they are removed together
//! with their references from child lists and scene root lists.

use crate::document::{Document, Node};
use crate::error::{Error, Result, check_index};
use crate::remap::Remap;

/// Outcome of [`prune_nodes`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Total nodes removed
    pub removed: usize,
    /// Rounds that removed at least one node
    pub rounds: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    InProgress,
    Done,
}

/// Mark every dead node
///
/// Post-order over an explicit stack, so deep hierarchies cannot overflow
/// the call stack. Each node is evaluated exactly once.
///
/// # Errors
///
/// [`Error::OutOfRange`] for a child index past the node array and
/// [`Error::NodeCycle`] if the child graph loops back on itself.
pub fn dead_nodes(nodes: &[Node]) -> Result<Vec<bool>> {
    let mut state = vec![Visit::Unvisited; nodes.len()];
    let mut dead = vec![false; nodes.len()];
    let mut stack = Vec::new();

    for start in 0..nodes.len() {
        if state[start] != Visit::Unvisited {
            continue;
        }
        stack.push(start);

        while let Some(&current) = stack.last() {
            match state[current] {
                Visit::Unvisited => {
                    state[current] = Visit::InProgress;
                    for &child in &nodes[current].children {
                        check_index("node", child, nodes.len(), || {
                            format!("children of node {current}")
                        })?;
                        match state[child] {
                            Visit::Unvisited => stack.push(child),
                            Visit::InProgress => return Err(Error::NodeCycle(child)),
                            Visit::Done => {}
                        }
                    }
                }
                Visit::InProgress => {
                    stack.pop();
                    let node = &nodes[current];
                    dead[current] =
                        node.mesh.is_none() && node.children.iter().all(|&child| dead[child]);
                    state[current] = Visit::Done;
                }
                // Shared child pushed twice; already evaluated
                Visit::Done => {
                    stack.pop();
                }
            }
        }
    }

    Ok(dead)
}

/// Remove dead nodes until none are left
///
/// Survivors keep their relative order. Child lists and the root list of
/// every scene are rewritten through the same dense remap.
pub fn prune_nodes(doc: &Document) -> Result<(Document, PruneReport)> {
    let mut out = doc.clone();
    let mut report = PruneReport::default();

    loop {
        let dead = dead_nodes(&out.nodes)?;
        for (scene_index, scene) in out.scenes.iter().enumerate() {
            for &root in &scene.nodes {
                check_index("node", root, out.nodes.len(), || {
                    format!("scene {scene_index}")
                })?;
            }
        }

        let removed = dead.iter().filter(|&&d| d).count();
        if removed == 0 {
            break;
        }

        let keep: Vec<bool> = dead.iter().map(|d| !d).collect();
        let remap = Remap::from_mask("node", &keep);

        let mut nodes = remap.filter(&out.nodes);
        for node in &mut nodes {
            node.children = remap_list(&remap, &node.children);
        }
        for scene in &mut out.scenes {
            scene.nodes = remap_list(&remap, &scene.nodes);
        }
        out.nodes = nodes;

        report.removed += removed;
        report.rounds += 1;
        tracing::debug!(
            "Prune round {}: removed {} nodes, {} left",
            report.rounds,
            removed,
            out.nodes.len()
        );
    }

    Ok((out, report))
}

/// Drop indices that did not survive and renumber the rest
fn remap_list(remap: &Remap, indices: &[usize]) -> Vec<usize> {
    indices.iter().filter_map(|&i| remap.try_get(i)).collect()
}
