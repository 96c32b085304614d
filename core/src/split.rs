//! Scene partitioning
//!
//! Cuts a document into independent single-root documents. Each part keeps
//! the closure of one candidate root; the transforms of ancestors that are
//! cut away get baked into the new root so the part renders in place.
//! Meshes, materials and buffers are carried over untouched; running the
//! compactor afterwards drops what a part no longer uses.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use glam::Mat4;
use serde::{Deserialize, Serialize};

use crate::document::{Document, Scene};
use crate::error::Result;
use crate::prune::dead_nodes;
use crate::remap::Remap;
use crate::transform::{Transform, combine};

/// Which nodes become part roots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Every top-level root of the scene
    Roots,
    /// Every child of every top-level root
    #[default]
    Children,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Roots => write!(f, "roots"),
            Granularity::Children => write!(f, "children"),
        }
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "roots" => Ok(Granularity::Roots),
            "children" => Ok(Granularity::Children),
            other => Err(format!(
                "unknown granularity '{other}' (expected 'roots' or 'children')"
            )),
        }
    }
}

/// One independent sub-document
#[derive(Debug, Clone)]
pub struct SplitPart {
    /// `<base>-<discriminator>`
    pub name: String,
    /// Root node name if it has one, otherwise its index in the source.
    /// A repeat within one split gets `_<index>` appended.
    pub discriminator: String,
    /// Index of the part root in the source document
    pub root: usize,
    pub document: Document,
}

/// Split `doc` into one document per candidate root
///
/// Candidates that are dead under the pruning rule are skipped with a log
/// line; an empty scene yields no parts. Only one level is split; callers
/// recurse by splitting the produced parts again.
///
/// # Errors
///
/// Structural errors (out-of-range child or root, cycle, missing scene).
pub fn split_document(
    doc: &Document,
    base: &str,
    granularity: Granularity,
) -> Result<Vec<SplitPart>> {
    let dead = dead_nodes(&doc.nodes)?;
    let roots = doc.top_level_roots()?;
    if roots.is_empty() {
        tracing::debug!("'{}' has no scene roots, nothing to split", base);
        return Ok(Vec::new());
    }

    let candidates = candidates(doc, &roots, granularity);
    let mut parts = Vec::with_capacity(candidates.len());
    let mut taken = BTreeSet::new();

    for (root, parent) in candidates {
        let discriminator = discriminator(doc, root);
        if dead[root] {
            tracing::info!("Skipping '{}-{}': no geometry below it", base, discriminator);
            continue;
        }
        let discriminator = unique_discriminator(&mut taken, discriminator, root);

        let document = extract(doc, root, parent, &discriminator)?;
        parts.push(SplitPart {
            name: format!("{base}-{discriminator}"),
            discriminator,
            root,
            document,
        });
    }

    tracing::debug!("Split '{}' into {} parts ({})", base, parts.len(), granularity);
    Ok(parts)
}

/// Candidate roots with the matrix of the ancestor that gets cut away
fn candidates(doc: &Document, roots: &[usize], granularity: Granularity) -> Vec<(usize, Mat4)> {
    match granularity {
        Granularity::Roots => roots.iter().map(|&r| (r, Mat4::IDENTITY)).collect(),
        Granularity::Children => {
            let mut out = Vec::new();
            for &root in roots {
                let node = &doc.nodes[root];
                if node.children.is_empty() {
                    tracing::info!("Root {} has no children, skipping", discriminator(doc, root));
                    continue;
                }
                let parent = node.transform.to_matrix();
                out.extend(node.children.iter().map(|&child| (child, parent)));
            }
            out
        }
    }
}

fn discriminator(doc: &Document, node: usize) -> String {
    match doc.nodes[node].name.as_deref() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => node.to_string(),
    }
}

/// Suffix a repeated discriminator with the root's source index
fn unique_discriminator(taken: &mut BTreeSet<String>, name: String, root: usize) -> String {
    if taken.insert(name.clone()) {
        return name;
    }
    let mut candidate = format!("{name}_{root}");
    let mut retry = 1;
    while !taken.insert(candidate.clone()) {
        candidate = format!("{name}_{root}_{retry}");
        retry += 1;
    }
    tracing::warn!("Part name '{}' is taken, using '{}'", name, candidate);
    candidate
}

/// Build the single-root document for `root`
fn extract(doc: &Document, root: usize, parent: Mat4, label: &str) -> Result<Document> {
    // Children were range- and cycle-checked by dead_nodes
    let mut closure = BTreeSet::new();
    let mut stack = vec![root];
    while let Some(current) = stack.pop() {
        if closure.insert(current) {
            stack.extend(doc.nodes[current].children.iter().copied());
        }
    }

    let remap = Remap::from_live("node", doc.nodes.len(), &closure)?;
    let mut nodes = remap.filter(&doc.nodes);
    for node in &mut nodes {
        node.children = node
            .children
            .iter()
            .map(|&child| remap.get(child))
            .collect::<Result<_>>()?;
    }

    let new_root = remap.get(root)?;
    let local = nodes[new_root].transform.to_matrix();
    nodes[new_root].transform = Transform::from_matrix(combine(parent, local));

    let mut out = doc.clone();
    out.nodes = nodes;
    out.scene = Some(0);
    out.scenes = vec![Scene {
        name: Some(label.to_string()),
        nodes: vec![new_root],
        ..Scene::default()
    }];
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Node;
    use crate::transform::translation;

    fn scene_doc(nodes: Vec<Node>, roots: Vec<usize>) -> Document {
        Document {
            scene: Some(0),
            scenes: vec![Scene {
                nodes: roots,
                ..Scene::default()
            }],
            nodes,
            ..Document::default()
        }
    }

    #[test]
    fn test_parent_translation_is_baked() {
        let doc = scene_doc(
            vec![
                Node::group(vec![1])
                    .named("Shelf")
                    .transformed(Transform::from_translation([1.0, 2.0, 3.0])),
                Node::with_mesh(0)
                    .named("Pot")
                    .transformed(Transform::from_translation([4.0, 5.0, 6.0])),
            ],
            vec![0],
        );

        let parts = split_document(&doc, "Planters", Granularity::Children).unwrap();

        assert_eq!(parts.len(), 1);
        let part = &parts[0];
        assert_eq!(part.name, "Planters-Pot");
        assert_eq!(part.root, 1);
        assert_eq!(part.document.nodes.len(), 1);
        assert_eq!(part.document.scenes[0].nodes, vec![0]);

        let root = &part.document.nodes[0];
        assert!(matches!(root.transform, Transform::Matrix(_)));
        let t = translation(&root.transform.to_matrix());
        assert!(t.abs_diff_eq(glam::Vec3::new(5.0, 7.0, 9.0), 1e-5));
    }

    #[test]
    fn test_roots_mode_keeps_root_transform() {
        let doc = scene_doc(
            vec![
                Node::with_mesh(0).transformed(Transform::from_translation([1.0, 0.0, 0.0])),
                Node::with_mesh(1).named("Second"),
            ],
            vec![0, 1],
        );

        let parts = split_document(&doc, "set", Granularity::Roots).unwrap();

        let names: Vec<_> = parts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["set-0", "set-Second"]);
        let t = translation(&parts[0].document.nodes[0].transform.to_matrix());
        assert_eq!(t, glam::Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_closure_is_renumbered_in_order() {
        // 0 root -> [3, 1]; 3 -> [4]; 1 and 4 carry meshes; 2 is unrelated
        let doc = scene_doc(
            vec![
                Node::group(vec![3, 1]),
                Node::with_mesh(0),
                Node::with_mesh(1),
                Node::group(vec![4]).named("Branch"),
                Node::with_mesh(2),
            ],
            vec![0],
        );

        let parts = split_document(&doc, "tree", Granularity::Children).unwrap();
        assert_eq!(parts.len(), 2);

        let branch = &parts[0];
        assert_eq!(branch.name, "tree-Branch");
        assert_eq!(branch.document.nodes.len(), 2);
        assert_eq!(branch.document.nodes[0].children, vec![1]);
        assert_eq!(branch.document.nodes[1].mesh, Some(2));

        assert_eq!(parts[1].name, "tree-1");
        assert_eq!(parts[1].document.nodes.len(), 1);
    }

    #[test]
    fn test_dead_and_childless_roots_are_skipped() {
        let doc = scene_doc(
            vec![
                Node::group(vec![1, 2]),
                Node::default().named("Empty"),
                Node::with_mesh(0),
                Node::with_mesh(0).named("Leaf"),
            ],
            vec![0, 3],
        );

        let parts = split_document(&doc, "a", Granularity::Children).unwrap();

        let names: Vec<_> = parts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a-2"]);
    }

    #[test]
    fn test_repeated_names_are_made_unique() {
        let doc = scene_doc(
            vec![
                Node::group(vec![1, 2, 3]),
                Node::with_mesh(0).named("Pot"),
                Node::with_mesh(1).named("Pot"),
                Node::with_mesh(2).named("Pot_2"),
            ],
            vec![0],
        );

        let parts = split_document(&doc, "set", Granularity::Children).unwrap();

        let names: Vec<_> = parts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["set-Pot", "set-Pot_2", "set-Pot_2_3"]);
        assert_eq!(parts[1].discriminator, "Pot_2");
        assert_eq!(parts[1].root, 2);
    }

    #[test]
    fn test_empty_scene_yields_nothing() {
        let doc = scene_doc(vec![Node::with_mesh(0)], vec![]);
        assert!(split_document(&doc, "a", Granularity::Roots).unwrap().is_empty());
    }

    #[test]
    fn test_bad_child_is_fatal() {
        let doc = scene_doc(vec![Node::group(vec![9])], vec![0]);
        assert!(split_document(&doc, "a", Granularity::Children).is_err());
    }

    #[test]
    fn test_granularity_parsing() {
        assert_eq!("Roots".parse::<Granularity>().unwrap(), Granularity::Roots);
        assert!("leaves".parse::<Granularity>().is_err());
        assert_eq!(Granularity::default(), Granularity::Children);
    }
}
