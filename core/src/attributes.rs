//! Vertex attribute stripping

use crate::document::Document;

/// Attributes removed when none are configured
pub const DEFAULT_STRIPPED: &[&str] = &["NORMAL", "TANGENT"];

/// Remove the named attributes from every primitive and morph target
///
/// Accessors are left in place; compaction drops the ones that are no
/// longer referenced. Returns the new document and the number of attribute
/// entries removed.
pub fn strip_attributes<S: AsRef<str>>(doc: &Document, names: &[S]) -> (Document, usize) {
    let mut out = doc.clone();
    let mut removed = 0;

    for mesh in &mut out.meshes {
        for prim in &mut mesh.primitives {
            for name in names {
                removed += usize::from(prim.attributes.remove(name.as_ref()).is_some());
                for target in &mut prim.targets {
                    removed += usize::from(target.remove(name.as_ref()).is_some());
                }
            }
        }
    }

    if removed > 0 {
        tracing::debug!("Stripped {} attribute entries", removed);
    }
    (out, removed)
}
