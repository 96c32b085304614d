//! Error taxonomy for document transformations.
//!
//! Every variant except [`Error::Json`] and [`Error::Unsupported`] is a
//! structural error: the document is internally inconsistent and the asset
//! cannot be processed. Empty input is not an error; stages report it through
//! their return values instead.

/// Errors raised by the core transformations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A reference points past the end of its target collection
    #[error("{kind} index {index} out of range ({len} {kind}s) referenced from {from}")]
    OutOfRange {
        kind: &'static str,
        index: usize,
        len: usize,
        from: String,
    },

    /// A surviving object references something that was not marked live
    #[error("{kind} {index} is referenced after filtering but was never marked reachable")]
    NotLive { kind: &'static str, index: usize },

    /// The child graph is not a tree
    #[error("node hierarchy contains a cycle through node {0}")]
    NodeCycle(usize),

    /// A scene reference cannot be resolved
    #[error("scene {index} does not exist ({len} scenes)")]
    MissingScene { index: usize, len: usize },

    /// A buffer view or accessor range does not fit in its payload
    #[error("{what} spans bytes {start}..{end} but only {len} bytes are available")]
    RangeOutOfBounds {
        what: String,
        start: usize,
        end: usize,
        len: usize,
    },

    /// An extension texture slot does not carry an integer `index`
    #[error("material {material}: malformed texture slot {extension}.{slot}")]
    MalformedTextureSlot {
        material: usize,
        extension: String,
        slot: String,
    },

    /// Input the core deliberately does not handle
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The JSON layout could not be (de)serialized
    #[error("invalid glTF JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error means the document's reference graph is broken
    pub fn is_structural(&self) -> bool {
        !matches!(self, Error::Unsupported(_) | Error::Json(_))
    }
}

/// Result alias used across the core crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Bounds-check an index against a collection length.
pub(crate) fn check_index(
    kind: &'static str,
    index: usize,
    len: usize,
    from: impl FnOnce() -> String,
) -> Result<usize> {
    if index < len {
        Ok(index)
    } else {
        Err(Error::OutOfRange {
            kind,
            index,
            len,
            from: from(),
        })
    }
}
