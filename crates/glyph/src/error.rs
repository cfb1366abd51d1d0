//! Error types.

use crate::tree::NodeId;

/// Errors surfaced by the engine.
#[derive(Debug, thiserror::Error)]
pub enum GlyphError {
    /// stdin/stdout is not a terminal; raw-mode setup refused to run.
    #[error("stdin/stdout is not a TTY")]
    NotATty,

    /// An I/O error from the terminal.
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The layout solver rejected an operation.
    #[error("layout error: {0}")]
    Layout(String),

    /// An operation referenced a node that does not exist (or is not
    /// where the caller claimed it was).
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GlyphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(format!("{}", GlyphError::NotATty), "stdin/stdout is not a TTY");
        assert!(format!("{}", GlyphError::UnknownNode(NodeId(7))).contains("#7"));
        assert!(format!("{}", GlyphError::Layout("bad".into())).contains("bad"));
    }
}
