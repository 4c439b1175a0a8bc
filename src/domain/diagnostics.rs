//! Non-fatal observations recorded while building a tree

use std::fmt;

/// Something the builder noticed but tolerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Parent id names no record in the catalog; node attached under Root
    DanglingParent { id: u32, parent: u32 },
    /// Parent token is not a canonical id; node attached under Root
    MalformedEncoding { id: u32, raw: String, reason: String },
    /// Linking would make the node its own ancestor; node attached under Root
    CycleBroken { id: u32, parent: u32 },
    /// Last token of the primary chain is not the record's own id
    TrailingTokenMismatch { id: u32, token: u32 },
    /// Undecodable token outside the parent position; placement unaffected
    IgnoredToken { id: u32, token: String },
}

impl Diagnostic {
    /// Feature the diagnostic is about.
    pub fn id(&self) -> u32 {
        match self {
            Diagnostic::DanglingParent { id, .. }
            | Diagnostic::MalformedEncoding { id, .. }
            | Diagnostic::CycleBroken { id, .. }
            | Diagnostic::TrailingTokenMismatch { id, .. }
            | Diagnostic::IgnoredToken { id, .. } => *id,
        }
    }

    /// True when the node was moved under Root instead of its declared parent.
    pub fn is_fallback(&self) -> bool {
        !matches!(
            self,
            Diagnostic::TrailingTokenMismatch { .. } | Diagnostic::IgnoredToken { .. }
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DanglingParent { id, parent } => {
                write!(f, "feature {id}: parent {parent} not in catalog, attached to root")
            }
            Diagnostic::MalformedEncoding { id, raw, reason } => {
                write!(f, "feature {id}: malformed feature_order {raw:?} ({reason}), attached to root")
            }
            Diagnostic::CycleBroken { id, parent } => {
                write!(f, "feature {id}: parent {parent} would form a cycle, attached to root")
            }
            Diagnostic::TrailingTokenMismatch { id, token } => {
                write!(f, "feature {id}: feature_order ends with {token}, not its own id")
            }
            Diagnostic::IgnoredToken { id, token } => {
                write!(f, "feature {id}: ignored non-integer token {token:?} in feature_order")
            }
        }
    }
}
