use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification used to decide how an error is surfaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The user asked for something the editor refuses to do.
    User,
    /// A template, palette or saved file disagrees with what the editor expects.
    Contract,
    /// Reading or writing a file failed.
    Io,
    /// A guard in the state machine tripped; reported in debug builds only.
    Invariant,
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("a link cannot connect a connection point to itself")]
    SelfLoop,
    #[error("node is still connected to {links} link(s)")]
    NodeConnected { links: usize },
    #[error("no connection point under the cursor")]
    NoConnectionTarget,
    #[error("clipboard is empty")]
    EmptyClipboard,
    #[error("nothing is selected")]
    NothingSelected,
    #[error("connection point `{name}` not found on node")]
    UnknownConnectionPoint { name: String },
    #[error("unknown node template {0}")]
    UnknownNodeTemplate(usize),
    #[error("unknown link template {0}")]
    UnknownLinkTemplate(usize),
    #[error("unknown palette icon {0}")]
    UnknownIcon(usize),
    #[error("link {link} refers to node index {index} which does not exist")]
    DanglingNodeIndex { link: usize, index: usize },
    #[error("a link needs at least two points")]
    TooFewPoints,
    #[error("the selected object no longer exists")]
    StaleSelection,
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed diagram: {0}")]
    Format(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Settings(String),
}

impl EditorError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SelfLoop
            | Self::NodeConnected { .. }
            | Self::NoConnectionTarget
            | Self::EmptyClipboard
            | Self::NothingSelected => ErrorKind::User,
            Self::UnknownConnectionPoint { .. }
            | Self::UnknownNodeTemplate(_)
            | Self::UnknownLinkTemplate(_)
            | Self::UnknownIcon(_)
            | Self::DanglingNodeIndex { .. }
            | Self::Format(_)
            | Self::Settings(_) => ErrorKind::Contract,
            Self::Io { .. } => ErrorKind::Io,
            Self::TooFewPoints | Self::StaleSelection => ErrorKind::Invariant,
        }
    }
}

pub type Result<T> = std::result::Result<T, EditorError>;
