//! Interactive node/link diagram editor core.
//!
//! An [`Editor`] owns a stack of interaction handlers and an
//! [`EditorSession`] holding the graph, its drawn scene and all editor state.
//! A user interface feeds it [`Token`]s and paints [`scene::Scene`].

pub mod attach;
pub mod constraint;
pub mod error;
pub mod geometry;
pub mod handler;
pub mod model;
pub mod palette;
pub mod persist;
pub mod scene;
pub mod selection;
pub mod session;
pub mod settings;

pub use error::{EditorError, ErrorKind, Result};
pub use handler::{HandlerKind, Token};
pub use model::{Entity, Graph};
pub use palette::Palette;
pub use session::{Editor, EditorEvent, EditorSession};
pub use settings::EditorSettings;
