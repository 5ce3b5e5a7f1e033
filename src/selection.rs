//! Current selection, the one-slot cut buffer, and the property form that
//! mirrors the selected entity.

use crate::error::{EditorError, Result};
use crate::model::{Entity, Link, Node, Rgba};
use crate::scene::{BODY, PATH, PrimId};
use crate::session::EditorSession;

#[derive(Clone, Debug, Default)]
pub struct Selection {
    current: Option<Entity>,
    /// Colour the highlighted primitive had before selection.
    saved_color: Option<Rgba>,
}

impl Selection {
    pub fn current(&self) -> Option<Entity> {
        self.current
    }
}

#[derive(Clone, Debug)]
pub enum ClipEntity {
    Node(Node),
    Link(Link),
}

/// Holds at most one cut entity. Pasting empties it.
#[derive(Clone, Debug, Default)]
pub struct Clipboard {
    entry: Option<ClipEntity>,
}

impl Clipboard {
    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    pub fn entry(&self) -> Option<&ClipEntity> {
        self.entry.as_ref()
    }

    pub fn put(&mut self, entity: ClipEntity) {
        self.entry = Some(entity);
    }

    pub fn take(&mut self) -> Option<ClipEntity> {
        self.entry.take()
    }
}

impl EditorSession {
    fn highlight_prim(&self, entity: Entity) -> Option<PrimId> {
        match entity {
            Entity::Node(id) => self.scene.find_child(self.graph.node(id)?.prim?, BODY),
            Entity::Link(id) => self.scene.find_child(self.graph.link(id)?.prim?, PATH),
        }
    }

    pub fn selected(&self) -> Option<Entity> {
        self.selection.current.filter(|e| self.graph.contains(*e))
    }

    /// Moves the highlight to `entity` and refreshes the property form.
    pub fn select(&mut self, entity: Option<Entity>) {
        if self.selection.current == entity {
            return;
        }
        if let Some(old) = self.selection.current.take() {
            let saved = self.selection.saved_color.take();
            if let (Some(prim), Some(color)) = (self.highlight_prim(old), saved) {
                if let Some(p) = self.scene.get_mut(prim) {
                    p.color = color;
                }
                self.scene.request_redraw();
            }
        }
        if let Some(new) = entity.filter(|e| self.graph.contains(*e)) {
            let highlight = self.settings.highlight_color;
            if let Some(p) = self
                .highlight_prim(new)
                .and_then(|prim| self.scene.get_mut(prim))
            {
                self.selection.saved_color = Some(p.color);
                p.color = highlight;
            }
            self.selection.current = Some(new);
            self.scene.request_redraw();
            tracing::debug!(entity = ?new, "selected");
        }
        self.load_form();
    }

    /// Fills the property form from the selection, discarding edits.
    pub fn load_form(&mut self) {
        let (label, data, datasource) = match self.selected() {
            Some(Entity::Node(id)) => match self.graph.node(id) {
                Some(n) => (
                    n.label.clone(),
                    n.data.clone(),
                    n.datasource.clone().unwrap_or_default(),
                ),
                None => Default::default(),
            },
            Some(Entity::Link(id)) => match self.graph.link(id) {
                Some(l) => (l.label.clone(), l.data.clone(), String::new()),
                None => Default::default(),
            },
            None => Default::default(),
        };
        self.form.label = label;
        self.form.data = data;
        self.form.datasource = datasource;
        self.form.dirty = false;
    }

    /// Writes the property form back into the selected entity.
    pub fn apply_form(&mut self) -> Result<()> {
        let entity = self.selected().ok_or(EditorError::NothingSelected)?;
        let label = self.form.label.clone();
        let prim = match entity {
            Entity::Node(id) => {
                let n = self.graph.node_mut(id).ok_or(EditorError::StaleSelection)?;
                n.label = label.clone();
                n.data = self.form.data.clone();
                n.datasource = Some(self.form.datasource.clone()).filter(|s| !s.is_empty());
                n.prim
            }
            Entity::Link(id) => {
                let l = self.graph.link_mut(id).ok_or(EditorError::StaleSelection)?;
                l.label = label.clone();
                l.data = self.form.data.clone();
                l.prim
            }
        };
        if let Some(root) = prim {
            self.scene.set_text(root, &label);
        }
        self.form.dirty = false;
        tracing::debug!(?entity, "properties applied");
        Ok(())
    }

    pub fn cut(&mut self) -> Result<()> {
        let entity = self.selection.current.ok_or(EditorError::NothingSelected)?;
        if !self.graph.contains(entity) {
            return Err(EditorError::StaleSelection);
        }
        if let Entity::Node(id) = entity {
            let links = self.graph.links_bound_to(id).len();
            if links > 0 {
                return Err(EditorError::NodeConnected { links });
            }
        }
        self.select(None);
        let clip = match entity {
            Entity::Node(id) => ClipEntity::Node(self.delete_node(id)?),
            Entity::Link(id) => {
                ClipEntity::Link(self.delete_link(id).ok_or(EditorError::StaleSelection)?)
            }
        };
        self.clipboard.put(clip);
        tracing::debug!(?entity, "cut");
        Ok(())
    }

    /// Re-inserts the clipboard entity and selects it. Works once per cut.
    pub fn paste(&mut self) -> Result<Entity> {
        let clip = self.clipboard.take().ok_or(EditorError::EmptyClipboard)?;
        let placed = match &clip {
            ClipEntity::Node(n) => self.place_node(n.clone()).map(Entity::Node),
            ClipEntity::Link(l) => self.place_link(l.clone()).map(Entity::Link),
        };
        match placed {
            Ok(entity) => {
                self.select(Some(entity));
                tracing::debug!(?entity, "pasted");
                Ok(entity)
            }
            Err(e) => {
                self.clipboard.put(clip);
                Err(e)
            }
        }
    }

    pub fn delete_selection(&mut self) -> Result<()> {
        let entity = self.selection.current.ok_or(EditorError::NothingSelected)?;
        match entity {
            Entity::Node(id) => {
                let links = self.graph.links_bound_to(id).len();
                if links > 0 {
                    return Err(EditorError::NodeConnected { links });
                }
                self.select(None);
                self.delete_node(id)?;
            }
            Entity::Link(id) => {
                self.select(None);
                self.delete_link(id).ok_or(EditorError::StaleSelection)?;
            }
        }
        Ok(())
    }
}
