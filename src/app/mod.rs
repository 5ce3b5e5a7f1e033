use std::path::PathBuf;

use eframe::egui;

use linkdraw::handler::{Field, Token};
use linkdraw::palette::Palette;
use linkdraw::session::EditorEvent;
use linkdraw::settings::{self, EditorSettings};
use linkdraw::{Editor, EditorSession};

mod render;
mod update;

pub(crate) struct LinkDrawApp {
    editor: Editor,
    settings_path: Option<PathBuf>,
    /// Last device position sent as `MouseMoved`, to avoid repeats.
    last_motion: Option<egui::Pos2>,
}

impl LinkDrawApp {
    pub(crate) fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let settings_path = settings::search_paths()
            .into_iter()
            .find(|p| p.exists());
        let settings = settings_path
            .as_ref()
            .and_then(|p| settings::load_settings(p))
            .unwrap_or_default();
        let palette = load_palette(&settings);
        Self {
            editor: Editor::new(EditorSession::new(palette, settings)),
            settings_path,
            last_motion: None,
        }
    }

    fn send(&mut self, token: Token) {
        self.editor.dispatch(token);
    }

    fn persist_settings(&mut self) {
        let session = &mut self.editor.session;
        session.settings.file_path = session.file_path.clone();
        session.settings.sticky_create = session.sticky;
        let path = self
            .settings_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("linkdraw.toml"));
        if let Err(e) = settings::save_settings(&path, &session.settings) {
            session.report(e);
        }
    }

    fn open_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .pick_file()
        {
            self.send(Token::SetFilePath(path.display().to_string()));
            self.send(Token::Load);
        }
    }

    fn save_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(&self.editor.session.file_path)
            .add_filter("JSON", &["json"])
            .save_file()
        {
            self.send(Token::SetFilePath(path.display().to_string()));
            self.send(Token::Save);
        }
    }

    fn text_field(&mut self, ui: &mut egui::Ui, field: Field) {
        let form = &self.editor.session.form;
        let mut value = match field {
            Field::Label => form.label.clone(),
            Field::Data => form.data.clone(),
            Field::Datasource => form.datasource.clone(),
        };
        if ui.text_edit_singleline(&mut value).changed() {
            self.send(Token::TextChanged { field, value });
        }
    }

    /// Acts on requests the editor queued for the shell.
    fn handle_events(&mut self, ctx: &egui::Context) {
        for event in self.editor.drain_events() {
            match event {
                EditorEvent::ExitRequested => {
                    self.persist_settings();
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
                EditorEvent::PrintRequested => {
                    self.editor
                        .session
                        .info("printing is not available in this build");
                }
                EditorEvent::DiagramLoaded(path) | EditorEvent::DiagramSaved(path) => {
                    tracing::debug!(path = %path.display(), "file operation finished");
                    self.persist_settings();
                }
            }
        }
    }
}

fn load_palette(settings: &EditorSettings) -> Palette {
    let Some(path) = &settings.palette_path else {
        return Palette::default();
    };
    match Palette::load(path) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "falling back to the built-in palette");
            Palette::default()
        }
    }
}
