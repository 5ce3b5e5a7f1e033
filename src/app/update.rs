use eframe::egui;

use linkdraw::handler::{Field, Token};
use linkdraw::palette::IconKind;

use super::LinkDrawApp;
use super::render::{draw_background, draw_feedback, draw_scene, status_label};

impl eframe::App for LinkDrawApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let wants_keyboard = ctx.wants_keyboard_input();
        let mut keyed = Vec::new();
        let mut open_requested = false;
        ctx.input_mut(|i| {
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::S) {
                keyed.push(Token::Save);
            }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::O) {
                open_requested = true;
            }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::P) {
                keyed.push(Token::Print);
            }
            if wants_keyboard {
                return;
            }
            for event in &i.events {
                match event {
                    egui::Event::Cut => keyed.push(Token::Cut),
                    egui::Event::Paste(_) => keyed.push(Token::Paste),
                    _ => {}
                }
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::Escape) {
                keyed.push(Token::Escape);
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::Enter) {
                keyed.push(Token::FinishLink);
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::Delete)
                || i.consume_key(egui::Modifiers::NONE, egui::Key::Backspace)
            {
                keyed.push(Token::Delete);
            }
        });
        for token in keyed {
            self.send(token);
        }
        if open_requested {
            self.open_dialog();
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("New").clicked() {
                        self.send(Token::New);
                        ui.close_menu();
                    }
                    if ui.button("Open... (⌘O)").clicked() {
                        self.open_dialog();
                        ui.close_menu();
                    }
                    if ui.button("Save (⌘S)").clicked() {
                        self.send(Token::Save);
                        ui.close_menu();
                    }
                    if ui.button("Save As...").clicked() {
                        self.save_dialog();
                        ui.close_menu();
                    }
                    ui.separator();
                    ui.small("Quick save path:");
                    let mut path = self.editor.session.file_path.clone();
                    if ui.text_edit_singleline(&mut path).changed() {
                        self.send(Token::SetFilePath(path));
                    }
                    ui.separator();
                    if ui.button("Print (⌘P)").clicked() {
                        self.send(Token::Print);
                        ui.close_menu();
                    }
                    if ui.button("Exit").clicked() {
                        self.send(Token::Exit);
                        ui.close_menu();
                    }
                });
                ui.menu_button("Edit", |ui| {
                    if ui.button("Cut").clicked() {
                        self.send(Token::Cut);
                        ui.close_menu();
                    }
                    if ui.button("Paste").clicked() {
                        self.send(Token::Paste);
                        ui.close_menu();
                    }
                    if ui.button("Delete").clicked() {
                        self.send(Token::Delete);
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Properties").clicked() {
                        self.send(Token::OpenProperties);
                        ui.close_menu();
                    }
                    let mut sticky = self.editor.session.sticky;
                    if ui.checkbox(&mut sticky, "Sticky create mode").changed() {
                        self.send(Token::ToggleCreateMode);
                    }
                });
                ui.menu_button("View", |ui| {
                    if ui.button("Zoom In").clicked() {
                        self.send(Token::ZoomIn);
                    }
                    if ui.button("Zoom Out").clicked() {
                        self.send(Token::ZoomOut);
                    }
                    if ui.button("Reset Zoom").clicked() {
                        self.send(Token::ZoomReset);
                        ui.close_menu();
                    }
                });
            });
        });

        egui::SidePanel::left("palette").show(ctx, |ui| {
            ui.heading("Palette");
            let icons: Vec<(usize, String, IconKind)> = self
                .editor
                .session
                .palette
                .icons
                .iter()
                .enumerate()
                .map(|(i, icon)| (i, icon.label.clone(), icon.kind))
                .collect();
            for (index, label, kind) in icons {
                let active = self.editor.session.active_icon == Some(index);
                if ui.selectable_label(active, label).clicked() {
                    self.send(Token::IconSelected(index));
                }
                if kind == IconKind::Select {
                    ui.separator();
                }
            }
        });

        if self.editor.session.form.visible {
            egui::SidePanel::right("properties").show(ctx, |ui| {
                ui.heading("Properties");
                if self.editor.session.selected().is_none() {
                    ui.label("Nothing selected");
                }
                ui.label("Label");
                self.text_field(ui, Field::Label);
                ui.label("Data");
                self.text_field(ui, Field::Data);
                ui.label("Datasource");
                self.text_field(ui, Field::Datasource);
                ui.horizontal(|ui| {
                    if ui.button("Apply").clicked() {
                        self.send(Token::Apply);
                    }
                    if ui.button("Cancel").clicked() {
                        self.send(Token::CancelEdits);
                    }
                    if ui.button("Close").clicked() {
                        self.send(Token::CloseProperties);
                    }
                });
            });
        }

        if let Some(dialog) = self.editor.session.dialog.clone() {
            egui::Window::new(dialog.title.as_str())
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                .show(ctx, |ui| {
                    ui.label(dialog.message.as_str());
                    ui.horizontal(|ui| {
                        if ui.button(dialog.yes.as_str()).clicked() {
                            self.send(Token::Confirm);
                        }
                        if let Some(no) = &dialog.no {
                            if ui.button(no.as_str()).clicked() {
                                self.send(Token::Reject);
                            }
                        }
                        if let Some(cancel) = &dialog.cancel {
                            if ui.button(cancel.as_str()).clicked() {
                                self.send(Token::CancelConfirm);
                            }
                        }
                    });
                });
        }

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let session = &self.editor.session;
                status_label(ui, session.status.as_ref(), session.prompt.as_deref());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!("Zoom: {:.0}%", session.view.zoom * 100.0));
                    ui.separator();
                    ui.label(format!(
                        "Nodes: {}  Links: {}",
                        session.graph.node_count(),
                        session.graph.link_count()
                    ));
                    if session.sticky {
                        ui.separator();
                        ui.label("Sticky");
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let (rect, response) =
                ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
            let origin = rect.min;
            self.editor.session.viewport = rect.size();

            let (pressed, released, pointer) = ctx.input(|i| {
                (
                    i.pointer.primary_pressed(),
                    i.pointer.primary_released(),
                    i.pointer.interact_pos(),
                )
            });
            if let Some(p) = pointer {
                let device = (p - origin).to_pos2();
                if pressed && response.hovered() {
                    self.send(Token::MousePressed(device));
                }
                if self.last_motion != Some(device) {
                    self.last_motion = Some(device);
                    self.send(Token::MouseMoved(device));
                }
                if released {
                    self.send(Token::MouseReleased(device));
                }
                if response.secondary_clicked() {
                    self.send(Token::RightClick(device));
                }
            }

            let scroll = ctx.input(|i| i.raw_scroll_delta.y);
            if scroll.abs() > 0.0 && response.hovered() {
                let factor = (1.0 + scroll * 0.001).clamp(0.8, 1.25);
                let zoom = self.editor.session.view.zoom * factor;
                self.send(Token::ZoomTo(zoom));
            }

            let painter = ui.painter_at(rect);
            let session = &self.editor.session;
            draw_background(&painter, rect, &session.view);
            draw_scene(&painter, origin, &session.view, &session.scene);
            draw_feedback(
                &painter,
                origin,
                &session.view,
                &session.feedback,
                session.settings.highlight_color.to_color32(),
            );
        });

        self.handle_events(ctx);
    }
}
