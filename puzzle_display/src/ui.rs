// ui.rs - Controls, stats and the arena canvas

use eframe::egui;
use egui::{Color32, Painter, Pos2, Rect, Vec2};
use std::sync::atomic::Ordering;

use life_puzzle::render::ABYSS_COLOR;
use life_puzzle::{Canvas, Rgba};

use crate::PuzzleApp;

fn color32(color: Rgba) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.alpha_u8())
}

/// Replays display lists onto an egui painter anchored at `origin`.
struct PainterCanvas<'a> {
    painter: &'a Painter,
    origin: Pos2,
}

impl Canvas for PainterCanvas<'_> {
    fn clear(&mut self, width: f32, height: f32) {
        let rect = Rect::from_min_size(self.origin, Vec2::new(width, height));
        self.painter.rect_filled(rect, 0.0, color32(ABYSS_COLOR));
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba) {
        let rect = Rect::from_min_size(self.origin + Vec2::new(x, y), Vec2::new(width, height));
        self.painter.rect_filled(rect, 0.0, color32(color));
    }
}

impl eframe::App for PuzzleApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let (id, name, description, library, beaten) = {
            let level = self.session.level().lock();
            (
                level.id(),
                level.name().to_string(),
                level.description().to_string(),
                level.library().to_vec(),
                level.generations_until_beaten(),
            )
        };

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(format!("Level {id}: {name}"));
            ui.label(description);

            ui.horizontal(|ui| {
                let playing = self.session.is_playing();
                if ui.button(if playing { "⏸ Stop" } else { "▶ Play" }).clicked() {
                    if playing {
                        self.session.stop();
                    } else {
                        self.session.play();
                    }
                }

                if ui.button("⟲ Reset").clicked() && self.session.reset() {
                    self.counters.generation.store(0, Ordering::Relaxed);
                    self.refresh_played();
                }

                if ui.button("⏹ Clear").clicked() {
                    self.session.level().lock().clear();
                    self.refresh_played();
                }

                ui.separator();

                ui.label("Zoom:");
                if ui.button("−").clicked() {
                    self.session.level().lock().change_size(-1);
                }
                if ui.button("+").clicked() {
                    self.session.level().lock().change_size(1);
                }

                ui.separator();

                ui.label("Pattern:");
                egui::ComboBox::from_id_source("pattern_selector")
                    .selected_text(self.selected_pattern.as_deref().unwrap_or("single cell"))
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut self.selected_pattern, None, "single cell");
                        for pattern in &library {
                            ui.selectable_value(&mut self.selected_pattern, Some(pattern.clone()), pattern.as_str());
                        }
                    });
            });

            ui.separator();

            ui.horizontal(|ui| {
                ui.label(format!("Generation: {}", self.counters.generation.load(Ordering::Relaxed)));
                ui.label(format!("Played pieces: {}", self.counters.played.load(Ordering::Relaxed)));
                if beaten != 0 {
                    ui.label(format!("Beaten in {beaten} generations!"));
                    if let Some(next) = self.next_level() {
                        if ui.button(format!("Level {next} ▶")).clicked() {
                            self.open(next);
                        }
                    }
                }
            });

            if !self.status.is_empty() {
                ui.colored_label(Color32::LIGHT_RED, self.status.as_str());
            }

            ui.separator();

            let frame = self.session.frame();
            let (width, height) = frame.dimensions();
            let (response, painter) = ui.allocate_painter(Vec2::new(width, height), egui::Sense::click());
            let origin = response.rect.min;
            frame.replay(&mut PainterCanvas { painter: &painter, origin });

            if response.clicked() {
                if let Some(pos) = response.interact_pointer_pos() {
                    self.edit_at((pos.x, pos.y), (origin.x, origin.y));
                }
            }
        });
    }
}

impl PuzzleApp {
    fn edit_at(&mut self, pointer: (f32, f32), offset: (f32, f32)) {
        let result = {
            let mut level = self.session.level().lock();
            let Some((x, y)) = level.event_position(pointer, offset) else {
                return;
            };
            match self.selected_pattern.as_deref() {
                Some(name) => level.place_pattern(name, x, y).map(|_| ()),
                None => level.toggle_cell(x, y).map(|_| ()),
            }
        };

        match result {
            Ok(()) => {
                self.status.clear();
                self.refresh_played();
            }
            Err(err) => self.status = err.to_string(),
        }
    }
}
