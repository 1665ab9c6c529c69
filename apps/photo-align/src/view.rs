//! eframe window for the capture screen.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use eframe::egui::{self, Color32};
use photoalign_render_engine::compositor::{OverlayLayout, Rect};

use crate::capture_screen::{CaptureScreen, VIDEO_NOT_AVAILABLE};

const REPAINT_INTERVAL: Duration = Duration::from_millis(33);

/// Texture mirrored from a frame, remembered by what it was built from.
struct LiveTexture {
    sequence: u64,
    handle: egui::TextureHandle,
}

struct ReferenceTexture {
    source: Arc<[u8]>,
    handle: egui::TextureHandle,
}

pub struct PhotoAlignApp {
    screen: CaptureScreen,
    opacity: f32,
    reference_path: String,
    live: Option<LiveTexture>,
    overlay: Option<ReferenceTexture>,
}

impl PhotoAlignApp {
    pub fn new(screen: CaptureScreen, opacity: f32) -> Self {
        Self {
            screen,
            opacity: opacity.clamp(0.0, 1.0),
            reference_path: String::new(),
            live: None,
            overlay: None,
        }
    }

    fn sync_textures(&mut self, ctx: &egui::Context) {
        match self.screen.latest_frame() {
            Some(frame) if !frame.is_empty() => {
                let stale = self
                    .live
                    .as_ref()
                    .map(|live| live.sequence != frame.sequence)
                    .unwrap_or(true);
                if stale {
                    let image = egui::ColorImage::from_rgba_unmultiplied(
                        [frame.width as usize, frame.height as usize],
                        &frame.pixels,
                    );
                    match self.live.as_mut() {
                        Some(live) => {
                            live.handle.set(image, egui::TextureOptions::LINEAR);
                            live.sequence = frame.sequence;
                        }
                        None => {
                            self.live = Some(LiveTexture {
                                sequence: frame.sequence,
                                handle: ctx.load_texture("live", image, egui::TextureOptions::LINEAR),
                            });
                        }
                    }
                }
            }
            _ => self.live = None,
        }

        if let Some(reference) = self.screen.reference() {
            let changed = self
                .overlay
                .as_ref()
                .map(|overlay| !Arc::ptr_eq(&overlay.source, &reference.encoded))
                .unwrap_or(true);
            if changed {
                let image = egui::ColorImage::from_rgba_unmultiplied(
                    [reference.width as usize, reference.height as usize],
                    &reference.rgba,
                );
                self.overlay = Some(ReferenceTexture {
                    source: reference.encoded.clone(),
                    handle: ctx.load_texture("reference", image, egui::TextureOptions::LINEAR),
                });
            }
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let selector = self.screen.selector();
            let options = selector.options();
            let shown = selector
                .selected_index()
                .and_then(|index| options.get(index))
                .or_else(|| options.first())
                .map(|option| option.label.clone())
                .unwrap_or_default();

            let mut picked = None;
            let combo = ui
                .add_enabled_ui(selector.is_enabled(), |ui| {
                    egui::ComboBox::from_id_source("camera")
                        .selected_text(shown)
                        .width(260.0)
                        .show_ui(ui, |ui| {
                            for option in &options {
                                let selected = option.index.is_some()
                                    && option.index == selector.selected_index();
                                let response = ui.add_enabled(
                                    option.enabled,
                                    egui::SelectableLabel::new(selected, &option.label),
                                );
                                if response.clicked() {
                                    picked = option.index;
                                }
                            }
                        })
                })
                .inner;
            let blurred = combo.response.lost_focus();

            if let Some(index) = picked {
                self.screen.select_device(index);
            } else if blurred {
                self.screen.blur_device_control();
            }

            if ui
                .add_enabled(self.screen.can_capture(), egui::Button::new("Take Photo"))
                .clicked()
            {
                self.screen.capture_photo();
            }
        });

        ui.horizontal(|ui| {
            ui.add(
                egui::TextEdit::singleline(&mut self.reference_path)
                    .hint_text("Reference image (PNG or JPEG), or drop a file")
                    .desired_width(320.0),
            );
            if ui.button("Load Reference").clicked() && !self.reference_path.trim().is_empty() {
                let path = PathBuf::from(self.reference_path.trim());
                self.screen.load_reference([path]);
            }
            ui.add(egui::Slider::new(&mut self.opacity, 0.0..=1.0).text("Overlay"));
        });
    }

    fn stage(&self, ui: &mut egui::Ui) {
        let available = ui.available_rect_before_wrap();
        let area = Rect::new(
            available.min.x,
            available.min.y,
            available.width(),
            available.height(),
        );
        let painter = ui.painter_at(available);
        painter.rect_filled(available, 0.0, Color32::BLACK);

        let Some(live) = self.live.as_ref() else {
            painter.text(
                available.center(),
                egui::Align2::CENTER_CENTER,
                VIDEO_NOT_AVAILABLE,
                egui::FontId::proportional(18.0),
                Color32::from_gray(180),
            );
            return;
        };

        let [width, height] = live.handle.size();
        let reference_size = self
            .overlay
            .as_ref()
            .map(|overlay| {
                let [w, h] = overlay.handle.size();
                (w as u32, h as u32)
            });
        let layout = OverlayLayout::compute(area, (width as u32, height as u32), reference_size);

        let full_uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
        painter.image(live.handle.id(), to_egui(layout.video), full_uv, Color32::WHITE);

        if let (Some(overlay), Some(rect)) = (self.overlay.as_ref(), layout.reference) {
            painter.image(
                overlay.handle.id(),
                to_egui(rect),
                full_uv,
                Color32::WHITE.gamma_multiply(self.opacity),
            );
        }
    }

    fn error_modal(&mut self, ctx: &egui::Context) {
        let Some(message) = self.screen.error().map(str::to_string) else {
            return;
        };

        egui::Window::new("Error")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message);
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    self.screen.dismiss_error();
                }
            });
    }
}

impl eframe::App for PhotoAlignApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.request_repaint_after(REPAINT_INTERVAL);
        self.screen.poll();

        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .collect()
        });
        if !dropped.is_empty() {
            self.screen.load_reference(dropped);
        }

        self.sync_textures(ctx);
        let blocked = self.screen.error().is_some();

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.add_enabled_ui(!blocked, |ui| self.controls(ui));
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            let status = if self.screen.is_acquiring() {
                "Starting camera...".to_string()
            } else if self.screen.is_loading_reference() {
                "Loading reference...".to_string()
            } else if let Some(path) = self.screen.last_export() {
                format!("Saved {}", path.display())
            } else {
                format!("Photos go to {}", self.screen.settings().export_dir.display())
            };
            ui.label(status);
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| self.stage(ui));

        self.error_modal(ctx);
    }
}

fn to_egui(rect: Rect) -> egui::Rect {
    egui::Rect::from_min_size(egui::pos2(rect.x, rect.y), egui::vec2(rect.width, rect.height))
}
