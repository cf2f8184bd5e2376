//! egui panels bound to the [`Viewer`]: loading and error screens, the
//! collapsible controls panel, the mode/camera bar, info overlay and help.

use asset::LoadProgress;
use egui::{Align2, Color32, Context, RichText, Slider};
use viewer::{LoadStatus, Shortcut, ViewMode, Viewer};

const ACCENT: Color32 = Color32::from_rgb(0x00, 0xff, 0x88);

/// UI-only state that does not belong to the viewer.
#[derive(Debug, Default)]
pub struct UiState {
    /// The controls panel starts collapsed.
    pub panel_open: bool,
}

pub fn draw(ctx: &Context, viewer: &mut Viewer, ui: &mut UiState) {
    match viewer.status().clone() {
        LoadStatus::Idle => loading_screen(ctx, None),
        LoadStatus::Loading(progress) => loading_screen(ctx, Some(progress)),
        LoadStatus::Failed(message) => error_screen(ctx, &message),
        LoadStatus::Ready => {
            controls_panel(ctx, viewer, ui);
            bottom_bar(ctx, viewer);
            info_overlay(ctx, viewer);
            help_hint(ctx);
        }
    }
}

fn loading_screen(ctx: &Context, progress: Option<LoadProgress>) {
    egui::Area::new(egui::Id::new("loading"))
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.set_width(320.0);
                ui.heading("Loading model");
                let fraction = progress.map_or(0.0, |p| p.fraction());
                ui.add(egui::ProgressBar::new(fraction));
                if let Some(p) = progress {
                    ui.horizontal(|ui| {
                        ui.label(format!("{}%", p.percent()));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.label(size_label(&p));
                        });
                    });
                    ui.label(p.stage.label());
                }
            });
        });
}

fn error_screen(ctx: &Context, message: &str) {
    egui::Area::new(egui::Id::new("error"))
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.label(RichText::new(message).color(Color32::LIGHT_RED).size(16.0));
            });
        });
}

fn controls_panel(ctx: &Context, viewer: &mut Viewer, state: &mut UiState) {
    egui::Area::new(egui::Id::new("panel_toggle"))
        .anchor(Align2::RIGHT_TOP, [-12.0, 12.0])
        .show(ctx, |ui| {
            if ui
                .selectable_label(state.panel_open, "☰ Controls")
                .clicked()
            {
                state.panel_open = !state.panel_open;
            }
        });
    if !state.panel_open {
        return;
    }

    egui::SidePanel::right("controls")
        .resizable(false)
        .default_width(260.0)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Controls");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("✕").clicked() {
                        state.panel_open = false;
                    }
                });
            });
            ui.add_space(32.0);

            egui::CollapsingHeader::new("Transform")
                .default_open(true)
                .show(ui, |ui| transform_section(ui, viewer));
            egui::CollapsingHeader::new("Image")
                .default_open(true)
                .show(ui, |ui| image_section(ui, viewer));
            egui::CollapsingHeader::new("Lighting")
                .default_open(true)
                .show(ui, |ui| lighting_section(ui, viewer));
        });
}

fn transform_section(ui: &mut egui::Ui, viewer: &mut Viewer) {
    let mut rot = viewer.rotation_deg();
    let mut changed = false;
    for (axis, value) in [("X", &mut rot.x), ("Y", &mut rot.y), ("Z", &mut rot.z)] {
        changed |= ui
            .add(
                Slider::new(value, -180.0..=180.0)
                    .step_by(1.0)
                    .text(axis)
                    .suffix("°"),
            )
            .changed();
    }
    if changed {
        viewer.set_rotation(rot);
    }
    if ui.button("Reset transform").clicked() {
        viewer.reset_transform();
    }
}

fn image_section(ui: &mut egui::Ui, viewer: &mut Viewer) {
    let mut image = viewer.image();
    let mut changed = false;
    changed |= percent_slider(ui, &mut image.opacity, 100.0, "Opacity");
    changed |= percent_slider(ui, &mut image.saturate, 200.0, "Saturation");
    changed |= percent_slider(ui, &mut image.contrast, 200.0, "Contrast");
    changed |= percent_slider(ui, &mut image.brightness, 200.0, "Brightness");
    if changed {
        viewer.set_image(image);
    }
    if ui.button("Reset image").clicked() {
        viewer.reset_image();
    }
}

fn percent_slider(ui: &mut egui::Ui, value: &mut f32, max: f32, label: &str) -> bool {
    ui.add(
        Slider::new(value, 0.0..=max)
            .step_by(1.0)
            .text(label)
            .suffix("%"),
    )
    .changed()
}

fn lighting_section(ui: &mut egui::Ui, viewer: &mut Viewer) {
    let mut lighting = viewer.lighting();
    let mut changed = false;
    for (label, value) in [
        ("Exposure", &mut lighting.exposure),
        ("Ambient", &mut lighting.ambient),
        ("Directional", &mut lighting.directional),
    ] {
        // The slider runs 0..=200 and reads out the applied value.
        let mut applied = *value * 0.01;
        if ui
            .add(
                Slider::new(&mut applied, 0.0..=2.0)
                    .step_by(0.01)
                    .fixed_decimals(1)
                    .text(label),
            )
            .changed()
        {
            *value = (applied * 100.0).round();
            changed = true;
        }
    }
    changed |= ui.checkbox(&mut lighting.unlit, "Unlit").changed();
    if changed {
        viewer.set_lighting(lighting);
    }
}

fn bottom_bar(ctx: &Context, viewer: &mut Viewer) {
    egui::Area::new(egui::Id::new("bottom_bar"))
        .anchor(Align2::CENTER_BOTTOM, [0.0, -16.0])
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.horizontal(|ui| {
                    for mode in ViewMode::ALL {
                        if ui
                            .selectable_label(viewer.mode() == mode, mode.label())
                            .clicked()
                        {
                            viewer.set_mode(mode);
                        }
                    }
                    ui.separator();
                    if ui.button("Fit").clicked() {
                        viewer.fit_view();
                    }
                    if ui.button("Top").clicked() {
                        viewer.top_view();
                    }
                    if ui.button("Front").clicked() {
                        viewer.front_view();
                    }
                    if ui.selectable_label(viewer.show_grid(), "Grid").clicked() {
                        viewer.toggle_grid();
                    }
                });
            });
        });
}

fn info_overlay(ctx: &Context, viewer: &Viewer) {
    let info = viewer.info();
    egui::Area::new(egui::Id::new("info"))
        .anchor(Align2::LEFT_TOP, [12.0, 12.0])
        .interactable(false)
        .show(ctx, |ui| {
            let mono = |text: String| RichText::new(text).monospace().color(ACCENT);
            ui.label(mono(format!("VERTICES: {}", group_thousands(info.vertices))));
            ui.label(mono(format!("FACES: {}", group_thousands(info.faces))));
            ui.label(mono(format!("TEXTURES: {}", info.textures)));
            ui.label(mono(viewer.grid_label().to_owned()));
            ui.label(mono(viewer.camera_label()));
        });
}

fn help_hint(ctx: &Context) {
    let keys = [
        (Shortcut::FitView, "fit"),
        (Shortcut::TopView, "top"),
        (Shortcut::FrontView, "front"),
        (Shortcut::ToggleGrid, "grid"),
        (Shortcut::Mode(ViewMode::Textured), "textured"),
        (Shortcut::Mode(ViewMode::Wireframe), "wireframe"),
        (Shortcut::Mode(ViewMode::Solid), "solid"),
    ];
    let text = keys
        .iter()
        .map(|(k, what)| format!("{} {what}", k.key()))
        .collect::<Vec<_>>()
        .join("  ·  ");
    egui::Area::new(egui::Id::new("help"))
        .anchor(Align2::LEFT_BOTTOM, [12.0, -12.0])
        .interactable(false)
        .show(ctx, |ui| {
            ui.label(RichText::new("Drag to orbit, right-drag to pan, wheel to zoom").small().weak());
            ui.label(RichText::new(text).small().weak());
        });
}

/// `"<loaded MB, 1 decimal> / <total MB, rounded> MB"`.
pub fn size_label(p: &LoadProgress) -> String {
    const MB: f64 = 1024.0 * 1024.0;
    format!("{:.1} / {:.0} MB", p.loaded as f64 / MB, p.total as f64 / MB)
}

/// `1234567` -> `"1,234,567"`.
pub fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset::LoadStage;

    #[test]
    fn size_label_uses_mebibytes() {
        let p = LoadProgress {
            loaded: 5 * 1024 * 1024 + 512 * 1024,
            total: 278 * 1024 * 1024,
            stage: LoadStage::DownloadingGeometry,
        };
        assert_eq!(size_label(&p), "5.5 / 278 MB");
    }

    #[test]
    fn thousands_are_grouped() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn panel_starts_collapsed() {
        assert!(!UiState::default().panel_open);
    }
}
