use egui::Context as EguiContext;
use wobble_common::Rgb;
use wobble_shading::{SceneSettings, UNIFORM_RANGE};

pub const PANEL_WIDTH: f32 = 325.0;

fn color_row(ui: &mut egui::Ui, label: &str, color: &mut Rgb) {
    ui.horizontal(|ui| {
        ui.color_edit_button_srgb(&mut color.0);
        ui.label(label);
    });
}

/// The "Wobble" tweak window. Returns true when any value changed.
pub fn draw_panel(ctx: &EguiContext, settings: &mut SceneSettings) -> bool {
    let before = *settings;

    egui::Window::new("Wobble")
        .default_width(PANEL_WIDTH)
        .resizable(false)
        .show(ctx, |ui| {
            ui.heading("Displacement");
            for (name, value) in settings.wobble.controls_mut() {
                ui.add(egui::Slider::new(value, UNIFORM_RANGE).step_by(0.001).text(name));
            }

            ui.separator();
            ui.heading("Colors");
            color_row(ui, "colorA", &mut settings.colors.color_a);
            color_row(ui, "colorB", &mut settings.colors.color_b);

            ui.separator();
            ui.heading("Material");
            for (name, value, min, max) in settings.material.controls_mut() {
                ui.add(egui::Slider::new(value, min..=max).step_by(0.001).text(name));
            }

            ui.separator();
            ui.heading("Light");
            color_row(ui, "color", &mut settings.light.color);
            ui.add(egui::Slider::new(&mut settings.light.intensity, 0.0..=10.0).text("intensity"));
            ui.add(egui::Slider::new(&mut settings.renderer.exposure, 0.1..=4.0).text("exposure"));

            ui.separator();
            if ui.button("Copy preset").clicked() {
                match settings.to_yaml() {
                    Ok(yaml) => {
                        ctx.copy_text(yaml);
                        tracing::info!("preset copied to clipboard");
                    }
                    Err(e) => tracing::error!("failed to serialize preset: {e}"),
                }
            }
            ui.small("LMB: orbit | RMB: pan | wheel: zoom");
        });

    *settings != before
}
