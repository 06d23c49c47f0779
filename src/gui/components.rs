use eframe::egui;

/// Filled button with white text, used for every action in the app.
pub fn action_button(ui: &mut egui::Ui, label: &str, fill: egui::Color32) -> egui::Response {
    ui.add(
        egui::Button::new(egui::RichText::new(label).color(egui::Color32::WHITE).strong())
            .fill(fill)
            .rounding(4.0)
            .min_size(egui::vec2(72.0, 26.0)),
    )
}

/// Plain button drawn in the palette's background and text colors.
pub fn plain_button(
    ui: &mut egui::Ui,
    label: &str,
    fill: egui::Color32,
    text: egui::Color32,
) -> egui::Response {
    ui.add(
        egui::Button::new(egui::RichText::new(label).color(text))
            .fill(fill)
            .stroke(egui::Stroke::new(1.0, egui::Color32::from_gray(160)))
            .rounding(4.0)
            .min_size(egui::vec2(72.0, 26.0)),
    )
}

/// Titled, bordered group; the egui stand-in for a labelled frame.
pub fn section_card<R>(
    ui: &mut egui::Ui,
    title: &str,
    add_contents: impl FnOnce(&mut egui::Ui) -> R,
) -> R {
    egui::Frame::none()
        .stroke(egui::Stroke::new(1.0, egui::Color32::from_gray(180)))
        .rounding(6.0)
        .inner_margin(10.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(egui::RichText::new(title).strong());
            ui.add_space(6.0);
            add_contents(ui)
        })
        .inner
}

/// Small square preview of a color.
pub fn color_swatch(ui: &mut egui::Ui, color: egui::Color32) {
    let (rect, _) = ui.allocate_exact_size(egui::vec2(20.0, 20.0), egui::Sense::hover());
    ui.painter().rect_filled(rect, 3.0, color);
    ui.painter()
        .rect_stroke(rect, 3.0, egui::Stroke::new(1.0, egui::Color32::from_gray(120)));
}
