// Color themes, custom color overrides and the small time-driven animations

use crate::models::{Settings, ThemeKind};
use eframe::egui;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use std::time::Duration;

/// Palette slot names, in the order the customize dialog lists them
pub const SLOTS: [&str; 5] = ["primary", "secondary", "background", "text", "accent"];

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})$").expect("static pattern")
});

/// The five colors every widget is painted with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    /// Buttons that move forward (Activate, Save) and the selection highlight
    pub primary: egui::Color32,
    /// Constructive buttons (Create, Import)
    pub secondary: egui::Color32,
    /// Window and panel fill
    pub background: egui::Color32,
    /// Default text color
    pub text: egui::Color32,
    /// Destructive buttons (Delete)
    pub accent: egui::Color32,
}

impl Palette {
    /// Built-in colors for a theme, before any override.
    pub fn for_theme(kind: ThemeKind) -> Self {
        let light_bg = egui::Color32::from_rgb(0xf5, 0xf5, 0xf5);
        let dark_bg = egui::Color32::from_rgb(0x33, 0x33, 0x33);
        let (background, text) = match kind {
            ThemeKind::Light => (light_bg, dark_bg),
            ThemeKind::Dark => (dark_bg, light_bg),
        };
        Self {
            primary: egui::Color32::from_rgb(0x34, 0x98, 0xdb),
            secondary: egui::Color32::from_rgb(0x2e, 0xcc, 0x71),
            background,
            text,
            accent: egui::Color32::from_rgb(0xe7, 0x4c, 0x3c),
        }
    }

    /// Theme colors with the settings' custom overrides applied.
    /// Unknown slots and malformed colors are skipped with a warning.
    pub fn resolve(settings: &Settings) -> Self {
        let mut palette = Self::for_theme(settings.theme);
        if let Some(custom) = &settings.custom_colors {
            for (slot, value) in custom {
                match parse_hex_color(value) {
                    Some(color) => {
                        if !palette.set(slot, color) {
                            log::warn!("ignoring unknown color slot '{}'", slot);
                        }
                    }
                    None => log::warn!("ignoring invalid color {} for '{}'", value, slot),
                }
            }
        }
        palette
    }

    pub fn get(&self, slot: &str) -> Option<egui::Color32> {
        match slot {
            "primary" => Some(self.primary),
            "secondary" => Some(self.secondary),
            "background" => Some(self.background),
            "text" => Some(self.text),
            "accent" => Some(self.accent),
            _ => None,
        }
    }

    /// Returns false for an unknown slot name.
    pub fn set(&mut self, slot: &str, color: egui::Color32) -> bool {
        let field = match slot {
            "primary" => &mut self.primary,
            "secondary" => &mut self.secondary,
            "background" => &mut self.background,
            "text" => &mut self.text,
            "accent" => &mut self.accent,
            _ => return false,
        };
        *field = color;
        true
    }

    /// The whole palette as a `slot -> #rrggbb` map, ready to store in settings.
    pub fn to_custom_colors(&self) -> BTreeMap<String, String> {
        SLOTS
            .iter()
            .filter_map(|slot| self.get(slot).map(|c| (slot.to_string(), to_hex(c))))
            .collect()
    }
}

/// Parses `#rrggbb`.
pub fn parse_hex_color(value: &str) -> Option<egui::Color32> {
    let caps = HEX_COLOR.captures(value.trim())?;
    let channel = |i: usize| u8::from_str_radix(&caps[i], 16).ok();
    Some(egui::Color32::from_rgb(channel(1)?, channel(2)?, channel(3)?))
}

/// Formats a color as lowercase `#rrggbb`.
pub fn to_hex(color: egui::Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b())
}

/// Pushes the palette into egui's visuals.
pub fn apply(ctx: &egui::Context, kind: ThemeKind, palette: &Palette) {
    let mut visuals = match kind {
        ThemeKind::Light => egui::Visuals::light(),
        ThemeKind::Dark => egui::Visuals::dark(),
    };
    visuals.panel_fill = palette.background;
    visuals.window_fill = palette.background;
    visuals.override_text_color = Some(palette.text);
    visuals.selection.bg_fill = palette.primary;
    visuals.selection.stroke = egui::Stroke::new(1.0, egui::Color32::WHITE);
    visuals.hyperlink_color = palette.primary;
    ctx.set_visuals(visuals);
}

/// Heading color: primary, secondary, accent, switching every two seconds.
pub fn title_color(palette: &Palette, elapsed: Duration) -> egui::Color32 {
    let colors = [palette.primary, palette.secondary, palette.accent];
    colors[(elapsed.as_secs() / 2) as usize % colors.len()]
}

/// Trailing dots of the busy dialog, advancing every 300 ms.
pub fn loading_dots(elapsed: Duration) -> &'static str {
    const DOTS: [&str; 3] = [".", "..", "..."];
    DOTS[(elapsed.as_millis() / 300) as usize % DOTS.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(
            parse_hex_color("#3498db"),
            Some(egui::Color32::from_rgb(0x34, 0x98, 0xdb))
        );
        assert_eq!(
            parse_hex_color("#FFFFFF"),
            Some(egui::Color32::from_rgb(255, 255, 255))
        );
        assert_eq!(parse_hex_color("3498db"), None);
        assert_eq!(parse_hex_color("#34989"), None);
        assert_eq!(parse_hex_color("#zzzzzz"), None);
        assert_eq!(parse_hex_color("red"), None);
    }

    #[test]
    fn test_hex_roundtrip_is_lowercase() {
        let c = parse_hex_color("#E74C3C").expect("parse");
        assert_eq!(to_hex(c), "#e74c3c");
    }

    #[test]
    fn test_dark_theme_swaps_background_and_text() {
        let light = Palette::for_theme(ThemeKind::Light);
        let dark = Palette::for_theme(ThemeKind::Dark);
        assert_eq!(light.background, dark.text);
        assert_eq!(light.text, dark.background);
        assert_eq!(light.primary, dark.primary);
    }

    #[test]
    fn test_custom_colors_override_theme() {
        let mut colors = BTreeMap::new();
        colors.insert("primary".to_string(), "#010203".to_string());
        colors.insert("accent".to_string(), "not-a-color".to_string());
        colors.insert("sparkle".to_string(), "#ffffff".to_string());
        let settings = Settings {
            custom_colors: Some(colors),
            ..Settings::default()
        };

        let palette = Palette::resolve(&settings);
        let base = Palette::for_theme(ThemeKind::Light);
        assert_eq!(palette.primary, egui::Color32::from_rgb(1, 2, 3));
        assert_eq!(palette.accent, base.accent);
        assert_eq!(palette.text, base.text);
    }

    #[test]
    fn test_to_custom_colors_covers_every_slot() {
        let map = Palette::for_theme(ThemeKind::Dark).to_custom_colors();
        assert_eq!(map.len(), SLOTS.len());
        assert_eq!(map["background"], "#333333");
        assert_eq!(map["text"], "#f5f5f5");
    }

    #[test]
    fn test_title_color_cycles_every_two_seconds() {
        let p = Palette::for_theme(ThemeKind::Light);
        assert_eq!(title_color(&p, Duration::from_millis(1500)), p.primary);
        assert_eq!(title_color(&p, Duration::from_secs(2)), p.secondary);
        assert_eq!(title_color(&p, Duration::from_secs(5)), p.accent);
        assert_eq!(title_color(&p, Duration::from_secs(6)), p.primary);
    }

    #[test]
    fn test_loading_dots_advance() {
        assert_eq!(loading_dots(Duration::from_millis(0)), ".");
        assert_eq!(loading_dots(Duration::from_millis(350)), "..");
        assert_eq!(loading_dots(Duration::from_millis(650)), "...");
        assert_eq!(loading_dots(Duration::from_millis(900)), ".");
    }
}
