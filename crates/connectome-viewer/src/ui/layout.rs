use bevy::prelude::Resource;
use bevy_egui::egui;

/// Screen rect left for the canvas once the panels have claimed their space.
#[derive(Resource, Clone, Copy)]
pub struct UiLayout {
    pub canvas: egui::Rect,
}

impl Default for UiLayout {
    fn default() -> Self {
        Self {
            canvas: egui::Rect::NOTHING,
        }
    }
}
