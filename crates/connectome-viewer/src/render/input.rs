use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy_egui::EguiContexts;
use connectome_core::NodeId;

use crate::app::resources::Settings;
use crate::layout::SceneLayout;
use crate::render::gesture::GestureEnd;
use crate::render::hit::{hit_test, HitTarget};
use crate::render::style;
use crate::render::transform::wheel_factor;
use crate::render::ViewState;
use crate::store::{ActiveFocus, Renderable, SceneAction, SceneStore};
use crate::ui::{PanelState, UiLayout};

/// Node whose click opens the player prompt instead of focusing it.
pub const PLAYER_NODE: &str = "player";
const LINE_HEIGHT_PX: f32 = 40.0;

fn pick(
    renderable: &Renderable,
    layout: &SceneLayout,
    view: &ViewState,
    at: Vec2,
) -> Option<NodeId> {
    // Later nodes are drawn on top, so they win overlaps.
    let targets = renderable.nodes.iter().rev().filter_map(|n| {
        layout.runner.position(&n.node_id).map(|center| HitTarget {
            id: &n.node_id,
            center,
            radius: style::hit_radius(n.energy_value),
        })
    });
    hit_test(targets, at, &view.transform).cloned()
}

/// What a click on `id` should do to the scene.
pub fn click_action(id: &NodeId) -> Option<SceneAction> {
    if id.as_str() == PLAYER_NODE {
        return None;
    }
    Some(SceneAction::SetActiveFocus(ActiveFocus {
        active_node_id: Some(id.clone()),
        active_edge_id: None,
        active_step_key: None,
    }))
}

#[allow(clippy::too_many_arguments)]
pub fn canvas_input(
    mut contexts: EguiContexts,
    windows: Query<&Window>,
    buttons: Res<ButtonInput<MouseButton>>,
    mut wheel: EventReader<MouseWheel>,
    mut view: ResMut<ViewState>,
    mut store: ResMut<SceneStore>,
    layout: Res<SceneLayout>,
    ui_layout: Res<UiLayout>,
    settings: Res<Settings>,
    mut panel: ResMut<PanelState>,
) {
    let scroll: f32 = wheel
        .read()
        .map(|ev| match ev.unit {
            MouseScrollUnit::Line => -ev.y * LINE_HEIGHT_PX,
            MouseScrollUnit::Pixel => -ev.y,
        })
        .sum();

    let Ok(window) = windows.get_single() else {
        return;
    };
    let cursor = window.cursor_position();
    let canvas = ui_layout.canvas;
    let local = cursor
        .filter(|c| canvas.contains(bevy_egui::egui::pos2(c.x, c.y)))
        .map(|c| c - Vec2::new(canvas.min.x, canvas.min.y));

    if contexts.ctx_mut().wants_pointer_input() && !view.gesture.is_active() {
        if view.hovered.take().is_some() {
            view.last_cursor = None;
        }
        return;
    }

    let render = &settings.0.render;

    if let Some(at) = local {
        if scroll != 0.0 {
            let factor = wheel_factor(scroll, render.zoom_sensitivity);
            view.transform
                .zoom_at(at, factor, render.min_scale, render.max_scale);
        }
        if buttons.just_pressed(MouseButton::Left) {
            view.gesture.press(at);
        }
    }

    if view.gesture.is_active() {
        let at = cursor
            .map(|c| c - Vec2::new(canvas.min.x, canvas.min.y))
            .unwrap_or_default();
        if buttons.just_released(MouseButton::Left) {
            let end = view.gesture.release(at, render.click_threshold_px);
            if let Some(GestureEnd::Click(at)) = end {
                let renderable = store.renderable();
                if let Some(id) = pick(&renderable, &layout, &view, at) {
                    tracing::debug!(node = id.as_str(), "node clicked");
                    match click_action(&id) {
                        Some(action) => store.dispatch(action),
                        None => panel.prompt_open = true,
                    }
                }
            }
        } else if buttons.pressed(MouseButton::Left) {
            if let Some(delta) = view.gesture.move_to(at) {
                if delta != Vec2::ZERO {
                    view.transform.pan_by(delta);
                }
            }
        } else {
            view.gesture.cancel();
        }
    }

    // Hover is re-tested only when the pointer moved.
    if cursor != view.last_cursor {
        view.last_cursor = cursor;
        let hovered = match local {
            Some(at) if !view.gesture.is_active() => {
                let renderable = store.renderable();
                pick(&renderable, &layout, &view, at)
            }
            _ => None,
        };
        if hovered != view.hovered {
            view.hovered = hovered;
        }
    }
}
