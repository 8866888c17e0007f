pub mod draw;
pub mod frame;
pub mod geometry;
pub mod gesture;
pub mod hit;
pub mod input;
pub mod labels;
pub mod style;
pub mod transform;

use bevy::math::Vec2;
use bevy::prelude::Resource;
use connectome_core::NodeId;

pub use draw::{draw_scene, request_redraw, setup_camera};
pub use frame::{FrameList, FrameScheduler};
pub use input::canvas_input;
pub use transform::ViewTransform;

/// Local interaction state of the canvas. Never part of the scene store.
#[derive(Resource, Default)]
pub struct ViewState {
    pub transform: ViewTransform,
    pub hovered: Option<NodeId>,
    pub gesture: gesture::PointerGesture,
    /// Fit the view to the revealed nodes once positions exist.
    pub fit_pending: bool,
    pub last_cursor: Option<Vec2>,
}

impl ViewState {
    pub fn request_fit(&mut self) {
        self.fit_pending = true;
    }
}

/// Last built draw list and the scheduler that decides when to rebuild it.
#[derive(Resource, Default)]
pub struct FrameCache {
    pub scheduler: FrameScheduler,
    pub frame: FrameList,
    /// Set when the last observation asked for a new frame.
    pub dirty: bool,
}
