//! Sizes and colors for node and edge glyphs.

use connectome_core::{CallType, NodeType};

pub type Rgb = [f32; 3];

pub const DEFAULT_ENERGY: f32 = 0.4;
pub const ACTIVE_NODE: Rgb = [1.0, 0.8, 0.2];
pub const HOVER_NODE: Rgb = [1.0, 1.0, 1.0];
pub const ACTIVE_EDGE: Rgb = [1.0, 0.9, 0.4];
pub const ZONE_OUTLINE: Rgb = [0.36, 0.35, 0.32];
pub const ACTIVE_BOOST: f32 = 20.0;
pub const HOVER_BOOST: f32 = 10.0;

const fn hex(v: u32) -> Rgb {
    [
        ((v >> 16) & 0xff) as f32 / 255.0,
        ((v >> 8) & 0xff) as f32 / 255.0,
        (v & 0xff) as f32 / 255.0,
    ]
}

/// Glyph diameter in world units before emphasis.
pub fn base_size(energy: Option<f32>) -> f32 {
    let e = energy.filter(|e| e.is_finite()).unwrap_or(DEFAULT_ENERGY).clamp(0.0, 1.0);
    40.0 + e * 40.0
}

/// Hit and clip radius. Emphasis never changes it.
pub fn hit_radius(energy: Option<f32>) -> f32 {
    base_size(energy) / 2.0
}

pub fn node_color(kind: NodeType) -> Rgb {
    match kind {
        NodeType::Actor => hex(0xb8860b),
        NodeType::Ui => hex(0x8d8a80),
        NodeType::Module => hex(0xa9a9a9),
        NodeType::Query => hex(0xb7410e),
        NodeType::Moment => hex(0xb8860b),
        NodeType::Agent => hex(0x2f8a4f),
        NodeType::Timer => hex(0x6f6a60),
    }
}

pub fn edge_color(call_type: CallType) -> Rgb {
    match call_type {
        CallType::GraphLink => hex(0xb7410e),
        CallType::GraphQuery => hex(0x493f64),
        CallType::Llm => hex(0x2f8a4f),
        CallType::Moment => hex(0xb8860b),
        CallType::Code => hex(0x5b6ee1),
    }
}

/// Extra width of the active edge, scaled by the event's energy change.
pub fn pulse_strength(energy_delta: Option<f64>) -> f32 {
    match energy_delta {
        Some(d) if d.is_finite() => 0.4 + d.clamp(0.0, 1.0) as f32 * 0.6,
        _ => 0.4,
    }
}

pub fn node_type_name(kind: NodeType) -> &'static str {
    match kind {
        NodeType::Actor => "actor",
        NodeType::Module => "module",
        NodeType::Query => "query",
        NodeType::Timer => "timer",
        NodeType::Agent => "agent",
        NodeType::Moment => "moment",
        NodeType::Ui => "ui",
    }
}
