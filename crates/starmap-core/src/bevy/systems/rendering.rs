//! Rendering systems for the starmap scene.
//!
//! Uses Bevy's Gizmos API to draw the scene snapshot: spheres for world
//! objects, lines for edges and a small sphere for each trace marker.

use bevy::prelude::*;

use crate::bevy::SceneRes;
use crate::edge::EdgeKind;
use crate::graph::NodeKind;
use crate::world::ActivationState;

/// Gizmo configuration for scene rendering.
#[derive(Resource)]
pub struct SceneGizmoConfig {
    pub sun_color: Color,
    pub category_color: Color,
    pub tool_color: Color,
    pub active_color: Color,
    pub hovered_color: Color,
    pub waypoint_color: Color,
    pub primary_edge_color: Color,
    pub secondary_edge_color: Color,
    pub glow_color: Color,
    /// Alpha applied to dimmed objects.
    pub dimmed_alpha: f32,
}

impl Default for SceneGizmoConfig {
    fn default() -> Self {
        Self {
            sun_color: Color::srgb(1.0, 0.8, 0.3),
            category_color: Color::srgb(0.4, 0.6, 1.0),
            tool_color: Color::srgb(0.75, 0.75, 0.8),
            active_color: Color::srgb(1.0, 0.95, 0.4),
            hovered_color: Color::WHITE,
            waypoint_color: Color::srgb(0.3, 1.0, 0.5),
            primary_edge_color: Color::srgba(0.5, 0.6, 0.8, 0.5),
            secondary_edge_color: Color::srgba(0.7, 0.5, 0.9, 0.4),
            glow_color: Color::srgb(0.6, 0.9, 1.0),
            dimmed_alpha: 0.15,
        }
    }
}

/// Radius an object is drawn and picked with.
pub fn object_radius(kind: NodeKind) -> f32 {
    match kind {
        NodeKind::Sun => 40.0,
        NodeKind::Category => 18.0,
        NodeKind::Tool => 8.0,
    }
}

pub fn render_scene(scene: Res<SceneRes>, config: Res<SceneGizmoConfig>, mut gizmos: Gizmos) {
    let snapshot = scene.0.rendered();

    for object in &snapshot.objects {
        let base = match (object.activation, object.kind) {
            (ActivationState::Active, _) => config.active_color,
            (ActivationState::Hovered, _) => config.hovered_color,
            (_, NodeKind::Sun) => config.sun_color,
            (_, NodeKind::Category) => config.category_color,
            (_, NodeKind::Tool) => config.tool_color,
        };
        let color = if object.dimmed {
            base.with_alpha(config.dimmed_alpha)
        } else {
            base
        };
        let radius = object_radius(object.kind);
        gizmos.sphere(Isometry3d::from_translation(object.position), radius, color);
        if object.waypoint {
            gizmos.sphere(
                Isometry3d::from_translation(object.position),
                radius * 1.8,
                config.waypoint_color,
            );
        }
    }

    for edge in &snapshot.edges {
        let color = match (edge.glow, edge.kind) {
            (true, _) => config.glow_color,
            (false, EdgeKind::Primary) => config.primary_edge_color,
            (false, EdgeKind::Secondary) => config.secondary_edge_color,
        };
        gizmos.line(edge.start, edge.end, color);
        if let Some(marker) = edge.marker {
            gizmos.sphere(Isometry3d::from_translation(marker), 2.5, config.glow_color);
        }
    }
}
