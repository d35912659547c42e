//! WorldObject registry.
//!
//! Every navigable node (sun, categories and tools) lives in one flat
//! registry keyed by its stable id. Positions are derived from the
//! layout and the orbit clock and are never stored authoritatively.

use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::f32::consts::TAU;
use std::fmt;

use bevy::math::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::graph::{NodeKind, TopicGraph};

/// Id synthesized for the sun when the document does not declare one.
pub const DEFAULT_SUN_ID: &str = "sun";

/// Stable string key of a world object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ObjectId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ObjectId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl PartialEq<str> for ObjectId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ObjectId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Pointer interaction state of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActivationState {
    #[default]
    Inactive,
    Hovered,
    Active,
}

/// Orbit of a tool node around its category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitParams {
    pub radius: f32,
    /// Angular offset at t = 0 (radians).
    pub offset: f32,
    /// Angular speed (radians per second).
    pub speed: f32,
    /// Tilt of the orbit plane around the X axis (radians).
    pub tilt: f32,
}

impl OrbitParams {
    /// Offset from the orbit center at time `t`.
    pub fn offset_at(&self, t: f32) -> Vec3 {
        let theta = self.offset + self.speed * t;
        let flat = Vec3::new(self.radius * theta.cos(), 0.0, self.radius * theta.sin());
        Quat::from_rotation_x(self.tilt) * flat
    }
}

/// A navigable node.
#[derive(Debug, Clone)]
pub struct WorldObject {
    pub id: ObjectId,
    pub label: String,
    pub kind: NodeKind,
    pub category_id: Option<ObjectId>,
    pub activation: ActivationState,
    /// Visually dimmed during a session (never removed).
    pub dimmed: bool,
    /// Only set for tools.
    pub orbit: Option<OrbitParams>,
    /// Static position for sun/categories, orbit center for tools.
    pub anchor: Vec3,
    pub url: Option<String>,
    pub description: Option<String>,
}

impl WorldObject {
    pub fn is_tool(&self) -> bool {
        self.kind == NodeKind::Tool
    }

    /// Position at orbit time `t`.
    pub fn position_at(&self, t: f32) -> Vec3 {
        match &self.orbit {
            Some(orbit) => self.anchor + orbit.offset_at(t),
            None => self.anchor,
        }
    }
}

/// Flat registry of world objects.
#[derive(Debug, Clone, Default)]
pub struct World {
    objects: Vec<WorldObject>,
    index: HashMap<ObjectId, usize>,
    sun: usize,
    /// Orbit clock in seconds.
    elapsed: f32,
    active: Option<ObjectId>,
    hovered: Option<ObjectId>,
}

impl World {
    /// Builds the registry from a topic graph.
    ///
    /// Dangling ids are skipped; a tool listed under several categories
    /// belongs to the first one.
    pub fn build(graph: &TopicGraph, layout: &LayoutConfig) -> Self {
        let mut world = World::default();

        let (sun_id, sun_label) = graph
            .nodes
            .iter()
            .find(|(_, node)| node.kind == NodeKind::Sun)
            .map_or_else(
                || {
                    (
                        DEFAULT_SUN_ID.to_string(),
                        graph.title.clone().unwrap_or_else(|| "Hub".to_string()),
                    )
                },
                |(id, node)| (id.clone(), node.label.clone()),
            );
        world.sun = world.insert(WorldObject {
            id: ObjectId::new(sun_id.clone()),
            label: sun_label,
            kind: NodeKind::Sun,
            category_id: None,
            activation: ActivationState::Inactive,
            dimmed: false,
            orbit: None,
            anchor: Vec3::ZERO,
            url: graph.node(&sun_id).and_then(|n| n.url.clone()),
            description: graph.node(&sun_id).and_then(|n| n.description.clone()),
        });

        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(sun_id.as_str());
        let categories: Vec<&String> = graph
            .categories
            .iter()
            .filter(|id| {
                if graph.node(id).is_none() {
                    tracing::debug!("[world] category {id} has no node record, skipped");
                    return false;
                }
                if !seen.insert(id.as_str()) {
                    tracing::debug!("[world] duplicate category {id} skipped");
                    return false;
                }
                true
            })
            .collect();
        #[allow(clippy::cast_precision_loss)]
        let category_count = categories.len().max(1) as f32;
        for (i, category_id) in categories.iter().enumerate() {
            let Some(node) = graph.node(category_id) else {
                continue;
            };
            #[allow(clippy::cast_precision_loss)]
            let angle = TAU * i as f32 / category_count;
            let anchor = Vec3::new(
                layout.category_radius * angle.cos(),
                0.0,
                layout.category_radius * angle.sin(),
            );
            world.insert(WorldObject {
                id: ObjectId::new((*category_id).clone()),
                label: node.label.clone(),
                kind: NodeKind::Category,
                category_id: None,
                activation: ActivationState::Inactive,
                dimmed: false,
                orbit: None,
                anchor,
                url: node.url.clone(),
                description: node.description.clone(),
            });

            let children: Vec<&String> = graph
                .children(category_id)
                .iter()
                .filter(|child| {
                    let known = graph
                        .node(child)
                        .is_some_and(|n| n.kind == NodeKind::Tool);
                    if !known {
                        tracing::debug!("[world] child {child} of {category_id} skipped");
                    }
                    known && seen.insert(child.as_str())
                })
                .collect();
            if children.is_empty() {
                continue;
            }

            #[allow(clippy::cast_precision_loss)]
            let child_count = children.len() as f32;
            for (j, child_id) in children.iter().enumerate() {
                let Some(child) = graph.node(child_id) else {
                    continue;
                };
                #[allow(clippy::cast_precision_loss)]
                let ring = j as f32;
                let tilt_sign = match (i + j) % 3 {
                    0 => -1.0,
                    1 => 0.0,
                    _ => 1.0,
                };
                let orbit = OrbitParams {
                    radius: layout.orbit_base_radius + layout.orbit_spacing * ring,
                    offset: TAU * ring / child_count,
                    speed: layout.base_angular_speed / (1.0 + 0.15 * ring),
                    tilt: layout.tilt * tilt_sign,
                };
                world.insert(WorldObject {
                    id: ObjectId::new((*child_id).clone()),
                    label: child.label.clone(),
                    kind: NodeKind::Tool,
                    category_id: Some(ObjectId::new((*category_id).clone())),
                    activation: ActivationState::Inactive,
                    dimmed: false,
                    orbit: Some(orbit),
                    anchor,
                    url: child.url.clone(),
                    description: child.description.clone(),
                });
            }
        }

        tracing::info!(
            "[world] built {} objects ({} tools)",
            world.objects.len(),
            world.tools().count()
        );
        world
    }

    fn insert(&mut self, object: WorldObject) -> usize {
        let idx = self.objects.len();
        self.index.insert(object.id.clone(), idx);
        self.objects.push(object);
        idx
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&WorldObject> {
        self.index.get(id).map(|&idx| &self.objects[idx])
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut WorldObject> {
        self.index.get(id).map(|&idx| &mut self.objects[idx])
    }

    /// Current position of an object.
    pub fn position(&self, id: &str) -> Option<Vec3> {
        self.get(id).map(|o| o.position_at(self.elapsed))
    }

    /// Advances the orbit clock.
    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn sun(&self) -> &WorldObject {
        &self.objects[self.sun]
    }

    pub fn objects(&self) -> impl Iterator<Item = &WorldObject> {
        self.objects.iter()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn tools(&self) -> impl Iterator<Item = &WorldObject> {
        self.objects.iter().filter(|o| o.kind == NodeKind::Tool)
    }

    pub fn categories(&self) -> impl Iterator<Item = &WorldObject> {
        self.objects.iter().filter(|o| o.kind == NodeKind::Category)
    }

    pub fn tool_labels(&self) -> Vec<&str> {
        self.tools().map(|o| o.label.as_str()).collect()
    }

    pub fn active(&self) -> Option<&ObjectId> {
        self.active.as_ref()
    }

    pub fn hovered(&self) -> Option<&ObjectId> {
        self.hovered.as_ref()
    }

    /// Marks a single object as active, returning the previously active id.
    ///
    /// Unknown ids clear the activation.
    pub fn activate(&mut self, id: Option<&str>) -> Option<ObjectId> {
        let previous = self.active.take();
        if let Some(prev) = &previous {
            if let Some(obj) = self.get_mut(prev.as_str()) {
                obj.activation = ActivationState::Inactive;
            }
        }
        if let Some(obj) = id.and_then(|id| self.get_mut(id)) {
            obj.activation = ActivationState::Active;
            let new_id = obj.id.clone();
            if self.hovered.as_ref() == Some(&new_id) {
                self.hovered = None;
            }
            self.active = Some(new_id);
        }
        previous
    }

    /// Marks a single object as hovered. The active object is never hovered.
    pub fn hover(&mut self, id: Option<&str>) {
        if let Some(prev) = self.hovered.take() {
            if let Some(obj) = self.get_mut(prev.as_str()) {
                if obj.activation == ActivationState::Hovered {
                    obj.activation = ActivationState::Inactive;
                }
            }
        }
        if let Some(obj) = id.and_then(|id| self.get_mut(id)) {
            if obj.activation != ActivationState::Active {
                obj.activation = ActivationState::Hovered;
                self.hovered = Some(obj.id.clone());
            }
        }
    }

    /// Dims every object except the listed ones.
    pub fn dim_all_except(&mut self, keep: &[&str]) {
        for obj in &mut self.objects {
            obj.dimmed = !keep.contains(&obj.id.as_str());
        }
    }

    pub fn undim(&mut self, id: &str) {
        if let Some(obj) = self.get_mut(id) {
            obj.dimmed = false;
        }
    }

    pub fn undim_all(&mut self) {
        for obj in &mut self.objects {
            obj.dimmed = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::sample_graph;
    use crate::graph::NodeRecord;

    fn sample_world() -> World {
        World::build(&sample_graph(), &LayoutConfig::default())
    }

    #[test]
    fn test_build_registry() {
        let world = sample_world();
        // sun + 3 categories + 6 tools ("ghost" is dangling)
        assert_eq!(world.len(), 10);
        assert_eq!(world.sun().id, "sun");
        assert_eq!(world.categories().count(), 3);
        assert_eq!(world.tools().count(), 6);
        assert!(!world.contains("ghost"));

        let rust = world.get("rust").unwrap();
        assert_eq!(rust.category_id.as_ref().unwrap(), "lang");
        assert!(rust.orbit.is_some());
        assert!(world.get("lang").unwrap().orbit.is_none());
    }

    #[test]
    fn test_synthesized_sun() {
        let mut graph = sample_graph();
        graph.nodes.remove("sun");
        let world = World::build(&graph, &LayoutConfig::default());
        assert_eq!(world.sun().id, DEFAULT_SUN_ID);
        assert_eq!(world.sun().label, "Toolbox");
        assert_eq!(world.objects().filter(|o| o.kind == NodeKind::Sun).count(), 1);
    }

    #[test]
    fn test_tool_owned_by_first_category() {
        let mut graph = sample_graph();
        graph
            .category_children
            .get_mut("ops")
            .unwrap()
            .push("rust".to_string());
        let world = World::build(&graph, &LayoutConfig::default());
        assert_eq!(world.get("rust").unwrap().category_id.as_ref().unwrap(), "lang");
        assert_eq!(world.tools().count(), 6);
    }

    #[test]
    fn test_empty_category_is_laid_out() {
        let mut graph = sample_graph();
        graph.categories.push("empty".to_string());
        graph
            .nodes
            .insert("empty".to_string(), NodeRecord::new("Empty", NodeKind::Category));
        let world = World::build(&graph, &LayoutConfig::default());
        assert!(world.contains("empty"));
        assert_eq!(world.tools().count(), 6);
    }

    #[test]
    fn test_static_and_orbiting_positions() {
        let mut world = sample_world();
        let sun_before = world.position("sun").unwrap();
        let cat_before = world.position("lang").unwrap();
        let tool_before = world.position("rust").unwrap();

        world.advance(5.0);

        assert_eq!(world.position("sun").unwrap(), sun_before);
        assert_eq!(world.position("lang").unwrap(), cat_before);
        let tool_after = world.position("rust").unwrap();
        assert!(tool_after.distance(tool_before) > 1.0);

        // the orbit radius around the anchor is preserved
        let orbit = world.get("rust").unwrap().orbit.unwrap();
        assert!((tool_after.distance(cat_before) - orbit.radius).abs() < 1e-3);
    }

    #[test]
    fn test_single_active_object() {
        let mut world = sample_world();
        assert_eq!(world.activate(Some("rust")), None);
        assert_eq!(world.activate(Some("go")).unwrap(), "rust");
        assert_eq!(world.get("rust").unwrap().activation, ActivationState::Inactive);
        assert_eq!(world.get("go").unwrap().activation, ActivationState::Active);
        let active = world
            .objects()
            .filter(|o| o.activation == ActivationState::Active)
            .count();
        assert_eq!(active, 1);

        world.activate(Some("nope"));
        assert!(world.active().is_none());
    }

    #[test]
    fn test_hover_does_not_override_active() {
        let mut world = sample_world();
        world.activate(Some("rust"));
        world.hover(Some("rust"));
        assert_eq!(world.get("rust").unwrap().activation, ActivationState::Active);
        assert!(world.hovered().is_none());

        world.hover(Some("go"));
        assert_eq!(world.get("go").unwrap().activation, ActivationState::Hovered);
        world.hover(None);
        assert_eq!(world.get("go").unwrap().activation, ActivationState::Inactive);
    }

    #[test]
    fn test_dimming() {
        let mut world = sample_world();
        world.dim_all_except(&["rust"]);
        assert!(!world.get("rust").unwrap().dimmed);
        assert!(world.get("go").unwrap().dimmed);
        world.undim("go");
        assert!(!world.get("go").unwrap().dimmed);
        world.undim_all();
        assert!(world.objects().all(|o| !o.dimmed));
    }
}
