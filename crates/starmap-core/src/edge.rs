//! Edge set and trace animation.
//!
//! Edges store endpoint ids and resolve positions through the [`World`]
//! registry at use time. A trace is a marker that travels from one
//! endpoint to the other while the line grows behind it.

use std::collections::HashSet;

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

use crate::easing::EasingType;
use crate::graph::TopicGraph;
use crate::world::{ObjectId, World};

/// Default duration of a trace animation in seconds.
pub const DEFAULT_TRACE_DURATION: f32 = 0.8;

/// Kind of link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Hierarchy edge (sun -> category, category -> tool).
    Primary,
    /// Cross-reference edge.
    Secondary,
}

/// Which endpoint a trace starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOrigin {
    From,
    To,
}

/// Active trace animation.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceState {
    pub origin: TraceOrigin,
    /// Normalized progress in `[0, 1]`.
    pub progress: f32,
    pub duration: f32,
    /// Current marker position.
    pub marker: Vec3,
}

/// A link between two world objects.
#[derive(Debug, Clone)]
pub struct Edge {
    pub from: ObjectId,
    pub to: ObjectId,
    pub kind: EdgeKind,
    pub visible: bool,
    /// Highlight overlay drawn when the edge touches the active object.
    pub glow: bool,
    pub trace: Option<TraceState>,
    /// Segment currently drawn for this edge, if any.
    pub drawn: Option<(Vec3, Vec3)>,
}

impl Edge {
    fn new(from: ObjectId, to: ObjectId, kind: EdgeKind) -> Self {
        Self {
            from,
            to,
            kind,
            visible: false,
            glow: false,
            trace: None,
            drawn: None,
        }
    }

    pub fn touches(&self, id: &str) -> bool {
        self.from == id || self.to == id
    }

    /// The endpoint opposite to `id`.
    pub fn other(&self, id: &str) -> Option<&ObjectId> {
        if self.from == id {
            Some(&self.to)
        } else if self.to == id {
            Some(&self.from)
        } else {
            None
        }
    }

    fn endpoints(&self, origin: TraceOrigin) -> (&ObjectId, &ObjectId) {
        match origin {
            TraceOrigin::From => (&self.from, &self.to),
            TraceOrigin::To => (&self.to, &self.from),
        }
    }

    /// Marker position while a trace runs.
    pub fn marker(&self) -> Option<Vec3> {
        self.trace.as_ref().map(|t| t.marker)
    }

    pub fn is_tracing(&self) -> bool {
        self.trace.is_some()
    }
}

/// Segment handed to the render surface.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEdge {
    pub from: ObjectId,
    pub to: ObjectId,
    pub kind: EdgeKind,
    pub start: Vec3,
    pub end: Vec3,
    pub glow: bool,
    pub marker: Option<Vec3>,
}

/// Flat collection of edges.
#[derive(Debug, Clone)]
pub struct EdgeSet {
    edges: Vec<Edge>,
    trace_duration: f32,
    easing: EasingType,
}

impl Default for EdgeSet {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeSet {
    pub fn new() -> Self {
        Self {
            edges: Vec::new(),
            trace_duration: DEFAULT_TRACE_DURATION,
            easing: EasingType::CubicOut,
        }
    }

    /// Builds hierarchy and cross-reference edges for the objects present
    /// in `world`. Links to unknown ids and duplicate pairs are skipped.
    pub fn build(graph: &TopicGraph, world: &World) -> Self {
        let mut set = Self::new();
        let sun = world.sun().id.clone();

        for category in world.categories() {
            set.add(sun.clone(), category.id.clone(), EdgeKind::Primary);
        }
        for tool in world.tools() {
            if let Some(category) = &tool.category_id {
                set.add(category.clone(), tool.id.clone(), EdgeKind::Primary);
            }
        }
        for object in world.objects() {
            let Some(node) = graph.node(object.id.as_str()) else {
                continue;
            };
            for target in &node.connections.secondary {
                if !world.contains(target) {
                    tracing::debug!("[edge] link {} -> {target} skipped", object.id);
                    continue;
                }
                set.add(object.id.clone(), ObjectId::new(target.clone()), EdgeKind::Secondary);
            }
        }

        tracing::info!("[edge] built {} edges", set.edges.len());
        set
    }

    /// Adds an edge unless it is a self-loop or duplicates an existing pair.
    pub fn add(&mut self, from: ObjectId, to: ObjectId, kind: EdgeKind) -> bool {
        if from == to {
            return false;
        }
        let duplicate = self
            .edges
            .iter()
            .any(|e| (e.from == from && e.to == to) || (e.from == to && e.to == from));
        if duplicate {
            return false;
        }
        self.edges.push(Edge::new(from, to, kind));
        true
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Edge> {
        self.edges.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Index of the edge joining `a` and `b`, in either direction.
    pub fn find(&self, a: &str, b: &str) -> Option<usize> {
        self.edges
            .iter()
            .position(|e| (e.from == a && e.to == b) || (e.from == b && e.to == a))
    }

    /// Ids directly linked to `id`.
    pub fn neighbors(&self, id: &str) -> Vec<&ObjectId> {
        let mut seen = HashSet::new();
        self.edges
            .iter()
            .filter_map(|e| e.other(id))
            .filter(|other| seen.insert(other.as_str()))
            .collect()
    }

    /// Starts a trace from `origin` along the edge at `index`.
    ///
    /// Returns false if `origin` is not an endpoint of the edge.
    pub fn start_trace(&mut self, index: usize, origin: &str, world: &World) -> bool {
        let duration = self.trace_duration;
        let Some(edge) = self.edges.get_mut(index) else {
            return false;
        };
        let origin = if edge.from == origin {
            TraceOrigin::From
        } else if edge.to == origin {
            TraceOrigin::To
        } else {
            return false;
        };
        let (origin_id, _) = edge.endpoints(origin);
        let Some(origin_pos) = world.position(origin_id.as_str()) else {
            return false;
        };
        edge.trace = Some(TraceState {
            origin,
            progress: 0.0,
            duration,
            marker: origin_pos,
        });
        // the static line is hidden until the marker starts moving
        edge.drawn = Some((origin_pos, origin_pos));
        true
    }

    /// Hides the marker immediately without completing the line.
    pub fn stop_trace(&mut self, index: usize) {
        if let Some(edge) = self.edges.get_mut(index) {
            if edge.trace.take().is_some() {
                edge.drawn = None;
            }
        }
    }

    /// Starts traces from `active` along every edge that touches it.
    pub fn highlight(&mut self, active: &str, world: &World) -> usize {
        let touching: Vec<usize> = self
            .edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.touches(active))
            .map(|(idx, _)| idx)
            .collect();
        touching
            .into_iter()
            .filter(|&idx| self.start_trace(idx, active, world))
            .count()
    }

    /// Applies the visibility rules: an edge is shown when every
    /// connection is on, or when it touches the active object (which
    /// also enables its glow). Hidden edges lose their trace.
    pub fn apply_visibility(&mut self, active: Option<&str>, show_all: bool) {
        for edge in &mut self.edges {
            let touches_active = active.is_some_and(|id| edge.touches(id));
            edge.visible = show_all || touches_active;
            edge.glow = touches_active;
            if !edge.visible {
                edge.trace = None;
                edge.drawn = None;
            }
        }
    }

    /// Advances traces and refreshes the drawn segments.
    pub fn update_traces(&mut self, dt: f32, world: &World) {
        let easing = self.easing;
        for edge in &mut self.edges {
            let Some(mut trace) = edge.trace.take() else {
                edge.drawn = if edge.visible {
                    world
                        .position(edge.from.as_str())
                        .zip(world.position(edge.to.as_str()))
                } else {
                    None
                };
                continue;
            };

            let (origin_id, dest_id) = edge.endpoints(trace.origin);
            let (Some(origin), Some(dest)) = (
                world.position(origin_id.as_str()),
                world.position(dest_id.as_str()),
            ) else {
                edge.drawn = None;
                continue;
            };

            if trace.duration > 0.0 {
                trace.progress = (trace.progress + dt / trace.duration).min(1.0);
            } else {
                trace.progress = 1.0;
            }

            if trace.progress >= 1.0 {
                edge.drawn = Some((origin, dest));
                continue;
            }

            trace.marker = origin.lerp(dest, easing.apply(trace.progress));
            edge.drawn = Some((origin, trace.marker));
            edge.trace = Some(trace);
        }
    }

    /// Segments to draw this frame.
    pub fn rendered(&self) -> Vec<RenderedEdge> {
        self.edges
            .iter()
            .filter_map(|e| {
                let (start, end) = e.drawn?;
                Some(RenderedEdge {
                    from: e.from.clone(),
                    to: e.to.clone(),
                    kind: e.kind,
                    start,
                    end,
                    glow: e.glow,
                    marker: e.marker(),
                })
            })
            .collect()
    }
}
