//! ECS Components for the starmap scene.
//!
//! World objects are not entities: the scene owns them and the render
//! systems draw its snapshot. Only the camera lives in the ECS.

use bevy::prelude::*;

/// Marker for the main 3D camera.
#[derive(Component, Debug, Clone, Default)]
pub struct MainCamera;
