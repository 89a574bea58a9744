//! Scene data: what is drawn, where, and how it looks.
//!
//! - `color` parses and converts the sRGB colours the scene is authored in
//! - `geometry` builds CPU-side primitives, flat shapes and extrusions
//! - `instance` holds per-node transformation data and its GPU layout
//! - `light` is the directional light and its shadow camera
//! - `material` describes surfaces and their uniform buffers
//! - `model` contains vertex layouts and uploaded meshes
//! - `points` generates point clouds
//! - `scene_graph` enables hierarchical scene organization
//! - `texture` contains render-target textures (depth, MSAA, shadow map)

pub mod color;
pub mod geometry;
pub mod instance;
pub mod light;
pub mod material;
pub mod model;
pub mod points;
pub mod scene_graph;
pub mod texture;
