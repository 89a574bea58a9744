//! shape-garden
//!
//! A small scene-graph demo on wgpu that runs natively and in the browser.
//! It assembles a directional light, a handful of primitive meshes, a flat
//! and an extruded star and a point cloud, then draws them every display
//! refresh with shadows, MSAA and orbit camera controls.
//!
//! High-level modules
//! - `assembly`: builds the demo scene from literals
//! - `camera`: camera, projection and their uniform
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `controls`: orbit / dolly / pan camera controls
//! - `data_structures`: geometry, materials, lights, instances and the scene graph
//! - `flow`: the winit application and event loop
//! - `frame`: the self-scheduling frame driver
//! - `pipelines`: render pipelines (standard, shadow, points) and the GPU light
//! - `render`: render composition for efficient pipeline reuse
//! - `viewport`: output size and the projection that follows it
//!

pub mod assembly;
pub mod camera;
pub mod context;
pub mod controls;
pub mod data_structures;
pub mod flow;
pub mod frame;
pub mod pipelines;
pub mod render;
pub mod viewport;

pub use assembly::{AssembledScene, SceneConfig, assemble_scene};
pub use flow::{AppConfig, run};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), wasm_bindgen::JsValue> {
    run(AppConfig::default()).map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}
