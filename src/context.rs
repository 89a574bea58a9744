//! The GPU and window context.
//!
//! [`Context`] owns the surface, device and queue together with everything
//! that has to follow the window size (viewport, depth buffer, MSAA target)
//! and the per-frame uniforms shared by all nodes (camera and light).

use std::{iter, sync::Arc};

use anyhow::Context as _;
use winit::window::Window;

use crate::{
    camera::{Camera, CameraResources, CameraSettings},
    data_structures::{
        light::{DirectionalLight, ShadowCamera},
        material,
        model::DrawModel,
        scene_graph::Scene,
        texture,
    },
    pipelines::{
        Pipelines, basic,
        light::{LightResources, LightUniform},
        points, shadow,
    },
    render::{Drawable, Sprites},
    viewport::Viewport,
};

const MSAA_SAMPLES: u32 = 4;

/// The largest power of two up to `requested` that `supported` accepts, or 1.
fn choose_sample_count(requested: u32, supported: impl Fn(u32) -> bool) -> u32 {
    let mut count = requested.max(1).next_power_of_two();
    if count > requested {
        count /= 2;
    }
    while count > 1 && !supported(count) {
        count /= 2;
    }
    count.max(1)
}

/// How the renderer draws, independent of what it draws.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RendererSettings {
    /// Multisample the main pass when the adapter supports it.
    pub antialias: bool,
    pub shadow_map_enabled: bool,
    pub clear_colour: wgpu::Color,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            antialias: true,
            shadow_map_enabled: true,
            clear_colour: wgpu::Color::BLACK,
        }
    }
}

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    pub(crate) msaa_target: Option<texture::Texture>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub sample_count: u32,
    pub viewport: Viewport,
    pub camera: CameraResources,
    pub light: LightResources,
    pub material_layout: wgpu::BindGroupLayout,
    pub pipelines: Pipelines,
    pub settings: RendererSettings,
}

impl Context {
    pub async fn new(
        window: Arc<Window>,
        settings: &RendererSettings,
        camera_settings: &CameraSettings,
        light: Option<&DirectionalLight>,
    ) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("Cannot create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No graphics adapter is compatible with the surface")?;
        log::info!("adapter: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Cannot open a device on the adapter")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Colours are converted to linear before upload, so the surface has to be sRGB
        // for them to come out right.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("The surface reports no texture formats")?;

        let viewport = Viewport::new(size.width, size.height, camera_settings);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: viewport.width,
            height: viewport.height,
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::debug!("surface {:?} {}x{}", config.format, config.width, config.height);

        let sample_count = if settings.antialias {
            let flags = adapter.get_texture_format_features(config.format).flags;
            let sample_count =
                choose_sample_count(MSAA_SAMPLES, |count| flags.sample_count_supported(count));
            if sample_count < MSAA_SAMPLES {
                log::warn!(
                    "{:?} does not support {}x MSAA, using {}x",
                    config.format,
                    MSAA_SAMPLES,
                    sample_count
                );
            }
            sample_count
        } else {
            1
        };

        let camera = CameraResources::new(&device, Camera::from(camera_settings), &viewport.projection);

        let light_uniform = match light {
            Some(light) => LightUniform::new(light, settings.shadow_map_enabled),
            None => LightUniform::dark(),
        };
        let shadow_map_size = light
            .map(|light| light.shadow.map_size)
            .unwrap_or(ShadowCamera::default().map_size);
        let light = LightResources::new(&device, light_uniform, shadow_map_size);

        let material_layout = material::mk_bind_group_layout(&device);
        let pipelines = Pipelines {
            basic: basic::mk_basic_pipeline(
                &device,
                config.format,
                sample_count,
                &material_layout,
                &camera.bind_group_layout,
                &light.bind_group_layout,
            ),
            shadow: shadow::mk_shadow_pipeline(&device, &light.shadow_bind_group_layout),
            points: points::mk_points_pipeline(
                &device,
                config.format,
                sample_count,
                &material_layout,
                &camera.bind_group_layout,
            ),
        };

        let depth_texture = texture::Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            sample_count,
            "depth_texture",
        );
        let msaa_target = (sample_count > 1)
            .then(|| texture::Texture::create_msaa_target(&device, &config, sample_count));

        Ok(Self {
            window,
            depth_texture,
            msaa_target,
            surface,
            device,
            queue,
            config,
            sample_count,
            viewport,
            camera,
            light,
            material_layout,
            pipelines,
            settings: *settings,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Resizes the viewport and every size-dependent GPU resource.
    /// Returns `false` if the size was rejected.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if !self.viewport.resize(width, height) {
            return false;
        }
        log::debug!("resize to {}x{}", width, height);
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = texture::Texture::create_depth_texture(
            &self.device,
            [width, height],
            self.sample_count,
            "depth_texture",
        );
        if self.sample_count > 1 {
            self.msaa_target = Some(texture::Texture::create_msaa_target(
                &self.device,
                &self.config,
                self.sample_count,
            ));
        }
        self.write_camera();
        true
    }

    /// Uploads the camera as it is now.
    pub fn write_camera(&mut self) {
        self.camera.write_to_buffer(&self.queue, &self.viewport.projection);
    }

    /// Uploads `light`, or a light that contributes nothing.
    pub fn write_light(&mut self, light: Option<&DirectionalLight>) {
        let uniform = match light {
            Some(light) => LightUniform::new(light, self.settings.shadow_map_enabled),
            None => LightUniform::dark(),
        };
        self.light.write_to_buffer(&self.queue, uniform);
    }

    /// Draws `scene` into the next swapchain image: the shadow pass first if
    /// the light casts shadows, then meshes and point clouds.
    pub fn render(&self, scene: &Scene) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let render = scene.get_render();
        if render.is_empty() {
            log::warn!("the scene has nothing to draw");
        }
        let mut meshes: Vec<Drawable> = Vec::new();
        let mut sprites: Vec<Sprites> = Vec::new();
        render.set_pipelines(&mut meshes, &mut sprites);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        if self.light.uniform.casts_shadow() {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.light.shadow_map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            shadow_pass.set_pipeline(&self.pipelines.shadow);
            for drawable in meshes.iter().filter(|drawable| drawable.cast_shadow) {
                shadow_pass.set_vertex_buffer(1, drawable.instance.slice(..));
                shadow_pass.draw_mesh_shadow(drawable.mesh, &self.light.shadow_bind_group);
            }
        }

        {
            let (target, resolve_target, store) = match &self.msaa_target {
                Some(msaa) => (&msaa.view, Some(&view), wgpu::StoreOp::Discard),
                None => (&view, None, wgpu::StoreOp::Store),
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.settings.clear_colour),
                        store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.pipelines.basic);
            for drawable in &meshes {
                if drawable.mesh.num_elements == 0 {
                    log::warn!("{} has no triangles", drawable.mesh.name);
                    continue;
                }
                render_pass.set_vertex_buffer(1, drawable.instance.slice(..));
                render_pass.draw_mesh(
                    drawable.mesh,
                    drawable.material,
                    &self.camera.bind_group,
                    &self.light.bind_group,
                );
            }

            render_pass.set_pipeline(&self.pipelines.points);
            for cloud in &sprites {
                if cloud.amount == 0 {
                    log::warn!("you attempted to render a point cloud without points");
                    continue;
                }
                render_pass.set_bind_group(0, cloud.material, &[]);
                render_pass.set_bind_group(1, &self.camera.bind_group, &[]);
                render_pass.set_vertex_buffer(0, cloud.points.slice(..));
                render_pass.draw(0..6, 0..cloud.amount);
            }
        }

        self.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}
