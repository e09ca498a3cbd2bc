//! Single-pass forward renderer for a [`Scene`].
//!
//! # Bind Groups
//!
//! - **Group 0**: frame uniforms (camera, fog, every light)
//! - **Group 1**: per-draw uniforms (model and normal matrices, colour,
//!   flags), one slot per draw in a dynamic-offset buffer
//! - **Group 2**: texture and sampler, white for untextured materials
//!
//! Meshes and textures are uploaded the first time the scene's asset store
//! holds more entries than the renderer has seen.

use std::num::NonZeroU64;

use glam::Mat4;

use super::gpu::GpuContext;
use super::mesh::GpuMesh;
use super::texture::Texture;
use super::{RenderError, SceneRenderer};
use crate::camera::PerspectiveCamera;
use crate::mesh::Vertex3d;
use crate::scene::{DrawItem, MeshId, Scene, SceneAssets, TextureId};

/// Point lights beyond this count are not drawn.
pub const MAX_POINT_LIGHTS: usize = 32;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const INITIAL_DRAW_CAPACITY: usize = 64;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct PointLightUniform {
    position_range: [f32; 4],
    color_decay: [f32; 4],
}

/// Camera, fog and lighting shared by every draw in a frame.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    fog: [f32; 4],
    ambient: [f32; 4],
    dir_direction: [f32; 4],
    dir_color: [f32; 4],
    spot_position: [f32; 4],
    spot_direction: [f32; 4],
    spot_color: [f32; 4],
    spot_cone: [f32; 4],
    point_count: [u32; 4],
    points: [PointLightUniform; MAX_POINT_LIGHTS],
}

impl FrameUniforms {
    pub(crate) fn new(scene: &Scene, camera: &PerspectiveCamera) -> Self {
        let mut uniforms = Self::zeroed_with_camera(camera);

        if let Some(fog) = scene.fog {
            let [r, g, b] = fog.color.to_linear();
            uniforms.fog = [r, g, b, fog.density];
        }
        uniforms.ambient = scene.ambient.color.to_linear_scaled(scene.ambient.intensity, 0.0);

        if let Some(dir) = scene.directional {
            uniforms.dir_direction = dir.direction().extend(1.0).to_array();
            uniforms.dir_color = dir.color.to_linear_scaled(dir.intensity, 0.0);
        }

        if let Some(spot) = scene.spot {
            let (cos_outer, cos_inner) = spot.cone_cosines();
            uniforms.spot_position = spot.position.extend(spot.distance).to_array();
            uniforms.spot_direction = spot.direction().extend(spot.decay).to_array();
            uniforms.spot_color = spot.color.to_linear_scaled(spot.intensity, 1.0);
            uniforms.spot_cone = [cos_outer, cos_inner, 0.0, 0.0];
        }

        let lights = scene.point_lights();
        if lights.len() > MAX_POINT_LIGHTS {
            log::warn!(
                "{} point lights in scene, only {} are drawn",
                lights.len(),
                MAX_POINT_LIGHTS
            );
        }
        for (slot, instance) in uniforms.points.iter_mut().zip(&lights) {
            let light = instance.light;
            *slot = PointLightUniform {
                position_range: instance.position.extend(light.range).to_array(),
                color_decay: light.color.to_linear_scaled(light.intensity, light.decay),
            };
        }
        uniforms.point_count[0] = lights.len().min(MAX_POINT_LIGHTS) as u32;

        uniforms
    }

    fn zeroed_with_camera(camera: &PerspectiveCamera) -> Self {
        let mut uniforms: Self = bytemuck::Zeroable::zeroed();
        uniforms.view_proj = camera.view_projection().to_cols_array_2d();
        uniforms.camera_pos = camera.position.extend(1.0).to_array();
        uniforms
    }
}

/// Per-draw transform and material.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct DrawUniforms {
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    color: [f32; 4],
    flags: [u32; 4],
}

impl DrawUniforms {
    pub(crate) fn new(item: &DrawItem) -> Self {
        // Inverse transpose keeps normals perpendicular under non-uniform scale
        let normal_matrix = if item.model.determinant().abs() > f32::EPSILON {
            item.model.inverse().transpose()
        } else {
            Mat4::IDENTITY
        };
        let material = item.material;
        let [r, g, b] = material.color.to_linear();

        Self {
            model: item.model.to_cols_array_2d(),
            normal_matrix: normal_matrix.to_cols_array_2d(),
            color: [r, g, b, material.color.a],
            flags: [u32::from(material.lit), u32::from(material.fog), 0, 0],
        }
    }
}

/// Draws a [`Scene`] straight to the window surface.
pub struct ForwardRenderer {
    gpu: GpuContext,
    pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    draw_layout: wgpu::BindGroupLayout,
    draw_buffer: wgpu::Buffer,
    draw_bind_group: wgpu::BindGroup,
    draw_capacity: usize,
    draw_stride: u64,
    draw_scratch: Vec<u8>,
    texture_layout: wgpu::BindGroupLayout,
    white_texture: wgpu::BindGroup,
    meshes: Vec<GpuMesh>,
    textures: Vec<wgpu::BindGroup>,
    depth_view: wgpu::TextureView,
}

impl ForwardRenderer {
    pub fn new(gpu: GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Forward Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/forward.wgsl").into()),
        });

        // Frame uniforms (group 0)
        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        // Per-draw uniforms (group 1), addressed by dynamic offset
        let draw_size = std::mem::size_of::<DrawUniforms>() as u64;
        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let draw_stride = draw_size.div_ceil(alignment) * alignment;
        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Draw Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(draw_size),
                },
                count: None,
            }],
        });
        let (draw_buffer, draw_bind_group) =
            Self::create_draw_buffer(device, &draw_layout, INITIAL_DRAW_CAPACITY, draw_stride);

        // Texture (group 2)
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Texture Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let white_texture =
            Self::create_texture_bind_group(device, &texture_layout, &Texture::white(&gpu));

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Forward Pipeline Layout"),
            bind_group_layouts: &[&frame_layout, &draw_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Forward Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[Vertex3d::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                front_face: wgpu::FrontFace::Ccw,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let depth_view = Self::create_depth_view(&gpu);

        Self {
            gpu,
            pipeline,
            frame_buffer,
            frame_bind_group,
            draw_layout,
            draw_buffer,
            draw_bind_group,
            draw_capacity: INITIAL_DRAW_CAPACITY,
            draw_stride,
            draw_scratch: Vec::new(),
            texture_layout,
            white_texture,
            meshes: Vec::new(),
            textures: Vec::new(),
            depth_view,
        }
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    fn create_draw_buffer(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        capacity: usize,
        stride: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw Uniforms"),
            size: capacity as u64 * stride,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(std::mem::size_of::<DrawUniforms>() as u64),
                }),
            }],
        });
        (buffer, bind_group)
    }

    fn create_texture_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        texture: &Texture,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Texture Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        })
    }

    fn create_depth_view(gpu: &GpuContext) -> wgpu::TextureView {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: gpu.width(),
                height: gpu.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Uploads meshes and textures added since the last frame.
    fn sync_assets(&mut self, assets: &SceneAssets) {
        for index in self.meshes.len()..assets.mesh_count() {
            if let Some(geometry) = assets.mesh(MeshId(index)) {
                let label = format!("Mesh {}", index);
                self.meshes.push(GpuMesh::upload(&self.gpu, geometry, &label));
            }
        }
        for index in self.textures.len()..assets.texture_count() {
            let texture = match assets.texture_path(TextureId(index)) {
                Some(path) => Texture::from_file_or_white(&self.gpu, path),
                None => Texture::white(&self.gpu),
            };
            self.textures.push(Self::create_texture_bind_group(
                &self.gpu.device,
                &self.texture_layout,
                &texture,
            ));
        }
    }

    fn ensure_draw_capacity(&mut self, count: usize) {
        if count <= self.draw_capacity {
            return;
        }
        let capacity = count.max(self.draw_capacity * 2);
        log::debug!("Growing draw buffer: {} -> {}", self.draw_capacity, capacity);
        let (buffer, bind_group) =
            Self::create_draw_buffer(&self.gpu.device, &self.draw_layout, capacity, self.draw_stride);
        self.draw_buffer = buffer;
        self.draw_bind_group = bind_group;
        self.draw_capacity = capacity;
    }

    fn write_draws(&mut self, draws: &[DrawItem]) {
        let stride = self.draw_stride as usize;
        self.draw_scratch.clear();
        self.draw_scratch.resize(draws.len() * stride, 0);
        for (chunk, item) in self.draw_scratch.chunks_exact_mut(stride).zip(draws) {
            let uniforms = DrawUniforms::new(item);
            let bytes = bytemuck::bytes_of(&uniforms);
            chunk[..bytes.len()].copy_from_slice(bytes);
        }
        if !self.draw_scratch.is_empty() {
            self.gpu.queue.write_buffer(&self.draw_buffer, 0, &self.draw_scratch);
        }
    }
}

impl SceneRenderer for ForwardRenderer {
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<(), RenderError> {
        let output = match self.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                self.gpu.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out waiting for the surface, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        self.sync_assets(&scene.assets);

        let draws: Vec<DrawItem> = scene
            .draw_list()
            .into_iter()
            .filter(|d| d.mesh.index() < self.meshes.len())
            .collect();
        self.ensure_draw_capacity(draws.len());
        self.write_draws(&draws);

        let frame = FrameUniforms::new(scene, camera);
        self.gpu
            .queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&frame));

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Forward Encoder"),
            });

        {
            let [r, g, b] = scene.background.to_linear();
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Forward Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(r),
                            g: f64::from(g),
                            b: f64::from(b),
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.frame_bind_group, &[]);

            for (i, item) in draws.iter().enumerate() {
                let mesh = &self.meshes[item.mesh.index()];
                if mesh.index_count == 0 {
                    continue;
                }
                let offset = (i as u64 * self.draw_stride) as u32;
                render_pass.set_bind_group(1, &self.draw_bind_group, &[offset]);

                let texture = item
                    .material
                    .texture
                    .and_then(|t| self.textures.get(t.index()))
                    .unwrap_or(&self.white_texture);
                render_pass.set_bind_group(2, texture, &[]);

                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.gpu.resize(width, height);
        self.depth_view = Self::create_depth_view(&self.gpu);
    }
}

impl std::fmt::Debug for ForwardRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForwardRenderer")
            .field("size", &(self.gpu.width(), self.gpu.height()))
            .field("meshes", &self.meshes.len())
            .field("textures", &self.textures.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::mesh::Transform;
    use crate::scene::{DirectionalLight, Fog, Material, PointLight};
    use glam::Vec3;

    #[test]
    fn uniform_sizes_match_shader_layout() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 224 + 32 * 32);
        assert_eq!(std::mem::size_of::<DrawUniforms>(), 160);
    }

    #[test]
    fn frame_packs_lights_and_fog() {
        let mut scene = Scene::new();
        scene.fog = Some(Fog {
            color: Color::WHITE,
            density: 0.02,
        });
        scene.directional = Some(DirectionalLight {
            color: Color::WHITE,
            intensity: 1.0,
            position: Vec3::new(0.0, 10.0, 0.0),
            target: Vec3::ZERO,
            cast_shadows: true,
        });
        for i in 0..40 {
            scene.spawn_point_light(
                format!("light_{}", i),
                PointLight::new(Color::WHITE, 2.0, 10.0),
                Transform::from_position(Vec3::new(i as f32, 7.0, 0.0)),
            );
        }

        let frame = FrameUniforms::new(&scene, &PerspectiveCamera::new());
        assert_eq!(frame.fog, [1.0, 1.0, 1.0, 0.02]);
        assert_eq!(frame.dir_direction, [0.0, -1.0, 0.0, 1.0]);
        assert_eq!(frame.spot_color[3], 0.0);
        assert_eq!(frame.point_count[0], MAX_POINT_LIGHTS as u32);
        assert_eq!(frame.points[0].color_decay, [2.0, 2.0, 2.0, 2.0]);
        assert_eq!(frame.points[0].position_range[3], 10.0);
    }

    #[test]
    fn draw_flags_follow_material() {
        let item = DrawItem {
            entity: hecs::World::new().spawn(()),
            mesh: MeshId(0),
            material: Material::standard(Color::RED).without_fog(),
            model: Mat4::from_scale(Vec3::ZERO),
        };
        let uniforms = DrawUniforms::new(&item);
        assert_eq!(uniforms.flags, [1, 0, 0, 0]);
        assert_eq!(uniforms.color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(uniforms.normal_matrix, Mat4::IDENTITY.to_cols_array_2d());
    }
}
