use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::coords::{ColorRgba, Mat4, Vec2};
use crate::render::{RenderCtx, RenderTarget, Texture};

/// Index pattern for one quad (two CCW triangles over BL, BR, TR, TL).
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

const VERTICES_PER_QUAD: usize = 4;

/// Quad corner: position, tint and texture coordinates.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SpriteVertex {
    pub position: Vec2,
    pub color: [f32; 4],
    pub tex_coords: [f32; 2],
}

impl SpriteVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x2, // position
        1 => Float32x4, // color
        2 => Float32x2  // tex_coords
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }

    /// Unit quad centered on the origin, scaled so a texture with
    /// `texture_aspect` keeps its proportions on a viewport with `viewport_aspect`.
    ///
    /// `scale` is the quad height in normalized device units.
    pub fn quad(texture_aspect: f32, viewport_aspect: f32, scale: f32) -> [SpriteVertex; 4] {
        let sx = texture_aspect / viewport_aspect * scale;
        let sy = scale;
        let white = ColorRgba::white().to_array();

        let corner = |x: f32, y: f32, u: f32, v: f32| SpriteVertex {
            position: Vec2::new(x * sx, y * sy),
            color: white,
            tex_coords: [u, v],
        };

        [
            corner(-0.5, -0.5, 0.0, 1.0), // bottom-left
            corner(0.5, -0.5, 1.0, 1.0),  // bottom-right
            corner(0.5, 0.5, 1.0, 0.0),   // top-right
            corner(-0.5, 0.5, 0.0, 0.0),  // top-left
        ]
    }
}

/// Per-sprite offset added to every corner of the selected quad.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct SpriteInstance {
    pub position: Vec2,
}

impl SpriteInstance {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![
        3 => Float32x2 // position
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

/// Instanced sprite renderer.
///
/// Holds one quad per texture in a shared vertex buffer. Each frame draws every
/// instance with the quad of the bound texture, using a single indexed
/// indirect draw whose `base_vertex` selects the quad.
#[derive(Default)]
pub struct SpriteRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    projection_ubo: Option<wgpu::Buffer>,
    sampler: Option<wgpu::Sampler>,
    texture_view: Option<wgpu::TextureView>,

    quad_vbo: Option<wgpu::Buffer>,
    quad_ibo: Option<wgpu::Buffer>,
    quad_count: u32,

    instance_vbo: Option<wgpu::Buffer>,
    instance_capacity: usize,

    indirect_buffer: Option<wgpu::Buffer>,
    /// `(instance_count, quad)` last written to the indirect buffer.
    indirect_state: Option<(u32, u32)>,

    warned_bad_quad: bool,
}

impl SpriteRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of quads uploaded with [`SpriteRenderer::upload_quads`].
    #[inline]
    pub fn quad_count(&self) -> u32 {
        self.quad_count
    }

    /// Replaces the quad vertex buffer. `vertices` holds four corners per quad.
    pub fn upload_quads(&mut self, ctx: &RenderCtx<'_>, vertices: &[SpriteVertex]) {
        debug_assert_eq!(vertices.len() % VERTICES_PER_QUAD, 0);

        self.quad_vbo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("swarm sprite quad vbo"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        }));
        self.quad_count = (vertices.len() / VERTICES_PER_QUAD) as u32;
        log::debug!("sprite quads uploaded: {}", self.quad_count);
    }

    /// Binds `texture` for subsequent draws.
    pub fn set_texture(&mut self, texture: &Texture) {
        self.texture_view = Some(texture.view().clone());
        self.bind_group = None;
    }

    /// Draws `instances` with quad `quad` over the current contents of `target`.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        instances: &[SpriteInstance],
        quad: u32,
        projection: &Mat4,
    ) {
        if instances.is_empty() {
            return;
        }
        if quad >= self.quad_count {
            if !self.warned_bad_quad {
                log::warn!(
                    "SpriteRenderer: quad {quad} out of range ({} uploaded); skipped",
                    self.quad_count
                );
                self.warned_bad_quad = true;
            }
            return;
        }

        self.ensure_pipeline(ctx);
        self.ensure_static_buffers(ctx);
        self.ensure_bindings(ctx);

        // Mutating methods must happen before borrowing pipeline/buffers immutably.
        self.write_projection(ctx, projection);
        self.ensure_instance_capacity(ctx, instances.len());
        self.write_indirect(ctx, instances.len() as u32, quad);

        let Some(instance_vbo) = self.instance_vbo.as_ref() else { return };
        ctx.queue
            .write_buffer(instance_vbo, 0, bytemuck::cast_slice(instances));

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(bind_group) = self.bind_group.as_ref() else { return };
        let Some(quad_vbo) = self.quad_vbo.as_ref() else { return };
        let Some(quad_ibo) = self.quad_ibo.as_ref() else { return };
        let Some(indirect) = self.indirect_buffer.as_ref() else { return };

        let mut rpass = target.begin_pass("swarm sprite pass", None);

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(0, quad_vbo.slice(..));
        rpass.set_vertex_buffer(1, instance_vbo.slice(..));
        rpass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed_indirect(indirect, 0);
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        let shader_src = include_str!("shaders/sprite.wgsl");
        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("swarm sprite shader"),
            source: wgpu::ShaderSource::Wgsl(shader_src.into()),
        });

        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("swarm sprite bgl"),
                    entries: &[
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::VERTEX,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: wgpu::BufferSize::new(
                                    std::mem::size_of::<Mat4>() as u64,
                                ),
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                                view_dimension: wgpu::TextureViewDimension::D2,
                                multisampled: false,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 2,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                            count: None,
                        },
                    ],
                });

        let pipeline_layout =
            ctx.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("swarm sprite pipeline layout"),
                    bind_group_layouts: &[&bind_group_layout],
                    immediate_size: 0,
                });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("swarm sprite pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[SpriteVertex::layout(), SpriteInstance::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("sprite pipeline built for {:?}", ctx.surface_format);

        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);

        self.bind_group = None;
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.bind_group.is_some() {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };
        let Some(view) = self.texture_view.as_ref() else { return };

        let projection_ubo = self.projection_ubo.get_or_insert_with(|| {
            ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("swarm sprite projection ubo"),
                size: std::mem::size_of::<Mat4>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });

        let sampler = self.sampler.get_or_insert_with(|| {
            ctx.device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("swarm sprite sampler"),
                address_mode_u: wgpu::AddressMode::Repeat,
                address_mode_v: wgpu::AddressMode::Repeat,
                address_mode_w: wgpu::AddressMode::Repeat,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                mipmap_filter: wgpu::MipmapFilterMode::Linear,
                ..Default::default()
            })
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("swarm sprite bind group"),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: projection_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        self.bind_group = Some(bind_group);
    }

    fn ensure_static_buffers(&mut self, ctx: &RenderCtx<'_>) {
        if self.quad_ibo.is_none() {
            self.quad_ibo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("swarm sprite quad ibo"),
                contents: bytemuck::cast_slice(&QUAD_INDICES),
                usage: wgpu::BufferUsages::INDEX,
            }));
        }

        if self.indirect_buffer.is_none() {
            self.indirect_buffer = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("swarm sprite indirect"),
                size: std::mem::size_of::<wgpu::util::DrawIndexedIndirectArgs>() as u64,
                usage: wgpu::BufferUsages::INDIRECT | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.indirect_state = None;
        }
    }

    fn write_projection(&mut self, ctx: &RenderCtx<'_>, projection: &Mat4) {
        let Some(ubo) = self.projection_ubo.as_ref() else { return };
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(projection));
    }

    fn write_indirect(&mut self, ctx: &RenderCtx<'_>, instance_count: u32, quad: u32) {
        if self.indirect_state == Some((instance_count, quad)) {
            return;
        }
        let Some(buffer) = self.indirect_buffer.as_ref() else { return };

        let args = draw_args(instance_count, quad);
        ctx.queue.write_buffer(buffer, 0, args.as_bytes());
        self.indirect_state = Some((instance_count, quad));
    }

    fn ensure_instance_capacity(&mut self, ctx: &RenderCtx<'_>, required_instances: usize) {
        if required_instances <= self.instance_capacity && self.instance_vbo.is_some() {
            return;
        }

        let new_cap = required_instances.next_power_of_two().max(64);
        let new_size = (new_cap * std::mem::size_of::<SpriteInstance>()) as u64;

        self.instance_vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("swarm sprite instance vbo"),
            size: new_size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.instance_capacity = new_cap;
        log::debug!("sprite instance buffer grown to {new_cap}");
    }
}

fn draw_args(instance_count: u32, quad: u32) -> wgpu::util::DrawIndexedIndirectArgs {
    wgpu::util::DrawIndexedIndirectArgs {
        index_count: QUAD_INDICES.len() as u32,
        instance_count,
        first_index: 0,
        base_vertex: (quad as usize * VERTICES_PER_QUAD) as i32,
        first_instance: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_keeps_texture_proportions() {
        // 2:1 texture on a 16:9 viewport.
        let q = SpriteVertex::quad(2.0, 16.0 / 9.0, 0.4);
        let width = q[1].position.x - q[0].position.x;
        let height = q[3].position.y - q[0].position.y;

        assert!((height - 0.4).abs() < 1e-6);
        assert!((width - 2.0 / (16.0 / 9.0) * 0.4).abs() < 1e-6);
    }

    #[test]
    fn quad_corners_are_counter_clockwise() {
        let q = SpriteVertex::quad(1.0, 1.0, 1.0);
        let p = |i: usize| q[QUAD_INDICES[i] as usize].position;

        for tri in [[0, 1, 2], [3, 4, 5]] {
            let (a, b, c) = (p(tri[0]), p(tri[1]), p(tri[2]));
            let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
            assert!(cross > 0.0);
        }
    }

    #[test]
    fn quad_maps_image_top_to_quad_top() {
        let q = SpriteVertex::quad(1.0, 1.0, 1.0);
        assert_eq!(q[3].tex_coords, [0.0, 0.0]);
        assert_eq!(q[0].tex_coords, [0.0, 1.0]);
    }

    #[test]
    fn draw_args_select_quad_by_base_vertex() {
        let args = draw_args(500_000, 2);
        assert_eq!(args.index_count, 6);
        assert_eq!(args.instance_count, 500_000);
        assert_eq!(args.base_vertex, 8);
        assert_eq!(args.first_index, 0);
        assert_eq!(args.first_instance, 0);
    }

    #[test]
    fn vertex_layout_matches_struct() {
        assert_eq!(std::mem::size_of::<SpriteVertex>(), 32);
        assert_eq!(std::mem::size_of::<SpriteInstance>(), 8);
    }
}
