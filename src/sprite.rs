use crate::frame::SpriteRect;
use crate::WGPU;
use std::borrow::Cow;
use std::rc::Rc;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Zeroable, bytemuck::Pod)]
pub struct GPUSprite {
    pub screen_region: [f32; 4], // x, y, width, height in screen units
    pub sheet_region: [f32; 4],  // normalized part of the texture to sample
}

impl From<SpriteRect> for GPUSprite {
    /// The whole texture stretched over `rect`.
    fn from(rect: SpriteRect) -> Self {
        Self {
            screen_region: [
                rect.x as f32,
                rect.y as f32,
                rect.width as f32,
                rect.height as f32,
            ],
            sheet_region: [0.0, 0.0, 1.0, 1.0],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Zeroable, bytemuck::Pod)]
pub struct GPUCamera {
    pub screen_pos: [f32; 2],  // top-left corner of the visible area
    pub screen_size: [f32; 2], // visible area in screen units
}

impl GPUCamera {
    pub fn screen(width: u32, height: u32) -> Self {
        Self {
            screen_pos: [0.0, 0.0],
            screen_size: [width as f32, height as f32],
        }
    }
}

/// One queued sprite and the texture it samples from.
pub struct SpriteDraw {
    pub texture: Rc<wgpu::BindGroup>,
    pub sprite: GPUSprite,
}

const INITIAL_CAPACITY: usize = 4;

/// Draws textured quads. Sprite rectangles go into a storage buffer and the
/// vertex shader builds six vertices per instance from them.
pub struct SpriteRender {
    pipeline: wgpu::RenderPipeline,
    sprite_bind_group_layout: wgpu::BindGroupLayout,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    buffer_camera: wgpu::Buffer,
    buffer_sprite: wgpu::Buffer,
    capacity: usize,
    sprite_bind_group: wgpu::BindGroup,
    staging: Vec<GPUSprite>,
}

impl SpriteRender {
    pub fn new(gpu: &WGPU, camera: GPUCamera) -> Self {
        let shader = gpu
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("sprite shader"),
                source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shader.wgsl"))),
            });

        let texture_bind_group_layout =
            gpu.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: None,
                    entries: &[
                        // The texture, matches @group(1) @binding(0)
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
                        // Its sampler
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                            count: None,
                        },
                    ],
                });

        let sprite_bind_group_layout =
            gpu.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: None,
                    entries: &[
                        // The camera uniform
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::VERTEX,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                        // The sprite storage buffer
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::VERTEX,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Storage { read_only: true },
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                    ],
                });

        let pipeline_layout = gpu
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: None,
                bind_group_layouts: &[&sprite_bind_group_layout, &texture_bind_group_layout],
                push_constant_ranges: &[],
            });

        let pipeline = gpu
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("sprite pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: "vs_main",
                    buffers: &[],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.config.format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            });

        // Nearest filtering keeps texels crisp at integer scales.
        let sampler = gpu
            .device
            .create_sampler(&wgpu::SamplerDescriptor::default());

        let buffer_camera = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("camera"),
            size: std::mem::size_of::<GPUCamera>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        gpu.queue
            .write_buffer(&buffer_camera, 0, bytemuck::bytes_of(&camera));

        let buffer_sprite = create_sprite_buffer(gpu, INITIAL_CAPACITY);
        let sprite_bind_group = create_sprite_bind_group(
            gpu,
            &sprite_bind_group_layout,
            &buffer_camera,
            &buffer_sprite,
        );

        Self {
            pipeline,
            sprite_bind_group_layout,
            texture_bind_group_layout,
            sampler,
            buffer_camera,
            buffer_sprite,
            capacity: INITIAL_CAPACITY,
            sprite_bind_group,
            staging: Vec::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Bind group for sampling `tex` in the fragment shader.
    pub fn texture_bind_group(&self, gpu: &WGPU, tex: &wgpu::Texture) -> wgpu::BindGroup {
        let view = tex.create_view(&wgpu::TextureViewDescriptor::default());
        gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout: &self.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    /// Copy this frame's sprites to the GPU, growing the buffer if needed.
    pub fn upload(&mut self, gpu: &WGPU, draws: &[SpriteDraw]) {
        if draws.is_empty() {
            return;
        }
        if draws.len() > self.capacity {
            self.capacity = draws.len().next_power_of_two();
            log::debug!("growing sprite buffer to {} sprites", self.capacity);
            self.buffer_sprite = create_sprite_buffer(gpu, self.capacity);
            self.sprite_bind_group = create_sprite_bind_group(
                gpu,
                &self.sprite_bind_group_layout,
                &self.buffer_camera,
                &self.buffer_sprite,
            );
        }
        self.staging.clear();
        self.staging.extend(draws.iter().map(|draw| draw.sprite));
        gpu.queue
            .write_buffer(&self.buffer_sprite, 0, bytemuck::cast_slice(&self.staging));
    }

    /// Record one instanced draw per sprite, in upload order.
    pub fn render<'s, 'pass>(&'s self, rpass: &mut wgpu::RenderPass<'pass>, draws: &'s [SpriteDraw])
    where
        's: 'pass,
    {
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.sprite_bind_group, &[]);
        for (index, draw) in draws.iter().enumerate() {
            let index = index as u32;
            rpass.set_bind_group(1, &draw.texture, &[]);
            rpass.draw(0..6, index..index + 1);
        }
    }
}

fn create_sprite_buffer(gpu: &WGPU, capacity: usize) -> wgpu::Buffer {
    gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("sprites"),
        size: (capacity * std::mem::size_of::<GPUSprite>()) as u64,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_sprite_bind_group(
    gpu: &WGPU,
    layout: &wgpu::BindGroupLayout,
    buffer_camera: &wgpu::Buffer,
    buffer_sprite: &wgpu::Buffer,
) -> wgpu::BindGroup {
    gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: None,
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer_camera.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: buffer_sprite.as_entire_binding(),
            },
        ],
    })
}
