// renderer.rs — wgpu backend for the panoramic scene
//
// One indexed sphere drawn from the inside with a per-frame camera uniform,
// followed by the egui overlay in a second pass on the same surface texture.

use std::sync::Arc;

use egui::epaint::ImageDelta;
use glam::Mat4;
use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::error::RenderError;
use crate::media::VideoFrame;
use crate::mesh::SphereMesh;
use crate::scene::RenderBackend;

const CLEAR_COLOR: wgpu::Color = wgpu::Color::BLACK;
const VIDEO_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 3],
    uv: [f32; 2],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

pub struct SphereGeometry {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl Drop for SphereGeometry {
    fn drop(&mut self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }
}

pub struct VideoTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: (u32, u32),
}

impl Drop for VideoTexture {
    fn drop(&mut self) {
        self.texture.destroy();
    }
}

pub struct VideoMaterial {
    bind_group: wgpu::BindGroup,
}

/// Tessellated egui output waiting to be drawn over the next frame.
pub struct OverlayFrame {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

/// egui output between UI passes and the next drawn frame. Only the newest
/// frame's shapes are kept; texture frees accumulate until a frame is drawn.
#[derive(Default)]
struct OverlayQueue {
    frame: Option<OverlayFrame>,
    free: Vec<egui::TextureId>,
}

impl OverlayQueue {
    /// Replaces the pending frame and returns the uploads it carried.
    fn push(&mut self, mut frame: OverlayFrame) -> Vec<(egui::TextureId, ImageDelta)> {
        self.free.append(&mut frame.textures_delta.free);
        let uploads = std::mem::take(&mut frame.textures_delta.set);
        self.frame = Some(frame);
        uploads
    }

    /// The frame to draw and the textures to free once it is recorded.
    fn take(&mut self) -> Option<(OverlayFrame, Vec<egui::TextureId>)> {
        let frame = self.frame.take()?;
        Some((frame, std::mem::take(&mut self.free)))
    }
}

pub struct WgpuBackend {
    // Dropped before `window`: the surface must not outlive it.
    surface: Option<wgpu::Surface>,
    window: Arc<Window>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    material_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    egui_renderer: egui_wgpu::Renderer,
    overlay: OverlayQueue,
    max_texture_dimension: u32,
}

impl WgpuBackend {
    pub async fn new(window: Arc<Window>) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // SAFETY: the window is kept alive by `self.window` for as long as
        // the surface exists.
        let surface = unsafe { instance.create_surface(window.as_ref()) }?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;
        log::info!("using graphics adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    features: wgpu::Features::empty(),
                    limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    label: None,
                },
                None,
            )
            .await?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or(RenderError::NoAdapter)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera_buffer"),
            contents: bytemuck::cast_slice(&[CameraUniform {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("camera_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera_bind_group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("video_material_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
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

        // Wrap horizontally across the seam, clamp at the poles.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("video_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let shader = device.create_shader_module(wgpu::include_wgsl!("sphere.wgsl"));
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sphere_pipeline_layout"),
            bind_group_layouts: &[&camera_layout, &material_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sphere_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[Vertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Only the inside of the sphere faces the camera.
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        let egui_renderer = egui_wgpu::Renderer::new(&device, config.format, None, 1);
        let max_texture_dimension = device.limits().max_texture_dimension_2d;

        Ok(Self {
            surface: Some(surface),
            window,
            device,
            queue,
            config,
            pipeline,
            camera_buffer,
            camera_bind_group,
            material_layout,
            sampler,
            egui_renderer,
            overlay: OverlayQueue::default(),
            max_texture_dimension,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Queues egui output to be composited over the next rendered frame.
    pub fn set_overlay(&mut self, overlay: OverlayFrame) {
        // egui sends each atlas patch once; it must land even if this frame
        // is never drawn.
        for (id, delta) in self.overlay.push(overlay) {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, id, &delta);
        }
    }

    fn allocate_texture(&self, width: u32, height: u32, pixels: &[u8]) -> VideoTexture {
        let extent = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("video_texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: VIDEO_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let video = VideoTexture {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            texture,
            size: (width, height),
        };
        self.write_pixels(&video, pixels);
        video
    }

    fn write_pixels(&self, texture: &VideoTexture, pixels: &[u8]) {
        let (width, height) = texture.size;
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Scales frames that exceed the GPU texture limit down to fit.
    fn fit_to_limits<'a>(&self, image: &'a RgbaImage) -> std::borrow::Cow<'a, RgbaImage> {
        let (width, height) = image.dimensions();
        let max = self.max_texture_dimension;
        if width <= max && height <= max {
            return std::borrow::Cow::Borrowed(image);
        }
        let scale = max as f32 / width.max(height) as f32;
        let (new_w, new_h) = (
            ((width as f32 * scale) as u32).max(1),
            ((height as f32 * scale) as u32).max(1),
        );
        log::warn!("video frame {width}x{height} exceeds GPU limit {max}, scaling to {new_w}x{new_h}");
        std::borrow::Cow::Owned(
            DynamicImage::ImageRgba8(image.clone())
                .resize_exact(new_w, new_h, FilterType::Triangle)
                .to_rgba8(),
        )
    }

    fn draw_overlay(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
    ) -> Vec<wgpu::CommandBuffer> {
        let Some((overlay, free)) = self.overlay.take() else {
            return Vec::new();
        };
        let screen = egui_wgpu::renderer::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: overlay.pixels_per_point,
        };

        let extra = self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            encoder,
            &overlay.primitives,
            &screen,
        );

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("overlay_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });
            self.egui_renderer
                .render(&mut pass, &overlay.primitives, &screen);
        }

        for id in &free {
            self.egui_renderer.free_texture(id);
        }
        extra
    }
}

impl RenderBackend for WgpuBackend {
    type Geometry = SphereGeometry;
    type Texture = VideoTexture;
    type Material = VideoMaterial;

    fn create_geometry(&mut self, mesh: &SphereMesh) -> Result<SphereGeometry, RenderError> {
        let vertices: Vec<Vertex> = mesh
            .positions
            .iter()
            .zip(&mesh.uvs)
            .map(|(&position, &uv)| Vertex { position, uv })
            .collect();

        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("sphere_vertices"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("sphere_indices"),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        Ok(SphereGeometry {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        })
    }

    fn create_video_texture(&mut self) -> Result<VideoTexture, RenderError> {
        // 1x1 black until the first decoded frame arrives.
        Ok(self.allocate_texture(1, 1, &[0, 0, 0, 255]))
    }

    fn create_material(&mut self, texture: &VideoTexture) -> Result<VideoMaterial, RenderError> {
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("video_material"),
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        Ok(VideoMaterial { bind_group })
    }

    fn upload_frame(
        &mut self,
        texture: &mut VideoTexture,
        material: &mut VideoMaterial,
        frame: &VideoFrame,
    ) -> Result<(), RenderError> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidFrame(format!(
                "empty frame at {:.3}s",
                frame.timestamp
            )));
        }

        let image = self.fit_to_limits(&frame.image);
        let (width, height) = image.dimensions();
        if texture.size == (width, height) {
            self.write_pixels(texture, image.as_raw());
            return Ok(());
        }

        log::debug!("video texture resized to {width}x{height}");
        let replacement = self.allocate_texture(width, height, image.as_raw());
        *texture = replacement;
        *material = self.create_material(texture)?;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        if let Some(surface) = &self.surface {
            surface.configure(&self.device, &self.config);
        }
    }

    fn render(
        &mut self,
        geometry: &SphereGeometry,
        material: &VideoMaterial,
        view_projection: Mat4,
    ) -> Result<(), RenderError> {
        let Some(surface) = &self.surface else {
            return Err(RenderError::Detached);
        };

        let output = match surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface timed out, skipping frame");
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::OutOfMemory),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[CameraUniform {
                view_proj: view_projection.to_cols_array_2d(),
            }]),
        );

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sphere_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.camera_bind_group, &[]);
            pass.set_bind_group(1, &material.bind_group, &[]);
            pass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
            pass.set_index_buffer(geometry.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..geometry.index_count, 0, 0..1);
        }

        let extra = self.draw_overlay(&mut encoder, &view);
        self.queue
            .submit(extra.into_iter().chain(std::iter::once(encoder.finish())));
        output.present();
        Ok(())
    }

    fn detach(&mut self) {
        if self.surface.take().is_some() {
            log::debug!("renderer detached from window");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay(pixels_per_point: f32, set: &[u64], free: &[u64]) -> OverlayFrame {
        let image = egui::ColorImage::new([1, 1], egui::Color32::WHITE);
        OverlayFrame {
            primitives: Vec::new(),
            textures_delta: egui::TexturesDelta {
                set: set
                    .iter()
                    .map(|id| {
                        (
                            egui::TextureId::Managed(*id),
                            ImageDelta::full(image.clone(), egui::TextureOptions::LINEAR),
                        )
                    })
                    .collect(),
                free: free.iter().map(|id| egui::TextureId::Managed(*id)).collect(),
            },
            pixels_per_point,
        }
    }

    #[test]
    fn uploads_are_handed_out_when_queued() {
        let mut queue = OverlayQueue::default();
        let uploads = queue.push(overlay(1.0, &[0, 1], &[]));
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0].0, egui::TextureId::Managed(0));

        let (frame, _) = queue.take().unwrap();
        assert!(frame.textures_delta.set.is_empty());
    }

    #[test]
    fn skipped_frames_keep_their_frees() {
        let mut queue = OverlayQueue::default();
        assert!(queue.push(overlay(1.0, &[], &[3])).is_empty());
        queue.push(overlay(1.5, &[], &[4]));
        queue.push(overlay(2.0, &[], &[]));

        let (frame, free) = queue.take().unwrap();
        assert_eq!(frame.pixels_per_point, 2.0);
        assert_eq!(
            free,
            vec![egui::TextureId::Managed(3), egui::TextureId::Managed(4)]
        );
        assert!(queue.take().is_none());
    }
}
