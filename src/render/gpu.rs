//! GPU バックエンド（wgpu + WGSL フラグメントシェーダー）
//!
//! ホスト側はユニフォームを書き込んで描画コマンドを 1 回発行するだけで、
//! ピクセル毎の計算はすべてシェーダーで行う。

use bytemuck::{Pod, Zeroable};

use super::{RenderBackend, SurfaceSize};
use crate::common::constants::MAX_ITER;
use crate::common::error::RenderError;
use crate::common::mandelbrot::EscapeParams;
use crate::view::ViewState;

const SHADER_TEMPLATE: &str = include_str!("mandelbrot.wgsl");

/// 画面全体を覆う 2 枚の三角形の頂点数
const FULL_SURFACE_VERTICES: u32 = 6;

/// シェーダーに渡すユニフォーム（WGSL の `ViewUniforms` と同じ並び）
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ViewUniforms {
    pub width: f32,
    pub height: f32,
    pub zoom: f32,
    pub center_x: f32,
    pub center_y: f32,
    _padding: [f32; 3],
}

impl ViewUniforms {
    pub fn new(size: SurfaceSize, view: &ViewState) -> Self {
        Self {
            width: size.width as f32,
            height: size.height as f32,
            zoom: view.zoom as f32,
            center_x: view.center.x as f32,
            center_y: view.center.y as f32,
            _padding: [0.0; 3],
        }
    }
}

/// 定数を埋め込んだ WGSL ソースを生成
pub fn shader_source(escape: &EscapeParams) -> String {
    SHADER_TEMPLATE
        .replace("{{MAX_ITER}}", &MAX_ITER.to_string())
        .replace(
            "{{NORMALIZATION_DIVISOR}}",
            &wgsl_float(escape.normalization_divisor),
        )
        .replace("{{THRESHOLD_SCALE}}", &wgsl_float(escape.threshold_scale))
}

/// WGSL の f32 リテラル（整数値でも小数点を付ける）
fn wgsl_float(value: f64) -> String {
    let value = value as f32;
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// GPU コンテキスト
pub struct GpuRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    params_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    size: SurfaceSize,
    adapter_name: String,
}

impl GpuRenderer {
    /// ウィンドウ等の描画先からサーフェスとパイプラインを作る
    ///
    /// シェーダーやパイプラインの検証エラーは `RenderError::ShaderCompilation` になる。
    pub fn new<T>(target: T, size: SurfaceSize, escape: &EscapeParams) -> Result<Self, RenderError>
    where
        T: Into<wgpu::SurfaceTarget<'static>>,
    {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(target)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(RenderError::AdapterUnavailable)?;

        let adapter_name = adapter.get_info().name;
        log::info!("GPU: {adapter_name}");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Mandelbrot Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        ))?;

        // sRGB だと配色がガンマ補正されるので線形フォーマットを優先
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or(RenderError::UnsupportedSurface)?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("View Uniforms"),
            size: std::mem::size_of::<ViewUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        // シェーダーのコンパイルとパイプライン生成の失敗をここで捕まえる
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mandelbrot Shader"),
            source: wgpu::ShaderSource::Wgsl(shader_source(escape).into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mandelbrot Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::ShaderCompilation(error.to_string()));
        }

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            params_buffer,
            bind_group,
            size,
            adapter_name,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }
}

impl RenderBackend for GpuRenderer {
    fn render(&mut self, view: &ViewState) -> Result<(), RenderError> {
        let uniforms = ViewUniforms::new(self.size, view);
        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&uniforms));

        let output = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(error @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                log::warn!("サーフェスを再設定: {error}");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("フレーム取得がタイムアウト、このフレームはスキップ");
                return Ok(());
            }
            Err(error) => return Err(error.into()),
        };
        let target = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Mandelbrot Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..FULL_SURFACE_VERTICES, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "gpu"
    }
}
