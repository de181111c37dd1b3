//! マンデルブロ集合リアルタイム探索 (GPU版)
//! wgpu + WGSL フラグメントシェーダーで全ピクセルを描画する
//!
//! 操作方法:
//!   - 左クリック長押し: ポインタ位置へ向かってズームイン
//!   - R キー: 初期表示にリセット
//!   - Q / Escape キー: 終了

use std::sync::Arc;
use std::time::Instant;

use mandelbrot_explorer::common::{
    config::ExplorerConfig,
    error::{ConfigError, RenderError},
};
use mandelbrot_explorer::driver::{fps_label, FrameDriver, FrameHost};
use mandelbrot_explorer::render::gpu::GpuRenderer;
use mandelbrot_explorer::view::ViewState;
use winit::{
    dpi::PhysicalSize,
    error::{EventLoopError, OsError},
    event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowBuilder},
};

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("event loop error: {0}")]
    EventLoop(#[from] EventLoopError),
    #[error("window error: {0}")]
    Window(#[from] OsError),
}

/// 次フレームの予約を `request_redraw` に、FPS 表示をタイトルに対応させるホスト
struct WindowHost {
    window: Arc<Window>,
}

impl FrameHost for WindowHost {
    fn publish_fps(&mut self, frames_per_second: f64, view: &ViewState) {
        self.window.set_title(&format!(
            "マンデルブロ集合 [GPU] x{:.2e} - {} fps",
            view.zoom,
            fps_label(frames_per_second)
        ));
    }

    fn schedule_next_tick(&mut self) {
        self.window.request_redraw();
    }
}

fn main() -> Result<(), AppError> {
    env_logger::init();

    let config = ExplorerConfig::from_env(ExplorerConfig::gpu())?;
    let size = config.surface;

    log::info!("マンデルブロ集合 (GPU版) {}x{}", size.width, size.height);
    log::info!("設定: {config:?}");
    println!("操作方法:");
    println!("  - 左クリック長押し: ズームイン");
    println!("  - R キー: 初期表示にリセット");
    println!("  - Q / Escape キー: 終了");

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("マンデルブロ集合 (GPU版)")
            .with_inner_size(PhysicalSize::new(size.width, size.height))
            .with_resizable(false)
            .build(&event_loop)?,
    );

    // シェーダーのビルドに失敗したらここで終了する（再試行しない）
    let mut renderer = match GpuRenderer::new(window.clone(), size, &config.escape) {
        Ok(renderer) => renderer,
        Err(error) => {
            log::error!("GPU バックエンドを初期化できません: {error}");
            return Err(error.into());
        }
    };
    log::info!("GPU 初期化完了: {}", renderer.adapter_name());

    let (mut driver, pointer) = FrameDriver::new(&config);
    let mut host = WindowHost {
        window: window.clone(),
    };
    let mut failure: Option<RenderError> = None;
    let mut cursor = (0.0, 0.0);
    let start = Instant::now();

    window.request_redraw();

    event_loop.run(|event, elwt| {
        let Event::WindowEvent { event, .. } = event else {
            return;
        };
        match event {
            WindowEvent::CloseRequested => elwt.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => match key {
                KeyCode::Escape | KeyCode::KeyQ => elwt.exit(),
                KeyCode::KeyR => driver.reset_view(),
                _ => {}
            },
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => pointer.down(cursor.0, cursor.1),
                ElementState::Released => pointer.up(),
            },
            WindowEvent::CursorMoved { position, .. } => {
                cursor = (position.x, position.y);
                pointer.moved(position.x, position.y);
            }
            WindowEvent::CursorLeft { .. } => pointer.leave(),
            WindowEvent::Focused(false) => pointer.up(),
            WindowEvent::RedrawRequested => {
                let timestamp_ms = start.elapsed().as_secs_f64() * 1000.0;
                match driver.tick(timestamp_ms, &mut renderer, &mut host) {
                    Ok(report) => {
                        log::debug!(
                            "フレーム {}: {} fps",
                            report.frame,
                            fps_label(report.frames_per_second)
                        );
                    }
                    Err(error) => {
                        log::error!("描画に失敗しました: {error}");
                        failure = Some(error);
                        elwt.exit();
                    }
                }
            }
            _ => {}
        }
    })?;

    log::info!("終了しました");
    match failure {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}
