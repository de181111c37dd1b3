//! マンデルブロ集合リアルタイム探索 (CPU版)
//!
//! 全ピクセルを CPU (Rayon 並列) で計算し、minifb のウィンドウに表示する。
//!
//! 操作方法:
//!   - 左クリック長押し: ポインタ位置へ向かってズームイン
//!   - R キー: 初期表示にリセット
//!   - Q / Escape キー: 終了

use std::time::Instant;

use mandelbrot_explorer::common::{
    colors::rgba_to_u32,
    config::ExplorerConfig,
    constants::TARGET_FPS,
    error::{ConfigError, RenderError},
    font::draw_text,
};
use mandelbrot_explorer::driver::{fps_label, FrameDriver, FrameHost};
use mandelbrot_explorer::pointer::PointerSender;
use mandelbrot_explorer::render::cpu::CpuRasterizer;
use mandelbrot_explorer::view::ViewState;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

const FPS_LABEL_COLOR: u32 = 0xFFFFFF;
const FPS_LABEL_MARGIN: usize = 8;

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("window error: {0}")]
    Window(#[from] minifb::Error),
}

/// minifb のループに次フレームを要求し、FPS 表示文字列を保持するホスト
struct WindowHost {
    tick_requested: bool,
    fps_label: String,
}

impl WindowHost {
    fn new() -> Self {
        Self {
            // 最初のフレームは無条件に描く
            tick_requested: true,
            fps_label: fps_label(0.0),
        }
    }

    fn take_tick_request(&mut self) -> bool {
        std::mem::take(&mut self.tick_requested)
    }
}

impl FrameHost for WindowHost {
    fn publish_fps(&mut self, frames_per_second: f64, _view: &ViewState) {
        self.fps_label = fps_label(frames_per_second);
    }

    fn schedule_next_tick(&mut self) {
        self.tick_requested = true;
    }
}

/// minifb のポーリング結果をポインタイベントに変換する
#[derive(Default)]
struct MouseTracker {
    inside: bool,
    left_down: bool,
    /// ボタンを押したままウィンドウ外へ出た（離すまで押下とみなさない）
    held_on_leave: bool,
    last_pos: Option<(f32, f32)>,
}

impl MouseTracker {
    fn poll(&mut self, window: &Window, pointer: &PointerSender) {
        let pos = window.get_mouse_pos(MouseMode::Discard);
        let left_down = pos.is_some() && window.get_mouse_down(MouseButton::Left);
        self.observe(pos, left_down, pointer);
    }

    fn observe(&mut self, pos: Option<(f32, f32)>, left_down: bool, pointer: &PointerSender) {
        let Some((mx, my)) = pos else {
            if self.inside {
                pointer.leave();
                self.inside = false;
                self.held_on_leave = self.left_down;
                self.left_down = false;
                self.last_pos = None;
            }
            return;
        };
        self.inside = true;

        let (x, y) = (f64::from(mx), f64::from(my));
        if self.last_pos != Some((mx, my)) {
            pointer.moved(x, y);
            self.last_pos = Some((mx, my));
        }

        if !left_down {
            self.held_on_leave = false;
        }
        if self.held_on_leave {
            return;
        }
        if left_down && !self.left_down {
            pointer.down(x, y);
        } else if !left_down && self.left_down {
            pointer.up();
        }
        self.left_down = left_down;
    }
}

fn main() -> Result<(), AppError> {
    env_logger::init();

    let config = ExplorerConfig::from_env(ExplorerConfig::cpu())?;
    let width = config.surface.width as usize;
    let height = config.surface.height as usize;

    log::info!("マンデルブロ集合 (CPU版) {width}x{height}");
    log::info!("設定: {config:?}");
    println!("操作方法:");
    println!("  - 左クリック長押し: ズームイン");
    println!("  - R キー: 初期表示にリセット");
    println!("  - Q / Escape キー: 終了");

    let mut window = Window::new(
        "マンデルブロ集合 (CPU版)",
        width,
        height,
        WindowOptions {
            resize: false,
            ..WindowOptions::default()
        },
    )?;
    window.set_target_fps(TARGET_FPS);

    let mut rasterizer = CpuRasterizer::new(config.surface, config.escape)
        .with_precision(config.precision)
        .with_rows(config.row_strategy);
    let (mut driver, pointer) = FrameDriver::new(&config);
    let mut host = WindowHost::new();
    let mut mouse = MouseTracker::default();
    let mut frame_buffer = vec![0u32; width * height];

    let start = Instant::now();

    // ウィンドウを閉じると次フレームの予約が止まる
    while window.is_open() && !window.is_key_down(Key::Escape) && !window.is_key_down(Key::Q) {
        if !host.take_tick_request() {
            break;
        }

        if window.is_key_pressed(Key::R, KeyRepeat::No) {
            driver.reset_view();
        }
        mouse.poll(&window, &pointer);

        let frame_start = Instant::now();
        let timestamp_ms = start.elapsed().as_secs_f64() * 1000.0;
        let report = driver.tick(timestamp_ms, &mut rasterizer, &mut host)?;

        for (dst, src) in frame_buffer.iter_mut().zip(rasterizer.buffer().pixels()) {
            *dst = rgba_to_u32(src);
        }
        draw_text(
            &mut frame_buffer,
            width,
            height,
            FPS_LABEL_MARGIN,
            FPS_LABEL_MARGIN,
            &host.fps_label,
            FPS_LABEL_COLOR,
        );

        if report.view_changed {
            window.set_title(&format!(
                "マンデルブロ集合 [CPU] x{:.2e}",
                report.view.zoom
            ));
        }
        log::debug!(
            "フレーム {}: {:.2?} ({} fps)",
            report.frame,
            frame_start.elapsed(),
            host.fps_label
        );

        window.update_with_buffer(&frame_buffer, width, height)?;
    }

    log::info!("終了しました");
    Ok(())
}
