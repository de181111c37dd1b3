//! フレームドライバ
//!
//! ホスト環境から届くタイムスタンプ毎に、次の順で 1 フレームを進める:
//!
//! 1. 前フレームとの差から FPS を計算（非有限・非正なら 0 = 未定義）
//! 2. ポインタイベントを反映してビューを更新
//! 3. バックエンドで描画
//! 4. FPS と更新後のビューをホストへ通知
//! 5. タイムスタンプを記録
//! 6. 次のフレームをホストに予約
//!
//! 次フレームの予約手段はホストが持つ（`FrameHost`）。ドライバ自身は
//! ブロックせず、`&mut self` なので 1 フレームの途中で再入されることもない。

use crate::common::config::ExplorerConfig;
use crate::common::error::RenderError;
use crate::pointer::{PointerController, PointerSender, PointerState};
use crate::render::{RenderBackend, SurfaceSize};
use crate::view::ViewState;

/// FPS 計測
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTiming {
    pub last_timestamp_ms: f64,
    /// 0 は未定義（初回フレームや経過時間 0）
    pub frames_per_second: f64,
}

impl FrameTiming {
    /// 前回記録したタイムスタンプとの差から FPS を計算する
    pub fn measure(&mut self, timestamp_ms: f64) -> f64 {
        let fps = 1000.0 / (timestamp_ms - self.last_timestamp_ms);
        self.frames_per_second = if fps.is_finite() && fps > 0.0 { fps } else { 0.0 };
        self.frames_per_second
    }

    pub fn record(&mut self, timestamp_ms: f64) {
        self.last_timestamp_ms = timestamp_ms;
    }

    pub fn has_rate(&self) -> bool {
        self.frames_per_second > 0.0
    }
}

/// 表示用の FPS 文字列
pub fn fps_label(frames_per_second: f64) -> String {
    if frames_per_second.is_finite() && frames_per_second > 0.0 {
        format!("{frames_per_second:.2}")
    } else {
        "--".to_string()
    }
}

/// ドライバの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// 最初のタイムスタンプを受け取る前
    Idle,
    Running,
}

/// 1フレームの間に読み書きされる状態一式
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppState {
    pub view: ViewState,
    pub pointer: PointerState,
    pub timing: FrameTiming,
    pub surface: SurfaceSize,
}

/// ホスト環境が提供する機能
pub trait FrameHost {
    /// FPS を表示する（`view` はこのフレームで描画したビュー）
    fn publish_fps(&mut self, frames_per_second: f64, view: &ViewState);

    /// 次のフレームを予約する
    fn schedule_next_tick(&mut self);
}

/// 1フレームの結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub frames_per_second: f64,
    pub view: ViewState,
    pub view_changed: bool,
}

/// ビュー更新と描画を 1 フレームずつ進める
#[derive(Debug)]
pub struct FrameDriver {
    state: DriverState,
    app: AppState,
    initial_view: ViewState,
    zoom_rate_per_second: f64,
    pointer: PointerController,
    frame: u64,
}

impl FrameDriver {
    /// ドライバと、ポインタイベントを送るためのハンドルを作る
    pub fn new(config: &ExplorerConfig) -> (Self, PointerSender) {
        let (sender, pointer) = PointerController::channel();
        let driver = Self {
            state: DriverState::Idle,
            app: AppState {
                view: config.initial_view,
                pointer: PointerState::default(),
                timing: FrameTiming::default(),
                surface: config.surface,
            },
            initial_view: config.initial_view,
            zoom_rate_per_second: config.zoom_rate_per_second,
            pointer,
            frame: 0,
        };
        (driver, sender)
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn app(&self) -> &AppState {
        &self.app
    }

    pub fn view(&self) -> &ViewState {
        &self.app.view
    }

    /// ビューを起動時の状態に戻す（ポインタ状態はそのまま）
    pub fn reset_view(&mut self) {
        self.app.view = self.initial_view;
        log::info!("ビューをリセット");
    }

    /// 1フレーム進める
    ///
    /// 描画に失敗した場合は次フレームを予約せずにエラーを返す。
    pub fn tick<B, H>(
        &mut self,
        timestamp_ms: f64,
        backend: &mut B,
        host: &mut H,
    ) -> Result<FrameReport, RenderError>
    where
        B: RenderBackend + ?Sized,
        H: FrameHost + ?Sized,
    {
        let fps = match self.state {
            DriverState::Idle => {
                log::debug!("最初のフレーム: t={timestamp_ms:.1}ms");
                self.state = DriverState::Running;
                self.app.timing.frames_per_second = 0.0;
                0.0
            }
            DriverState::Running => self.app.timing.measure(timestamp_ms),
        };

        self.pointer.drain(&mut self.app.pointer, self.app.surface);
        let view_changed = if self.app.timing.has_rate() {
            self.app
                .view
                .update(fps, &self.app.pointer, self.zoom_rate_per_second)
        } else {
            false
        };

        backend.render(&self.app.view)?;

        host.publish_fps(fps, &self.app.view);
        self.app.timing.record(timestamp_ms);
        self.frame += 1;

        if view_changed {
            log::trace!(
                "フレーム {}: zoom={:.3e} center=({:.3}, {:.3})",
                self.frame,
                self.app.view.zoom,
                self.app.view.center.x,
                self.app.view.center.y
            );
        }

        host.schedule_next_tick();

        Ok(FrameReport {
            frame: self.frame,
            frames_per_second: fps,
            view: self.app.view,
            view_changed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Point;

    #[derive(Default)]
    struct RecordingHost {
        fps: Vec<f64>,
        views: Vec<ViewState>,
        scheduled: usize,
    }

    impl FrameHost for RecordingHost {
        fn publish_fps(&mut self, frames_per_second: f64, view: &ViewState) {
            self.fps.push(frames_per_second);
            self.views.push(*view);
        }

        fn schedule_next_tick(&mut self) {
            self.scheduled += 1;
        }
    }

    #[derive(Default)]
    struct RecordingBackend {
        views: Vec<ViewState>,
        fail: bool,
    }

    impl RenderBackend for RecordingBackend {
        fn render(&mut self, view: &ViewState) -> Result<(), RenderError> {
            if self.fail {
                return Err(RenderError::ShaderCompilation("broken".into()));
            }
            self.views.push(*view);
            Ok(())
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    fn driver() -> (FrameDriver, PointerSender) {
        FrameDriver::new(&ExplorerConfig::cpu())
    }

    #[test]
    fn first_tick_leaves_idle_and_reports_undefined_rate() {
        let (mut driver, pointer) = driver();
        let mut backend = RecordingBackend::default();
        let mut host = RecordingHost::default();
        pointer.down(100.0, 100.0);

        assert_eq!(driver.state(), DriverState::Idle);
        let report = driver.tick(16.0, &mut backend, &mut host).unwrap();
        assert_eq!(driver.state(), DriverState::Running);
        assert_eq!(report.frames_per_second, 0.0);
        assert!(!report.view_changed);
        assert_eq!(host.fps, vec![0.0]);
        assert_eq!(host.scheduled, 1);
        assert_eq!(backend.views.len(), 1);
    }

    #[test]
    fn frame_rate_comes_from_timestamp_delta() {
        let (mut driver, _pointer) = driver();
        let mut backend = RecordingBackend::default();
        let mut host = RecordingHost::default();
        driver.tick(0.0, &mut backend, &mut host).unwrap();
        let report = driver.tick(20.0, &mut backend, &mut host).unwrap();
        assert!((report.frames_per_second - 50.0).abs() < 1e-9);
        assert_eq!(driver.app().timing.last_timestamp_ms, 20.0);
    }

    #[test]
    fn identical_timestamps_do_not_poison_the_view() {
        let (mut driver, pointer) = driver();
        let mut backend = RecordingBackend::default();
        let mut host = RecordingHost::default();
        pointer.down(10.0, 10.0);

        driver.tick(100.0, &mut backend, &mut host).unwrap();
        let before = *driver.view();
        let report = driver.tick(100.0, &mut backend, &mut host).unwrap();

        assert_eq!(report.frames_per_second, 0.0);
        assert_eq!(*driver.view(), before);
        assert!(driver.view().zoom.is_finite());
        assert!(driver.view().center.x.is_finite());
    }

    #[test]
    fn backwards_timestamps_are_skipped() {
        let (mut driver, pointer) = driver();
        let mut backend = RecordingBackend::default();
        let mut host = RecordingHost::default();
        pointer.down(10.0, 10.0);
        driver.tick(100.0, &mut backend, &mut host).unwrap();
        let report = driver.tick(50.0, &mut backend, &mut host).unwrap();
        assert!(!report.view_changed);
    }

    #[test]
    fn held_pointer_zooms_every_tick() {
        let (mut driver, pointer) = driver();
        let mut backend = RecordingBackend::default();
        let mut host = RecordingHost::default();
        pointer.down(400.0, 300.0);

        driver.tick(0.0, &mut backend, &mut host).unwrap();
        let mut previous = driver.view().zoom;
        for i in 1..=30 {
            let report = driver.tick(f64::from(i) * 16.0, &mut backend, &mut host).unwrap();
            assert!(report.view_changed);
            assert!(report.view.zoom > previous);
            previous = report.view.zoom;
        }

        pointer.up();
        let frozen = driver.tick(31.0 * 16.0, &mut backend, &mut host).unwrap();
        assert!(!frozen.view_changed);
        assert_eq!(frozen.view.zoom, previous);
    }

    #[test]
    fn published_view_is_the_rendered_view() {
        let (mut driver, pointer) = driver();
        let mut backend = RecordingBackend::default();
        let mut host = RecordingHost::default();
        pointer.down(400.0, 300.0);

        for i in 0..4 {
            let report = driver.tick(f64::from(i) * 16.0, &mut backend, &mut host).unwrap();
            assert_eq!(host.views.last(), Some(&report.view));
        }
        assert_eq!(host.views, backend.views);
        assert!(host.views[3].zoom > host.views[0].zoom);
    }

    #[test]
    fn render_failure_stops_scheduling() {
        let (mut driver, _pointer) = driver();
        let mut backend = RecordingBackend {
            fail: true,
            ..Default::default()
        };
        let mut host = RecordingHost::default();
        let result = driver.tick(0.0, &mut backend, &mut host);
        assert!(matches!(result, Err(RenderError::ShaderCompilation(_))));
        assert_eq!(host.scheduled, 0);
        assert!(host.fps.is_empty());
    }

    #[test]
    fn reset_restores_initial_view() {
        let (mut driver, pointer) = driver();
        let mut backend = RecordingBackend::default();
        let mut host = RecordingHost::default();
        pointer.down(0.0, 0.0);
        for i in 0..5 {
            driver.tick(f64::from(i) * 16.0, &mut backend, &mut host).unwrap();
        }
        assert_ne!(*driver.view(), ViewState::default());
        driver.reset_view();
        assert_eq!(driver.view().center, Point::new(800.0, 400.0));
        assert_eq!(driver.view().zoom, 300.0);
        assert!(driver.app().pointer.active);
    }

    #[test]
    fn fps_label_formats_two_decimals() {
        assert_eq!(fps_label(59.941), "59.94");
        assert_eq!(fps_label(0.0), "--");
        assert_eq!(fps_label(f64::INFINITY), "--");
    }
}
