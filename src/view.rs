//! ビューモデル: ズーム倍率と原点位置
//!
//! `center` は複素平面の原点が描画面上のどのピクセル位置にあるかを表す。
//! ピクセル (x, y) に対応する複素数は `((x - center.x) / zoom, (y - center.y) / zoom)`。
//!
//! ポインタが押されている間は、ポインタ位置を固定点として指数的にズームインする。
//! ズームアウトの操作はない。

use crate::common::constants::{INITIAL_CENTER_X, INITIAL_CENTER_Y, INITIAL_ZOOM};
use crate::pointer::PointerState;

/// 描画面上の点（ピクセル単位）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 表示状態（zoom > 0 を常に保つ）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub center: Point,
    pub zoom: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            center: Point::new(INITIAL_CENTER_X, INITIAL_CENTER_Y),
            zoom: INITIAL_ZOOM,
        }
    }
}

impl ViewState {
    /// 正で有限なズーム倍率と有限な原点位置のときだけ生成する
    pub fn new(center: Point, zoom: f64) -> Option<Self> {
        let valid = zoom.is_finite() && zoom > 0.0 && center.x.is_finite() && center.y.is_finite();
        valid.then_some(Self { center, zoom })
    }

    /// 画面上のピクセル座標を複素平面上の座標に変換
    pub fn pixel_to_complex(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.center.x) / self.zoom, (y - self.center.y) / self.zoom)
    }

    /// 1フレーム分の更新。状態が変わったら true を返す。
    ///
    /// `frames_per_second` が正の有限値でないフレームは何もしない。
    pub fn update(
        &mut self,
        frames_per_second: f64,
        pointer: &PointerState,
        zoom_rate_per_second: f64,
    ) -> bool {
        if !pointer.active {
            return false;
        }
        if !(frames_per_second.is_finite() && frames_per_second > 0.0) {
            return false;
        }

        let zoom_delta = zoom_rate_per_second / frames_per_second;
        let zoom = self.zoom * (1.0 + zoom_delta);
        let dx = self.center.x - pointer.x;
        let dy = self.center.y - pointer.y;
        let center = Point::new(self.center.x + dx * zoom_delta, self.center.y + dy * zoom_delta);

        // 更新後もズームは厳密に増加し、座標は有限でなければならない
        if !(zoom.is_finite() && zoom > self.zoom && center.x.is_finite() && center.y.is_finite()) {
            log::debug!("ビュー更新をスキップ: zoom={zoom} center=({}, {})", center.x, center.y);
            return false;
        }

        self.zoom = zoom;
        self.center = center;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn pressed_at(x: f64, y: f64) -> PointerState {
        PointerState { active: true, x, y }
    }

    #[test]
    fn inactive_pointer_is_a_fixed_point() {
        let mut view = ViewState::default();
        let pointer = PointerState { active: false, x: 10.0, y: 20.0 };
        for _ in 0..100 {
            assert!(!view.update(60.0, &pointer, 0.5));
        }
        assert_eq!(view, ViewState::default());
    }

    #[test]
    fn zoom_strictly_increases_while_pressed() {
        let mut view = ViewState::default();
        let pointer = pressed_at(100.0, 50.0);
        let mut previous = view.zoom;
        for fps in [60.0, 30.0, 144.0, 59.94, 1.0] {
            assert!(view.update(fps, &pointer, 0.5));
            assert!(view.zoom > previous);
            previous = view.zoom;
        }
    }

    #[test]
    fn zoom_rate_is_normalized_by_frame_rate() {
        let pointer = pressed_at(800.0, 400.0);
        let mut fast = ViewState::default();
        for _ in 0..60 {
            fast.update(60.0, &pointer, 0.5);
        }
        let mut slow = ViewState::default();
        for _ in 0..30 {
            slow.update(30.0, &pointer, 0.5);
        }
        // 1秒後のズームはフレームレートに関わらずほぼ同じ
        assert!((fast.zoom / slow.zoom - 1.0).abs() < 0.01);
    }

    #[test]
    fn degenerate_frame_rate_is_ignored() {
        let pointer = pressed_at(100.0, 50.0);
        for fps in [0.0, -16.0, f64::INFINITY, f64::NAN] {
            let mut view = ViewState::default();
            assert!(!view.update(fps, &pointer, 0.5));
            assert_eq!(view, ViewState::default());
        }
    }

    #[test]
    fn point_under_pointer_stays_fixed() {
        let mut view = ViewState::default();
        let pointer = pressed_at(250.0, 120.0);
        let before = view.pixel_to_complex(pointer.x, pointer.y);
        for _ in 0..10 {
            view.update(60.0, &pointer, 1.0);
        }
        let after = view.pixel_to_complex(pointer.x, pointer.y);
        assert!((before.0 - after.0).abs() < EPSILON);
        assert!((before.1 - after.1).abs() < EPSILON);
    }

    #[test]
    fn pointer_on_center_only_zooms() {
        let mut view = ViewState::default();
        let pointer = pressed_at(800.0, 400.0);
        view.update(60.0, &pointer, 0.5);
        assert_eq!(view.center, Point::new(800.0, 400.0));
        assert!((view.zoom - 300.0 * (1.0 + 0.5 / 60.0)).abs() < EPSILON);
    }

    #[test]
    fn pixel_to_complex_uses_center_and_zoom() {
        let view = ViewState::default();
        let (cx, cy) = view.pixel_to_complex(2.0, 2.0);
        assert!((cx - (-798.0 / 300.0)).abs() < EPSILON);
        assert!((cy - (-398.0 / 300.0)).abs() < EPSILON);
    }

    #[test]
    fn rejects_non_positive_zoom() {
        assert!(ViewState::new(Point::default(), 0.0).is_none());
        assert!(ViewState::new(Point::default(), -1.0).is_none());
        assert!(ViewState::new(Point::new(f64::NAN, 0.0), 1.0).is_none());
        assert!(ViewState::new(Point::default(), 1.0).is_some());
    }
}
