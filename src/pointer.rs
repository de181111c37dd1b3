//! ポインタ入力
//!
//! 入力イベントは `PointerSender` からキューに積まれ、フレーム毎に
//! `PointerController::drain` で到着順にまとめて `PointerState` へ反映する。
//! 送信側は `Clone + Send` なので、描画スレッド以外からイベントを送ってもよい。

use std::sync::mpsc::{self, Receiver, Sender};

use crate::render::SurfaceSize;

/// 最後に分かっているポインタ位置（描画面ピクセル座標）とボタン押下状態
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    pub active: bool,
    pub x: f64,
    pub y: f64,
}

/// ホスト環境から届く生のポインタイベント
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up,
    Leave,
}

/// イベント送信ハンドル
#[derive(Debug, Clone)]
pub struct PointerSender {
    tx: Sender<PointerEvent>,
}

impl PointerSender {
    /// イベントを送る。受信側が破棄済みなら黙って捨てる。
    pub fn send(&self, event: PointerEvent) {
        if self.tx.send(event).is_err() {
            log::trace!("ポインタイベントを破棄: {event:?}");
        }
    }

    pub fn down(&self, x: f64, y: f64) {
        self.send(PointerEvent::Down { x, y });
    }

    pub fn moved(&self, x: f64, y: f64) {
        self.send(PointerEvent::Move { x, y });
    }

    pub fn up(&self) {
        self.send(PointerEvent::Up);
    }

    pub fn leave(&self) {
        self.send(PointerEvent::Leave);
    }
}

/// イベントキューの受信側
#[derive(Debug)]
pub struct PointerController {
    rx: Receiver<PointerEvent>,
}

impl PointerController {
    /// 送信ハンドルとコントローラの組を作る
    pub fn channel() -> (PointerSender, Self) {
        let (tx, rx) = mpsc::channel();
        (PointerSender { tx }, Self { rx })
    }

    /// 溜まったイベントを到着順に適用し、適用した件数を返す
    pub fn drain(&self, state: &mut PointerState, surface: SurfaceSize) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.rx.try_recv() {
            if apply(state, event, surface) {
                applied += 1;
            }
        }
        applied
    }
}

/// 1イベントを適用。座標が有限でないイベントは無視する。
pub fn apply(state: &mut PointerState, event: PointerEvent, surface: SurfaceSize) -> bool {
    match event {
        PointerEvent::Down { x, y } => {
            let Some((x, y)) = clamp_to_surface(x, y, surface) else {
                return false;
            };
            state.active = true;
            state.x = x;
            state.y = y;
        }
        PointerEvent::Move { x, y } => {
            let Some((x, y)) = clamp_to_surface(x, y, surface) else {
                return false;
            };
            state.x = x;
            state.y = y;
        }
        PointerEvent::Up | PointerEvent::Leave => state.active = false,
    }
    true
}

/// 最後の行・列のピクセルまでに収める
fn clamp_to_surface(x: f64, y: f64, surface: SurfaceSize) -> Option<(f64, f64)> {
    if !(x.is_finite() && y.is_finite()) {
        return None;
    }
    Some((
        x.clamp(0.0, f64::from(surface.width.saturating_sub(1))),
        y.clamp(0.0, f64::from(surface.height.saturating_sub(1))),
    ))
}
