//! 描画バックエンド
//!
//! - `cpu`: 全ピクセルを走査して RGBA8 バッファを埋める
//! - `gpu`: ビュー状態をユニフォームとして渡し、フラグメントシェーダーで描画する

pub mod cpu;
pub mod gpu;

use crate::common::error::RenderError;
use crate::view::ViewState;

/// 描画面のサイズ（起動時に固定）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// 1フレーム分の描画を行うバックエンド
pub trait RenderBackend {
    /// 現在のビュー状態で描画面を塗る
    fn render(&mut self, view: &ViewState) -> Result<(), RenderError>;

    /// ログ表示用の名前
    fn name(&self) -> &'static str;
}
