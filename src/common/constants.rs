//! 共通定数

/// 描画面の幅
pub const SURFACE_WIDTH: u32 = 1200;
/// 描画面の高さ
pub const SURFACE_HEIGHT: u32 = 800;

/// 最大反復回数（固定）
pub const MAX_ITER: u32 = 100;

/// 初期ズーム倍率（複素平面 1 単位あたりのピクセル数）
pub const INITIAL_ZOOM: f64 = 300.0;
/// 複素平面の原点が置かれる初期ピクセル位置
pub const INITIAL_CENTER_X: f64 = 800.0;
pub const INITIAL_CENTER_Y: f64 = 400.0;

/// 1秒あたりのズーム増加率（CPU版）
pub const CPU_ZOOM_RATE_PER_SECOND: f64 = 0.5;
/// 1秒あたりのズーム増加率（GPU版）
pub const GPU_ZOOM_RATE_PER_SECOND: f64 = 1.0;

/// 発散閾値 = ズーム倍率 × この係数
pub const THRESHOLD_SCALE: f64 = 1.0;

/// 反復回数を輝度に変換する際の除数
pub const NORMALIZATION_DIVISOR: f64 = 40.0;

/// CPU版の目標フレームレート
pub const TARGET_FPS: usize = 60;
