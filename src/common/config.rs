//! 実行時設定
//!
//! 既定値は `constants` から取り、環境変数で上書きできる。
//!
//! - `MANDELBROT_WIDTH` / `MANDELBROT_HEIGHT`: 描画面サイズ
//! - `MANDELBROT_ZOOM`: 初期ズーム倍率
//! - `MANDELBROT_CENTER_X` / `MANDELBROT_CENTER_Y`: 原点の初期ピクセル位置
//! - `MANDELBROT_ZOOM_RATE`: 1秒あたりのズーム増加率
//! - `MANDELBROT_THRESHOLD_SCALE`: 発散閾値の係数
//! - `MANDELBROT_DIVISOR`: 輝度の除数
//! - `MANDELBROT_PRECISION`: `f32`（既定）または `f64`（CPU版のみ）
//! - `MANDELBROT_ROWS`: `serial` または `parallel`（CPU版のみ）
//!
//! 数値として読めない値は既定値に戻す。読めても不正な値はエラーにする。

use std::str::FromStr;

use crate::common::constants::{
    CPU_ZOOM_RATE_PER_SECOND, GPU_ZOOM_RATE_PER_SECOND, SURFACE_HEIGHT, SURFACE_WIDTH,
};
use crate::common::error::ConfigError;
use crate::common::mandelbrot::EscapeParams;
use crate::render::cpu::{Precision, RowStrategy};
use crate::render::SurfaceSize;
use crate::view::{Point, ViewState};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplorerConfig {
    pub surface: SurfaceSize,
    pub initial_view: ViewState,
    pub zoom_rate_per_second: f64,
    pub escape: EscapeParams,
    pub precision: Precision,
    pub row_strategy: RowStrategy,
}

impl ExplorerConfig {
    /// CPU版の既定値
    pub fn cpu() -> Self {
        Self {
            surface: SurfaceSize::new(SURFACE_WIDTH, SURFACE_HEIGHT),
            initial_view: ViewState::default(),
            zoom_rate_per_second: CPU_ZOOM_RATE_PER_SECOND,
            escape: EscapeParams::default(),
            precision: Precision::default(),
            row_strategy: RowStrategy::default(),
        }
    }

    /// GPU版の既定値
    pub fn gpu() -> Self {
        Self {
            zoom_rate_per_second: GPU_ZOOM_RATE_PER_SECOND,
            ..Self::cpu()
        }
    }

    /// 既定値に環境変数の上書きを適用
    pub fn from_env(defaults: Self) -> Result<Self, ConfigError> {
        defaults.with_overrides(|key| std::env::var(key).ok())
    }

    /// `lookup` が返す値で上書きする（テストでは環境変数の代わりに使う）
    pub fn with_overrides<F>(self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse = |key, default: f64| parse_or(lookup(key).as_deref(), default);
        let parse_u32 = |key, default: u32| parse_or(lookup(key).as_deref(), default);

        let surface = SurfaceSize::new(
            parse_u32("MANDELBROT_WIDTH", self.surface.width),
            parse_u32("MANDELBROT_HEIGHT", self.surface.height),
        );
        if surface.width == 0 || surface.height == 0 {
            return Err(invalid("surface", format!("{}x{}", surface.width, surface.height)));
        }

        let zoom = parse("MANDELBROT_ZOOM", self.initial_view.zoom);
        let center = Point::new(
            parse("MANDELBROT_CENTER_X", self.initial_view.center.x),
            parse("MANDELBROT_CENTER_Y", self.initial_view.center.y),
        );
        let initial_view = ViewState::new(center, zoom)
            .ok_or_else(|| invalid("MANDELBROT_ZOOM", format!("zoom must be positive, got {zoom}")))?;

        let zoom_rate_per_second = parse("MANDELBROT_ZOOM_RATE", self.zoom_rate_per_second);
        require_positive("MANDELBROT_ZOOM_RATE", zoom_rate_per_second)?;

        let escape = EscapeParams {
            threshold_scale: parse("MANDELBROT_THRESHOLD_SCALE", self.escape.threshold_scale),
            normalization_divisor: parse("MANDELBROT_DIVISOR", self.escape.normalization_divisor),
        };
        require_positive("MANDELBROT_THRESHOLD_SCALE", escape.threshold_scale)?;
        if !(escape.normalization_divisor.is_finite() && escape.normalization_divisor >= 1.0) {
            return Err(invalid(
                "MANDELBROT_DIVISOR",
                format!("must be at least 1, got {}", escape.normalization_divisor),
            ));
        }

        let precision = match lookup("MANDELBROT_PRECISION").as_deref() {
            None => self.precision,
            Some("f32") => Precision::Single,
            Some("f64") => Precision::Double,
            Some(other) => return Err(invalid("MANDELBROT_PRECISION", format!("unknown precision: {other}"))),
        };

        let row_strategy = match lookup("MANDELBROT_ROWS").as_deref() {
            None => self.row_strategy,
            Some("serial") => RowStrategy::Serial,
            Some("parallel") => RowStrategy::Parallel,
            Some(other) => return Err(invalid("MANDELBROT_ROWS", format!("unknown row strategy: {other}"))),
        };

        Ok(Self {
            surface,
            initial_view,
            zoom_rate_per_second,
            escape,
            precision,
            row_strategy,
        })
    }
}

fn parse_or<T: FromStr>(raw: Option<&str>, default: T) -> T {
    raw.and_then(|v| v.trim().parse::<T>().ok()).unwrap_or(default)
}

fn require_positive(key: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(key, format!("must be positive, got {value}")))
    }
}

fn invalid(key: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { key, reason }
}
