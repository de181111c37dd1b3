//! マンデルブロ集合計算関数
//!
//! 発散判定は |z|² > 4 ではなく `real * imag > threshold` を使う。
//! 閾値はズーム倍率に連動し、描画される境界の形はこの判定に依存する。
//! GPU シェーダーも同じ判定式を使うので、ここを変えるときは
//! `render/mandelbrot.wgsl` も合わせて変えること。

use num_traits::Float;

use crate::common::constants::{MAX_ITER, NORMALIZATION_DIVISOR, THRESHOLD_SCALE};

/// 発散判定と輝度変換のパラメータ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EscapeParams {
    /// 発散閾値 = zoom × threshold_scale
    pub threshold_scale: f64,
    /// 輝度 = 反復回数 / normalization_divisor
    pub normalization_divisor: f64,
}

impl Default for EscapeParams {
    fn default() -> Self {
        Self {
            threshold_scale: THRESHOLD_SCALE,
            normalization_divisor: NORMALIZATION_DIVISOR,
        }
    }
}

impl EscapeParams {
    /// 現在のズーム倍率に対する発散閾値
    pub fn threshold(&self, zoom: f64) -> f64 {
        zoom * self.threshold_scale
    }

    /// 発散した反復回数を [0, 1] の輝度に変換（発散しなければ 0）
    pub fn intensity(&self, escape: Option<u32>) -> f64 {
        match escape {
            Some(i) => (f64::from(i) / self.normalization_divisor).min(1.0),
            None => 0.0,
        }
    }

    /// 1点の輝度を f64 で計算
    pub fn evaluate(&self, cx: f64, cy: f64, zoom: f64) -> f64 {
        self.intensity(escape_iteration(cx, cy, self.threshold(zoom)))
    }
}

/// 発散判定に引っかかった最初の反復回数を返す（MAX_ITER 回で発散しなければ None）
///
/// 精度は型パラメータで選ぶ。f32 で呼ぶと GPU シェーダーと同じ演算順序になる。
#[inline]
pub fn escape_iteration<F: Float>(cx: F, cy: F, threshold: F) -> Option<u32> {
    let two = F::one() + F::one();
    let mut real = cx;
    let mut imag = cy;

    for i in 0..MAX_ITER {
        let temp = real;
        real = temp * temp - imag * imag + cx;
        imag = two * temp * imag + cy;

        if real * imag > threshold {
            return Some(i);
        }
    }
    None
}

/// 既定パラメータで 1 点の輝度を計算
pub fn evaluate(cx: f64, cy: f64, threshold: f64) -> f64 {
    EscapeParams::default().intensity(escape_iteration(cx, cy, threshold))
}
