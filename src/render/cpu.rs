//! CPU ラスタライザ
//!
//! 1フレームのコストは O(width × height × MAX_ITER)。行単位で独立なので
//! rayon で並列化でき、結果は逐次版とビット単位で一致する。

use rayon::prelude::*;

use super::{RenderBackend, SurfaceSize};
use crate::common::colors::shade;
use crate::common::error::RenderError;
use crate::common::mandelbrot::{escape_iteration, EscapeParams};
use crate::view::ViewState;

/// 計算精度
///
/// 既定の `Single` は GPU シェーダーと同じ f32 演算で、両バックエンドの
/// 画素が一致する。`Double` は比較用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    /// f32（`fs_main` と同じ演算順序）
    #[default]
    Single,
    /// f64
    Double,
}

/// 行の処理方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowStrategy {
    Serial,
    #[default]
    Parallel,
}

/// RGBA8 のピクセルバッファ（長さ 4 × width × height）
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    size: SurfaceSize,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            data: vec![0; 4 * size.pixel_count()],
        }
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    /// ピクセル (x, y) の先頭バイト位置
    pub fn index(&self, x: u32, y: u32) -> usize {
        4 * (y as usize * self.size.width as usize + x as usize)
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.index(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn pixels(&self) -> impl Iterator<Item = [u8; 4]> + '_ {
        self.data.chunks_exact(4).map(|p| [p[0], p[1], p[2], p[3]])
    }
}

/// 全ピクセルを走査して `PixelBuffer` を埋めるバックエンド
#[derive(Debug, Clone)]
pub struct CpuRasterizer {
    buffer: PixelBuffer,
    escape: EscapeParams,
    precision: Precision,
    rows: RowStrategy,
}

impl CpuRasterizer {
    pub fn new(size: SurfaceSize, escape: EscapeParams) -> Self {
        Self {
            buffer: PixelBuffer::new(size),
            escape,
            precision: Precision::default(),
            rows: RowStrategy::default(),
        }
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_rows(mut self, rows: RowStrategy) -> Self {
        self.rows = rows;
        self
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    /// ピクセル (x, y) の輝度
    pub fn intensity_at(&self, view: &ViewState, x: u32, y: u32) -> f64 {
        match self.precision {
            Precision::Double => {
                let (cx, cy) = view.pixel_to_complex(f64::from(x), f64::from(y));
                self.escape
                    .intensity(escape_iteration(cx, cy, self.escape.threshold(view.zoom)))
            }
            Precision::Single => {
                // uniform に載るのと同じ f32 値から、シェーダーと同じ順に計算する
                let zoom = view.zoom as f32;
                let cx = (x as f32 - view.center.x as f32) / zoom;
                let cy = (y as f32 - view.center.y as f32) / zoom;
                let threshold = zoom * self.escape.threshold_scale as f32;
                let divisor = self.escape.normalization_divisor as f32;
                match escape_iteration(cx, cy, threshold) {
                    Some(i) => f64::from((i as f32 / divisor).min(1.0)),
                    None => 0.0,
                }
            }
        }
    }

    fn fill_row(&self, view: &ViewState, y: u32, row: &mut [u8]) {
        let SurfaceSize { width, height } = self.buffer.size;
        for (x, pixel) in (0..width).zip(row.chunks_exact_mut(4)) {
            let value = self.intensity_at(view, x, y);
            pixel.copy_from_slice(&shade(x, y, width, height, value));
        }
    }
}

impl RenderBackend for CpuRasterizer {
    fn render(&mut self, view: &ViewState) -> Result<(), RenderError> {
        let row_len = 4 * self.buffer.size.width as usize;
        if row_len == 0 {
            return Ok(());
        }

        // バッファを一時的に取り出して self を共有参照で使えるようにする
        let mut data = std::mem::take(&mut self.buffer.data);
        match self.rows {
            RowStrategy::Serial => {
                for (y, row) in (0u32..).zip(data.chunks_mut(row_len)) {
                    self.fill_row(view, y, row);
                }
            }
            RowStrategy::Parallel => {
                let this = &*self;
                data.par_chunks_mut(row_len)
                    .enumerate()
                    .for_each(|(y, row)| this.fill_row(view, y as u32, row));
            }
        }
        self.buffer.data = data;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "cpu"
    }
}
