//! 配色関数
//!
//! 赤は行位置、緑は列位置、青は輝度で決まり、赤と緑も輝度で減衰させる。
//! シェーダー側の `fs_main` と同じ式。

/// ピクセル位置と輝度から RGBA8 を計算
pub fn shade(x: u32, y: u32, width: u32, height: u32, intensity: f64) -> [u8; 4] {
    let red = f64::from(y) / f64::from(height) * 255.0;
    let green = f64::from(x) / f64::from(width) * 255.0;

    // as u8 は小数部を切り捨て、範囲外は飽和する
    [
        (intensity * red) as u8,
        (intensity * green) as u8,
        (intensity * 255.0) as u8,
        255,
    ]
}

/// RGBA8 を表示用の u32 (0xRRGGBB) に変換（アルファは捨てる）
pub fn rgba_to_u32(pixel: [u8; 4]) -> u32 {
    let [r, g, b, _] = pixel;
    (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}
