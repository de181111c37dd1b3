//! マンデルブロ集合リアルタイム探索ライブラリ
//!
//! ポインタを押している間、その位置へ向かって連続的にズームインする。
//! 描画は CPU ラスタライザ（RGBA バッファ）と GPU（WGSL フラグメントシェーダー）の
//! 2 種類のバックエンドで行い、どちらも同じ発散判定と配色式を共有する。

pub mod common;
pub mod driver;
pub mod pointer;
pub mod render;
pub mod view;
