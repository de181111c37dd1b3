//! エラー型

/// 設定値の誤り
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// 描画バックエンドの失敗
///
/// `ShaderCompilation` はそのバックエンドにとって致命的で、再試行しない。
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no compatible GPU adapter found")]
    AdapterUnavailable,
    #[error("failed to acquire GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("surface reports no supported texture format")]
    UnsupportedSurface,
    #[error("shader compilation failed: {0}")]
    ShaderCompilation(String),
    #[error("surface frame unavailable: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}
