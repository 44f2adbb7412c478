//! Crate-wide error types.

use thiserror::Error;

/// Failures that can occur while decoding or encoding a PMX model.
#[derive(Debug, Error)]
pub enum PmxError {
    #[error("unexpected end of buffer")]
    Truncated,
    #[error("{0} bytes of trailing data after a complete decode")]
    TrailingData(usize),
    #[error("bad PMX magic")]
    BadMagic,
    #[error("unsupported PMX version {0}")]
    UnsupportedVersion(f32),
    #[error("unsupported text encoding byte {0:#x}")]
    UnsupportedEncoding(u8),
    #[error("invalid index width {0}")]
    InvalidIndexWidth(u8),
    #[error("invalid vertex weight kind {0}")]
    InvalidWeightKind(u8),
    #[error("invalid sphere mode {0}")]
    InvalidSphereMode(u8),
    #[error("invalid toon mode {0}")]
    InvalidToonMode(u8),
    #[error("invalid morph kind {0}")]
    InvalidMorphKind(u8),
    #[error("invalid display-frame target {0}")]
    InvalidFrameTarget(u8),
    #[error("invalid morph control panel {0}")]
    InvalidControlPanel(u8),
    #[error("invalid rigid body shape {0}")]
    InvalidRigidShape(u8),
    #[error("invalid rigid body calculation method {0}")]
    InvalidRigidCalcMethod(u8),
    #[error("invalid joint kind {0}")]
    InvalidJointKind(u8),
    #[error("face index count {0} is not a multiple of 3")]
    InvalidFaceCount(usize),
}

/// Failures that can occur while decoding or encoding a VMD motion file.
#[derive(Debug, Error)]
pub enum VmdError {
    #[error("unexpected end of buffer")]
    Truncated,
    #[error("{0} bytes of trailing data after a complete decode")]
    TrailingData(usize),
    #[error("bad VMD magic")]
    BadMagic,
}

/// Top-level error returned by the facade functions.
#[derive(Debug, Error)]
pub enum Error {
    #[error("pmx: {0}")]
    Pmx(#[from] PmxError),
    #[error("vmd: {0}")]
    Vmd(#[from] VmdError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
