//! `mmd_codec` — PMX model and VMD motion decoding, encoding, and
//! interpolation for the MikuMikuDance ecosystem.
//!
//! The crate is a pure, synchronous codec: it turns byte buffers into
//! typed models and back, and evaluates camera animation tracks at an
//! arbitrary frame. It does not touch a scene graph, a renderer, or an
//! asset pipeline — those are the caller's concern.

pub mod camera;
pub mod error;
pub mod interpolation;
pub mod pmx;
pub mod text;
pub mod track;
pub mod vmd;

mod cursor;

pub use error::Error;

/// Decodes a PMX model from an in-memory buffer.
pub fn decode_pmx(bytes: &[u8]) -> Result<pmx::Pmx, Error> {
    pmx::decode(bytes).map_err(Error::Pmx)
}

/// Encodes a PMX model to an in-memory buffer.
pub fn encode_pmx(model: &pmx::Pmx) -> Vec<u8> {
    pmx::encode(model)
}

/// Reads a PMX model from a filesystem path.
pub fn load_pmx<P: AsRef<std::path::Path>>(path: P) -> Result<pmx::Pmx, Error> {
    let bytes = std::fs::read(path)?;
    decode_pmx(&bytes)
}

/// Encodes a PMX model and writes it to a filesystem path.
pub fn save_pmx<P: AsRef<std::path::Path>>(path: P, model: &pmx::Pmx) -> Result<(), Error> {
    std::fs::write(path, encode_pmx(model))?;
    Ok(())
}

/// Decodes a VMD motion file from an in-memory buffer.
pub fn decode_vmd(bytes: &[u8]) -> Result<vmd::Vmd, Error> {
    vmd::decode(bytes).map_err(Error::Vmd)
}

/// Encodes a VMD motion file to an in-memory buffer.
pub fn encode_vmd(motion: &vmd::Vmd) -> Vec<u8> {
    vmd::encode(motion)
}

/// Reads a VMD motion file from a filesystem path.
pub fn load_vmd<P: AsRef<std::path::Path>>(path: P) -> Result<vmd::Vmd, Error> {
    let bytes = std::fs::read(path)?;
    decode_vmd(&bytes)
}

/// Encodes a VMD motion file and writes it to a filesystem path.
pub fn save_vmd<P: AsRef<std::path::Path>>(path: P, motion: &vmd::Vmd) -> Result<(), Error> {
    std::fs::write(path, encode_vmd(motion))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_vmd_round_trip_is_74_bytes() {
        let vmd = vmd::Vmd::default();
        let bytes = encode_vmd(&vmd);
        assert_eq!(bytes.len(), 30 + 20 + 4 * 6);
        let decoded = decode_vmd(&bytes).unwrap();
        assert_eq!(decoded.model_name, "");
        assert!(decoded.motion_tracks.is_empty());
    }

    #[test]
    fn single_key_motion_round_trips() {
        let mut vmd = vmd::Vmd::default();
        // bytes [2]/[3] already carry the non-physics marker so the
        // encoder (which only ever forces it, never clears it) leaves
        // them consistent with `is_physics = false`.
        let mut interpolation = [0u8; 64];
        interpolation[2] = 0x63;
        interpolation[3] = 0x0f;
        let key = vmd::MotionKey {
            frame: 0,
            position: [0.0, 0.0, 0.0],
            orientation: [0.0, 0.0, 0.0, 1.0],
            interpolation,
            ix: interpolation::Interpolation::default(),
            iy: interpolation::Interpolation::default(),
            iz: interpolation::Interpolation::default(),
            ir: interpolation::Interpolation::default(),
            is_physics: false,
        };
        vmd.motion_tracks
            .insert("センター".to_string(), track::Track::from_keys(vec![key]));

        let bytes = encode_vmd(&vmd);
        let decoded = decode_vmd(&bytes).unwrap();
        let track = decoded.motion_tracks.get("センター").unwrap();
        assert_eq!(track.keys()[0].position, [0.0, 0.0, 0.0]);
        assert!(!track.keys()[0].is_physics);
    }

    #[test]
    fn pmx_width_dispatch_widens_unsigned_to_signed() {
        use std::convert::TryFrom;
        assert!(pmx::IndexWidth::try_from(3).is_err());
        assert!(pmx::IndexWidth::try_from(1).is_ok());
    }
}
