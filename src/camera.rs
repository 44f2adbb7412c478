//! The camera-sequence animation evaluator (§4.6). Derives a cut-segmented
//! sequence from a decoded VMD camera track and evaluates it at an
//! arbitrary `(frame, subframe)` query.

use crate::interpolation::Interpolation;
use crate::track::{Keyed, Track};
use crate::vmd;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraKey {
    pub frame: u32,
    pub cut: i32,
    pub location: [f32; 3],
    pub rotation: [f32; 3],
    pub distance: f32,
    pub field_of_view: f32,
    pub ix: Interpolation,
    pub iy: Interpolation,
    pub iz: Interpolation,
    pub ir: Interpolation,
    pub id: Interpolation,
    pub iv: Interpolation,
}

impl Keyed for CameraKey {
    fn frame(&self) -> u32 {
        self.frame
    }
}

/// The evaluated channel bundle returned for a query frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraProperty {
    pub location: [f32; 3],
    pub rotation: [f32; 3],
    pub distance: f32,
    pub field_of_view: f32,
    pub cut: i32,
}

#[derive(Debug, Clone, Default)]
pub struct CameraSequence {
    track: Track<CameraKey>,
}

impl CameraSequence {
    /// Builds a cut-segmented sequence from raw VMD camera keys: sorts by
    /// frame, then assigns `cut = previous.cut + 1` wherever two
    /// consecutive keys land on consecutive frames, otherwise inherits
    /// the previous key's cut.
    pub fn from_vmd_keys(keys: &[vmd::CameraKey]) -> Self {
        let mut sorted = keys.to_vec();
        sorted.sort_by_key(|k| k.frame);

        let mut out: Vec<CameraKey> = Vec::with_capacity(sorted.len());
        let mut cut = 0;
        for (i, key) in sorted.iter().enumerate() {
            if i > 0 {
                let prev_frame = sorted[i - 1].frame;
                if key.frame == prev_frame + 1 {
                    cut += 1;
                }
            }
            out.push(CameraKey {
                frame: key.frame,
                cut,
                location: key.position,
                rotation: key.rotation,
                distance: key.distance,
                field_of_view: key.view_angle as f32,
                ix: key.ix,
                iy: key.iy,
                iz: key.iz,
                ir: key.ir,
                id: key.id,
                iv: key.iv,
            });
        }

        CameraSequence {
            track: Track::from_keys(out),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.track.is_empty()
    }

    pub fn len(&self) -> usize {
        self.track.len()
    }

    /// Evaluates the camera property bundle at `frame + subframe`.
    ///
    /// Locates the bracketing keys, then applies the cut check: keys with
    /// differing `cut` values are collapsed to hold-left (no
    /// interpolation across a hard cut).
    pub fn evaluate(&self, frame: i32, subframe: f32) -> Option<CameraProperty> {
        let (k0, k1) = self.track.search(i64::from(frame));
        let (k0, k1) = (k0?, k1?);

        let k1 = if k0.cut != k1.cut { k0 } else { k1 };

        let u = if k1.frame == k0.frame {
            0.0
        } else {
            let span = (k1.frame as i32 - k0.frame as i32) as f32;
            let pos = (frame - k0.frame as i32) as f32 + subframe;
            (pos / span).clamp(0.0, 1.0)
        };

        let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;

        let alpha_x = k1.ix.evaluate(u);
        let alpha_y = k1.iy.evaluate(u);
        let alpha_z = k1.iz.evaluate(u);
        let alpha_r = k1.ir.evaluate(u);
        let alpha_d = k1.id.evaluate(u);
        let alpha_v = k1.iv.evaluate(u);

        Some(CameraProperty {
            location: [
                lerp(k0.location[0], k1.location[0], alpha_x),
                lerp(k0.location[1], k1.location[1], alpha_y),
                lerp(k0.location[2], k1.location[2], alpha_z),
            ],
            rotation: [
                lerp(k0.rotation[0], k1.rotation[0], alpha_r),
                lerp(k0.rotation[1], k1.rotation[1], alpha_r),
                lerp(k0.rotation[2], k1.rotation[2], alpha_r),
            ],
            distance: lerp(k0.distance, k1.distance, alpha_d),
            field_of_view: lerp(k0.field_of_view, k1.field_of_view, alpha_v),
            cut: k1.cut,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(frame: u32, x: f32) -> vmd::CameraKey {
        vmd::CameraKey {
            frame,
            distance: 10.0,
            position: [x, 0.0, 0.0],
            rotation: [0.0, 0.0, 0.0],
            ix: Interpolation::default(),
            iy: Interpolation::default(),
            iz: Interpolation::default(),
            ir: Interpolation::default(),
            id: Interpolation::default(),
            iv: Interpolation::default(),
            view_angle: 30,
            orthographic: false,
        }
    }

    #[test]
    fn consecutive_frames_increment_cut() {
        let seq = CameraSequence::from_vmd_keys(&[key(10, 0.0), key(11, 1.0), key(12, 2.0)]);
        let cuts: Vec<i32> = seq.track.keys().iter().map(|k| k.cut).collect();
        assert_eq!(cuts, vec![0, 1, 2]);
    }

    #[test]
    fn non_consecutive_frames_inherit_cut() {
        let seq = CameraSequence::from_vmd_keys(&[key(10, 0.0), key(11, 1.0), key(30, 2.0)]);
        let cuts: Vec<i32> = seq.track.keys().iter().map(|k| k.cut).collect();
        assert_eq!(cuts, vec![0, 1, 1]);
    }

    #[test]
    fn cut_boundary_holds_left() {
        let seq = CameraSequence::from_vmd_keys(&[key(10, 0.0), key(11, 100.0)]);
        let prop = seq.evaluate(10, 0.5).unwrap();
        assert_eq!(prop.location[0], 0.0);
    }

    #[test]
    fn interpolates_within_same_cut() {
        let seq = CameraSequence::from_vmd_keys(&[key(10, 0.0), key(30, 2.0)]);
        let prop = seq.evaluate(20, 0.0).unwrap();
        assert!((prop.location[0] - 1.0).abs() < 1e-2);
    }
}
