//! VMD data model.

use std::collections::HashMap;

use crate::interpolation::Interpolation;
use crate::track::{Keyed, Track};

pub type Vec3 = [f32; 3];
pub type Quat = [f32; 4];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionKey {
    pub frame: u32,
    pub position: Vec3,
    pub orientation: Quat,
    /// The raw 64-byte wire table, preserved verbatim aside from the
    /// eight load-bearing bytes per sub-curve and the two physics-flag
    /// bytes, so re-encoding round-trips filler bytes exactly.
    pub interpolation: [u8; 64],
    pub ix: Interpolation,
    pub iy: Interpolation,
    pub iz: Interpolation,
    pub ir: Interpolation,
    pub is_physics: bool,
}

impl Keyed for MotionKey {
    fn frame(&self) -> u32 {
        self.frame
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MorphKey {
    pub frame: u32,
    pub value: f32,
}

impl Keyed for MorphKey {
    fn frame(&self) -> u32 {
        self.frame
    }
}

/// A camera key as stored on a VMD file: each key carries its own six
/// interpolation curves directly rather than a packed table. Distinct
/// from [`crate::camera::CameraKey`], which additionally carries the
/// derived `cut` index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraKey {
    pub frame: u32,
    pub distance: f32,
    pub position: Vec3,
    pub rotation: Vec3,
    pub ix: Interpolation,
    pub iy: Interpolation,
    pub iz: Interpolation,
    pub ir: Interpolation,
    pub id: Interpolation,
    pub iv: Interpolation,
    pub view_angle: i32,
    pub orthographic: bool,
}

impl Keyed for CameraKey {
    fn frame(&self) -> u32 {
        self.frame
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightKey {
    pub frame: u32,
    pub color: Vec3,
    pub position: Vec3,
}

impl Keyed for LightKey {
    fn frame(&self) -> u32 {
        self.frame
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowKey {
    pub frame: u32,
    pub kind: i8,
    pub distance: f32,
}

impl Keyed for ShadowKey {
    fn frame(&self) -> u32 {
        self.frame
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityKey {
    pub frame: u32,
    pub visible: bool,
}

impl Keyed for VisibilityKey {
    fn frame(&self) -> u32 {
        self.frame
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IkKey {
    pub frame: u32,
    pub enable: bool,
}

impl Keyed for IkKey {
    fn frame(&self) -> u32 {
        self.frame
    }
}

/// A decoded or in-memory-built VMD motion file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vmd {
    pub model_name: String,
    pub motion_tracks: HashMap<String, Track<MotionKey>>,
    pub morph_tracks: HashMap<String, Track<MorphKey>>,
    pub camera_track: Track<CameraKey>,
    pub light_track: Track<LightKey>,
    pub shadow_track: Track<ShadowKey>,
    pub visibility_track: Track<VisibilityKey>,
    pub ik_tracks: HashMap<String, Track<IkKey>>,
}
