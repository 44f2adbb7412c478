//! VMD decoder. Phases: magic + name, motions, morphs, cameras, lights,
//! shadows, extension keys, then an EOF check.

use std::collections::HashMap;

use crate::cursor::Cursor;
use crate::error::VmdError;
use crate::interpolation::Interpolation;
use crate::text::ShiftJisCodec;
use crate::track::Track;

use super::types::*;

const MAGIC: &[u8; 30] = b"Vocaloid Motion Data 0002\0\0\0\0\0";

/// Decodes a complete VMD motion file from a byte buffer.
pub fn decode(bytes: &[u8]) -> Result<Vmd, VmdError> {
    let mut cur = Cursor::new(bytes);
    let codec = ShiftJisCodec;

    if !cur.equal(MAGIC) {
        return Err(VmdError::BadMagic);
    }
    let model_name = cur.read_text_fixed(20, &codec);
    log::trace!("vmd: header ok, model \"{model_name}\"");

    let motion_tracks = read_motions(&mut cur, &codec);
    log::trace!("vmd: read {} motion tracks", motion_tracks.len());
    let morph_tracks = read_morphs(&mut cur, &codec);
    log::trace!("vmd: read {} morph tracks", morph_tracks.len());
    let camera_track = read_cameras(&mut cur);
    log::trace!("vmd: read {} camera keys", camera_track.len());
    let light_track = read_lights(&mut cur);
    log::trace!("vmd: read {} light keys", light_track.len());
    let shadow_track = read_shadows(&mut cur);
    log::trace!("vmd: read {} shadow keys", shadow_track.len());
    let (visibility_track, ik_tracks) = read_extension_keys(&mut cur, &codec);
    log::trace!(
        "vmd: read {} visibility keys, {} ik tracks",
        visibility_track.len(),
        ik_tracks.len()
    );

    if cur.overflown() {
        log::warn!("vmd: decode overflowed the input buffer");
        return Err(VmdError::Truncated);
    }
    if !cur.at_eof() {
        log::warn!("vmd: {} trailing bytes after a complete decode", cur.remaining());
        return Err(VmdError::TrailingData(cur.remaining()));
    }

    Ok(Vmd {
        model_name,
        motion_tracks,
        morph_tracks,
        camera_track,
        light_track,
        shadow_track,
        visibility_track,
        ik_tracks,
    })
}

fn unpack_interpolation(bytes: &[u8; 64], base: usize) -> Interpolation {
    Interpolation::new(
        bytes[base] as i8,
        bytes[base + 4] as i8,
        bytes[base + 8] as i8,
        bytes[base + 12] as i8,
    )
}

fn read_motions(cur: &mut Cursor, codec: &ShiftJisCodec) -> HashMap<String, Track<MotionKey>> {
    let count = cur.read_u32() as usize;
    let mut tracks: HashMap<String, Vec<MotionKey>> = HashMap::new();
    for _ in 0..count {
        let name = cur.read_text_fixed(15, codec);
        let frame = cur.read_u32();
        let position = cur.read_vec3();
        let orientation = cur.read_vec4();
        let raw = cur.read_bytes(64);
        let mut interpolation = [0u8; 64];
        interpolation.copy_from_slice(&raw);
        let ix = unpack_interpolation(&interpolation, 0);
        let iy = unpack_interpolation(&interpolation, 16);
        let iz = unpack_interpolation(&interpolation, 32);
        let ir = unpack_interpolation(&interpolation, 48);
        let is_physics = !(interpolation[2] == 0x63 && interpolation[3] == 0x0f);
        tracks.entry(name).or_default().push(MotionKey {
            frame,
            position,
            orientation,
            interpolation,
            ix,
            iy,
            iz,
            ir,
            is_physics,
        });
    }
    tracks
        .into_iter()
        .map(|(name, keys)| (name, Track::from_keys(keys)))
        .collect()
}

fn read_morphs(cur: &mut Cursor, codec: &ShiftJisCodec) -> HashMap<String, Track<MorphKey>> {
    let count = cur.read_u32() as usize;
    let mut tracks: HashMap<String, Vec<MorphKey>> = HashMap::new();
    for _ in 0..count {
        let name = cur.read_text_fixed(15, codec);
        let frame = cur.read_u32();
        let value = cur.read_f32();
        tracks.entry(name).or_default().push(MorphKey { frame, value });
    }
    tracks
        .into_iter()
        .filter(|(_, keys)| !(keys.len() == 1 && keys[0].frame == 0 && keys[0].value == 0.0))
        .map(|(name, keys)| (name, Track::from_keys(keys)))
        .collect()
}

fn read_cameras(cur: &mut Cursor) -> Track<CameraKey> {
    let count = cur.read_u32() as usize;
    let mut keys = Vec::with_capacity(count.min(1 << 16));
    for _ in 0..count {
        keys.push(CameraKey {
            frame: cur.read_u32(),
            distance: cur.read_f32(),
            position: cur.read_vec3(),
            rotation: cur.read_vec3(),
            ix: read_interpolation(cur),
            iy: read_interpolation(cur),
            iz: read_interpolation(cur),
            ir: read_interpolation(cur),
            id: read_interpolation(cur),
            iv: read_interpolation(cur),
            view_angle: cur.read_i32(),
            orthographic: cur.read_bool(),
        });
    }
    Track::from_keys(keys)
}

fn read_interpolation(cur: &mut Cursor) -> Interpolation {
    Interpolation::new(cur.read_i8(), cur.read_i8(), cur.read_i8(), cur.read_i8())
}

fn read_lights(cur: &mut Cursor) -> Track<LightKey> {
    let count = cur.read_u32() as usize;
    let mut keys = Vec::with_capacity(count.min(1 << 16));
    for _ in 0..count {
        keys.push(LightKey {
            frame: cur.read_u32(),
            color: cur.read_vec3(),
            position: cur.read_vec3(),
        });
    }
    Track::from_keys(keys)
}

fn read_shadows(cur: &mut Cursor) -> Track<ShadowKey> {
    let count = cur.read_u32() as usize;
    let mut keys = Vec::with_capacity(count.min(1 << 16));
    for _ in 0..count {
        keys.push(ShadowKey {
            frame: cur.read_u32(),
            kind: cur.read_i8(),
            distance: cur.read_f32(),
        });
    }
    Track::from_keys(keys)
}

fn read_extension_keys(
    cur: &mut Cursor,
    codec: &ShiftJisCodec,
) -> (Track<VisibilityKey>, HashMap<String, Track<IkKey>>) {
    let count = cur.read_u32() as usize;
    let mut visibility = Vec::with_capacity(count.min(1 << 16));
    let mut ik_tracks: HashMap<String, Vec<IkKey>> = HashMap::new();
    for _ in 0..count {
        let frame = cur.read_u32();
        let visible = cur.read_bool();
        visibility.push(VisibilityKey { frame, visible });
        let ik_count = cur.read_u32() as usize;
        for _ in 0..ik_count {
            let name = cur.read_text_fixed(20, codec);
            let enable = cur.read_bool();
            ik_tracks
                .entry(name)
                .or_default()
                .push(IkKey { frame, enable });
        }
    }
    (
        Track::from_keys(visibility),
        ik_tracks
            .into_iter()
            .map(|(name, keys)| (name, Track::from_keys(keys)))
            .collect(),
    )
}
