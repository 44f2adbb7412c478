//! VMD encoder. Mirrors the decoder phase-for-phase. The extension-key
//! section re-aggregates the visibility and per-name IK tracks by frame,
//! matching the decoder's expansion in reverse.

use std::collections::BTreeMap;

use crate::cursor::Writer;
use crate::text::ShiftJisCodec;

use super::types::*;

/// Encodes a complete VMD motion file to a byte buffer. Infallible.
pub fn encode(vmd: &Vmd) -> Vec<u8> {
    let mut w = Writer::new();
    let codec = ShiftJisCodec;

    w.write_bytes(b"Vocaloid Motion Data 0002\0\0\0\0\0");
    w.write_text_fixed(&vmd.model_name, 20, &codec);

    write_motions(&mut w, vmd, &codec);
    write_morphs(&mut w, vmd, &codec);
    write_cameras(&mut w, vmd);
    write_lights(&mut w, vmd);
    write_shadows(&mut w, vmd);
    write_extension_keys(&mut w, vmd, &codec);

    w.into_bytes()
}

fn write_motions(w: &mut Writer, vmd: &Vmd, codec: &ShiftJisCodec) {
    let total: usize = vmd.motion_tracks.values().map(Track::len).sum();
    w.write_u32(total as u32);
    for (name, track) in &vmd.motion_tracks {
        for key in track.keys() {
            w.write_text_fixed(name, 15, codec);
            w.write_u32(key.frame);
            w.write_vec3(key.position);
            w.write_vec4(key.orientation);

            let mut interp = key.interpolation;
            pack_interpolation(&mut interp, 0, &key.ix);
            pack_interpolation(&mut interp, 16, &key.iy);
            pack_interpolation(&mut interp, 32, &key.iz);
            pack_interpolation(&mut interp, 48, &key.ir);
            if key.is_physics {
                interp[2] = 0x63;
                interp[3] = 0x0f;
            }
            w.write_bytes(&interp);
        }
    }
}

fn pack_interpolation(buf: &mut [u8; 64], base: usize, interp: &crate::interpolation::Interpolation) {
    buf[base] = interp.x1 as u8;
    buf[base + 4] = interp.y1 as u8;
    buf[base + 8] = interp.x2 as u8;
    buf[base + 12] = interp.y2 as u8;
}

fn write_morphs(w: &mut Writer, vmd: &Vmd, codec: &ShiftJisCodec) {
    let total: usize = vmd.morph_tracks.values().map(Track::len).sum();
    w.write_u32(total as u32);
    for (name, track) in &vmd.morph_tracks {
        for key in track.keys() {
            w.write_text_fixed(name, 15, codec);
            w.write_u32(key.frame);
            w.write_f32(key.value);
        }
    }
}

fn write_cameras(w: &mut Writer, vmd: &Vmd) {
    w.write_u32(vmd.camera_track.len() as u32);
    for key in vmd.camera_track.keys() {
        w.write_u32(key.frame);
        w.write_f32(key.distance);
        w.write_vec3(key.position);
        w.write_vec3(key.rotation);
        for interp in [key.ix, key.iy, key.iz, key.ir, key.id, key.iv] {
            w.write_i8(interp.x1);
            w.write_i8(interp.y1);
            w.write_i8(interp.x2);
            w.write_i8(interp.y2);
        }
        w.write_i32(key.view_angle);
        w.write_bool(key.orthographic);
    }
}

fn write_lights(w: &mut Writer, vmd: &Vmd) {
    w.write_u32(vmd.light_track.len() as u32);
    for key in vmd.light_track.keys() {
        w.write_u32(key.frame);
        w.write_vec3(key.color);
        w.write_vec3(key.position);
    }
}

fn write_shadows(w: &mut Writer, vmd: &Vmd) {
    w.write_u32(vmd.shadow_track.len() as u32);
    for key in vmd.shadow_track.keys() {
        w.write_u32(key.frame);
        w.write_i8(key.kind);
        w.write_f32(key.distance);
    }
}

fn write_extension_keys(w: &mut Writer, vmd: &Vmd, codec: &ShiftJisCodec) {
    #[derive(Default)]
    struct ExKey<'a> {
        visible: bool,
        iks: BTreeMap<&'a str, bool>,
    }

    let mut ex_keys: BTreeMap<u32, ExKey> = BTreeMap::new();

    for key in vmd.visibility_track.keys() {
        ex_keys.entry(key.frame).or_insert_with(|| ExKey {
            visible: true,
            iks: BTreeMap::new(),
        }).visible = key.visible;
    }
    for (name, track) in &vmd.ik_tracks {
        for key in track.keys() {
            ex_keys
                .entry(key.frame)
                .or_insert_with(|| ExKey {
                    visible: true,
                    iks: BTreeMap::new(),
                })
                .iks
                .insert(name.as_str(), key.enable);
        }
    }

    w.write_u32(ex_keys.len() as u32);
    for (frame, entry) in &ex_keys {
        w.write_u32(*frame);
        w.write_bool(entry.visible);
        w.write_u32(entry.iks.len() as u32);
        for (name, enable) in &entry.iks {
            w.write_text_fixed(name, 20, codec);
            w.write_bool(*enable);
        }
    }
}
