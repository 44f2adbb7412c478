//! PMX encoder. Mirrors the decoder phase-for-phase but always emits a
//! data-count of 8 and index width 4 for every field — it does not try
//! to recompress indices back down to 1 or 2 bytes.

use crate::cursor::Writer;
use crate::text::{TextCodec, Utf16LeCodec};

use super::types::*;

const WIDTH: u8 = 4;

/// Encodes a complete PMX model to a byte buffer. Infallible: the model
/// in memory is always well-formed enough to serialise.
pub fn encode(pmx: &Pmx) -> Vec<u8> {
    let mut w = Writer::new();
    let codec = Utf16LeCodec;

    w.write_bytes(b"PMX ");
    w.write_f32(2.0);
    w.write_u8(8);
    w.write_u8(0); // encoding: UTF-16LE
    w.write_u8(pmx.additional_uv);
    for _ in 0..6 {
        w.write_u8(WIDTH);
    }

    w.write_text_prefixed(&pmx.model_info.name, &codec);
    w.write_text_prefixed(&pmx.model_info.name_en, &codec);
    w.write_text_prefixed(&pmx.model_info.comment, &codec);
    w.write_text_prefixed(&pmx.model_info.comment_en, &codec);

    write_vertices(&mut w, &pmx.vertices, pmx.additional_uv);
    write_faces(&mut w, &pmx.faces);
    write_textures(&mut w, &pmx.textures, &codec);
    write_materials(&mut w, &pmx.materials, &codec);
    write_bones(&mut w, &pmx.bones, &codec);
    write_morphs(&mut w, &pmx.morphs, &codec);
    write_display_nodes(&mut w, &pmx.display_nodes, &codec);
    write_rigid_bodies(&mut w, &pmx.rigid_bodies, &codec);
    write_joints(&mut w, &pmx.joints, &codec);

    w.into_bytes()
}

fn write_vertices(w: &mut Writer, vertices: &[Vertex], additional_uv: u8) {
    w.write_i32(vertices.len() as i32);
    for v in vertices {
        w.write_vec3(v.position);
        w.write_vec3(v.normal);
        w.write_vec2(v.uv);
        for slot in v.additional_uv.iter().take(additional_uv as usize) {
            w.write_vec4(*slot);
        }
        match v.weight_kind {
            WeightKind::Bdef1 => {
                w.write_u8(0);
                w.write_signed_index(WIDTH, v.bone_indices[0]);
            }
            WeightKind::Bdef2 => {
                w.write_u8(1);
                w.write_signed_index(WIDTH, v.bone_indices[0]);
                w.write_signed_index(WIDTH, v.bone_indices[1]);
                w.write_f32(v.bone_weights[0]);
            }
            WeightKind::Bdef4 => {
                w.write_u8(2);
                for i in 0..4 {
                    w.write_signed_index(WIDTH, v.bone_indices[i]);
                }
                for i in 0..4 {
                    w.write_f32(v.bone_weights[i]);
                }
            }
            WeightKind::Sdef => {
                w.write_u8(3);
                w.write_signed_index(WIDTH, v.bone_indices[0]);
                w.write_signed_index(WIDTH, v.bone_indices[1]);
                w.write_f32(v.bone_weights[0]);
                w.write_vec3(v.sdef_c);
                w.write_vec3(v.sdef_r0);
                w.write_vec3(v.sdef_r1);
            }
        }
        w.write_f32(v.edge_scale);
    }
}

fn write_faces(w: &mut Writer, faces: &[[i32; 3]]) {
    w.write_i32((faces.len() * 3) as i32);
    for face in faces {
        for &idx in face {
            w.write_vertex_index(WIDTH, idx);
        }
    }
}

fn write_textures(w: &mut Writer, textures: &[String], codec: &dyn TextCodec) {
    w.write_i32(textures.len() as i32);
    for t in textures {
        w.write_text_prefixed(t, codec);
    }
}

fn write_materials(w: &mut Writer, materials: &[Material], codec: &dyn TextCodec) {
    w.write_i32(materials.len() as i32);
    for m in materials {
        w.write_text_prefixed(&m.name, codec);
        w.write_text_prefixed(&m.name_en, codec);
        w.write_vec4(m.diffuse);
        w.write_vec3(m.specular);
        w.write_f32(m.specular_factor);
        w.write_vec3(m.ambient);
        w.write_u8(m.draw_mode.bits());
        w.write_vec4(m.edge_color);
        w.write_f32(m.edge_size);
        w.write_signed_index(WIDTH, m.texture_index);
        w.write_signed_index(WIDTH, m.sphere_texture_index);
        w.write_u8(match m.sphere_mode {
            SphereMode::Disabled => 0,
            SphereMode::Multiply => 1,
            SphereMode::Add => 2,
            SphereMode::SubTexture => 3,
        });
        match m.toon_mode {
            ToonMode::Separate(idx) => {
                w.write_u8(0);
                w.write_signed_index(WIDTH, idx);
            }
            ToonMode::Common(idx) => {
                w.write_u8(1);
                w.write_u8(idx);
            }
        }
        w.write_text_prefixed(&m.memo, codec);
        w.write_i32(m.vertex_span);
    }
}

fn write_bones(w: &mut Writer, bones: &[Bone], codec: &dyn TextCodec) {
    w.write_i32(bones.len() as i32);
    for b in bones {
        w.write_text_prefixed(&b.name, codec);
        w.write_text_prefixed(&b.name_en, codec);
        w.write_vec3(b.position);
        w.write_signed_index(WIDTH, b.parent);
        w.write_i32(b.deform_depth);
        w.write_u16(bone_flags(b).bits());

        match b.tip {
            BoneTip::Bone(idx) => w.write_signed_index(WIDTH, idx),
            BoneTip::Offset(v) => w.write_vec3(v),
        }

        match b.drive {
            BoneDrive::None => {}
            BoneDrive::Rotation(idx, rate)
            | BoneDrive::Translation(idx, rate)
            | BoneDrive::Both(idx, rate) => {
                w.write_signed_index(WIDTH, idx);
                w.write_f32(rate);
            }
        }

        if let Some(axis) = b.fixed_axis {
            w.write_vec3(axis);
        }
        if let Some((x, z)) = b.local_axis {
            w.write_vec3(x);
            w.write_vec3(z);
        }
        if let Some(key) = b.external_parent_key {
            w.write_i32(key);
        }
        if let Some(ik) = &b.ik {
            w.write_signed_index(WIDTH, ik.target_bone_index);
            w.write_i32(ik.iteration_count);
            w.write_f32(ik.angle_limit);
            w.write_i32(ik.links.len() as i32);
            for link in &ik.links {
                w.write_signed_index(WIDTH, link.bone_index);
                match link.angle_limit {
                    Some((min, max)) => {
                        w.write_u8(1);
                        w.write_vec3(min);
                        w.write_vec3(max);
                    }
                    None => w.write_u8(0),
                }
            }
        }
    }
}

fn bone_flags(b: &Bone) -> BoneFlags {
    let mut flags = BoneFlags::empty();
    if matches!(b.tip, BoneTip::Bone(_)) {
        flags |= BoneFlags::CONNECT_TO_OTHER_BONE;
    }
    flags.set(BoneFlags::ROTATABLE, b.rotatable);
    flags.set(BoneFlags::TRANSLATABLE, b.translatable);
    flags.set(BoneFlags::IS_VISIBLE, b.visible);
    flags.set(BoneFlags::ENABLED, b.controllable);
    flags.set(BoneFlags::IK, b.ik.is_some());
    match b.drive {
        BoneDrive::None => {}
        BoneDrive::Rotation(..) => flags |= BoneFlags::INHERIT_ROTATION,
        BoneDrive::Translation(..) => flags |= BoneFlags::INHERIT_TRANSLATION,
        BoneDrive::Both(..) => flags |= BoneFlags::INHERIT_ROTATION | BoneFlags::INHERIT_TRANSLATION,
    }
    flags.set(BoneFlags::FIXED_AXIS, b.fixed_axis.is_some());
    flags.set(BoneFlags::LOCAL_COORDINATE, b.local_axis.is_some());
    flags.set(BoneFlags::PHYSICS_AFTER_DEFORM, b.physics_after_deform);
    flags.set(
        BoneFlags::EXTERNAL_PARENT_DEFORM,
        b.external_parent_key.is_some(),
    );
    flags
}

/// Rank used to group morphs by kind on encode, independent of their
/// order in the in-memory `Vec`: vertex, UV, bone, material, group.
fn morph_kind_rank(kind: &MorphKind) -> u8 {
    match kind {
        MorphKind::Vertex(_) => 0,
        MorphKind::Uv { .. } => 1,
        MorphKind::Bone(_) => 2,
        MorphKind::Material(_) => 3,
        MorphKind::Group(_) => 4,
    }
}

fn write_morphs(w: &mut Writer, morphs: &[Morph], codec: &dyn TextCodec) {
    let mut ordered: Vec<&Morph> = morphs.iter().collect();
    ordered.sort_by_key(|m| morph_kind_rank(&m.kind));

    w.write_i32(ordered.len() as i32);
    for m in ordered {
        w.write_text_prefixed(&m.name, codec);
        w.write_text_prefixed(&m.name_en, codec);
        w.write_u8(match m.panel {
            ControlPanel::System => 0,
            ControlPanel::BottomLeft => 1,
            ControlPanel::TopLeft => 2,
            ControlPanel::TopRight => 3,
            ControlPanel::BottomRight => 4,
        });
        match &m.kind {
            MorphKind::Group(offsets) => {
                w.write_u8(0);
                w.write_i32(offsets.len() as i32);
                for o in offsets {
                    w.write_signed_index(WIDTH, o.morph_index);
                    w.write_f32(o.weight);
                }
            }
            MorphKind::Vertex(offsets) => {
                w.write_u8(1);
                w.write_i32(offsets.len() as i32);
                for o in offsets {
                    w.write_vertex_index(WIDTH, o.vertex_index);
                    w.write_vec3(o.offset);
                }
            }
            MorphKind::Bone(offsets) => {
                w.write_u8(2);
                w.write_i32(offsets.len() as i32);
                for o in offsets {
                    w.write_signed_index(WIDTH, o.bone_index);
                    w.write_vec3(o.translation);
                    w.write_vec4(o.rotation);
                }
            }
            MorphKind::Uv { channel, offsets } => {
                w.write_u8(match channel {
                    UvChannel::Base => 3,
                    UvChannel::Extra1 => 4,
                    UvChannel::Extra2 => 5,
                    UvChannel::Extra3 => 6,
                    UvChannel::Extra4 => 7,
                });
                w.write_i32(offsets.len() as i32);
                for o in offsets {
                    w.write_vertex_index(WIDTH, o.vertex_index);
                    w.write_vec4(o.offset);
                }
            }
            MorphKind::Material(offsets) => {
                w.write_u8(8);
                w.write_i32(offsets.len() as i32);
                for o in offsets {
                    w.write_signed_index(WIDTH, o.material_index);
                    w.write_u8(o.formula);
                    w.write_vec4(o.diffuse);
                    w.write_vec3(o.specular);
                    w.write_f32(o.specular_factor);
                    w.write_vec3(o.ambient);
                    w.write_vec4(o.edge_color);
                    w.write_f32(o.edge_size);
                    w.write_vec4(o.texture_factor);
                    w.write_vec4(o.sphere_texture_factor);
                    w.write_vec4(o.toon_texture_factor);
                }
            }
        }
    }
}

fn write_display_nodes(w: &mut Writer, nodes: &[DisplayNode], codec: &dyn TextCodec) {
    w.write_i32(nodes.len() as i32);
    for n in nodes {
        w.write_text_prefixed(&n.name, codec);
        w.write_text_prefixed(&n.name_en, codec);
        w.write_bool(n.is_special);
        w.write_i32(n.items.len() as i32);
        for item in &n.items {
            match item.target {
                DisplayTarget::Bone => {
                    w.write_u8(0);
                    w.write_signed_index(WIDTH, item.index);
                }
                DisplayTarget::Morph => {
                    w.write_u8(1);
                    w.write_signed_index(WIDTH, item.index);
                }
            }
        }
    }
}

fn write_rigid_bodies(w: &mut Writer, bodies: &[RigidBody], codec: &dyn TextCodec) {
    w.write_i32(bodies.len() as i32);
    for r in bodies {
        w.write_text_prefixed(&r.name, codec);
        w.write_text_prefixed(&r.name_en, codec);
        w.write_signed_index(WIDTH, r.bone_index);
        w.write_u8(r.group);
        w.write_u16(r.non_collision_mask);
        w.write_u8(match r.shape {
            RigidShape::Sphere => 0,
            RigidShape::Box => 1,
            RigidShape::Capsule => 2,
        });
        w.write_vec3(r.size);
        w.write_vec3(r.position);
        w.write_vec3(r.rotation);
        w.write_f32(r.mass);
        w.write_f32(r.move_attenuation);
        w.write_f32(r.rotation_attenuation);
        w.write_f32(r.repulsion);
        w.write_f32(r.friction);
        w.write_u8(match r.calc_method {
            RigidCalcMethod::Static => 0,
            RigidCalcMethod::Dynamic => 1,
            RigidCalcMethod::DynamicWithBonePosition => 2,
        });
    }
}

fn write_joints(w: &mut Writer, joints: &[Joint], codec: &dyn TextCodec) {
    w.write_i32(joints.len() as i32);
    for j in joints {
        w.write_text_prefixed(&j.name, codec);
        w.write_text_prefixed(&j.name_en, codec);
        let (
            kind_byte,
            move_limit_min,
            move_limit_max,
            rotation_limit_min,
            rotation_limit_max,
            spring_move,
            spring_rotation,
        ) = joint_raw_fields(&j.kind);
        w.write_u8(kind_byte);
        w.write_signed_index(WIDTH, j.rigid_a);
        w.write_signed_index(WIDTH, j.rigid_b);
        w.write_vec3(j.position);
        w.write_vec3(j.rotation);
        w.write_vec3(move_limit_min);
        w.write_vec3(move_limit_max);
        w.write_vec3(rotation_limit_min);
        w.write_vec3(rotation_limit_max);
        w.write_vec3(spring_move);
        w.write_vec3(spring_rotation);
    }
}

type JointRawFields = (u8, Vec3, Vec3, Vec3, Vec3, Vec3, Vec3);

/// Packs the typed [`JointKind`] back into the flat raw 6-vec3 block the
/// PMX format always writes regardless of joint type (mirrors the inverse
/// of the decoder's per-type field extraction).
fn joint_raw_fields(kind: &JointKind) -> JointRawFields {
    let zero = [0.0f32; 3];
    match *kind {
        JointKind::Spring6Dof {
            move_limit_min,
            move_limit_max,
            rotation_limit_min,
            rotation_limit_max,
            spring_move,
            spring_rotation,
        } => (
            0,
            move_limit_min,
            move_limit_max,
            rotation_limit_min,
            rotation_limit_max,
            spring_move,
            spring_rotation,
        ),
        JointKind::SixDof {
            move_limit_min,
            move_limit_max,
            rotation_limit_min,
            rotation_limit_max,
        } => (
            1,
            move_limit_min,
            move_limit_max,
            rotation_limit_min,
            rotation_limit_max,
            zero,
            zero,
        ),
        JointKind::P2p => (2, zero, zero, zero, zero, zero, zero),
        JointKind::ConeTwist {
            swing_span1,
            swing_span2,
            twist_span,
            softness,
            bias_factor,
            relaxation_factor,
            damping,
            fix_thresh,
            enable_motor,
            max_motor_impulse,
            motor_target,
        } => (
            3,
            [damping, 0.0, if enable_motor { 1.0 } else { 0.0 }],
            [fix_thresh, 0.0, max_motor_impulse],
            [twist_span, swing_span2, swing_span1],
            zero,
            [softness, bias_factor, relaxation_factor],
            motor_target,
        ),
        JointKind::Slider {
            lower_linear_limit,
            upper_linear_limit,
            lower_angle_limit,
            upper_angle_limit,
            power_linear_motor,
            target_linear_motor_velocity,
            max_linear_motor_force,
            power_angular_motor,
            target_angular_motor_velocity,
            max_angular_motor_force,
        } => (
            4,
            [lower_linear_limit, 0.0, 0.0],
            [upper_linear_limit, 0.0, 0.0],
            [lower_angle_limit, 0.0, 0.0],
            [upper_angle_limit, 0.0, 0.0],
            [
                if power_linear_motor { 1.0 } else { 0.0 },
                target_linear_motor_velocity,
                max_linear_motor_force,
            ],
            [
                if power_angular_motor { 1.0 } else { 0.0 },
                target_angular_motor_velocity,
                max_angular_motor_force,
            ],
        ),
        JointKind::Hinge {
            low,
            high,
            softness,
            bias_factor,
            relaxation_factor,
            enable_motor,
            target_velocity,
            max_motor_impulse,
        } => (
            5,
            [low, 0.0, 0.0],
            [high, 0.0, 0.0],
            zero,
            zero,
            [softness, bias_factor, relaxation_factor],
            [
                if enable_motor { 1.0 } else { 0.0 },
                target_velocity,
                max_motor_impulse,
            ],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::TryInto;

    #[test]
    fn morphs_are_grouped_by_kind_in_wire_order() {
        let morphs = vec![
            Morph {
                name: "g".into(),
                name_en: String::new(),
                panel: ControlPanel::System,
                kind: MorphKind::Group(vec![]),
            },
            Morph {
                name: "m".into(),
                name_en: String::new(),
                panel: ControlPanel::System,
                kind: MorphKind::Material(vec![]),
            },
            Morph {
                name: "v".into(),
                name_en: String::new(),
                panel: ControlPanel::System,
                kind: MorphKind::Vertex(vec![]),
            },
            Morph {
                name: "u".into(),
                name_en: String::new(),
                panel: ControlPanel::System,
                kind: MorphKind::Uv {
                    channel: UvChannel::Base,
                    offsets: vec![],
                },
            },
            Morph {
                name: "b".into(),
                name_en: String::new(),
                panel: ControlPanel::System,
                kind: MorphKind::Bone(vec![]),
            },
        ];

        let mut w = Writer::new();
        write_morphs(&mut w, &morphs, &Utf16LeCodec);
        let bytes = w.into_bytes();

        // count (i32) then, per record: name len(i32) + name + name_en
        // len(i32) + panel(u8) + kind byte(u8) + offset count(i32).
        // Walk the kind bytes out in order to assert wire grouping.
        let mut pos = 4usize;
        let mut kinds = Vec::new();
        for _ in 0..morphs.len() {
            let read_str_len = |p: usize| {
                i32::from_le_bytes(bytes[p..p + 4].try_into().unwrap()) as usize
            };
            let name_len = read_str_len(pos);
            pos += 4 + name_len;
            let name_en_len = read_str_len(pos);
            pos += 4 + name_en_len;
            pos += 1; // panel
            kinds.push(bytes[pos]);
            pos += 1; // kind byte
            let offset_count = read_str_len(pos);
            pos += 4;
            assert_eq!(offset_count, 0);
        }
        assert_eq!(kinds, vec![1, 3, 2, 8, 0]);
    }
}
