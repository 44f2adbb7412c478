//! PMX decoder. Runs the phases in file order: header, vertices, faces,
//! textures, materials, bones, morphs, display nodes, rigid bodies,
//! joints, then an EOF check.

use std::convert::TryFrom;

use crate::cursor::Cursor;
use crate::error::PmxError;
use crate::text::{TextCodec, Utf16LeCodec};

use super::types::*;

const MAGIC: [u8; 4] = *b"PMX ";

struct Widths {
    vertex: u8,
    texture: u8,
    material: u8,
    bone: u8,
    morph: u8,
    rigid_body: u8,
}

/// Decodes a complete PMX model from a byte buffer.
pub fn decode(bytes: &[u8]) -> Result<Pmx, PmxError> {
    let mut cur = Cursor::new(bytes);
    let codec = Utf16LeCodec;

    if !cur.equal(&MAGIC) {
        return Err(PmxError::BadMagic);
    }
    let version = cur.read_f32();
    if (version - 2.0).abs() > 0.001 {
        return Err(PmxError::UnsupportedVersion(version));
    }
    let data_count = cur.read_u8();
    if data_count != 8 {
        return Err(PmxError::Truncated);
    }
    let encoding = cur.read_u8();
    if encoding != 0 {
        return Err(PmxError::UnsupportedEncoding(encoding));
    }
    let additional_uv = cur.read_u8();
    let widths = Widths {
        vertex: cur.read_u8(),
        texture: cur.read_u8(),
        material: cur.read_u8(),
        bone: cur.read_u8(),
        morph: cur.read_u8(),
        rigid_body: cur.read_u8(),
    };
    for w in [
        widths.vertex,
        widths.texture,
        widths.material,
        widths.bone,
        widths.morph,
        widths.rigid_body,
    ] {
        IndexWidth::try_from(w)?;
    }

    let model_info = ModelInfo {
        name: cur.read_text_prefixed(&codec),
        name_en: cur.read_text_prefixed(&codec),
        comment: cur.read_text_prefixed(&codec),
        comment_en: cur.read_text_prefixed(&codec),
    };

    log::trace!("pmx: header ok, model \"{}\"", model_info.name);

    let vertices = read_vertices(&mut cur, &widths, additional_uv)?;
    log::trace!("pmx: read {} vertices", vertices.len());
    let faces = read_faces(&mut cur, &widths)?;
    log::trace!("pmx: read {} faces", faces.len());
    let textures = read_textures(&mut cur, &codec);
    log::trace!("pmx: read {} textures", textures.len());
    let materials = read_materials(&mut cur, &widths, &codec)?;
    log::trace!("pmx: read {} materials", materials.len());
    let bones = read_bones(&mut cur, &widths, &codec)?;
    log::trace!("pmx: read {} bones", bones.len());
    let morphs = read_morphs(&mut cur, &widths, &codec)?;
    log::trace!("pmx: read {} morphs", morphs.len());
    let display_nodes = read_display_nodes(&mut cur, &widths, &codec)?;
    log::trace!("pmx: read {} display nodes", display_nodes.len());
    let rigid_bodies = read_rigid_bodies(&mut cur, &widths, &codec)?;
    log::trace!("pmx: read {} rigid bodies", rigid_bodies.len());
    let joints = read_joints(&mut cur, &widths, &codec)?;
    log::trace!("pmx: read {} joints", joints.len());

    if cur.overflown() {
        log::warn!("pmx: decode overflowed the input buffer");
        return Err(PmxError::Truncated);
    }
    if !cur.at_eof() {
        log::warn!("pmx: {} trailing bytes after a complete decode", cur.remaining());
        return Err(PmxError::TrailingData(cur.remaining()));
    }

    Ok(Pmx {
        model_info,
        additional_uv,
        vertices,
        faces,
        textures,
        materials,
        bones,
        morphs,
        display_nodes,
        rigid_bodies,
        joints,
    })
}

fn read_vertices(
    cur: &mut Cursor,
    widths: &Widths,
    additional_uv: u8,
) -> Result<Vec<Vertex>, PmxError> {
    let count = cur.read_i32().max(0) as usize;
    let mut out = Vec::with_capacity(count.min(1 << 20));
    for _ in 0..count {
        let position = cur.read_vec3();
        let normal = cur.read_vec3();
        let uv = cur.read_vec2();
        let mut uvs = [[0.0f32; 4]; 4];
        for slot in uvs.iter_mut().take(additional_uv as usize) {
            *slot = cur.read_vec4();
        }
        let weight_type = cur.read_u8();
        let mut v = Vertex {
            position,
            normal,
            uv,
            additional_uv: uvs,
            ..Vertex::default()
        };
        match weight_type {
            0 => {
                v.weight_kind = WeightKind::Bdef1;
                v.bone_indices[0] = cur.read_signed_index(widths.bone);
            }
            1 => {
                v.weight_kind = WeightKind::Bdef2;
                v.bone_indices[0] = cur.read_signed_index(widths.bone);
                v.bone_indices[1] = cur.read_signed_index(widths.bone);
                v.bone_weights[0] = cur.read_f32();
            }
            2 => {
                v.weight_kind = WeightKind::Bdef4;
                for i in 0..4 {
                    v.bone_indices[i] = cur.read_signed_index(widths.bone);
                }
                for i in 0..4 {
                    v.bone_weights[i] = cur.read_f32();
                }
            }
            3 => {
                v.weight_kind = WeightKind::Sdef;
                v.bone_indices[0] = cur.read_signed_index(widths.bone);
                v.bone_indices[1] = cur.read_signed_index(widths.bone);
                v.bone_weights[0] = cur.read_f32();
                v.sdef_c = cur.read_vec3();
                v.sdef_r0 = cur.read_vec3();
                v.sdef_r1 = cur.read_vec3();
            }
            other => return Err(PmxError::InvalidWeightKind(other)),
        }
        v.edge_scale = cur.read_f32();
        out.push(v);
    }
    Ok(out)
}

fn read_faces(cur: &mut Cursor, widths: &Widths) -> Result<Vec<[i32; 3]>, PmxError> {
    let index_count = cur.read_i32().max(0) as usize;
    if index_count % 3 != 0 {
        return Err(PmxError::InvalidFaceCount(index_count));
    }
    let mut out = Vec::with_capacity((index_count / 3).min(1 << 20));
    for _ in 0..(index_count / 3) {
        out.push([
            cur.read_vertex_index(widths.vertex),
            cur.read_vertex_index(widths.vertex),
            cur.read_vertex_index(widths.vertex),
        ]);
    }
    Ok(out)
}

fn read_textures(cur: &mut Cursor, codec: &dyn TextCodec) -> Vec<String> {
    let count = cur.read_i32().max(0) as usize;
    (0..count).map(|_| cur.read_text_prefixed(codec)).collect()
}

fn read_materials(
    cur: &mut Cursor,
    widths: &Widths,
    codec: &dyn TextCodec,
) -> Result<Vec<Material>, PmxError> {
    let count = cur.read_i32().max(0) as usize;
    let mut out = Vec::with_capacity(count.min(1 << 16));
    for _ in 0..count {
        let name = cur.read_text_prefixed(codec);
        let name_en = cur.read_text_prefixed(codec);
        let diffuse = cur.read_vec4();
        let specular = cur.read_vec3();
        let specular_factor = cur.read_f32();
        let ambient = cur.read_vec3();
        let draw_mode = MaterialFlags::from_bits_truncate(cur.read_u8());
        let edge_color = cur.read_vec4();
        let edge_size = cur.read_f32();
        let texture_index = cur.read_signed_index(widths.texture);
        let sphere_texture_index = cur.read_signed_index(widths.texture);
        let sphere_mode = SphereMode::try_from(cur.read_u8())?;
        let toon_mode = match cur.read_u8() {
            0 => ToonMode::Separate(cur.read_signed_index(widths.texture)),
            1 => ToonMode::Common(cur.read_u8()),
            other => return Err(PmxError::InvalidToonMode(other)),
        };
        let memo = cur.read_text_prefixed(codec);
        let vertex_span = cur.read_i32();
        out.push(Material {
            name,
            name_en,
            diffuse,
            specular,
            specular_factor,
            ambient,
            draw_mode,
            edge_color,
            edge_size,
            texture_index,
            sphere_texture_index,
            sphere_mode,
            toon_mode,
            memo,
            vertex_span,
        });
    }
    Ok(out)
}

fn read_bones(
    cur: &mut Cursor,
    widths: &Widths,
    codec: &dyn TextCodec,
) -> Result<Vec<Bone>, PmxError> {
    let count = cur.read_i32().max(0) as usize;
    let mut out = Vec::with_capacity(count.min(1 << 16));
    for _ in 0..count {
        let name = cur.read_text_prefixed(codec);
        let name_en = cur.read_text_prefixed(codec);
        let position = cur.read_vec3();
        let parent = cur.read_signed_index(widths.bone);
        let deform_depth = cur.read_i32();
        let flags = BoneFlags::from_bits_truncate(cur.read_u16());

        let tip = if flags.intersects(BoneFlags::CONNECT_TO_OTHER_BONE) {
            BoneTip::Bone(cur.read_signed_index(widths.bone))
        } else {
            BoneTip::Offset(cur.read_vec3())
        };

        let drive = if flags.intersects(BoneFlags::INHERIT_ROTATION | BoneFlags::INHERIT_TRANSLATION)
        {
            let index = cur.read_signed_index(widths.bone);
            let rate = cur.read_f32();
            let rotation = flags.intersects(BoneFlags::INHERIT_ROTATION);
            let translation = flags.intersects(BoneFlags::INHERIT_TRANSLATION);
            match (rotation, translation) {
                (true, true) => BoneDrive::Both(index, rate),
                (true, false) => BoneDrive::Rotation(index, rate),
                (false, true) => BoneDrive::Translation(index, rate),
                (false, false) => unreachable!(),
            }
        } else {
            BoneDrive::None
        };

        let fixed_axis = if flags.intersects(BoneFlags::FIXED_AXIS) {
            Some(cur.read_vec3())
        } else {
            None
        };

        let local_axis = if flags.intersects(BoneFlags::LOCAL_COORDINATE) {
            Some((cur.read_vec3(), cur.read_vec3()))
        } else {
            None
        };

        let external_parent_key = if flags.intersects(BoneFlags::EXTERNAL_PARENT_DEFORM) {
            Some(cur.read_i32())
        } else {
            None
        };

        let ik = if flags.intersects(BoneFlags::IK) {
            let target_bone_index = cur.read_signed_index(widths.bone);
            let iteration_count = cur.read_i32();
            let angle_limit = cur.read_f32();
            let link_count = cur.read_i32().max(0) as usize;
            let mut links = Vec::with_capacity(link_count.min(1 << 12));
            for _ in 0..link_count {
                let bone_index = cur.read_signed_index(widths.bone);
                let has_limit = cur.read_u8();
                let angle_limit = if has_limit != 0 {
                    Some((cur.read_vec3(), cur.read_vec3()))
                } else {
                    None
                };
                links.push(IkLink {
                    bone_index,
                    angle_limit,
                });
            }
            Some(IkSettings {
                target_bone_index,
                iteration_count,
                angle_limit,
                links,
            })
        } else {
            None
        };

        out.push(Bone {
            name,
            name_en,
            position,
            parent,
            deform_depth,
            tip,
            rotatable: flags.intersects(BoneFlags::ROTATABLE),
            translatable: flags.intersects(BoneFlags::TRANSLATABLE),
            visible: flags.intersects(BoneFlags::IS_VISIBLE),
            controllable: flags.intersects(BoneFlags::ENABLED),
            drive,
            fixed_axis,
            local_axis,
            physics_after_deform: flags.intersects(BoneFlags::PHYSICS_AFTER_DEFORM),
            external_parent_key,
            ik,
        });
    }
    Ok(out)
}

fn read_morphs(
    cur: &mut Cursor,
    widths: &Widths,
    codec: &dyn TextCodec,
) -> Result<Vec<Morph>, PmxError> {
    let count = cur.read_i32().max(0) as usize;
    let mut out = Vec::with_capacity(count.min(1 << 16));
    for _ in 0..count {
        let name = cur.read_text_prefixed(codec);
        let name_en = cur.read_text_prefixed(codec);
        let panel = match cur.read_u8() {
            0 => ControlPanel::System,
            1 => ControlPanel::BottomLeft,
            2 => ControlPanel::TopLeft,
            3 => ControlPanel::TopRight,
            4 => ControlPanel::BottomRight,
            other => return Err(PmxError::InvalidControlPanel(other)),
        };
        let kind_byte = cur.read_u8();
        let offset_count = cur.read_i32().max(0) as usize;
        let kind = match kind_byte {
            0 => MorphKind::Group(
                (0..offset_count)
                    .map(|_| GroupMorphOffset {
                        morph_index: cur.read_signed_index(widths.morph),
                        weight: cur.read_f32(),
                    })
                    .collect(),
            ),
            1 => MorphKind::Vertex(
                (0..offset_count)
                    .map(|_| VertexMorphOffset {
                        vertex_index: cur.read_vertex_index(widths.vertex),
                        offset: cur.read_vec3(),
                    })
                    .collect(),
            ),
            2 => MorphKind::Bone(
                (0..offset_count)
                    .map(|_| BoneMorphOffset {
                        bone_index: cur.read_signed_index(widths.bone),
                        translation: cur.read_vec3(),
                        rotation: cur.read_vec4(),
                    })
                    .collect(),
            ),
            channel_byte @ 3..=7 => {
                let channel = match channel_byte {
                    3 => UvChannel::Base,
                    4 => UvChannel::Extra1,
                    5 => UvChannel::Extra2,
                    6 => UvChannel::Extra3,
                    _ => UvChannel::Extra4,
                };
                MorphKind::Uv {
                    channel,
                    offsets: (0..offset_count)
                        .map(|_| UvMorphOffset {
                            vertex_index: cur.read_vertex_index(widths.vertex),
                            offset: cur.read_vec4(),
                        })
                        .collect(),
                }
            }
            8 => MorphKind::Material(
                (0..offset_count)
                    .map(|_| MaterialMorphOffset {
                        material_index: cur.read_signed_index(widths.material),
                        formula: cur.read_u8(),
                        diffuse: cur.read_vec4(),
                        specular: cur.read_vec3(),
                        specular_factor: cur.read_f32(),
                        ambient: cur.read_vec3(),
                        edge_color: cur.read_vec4(),
                        edge_size: cur.read_f32(),
                        texture_factor: cur.read_vec4(),
                        sphere_texture_factor: cur.read_vec4(),
                        toon_texture_factor: cur.read_vec4(),
                    })
                    .collect(),
            ),
            other => return Err(PmxError::InvalidMorphKind(other)),
        };
        out.push(Morph {
            name,
            name_en,
            panel,
            kind,
        });
    }
    Ok(out)
}

fn read_display_nodes(
    cur: &mut Cursor,
    widths: &Widths,
    codec: &dyn TextCodec,
) -> Result<Vec<DisplayNode>, PmxError> {
    let count = cur.read_i32().max(0) as usize;
    let mut out = Vec::with_capacity(count.min(1 << 12));
    for _ in 0..count {
        let name = cur.read_text_prefixed(codec);
        let name_en = cur.read_text_prefixed(codec);
        let is_special = cur.read_bool();
        let item_count = cur.read_i32().max(0) as usize;
        let mut items = Vec::with_capacity(item_count.min(1 << 16));
        for _ in 0..item_count {
            let target_byte = cur.read_u8();
            let (target, index) = match target_byte {
                0 => (DisplayTarget::Bone, cur.read_signed_index(widths.bone)),
                1 => (DisplayTarget::Morph, cur.read_signed_index(widths.morph)),
                other => return Err(PmxError::InvalidFrameTarget(other)),
            };
            items.push(DisplayItem { target, index });
        }
        out.push(DisplayNode {
            name,
            name_en,
            is_special,
            items,
        });
    }
    Ok(out)
}

fn read_rigid_bodies(
    cur: &mut Cursor,
    widths: &Widths,
    codec: &dyn TextCodec,
) -> Result<Vec<RigidBody>, PmxError> {
    let count = cur.read_i32().max(0) as usize;
    let mut out = Vec::with_capacity(count.min(1 << 16));
    for _ in 0..count {
        let name = cur.read_text_prefixed(codec);
        let name_en = cur.read_text_prefixed(codec);
        let bone_index = cur.read_signed_index(widths.bone);
        let group = cur.read_u8();
        let non_collision_mask = cur.read_u16();
        let shape = RigidShape::try_from(cur.read_u8())?;
        let size = cur.read_vec3();
        let position = cur.read_vec3();
        let rotation = cur.read_vec3();
        let mass = cur.read_f32();
        let move_attenuation = cur.read_f32();
        let rotation_attenuation = cur.read_f32();
        let repulsion = cur.read_f32();
        let friction = cur.read_f32();
        let calc_method = RigidCalcMethod::try_from(cur.read_u8())?;
        out.push(RigidBody {
            name,
            name_en,
            bone_index,
            group,
            non_collision_mask,
            shape,
            size,
            position,
            rotation,
            mass,
            move_attenuation,
            rotation_attenuation,
            repulsion,
            friction,
            calc_method,
        });
    }
    Ok(out)
}

fn read_joints(
    cur: &mut Cursor,
    widths: &Widths,
    codec: &dyn TextCodec,
) -> Result<Vec<Joint>, PmxError> {
    let count = cur.read_i32().max(0) as usize;
    let mut out = Vec::with_capacity(count.min(1 << 16));
    for _ in 0..count {
        let name = cur.read_text_prefixed(codec);
        let name_en = cur.read_text_prefixed(codec);
        let joint_type = cur.read_u8();
        let rigid_a = cur.read_signed_index(widths.rigid_body);
        let rigid_b = cur.read_signed_index(widths.rigid_body);
        let position = cur.read_vec3();
        let rotation = cur.read_vec3();
        let move_limit_min = cur.read_vec3();
        let move_limit_max = cur.read_vec3();
        let rotation_limit_min = cur.read_vec3();
        let rotation_limit_max = cur.read_vec3();
        let spring_move = cur.read_vec3();
        let spring_rotation = cur.read_vec3();
        if joint_type != 0 {
            return Err(PmxError::InvalidJointKind(joint_type));
        }
        out.push(Joint {
            name,
            name_en,
            rigid_a,
            rigid_b,
            position,
            rotation,
            kind: JointKind::Spring6Dof {
                move_limit_min,
                move_limit_max,
                rotation_limit_min,
                rotation_limit_max,
                spring_move,
                spring_rotation,
            },
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bdef1_bone_index_is_signed_at_one_byte_width() {
        let widths = Widths {
            vertex: 1,
            texture: 1,
            material: 1,
            bone: 1,
            morph: 1,
            rigid_body: 1,
        };
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1i32.to_le_bytes()); // vertex count
        bytes.extend_from_slice(&1f32.to_le_bytes()); // position
        bytes.extend_from_slice(&0f32.to_le_bytes());
        bytes.extend_from_slice(&0f32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 12]); // normal
        bytes.extend_from_slice(&[0u8; 8]); // uv
        bytes.push(0); // weight type: Bdef1
        bytes.push(0xFF); // bone index byte: -1 signed, 255 unsigned
        bytes.extend_from_slice(&0f32.to_le_bytes()); // edge_scale

        let mut cur = Cursor::new(&bytes);
        let vertices = read_vertices(&mut cur, &widths, 0).unwrap();
        assert_eq!(vertices[0].bone_indices[0], -1);
    }
}
