//! PMX data model.

use bitflags::bitflags;
use std::convert::TryFrom;

pub type Vec2 = [f32; 2];
pub type Vec3 = [f32; 3];
pub type Vec4 = [f32; 4];

/// One of the header's six index-width fields, valid at 1, 2 or 4 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexWidth {
    One,
    Two,
    Four,
}

impl IndexWidth {
    pub fn bytes(self) -> u8 {
        match self {
            IndexWidth::One => 1,
            IndexWidth::Two => 2,
            IndexWidth::Four => 4,
        }
    }
}

impl TryFrom<u8> for IndexWidth {
    type Error = crate::error::PmxError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(IndexWidth::One),
            2 => Ok(IndexWidth::Two),
            4 => Ok(IndexWidth::Four),
            other => Err(crate::error::PmxError::InvalidIndexWidth(other)),
        }
    }
}

/// Embedded model names and comments (§3 "ModelInfo").
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: String,
    pub name_en: String,
    pub comment: String,
    pub comment_en: String,
}

/// Per-vertex skinning scheme. Unused bone slots are `-1`, unused weight
/// slots are `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightKind {
    Bdef1,
    Bdef2,
    Bdef4,
    Sdef,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub additional_uv: [Vec4; 4],
    pub weight_kind: WeightKind,
    pub bone_indices: [i32; 4],
    pub bone_weights: [f32; 4],
    pub sdef_c: Vec3,
    pub sdef_r0: Vec3,
    pub sdef_r1: Vec3,
    pub edge_scale: f32,
}

impl Default for Vertex {
    fn default() -> Self {
        Vertex {
            position: [0.0; 3],
            normal: [0.0; 3],
            uv: [0.0; 2],
            additional_uv: [[0.0; 4]; 4],
            weight_kind: WeightKind::Bdef1,
            bone_indices: [-1; 4],
            bone_weights: [0.0; 4],
            sdef_c: [0.0; 3],
            sdef_r0: [0.0; 3],
            sdef_r1: [0.0; 3],
            edge_scale: 1.0,
        }
    }
}

bitflags! {
    pub(crate) struct BoneFlags: u16 {
        const CONNECT_TO_OTHER_BONE = 0x01;
        const ROTATABLE = 0x02;
        const TRANSLATABLE = 0x04;
        const IS_VISIBLE = 0x08;
        const ENABLED = 0x10;
        const IK = 0x20;
        const INHERIT_LOCAL = 0x80;
        const INHERIT_ROTATION = 0x100;
        const INHERIT_TRANSLATION = 0x200;
        const FIXED_AXIS = 0x400;
        const LOCAL_COORDINATE = 0x800;
        const PHYSICS_AFTER_DEFORM = 0x1000;
        const EXTERNAL_PARENT_DEFORM = 0x2000;
    }
}

bitflags! {
    pub struct MaterialFlags: u8 {
        const DISABLE_CULLING = 0x01;
        const GROUND_SHADOW   = 0x02;
        const DRAW_SHADOW     = 0x04;
        const RECEIVE_SHADOW  = 0x08;
        const HAS_EDGE        = 0x10;
        const VERTEX_COLOR    = 0x20;
        const POINT_DRAW      = 0x40;
        const LINE_DRAW       = 0x80;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SphereMode {
    Disabled,
    Multiply,
    Add,
    SubTexture,
}

impl TryFrom<u8> for SphereMode {
    type Error = crate::error::PmxError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SphereMode::Disabled),
            1 => Ok(SphereMode::Multiply),
            2 => Ok(SphereMode::Add),
            3 => Ok(SphereMode::SubTexture),
            other => Err(crate::error::PmxError::InvalidSphereMode(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToonMode {
    Separate(i32),
    Common(u8),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub name_en: String,
    pub diffuse: Vec4,
    pub specular: Vec3,
    pub specular_factor: f32,
    pub ambient: Vec3,
    pub draw_mode: MaterialFlags,
    pub edge_color: Vec4,
    pub edge_size: f32,
    pub texture_index: i32,
    pub sphere_texture_index: i32,
    pub sphere_mode: SphereMode,
    pub toon_mode: ToonMode,
    pub memo: String,
    pub vertex_span: i32,
}

/// Either a tip bone reference or a tip offset vector (`has_tip_bone`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoneTip {
    Bone(i32),
    Offset(Vec3),
}

impl Default for BoneTip {
    fn default() -> Self {
        BoneTip::Bone(-1)
    }
}

/// Rotation/translation drive from another bone (`driven_rotation` /
/// `driven_translation`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoneDrive {
    None,
    Rotation(i32, f32),
    Translation(i32, f32),
    Both(i32, f32),
}

impl Default for BoneDrive {
    fn default() -> Self {
        BoneDrive::None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IkLink {
    pub bone_index: i32,
    pub angle_limit: Option<(Vec3, Vec3)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IkSettings {
    pub target_bone_index: i32,
    pub iteration_count: i32,
    pub angle_limit: f32,
    pub links: Vec<IkLink>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bone {
    pub name: String,
    pub name_en: String,
    pub position: Vec3,
    pub parent: i32,
    pub deform_depth: i32,
    pub tip: BoneTip,
    pub rotatable: bool,
    pub translatable: bool,
    pub visible: bool,
    pub controllable: bool,
    pub drive: BoneDrive,
    pub fixed_axis: Option<Vec3>,
    pub local_axis: Option<(Vec3, Vec3)>,
    pub physics_after_deform: bool,
    pub external_parent_key: Option<i32>,
    pub ik: Option<IkSettings>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UvChannel {
    Base,
    Extra1,
    Extra2,
    Extra3,
    Extra4,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexMorphOffset {
    pub vertex_index: i32,
    pub offset: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvMorphOffset {
    pub vertex_index: i32,
    pub offset: Vec4,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneMorphOffset {
    pub bone_index: i32,
    pub translation: Vec3,
    pub rotation: Vec4,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialMorphOffset {
    pub material_index: i32,
    pub formula: u8,
    pub diffuse: Vec4,
    pub specular: Vec3,
    pub specular_factor: f32,
    pub ambient: Vec3,
    pub edge_color: Vec4,
    pub edge_size: f32,
    pub texture_factor: Vec4,
    pub sphere_texture_factor: Vec4,
    pub toon_texture_factor: Vec4,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupMorphOffset {
    pub morph_index: i32,
    pub weight: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MorphKind {
    Group(Vec<GroupMorphOffset>),
    Vertex(Vec<VertexMorphOffset>),
    Bone(Vec<BoneMorphOffset>),
    Uv {
        channel: UvChannel,
        offsets: Vec<UvMorphOffset>,
    },
    Material(Vec<MaterialMorphOffset>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ControlPanel {
    System,
    BottomLeft,
    TopLeft,
    TopRight,
    BottomRight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Morph {
    pub name: String,
    pub name_en: String,
    pub panel: ControlPanel,
    pub kind: MorphKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayTarget {
    Bone,
    Morph,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayItem {
    pub target: DisplayTarget,
    pub index: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayNode {
    pub name: String,
    pub name_en: String,
    pub is_special: bool,
    pub items: Vec<DisplayItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigidShape {
    Sphere,
    Box,
    Capsule,
}

impl TryFrom<u8> for RigidShape {
    type Error = crate::error::PmxError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RigidShape::Sphere),
            1 => Ok(RigidShape::Box),
            2 => Ok(RigidShape::Capsule),
            other => Err(crate::error::PmxError::InvalidRigidShape(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigidCalcMethod {
    Static,
    Dynamic,
    DynamicWithBonePosition,
}

impl TryFrom<u8> for RigidCalcMethod {
    type Error = crate::error::PmxError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RigidCalcMethod::Static),
            1 => Ok(RigidCalcMethod::Dynamic),
            2 => Ok(RigidCalcMethod::DynamicWithBonePosition),
            other => Err(crate::error::PmxError::InvalidRigidCalcMethod(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    pub name: String,
    pub name_en: String,
    pub bone_index: i32,
    pub group: u8,
    pub non_collision_mask: u16,
    pub shape: RigidShape,
    pub size: Vec3,
    pub position: Vec3,
    pub rotation: Vec3,
    pub mass: f32,
    pub move_attenuation: f32,
    pub rotation_attenuation: f32,
    pub repulsion: f32,
    pub friction: f32,
    pub calc_method: RigidCalcMethod,
}

/// The full PMX 2.0 joint taxonomy. The decoder only ever produces
/// `Spring6Dof` (the only on-disk joint type this format version
/// accepts); the others exist so in-memory models built programmatically
/// can still be encoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JointKind {
    Spring6Dof {
        move_limit_min: Vec3,
        move_limit_max: Vec3,
        rotation_limit_min: Vec3,
        rotation_limit_max: Vec3,
        spring_move: Vec3,
        spring_rotation: Vec3,
    },
    SixDof {
        move_limit_min: Vec3,
        move_limit_max: Vec3,
        rotation_limit_min: Vec3,
        rotation_limit_max: Vec3,
    },
    P2p,
    ConeTwist {
        swing_span1: f32,
        swing_span2: f32,
        twist_span: f32,
        softness: f32,
        bias_factor: f32,
        relaxation_factor: f32,
        damping: f32,
        fix_thresh: f32,
        enable_motor: bool,
        max_motor_impulse: f32,
        motor_target: Vec3,
    },
    Slider {
        lower_linear_limit: f32,
        upper_linear_limit: f32,
        lower_angle_limit: f32,
        upper_angle_limit: f32,
        power_linear_motor: bool,
        target_linear_motor_velocity: f32,
        max_linear_motor_force: f32,
        power_angular_motor: bool,
        target_angular_motor_velocity: f32,
        max_angular_motor_force: f32,
    },
    Hinge {
        low: f32,
        high: f32,
        softness: f32,
        bias_factor: f32,
        relaxation_factor: f32,
        enable_motor: bool,
        target_velocity: f32,
        max_motor_impulse: f32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    pub name: String,
    pub name_en: String,
    pub rigid_a: i32,
    pub rigid_b: i32,
    pub position: Vec3,
    pub rotation: Vec3,
    pub kind: JointKind,
}

/// A decoded or in-memory-built PMX model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pmx {
    pub model_info: ModelInfo,
    pub additional_uv: u8,
    pub vertices: Vec<Vertex>,
    pub faces: Vec<[i32; 3]>,
    pub textures: Vec<String>,
    pub materials: Vec<Material>,
    pub bones: Vec<Bone>,
    pub morphs: Vec<Morph>,
    pub display_nodes: Vec<DisplayNode>,
    pub rigid_bodies: Vec<RigidBody>,
    pub joints: Vec<Joint>,
}
