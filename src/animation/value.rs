//! The closed set of value types that can flow through an animated property.
//!
//! Every sampled keyframe, write-back and blend operates on [`AnimationValue`].
//! Interpolation dispatch is exhaustive over the enum, so adding a new
//! animatable value kind is a compile-time exhaustiveness check rather than a
//! silent fallthrough.

use glam::{Quat, Vec2, Vec3, Vec4};

/// Discriminant of an [`AnimationValue`].
///
/// The integer ids mirror the scene-file `dataType` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationValueKind {
    Float,
    Vector3,
    Quaternion,
    Color3,
    Vector2,
    Bool,
    Text,
}

impl AnimationValueKind {
    /// Scene-file `dataType` id for this kind.
    #[must_use]
    pub fn data_type(self) -> u32 {
        match self {
            Self::Float => 0,
            Self::Vector3 => 1,
            Self::Quaternion => 2,
            Self::Color3 => 4,
            Self::Vector2 => 5,
            Self::Bool => 7,
            Self::Text => 8,
        }
    }

    /// Inverse of [`data_type`](Self::data_type).
    #[must_use]
    pub fn from_data_type(data_type: u32) -> Option<Self> {
        match data_type {
            0 => Some(Self::Float),
            1 => Some(Self::Vector3),
            2 => Some(Self::Quaternion),
            4 => Some(Self::Color3),
            5 => Some(Self::Vector2),
            7 => Some(Self::Bool),
            8 => Some(Self::Text),
            _ => None,
        }
    }

    /// Whether values of this kind can only be stepped, never interpolated.
    #[must_use]
    pub fn is_discrete(self) -> bool {
        matches!(self, Self::Bool | Self::Text)
    }
}

/// A single animated value.
///
/// `Color3` is kept distinct from `Vector3` even though both carry three
/// floats: the scene file tags them differently and targets may reject a
/// color written into a positional slot.
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationValue {
    Float(f32),
    Vector3(Vec3),
    Quaternion(Quat),
    Color3(Vec3),
    Vector2(Vec2),
    Bool(bool),
    Text(String),
}

/// Hermite basis factors for a normalized parameter `t`.
fn hermite_basis(t: f32) -> (f32, f32, f32, f32) {
    let t2 = t * t;
    let t3 = t2 * t;
    let s2 = -2.0 * t3 + 3.0 * t2;
    let s3 = t3 - t2;
    let s0 = 1.0 - s2;
    let s1 = s3 - t2 + t;
    (s0, s1, s2, s3)
}

impl AnimationValue {
    /// Discriminant of this value.
    #[must_use]
    pub fn kind(&self) -> AnimationValueKind {
        match self {
            Self::Float(_) => AnimationValueKind::Float,
            Self::Vector3(_) => AnimationValueKind::Vector3,
            Self::Quaternion(_) => AnimationValueKind::Quaternion,
            Self::Color3(_) => AnimationValueKind::Color3,
            Self::Vector2(_) => AnimationValueKind::Vector2,
            Self::Bool(_) => AnimationValueKind::Bool,
            Self::Text(_) => AnimationValueKind::Text,
        }
    }

    /// Additive identity of the given kind, used as the default loop offset.
    #[must_use]
    pub fn zero(kind: AnimationValueKind) -> Self {
        match kind {
            AnimationValueKind::Float => Self::Float(0.0),
            AnimationValueKind::Vector3 => Self::Vector3(Vec3::ZERO),
            AnimationValueKind::Quaternion => Self::Quaternion(Quat::from_xyzw(0.0, 0.0, 0.0, 0.0)),
            AnimationValueKind::Color3 => Self::Color3(Vec3::ZERO),
            AnimationValueKind::Vector2 => Self::Vector2(Vec2::ZERO),
            AnimationValueKind::Bool => Self::Bool(false),
            AnimationValueKind::Text => Self::Text(String::new()),
        }
    }

    /// Linear interpolation between two values of the same kind.
    ///
    /// Quaternions use slerp, never componentwise lerp. Discrete kinds hold
    /// the start value. Mismatched kinds return the start value unchanged;
    /// this runs once per active animation per frame and must never fail.
    #[must_use]
    pub fn lerp(&self, end: &Self, t: f32) -> Self {
        match (self, end) {
            (Self::Float(a), Self::Float(b)) => Self::Float(a + (b - a) * t),
            (Self::Vector3(a), Self::Vector3(b)) => Self::Vector3(a.lerp(*b, t)),
            (Self::Quaternion(a), Self::Quaternion(b)) => Self::Quaternion(a.slerp(*b, t)),
            (Self::Color3(a), Self::Color3(b)) => Self::Color3(a.lerp(*b, t)),
            (Self::Vector2(a), Self::Vector2(b)) => Self::Vector2(a.lerp(*b, t)),
            // Discrete kinds hold; mismatched kinds are left untouched.
            _ => self.clone(),
        }
    }

    /// Cubic Hermite interpolation with tangents.
    ///
    /// Tangents are expected pre-scaled by the key pair's frame delta.
    /// Quaternion results are renormalized to prevent unit-length drift.
    #[must_use]
    pub fn hermite(&self, out_tangent: &Self, end: &Self, in_tangent: &Self, t: f32) -> Self {
        let (s0, s1, s2, s3) = hermite_basis(t);
        match (self, out_tangent, end, in_tangent) {
            (Self::Float(v0), Self::Float(m0), Self::Float(v1), Self::Float(m1)) => {
                Self::Float(s0 * v0 + s1 * m0 + s2 * v1 + s3 * m1)
            }
            (Self::Vector3(v0), Self::Vector3(m0), Self::Vector3(v1), Self::Vector3(m1)) => {
                Self::Vector3(*v0 * s0 + *m0 * s1 + *v1 * s2 + *m1 * s3)
            }
            (
                Self::Quaternion(v0),
                Self::Quaternion(m0),
                Self::Quaternion(v1),
                Self::Quaternion(m1),
            ) => {
                let result = Vec4::from(*v0) * s0
                    + Vec4::from(*m0) * s1
                    + Vec4::from(*v1) * s2
                    + Vec4::from(*m1) * s3;
                Self::Quaternion(Quat::from_vec4(result).normalize())
            }
            (Self::Color3(v0), Self::Color3(m0), Self::Color3(v1), Self::Color3(m1)) => {
                Self::Color3(*v0 * s0 + *m0 * s1 + *v1 * s2 + *m1 * s3)
            }
            (Self::Vector2(v0), Self::Vector2(m0), Self::Vector2(v1), Self::Vector2(m1)) => {
                Self::Vector2(*v0 * s0 + *m0 * s1 + *v1 * s2 + *m1 * s3)
            }
            _ => self.clone(),
        }
    }

    /// Componentwise sum, used for relative-loop offsets.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => Self::Float(a + b),
            (Self::Vector3(a), Self::Vector3(b)) => Self::Vector3(*a + *b),
            (Self::Quaternion(a), Self::Quaternion(b)) => {
                Self::Quaternion(Quat::from_vec4(Vec4::from(*a) + Vec4::from(*b)))
            }
            (Self::Color3(a), Self::Color3(b)) => Self::Color3(*a + *b),
            (Self::Vector2(a), Self::Vector2(b)) => Self::Vector2(*a + *b),
            _ => self.clone(),
        }
    }

    /// Componentwise difference, used to compute the net delta across a track.
    #[must_use]
    pub fn sub(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => Self::Float(a - b),
            (Self::Vector3(a), Self::Vector3(b)) => Self::Vector3(*a - *b),
            (Self::Quaternion(a), Self::Quaternion(b)) => {
                Self::Quaternion(Quat::from_vec4(Vec4::from(*a) - Vec4::from(*b)))
            }
            (Self::Color3(a), Self::Color3(b)) => Self::Color3(*a - *b),
            (Self::Vector2(a), Self::Vector2(b)) => Self::Vector2(*a - *b),
            _ => self.clone(),
        }
    }

    /// Componentwise scale.
    #[must_use]
    pub fn scale(&self, factor: f32) -> Self {
        match self {
            Self::Float(a) => Self::Float(a * factor),
            Self::Vector3(a) => Self::Vector3(*a * factor),
            Self::Quaternion(a) => Self::Quaternion(Quat::from_vec4(Vec4::from(*a) * factor)),
            Self::Color3(a) => Self::Color3(*a * factor),
            Self::Vector2(a) => Self::Vector2(*a * factor),
            Self::Bool(_) | Self::Text(_) => self.clone(),
        }
    }

    /// Flattens the value into the scene-file `values` array form.
    #[must_use]
    pub fn to_json_values(&self) -> serde_json::Value {
        match self {
            Self::Float(v) => serde_json::json!([v]),
            Self::Vector3(v) | Self::Color3(v) => serde_json::json!([v.x, v.y, v.z]),
            Self::Quaternion(q) => serde_json::json!([q.x, q.y, q.z, q.w]),
            Self::Vector2(v) => serde_json::json!([v.x, v.y]),
            Self::Bool(b) => serde_json::json!([i32::from(*b)]),
            Self::Text(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Rebuilds a value of `kind` from the scene-file `values` array form.
    #[must_use]
    pub fn from_json_values(kind: AnimationValueKind, values: &serde_json::Value) -> Option<Self> {
        if kind == AnimationValueKind::Text {
            return values.as_str().map(|s| Self::Text(s.to_owned()));
        }
        let floats: Vec<f32> = values
            .as_array()?
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect();
        match kind {
            AnimationValueKind::Float => floats.first().map(|&v| Self::Float(v)),
            AnimationValueKind::Vector3 => {
                (floats.len() >= 3).then(|| Self::Vector3(Vec3::new(floats[0], floats[1], floats[2])))
            }
            AnimationValueKind::Quaternion => (floats.len() >= 4).then(|| {
                Self::Quaternion(Quat::from_xyzw(floats[0], floats[1], floats[2], floats[3]))
            }),
            AnimationValueKind::Color3 => {
                (floats.len() >= 3).then(|| Self::Color3(Vec3::new(floats[0], floats[1], floats[2])))
            }
            AnimationValueKind::Vector2 => {
                (floats.len() >= 2).then(|| Self::Vector2(Vec2::new(floats[0], floats[1])))
            }
            AnimationValueKind::Bool => floats.first().map(|&v| Self::Bool(v != 0.0)),
            AnimationValueKind::Text => unreachable!(),
        }
    }

    /// Convenience accessor for scalar values.
    #[must_use]
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Convenience accessor for vector values.
    #[must_use]
    pub fn as_vector3(&self) -> Option<Vec3> {
        match self {
            Self::Vector3(v) => Some(*v),
            _ => None,
        }
    }

    /// Convenience accessor for quaternion values.
    #[must_use]
    pub fn as_quaternion(&self) -> Option<Quat> {
        match self {
            Self::Quaternion(q) => Some(*q),
            _ => None,
        }
    }
}

impl From<f32> for AnimationValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<Vec3> for AnimationValue {
    fn from(v: Vec3) -> Self {
        Self::Vector3(v)
    }
}

impl From<Quat> for AnimationValue {
    fn from(q: Quat) -> Self {
        Self::Quaternion(q)
    }
}

impl From<Vec2> for AnimationValue {
    fn from(v: Vec2) -> Self {
        Self::Vector2(v)
    }
}

impl From<bool> for AnimationValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}
