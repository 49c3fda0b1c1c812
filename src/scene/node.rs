use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Quat, Vec3};

use crate::animation::target::{AnimationTarget, PropertySlot};
use crate::animation::track::KeyframeTrack;
use crate::animation::value::AnimationValue;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

// Resolved property slots. Component slots alias the vector slots so a
// whole-vector track and a component track can coexist on one node.
const SLOT_POSITION: u32 = 0;
const SLOT_POSITION_X: u32 = 1;
const SLOT_POSITION_Y: u32 = 2;
const SLOT_POSITION_Z: u32 = 3;
const SLOT_ROTATION: u32 = 4;
const SLOT_SCALING: u32 = 5;
const SLOT_SCALING_X: u32 = 6;
const SLOT_SCALING_Y: u32 = 7;
const SLOT_SCALING_Z: u32 = 8;
const SLOT_VISIBILITY: u32 = 9;

/// A scene object exposing its transform and visibility to the animation
/// engine.
#[derive(Debug, Clone)]
pub struct Node {
    id: u64,
    pub name: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub scaling: Vec3,
    pub visibility: f32,
    /// Tracks attached to this node, played by
    /// `AnimationScheduler::begin_animation`.
    pub animations: Vec<Arc<KeyframeTrack>>,
}

impl Node {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scaling: Vec3::ONE,
            visibility: 1.0,
            animations: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl AnimationTarget for Node {
    fn unique_id(&self) -> u64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn resolve_property(&self, path: &str) -> Option<PropertySlot> {
        let slot = match path {
            "position" => SLOT_POSITION,
            "position.x" => SLOT_POSITION_X,
            "position.y" => SLOT_POSITION_Y,
            "position.z" => SLOT_POSITION_Z,
            "rotation" | "rotationQuaternion" => SLOT_ROTATION,
            "scaling" => SLOT_SCALING,
            "scaling.x" => SLOT_SCALING_X,
            "scaling.y" => SLOT_SCALING_Y,
            "scaling.z" => SLOT_SCALING_Z,
            "visibility" => SLOT_VISIBILITY,
            _ => return None,
        };
        Some(PropertySlot(slot))
    }

    fn read(&self, slot: PropertySlot) -> AnimationValue {
        match slot.0 {
            SLOT_POSITION => AnimationValue::Vector3(self.position),
            SLOT_POSITION_X => AnimationValue::Float(self.position.x),
            SLOT_POSITION_Y => AnimationValue::Float(self.position.y),
            SLOT_POSITION_Z => AnimationValue::Float(self.position.z),
            SLOT_ROTATION => AnimationValue::Quaternion(self.rotation),
            SLOT_SCALING => AnimationValue::Vector3(self.scaling),
            SLOT_SCALING_X => AnimationValue::Float(self.scaling.x),
            SLOT_SCALING_Y => AnimationValue::Float(self.scaling.y),
            SLOT_SCALING_Z => AnimationValue::Float(self.scaling.z),
            _ => AnimationValue::Float(self.visibility),
        }
    }

    fn write(&mut self, slot: PropertySlot, value: &AnimationValue) {
        match (slot.0, value) {
            (SLOT_POSITION, AnimationValue::Vector3(v)) => self.position = *v,
            (SLOT_POSITION_X, AnimationValue::Float(x)) => self.position.x = *x,
            (SLOT_POSITION_Y, AnimationValue::Float(y)) => self.position.y = *y,
            (SLOT_POSITION_Z, AnimationValue::Float(z)) => self.position.z = *z,
            (SLOT_ROTATION, AnimationValue::Quaternion(q)) => self.rotation = *q,
            (SLOT_SCALING, AnimationValue::Vector3(v)) => self.scaling = *v,
            (SLOT_SCALING_X, AnimationValue::Float(x)) => self.scaling.x = *x,
            (SLOT_SCALING_Y, AnimationValue::Float(y)) => self.scaling.y = *y,
            (SLOT_SCALING_Z, AnimationValue::Float(z)) => self.scaling.z = *z,
            (SLOT_VISIBILITY, AnimationValue::Float(v)) => self.visibility = *v,
            (slot, value) => {
                log::debug!(
                    "Node \"{}\": ignoring {:?} write to slot {slot}",
                    self.name,
                    value.kind()
                );
            }
        }
    }

    fn animations(&self) -> &[Arc<KeyframeTrack>] {
        &self.animations
    }
}
