//! The capability an object must expose to be animated.
//!
//! The engine does not care what the object is — mesh transform, material
//! color, light intensity — only that a string property path can be resolved
//! once into a [`PropertySlot`] and then read/written through it. Runtime
//! bindings keep a `Weak` handle so a disposed target is detected as a failed
//! upgrade rather than a dangling reference.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::animation::track::KeyframeTrack;
use crate::animation::value::AnimationValue;

/// Opaque token for a resolved property on one target type.
///
/// Handed out by [`AnimationTarget::resolve_property`] and valid for the
/// lifetime of the target. Resolution happens exactly once, when a runtime
/// binding is built; the per-frame hot path never re-parses the path string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertySlot(pub u32);

/// An object with animatable properties.
pub trait AnimationTarget {
    /// Stable identity, used for lookups and scene-file `targetId`.
    fn unique_id(&self) -> u64;

    /// Display name, used in diagnostics.
    fn name(&self) -> &str {
        ""
    }

    /// Resolves a property path (e.g. `"position.x"`) into a slot.
    fn resolve_property(&self, path: &str) -> Option<PropertySlot>;

    /// Reads the current value of a resolved property.
    fn read(&self, slot: PropertySlot) -> AnimationValue;

    /// Writes a value to a resolved property.
    ///
    /// A kind-mismatched value must be ignored, not panic on.
    fn write(&mut self, slot: PropertySlot, value: &AnimationValue);

    /// Tracks attached directly to this object, played by
    /// `AnimationScheduler::begin_animation`.
    fn animations(&self) -> &[Arc<KeyframeTrack>] {
        &[]
    }
}

/// Shared handle to an animation target.
pub type TargetHandle = Rc<RefCell<dyn AnimationTarget>>;

/// Non-owning handle held by runtime bindings.
pub type WeakTargetHandle = Weak<RefCell<dyn AnimationTarget>>;

/// Identity comparison helper for trait-object handles.
#[must_use]
pub fn same_target(a: &TargetHandle, b: &TargetHandle) -> bool {
    a.borrow().unique_id() == b.borrow().unique_id()
}
