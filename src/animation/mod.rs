pub mod animatable;
pub mod easing;
pub mod group;
pub mod observable;
pub mod runtime;
pub mod scheduler;
pub mod target;
pub mod track;
pub mod value;

pub use animatable::{Animatable, AnimatableHandle, AnimatableState};
pub use easing::{Easing, EasingCurve, EasingMode};
pub use group::{AnimationGroup, TargetedAnimation};
pub use observable::{Observable, ObserverToken};
pub use runtime::RuntimeAnimation;
pub use scheduler::AnimationScheduler;
pub use target::{AnimationTarget, PropertySlot, TargetHandle, WeakTargetHandle};
pub use track::{AnimationEvent, AnimationLoopMode, KeyInterpolation, Keyframe, KeyframeTrack};
pub use value::{AnimationValue, AnimationValueKind};
