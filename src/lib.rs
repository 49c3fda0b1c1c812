#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod animation;
pub mod errors;
pub mod scene;
pub mod utils;

pub use animation::{
    Animatable, AnimatableHandle, AnimatableState, AnimationGroup, AnimationLoopMode,
    AnimationScheduler, AnimationTarget, AnimationValue, Easing, EasingCurve, EasingMode,
    Keyframe, KeyframeTrack, RuntimeAnimation, TargetHandle, TargetedAnimation,
};
pub use errors::OrreryError;
pub use scene::{Node, NodeHandle, Scene};
pub use utils::Timer;
