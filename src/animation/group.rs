//! Lockstep orchestration of tracks spread across multiple targets.
//!
//! An [`AnimationGroup`] pairs tracks with targets ahead of time, then starts
//! them all within one scheduler tick so every spawned animatable shares the
//! same wall-clock origin. Group-level controls broadcast to the spawned
//! animatables; the group-end notification fires exactly once, when the last
//! member completes.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use serde_json::{Value, json};

use crate::animation::animatable::AnimatableHandle;
use crate::animation::observable::Observable;
use crate::animation::scheduler::AnimationScheduler;
use crate::animation::target::TargetHandle;
use crate::animation::track::{Keyframe, KeyframeTrack};
use crate::errors::{OrreryError, Result};

/// One track bound to one target.
#[derive(Clone)]
pub struct TargetedAnimation {
    pub animation: Arc<KeyframeTrack>,
    pub target: TargetHandle,
}

impl TargetedAnimation {
    pub fn serialize(&self) -> Result<Value> {
        Ok(json!({
            "animation": self.animation.serialize()?,
            "targetId": self.target.borrow().unique_id(),
        }))
    }
}

impl std::fmt::Debug for TargetedAnimation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetedAnimation")
            .field("animation", &self.animation.name)
            .field("target", &self.target.borrow().name())
            .finish()
    }
}

/// A named set of track/target pairs played and controlled as one unit.
pub struct AnimationGroup {
    pub name: String,
    targeted_animations: Vec<TargetedAnimation>,
    animatables: Vec<AnimatableHandle>,
    from_frame: f32,
    to_frame: f32,
    is_started: bool,
    is_paused: bool,
    speed_ratio: f32,
    loop_animation: bool,
    /// Spawned animatables still playing; group end fires when it hits zero.
    live_count: Rc<Cell<usize>>,
    on_animation_group_end: Rc<RefCell<Observable<()>>>,
    /// Notified with the finished member's target id.
    on_animation_end: Rc<RefCell<Observable<u64>>>,
    pub on_animation_group_pause_observable: Observable<()>,
    pub on_animation_group_play_observable: Observable<()>,
}

impl AnimationGroup {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            targeted_animations: Vec::new(),
            animatables: Vec::new(),
            from_frame: f32::MAX,
            to_frame: f32::MIN,
            is_started: false,
            is_paused: false,
            speed_ratio: 1.0,
            loop_animation: false,
            live_count: Rc::new(Cell::new(0)),
            on_animation_group_end: Rc::new(RefCell::new(Observable::new())),
            on_animation_end: Rc::new(RefCell::new(Observable::new())),
            on_animation_group_pause_observable: Observable::new(),
            on_animation_group_play_observable: Observable::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Earliest key frame across every added track, 0 when empty.
    #[must_use]
    pub fn from_frame(&self) -> f32 {
        if self.targeted_animations.is_empty() {
            0.0
        } else {
            self.from_frame
        }
    }

    /// Latest key frame across every added track, 0 when empty.
    #[must_use]
    pub fn to_frame(&self) -> f32 {
        if self.targeted_animations.is_empty() {
            0.0
        } else {
            self.to_frame
        }
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.is_started
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    #[must_use]
    pub fn speed_ratio(&self) -> f32 {
        self.speed_ratio
    }

    pub fn set_speed_ratio(&mut self, speed_ratio: f32) {
        self.speed_ratio = speed_ratio;
        for animatable in &self.animatables {
            animatable.borrow_mut().set_speed_ratio(speed_ratio);
        }
    }

    #[must_use]
    pub fn targeted_animations(&self) -> &[TargetedAnimation] {
        &self.targeted_animations
    }

    #[must_use]
    pub fn animatables(&self) -> &[AnimatableHandle] {
        &self.animatables
    }

    /// Subscribes to the single end-of-group notification.
    pub fn on_animation_group_end(&self, callback: impl FnMut(&()) + 'static) {
        self.on_animation_group_end.borrow_mut().add(callback);
    }

    /// Subscribes to per-member completion; the payload is the finished
    /// member's target id.
    pub fn on_animation_end(&self, callback: impl FnMut(&u64) + 'static) {
        self.on_animation_end.borrow_mut().add(callback);
    }

    // ========================================================================
    // Building
    // ========================================================================

    /// Adds a track/target pair, widening the group's frame window to cover
    /// the track's key range.
    pub fn add_targeted_animation(
        &mut self,
        animation: Arc<KeyframeTrack>,
        target: &TargetHandle,
    ) -> &TargetedAnimation {
        self.from_frame = self.from_frame.min(animation.first_frame());
        self.to_frame = self.to_frame.max(animation.last_frame());
        self.targeted_animations.push(TargetedAnimation {
            animation,
            target: Rc::clone(target),
        });
        // Just pushed, cannot be empty.
        &self.targeted_animations[self.targeted_animations.len() - 1]
    }

    /// Makes every member track span the same `[begin, end]` window by
    /// inserting hold keys at the boundaries where needed.
    ///
    /// Tracks are copy-on-write: a track shared outside the group keeps its
    /// original keys.
    pub fn normalize(&mut self, begin_frame: Option<f32>, end_frame: Option<f32>) {
        if self.targeted_animations.is_empty() {
            return;
        }
        let begin = begin_frame.unwrap_or(self.from_frame);
        let end = end_frame.unwrap_or(self.to_frame);
        for targeted in &mut self.targeted_animations {
            let track = &targeted.animation;
            let needs_front = track.keys().first().is_some_and(|k| k.frame > begin);
            let needs_back = track.keys().last().is_some_and(|k| k.frame < end);
            if !needs_front && !needs_back {
                continue;
            }
            let track = Arc::make_mut(&mut targeted.animation);
            let keys = track.keys_mut();
            if needs_front
                && let Some(first) = keys.first().cloned()
            {
                keys.insert(0, Keyframe::new(begin, first.value));
            }
            if needs_back
                && let Some(last) = keys.last().cloned()
            {
                keys.push(Keyframe::new(end, last.value));
            }
        }
        self.from_frame = self.from_frame.min(begin);
        self.to_frame = self.to_frame.max(end);
    }

    // ========================================================================
    // Playback
    // ========================================================================

    /// Starts every member in the same scheduler tick.
    ///
    /// No-op when already started or empty. Each member's end hook notifies
    /// the per-target observable and decrements the live counter; the group
    /// end observable fires when the counter reaches zero.
    pub fn start(
        &mut self,
        scheduler: &mut AnimationScheduler,
        loop_animation: bool,
        speed_ratio: f32,
        from_frame: Option<f32>,
        to_frame: Option<f32>,
    ) -> Result<()> {
        if self.is_started || self.targeted_animations.is_empty() {
            return Ok(());
        }
        let from = from_frame.unwrap_or(self.from_frame);
        let to = to_frame.unwrap_or(self.to_frame);
        self.loop_animation = loop_animation;
        self.speed_ratio = speed_ratio;
        self.live_count.set(self.targeted_animations.len());

        for targeted in &self.targeted_animations {
            let live = Rc::clone(&self.live_count);
            let group_end = Rc::clone(&self.on_animation_group_end);
            let member_end = Rc::clone(&self.on_animation_end);
            let target_id = targeted.target.borrow().unique_id();
            let on_end: Box<dyn FnMut()> = Box::new(move || {
                member_end.borrow_mut().notify(&target_id);
                let remaining = live.get().saturating_sub(1);
                live.set(remaining);
                if remaining == 0 {
                    group_end.borrow_mut().notify(&());
                }
            });
            let animatable = scheduler.begin_direct_animation(
                &targeted.target,
                std::slice::from_ref(&targeted.animation),
                from,
                to,
                loop_animation,
                speed_ratio,
                Some(on_end),
            )?;
            self.animatables.push(animatable);
        }

        self.is_started = true;
        self.is_paused = false;
        self.on_animation_group_play_observable.notify(&());
        Ok(())
    }

    /// Freezes every member. Safe no-op before `start`.
    pub fn pause(&mut self) {
        if !self.is_started {
            return;
        }
        self.is_paused = true;
        for animatable in &self.animatables {
            animatable.borrow_mut().pause();
        }
        self.on_animation_group_pause_observable.notify(&());
    }

    /// Resumes every paused member. Safe no-op before `start`.
    pub fn restart(&mut self) {
        if !self.is_started {
            return;
        }
        self.is_paused = false;
        for animatable in &self.animatables {
            animatable.borrow_mut().restart();
        }
        self.on_animation_group_play_observable.notify(&());
    }

    /// Jumps every member to `frame`. Safe no-op before `start`.
    pub fn go_to_frame(&mut self, frame: f32) {
        if !self.is_started {
            return;
        }
        for animatable in &self.animatables {
            animatable.borrow_mut().go_to_frame(frame);
        }
    }

    /// Stops every member; spawned animatables are swept by the scheduler.
    pub fn stop(&mut self) {
        if !self.is_started {
            return;
        }
        self.is_started = false;
        for animatable in &self.animatables {
            animatable.borrow_mut().stop(None, None);
        }
        self.animatables.clear();
    }

    /// Rewinds every member to the group's from frame, keeping them playing.
    pub fn reset(&mut self) {
        if !self.is_started {
            return;
        }
        let from = self.from_frame;
        for animatable in &self.animatables {
            let mut animatable = animatable.borrow_mut();
            animatable.restart();
            animatable.go_to_frame(from);
        }
    }

    /// Broadcasts a blend weight to every member. Safe no-op before `start`.
    pub fn set_weight_for_all(&mut self, weight: f32) {
        for animatable in &self.animatables {
            animatable.borrow_mut().set_weight(weight);
        }
    }

    /// Synchronizes every member's timeline with `root`.
    pub fn sync_all_animations_with(
        &mut self,
        scheduler: &mut AnimationScheduler,
        root: Option<&AnimatableHandle>,
    ) {
        for animatable in &self.animatables {
            scheduler.sync_animatables(animatable, root);
        }
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    pub fn serialize(&self) -> Result<Value> {
        let targeted = self
            .targeted_animations
            .iter()
            .map(TargetedAnimation::serialize)
            .collect::<Result<Vec<_>>>()?;
        Ok(json!({
            "name": self.name,
            "from": self.from_frame(),
            "to": self.to_frame(),
            "targetedAnimations": targeted,
        }))
    }

    /// Rebuilds a group from its serialized form, resolving each `targetId`
    /// through `resolve_target` (usually a scene node lookup).
    pub fn parse(
        parsed: &Value,
        resolve_target: impl Fn(u64) -> Option<TargetHandle>,
    ) -> Result<Self> {
        let name = parsed
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| OrreryError::ParseError("animation group without a name".into()))?;
        let mut group = Self::new(name);
        let targeted = parsed
            .get("targetedAnimations")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                OrreryError::ParseError(format!(
                    "animation group \"{name}\" without targetedAnimations"
                ))
            })?;
        for entry in targeted {
            let animation = entry.get("animation").ok_or_else(|| {
                OrreryError::ParseError(format!(
                    "animation group \"{name}\": targeted animation without a track"
                ))
            })?;
            let track = Arc::new(KeyframeTrack::parse(animation)?);
            let target_id = entry.get("targetId").and_then(Value::as_u64).ok_or_else(|| {
                OrreryError::ParseError(format!(
                    "animation group \"{name}\": targeted animation without a targetId"
                ))
            })?;
            let Some(target) = resolve_target(target_id) else {
                log::warn!(
                    "Animation group \"{name}\": target {target_id} not found, skipping track \"{}\"",
                    track.name
                );
                continue;
            };
            group.add_targeted_animation(track, &target);
        }
        Ok(group)
    }
}

impl std::fmt::Debug for AnimationGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationGroup")
            .field("name", &self.name)
            .field("from", &self.from_frame())
            .field("to", &self.to_frame())
            .field("is_started", &self.is_started)
            .field("members", &self.targeted_animations.len())
            .finish_non_exhaustive()
    }
}
