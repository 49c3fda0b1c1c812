//! The per-frame driver of all active animatables.
//!
//! Single-threaded and frame-stepped: the host render loop calls
//! [`AnimationScheduler::animate`] once per tick with the elapsed delta.
//! Active animatables advance sequentially in registration order, so two
//! animatables writing the same property resolve last-writer-wins (and a
//! weighted animatable blends against whatever value it observes when its
//! turn comes).

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::animation::animatable::{Animatable, AnimatableHandle, AnimatableState};
use crate::animation::target::{TargetHandle, same_target};
use crate::animation::track::KeyframeTrack;
use crate::errors::Result;

/// Registry and driver for active animatables.
#[derive(Debug, Default)]
pub struct AnimationScheduler {
    active: Vec<AnimatableHandle>,
    clock_ms: f32,
}

impl AnimationScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulated scheduler clock in milliseconds.
    #[must_use]
    pub fn clock_ms(&self) -> f32 {
        self.clock_ms
    }

    #[must_use]
    pub fn active_animatables(&self) -> &[AnimatableHandle] {
        &self.active
    }

    /// Registers an animatable; duplicates are ignored.
    pub fn add_active_animatable(&mut self, animatable: &AnimatableHandle) {
        if !self.active.iter().any(|a| Rc::ptr_eq(a, animatable)) {
            self.active.push(Rc::clone(animatable));
        }
    }

    pub fn remove_active_animatable(&mut self, animatable: &AnimatableHandle) {
        self.active.retain(|a| !Rc::ptr_eq(a, animatable));
    }

    /// Advances every active animatable by the elapsed delta and sweeps out
    /// the ones that finished or were stopped.
    pub fn animate(&mut self, delta_seconds: f32) {
        self.clock_ms += delta_seconds * 1000.0;
        let clock = self.clock_ms;
        self.active
            .retain(|animatable| animatable.borrow_mut().animate_tick(clock));
    }

    /// Starts the tracks attached to `target` (stopping any animatable
    /// already playing on it) and registers the new animatable.
    pub fn begin_animation(
        &mut self,
        target: &TargetHandle,
        from_frame: f32,
        to_frame: f32,
        loop_animation: bool,
        speed_ratio: f32,
        on_animation_end: Option<Box<dyn FnMut()>>,
    ) -> Result<AnimatableHandle> {
        self.stop_animation(target, None);
        let tracks = target.borrow().animations().to_vec();
        self.begin_direct_animation(
            target,
            &tracks,
            from_frame,
            to_frame,
            loop_animation,
            speed_ratio,
            on_animation_end,
        )
    }

    /// Starts an explicit track list on `target` and registers the new
    /// animatable. Does not stop animatables already playing on the target.
    pub fn begin_direct_animation(
        &mut self,
        target: &TargetHandle,
        tracks: &[Arc<KeyframeTrack>],
        from_frame: f32,
        to_frame: f32,
        loop_animation: bool,
        speed_ratio: f32,
        on_animation_end: Option<Box<dyn FnMut()>>,
    ) -> Result<AnimatableHandle> {
        let mut animatable = Animatable::new(
            Rc::clone(target),
            tracks,
            from_frame,
            to_frame,
            loop_animation,
            speed_ratio,
        )?;
        if let Some(callback) = on_animation_end {
            animatable.set_on_animation_end(callback);
        }
        let handle: AnimatableHandle = Rc::new(RefCell::new(animatable));
        self.active.push(Rc::clone(&handle));
        Ok(handle)
    }

    /// Stops every animatable playing on `target`, optionally filtered by
    /// track name. Stopped animatables are swept on the next tick.
    pub fn stop_animation(&mut self, target: &TargetHandle, animation_name: Option<&str>) {
        for animatable in &self.active {
            let matches = {
                let a = animatable.borrow();
                same_target(a.target(), target)
            };
            if matches {
                animatable.borrow_mut().stop(animation_name, None);
            }
        }
        self.sweep();
    }

    /// Stops and removes every active animatable.
    pub fn stop_all_animations(&mut self) {
        for animatable in &self.active {
            animatable.borrow_mut().stop(None, None);
        }
        self.active.clear();
    }

    /// First active animatable playing on `target`, if any.
    #[must_use]
    pub fn get_animatable_by_target(&self, target: &TargetHandle) -> Option<AnimatableHandle> {
        self.active
            .iter()
            .find(|a| same_target(a.borrow().target(), target))
            .cloned()
    }

    /// Every active animatable playing on `target`.
    #[must_use]
    pub fn get_all_animatables_by_target(&self, target: &TargetHandle) -> Vec<AnimatableHandle> {
        self.active
            .iter()
            .filter(|a| same_target(a.borrow().target(), target))
            .cloned()
            .collect()
    }

    /// Synchronizes `child`'s timeline with `root` and re-orders the child
    /// after the root so the root's frame is fresh when the child reads it.
    pub fn sync_animatables(&mut self, child: &AnimatableHandle, root: Option<&AnimatableHandle>) {
        child.borrow_mut().sync_with(root);
        if root.is_some()
            && let Some(index) = self.active.iter().position(|a| Rc::ptr_eq(a, child))
        {
            let handle = self.active.remove(index);
            self.active.push(handle);
        }
    }

    /// Drops animatables whose state became terminal outside a tick.
    fn sweep(&mut self) {
        self.active
            .retain(|animatable| animatable.borrow().state() != AnimatableState::Stopped);
    }
}
