//! A bundle of runtime animations started together on one target.
//!
//! The animatable owns play/pause/stop/speed/weight controls and the
//! per-frame advancement logic; the scheduler drives every active animatable
//! once per tick and drops the ones that report completion.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::animation::observable::Observable;
use crate::animation::runtime::RuntimeAnimation;
use crate::animation::target::TargetHandle;
use crate::animation::track::KeyframeTrack;
use crate::errors::{OrreryError, Result};

/// Default frame window when none is requested.
pub const DEFAULT_FROM_FRAME: f32 = 0.0;
pub const DEFAULT_TO_FRAME: f32 = 100.0;

/// Playback state of an [`Animatable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatableState {
    Playing,
    Paused,
    Stopped,
}

/// Shared handle to an animatable, as stored in the scheduler's active list.
pub type AnimatableHandle = Rc<RefCell<Animatable>>;

/// A group of runtime animations sharing one frame window, speed ratio,
/// weight and loop flag.
pub struct Animatable {
    target: TargetHandle,
    pub from_frame: f32,
    pub to_frame: f32,
    pub loop_animation: bool,
    /// Self-remove from the scheduler once the window completes without loop.
    pub dispose_on_end: bool,
    speed_ratio: f32,
    /// -1 = unweighted (full override), else in [0, 1].
    weight: f32,
    paused: bool,
    stopped: bool,
    finished: bool,
    animation_started: bool,
    // Wall-clock bookkeeping: `local_delay_offset` anchors this playback's
    // origin on the scheduler clock; `paused_delay` records when a pause
    // began so paused time is not double-counted on resume.
    local_delay_offset: Option<f32>,
    paused_delay: Option<f32>,
    manual_jump_delay: Option<f32>,
    runtime_animations: Vec<RuntimeAnimation>,
    sync_root: Option<Weak<RefCell<Animatable>>>,
    on_animation_end: Option<Box<dyn FnMut()>>,
    on_animation_loop: Option<Box<dyn FnMut()>>,
    pub on_animation_end_observable: Observable<()>,
    pub on_animation_loop_observable: Observable<()>,
}

impl Animatable {
    /// Builds an animatable with one runtime animation per track.
    ///
    /// Fails on an inverted frame window, an empty track list, or a track
    /// whose property path does not resolve on the target — configuration
    /// errors surface here, never mid-playback.
    pub fn new(
        target: TargetHandle,
        tracks: &[Arc<KeyframeTrack>],
        from_frame: f32,
        to_frame: f32,
        loop_animation: bool,
        speed_ratio: f32,
    ) -> Result<Self> {
        if from_frame > to_frame {
            return Err(OrreryError::InvalidFrameRange {
                from: from_frame,
                to: to_frame,
            });
        }
        if tracks.is_empty() {
            return Err(OrreryError::EmptyAnimationList(
                target.borrow().name().to_owned(),
            ));
        }
        let mut runtime_animations = Vec::with_capacity(tracks.len());
        for track in tracks {
            runtime_animations.push(RuntimeAnimation::new(Arc::clone(track), &target)?);
        }
        Ok(Self {
            target,
            from_frame,
            to_frame,
            loop_animation,
            dispose_on_end: true,
            speed_ratio,
            weight: -1.0,
            paused: false,
            stopped: false,
            finished: false,
            animation_started: false,
            local_delay_offset: None,
            paused_delay: None,
            manual_jump_delay: None,
            runtime_animations,
            sync_root: None,
            on_animation_end: None,
            on_animation_loop: None,
            on_animation_end_observable: Observable::new(),
            on_animation_loop_observable: Observable::new(),
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn target(&self) -> &TargetHandle {
        &self.target
    }

    #[must_use]
    pub fn state(&self) -> AnimatableState {
        if self.stopped || (self.finished && self.dispose_on_end) {
            AnimatableState::Stopped
        } else if self.paused {
            AnimatableState::Paused
        } else {
            AnimatableState::Playing
        }
    }

    #[must_use]
    pub fn runtime_animations(&self) -> &[RuntimeAnimation] {
        &self.runtime_animations
    }

    /// Whether at least one runtime animation advanced on the last tick.
    #[must_use]
    pub fn animation_started(&self) -> bool {
        self.animation_started
    }

    /// Representative frame of this animatable: the current frame of its
    /// first runtime animation (all share the same cursor by construction).
    #[must_use]
    pub fn master_frame(&self) -> f32 {
        self.runtime_animations
            .first()
            .map_or(0.0, RuntimeAnimation::current_frame)
    }

    #[must_use]
    pub fn speed_ratio(&self) -> f32 {
        self.speed_ratio
    }

    /// Changes the speed ratio without making the current frame jump.
    pub fn set_speed_ratio(&mut self, speed_ratio: f32) {
        for animation in &mut self.runtime_animations {
            animation.prepare_for_speed_ratio_change(speed_ratio);
        }
        self.speed_ratio = speed_ratio;
    }

    #[must_use]
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Sets the blend weight; -1 disables weighting, other values clamp
    /// into [0, 1].
    pub fn set_weight(&mut self, weight: f32) {
        self.weight = if weight < 0.0 {
            -1.0
        } else {
            weight.clamp(0.0, 1.0)
        };
    }

    /// Turns on transition blending for every runtime animation.
    ///
    /// Calling this mid-flight re-arms the blend: snapshots are dropped and
    /// re-captured on the next write.
    pub fn enable_blending(&mut self, blending_speed: f32) {
        for animation in &mut self.runtime_animations {
            animation.set_blending(true, blending_speed);
        }
    }

    /// Turns off transition blending for every runtime animation.
    pub fn disable_blending(&mut self) {
        for animation in &mut self.runtime_animations {
            animation.set_blending(false, 0.0);
        }
    }

    /// Non-owning reference to the animatable this one's timeline follows.
    #[must_use]
    pub fn sync_root(&self) -> Option<&Weak<RefCell<Animatable>>> {
        self.sync_root.as_ref()
    }

    /// Synchronizes this animatable's timeline with `root`; pass `None` to
    /// detach. The scheduler re-orders this animatable after the root so the
    /// root's frame is fresh when it is read.
    pub fn sync_with(&mut self, root: Option<&AnimatableHandle>) {
        self.sync_root = root.map(Rc::downgrade);
    }

    pub fn set_on_animation_end(&mut self, callback: impl FnMut() + 'static) {
        self.on_animation_end = Some(Box::new(callback));
    }

    pub fn set_on_animation_loop(&mut self, callback: impl FnMut() + 'static) {
        self.on_animation_loop = Some(Box::new(callback));
    }

    // ========================================================================
    // Playback controls
    // ========================================================================

    /// Freezes playback; wall time spent paused is not counted.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resumes from the last live frame. No-op unless paused.
    pub fn restart(&mut self) {
        self.paused = false;
    }

    /// Relocates the cursor without changing state.
    ///
    /// The local delay offset is adjusted through the representative track's
    /// frame rate so the next advance continues from the jumped frame.
    pub fn go_to_frame(&mut self, frame: f32) {
        if let Some(first) = self.runtime_animations.first() {
            let fps = first.track().frame_per_second * self.speed_ratio;
            let adjust = if fps == 0.0 {
                0.0
            } else {
                ((frame - first.current_frame()) / fps) * 1000.0
            };
            self.manual_jump_delay = Some(-adjust);
        }
        for animation in &mut self.runtime_animations {
            animation.go_to_frame(frame);
        }
    }

    /// Stops playback, optionally only for runtime animations matching a
    /// track-name filter and/or a target mask.
    ///
    /// The whole animatable terminates (and will be swept from the
    /// scheduler) only when no runtime animations remain.
    pub fn stop(
        &mut self,
        animation_name: Option<&str>,
        target_mask: Option<&dyn Fn(&TargetHandle) -> bool>,
    ) {
        if animation_name.is_some() || target_mask.is_some() {
            self.runtime_animations.retain(|animation| {
                if let Some(name) = animation_name
                    && animation.track().name != name
                {
                    return true;
                }
                if let Some(mask) = target_mask
                    && !animation.target().as_ref().is_some_and(mask)
                {
                    return true;
                }
                false
            });
            if self.runtime_animations.is_empty() {
                self.stopped = true;
                self.raise_on_animation_end();
            }
        } else {
            self.stopped = true;
            self.raise_on_animation_end();
        }
    }

    /// Rewinds every runtime animation to its initial state.
    pub fn reset(&mut self, restore_original: bool) {
        for animation in &mut self.runtime_animations {
            animation.reset(restore_original);
        }
        self.finished = false;
        self.local_delay_offset = None;
        self.paused_delay = None;
        self.manual_jump_delay = None;
    }

    // ========================================================================
    // Per-frame advance
    // ========================================================================

    /// Advances playback to the scheduler clock `delay_ms`.
    ///
    /// Returns whether this animatable should stay in the active list.
    pub(crate) fn animate_tick(&mut self, delay_ms: f32) -> bool {
        if self.stopped {
            return false;
        }
        // A finished non-disposing animatable holds its final frame; the
        // end notification already fired.
        if self.finished {
            return !self.dispose_on_end;
        }
        if self.paused {
            self.animation_started = false;
            if self.paused_delay.is_none() {
                self.paused_delay = Some(delay_ms);
            }
            return true;
        }

        // Anchor or re-anchor the playback origin on the scheduler clock.
        match (self.local_delay_offset, self.paused_delay.take()) {
            (None, _) => self.local_delay_offset = Some(delay_ms),
            (Some(offset), Some(paused_at)) => {
                self.local_delay_offset = Some(offset + (delay_ms - paused_at));
            }
            _ => {}
        }
        if let Some(jump) = self.manual_jump_delay.take()
            && let Some(offset) = self.local_delay_offset
        {
            self.local_delay_offset = Some(offset + jump);
        }

        // A zero weight contributes nothing this frame but stays active.
        if self.weight == 0.0 {
            return true;
        }

        let local_delay = delay_ms - self.local_delay_offset.unwrap_or(delay_ms);

        // Synchronized playback: normalize the root's master frame into
        // [0, 1]. A dangling or busy root falls back to elapsed-time advance.
        let sync_ratio = self.sync_root.as_ref().and_then(|weak| {
            let root = weak.upgrade()?;
            let root = root.try_borrow().ok()?;
            let span = root.to_frame - root.from_frame;
            (span.abs() > f32::EPSILON).then(|| (root.master_frame() - root.from_frame) / span)
        });

        let mut running = false;
        let mut looped = false;
        for animation in &mut self.runtime_animations {
            let status = animation.animate(
                local_delay,
                self.from_frame,
                self.to_frame,
                self.loop_animation,
                self.speed_ratio,
                self.weight,
                sync_ratio,
            );
            running = running || status.running;
            looped = looped || status.looped;
        }
        self.animation_started = running;

        if looped {
            if let Some(callback) = self.on_animation_loop.as_mut() {
                callback();
            }
            self.on_animation_loop_observable.notify(&());
        }

        if !running {
            self.finished = true;
            self.raise_on_animation_end();
            return !self.dispose_on_end;
        }
        true
    }

    fn raise_on_animation_end(&mut self) {
        if let Some(callback) = self.on_animation_end.as_mut() {
            callback();
        }
        self.on_animation_end_observable.notify(&());
        if self.dispose_on_end {
            self.on_animation_end = None;
            self.on_animation_end_observable.clear();
            self.on_animation_loop_observable.clear();
        }
    }
}

impl std::fmt::Debug for Animatable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animatable")
            .field("target", &self.target.borrow().name())
            .field("from_frame", &self.from_frame)
            .field("to_frame", &self.to_frame)
            .field("loop_animation", &self.loop_animation)
            .field("state", &self.state())
            .field("animations", &self.runtime_animations.len())
            .finish_non_exhaustive()
    }
}
