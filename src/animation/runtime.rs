//! The live binding of one [`KeyframeTrack`] to one target property.
//!
//! A `RuntimeAnimation` owns all per-playback state: the frame cursor, the
//! key cursor, the blend snapshot and the relative-loop offset caches. The
//! target property path is resolved exactly once at construction; the
//! per-frame path performs no parsing and no allocation.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::animation::target::{PropertySlot, TargetHandle, WeakTargetHandle};
use crate::animation::track::{AnimationEvent, AnimationLoopMode, KeyCursor, KeyframeTrack};
use crate::animation::value::{AnimationValue, AnimationValueKind};
use crate::errors::{OrreryError, Result};

/// Outcome of one frame advance.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeStatus {
    /// False once a non-looping playback has reached its boundary frame.
    pub running: bool,
    /// True on the frame where a looping playback wrapped.
    pub looped: bool,
}

/// An event cloned from the track, with a local done flag.
#[derive(Debug, Clone)]
struct PendingEvent {
    event: AnimationEvent,
    is_done: bool,
}

type RangeKey = (u32, u32);

/// Live playback state for one track on one target property.
pub struct RuntimeAnimation {
    track: Arc<KeyframeTrack>,
    target: WeakTargetHandle,
    slot: PropertySlot,
    current_frame: f32,
    cursor: KeyCursor,
    stopped: bool,
    /// Target's pre-animation value, captured once at blend start.
    original_value: Option<AnimationValue>,
    blending_factor: f32,
    current_value: Option<AnimationValue>,
    // Speed-ratio-change bookkeeping: keeps the visible frame continuous
    // when the owner's speed ratio changes mid-playback.
    ratio_offset: f32,
    previous_delay_ms: f32,
    previous_ratio: f32,
    // Per (from, to) range: net value delta and boundary value, used by the
    // Relative and Constant loop modes.
    offsets_cache: FxHashMap<RangeKey, AnimationValue>,
    high_limits_cache: FxHashMap<RangeKey, AnimationValue>,
    events: SmallVec<[PendingEvent; 2]>,
}

impl RuntimeAnimation {
    /// Binds `track` to its target property on `target`.
    ///
    /// Fails if the track's property path does not resolve on the target;
    /// this is the only place path resolution happens.
    pub fn new(track: Arc<KeyframeTrack>, target: &TargetHandle) -> Result<Self> {
        let slot = {
            let target_ref = target.borrow();
            target_ref
                .resolve_property(&track.target_property)
                .ok_or_else(|| OrreryError::UnknownTargetProperty {
                    property: track.target_property.clone(),
                    target: target_ref.name().to_owned(),
                })?
        };
        let events = track
            .events()
            .iter()
            .map(|event| PendingEvent {
                event: event.clone(),
                is_done: false,
            })
            .collect();
        Ok(Self {
            track,
            target: std::rc::Rc::downgrade(target),
            slot,
            current_frame: 0.0,
            cursor: KeyCursor::default(),
            stopped: false,
            original_value: None,
            blending_factor: 0.0,
            current_value: None,
            ratio_offset: 0.0,
            previous_delay_ms: 0.0,
            previous_ratio: 0.0,
            offsets_cache: FxHashMap::default(),
            high_limits_cache: FxHashMap::default(),
            events,
        })
    }

    #[must_use]
    pub fn track(&self) -> &Arc<KeyframeTrack> {
        &self.track
    }

    #[must_use]
    pub fn current_frame(&self) -> f32 {
        self.current_frame
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Last value written to the target, if any.
    #[must_use]
    pub fn current_value(&self) -> Option<&AnimationValue> {
        self.current_value.as_ref()
    }

    /// Upgrades the weak target handle; `None` once the target is disposed.
    #[must_use]
    pub fn target(&self) -> Option<TargetHandle> {
        self.target.upgrade()
    }

    /// Whether this binding writes to the given target.
    #[must_use]
    pub fn targets(&self, other: &TargetHandle) -> bool {
        self.target
            .upgrade()
            .is_some_and(|t| t.borrow().unique_id() == other.borrow().unique_id())
    }

    /// Clears all playback state.
    ///
    /// With `restore_original`, the blend snapshot (the target's value before
    /// animation started) is written back first.
    pub fn reset(&mut self, restore_original: bool) {
        if restore_original
            && let (Some(original), Some(target)) = (&self.original_value, self.target.upgrade())
        {
            target.borrow_mut().write(self.slot, original);
        }
        self.offsets_cache.clear();
        self.high_limits_cache.clear();
        self.stopped = false;
        self.current_frame = 0.0;
        self.cursor = KeyCursor::default();
        self.blending_factor = 0.0;
        self.original_value = None;
        self.current_value = None;
        for pending in &mut self.events {
            pending.is_done = false;
        }
    }

    /// Drops the blend snapshot so the next blended write re-captures it.
    pub(crate) fn clear_blend_snapshot(&mut self) {
        self.original_value = None;
        self.blending_factor = 0.0;
    }

    /// Toggles transition blending on this binding's private copy of the
    /// track (copy-on-write, so other bindings sharing the track are
    /// unaffected) and re-arms the snapshot.
    pub(crate) fn set_blending(&mut self, enabled: bool, blending_speed: f32) {
        let track = Arc::make_mut(&mut self.track);
        track.enable_blending = enabled;
        if enabled {
            track.blending_speed = blending_speed;
        }
        self.clear_blend_snapshot();
    }

    /// Adjusts the ratio offset so a live speed-ratio change does not make
    /// the current frame jump.
    pub(crate) fn prepare_for_speed_ratio_change(&mut self, new_speed_ratio: f32) {
        let new_ratio =
            self.previous_delay_ms * (self.track.frame_per_second * new_speed_ratio) / 1000.0;
        self.ratio_offset = self.previous_ratio - new_ratio;
    }

    /// Hard jump: relocates the cursor and writes the sampled value without
    /// any blending transition.
    pub fn go_to_frame(&mut self, frame: f32) {
        if self.track.keys().is_empty() {
            return;
        }
        let frame = frame.clamp(self.track.first_frame(), self.track.last_frame());
        self.current_frame = frame;
        let value = self.track.interpolate_at(frame, &mut self.cursor);
        self.write_value(value, -1.0);
    }

    /// Advances playback and writes the sampled value to the target.
    ///
    /// `delay_ms` is the wall-clock time since this playback's origin (the
    /// owner subtracts its local delay offset). `sync_ratio`, when set,
    /// overrides elapsed-based advance with a normalized [0,1] position
    /// derived from a sync root's timeline.
    pub fn animate(
        &mut self,
        delay_ms: f32,
        from: f32,
        to: f32,
        loop_animation: bool,
        speed_ratio: f32,
        weight: f32,
        sync_ratio: Option<f32>,
    ) -> RuntimeStatus {
        if self.stopped {
            return RuntimeStatus::default();
        }
        if self.track.keys().is_empty() || self.track.target_property.is_empty() {
            self.stopped = true;
            return RuntimeStatus::default();
        }

        let first = self.track.first_frame();
        let last = self.track.last_frame();

        // Clamp the requested window to the authored key range.
        let mut from = if from < first || from > last { first } else { from };
        let mut to = if to < first || to > last { last } else { to };

        // The window cannot be degenerate; widen it by one frame if possible.
        if (to - from).abs() <= f32::EPSILON {
            if from > first {
                from -= 1.0;
            } else if to < last {
                to += 1.0;
            } else {
                // Single-key track: always the key's value.
                let value = self.track.interpolate_at(first, &mut self.cursor);
                self.current_frame = to;
                self.write_value(value, weight);
                let running = loop_animation;
                self.stopped = !running;
                return RuntimeStatus {
                    running,
                    looped: false,
                };
            }
        }

        let range = to - from;
        // Frame offset since the playback origin, signed by the speed ratio.
        let ratio =
            delay_ms * (self.track.frame_per_second * speed_ratio) / 1000.0 + self.ratio_offset;
        self.previous_delay_ms = delay_ms;
        self.previous_ratio = ratio;

        let mut running = true;
        if !loop_animation && (ratio >= range || (speed_ratio < 0.0 && ratio <= -range)) {
            // A full traversal elapsed without looping: clamp to the
            // boundary frame the playback was heading toward.
            running = false;
        }

        let mut current = if running {
            from + ratio.rem_euclid(range)
        } else if ratio >= range {
            to
        } else {
            from
        };
        let repeat_count = if running { (ratio / range).floor() as i32 } else { 0 };

        // Synchronized playback: derive the frame from the root's timeline.
        if let Some(host_ratio) = sync_ratio {
            current = from + range * host_ratio;
        }

        let looped = loop_animation
            && ((speed_ratio >= 0.0 && current < self.current_frame)
                || (speed_ratio < 0.0 && current > self.current_frame));

        // Relative and Constant modes need the window's net delta and
        // boundary value; cache them per (from, to) window.
        let kind = self
            .track
            .value_kind()
            .unwrap_or(AnimationValueKind::Float);
        let mut offset = AnimationValue::zero(kind);
        let mut high_limit = AnimationValue::zero(kind);
        if self.track.loop_mode != AnimationLoopMode::Cycle {
            let key: RangeKey = (from.to_bits(), to.to_bits());
            if !self.offsets_cache.contains_key(&key) {
                let mut scratch = KeyCursor::default();
                let from_value = self.track.interpolate_at(from, &mut scratch);
                let to_value = self.track.interpolate_at(to, &mut scratch);
                self.offsets_cache.insert(key, to_value.sub(&from_value));
                self.high_limits_cache.insert(key, to_value);
            }
            if let Some(cached) = self.offsets_cache.get(&key) {
                offset = cached.clone();
            }
            if let Some(cached) = self.high_limits_cache.get(&key) {
                high_limit = cached.clone();
            }
        }

        let value = self.evaluate(current, repeat_count, &offset, &high_limit);
        self.write_value(value, weight);

        self.fire_events(from, to, speed_ratio, looped);

        if !running {
            self.stopped = true;
        }
        RuntimeStatus { running, looped }
    }

    /// Samples the track at `frame`, applying loop-mode arithmetic.
    fn evaluate(
        &mut self,
        frame: f32,
        repeat_count: i32,
        offset: &AnimationValue,
        high_limit: &AnimationValue,
    ) -> AnimationValue {
        self.current_frame = frame;
        if self.track.loop_mode == AnimationLoopMode::Constant && repeat_count != 0 {
            return high_limit.clone();
        }
        let value = self.track.interpolate_at(frame, &mut self.cursor);
        if self.track.loop_mode == AnimationLoopMode::Relative && repeat_count != 0 {
            value.add(&offset.scale(repeat_count as f32))
        } else {
            value
        }
    }

    /// Writes `value` to the target property, applying blending.
    ///
    /// A disposed target is a silent skip: this runs once per active
    /// animation per frame and must never fail.
    fn write_value(&mut self, value: AnimationValue, weight: f32) {
        let Some(target) = self.target.upgrade() else {
            log::debug!(
                "Track \"{}\": skipping write, target disposed",
                self.track.name
            );
            return;
        };
        let mut object = target.borrow_mut();

        let mut value = value;
        // Transition blending: ramp from the pre-animation value toward the
        // sampled value at blending_speed per frame.
        if self.track.enable_blending && self.blending_factor <= 1.0 {
            let original = self
                .original_value
                .get_or_insert_with(|| object.read(self.slot))
                .clone();
            self.blending_factor += self.track.blending_speed;
            value = original.lerp(&value, self.blending_factor.min(1.0));
        }

        if weight < 0.0 {
            // Unweighted: full override.
            object.write(self.slot, &value);
        } else {
            // Weighted: mix against the once-captured snapshot.
            let original = self
                .original_value
                .get_or_insert_with(|| object.read(self.slot))
                .clone();
            value = original.lerp(&value, weight);
            object.write(self.slot, &value);
        }
        self.current_value = Some(value);
    }

    /// Fires events the playhead has passed, respecting direction, and
    /// re-arms non-once events after a loop wrap.
    fn fire_events(&mut self, from: f32, to: f32, speed_ratio: f32, looped: bool) {
        if self.events.is_empty() {
            return;
        }
        if looped {
            for pending in &mut self.events {
                if !pending.event.only_once {
                    pending.is_done = false;
                }
            }
        }
        let current = self.current_frame;
        let mut index = 0;
        while index < self.events.len() {
            let pending = &self.events[index];
            let passed = if speed_ratio >= 0.0 {
                current >= pending.event.frame && pending.event.frame >= from
            } else {
                current <= pending.event.frame && pending.event.frame <= to
            };
            if passed && !pending.is_done {
                if pending.event.only_once {
                    let pending = self.events.remove(index);
                    (pending.event.action)(current);
                    continue;
                }
                self.events[index].is_done = true;
                let action = std::rc::Rc::clone(&self.events[index].event.action);
                action(current);
            }
            index += 1;
        }
    }
}

impl std::fmt::Debug for RuntimeAnimation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeAnimation")
            .field("track", &self.track.name)
            .field("property", &self.track.target_property)
            .field("current_frame", &self.current_frame)
            .field("stopped", &self.stopped)
            .finish_non_exhaustive()
    }
}
