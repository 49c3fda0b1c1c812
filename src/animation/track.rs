//! Keyframe curve data for one animated property.
//!
//! A [`KeyframeTrack`] is authored (or parsed) once and then shared immutably
//! between any number of runtime bindings via `Arc`. Sampling is pure; the
//! per-binding [`KeyCursor`] only caches the last key index so sequential
//! playback avoids a binary search every frame.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::animation::easing::Easing;
use crate::animation::value::{AnimationValue, AnimationValueKind};
use crate::errors::{OrreryError, Result};

/// How a key pair is bridged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyInterpolation {
    /// Interpolate toward the next key (linear, or Hermite when tangents exist).
    #[default]
    Curve,
    /// Hold this key's value until the next key's frame.
    Step,
}

/// What happens when the playhead runs past the last key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationLoopMode {
    /// Each completed cycle offsets the value by the net delta across the track.
    Relative,
    /// Wrap the frame modulo the track span.
    #[default]
    Cycle,
    /// Clamp to the boundary value.
    Constant,
}

impl AnimationLoopMode {
    /// Scene-file `loopBehavior` id.
    #[must_use]
    pub fn id(self) -> u32 {
        match self {
            Self::Relative => 0,
            Self::Cycle => 1,
            Self::Constant => 2,
        }
    }

    /// Inverse of [`id`](Self::id); unknown ids fall back to `Cycle`.
    #[must_use]
    pub fn from_id(id: u32) -> Self {
        match id {
            0 => Self::Relative,
            2 => Self::Constant,
            _ => Self::Cycle,
        }
    }
}

/// One authored key on a track.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    pub frame: f32,
    pub value: AnimationValue,
    /// Incoming Hermite tangent, in value units per frame.
    pub in_tangent: Option<AnimationValue>,
    /// Outgoing Hermite tangent, in value units per frame.
    pub out_tangent: Option<AnimationValue>,
    pub interpolation: KeyInterpolation,
}

impl Keyframe {
    #[must_use]
    pub fn new(frame: f32, value: impl Into<AnimationValue>) -> Self {
        Self {
            frame,
            value: value.into(),
            in_tangent: None,
            out_tangent: None,
            interpolation: KeyInterpolation::Curve,
        }
    }

    #[must_use]
    pub fn stepped(frame: f32, value: impl Into<AnimationValue>) -> Self {
        Self {
            interpolation: KeyInterpolation::Step,
            ..Self::new(frame, value)
        }
    }

    #[must_use]
    pub fn with_tangents(
        mut self,
        in_tangent: impl Into<AnimationValue>,
        out_tangent: impl Into<AnimationValue>,
    ) -> Self {
        self.in_tangent = Some(in_tangent.into());
        self.out_tangent = Some(out_tangent.into());
        self
    }
}

/// A callback attached to a specific frame of a track.
///
/// Events are cloned into each runtime binding, which tracks its own
/// done flags so looping playback can re-fire them.
#[derive(Clone)]
pub struct AnimationEvent {
    pub frame: f32,
    /// Remove the event after its first firing instead of re-arming on loop.
    pub only_once: bool,
    pub action: Rc<dyn Fn(f32)>,
}

impl AnimationEvent {
    pub fn new(frame: f32, action: impl Fn(f32) + 'static) -> Self {
        Self {
            frame,
            only_once: false,
            action: Rc::new(action),
        }
    }

    #[must_use]
    pub fn once(mut self) -> Self {
        self.only_once = true;
        self
    }
}

impl fmt::Debug for AnimationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationEvent")
            .field("frame", &self.frame)
            .field("only_once", &self.only_once)
            .finish_non_exhaustive()
    }
}

/// Last-hit key index for O(1) amortized sequential sampling.
#[derive(Debug, Clone, Default)]
pub struct KeyCursor {
    last_index: usize,
}

const MAX_SCAN_OFFSET: usize = 3;

/// An ordered keyframe curve bound to a named target property path.
#[derive(Debug, Clone)]
pub struct KeyframeTrack {
    pub name: String,
    /// Property path on the target, e.g. `"position"` or `"position.x"`.
    pub target_property: String,
    pub frame_per_second: f32,
    pub loop_mode: AnimationLoopMode,
    pub easing: Option<Easing>,
    /// When set, runtime bindings ramp from the target's pre-animation value
    /// toward the sampled value at `blending_speed` per frame.
    pub enable_blending: bool,
    pub blending_speed: f32,
    keys: Vec<Keyframe>,
    events: Vec<AnimationEvent>,
}

impl KeyframeTrack {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        target_property: impl Into<String>,
        frame_per_second: f32,
        loop_mode: AnimationLoopMode,
    ) -> Self {
        Self {
            name: name.into(),
            target_property: target_property.into(),
            frame_per_second,
            loop_mode,
            easing: None,
            enable_blending: false,
            blending_speed: 0.01,
            keys: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Builder form of [`set_keys`](Self::set_keys).
    #[must_use]
    pub fn with_keys(mut self, keys: Vec<Keyframe>) -> Self {
        self.set_keys(keys);
        self
    }

    #[must_use]
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }

    /// Two-key track from `from` to `to` over `total_frames` frames.
    #[must_use]
    pub fn prepare(
        name: impl Into<String>,
        target_property: impl Into<String>,
        frame_per_second: f32,
        total_frames: f32,
        from: impl Into<AnimationValue>,
        to: impl Into<AnimationValue>,
        loop_mode: AnimationLoopMode,
    ) -> Self {
        Self::new(name, target_property, frame_per_second, loop_mode).with_keys(vec![
            Keyframe::new(0.0, from),
            Keyframe::new(total_frames, to),
        ])
    }

    /// Replaces the key list, restoring the sorted-by-frame invariant.
    pub fn set_keys(&mut self, mut keys: Vec<Keyframe>) {
        if !keys.is_sorted_by(|a, b| a.frame <= b.frame) {
            log::warn!(
                "Track \"{}\": keys were not sorted by frame, normalizing",
                self.name
            );
            keys.sort_by(|a, b| a.frame.total_cmp(&b.frame));
        }
        self.keys = keys;
    }

    #[must_use]
    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Direct key access for group normalization; the caller is responsible
    /// for keeping frames sorted.
    pub(crate) fn keys_mut(&mut self) -> &mut Vec<Keyframe> {
        &mut self.keys
    }

    /// Value kind animated by this track, from its first key.
    #[must_use]
    pub fn value_kind(&self) -> Option<AnimationValueKind> {
        self.keys.first().map(|k| k.value.kind())
    }

    #[must_use]
    pub fn first_frame(&self) -> f32 {
        self.keys.first().map_or(0.0, |k| k.frame)
    }

    #[must_use]
    pub fn last_frame(&self) -> f32 {
        self.keys.last().map_or(0.0, |k| k.frame)
    }

    pub fn add_event(&mut self, event: AnimationEvent) {
        self.events.push(event);
    }

    /// Removes every event registered at `frame`.
    pub fn remove_events(&mut self, frame: f32) {
        self.events.retain(|e| e.frame != frame);
    }

    #[must_use]
    pub fn events(&self) -> &[AnimationEvent] {
        &self.events
    }

    // ========================================================================
    // Sampling
    // ========================================================================

    /// Pure sample honoring the track's own loop mode.
    ///
    /// Never fails: an empty track samples to `Float(0)`, a single-key track
    /// always returns that key's value, and any out-of-range frame is
    /// clamped, wrapped or extrapolated per [`AnimationLoopMode`].
    #[must_use]
    pub fn sample(&self, frame: f32) -> AnimationValue {
        let mut cursor = KeyCursor::default();
        self.sample_with_cursor(frame, &mut cursor)
    }

    /// Cursor-carrying variant of [`sample`](Self::sample); identical results.
    #[must_use]
    pub fn sample_with_cursor(&self, frame: f32, cursor: &mut KeyCursor) -> AnimationValue {
        let Some(first) = self.keys.first() else {
            return AnimationValue::Float(0.0);
        };
        let Some(last) = self.keys.last() else {
            return AnimationValue::Float(0.0);
        };
        if self.keys.len() == 1 {
            return first.value.clone();
        }
        let span = last.frame - first.frame;
        if span <= f32::EPSILON {
            return last.value.clone();
        }

        match self.loop_mode {
            AnimationLoopMode::Constant => {
                self.interpolate_at(frame.clamp(first.frame, last.frame), cursor)
            }
            AnimationLoopMode::Cycle => {
                if frame < first.frame {
                    first.value.clone()
                } else if frame > last.frame {
                    let wrapped = first.frame + (frame - first.frame).rem_euclid(span);
                    self.interpolate_at(wrapped, cursor)
                } else {
                    self.interpolate_at(frame, cursor)
                }
            }
            AnimationLoopMode::Relative => {
                if frame < first.frame {
                    first.value.clone()
                } else if frame > last.frame {
                    let repeats = ((frame - first.frame) / span).floor();
                    let wrapped = first.frame + (frame - first.frame).rem_euclid(span);
                    let net_delta = last.value.sub(&first.value);
                    self.interpolate_at(wrapped, cursor)
                        .add(&net_delta.scale(repeats))
                } else {
                    self.interpolate_at(frame, cursor)
                }
            }
        }
    }

    /// Interpolates between the key pair bracketing `frame`.
    ///
    /// `frame` is assumed within the key range; out-of-range frames clamp to
    /// the boundary values. Called by the runtime binding which performs its
    /// own loop arithmetic.
    #[must_use]
    pub(crate) fn interpolate_at(&self, frame: f32, cursor: &mut KeyCursor) -> AnimationValue {
        let len = self.keys.len();
        if len == 1 {
            return self.keys[0].value.clone();
        }

        let index = self.find_key_index(frame, cursor);
        if index >= len - 1 {
            return self.keys[len - 1].value.clone();
        }

        let start = &self.keys[index];
        let end = &self.keys[index + 1];

        if start.interpolation == KeyInterpolation::Step || start.value.kind().is_discrete() {
            return start.value.clone();
        }

        let frame_delta = end.frame - start.frame;
        let mut gradient = if frame_delta > 1e-6 {
            (frame - start.frame) / frame_delta
        } else {
            0.0
        };
        gradient = gradient.clamp(0.0, 1.0);
        if let Some(easing) = &self.easing {
            gradient = easing.ease(gradient);
        }

        match (&start.out_tangent, &end.in_tangent) {
            (Some(out_tangent), Some(in_tangent)) => start.value.hermite(
                &out_tangent.scale(frame_delta),
                &end.value,
                &in_tangent.scale(frame_delta),
                gradient,
            ),
            _ => start.value.lerp(&end.value, gradient),
        }
    }

    /// Finds the index of the key at or before `frame`.
    ///
    /// Bounded linear scan around the cursor's last hit, with a binary-search
    /// fallback for scrubs and loop resets.
    fn find_key_index(&self, frame: f32, cursor: &mut KeyCursor) -> usize {
        let len = self.keys.len();
        let i = cursor.last_index.min(len - 1);
        let t_curr = self.keys[i].frame;

        let found = if frame >= t_curr {
            // Normal playback: scan forward a few keys.
            let mut res = None;
            for offset in 0..=MAX_SCAN_OFFSET {
                let idx = i + offset;
                if idx >= len - 1 {
                    if frame >= self.keys[len - 1].frame {
                        res = Some(len - 1);
                    }
                    break;
                }
                if frame < self.keys[idx + 1].frame {
                    res = Some(idx);
                    break;
                }
            }
            res
        } else {
            // Reverse playback or loop reset: scan backward.
            let mut res = None;
            for offset in 0..=MAX_SCAN_OFFSET {
                if i < offset {
                    break;
                }
                let idx = i - offset;
                if frame >= self.keys[idx].frame {
                    res = Some(idx);
                    break;
                }
            }
            res
        };

        let index = found.unwrap_or_else(|| {
            let next = self.keys.partition_point(|k| k.frame <= frame);
            next.saturating_sub(1)
        });
        cursor.last_index = index;
        index
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Produces the scene-file JSON object for this track.
    pub fn serialize(&self) -> Result<serde_json::Value> {
        let data_type = self
            .value_kind()
            .unwrap_or(AnimationValueKind::Float)
            .data_type();
        let keys: Vec<SerializedKey> = self
            .keys
            .iter()
            .map(|k| SerializedKey {
                frame: k.frame,
                values: k.value.to_json_values(),
            })
            .collect();
        Ok(serde_json::json!({
            "name": self.name,
            "property": self.target_property,
            "framePerSecond": self.frame_per_second,
            "dataType": data_type,
            "loopBehavior": self.loop_mode.id(),
            "enableBlending": self.enable_blending,
            "blendingSpeed": self.blending_speed,
            "keys": serde_json::to_value(keys)?,
        }))
    }

    /// Parses a scene-file JSON object.
    ///
    /// Malformed key data is normalized here (keys sorted, undecodable keys
    /// dropped with a warning) so sampling never has to fail.
    pub fn parse(parsed: &serde_json::Value) -> Result<Self> {
        let name = parsed
            .get("name")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default();
        let property = parsed
            .get("property")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| OrreryError::ParseError("animation is missing \"property\"".into()))?;
        let frame_per_second = parsed
            .get("framePerSecond")
            .and_then(serde_json::Value::as_f64)
            .unwrap_or(30.0) as f32;
        let data_type = parsed
            .get("dataType")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0) as u32;
        let kind = AnimationValueKind::from_data_type(data_type).ok_or_else(|| {
            OrreryError::ParseError(format!("unknown animation dataType {data_type}"))
        })?;
        let loop_mode = AnimationLoopMode::from_id(
            parsed
                .get("loopBehavior")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(1) as u32,
        );

        let mut track = Self::new(name, property, frame_per_second, loop_mode);
        if let Some(enable) = parsed
            .get("enableBlending")
            .and_then(serde_json::Value::as_bool)
        {
            track.enable_blending = enable;
        }
        if let Some(speed) = parsed
            .get("blendingSpeed")
            .and_then(serde_json::Value::as_f64)
        {
            track.blending_speed = speed as f32;
        }

        let raw_keys: Vec<SerializedKey> = match parsed.get("keys") {
            Some(value) => serde_json::from_value(value.clone())?,
            None => Vec::new(),
        };
        let mut keys = Vec::with_capacity(raw_keys.len());
        for raw in &raw_keys {
            match AnimationValue::from_json_values(kind, &raw.values) {
                Some(value) => keys.push(Keyframe::new(raw.frame, value)),
                None => log::warn!(
                    "Track \"{}\": dropping key at frame {} with undecodable values",
                    track.name,
                    raw.frame
                ),
            }
        }
        track.set_keys(keys);
        Ok(track)
    }
}

/// On-disk form of one key.
#[derive(Debug, Serialize, Deserialize)]
struct SerializedKey {
    frame: f32,
    values: serde_json::Value,
}
