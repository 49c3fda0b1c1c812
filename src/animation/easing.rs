//! Easing functions applied to the interpolation gradient.
//!
//! A track may carry an [`Easing`], in which case the normalized parameter
//! between two keys is remapped before interpolation. The ease-in core is
//! defined per curve; [`EasingMode`] mirrors it for ease-out and ease-in-out.

use std::f32::consts::{FRAC_PI_2, PI};

/// How the ease-in core of a curve is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EasingMode {
    #[default]
    EaseIn,
    EaseOut,
    EaseInOut,
}

/// The curve family of an easing function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EasingCurve {
    Sine,
    Quadratic,
    Cubic,
    /// Polynomial of arbitrary exponent.
    Power(f32),
    Circle,
    /// Overshooting curve; the parameter is the overshoot amplitude.
    Back(f32),
    Elastic {
        oscillations: u32,
        springiness: f32,
    },
    /// Decaying bounces; `bounciness` controls how much height each
    /// successive bounce loses (must exceed 1).
    Bounce {
        bounces: u32,
        bounciness: f32,
    },
    /// Cubic bezier through (0,0), (x1,y1), (x2,y2), (1,1).
    Bezier {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
}

/// A complete easing configuration: curve plus mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Easing {
    pub curve: EasingCurve,
    pub mode: EasingMode,
}

impl Easing {
    #[must_use]
    pub fn new(curve: EasingCurve, mode: EasingMode) -> Self {
        Self { curve, mode }
    }

    /// Remaps a gradient in `[0, 1]`.
    #[must_use]
    pub fn ease(&self, gradient: f32) -> f32 {
        match self.mode {
            EasingMode::EaseIn => self.ease_in_core(gradient),
            EasingMode::EaseOut => 1.0 - self.ease_in_core(1.0 - gradient),
            EasingMode::EaseInOut => {
                if gradient >= 0.5 {
                    (1.0 - self.ease_in_core((1.0 - gradient) * 2.0)) * 0.5 + 0.5
                } else {
                    self.ease_in_core(gradient * 2.0) * 0.5
                }
            }
        }
    }

    fn ease_in_core(&self, t: f32) -> f32 {
        match self.curve {
            EasingCurve::Sine => 1.0 - (t * FRAC_PI_2).cos(),
            EasingCurve::Quadratic => t * t,
            EasingCurve::Cubic => t * t * t,
            EasingCurve::Power(power) => t.powf(power.max(0.0)),
            EasingCurve::Circle => {
                let t = t.clamp(0.0, 1.0);
                1.0 - (1.0 - t * t).sqrt()
            }
            EasingCurve::Back(amplitude) => {
                let amp = amplitude.max(0.0);
                t.powi(3) - t * amp * (t * PI).sin()
            }
            EasingCurve::Elastic {
                oscillations,
                springiness,
            } => {
                let oscillations = oscillations as f32;
                let springiness = springiness.max(0.0);
                let envelope = if springiness == 0.0 {
                    t
                } else {
                    ((springiness * t).exp() - 1.0) / (springiness.exp() - 1.0)
                };
                envelope * (t * (2.0 * PI * oscillations + FRAC_PI_2)).sin()
            }
            EasingCurve::Bounce {
                bounces,
                bounciness,
            } => bounce_ease_in(t, bounces as f32, bounciness),
            EasingCurve::Bezier { x1, y1, x2, y2 } => bezier_ease(t, x1, y1, x2, y2),
        }
    }
}

/// Sequence of parabolic arcs whose heights decay geometrically by
/// `bounciness`; the arc index for a given `t` falls out of the geometric
/// series in log space.
fn bounce_ease_in(t: f32, bounces: f32, bounciness: f32) -> f32 {
    let bounces = bounces.max(0.0);
    // The series below degenerates at ratio 1.
    let bounciness = if bounciness <= 1.0 { 1.001 } else { bounciness };
    let pow = bounciness.powf(bounces);
    let one_minus = 1.0 - bounciness;
    let total_units = (1.0 - pow) / one_minus + pow * 0.5;
    let unit = t * total_units;
    let arc = ((-unit * one_minus + 1.0).ln() / bounciness.ln()).floor();
    let arc_start = (1.0 - bounciness.powf(arc)) / (one_minus * total_units);
    let arc_end = (1.0 - bounciness.powf(arc + 1.0)) / (one_minus * total_units);
    let arc_mid = (arc_start + arc_end) * 0.5;
    let from_mid = t - arc_mid;
    let half_span = arc_mid - arc_start;
    (-bounciness.recip().powf(bounces - arc) / (half_span * half_span))
        * (from_mid - half_span)
        * (from_mid + half_span)
}

/// Solves the bezier for the y at a given x by sampling the parametric form.
fn bezier_ease(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let cubic = |p1: f32, p2: f32, u: f32| {
        let inv = 1.0 - u;
        3.0 * inv * inv * u * p1 + 3.0 * inv * u * u * p2 + u * u * u
    };
    // Binary search over the curve parameter for the requested x.
    let mut lo = 0.0_f32;
    let mut hi = 1.0_f32;
    let mut u = t;
    for _ in 0..16 {
        let x = cubic(x1, x2, u);
        if (x - t).abs() < 1e-5 {
            break;
        }
        if x < t {
            lo = u;
        } else {
            hi = u;
        }
        u = (lo + hi) * 0.5;
    }
    cubic(y1, y2, u)
}
