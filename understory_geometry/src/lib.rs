// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Small 2D helpers on top of [`kurbo`] for code that runs inside hook actions.
//!
//! [`kurbo`] already provides the value types: [`Vec2`] for displacements,
//! [`Point`] for positions, and [`Affine`] for 3×3 homogeneous transforms. Its
//! operators type-check the operand itself: `Point - Point` is a [`Vec2`],
//! `Point ± Vec2` is a [`Point`], and `Vec2 ± Vec2` is a [`Vec2`]. This crate
//! adds the few operations hooks commonly reach for:
//!
//! - Transform factories: [`translate`], [`rotate`], [`scale`], [`scale_xy`].
//! - [`transform_vector`]: apply an [`Affine`] to a displacement, ignoring
//!   translation (a vector has homogeneous `w = 0`, a point has `w = 1`).
//! - [`Vector2Ext`]: modulus with a [`DELTA`] dead zone, unit vectors, angles,
//!   and projection.
//! - [`PointExt`]: projection of a position onto an axis through the origin.
//! - [`points`]: build many points from coordinate pairs.
//!
//! ```
//! use kurbo::{Point, Vec2};
//! use understory_geometry::{PointExt, Vector2Ext, translate};
//!
//! let grab = Point::new(10.0, 4.0);
//! let slider_axis = Vec2::new(1.0, 0.0);
//! assert_eq!(grab.projected_onto(slider_axis), Some(Point::new(10.0, 0.0)));
//!
//! // Translation moves points but not displacements.
//! let t = translate(5.0, 5.0);
//! assert_eq!(t * grab, Point::new(15.0, 9.0));
//! assert_eq!(understory_geometry::transform_vector(t, slider_axis), slider_axis);
//! assert_eq!(Vec2::new(0.0, 2.0).angle_deg(), 90.0);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

use alloc::vec::Vec;
use core::f64::consts::PI;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
pub use kurbo::{Affine, Point, Vec2};

/// Degrees per radian.
pub const RAD2DEG: f64 = 180.0 / PI;

/// Squared lengths at or below this are treated as zero.
pub const DELTA: f64 = 0.00001;

/// Translation by `(x, y)`.
pub fn translate(x: f64, y: f64) -> Affine {
    Affine::translate(Vec2::new(x, y))
}

/// Counter-clockwise rotation by `theta` radians (y up).
pub fn rotate(theta: f64) -> Affine {
    Affine::rotate(theta)
}

/// Uniform scale.
pub fn scale(s: f64) -> Affine {
    Affine::scale(s)
}

/// Non-uniform scale.
pub fn scale_xy(x: f64, y: f64) -> Affine {
    Affine::scale_non_uniform(x, y)
}

/// Apply the linear part of `m` to `v`.
pub fn transform_vector(m: Affine, v: Vec2) -> Vec2 {
    let [a, b, c, d, _, _] = m.as_coeffs();
    Vec2::new(a * v.x + c * v.y, b * v.x + d * v.y)
}

/// Build points from `(x, y)` pairs.
pub fn points(pairs: &[(f64, f64)]) -> Vec<Point> {
    pairs.iter().map(|&p| Point::from(p)).collect()
}

/// Extra operations on [`Vec2`].
pub trait Vector2Ext: Sized {
    /// Euclidean length. Vectors whose squared length is within [`DELTA`] of
    /// zero report `0.0`.
    fn modulus(self) -> f64;

    /// The vector scaled to length 1, or `None` if [`modulus`](Self::modulus) is zero.
    fn unit(self) -> Option<Vec2>;

    /// Dot product of the two unit vectors, i.e. the cosine of the angle between them.
    fn unit_dot(self, other: Self) -> Option<f64>;

    /// Direction in degrees, measured from the +x axis.
    fn angle_deg(self) -> f64;

    /// Unsigned angle to `other` in radians, in `[0, π]`.
    fn angle_with(self, other: Self) -> Option<f64>;

    /// Component of `self` along `axis`, or `None` for a zero-length axis.
    fn projected_onto(self, axis: Vec2) -> Option<Vec2>;
}

impl Vector2Ext for Vec2 {
    fn modulus(self) -> f64 {
        let sq = self.hypot2();
        if sq > DELTA { sq.sqrt() } else { 0.0 }
    }

    fn unit(self) -> Option<Self> {
        let m = self.modulus();
        (m > 0.0).then(|| self / m)
    }

    fn unit_dot(self, other: Self) -> Option<f64> {
        Some(self.unit()?.dot(other.unit()?))
    }

    fn angle_deg(self) -> f64 {
        self.atan2() * RAD2DEG
    }

    fn angle_with(self, other: Self) -> Option<f64> {
        // Rounding can push the cosine just past ±1.
        self.unit_dot(other).map(|cos| cos.clamp(-1.0, 1.0).acos())
    }

    fn projected_onto(self, axis: Vec2) -> Option<Self> {
        if axis.modulus() == 0.0 {
            return None;
        }
        Some(axis * (axis.dot(self) / axis.hypot2()))
    }
}

/// Extra operations on [`Point`].
pub trait PointExt {
    /// Foot of the perpendicular from this point to the line through the
    /// origin along `axis`, or `None` for a zero-length axis.
    fn projected_onto(self, axis: Vec2) -> Option<Point>;
}

impl PointExt for Point {
    fn projected_onto(self, axis: Vec2) -> Option<Point> {
        self.to_vec2().projected_onto(axis).map(Vec2::to_point)
    }
}
