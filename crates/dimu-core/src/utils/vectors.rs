use std::iter::Sum;

use auto_ops::impl_op_ex;
use serde::{Deserialize, Serialize};

/// A three-momentum vector
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// The x-component
    pub x: f64,
    /// The y-component
    pub y: f64,
    /// The z-component
    pub z: f64,
}

impl Vec3 {
    /// Create a new [`Vec3`] from its components
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The dot product with another [`Vec3`]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// The squared magnitude
    pub fn mag2(&self) -> f64 {
        self.dot(self)
    }

    /// The magnitude
    pub fn mag(&self) -> f64 {
        self.mag2().sqrt()
    }

    /// Promote to a [`Vec4`] with energy computed from the given `mass`
    pub fn with_mass(&self, mass: f64) -> Vec4 {
        let e = (mass.powi(2) + self.mag2()).sqrt();
        Vec4::new(self.x, self.y, self.z, e)
    }

    /// Promote to a [`Vec4`] with the given `energy`
    pub fn with_energy(&self, energy: f64) -> Vec4 {
        Vec4::new(self.x, self.y, self.z, energy)
    }
}

impl_op_ex!(+ |a: &Vec3, b: &Vec3| -> Vec3 { Vec3::new(a.x + b.x, a.y + b.y, a.z + b.z) });
impl_op_ex!(-|a: &Vec3, b: &Vec3| -> Vec3 { Vec3::new(a.x - b.x, a.y - b.y, a.z - b.z) });
impl_op_ex!(-|a: &Vec3| -> Vec3 { Vec3::new(-a.x, -a.y, -a.z) });

/// A four-momentum vector with a `(+, -, -, -)` metric
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec4 {
    /// The x-component of the momentum
    pub x: f64,
    /// The y-component of the momentum
    pub y: f64,
    /// The z-component of the momentum
    pub z: f64,
    /// The energy
    pub t: f64,
}

impl Vec4 {
    /// Create a new [`Vec4`] from momentum components and an energy
    pub const fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        Self {
            x: px,
            y: py,
            z: pz,
            t: e,
        }
    }

    /// The x-component of the momentum
    pub fn px(&self) -> f64 {
        self.x
    }

    /// The y-component of the momentum
    pub fn py(&self) -> f64 {
        self.y
    }

    /// The z-component of the momentum
    pub fn pz(&self) -> f64 {
        self.z
    }

    /// The energy
    pub fn e(&self) -> f64 {
        self.t
    }

    /// The momentum part as a [`Vec3`]
    pub fn vec3(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// The squared invariant mass
    pub fn m2(&self) -> f64 {
        self.t.powi(2) - self.vec3().mag2()
    }

    /// The invariant mass
    ///
    /// Note that this is the square root of [`Vec4::m2`], so a spacelike vector yields `NaN`
    /// rather than a negative mass.
    pub fn m(&self) -> f64 {
        self.m2().sqrt()
    }

    /// Render the vector in the form `[px, py, pz; e]`
    pub fn to_p4_string(&self) -> String {
        format!("[{}, {}, {}; {}]", self.x, self.y, self.z, self.t)
    }
}

impl_op_ex!(+ |a: &Vec4, b: &Vec4| -> Vec4 { Vec4::new(a.x + b.x, a.y + b.y, a.z + b.z, a.t + b.t) });
impl_op_ex!(-|a: &Vec4, b: &Vec4| -> Vec4 { Vec4::new(a.x - b.x, a.y - b.y, a.z - b.z, a.t - b.t) });
impl_op_ex!(-|a: &Vec4| -> Vec4 { Vec4::new(-a.x, -a.y, -a.z, -a.t) });

impl Sum for Vec4 {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, p4| acc + p4)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_vec3_algebra() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert_relative_eq!(a.dot(&b), 32.0);
        assert_relative_eq!(a.mag2(), 14.0);
        assert_relative_eq!(a.mag(), 14.0_f64.sqrt());
        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vec3::new(3.0, 3.0, 3.0));
        assert_eq!(-a, Vec3::new(-1.0, -2.0, -3.0));
    }

    #[test]
    fn test_with_mass() {
        let p = Vec3::new(3.0, 0.0, 0.0);
        let p4 = p.with_mass(0.105);
        assert_relative_eq!(p4.e(), (9.0_f64 + 0.105 * 0.105).sqrt());
        assert_relative_eq!(p4.m(), 0.105, epsilon = 1e-12);
    }

    #[test]
    fn test_invariant_mass() {
        let mu = Vec3::new(3.0, 0.0, 0.0).with_mass(0.105);
        let antimu = Vec3::new(-3.0, 0.0, 0.0).with_mass(0.105);
        let pair = mu + antimu;
        assert_relative_eq!(pair.vec3().mag(), 0.0);
        assert_relative_eq!(pair.m(), 2.0 * (9.0_f64 + 0.105 * 0.105).sqrt());
    }

    #[test]
    fn test_sum() {
        let p4s = [
            Vec4::new(1.0, 0.0, 0.0, 2.0),
            Vec4::new(0.0, 1.0, 0.0, 3.0),
            Vec4::new(0.0, 0.0, 1.0, 4.0),
        ];
        let total: Vec4 = p4s.into_iter().sum();
        assert_eq!(total, Vec4::new(1.0, 1.0, 1.0, 9.0));
    }

    #[test]
    fn test_p4_string() {
        let p4 = Vec4::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(p4.to_p4_string(), "[1, 2, 3; 4]");
    }
}
