use num_traits::Float;
use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Add, Div, Index, Mul, Sub};

/// A state (or control) in N-dimensional real vector space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RealVectorState<F: Float, const N: usize> {
    values: [F; N],
}

impl<F: Float + Serialize, const N: usize> Serialize for RealVectorState<F, N> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut tuple = serializer.serialize_tuple(N)?;
        for value in &self.values {
            tuple.serialize_element(value)?;
        }
        tuple.end()
    }
}

impl<'de, F: Float + Deserialize<'de>, const N: usize> Deserialize<'de> for RealVectorState<F, N> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct StateVisitor<F, const N: usize>(PhantomData<F>);

        impl<'de, F: Float + Deserialize<'de>, const N: usize> Visitor<'de> for StateVisitor<F, N> {
            type Value = RealVectorState<F, N>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "a sequence of {} numbers", N)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut values = [F::zero(); N];
                for (i, slot) in values.iter_mut().enumerate() {
                    *slot = seq
                        .next_element()?
                        .ok_or_else(|| de::Error::invalid_length(i, &self))?;
                }
                Ok(RealVectorState { values })
            }
        }

        deserializer.deserialize_tuple(N, StateVisitor(PhantomData))
    }
}

impl<F: Float, const N: usize> RealVectorState<F, N> {
    /// Constructs a new state from an array of values.
    pub fn new(values: [F; N]) -> Self {
        Self { values }
    }

    /// Returns the underlying array of values.
    pub fn values(&self) -> &[F; N] {
        &self.values
    }

    /// Returns the dot product with another vector.
    pub fn dot(&self, other: &Self) -> F {
        let mut sum = F::zero();
        for i in 0..N {
            sum = sum + self.values[i] * other.values[i];
        }
        sum
    }

    /// Returns the Euclidean norm of the vector.
    pub fn norm(&self) -> F {
        self.dot(self).sqrt()
    }

    /// Returns the squared Euclidean distance to another state.
    pub fn euclidean_distance_squared(&self, other: &Self) -> F {
        let mut sum = F::zero();
        for i in 0..N {
            let diff = self.values[i] - other.values[i];
            sum = sum + diff * diff;
        }
        sum
    }

    /// Returns the Euclidean distance to another state.
    pub fn euclidean_distance(&self, other: &Self) -> F {
        self.euclidean_distance_squared(other).sqrt()
    }

    /// Distance to another state, over all coordinates or over the first two
    /// only. The planar variant measures traversed ground distance for states
    /// whose trailing coordinates are not translational (e.g. a heading).
    pub fn distance(&self, other: &Self, planar_only: bool) -> F {
        if !planar_only {
            return self.euclidean_distance(other);
        }
        let mut sum = F::zero();
        for i in 0..N.min(2) {
            let diff = self.values[i] - other.values[i];
            sum = sum + diff * diff;
        }
        sum.sqrt()
    }
}

impl<F: Float, const N: usize> Index<usize> for RealVectorState<F, N> {
    type Output = F;

    fn index(&self, index: usize) -> &F {
        &self.values[index]
    }
}

impl<F: Float, const N: usize> Add for RealVectorState<F, N> {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        let mut values = self.values;
        for i in 0..N {
            values[i] = values[i] + other.values[i];
        }
        Self { values }
    }
}

impl<F: Float, const N: usize> Sub for RealVectorState<F, N> {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        let mut values = self.values;
        for i in 0..N {
            values[i] = values[i] - other.values[i];
        }
        Self { values }
    }
}

impl<F: Float, const N: usize> Sub for &RealVectorState<F, N> {
    type Output = RealVectorState<F, N>;

    fn sub(self, other: Self) -> RealVectorState<F, N> {
        *self - *other
    }
}

impl<F: Float, const N: usize> Mul<F> for RealVectorState<F, N> {
    type Output = Self;

    fn mul(self, scalar: F) -> Self {
        let mut values = self.values;
        for i in 0..N {
            values[i] = values[i] * scalar;
        }
        Self { values }
    }
}

impl<F: Float, const N: usize> Div<F> for RealVectorState<F, N> {
    type Output = Self;

    fn div(self, scalar: F) -> Self {
        let mut values = self.values;
        for i in 0..N {
            values[i] = values[i] / scalar;
        }
        Self { values }
    }
}

#[cfg(test)]
mod tests {
    use super::RealVectorState;

    #[test]
    fn euclidean_distance_matches_hand_computation() {
        let a = RealVectorState::new([0.0f32, 0.0, 0.0]);
        let b = RealVectorState::new([3.0f32, 4.0, 0.0]);
        assert!((a.euclidean_distance(&b) - 5.0).abs() < 1e-6);
        assert!((a.euclidean_distance_squared(&b) - 25.0).abs() < 1e-6);
    }

    #[test]
    fn planar_distance_ignores_trailing_coordinates() {
        let a = RealVectorState::new([0.0f32, 0.0, 1.0]);
        let b = RealVectorState::new([3.0f32, 4.0, -2.5]);
        assert!((a.distance(&b, true) - 5.0).abs() < 1e-6);
        assert!(a.distance(&b, false) > 5.0);
    }

    #[test]
    fn arithmetic_is_element_wise() {
        let a = RealVectorState::new([1.0f32, 2.0]);
        let b = RealVectorState::new([3.0f32, 5.0]);
        assert_eq!(a + b, RealVectorState::new([4.0, 7.0]));
        assert_eq!(b - a, RealVectorState::new([2.0, 3.0]));
        assert_eq!(a * 2.0, RealVectorState::new([2.0, 4.0]));
        assert_eq!(b / 2.0, RealVectorState::new([1.5, 2.5]));
        assert_eq!(a.dot(&b), 13.0);
    }

    #[test]
    fn serializes_as_a_plain_tuple() {
        let state = RealVectorState::new([1.5f32, -2.0, 0.25]);
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, "[1.5,-2.0,0.25]");
        let back: RealVectorState<f32, 3> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
        assert!(serde_json::from_str::<RealVectorState<f32, 3>>("[1.0,2.0]").is_err());
    }
}
