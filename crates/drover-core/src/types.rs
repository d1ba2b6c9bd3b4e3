use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Observation
// ---------------------------------------------------------------------------

/// Flat f64 vector handed to the policy network.
///
/// The layout is fixed per controller instantiation; see
/// `drover-controller`'s observation assembler for the channel order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    data: Vec<f64>,
}

impl Observation {
    #[must_use]
    pub const fn new(data: Vec<f64>) -> Self {
        Self { data }
    }

    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub const fn dim(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Returns `true` if every element is finite (no NaN/Inf).
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

impl std::ops::Index<usize> for Observation {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 {
        &self.data[i]
    }
}

impl From<Vec<f64>> for Observation {
    fn from(data: Vec<f64>) -> Self {
        Self { data }
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Raw (unnormalized) action vector received from the policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    data: Vec<f64>,
}

impl Action {
    #[must_use]
    pub const fn new(data: Vec<f64>) -> Self {
        Self { data }
    }

    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
        }
    }

    #[must_use]
    pub const fn dim(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

impl std::ops::Index<usize> for Action {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 {
        &self.data[i]
    }
}

impl From<Vec<f64>> for Action {
    fn from(data: Vec<f64>) -> Self {
        Self { data }
    }
}

// ---------------------------------------------------------------------------
// Contact
// ---------------------------------------------------------------------------

/// One contact reported by the simulation world for the articulated robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Index of the robot body involved in the contact.
    pub local_body_index: usize,
    /// `true` if the contact is between two bodies of the robot itself.
    pub self_collision: bool,
}

impl Contact {
    #[must_use]
    pub const fn new(local_body_index: usize, self_collision: bool) -> Self {
        Self {
            local_body_index,
            self_collision,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Observation ----

    #[test]
    fn observation_zeros() {
        let ob = Observation::zeros(5);
        assert_eq!(ob.len(), 5);
        assert!(ob.as_slice().iter().all(|v| v.abs() < f64::EPSILON));
    }

    #[test]
    fn observation_index_and_len() {
        let ob = Observation::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(ob.dim(), 3);
        assert!((ob[1] - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn observation_empty() {
        let ob = Observation::new(Vec::new());
        assert!(ob.is_empty());
    }

    #[test]
    fn observation_into_vec_roundtrip() {
        let ob = Observation::from(vec![4.0, 5.0]);
        assert_eq!(ob.into_vec(), vec![4.0, 5.0]);
    }

    #[test]
    fn observation_finite_check() {
        assert!(Observation::new(vec![1.0, -2.0]).is_finite());
        assert!(!Observation::new(vec![1.0, f64::NAN]).is_finite());
        assert!(!Observation::new(vec![f64::INFINITY]).is_finite());
    }

    // ---- Action ----

    #[test]
    fn action_dim() {
        let a = Action::new(vec![0.5, -0.5]);
        assert_eq!(a.dim(), 2);
        assert!((a[0] - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn action_zeros() {
        let a = Action::zeros(3);
        assert_eq!(a.dim(), 3);
        assert!(a.as_slice().iter().all(|v| v.abs() < f64::EPSILON));
    }

    // ---- Contact ----

    #[test]
    fn contact_fields() {
        let c = Contact::new(3, true);
        assert_eq!(c.local_body_index, 3);
        assert!(c.self_collision);
    }
}
