//! Observation assembly and normalization.
//!
//! The observation is one flat vector: for each retained history step, the
//! proprioceptive block, the exteroceptive block, and the action taken that
//! step; then the same layout once more for the current step. Every channel
//! position has a fixed (mean, std) pair baked in at construction — a
//! normalization prior matching the operating range of the underlying
//! physical quantity, not a learned statistic.

use nalgebra::DVector;

use drover_core::config::DimensionConfig;
use drover_core::error::ConfigError;
use drover_core::types::Observation;

use crate::history::HistoryBuffer;

// ---------------------------------------------------------------------------
// Per-slot normalization tables
// ---------------------------------------------------------------------------

fn push_block(mean: &mut Vec<f64>, std: &mut Vec<f64>, n: usize, m: f64, s: f64) {
    mean.extend(std::iter::repeat(m).take(n));
    std.extend(std::iter::repeat(s).take(n));
}

/// Mean/std pair for one observation slot, in channel order.
fn slot_tables(action_dim: usize) -> (Vec<f64>, Vec<f64>) {
    let mut mean = Vec::new();
    let mut std = Vec::new();

    push_block(&mut mean, &mut std, 2, 0.0, 0.3); // gravity axis x, y
    push_block(&mut mean, &mut std, 1, 1.4, 0.3); // gravity axis z
    push_block(&mut mean, &mut std, 3, 0.0, 0.6); // body linear velocity
    push_block(&mut mean, &mut std, 3, 0.0, 1.0); // body angular velocity

    push_block(&mut mean, &mut std, 2, 0.0, 0.5); // ee->object direction
    push_block(&mut mean, &mut std, 1, 2.0, 0.6); // ee->object distance
    push_block(&mut mean, &mut std, 2, 0.0, 0.5); // object->target direction
    push_block(&mut mean, &mut std, 1, std::f64::consts::SQRT_2, 0.6); // object->target distance
    push_block(&mut mean, &mut std, 2, 0.0, 0.5); // ee->target direction
    push_block(&mut mean, &mut std, 1, 2.0, 0.6); // ee->target distance
    push_block(&mut mean, &mut std, 3, 0.0, 0.5); // object linear velocity
    push_block(&mut mean, &mut std, 3, 0.0, 0.5); // object angular velocity
    push_block(&mut mean, &mut std, 1, 2.0, 0.2); // mass
    push_block(&mut mean, &mut std, 3, 0.0, 0.5); // center of mass
    push_block(&mut mean, &mut std, 9, 0.0, 0.2); // inertia
    push_block(&mut mean, &mut std, 2, 0.0, 0.3); // orientation row x, y
    push_block(&mut mean, &mut std, 1, 1.4, 0.3); // orientation row z
    push_block(&mut mean, &mut std, 4, 0.5, 0.2); // one-hot class
    push_block(&mut mean, &mut std, 3, 1.0, 0.2); // geometry

    push_block(&mut mean, &mut std, action_dim, 0.0, 0.5); // action

    (mean, std)
}

// ---------------------------------------------------------------------------
// ObservationAssembler
// ---------------------------------------------------------------------------

/// Lays out and normalizes the policy observation.
#[derive(Debug, Clone)]
pub struct ObservationAssembler {
    proprio_dim: usize,
    extero_dim: usize,
    action_dim: usize,
    history_num: usize,
    mean: DVector<f64>,
    std: DVector<f64>,
}

impl ObservationAssembler {
    /// Build the normalization tables for `dims`.
    ///
    /// Fails fast if the configured per-slot dimensions do not match the
    /// channel table this assembler was designed for.
    pub fn new(dims: &DimensionConfig) -> Result<Self, ConfigError> {
        dims.validate()?;
        let (slot_mean, slot_std) = slot_tables(dims.action_dim);
        if slot_mean.len() != dims.slot_dim() {
            return Err(ConfigError::DimensionMismatch {
                what: "observation slot".into(),
                expected: slot_mean.len(),
                got: dims.slot_dim(),
            });
        }

        let slots = dims.history_num + 1;
        let mut mean = Vec::with_capacity(slot_mean.len() * slots);
        let mut std = Vec::with_capacity(slot_std.len() * slots);
        for _ in 0..slots {
            mean.extend_from_slice(&slot_mean);
            std.extend_from_slice(&slot_std);
        }

        Ok(Self {
            proprio_dim: dims.proprioceptive_dim,
            extero_dim: dims.exteroceptive_dim,
            action_dim: dims.action_dim,
            history_num: dims.history_num,
            mean: DVector::from_vec(mean),
            std: DVector::from_vec(std),
        })
    }

    /// Total observation dimension.
    #[must_use]
    pub fn ob_dim(&self) -> usize {
        self.mean.len()
    }

    #[must_use]
    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    #[must_use]
    pub fn std(&self) -> &DVector<f64> {
        &self.std
    }

    /// Concatenate history and current-step blocks into one raw vector.
    ///
    /// The action stream carries one more slot than the others: its window
    /// excluding the newest sample lines up with the history slots, and the
    /// newest sample is the current-step action block.
    #[must_use]
    pub fn assemble(
        &self,
        proprio_history: &HistoryBuffer,
        extero_history: &HistoryBuffer,
        action_history: &HistoryBuffer,
        current_proprio: &DVector<f64>,
        current_extero: &DVector<f64>,
    ) -> DVector<f64> {
        assert_eq!(proprio_history.len(), self.history_num);
        assert_eq!(extero_history.len(), self.history_num);
        assert_eq!(action_history.len(), self.history_num + 1);
        assert_eq!(current_proprio.len(), self.proprio_dim);
        assert_eq!(current_extero.len(), self.extero_dim);

        let slot_dim = self.proprio_dim + self.extero_dim + self.action_dim;
        let mut raw = DVector::zeros(self.ob_dim());

        let action_window = action_history.window_excluding_latest();
        for i in 0..self.history_num {
            let base = slot_dim * i;
            raw.rows_mut(base, self.proprio_dim)
                .copy_from(proprio_history.get(i));
            raw.rows_mut(base + self.proprio_dim, self.extero_dim)
                .copy_from(extero_history.get(i));
            raw.rows_mut(base + self.proprio_dim + self.extero_dim, self.action_dim)
                .copy_from(&action_window[i]);
        }

        let base = slot_dim * self.history_num;
        raw.rows_mut(base, self.proprio_dim).copy_from(current_proprio);
        raw.rows_mut(base + self.proprio_dim, self.extero_dim)
            .copy_from(current_extero);
        raw.rows_mut(base + self.proprio_dim + self.extero_dim, self.action_dim)
            .copy_from(action_history.latest());
        raw
    }

    /// Element-wise `(raw - mean) / std`.
    #[must_use]
    pub fn normalize(&self, raw: &DVector<f64>) -> Observation {
        assert_eq!(raw.len(), self.ob_dim());
        let scaled = (raw - &self.mean).component_div(&self.std);
        Observation::new(scaled.as_slice().to_vec())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_dims() -> DimensionConfig {
        DimensionConfig::default()
    }

    fn filled_buffer(len: usize, dim: usize, base: f64) -> HistoryBuffer {
        let mut buf = HistoryBuffer::new(len, dim);
        for i in 0..len {
            buf.push(&DVector::from_element(dim, base + i as f64));
        }
        buf
    }

    // ---- construction ----

    #[test]
    fn reference_config_ob_dim_is_245() {
        let asm = ObservationAssembler::new(&reference_dims()).unwrap();
        assert_eq!(asm.ob_dim(), 245);
    }

    #[test]
    fn table_lengths_match_ob_dim() {
        let asm = ObservationAssembler::new(&reference_dims()).unwrap();
        assert_eq!(asm.mean().len(), asm.ob_dim());
        assert_eq!(asm.std().len(), asm.ob_dim());
    }

    #[test]
    fn inconsistent_dims_fail_fast() {
        let dims = DimensionConfig {
            exteroceptive_dim: 30,
            ..reference_dims()
        };
        let err = ObservationAssembler::new(&dims).unwrap_err();
        assert!(matches!(err, ConfigError::DimensionMismatch { .. }));
    }

    #[test]
    fn std_table_has_no_zeros() {
        let asm = ObservationAssembler::new(&reference_dims()).unwrap();
        assert!(asm.std().iter().all(|s| *s > 0.0));
    }

    #[test]
    fn distance_channels_carry_documented_priors() {
        let asm = ObservationAssembler::new(&reference_dims()).unwrap();
        // first slot: ee->object distance at proprio(9) + 2
        assert!((asm.mean()[11] - 2.0).abs() < f64::EPSILON);
        // object->target distance prior is sqrt(2)
        assert!((asm.mean()[14] - std::f64::consts::SQRT_2).abs() < f64::EPSILON);
        // gravity axis z prior
        assert!((asm.mean()[2] - 1.4).abs() < f64::EPSILON);
    }

    // ---- assemble ----

    #[test]
    fn assemble_has_fixed_shape() {
        let dims = reference_dims();
        let asm = ObservationAssembler::new(&dims).unwrap();
        let proprio = filled_buffer(4, 9, 0.0);
        let extero = filled_buffer(4, 38, 10.0);
        let action = filled_buffer(5, 2, 20.0);
        let raw = asm.assemble(
            &proprio,
            &extero,
            &action,
            &DVector::from_element(9, 1.0),
            &DVector::from_element(38, 2.0),
        );
        assert_eq!(raw.len(), 245);
    }

    #[test]
    fn assemble_lays_out_history_then_current() {
        let dims = DimensionConfig {
            proprioceptive_dim: 9,
            exteroceptive_dim: 38,
            history_num: 2,
            action_history_num: 3,
            action_dim: 2,
        };
        let asm = ObservationAssembler::new(&dims).unwrap();
        let proprio = filled_buffer(2, 9, 0.0); // slots: 0, 1
        let extero = filled_buffer(2, 38, 10.0); // slots: 10, 11
        let action = filled_buffer(3, 2, 20.0); // slots: 20, 21, 22
        let current_proprio = DVector::from_element(9, 100.0);
        let current_extero = DVector::from_element(38, 200.0);

        let raw = asm.assemble(&proprio, &extero, &action, &current_proprio, &current_extero);

        // slot 0: oldest history
        assert!((raw[0] - 0.0).abs() < f64::EPSILON);
        assert!((raw[9] - 10.0).abs() < f64::EPSILON);
        assert!((raw[47] - 20.0).abs() < f64::EPSILON);
        // slot 1
        assert!((raw[49] - 1.0).abs() < f64::EPSILON);
        assert!((raw[49 + 9] - 11.0).abs() < f64::EPSILON);
        assert!((raw[49 + 47] - 21.0).abs() < f64::EPSILON);
        // current slot: fresh samples plus the newest action
        assert!((raw[98] - 100.0).abs() < f64::EPSILON);
        assert!((raw[98 + 9] - 200.0).abs() < f64::EPSILON);
        assert!((raw[98 + 47] - 22.0).abs() < f64::EPSILON);
    }

    // ---- normalize ----

    #[test]
    fn normalize_round_trips() {
        let asm = ObservationAssembler::new(&reference_dims()).unwrap();
        let raw = DVector::from_fn(asm.ob_dim(), |i, _| (i as f64).sin());
        let scaled = asm.normalize(&raw);
        for i in 0..asm.ob_dim() {
            let back = scaled[i] * asm.std()[i] + asm.mean()[i];
            assert!((back - raw[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn normalize_centers_the_mean() {
        let asm = ObservationAssembler::new(&reference_dims()).unwrap();
        let scaled = asm.normalize(&asm.mean().clone());
        assert!(scaled.as_slice().iter().all(|v| v.abs() < 1e-12));
    }
}
