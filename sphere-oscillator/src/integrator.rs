//! Dormand–Prince 5(4) integrator with dense output.
//!
//! A 7-stage embedded Runge–Kutta pair with the first-same-as-last property:
//! the 5th-order solution advances the state, the embedded 4th-order solution
//! drives step-size control, and the 4th-order continuous extension samples
//! the trajectory at caller-chosen times without shortening steps.
//!
//! Step control follows the usual I-controller on an RMS error norm scaled by
//! `atol + rtol * max(|y_old|, |y_new|)`; a step that follows a rejection is
//! never allowed to grow.
//!
//! Reference: Dormand & Prince, "A family of embedded Runge-Kutta formulae",
//! J. Comp. Appl. Math. 6 (1980); dense-output coefficients from Shampine,
//! "Some practical Runge-Kutta formulas", Math. Comp. 46 (1986).

use serde::{Deserialize, Serialize};

/// System of first-order ODEs dy/dt = f(t, y).
pub trait OdeSystem<const N: usize> {
    fn rhs(&self, t: f64, y: &[f64; N], dydt: &mut [f64; N]);
}

/// Why an integration could not be completed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntegrationError {
    #[error("invalid integration input: {message}")]
    InvalidInput { message: String },

    #[error("step budget of {steps} exhausted at t = {t:e}")]
    MaxStepsExceeded { steps: u64, t: f64 },

    #[error("required step size {h:e} is below the floating-point spacing at t = {t:e}")]
    StepSizeTooSmall { t: f64, h: f64 },

    #[error("state became non-finite at t = {t:e}")]
    NonFiniteState { t: f64 },
}

/// Work counters for one integration call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationStats {
    pub fn_evals: u64,
    pub accepted_steps: u64,
    pub rejected_steps: u64,
}

/// Error tolerances: a component's local error must stay below
/// `atol + rtol * |y|`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub rtol: f64,
    pub atol: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            rtol: 1e-8,
            atol: 1e-10,
        }
    }
}

/// States sampled at the requested times.
#[derive(Debug, Clone)]
pub struct Trajectory<const N: usize> {
    pub times: Vec<f64>,
    pub states: Vec<[f64; N]>,
    pub stats: IntegrationStats,
}

const STAGES: usize = 7;

const C: [f64; STAGES] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0];

const A: [[f64; 5]; 6] = [
    [0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0],
    [19372.0 / 6561.0, -25360.0 / 2187.0, 64448.0 / 6561.0, -212.0 / 729.0, 0.0],
    [9017.0 / 3168.0, -355.0 / 33.0, 46732.0 / 5247.0, 49.0 / 176.0, -5103.0 / 18656.0],
];

/// 5th-order weights (the 7th stage has weight zero).
const B: [f64; 6] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
];

/// Difference between the 5th- and 4th-order weights.
const E: [f64; STAGES] = [
    -71.0 / 57600.0,
    0.0,
    71.0 / 16695.0,
    -71.0 / 1920.0,
    17253.0 / 339200.0,
    -22.0 / 525.0,
    1.0 / 40.0,
];

/// Continuous-extension coefficients: y(t + xh) = y + h * sum_m (K^T P)[m] x^(m+1).
const P: [[f64; 4]; STAGES] = [
    [
        1.0,
        -8048581381.0 / 2820520608.0,
        8663915743.0 / 2820520608.0,
        -12715105075.0 / 11282082432.0,
    ],
    [0.0, 0.0, 0.0, 0.0],
    [
        0.0,
        131558114200.0 / 32700410799.0,
        -68118460800.0 / 10900136933.0,
        87487479700.0 / 32700410799.0,
    ],
    [
        0.0,
        -1754552775.0 / 470086768.0,
        14199869525.0 / 1410260304.0,
        -10690763975.0 / 1880347072.0,
    ],
    [
        0.0,
        127303824393.0 / 49829197408.0,
        -318862633887.0 / 49829197408.0,
        701980252875.0 / 199316789632.0,
    ],
    [
        0.0,
        -282668133.0 / 205662961.0,
        2019193451.0 / 616988883.0,
        -1453857185.0 / 822651844.0,
    ],
    [
        0.0,
        40617522.0 / 29380423.0,
        -110615467.0 / 29380423.0,
        69997945.0 / 29380423.0,
    ],
];

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;
/// -1 / (q + 1) with q = 4, the order of the embedded error estimate.
const ERROR_EXPONENT: f64 = -0.2;

/// Default ceiling on step attempts (accepted plus rejected).
pub const DEFAULT_MAX_STEPS: u64 = 1_000_000;

/// Dormand–Prince 5(4) solver.
#[derive(Debug, Clone)]
pub struct DormandPrince<const N: usize> {
    tol: Tolerances,
    /// Step attempts allowed before giving up with `MaxStepsExceeded`.
    pub max_steps: u64,
    /// Counters from the most recent call to [`DormandPrince::integrate`].
    pub stats: IntegrationStats,
}

impl<const N: usize> DormandPrince<N> {
    pub fn new(tol: Tolerances) -> Self {
        Self {
            tol,
            max_steps: DEFAULT_MAX_STEPS,
            stats: IntegrationStats::default(),
        }
    }

    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Integrate from `(t0, y0)` and return the state at every time in
    /// `t_eval`, which must be strictly increasing, start at or after `t0`,
    /// and whose last entry is the end of the integration span.
    pub fn integrate<S: OdeSystem<N>>(
        &mut self,
        sys: &S,
        t0: f64,
        y0: &[f64; N],
        t_eval: &[f64],
    ) -> Result<Trajectory<N>, IntegrationError> {
        self.validate_inputs(t0, y0, t_eval)?;
        self.stats = IntegrationStats::default();

        let t_end = t_eval[t_eval.len() - 1];
        let mut times = Vec::with_capacity(t_eval.len());
        let mut states = Vec::with_capacity(t_eval.len());
        let mut next_sample = 0usize;

        while next_sample < t_eval.len() && t_eval[next_sample] <= t0 {
            times.push(t_eval[next_sample]);
            states.push(*y0);
            next_sample += 1;
        }

        let mut t = t0;
        let mut y = *y0;
        let mut f = [0.0; N];
        sys.rhs(t, &y, &mut f);
        self.stats.fn_evals += 1;

        let mut h_abs = if next_sample < t_eval.len() {
            self.initial_step(sys, t0, &y, &f, t_end - t0)
        } else {
            0.0
        };
        let mut attempts = 0u64;
        let mut k = [[0.0; N]; STAGES];

        while next_sample < t_eval.len() {
            let min_step = 10.0 * spacing(t);
            if h_abs < min_step {
                h_abs = min_step;
            }

            let mut step_rejected = false;
            let (t_new, h, y_new) = loop {
                if h_abs < min_step {
                    return Err(IntegrationError::StepSizeTooSmall { t, h: h_abs });
                }
                attempts += 1;
                if attempts > self.max_steps {
                    return Err(IntegrationError::MaxStepsExceeded {
                        steps: self.max_steps,
                        t,
                    });
                }

                let t_new = (t + h_abs).min(t_end);
                let h = t_new - t;
                h_abs = h;

                let y_new = self.rk_step(sys, t, &y, &f, h, &mut k);
                let error = self.error_norm(&k, h, &y, &y_new);

                if error < 1.0 {
                    let mut factor = if error == 0.0 {
                        MAX_FACTOR
                    } else {
                        (SAFETY * error.powf(ERROR_EXPONENT)).min(MAX_FACTOR)
                    };
                    if step_rejected {
                        factor = factor.min(1.0);
                    }
                    h_abs *= factor;
                    self.stats.accepted_steps += 1;
                    break (t_new, h, y_new);
                }

                h_abs *= (SAFETY * error.powf(ERROR_EXPONENT)).max(MIN_FACTOR);
                step_rejected = true;
                self.stats.rejected_steps += 1;
            };

            if !y_new.iter().all(|v| v.is_finite()) {
                return Err(IntegrationError::NonFiniteState { t: t_new });
            }

            let q = dense_coefficients(&k);
            while next_sample < t_eval.len() && t_eval[next_sample] <= t_new {
                let ts = t_eval[next_sample];
                let state = if ts == t_new {
                    y_new
                } else {
                    interpolate(&y, &q, h, (ts - t) / h)
                };
                times.push(ts);
                states.push(state);
                next_sample += 1;
            }

            t = t_new;
            y = y_new;
            f = k[STAGES - 1];
        }

        Ok(Trajectory {
            times,
            states,
            stats: self.stats,
        })
    }

    /// One Dormand–Prince step of size `h`. Fills all seven stages in `k`
    /// (the last one is f(t + h, y_new), reused as the next step's first
    /// stage) and returns the 5th-order solution.
    #[allow(clippy::needless_range_loop)]
    fn rk_step<S: OdeSystem<N>>(
        &mut self,
        sys: &S,
        t: f64,
        y: &[f64; N],
        f: &[f64; N],
        h: f64,
        k: &mut [[f64; N]; STAGES],
    ) -> [f64; N] {
        k[0] = *f;
        let mut y_temp = [0.0; N];

        for s in 1..STAGES - 1 {
            for n in 0..N {
                let mut sum = 0.0;
                for j in 0..s {
                    sum += A[s][j] * k[j][n];
                }
                y_temp[n] = y[n] + h * sum;
            }
            sys.rhs(t + C[s] * h, &y_temp, &mut k[s]);
        }

        let mut y_new = [0.0; N];
        for n in 0..N {
            let mut sum = 0.0;
            for j in 0..B.len() {
                sum += B[j] * k[j][n];
            }
            y_new[n] = y[n] + h * sum;
        }

        sys.rhs(t + h, &y_new, &mut k[STAGES - 1]);
        self.stats.fn_evals += (STAGES - 1) as u64;

        y_new
    }

    /// RMS norm of the embedded error estimate, scaled by the tolerances.
    #[allow(clippy::needless_range_loop)]
    fn error_norm(&self, k: &[[f64; N]; STAGES], h: f64, y: &[f64; N], y_new: &[f64; N]) -> f64 {
        let mut sum_sq = 0.0;
        for n in 0..N {
            let mut err = 0.0;
            for j in 0..STAGES {
                err += E[j] * k[j][n];
            }
            err *= h;
            let scale = self.tol.atol + y[n].abs().max(y_new[n].abs()) * self.tol.rtol;
            let scaled = err / scale;
            sum_sq += scaled * scaled;
        }
        (sum_sq / N as f64).sqrt()
    }

    /// Starting step from the local derivative scale (Hairer, Nørsett &
    /// Wanner, Solving ODEs I, §II.4), capped by the span length.
    #[allow(clippy::needless_range_loop)]
    fn initial_step<S: OdeSystem<N>>(
        &mut self,
        sys: &S,
        t0: f64,
        y0: &[f64; N],
        f0: &[f64; N],
        span: f64,
    ) -> f64 {
        let scale: Vec<f64> = y0.iter().map(|v| self.tol.atol + v.abs() * self.tol.rtol).collect();
        let rms = |v: &[f64; N]| -> f64 {
            let s: f64 = v.iter().zip(&scale).map(|(x, sc)| (x / sc).powi(2)).sum();
            (s / N as f64).sqrt()
        };

        let d0 = rms(y0);
        let d1 = rms(f0);
        let h0 = if d0 < 1e-5 || d1 < 1e-5 { 1e-6 } else { 0.01 * d0 / d1 };
        let h0 = h0.min(span);

        let mut y1 = [0.0; N];
        for n in 0..N {
            y1[n] = y0[n] + h0 * f0[n];
        }
        let mut f1 = [0.0; N];
        sys.rhs(t0 + h0, &y1, &mut f1);
        self.stats.fn_evals += 1;

        let mut df = [0.0; N];
        for n in 0..N {
            df[n] = f1[n] - f0[n];
        }
        let d2 = rms(&df) / h0;

        let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
            (h0 * 1e-3).max(1e-6)
        } else {
            (0.01 / d1.max(d2)).powf(1.0 / 5.0)
        };

        (100.0 * h0).min(h1).min(span)
    }

    fn validate_inputs(
        &self,
        t0: f64,
        y0: &[f64; N],
        t_eval: &[f64],
    ) -> Result<(), IntegrationError> {
        if N == 0 {
            return Err(IntegrationError::InvalidInput {
                message: "state vector must not be empty".to_string(),
            });
        }
        if !t0.is_finite() {
            return Err(IntegrationError::InvalidInput {
                message: "t0 must be finite".to_string(),
            });
        }
        if t_eval.is_empty() {
            return Err(IntegrationError::InvalidInput {
                message: "t_eval must contain at least one time".to_string(),
            });
        }
        if t_eval.iter().any(|t| !t.is_finite()) {
            return Err(IntegrationError::InvalidInput {
                message: "t_eval entries must be finite".to_string(),
            });
        }
        if t_eval[0] < t0 {
            return Err(IntegrationError::InvalidInput {
                message: format!("t_eval starts at {} before t0 = {}", t_eval[0], t0),
            });
        }
        if t_eval.windows(2).any(|w| w[1] <= w[0]) {
            return Err(IntegrationError::InvalidInput {
                message: "t_eval must be strictly increasing".to_string(),
            });
        }
        for (i, &val) in y0.iter().enumerate() {
            if !val.is_finite() {
                return Err(IntegrationError::InvalidInput {
                    message: format!("y0[{}] is not finite", i),
                });
            }
        }
        if !(self.tol.atol.is_finite() && self.tol.atol > 0.0) {
            return Err(IntegrationError::InvalidInput {
                message: "atol must be positive and finite".to_string(),
            });
        }
        if !(self.tol.rtol.is_finite() && self.tol.rtol >= 0.0) {
            return Err(IntegrationError::InvalidInput {
                message: "rtol must be non-negative and finite".to_string(),
            });
        }
        Ok(())
    }
}

/// Distance from |t| to the next representable float above it.
fn spacing(t: f64) -> f64 {
    let a = t.abs();
    f64::from_bits(a.to_bits() + 1) - a
}

#[allow(clippy::needless_range_loop)]
fn dense_coefficients<const N: usize>(k: &[[f64; N]; STAGES]) -> [[f64; 4]; N] {
    let mut q = [[0.0; 4]; N];
    for n in 0..N {
        for m in 0..4 {
            let mut sum = 0.0;
            for i in 0..STAGES {
                sum += k[i][n] * P[i][m];
            }
            q[n][m] = sum;
        }
    }
    q
}

#[allow(clippy::needless_range_loop)]
fn interpolate<const N: usize>(y_old: &[f64; N], q: &[[f64; 4]; N], h: f64, x: f64) -> [f64; N] {
    let powers = [x, x * x, x * x * x, x * x * x * x];
    let mut y = [0.0; N];
    for n in 0..N {
        let mut sum = 0.0;
        for m in 0..4 {
            sum += q[n][m] * powers[m];
        }
        y[n] = y_old[n] + h * sum;
    }
    y
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Harmonic {
        omega: f64,
    }

    impl OdeSystem<2> for Harmonic {
        fn rhs(&self, _t: f64, y: &[f64; 2], dydt: &mut [f64; 2]) {
            dydt[0] = y[1];
            dydt[1] = -self.omega * self.omega * y[0];
        }
    }

    struct Decay;

    impl OdeSystem<1> for Decay {
        fn rhs(&self, _t: f64, y: &[f64; 1], dydt: &mut [f64; 1]) {
            dydt[0] = -y[0];
        }
    }

    fn linspace(end: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| end * i as f64 / (n - 1) as f64).collect()
    }

    #[test]
    fn test_harmonic_oscillator_matches_cosine() {
        let sys = Harmonic { omega: 2.0 };
        let t_eval = linspace(10.0, 201);
        let mut solver = DormandPrince::new(Tolerances {
            rtol: 1e-10,
            atol: 1e-12,
        });
        let traj = solver.integrate(&sys, 0.0, &[1.0, 0.0], &t_eval).unwrap();

        assert_eq!(traj.times.len(), 201);
        for (t, y) in traj.times.iter().zip(&traj.states) {
            let exact_q = (2.0 * t).cos();
            let exact_i = -2.0 * (2.0 * t).sin();
            assert!((y[0] - exact_q).abs() < 1e-6, "t={}: {} vs {}", t, y[0], exact_q);
            assert!((y[1] - exact_i).abs() < 1e-6, "t={}: {} vs {}", t, y[1], exact_i);
        }
        assert!(traj.stats.accepted_steps > 0);
        assert!(traj.stats.fn_evals >= 6 * traj.stats.accepted_steps);
    }

    #[test]
    fn test_exponential_decay() {
        let t_eval = linspace(5.0, 51);
        let mut solver = DormandPrince::new(Tolerances::default());
        let traj = solver.integrate(&Decay, 0.0, &[3.0], &t_eval).unwrap();
        for (t, y) in traj.times.iter().zip(&traj.states) {
            let exact = 3.0 * (-t).exp();
            assert!((y[0] - exact).abs() < 1e-7, "t={}: {} vs {}", t, y[0], exact);
        }
    }

    #[test]
    fn test_first_sample_is_initial_state() {
        let sys = Harmonic { omega: 1.0 };
        let mut solver = DormandPrince::new(Tolerances::default());
        let traj = solver.integrate(&sys, 0.0, &[0.5, 0.25], &[0.0, 1.0]).unwrap();
        assert_eq!(traj.states[0], [0.5, 0.25]);
        assert_eq!(traj.times, vec![0.0, 1.0]);
    }

    #[test]
    fn test_single_sample_at_start() {
        let mut solver = DormandPrince::new(Tolerances::default());
        let traj = solver.integrate(&Decay, 2.0, &[1.0], &[2.0]).unwrap();
        assert_eq!(traj.states, vec![[1.0]]);
        assert_eq!(traj.stats.accepted_steps, 0);
    }

    #[test]
    fn test_step_budget_enforced() {
        let sys = Harmonic { omega: 50.0 };
        let mut solver = DormandPrince::new(Tolerances::default()).with_max_steps(5);
        let err = solver
            .integrate(&sys, 0.0, &[1.0, 0.0], &linspace(100.0, 10))
            .unwrap_err();
        assert!(matches!(err, IntegrationError::MaxStepsExceeded { steps: 5, .. }));
        assert!(err.to_string().contains("step budget"));
    }

    #[test]
    fn test_rejects_bad_sample_times() {
        let mut solver = DormandPrince::new(Tolerances::default());
        let err = solver.integrate(&Decay, 0.0, &[1.0], &[0.0, 2.0, 1.0]).unwrap_err();
        assert!(matches!(err, IntegrationError::InvalidInput { .. }));

        let err = solver.integrate(&Decay, 1.0, &[1.0], &[0.0, 2.0]).unwrap_err();
        assert!(matches!(err, IntegrationError::InvalidInput { .. }));

        let err = solver.integrate(&Decay, 0.0, &[f64::NAN], &[0.0, 1.0]).unwrap_err();
        assert!(matches!(err, IntegrationError::InvalidInput { .. }));

        let err = solver.integrate(&Decay, 0.0, &[1.0], &[]).unwrap_err();
        assert!(matches!(err, IntegrationError::InvalidInput { .. }));
    }

    /// dy/dt = c for every state.
    struct Constant(f64);

    impl OdeSystem<1> for Constant {
        fn rhs(&self, _t: f64, _y: &[f64; 1], dydt: &mut [f64; 1]) {
            dydt[0] = self.0;
        }
    }

    /// dy/dt = 1 up to t = 0.5, NaN after it.
    struct Poisoned;

    impl OdeSystem<1> for Poisoned {
        fn rhs(&self, t: f64, _y: &[f64; 1], dydt: &mut [f64; 1]) {
            dydt[0] = if t > 0.5 { f64::NAN } else { 1.0 };
        }
    }

    #[test]
    fn test_overflowing_state_is_reported() {
        // Every stage agrees, so the error estimate stays at zero while
        // y = 1e308 + 1e308·t overflows.
        let mut solver = DormandPrince::new(Tolerances {
            rtol: 1e-6,
            atol: 1e-9,
        });
        let err = solver
            .integrate(&Constant(1e308), 0.0, &[1e308], &[0.0, 10.0])
            .unwrap_err();
        match err {
            IntegrationError::NonFiniteState { t } => assert!(t > 0.0 && t <= 10.0, "t = {}", t),
            other => panic!("expected NonFiniteState, got {:?}", other),
        }
        assert!(solver.stats.accepted_steps >= 1);
    }

    #[test]
    fn test_nan_derivative_shrinks_step_to_floor() {
        // Every attempt past t = 0.5 has a NaN error estimate and is rejected.
        let mut solver = DormandPrince::new(Tolerances::default());
        let err = solver
            .integrate(&Poisoned, 0.0, &[0.0], &[0.0, 1.0])
            .unwrap_err();
        match err {
            IntegrationError::StepSizeTooSmall { t, h } => {
                assert!(t > 0.49 && t <= 0.5, "t = {}", t);
                assert!(h < 10.0 * spacing(t));
            }
            other => panic!("expected StepSizeTooSmall, got {:?}", other),
        }
        assert!(solver.stats.rejected_steps > 0);
    }

    #[test]
    fn test_spacing() {
        assert_eq!(spacing(1.0), f64::EPSILON);
        assert!(spacing(0.0) > 0.0);
    }
}
