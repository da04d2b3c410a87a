//! Embedded Runge–Kutta integrators for the pendulum ODE
//!
//! Provides the Cash–Karp 5(4) step ([`CashKarp`]) and the adaptive step
//! controller built on it ([`StepController`]). Both own their stage
//! buffers so repeated calls don't allocate.

use log::debug;

use super::forces::Derivatives;

// Step control constants of the classical Cash–Karp stepper
pub const SAFETY: f64 = 0.9;
pub const PGROW: f64 = -0.2;
pub const PSHRNK: f64 = -0.25;
pub const ERRCON: f64 = 1.89e-4;
pub const TINY: f64 = 1.0e-30;

/// Smallest step the controller will shrink to before forcing it through
pub const MIN_STEP: f64 = 1.0e-8;

// Cash–Karp tableau
const B21: f64 = 0.2;
const B31: f64 = 3.0 / 40.0;
const B32: f64 = 9.0 / 40.0;
const B41: f64 = 0.3;
const B42: f64 = -0.9;
const B43: f64 = 1.2;
const B51: f64 = -11.0 / 54.0;
const B52: f64 = 2.5;
const B53: f64 = -70.0 / 27.0;
const B54: f64 = 35.0 / 27.0;
const B61: f64 = 1631.0 / 55296.0;
const B62: f64 = 175.0 / 512.0;
const B63: f64 = 575.0 / 13824.0;
const B64: f64 = 44275.0 / 110592.0;
const B65: f64 = 253.0 / 4096.0;

// 5th-order weights
const C1: f64 = 37.0 / 378.0;
const C3: f64 = 250.0 / 621.0;
const C4: f64 = 125.0 / 594.0;
const C6: f64 = 512.0 / 1771.0;

// 5th minus embedded 4th-order weights
const DC1: f64 = C1 - 2825.0 / 27648.0;
const DC3: f64 = C3 - 18575.0 / 48384.0;
const DC4: f64 = C4 - 13525.0 / 55296.0;
const DC5: f64 = -277.0 / 14336.0;
const DC6: f64 = C6 - 0.25;

/// One Cash–Karp step with reusable stage storage
#[derive(Debug, Clone)]
pub struct CashKarp {
    ak2: Vec<f64>,
    ak3: Vec<f64>,
    ak4: Vec<f64>,
    ak5: Vec<f64>,
    ak6: Vec<f64>,
    ytemp: Vec<f64>,
}

impl CashKarp {
    /// Scratch sized for an `n`-dimensional system
    pub fn new(n: usize) -> Self {
        Self {
            ak2: vec![0.0; n],
            ak3: vec![0.0; n],
            ak4: vec![0.0; n],
            ak5: vec![0.0; n],
            ak6: vec![0.0; n],
            ytemp: vec![0.0; n],
        }
    }

    pub fn dimension(&self) -> usize {
        self.ytemp.len()
    }

    /// Advance `y` by `h` given `dydx = f(y)`.
    /// Writes the 5th-order solution to `yout` and the difference to the
    /// embedded 4th-order solution to `yerr`.
    pub fn step<S: Derivatives + ?Sized>(
        &mut self,
        sys: &S,
        y: &[f64],
        dydx: &[f64],
        h: f64,
        yout: &mut [f64],
        yerr: &mut [f64],
    ) {
        let n = self.dimension();
        debug_assert_eq!(sys.dimension(), n);
        debug_assert_eq!(y.len(), n);
        debug_assert_eq!(dydx.len(), n);

        let Self { ak2, ak3, ak4, ak5, ak6, ytemp } = self;

        for i in 0..n {
            ytemp[i] = y[i] + h * B21 * dydx[i];
        }

        sys.rhs(ytemp, ak2);
        for i in 0..n {
            ytemp[i] = y[i] + h * (B31 * dydx[i] + B32 * ak2[i]);
        }

        sys.rhs(ytemp, ak3);
        for i in 0..n {
            ytemp[i] = y[i] + h * (B41 * dydx[i] + B42 * ak2[i] + B43 * ak3[i]);
        }

        sys.rhs(ytemp, ak4);
        for i in 0..n {
            ytemp[i] = y[i] + h * (B51 * dydx[i] + B52 * ak2[i] + B53 * ak3[i] + B54 * ak4[i]);
        }

        sys.rhs(ytemp, ak5);
        for i in 0..n {
            ytemp[i] = y[i]
                + h * (B61 * dydx[i] + B62 * ak2[i] + B63 * ak3[i] + B64 * ak4[i] + B65 * ak5[i]);
        }

        sys.rhs(ytemp, ak6);
        for i in 0..n {
            yout[i] = y[i] + h * (C1 * dydx[i] + C3 * ak3[i] + C4 * ak4[i] + C6 * ak6[i]);
            yerr[i] = h * (DC1 * dydx[i] + DC3 * ak3[i] + DC4 * ak4[i] + DC5 * ak5[i] + DC6 * ak6[i]);
        }
    }
}

/// Result of one adaptive step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub hdid: f64, // step actually taken
    pub hnext: f64, // suggested next step
    pub errmax: f64, // scaled error of the accepted step, <= 1 unless forced
}

impl StepOutcome {
    /// The step was pushed through at the minimum size without meeting the tolerance
    pub fn forced(&self) -> bool {
        self.errmax > 1.0
    }
}

/// Adaptive step-size driver around [`CashKarp`]
#[derive(Debug, Clone)]
pub struct StepController {
    stepper: CashKarp,
    yerr: Vec<f64>,
    ytemp: Vec<f64>,
}

impl StepController {
    pub fn new(n: usize) -> Self {
        Self {
            stepper: CashKarp::new(n),
            yerr: vec![0.0; n],
            ytemp: vec![0.0; n],
        }
    }

    pub fn dimension(&self) -> usize {
        self.ytemp.len()
    }

    /// Fill `yscal` with `|y| + |h * dydx| + TINY`
    pub fn error_scale(y: &[f64], dydx: &[f64], h: f64, yscal: &mut [f64]) {
        for ((s, yi), di) in yscal.iter_mut().zip(y).zip(dydx) {
            *s = yi.abs() + (di * h).abs() + TINY;
        }
    }

    /// Take one step of at most `htry`, shrinking until the scaled error
    /// `max(|yerr_i| / yscal_i) / eps` is at most 1.
    ///
    /// On return `y` holds the new state and `t` has advanced by `hdid`.
    /// If the step would drop below [`MIN_STEP`] it is taken anyway.
    pub fn step<S: Derivatives + ?Sized>(
        &mut self,
        sys: &S,
        y: &mut [f64],
        dydx: &[f64],
        t: &mut f64,
        htry: f64,
        eps: f64,
        yscal: &[f64],
    ) -> StepOutcome {
        let mut h = htry;
        let mut errmax;

        loop {
            self.stepper.step(sys, y, dydx, h, &mut self.ytemp, &mut self.yerr);

            errmax = self
                .yerr
                .iter()
                .zip(yscal)
                .fold(0.0_f64, |acc, (e, s)| acc.max((e / s).abs()));
            errmax /= eps;

            if errmax <= 1.0 {
                break;
            }

            let htemp = SAFETY * h * errmax.powf(PSHRNK);
            // never shrink by more than a factor of ten per try
            h = if h >= 0.0 { htemp.max(0.1 * h) } else { htemp.min(0.1 * h) };
            if h.abs() < MIN_STEP {
                debug!("step forced through at h = {h:e}, errmax = {errmax:e}");
                break;
            }
        }

        let hnext = if errmax > ERRCON {
            SAFETY * h * errmax.powf(PGROW)
        } else {
            5.0 * h
        };

        *t += h;
        y.copy_from_slice(&self.ytemp);

        StepOutcome { hdid: h, hnext, errmax }
    }
}
