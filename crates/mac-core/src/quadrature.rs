//! Adaptive Simpson quadrature for the vertical overlap integral.
//!
//! The interval is cut into a fixed set of equal seed panels, and each
//! panel is halved until the Richardson error estimate of the two
//! half-interval sums against the parent estimate falls within the panel's
//! tolerance share. Smooth integrands converge in a handful of levels;
//! a recursion budget turns pathological ones into a typed error instead
//! of a stack overflow.

use thiserror::Error;

/// Absolute tolerance used for the risk integrals.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Deepest subdivision level before giving up on an interval.
const MAX_DEPTH: u32 = 48;

/// Equal panels the interval is cut into before any adaptive halving.
/// Convergence is never judged on a grid coarser than this, so an
/// integrand much narrower than the interval still gets sampled.
const INITIAL_PANELS: u32 = 16;

#[derive(Debug, Error, PartialEq)]
pub enum QuadratureError {
    #[error("integration bounds [{a}, {b}] are not finite")]
    InvalidBounds { a: f64, b: f64 },
    #[error("integrand is not finite at x = {x}")]
    NonFiniteIntegrand { x: f64 },
    #[error("no convergence on [{a}, {b}] within the subdivision budget")]
    NoConvergence { a: f64, b: f64 },
}

/// Integrate `f` over `[a, b]` to within `tolerance` absolute error.
pub fn integrate<F>(f: F, a: f64, b: f64, tolerance: f64) -> Result<f64, QuadratureError>
where
    F: Fn(f64) -> f64,
{
    if !a.is_finite() || !b.is_finite() {
        return Err(QuadratureError::InvalidBounds { a, b });
    }
    if a == b {
        return Ok(0.0);
    }
    let tolerance = tolerance.abs().max(f64::MIN_POSITIVE);
    let panel_tolerance = (tolerance / f64::from(INITIAL_PANELS)).max(f64::MIN_POSITIVE);
    let width = (b - a) / f64::from(INITIAL_PANELS);

    let mut total = 0.0;
    let mut pa = a;
    let mut fa = eval(&f, a)?;
    for panel in 1..=INITIAL_PANELS {
        let pb = if panel == INITIAL_PANELS {
            b
        } else {
            a + width * f64::from(panel)
        };
        let fb = eval(&f, pb)?;
        let m = 0.5 * (pa + pb);
        let fm = eval(&f, m)?;
        let whole = simpson(pa, pb, fa, fm, fb);
        total += subdivide(&f, pa, pb, fa, fm, fb, whole, panel_tolerance, MAX_DEPTH)?;
        pa = pb;
        fa = fb;
    }
    Ok(total)
}

fn eval<F: Fn(f64) -> f64>(f: &F, x: f64) -> Result<f64, QuadratureError> {
    let y = f(x);
    if y.is_finite() {
        Ok(y)
    } else {
        Err(QuadratureError::NonFiniteIntegrand { x })
    }
}

fn simpson(a: f64, b: f64, fa: f64, fm: f64, fb: f64) -> f64 {
    (b - a) / 6.0 * (fa + 4.0 * fm + fb)
}

#[allow(clippy::too_many_arguments)]
fn subdivide<F: Fn(f64) -> f64>(
    f: &F,
    a: f64,
    b: f64,
    fa: f64,
    fm: f64,
    fb: f64,
    whole: f64,
    tolerance: f64,
    depth: u32,
) -> Result<f64, QuadratureError> {
    let m = 0.5 * (a + b);
    let lm = 0.5 * (a + m);
    let rm = 0.5 * (m + b);
    let flm = eval(f, lm)?;
    let frm = eval(f, rm)?;
    let left = simpson(a, m, fa, flm, fm);
    let right = simpson(m, b, fm, frm, fb);
    let delta = left + right - whole;

    // Halving a Simpson interval gains a factor 16 in accuracy, so the
    // halved sum is trusted once |delta| <= 15 * tolerance, with delta/15
    // as the Richardson correction term.
    if delta.abs() <= 15.0 * tolerance {
        return Ok(left + right + delta / 15.0);
    }
    if depth == 0 {
        return Err(QuadratureError::NoConvergence { a, b });
    }
    let half_tol = 0.5 * tolerance;
    Ok(subdivide(f, a, m, fa, flm, fm, left, half_tol, depth - 1)?
        + subdivide(f, m, b, fm, frm, fb, right, half_tol, depth - 1)?)
}
