// Projection of a point onto the intersection of the unit box with the
// weight constraint lo <= a'x <= hi: the "napsack" subproblem of the
// quadratic refinement. The solution has the closed form
// x = clip(y - lambda * a, 0, 1); the solver searches for the multiplier
// lambda with a heap scan over the break points of the piecewise-linear,
// nonincreasing map lambda -> a' clip(y - lambda * a, 0, 1).

use crate::algorithms::Error;
use crate::heap::IndexedMaxHeap;

/// Project `x` onto `{ x in [0,1]^n : lo <= a'x <= hi }`.
///
/// On input `x` holds the unconstrained point `y`; on output it holds
/// the projection. `lambda` is a warm start for the multiplier search
/// and the final multiplier is returned. `tol` bounds the accepted
/// deviation of `a'x` from the violated bound.
pub fn napsack(
    x: &mut [f64],
    lo: f64,
    hi: f64,
    a: &[f64],
    lambda: f64,
    tol: f64,
) -> Result<f64, Error> {
    debug_assert_eq!(x.len(), a.len());
    debug_assert!(lo <= hi);

    let value_at_zero = evaluate(x, a, 0.0);
    let lambda = if value_at_zero > hi + tol {
        // Too much weight on side A: raise lambda until a'x falls to hi.
        let start = if evaluate(x, a, lambda) > hi { lambda } else { 0.0 };
        napdown(x, a, start, hi, tol)?
    } else if value_at_zero < lo - tol {
        // Too little: lower lambda until a'x rises to lo.
        let start = if evaluate(x, a, lambda) < lo { lambda } else { 0.0 };
        napup(x, a, start, lo, tol)?
    } else {
        0.0
    };

    for (xk, &ak) in x.iter_mut().zip(a) {
        *xk = (*xk - lambda * ak).clamp(0.0, 1.0);
    }
    Ok(lambda)
}

// a' clip(y - lambda * a, 0, 1)
fn evaluate(y: &[f64], a: &[f64], lambda: f64) -> f64 {
    y.iter()
        .zip(a)
        .map(|(&yk, &ak)| ak * (yk - lambda * ak).clamp(0.0, 1.0))
        .sum()
}

// Raise lambda from `start` until the constraint value falls to
// `target`. The scan visits break points in increasing order; keys are
// negated so the shared max-heap pops the smallest one first.
fn napdown(y: &[f64], a: &[f64], start: f64, target: f64, tol: f64) -> Result<f64, Error> {
    let n = y.len();
    let mut bound_heap = IndexedMaxHeap::new(n);
    let mut free_heap = IndexedMaxHeap::new(n);

    let mut lambda = start;
    let mut value = 0.0;
    let mut slope = 0.0;
    for k in 0..n {
        let ak = a[k];
        let shifted = y[k] - lambda * ak;
        if shifted >= 1.0 {
            value += ak;
            bound_heap.insert(k, -(y[k] - 1.0) / ak);
        } else if shifted > 0.0 {
            value += ak * shifted;
            slope += ak * ak;
            free_heap.insert(k, -y[k] / ak);
        }
        // Entries already at zero stay at zero as lambda rises.
    }

    if value <= target + tol {
        return Ok(lambda);
    }

    for _ in 0..=2 * n {
        // Cross every break point at or below the current lambda.
        while let Some((k, key)) = bound_heap.peek() {
            if -key > lambda {
                break;
            }
            bound_heap.pop();
            // k leaves the upper bound and becomes free.
            slope += a[k] * a[k];
            free_heap.insert(k, -y[k] / a[k]);
        }
        while let Some((k, key)) = free_heap.peek() {
            if -key > lambda {
                break;
            }
            free_heap.pop();
            // k reaches zero and drops out of the slope.
            slope -= a[k] * a[k];
        }

        let next_break = match (bound_heap.peek(), free_heap.peek()) {
            (Some((_, b)), Some((_, f))) => Some(-b.max(f)),
            (Some((_, b)), None) => Some(-b),
            (None, Some((_, f))) => Some(-f),
            (None, None) => None,
        };

        if slope > 0.0 {
            let candidate = lambda + (value - target) / slope;
            if next_break.map_or(true, |brk| candidate <= brk) {
                return Ok(candidate.max(lambda));
            }
        }

        let Some(next_break) = next_break else {
            break;
        };
        value -= slope * (next_break - lambda);
        lambda = next_break;
    }

    if (value - target).abs() <= tol {
        Ok(lambda)
    } else {
        Err(Error::InfeasibleConstraint)
    }
}

// Lower lambda from `start` until the constraint value rises to
// `target`. Mirror image of `napdown`: break points are visited in
// decreasing order, straight out of the max-heaps.
fn napup(y: &[f64], a: &[f64], start: f64, target: f64, tol: f64) -> Result<f64, Error> {
    let n = y.len();
    let mut bound_heap = IndexedMaxHeap::new(n);
    let mut free_heap = IndexedMaxHeap::new(n);

    let mut lambda = start;
    let mut value = 0.0;
    let mut slope = 0.0;
    for k in 0..n {
        let ak = a[k];
        let shifted = y[k] - lambda * ak;
        if shifted <= 0.0 {
            bound_heap.insert(k, y[k] / ak);
        } else if shifted < 1.0 {
            value += ak * shifted;
            slope += ak * ak;
            free_heap.insert(k, (y[k] - 1.0) / ak);
        } else {
            // Entries already at one stay at one as lambda falls.
            value += ak;
        }
    }

    if value >= target - tol {
        return Ok(lambda);
    }

    for _ in 0..=2 * n {
        // Cross every break point at or above the current lambda.
        while let Some((k, key)) = bound_heap.peek() {
            if key < lambda {
                break;
            }
            bound_heap.pop();
            // k leaves the lower bound and becomes free.
            slope += a[k] * a[k];
            free_heap.insert(k, (y[k] - 1.0) / a[k]);
        }
        while let Some((k, key)) = free_heap.peek() {
            if key < lambda {
                break;
            }
            free_heap.pop();
            // k reaches one; its contribution is frozen.
            slope -= a[k] * a[k];
        }

        let next_break = match (bound_heap.peek(), free_heap.peek()) {
            (Some((_, b)), Some((_, f))) => Some(b.max(f)),
            (Some((_, b)), None) => Some(b),
            (None, Some((_, f))) => Some(f),
            (None, None) => None,
        };

        if slope > 0.0 {
            let candidate = lambda - (target - value) / slope;
            if next_break.map_or(true, |brk| candidate >= brk) {
                return Ok(candidate.min(lambda));
            }
        }

        let Some(next_break) = next_break else {
            break;
        };
        value += slope * (lambda - next_break);
        lambda = next_break;
    }

    if (value - target).abs() <= tol {
        Ok(lambda)
    } else {
        Err(Error::InfeasibleConstraint)
    }
}
