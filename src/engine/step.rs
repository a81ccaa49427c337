//! Per-axis step selection

use crate::hal::rng::RandomSource;
use crate::picker::BoundedRandomPicker;

pub fn is_prime(n: u32) -> bool {
    if n <= 1 {
        return false;
    }
    if n <= 3 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }
    let mut d = 3;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// Smallest non-prime strictly greater than `n`
pub fn next_non_prime(n: u32) -> u32 {
    let mut v = n + 1;
    while is_prime(v) {
        v += 1;
    }
    v
}

/// Choose a new step for one axis whose coordinate is `*pos` in
/// `0..=bound`.
///
/// A prime coordinate is first moved up to the next non-prime (never past
/// `bound`). On the far edge the step points inward, on `0` outward, both
/// dividing `bound`; elsewhere the direction is random. A zero-length axis
/// gets a zero step.
pub fn axis_step<R: RandomSource>(picker: &mut BoundedRandomPicker<R>, pos: &mut i32, bound: i32) -> i32 {
    if bound <= 0 {
        return 0;
    }

    let bound_u = bound as u32;
    let mut current = (*pos).clamp(0, bound) as u32;
    if is_prime(current) {
        current = next_non_prime(current).min(bound_u);
        *pos = current as i32;
    }

    if current == bound_u {
        -(picker.pick_step(bound_u) as i32)
    } else if current == 0 {
        picker.pick_step(bound_u) as i32
    } else {
        picker.pick_signed_step(bound_u, current)
    }
}
