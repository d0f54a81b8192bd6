//! Small integer helpers shared by the sieve stages.

/// Integer square root, exact for every `u64`.
#[inline]
pub fn isqrt(n: u64) -> u64 {
    if n == 0 {
        return 0;
    }
    let mut x = (n as f64).sqrt() as u64;
    while x > 0 && x.checked_mul(x).is_none_or(|sq| sq > n) {
        x -= 1;
    }
    while (x + 1).checked_mul(x + 1).is_some_and(|sq| sq <= n) {
        x += 1;
    }
    x
}

/// Largest power of two <= `n` (returns 0 for 0).
#[inline]
pub fn floor_power_of_2(n: usize) -> usize {
    if n == 0 {
        0
    } else {
        1 << (usize::BITS - 1 - n.leading_zeros())
    }
}

/// Round `n` up to the next multiple of 8.
#[inline]
pub const fn align8(n: usize) -> usize {
    (n + 7) & !7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isqrt() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(1), 1);
        assert_eq!(isqrt(3), 1);
        assert_eq!(isqrt(4), 2);
        assert_eq!(isqrt(99), 9);
        assert_eq!(isqrt(100), 10);
        assert_eq!(isqrt(u64::MAX), 4_294_967_295);
        assert_eq!(isqrt(1 << 52), 1 << 26);
        assert_eq!(isqrt((1 << 52) - 1), (1 << 26) - 1);
    }

    #[test]
    fn test_floor_power_of_2() {
        assert_eq!(floor_power_of_2(0), 0);
        assert_eq!(floor_power_of_2(1), 1);
        assert_eq!(floor_power_of_2(3), 2);
        assert_eq!(floor_power_of_2(32), 32);
        assert_eq!(floor_power_of_2(1000), 512);
    }

    #[test]
    fn test_align8() {
        assert_eq!(align8(0), 0);
        assert_eq!(align8(1), 8);
        assert_eq!(align8(8), 8);
        assert_eq!(align8(17), 24);
    }
}
