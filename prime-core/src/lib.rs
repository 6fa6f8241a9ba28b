//! Shared primality utilities for the oscillator experiments.
//!
//! Everything here is pure integer arithmetic on `u64`: deterministic trial
//! division, exhaustive next-prime search, ordered prime generation, and a
//! sieve used to cross-check the trial-division path.

use num_integer::{Integer, Roots};

/// Largest prime representable as a `u64`.
pub const LARGEST_U64_PRIME: u64 = 18_446_744_073_709_551_557;

/// Deterministic primality test by trial division.
///
/// Returns false for n < 2, true for 2, false for every other even number,
/// and otherwise tries every odd divisor from 3 up to floor(sqrt(n)).
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n == 2 {
        return true;
    }
    if n.is_even() {
        return false;
    }

    let limit = n.sqrt();
    let mut divisor = 3u64;
    while divisor <= limit {
        if n % divisor == 0 {
            return false;
        }
        divisor += 2;
    }

    true
}

/// Smallest prime strictly greater than `n`, found by testing n+1, n+2, ...
///
/// Returns `None` if `n >= LARGEST_U64_PRIME`, since no larger prime fits in
/// a `u64`.
pub fn checked_next_prime(n: u64) -> Option<u64> {
    if n >= LARGEST_U64_PRIME {
        return None;
    }
    let mut candidate = n + 1;
    while !is_prime(candidate) {
        candidate += 1;
    }
    Some(candidate)
}

/// Smallest prime strictly greater than `n`.
///
/// # Panics
///
/// Panics if `n >= LARGEST_U64_PRIME`. Use [`checked_next_prime`] for input
/// that is not known to be in range.
pub fn next_prime(n: u64) -> u64 {
    match checked_next_prime(n) {
        Some(p) => p,
        None => panic!("no prime above {} is representable as u64", n),
    }
}

/// The first `count` primes that are >= `start`, in increasing order.
///
/// Stops early, returning fewer than `count`, when the search reaches the top
/// of the `u64` range.
pub fn generate_primes(start: u64, count: usize) -> Vec<u64> {
    let mut primes = Vec::with_capacity(count);
    let mut candidate = start;

    while primes.len() < count {
        if is_prime(candidate) {
            primes.push(candidate);
        }
        candidate = match candidate.checked_add(1) {
            Some(next) => next,
            None => break,
        };
    }

    primes
}

/// Differences between consecutive entries of an ordered prime list.
pub fn prime_gaps(primes: &[u64]) -> Vec<u64> {
    primes.windows(2).map(|w| w[1] - w[0]).collect()
}

/// All primes up to and including `limit`, via the Sieve of Eratosthenes.
pub fn sieve_primes(limit: u64) -> Vec<u64> {
    if limit < 2 {
        return Vec::new();
    }
    let size = (limit + 1) as usize;
    let mut is_prime = vec![true; size];
    is_prime[0] = false;
    is_prime[1] = false;
    let mut i = 2usize;
    while i * i < size {
        if is_prime[i] {
            let mut j = i * i;
            while j < size {
                is_prime[j] = false;
                j += i;
            }
        }
        i += 1;
    }
    is_prime
        .iter()
        .enumerate()
        .filter(|(_, &p)| p)
        .map(|(i, _)| i as u64)
        .collect()
}
