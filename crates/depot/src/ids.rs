//! Record identifiers.
//!
//! An id is 16 lowercase hex digits: milliseconds since the Unix epoch in
//! the high 48 bits, a random 16-bit suffix in the low bits. Every id a
//! generator hands out is strictly greater than the one before, so an id
//! freed by a deletion is never drawn again.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

const SUFFIX_BITS: u32 = 16;

/// Strictly increasing id source.
#[derive(Debug, Default)]
pub(crate) struct IdGenerator {
    last: AtomicU64,
}

impl IdGenerator {
    /// Next id, greater than every id this generator issued before.
    pub(crate) fn next(&self) -> String {
        format!("{:016x}", self.next_raw(now_millis()))
    }

    fn next_raw(&self, millis: u64) -> u64 {
        let suffix = u64::from(uuid::Uuid::new_v4().as_u128() as u16);
        let fresh = (millis << SUFFIX_BITS) | suffix;
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = fresh.max(last.saturating_add(1));
            match self
                .last
                .compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return candidate,
                Err(current) => last = current,
            }
        }
    }
}

fn now_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_ids_are_sixteen_hex_digits() {
        let id = IdGenerator::default().next();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_ids_increase_within_one_millisecond() {
        let ids = IdGenerator::default();
        let drawn: Vec<u64> = (0..1000).map(|_| ids.next_raw(1_700_000_000_000)).collect();
        assert!(drawn.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_clock_going_backwards_does_not_repeat() {
        let ids = IdGenerator::default();
        let late = ids.next_raw(1_700_000_000_500);
        let early = ids.next_raw(1_700_000_000_000);
        assert!(early > late);
    }

    #[test]
    fn test_concurrent_draws_are_unique() {
        let ids = Arc::new(IdGenerator::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || (0..500).map(|_| ids.next()).collect::<Vec<_>>())
            })
            .collect();
        let all: HashSet<String> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(all.len(), 2000);
    }
}
