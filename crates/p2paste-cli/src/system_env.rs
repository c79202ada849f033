//! Production Environment implementation using system time and RNG.
//!
//! `SystemEnv` uses real system time and the OS RNG. Slugs generated with it
//! are not reproducible, which is the point: a room name should not be
//! guessable from when it was created.

use std::time::Duration;

use p2paste_core::env::Environment;

/// Production environment using system time and OS randomness.
///
/// # Panics
///
/// Panics if the OS RNG fails. Without entropy every generated room name
/// would collide, so there is nothing sensible to continue with.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).expect("invariant: OS RNG failure is unrecoverable");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_advances() {
        let env = SystemEnv::new();
        let t1 = env.now();
        std::thread::sleep(Duration::from_millis(5));
        let t2 = env.now();
        assert!(t2 > t1);
    }

    #[test]
    fn random_bytes_differ() {
        let env = SystemEnv::new();
        assert_ne!(env.random_u128(), env.random_u128());
    }
}
