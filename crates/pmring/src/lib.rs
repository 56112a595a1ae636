//! Bounded SPSC ring buffers for the puppetmaster data plane.
//!
//! Every cross-thread hand-off in the scheduler core (client → dispatcher,
//! dispatcher → puppet, puppet → dispatcher) goes through a [`Ring`]: a
//! single-producer single-consumer bounded queue with power-of-two capacity
//! and release/acquire publication. Operations never block; a full `push` or
//! empty `pop` returns immediately and the caller decides whether to spin
//! (see [`Backoff`]).
//!
//! # Example
//!
//! ```
//! use pmring::Ring;
//!
//! let ring = Ring::<u64>::new(8);
//! assert!(ring.push(42));
//! assert_eq!(ring.peek(), Some(&42));
//! assert_eq!(ring.pop(), Some(42));
//! assert_eq!(ring.pop(), None);
//! ```

mod backoff;
mod invariants;
mod ring;

pub use backoff::Backoff;
pub use ring::Ring;
