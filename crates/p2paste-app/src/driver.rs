//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the runtime from a specific host page and
//! peer transport. Each frontend implements the trait, while the generic
//! [`crate::Runtime`] handles all orchestration.

use std::future::Future;

use crate::{LifecycleEvent, RoomView, StartTicket, TransportCommand};

/// Abstracts I/O operations for the application runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in production and simulation.
///
/// # Implementations
///
/// - **Simulation**: in-memory rendezvous network with a virtual clock
/// - **Browser**: idle callbacks, page visibility events, WebRTC data
///   channels through public signaling servers
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Time instant type. Enables virtual time in simulation.
    type Instant: Copy + Ord + Send + Sync;

    /// Poll for the next event from the host page or the transport.
    ///
    /// Returns `None` if nothing is ready; the runtime then ticks the clock.
    fn poll_event(
        &mut self,
    ) -> impl Future<Output = Result<Option<LifecycleEvent<Self::Instant>>, Self::Error>> + Send;

    /// Execute a transport operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport refuses the operation. The runtime
    /// logs it and carries on.
    fn execute(
        &mut self,
        command: TransportCommand,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Ask the host to report idle with `ticket`.
    fn request_idle(&mut self, ticket: StartTicket);

    /// Current time instant.
    fn now(&self) -> Self::Instant;

    /// Render the room view.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, view: &RoomView) -> Result<(), Self::Error>;

    /// Release platform resources.
    fn stop(&mut self);
}
