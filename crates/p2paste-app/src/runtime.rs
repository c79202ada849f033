//! Generic runtime for application orchestration.
//!
//! The Runtime drives the event loop, coordinating between:
//! - [`Lifecycle`]: session lifecycle state machine
//! - [`Driver`]: platform-specific I/O

use p2paste_core::{Replica, env::Environment};

use crate::{Driver, Lifecycle, LifecycleAction, LifecycleConfig, LifecycleEvent};

/// Generic runtime that orchestrates a Lifecycle and a Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `E`: Environment for time and randomness
/// - `R`: CRDT engine for the shared document
pub struct Runtime<D, E, R>
where
    D: Driver,
    E: Environment,
    R: Replica,
{
    driver: D,
    lifecycle: Lifecycle<E, R>,
}

impl<D, E, R> Runtime<D, E, R>
where
    D: Driver<Instant = E::Instant>,
    E: Environment,
    R: Replica,
{
    /// Create a new runtime with the given driver and environment.
    pub fn new(driver: D, env: E, config: LifecycleConfig) -> Self {
        Self { driver, lifecycle: Lifecycle::new(env, config) }
    }

    /// Run the main event loop until the view unmounts.
    ///
    /// Each cycle polls one event from the driver, or ticks the clock when
    /// none is ready, and executes the resulting actions. Transport failures
    /// are logged and never end the loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to poll or render.
    pub async fn run(&mut self) -> Result<(), D::Error> {
        self.driver.render(&self.lifecycle.view())?;

        loop {
            let should_quit = self.process_cycle().await?;
            if should_quit {
                break;
            }
        }

        self.driver.stop();
        Ok(())
    }

    /// Process one cycle of the event loop.
    ///
    /// Returns `true` if the application should quit.
    async fn process_cycle(&mut self) -> Result<bool, D::Error> {
        let event = match self.driver.poll_event().await? {
            Some(event) => event,
            None => LifecycleEvent::Tick { now: self.driver.now() },
        };
        let should_quit = matches!(event, LifecycleEvent::Unmount);

        match self.lifecycle.handle(event) {
            Ok(actions) => self.process_actions(actions).await?,
            Err(error) => tracing::warn!(%error, "lifecycle rejected event"),
        }

        Ok(should_quit)
    }

    /// Execute actions returned by the Lifecycle.
    async fn process_actions(&mut self, actions: Vec<LifecycleAction>) -> Result<(), D::Error> {
        for action in actions {
            match action {
                LifecycleAction::RequestIdle { ticket } => self.driver.request_idle(ticket),
                LifecycleAction::Transport(command) => {
                    if let Err(error) = self.driver.execute(command).await {
                        tracing::warn!(%error, "transport command failed");
                    }
                },
                LifecycleAction::Render => self.driver.render(&self.lifecycle.view())?,
            }
        }
        Ok(())
    }

    /// Get a reference to the Lifecycle
    pub fn lifecycle(&self) -> &Lifecycle<E, R> {
        &self.lifecycle
    }

    /// Get a reference to the Driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get a mutable reference to the Driver
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}
