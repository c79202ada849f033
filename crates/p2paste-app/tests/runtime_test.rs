//! Runtime tests with a scripted driver.

use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use p2paste_app::{
    Driver, LifecycleConfig, LifecycleEvent, RoomView, Runtime, StartTicket, TransportCommand,
};
use p2paste_core::{AutomergeReplica, Channel, Slug, env::Environment};

#[derive(Clone, Default)]
struct TestEnv(Arc<AtomicU64>);

impl Environment for TestEnv {
    type Instant = Duration;

    fn now(&self) -> Duration {
        Duration::ZERO
    }

    fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        std::future::ready(())
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        let next = self.0.fetch_add(1, Ordering::Relaxed);
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = next.to_be_bytes()[i % 8] ^ (i as u8);
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("transport offline")]
struct Offline;

/// Driver that replays a script and records what the runtime asked for.
#[derive(Default)]
struct ScriptedDriver {
    script: VecDeque<LifecycleEvent<Duration>>,
    now: Duration,
    executed: Vec<TransportCommand>,
    renders: Vec<RoomView>,
    fail_broadcasts: bool,
    stopped: bool,
}

impl Driver for ScriptedDriver {
    type Error = Offline;
    type Instant = Duration;

    async fn poll_event(&mut self) -> Result<Option<LifecycleEvent<Duration>>, Offline> {
        self.now += Duration::from_millis(50);
        Ok(self.script.pop_front())
    }

    async fn execute(&mut self, command: TransportCommand) -> Result<(), Offline> {
        let failed = self.fail_broadcasts && matches!(command, TransportCommand::Broadcast { .. });
        self.executed.push(command);
        if failed { Err(Offline) } else { Ok(()) }
    }

    fn request_idle(&mut self, ticket: StartTicket) {
        self.script.push_front(LifecycleEvent::HostIdle { ticket, now: self.now });
    }

    fn now(&self) -> Duration {
        self.now
    }

    fn render(&mut self, view: &RoomView) -> Result<(), Offline> {
        self.renders.push(view.clone());
        Ok(())
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

fn script(events: impl IntoIterator<Item = LifecycleEvent<Duration>>) -> ScriptedDriver {
    ScriptedDriver { script: events.into_iter().collect(), ..ScriptedDriver::default() }
}

fn mount() -> LifecycleEvent<Duration> {
    LifecycleEvent::Mount { slug: Slug::parse("blue-otter-degk").unwrap(), now: Duration::ZERO }
}

fn runtime(driver: ScriptedDriver) -> Runtime<ScriptedDriver, TestEnv, AutomergeReplica> {
    Runtime::new(driver, TestEnv::default(), LifecycleConfig::default())
}

#[tokio::test]
async fn runtime_joins_and_leaves_cleanly() {
    let mut runtime = runtime(script([mount(), LifecycleEvent::Unmount]));

    runtime.run().await.unwrap();

    let driver = runtime.driver();
    assert!(driver.stopped);
    assert!(matches!(driver.executed.first(), Some(TransportCommand::OpenRoom { .. })));
    assert!(matches!(driver.executed.last(), Some(TransportCommand::CloseSignaling { .. })));
    assert!(!runtime.lifecycle().is_active());
    assert_eq!(driver.renders.last().map(|view| view.room.is_none()), Some(true));
}

#[tokio::test]
async fn runtime_survives_send_failures() {
    let mut driver = script([mount(), LifecycleEvent::Input { text: "hello".to_string() }]);
    driver.fail_broadcasts = true;
    driver.script.push_back(LifecycleEvent::Input { text: "hello!".to_string() });
    driver.script.push_back(LifecycleEvent::Unmount);
    let mut runtime = runtime(driver);

    runtime.run().await.unwrap();

    let broadcasts = runtime
        .driver()
        .executed
        .iter()
        .filter(|c| matches!(c, TransportCommand::Broadcast { .. }))
        .count();
    assert_eq!(broadcasts, 2, "every failed send was attempted");
    assert!(!runtime.lifecycle().is_active());
}

#[tokio::test]
async fn ticks_fire_the_request_full_timer() {
    let mut runtime = runtime(script([
        mount(),
        LifecycleEvent::Tick { now: Duration::from_millis(100) },
        LifecycleEvent::Tick { now: Duration::from_secs(1) },
        LifecycleEvent::Unmount,
    ]));

    runtime.run().await.unwrap();

    let requests: Vec<_> = runtime
        .driver()
        .executed
        .iter()
        .filter(|c| matches!(c, TransportCommand::Broadcast { channel: Channel::RequestFull, .. }))
        .collect();
    assert_eq!(requests.len(), 1);
}
