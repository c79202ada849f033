//! Subcommand implementations.
//!
//! Each command writes to a caller-provided sink so tests can capture output.

use std::io::Write;

use p2paste_app::{CopyLink, CopyOutcome, JoinForm, LifecycleConfig};
use p2paste_core::{AutomergeReplica, Slug, env::Environment};
use p2paste_harness::{Chaos, InvariantRegistry, SimCluster};

use crate::error::CliError;

/// Rounds the demo room gets to go quiet.
const DEMO_MAX_ROUNDS: usize = 400;

/// Full link for `slug`, or just its path without a base URL.
pub fn room_link(base_url: Option<&str>, slug: &Slug) -> String {
    match base_url {
        Some(base) => format!("{}{}", base.trim_end_matches('/'), slug.path()),
        None => slug.path(),
    }
}

/// Generate a fresh room and offer its link.
pub fn new_room<E: Environment>(
    env: &E,
    base_url: Option<&str>,
    clipboard: Option<&mut CopyLink>,
    out: &mut impl Write,
) -> Result<Slug, CliError> {
    let slug = Slug::generate(env);
    let link = room_link(base_url, &slug);
    tracing::info!(%slug, "room created");

    writeln!(out, "room: {slug}")?;
    writeln!(out, "link: {link}")?;

    if let Some(chain) = clipboard {
        match chain.copy(&link) {
            CopyOutcome::Copied { via } => writeln!(out, "copied to clipboard via {via}")?,
            CopyOutcome::ShowManually => writeln!(out, "copy the link above to share it")?,
        }
    }
    Ok(slug)
}

/// Check a hand-typed room link and print the path to open.
pub fn join_room(
    first: &str,
    second: &str,
    code: &str,
    out: &mut impl Write,
) -> Result<String, CliError> {
    let mut form = JoinForm::new();
    form.set_first(first);
    form.set_second(second);
    form.set_code(code);

    let path = form.submit()?;
    writeln!(out, "{path}")?;
    Ok(path)
}

/// Settings for [`demo`].
#[derive(Debug, Clone)]
pub struct DemoOptions {
    /// Participants in the room.
    pub peers: usize,
    /// Seed for the simulated environment and network.
    pub seed: u64,
    /// Inject duplication, reordering and corruption.
    pub chaos: bool,
    /// Extra start delay absorbing double mounts.
    pub settle_delay: bool,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self { peers: 3, seed: 1, chaos: false, settle_delay: false }
    }
}

/// Run a simulated room where every participant types a line, then print
/// what each one shows.
pub fn demo(options: &DemoOptions, out: &mut impl Write) -> Result<String, CliError> {
    let demo_error = |reason: String| CliError::Demo { reason };

    let chaos = if options.chaos { Chaos::heavy() } else { Chaos::NONE };
    let config = if options.settle_delay {
        LifecycleConfig::development()
    } else {
        LifecycleConfig::default()
    };
    let mut cluster =
        SimCluster::<AutomergeReplica>::with_chaos(options.seed, chaos).with_config(config);

    let slug = Slug::generate(cluster.env());
    let peers: Vec<usize> = (0..options.peers.max(1)).map(|_| cluster.add_peer()).collect();
    for &peer in &peers {
        cluster.mount(peer, &slug).map_err(demo_error)?;
    }
    cluster.settle(DEMO_MAX_ROUNDS).map_err(demo_error)?;

    for &peer in &peers {
        cluster.type_text(peer, &format!("peer {} was here\n", peer + 1)).map_err(demo_error)?;
        cluster.step().map_err(demo_error)?;
    }
    let rounds = cluster.settle(DEMO_MAX_ROUNDS).map_err(demo_error)?;

    InvariantRegistry::standard()
        .verify(&cluster.snapshot(), "after demo edits")
        .map_err(demo_error)?;

    writeln!(out, "room: {slug}")?;
    for &peer in &peers {
        let Some(view) = cluster.peer(peer).map(|p| p.lifecycle().view()) else { continue };
        writeln!(out, "peer {}: {}", peer + 1, view.status_line())?;
    }
    let text = cluster.text(0).unwrap_or_default();
    writeln!(out, "settled in {rounds} rounds, shared text:")?;
    write!(out, "{text}")?;

    let stats = cluster.network().stats();
    tracing::info!(
        delivered = stats.frames_delivered,
        rejected = stats.frames_rejected,
        "demo finished"
    );
    Ok(text)
}

#[cfg(test)]
mod tests {
    use p2paste_app::MemoryClipboard;
    use p2paste_harness::SimEnv;

    use super::*;

    #[test]
    fn link_joins_base_and_path() {
        let slug = Slug::parse("blue-otter-degk").unwrap();
        assert_eq!(room_link(None, &slug), "/blue-otter-degk");
        assert_eq!(
            room_link(Some("https://paste.example/"), &slug),
            "https://paste.example/blue-otter-degk"
        );
    }

    #[test]
    fn new_room_copies_link() {
        let memory = MemoryClipboard::new();
        let mut chain = CopyLink::new().with(memory.clone());
        let mut out = Vec::new();

        let slug = new_room(&SimEnv::with_seed(3), None, Some(&mut chain), &mut out).unwrap();

        assert_eq!(memory.contents(), Some(slug.path()));
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("copied to clipboard via memory"));
    }

    #[test]
    fn new_room_without_clipboard_falls_back() {
        let mut chain = CopyLink::new();
        let mut out = Vec::new();

        new_room(&SimEnv::with_seed(3), None, Some(&mut chain), &mut out).unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("copy the link above"));
    }

    #[test]
    fn join_accepts_any_case() {
        let mut out = Vec::new();
        let path = join_room("Blue", "OTTER", "DEGK", &mut out).unwrap();
        assert_eq!(path, "/blue-otter-degk");
        insta::assert_snapshot!(String::from_utf8(out).unwrap().trim_end(), @"/blue-otter-degk");
    }

    #[test]
    fn join_rejects_with_one_message() {
        let mut out = Vec::new();
        let error = join_room("blue", "otter", "aaaa", &mut out).unwrap_err();
        insta::assert_snapshot!(
            error.to_string(),
            @"That doesn't look like a valid room. Check the two words and the code."
        );
        assert!(out.is_empty());
    }

    #[test]
    fn demo_participants_agree() {
        let mut out = Vec::new();
        let text = demo(&DemoOptions::default(), &mut out).unwrap();

        for peer in 1..=3 {
            assert!(text.contains(&format!("peer {peer} was here")));
        }
        let printed = String::from_utf8(out).unwrap();
        assert_eq!(printed.matches("Connected | Peers: 3").count(), 3);
    }

    #[test]
    fn demo_survives_chaos() {
        let options = DemoOptions { chaos: true, seed: 8, ..DemoOptions::default() };
        let text = demo(&options, &mut Vec::new()).unwrap();
        assert_eq!(text.lines().count(), 3);
    }
}
