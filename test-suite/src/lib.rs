//! Shared test scaffolding: in-memory capability implementations and setup
//! helpers.

pub mod memory_decider;
pub mod memory_signer;
pub mod memory_storage;

pub use memory_decider::{MemoryDecider, Policy};
pub use memory_signer::MemorySigner;
pub use memory_storage::MemoryStorage;

use concord_core::{Member, Role, Topology};
use std::collections::BTreeMap;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes logging once per test process. Call at the top of any test
/// that wants to see `log::debug!`/`log::warn!` output.
pub fn setup_test() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Builds a topology with `participant_count` participant-only members and
/// `referee_count` referee-only members, all directly addressable (no
/// links), keyed by the public keys a [`MemorySigner`] would derive for
/// `session_code` from each of `node_seeds`.
pub fn build_topology(session_code: &str, node_seeds: &[&str], referee_seeds: &[&str]) -> Topology {
    let mut members = BTreeMap::new();
    for seed in node_seeds {
        let signer = MemorySigner::for_session(seed, session_code);
        members.insert(
            signer.public_key(),
            Member {
                address: Some(seed.to_string()),
                agent_secret: None,
                roles: [Role::Participant].into_iter().collect(),
            },
        );
    }
    for seed in referee_seeds {
        let signer = MemorySigner::for_session(seed, session_code);
        members
            .entry(signer.public_key())
            .and_modify(|m| {
                m.roles.insert(Role::Referee);
            })
            .or_insert(Member {
                address: Some(seed.to_string()),
                agent_secret: None,
                roles: [Role::Referee].into_iter().collect(),
            });
    }
    Topology {
        links: vec![],
        members,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_topology_assigns_requested_roles() {
        let topology = build_topology("session-x", &["a", "b"], &["a"]);
        assert_eq!(topology.members.len(), 2);
        let view = topology.view();
        assert_eq!(view.participants().len(), 2);
        assert_eq!(view.referees().len(), 1);
    }
}
