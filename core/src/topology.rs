//! The data model of §3 that describes who is in a transaction and how
//! gossip can reach them: [`Member`], [`Link`], [`Topology`], and the
//! derived [`TopologyView`] of §4.3.

use crate::crypto::PublicKey;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A role a [`Member`] can hold. A member may hold both; every member may
/// additionally relay gossip regardless of role (relaying is not a role).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Participant,
    Referee,
}

/// A node identified by a public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// The logical or physical address at which this member is directly
    /// reachable, if any.
    pub address: Option<String>,
    /// An opaque secret meaningful only to the member's own agent; the core
    /// never inspects it.
    pub agent_secret: Option<String>,
    pub roles: BTreeSet<Role>,
}

impl Member {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// A directed, anonymized adjacency between two member keys. Links exist
/// for gossip reach only; they carry no signatures or value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Link {
    pub source_key: PublicKey,
    pub target_key: PublicKey,
    pub nonce: String,
    pub terms: String,
}

/// An immutable-per-transaction tuple of (links, key → member mapping).
/// Identity is established by deep structural equality of its canonical
/// serialization, not by a separate identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub links: Vec<Link>,
    pub members: BTreeMap<PublicKey, Member>,
}

impl Topology {
    /// A [`TopologyView`] derived from this topology.
    pub fn view(&self) -> TopologyView<'_> {
        TopologyView::new(self)
    }
}

/// Participants, referees, and reachable-peer sets derived from a
/// [`Topology`] on demand — there is no long-lived "topology service",
/// just a view computed per call.
pub struct TopologyView<'a> {
    topology: &'a Topology,
}

impl<'a> TopologyView<'a> {
    pub fn new(topology: &'a Topology) -> Self {
        TopologyView { topology }
    }

    /// Keys whose member role set contains [`Role::Participant`].
    pub fn participants(&self) -> BTreeSet<PublicKey> {
        self.keys_with_role(Role::Participant)
    }

    /// Keys whose member role set contains [`Role::Referee`].
    pub fn referees(&self) -> BTreeSet<PublicKey> {
        self.keys_with_role(Role::Referee)
    }

    fn keys_with_role(&self, role: Role) -> BTreeSet<PublicKey> {
        self.topology
            .members
            .iter()
            .filter(|(_, member)| member.has_role(role))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// The union of (a) all directly-addressable member keys and (b) the
    /// other endpoint of every link incident to `our_key`, deduplicated.
    /// Used only to pick gossip targets.
    pub fn reachable_peers(&self, our_key: &PublicKey) -> BTreeSet<PublicKey> {
        let mut reachable: BTreeSet<PublicKey> = self
            .topology
            .members
            .iter()
            .filter(|(_, member)| member.address.is_some())
            .map(|(key, _)| key.clone())
            .collect();
        for link in &self.topology.links {
            if &link.source_key == our_key {
                reachable.insert(link.target_key.clone());
            } else if &link.target_key == our_key {
                reachable.insert(link.source_key.clone());
            }
        }
        reachable.remove(our_key);
        reachable
    }
}
