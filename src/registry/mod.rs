use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Participant identifier, assigned by the registry in registration order.
pub type ParticipantId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Standard,
    Miner,
}

/// Public identity of a participant. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub role: Role,
    #[serde(with = "crate::serde_hex")]
    pub public_key: Vec<u8>,
}

/// Identity registry: participant id -> public identity.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    participants: BTreeMap<ParticipantId, Participant>,
    next_id: ParticipantId,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new identity and return the id it was given.
    pub fn register(&mut self, name: String, role: Role, public_key: Vec<u8>) -> ParticipantId {
        let id = self.next_id;
        self.next_id += 1;
        self.participants.insert(
            id,
            Participant {
                id,
                name,
                role,
                public_key,
            },
        );
        id
    }

    /// Re-insert a previously registered identity (snapshot recovery).
    /// Returns false when the id is already taken.
    pub fn restore(&mut self, participant: Participant) -> bool {
        if self.participants.contains_key(&participant.id) {
            return false;
        }
        self.next_id = self.next_id.max(participant.id + 1);
        self.participants.insert(participant.id, participant);
        true
    }

    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.get(&id)
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        self.participants.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Participants in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }
}

#[cfg(test)]
mod tests {
    use super::{Participant, Registry, Role};

    #[test]
    fn ids_are_assigned_in_order() {
        let mut reg = Registry::new();
        let a = reg.register("miner0".into(), Role::Miner, vec![1]);
        let b = reg.register("Nick".into(), Role::Standard, vec![2]);
        assert_eq!((a, b), (0, 1));
        assert_eq!(reg.get(b).map(|p| p.name.as_str()), Some("Nick"));
        let ids: Vec<_> = reg.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn restore_keeps_ids_monotonic() {
        let mut reg = Registry::new();
        assert!(reg.restore(Participant {
            id: 7,
            name: "Bob".into(),
            role: Role::Standard,
            public_key: vec![],
        }));
        assert!(!reg.restore(Participant {
            id: 7,
            name: "Alice".into(),
            role: Role::Standard,
            public_key: vec![],
        }));
        assert_eq!(reg.register("Anna".into(), Role::Standard, vec![]), 8);
    }
}
