//! Logical snapshot record
//!
//! Only the mutable fields needed to resume a session: positions, velocities,
//! health, score and the obstacle layout state.

use std::collections::BTreeMap;

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::PersistenceError;

/// Envelope version written by this build
pub const SNAPSHOT_VERSION: u32 = 1;

/// Kinematic state of one physics body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyRecord {
    pub pos: Vec2,
    pub vel: Vec2,
}

/// One obstacle column (a pair of pillars around a gap)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnRecord {
    pub x: f32,
    pub gap_y: f32,
    pub scored: bool,
}

/// Per-entity mutable state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityRecord {
    Player {
        body: BodyRecord,
        health: u32,
        score: u64,
    },
    Antagonist {
        body: BodyRecord,
        /// Where an in-progress punch is headed
        target: Option<Vec2>,
        returning: bool,
    },
    Obstacles {
        /// Layout seed, generator state and number of gaps drawn so far
        seed: u64,
        rng: Pcg32,
        draws: u64,
        passed: u64,
        columns: Vec<ColumnRecord>,
    },
}

/// A named session snapshot, keyed like the entity registry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub session: String,
    pub entities: BTreeMap<String, EntityRecord>,
}

impl Snapshot {
    pub fn new(session: impl Into<String>) -> Self {
        Self {
            session: session.into(),
            entities: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, record: EntityRecord) {
        self.entities.insert(key.into(), record);
    }

    pub fn get(&self, key: &str) -> Option<&EntityRecord> {
        self.entities.get(key)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Serialize into the versioned envelope
    pub fn encode(&self) -> Result<Vec<u8>, PersistenceError> {
        let envelope = EnvelopeRef {
            version: SNAPSHOT_VERSION,
            snapshot: self,
        };
        Ok(serde_json::to_vec(&envelope)?)
    }

    /// Parse a versioned envelope
    pub fn decode(bytes: &[u8]) -> Result<Self, PersistenceError> {
        let envelope: Envelope = serde_json::from_slice(bytes)?;
        if envelope.version != SNAPSHOT_VERSION {
            return Err(PersistenceError::Version(envelope.version));
        }
        Ok(envelope.snapshot)
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    snapshot: &'a Snapshot,
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    snapshot: Snapshot,
}

/// Arbitrary finite snapshots for property tests
#[cfg(test)]
pub(crate) mod strategies {
    use super::*;
    use proptest::prelude::*;

    fn coord() -> impl Strategy<Value = f32> {
        -1000.0f32..1000.0
    }

    fn vec2() -> impl Strategy<Value = Vec2> {
        (coord(), coord()).prop_map(|(x, y)| Vec2::new(x, y))
    }

    fn body() -> impl Strategy<Value = BodyRecord> {
        (vec2(), vec2()).prop_map(|(pos, vel)| BodyRecord { pos, vel })
    }

    fn column() -> impl Strategy<Value = ColumnRecord> {
        (coord(), coord(), any::<bool>()).prop_map(|(x, gap_y, scored)| ColumnRecord {
            x,
            gap_y,
            scored,
        })
    }

    pub fn entity_record() -> impl Strategy<Value = EntityRecord> {
        prop_oneof![
            (body(), any::<u32>(), any::<u64>()).prop_map(|(body, health, score)| {
                EntityRecord::Player {
                    body,
                    health,
                    score,
                }
            }),
            (body(), proptest::option::of(vec2()), any::<bool>()).prop_map(
                |(body, target, returning)| EntityRecord::Antagonist {
                    body,
                    target,
                    returning,
                }
            ),
            (
                any::<u64>(),
                any::<(u64, u64)>(),
                any::<u64>(),
                any::<u64>(),
                proptest::collection::vec(column(), 0..6),
            )
                .prop_map(|(seed, (state, stream), draws, passed, columns)| {
                    EntityRecord::Obstacles {
                        seed,
                        rng: Pcg32::new(state, stream),
                        draws,
                        passed,
                        columns,
                    }
                }),
        ]
    }

    pub fn snapshot() -> impl Strategy<Value = Snapshot> {
        (
            "[a-z0-9_]{1,12}",
            proptest::collection::btree_map("[a-z]{1,10}", entity_record(), 0..8),
        )
            .prop_map(|(session, entities)| Snapshot { session, entities })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn sample() -> Snapshot {
        let mut snapshot = Snapshot::new("local");
        snapshot.insert(
            "player",
            EntityRecord::Player {
                body: BodyRecord {
                    pos: Vec2::new(40.0, 24.5),
                    vel: Vec2::new(0.0, -2.25),
                },
                health: 2,
                score: 7,
            },
        );
        snapshot.insert(
            "obstacles",
            EntityRecord::Obstacles {
                seed: 99,
                rng: Pcg32::seed_from_u64(99),
                draws: 4,
                passed: 3,
                columns: vec![ColumnRecord {
                    x: 12.5,
                    gap_y: 20.0,
                    scored: true,
                }],
            },
        );
        snapshot
    }

    #[test]
    fn test_envelope_carries_version() {
        let bytes = sample().encode().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["snapshot"]["entities"]["player"]["kind"], "player");
    }

    #[test]
    fn test_decode_restores_snapshot() {
        let snapshot = sample();
        let decoded = Snapshot::decode(&snapshot.encode().unwrap()).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_unknown_version_rejected() {
        let bytes = br#"{ "version": 9, "snapshot": { "session": "local", "entities": {} } }"#;
        assert!(matches!(
            Snapshot::decode(bytes),
            Err(PersistenceError::Version(9))
        ));
    }

    #[test]
    fn test_garbage_is_codec_error() {
        assert!(matches!(
            Snapshot::decode(b"not json"),
            Err(PersistenceError::Codec(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(snapshot in strategies::snapshot()) {
            let bytes = snapshot.encode().unwrap();
            prop_assert_eq!(Snapshot::decode(&bytes).unwrap(), snapshot);
        }
    }
}
