//! Coercion of an arbitrary decoded document into a well-formed [`GameState`].
//!
//! Normalization never fails: every field that does not have the expected shape falls
//! back to its default, list fields keep only non-empty strings (first occurrence wins),
//! and the cross-field invariants are restored afterwards. Running it on its own output
//! is a no-op.

use std::collections::HashSet;

use indexmap::IndexSet;
use serde::Deserialize;
use serde_json::{Map, Value};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::state::game::{FIRST_SEASON, GameState, WinnerRecord};

/// Loosely typed mirror of the persisted document.
///
/// Every field is kept as a raw JSON value so that a wrong type in one field never
/// prevents the others from being read.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawGameState {
    season: Value,
    started: Value,
    alive: Value,
    eliminated: Value,
    winner: Value,
    last_event: Value,
    next_elimination_time: Value,
    last_tick_time: Value,
    pending_reset: Value,
    winners: Value,
}

/// Normalize any decoded JSON value. Non-object inputs produce the default state.
pub fn normalize(value: Value) -> GameState {
    match value {
        Value::Object(map) => normalize_object(map),
        _ => GameState::default(),
    }
}

fn normalize_object(map: Map<String, Value>) -> GameState {
    // Every field of `RawGameState` accepts any JSON value, so this cannot fail for an object.
    serde_json::from_value::<RawGameState>(Value::Object(map))
        .map(GameState::from)
        .unwrap_or_default()
}

impl From<RawGameState> for GameState {
    fn from(raw: RawGameState) -> Self {
        let eliminated = identifiers(&raw.eliminated);
        let mut alive = identifiers(&raw.alive);
        alive.retain(|name| !eliminated.contains(name));

        let winner = raw
            .winner
            .as_str()
            .filter(|name| alive.contains(*name))
            .map(str::to_owned);

        Self {
            season: positive(&raw.season).unwrap_or(FIRST_SEASON),
            started: raw.started.as_bool().unwrap_or(false),
            alive,
            eliminated,
            winner,
            last_event: raw.last_event.as_str().unwrap_or_default().to_owned(),
            next_elimination_time: timestamp(&raw.next_elimination_time),
            last_tick_time: timestamp(&raw.last_tick_time),
            pending_reset: raw.pending_reset.as_bool().unwrap_or(false),
            winners: winner_records(&raw.winners),
        }
    }
}

fn positive(value: &Value) -> Option<u64> {
    value.as_u64().filter(|number| *number > 0)
}

fn identifier(value: &Value) -> Option<&str> {
    value.as_str().filter(|name| !name.is_empty())
}

/// Ordered, duplicate free list of identifiers. [`IndexSet`] keeps the first position
/// of a repeated entry.
fn identifiers(value: &Value) -> IndexSet<String> {
    value
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(identifier)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

fn timestamp(value: &Value) -> Option<OffsetDateTime> {
    value
        .as_str()
        .and_then(|text| OffsetDateTime::parse(text, &Rfc3339).ok())
}

fn winner_records(value: &Value) -> Vec<WinnerRecord> {
    let Some(entries) = value.as_array() else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    entries
        .iter()
        .filter_map(|entry| {
            let season = positive(entry.get("season")?)?;
            let username = identifier(entry.get("username")?)?;
            Some(WinnerRecord {
                season,
                username: username.to_owned(),
            })
        })
        .filter(|record| seen.insert(record.season))
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    fn renormalize(state: &GameState) -> GameState {
        normalize(serde_json::to_value(state).unwrap())
    }

    #[test]
    fn missing_document_yields_defaults() {
        assert_eq!(normalize(Value::Null), GameState::default());
        assert_eq!(normalize(json!([1, 2, 3])), GameState::default());
        assert_eq!(normalize(json!({})), GameState::default());
    }

    #[test]
    fn non_positive_or_malformed_season_resets_to_one() {
        for season in [json!(0), json!(-4), json!("7"), json!(2.5), json!(null)] {
            let state = normalize(json!({ "season": season }));
            assert_eq!(state.season, FIRST_SEASON, "season {season}");
        }
        assert_eq!(normalize(json!({ "season": 12 })).season, 12);
    }

    #[test]
    fn lists_keep_first_occurrence_of_strings_only() {
        let state = normalize(json!({
            "alive": ["a", 3, "b", "a", null, "", "c", { "name": "d" }, "b"],
        }));
        let alive: Vec<_> = state.alive.iter().map(String::as_str).collect();
        assert_eq!(alive, ["a", "b", "c"]);
    }

    #[test]
    fn elimination_wins_over_alive() {
        let state = normalize(json!({
            "alive": ["a", "b", "c"],
            "eliminated": ["b"],
        }));
        let alive: Vec<_> = state.alive.iter().map(String::as_str).collect();
        assert_eq!(alive, ["a", "c"]);
        assert!(state.eliminated.contains("b"));
    }

    #[test]
    fn winner_must_be_alive() {
        let kept = normalize(json!({ "alive": ["a"], "winner": "a" }));
        assert_eq!(kept.winner.as_deref(), Some("a"));

        let cleared = normalize(json!({ "alive": ["a"], "eliminated": ["z"], "winner": "z" }));
        assert_eq!(cleared.winner, None);

        let wrong_type = normalize(json!({ "alive": ["a"], "winner": 1 }));
        assert_eq!(wrong_type.winner, None);
    }

    #[test]
    fn winners_are_well_formed_and_unique_per_season() {
        let state = normalize(json!({
            "winners": [
                { "season": 1, "username": "a" },
                { "season": 1, "username": "b" },
                { "season": 0, "username": "c" },
                { "season": 2 },
                { "season": 3, "username": 7 },
                "d",
                { "season": 4, "username": "e" },
            ],
        }));
        assert_eq!(
            state.winners,
            vec![
                WinnerRecord {
                    season: 1,
                    username: "a".into()
                },
                WinnerRecord {
                    season: 4,
                    username: "e".into()
                },
            ]
        );
    }

    #[test]
    fn timestamps_are_parsed_or_dropped() {
        let state = normalize(json!({
            "nextEliminationTime": "2024-05-01T12:00:00Z",
            "lastTickTime": "yesterday",
        }));
        assert_eq!(
            state.next_elimination_time,
            Some(OffsetDateTime::parse("2024-05-01T12:00:00Z", &Rfc3339).unwrap())
        );
        assert_eq!(state.last_tick_time, None);
    }

    #[test]
    fn scalar_flags_fall_back_to_false() {
        let state = normalize(json!({ "started": "yes", "pendingReset": 1, "lastEvent": 5 }));
        assert!(!state.started);
        assert!(!state.pending_reset);
        assert_eq!(state.last_event, "");
    }

    #[test]
    fn serialized_form_is_stable() {
        let state = normalize(json!({
            "season": 3,
            "started": true,
            "alive": ["a", "b"],
            "eliminated": ["c"],
            "lastEvent": "c was eliminated. 2 remain.",
            "nextEliminationTime": "2024-05-01T12:00:00.5+02:00",
            "winners": [{ "season": 2, "username": "x" }],
        }));
        let first = serde_json::to_string_pretty(&state).unwrap();
        let reparsed: GameState = serde_json::from_str(&first).unwrap();
        let second = serde_json::to_string_pretty(&reparsed).unwrap();
        assert_eq!(first, second);
        assert_eq!(reparsed, state);
    }

    fn arbitrary_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            (0u64..6).prop_map(Value::from),
            "[a-e]{0,2}".prop_map(Value::String),
            Just(Value::String("2024-05-01T12:00:00Z".into())),
        ];
        leaf.prop_recursive(3, 24, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::vec(
                    (prop_oneof![Just("season".to_owned()), Just("username".to_owned())], inner),
                    0..3
                )
                .prop_map(|pairs| Value::Object(pairs.into_iter().collect())),
            ]
        })
    }

    fn arbitrary_document() -> impl Strategy<Value = Value> {
        let keys = prop_oneof![
            Just("season"),
            Just("started"),
            Just("alive"),
            Just("eliminated"),
            Just("winner"),
            Just("lastEvent"),
            Just("nextEliminationTime"),
            Just("lastTickTime"),
            Just("pendingReset"),
            Just("winners"),
        ];
        prop::collection::vec((keys, arbitrary_json()), 0..10).prop_map(|pairs| {
            Value::Object(
                pairs
                    .into_iter()
                    .map(|(key, value)| (key.to_owned(), value))
                    .collect(),
            )
        })
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(document in arbitrary_document()) {
            let once = normalize(document);
            prop_assert_eq!(renormalize(&once), once);
        }

        #[test]
        fn normalized_lists_are_disjoint(document in arbitrary_document()) {
            let state = normalize(document);
            prop_assert!(state.alive.iter().all(|name| !state.eliminated.contains(name)));
            if let Some(winner) = &state.winner {
                prop_assert!(state.alive.contains(winner));
            }
            let mut seasons = HashSet::new();
            prop_assert!(state.winners.iter().all(|record| seasons.insert(record.season)));
            prop_assert!(state.season >= FIRST_SEASON);
        }
    }
}
