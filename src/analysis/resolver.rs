//! Handle Resolver: human-readable names to the unique handle of a runtime object.
//!
//! The analysed topology is known up front, so anything but exactly one match is fatal.

use std::fmt;

use log::debug;

use crate::error::{AnalysisError, Result};
use crate::trace::{Handle, TraceSession};

/// Role of the object named in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Publisher,
    Subscriber,
    Node,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Publisher => "publisher",
            Role::Subscriber => "subscription",
            Role::Node => "node",
        })
    }
}

/// Resolves `(role, name)` to its handle. `name` is a topic for publishers and
/// subscribers, a node name otherwise.
pub fn resolve(session: &TraceSession, role: Role, name: &str) -> Result<Handle> {
    let candidates = match role {
        Role::Publisher => session.publisher_handles(name)?,
        Role::Subscriber => session.subscription_handles(name)?,
        Role::Node => session.node_handles(name)?,
    };
    let handle = exactly_one(candidates, role.to_string(), name)?;
    debug!("{} '{}' -> 0x{:x}", role, name, handle);
    Ok(handle)
}

/// Finds the timer callback object owned by `node_name`.
pub fn timer_callback(session: &TraceSession, node_name: &str) -> Result<Handle> {
    let owners = callback_owners(session)?;
    let handle = match_owner(&owners, "timer callback", node_name, |info| {
        info.contains(node_name) && info.contains("Timer")
    })?;
    println!("Timer for node '{}': 0x{:x}", node_name, handle);
    Ok(handle)
}

/// Finds the subscription callback object for `topic`, optionally restricted to `node_name`.
pub fn subscription_callback(
    session: &TraceSession,
    topic: &str,
    node_name: Option<&str>,
) -> Result<Handle> {
    let owners = callback_owners(session)?;
    match_owner(&owners, "subscription callback", topic, |info| {
        info.contains(topic) && node_name.is_none_or(|node| info.contains(node))
    })
}

/// Callback registry paired with the owner description of each object.
fn callback_owners(session: &TraceSession) -> Result<Vec<(Handle, String)>> {
    let mut owners = Vec::new();
    for object in session.callback_objects()? {
        if let Some(info) = session.callback_owner_info(object)? {
            owners.push((object, info));
        }
    }
    Ok(owners)
}

/// Selects the single callback object whose owner info satisfies `predicate`.
pub(crate) fn match_owner(
    owners: &[(Handle, String)],
    role: &str,
    name: &str,
    predicate: impl Fn(&str) -> bool,
) -> Result<Handle> {
    let matches = owners
        .iter()
        .filter(|(_, info)| predicate(info))
        .map(|(obj, _)| *obj)
        .collect();
    exactly_one(matches, role.to_string(), name)
}

fn exactly_one(candidates: Vec<Handle>, role: String, name: &str) -> Result<Handle> {
    match candidates.as_slice() {
        [only] => Ok(*only),
        _ => Err(AnalysisError::AmbiguousOrMissingHandle {
            role,
            name: name.to_string(),
            count: candidates.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::table::tests::sample_tables;

    fn session() -> TraceSession {
        TraceSession::from_tables("trace", sample_tables())
    }

    #[test]
    fn resolves_unique_names() {
        let s = session();
        assert_eq!(resolve(&s, Role::Publisher, "/BehaviorPlanner").unwrap(), 11);
        assert_eq!(resolve(&s, Role::Subscriber, "/LanePlanner").unwrap(), 21);
        assert_eq!(resolve(&s, Role::Node, "LanePlanner").unwrap(), 2);
    }

    #[test]
    fn missing_name_is_fatal() {
        let err = resolve(&session(), Role::Subscriber, "/Nowhere").unwrap_err();
        match err {
            AnalysisError::AmbiguousOrMissingHandle { count, name, .. } => {
                assert_eq!(count, 0);
                assert_eq!(name, "/Nowhere");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_owner_is_ambiguous() {
        let owners = vec![
            (1, "Timer -- node: BehaviorPlanner, tid: 1, period: 100 ms".to_string()),
            (2, "Timer -- node: BehaviorPlanner, tid: 2, period: 50 ms".to_string()),
        ];
        let err = match_owner(&owners, "timer callback", "BehaviorPlanner", |i| {
            i.contains("BehaviorPlanner") && i.contains("Timer")
        })
        .unwrap_err();
        assert!(matches!(err, AnalysisError::AmbiguousOrMissingHandle { count: 2, .. }));
    }

    #[test]
    fn two_publishers_on_one_topic_are_ambiguous() {
        let mut tables = sample_tables();
        tables.rcl_publishers = polars::prelude::df!(
            "publisher_handle" => [11i64, 13],
            "node_handle" => [1i64, 2],
            "topic_name" => ["/BehaviorPlanner", "/BehaviorPlanner"],
            "depth" => [10i64, 10]
        )
        .unwrap();
        let s = TraceSession::from_tables("trace", tables);
        let err = resolve(&s, Role::Publisher, "/BehaviorPlanner").unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::AmbiguousOrMissingHandle { count: 2, ref role, .. } if role == "publisher"
        ));
    }

    #[test]
    fn finds_callbacks_by_owner() {
        let s = session();
        assert_eq!(timer_callback(&s, "BehaviorPlanner").unwrap(), 0x100);
        assert_eq!(
            subscription_callback(&s, "/LanePlanner", Some("BehaviorPlanner")).unwrap(),
            0x200
        );
        assert_eq!(subscription_callback(&s, "/LanePlanner", None).unwrap(), 0x200);
        assert!(subscription_callback(&s, "/LanePlanner", Some("ParkingPlanner")).is_err());
    }
}
