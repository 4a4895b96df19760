//! `vpnode connect` / `vpnode disconnect` -- session event relay.
//!
//! OpenVPN invokes these via the client-connect/client-disconnect hooks
//! and passes session facts through the environment. The payload keys and
//! derivations (`disconnected_at`, `bytes_transferred`) are part of the
//! portal contract.

use vpnode_api::{ConnectEvent, DisconnectEvent};

use crate::cli::GlobalOpts;
use crate::error::CliError;

use super::{load_node_config, portal_client};

pub async fn connect(global: &GlobalOpts) -> Result<(), CliError> {
    let event = connect_event(env_lookup)?;

    let config = load_node_config(global)?;
    let client = portal_client(&config, global)?;
    client.connect(&event).await?;
    Ok(())
}

pub async fn disconnect(global: &GlobalOpts) -> Result<(), CliError> {
    let event = disconnect_event(env_lookup)?;

    let config = load_node_config(global)?;
    let client = portal_client(&config, global)?;
    client.disconnect(&event).await?;
    Ok(())
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

// ── Hook environment parsing ─────────────────────────────────────────

fn require(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<String, CliError> {
    lookup(key).ok_or(CliError::MissingEnv { key })
}

fn require_number(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<i64, CliError> {
    require(lookup, key)?
        .parse()
        .map_err(|_| CliError::MalformedEnv { key })
}

/// Build a connect payload from the hook environment.
fn connect_event(lookup: impl Fn(&str) -> Option<String>) -> Result<ConnectEvent, CliError> {
    Ok(ConnectEvent {
        profile_id: require(&lookup, "PROFILE_ID")?,
        common_name: require(&lookup, "common_name")?,
        ip4: require(&lookup, "ifconfig_pool_remote_ip")?,
        ip6: require(&lookup, "ifconfig_pool_remote_ip6")?,
        connected_at: require_number(&lookup, "time_unix")?,
    })
}

/// Build a disconnect payload from the hook environment.
///
/// `disconnected_at = time_unix + time_duration` and
/// `bytes_transferred = bytes_received + bytes_sent`.
fn disconnect_event(lookup: impl Fn(&str) -> Option<String>) -> Result<DisconnectEvent, CliError> {
    let connected_at = require_number(&lookup, "time_unix")?;
    let duration = require_number(&lookup, "time_duration")?;
    let bytes_received = require_number(&lookup, "bytes_received")?;
    let bytes_sent = require_number(&lookup, "bytes_sent")?;

    Ok(DisconnectEvent {
        profile_id: require(&lookup, "PROFILE_ID")?,
        common_name: require(&lookup, "common_name")?,
        ip4: require(&lookup, "ifconfig_pool_remote_ip")?,
        ip6: require(&lookup, "ifconfig_pool_remote_ip6")?,
        connected_at,
        disconnected_at: connected_at + duration,
        bytes_transferred: u64::try_from(bytes_received + bytes_sent).unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::collections::HashMap;

    use super::*;

    fn hook_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("PROFILE_ID", "internet"),
            ("common_name", "client-cn"),
            ("ifconfig_pool_remote_ip", "10.42.42.2"),
            ("ifconfig_pool_remote_ip6", "fd00:4242:4242::1000"),
            ("time_unix", "1700000000"),
            ("time_duration", "3600"),
            ("bytes_received", "1000"),
            ("bytes_sent", "234"),
        ])
    }

    fn lookup_in(
        map: HashMap<&'static str, &'static str>,
    ) -> impl Fn(&str) -> Option<String> {
        move |key| map.get(key).map(ToString::to_string)
    }

    #[test]
    fn connect_event_from_hook_environment() {
        let event = connect_event(lookup_in(hook_env())).unwrap();
        assert_eq!(event.profile_id, "internet");
        assert_eq!(event.common_name, "client-cn");
        assert_eq!(event.ip4, "10.42.42.2");
        assert_eq!(event.ip6, "fd00:4242:4242::1000");
        assert_eq!(event.connected_at, 1_700_000_000);
    }

    #[test]
    fn disconnect_event_derives_totals() {
        let event = disconnect_event(lookup_in(hook_env())).unwrap();
        assert_eq!(event.disconnected_at, 1_700_003_600);
        assert_eq!(event.bytes_transferred, 1234);
    }

    #[test]
    fn missing_key_is_reported_by_name() {
        let mut env = hook_env();
        env.remove("common_name");
        let err = connect_event(lookup_in(env)).unwrap_err();
        assert!(matches!(err, CliError::MissingEnv { key: "common_name" }));
    }

    #[test]
    fn non_numeric_timestamp_is_rejected() {
        let mut env = hook_env();
        env.insert("time_unix", "soon");
        let err = connect_event(lookup_in(env)).unwrap_err();
        assert!(matches!(err, CliError::MalformedEnv { key: "time_unix" }));
    }
}
