// ── Capability validation ──
//
// Pure checks of API objects against what the backend can express.
// Every failure is user-facing and carries the exact message returned to
// the API caller.

use std::net::IpAddr;
use std::str::FromStr;

use strum::VariantNames;

use crate::error::CoreError;
use crate::model::{
    Algorithm, Field, HealthMonitor, HealthMonitorType, Member, Protocol, SessionPersistence,
    SessionPersistenceType,
};

fn display(value: &Field<String>) -> &str {
    value.as_option().map_or("None", String::as_str)
}

pub fn validate_protocol(protocol: &Field<String>) -> Result<(), CoreError> {
    match protocol.as_option() {
        Some(p) if Protocol::from_str(p).is_ok() => Ok(()),
        _ => Err(CoreError::unsupported(format!(
            "OVN provider does not support {} protocol",
            display(protocol)
        ))),
    }
}

pub fn validate_algorithm(algorithm: &Field<String>) -> Result<(), CoreError> {
    match algorithm.as_option() {
        Some(a) if Algorithm::from_str(a).is_ok() => Ok(()),
        _ => Err(CoreError::unsupported(format!(
            "OVN provider does not support {} algorithm",
            display(algorithm)
        ))),
    }
}

/// Absent persistence is fine; otherwise only `SOURCE_IP`.
pub fn validate_session_persistence(
    persistence: Option<&SessionPersistence>,
) -> Result<(), CoreError> {
    match persistence {
        None => Ok(()),
        Some(sp) if SessionPersistenceType::from_str(&sp.kind).is_ok() => Ok(()),
        Some(sp) => Err(CoreError::unsupported(format!(
            "OVN provider does not support {} session persistence. \
             Only SOURCE_IP type is supported.",
            sp.kind
        ))),
    }
}

pub fn validate_allowed_cidrs(cidrs: &Field<Vec<String>>) -> Result<(), CoreError> {
    if cidrs.items().is_empty() {
        Ok(())
    } else {
        Err(CoreError::unsupported(
            "OVN provider does not support allowed_cidrs option",
        ))
    }
}

// ── Members ─────────────────────────────────────────────────────────

/// Whether the member asks for a separate monitor endpoint.
pub fn monitor_options_requested(member: &Member) -> bool {
    member.monitor_address.non_empty().is_some()
        || member.monitor_port.as_option().is_some_and(|port| *port != 0)
}

pub fn validate_member_monitor_options(member: &Member) -> Result<(), CoreError> {
    if monitor_options_requested(member) {
        return Err(CoreError::unsupported(
            "OVN Load Balancer does not support different member monitor address or port.",
        ));
    }
    Ok(())
}

fn parse_ip(raw: &str) -> Option<IpAddr> {
    let bare = raw.trim().trim_start_matches('[').trim_end_matches(']');
    bare.split('/').next().and_then(|ip| ip.parse().ok())
}

/// Whether `address` has a different IP family than a single-family VIP set.
///
/// A mixed-family VIP set accepts members of either family. Unparseable
/// input never counts as a conflict.
pub fn ip_version_differs(vips: &[&str], address: &str) -> bool {
    let mut families = vips.iter().filter_map(|vip| parse_ip(vip)).map(|ip| ip.is_ipv4());
    let Some(vip_is_v4) = families.next() else {
        return false;
    };
    if families.any(|is_v4| is_v4 != vip_is_v4) {
        return false;
    }
    parse_ip(address).is_some_and(|ip| ip.is_ipv4() != vip_is_v4)
}

// ── Health monitors ─────────────────────────────────────────────────

/// Backend capability first; on create the type must also be present and
/// supported.
pub fn validate_health_monitor(
    hm: &HealthMonitor,
    health_checks_supported: bool,
    is_create: bool,
) -> Result<(), CoreError> {
    if !health_checks_supported {
        return Err(CoreError::unsupported(
            "OVN Load Balancer supports Health Check provider from version 2.12. \
             Upgrade OVN in order to use it.",
        ));
    }
    if !is_create {
        return Ok(());
    }
    if hm.kind.is_unset() {
        return Err(CoreError::unsupported(
            "OVN provider health monitor type not specified.",
        ));
    }
    match hm.kind.as_option() {
        Some(kind) if HealthMonitorType::from_str(kind).is_ok() => Ok(()),
        _ => Err(CoreError::unsupported(format!(
            "OVN provider does not support {} health monitor type. Supported types: {}",
            display(&hm.kind),
            HealthMonitorType::VARIANTS.join(", ")
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn text(v: &str) -> Field<String> {
        Field::Value(v.to_owned())
    }

    #[test]
    fn protocols() {
        for p in ["TCP", "UDP", "SCTP"] {
            assert!(validate_protocol(&text(p)).is_ok());
        }
        let err = validate_protocol(&text("HTTP")).unwrap_err();
        assert_eq!(err.to_string(), "OVN provider does not support HTTP protocol");
        assert!(validate_protocol(&Field::Unset).is_err());
    }

    #[test]
    fn algorithms() {
        assert!(validate_algorithm(&text("ROUND_ROBIN")).is_ok());
        assert!(validate_algorithm(&text("SOURCE_IP_PORT")).is_ok());
        let err = validate_algorithm(&text("LEAST_CONNECTIONS")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "OVN provider does not support LEAST_CONNECTIONS algorithm"
        );
    }

    #[test]
    fn session_persistence_only_source_ip() {
        assert!(validate_session_persistence(None).is_ok());
        assert!(validate_session_persistence(Some(&SessionPersistence::of_kind("SOURCE_IP"))).is_ok());
        let err = validate_session_persistence(Some(&SessionPersistence::of_kind("HTTP_COOKIE")))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "OVN provider does not support HTTP_COOKIE session persistence. \
             Only SOURCE_IP type is supported."
        );
    }

    #[test]
    fn allowed_cidrs_must_be_empty() {
        assert!(validate_allowed_cidrs(&Field::Unset).is_ok());
        assert!(validate_allowed_cidrs(&Field::Null).is_ok());
        assert!(validate_allowed_cidrs(&Field::Value(Vec::new())).is_ok());
        assert!(validate_allowed_cidrs(&Field::Value(vec!["10.0.0.0/8".into()])).is_err());
    }

    #[test]
    fn monitor_options() {
        let mut member = Member::default();
        assert!(!monitor_options_requested(&member));

        member.monitor_address = Field::Null;
        member.monitor_port = Field::Value(0);
        assert!(!monitor_options_requested(&member));

        member.monitor_port = Field::Value(8080);
        assert!(monitor_options_requested(&member));
        assert!(validate_member_monitor_options(&member).is_err());

        member.monitor_port = Field::Unset;
        member.monitor_address = text("10.0.0.99");
        assert!(monitor_options_requested(&member));
    }

    #[test]
    fn ip_version_conflicts() {
        assert!(ip_version_differs(&["10.0.0.5"], "fd00::10"));
        assert!(!ip_version_differs(&["10.0.0.5"], "10.0.0.10"));
        assert!(ip_version_differs(&["fd00::5"], "10.0.0.10"));
        assert!(!ip_version_differs(&["[fd00::5]"], "[fd00::10]"));
    }

    #[test]
    fn mixed_vip_set_accepts_any_family() {
        assert!(!ip_version_differs(&["10.0.0.5", "fd00::5"], "10.0.0.10"));
        assert!(!ip_version_differs(&["10.0.0.5", "fd00::5"], "fd00::10"));
    }

    #[test]
    fn unparseable_input_is_not_a_conflict() {
        assert!(!ip_version_differs(&[], "10.0.0.10"));
        assert!(!ip_version_differs(&["10.0.0.5"], "not-an-ip"));
    }

    #[test]
    fn health_monitor_support() {
        let mut hm = HealthMonitor {
            id: "hm1".into(),
            pool_id: "p1".into(),
            ..HealthMonitor::default()
        };

        let err = validate_health_monitor(&hm, false, false).unwrap_err();
        assert!(err.to_string().starts_with("OVN Load Balancer supports Health Check"));

        let err = validate_health_monitor(&hm, true, true).unwrap_err();
        assert_eq!(err.to_string(), "OVN provider health monitor type not specified.");
        assert!(validate_health_monitor(&hm, true, false).is_ok());

        hm.kind = text("HTTP");
        let err = validate_health_monitor(&hm, true, true).unwrap_err();
        assert_eq!(
            err.to_string(),
            "OVN provider does not support HTTP health monitor type. \
             Supported types: TCP, UDP-CONNECT, SCTP"
        );

        hm.kind = text("UDP-CONNECT");
        assert!(validate_health_monitor(&hm, true, true).is_ok());
    }
}
