// ── Backend member encoding ──
//
// Pool members are stored in the backend record as a comma-joined list of
// `member_<id>_<address>:<port>_<subnet_id>`. Older records omit the
// subnet (`member_<id>_<address>:<port>`). IPv6 addresses are bracketed
// so the port separator stays unambiguous.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use thiserror::Error;

const MEMBER_PREFIX: &str = "member";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid member encoding '{raw}': {reason}")]
pub struct MemberEncodingError {
    pub raw: String,
    pub reason: &'static str,
}

/// One decoded member entry of a backend pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberInfo {
    pub id: String,
    /// Address without brackets, canonicalized when it parses as an IP.
    pub address: String,
    pub port: u16,
    /// Absent for legacy three-field entries.
    pub subnet_id: Option<String>,
}

impl MemberInfo {
    pub fn new(
        id: impl Into<String>,
        address: &str,
        port: u16,
        subnet_id: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            address: canonical_address(address),
            port,
            subnet_id: subnet_id.filter(|s| !s.is_empty()),
        }
    }
}

impl fmt::Display for MemberInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{MEMBER_PREFIX}_{}_", self.id)?;
        if self.address.contains(':') {
            write!(f, "[{}]:{}", self.address, self.port)?;
        } else {
            write!(f, "{}:{}", self.address, self.port)?;
        }
        if let Some(ref subnet) = self.subnet_id {
            write!(f, "_{subnet}")?;
        }
        Ok(())
    }
}

impl FromStr for MemberInfo {
    type Err = MemberEncodingError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let err = |reason| MemberEncodingError {
            raw: raw.to_owned(),
            reason,
        };

        let parts: Vec<&str> = raw.trim().split('_').collect();
        let (id, endpoint, subnet) = match parts.as_slice() {
            [prefix, id, endpoint] if *prefix == MEMBER_PREFIX => (*id, *endpoint, None),
            [prefix, id, endpoint, subnet] if *prefix == MEMBER_PREFIX => {
                (*id, *endpoint, Some((*subnet).to_owned()))
            }
            [prefix, ..] if *prefix != MEMBER_PREFIX => return Err(err("missing member prefix")),
            _ => return Err(err("expected 3 or 4 '_'-separated fields")),
        };

        if id.is_empty() {
            return Err(err("empty member id"));
        }

        let (address, port) = endpoint
            .rsplit_once(':')
            .ok_or_else(|| err("missing port separator"))?;
        let address = address.trim_start_matches('[').trim_end_matches(']');
        if address.is_empty() {
            return Err(err("empty address"));
        }
        let port = port.parse::<u16>().map_err(|_| err("invalid port"))?;

        Ok(Self::new(id, address, port, subnet))
    }
}

/// Decode a comma-joined pool value. Unparseable entries are skipped.
pub fn decode_pool_members(value: &str) -> Vec<MemberInfo> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse::<MemberInfo>() {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed backend member entry");
                None
            }
        })
        .collect()
}

/// Strip brackets and normalize an IP literal; non-IP input passes through.
pub fn canonical_address(address: &str) -> String {
    let bare = address.trim().trim_start_matches('[').trim_end_matches(']');
    bare.parse::<IpAddr>()
        .map_or_else(|_| bare.to_owned(), |ip| ip.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn four_field_entry_round_trips() {
        let info = MemberInfo::new("m1", "10.0.0.10", 8080, Some("sub1".into()));
        let encoded = info.to_string();
        assert_eq!(encoded, "member_m1_10.0.0.10:8080_sub1");
        assert_eq!(encoded.parse::<MemberInfo>().unwrap(), info);
    }

    #[test]
    fn legacy_entry_has_no_subnet() {
        let info: MemberInfo = "member_m2_10.0.0.11:80".parse().unwrap();
        assert_eq!(info.id, "m2");
        assert_eq!(info.address, "10.0.0.11");
        assert_eq!(info.port, 80);
        assert_eq!(info.subnet_id, None);
    }

    #[test]
    fn ipv6_addresses_are_bracketed() {
        let info = MemberInfo::new("m3", "fd00::0010", 443, Some("sub6".into()));
        assert_eq!(info.address, "fd00::10");
        assert_eq!(info.to_string(), "member_m3_[fd00::10]:443_sub6");

        let decoded: MemberInfo = "member_m3_[fd00::10]:443_sub6".parse().unwrap();
        assert_eq!(decoded, info);
    }

    #[test]
    fn rejects_malformed_entries() {
        assert!("pool_m1_10.0.0.1:80".parse::<MemberInfo>().is_err());
        assert!("member_m1_10.0.0.1".parse::<MemberInfo>().is_err());
        assert!("member_m1_10.0.0.1:http_sub".parse::<MemberInfo>().is_err());
        assert!("member_m1_10.0.0.1:80_sub_extra".parse::<MemberInfo>().is_err());
    }

    #[test]
    fn pool_value_decoding_skips_garbage() {
        let members =
            decode_pool_members("member_a_10.0.0.1:80_s1, bogus ,member_b_10.0.0.2:80,");
        let ids: Vec<&str> = members.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(decode_pool_members(""), Vec::new());
    }
}
