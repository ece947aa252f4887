// ── DVR membership tracking ──
//
// Advisory requests telling the applier a member joined or left a pool,
// so distributed floating-IP traffic can be centralized or released.

use serde_json::{Value, json};

use crate::encoding::MemberInfo;
use crate::model::Member;
use crate::request::normalize::{member_delete, member_dvr};
use crate::request::{ChangeRequest, DvrAction};

pub fn member_added(member: &Member, subnet_id: &str) -> ChangeRequest {
    member_dvr(
        &member.id,
        member.address.to_json(),
        &member.pool_id,
        Some(subnet_id),
        DvrAction::MemberAdded,
    )
}

pub fn member_deleted(member: &Member, subnet_id: &str) -> ChangeRequest {
    member_dvr(
        &member.id,
        member.address.to_json(),
        &member.pool_id,
        Some(subnet_id),
        DvrAction::MemberDeleted,
    )
}

/// Removal of a member known only from its backend encoding.
pub fn recorded_member_deleted(info: &MemberInfo, pool_id: &str) -> ChangeRequest {
    member_dvr(
        &info.id,
        Value::from(info.address.as_str()),
        pool_id,
        info.subnet_id.as_deref(),
        DvrAction::MemberDeleted,
    )
}

/// `member_delete` for a member known only from its backend encoding.
pub fn recorded_member_delete(info: &MemberInfo, pool_id: &str) -> ChangeRequest {
    member_delete(
        &info.id,
        Value::from(info.address.as_str()),
        json!(info.port),
        pool_id,
        info.subnet_id.as_deref(),
    )
}
