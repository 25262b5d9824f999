// ── Client-side field checks ──
//
// Run on the final wire body (after an update has been merged with the
// stored entity) and before anything leaves the process.

use fwdeck_api::types::{InterfaceBody, NatRuleBody, RuleBody, ZoneBody};

use crate::error::CoreError;
use crate::model::rule::MAX_COMMENT_LEN;

pub(crate) fn check_rule(body: &RuleBody) -> Result<(), CoreError> {
    let len = body.comment.chars().count();
    if len > MAX_COMMENT_LEN {
        return Err(CoreError::validation(format!(
            "Comment must be at most {MAX_COMMENT_LEN} characters ({len} given)"
        )));
    }
    Ok(())
}

pub(crate) fn check_nat_rule(body: &NatRuleBody) -> Result<(), CoreError> {
    if body.name.trim().is_empty() {
        return Err(CoreError::validation("NAT rule name is required"));
    }
    if body.natto_ip.trim().is_empty() {
        return Err(CoreError::validation("NAT IP is required"));
    }
    Ok(())
}

pub(crate) fn check_zone(body: &ZoneBody) -> Result<(), CoreError> {
    if body.name.trim().is_empty() {
        return Err(CoreError::validation("Zone name is required"));
    }
    Ok(())
}

pub(crate) fn check_interface(body: &InterfaceBody) -> Result<(), CoreError> {
    if body.name.trim().is_empty() {
        return Err(CoreError::validation("Interface name is required"));
    }
    Ok(())
}
