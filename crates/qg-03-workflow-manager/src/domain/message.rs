//! # Approval Message
//!
//! The bytes an approver signs. Canonical JSON (keys sorted, no spaces):
//!
//! ```text
//! {"approver":"0x..","chain_id":1,"context_digest":"0x..",
//!  "domain":"quorum-gate/approval/v1","signed_at":..,"workflow_id":".."}
//! ```
//!
//! Binding the workflow id and the context digest keeps a signature from
//! being replayed on another workflow; binding `signed_at` ties the
//! freshness timestamp to the signature.

use serde_json::json;
use shared_types::{format_address, Address, ChainId, Hash, Timestamp};
use uuid::Uuid;

/// Domain separator.
pub const APPROVAL_DOMAIN: &str = "quorum-gate/approval/v1";

pub fn approval_message(
    workflow_id: &Uuid,
    approver: &Address,
    chain_id: ChainId,
    context_digest: &Hash,
    signed_at: Timestamp,
) -> Vec<u8> {
    json!({
        "domain": APPROVAL_DOMAIN,
        "workflow_id": workflow_id.to_string(),
        "approver": format_address(approver),
        "chain_id": chain_id,
        "context_digest": format!("0x{}", hex::encode(context_digest)),
        "signed_at": signed_at,
    })
    .to_string()
    .into_bytes()
}
