//! User- and approver-facing message text.
//!
//! Plain text only; transports that use markup must send these without a
//! parse mode.

use std::fmt::Write as _;

use crate::pool::StockLevels;
use crate::registry::PendingRequest;
use crate::types::{ConfigFile, RecipientId};

/// Sent to the approver when a request finds the pool empty.
pub const OUT_OF_STOCK_ALERT: &str = "⚠️ Attention! No config files are left in the pool.";

/// Shown to a requester when the pool is empty.
pub const OUT_OF_STOCK_REPLY: &str = "⚠️ Sorry, all configs have run out for now.\n\
     The administrator has been notified, please try again later.";

/// Shown to a requester whose request reached the approver.
pub const SUBMITTED_REPLY: &str = "✅ Your request has been sent to the administrator. \
     Expect a decision within a few minutes.";

/// Shown to a requester who already has an open request.
pub const ALREADY_PENDING_REPLY: &str =
    "⏳ You already have a request waiting for a decision. Please wait for it.";

/// Shown to a requester when the approver could not be reached.
pub const PROMPT_FAILED_REPLY: &str =
    "⚠️ Could not reach the administrator right now. Please try again later.";

/// Sent to a requester whose request was rejected.
pub const REJECTED_NOTICE: &str = "❌ Your config request was rejected by the administrator.";

/// Sent to a requester when delivery or storage failed.
pub const ERROR_NOTICE: &str =
    "⚠️ Something went wrong while processing your request. Please try again later.";

/// Sent to a requester whose request went unanswered for too long.
pub const EXPIRED_NOTICE: &str =
    "⌛ Your config request expired without a decision. You can send a new one.";

/// The decision prompt shown to the approver.
#[must_use]
pub fn approval_prompt(pending: &PendingRequest, pending_count: usize) -> String {
    let requester = &pending.requester;
    let username = requester
        .username
        .as_deref()
        .map_or_else(|| "no username".to_owned(), |u| format!("@{u}"));
    let mut text = String::from("🆕 New config request:\n");
    let _ = writeln!(text, "👤 Name: {}", requester.full_name);
    let _ = writeln!(text, "📌 Username: {username}");
    let _ = writeln!(text, "🆔 ID: {}", requester.id);
    let _ = writeln!(
        text,
        "🕒 Time: {}",
        pending.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(text, "📁 File: {}", pending.file);
    let _ = write!(text, "📋 Pending requests: {pending_count}");
    text
}

/// Caption attached to a delivered file.
#[must_use]
pub fn delivery_caption(file: &ConfigFile) -> String {
    format!("Your config: {file}\nSave this file and import it into WireGuard.")
}

/// Approver notice after a successful delivery.
#[must_use]
pub fn delivered_notice(file: &ConfigFile, requester: RecipientId) -> String {
    format!("✅ Config {file} issued to user ID: {requester}")
}

/// Approver notice after a rejection.
#[must_use]
pub fn rejected_notice(requester: RecipientId) -> String {
    format!("❌ Request from user ID: {requester} rejected")
}

/// Approver notice when a delivery failed and the file went back to the pool.
#[must_use]
pub fn delivery_failed_notice(file: &ConfigFile, requester: RecipientId, reason: &str) -> String {
    format!(
        "🚫 Could not deliver {file} to user ID: {requester} ({reason}).\n\
         The file was returned to the pool; contact the user another way or let them retry."
    )
}

/// Approver notice when the store lost or could not move a file.
#[must_use]
pub fn store_inconsistency_notice(
    file: &ConfigFile,
    requester: RecipientId,
    reason: &str,
) -> String {
    format!("🚫 Store error for {file} (user ID: {requester}): {reason}")
}

/// Approver notice for a decision on a request that no longer exists.
#[must_use]
pub fn already_handled_notice(requester: RecipientId) -> String {
    format!("⚠️ Request from user ID: {requester} was not found or already handled")
}

/// Approver notice after stale requests were released.
#[must_use]
pub fn expired_summary(count: usize) -> String {
    format!("⌛ {count} pending request(s) expired and their configs were returned to the pool.")
}

/// Approver-facing stock summary.
#[must_use]
pub fn status_report(stock: &StockLevels, pending: usize) -> String {
    format!(
        "📦 Available: {}\n🔒 Reserved: {}\n📤 Issued: {}\n📋 Pending requests: {pending}",
        stock.available, stock.reserved, stock.consumed
    )
}
