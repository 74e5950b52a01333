//! Confgate Telegram Bot - hands out single-use VPN config files.
//!
//! Users ask for a file with `/get_config`; the approver gets a prompt with
//! Approve / Reject buttons and the decision is carried out by
//! [`confgate_core::ApprovalBroker`]. This crate is only the transport: a
//! [`NotificationChannel`](confgate_core::NotificationChannel) over the Bot
//! API plus command and button dispatch.
//!
//! Usable as a library or as the standalone `confgate` binary.

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod bot;
pub mod callback;
pub mod channel;
pub mod config;
pub mod error;
pub mod handler;
