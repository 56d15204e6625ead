// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod alert;
pub mod emergency;
pub mod user;

pub use alert::Alert;
pub use emergency::{AlertColor, EmergencyState, Location};
pub use user::User;
