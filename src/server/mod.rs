// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The long-running server: datagram ingress, the HTTP control surface,
//! the reaper/drain worker, and the supervisor that composes them.

pub mod http;
pub mod ingress;
pub mod reaper;
pub mod supervisor;
