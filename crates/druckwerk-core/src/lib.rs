// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Druckwerk — shared types and error definitions for the IPP wire codec.

pub mod error;
pub mod types;

pub use error::{Result, WireError};
pub use types::*;
