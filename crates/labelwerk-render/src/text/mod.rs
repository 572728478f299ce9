// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text module — font resolution, measurement and drawing.

pub mod bitmap;
pub mod font;

pub use font::FontBook;
