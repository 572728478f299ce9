// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// labelwerk-render — Label composition for Labelwerk.
//
// Provides the QR encoding service, the two-tier font service (preferred
// TrueType font, built-in bitmap fallback), the label layout engine and PNG
// output helpers.

pub mod output;
pub mod qr;
pub mod renderer;
pub mod text;

// Re-export the primary types so callers can use `labelwerk_render::LabelRenderer` etc.
pub use qr::{QrCodeEncoder, QrEncoder, QrParams};
pub use renderer::{LabelRenderer, Placement, PlacementKind};
pub use text::FontBook;
