// ─────────────────────────────────────────────────────────────────────
// Nebulous — Experiments
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Parameter sweeps over synthetic nebulae.
//!
//! Filling factor (density, temperature), abundance discrepancy factor
//! (density, temperature), both again with a temperature tied to the
//! density, and polytropic temperature bias. Every driver
//! returns a [`table::StatsTable`] with one row per sweep step.

pub mod adf;
pub mod correlated;
pub mod filling_factor;
pub mod nebula;
pub mod sweep;
pub mod table;
pub mod temperature_bias;
