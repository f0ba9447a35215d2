// ─────────────────────────────────────────────────────────────────────
// Nebulous — Property-Based Tests (proptest) for nebula-core
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for nebula-core using proptest.
//!
//! Covers: shell membership, partition invariants, sampler support and
//! determinism, polytrope normalisation.

use nebula_core::geometry::{partition, sphere};
use nebula_core::pdf::{lognormal, lognormal_pareto, mlp, normal, polytrope, PolytropeMean};
use nebula_math::grid::radial_distance;
use nebula_types::state::CubeDim;
use proptest::prelude::*;

// ── Geometry Properties ──────────────────────────────────────────────

proptest! {
    /// Every shell cell lies within the absolute radii, and every cell
    /// within the radii is in the shell.
    #[test]
    fn shell_membership_exact(n in 4usize..16, in_rad in 0.0f64..0.5, width in 0.1f64..0.6) {
        let dim = CubeDim::cubic(n);
        let out_rad = in_rad + width;
        let shell = sphere(dim, in_rad, out_rad, 0).unwrap();
        let r = radial_distance(dim);
        let half = 0.5 * n as f64;
        let mask = shell.to_mask();
        for (d, m) in r.iter().zip(mask.iter()) {
            let inside = *d >= in_rad * half && *d <= out_rad * half;
            prop_assert_eq!(inside, *m);
        }
    }

    /// Partitions are disjoint, cover the input, and reproduce with the seed.
    #[test]
    fn partition_covers_input(n in 4usize..14, p in 0.0f64..1.0, seed in any::<u64>()) {
        let loc = sphere(CubeDim::cubic(n), 0.0, 1.0, 0).unwrap();
        let parts = partition(&loc, &[p, 1.0 - p], seed).unwrap();
        prop_assert_eq!(parts[0].len() + parts[1].len(), loc.len());

        let a = parts[0].to_mask();
        let b = parts[1].to_mask();
        let full = loc.to_mask();
        for ((x, y), f) in a.iter().zip(b.iter()).zip(full.iter()) {
            prop_assert!(!(*x && *y));
            prop_assert_eq!(*x || *y, *f);
        }
        prop_assert_eq!(partition(&loc, &[p, 1.0 - p], seed).unwrap(), parts);
    }
}

// ── Sampler Properties ───────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Samplers are positive on the cell-set, zero elsewhere, and
    /// reproducible from their seed.
    #[test]
    fn samplers_supported_on_loc(mean in 1.0f64..1e4, sigma in 0.05f64..1.5, seed in any::<u64>()) {
        let loc = sphere(CubeDim::cubic(10), 0.2, 0.9, 0).unwrap();
        let mask = loc.to_mask();
        for cube in [
            lognormal(&loc, mean, sigma, seed).unwrap(),
            lognormal_pareto(&loc, mean, sigma, 0.5, seed).unwrap(),
            mlp(&loc, mean, sigma, 2.5, seed).unwrap(),
            normal(&loc, mean, sigma * mean, seed).unwrap(),
        ] {
            for (v, m) in cube.iter().zip(mask.iter()) {
                if *m {
                    prop_assert!(*v >= 0.0 && v.is_finite());
                } else {
                    prop_assert_eq!(*v, 0.0);
                }
            }
        }
        prop_assert_eq!(
            lognormal(&loc, mean, sigma, seed).unwrap(),
            lognormal(&loc, mean, sigma, seed).unwrap()
        );
    }

    /// The power-lognormal sample mean is the requested mean.
    #[test]
    fn pareto_mean_exact(mean in 1.0f64..1e5, c in 0.2f64..5.0, seed in any::<u64>()) {
        let loc = sphere(CubeDim::cubic(10), 0.0, 1.0, 0).unwrap();
        let cube = lognormal_pareto(&loc, mean, 0.4, c, seed).unwrap();
        let values = loc.gather(&cube);
        let m = values.iter().sum::<f64>() / values.len() as f64;
        prop_assert!((m - mean).abs() < 1e-9 * mean);
    }

    /// MLP rejects every alpha ≤ 1.
    #[test]
    fn mlp_alpha_domain(alpha in -5.0f64..1.0) {
        let loc = sphere(CubeDim::cubic(6), 0.0, 1.0, 0).unwrap();
        prop_assert!(mlp(&loc, 1.0, 0.3, alpha, 1).is_err());
    }

    /// Both polytrope normalisations hit the target mean.
    #[test]
    fn polytrope_normalised(index in 0.0f64..2.0, seed in any::<u64>()) {
        let loc = sphere(CubeDim::cubic(10), 0.2, 0.9, 0).unwrap();
        let den = lognormal(&loc, 1000.0, 0.5, seed).unwrap();
        let n = loc.gather(&den);

        let geo = polytrope(&den, index, 1e4, PolytropeMean::Geometric, Some(&loc)).unwrap();
        let t = loc.gather(&geo);
        let m = t.iter().sum::<f64>() / t.len() as f64;
        prop_assert!((m - 1e4).abs() < 1e-6 * 1e4);

        let wtd = polytrope(&den, index, 1e4, PolytropeMean::Weighted, Some(&loc)).unwrap();
        let t = loc.gather(&wtd);
        let w = n.iter().zip(&t).map(|(a, b)| a * b).sum::<f64>() / n.iter().sum::<f64>();
        prop_assert!((w - 1e4).abs() < 1e-6 * 1e4);
    }
}
