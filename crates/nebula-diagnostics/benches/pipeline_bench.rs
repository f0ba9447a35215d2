use criterion::{criterion_group, criterion_main, Criterion};
use nebula_core::geometry::sphere;
use nebula_core::pdf::lognormal;
use nebula_diagnostics::atomic::SyntheticAtomicData;
use nebula_diagnostics::emission_measure::{emission_measure, EmissionMeasureOptions};
use nebula_diagnostics::emissivity::{compute_emissivity, compute_sky_intensity, EmissivityInputs};
use nebula_diagnostics::ion::density_diagnostic;
use nebula_diagnostics::line_ratio::{invert_line_ratio, InversionOptions};
use nebula_math::smooth::Smoothing;
use nebula_types::state::{CubeDim, SkyValue, VolumeField};
use std::hint::black_box;

fn bench_density_pipeline(c: &mut Criterion) {
    let atomic = SyntheticAtomicData::default();
    let ion = density_diagnostic("SII").unwrap();
    let loc = sphere(CubeDim::cubic(30), 0.3, 0.9, 0).unwrap();
    let den = lognormal(&loc, 1.0e3, 0.8, 5007).unwrap();
    let inputs = EmissivityInputs::new(1.0e4, &den).with_active_cells(&loc);
    let smoothing = Smoothing::Gaussian { sigma: 1.0 };

    let mut group = c.benchmark_group("density_pipeline_30");
    group.sample_size(20);
    group.bench_function("emissivity", |b| {
        b.iter(|| compute_emissivity(&atomic, ion, black_box(&inputs)))
    });

    let volumes = compute_emissivity(&atomic, ion, &inputs).unwrap();
    group.bench_function("projection", |b| {
        b.iter(|| compute_sky_intensity(black_box(&volumes), smoothing))
    });

    let sky = compute_sky_intensity(&volumes, smoothing).unwrap();
    group.bench_function("inversion", |b| {
        b.iter(|| {
            invert_line_ratio(
                &atomic,
                ion,
                black_box(&sky),
                Some(SkyValue::Uniform(1.0e4)),
                InversionOptions::default(),
            )
        })
    });
    group.finish();
}

fn bench_emission_measure(c: &mut Criterion) {
    let loc = sphere(CubeDim::cubic(30), 0.3, 0.9, 0).unwrap();
    let den = lognormal(&loc, 1.0e3, 0.8, 5007).unwrap();
    let tem = lognormal(&loc, 1.0e4, 0.2, 8938).unwrap();
    let options = EmissionMeasureOptions {
        temperature: Some(&tem),
        ..Default::default()
    };

    c.bench_function("emission_measure_30_weighted", |b| {
        b.iter(|| emission_measure(VolumeField::Cube(black_box(&den)), &options))
    });
}

criterion_group!(benches, bench_density_pipeline, bench_emission_measure);
criterion_main!(benches);
