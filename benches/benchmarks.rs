use bandscale::{
    sensors::{Landsat9L2, Sensor},
    Band, BandScaler, Collection, Image, ImageTransform,
};
use chrono::{Days, NaiveDate};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

const SIZE: (usize, usize) = (1024, 1024);
const N_SCENES: u64 = 4;

fn level2_scene(id: &str) -> Image {
    (1..=7)
        .map(|idx| format!("SR_B{idx}"))
        .chain(["ST_B10", "QA_PIXEL"].map(String::from))
        .try_fold(Image::new(id), |image, name| {
            image.with_band(name, Band::filled(SIZE, 10000.))
        })
        .unwrap()
}

fn bench_scale_image(c: &mut Criterion) {
    let scaler = BandScaler::new(Landsat9L2::scale_rules().unwrap());
    let image = level2_scene("LC09_038033_20220109");
    c.bench_function("scale_image", |b| {
        b.iter(|| scaler.apply(black_box(&image)).unwrap())
    });
}

fn bench_map_collection(c: &mut Criterion) {
    let scaler = BandScaler::new(Landsat9L2::scale_rules().unwrap());
    let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
    let collection = (0..N_SCENES).fold(Collection::new(Landsat9L2::COLLECTION_ID), |collection, idx| {
        collection.with_image(
            start + Days::new(idx * 16),
            level2_scene(&format!("LC09_{idx}")),
        )
    });
    c.bench_function("map_collection", |b| {
        b.iter(|| black_box(&collection).map(&scaler).into_collection().unwrap())
    });
}

criterion_group!(benches, bench_scale_image, bench_map_collection);
criterion_main!(benches);
