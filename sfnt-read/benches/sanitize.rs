use std::collections::HashMap;

use criterion::{criterion_group, criterion_main, Criterion};
use sfnt_read::sanitize::{sanitize_font, SanitizeOptions};
use sfnt_read::tables::gpos::{PairPos, PositionLookup, SinglePos};
use sfnt_read::{FontRef, TableProvider};
use sfnt_test_data::gpos;

// a GPOS table with many lookups, each sharing the same subtables
fn make_font() -> Vec<u8> {
    let single = gpos::lookup(1, &[gpos::SINGLEPOSFORMAT1, gpos::SINGLEPOSFORMAT2]);
    let pair = gpos::lookup(2, &[gpos::PAIRPOSFORMAT1, gpos::PAIRPOSFORMAT2]);
    let mut lookups: Vec<&[u8]> = Vec::new();
    for _ in 0..200 {
        lookups.push(&single);
        lookups.push(&pair);
    }
    let lookup_list = gpos::lookup_list(&lookups);
    let table = sfnt_test_data::be_buffer! { 1u16, 0u16, 0u16, 0u16, 10u16 }
        .extend_bytes(&lookup_list);
    sfnt_test_data::sfnt(&[(sfnt_read::tables::gpos::TAG, table.as_slice())])
}

pub fn sanitize_check_lookups(c: &mut Criterion) {
    let bytes = make_font();
    let font = FontRef::new(&bytes).unwrap();

    c.bench_function("sanitize_font", |b| {
        b.iter(|| sanitize_font(&font, &SanitizeOptions::default()))
    });

    c.bench_function("sanitized_walk", |b| {
        b.iter(|| {
            let gpos = font.gpos().unwrap().sanitize().unwrap();
            count_formats(&gpos.lookup_list().unwrap())
        })
    });

    c.bench_function("unsanitized_walk", |b| {
        b.iter(|| {
            let gpos = font.gpos().unwrap();
            count_formats(&gpos.lookup_list().unwrap())
        })
    });
}

fn count_formats(lookups: &sfnt_read::tables::gpos::PositionLookupList) -> HashMap<(u16, u16), usize> {
    let mut counts = HashMap::new();
    let mut add = |key| {
        *counts.entry(key).or_insert(0usize) += 1;
    };
    for lookup in lookups.lookups() {
        match lookup.unwrap() {
            PositionLookup::Single(lookup) => lookup.subtables().for_each(|sub| match sub.unwrap() {
                SinglePos::Format1(_) => add((1, 1)),
                SinglePos::Format2(_) => add((1, 2)),
            }),
            PositionLookup::Pair(lookup) => lookup.subtables().for_each(|sub| match sub.unwrap() {
                PairPos::Format1(_) => add((2, 1)),
                PairPos::Format2(_) => add((2, 2)),
            }),
            other => add((other.lookup_type(), 0)),
        }
    }
    counts
}

criterion_group!(benches, sanitize_check_lookups);
criterion_main!(benches);
