// Copyright (C) 2025 Dayton Fishell
// VGA Nyancat Cycle Model
// This file is part of VGA Nyancat.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

use std::hint::black_box;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use nyancat_core::{AnalyzerSet, AnimationTables, SimConfig, Simulator};

fn simulator(analyzers: AnalyzerSet) -> Simulator {
    let config = SimConfig {
        analyzers,
        ..SimConfig::default()
    };
    match Simulator::new(config, AnimationTables::procedural()) {
        Ok(sim) => sim,
        Err(err) => panic!("default configuration rejected: {err}"),
    }
}

fn bench_chunk(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk");
    group.throughput(Throughput::Elements(Simulator::CHUNK_CLOCKS));

    let mut bare = simulator(AnalyzerSet::empty());
    group.bench_function("no analyzers", |b| {
        b.iter(|| {
            bare.run_chunk();
            black_box(bare.clocks())
        })
    });

    let mut checked = simulator(AnalyzerSet::all());
    group.bench_function("all analyzers", |b| {
        b.iter(|| {
            checked.run_chunk();
            black_box(checked.clocks())
        })
    });
    group.finish();
}

fn bench_design_tick(c: &mut Criterion) {
    let mut sim = simulator(AnalyzerSet::empty());
    c.bench_function("step", |b| b.iter(|| black_box(sim.step())));
}

criterion_group!(benches, bench_chunk, bench_design_tick);
criterion_main!(benches);
