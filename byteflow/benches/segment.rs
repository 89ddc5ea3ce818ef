// SPDX-License-Identifier: Apache-2.0

use byteflow::pool::{default_pool, SegmentPool};
use byteflow::segment::SEGMENT_SIZE;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

fn sample_data() -> Vec<u8> {
	(0..SEGMENT_SIZE as u32).map(|i| (i % 251) as u8).collect()
}

fn alloc_segment(c: &mut Criterion) {
	c.bench_function("take_from_pool", |b| {
		b.iter(|| {
			let seg = default_pool().take();
			default_pool().recycle(seg);
		})
	});
}

fn write_segment(c: &mut Criterion) {
	let data = sample_data();
	let mut group = c.benchmark_group("write_segment");

	group.bench_function("fill empty", |b| {
		b.iter_batched(
			|| default_pool().take(),
			|mut seg| {
				let n = seg.push_slice(&data);
				default_pool().recycle(seg);
				n
			},
			BatchSize::PerIteration,
		)
	});

	group.bench_function("fill after partial consume", |b| {
		b.iter_batched(
			|| {
				let mut seg = default_pool().take();
				seg.push_slice(&data[..data.len() / 2]);
				seg.consume(data.len() / 4);
				seg
			},
			|mut seg| {
				let n = seg.push_slice(&data);
				default_pool().recycle(seg);
				n
			},
			BatchSize::PerIteration,
		)
	});
	group.finish();
}

fn read_segment(c: &mut Criterion) {
	let data = sample_data();
	let mut group = c.benchmark_group("read_segment");
	let mut target = vec![0u8; SEGMENT_SIZE];

	group.bench_function("owner", |b| {
		b.iter_batched_ref(
			|| {
				let mut seg = default_pool().take();
				seg.push_slice(&data);
				seg
			},
			|seg| seg.pop_into_slice(&mut target),
			BatchSize::PerIteration,
		)
	});

	group.bench_function("shared copy", |b| {
		b.iter_batched_ref(
			|| {
				let mut seg = default_pool().take();
				seg.push_slice(&data);
				seg.shared_copy()
			},
			|seg| seg.pop_into_slice(&mut target),
			BatchSize::PerIteration,
		)
	});
	group.finish();
}

fn write_to(c: &mut Criterion) {
	let data = sample_data();
	c.bench_function("write_to moves bytes between segments", |b| {
		b.iter_batched(
			|| {
				let mut src = default_pool().take();
				src.push_slice(&data);
				let dst = default_pool().take();
				(src, dst)
			},
			|(mut src, mut dst)| {
				let n = src.size();
				src.write_to(&mut dst, n);
				default_pool().recycle(src);
				default_pool().recycle(dst);
			},
			BatchSize::PerIteration,
		)
	});
}

fn compact_into(c: &mut Criterion) {
	let data = sample_data();
	c.bench_function("compact_into merges a drained segment", |b| {
		b.iter_batched(
			|| {
				let mut prev = default_pool().take();
				prev.push_slice(&data[..data.len() / 4]);
				let mut cur = default_pool().take();
				cur.push_slice(&data[..data.len() / 4]);
				cur.consume(data.len() / 8);
				(prev, cur)
			},
			|(mut prev, mut cur)| {
				cur.compact_into(&mut prev);
				default_pool().recycle(prev);
				default_pool().recycle(cur);
			},
			BatchSize::PerIteration,
		)
	});
}

fn push(c: &mut Criterion) {
	let data = sample_data();
	c.bench_function("write_u8 loop", |b| {
		b.iter_batched(
			|| default_pool().take(),
			|mut seg| {
				for &byte in &data {
					seg.write_u8(byte);
				}
				default_pool().recycle(seg);
			},
			BatchSize::PerIteration,
		)
	});
}

criterion_group!(benches, alloc_segment, write_segment, read_segment, write_to, compact_into, push);
criterion_main!(benches);
