use carindex::CarIndexer;
use cid::Cid;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use multihash::Multihash;
use std::io::Cursor;

fn put_uvarint(out: &mut Vec<u8>, mut v: u64) {
    while v >= 0x80 {
        out.push((v as u8) | 0x80);
        v >>= 7;
    }
    out.push(v as u8);
}

fn build_car(blocks: usize, payload: usize) -> Vec<u8> {
    let mut out = Vec::new();
    put_uvarint(&mut out, 1);
    out.push(0xa0);
    for i in 0..blocks {
        let mh = Multihash::<64>::wrap(0x12, &[(i % 251) as u8; 32]).unwrap();
        let mut body = if i % 2 == 0 {
            Cid::new_v1(0x55, mh).to_bytes()
        } else {
            mh.to_bytes()
        };
        body.resize(body.len() + payload, 0x42);
        put_uvarint(&mut out, body.len() as u64);
        out.extend_from_slice(&body);
    }
    out
}

fn bench_index(c: &mut Criterion) {
    let small = build_car(10_000, 64);
    let large = build_car(64, 1024 * 1024);

    c.bench_function("index_10k_small_blocks", |b| {
        b.iter(|| CarIndexer::new(Cursor::new(black_box(&small[..]))).unwrap().count())
    });

    c.bench_function("index_64_1mb_blocks", |b| {
        b.iter(|| CarIndexer::new(Cursor::new(black_box(&large[..]))).unwrap().count())
    });
}

criterion_group!(benches, bench_index);
criterion_main!(benches);
