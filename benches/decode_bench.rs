use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pdbmsf::info::{Guid, InfoStreamHeader, PdbVersion};
use pdbmsf::msf::{PageArena, StreamDirectory, StreamInfo, Superblock};
use pdbmsf::tpi::{PointerAttributes, TpiVersion, TypeRecordBody, TypeStreamHeader, NO_STREAM, WIDE_HEADER_SIZE};
use pdbmsf::{ParseOptions, PdbFile, TypeIndex, TypeRecord, TypeRecordKind};

const PAGE_SIZE: usize = 4096;

/// Container with an info stream, `records` pointer records and a few
/// opaque streams, laid out contiguously after the free page map.
fn synthetic_pdb(records: u32) -> Vec<u8> {
    let mut info = Vec::new();
    InfoStreamHeader {
        version:   PdbVersion::VC70,
        signature: 0,
        age:       1,
        unique_id: Guid([0x5a; 16]),
    }
    .write(&mut info)
    .unwrap();

    let mut body = Vec::new();
    for i in 0..records {
        TypeRecord::new(
            TypeRecordKind::POINTER,
            TypeRecordBody::Pointer { referent: TypeIndex(0x1000 + i / 2), attributes: PointerAttributes(0x1000c) },
        )
        .unwrap()
        .write(&mut body)
        .unwrap();
    }
    let mut tpi = Vec::new();
    TypeStreamHeader {
        version:           TpiVersion::V80,
        header_size:       WIDE_HEADER_SIZE as u32,
        first_index:       TypeIndex(0x1000),
        last_index:        TypeIndex(0x1000 + records),
        record_bytes:      body.len() as u32,
        hash_stream_index: NO_STREAM,
        hash:              None,
    }
    .write(&mut tpi)
    .unwrap();
    tpi.extend_from_slice(&body);

    let mut streams = vec![Vec::new(), info, tpi];
    streams.extend((0..8).map(|i| vec![i as u8; 10_000]));

    let mut pages = vec![vec![0u8; PAGE_SIZE]; 2];
    let mut page_lists = PageArena::default();
    let place = |bytes: &[u8], pages: &mut Vec<Vec<u8>>| -> Vec<u16> {
        let mut list = Vec::new();
        for chunk in bytes.chunks(PAGE_SIZE) {
            list.push(pages.len() as u16);
            let mut page = chunk.to_vec();
            page.resize(PAGE_SIZE, 0);
            pages.push(page);
        }
        list
    };
    for s in &streams {
        page_lists.push(&place(s, &mut pages));
    }
    let mut dir = Vec::new();
    StreamDirectory {
        stream_count: streams.len() as u32,
        stream_infos: streams.iter().map(|s| StreamInfo { size: s.len() as i32, reserved: 0 }).collect(),
        page_lists,
    }
    .write(&mut dir)
    .unwrap();
    let directory_pages = place(&dir, &mut pages);

    let mut sb = Superblock::new(PAGE_SIZE as i32);
    sb.page_count = pages.len() as u16;
    sb.directory = StreamInfo { size: dir.len() as i32, reserved: 0 };
    sb.directory_pages = directory_pages;
    let mut head = Vec::new();
    sb.write(&mut head).unwrap();
    pages[0][..head.len()].copy_from_slice(&head);
    pages.concat()
}

fn bench_decode(c: &mut Criterion) {
    let data = synthetic_pdb(20_000);

    c.bench_function("decode_20k_records", |b| {
        b.iter(|| PdbFile::parse(black_box(data.clone())).unwrap())
    });

    let opts = ParseOptions { parallel: true, ..Default::default() };
    c.bench_function("decode_20k_records_parallel", |b| {
        b.iter(|| PdbFile::parse_with(black_box(data.clone()), &opts).unwrap())
    });
}

fn bench_stream_data(c: &mut Criterion) {
    let pdb = PdbFile::parse(synthetic_pdb(1_000)).unwrap();

    c.bench_function("reassemble_opaque_stream", |b| {
        b.iter(|| pdb.stream_data(black_box(5)).unwrap())
    });
}

criterion_group!(benches, bench_decode, bench_stream_data);
criterion_main!(benches);
