use amedas::{match_address, AddressNormalizer, ObservatoryIndex, ObservatoryReference, RowId};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const ADDRESSES: [&str; 6] = [
    "東京都澁谷區道玄坂２丁目１番１号　渋谷ビル５F",
    "神奈川縣横濱市中区山下町１０番地",
    "大阪府大阪市北区梅田三丁目１−１",
    "北海道札幌市中央区北一条西２丁目",
    "京都府京都市下京区烏丸通塩小路下ル東塩小路町",
    "沖縄県那覇市泉崎1-2-2",
];

fn reference_index() -> ObservatoryIndex {
    let prefixes = [
        ("東京", "東京都"),
        ("渋谷", "東京都渋谷区"),
        ("練馬", "東京都練馬区"),
        ("横浜", "神奈川県横浜市"),
        ("大阪", "大阪府大阪市"),
        ("札幌", "北海道札幌市"),
        ("京都", "京都府京都市"),
        ("那覇", "沖縄県那覇市"),
    ];
    ObservatoryIndex::build(
        prefixes
            .iter()
            .map(|(id, prefix)| ObservatoryReference::new(*id, *prefix)),
    )
    .expect("benchmark references are valid")
}

fn bench_matching(c: &mut Criterion) {
    let normalizer = AddressNormalizer::new();
    let index = reference_index();

    c.bench_function("normalize", |b| {
        b.iter(|| {
            for address in ADDRESSES {
                black_box(normalizer.normalize(black_box(address)));
            }
        })
    });
    c.bench_function("normalize_and_match", |b| {
        b.iter(|| {
            for (i, address) in ADDRESSES.iter().enumerate() {
                let normalized = normalizer.normalize(black_box(address));
                black_box(match_address(RowId(i), &normalized, &index));
            }
        })
    });
}

criterion_group!(benches, bench_matching);
criterion_main!(benches);
