//! Throughput of the per-slot text parsers
//!
//! Every product costs one price parse, usually an old-price parse and one
//! stock classification, so these run a few thousand times per category.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use catalog_crawler::domain::pagination::PaginationInfo;
use catalog_crawler::domain::{parse_old_price, parse_price, parse_stock_status};

const PRICES: [&str; 4] = ["25,00 Lei", "2.49999 Lei", "1.234.567,89 Lei", "3.199,99 Lei\n-15%"];

const STOCK_LABELS: [&str; 6] = [
    "În stoc",
    "Ultimele 3 produse",
    "Livrare în 5 zile",
    "Stoc limitat",
    "Precomandă",
    "Indisponibil",
];

fn bench_prices(c: &mut Criterion) {
    c.bench_function("parse_price", |b| {
        b.iter(|| {
            for text in PRICES {
                let _ = black_box(parse_price(black_box(text)));
            }
        });
    });

    c.bench_function("parse_old_price_blank", |b| {
        b.iter(|| black_box(parse_old_price(black_box(Some("   ")))));
    });
}

fn bench_stock(c: &mut Criterion) {
    c.bench_function("parse_stock_status", |b| {
        b.iter(|| {
            for label in STOCK_LABELS {
                black_box(parse_stock_status(black_box(Some(label))));
            }
        });
    });
}

fn bench_pagination(c: &mut Criterion) {
    c.bench_function("pagination_label", |b| {
        b.iter(|| black_box(PaginationInfo::parse(black_box("41-80 din 1.527 de produse"))));
    });
}

criterion_group!(benches, bench_prices, bench_stock, bench_pagination);
criterion_main!(benches);
