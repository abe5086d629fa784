//! パフォーマンスベンチマーク
//!
//! このモジュールは、sheetbridgeクレートの変換処理の性能を測定するためのベンチマークを提供します。
//!
//! 実装するベンチマーク:
//! - 商品名からのカテゴリ判定
//! - メモリ上のテーブル全体の変換（読み込み・書き込みを除く）
//! - 変換結果のファイル内容の生成（CSV / xlsx）

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sheetbridge::config::Config;
use sheetbridge::types::SourceRow;
use sheetbridge::{CellValue, CategoryEngine, MappingPipeline, OutputFormat, PipelineBuilder, Table, Template};

const SOURCE_HEADER: &[&str] = &[
    "Product Name (English)",
    "Description (English)",
    "SKU",
    "On Hand Inventory",
    "Made In Country",
    "Option 1 Name",
    "Option 1 Value",
    "USD Unit Retail Price",
    "Item Weight",
    "Item Length",
    "Item Width",
    "Item Height",
    "Option Image",
    "Product Images",
];

const TEMPLATE_HEADER: &[&str] = &[
    "Category",
    "Product Name",
    "Contribution Goods",
    "Contribution SKU",
    "Product Description",
    "Variation Theme",
    "Color",
    "Quantity",
    "Base Price - USD",
    "List Price - USD",
    "Country/Region of Origin",
    "Province of Origin",
    "Detail Images URL",
    "SKU Images URL",
    "SKU Images URL",
    "SKU Images URL",
    "Update or Add",
];

const NAMES: &[&str] = &[
    "Women's Leather Belt",
    "Pet Carrier for Dogs",
    "Stainless Kitchen Spatula Set",
    "Microfiber Beach Towel",
    "Cell Phone Crossbody Case",
    "Silk Neck Scarf",
    "Sunglasses Case Holder",
    "Canvas Tote",
    "Straw Sun Hat",
];

const PREFIXES: &[&str] = &["HBG", "HW", "HAT", "ACC", "HL"];

/// 合成したソーステーブルを生成
fn source_table(rows: usize) -> Table {
    let header = SOURCE_HEADER.iter().map(|s| s.to_string()).collect();
    let rows = (0..rows)
        .map(|i| {
            let name = NAMES[i % NAMES.len()];
            let sku = format!("{}{:04}{}", PREFIXES[i % PREFIXES.len()], i / 3, ["PN", "BK", ""][i % 3]);
            SourceRow::new(
                i as u32 + 4,
                vec![
                    CellValue::text(name),
                    CellValue::text(format!("{}\n\nHandmade  and durable", name)),
                    CellValue::text(sku),
                    CellValue::Number((i % 7) as f64),
                    CellValue::text("China"),
                    CellValue::Empty,
                    CellValue::Empty,
                    CellValue::text(format!("${}.99", 10 + i % 40)),
                    CellValue::Number(1.5),
                    CellValue::Number(10.0),
                    CellValue::Number(4.0),
                    CellValue::Number(8.0),
                    CellValue::Empty,
                    CellValue::text("https://img.example.com/a.jpg https://img.example.com/b.jpg"),
                ],
            )
        })
        .collect();
    Table::new(header, rows)
}

fn template() -> Template {
    Template::from_header(TEMPLATE_HEADER.iter().map(|s| s.to_string()).collect())
}

fn benchmark_category_assignment(c: &mut Criterion) {
    let config = Config::default();
    let engine: CategoryEngine = config.category_engine().unwrap();

    let mut group = c.benchmark_group("categorize");
    group.throughput(Throughput::Elements(NAMES.len() as u64));
    group.bench_function("default_rules", |b| {
        b.iter(|| {
            for name in NAMES {
                black_box(engine.assign(black_box(name), None));
            }
        });
    });
    group.finish();
}

fn benchmark_process(c: &mut Criterion) {
    let pipeline = MappingPipeline::new(Config::default()).unwrap();
    let template = template();

    let mut group = c.benchmark_group("process");
    for rows in [1_000usize, 10_000] {
        let table = source_table(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &table, |b, table| {
            b.iter(|| black_box(pipeline.process(black_box(table), &template).unwrap()));
        });
    }
    group.finish();
}

fn benchmark_render(c: &mut Criterion) {
    let template = template();
    let table = source_table(5_000);

    let mut group = c.benchmark_group("render");
    group.sample_size(10);
    for format in [OutputFormat::Csv, OutputFormat::Xlsx] {
        let pipeline = PipelineBuilder::new()
            .with_output_format(format)
            .build()
            .unwrap();
        let output = pipeline.process(&table, &template).unwrap();
        group.bench_function(format.extension(), |b| {
            b.iter(|| black_box(pipeline.render(black_box(&output), &template).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_category_assignment,
    benchmark_process,
    benchmark_render
);
criterion_main!(benches);
