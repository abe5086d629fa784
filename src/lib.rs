//! sheetbridge - Map Faire product catalogs into Temu upload templates
//!
//! This crate reads a Faire product-catalog workbook, filters out-of-stock
//! products, maps columns into the layout of a Temu upload template, assigns
//! Temu category codes from product names, and writes one template file per
//! product-line partition.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sheetbridge::PipelineBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create a pipeline with default settings
//!     let pipeline = PipelineBuilder::new().build()?;
//!
//!     // Read both workbooks, convert, and write every partition file
//!     let report = pipeline.run("faire_products.xlsx", "temu_template.xlsx")?;
//!     println!("{} files written", report.files_written().len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Custom Configuration
//!
//! ```rust,no_run
//! use sheetbridge::{Config, OutputFormat, PipelineBuilder, SheetSelector};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load mappings, partitions and category rules from JSON
//!     let config = Config::from_path("sheetbridge.json")?;
//!
//!     let pipeline = PipelineBuilder::new()
//!         .with_config(config)
//!         .with_stock_filter(false)                        // Keep zero-stock products
//!         .with_source_sheet(SheetSelector::Index(0))      // First sheet of the export
//!         .with_output_format(OutputFormat::Csv)
//!         .with_chunk_size(500)
//!         .build()?;
//!
//!     pipeline.run("faire_products.xlsx", "temu_template.xlsx")?;
//!     Ok(())
//! }
//! ```
//!
//! # In-Memory Processing
//!
//! ```rust
//! use sheetbridge::config::ColumnMapping;
//! use sheetbridge::types::SourceRow;
//! use sheetbridge::{CellValue, Config, MappingPipeline, Table, Template};
//!
//! # fn main() -> Result<(), sheetbridge::CatalogError> {
//! let mut config = Config::default();
//! config.mappings = vec![ColumnMapping::new("SKU", "Contribution SKU")];
//! config.transforms.clear();
//! config.variation.enabled = false;
//!
//! let pipeline = MappingPipeline::new(config)?;
//! let header = [
//!     "SKU",
//!     "Product Name (English)",
//!     "On Hand Inventory",
//!     "Option Image",
//!     "Product Images",
//! ]
//! .iter()
//! .map(|s| s.to_string())
//! .collect();
//! let table = Table::new(
//!     header,
//!     vec![SourceRow::new(
//!         4,
//!         vec![
//!             CellValue::text("HBG104-07"),
//!             CellValue::text("Women's Leather Belt"),
//!             CellValue::Number(5.0),
//!             CellValue::Empty,
//!             CellValue::Empty,
//!         ],
//!     )],
//! );
//! let template = Template::from_header(vec![
//!     "Contribution SKU".to_string(),
//!     "Category".to_string(),
//! ]);
//!
//! let output = pipeline.process(&table, &template)?;
//! let handbags = output.table("handbags").expect("partition exists");
//! assert_eq!(handbags.rows[0][0], CellValue::text("HBG104-07"));
//! assert_eq!(handbags.rows[0][1], CellValue::text("29264"));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod images;
pub mod output;
pub mod partition;
pub mod pipeline;
pub mod reader;
pub mod report;
pub mod rules;
pub mod stock;
pub mod transform;
pub mod types;
pub mod variant;

mod api;
mod builder;
mod error;

// 公開API
pub use api::{OutputFormat, SheetSelector, TransformKind};
pub use builder::{Pipeline, PipelineBuilder};
pub use config::Config;
pub use error::CatalogError;
pub use pipeline::{MappingPipeline, ProcessOutput};
pub use report::RunReport;
pub use rules::CategoryEngine;
pub use types::{CellValue, OutputTable, Table, Template};
