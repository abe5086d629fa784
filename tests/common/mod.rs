//! Shared workbook fixtures for the integration tests.
//!
//! Workbooks are generated in memory with rust_xlsxwriter in the layout of a
//! real Faire export (header, three description rows, data) and a real Temu
//! template (title row, header, two instruction rows, data).

#![allow(dead_code)]

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use rust_xlsxwriter::{Workbook, XlsxError};

pub const SOURCE_HEADER: &[&str] = &[
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

pub const TEMPLATE_HEADER: &[&str] = &[
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
    "Weight - lb",
    "Length - in",
    "Width - in",
    "Height - in",
    "Detail Images URL",
    "SKU Images URL",
    "SKU Images URL",
    "SKU Images URL",
    "Update or Add",
    "Shipping Template",
    "California Proposition 65 Warning Type",
];

pub const TEMPLATE_TITLE: &str = "Temu Bulk Upload Template";

/// One product row of the source export
#[derive(Debug, Clone)]
pub struct Product {
    pub name: &'static str,
    pub sku: &'static str,
    pub stock: f64,
    pub color: &'static str,
    pub price: f64,
    pub option_image: &'static str,
    pub product_images: &'static str,
}

pub fn product(name: &'static str, sku: &'static str, stock: f64) -> Product {
    Product {
        name,
        sku,
        stock,
        color: "",
        price: 19.99,
        option_image: "",
        product_images: "",
    }
}

/// Generate a source export with the given header and products
pub fn source_workbook_with_header(header: &[&str], products: &[Product]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Products")?;

    for (col, name) in header.iter().enumerate() {
        worksheet.write_string(0, col as u16, *name)?;
    }
    // Description rows below the header
    for row in 1..4u32 {
        worksheet.write_string(row, 0, format!("Description row {}", row))?;
    }

    for (offset, product) in products.iter().enumerate() {
        let row = 4 + offset as u32;
        for (col, name) in header.iter().enumerate() {
            let col = col as u16;
            match *name {
                "Product Name (English)" => {
                    worksheet.write_string(row, col, product.name)?;
                }
                "Description (English)" => {
                    worksheet.write_string(row, col, format!("{}\n\nhandmade", product.name))?;
                }
                "SKU" => {
                    worksheet.write_string(row, col, product.sku)?;
                }
                "On Hand Inventory" => {
                    worksheet.write_number(row, col, product.stock)?;
                }
                "Made In Country" => {
                    worksheet.write_string(row, col, "China")?;
                }
                "Option 1 Name" if !product.color.is_empty() => {
                    worksheet.write_string(row, col, "Color")?;
                }
                "Option 1 Value" if !product.color.is_empty() => {
                    worksheet.write_string(row, col, product.color)?;
                }
                "USD Unit Retail Price" => {
                    worksheet.write_number(row, col, product.price)?;
                }
                "Item Weight" => {
                    worksheet.write_number(row, col, 1.5)?;
                }
                "Item Length" | "Item Width" | "Item Height" => {
                    worksheet.write_number(row, col, 8.0)?;
                }
                "Option Image" if !product.option_image.is_empty() => {
                    worksheet.write_string(row, col, product.option_image)?;
                }
                "Product Images" if !product.product_images.is_empty() => {
                    worksheet.write_string(row, col, product.product_images)?;
                }
                _ => {}
            }
        }
    }

    workbook.save_to_buffer()
}

/// Generate a source export with the full Faire header
pub fn source_workbook(products: &[Product]) -> Result<Vec<u8>, XlsxError> {
    source_workbook_with_header(SOURCE_HEADER, products)
}

/// Generate a Temu template with a title row, a header and two instruction rows
pub fn template_workbook() -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Template")?;

    worksheet.write_string(0, 0, TEMPLATE_TITLE)?;
    for (col, name) in TEMPLATE_HEADER.iter().enumerate() {
        worksheet.write_string(1, col as u16, *name)?;
        worksheet.write_string(2, col as u16, "Required")?;
        worksheet.write_string(3, col as u16, format!("Enter {}", name))?;
    }

    workbook.save_to_buffer()
}

/// Write both workbooks into `dir` and return their paths
pub fn write_inputs(
    dir: &Path,
    products: &[Product],
) -> Result<(std::path::PathBuf, std::path::PathBuf), Box<dyn std::error::Error>> {
    let source = dir.join("faire_products.xlsx");
    let template = dir.join("temu_template.xlsx");
    std::fs::write(&source, source_workbook(products)?)?;
    std::fs::write(&template, template_workbook()?)?;
    Ok((source, template))
}

/// Position of the n-th occurrence of a template column
pub fn template_col(name: &str) -> u32 {
    TEMPLATE_HEADER
        .iter()
        .position(|h| *h == name)
        .map(|i| i as u32)
        .unwrap_or_else(|| panic!("template column {} not found", name))
}

/// Read the "Template" sheet of a written xlsx file
pub fn read_output_sheet(path: &Path) -> Range<Data> {
    let mut workbook = open_workbook_auto(path).unwrap();
    workbook.worksheet_range("Template").unwrap()
}

/// Cell text at an absolute position (empty when absent)
pub fn cell_text(range: &Range<Data>, row: u32, col: u32) -> String {
    match range.get_value((row, col)) {
        Some(Data::Empty) | None => String::new(),
        Some(value) => value.to_string(),
    }
}

/// Sorted file names in a directory
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
