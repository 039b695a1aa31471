//! PDF conversion using `pdf-extract` for text and `lopdf` for page counts.
//!
//! Both libraries are synchronous and CPU-bound, so every call runs on
//! the blocking pool.

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::converters::html::collapse_blank_lines;
use crate::error::{ConvertError, ConvertResult};
use crate::traits::converter::DocumentConverter;

/// Two or more spaces (or a tab) separate table columns in extracted text.
static COLUMN_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}|\t").expect("valid column gap regex"));

/// Converts datasheet PDFs to markdown.
#[derive(Debug, Clone, Default)]
pub struct PdfConverter;

impl PdfConverter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentConverter for PdfConverter {
    async fn page_count(&self, bytes: &[u8]) -> ConvertResult<usize> {
        let bytes = bytes.to_vec();
        tokio::task::spawn_blocking(move || {
            lopdf::Document::load_mem(&bytes)
                .map(|doc| doc.get_pages().len())
                .map_err(|e| ConvertError::Unreadable(e.to_string()))
        })
        .await
        .map_err(|e| ConvertError::Task(e.to_string()))?
    }

    async fn to_markdown(&self, bytes: &[u8]) -> ConvertResult<String> {
        let bytes = bytes.to_vec();
        let text = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes)
                .map_err(|e| ConvertError::Unreadable(e.to_string()))
        })
        .await
        .map_err(|e| ConvertError::Task(e.to_string()))??;

        let markdown = layout_to_markdown(&text);
        debug!(
            text_chars = text.len(),
            markdown_chars = markdown.len(),
            "PDF converted"
        );

        if markdown.trim().is_empty() {
            return Err(ConvertError::Empty);
        }
        Ok(markdown)
    }
}

/// Turn layout-preserving PDF text into markdown.
///
/// Consecutive lines that split into two or more columns on wide gaps
/// become a markdown table; everything else passes through as text.
pub fn layout_to_markdown(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut table: Vec<Vec<String>> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        let cells: Vec<String> = COLUMN_GAP
            .split(trimmed)
            .map(|c| c.trim().replace('|', "/"))
            .filter(|c| !c.is_empty())
            .collect();

        if cells.len() >= 2 {
            table.push(cells);
            continue;
        }

        flush_table(&mut table, &mut out);
        out.push(trimmed.to_string());
    }
    flush_table(&mut table, &mut out);

    collapse_blank_lines(&out.join("\n"))
}

fn flush_table(table: &mut Vec<Vec<String>>, out: &mut Vec<String>) {
    match table.len() {
        0 => {}
        // A single aligned line is a label/value pair, not a table
        1 => out.push(table[0].join(": ")),
        _ => {
            let width = table.iter().map(Vec::len).max().unwrap_or(0);
            out.push(String::new());
            for (i, row) in table.iter().enumerate() {
                let mut cells = row.clone();
                cells.resize(width, String::new());
                out.push(format!("| {} |", cells.join(" | ")));
                if i == 0 {
                    out.push(format!("|{}", " --- |".repeat(width)));
                }
            }
            out.push(String::new());
        }
    }
    table.clear();
}
