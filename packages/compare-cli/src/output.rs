//! Terminal rendering of comparison responses.

use colored::Colorize;

use spec_compare::{ComparisonResponse, ComparisonStatus, RecordStatus, SourceFailure};

const MAX_CELL: usize = 28;

pub fn print_response(response: &ComparisonResponse) {
    println!();
    println!(
        "{} {}  {}",
        "Query:".bold(),
        response.query,
        status_label(response.status)
    );
    println!();

    if response.columns.is_empty() {
        print_raw_records(response);
    } else {
        print_table(response);
    }

    println!();
    for (i, record) in response.records.iter().enumerate() {
        let contact = record.contact_url.as_deref().unwrap_or("-");
        println!("  [{}] {}", i + 1, record.url.dimmed());
        println!("      contact: {}", contact);
        if let Some(error) = &record.error {
            println!("      {}", error.red());
        }
    }

    if !response.warnings.is_empty() {
        println!();
        for warning in &response.warnings {
            println!("{} {}", "warning:".yellow().bold(), warning);
        }
    }

    print_failures(&response.failures);

    if let Some(timings) = &response.timings {
        println!();
        println!(
            "{} discover {}ms, acquire {}ms, normalize {}ms, extract {}ms, keys {}ms, select {}ms, contact {}ms, total {}ms",
            "timings:".dimmed(),
            timings.discover.as_millis(),
            timings.acquire.as_millis(),
            timings.normalize.as_millis(),
            timings.extract.as_millis(),
            timings.key_normalize.as_millis(),
            timings.select.as_millis(),
            timings.contact.as_millis(),
            timings.total.as_millis(),
        );
    }
}

pub fn print_failures(failures: &[SourceFailure]) {
    if failures.is_empty() {
        return;
    }

    println!();
    println!("{}", format!("{} source(s) failed:", failures.len()).red().bold());
    for failure in failures {
        println!(
            "  {} [{:?}/{:?}] {}",
            failure.url,
            failure.stage,
            failure.kind,
            failure.message.dimmed()
        );
    }
}

fn status_label(status: ComparisonStatus) -> colored::ColoredString {
    match status {
        ComparisonStatus::Complete => "complete".green().bold(),
        ComparisonStatus::Degraded => "degraded".yellow().bold(),
        ComparisonStatus::Uncompared => "uncompared".red().bold(),
    }
}

/// One row per column, one cell per source.
fn print_table(response: &ComparisonResponse) {
    let headers: Vec<String> = response
        .records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let name = r
                .entity_name
                .as_deref()
                .or(r.item_identifier.as_deref())
                .unwrap_or("?");
            clip(&format!("[{}] {}", i + 1, name))
        })
        .collect();

    let label_width = response
        .columns
        .iter()
        .map(|c| c.display_name.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(9, MAX_CELL);

    let widths: Vec<usize> = response
        .records
        .iter()
        .zip(&headers)
        .map(|(record, header)| {
            response
                .columns
                .iter()
                .filter_map(|c| record.specs.get(&c.key))
                .map(|v| clip(v).chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(1)
        })
        .collect();

    let mut line = pad("Attribute", label_width).bold().to_string();
    for ((header, width), record) in headers.iter().zip(&widths).zip(&response.records) {
        let cell = pad(header, *width);
        let cell = match record.status {
            RecordStatus::Ok => cell.bold(),
            RecordStatus::Failed => cell.red(),
        };
        line.push_str(&format!("  {}", cell));
    }
    println!("{}", line);

    for column in &response.columns {
        let mut line = pad(&clip(&column.display_name), label_width);
        for (record, width) in response.records.iter().zip(&widths) {
            let value = record.specs.get(&column.key).map(String::as_str).unwrap_or("");
            let cell = pad(&clip(value), *width);
            if value == spec_compare::NOT_AVAILABLE {
                line.push_str(&format!("  {}", cell.dimmed()));
            } else {
                line.push_str(&format!("  {}", cell));
            }
        }
        println!("{}", line);
    }
}

/// Uncompared results: each source's attributes as extracted.
fn print_raw_records(response: &ComparisonResponse) {
    for (i, record) in response.records.iter().enumerate() {
        let name = record.entity_name.as_deref().unwrap_or("?");
        println!("{}", format!("[{}] {}", i + 1, name).bold());
        for (key, value) in &record.specs {
            println!("    {}: {}", key, value);
        }
    }
}

fn clip(value: &str) -> String {
    if value.chars().count() <= MAX_CELL {
        return value.to_string();
    }
    let mut clipped: String = value.chars().take(MAX_CELL - 3).collect();
    clipped.push_str("...");
    clipped
}

fn pad(value: &str, width: usize) -> String {
    format!("{:<width$}", value, width = width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_long_values() {
        let long = "x".repeat(40);
        let clipped = clip(&long);
        assert_eq!(clipped.chars().count(), MAX_CELL);
        assert!(clipped.ends_with("..."));
        assert_eq!(clip("5 V"), "5 V");
    }

    #[test]
    fn test_pad_counts_chars() {
        assert_eq!(pad("µA", 4), "µA  ");
    }
}
