// ABOUTME: Text extraction for plain, delimited, and paginated document uploads
// ABOUTME: Renders delimited rows as labelled lines and rejects binary or empty content
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::str::from_utf8;

use aafiya_core::constants::chunking::PAGE_SEPARATOR;
use aafiya_core::errors::DocumentError;
use aafiya_core::models::{DocumentFormat, DocumentUpload};
use csv::{ReaderBuilder, StringRecord, Trim};

const PDF_MAGIC: &[u8] = b"%PDF";
const UTF8_BOM: char = '\u{FEFF}';

/// Extract searchable text from an upload
///
/// # Errors
///
/// `UnsupportedFormat` for binary PDF bytes, `ParseError` for content that is
/// not UTF-8 or yields no text
pub fn extract_text(upload: &DocumentUpload, max_rows: usize) -> Result<String, DocumentError> {
    if upload.bytes.starts_with(PDF_MAGIC) {
        return Err(DocumentError::unsupported(
            &upload.filename,
            "binary PDF content, upload the extracted text instead",
        ));
    }

    let raw = from_utf8(&upload.bytes)
        .map_err(|e| DocumentError::parse(&upload.filename, format!("not valid UTF-8 text: {e}")))?;
    let raw = raw.trim_start_matches(UTF8_BOM);

    let text = match upload.format {
        DocumentFormat::PlainText => raw.trim().to_owned(),
        DocumentFormat::DelimitedText => render_delimited(&upload.filename, raw, max_rows)?,
        DocumentFormat::PaginatedText => join_pages(raw),
    };

    if text.split_whitespace().next().is_none() {
        return Err(DocumentError::parse(&upload.filename, "no extractable text"));
    }
    Ok(text)
}

fn join_pages(raw: &str) -> String {
    raw.split(PAGE_SEPARATOR)
        .map(str::trim)
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Pick the delimiter that appears most often in the header line
fn detect_delimiter(header: &str) -> u8 {
    [b',', b';', b'\t']
        .into_iter()
        .map(|d| (d, header.bytes().filter(|&b| b == d).count()))
        .max_by_key(|&(_, count)| count)
        .filter(|&(_, count)| count > 0)
        .map_or(b',', |(d, _)| d)
}

fn render_delimited(filename: &str, raw: &str, max_rows: usize) -> Result<String, DocumentError> {
    let Some(header_line) = raw.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return Ok(String::new());
    };
    let malformed =
        |e: csv::Error| DocumentError::parse(filename, format!("malformed delimited text: {e}"));

    let mut reader = ReaderBuilder::new()
        .delimiter(detect_delimiter(header_line))
        .flexible(true)
        .trim(Trim::All)
        .from_reader(raw.trim().as_bytes());
    let columns: Vec<String> = reader
        .headers()
        .map_err(malformed)?
        .iter()
        .map(str::to_owned)
        .collect();

    let mut rows: Vec<StringRecord> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(malformed)?;
        if record.iter().any(|field| !field.is_empty()) {
            rows.push(record);
        }
    }

    let mut lines = vec![
        format!("Tabular data from {filename}:"),
        format!("Columns: {}", columns.join(", ")),
        format!("Total rows: {}", rows.len()),
    ];
    lines.extend(rows.iter().take(max_rows).enumerate().map(|(index, row)| {
        let cells: Vec<String> = columns
            .iter()
            .zip(row.iter())
            .filter(|(_, value)| !value.is_empty())
            .map(|(column, value)| format!("{column}: {value}"))
            .collect();
        format!("Row {}: {}", index + 1, cells.join(", "))
    }));
    if rows.len() > max_rows {
        lines.push(format!("... and {} more rows", rows.len() - max_rows));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, format: DocumentFormat, text: &str) -> DocumentUpload {
        DocumentUpload::new(name, format, text.as_bytes().to_vec())
    }

    #[test]
    fn test_delimited_rows_are_labelled() {
        let csv =
            "food,calories,notes\napple,95,\n\"bread, whole wheat\",80,\"high \"\"fiber\"\"\"\n";
        let foods = upload("foods.csv", DocumentFormat::DelimitedText, csv);
        let text = extract_text(&foods, 100).unwrap();
        assert!(text.contains("Columns: food, calories, notes"));
        assert!(text.contains("Total rows: 2"));
        assert!(text.contains("Row 1: food: apple, calories: 95\n"));
        assert!(
            text.contains("Row 2: food: bread, whole wheat, calories: 80, notes: high \"fiber\"")
        );
    }

    #[test]
    fn test_quoted_line_breaks_stay_in_one_row() {
        let csv = "food,notes\n\"Oats\",\"high fiber\nlow sugar\"\nEggs,protein\n";
        let foods = upload("foods.csv", DocumentFormat::DelimitedText, csv);
        let text = extract_text(&foods, 100).unwrap();
        assert!(text.contains("Total rows: 2"));
        assert!(text.contains("Row 1: food: Oats, notes: high fiber\nlow sugar"));
        assert!(text.contains("Row 2: food: Eggs, notes: protein"));
        assert!(!text.contains("Row 3"));
    }

    #[test]
    fn test_delimited_row_cap() {
        let csv = "food;kcal\na;1\nb;2\nc;3\n";
        let text = extract_text(&upload("x.csv", DocumentFormat::DelimitedText, csv), 2).unwrap();
        assert!(text.contains("Row 2: food: b, kcal: 2"));
        assert!(!text.contains("Row 3"));
        assert!(text.contains("... and 1 more rows"));
    }

    #[test]
    fn test_pages_joined() {
        let text = extract_text(
            &upload("guide.pdf", DocumentFormat::PaginatedText, "page one\u{000C}\u{000C}page two"),
            100,
        )
        .unwrap();
        assert_eq!(text, "page one\n\npage two");
    }

    #[test]
    fn test_rejects_binary_and_empty() {
        let pdf = DocumentUpload::new(
            "scan.pdf",
            DocumentFormat::PaginatedText,
            b"%PDF-1.7 ...".to_vec(),
        );
        assert!(matches!(
            extract_text(&pdf, 100),
            Err(DocumentError::UnsupportedFormat { .. })
        ));

        let blank = upload("blank.txt", DocumentFormat::PlainText, "  \n\u{000C} ");
        assert!(matches!(extract_text(&blank, 100), Err(DocumentError::ParseError { .. })));

        let latin1 =
            DocumentUpload::new("old.txt", DocumentFormat::PlainText, vec![0x63, 0x61, 0xE9]);
        assert!(matches!(extract_text(&latin1, 100), Err(DocumentError::ParseError { .. })));
    }
}
