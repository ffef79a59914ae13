//! DOCX text extraction. Paragraphs and tables are emitted in document order;
//! DOCX never needs OCR.

use docx_rs::{
    read_docx, DocumentChild, Paragraph, ParagraphChild, RunChild, Table, TableCellContent,
    TableChild, TableRowChild,
};

use crate::extraction::normalize::collapse_whitespace;
use crate::extraction::ExtractionError;

pub fn extract_docx(bytes: &[u8]) -> Result<String, ExtractionError> {
    let docx = read_docx(bytes).map_err(|e| ExtractionError::Docx(e.to_string()))?;

    let mut lines = Vec::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(p) => lines.push(collapse_whitespace(&paragraph_text(p))),
            DocumentChild::Table(t) => push_table_rows(t, &mut lines),
            _ => {}
        }
    }

    Ok(lines
        .into_iter()
        .filter(|l| !l.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    push_paragraph_children(&paragraph.children, &mut text);
    text
}

fn push_paragraph_children(children: &[ParagraphChild], out: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for run_child in &run.children {
                    match run_child {
                        RunChild::Text(t) => out.push_str(&t.text),
                        RunChild::Tab(_) | RunChild::Break(_) => out.push(' '),
                        _ => {}
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => push_paragraph_children(&link.children, out),
            _ => {}
        }
    }
}

/// One line per row, cells separated by tabs. Nested tables are flattened in place.
#[allow(irrefutable_let_patterns)]
fn push_table_rows(table: &Table, lines: &mut Vec<String>) {
    for row_child in &table.rows {
        let TableChild::TableRow(row) = row_child else {
            continue;
        };
        let mut cells = Vec::new();
        for cell_child in &row.cells {
            let TableRowChild::TableCell(cell) = cell_child else {
                continue;
            };
            let mut cell_text = Vec::new();
            for content in &cell.children {
                match content {
                    TableCellContent::Paragraph(p) => cell_text.push(paragraph_text(p)),
                    TableCellContent::Table(nested) => push_table_rows(nested, lines),
                    _ => {}
                }
            }
            cells.push(collapse_whitespace(&cell_text.join(" ")));
        }
        lines.push(cells.join("\t"));
    }
}
