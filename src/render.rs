//! Renders a derived page for the command line as a Markdown table, CSV or JSON.

use crate::model::Columns;
use crate::table::{View, ViewState};
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// Shown in place of rows when the page is empty.
pub const NO_RESULTS: &str = "No results.";

/// The output formats supported by `spendview view`.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// A Markdown table followed by the pagination and totals lines.
    #[default]
    Table,
    /// The page's rows as CSV, using the column labels as headers.
    Csv,
    /// The page, its state and totals as a JSON object.
    Json,
}

serde_plain::derive_display_from_serialize!(OutputFormat);
serde_plain::derive_fromstr_from_deserialize!(OutputFormat);

/// A rendered page in the requested output format.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rendered {
    /// Markdown table as a single formatted string.
    Table(String),
    /// CSV data as a properly escaped string.
    Csv(String),
    /// JSON object describing the page.
    Json(serde_json::Value),
}

impl Debug for Rendered {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rendered::Table(s) => write!(f, "Rendered::Table({} chars)", s.len()),
            Rendered::Csv(s) => write!(f, "Rendered::Csv({} chars)", s.len()),
            Rendered::Json(v) => write!(f, "Rendered::Json({:?})", v),
        }
    }
}

impl Display for Rendered {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rendered::Table(s) => write!(f, "{}", s),
            Rendered::Csv(s) => write!(f, "{}", s),
            Rendered::Json(v) => {
                if let Ok(s) = serde_json::to_string_pretty(v) {
                    write!(f, "{}", s)
                } else {
                    write!(f, "{:?}", v)
                }
            }
        }
    }
}

/// Renders `view` using the table's `columns` and `state`.
pub fn render(
    view: &View<'_>,
    columns: &Columns,
    state: &ViewState,
    format: OutputFormat,
) -> Result<Rendered> {
    Ok(match format {
        OutputFormat::Table => Rendered::Table(markdown(view, columns, state)),
        OutputFormat::Csv => Rendered::Csv(csv(view, columns)?),
        OutputFormat::Json => Rendered::Json(json(view, columns, state)?),
    })
}

/// The header label of each column, with the sort indicator appended to the sorted one.
fn header_labels(columns: &Columns, state: &ViewState) -> Vec<String> {
    columns
        .iter()
        .map(|c| match state.sort() {
            Some(sort) if sort.key() == c.key() => {
                format!("{} {}", c.label(), sort.direction().indicator())
            }
            _ => c.label().to_string(),
        })
        .collect()
}

fn markdown_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

fn markdown(view: &View<'_>, columns: &Columns, state: &ViewState) -> String {
    let headers = header_labels(columns, state);
    let mut lines = Vec::with_capacity(view.rows().len() + 6);
    lines.push(format!(
        "| {} |",
        headers
            .iter()
            .map(|h| markdown_cell(h))
            .collect::<Vec<_>>()
            .join(" | ")
    ));
    lines.push(format!("|{}|", vec![" --- "; headers.len()].join("|")));

    if view.is_empty() {
        let mut cells = vec![NO_RESULTS.to_string()];
        cells.resize(headers.len().max(1), String::new());
        lines.push(format!("| {} |", cells.join(" | ")));
    } else {
        for row in view.rows() {
            let cells: Vec<String> = columns.iter().map(|c| markdown_cell(&c.render(row))).collect();
            lines.push(format!("| {} |", cells.join(" | ")));
        }
    }

    let totals = view.totals();
    lines.push(String::new());
    lines.push(format!(
        "Page {} of {}",
        view.page_index() + 1,
        view.page_count()
    ));
    lines.push(format!("Total (all): {}", totals.all()));
    lines.push(format!("Page total: {}", totals.page()));
    lines.join("\n")
}

fn csv(view: &View<'_>, columns: &Columns) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(columns.iter().map(|c| c.label()))?;
    for row in view.rows() {
        wtr.write_record(columns.iter().map(|c| c.render(row)))?;
    }
    let bytes = wtr.into_inner().context("Unable to flush CSV data")?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}

fn json(view: &View<'_>, columns: &Columns, state: &ViewState) -> Result<serde_json::Value> {
    let cells: Vec<serde_json::Map<String, serde_json::Value>> = view
        .rows()
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| (c.key().to_string(), serde_json::Value::from(c.render(row))))
                .collect()
        })
        .collect();
    Ok(serde_json::json!({
        "state": serde_json::to_value(state).context("Unable to serialize the view state")?,
        "rows": serde_json::to_value(view.rows()).context("Unable to serialize rows")?,
        "cells": cells,
        "filtered_count": view.filtered_count(),
        "page_count": view.page_count(),
        "page_index": view.page_index(),
        "totals": {
            "all": view.totals().all(),
            "page": view.totals().page(),
            "all_display": view.totals().all().to_string(),
            "page_display": view.totals().page().to_string(),
        },
    }))
}
