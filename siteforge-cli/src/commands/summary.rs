//! Post-run table of executed steps.

use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use siteforge_pipeline::{Operation, RunReport};

#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "step")]
    step: String,
    #[tabled(rename = "files")]
    files: usize,
    #[tabled(rename = "published")]
    published: usize,
    #[tabled(rename = "time")]
    time: String,
}

pub fn print(op: &Operation, report: &RunReport) {
    let rows: Vec<StepRow> = report
        .records
        .iter()
        .map(|r| StepRow {
            step: r.step.to_string(),
            files: r.output.files.len(),
            published: r.output.published.len(),
            time: format!("{} ms", r.elapsed.as_millis()),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    println!(
        "{} {op} finished in {} ms",
        "✓".green().bold(),
        report.elapsed.as_millis()
    );
}
