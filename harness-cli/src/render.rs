//! Text rendering
//!
//! Tables and detail blocks for text mode. Colors are applied after padding so
//! column alignment does not depend on escape codes.

use chrono::{DateTime, Utc};
use colored::*;
use harness_core::domain::TIME_FORMAT;
use harness_core::domain::connector::Connector;
use harness_core::domain::delegate::Delegate;
use harness_core::domain::execution::{ExecutionStatus, PipelineRun, StepDelegateInfo};

/// A table cell with optional color
#[derive(Debug, Clone)]
pub struct Cell {
    text: String,
    color: Option<Color>,
}

impl Cell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
        }
    }

    pub fn colored(text: impl Into<String>, color: Color) -> Self {
        Self {
            text: text.into(),
            color: Some(color),
        }
    }

    fn width(&self) -> usize {
        self.text.chars().count()
    }

    fn render(&self, width: usize) -> String {
        let padded = format!("{:<width$}", self.text, width = width);
        match self.color {
            Some(color) => padded.color(color).to_string(),
            None => padded,
        }
    }
}

/// Bordered text table with fixed column order
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: Vec<&'static str>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a row; missing trailing cells render empty
    pub fn add_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn render(&self) -> String {
        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(Cell::width)
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let border = format!(
            "+{}+",
            widths
                .iter()
                .map(|w| "-".repeat(w + 2))
                .collect::<Vec<_>>()
                .join("+")
        );

        let mut lines = vec![border.clone()];
        let header_cells: Vec<String> = self
            .headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| format!("{:<width$}", h, width = *w).bold().to_string())
            .collect();
        lines.push(format!("| {} |", header_cells.join(" | ")));
        lines.push(border.clone());

        let empty = Cell::plain("");
        for row in &self.rows {
            let cells: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(i, w)| row.get(i).unwrap_or(&empty).render(*w))
                .collect();
            lines.push(format!("| {} |", cells.join(" | ")));
        }
        lines.push(border);

        lines.join("\n")
    }
}

pub fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

fn delegate_status_color(delegate: &Delegate) -> Color {
    if delegate.is_healthy() {
        Color::Green
    } else {
        Color::Red
    }
}

fn execution_status_color(status: ExecutionStatus) -> Color {
    match status {
        ExecutionStatus::Success => Color::Green,
        ExecutionStatus::Running | ExecutionStatus::Queued => Color::Cyan,
        ExecutionStatus::Aborted | ExecutionStatus::Skipped | ExecutionStatus::IgnoreFailed => {
            Color::Yellow
        }
        _ => Color::Red,
    }
}

/// Delegates table: Name, ID, Hostname, IP, Status, Version, Labels
pub fn delegate_table<'a>(delegates: impl IntoIterator<Item = &'a Delegate>) -> Table {
    let mut table = Table::new(vec![
        "Name", "ID", "Hostname", "IP", "Status", "Version", "Labels",
    ]);
    for delegate in delegates {
        table.add_row(vec![
            Cell::plain(&delegate.name),
            Cell::plain(&delegate.id),
            Cell::plain(&delegate.hostname),
            Cell::plain(&delegate.ip),
            Cell::colored(delegate.status.to_string(), delegate_status_color(delegate)),
            Cell::plain(&delegate.version),
            Cell::plain(join_or_none(&delegate.labels)),
        ]);
    }
    table
}

/// Runs table: Execution ID, Start Time, Status, Failure Message
pub fn run_table<'a>(runs: impl IntoIterator<Item = &'a PipelineRun>) -> Table {
    let mut table = Table::new(vec!["Execution ID", "Start Time", "Status", "Failure Message"]);
    for run in runs {
        table.add_row(vec![
            Cell::plain(&run.execution_id),
            Cell::plain(format_time(Some(run.start_time))),
            Cell::colored(run.status.to_string(), execution_status_color(run.status)),
            Cell::plain(&run.failure_message),
        ]);
    }
    table
}

/// Connectors table: Name, ID, Type, Delegate Selectors, Created By, Created At
pub fn connector_table<'a>(connectors: impl IntoIterator<Item = &'a Connector>) -> Table {
    let mut table = Table::new(vec![
        "Name",
        "ID",
        "Type",
        "Delegate Selectors",
        "Created By",
        "Created At",
    ]);
    for connector in connectors {
        table.add_row(vec![
            Cell::plain(&connector.name),
            Cell::plain(&connector.id),
            Cell::plain(&connector.connector_type),
            Cell::plain(join_or_none(&connector.delegate_selectors)),
            Cell::plain(&connector.created_by),
            Cell::plain(format_time(connector.created_at)),
        ]);
    }
    table
}

/// Detailed, indented view of one delegate
pub fn delegate_details(delegate: &Delegate) -> String {
    let status = delegate
        .status
        .to_string()
        .color(delegate_status_color(delegate));

    let mut lines = vec![
        format!("  {} {}", "Delegate Name:".yellow(), delegate.name),
        format!("  {} {}", "Delegate ID:".yellow(), delegate.id),
        format!("  {} {}", "Hostname:".yellow(), delegate.hostname),
        format!("  {} {}", "IP:".yellow(), delegate.ip),
        format!("  {} {}", "Status:".yellow(), status),
        format!("  {} {}", "Version:".yellow(), delegate.version),
        format!(
            "  {} {}",
            "Profile:".yellow(),
            delegate.profile.as_deref().unwrap_or("None")
        ),
        format!(
            "  {} {}",
            "Last Heartbeat:".yellow(),
            format_time(delegate.last_heartbeat)
        ),
        format!(
            "  {} {}",
            "Connected At:".yellow(),
            format_time(delegate.connected_at)
        ),
    ];

    if delegate.labels.is_empty() {
        lines.push(format!("  {} {}", "Labels:".yellow(), "None".red()));
    } else {
        lines.push(format!("  {}", "Labels:".yellow()));
        for label in &delegate.labels {
            lines.push(format!("    - {}", label));
        }
    }

    lines.join("\n")
}

/// A step and its delegate, as shown under a failed run
pub fn step_details(step: &StepDelegateInfo) -> String {
    let mut lines = vec![format!(
        "  {} {} ({})",
        "Step:".yellow(),
        step.step_name,
        step.step_status.to_string().color(execution_status_color(step.step_status))
    )];

    match &step.delegate {
        Some(delegate) => lines.push(delegate_details(delegate)),
        None => lines.push(format!(
            "  {} {} {}",
            "Delegate:".yellow(),
            describe_reference(step),
            "(not found in registry)".red()
        )),
    }

    if step.step_status.is_failure()
        && let Some(error) = &step.error_message
    {
        lines.push(format!("  {} {}", "Step Error:".yellow(), error.red()));
    }

    lines.join("\n")
}

fn describe_reference(step: &StepDelegateInfo) -> String {
    match (step.delegate_name.is_empty(), step.delegate_id.is_empty()) {
        (false, false) => format!("{} ({})", step.delegate_name, step.delegate_id),
        (false, true) => step.delegate_name.clone(),
        _ => step.delegate_id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_aligns_columns() {
        colored::control::set_override(false);

        let mut table = Table::new(vec!["Name", "ID"]);
        table.add_row(vec![Cell::plain("worker-1"), Cell::plain("d1")]);
        table.add_row(vec![Cell::plain("w"), Cell::colored("delegate-22", Color::Red)]);

        let rendered = table.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "+----------+-------------+");
        assert_eq!(lines[1], "| Name     | ID          |");
        assert_eq!(lines[3], "| worker-1 | d1          |");
        assert_eq!(lines[4], "| w        | delegate-22 |");
        assert!(lines.iter().all(|l| l.chars().count() == lines[0].chars().count()));
    }

    #[test]
    fn test_short_rows_are_padded() {
        colored::control::set_override(false);

        let mut table = Table::new(vec!["A", "B"]);
        table.add_row(vec![Cell::plain("x")]);
        assert!(table.render().contains("| x |   |"));
    }

    #[test]
    fn test_format_time_unknown() {
        assert_eq!(format_time(None), "Unknown");
    }
}
