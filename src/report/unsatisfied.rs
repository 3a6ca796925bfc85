// Human-readable renderings of unsatisfied constraints.
//
// Items are split into hard constraints and critiques. The bordered form
// writes one section per non-empty group with names padded to the widest
// name across both groups.

use crate::core::trace::UnsatisfiedConstraint;
use std::io::{self, Write};

pub const CONSTRAINT_MARKER: char = '\u{16D6}';
pub const CRITIQUE_MARKER: char = '\u{16B9}';

const CONSTRAINTS_TITLE: &str = "Unsatisfied Constraints";
const CRITIQUES_TITLE: &str = "Unsatisfied Critiques";
const ALL_SATISFIED: &str = "All constraints have been satisfied";
const DEFAULT_NAME_WIDTH: usize = 8;

/// Constraints first, critiques second, input order kept within each
pub fn partition(
    unsatisfied: &[UnsatisfiedConstraint],
) -> (Vec<&UnsatisfiedConstraint>, Vec<&UnsatisfiedConstraint>) {
    unsatisfied.iter().partition(|item| !item.is_critique())
}

/// Log the items: critiques as warnings, constraints as errors
pub fn log_unsatisfied(unsatisfied: &[UnsatisfiedConstraint]) {
    if unsatisfied.is_empty() {
        log::info!("{}.", ALL_SATISFIED);
        return;
    }

    log::warn!("{}", count_message(unsatisfied.len()));
    for item in unsatisfied {
        if item.is_critique() {
            log::warn!("{}", item.message);
        } else {
            log::error!("{}", item.message);
        }
    }
}

/// Write the bordered report to `writer`
pub fn print_unsatisfied<W: Write + ?Sized>(
    unsatisfied: &[UnsatisfiedConstraint],
    writer: &mut W,
) -> io::Result<()> {
    if unsatisfied.is_empty() {
        writeln!(writer)?;
        write_banner(writer, ALL_SATISFIED)?;
        return writer.flush();
    }

    let width = unsatisfied
        .iter()
        .map(|item| item.name().chars().count())
        .max()
        .unwrap_or(DEFAULT_NAME_WIDTH);
    let (constraints, critiques) = partition(unsatisfied);

    write_section(writer, CONSTRAINTS_TITLE, CONSTRAINT_MARKER, &constraints, width)?;
    write_section(writer, CRITIQUES_TITLE, CRITIQUE_MARKER, &critiques, width)?;
    writer.flush()
}

/// Bordered report as a string
pub fn render_unsatisfied(unsatisfied: &[UnsatisfiedConstraint]) -> String {
    let mut buffer = Vec::new();
    // writing into a Vec cannot fail
    let _ = print_unsatisfied(unsatisfied, &mut buffer);
    String::from_utf8_lossy(&buffer).into_owned()
}

pub fn count_message(count: usize) -> String {
    if count == 1 {
        "There was 1 unsatisfied Constraint.".to_string()
    } else {
        format!("There were {} unsatisfied Constraints.", count)
    }
}

fn write_section<W: Write + ?Sized>(
    writer: &mut W,
    title: &str,
    marker: char,
    items: &[&UnsatisfiedConstraint],
    width: usize,
) -> io::Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    writeln!(writer)?;
    write_banner(writer, title)?;
    for item in items {
        writeln!(
            writer,
            "{} {:<width$} {}",
            marker,
            item.name(),
            item.message,
            width = width
        )?;
    }
    writeln!(writer, "{}", division(title))
}

fn write_banner<W: Write + ?Sized>(writer: &mut W, title: &str) -> io::Result<()> {
    let rule = division(title);
    writeln!(writer, "{}", rule)?;
    writeln!(writer, "{}", title)?;
    writeln!(writer, "{}", rule)
}

fn division(title: &str) -> String {
    "=".repeat(title.chars().count())
}
