use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::models::{SemesterEntry, CGPA_MAX};

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// `(semester, cgpa)` pairs for the trend chart, in ledger order.
pub(crate) fn trend_points(entries: &[SemesterEntry]) -> Vec<(f64, f64)> {
    entries
        .iter()
        .map(|entry| (f64::from(entry.sem), entry.cgpa.value()))
        .collect()
}

/// X-axis bounds that keep a single point off the chart edge.
pub(crate) fn trend_x_bounds(entries: &[SemesterEntry]) -> [f64; 2] {
    match (entries.first(), entries.last()) {
        (Some(first), Some(last)) if first.sem != last.sem => {
            [f64::from(first.sem), f64::from(last.sem)]
        }
        (Some(only), _) => [f64::from(only.sem) - 1.0, f64::from(only.sem) + 1.0],
        _ => [0.0, 1.0],
    }
}

pub(crate) const TREND_Y_BOUNDS: [f64; 2] = [0.0, CGPA_MAX];

/// The semester after the highest one recorded, for pre-filling the form.
pub(crate) fn next_semester(entries: &[SemesterEntry]) -> u32 {
    entries
        .iter()
        .map(|entry| entry.sem)
        .max()
        .map_or(1, |sem| sem.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Context};

    use super::*;
    use crate::models::Student;

    #[test]
    fn surfaces_root_cause() {
        let err = Err::<(), _>(anyhow!("disk full"))
            .context("failed to write")
            .unwrap_err();
        assert_eq!(surface_error(&err), "disk full");
    }

    #[test]
    fn trend_follows_sorted_entries() {
        let mut student = Student::seed();
        student.semesters.upsert(3, 8.0).unwrap();
        student.semesters.upsert(2, 7.0).unwrap();
        let entries = student.semesters.entries();
        assert_eq!(
            trend_points(&entries),
            vec![(1.0, 6.8), (2.0, 7.0), (3.0, 8.0)]
        );
        assert_eq!(trend_x_bounds(&entries), [1.0, 3.0]);
        assert_eq!(next_semester(&entries), 4);
    }

    #[test]
    fn single_and_empty_ledgers_have_usable_bounds() {
        let student = Student::seed();
        assert_eq!(trend_x_bounds(&student.semesters.entries()), [0.0, 2.0]);
        assert_eq!(trend_x_bounds(&[]), [0.0, 1.0]);
        assert_eq!(next_semester(&[]), 1);
    }
}
