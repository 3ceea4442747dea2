//! Plain-text output for command results. Everything here goes to stdout.

use student_portal::domain::view::{DashboardView, StudentRow};
use student_portal::model::{School, Student};

const HEADERS: [&str; 5] = ["ID", "NAME", "EMAIL", "CAMPUS", "ROLE"];

/// Header block, totals and one table line per student.
pub fn dashboard(view: &DashboardView) -> String {
    let mut out = String::new();
    out.push_str(&view.display_name);
    out.push('\n');
    out.push_str(&view.role_line);
    out.push_str("\n\n");
    out.push_str(&format!("Total students: {}\n", view.total_students));

    if view.rows.is_empty() {
        out.push_str("No students found.\n");
        return out;
    }

    out.push('\n');
    out.push_str(&table(&view.rows));
    out
}

fn table(rows: &[StudentRow]) -> String {
    let cells: Vec<[&str; 5]> = rows
        .iter()
        .map(|r| {
            [
                r.id_label.as_str(),
                r.name.as_str(),
                r.email.as_str(),
                r.campus.as_str(),
                r.role.as_str(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = line(&HEADERS, &widths);
    for row in &cells {
        out.push_str(&line(row, &widths));
    }
    out
}

fn line(cells: &[&str; 5], widths: &[usize; 5]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
        .collect();
    let mut s = padded.join("  ").trim_end().to_string();
    s.push('\n');
    s
}

pub fn schools(schools: &[School]) -> String {
    if schools.is_empty() {
        return "No schools registered yet.\n".to_string();
    }
    schools
        .iter()
        .map(|s| format!("{:>4}  {}\n", s.id, s.name))
        .collect()
}

pub fn student(s: &Student) -> String {
    let row = StudentRow::from(s);
    format!(
        "{} {}\n  email:  {}\n  campus: {}\n  role:   {}\n",
        row.id_label, row.name, row.email, row.campus, row.role,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use student_portal::domain::view::UNKNOWN_CAMPUS;

    fn student_record(id: i64, name: &str, campus: Option<&str>, role: Option<&str>) -> Student {
        Student {
            id,
            name: name.into(),
            email: format!("{}@campus.edu", name.to_lowercase()),
            school: None,
            school_name: campus.map(Into::into),
            role: role.map(Into::into),
        }
    }

    #[test]
    fn dashboard_renders_one_line_per_student() {
        let students = vec![
            student_record(1, "Ada", Some("North Campus"), Some("ADMIN")),
            student_record(2, "Bob", None, None),
            student_record(15, "Cy", Some("East"), Some("USER")),
        ];
        let view = DashboardView::new(&students, Some("ada@campus.edu"));

        let out = dashboard(&view);
        let table_lines: Vec<&str> = out.lines().skip_while(|l| !l.starts_with("ID")).collect();

        assert_eq!(table_lines.len(), 1 + students.len());
        assert!(out.starts_with("Ada\nADMIN • ada@campus.edu\n"));
        assert!(out.contains("Total students: 3"));
        assert!(table_lines[1].starts_with("#001  Ada"));
        assert!(table_lines[2].contains(UNKNOWN_CAMPUS));
        assert!(table_lines[3].starts_with("#015"));
    }

    #[test]
    fn columns_are_aligned() {
        let students = vec![
            student_record(1, "Ada", Some("North Campus"), None),
            student_record(2, "Bartholomew", Some("X"), None),
        ];
        let out = table(&DashboardView::new(&students, None).rows);
        let lines: Vec<&str> = out.lines().collect();

        let email_col = lines[0].find("EMAIL").unwrap();
        assert_eq!(lines[1].find("ada@").unwrap(), email_col);
        assert_eq!(lines[2].find("bartholomew@").unwrap(), email_col);
    }

    #[test]
    fn empty_dashboard_says_so() {
        let out = dashboard(&DashboardView::new(&[], None));
        assert!(out.contains("Total students: 0"));
        assert!(out.contains("No students found."));
        assert!(!out.contains("EMAIL"));
    }

    #[test]
    fn school_list() {
        let out = schools(&[
            School { id: 1, name: "North Campus".into() },
            School { id: 12, name: "East Campus".into() },
        ]);
        assert_eq!(out, "   1  North Campus\n  12  East Campus\n");
        assert_eq!(schools(&[]), "No schools registered yet.\n");
    }

    #[test]
    fn single_student_card() {
        let out = student(&student_record(7, "Cy", None, Some("ADMIN")));
        assert!(out.starts_with("#007 Cy\n"));
        assert!(out.contains("campus: UNKNOWN"));
        assert!(out.contains("role:   ADMIN"));
    }
}
