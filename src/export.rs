use crate::calc::{student_totals, AttendanceIndex};
use crate::model::{AttendanceSnapshot, Student};
use crate::period::PeriodKey;
use anyhow::Context;
use std::path::{Path, PathBuf};

const BOM: char = '\u{FEFF}';
pub const CSV_HEADER: &str = "Õpilane,E-post,Lapsevanem,Kuu,Osalenud,Kokku trenne,Protsent";

/// Parent contact for a student, resolved in precedence order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentContact {
    pub email: String,
    pub name: String,
}

fn first_non_empty<I>(candidates: I) -> String
where
    I: IntoIterator<Item = Option<String>>,
{
    candidates
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

/// Direct `parentEmail`/`parentName` fields win over the linked parent record.
pub fn resolve_parent_contact(student: &Student) -> ParentContact {
    let parent = student.parent.as_ref();
    let email = first_non_empty([
        student.parent_email.clone(),
        parent.and_then(|p| p.email.clone()),
    ]);
    let name = first_non_empty([
        student.parent_name.clone(),
        parent.map(|p| {
            format!(
                "{} {}",
                p.first_name.as_deref().unwrap_or(""),
                p.last_name.as_deref().unwrap_or("")
            )
            .trim()
            .to_string()
        }),
    ]);
    ParentContact { email, name }
}

/// Quotes only when the value holds a comma, a double quote or a newline.
pub fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub fn export_file_name(period: &PeriodKey) -> String {
    format!("attendance_{}.csv", period.key())
}

/// Renders the report, or `None` when there are no students to report on.
pub fn render_csv(snapshot: &AttendanceSnapshot, period: &PeriodKey) -> Option<String> {
    if snapshot.attendance_by_student.is_empty() {
        return None;
    }
    let index = AttendanceIndex::build(&snapshot.attendance_by_student);
    let month = period.month_label();

    let mut csv = String::new();
    csv.push(BOM);
    csv.push_str(CSV_HEADER);
    csv.push('\n');
    for item in &snapshot.attendance_by_student {
        let contact = resolve_parent_contact(&item.student);
        let totals = student_totals(item, &index, &snapshot.schedules);
        csv.push_str(&format!(
            "{},{},{},{},{},{},{}%\n",
            csv_quote(&item.student.display_name()),
            csv_quote(&contact.email),
            csv_quote(&contact.name),
            csv_quote(&month),
            totals.attended,
            totals.total_lessons,
            totals.percentage
        ));
    }
    Some(csv)
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub file_name: String,
    pub row_count: usize,
}

/// Writes `attendance_<key>.csv` into `out_dir`. No file is written when
/// there is nothing to export.
pub fn write_csv_report(
    snapshot: &AttendanceSnapshot,
    period: &PeriodKey,
    out_dir: &Path,
) -> anyhow::Result<Option<ExportSummary>> {
    let Some(csv) = render_csv(snapshot, period) else {
        return Ok(None);
    };
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create directory {}", out_dir.to_string_lossy()))?;
    let file_name = export_file_name(period);
    let path = out_dir.join(&file_name);
    std::fs::write(&path, csv.as_bytes())
        .with_context(|| format!("failed to write {}", path.to_string_lossy()))?;
    Ok(Some(ExportSummary {
        path,
        file_name,
        row_count: snapshot.attendance_by_student.len(),
    }))
}
