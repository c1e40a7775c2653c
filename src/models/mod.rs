pub use assignment::CourseAssignment;
pub use certificate::{Certificate, CertificateDetails};
pub use course::{Course, CourseSummary};
pub use course_instance::{CourseInstance, CourseInstanceSummary};
pub use enroll::{Enroll, EnrollSummary, FinishedEnroll};
pub use mark::Mark;
pub use personal_assignment::{PersonalAssignment, PersonalAssignmentView};
pub use profile::{Address, Profile};
pub use staff::{StaffKind, StaffSummary, StaffWorker};
pub use user::User;

mod assignment;
mod certificate;
mod course;
mod course_instance;
mod enroll;
mod mark;
mod personal_assignment;
mod profile;
mod staff;
mod user;

/// `%search%` for `LIKE ? ESCAPE '\'`, with `%` and `_` matched literally.
fn like_pattern(search: Option<&str>) -> String {
    let search = search.unwrap_or_default().trim();

    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for ch in search.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');

    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(None), "%%");
        assert_eq!(like_pattern(Some("  rust ")), "%rust%");
        assert_eq!(like_pattern(Some("_")), "%\\_%");
        assert_eq!(like_pattern(Some("100%")), "%100\\%%");
        assert_eq!(like_pattern(Some("a\\b")), "%a\\\\b%");
    }
}
