use askama::Template;

use crate::{filters, models::CertificateDetails};

#[derive(Template)]
#[template(path = "certificate.html")]
pub struct CertificatePage {
    pub student_name: String,
    pub course_title: String,
    pub instance_title: String,
    pub description_html: String,
    pub final_mark: String,
    pub issued_on: String,
    pub code: String,
}

impl From<CertificateDetails> for CertificatePage {
    fn from(details: CertificateDetails) -> Self {
        Self {
            student_name: details.student_name(),
            description_html: filters::markdown(details.course_description.as_deref().unwrap_or_default()),
            final_mark: format!("{:.2}", details.final_mark),
            issued_on: details.issued_at.format("%B %-d, %Y").to_string(),
            course_title: details.course_title,
            instance_title: details.instance_title,
            code: details.code,
        }
    }
}
