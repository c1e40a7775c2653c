mod certificate;

pub use certificate::CertificatePage;
