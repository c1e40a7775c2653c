use serde::Serialize;

/// Sum and count of the marks recorded for one enroll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Grade {
    #[sqlx(rename = "marks_total")]
    total: i64,
    #[sqlx(rename = "marks_count")]
    count: i64,
}

impl Grade {
    #[must_use]
    pub const fn new(total: i64, count: i64) -> Self {
        Self { total, count }
    }

    /// Mean mark rounded to two decimals; `0.0` without marks.
    #[must_use]
    pub fn average(&self) -> f64 {
        let (Ok(total), Ok(count)) = (u32::try_from(self.total), u32::try_from(self.count)) else {
            return 0.0;
        };
        if count == 0 {
            return 0.0;
        }

        (f64::from(total) / f64::from(count) * 100.0).round() / 100.0
    }

    #[must_use]
    pub fn meets(&self, min_mark: i16) -> bool {
        self.average() >= f64::from(min_mark)
    }
}
