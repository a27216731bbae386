use time::{format_description::well_known::Rfc3339, OffsetDateTime, UtcOffset};

pub(crate) fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

pub(crate) fn format_rfc3339(value: OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap_or_else(|_| value.to_string())
}

/// Human-readable stamp for report footers, e.g. "November 05, 2025 at 02:30 PM UTC".
pub(crate) fn format_report_stamp(value: OffsetDateTime) -> String {
    let utc = value.to_offset(UtcOffset::UTC);
    let format = time::macros::format_description!(
        "[month repr:long] [day], [year] at [hour repr:12]:[minute] [period] UTC"
    );
    utc.format(&format).unwrap_or_else(|_| format_rfc3339(utc))
}
