pub(crate) mod grading;
pub(crate) mod providers;
pub(crate) mod report;
pub(crate) mod uploads;
