use serde::Serialize;

pub(crate) mod grade;

#[derive(Debug, Serialize)]
pub(crate) struct RootResponse {
    pub(crate) message: String,
    pub(crate) version: String,
    pub(crate) provider: String,
    pub(crate) endpoints: Vec<&'static str>,
}
