mod parsing;
mod rubric;
mod settings;
mod types;

pub(crate) use types::{GeminiSettings, GrokSettings, ProviderKind, SecretString, Settings};
