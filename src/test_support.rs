use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex, OnceLock};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    Router,
};
use tempfile::TempDir;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::api;
use crate::core::{config::Settings, state::AppState};
use crate::services::providers::{ImagePayload, ProviderError, VisionProvider};

pub(crate) const TEST_RUBRIC_TEXT: &str = "Sketch Quality: 25\nDescription: 25";
const TEST_PROMPT: &str =
    "Grade the floor plan sketch. Reply with JSON containing scores and feedback.";
const MULTIPART_BOUNDARY: &str = "sketch-grader-test-boundary";

pub(crate) const PERFECT_REPLY: &str = r#"{"scores":{"sketch":25,"description":25,"dimensions":25,"scale":10,"compass":10,"differences":5},"feedback":"Great job!"}"#;

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) app: Router,
    pub(crate) provider: Arc<ScriptedProvider>,
    pub(crate) upload_dir: TempDir,
    _rubric_dir: TempDir,
    _guard: OwnedMutexGuard<()>,
}

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn set_test_env(rubric_path: &Path, upload_dir: &Path) {
    std::env::set_var("GEMINI_API_KEY", "test-gemini-key");
    std::env::set_var("GROK_API_KEY", "test-grok-key");
    std::env::set_var("RUBRIC_FILE", rubric_path);
    std::env::set_var("UPLOAD_TMP_DIR", upload_dir);
    std::env::set_var("PROMETHEUS_ENABLED", "0");
    for key in [
        "AI_PROVIDER",
        "AI_REQUEST_TIMEOUT",
        "ALLOWED_IMAGE_EXTENSIONS",
        "BACKEND_CORS_ORIGINS",
        "GEMINI_BASE_URL",
        "GEMINI_MODEL",
        "GRADER_HOST",
        "GRADER_PORT",
        "GROK_BASE_URL",
        "GROK_MAX_TOKENS",
        "GROK_MODEL",
        "GROK_TEMPERATURE",
        "MAX_UPLOAD_SIZE_MB",
    ] {
        std::env::remove_var(key);
    }
}

pub(crate) fn write_rubric(dir: &Path) -> PathBuf {
    let path = dir.join("prompt.txt");
    let contents = format!("{TEST_RUBRIC_TEXT}\n=== PROMPT ===\n{TEST_PROMPT}\n");
    std::fs::write(&path, contents).expect("write rubric");
    path
}

/// What the scripted provider does when called.
#[derive(Debug, Clone)]
pub(crate) enum ProviderScript {
    Reply(String),
    Fail { status: u16 },
    Panic,
}

#[derive(Debug, Default)]
struct Observed {
    calls: usize,
    last_prompt: Option<String>,
    last_mime_type: Option<&'static str>,
    files_during_call: Option<usize>,
}

pub(crate) struct ScriptedProvider {
    script: ProviderScript,
    watch_dir: Option<PathBuf>,
    observed: StdMutex<Observed>,
}

impl ScriptedProvider {
    pub(crate) fn new(script: ProviderScript) -> Self {
        Self { script, watch_dir: None, observed: StdMutex::new(Observed::default()) }
    }

    /// Counts the files in `dir` each time the provider is called.
    pub(crate) fn watching(mut self, dir: &Path) -> Self {
        self.watch_dir = Some(dir.to_path_buf());
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.observed.lock().expect("observed lock").calls
    }

    pub(crate) fn last_prompt(&self) -> Option<String> {
        self.observed.lock().expect("observed lock").last_prompt.clone()
    }

    pub(crate) fn last_mime_type(&self) -> Option<&'static str> {
        self.observed.lock().expect("observed lock").last_mime_type
    }

    pub(crate) fn files_during_call(&self) -> Option<usize> {
        self.observed.lock().expect("observed lock").files_during_call
    }
}

#[async_trait]
impl VisionProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn evaluate(&self, prompt: &str, image: &ImagePayload) -> Result<String, ProviderError> {
        {
            let mut observed = self.observed.lock().expect("observed lock");
            observed.calls += 1;
            observed.last_prompt = Some(prompt.to_string());
            observed.last_mime_type = Some(image.mime_type());
            observed.files_during_call = self
                .watch_dir
                .as_ref()
                .map(|dir| std::fs::read_dir(dir).expect("read upload dir").count());
        }

        match &self.script {
            ProviderScript::Reply(text) => Ok(text.clone()),
            ProviderScript::Fail { status } => Err(ProviderError::Status {
                provider: "scripted",
                status: *status,
                body: "upstream exploded: secret-internal-detail".to_string(),
            }),
            ProviderScript::Panic => panic!("scripted provider panic"),
        }
    }
}

pub(crate) async fn setup_test_context(script: ProviderScript) -> TestContext {
    setup_test_context_with(script, || {}).await
}

/// Like [`setup_test_context`], with a hook to adjust the environment before
/// settings are loaded.
pub(crate) async fn setup_test_context_with(
    script: ProviderScript,
    configure: impl FnOnce(),
) -> TestContext {
    let guard = env_lock().await;
    let rubric_dir = tempfile::tempdir().expect("rubric dir");
    let upload_dir = tempfile::tempdir().expect("upload dir");
    set_test_env(&write_rubric(rubric_dir.path()), upload_dir.path());
    configure();

    let settings = Settings::load().expect("settings");
    let provider = Arc::new(ScriptedProvider::new(script).watching(upload_dir.path()));
    let state = AppState::new(settings, provider.clone());
    let app = api::router::router(state.clone());

    TestContext { state, app, provider, upload_dir, _rubric_dir: rubric_dir, _guard: guard }
}

pub(crate) fn upload_file_count(ctx: &TestContext) -> usize {
    std::fs::read_dir(ctx.upload_dir.path()).expect("read upload dir").count()
}

/// Builds a `multipart/form-data` POST with text fields and an optional
/// `image` file part given as `(filename, bytes)`.
pub(crate) fn multipart_request(
    uri: &str,
    fields: &[(&str, &str)],
    image: Option<(&str, &[u8])>,
) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"))
        .body(Body::from(body))
        .expect("request")
}

pub(crate) async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("read body");
    serde_json::from_slice(&body).expect("json body")
}

pub(crate) async fn read_text(response: axum::response::Response) -> String {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
