use std::path::PathBuf;

use super::parsing::{
    env_optional, env_or_default, env_required, is_supported_image_extension, parse_bool,
    parse_cors_origins, parse_f64, parse_provider, parse_string_list, parse_u32, parse_u64,
};
use super::rubric::Rubric;
use super::types::{
    AiSettings, ConfigError, CorsSettings, GeminiSettings, GrokSettings, SecretString,
    ServerHost, ServerPort, ServerSettings, Settings, StorageSettings, TelemetrySettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("GRADER_HOST", "0.0.0.0");
        let port = env_or_default("GRADER_PORT", "5000");

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let provider = parse_provider(env_or_default("AI_PROVIDER", "gemini"))?;
        let gemini_api_key = env_required("GEMINI_API_KEY")?;
        let gemini_base_url =
            env_or_default("GEMINI_BASE_URL", "https://generativelanguage.googleapis.com/v1");
        let gemini_model = env_or_default("GEMINI_MODEL", "gemini-2.5-flash");
        let grok_api_key = env_required("GROK_API_KEY")?;
        let grok_base_url = env_or_default("GROK_BASE_URL", "https://api.x.ai/v1");
        let grok_model = env_or_default("GROK_MODEL", "grok-3-fast");
        let grok_max_tokens =
            parse_u32("GROK_MAX_TOKENS", env_or_default("GROK_MAX_TOKENS", "400"))?;
        let grok_temperature =
            parse_f64("GROK_TEMPERATURE", env_or_default("GROK_TEMPERATURE", "0.3"))?;
        let request_timeout_seconds =
            parse_u64("AI_REQUEST_TIMEOUT", env_or_default("AI_REQUEST_TIMEOUT", "120"))?;

        let upload_dir =
            env_optional("UPLOAD_TMP_DIR").map(PathBuf::from).unwrap_or_else(std::env::temp_dir);
        let max_upload_size_mb =
            parse_u64("MAX_UPLOAD_SIZE_MB", env_or_default("MAX_UPLOAD_SIZE_MB", "10"))?;
        let allowed_image_extensions =
            parse_string_list(env_optional("ALLOWED_IMAGE_EXTENSIONS"), &["jpg", "jpeg", "png"]);

        let log_level = env_or_default("GRADER_LOG_LEVEL", "info");
        let json = env_optional("GRADER_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let rubric_path = PathBuf::from(env_or_default("RUBRIC_FILE", "prompt.txt"));
        let rubric = Rubric::load(&rubric_path)?;

        let settings = Self {
            server: ServerSettings { host: ServerHost::parse(host)?, port: ServerPort::parse(port)? },
            cors: CorsSettings { origins: cors_origins },
            ai: AiSettings {
                provider,
                gemini: GeminiSettings {
                    api_key: SecretString::new(gemini_api_key),
                    base_url: gemini_base_url.trim_end_matches('/').to_string(),
                    model: gemini_model,
                },
                grok: GrokSettings {
                    api_key: SecretString::new(grok_api_key),
                    base_url: grok_base_url.trim_end_matches('/').to_string(),
                    model: grok_model,
                    max_tokens: grok_max_tokens,
                    temperature: grok_temperature,
                },
                request_timeout_seconds,
            },
            storage: StorageSettings { upload_dir, max_upload_size_mb, allowed_image_extensions },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
            rubric,
        };

        settings.validate()?;

        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn ai(&self) -> &AiSettings {
        &self.ai
    }

    pub(crate) fn storage(&self) -> &StorageSettings {
        &self.storage
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.allowed_image_extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "ALLOWED_IMAGE_EXTENSIONS",
                value: String::from("<empty>"),
            });
        }
        for extension in &self.storage.allowed_image_extensions {
            if !is_supported_image_extension(extension) {
                return Err(ConfigError::InvalidValue {
                    field: "ALLOWED_IMAGE_EXTENSIONS",
                    value: extension.clone(),
                });
            }
        }

        if self.storage.max_upload_size_mb == 0 {
            return Err(ConfigError::InvalidValue {
                field: "MAX_UPLOAD_SIZE_MB",
                value: String::from("0"),
            });
        }

        if self.ai.request_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "AI_REQUEST_TIMEOUT",
                value: String::from("0"),
            });
        }

        Ok(())
    }
}

impl StorageSettings {
    pub(crate) fn max_upload_bytes(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
    }
}
