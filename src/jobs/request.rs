use serde::Deserialize;
use serde_json::Value;

use crate::core::error::{AppError, AppResult};
use crate::download::options::JobOptions;
use crate::session::{SessionId, SessionRegistry};

/// Job submission body as received.
///
/// Every field is kept as raw JSON at this stage so that missing keys and
/// wrongly typed values are all reported at once instead of stopping at the
/// first one.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SubmitJobPayload {
    #[serde(default, alias = "sessionId")]
    pub session_id: Option<Value>,
    #[serde(default)]
    pub url: Option<Value>,
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub options: Option<Value>,
}

/// A validated job. Exists only for the duration of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub session_id: SessionId,
    pub url: String,
    pub title: String,
    pub options: JobOptions,
}

/// A non-blank JSON string; anything else counts as missing.
fn present(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(text)) => Some(text.trim().to_string()).filter(|t| !t.is_empty()),
        _ => None,
    }
}

impl SubmitJobPayload {
    /// Check required fields and that the session is live.
    ///
    /// # Errors
    ///
    /// `AppError::Validation` listing every missing or invalid field.
    pub fn validate(self, sessions: &SessionRegistry) -> AppResult<JobRequest> {
        let mut invalid = Vec::new();

        let url = present(self.url);
        if url.is_none() {
            invalid.push("url".to_string());
        }

        let title = present(self.title);
        if title.is_none() {
            invalid.push("title".to_string());
        }

        let options = match self.options {
            None | Some(Value::Null) => {
                invalid.push("options".to_string());
                None
            }
            Some(raw) => match serde_json::from_value::<JobOptions>(raw) {
                Ok(options) => {
                    let bad = options.invalid_fields();
                    if bad.is_empty() {
                        Some(options)
                    } else {
                        invalid.extend(bad);
                        None
                    }
                }
                Err(e) => {
                    log::debug!("Rejected job options: {}", e);
                    invalid.push("options".to_string());
                    None
                }
            },
        };

        let session_id = match present(self.session_id) {
            Some(id) if sessions.contains(&id) => Some(id),
            Some(id) => {
                log::debug!("Job references unknown session {}", id);
                invalid.push("session_id (unknown session)".to_string());
                None
            }
            None => {
                invalid.push("session_id".to_string());
                None
            }
        };

        match (session_id, url, title, options) {
            (Some(session_id), Some(url), Some(title), Some(options)) if invalid.is_empty() => Ok(JobRequest {
                session_id,
                url,
                title,
                options,
            }),
            _ => Err(AppError::Validation(invalid)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> SubmitJobPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_valid_payload() {
        let registry = SessionRegistry::new();
        let (id, _rx) = registry.register();
        let job = payload(json!({
            "session_id": id,
            "url": "https://youtu.be/abc",
            "title": "Clip",
            "options": {"type": "simple", "ext": "mp4"}
        }))
        .validate(&registry)
        .unwrap();
        assert_eq!(job.session_id, id);
        assert_eq!(job.options, JobOptions::Simple { ext: "mp4".into() });
    }

    #[test]
    fn test_camel_case_session_alias() {
        let registry = SessionRegistry::new();
        let (id, _rx) = registry.register();
        let job = payload(json!({
            "sessionId": id,
            "url": "https://youtu.be/abc",
            "title": "Clip",
            "options": {"type": "simple", "ext": "mp3"}
        }))
        .validate(&registry);
        assert!(job.is_ok());
    }

    #[test]
    fn test_all_missing_fields_are_aggregated() {
        let registry = SessionRegistry::new();
        let err = SubmitJobPayload::default().validate(&registry).unwrap_err();
        assert_eq!(err.invalid_fields(), ["url", "title", "options", "session_id"].map(String::from));
    }

    #[test]
    fn test_unknown_session_rejected() {
        let registry = SessionRegistry::new();
        let err = payload(json!({
            "session_id": "not-registered",
            "url": "https://youtu.be/abc",
            "title": "Clip",
            "options": {"type": "simple", "ext": "mp4"}
        }))
        .validate(&registry)
        .unwrap_err();
        assert_eq!(err.invalid_fields(), ["session_id (unknown session)".to_string()]);
    }

    #[test]
    fn test_unknown_option_type_and_blank_title() {
        let registry = SessionRegistry::new();
        let (id, _rx) = registry.register();
        let err = payload(json!({
            "session_id": id,
            "url": "https://youtu.be/abc",
            "title": "   ",
            "options": {"type": "ultra", "ext": "mp4"}
        }))
        .validate(&registry)
        .unwrap_err();
        assert_eq!(err.invalid_fields(), ["title".to_string(), "options".to_string()]);
    }

    #[test]
    fn test_wrongly_typed_fields_are_listed() {
        let registry = SessionRegistry::new();
        let (id, _rx) = registry.register();
        let err = payload(json!({
            "session_id": id,
            "url": 123,
            "title": ["not", "a", "string"],
            "options": {"type": "simple", "ext": "mp4"}
        }))
        .validate(&registry)
        .unwrap_err();
        assert_eq!(err.invalid_fields(), ["url".to_string(), "title".to_string()]);

        let err = payload(json!({
            "session_id": 7,
            "url": "https://youtu.be/abc",
            "title": "Clip",
            "options": "simple"
        }))
        .validate(&registry)
        .unwrap_err();
        assert_eq!(err.invalid_fields(), ["options".to_string(), "session_id".to_string()]);
    }

    #[test]
    fn test_invalid_option_fields_are_listed() {
        let registry = SessionRegistry::new();
        let (id, _rx) = registry.register();
        let err = payload(json!({
            "session_id": id,
            "url": "https://youtu.be/abc",
            "title": "Clip",
            "options": {"type": "expert_video", "vcodec_id": "", "acodec_id": "140"}
        }))
        .validate(&registry)
        .unwrap_err();
        assert_eq!(err.invalid_fields(), ["options.vcodec_id".to_string()]);
    }
}
