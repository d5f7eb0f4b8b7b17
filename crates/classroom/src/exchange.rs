//! Answer exchange: a student's question plus a file reference in, generated
//! answer text out.
//!
//! The exchange keeps no state between calls. Each call reads the API key,
//! builds one client, renders the grounding prompt and makes a single
//! generation request.

use crate::material::{file_extension, mime_for_extension};
use crate::storage::{validate_object_path, ObjectStorage, UrlSigner};
use chrono::Utc;
use lectern_core::{AppConfig, GroundingMode, Locale, SecretSource};
use lectern_llm::{Attachment, ClientProvider, LlmClient, LlmRequest};
use lectern_prompt::{build_prompt, load_prompt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

const ANSWER_PROMPT_ID: &str = "material.answer";

/// A student's question about one material. Never persisted.
#[derive(Debug, Clone)]
pub struct Question {
    pub text: String,
    pub asked_by: String,
    /// Signed reference to the material file
    pub target_reference: String,
}

impl Question {
    pub fn new(
        text: impl Into<String>,
        asked_by: impl Into<String>,
        target_reference: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            asked_by: asked_by.into(),
            target_reference: target_reference.into(),
        }
    }
}

/// Generated answer text. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
}

/// Follow-up operations on a previous answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Summarize,
    Explain,
}

impl AnalysisKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "summarize" => Some(Self::Summarize),
            "explain" => Some(Self::Explain),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summarize => "summarize",
            Self::Explain => "explain",
        }
    }

    fn prompt_id(&self) -> &'static str {
        match self {
            Self::Summarize => "answer.summarize",
            Self::Explain => "answer.explain",
        }
    }
}

/// Input an exchange call cannot do without.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MissingField {
    #[error("question is required")]
    Question,
    #[error("file reference is required")]
    FileReference,
    #[error("answer text is required")]
    AnswerText,
}

/// Exchange failures, each surfaced to the caller as a distinct outcome.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Rejected before any external call
    #[error("invalid request: {0}")]
    InvalidRequest(MissingField),

    /// Missing credential or broken local setup; retrying will not help
    #[error("answer service misconfigured: {0}")]
    ServiceMisconfigured(String),

    /// The generation service failed; `detail` is for logs only
    #[error("answer generation failed: {detail}")]
    GenerationFailed { detail: String },

    /// Inline grounding could not load the referenced file
    #[error("file reference unreachable: {0}")]
    ReferenceUnreachable(String),
}

/// Settings the exchange reads from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct ExchangeSettings {
    pub model: String,
    pub locale: Locale,
    pub grounding: GroundingMode,
    /// Environment variable holding the API key
    pub api_key_env: Option<String>,
    /// Directory with prompt overrides
    pub prompts_dir: Option<PathBuf>,
    /// Largest file attached in inline grounding mode
    pub max_attachment_bytes: u64,
}

impl ExchangeSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.generation.model.clone(),
            locale: config.locale,
            grounding: config.generation.grounding,
            api_key_env: config.generation.api_key_env.clone(),
            prompts_dir: Some(config.prompts_dir()),
            max_attachment_bytes: config.generation.max_attachment_bytes,
        }
    }
}

/// Forwards questions to the configured generation service.
///
/// In inline mode only links issued by `signer` for the bucket of `storage`
/// are attached, read straight from storage.
#[derive(Clone)]
pub struct AnswerExchange {
    clients: Arc<dyn ClientProvider>,
    secrets: Arc<dyn SecretSource>,
    storage: Arc<dyn ObjectStorage>,
    signer: UrlSigner,
    settings: ExchangeSettings,
}

impl AnswerExchange {
    pub fn new(
        clients: Arc<dyn ClientProvider>,
        secrets: Arc<dyn SecretSource>,
        storage: Arc<dyn ObjectStorage>,
        signer: UrlSigner,
        settings: ExchangeSettings,
    ) -> Self {
        Self {
            clients,
            secrets,
            storage,
            signer,
            settings,
        }
    }

    /// Answer `question` using only the material behind its reference.
    pub async fn ask(&self, question: &Question) -> Result<Answer, ExchangeError> {
        if question.text.trim().is_empty() {
            return Err(ExchangeError::InvalidRequest(MissingField::Question));
        }
        if question.target_reference.trim().is_empty() {
            return Err(ExchangeError::InvalidRequest(MissingField::FileReference));
        }

        tracing::info!(
            "Answering question from {} ({} chars)",
            question.asked_by,
            question.text.chars().count()
        );

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.text.clone());
        vars.insert("fileReference".to_string(), question.target_reference.clone());

        self.generate(ANSWER_PROMPT_ID, vars, Some(&question.target_reference))
            .await
    }

    /// Summarize or explain a previous answer.
    pub async fn analyze(&self, text: &str, kind: AnalysisKind) -> Result<Answer, ExchangeError> {
        if text.trim().is_empty() {
            return Err(ExchangeError::InvalidRequest(MissingField::AnswerText));
        }

        tracing::info!("Running {} over {} chars", kind.as_str(), text.chars().count());

        let mut vars = HashMap::new();
        vars.insert("text".to_string(), text.to_string());
        self.generate(kind.prompt_id(), vars, None).await
    }

    async fn generate(
        &self,
        prompt_id: &str,
        vars: HashMap<String, String>,
        reference: Option<&str>,
    ) -> Result<Answer, ExchangeError> {
        let client = self.client()?;

        let definition = load_prompt(
            self.settings.prompts_dir.as_deref(),
            prompt_id,
            self.settings.locale,
        )
        .map_err(|e| ExchangeError::ServiceMisconfigured(e.to_string()))?;
        let built = build_prompt(&definition, vars)
            .map_err(|e| ExchangeError::ServiceMisconfigured(e.to_string()))?;

        let mut request = LlmRequest::new(built.user, &self.settings.model);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        if let Some(reference) = reference {
            if self.settings.grounding == GroundingMode::Inline {
                if client.supports_attachments() {
                    request = request.with_attachment(self.attachment(reference).await?);
                } else {
                    tracing::warn!(
                        "Provider {} cannot take attachments; sending reference only",
                        client.provider_name()
                    );
                }
            }
        }

        let response = client.complete(&request).await.map_err(|e| {
            tracing::error!("Generation via {} failed: {}", client.provider_name(), e);
            ExchangeError::GenerationFailed {
                detail: e.to_string(),
            }
        })?;

        tracing::debug!(
            "Generated {} chars with {} (finish: {:?})",
            response.content.len(),
            response.model,
            response.finish_reason
        );
        Ok(Answer {
            text: response.content,
        })
    }

    /// Build a client with the API key as currently configured.
    fn client(&self) -> Result<Arc<dyn LlmClient>, ExchangeError> {
        let api_key = self
            .settings
            .api_key_env
            .as_deref()
            .and_then(|name| self.secrets.secret(name));

        if self.clients.provider().requires_api_key() && api_key.is_none() {
            let name = self.settings.api_key_env.as_deref().unwrap_or("<unset>");
            return Err(ExchangeError::ServiceMisconfigured(format!(
                "API key not found in environment variable: {}",
                name
            )));
        }

        self.clients
            .connect(api_key.as_deref())
            .map_err(|e| ExchangeError::ServiceMisconfigured(e.to_string()))
    }

    /// Load the file behind a signed reference for inline grounding.
    ///
    /// Only links this service issued are accepted; nothing is fetched over
    /// the network.
    async fn attachment(&self, reference: &str) -> Result<Attachment, ExchangeError> {
        let location = self
            .signer
            .locate(reference)
            .filter(|location| location.bucket == self.storage.bucket())
            .ok_or_else(|| {
                ExchangeError::ReferenceUnreachable("not a stored material link".to_string())
            })?;
        validate_object_path(&location.path)
            .map_err(|e| ExchangeError::ReferenceUnreachable(e.to_string()))?;

        self.signer
            .verify(
                &location.bucket,
                &location.path,
                location.expires,
                &location.signature,
                Utc::now(),
            )
            .map_err(|e| {
                ExchangeError::ReferenceUnreachable(format!("{}: {}", location.path, e))
            })?;

        let bytes = self
            .storage
            .read(&location.path)
            .await
            .map_err(|e| ExchangeError::ReferenceUnreachable(e.to_string()))?
            .ok_or_else(|| {
                ExchangeError::ReferenceUnreachable(format!("object missing: {}", location.path))
            })?;

        if bytes.len() as u64 > self.settings.max_attachment_bytes {
            return Err(ExchangeError::ReferenceUnreachable(format!(
                "{} is {} bytes, over the {} byte attachment limit",
                location.path,
                bytes.len(),
                self.settings.max_attachment_bytes
            )));
        }

        let mime_type = file_extension(&location.path)
            .map(|ext| mime_for_extension(&ext))
            .unwrap_or("application/octet-stream");

        tracing::debug!("Attached {} bytes of {}", bytes.len(), mime_type);
        Ok(Attachment::new(mime_type, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::SignedFileReference;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use lectern_core::{AppError, AppResult, StaticSecrets};
    use lectern_llm::{LlmResponse, LlmUsage, ProviderType};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    const KEY_ENV: &str = "TEST_GEMINI_KEY";
    const BASE_URL: &str = "http://127.0.0.1:8080";
    const PDF_PATH: &str = "public/t1/1700000000000.pdf";

    #[derive(Default)]
    struct Recorder {
        calls: AtomicUsize,
        requests: Mutex<Vec<LlmRequest>>,
    }

    struct MockClient {
        recorder: Arc<Recorder>,
        reply: Result<String, String>,
        attachments: bool,
    }

    #[async_trait]
    impl LlmClient for MockClient {
        fn provider_name(&self) -> &str {
            "mock"
        }

        fn supports_attachments(&self) -> bool {
            self.attachments
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.recorder.calls.fetch_add(1, Ordering::SeqCst);
            self.recorder.requests.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(text) => Ok(LlmResponse {
                    content: text.clone(),
                    model: request.model.clone(),
                    usage: LlmUsage::new(10, 20),
                    finish_reason: Some("STOP".to_string()),
                }),
                Err(detail) => Err(AppError::Llm(detail.clone())),
            }
        }
    }

    struct MockProvider {
        recorder: Arc<Recorder>,
        reply: Result<String, String>,
        attachments: bool,
        keys_seen: Mutex<Vec<Option<String>>>,
    }

    impl MockProvider {
        fn replying(reply: Result<&str, &str>) -> Self {
            Self {
                recorder: Arc::new(Recorder::default()),
                reply: reply.map(str::to_string).map_err(str::to_string),
                attachments: false,
                keys_seen: Mutex::new(Vec::new()),
            }
        }

        fn attaching(reply: &str) -> Self {
            Self {
                attachments: true,
                ..Self::replying(Ok(reply))
            }
        }

        fn calls(&self) -> usize {
            self.recorder.calls.load(Ordering::SeqCst)
        }
    }

    impl ClientProvider for MockProvider {
        fn provider(&self) -> ProviderType {
            ProviderType::Gemini
        }

        fn connect(&self, api_key: Option<&str>) -> AppResult<Arc<dyn LlmClient>> {
            self.keys_seen
                .lock()
                .unwrap()
                .push(api_key.map(str::to_string));
            Ok(Arc::new(MockClient {
                recorder: self.recorder.clone(),
                reply: self.reply.clone(),
                attachments: self.attachments,
            }))
        }
    }

    #[derive(Default)]
    struct MemoryStorage {
        objects: Mutex<HashMap<String, Vec<u8>>>,
        reads: AtomicUsize,
    }

    impl MemoryStorage {
        fn with_object(path: &str, bytes: &[u8]) -> Self {
            let storage = Self::default();
            storage
                .objects
                .lock()
                .unwrap()
                .insert(path.to_string(), bytes.to_vec());
            storage
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ObjectStorage for MemoryStorage {
        fn bucket(&self) -> &str {
            "materials"
        }

        async fn upload(&self, path: &str, bytes: &[u8], _content_type: &str) -> AppResult<()> {
            self.objects
                .lock()
                .unwrap()
                .insert(path.to_string(), bytes.to_vec());
            Ok(())
        }

        async fn delete(&self, path: &str) -> AppResult<()> {
            self.objects.lock().unwrap().remove(path);
            Ok(())
        }

        async fn sign_url(&self, path: &str, ttl: Duration) -> AppResult<SignedFileReference> {
            signer().sign("materials", path, ttl, Utc::now())
        }

        async fn read(&self, path: &str) -> AppResult<Option<Vec<u8>>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.objects.lock().unwrap().get(path).cloned())
        }
    }

    fn signer() -> UrlSigner {
        UrlSigner::new("exchange-secret", BASE_URL).unwrap()
    }

    fn signed(path: &str) -> String {
        signer()
            .sign("materials", path, Duration::from_secs(3600), Utc::now())
            .unwrap()
            .url
    }

    fn settings(locale: Locale, grounding: GroundingMode) -> ExchangeSettings {
        ExchangeSettings {
            model: "gemini-1.5-pro-latest".to_string(),
            locale,
            grounding,
            api_key_env: Some(KEY_ENV.to_string()),
            prompts_dir: None,
            max_attachment_bytes: 1024,
        }
    }

    fn build(
        provider: Arc<MockProvider>,
        storage: Arc<MemoryStorage>,
        settings: ExchangeSettings,
    ) -> AnswerExchange {
        AnswerExchange::new(provider, Arc::new(keyed()), storage, signer(), settings)
    }

    fn exchange(provider: Arc<MockProvider>, secrets: StaticSecrets) -> AnswerExchange {
        AnswerExchange::new(
            provider,
            Arc::new(secrets),
            Arc::new(MemoryStorage::default()),
            signer(),
            settings(Locale::Ar, GroundingMode::Reference),
        )
    }

    fn inline(provider: Arc<MockProvider>, storage: Arc<MemoryStorage>) -> AnswerExchange {
        build(provider, storage, settings(Locale::En, GroundingMode::Inline))
    }

    fn keyed() -> StaticSecrets {
        StaticSecrets::new().with(KEY_ENV, "k-123")
    }

    fn question(text: &str) -> Question {
        Question::new(text, "s1", "https://files.test/storage/materials/a.pdf?expires=1&signature=ab")
    }

    #[tokio::test]
    async fn test_answer_returned_verbatim() {
        let provider = Arc::new(MockProvider::replying(Ok("  الفصل الأول يغطي الحركة.\n")));
        let exchange = exchange(provider.clone(), keyed());

        let answer = exchange.ask(&question("ما الذي يغطيه الفصل الأول؟")).await.unwrap();
        assert_eq!(answer.text, "  الفصل الأول يغطي الحركة.\n");
        assert_eq!(provider.calls(), 1);
        assert_eq!(
            provider.keys_seen.lock().unwrap().as_slice(),
            &[Some("k-123".to_string())]
        );
    }

    #[tokio::test]
    async fn test_prompt_embeds_question_and_reference() {
        let provider = Arc::new(MockProvider::replying(Ok("ok")));
        let exchange = exchange(provider.clone(), keyed());

        exchange.ask(&question("What is covered in chapter 1?")).await.unwrap();

        let requests = provider.recorder.requests.lock().unwrap();
        let prompt = &requests[0].prompt;
        assert!(prompt.contains("\"What is covered in chapter 1?\""));
        assert!(prompt.contains("https://files.test/storage/materials/a.pdf?expires=1&signature=ab"));
        assert!(prompt.contains("ولا تستخدم أي معلومات خارجية"));
        assert_eq!(requests[0].model, "gemini-1.5-pro-latest");
        assert!(requests[0].attachments.is_empty());
    }

    #[tokio::test]
    async fn test_english_locale_prompt() {
        let provider = Arc::new(MockProvider::replying(Ok("ok")));
        let exchange = build(
            provider.clone(),
            Arc::new(MemoryStorage::default()),
            settings(Locale::En, GroundingMode::Reference),
        );

        exchange.ask(&question("Why?")).await.unwrap();
        let prompt = provider.recorder.requests.lock().unwrap()[0].prompt.clone();
        assert!(prompt.contains("Answer the student's question in English"));
    }

    #[tokio::test]
    async fn test_blank_question_makes_no_calls() {
        let provider = Arc::new(MockProvider::replying(Ok("unused")));
        let exchange = exchange(provider.clone(), keyed());

        for text in ["", "   ", "\n\t"] {
            let result = exchange.ask(&question(text)).await;
            assert!(matches!(
                result,
                Err(ExchangeError::InvalidRequest(MissingField::Question))
            ));
        }
        assert_eq!(provider.calls(), 0);
        assert!(provider.keys_seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_reference_is_invalid() {
        let provider = Arc::new(MockProvider::replying(Ok("unused")));
        let exchange = exchange(provider.clone(), keyed());

        let result = exchange.ask(&Question::new("Why?", "s1", " ")).await;
        assert!(matches!(
            result,
            Err(ExchangeError::InvalidRequest(MissingField::FileReference))
        ));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_key_is_misconfigured() {
        let provider = Arc::new(MockProvider::replying(Ok("unused")));
        let exchange = exchange(provider.clone(), StaticSecrets::new());

        let result = exchange.ask(&question("Why?")).await;
        match result {
            Err(ExchangeError::ServiceMisconfigured(msg)) => assert!(msg.contains(KEY_ENV)),
            other => panic!("expected misconfiguration, got {:?}", other),
        }
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_keeps_detail() {
        let provider = Arc::new(MockProvider::replying(Err("API error 503: overloaded")));
        let exchange = exchange(provider.clone(), keyed());

        match exchange.ask(&question("Why?")).await {
            Err(ExchangeError::GenerationFailed { detail }) => {
                assert!(detail.contains("overloaded"))
            }
            other => panic!("expected generation failure, got {:?}", other),
        }
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_inline_mode_attaches_stored_file() {
        let provider = Arc::new(MockProvider::attaching("grounded"));
        let storage = Arc::new(MemoryStorage::with_object(PDF_PATH, b"%PDF-1.4 motion"));
        let exchange = inline(provider.clone(), storage.clone());

        let answer = exchange
            .ask(&Question::new("Why?", "s1", signed(PDF_PATH)))
            .await
            .unwrap();
        assert_eq!(answer.text, "grounded");
        assert_eq!(storage.reads(), 1);

        let requests = provider.recorder.requests.lock().unwrap();
        assert_eq!(requests[0].attachments.len(), 1);
        assert_eq!(requests[0].attachments[0].mime_type, "application/pdf");
        assert_eq!(requests[0].attachments[0].data, b"%PDF-1.4 motion");
    }

    #[tokio::test]
    async fn test_inline_mode_never_fetches_foreign_urls() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let port = listener.local_addr().unwrap().port();

        let provider = Arc::new(MockProvider::attaching("unused"));
        let storage = Arc::new(MemoryStorage::with_object(PDF_PATH, b"%PDF"));
        let exchange = inline(provider.clone(), storage.clone());

        let forged = signed(PDF_PATH).replace("127.0.0.1:8080", &format!("127.0.0.1:{}", port));
        for reference in [
            format!("http://127.0.0.1:{}/admin/secrets", port),
            forged,
            "http://169.254.169.254/latest/meta-data/".to_string(),
        ] {
            let result = exchange.ask(&Question::new("Why?", "s1", reference.clone())).await;
            assert!(
                matches!(result, Err(ExchangeError::ReferenceUnreachable(_))),
                "accepted {}",
                reference
            );
        }

        match listener.accept() {
            Err(e) => assert_eq!(e.kind(), std::io::ErrorKind::WouldBlock),
            Ok((_, peer)) => panic!("unexpected outbound connection from {}", peer),
        }
        assert_eq!(storage.reads(), 0);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_inline_mode_rejects_bad_signatures() {
        let provider = Arc::new(MockProvider::attaching("unused"));
        let storage = Arc::new(MemoryStorage::with_object(PDF_PATH, b"%PDF"));
        let exchange = inline(provider.clone(), storage.clone());

        let expired = signer()
            .sign(
                "materials",
                PDF_PATH,
                Duration::from_secs(60),
                Utc::now() - ChronoDuration::hours(2),
            )
            .unwrap()
            .url;
        let mut tampered = signed(PDF_PATH);
        let last = tampered.pop().unwrap();
        tampered.push(if last == '0' { '1' } else { '0' });
        let other_bucket = signer()
            .sign("archive", PDF_PATH, Duration::from_secs(60), Utc::now())
            .unwrap()
            .url;

        for reference in [expired, tampered, other_bucket] {
            let result = exchange.ask(&Question::new("Why?", "s1", reference)).await;
            assert!(matches!(result, Err(ExchangeError::ReferenceUnreachable(_))));
        }
        assert_eq!(storage.reads(), 0);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_inline_mode_missing_or_oversized_object() {
        let provider = Arc::new(MockProvider::attaching("unused"));
        let storage = Arc::new(MemoryStorage::with_object(PDF_PATH, &[0u8; 2048]));
        let exchange = inline(provider.clone(), storage.clone());

        let oversized = exchange
            .ask(&Question::new("Why?", "s1", signed(PDF_PATH)))
            .await;
        match oversized {
            Err(ExchangeError::ReferenceUnreachable(detail)) => {
                assert!(detail.contains("attachment limit"))
            }
            other => panic!("expected size rejection, got {:?}", other),
        }

        let missing = exchange
            .ask(&Question::new("Why?", "s1", signed("public/t1/gone.pdf")))
            .await;
        assert!(matches!(missing, Err(ExchangeError::ReferenceUnreachable(_))));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_inline_mode_without_attachment_support() {
        let provider = Arc::new(MockProvider::replying(Ok("fine")));
        let storage = Arc::new(MemoryStorage::default());
        let exchange = inline(provider.clone(), storage.clone());

        let answer = exchange
            .ask(&Question::new("Why?", "s1", "http://127.0.0.1:1/storage/materials/a.pdf"))
            .await
            .unwrap();
        assert_eq!(answer.text, "fine");
        assert_eq!(storage.reads(), 0);
    }

    #[tokio::test]
    async fn test_analyze_uses_operation_prompt() {
        let provider = Arc::new(MockProvider::replying(Ok("short")));
        let exchange = build(
            provider.clone(),
            Arc::new(MemoryStorage::default()),
            settings(Locale::En, GroundingMode::Reference),
        );

        let answer = exchange
            .analyze("A long answer about motion.", AnalysisKind::Summarize)
            .await
            .unwrap();
        assert_eq!(answer.text, "short");
        let prompt = provider.recorder.requests.lock().unwrap()[0].prompt.clone();
        assert!(prompt.contains("Summarize"));
        assert!(prompt.contains("A long answer about motion."));

        let empty = exchange.analyze("  ", AnalysisKind::Explain).await;
        assert!(matches!(
            empty,
            Err(ExchangeError::InvalidRequest(MissingField::AnswerText))
        ));
        assert_eq!(provider.calls(), 1);
    }

    #[test]
    fn test_analysis_kind_parse() {
        assert_eq!(AnalysisKind::parse("Summarize"), Some(AnalysisKind::Summarize));
        assert_eq!(AnalysisKind::parse("explain"), Some(AnalysisKind::Explain));
        assert_eq!(AnalysisKind::parse("translate"), None);
    }
}
