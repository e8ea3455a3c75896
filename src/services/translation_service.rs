//! Translation service - cached, deduplicated calls to the MyMemory API.
//!
//! # Behaviour
//!
//! - Results are cached per `(text, source, target)` for the lifetime of the
//!   process. The cache is unbounded.
//! - Concurrent requests for the same key share one provider call. A failed
//!   call is not cached; the next caller retries.
//! - MyMemory rejects queries over 500 bytes, so longer texts are split into
//!   chunks at sentence or word boundaries and translated chunk by chunk.
//! - When the provider hands back the input unchanged for a text made of
//!   several sentences, each sentence is retranslated on its own.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::{config::Config, error::AppError};

/// Largest query MyMemory accepts, in bytes.
pub const MAX_QUERY_BYTES: usize = 500;

/// Backend that performs a single translation call.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, AppError>;
}

/// MyMemory (`api.mymemory.translated.net`) HTTP client.
pub struct MyMemoryProvider {
    client: reqwest::Client,
    api_url: String,

    /// Contact email raising the anonymous daily quota
    email: Option<String>,
}

impl MyMemoryProvider {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_url: config.translation_api_url.clone(),
            email: config.translation_email.clone(),
        })
    }
}

#[async_trait]
impl TranslationProvider for MyMemoryProvider {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, AppError> {
        let langpair = format!("{source}|{target}");
        let mut query: Vec<(&str, &str)> = vec![("q", text), ("langpair", &langpair)];
        if let Some(email) = self.email.as_deref() {
            query.push(("de", email));
        }

        let response = self
            .client
            .get(&self.api_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| AppError::Translation(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Translation(format!(
                "provider answered HTTP {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Translation(format!("invalid response: {e}")))?;

        parse_mymemory_response(&body)
    }
}

/// Extract the translated text from a MyMemory JSON body.
///
/// `responseStatus` is sometimes a number and sometimes a string.
fn parse_mymemory_response(body: &Value) -> Result<String, AppError> {
    let status = match &body["responseStatus"] {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    };

    let translated = body["responseData"]["translatedText"].as_str();

    match (status, translated) {
        (Some(200), Some(text)) => Ok(decode_entities(text)),
        _ => {
            let details = body["responseDetails"]
                .as_str()
                .filter(|d| !d.is_empty())
                .or(translated)
                .unwrap_or("unknown error");
            Err(AppError::Translation(details.to_string()))
        }
    }
}

/// MyMemory returns a few characters as HTML entities.
fn decode_entities(text: &str) -> String {
    text.replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

type CacheKey = (String, String, String);

/// Cached translation front-end shared by all requests.
pub struct TranslationService {
    provider: Arc<dyn TranslationProvider>,
    cache: Mutex<HashMap<CacheKey, Arc<OnceCell<String>>>>,
}

impl TranslationService {
    pub fn new(provider: Arc<dyn TranslationProvider>) -> Self {
        Self {
            provider,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Translate `text` from `source` to `target`.
    ///
    /// Blank text and same-language requests are returned unchanged without
    /// calling the provider.
    pub async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, AppError> {
        if text.trim().is_empty() || same_language(source, target) {
            return Ok(text.to_string());
        }

        let key = (text.to_string(), source.to_lowercase(), target.to_lowercase());
        let cell = {
            let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            cache.entry(key.clone()).or_default().clone()
        };

        match cell
            .get_or_try_init(|| self.translate_uncached(text, source, target))
            .await
        {
            Ok(translated) => Ok(translated.clone()),
            Err(e) => {
                self.forget_failed(&key, &cell);
                Err(e)
            }
        }
    }

    /// Drop the still-empty cell of a failed translation so failing texts
    /// do not accumulate in the map.
    fn forget_failed(&self, key: &CacheKey, cell: &Arc<OnceCell<String>>) {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let stale = cache
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, cell) && !current.initialized());
        if stale {
            cache.remove(key);
        }
    }

    /// Translate, falling back to the original text on provider failure.
    pub async fn translate_or_original(&self, text: &str, source: &str, target: &str) -> String {
        match self.translate(text, source, target).await {
            Ok(translated) => translated,
            Err(e) => {
                tracing::warn!(error = %e, %source, %target, "Translation failed, using original text");
                text.to_string()
            }
        }
    }

    /// Number of cached translations.
    pub fn cached_entries(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    async fn translate_uncached(&self, text: &str, source: &str, target: &str) -> Result<String, AppError> {
        if text.len() <= MAX_QUERY_BYTES {
            return self.translate_piece(text, source, target).await;
        }

        let chunks = split_chunks(text, MAX_QUERY_BYTES);
        tracing::debug!(chunks = chunks.len(), bytes = text.len(), "Translating long text in chunks");

        let mut translated = String::with_capacity(text.len());
        for chunk in chunks {
            translated.push_str(&self.translate_piece(chunk, source, target).await?);
        }
        Ok(translated)
    }

    /// Translate text that fits in one query, retrying sentence by sentence
    /// when the provider returns it untouched.
    async fn translate_piece(&self, text: &str, source: &str, target: &str) -> Result<String, AppError> {
        let translated = self.call_preserving_whitespace(text, source, target).await?;
        if !is_unchanged(text, &translated) {
            return Ok(translated);
        }

        let sentences = split_sentences(text);
        if sentences.len() < 2 {
            return Ok(translated);
        }

        tracing::debug!(
            sentences = sentences.len(),
            "Provider returned text unchanged, retrying per sentence"
        );

        let mut joined = String::with_capacity(text.len());
        for sentence in sentences {
            joined.push_str(&self.call_preserving_whitespace(sentence, source, target).await?);
        }
        Ok(joined)
    }

    /// Provider call on the trimmed text, re-attaching the surrounding whitespace.
    async fn call_preserving_whitespace(&self, text: &str, source: &str, target: &str) -> Result<String, AppError> {
        let core = text.trim();
        if core.is_empty() {
            return Ok(text.to_string());
        }

        let start = text.len() - text.trim_start().len();
        let end = text.trim_end().len();
        let translated = self.provider.translate(core, source, target).await?;

        Ok(format!("{}{}{}", &text[..start], translated.trim(), &text[end..]))
    }
}

/// Languages match when their primary subtags are equal (`en` and `en-GB`).
pub fn same_language(a: &str, b: &str) -> bool {
    let primary = |code: &str| code.split(['-', '_']).next().unwrap_or("").to_ascii_lowercase();
    primary(a) == primary(b)
}

fn is_unchanged(original: &str, translated: &str) -> bool {
    original.trim().eq_ignore_ascii_case(translated.trim())
}

/// Split after sentence terminators followed by whitespace, and after line
/// breaks. Slices keep their trailing whitespace, so concatenating them
/// yields the input.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let boundary = match c {
            '\n' => true,
            '.' | '!' | '?' => chars.peek().is_some_and(|(_, next)| next.is_whitespace()),
            _ => false,
        };

        if boundary {
            // Swallow the whitespace run that follows
            let mut end = i + c.len_utf8();
            while let Some(&(j, next)) = chars.peek() {
                if !next.is_whitespace() {
                    break;
                }
                end = j + next.len_utf8();
                chars.next();
            }
            sentences.push(&text[start..end]);
            start = end;
        }
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

/// Split `text` into chunks of at most `max_bytes`, cutting after the last
/// complete sentence in the window, else after the last whitespace, else at
/// the last char boundary. Concatenating the chunks yields the input.
pub fn split_chunks(text: &str, max_bytes: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.len() > max_bytes {
        let mut limit = max_bytes;
        while limit > 0 && !rest.is_char_boundary(limit) {
            limit -= 1;
        }
        if limit == 0 {
            // First char is wider than max_bytes
            limit = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }

        let window = &rest[..limit];
        let cut = last_sentence_end(window)
            .or_else(|| last_whitespace_end(window))
            .unwrap_or(limit);

        chunks.push(&rest[..cut]);
        rest = &rest[cut..];
    }

    if !rest.is_empty() {
        chunks.push(rest);
    }
    chunks
}

/// End of the last complete sentence in `window`; the final slice may have
/// been cut mid-sentence by the window edge.
fn last_sentence_end(window: &str) -> Option<usize> {
    let sentences = split_sentences(window);
    if sentences.len() < 2 {
        return None;
    }
    sentences.last().map(|last| window.len() - last.len())
}

fn last_whitespace_end(window: &str) -> Option<usize> {
    window
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(i, c)| i + c.len_utf8())
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider that upper-cases text and counts calls. Texts listed in
    /// `echo` are returned unchanged; `fail` makes every call fail.
    #[derive(Default)]
    pub struct FakeProvider {
        pub calls: AtomicUsize,
        pub echo: Vec<String>,
        pub fail: bool,
        pub delay_ms: u64,
        pub seen: Mutex<Vec<String>>,
    }

    impl FakeProvider {
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TranslationProvider for FakeProvider {
        async fn translate(&self, text: &str, _source: &str, target: &str) -> Result<String, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(text.to_string());
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.fail {
                return Err(AppError::Translation("provider down".into()));
            }
            if self.echo.iter().any(|e| e == text) {
                return Ok(text.to_string());
            }
            Ok(format!("[{target}] {}", text.to_uppercase()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeProvider;
    use super::*;
    use serde_json::json;

    fn service(provider: FakeProvider) -> (Arc<FakeProvider>, TranslationService) {
        let provider = Arc::new(provider);
        let service = TranslationService::new(provider.clone());
        (provider, service)
    }

    #[tokio::test]
    async fn repeated_requests_hit_the_cache() {
        let (provider, service) = service(FakeProvider::default());

        let first = service.translate("Hello", "en", "fr").await.unwrap();
        let second = service.translate("Hello", "en", "fr").await.unwrap();

        assert_eq!(first, "[fr] HELLO");
        assert_eq!(first, second);
        assert_eq!(provider.calls(), 1);
        assert_eq!(service.cached_entries(), 1);

        service.translate("Hello", "en", "de").await.unwrap();
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn concurrent_identical_requests_share_one_call() {
        let (provider, service) = service(FakeProvider {
            delay_ms: 50,
            ..Default::default()
        });
        let service = Arc::new(service);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.translate("Welcome", "en", "es").await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "[es] WELCOME");
        }
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let (provider, service) = service(FakeProvider {
            fail: true,
            ..Default::default()
        });

        assert!(service.translate("Hello", "en", "fr").await.is_err());
        assert!(service.translate("Hello", "en", "fr").await.is_err());
        assert_eq!(provider.calls(), 2);
        assert_eq!(service.cached_entries(), 0);
        assert!(service.cache.lock().unwrap().is_empty());

        let fallback = service.translate_or_original("Hello", "en", "fr").await;
        assert_eq!(fallback, "Hello");
    }

    #[tokio::test]
    async fn same_language_and_blank_skip_the_provider() {
        let (provider, service) = service(FakeProvider::default());

        assert_eq!(service.translate("Hello", "en", "en-GB").await.unwrap(), "Hello");
        assert_eq!(service.translate("   ", "en", "fr").await.unwrap(), "   ");
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn unchanged_result_is_retried_per_sentence() {
        let text = "Great stay. Would come again!";
        let (provider, service) = service(FakeProvider {
            echo: vec![text.to_string()],
            ..Default::default()
        });

        let translated = service.translate(text, "en", "fr").await.unwrap();

        assert_eq!(translated, "[fr] GREAT STAY. [fr] WOULD COME AGAIN!");
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn unchanged_single_sentence_is_accepted() {
        let (provider, service) = service(FakeProvider {
            echo: vec!["Wifi".to_string()],
            ..Default::default()
        });

        assert_eq!(service.translate("Wifi", "en", "fr").await.unwrap(), "Wifi");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn long_text_is_translated_in_chunks() {
        let sentence = "The room was clean and the staff were friendly. ";
        let text = sentence.repeat(25);
        assert!(text.len() > MAX_QUERY_BYTES);

        let (provider, service) = service(FakeProvider::default());
        let translated = service.translate(&text, "en", "fr").await.unwrap();

        assert!(provider.calls() >= 3);
        for seen in provider.seen.lock().unwrap().iter() {
            assert!(seen.len() <= MAX_QUERY_BYTES);
        }
        assert_eq!(translated.matches("FRIENDLY.").count(), 25);
    }

    #[test]
    fn sentences_cover_the_input() {
        let text = "One. Two!  Three?\nFour 3.5 stars";
        let sentences = split_sentences(text);
        assert_eq!(sentences, vec!["One. ", "Two!  ", "Three?\n", "Four 3.5 stars"]);
        assert_eq!(sentences.concat(), text);
    }

    #[test]
    fn chunks_respect_limit_and_char_boundaries() {
        let text = "Très bien. ".repeat(60) + &"é".repeat(300);
        let chunks = split_chunks(&text, MAX_QUERY_BYTES);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.len() <= MAX_QUERY_BYTES && !c.is_empty()));
        assert_eq!(chunks.concat(), text);
        assert!(chunks[0].ends_with(". "));
    }

    #[test]
    fn chunks_fall_back_to_whitespace() {
        let text = "word ".repeat(30);
        let chunks = split_chunks(&text, 22);
        assert!(chunks.iter().all(|c| c.len() <= 22));
        assert_eq!(chunks[0], "word word word word ");
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn language_primary_subtag_comparison() {
        assert!(same_language("en", "EN-us"));
        assert!(same_language("pt_BR", "pt"));
        assert!(!same_language("en", "fr"));
    }

    #[test]
    fn parses_mymemory_success_and_errors() {
        let ok = json!({
            "responseData": { "translatedText": "C&#39;est parfait", "match": 1 },
            "responseStatus": 200
        });
        assert_eq!(parse_mymemory_response(&ok).unwrap(), "C'est parfait");

        let quota = json!({
            "responseData": { "translatedText": "MYMEMORY WARNING: YOU USED ALL AVAILABLE FREE TRANSLATIONS" },
            "responseStatus": "429",
            "responseDetails": ""
        });
        match parse_mymemory_response(&quota).unwrap_err() {
            AppError::Translation(msg) => assert!(msg.starts_with("MYMEMORY WARNING")),
            other => panic!("unexpected error: {other:?}"),
        }

        let bad_pair = json!({
            "responseData": { "translatedText": null },
            "responseStatus": 403,
            "responseDetails": "'AUTO' IS AN INVALID SOURCE LANGUAGE"
        });
        assert!(matches!(
            parse_mymemory_response(&bad_pair),
            Err(AppError::Translation(msg)) if msg.contains("INVALID SOURCE")
        ));
    }
}
