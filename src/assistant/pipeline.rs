//! Question answering: extract → rank → (broaden) → narrate.
//!
//! Extraction:  capability → lowercase whitespace split
//! Ranking:     keywords → raw-query words longer than 4 chars, appended
//! Narration:   capability → fixed apology
//!
//! Every stage degrades instead of failing, so `answer` always returns.

use super::capability::{CapabilityError, ContextRecord, KeywordExtractor, Narrator};
use crate::dataset::Facility;
use crate::ranking::{self, RankOptions, SearchHit};
use serde::Serialize;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

pub const APOLOGY: &str =
    "Lo siento, tengo un problema técnico para acceder a los datos. ¿Puedes probar de nuevo en unos segundos?";
pub const MAX_CONTEXT: usize = 5;
pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub query: String,
    pub keywords: Vec<String>,
    /// Extraction failed and the naive split was used.
    pub keywords_fallback: bool,
    /// The first ranking was empty and the raw query was searched again.
    pub broadened: bool,
    pub results: Vec<SearchHit>,
    pub reply: String,
    /// False when `reply` is the apology.
    pub narrated: bool,
}

impl Answer {
    fn apology(query: &str) -> Self {
        Self {
            query: query.to_string(),
            keywords: Vec::new(),
            keywords_fallback: true,
            broadened: false,
            results: Vec::new(),
            reply: APOLOGY.to_string(),
            narrated: false,
        }
    }
}

pub struct Assistant {
    extractor: Arc<dyn KeywordExtractor>,
    narrator: Arc<dyn Narrator>,
    rank: RankOptions,
    stage_timeout: Duration,
}

impl Assistant {
    pub fn new(extractor: Arc<dyn KeywordExtractor>, narrator: Arc<dyn Narrator>) -> Self {
        Self {
            extractor,
            narrator,
            rank: RankOptions::default(),
            stage_timeout: DEFAULT_STAGE_TIMEOUT,
        }
    }

    pub fn with_rank_options(mut self, rank: RankOptions) -> Self {
        self.rank = rank;
        self
    }

    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Answer one question against the loaded facilities.
    pub async fn answer(&self, facilities: &[Facility], query: &str) -> Answer {
        let (keywords, keywords_fallback) = self.keywords(query).await;

        let mut results = ranking::rank(facilities, &keywords, &self.rank);
        let mut broadened = false;
        if results.is_empty() {
            let broad = ranking::broad_keywords(query);
            debug!(?broad, "no hits, broadening");
            // Appended as-is: no deduplication against the first pass.
            results.extend(ranking::rank(facilities, &broad, &self.rank));
            broadened = true;
        }

        let records: Vec<ContextRecord> = results.iter().take(MAX_CONTEXT).map(ContextRecord::from_hit).collect();
        let (reply, narrated) = match self.staged(self.narrator.narrate(query, &records)).await {
            Ok(text) => (text, true),
            Err(e) => {
                warn!(error = %e, "narration failed, replying with apology");
                (APOLOGY.to_string(), false)
            }
        };

        info!(
            query,
            keywords = keywords.len(),
            keywords_fallback,
            broadened,
            results = results.len(),
            narrated,
            "answered"
        );

        Answer {
            query: query.to_string(),
            keywords,
            keywords_fallback,
            broadened,
            results,
            reply,
            narrated,
        }
    }

    async fn keywords(&self, query: &str) -> (Vec<String>, bool) {
        match self.staged(self.extractor.extract(query)).await {
            Ok(keywords) => (keywords, false),
            Err(e) => {
                warn!(error = %e, "keyword extraction failed, splitting query");
                (ranking::naive_keywords(query), true)
            }
        }
    }

    async fn staged<T>(&self, stage: impl Future<Output = Result<T, CapabilityError>>) -> Result<T, CapabilityError> {
        tokio::time::timeout(self.stage_timeout, stage)
            .await
            .unwrap_or(Err(CapabilityError::Timeout(self.stage_timeout)))
    }
}

/// One user's conversation: a new question supersedes the one in flight.
pub struct QuerySession {
    assistant: Arc<Assistant>,
    inflight: Mutex<Option<AbortHandle>>,
}

impl QuerySession {
    pub fn new(assistant: Arc<Assistant>) -> Self {
        Self {
            assistant,
            inflight: Mutex::new(None),
        }
    }

    /// Run the pipeline for `query`. Returns `None` if a later call to
    /// `submit` cancelled this one before it finished.
    pub async fn submit(&self, facilities: Arc<[Facility]>, query: String) -> Option<Answer> {
        let assistant = Arc::clone(&self.assistant);
        let q = query.clone();
        let task = tokio::spawn(async move { assistant.answer(&facilities, &q).await });

        let previous = self
            .inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task.abort_handle());
        if let Some(previous) = previous {
            previous.abort();
        }

        match task.await {
            Ok(answer) => Some(answer),
            Err(e) if e.is_cancelled() => {
                debug!(query, "superseded by a newer question");
                None
            }
            Err(e) => {
                warn!(query, error = %e, "pipeline task failed");
                Some(Answer::apology(&query))
            }
        }
    }
}
