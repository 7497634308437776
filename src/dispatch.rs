//! Concurrent multi-engine fan-out with per-engine failure isolation.
//!
//! One logical query runs against several engines at once, each in its own
//! tokio task with its own [`Searcher`] (and therefore its own fetcher and
//! pacing state). Outcomes are collected in completion order into two maps
//! — successes and failures — so one engine's captcha wall never costs the
//! caller the other engines' results.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};

use crate::cache::SearchCache;
use crate::config::{ClientConfig, SearchOptions};
use crate::error::SearchError;
use crate::searcher::Searcher;
use crate::types::{SearchEngine, SearchResult};

/// Options for a multi-engine dispatch.
#[derive(Clone)]
pub struct MultiSearchOptions {
    /// Engines to query. `None` means every engine except google, which
    /// needs the paid unblocking relay to answer reliably.
    pub engines: Option<Vec<SearchEngine>>,
    /// Results requested per engine.
    pub num_results: usize,
    /// Language code hint passed to every engine.
    pub language: Option<String>,
    /// Country code hint passed to every engine.
    pub country: Option<String>,
    /// Request safe-search filtering.
    pub safe_search: bool,
    /// Consult the shared cache before fetching.
    pub use_cache: bool,
    /// Query engines concurrently. With a single engine the sequential
    /// path is used regardless.
    pub parallel: bool,
    /// Return the first engine failure immediately instead of collecting
    /// it. In-flight engines are abandoned, not cancelled — their requests
    /// run to completion in the background.
    pub raise_on_first_error: bool,
    /// Fetch configuration applied to every engine's searcher.
    pub client: ClientConfig,
    /// Cache shared across engine tasks. Concurrent writes to distinct
    /// keys are safe; same-key writes are last-write-wins.
    pub cache: Option<Arc<dyn SearchCache>>,
    /// Per-engine endpoint overrides, e.g. to point at test servers.
    pub base_url_overrides: HashMap<SearchEngine, String>,
}

impl Default for MultiSearchOptions {
    fn default() -> Self {
        Self {
            engines: None,
            num_results: 5,
            language: None,
            country: None,
            safe_search: true,
            use_cache: true,
            parallel: true,
            raise_on_first_error: false,
            client: ClientConfig::default(),
            cache: None,
            base_url_overrides: HashMap::new(),
        }
    }
}

/// Outcome of a multi-engine dispatch.
///
/// Every requested engine lands in exactly one of the two maps, keyed by
/// its identifier.
#[derive(Debug, Default)]
pub struct MultiSearchOutcome {
    /// Per-engine result lists for engines that answered.
    pub results: HashMap<String, Vec<SearchResult>>,
    /// Per-engine errors for engines that failed.
    pub errors: HashMap<String, SearchError>,
}

impl MultiSearchOutcome {
    /// Whether any engine failed.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Identifiers of the engines that answered.
    pub fn successful_engines(&self) -> Vec<String> {
        self.results.keys().cloned().collect()
    }

    /// Identifiers of the engines that failed.
    pub fn failed_engines(&self) -> Vec<String> {
        self.errors.keys().cloned().collect()
    }

    /// Total number of results across all engines.
    pub fn total_results(&self) -> usize {
        self.results.values().map(Vec::len).sum()
    }
}

/// The engines queried when the caller does not pick a set: everything
/// except google.
pub fn default_engines() -> Vec<SearchEngine> {
    SearchEngine::all()
        .iter()
        .copied()
        .filter(|e| *e != SearchEngine::Google)
        .collect()
}

/// Query several engines for one logical search.
///
/// Each engine runs through its own [`Searcher`] in its own task; a
/// failure in one engine is recorded and never disturbs the others. With
/// `raise_on_first_error` the first failure observed is returned instead.
///
/// # Errors
///
/// Returns [`SearchError::Config`] for an invalid client configuration or
/// an empty engine list, and any per-engine error when
/// `raise_on_first_error` is set.
pub async fn search_all(
    query: &str,
    options: &MultiSearchOptions,
) -> Result<MultiSearchOutcome, SearchError> {
    options.client.validate()?;

    let engines = requested_engines(options)?;
    let search_opts = SearchOptions {
        page: 1,
        num_results: options.num_results,
        language: options.language.clone(),
        country: options.country.clone(),
        safe_search: options.safe_search,
        use_cache: options.use_cache,
    };

    let mut outcome = MultiSearchOutcome::default();

    if options.parallel && engines.len() > 1 {
        let mut tasks = FuturesUnordered::new();
        for engine in engines {
            let query = query.to_owned();
            let search_opts = search_opts.clone();
            let client = options.client.clone();
            let cache = options.cache.clone();
            let base_override = options.base_url_overrides.get(&engine).cloned();

            let handle = tokio::spawn(async move {
                search_one(engine, &query, &search_opts, &client, cache, base_override).await
            });
            tasks.push(async move { (engine, handle.await) });
        }

        while let Some((engine, joined)) = tasks.next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) => Err(SearchError::Network(format!("engine task failed: {e}"))),
            };
            record(&mut outcome, engine, result, options.raise_on_first_error)?;
        }
    } else {
        for engine in engines {
            let base_override = options.base_url_overrides.get(&engine).cloned();
            let result = search_one(
                engine,
                query,
                &search_opts,
                &options.client,
                options.cache.clone(),
                base_override,
            )
            .await;
            record(&mut outcome, engine, result, options.raise_on_first_error)?;
        }
    }

    Ok(outcome)
}

/// Resolve and de-duplicate the requested engine set, preserving order.
fn requested_engines(options: &MultiSearchOptions) -> Result<Vec<SearchEngine>, SearchError> {
    let engines = match options.engines {
        Some(ref list) => {
            let mut seen = HashSet::new();
            list.iter()
                .copied()
                .filter(|e| seen.insert(*e))
                .collect::<Vec<_>>()
        }
        None => default_engines(),
    };
    if engines.is_empty() {
        return Err(SearchError::Config(
            "at least one engine must be requested".into(),
        ));
    }
    Ok(engines)
}

async fn search_one(
    engine: SearchEngine,
    query: &str,
    options: &SearchOptions,
    client: &ClientConfig,
    cache: Option<Arc<dyn SearchCache>>,
    base_override: Option<String>,
) -> Result<Vec<SearchResult>, SearchError> {
    let mut searcher = Searcher::with_config(engine, client)?;
    if let Some(cache) = cache {
        searcher = searcher.with_cache(cache);
    }
    if let Some(base) = base_override {
        searcher = searcher.with_base_url(base);
    }
    searcher.search(query, options).await
}

fn record(
    outcome: &mut MultiSearchOutcome,
    engine: SearchEngine,
    result: Result<Vec<SearchResult>, SearchError>,
    raise_on_first_error: bool,
) -> Result<(), SearchError> {
    match result {
        Ok(results) => {
            tracing::debug!(engine = %engine, count = results.len(), "engine answered");
            outcome.results.insert(engine.name().to_owned(), results);
            Ok(())
        }
        Err(err) => {
            tracing::warn!(engine = %engine, error = %err, "engine query failed");
            if raise_on_first_error {
                return Err(err);
            }
            outcome.errors.insert(engine.name().to_owned(), err);
            Ok(())
        }
    }
}
