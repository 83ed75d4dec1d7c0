//! End-to-end orchestration of one analysis run.
//!
//! The run context is immutable once built; every stage reads from it and
//! passes values forward instead of mutating shared state. Per-symbol
//! failures degrade to null fields and the batch always completes; only
//! batch-level store failures propagate to the caller.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use market_data_ingestor::models::{
    bar_series::BarSeries,
    request_params::{BarsRequestParams, ProviderParams},
    timeframe::TimeFrame,
};
use market_data_ingestor::providers::{
    DataProvider,
    errors::ProviderError,
    polygon_rest::{PolygonBarsParams, PolygonProvider},
};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::cache::{self, CacheKey};
use crate::config::AppConfig;
use crate::levels::{self, DerivedLevels};
use crate::merge::SymbolMerger;
use crate::news::{self, NewsfilterClient};
use crate::reconcile;
use crate::record::SymbolRecord;
use crate::store::{DocKey, DocumentStore, Filter};
use crate::summarize::Summarizer;
use crate::windows::{FetchWindow, SessionClock};

/// How many sessions back the five-minute window reaches.
const FIVE_MINUTE_DAYS_BACK: i64 = 2;
/// How many calendar days the daily window spans.
const DAILY_DAYS_BACK: i64 = 730;
/// Page limit for intraday aggregate requests.
const INTRADAY_LIMIT: u32 = 1000;
/// Page limit for daily aggregate requests.
const DAILY_LIMIT: u32 = 500;

/// Everything one run needs, fixed at the start of the run.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// The symbols to process, in processing order.
    pub symbols: Vec<String>,
    /// Exchange-local run date, `YYYY-MM-DD`.
    pub today: String,
    /// Exchange time zone.
    pub tz: Tz,
    /// The loaded configuration.
    pub config: AppConfig,
}

impl RunContext {
    /// Builds a context for `symbols` anchored at `now`.
    pub fn new(
        config: AppConfig,
        symbols: Vec<String>,
        now: chrono::DateTime<Utc>,
    ) -> anyhow::Result<Self> {
        let tz = config.tz()?;
        let clock = SessionClock::new(tz, config.run.delay_minutes);
        Ok(Self {
            symbols,
            today: clock.local_date_string(now),
            tz,
            config,
        })
    }

    /// The run date parsed back to a calendar date.
    pub fn today_date(&self) -> anyhow::Result<NaiveDate> {
        NaiveDate::parse_from_str(&self.today, "%Y-%m-%d")
            .map_err(|e| anyhow::anyhow!("run date did not parse: {e}"))
    }
}

/// What one run did, for logging and operator notification.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Symbols processed.
    pub processed: usize,
    /// New records written.
    pub inserted: usize,
    /// Existing records forward-filled and overwritten.
    pub updated: usize,
    /// Symbols whose individual write failed.
    pub write_failures: Vec<String>,
    /// Symbols whose write did not land on re-read.
    pub symbols_of_concern: Vec<String>,
    /// New suggestions persisted.
    pub suggestions_added: usize,
    /// Symbols of corrupt stored records found by the consistency check.
    pub corrupt_symbols: Vec<String>,
    /// Corrupt records deleted.
    pub corrupt_deleted: usize,
}

/// The wiring of one run: data provider, store, and the optional
/// suggestion-side collaborators.
pub struct Pipeline<'a> {
    /// Bar and reference data source.
    pub provider: &'a PolygonProvider,
    /// Record store.
    pub store: &'a dyn DocumentStore,
    /// Suggestion generator; `None` disables the suggestion step.
    pub summarizer: Option<&'a dyn Summarizer>,
    /// Secondary news feed; `None` means provider news only.
    pub newsfilter: Option<&'a NewsfilterClient>,
    /// Plan everything, write nothing.
    pub dry_run: bool,
}

impl Pipeline<'_> {
    /// Runs the whole pipeline for the context's symbol batch.
    pub async fn run(&self, ctx: &RunContext) -> anyhow::Result<RunReport> {
        cache::clear();
        let collection = ctx.config.run.collection.as_str();
        let clock = SessionClock::new(ctx.tz, ctx.config.run.delay_minutes);

        info!(symbols = ?ctx.symbols, today = %ctx.today, "starting run");

        let mut level_records: Vec<SymbolRecord> = Vec::with_capacity(ctx.symbols.len());
        for symbol in &ctx.symbols {
            let derived = self.derive_symbol(&clock, ctx, symbol).await;
            level_records.push(derived.into_record());
        }

        let fundamentals =
            crate::fundamentals::fetch_all(self.provider, &ctx.symbols, &ctx.today).await;

        let merged = SymbolMerger::new().merge(&ctx.symbols, &fundamentals, &level_records);

        let history =
            reconcile::fetch_history(self.store, collection, &ctx.symbols, ctx.today_date()?)?;
        let plan = reconcile::plan(&merged, &history, &ctx.today);
        info!(
            inserts = plan.inserts.len(),
            updates = plan.updates.len(),
            "reconciliation planned"
        );

        let applied = reconcile::apply(self.store, collection, &plan, self.dry_run);
        cache::invalidate(&CacheKey::new(&ctx.symbols, &ctx.today));

        let mut report = RunReport {
            processed: ctx.symbols.len(),
            inserted: applied.inserted,
            updated: applied.updated,
            write_failures: applied.failures,
            ..RunReport::default()
        };

        if !self.dry_run {
            report.symbols_of_concern =
                reconcile::verify(self.store, collection, &ctx.symbols, &ctx.today)?;
            if !report.symbols_of_concern.is_empty() {
                warn!(symbols = ?report.symbols_of_concern, "writes did not land");
            }

            if let Some(summarizer) = self.summarizer {
                report.suggestions_added = self
                    .process_suggestions(ctx, collection, summarizer)
                    .await?;
            }

            // Consistency check last, so a partial suggestion write earlier
            // in this run would already be visible to it.
            match reconcile::scrub(self.store, collection) {
                Ok(scrubbed) => {
                    report.corrupt_symbols = scrubbed.found;
                    report.corrupt_deleted = scrubbed.deleted;
                }
                Err(e) => error!(error = %e, "consistency check failed"),
            }
        }

        info!(
            processed = report.processed,
            inserted = report.inserted,
            updated = report.updated,
            suggestions = report.suggestions_added,
            "run finished"
        );
        Ok(report)
    }

    /// Fetches the three bar granularities for one symbol and derives its
    /// levels. Never fails; fetch problems degrade to empty series.
    async fn derive_symbol(
        &self,
        clock: &SessionClock,
        ctx: &RunContext,
        symbol: &str,
    ) -> DerivedLevels {
        let minute = self
            .fetch_series(
                symbol,
                TimeFrame::minutes(1),
                clock.intraday_window(0),
                INTRADAY_LIMIT,
            )
            .await;
        let five_minute = self
            .fetch_series(
                symbol,
                TimeFrame::minutes(5),
                clock.intraday_window(FIVE_MINUTE_DAYS_BACK),
                INTRADAY_LIMIT,
            )
            .await;
        let daily = self
            .fetch_series(
                symbol,
                TimeFrame::daily(),
                clock.daily_window(DAILY_DAYS_BACK),
                DAILY_LIMIT,
            )
            .await;

        levels::derive(
            symbol,
            &minute,
            &five_minute,
            &daily,
            &ctx.tz,
            &ctx.config.level_config(),
        )
    }

    /// One bar fetch, degraded to an empty series on every failure mode.
    async fn fetch_series(
        &self,
        symbol: &str,
        timeframe: TimeFrame,
        window: Option<FetchWindow>,
        limit: u32,
    ) -> BarSeries {
        let now = Utc::now();
        let Some(window) = window else {
            warn!(symbol, "fetch window not open yet");
            return BarSeries::empty(symbol, timeframe, now, now);
        };

        let params = BarsRequestParams {
            symbols: vec![symbol.to_string()],
            timeframe,
            start: window.start,
            end: window.end,
            provider_specific: ProviderParams::Polygon(PolygonBarsParams {
                limit: Some(limit),
                ..PolygonBarsParams::default()
            }),
        };

        match self.provider.fetch_bars(params).await {
            Ok(mut series) => match series.pop() {
                Some(series) => series,
                None => BarSeries::empty(symbol, timeframe, window.start, window.end),
            },
            Err(ProviderError::Rejected(msg)) => {
                warn!(symbol, msg, "bar request rejected; continuing with no data");
                BarSeries::empty(symbol, timeframe, window.start, window.end)
            }
            Err(e) => {
                error!(symbol, error = %e, "bar fetch failed; continuing with no data");
                BarSeries::empty(symbol, timeframe, window.start, window.end)
            }
        }
    }

    /// Today's stored documents for the batch, through the query cache.
    fn today_docs(&self, ctx: &RunContext, collection: &str) -> anyhow::Result<Vec<Value>> {
        let key = CacheKey::new(&ctx.symbols, &ctx.today);
        if let Some(docs) = cache::get(&key) {
            return Ok(docs.as_ref().clone());
        }

        let filter = Filter::new()
            .is_in("symbol", ctx.symbols.clone())
            .eq("today_date", ctx.today.as_str());
        let docs = self.store.find(collection, &filter)?;
        cache::put(key, docs.clone());
        Ok(docs)
    }

    /// Generates and persists suggestions for symbols that do not have one
    /// yet today. Returns how many were saved.
    async fn process_suggestions(
        &self,
        ctx: &RunContext,
        collection: &str,
        summarizer: &dyn Summarizer,
    ) -> anyhow::Result<usize> {
        let docs = self.today_docs(ctx, collection)?;
        let has_suggestion = |symbol: &str| {
            docs.iter().any(|d| {
                d.get("symbol").and_then(Value::as_str) == Some(symbol)
                    && d.get("suggestion")
                        .and_then(Value::as_str)
                        .is_some_and(|s| !s.is_empty())
            })
        };

        let to_analyze: Vec<&String> = ctx
            .symbols
            .iter()
            .filter(|s| !has_suggestion(s.as_str()))
            .collect();
        if to_analyze.is_empty() {
            info!("no new symbols need suggestion analysis");
            return Ok(0);
        }

        let mut saved = 0;
        for symbol in to_analyze {
            let items = news::gather_news(
                self.provider,
                self.newsfilter,
                symbol,
                ctx.config.news.article_limit,
            )
            .await;

            if items.is_empty() {
                info!(symbol, "no recent news; skipping suggestion");
                continue;
            }

            let text = serde_json::to_string(&items)?;
            let suggestion = match summarizer.summarize(&text).await {
                Ok(summary) => match summarizer.suggest(&summary).await {
                    Ok(suggestion) => suggestion,
                    Err(e) => {
                        error!(symbol, error = %e, "suggestion generation failed");
                        continue;
                    }
                },
                Err(e) => {
                    error!(symbol, error = %e, "news summarization failed");
                    continue;
                }
            };

            if self.save_suggestion(ctx, collection, symbol, &suggestion)? {
                saved += 1;
            }
        }

        // Writes happened under this key; next read must hit the store.
        cache::invalidate(&CacheKey::new(&ctx.symbols, &ctx.today));
        Ok(saved)
    }

    /// Patches today's record with a suggestion, read-modify-write. A symbol
    /// with no record today is skipped: writing a bare suggestion document
    /// would create exactly the partial records the consistency check
    /// deletes.
    fn save_suggestion(
        &self,
        ctx: &RunContext,
        collection: &str,
        symbol: &str,
        suggestion: &str,
    ) -> anyhow::Result<bool> {
        let filter = Filter::new()
            .eq("symbol", symbol)
            .eq("today_date", ctx.today.as_str());
        let mut docs = self.store.find(collection, &filter)?;

        let Some(doc) = docs.pop() else {
            warn!(symbol, "no record today to attach the suggestion to");
            return Ok(false);
        };
        let Some(mut record) = SymbolRecord::from_value(&doc) else {
            warn!(symbol, "stored record is not an object");
            return Ok(false);
        };

        record.set("suggestion", Value::String(suggestion.to_string()));
        let key = DocKey::new(symbol, ctx.today.as_str());
        self.store
            .upsert(collection, &key, &record.to_value())?;
        info!(symbol, "suggestion saved");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_context_uses_the_local_calendar_date() {
        let config = AppConfig::default();
        // 2025-03-04 01:00 UTC is still 2025-03-03 in New York.
        let now = chrono::DateTime::parse_from_rfc3339("2025-03-04T01:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let ctx = RunContext::new(config, vec!["AAA".to_string()], now).unwrap();
        assert_eq!(ctx.today, "2025-03-03");
        assert_eq!(ctx.today_date().unwrap().to_string(), "2025-03-03");
    }
}
