//! Bounded-concurrency batch run over many articles.
//!
//! One task per article, at most `workers` running at once. Each task returns
//! its outcome to the orchestrating task; nothing is accumulated through
//! shared state. Within an article, summaries run in persona order.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::llm::{GeneratorStats, TextGenerator};
use crate::persona::{catalog_size, PersonaGenerator, PersonaMode, PersonaPromptSettings};
use crate::summary::{
    derive_title, record_file_names, BatchIndex, SummaryGenerator, SummaryPromptSettings, SummaryRecord,
};

/// What a batch run does
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub mode: PersonaMode,
    /// Personas per article in dynamic and mixed modes
    pub persona_count: usize,
    pub workers: usize,
    /// Root the articles were discovered under
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

/// Outcome of one article that produced a record
#[derive(Debug, Clone)]
pub struct ArticleOutcome {
    pub article: PathBuf,
    pub record_path: PathBuf,
    pub title: String,
    pub personas: usize,
    pub summaries: usize,
    pub fallback: bool,
}

/// Result of a whole run
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub index: BatchIndex,
    pub index_path: PathBuf,
    pub outcomes: Vec<ArticleOutcome>,
    pub elapsed_secs: f64,
    pub generator: GeneratorStats,
}

impl BatchReport {
    pub fn summaries_written(&self) -> usize {
        self.outcomes.iter().map(|o| o.summaries).sum()
    }

    pub fn fallback_articles(&self) -> usize {
        self.outcomes.iter().filter(|o| o.fallback).count()
    }
}

struct Pipeline {
    personas: PersonaGenerator,
    summaries: SummaryGenerator,
    options: BatchOptions,
}

pub struct BatchOrchestrator {
    client: Arc<dyn TextGenerator>,
    pipeline: Arc<Pipeline>,
}

impl BatchOrchestrator {
    pub fn new(
        client: Arc<dyn TextGenerator>,
        options: BatchOptions,
        persona_settings: PersonaPromptSettings,
        summary_settings: SummaryPromptSettings,
    ) -> Self {
        let pipeline = Pipeline {
            personas: PersonaGenerator::new(client.clone(), persona_settings),
            summaries: SummaryGenerator::new(client.clone(), summary_settings),
            options,
        };
        Self {
            client,
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn from_config(client: Arc<dyn TextGenerator>, config: &AppConfig) -> Self {
        let options = BatchOptions {
            mode: config.generation.mode,
            persona_count: config.generation.persona_count,
            workers: config.generation.workers,
            input_dir: config.input_dir(),
            output_dir: config.output_dir(),
        };
        Self::new(
            client,
            options,
            PersonaPromptSettings::from_config(&config.generation, &config.llm),
            SummaryPromptSettings::from_config(&config.generation, &config.llm),
        )
    }

    /// Process every article and write the batch index.
    ///
    /// Only an unwritable output directory or index file fails the run.
    pub async fn run(&self, articles: Vec<PathBuf>) -> Result<BatchReport> {
        let options = &self.pipeline.options;
        let start = Instant::now();

        fs::create_dir_all(&options.output_dir).map_err(|e| Error::io_write(&options.output_dir, e))?;

        info!(
            articles = articles.len(),
            mode = %options.mode,
            workers = options.workers,
            generator = self.client.name(),
            output = %options.output_dir.display(),
            "Starting batch"
        );

        let record_names = record_file_names(&articles, &options.input_dir, options.mode);

        let semaphore = Arc::new(Semaphore::new(options.workers.max(1)));
        let mut join_set: JoinSet<(PathBuf, Result<ArticleOutcome>)> = JoinSet::new();

        for (article, record_name) in articles.into_iter().zip(record_names) {
            let sem = semaphore.clone();
            let pipeline = self.pipeline.clone();
            join_set.spawn(async move {
                let result = match sem.acquire_owned().await {
                    Ok(_permit) => pipeline.process_article(&article, &record_name).await,
                    Err(e) => Err(Error::Internal(format!("Worker pool closed: {}", e))),
                };
                (article, result)
            });
        }

        let mut outcomes = Vec::new();
        let mut failed_files = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((_, Ok(outcome))) => {
                    info!(
                        article = %outcome.article.display(),
                        title = %outcome.title,
                        record = %outcome.record_path.display(),
                        summaries = outcome.summaries,
                        personas = outcome.personas,
                        "Record written"
                    );
                    outcomes.push(outcome);
                }
                Ok((article, Err(e))) => {
                    warn!(article = %article.display(), error = %e.format_for_log(), "Article skipped");
                    failed_files.push(article.display().to_string());
                }
                Err(e) => error!(error = %e, "Article task aborted"),
            }
        }

        let index = BatchIndex {
            processed_articles: outcomes.len(),
            article_files: outcomes.iter().map(|o| o.article.display().to_string()).collect(),
            failed_files,
            mode: options.mode,
            personas_per_article: options.mode.personas_per_article(options.persona_count, catalog_size()),
            timestamp: BatchIndex::timestamp_now(),
        };
        let index_path = options.output_dir.join(BatchIndex::file_name(options.mode));
        index.write(&index_path)?;

        let report = BatchReport {
            index,
            index_path,
            outcomes,
            elapsed_secs: start.elapsed().as_secs_f64(),
            generator: self.client.stats(),
        };

        info!(
            processed = report.index.processed_articles,
            failed = report.index.failed_files.len(),
            summaries = report.summaries_written(),
            fallbacks = report.fallback_articles(),
            requests = report.generator.requests,
            tokens = report.generator.total_tokens,
            elapsed_secs = report.elapsed_secs,
            "Batch complete"
        );

        Ok(report)
    }
}

impl Pipeline {
    /// Resolve personas, summarize with each in order, write one record.
    async fn process_article(&self, article: &Path, record_name: &str) -> Result<ArticleOutcome> {
        let content = fs::read_to_string(article).map_err(|e| Error::io_read(article, e))?;
        let title = derive_title(&content, article);
        info!(article = %article.display(), title = %title, "Processing article");

        let set = self
            .personas
            .resolve(self.options.mode, self.options.persona_count, &content, &title)
            .await;

        let mut record = SummaryRecord::new(article.display().to_string(), title.clone());
        for persona in &set.personas {
            record.add_persona(persona);
        }

        for persona in &set.personas {
            match self.summaries.generate(&content, &title, persona).await {
                Ok(summary) => {
                    let stats = summary.stats();
                    record.add_summary(&persona.name, summary.text, stats);
                }
                Err(e) => {
                    warn!(
                        article = %article.display(),
                        persona = %persona.name,
                        error = %e.format_for_log(),
                        "Summary failed, persona skipped"
                    );
                }
            }
        }

        if record.summaries.is_empty() {
            return Err(Error::Internal(format!(
                "no summaries generated for {} personas",
                set.personas.len()
            )));
        }

        let record_path = self.options.output_dir.join(record_name);
        record.write(&record_path)?;

        Ok(ArticleOutcome {
            article: article.to_path_buf(),
            record_path,
            title,
            personas: set.personas.len(),
            summaries: record.summaries.len(),
            fallback: set.fallback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockConfig, MockGenerator, MockReply};
    use crate::persona::{is_fixed, FIXED_PERSONA_NAMES};
    use tempfile::TempDir;

    fn articles(dir: &Path, count: usize) -> Vec<PathBuf> {
        let root = dir.join("articles");
        fs::create_dir_all(&root).unwrap();
        (0..count)
            .map(|i| {
                let path = root.join(format!("article_{}.md", i));
                fs::write(&path, format!("# Article {}\n\nBody text {}.", i, i)).unwrap();
                path
            })
            .collect()
    }

    fn orchestrator(mock: Arc<MockGenerator>, mode: PersonaMode, count: usize, out: PathBuf) -> BatchOrchestrator {
        let input_dir = out.with_file_name("articles");
        BatchOrchestrator::new(
            mock,
            BatchOptions {
                mode,
                persona_count: count,
                workers: 2,
                input_dir,
                output_dir: out,
            },
            PersonaPromptSettings::default(),
            SummaryPromptSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_fixed_mode_writes_records_and_index() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let mock = Arc::new(MockGenerator::replying("Nya~ summary!"));

        let report = orchestrator(mock.clone(), PersonaMode::Fixed, 3, out.clone())
            .run(articles(dir.path(), 3))
            .await
            .unwrap();

        assert_eq!(report.index.processed_articles, 3);
        assert_eq!(report.index.personas_per_article, 5);
        assert_eq!(report.summaries_written(), 15);
        assert_eq!(mock.call_count(), 15);

        let record = SummaryRecord::load(&out.join("article_1_fixed_summaries.json")).unwrap();
        assert_eq!(record.title, "Article 1");
        assert_eq!(record.summaries.keys().collect::<Vec<_>>(), FIXED_PERSONA_NAMES);
        assert_eq!(record.summaries.get("teacher").unwrap(), "Nya~ summary!");

        let index: BatchIndex =
            serde_json::from_str(&fs::read_to_string(out.join("summary_index_fixed.json")).unwrap()).unwrap();
        assert_eq!(index.article_files.len(), 3);
        assert!(index.failed_files.is_empty());
    }

    #[tokio::test]
    async fn test_same_stem_articles_get_distinct_records() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let root = dir.path().join("articles");
        let mut paths = Vec::new();
        for (category, body) in [("technical", "Stacks and queues."), ("academic", "Roman roads.")] {
            fs::create_dir_all(root.join(category)).unwrap();
            let path = root.join(category).join("intro.md");
            fs::write(&path, format!("# {} intro\n\n{}", category, body)).unwrap();
            paths.push(path);
        }

        let mock = Arc::new(MockGenerator::replying("ok"));
        let report = orchestrator(mock, PersonaMode::Fixed, 3, out.clone()).run(paths).await.unwrap();

        assert_eq!(report.index.processed_articles, 2);
        let technical = SummaryRecord::load(&out.join("technical_intro_fixed_summaries.json")).unwrap();
        let academic = SummaryRecord::load(&out.join("academic_intro_fixed_summaries.json")).unwrap();
        assert_eq!(technical.title, "technical intro");
        assert_eq!(academic.title, "academic intro");
        assert!(!out.join("intro_fixed_summaries.json").exists());
    }

    #[tokio::test]
    async fn test_failed_persona_is_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let mock = Arc::new(MockGenerator::replying("ok"));
        mock.on("patient, knowledgeable teacher", MockReply::Fail);

        let report = orchestrator(mock, PersonaMode::Fixed, 3, out.clone())
            .run(articles(dir.path(), 1))
            .await
            .unwrap();

        let record = SummaryRecord::load(&report.outcomes[0].record_path).unwrap();
        assert_eq!(record.summaries.len(), 4);
        assert!(!record.summaries.contains_key("teacher"));
        // persona metadata is kept even when its summary failed
        assert!(record.personas.contains_key("teacher"));
        assert!(record.summaries.keys().all(|k| record.personas.contains_key(k)));
    }

    #[tokio::test]
    async fn test_unreadable_article_lands_in_failed_files() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let mut paths = articles(dir.path(), 2);
        paths.push(dir.path().join("articles/missing.md"));

        let mock = Arc::new(MockGenerator::replying("ok"));
        let report = orchestrator(mock, PersonaMode::Fixed, 3, out).run(paths).await.unwrap();

        assert_eq!(report.index.processed_articles, 2);
        assert_eq!(report.index.failed_files.len(), 1);
        assert!(report.index.failed_files[0].ends_with("missing.md"));
    }

    #[tokio::test]
    async fn test_unparsable_persona_reply_falls_back_to_catalog() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let mock = Arc::new(MockGenerator::replying("A lovely summary."));
        mock.on("Create one distinctive", MockReply::Text("I'd rather not use JSON.".into()));

        let report = orchestrator(mock, PersonaMode::Single, 1, out.clone())
            .run(articles(dir.path(), 1))
            .await
            .unwrap();

        assert_eq!(report.fallback_articles(), 1);
        let record = SummaryRecord::load(&out.join("article_0_single_summaries.json")).unwrap();
        let names: Vec<&str> = record.summaries.keys().map(String::as_str).collect();
        assert_eq!(names.len(), 1);
        assert!(is_fixed(names[0]));
    }

    #[tokio::test]
    async fn test_all_summaries_failing_skips_record() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let mock = Arc::new(MockGenerator::new(MockConfig {
            fail_all: true,
            ..Default::default()
        }));

        let report = orchestrator(mock, PersonaMode::Dynamic, 2, out.clone())
            .run(articles(dir.path(), 1))
            .await
            .unwrap();

        assert_eq!(report.index.processed_articles, 0);
        assert_eq!(report.index.failed_files.len(), 1);
        assert!(!out.join("article_0_dynamic_summaries.json").exists());
        assert!(out.join("summary_index_dynamic.json").exists());
    }

    #[tokio::test]
    async fn test_worker_pool_bounds_concurrency() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let mock = Arc::new(MockGenerator::new(MockConfig {
            latency_ms: 20,
            default_reply: "ok".into(),
            ..Default::default()
        }));

        let started = Instant::now();
        let report = orchestrator(mock, PersonaMode::Mixed, 2, out)
            .run(articles(dir.path(), 4))
            .await
            .unwrap();

        // 4 articles x 2 sequential calls x 20ms over 2 workers
        assert!(started.elapsed().as_millis() >= 80);
        assert_eq!(report.index.processed_articles, 4);
    }
}
