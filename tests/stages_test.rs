mod common;

use std::sync::Arc;

use arxiv_curator::error::{AppError, PipelineError};
use arxiv_curator::infrastructure::{CacheEntry, CachedField, PaperCache};
use arxiv_curator::models::{BatchState, StageProgress};
use arxiv_curator::workflow::{AnalysisStage, ContentStage, SearchStage};
use arxiv_curator::Pipeline;
use common::{collaborators, hit, pdf_url, test_config, StubCompletion, StubContent, StubSearch};
use serde_json::json;
use tempfile::TempDir;

#[tokio::test]
async fn test_search_filters_category_and_window() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let search = Arc::new(StubSearch::new(vec![
        hit("2401.0001", "Recent AI", "cs.AI", 1),
        hit("2401.0002", "Off topic", "math.AG", 1),
        hit("2401.0003", "Too old", "cs.AI", 24 * 30),
    ]));

    let pipeline = Pipeline::new().with_stage(SearchStage::new(search.clone(), &config));
    let state = pipeline.run("custom query").await.unwrap();

    assert_eq!(state.progress, StageProgress::Searched);
    let ids: Vec<&str> = state.raw_papers.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["2401.0001"]);
    // 非空查询原样传给搜索
    assert_eq!(search.queries.lock().unwrap()[0], "custom query");
}

#[tokio::test]
async fn test_content_tolerates_missing_pdf_and_download_failure() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());

    let mut no_pdf = hit("2401.0003", "No PDF", "cs.AI", 1);
    no_pdf.pdf_url = None;
    let search = Arc::new(StubSearch::new(vec![
        hit("2401.0001", "Downloadable", "cs.AI", 1),
        hit("2401.0002", "Broken link", "cs.AI", 1),
        no_pdf,
    ]));
    let content =
        Arc::new(StubContent::new().with_document(&pdf_url("2401.0001"), "body text"));
    let deps = collaborators(
        &config,
        search.clone(),
        content.clone(),
        Arc::new(StubCompletion::new()),
    )
    .await;

    let pipeline = Pipeline::new()
        .with_stage(SearchStage::new(search, &config))
        .with_stage(ContentStage::new(deps.cache.clone(), content.clone()));
    let state = pipeline.run("").await.unwrap();

    assert_eq!(state.progress, StageProgress::ContentFetched);
    assert_eq!(state.raw_papers.len(), 3);
    assert_eq!(state.raw_papers[0].content.as_deref(), Some("body text"));
    assert!(state.raw_papers[1].content.is_none());
    assert!(state.raw_papers[2].content.is_none());

    assert_eq!(state.fetch_stats.total, 3);
    assert_eq!(state.fetch_stats.downloaded, 1);
    assert_eq!(state.fetch_stats.failures, 1);
    assert_eq!(state.fetch_stats.missing_pdf, 1);
    // 无 PDF 的论文不会触发下载
    assert_eq!(content.download_count(), 2);

    // 失败的论文不写缓存
    assert!(deps.cache.load("2401.0002").await.is_none());
}

#[tokio::test]
async fn test_cached_fields_skip_work_and_keep_unknown_fields() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());

    let cache = PaperCache::open(dir.path()).await.unwrap();
    let mut entry = CacheEntry::default();
    entry.set(CachedField::Content, "cached body".to_string());
    entry.set(CachedField::Analysis, "cached analysis".to_string());
    entry.insert_raw("reviewer_note", json!("keep me"));
    cache.save("2401.0001", &entry).await.unwrap();

    let search = Arc::new(StubSearch::new(vec![hit(
        "2401.0001",
        "Cached paper",
        "cs.AI",
        1,
    )]));
    let content = Arc::new(StubContent::new());
    let llm = Arc::new(StubCompletion::new().on("cached analysis", r#"{"score_global": 7}"#));
    let deps = collaborators(&config, search, content.clone(), llm.clone()).await;

    let state = Pipeline::standard(&config, &deps).run("").await.unwrap();

    assert_eq!(content.download_count(), 0);
    // 只有打分需要调用 LLM
    assert_eq!(llm.call_count(), 1);
    assert_eq!(state.analyzed[0].analysis.as_deref(), Some("cached analysis"));
    assert_eq!(state.top_papers[0].score_value, 7.0);

    let stored = cache.load("2401.0001").await.unwrap();
    assert_eq!(stored.get(CachedField::Content), Some("cached body"));
    assert_eq!(stored.get(CachedField::Analysis), Some("cached analysis"));
    assert_eq!(stored.get(CachedField::Score), Some(r#"{"score_global": 7}"#));
    assert_eq!(stored.raw("reviewer_note"), Some(&json!("keep me")));
}

#[tokio::test]
async fn test_mistyped_cached_field_keeps_valid_content() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());

    let cache = PaperCache::open(dir.path()).await.unwrap();
    std::fs::write(
        cache.entry_path("2401.0001"),
        r#"{"content": "cached body", "analysis": 42, "note": "keep"}"#,
    )
    .unwrap();

    let search = Arc::new(StubSearch::new(vec![hit(
        "2401.0001",
        "Partly cached",
        "cs.AI",
        1,
    )]));
    let content = Arc::new(StubContent::new().with_document(&pdf_url("2401.0001"), "fresh body"));
    let llm = Arc::new(StubCompletion::new().on("Partly cached", "new analysis"));
    let deps = collaborators(&config, search, content.clone(), llm.clone()).await;

    let state = Pipeline::standard(&config, &deps).run("").await.unwrap();

    assert_eq!(content.download_count(), 0);
    assert_eq!(state.fetch_stats.cache_hits, 1);
    assert_eq!(state.raw_papers[0].content.as_deref(), Some("cached body"));
    assert_eq!(state.analysis_stats.generated, 1);
    assert_eq!(state.analyzed[0].analysis.as_deref(), Some("new analysis"));

    let stored = cache.load("2401.0001").await.unwrap();
    assert_eq!(stored.get(CachedField::Content), Some("cached body"));
    assert_eq!(stored.get(CachedField::Analysis), Some("new analysis"));
    assert_eq!(stored.raw("note"), Some(&json!("keep")));
}

#[tokio::test]
async fn test_malformed_score_ranks_last_without_failing() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let search = Arc::new(StubSearch::new(vec![
        hit("2401.0001", "Garbled score", "cs.AI", 1),
        hit("2401.0002", "Clean score", "cs.AI", 1),
    ]));
    let llm = Arc::new(
        StubCompletion::new()
            .on("ANALYSIS-BAD", "I would rate this paper highly")
            .on("ANALYSIS-GOOD", r#"{"score_global": 3}"#)
            .on("Garbled score", "ANALYSIS-BAD")
            .on("Clean score", "ANALYSIS-GOOD"),
    );
    let deps = collaborators(&config, search, Arc::new(StubContent::new()), llm).await;

    let state = Pipeline::standard(&config, &deps).run("").await.unwrap();

    assert_eq!(state.scored.len(), 2);
    assert_eq!(state.top_papers[0].id, "2401.0002");
    assert_eq!(state.top_papers[1].id, "2401.0001");
    assert_eq!(state.top_papers[1].score_value, 0.0);
    assert!(state.top_papers[1].score_json.is_empty());
}

#[tokio::test]
async fn test_analysis_failure_aborts_run() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let search = Arc::new(StubSearch::new(vec![hit("2401.0001", "Any", "cs.AI", 1)]));
    let llm = Arc::new(StubCompletion::failing());
    let deps = collaborators(&config, search, Arc::new(StubContent::new()), llm.clone()).await;

    let result = Pipeline::standard(&config, &deps).run("").await;

    assert!(matches!(result, Err(AppError::Completion(_))));
    assert_eq!(llm.chat_count(), 0);
    assert!(deps
        .cache
        .load_field("2401.0001", CachedField::Analysis)
        .await
        .is_none());
}

#[tokio::test]
async fn test_empty_search_publishes_empty_post() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let llm = Arc::new(StubCompletion::new());
    let deps = collaborators(
        &config,
        Arc::new(StubSearch::new(Vec::new())),
        Arc::new(StubContent::new()),
        llm.clone(),
    )
    .await;

    let state = Pipeline::standard(&config, &deps).run("").await.unwrap();

    assert_eq!(state.progress, StageProgress::Published);
    assert!(state.post.is_empty());
    assert!(state.top_papers.is_empty());
    assert_eq!(llm.call_count(), 0);
    assert_eq!(llm.chat_count(), 0);
}

#[tokio::test]
async fn test_stage_out_of_order_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let llm = Arc::new(StubCompletion::new());
    let deps = collaborators(
        &config,
        Arc::new(StubSearch::new(Vec::new())),
        Arc::new(StubContent::new()),
        llm.clone(),
    )
    .await;

    let pipeline = Pipeline::new().with_stage(AnalysisStage::new(
        deps.cache.clone(),
        deps.llm.clone(),
        deps.prompts.clone(),
        &config,
    ));
    let mut state = BatchState::new("");
    let result = pipeline.resume(&mut state).await;

    match result {
        Err(AppError::Pipeline(PipelineError::StageOutOfOrder {
            stage,
            expected,
            found,
        })) => {
            assert_eq!(stage, "analyze");
            assert_eq!(expected, "content_fetched");
            assert_eq!(found, "created");
        }
        other => panic!("应返回阶段顺序错误: {:?}", other),
    }
    assert_eq!(state.progress, StageProgress::Created);
    assert_eq!(llm.call_count(), 0);
}
