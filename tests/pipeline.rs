//! End-to-end pipeline test: standardize a theme, dispatch a task and run
//! the extraction worker against stubbed rendering and an in-memory queue.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use diesel_async::RunQueryDsl;
use tempfile::TempDir;

use themeharvest::models::{NewDataSource, TaskStatus};
use themeharvest::queue::{QueueError, WorkItem, WorkPublisher};
use themeharvest::render::{PageRenderer, RenderError};
use themeharvest::repository::{migrations::run_migrations, DbPool, Repositories};
use themeharvest::services::{
    NamedMapping, ProposedFieldSpec, SourceConfigRequest, StandardizeRequest, TaskDispatcher,
    ThemeStandardizer,
};
use themeharvest::worker::ExtractionWorker;

async fn scratch_db() -> (DbPool, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("pipeline.db");
    let url = format!("sqlite:{}", db_path.display());
    run_migrations(&url).await.unwrap();
    (DbPool::from_path(&db_path), dir)
}

#[derive(Default)]
struct MemoryQueue {
    items: Mutex<Vec<WorkItem>>,
}

#[async_trait]
impl WorkPublisher for MemoryQueue {
    async fn publish(&self, item: WorkItem) -> Result<(), QueueError> {
        self.items.lock().unwrap().push(item);
        Ok(())
    }
}

struct PageStub(&'static str);

#[async_trait]
impl PageRenderer for PageStub {
    async fn render(&self, _url: &str) -> Result<String, RenderError> {
        Ok(self.0.to_string())
    }
}

#[derive(diesel::QueryableByName)]
struct StoredRow {
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Text>)]
    title: Option<String>,
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Text>)]
    extra_data: Option<String>,
}

#[tokio::test]
async fn standardize_dispatch_extract_persist() {
    let (pool, _dir) = scratch_db().await;
    let repos = Repositories::new(pool.clone());

    // Three sources; only two get extraction rules
    let mut source_ids = Vec::new();
    for i in 0..3 {
        let source = repos
            .sources
            .create(&NewDataSource::new(
                format!("Source {i}"),
                format!("https://example-{i}.com"),
            ))
            .await
            .unwrap();
        source_ids.push(source.id);
    }

    let standardizer = ThemeStandardizer::new(pool.clone());
    let outcome = standardizer
        .standardize(&StandardizeRequest {
            theme_name: "Articles".to_string(),
            description: Some("news articles".to_string()),
            fields: vec![
                ProposedFieldSpec {
                    field_name: "title".to_string(),
                    data_type: Default::default(),
                    description: None,
                },
                ProposedFieldSpec {
                    field_name: "author".to_string(),
                    data_type: Default::default(),
                    description: None,
                },
            ],
            source_configs: source_ids[..2]
                .iter()
                .map(|&id| SourceConfigRequest {
                    data_source_id: id,
                    field_mappings: vec![NamedMapping {
                        field_name: "title".to_string(),
                        selector: "h1".to_string(),
                    }],
                    extra_fields: vec![themeharvest::models::ExtraField {
                        field_name: "byline".to_string(),
                        selector: ".byline".to_string(),
                    }],
                    list_item_selector: None,
                    detail_link_selector: None,
                })
                .collect(),
        })
        .await
        .unwrap();
    assert_eq!(outcome.published.len(), 2);

    // Task over all three sources; dispatch skips the unconfigured one
    let task = repos
        .tasks
        .create("articles run", outcome.dataset_id, &source_ids, None)
        .await
        .unwrap();

    let queue = MemoryQueue::default();
    let dispatcher = TaskDispatcher::new(repos.configs.clone(), repos.tasks.clone());
    let report = dispatcher.dispatch(&task, &queue).await.unwrap();
    assert_eq!(report.enqueued.len(), 2);
    assert_eq!(report.skipped, vec![source_ids[2]]);
    assert_eq!(
        repos.tasks.get(task.id).await.unwrap().unwrap().status,
        TaskStatus::InProgress
    );

    // Worker drains the captured work items
    let worker = ExtractionWorker::new(
        repos.configs.clone(),
        repos.datasets.clone(),
        repos.sources.clone(),
        repos.registry.clone(),
        Box::new(PageStub(
            "<html><body><h1>Hello</h1><p class=\"byline\">by Sam</p></body></html>",
        )),
    );
    let items: Vec<WorkItem> = queue.items.lock().unwrap().drain(..).collect();
    for item in items {
        worker.handle_payload(&item.to_payload()).await.unwrap();
    }

    // Both messages produced a row; mapped field set, extras spilled to JSON
    let mut conn = pool.get().await.unwrap();
    let rows: Vec<StoredRow> = diesel::sql_query("SELECT title, extra_data FROM data_articles")
        .load(&mut conn)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert_eq!(row.title.as_deref(), Some("Hello"));
        let extra: BTreeMap<String, String> =
            serde_json::from_str(row.extra_data.as_deref().unwrap()).unwrap();
        assert_eq!(extra.get("byline").map(String::as_str), Some("by Sam"));
    }
}
