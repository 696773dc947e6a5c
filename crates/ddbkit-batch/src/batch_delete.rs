//! Paginated batch delete.
//!
//! Drains a key condition query page by page and deletes every returned item
//! through `BatchWriteItem`, at most [`MAX_BATCH_WRITE_ITEMS`] keys per call.
//! Pages and chunks are processed strictly one after another. Keys the store
//! reports as unprocessed are collected and returned, never retried.

use ddbkit_expr::QueryExpression;
use ddbkit_model::{BatchWriteItemInput, Item, Key};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::DynamoDBClient;
use crate::config::BatchDeleteConfig;
use crate::error::BatchDeleteError;

/// Maximum number of write requests in one `BatchWriteItem` call.
pub const MAX_BATCH_WRITE_ITEMS: usize = 25;

/// Result of a batch-delete run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchDeleteOutput {
    /// Items the store confirmed as deleted.
    pub deleted_count: usize,
    /// Keys the store left unprocessed, in the order they were reported.
    pub unprocessed_keys: Vec<Key>,
}

/// Key extractor copying the named attributes out of an item.
///
/// Attributes missing from the item are skipped.
pub fn key_extractor(attribute_names: &[&str]) -> impl Fn(&Item) -> Key + Send + Sync + 'static {
    let names: Vec<String> = attribute_names.iter().map(|&n| n.to_owned()).collect();
    move |item| {
        names
            .iter()
            .filter_map(|name| item.get(name).map(|value| (name.clone(), value.clone())))
            .collect()
    }
}

/// Batch-delete runner bound to one table or index.
#[derive(Debug, Clone)]
pub struct BatchDeleter {
    table_name: String,
    index_name: Option<String>,
    config: BatchDeleteConfig,
    cancellation: Option<CancellationToken>,
}

impl BatchDeleter {
    /// Runner deleting from `table_name` with the default configuration.
    #[must_use]
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            index_name: None,
            config: BatchDeleteConfig::default(),
            cancellation: None,
        }
    }

    /// Query through a secondary index. Deletes still target the base table.
    #[must_use]
    pub fn with_index(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
        self
    }

    /// Replace the query configuration.
    #[must_use]
    pub fn with_config(mut self, config: BatchDeleteConfig) -> Self {
        self.config = config;
        self
    }

    /// Stop between store calls once `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    fn cancelled(&self, progress: BatchDeleteOutput) -> BatchDeleteError {
        info!(
            table = %self.table_name,
            deleted = progress.deleted_count,
            "batch delete cancelled"
        );
        BatchDeleteError::Cancelled { progress }
    }

    /// Delete every item matched by `query`.
    ///
    /// `to_key` maps a returned item to the primary key of the base table.
    pub async fn run<C, F>(
        &self,
        client: &C,
        query: &QueryExpression,
        to_key: F,
    ) -> Result<BatchDeleteOutput, BatchDeleteError>
    where
        C: DynamoDBClient + ?Sized,
        F: Fn(&Item) -> Key,
    {
        let mut progress = BatchDeleteOutput::default();
        let mut cursor: Option<Key> = None;
        let mut page = 0_usize;

        loop {
            if self.is_cancelled() {
                return Err(self.cancelled(progress));
            }

            let mut input = query.to_query_input(&self.table_name, self.index_name.as_deref());
            input.exclusive_start_key = cursor.take().unwrap_or_default();
            input.limit = self.config.page_limit;
            input.consistent_read = self.config.consistent_read;

            let output = match client.query(input).await {
                Ok(output) => output,
                Err(source) => return Err(BatchDeleteError::Query { source, progress }),
            };
            page += 1;

            let keys: Vec<Key> = output.items.iter().map(&to_key).collect();
            debug!(
                table = %self.table_name,
                page,
                items = keys.len(),
                has_more = output.next_cursor().is_some(),
                "queried page"
            );

            for chunk in keys.chunks(MAX_BATCH_WRITE_ITEMS) {
                if self.is_cancelled() {
                    return Err(self.cancelled(progress));
                }
                self.delete_chunk(client, chunk, &mut progress).await?;
            }

            cursor = output.next_cursor().cloned();
            if cursor.is_none() {
                break;
            }
        }

        info!(
            table = %self.table_name,
            pages = page,
            deleted = progress.deleted_count,
            unprocessed = progress.unprocessed_keys.len(),
            "batch delete completed"
        );
        Ok(progress)
    }

    async fn delete_chunk<C>(
        &self,
        client: &C,
        chunk: &[Key],
        progress: &mut BatchDeleteOutput,
    ) -> Result<(), BatchDeleteError>
    where
        C: DynamoDBClient + ?Sized,
    {
        let input = BatchWriteItemInput::delete_keys(self.table_name.as_str(), chunk.to_vec());
        let output = match client.batch_write_item(input).await {
            Ok(output) => output,
            Err(source) => {
                return Err(BatchDeleteError::BatchWrite {
                    source,
                    progress: std::mem::take(progress),
                });
            }
        };

        let unprocessed = output.unprocessed_delete_keys(&self.table_name);
        let deleted = chunk.len().saturating_sub(unprocessed.len());
        progress.deleted_count += deleted;
        debug!(
            table = %self.table_name,
            requested = chunk.len(),
            deleted,
            "deleted chunk"
        );
        if !unprocessed.is_empty() {
            warn!(
                table = %self.table_name,
                count = unprocessed.len(),
                "store left delete requests unprocessed"
            );
        }
        progress.unprocessed_keys.extend(unprocessed);
        Ok(())
    }
}

/// Delete every item matched by `query` from `table_name`.
///
/// Shorthand for [`BatchDeleter::run`] with the default configuration and no
/// cancellation.
pub async fn batch_delete<C, F>(
    client: &C,
    table_name: &str,
    index_name: Option<&str>,
    query: &QueryExpression,
    to_key: F,
) -> Result<BatchDeleteOutput, BatchDeleteError>
where
    C: DynamoDBClient + ?Sized,
    F: Fn(&Item) -> Key,
{
    let mut deleter = BatchDeleter::new(table_name);
    if let Some(index_name) = index_name {
        deleter = deleter.with_index(index_name);
    }
    deleter.run(client, query, to_key).await
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use async_trait::async_trait;
    use ddbkit_expr::QueryBuilder;
    use ddbkit_model::{
        AttributeValue, BatchWriteItemOutput, DynamoDBError, DynamoDBErrorCode, QueryInput,
        QueryOutput, WriteRequest,
    };
    use parking_lot::Mutex;

    use super::*;

    const TABLE: &str = "events";

    #[derive(Debug, Default)]
    struct MockClient {
        pages: Mutex<VecDeque<Result<QueryOutput, DynamoDBError>>>,
        writes: Mutex<VecDeque<Result<BatchWriteItemOutput, DynamoDBError>>>,
        queries: Mutex<Vec<QueryInput>>,
        batches: Mutex<Vec<BatchWriteItemInput>>,
        cancel_on_write: Option<CancellationToken>,
    }

    impl MockClient {
        fn with_pages(pages: impl IntoIterator<Item = QueryOutput>) -> Self {
            Self {
                pages: Mutex::new(pages.into_iter().map(Ok).collect()),
                ..Self::default()
            }
        }

        fn push_write(&self, output: Result<BatchWriteItemOutput, DynamoDBError>) {
            self.writes.lock().push_back(output);
        }

        fn batch_sizes(&self) -> Vec<usize> {
            self.batches
                .lock()
                .iter()
                .map(|b| b.request_items[TABLE].len())
                .collect()
        }
    }

    #[async_trait]
    impl DynamoDBClient for MockClient {
        async fn query(&self, input: QueryInput) -> Result<QueryOutput, DynamoDBError> {
            self.queries.lock().push(input);
            self.pages
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(QueryOutput::default()))
        }

        async fn batch_write_item(
            &self,
            input: BatchWriteItemInput,
        ) -> Result<BatchWriteItemOutput, DynamoDBError> {
            self.batches.lock().push(input);
            if let Some(token) = &self.cancel_on_write {
                token.cancel();
            }
            self.writes
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(BatchWriteItemOutput::default()))
        }
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("ddbkit_batch=debug")
            .with_test_writer()
            .try_init();
    }

    fn item(pk: &str, sk: usize) -> Item {
        Item::from([
            ("pk".to_owned(), AttributeValue::from(pk)),
            ("sk".to_owned(), AttributeValue::from(sk)),
            ("payload".to_owned(), AttributeValue::from("data")),
        ])
    }

    fn key(pk: &str, sk: usize) -> Key {
        Key::from([
            ("pk".to_owned(), AttributeValue::from(pk)),
            ("sk".to_owned(), AttributeValue::from(sk)),
        ])
    }

    fn page(items: Vec<Item>, cursor: Option<Key>) -> QueryOutput {
        QueryOutput {
            count: i32::try_from(items.len()).unwrap(),
            scanned_count: i32::try_from(items.len()).unwrap(),
            items,
            last_evaluated_key: cursor.unwrap_or_default(),
        }
    }

    fn unprocessed(keys: Vec<Key>) -> BatchWriteItemOutput {
        BatchWriteItemOutput {
            unprocessed_items: [(
                TABLE.to_owned(),
                keys.into_iter().map(WriteRequest::delete).collect(),
            )]
            .into(),
        }
    }

    fn query() -> QueryExpression {
        let mut query = QueryBuilder::with_sort_key("pk", "sk");
        query.key("p1").unwrap().between(0, 1000).unwrap();
        query.build().unwrap()
    }

    #[tokio::test]
    async fn test_should_chunk_deletes_by_25() {
        init_tracing();
        let items = (0..30).map(|i| item("p1", i)).collect();
        let client = MockClient::with_pages([page(items, None)]);

        let output = batch_delete(&client, TABLE, None, &query(), key_extractor(&["pk", "sk"]))
            .await
            .unwrap();

        assert_eq!(output.deleted_count, 30);
        assert!(output.unprocessed_keys.is_empty());
        assert_eq!(client.batch_sizes(), vec![25, 5]);

        let batches = client.batches.lock();
        let first = batches[0].request_items[TABLE][0].delete_request.as_ref().unwrap();
        assert_eq!(first.key, key("p1", 0));
    }

    #[tokio::test]
    async fn test_should_follow_cursor_and_collect_unprocessed() {
        init_tracing();
        let cursor = key("p1", 1);
        let client = MockClient::with_pages([
            page(vec![item("p1", 0), item("p1", 1)], Some(cursor.clone())),
            page(vec![item("p1", 2)], None),
        ]);
        client.push_write(Ok(unprocessed(vec![key("p1", 1)])));

        let output = batch_delete(&client, TABLE, None, &query(), key_extractor(&["pk", "sk"]))
            .await
            .unwrap();

        assert_eq!(output.deleted_count, 2);
        assert_eq!(output.unprocessed_keys, vec![key("p1", 1)]);
        assert_eq!(client.batch_sizes(), vec![2, 1]);

        let queries = client.queries.lock();
        assert_eq!(queries.len(), 2);
        assert!(queries[0].exclusive_start_key.is_empty());
        assert_eq!(queries[1].exclusive_start_key, cursor);
        assert_eq!(queries[1].scan_index_forward, Some(true));
        assert_eq!(
            queries[1].key_condition_expression.as_deref(),
            Some("#a0 = :v0 AND (#a1 BETWEEN :v1 AND :v2)")
        );
    }

    #[tokio::test]
    async fn test_should_skip_writes_for_empty_pages() {
        let client = MockClient::with_pages([
            page(Vec::new(), Some(key("p1", 0))),
            QueryOutput::default(),
        ]);

        let output = batch_delete(&client, TABLE, None, &query(), key_extractor(&["pk", "sk"]))
            .await
            .unwrap();

        assert_eq!(output, BatchDeleteOutput::default());
        assert_eq!(client.queries.lock().len(), 2);
        assert!(client.batches.lock().is_empty());
    }

    #[tokio::test]
    async fn test_should_pass_index_and_config() {
        let client = Arc::new(MockClient::with_pages([page(vec![item("p1", 0)], None)]));
        let deleter = BatchDeleter::new(TABLE)
            .with_index("bySort")
            .with_config(BatchDeleteConfig {
                page_limit: Some(50),
                consistent_read: Some(true),
            });

        let output = deleter
            .run(&client, &query(), key_extractor(&["pk", "sk"]))
            .await
            .unwrap();
        assert_eq!(output.deleted_count, 1);

        let queries = client.queries.lock();
        assert_eq!(queries[0].table_name, TABLE);
        assert_eq!(queries[0].index_name.as_deref(), Some("bySort"));
        assert_eq!(queries[0].limit, Some(50));
        assert_eq!(queries[0].consistent_read, Some(true));
        assert!(client.batches.lock()[0].request_items.contains_key(TABLE));
    }

    #[tokio::test]
    async fn test_should_report_progress_on_query_failure() {
        let client = MockClient::with_pages([page(vec![item("p1", 0)], Some(key("p1", 0)))]);
        client
            .pages
            .lock()
            .push_back(Err(DynamoDBError::throughput_exceeded("slow down")));

        let err = batch_delete(&client, TABLE, None, &query(), key_extractor(&["pk", "sk"]))
            .await
            .unwrap_err();

        assert!(matches!(err, BatchDeleteError::Query { .. }));
        assert_eq!(
            err.store_error().map(|e| e.code),
            Some(DynamoDBErrorCode::ProvisionedThroughputExceededException)
        );
        assert_eq!(err.progress().deleted_count, 1);
    }

    #[tokio::test]
    async fn test_should_report_progress_on_write_failure() {
        let items = (0..30).map(|i| item("p1", i)).collect();
        let client = MockClient::with_pages([page(items, None)]);
        client.push_write(Ok(unprocessed(vec![key("p1", 3)])));
        client.push_write(Err(DynamoDBError::internal_error("boom")));

        let err = batch_delete(&client, TABLE, None, &query(), key_extractor(&["pk", "sk"]))
            .await
            .unwrap_err();

        assert!(matches!(err, BatchDeleteError::BatchWrite { .. }));
        let progress = err.into_progress();
        assert_eq!(progress.deleted_count, 24);
        assert_eq!(progress.unprocessed_keys, vec![key("p1", 3)]);
    }

    #[tokio::test]
    async fn test_should_stop_when_cancelled() {
        let token = CancellationToken::new();
        let client = MockClient {
            cancel_on_write: Some(token.clone()),
            ..MockClient::with_pages([
                page(vec![item("p1", 0)], Some(key("p1", 0))),
                page(vec![item("p1", 1)], None),
            ])
        };

        let err = BatchDeleter::new(TABLE)
            .with_cancellation(token)
            .run(&client, &query(), key_extractor(&["pk", "sk"]))
            .await
            .unwrap_err();

        assert!(matches!(err, BatchDeleteError::Cancelled { .. }));
        assert_eq!(err.progress().deleted_count, 1);
        assert!(err.store_error().is_none());
        assert_eq!(client.queries.lock().len(), 1);
        assert_eq!(client.batches.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_should_not_query_when_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let client = MockClient::default();

        let err = BatchDeleter::new(TABLE)
            .with_cancellation(token)
            .run(&client, &query(), key_extractor(&["pk"]))
            .await
            .unwrap_err();

        assert_eq!(err.into_progress(), BatchDeleteOutput::default());
        assert!(client.queries.lock().is_empty());
    }

    #[test]
    fn test_should_extract_present_key_attributes() {
        let to_key = key_extractor(&["pk", "sk", "missing"]);
        assert_eq!(to_key(&item("p1", 7)), key("p1", 7));
    }
}
