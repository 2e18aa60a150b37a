use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue, Select};
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;

use super::attributes::{fields_to_item, item_to_document, to_attribute, PK, SK};
use super::document::{Document, DocumentList, Fields, StoreError, CREATED_AT, ID, UPDATED_AT};
use super::query::{self, evaluate, Query};
use super::DocumentStore;
use crate::clock;

/// One collection inside a single DynamoDB table:
/// PK = "{collection}"
/// SK = "{collection}#{id}"
#[derive(Debug, Clone)]
pub struct DynamoDocumentStore {
    client: DynamoClient,
    table_name: String,
    collection: String,
}

fn backend<E>(operation: &str, error: &E) -> StoreError
where
    E: std::error::Error,
{
    let message = format!("DynamoDB {} error: {}", operation, DisplayErrorContext(error));
    tracing::error!("{}", message);
    StoreError::Backend(message)
}

/// `equal` filters pushed down to DynamoDB so fewer items travel back.
/// String attributes compare with `=`, lists with `contains`; the in-process
/// pass afterwards is what decides the final match set.
fn equality_filter(
    queries: &[Query],
) -> (
    Option<String>,
    HashMap<String, String>,
    HashMap<String, AttributeValue>,
) {
    let mut filter_expr = vec![];
    let mut expr_names = HashMap::new();
    let mut expr_values = HashMap::new();

    for (i, query) in queries.iter().enumerate() {
        if let Query::Equal { attribute, value } = query {
            let name = format!("#f{}", i);
            let placeholder = format!(":f{}", i);
            filter_expr.push(format!(
                "({name} = {placeholder} OR contains({name}, {placeholder}))"
            ));
            expr_names.insert(name, attribute.clone());
            expr_values.insert(placeholder, AttributeValue::S(value.clone()));
        }
    }

    let expression = if filter_expr.is_empty() {
        None
    } else {
        Some(filter_expr.join(" AND "))
    };
    (expression, expr_names, expr_values)
}

/// How a list request is served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListPlan {
    /// Load the whole partition and evaluate in process
    FullScan,
    /// `Select::Count` for the total, then read only the first `offset + limit` items
    CountThenPage { offset: usize, limit: usize },
}

/// Only an unfiltered, unordered, limited list can skip the full load;
/// partition order is then the final order.
fn plan(queries: &[Query]) -> ListPlan {
    let mut offset = 0usize;
    let mut limit = None;

    for query in queries {
        match query {
            Query::Limit(n) => limit = Some(usize::try_from(*n).unwrap_or(usize::MAX)),
            Query::Offset(n) => offset = usize::try_from(*n).unwrap_or(usize::MAX),
            Query::Equal { .. }
            | Query::Search { .. }
            | Query::OrderAsc(_)
            | Query::OrderDesc(_) => return ListPlan::FullScan,
        }
    }

    match limit {
        Some(limit) => ListPlan::CountThenPage { offset, limit },
        None => ListPlan::FullScan,
    }
}

impl DynamoDocumentStore {
    pub fn new(
        client: DynamoClient,
        table_name: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            collection: collection.into(),
        }
    }

    fn sort_key(&self, id: &str) -> String {
        format!("{}#{}", self.collection, id)
    }

    async fn load_partition(&self, queries: &[Query]) -> Result<Vec<Document>, StoreError> {
        let (filter_expression, expr_names, expr_values) = equality_filter(queries);

        let mut documents = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let mut builder = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("PK = :pk")
                .expression_attribute_values(":pk", AttributeValue::S(self.collection.clone()))
                .set_exclusive_start_key(start_key.take());

            if let Some(expression) = &filter_expression {
                builder = builder.filter_expression(expression);
            }
            for (k, v) in &expr_names {
                builder = builder.expression_attribute_names(k, v);
            }
            for (k, v) in &expr_values {
                builder = builder.expression_attribute_values(k, v.clone());
            }

            let page = builder.send().await.map_err(|e| backend("query", &e))?;
            documents.extend(page.items().iter().filter_map(item_to_document));

            match page.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        Ok(documents)
    }

    async fn count_partition(&self) -> Result<u64, StoreError> {
        let mut total = 0u64;
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let page = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("PK = :pk")
                .expression_attribute_values(":pk", AttributeValue::S(self.collection.clone()))
                .select(Select::Count)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| backend("query", &e))?;

            total += u64::try_from(page.count()).unwrap_or_default();

            match page.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        Ok(total)
    }

    /// First `wanted` items of the partition, in sort key order
    async fn load_prefix(&self, wanted: usize) -> Result<Vec<Document>, StoreError> {
        let mut documents = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        while documents.len() < wanted {
            let remaining = i32::try_from(wanted - documents.len()).unwrap_or(i32::MAX);
            let page = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("PK = :pk")
                .expression_attribute_values(":pk", AttributeValue::S(self.collection.clone()))
                .limit(remaining)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| backend("query", &e))?;

            documents.extend(page.items().iter().filter_map(item_to_document));

            match page.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        Ok(documents)
    }
}

#[async_trait]
impl DocumentStore for DynamoDocumentStore {
    async fn list_documents(&self, queries: &[Query]) -> Result<DocumentList, StoreError> {
        query::validate(queries)?;

        match plan(queries) {
            ListPlan::FullScan => {
                let documents = self.load_partition(queries).await?;
                evaluate(documents, queries)
            }
            ListPlan::CountThenPage { offset, limit } => {
                let total = self.count_partition().await?;
                let documents = if limit == 0 {
                    Vec::new()
                } else {
                    self.load_prefix(offset.saturating_add(limit)).await?
                };
                Ok(DocumentList {
                    documents: documents.into_iter().skip(offset).take(limit).collect(),
                    total,
                })
            }
        }
    }

    async fn get_document(&self, id: &str) -> Result<Document, StoreError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(PK, AttributeValue::S(self.collection.clone()))
            .key(SK, AttributeValue::S(self.sort_key(id)))
            .send()
            .await
            .map_err(|e| backend("get_item", &e))?;

        result
            .item()
            .and_then(item_to_document)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    async fn create_document(&self, id: &str, fields: Fields) -> Result<Document, StoreError> {
        let now = clock::now();

        let mut item = fields_to_item(&fields);
        item.insert(PK.to_string(), AttributeValue::S(self.collection.clone()));
        item.insert(SK.to_string(), AttributeValue::S(self.sort_key(id)));
        item.insert(ID.to_string(), AttributeValue::S(id.to_string()));
        item.insert(CREATED_AT.to_string(), AttributeValue::S(now.clone()));
        item.insert(UPDATED_AT.to_string(), AttributeValue::S(now.clone()));

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(PK)")
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(err) if err.is_conditional_check_failed_exception() => {
                    StoreError::Conflict { id: id.to_string() }
                }
                _ => backend("put_item", &e),
            })?;

        Ok(Document {
            id: id.to_string(),
            created_at: now.clone(),
            updated_at: now,
            fields,
        })
    }

    async fn update_document(&self, id: &str, fields: Fields) -> Result<Document, StoreError> {
        let mut update_expr = vec!["#updated_at = :updated_at".to_string()];
        let mut expr_names = HashMap::new();
        let mut expr_values = HashMap::new();

        expr_names.insert("#updated_at".to_string(), UPDATED_AT.to_string());
        expr_values.insert(":updated_at".to_string(), AttributeValue::S(clock::now()));

        for (i, (name, value)) in fields.iter().enumerate() {
            update_expr.push(format!("#f{i} = :f{i}"));
            expr_names.insert(format!("#f{i}"), name.clone());
            expr_values.insert(format!(":f{i}"), to_attribute(value));
        }

        let mut builder = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key(PK, AttributeValue::S(self.collection.clone()))
            .key(SK, AttributeValue::S(self.sort_key(id)))
            .update_expression(format!("SET {}", update_expr.join(", ")))
            .condition_expression("attribute_exists(PK)")
            .return_values(ReturnValue::AllNew);

        for (k, v) in expr_names {
            builder = builder.expression_attribute_names(k, v);
        }

        for (k, v) in expr_values {
            builder = builder.expression_attribute_values(k, v);
        }

        let result = builder.send().await.map_err(|e| match e.as_service_error() {
            Some(err) if err.is_conditional_check_failed_exception() => {
                StoreError::NotFound { id: id.to_string() }
            }
            _ => backend("update_item", &e),
        })?;

        result
            .attributes()
            .and_then(item_to_document)
            .ok_or_else(|| {
                StoreError::Backend("DynamoDB update_item returned no attributes".to_string())
            })
    }

    async fn delete_document(&self, id: &str) -> Result<(), StoreError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key(PK, AttributeValue::S(self.collection.clone()))
            .key(SK, AttributeValue::S(self.sort_key(id)))
            .condition_expression("attribute_exists(PK)")
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(err) if err.is_conditional_check_failed_exception() => {
                    StoreError::NotFound { id: id.to_string() }
                }
                _ => backend("delete_item", &e),
            })?;

        Ok(())
    }
}
