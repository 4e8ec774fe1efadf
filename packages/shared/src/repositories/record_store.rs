use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, TransactWriteItem, Update};
use aws_sdk_dynamodb::Client;
use parking_lot::Mutex;
use serde_dynamo::aws_sdk_dynamodb_1::{from_attribute_value, to_attribute_value};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::models::record::{
    FieldFilter, FieldSet, FieldWrite, FilterOp, Partition, Precondition, QueryRow,
    VersionedField,
};
use crate::repositories::errors::record_store_errors::RecordStoreError;

const RECORD_KEY: &str = "record_id";
const PARTITION_KEY: &str = "partition";
const VALUE_PREFIX: &str = "f_";
const VERSION_PREFIX: &str = "v_";

/// Remote key/field store with per-field compare-and-swap.
///
/// Every field carries its own version token. `set_fields` applies all of its
/// writes or none of them: a single stale token rejects the whole batch with
/// `RecordStoreError::Conflict`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get_fields(
        &self,
        record_id: &str,
        partition: Partition,
        fields: &[&str],
    ) -> Result<FieldSet, RecordStoreError>;

    async fn set_fields(
        &self,
        record_id: &str,
        writes: Vec<FieldWrite>,
    ) -> Result<(), RecordStoreError>;

    async fn delete_record(
        &self,
        record_id: &str,
        partition: Partition,
    ) -> Result<(), RecordStoreError>;

    async fn query(
        &self,
        partition: Partition,
        filters: &[FieldFilter],
        fields: &[&str],
    ) -> Result<Vec<QueryRow>, RecordStoreError>;
}

pub struct DynamoDbRecordStore {
    pub client: Client,
    pub table_name: String,
}

impl DynamoDbRecordStore {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    fn key(record_id: &str, partition: Partition) -> HashMap<String, AttributeValue> {
        HashMap::from([
            (
                RECORD_KEY.to_string(),
                AttributeValue::S(record_id.to_string()),
            ),
            (
                PARTITION_KEY.to_string(),
                AttributeValue::S(partition.as_str().to_string()),
            ),
        ])
    }

    fn update_for(
        &self,
        record_id: &str,
        partition: Partition,
        writes: &[&FieldWrite],
    ) -> Result<Update, RecordStoreError> {
        let parts = UpdateParts::build(writes)?;
        Update::builder()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(record_id, partition)))
            .update_expression(parts.expression)
            .set_condition_expression(parts.condition)
            .set_expression_attribute_names(Some(parts.names))
            .set_expression_attribute_values(Some(parts.values))
            .build()
            .map_err(|e| RecordStoreError::DynamoDb(e.to_string()))
    }
}

/// Placeholder-based update and condition expressions for one partition item.
struct UpdateParts {
    expression: String,
    condition: Option<String>,
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

impl UpdateParts {
    fn build(writes: &[&FieldWrite]) -> Result<Self, RecordStoreError> {
        let mut assignments = Vec::new();
        let mut conditions = Vec::new();
        let mut names = HashMap::new();
        let mut values = HashMap::new();

        for (index, write) in writes.iter().enumerate() {
            let value_name = format!("#f{}", index);
            let version_name = format!("#v{}", index);
            names.insert(value_name.clone(), format!("{}{}", VALUE_PREFIX, write.field));
            names.insert(
                version_name.clone(),
                format!("{}{}", VERSION_PREFIX, write.field),
            );

            let value = to_attribute_value(&write.value)
                .map_err(|e| RecordStoreError::Serialization(e.to_string()))?;
            values.insert(format!(":f{}", index), value);
            values.insert(
                format!(":v{}", index),
                AttributeValue::S(Uuid::new_v4().to_string()),
            );
            assignments.push(format!(
                "{} = :f{}, {} = :v{}",
                value_name, index, version_name, index
            ));

            match &write.precondition {
                Precondition::Absent => {
                    conditions.push(format!("attribute_not_exists({})", version_name))
                }
                Precondition::Version(token) => {
                    values.insert(format!(":e{}", index), AttributeValue::S(token.clone()));
                    conditions.push(format!("{} = :e{}", version_name, index));
                }
                Precondition::Any => {}
            }
        }

        Ok(UpdateParts {
            expression: format!("SET {}", assignments.join(", ")),
            condition: if conditions.is_empty() {
                None
            } else {
                Some(conditions.join(" AND "))
            },
            names,
            values,
        })
    }
}

fn group_by_partition(writes: &[FieldWrite]) -> Vec<(Partition, Vec<&FieldWrite>)> {
    let mut groups: Vec<(Partition, Vec<&FieldWrite>)> = Vec::new();
    for write in writes {
        match groups.iter_mut().find(|(p, _)| *p == write.partition) {
            Some((_, group)) => group.push(write),
            None => groups.push((write.partition, vec![write])),
        }
    }
    groups
}

#[async_trait]
impl RecordStore for DynamoDbRecordStore {
    async fn get_fields(
        &self,
        record_id: &str,
        partition: Partition,
        fields: &[&str],
    ) -> Result<FieldSet, RecordStoreError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(record_id, partition)))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| RecordStoreError::DynamoDb(e.to_string()))?;

        let mut found = HashMap::new();
        if let Some(item) = result.item {
            for field in fields {
                let value = item.get(&format!("{}{}", VALUE_PREFIX, field));
                let version = item.get(&format!("{}{}", VERSION_PREFIX, field));
                if let (Some(value), Some(AttributeValue::S(version))) = (value, version) {
                    let value: Value = from_attribute_value(value.clone())
                        .map_err(|e| RecordStoreError::Serialization(e.to_string()))?;
                    found.insert(
                        field.to_string(),
                        VersionedField {
                            value,
                            version: version.clone(),
                        },
                    );
                }
            }
        }

        Ok(FieldSet::new(found))
    }

    async fn set_fields(
        &self,
        record_id: &str,
        writes: Vec<FieldWrite>,
    ) -> Result<(), RecordStoreError> {
        if writes.is_empty() {
            return Ok(());
        }
        let groups = group_by_partition(&writes);

        if let [(partition, group)] = groups.as_slice() {
            let parts = UpdateParts::build(group)?;
            let result = self
                .client
                .update_item()
                .table_name(&self.table_name)
                .set_key(Some(Self::key(record_id, *partition)))
                .update_expression(parts.expression)
                .set_condition_expression(parts.condition)
                .set_expression_attribute_names(Some(parts.names))
                .set_expression_attribute_values(Some(parts.values))
                .send()
                .await;

            return match result {
                Ok(_) => Ok(()),
                Err(e) => match e.as_service_error() {
                    Some(service_err) if service_err.is_conditional_check_failed_exception() => {
                        Err(RecordStoreError::Conflict(format!(
                            "stale version token on {}",
                            record_id
                        )))
                    }
                    _ => Err(RecordStoreError::DynamoDb(e.to_string())),
                },
            };
        }

        // Writes spanning partitions go through a transaction so they land together
        let mut transaction_items = Vec::with_capacity(groups.len());
        for (partition, group) in &groups {
            transaction_items.push(
                TransactWriteItem::builder()
                    .update(self.update_for(record_id, *partition, group)?)
                    .build(),
            );
        }

        let result = self
            .client
            .transact_write_items()
            .set_transact_items(Some(transaction_items))
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => match e.as_service_error() {
                Some(service_err) if service_err.is_transaction_canceled_exception() => {
                    Err(RecordStoreError::Conflict(format!(
                        "transaction on {} cancelled: {}",
                        record_id, service_err
                    )))
                }
                _ => Err(RecordStoreError::DynamoDb(e.to_string())),
            },
        }
    }

    async fn delete_record(
        &self,
        record_id: &str,
        partition: Partition,
    ) -> Result<(), RecordStoreError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(record_id, partition)))
            .send()
            .await
            .map_err(|e| RecordStoreError::DynamoDb(e.to_string()))?;
        Ok(())
    }

    async fn query(
        &self,
        partition: Partition,
        filters: &[FieldFilter],
        fields: &[&str],
    ) -> Result<Vec<QueryRow>, RecordStoreError> {
        let mut names = HashMap::from([("#p".to_string(), PARTITION_KEY.to_string())]);
        let mut values = HashMap::from([(
            ":p".to_string(),
            AttributeValue::S(partition.as_str().to_string()),
        )]);
        let mut clauses = vec!["#p = :p".to_string()];

        for (index, filter) in filters.iter().enumerate() {
            let name = format!("#q{}", index);
            let value = format!(":q{}", index);
            names.insert(name.clone(), format!("{}{}", VALUE_PREFIX, filter.field));
            values.insert(
                value.clone(),
                to_attribute_value(&filter.value)
                    .map_err(|e| RecordStoreError::Serialization(e.to_string()))?,
            );
            clauses.push(match filter.op {
                FilterOp::Eq => format!("{} = {}", name, value),
                FilterOp::Ge => format!("{} >= {}", name, value),
                FilterOp::Le => format!("{} <= {}", name, value),
                FilterOp::BeginsWith => format!("begins_with({}, {})", name, value),
            });
        }
        let filter_expression = clauses.join(" AND ");

        let mut rows = Vec::new();
        let mut start_key = None;
        loop {
            let output = self
                .client
                .scan()
                .table_name(&self.table_name)
                .filter_expression(&filter_expression)
                .set_expression_attribute_names(Some(names.clone()))
                .set_expression_attribute_values(Some(values.clone()))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| RecordStoreError::DynamoDb(e.to_string()))?;

            for item in output.items.unwrap_or_default() {
                let Some(AttributeValue::S(record_id)) = item.get(RECORD_KEY) else {
                    continue;
                };
                let mut projected = HashMap::new();
                for field in fields {
                    if let Some(value) = item.get(&format!("{}{}", VALUE_PREFIX, field)) {
                        let value: Value = from_attribute_value(value.clone())
                            .map_err(|e| RecordStoreError::Serialization(e.to_string()))?;
                        projected.insert(field.to_string(), value);
                    }
                }
                rows.push(QueryRow {
                    record_id: record_id.clone(),
                    fields: projected,
                });
            }

            start_key = output.last_evaluated_key;
            if start_key.is_none() {
                break;
            }
        }

        debug!("Query over {} matched {} records", partition.as_str(), rows.len());
        Ok(rows)
    }
}

type StoredRecord = HashMap<String, VersionedField<Value>>;

/// Process-local record store with the same compare-and-swap semantics as the
/// DynamoDB one. Backs local runs and the test suites.
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: Mutex<HashMap<(String, Partition), StoredRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(record: Option<&StoredRecord>, write: &FieldWrite) -> Result<(), RecordStoreError> {
        let current = record.and_then(|fields| fields.get(&write.field));
        let satisfied = match (&write.precondition, current) {
            (Precondition::Any, _) => true,
            (Precondition::Absent, None) => true,
            (Precondition::Absent, Some(_)) => false,
            (Precondition::Version(token), Some(field)) => &field.version == token,
            (Precondition::Version(_), None) => false,
        };
        if satisfied {
            Ok(())
        } else {
            Err(RecordStoreError::Conflict(format!(
                "stale version token for field {}",
                write.field
            )))
        }
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get_fields(
        &self,
        record_id: &str,
        partition: Partition,
        fields: &[&str],
    ) -> Result<FieldSet, RecordStoreError> {
        // Yield so concurrent callers interleave the way remote round trips do
        tokio::task::yield_now().await;
        let records = self.records.lock();
        let found = records
            .get(&(record_id.to_string(), partition))
            .map(|record| {
                fields
                    .iter()
                    .filter_map(|name| {
                        record
                            .get(*name)
                            .map(|field| (name.to_string(), field.clone()))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(FieldSet::new(found))
    }

    async fn set_fields(
        &self,
        record_id: &str,
        writes: Vec<FieldWrite>,
    ) -> Result<(), RecordStoreError> {
        tokio::task::yield_now().await;
        let mut records = self.records.lock();
        for write in &writes {
            Self::check(
                records.get(&(record_id.to_string(), write.partition)),
                write,
            )?;
        }
        for write in writes {
            records
                .entry((record_id.to_string(), write.partition))
                .or_default()
                .insert(
                    write.field,
                    VersionedField {
                        value: write.value,
                        version: Uuid::new_v4().to_string(),
                    },
                );
        }
        Ok(())
    }

    async fn delete_record(
        &self,
        record_id: &str,
        partition: Partition,
    ) -> Result<(), RecordStoreError> {
        tokio::task::yield_now().await;
        self.records
            .lock()
            .remove(&(record_id.to_string(), partition));
        Ok(())
    }

    async fn query(
        &self,
        partition: Partition,
        filters: &[FieldFilter],
        fields: &[&str],
    ) -> Result<Vec<QueryRow>, RecordStoreError> {
        tokio::task::yield_now().await;
        let records = self.records.lock();
        let mut rows: Vec<QueryRow> = records
            .iter()
            .filter(|((_, p), _)| *p == partition)
            .filter(|(_, record)| {
                filters
                    .iter()
                    .all(|filter| filter.matches(record.get(&filter.field).map(|f| &f.value)))
            })
            .map(|((record_id, _), record)| QueryRow {
                record_id: record_id.clone(),
                fields: fields
                    .iter()
                    .filter_map(|name| {
                        record
                            .get(*name)
                            .map(|field| (name.to_string(), field.value.clone()))
                    })
                    .collect(),
            })
            .collect();
        rows.sort_by(|a, b| a.record_id.cmp(&b.record_id));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(field: &str, value: Value, precondition: Precondition) -> FieldWrite {
        FieldWrite {
            partition: Partition::Public,
            field: field.to_string(),
            value,
            precondition,
        }
    }

    #[tokio::test]
    async fn test_absent_precondition_guards_first_write() {
        let store = InMemoryRecordStore::new();

        store
            .set_fields("club_1", vec![write("members", json!(["a"]), Precondition::Absent)])
            .await
            .unwrap();
        let second = store
            .set_fields("club_1", vec![write("members", json!(["b"]), Precondition::Absent)])
            .await;

        assert!(matches!(second, Err(RecordStoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_stale_version_rejects_whole_batch() {
        let store = InMemoryRecordStore::new();
        store
            .set_fields(
                "club_1",
                vec![
                    write("members", json!(["a"]), Precondition::Absent),
                    write("memberCount", json!(1), Precondition::Absent),
                ],
            )
            .await
            .unwrap();

        let read = store
            .get_fields("club_1", Partition::Public, &["members", "memberCount"])
            .await
            .unwrap();
        let members_token = read.precondition("members");
        let count_token = read.precondition("memberCount");

        // A concurrent writer bumps memberCount
        store
            .set_fields("club_1", vec![write("memberCount", json!(5), count_token.clone())])
            .await
            .unwrap();

        let result = store
            .set_fields(
                "club_1",
                vec![
                    write("members", json!(["a", "b"]), members_token),
                    write("memberCount", json!(2), count_token),
                ],
            )
            .await;
        assert!(matches!(result, Err(RecordStoreError::Conflict(_))));

        let after = store
            .get_fields("club_1", Partition::Public, &["members", "memberCount"])
            .await
            .unwrap();
        let members: Vec<String> = after.get("members").unwrap().unwrap().value;
        let count: i64 = after.get("memberCount").unwrap().unwrap().value;
        assert_eq!(members, vec!["a"]);
        assert_eq!(count, 5);
    }

    #[tokio::test]
    async fn test_partitions_are_isolated() {
        let store = InMemoryRecordStore::new();
        store
            .set_fields(
                "club_1",
                vec![FieldWrite {
                    partition: Partition::Private,
                    field: "admin".to_string(),
                    value: json!("alice"),
                    precondition: Precondition::Absent,
                }],
            )
            .await
            .unwrap();

        let public = store
            .get_fields("club_1", Partition::Public, &["admin"])
            .await
            .unwrap();
        assert!(public.is_empty());

        store.delete_record("club_1", Partition::Private).await.unwrap();
        let private = store
            .get_fields("club_1", Partition::Private, &["admin"])
            .await
            .unwrap();
        assert!(private.is_empty());
    }

    #[tokio::test]
    async fn test_query_filters_and_projects() {
        let store = InMemoryRecordStore::new();
        for (id, name, country) in [("club_a", "Knights", "IE"), ("club_b", "Rooks", "IE")] {
            store
                .set_fields(
                    id,
                    vec![
                        write("entityType", json!("club"), Precondition::Absent),
                        write("name", json!(name), Precondition::Absent),
                        write("country", json!(country), Precondition::Absent),
                    ],
                )
                .await
                .unwrap();
        }

        let rows = store
            .query(
                Partition::Public,
                &[
                    FieldFilter::eq("entityType", "club"),
                    FieldFilter::begins_with("name", "Kn"),
                ],
                &["name"],
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record_id, "club_a");
        assert_eq!(rows[0].get::<String>("name").unwrap(), "Knights");
        assert!(!rows[0].fields.contains_key("country"));
    }

    #[test]
    fn test_update_parts_conditions() {
        let writes = [
            write("members", json!(["a"]), Precondition::Version("t1".to_string())),
            write("memberCount", json!(1), Precondition::Absent),
            write("board", json!("fen"), Precondition::Any),
        ];
        let refs: Vec<&FieldWrite> = writes.iter().collect();

        let parts = UpdateParts::build(&refs).unwrap();

        assert_eq!(
            parts.expression,
            "SET #f0 = :f0, #v0 = :v0, #f1 = :f1, #v1 = :v1, #f2 = :f2, #v2 = :v2"
        );
        assert_eq!(
            parts.condition.as_deref(),
            Some("#v0 = :e0 AND attribute_not_exists(#v1)")
        );
        assert_eq!(parts.names.get("#f1").map(String::as_str), Some("f_memberCount"));
        assert_eq!(
            parts.values.get(":e0"),
            Some(&AttributeValue::S("t1".to_string()))
        );
    }

    #[test]
    fn test_group_by_partition_keeps_order() {
        let mut private = write("pendingApprovals", json!([]), Precondition::Any);
        private.partition = Partition::Private;
        let writes = vec![
            write("members", json!([]), Precondition::Any),
            private,
            write("memberCount", json!(0), Precondition::Any),
        ];

        let groups = group_by_partition(&writes);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, Partition::Public);
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, Partition::Private);
    }
}
