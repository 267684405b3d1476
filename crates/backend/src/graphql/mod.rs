use std::sync::Arc;

use async_graphql::{Context, EmptyMutation, EmptySubscription, Json, Object};
use serde_json::Value;

use crate::collections::CollectionStore;

// Query root

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Names of every collection that loaded successfully.
    async fn collections(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<String>> {
        let store = ctx.data::<Arc<CollectionStore>>()?;
        Ok(store.names())
    }

    /// All records of one collection, as stored.
    async fn collection(
        &self,
        ctx: &Context<'_>,
        name: String,
    ) -> async_graphql::Result<Json<Vec<Value>>> {
        let store = ctx.data::<Arc<CollectionStore>>()?;
        let records = store
            .select_all(&name)
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        tracing::debug!(collection = %name, records = records.len(), "Serving collection");
        Ok(Json(records.as_ref().clone()))
    }
}

pub type Schema = async_graphql::Schema<QueryRoot, EmptyMutation, EmptySubscription>;

pub fn build_schema(collections: Arc<CollectionStore>) -> Schema {
    async_graphql::Schema::build(QueryRoot, EmptyMutation, EmptySubscription)
        .data(collections)
        .finish()
}
