use resource_map_shared::fetch::{CollectionSource, FetchError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const COLLECTION_QUERY: &str = "query Collection($name: String!) { collection(name: $name) }";

/// Build the variables JSON for a collection query.
pub fn build_collection_variables(name: &str) -> Value {
    serde_json::json!({ "name": name })
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphQLRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLError {
    pub message: String,
}

impl<T> GraphQLResponse<T> {
    /// The first reported error wins; a response without data is malformed.
    pub fn into_result(self) -> Result<T, FetchError> {
        if let Some(errors) = self.errors {
            if let Some(first) = errors.into_iter().next() {
                return Err(FetchError::Backend(first.message));
            }
        }
        self.data
            .ok_or_else(|| FetchError::Decode("No data returned".to_string()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionResponse {
    pub collection: Vec<Value>,
}

/// Reads collections from the map backend's GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct GraphQlSource {
    client: reqwest::Client,
    endpoint: String,
}

impl GraphQlSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        GraphQlSource {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Endpoint on the page's own origin, where the backend serves the app.
    pub fn same_origin() -> Result<Self, FetchError> {
        let origin = web_sys::window()
            .ok_or_else(|| FetchError::Transport("no browser window".to_string()))?
            .location()
            .origin()
            .map_err(|_| FetchError::Transport("page origin unavailable".to_string()))?;
        Ok(Self::new(graphql_url(&origin)))
    }

    async fn query<T: for<'de> Deserialize<'de>>(
        &self,
        query_str: &str,
        variables: Option<Value>,
    ) -> Result<T, FetchError> {
        let req = GraphQLRequest {
            query: query_str.to_string(),
            variables,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&req)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let gql_resp: GraphQLResponse<T> = resp
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        gql_resp.into_result()
    }
}

impl CollectionSource for GraphQlSource {
    async fn select_all(&self, collection: &str) -> Result<Vec<Value>, FetchError> {
        let resp: CollectionResponse = self
            .query(COLLECTION_QUERY, Some(build_collection_variables(collection)))
            .await?;
        Ok(resp.collection)
    }
}

pub fn graphql_url(origin: &str) -> String {
    format!("{}/graphql", origin.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- GraphQL request serialization ---

    #[test]
    fn test_graphql_request_serializes_with_variables() {
        let req = GraphQLRequest {
            query: COLLECTION_QUERY.to_string(),
            variables: Some(build_collection_variables("cuny_food")),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["query"], COLLECTION_QUERY);
        assert_eq!(json["variables"]["name"], "cuny_food");
    }

    #[test]
    fn test_graphql_request_omits_null_variables() {
        let req = GraphQLRequest {
            query: "query { collections }".to_string(),
            variables: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("variables").is_none());
    }

    // --- Response handling ---

    #[test]
    fn test_collection_response_keeps_raw_records() {
        let json = r#"{"data":{"collection":[{"Center Name":"Midtown","Latitude":40.75,"Longitude":-73.99}]}}"#;
        let resp: GraphQLResponse<CollectionResponse> = serde_json::from_str(json).unwrap();
        let records = resp.into_result().unwrap().collection;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["Center Name"], "Midtown");
        assert_eq!(records[0]["Latitude"], 40.75);
    }

    #[test]
    fn test_graphql_error_becomes_backend_error() {
        let json = r#"{"data":null,"errors":[{"message":"Unknown collection: food"}]}"#;
        let resp: GraphQLResponse<CollectionResponse> = serde_json::from_str(json).unwrap();
        assert_eq!(
            resp.into_result().unwrap_err(),
            FetchError::Backend("Unknown collection: food".to_string())
        );
    }

    #[test]
    fn test_missing_data_is_decode_error() {
        let json = r#"{"data":null}"#;
        let resp: GraphQLResponse<CollectionResponse> = serde_json::from_str(json).unwrap();
        assert!(matches!(resp.into_result(), Err(FetchError::Decode(_))));
    }

    #[test]
    fn test_empty_error_list_is_ignored() {
        let json = r#"{"data":{"collection":[]},"errors":[]}"#;
        let resp: GraphQLResponse<CollectionResponse> = serde_json::from_str(json).unwrap();
        assert!(resp.into_result().unwrap().collection.is_empty());
    }

    // --- URL builder ---

    #[test]
    fn test_graphql_url() {
        assert_eq!(graphql_url("http://localhost:3000"), "http://localhost:3000/graphql");
        assert_eq!(graphql_url("https://map.example.org/"), "https://map.example.org/graphql");
    }
}
