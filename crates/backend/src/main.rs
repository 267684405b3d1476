mod collections;
mod config;
mod graphql;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::http::HeaderValue;
use axum::{extract::State, response::Html, routing::get, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing_subscriber::EnvFilter;

use collections::CollectionStore;
use config::ServerConfig;
use graphql::Schema;

async fn graphql_handler(State(schema): State<Schema>, req: GraphQLRequest) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}

async fn graphiql() -> Html<String> {
    Html(
        async_graphql::http::GraphiQLSource::build()
            .endpoint("/graphql")
            .finish(),
    )
}

/// Build a cache-controlled static file router.
///
/// Separated so tests can exercise the caching layer with arbitrary directories.
fn cached_static_router(dir: &Path, cache_header: &'static str) -> Router {
    let layer = SetResponseHeaderLayer::overriding(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static(cache_header),
    );
    Router::new()
        .fallback_service(ServeDir::new(dir))
        .layer(layer)
}

const CACHE_1DAY: &str = "public, max-age=86400, must-revalidate";
const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// Build the full application router.
fn build_app(schema: Schema, config: &ServerConfig) -> Router {
    // Static file routers are stateless, merge them before adding app state
    let static_files = Router::new()
        .nest(
            "/static",
            cached_static_router(&config.assets_dir, CACHE_1DAY),
        )
        .nest(
            "/dist",
            cached_static_router(&config.dist_dir, CACHE_IMMUTABLE),
        )
        .nest(
            "/assets",
            cached_static_router(&config.dist_dir.join("assets"), CACHE_IMMUTABLE),
        );

    let index_path = config.dist_dir.join("index.html");

    Router::new()
        .route("/graphql", get(graphiql).post(graphql_handler))
        .route("/", get(move || serve_index(index_path.clone())))
        .with_state(schema)
        .merge(static_files)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();

    let store = match CollectionStore::load(&config.data_dir) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load collections");
            std::process::exit(1);
        }
    };

    let schema = graphql::build_schema(store);
    let app = build_app(schema, &config);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind");
            std::process::exit(1);
        }
    };
    tracing::info!("Server running at http://localhost:{}", config.port);
    tracing::info!("GraphiQL playground at http://localhost:{}/graphql", config.port);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Server stopped");
    }
}

async fn serve_index(index_path: PathBuf) -> Html<String> {
    // Try to serve the built frontend, fall back to a simple message
    match tokio::fs::read_to_string(&index_path).await {
        Ok(html) => Html(html),
        Err(_) => Html(
            r#"<!DOCTYPE html>
<html>
<head><title>Community Resource Map</title></head>
<body>
<h1>Community Resource Map</h1>
<p>Frontend not built yet. Visit <a href="/graphql">GraphiQL</a> to explore the collections.</p>
</body>
</html>"#
                .to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    /// Create a temp dir with a test file and return the dir path.
    fn temp_dir_with_file(file_name: &str, content: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(file_name), content).unwrap();
        dir
    }

    fn app_for(config: &ServerConfig) -> Router {
        build_app(
            graphql::build_schema(Arc::new(CollectionStore::default())),
            config,
        )
    }

    async fn get_uri(app: Router, uri: &str) -> axum::response::Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_string(resp: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_configured_assets_dir_served_under_static() {
        let assets_dir = temp_dir_with_file("shelter.svg", "<svg/>");
        let dist_dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            assets_dir: assets_dir.path().to_path_buf(),
            dist_dir: dist_dir.path().to_path_buf(),
            ..ServerConfig::default()
        };

        let resp = get_uri(app_for(&config), "/static/shelter.svg").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("cache-control").unwrap(),
            "public, max-age=86400, must-revalidate"
        );

        let missing = get_uri(app_for(&config), "/static/dental.svg").await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bundle_assets_served_from_dist_subdirectory() {
        let dist_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dist_dir.path().join("assets")).unwrap();
        std::fs::write(dist_dir.path().join("assets").join("main-abc123.css"), ".map{}").unwrap();
        let config = ServerConfig {
            dist_dir: dist_dir.path().to_path_buf(),
            ..ServerConfig::default()
        };

        let resp = get_uri(app_for(&config), "/assets/main-abc123.css").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("cache-control").unwrap(),
            "public, max-age=31536000, immutable"
        );
        assert_eq!(body_string(resp).await, ".map{}");
    }

    #[tokio::test]
    async fn test_unknown_collection_is_graphql_error() {
        let dist_dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            dist_dir: dist_dir.path().to_path_buf(),
            ..ServerConfig::default()
        };
        let body = serde_json::json!({
            "query": "query Collection($name: String!) { collection(name: $name) }",
            "variables": { "name": "dental" }
        });
        let resp = app_for(&config)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/graphql")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let json: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
        let message = json["errors"][0]["message"].as_str().unwrap();
        assert!(message.contains("Unknown collection"), "{message}");
    }

    #[tokio::test]
    async fn test_graphql_endpoint_serves_collections() {
        let store = CollectionStore::from_collections([(
            "shelters".to_string(),
            vec![serde_json::json!({ "Center Name": "Midtown", "Latitude": 40.75, "Longitude": -73.99 })],
        )]);
        let dist_dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            dist_dir: dist_dir.path().to_path_buf(),
            ..ServerConfig::default()
        };
        let app = build_app(graphql::build_schema(Arc::new(store)), &config);

        let body = serde_json::json!({
            "query": "query Collection($name: String!) { collection(name: $name) }",
            "variables": { "name": "shelters" }
        });
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/graphql")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(json["data"]["collection"][0]["Center Name"], "Midtown");
    }

    #[tokio::test]
    async fn test_index_falls_back_when_frontend_missing() {
        let dist_dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            dist_dir: dist_dir.path().to_path_buf(),
            ..ServerConfig::default()
        };
        let app = build_app(
            graphql::build_schema(Arc::new(CollectionStore::default())),
            &config,
        );

        let resp = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_string(resp).await.contains("Frontend not built yet"));
    }

    #[tokio::test]
    async fn test_index_serves_built_frontend() {
        let dist_dir = temp_dir_with_file("index.html", "<html><body id=\"main\"></body></html>");
        let config = ServerConfig {
            dist_dir: dist_dir.path().to_path_buf(),
            ..ServerConfig::default()
        };
        let app = build_app(
            graphql::build_schema(Arc::new(CollectionStore::default())),
            &config,
        );

        let resp = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(body_string(resp).await, "<html><body id=\"main\"></body></html>");
    }
}
