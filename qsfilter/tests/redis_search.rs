//! Runs against a Redis Stack server when `REDIS_URL` is set; skipped otherwise.

use qsfilter::search::store::{IndexDefinition, RediSearchStore};
use qsfilter::{ConnectionManager, FieldKind, FilterConfig, FilterParser, OdmFilter, QueryParams, Query, Schema};
use serde::Deserialize;
use serde_json::json;
use serial_test::serial;

const INDEX: &str = "idx:qsfilter_test_nodes";
const PREFIX: &str = "qsfilter_test_node:";

#[derive(Debug, Deserialize)]
struct StoredNode {
    title: String,
}

fn schema() -> Schema {
    Schema::builder()
        .filterable("title", FieldKind::Text)
        .filterable("tags", FieldKind::List)
        .filterable("is_public", FieldKind::Boolean)
        .filterable("downloads", FieldKind::Numeric)
        .sourced("date_created", FieldKind::Temporal, "created")
        .build()
}

async fn connect() -> Option<ConnectionManager> {
    let url = std::env::var("REDIS_URL").ok()?;
    let client = redis::Client::open(url).expect("valid Redis URL");
    Some(ConnectionManager::new(client).await.expect("Failed to connect to Redis"))
}

async fn reset(conn: &mut ConnectionManager) {
    let _: redis::RedisResult<()> = redis::cmd("FT.DROPINDEX").arg(INDEX).arg("DD").query_async(conn).await;
}

async fn seed(conn: &mut ConnectionManager) {
    let docs = [
        json!({"title": "Open Science", "tags": ["biology"], "is_public": "true", "downloads": 12, "created": 1588334400000i64}),
        json!({"title": "Closed Lab", "tags": ["chemistry"], "is_public": "false", "downloads": 3, "created": 1588420800000i64}),
        json!({"title": "Science Fair", "tags": ["biology", "physics"], "is_public": "true", "downloads": 40, "created": 1588507200000i64}),
    ];
    for (idx, doc) in docs.iter().enumerate() {
        let _: () = redis::cmd("JSON.SET")
            .arg(format!("{PREFIX}{idx}"))
            .arg("$")
            .arg(doc.to_string())
            .query_async(conn)
            .await
            .expect("JSON.SET should succeed");
    }
}

async fn search_titles(store: &RediSearchStore, conn: &mut ConnectionManager, query: &str) -> (u64, Vec<String>) {
    let schema = schema();
    let config = FilterConfig::default();
    let filter = OdmFilter::new(FilterParser::new(&schema, &config), Query::MatchAll);
    let params = filter
        .search_params(&QueryParams::from_query_string(query))
        .expect("valid request");

    let result = store.search::<StoredNode>(conn, &params).await.expect("search should succeed");
    (result.total, result.items.into_iter().map(|node| node.title).collect())
}

/// Indexing is asynchronous; wait until every seeded document is searchable.
async fn wait_for_index(store: &RediSearchStore, conn: &mut ConnectionManager, expected: u64) {
    for _ in 0..40 {
        if search_titles(store, conn, "").await.0 >= expected {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    panic!("index never reached {expected} documents");
}

#[tokio::test]
#[serial]
async fn filters_run_against_redisearch() {
    let Some(mut conn) = connect().await else {
        eprintln!("REDIS_URL not set; skipping");
        return;
    };
    reset(&mut conn).await;

    let store = RediSearchStore::new(IndexDefinition::from_schema(INDEX, vec![PREFIX.to_string()], &schema()));
    store.ensure_index(&mut conn).await.expect("index creation");
    store.ensure_index(&mut conn).await.expect("index creation is idempotent");
    seed(&mut conn).await;

    wait_for_index(&store, &mut conn, 3).await;

    let (_, titles) = search_titles(&store, &mut conn, "filter[title]=science&sort=-downloads").await;
    assert_eq!(titles, vec!["Science Fair", "Open Science"]);

    let (_, titles) = search_titles(&store, &mut conn, "filter[date_created]=2020-05-02&sort=title").await;
    assert_eq!(titles, vec!["Closed Lab"]);

    let (_, titles) = search_titles(&store, &mut conn, "filter[tags]=biology&filter[downloads][lt]=20").await;
    assert_eq!(titles, vec!["Open Science"]);

    let (total, titles) = search_titles(&store, &mut conn, "filter[is_public]=true&sort=downloads&page[size]=1").await;
    assert_eq!(total, 2);
    assert_eq!(titles, vec!["Open Science"]);

    reset(&mut conn).await;
}
