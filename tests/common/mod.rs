use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use querycrate::query::FilterOperator;
use querycrate::{
    Catalog, ContextRegistry, EntityDef, FilterContext, RestState, SeaOrmExecutor, SortContext,
    WithContext, rest_routes,
};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr};
use serde_json::Value;
use tower::ServiceExt;

const SCHEMA: &[&str] = &[
    "CREATE TABLE users (
        id INTEGER PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE messages (
        id INTEGER PRIMARY KEY,
        sender_id INTEGER NOT NULL REFERENCES users(id),
        recipient_id INTEGER NOT NULL REFERENCES users(id),
        content TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
];

const SEED: &[&str] = &[
    "INSERT INTO users (id, first_name, last_name, email, created_at) VALUES
        (1, 'John', 'Smith', 'john@example.com', '2016-01-10 10:00:00'),
        (2, 'Jane', 'Bloggs', 'jane@example.com', '2016-01-20 09:30:00'),
        (3, 'Adam', 'Smith', 'adam@example.com', '2016-02-05 16:45:00'),
        (4, 'Eve', 'Jones', 'eve@example.com', '2016-03-01 08:00:00')",
    "INSERT INTO messages (id, sender_id, recipient_id, content, created_at) VALUES
        (1, 1, 2, 'Hello Jane', '2016-01-11 12:00:00'),
        (2, 1, 3, 'Hi Adam', '2016-01-12 12:00:00'),
        (3, 2, 1, 'Hey John', '2016-01-21 12:00:00'),
        (4, 1, 2, '', '2016-01-25 12:00:00'),
        (5, 3, 1, 'Lunch?', '2016-02-06 12:00:00')",
];

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;
    for statement in SCHEMA.iter().chain(SEED) {
        db.execute_unprepared(statement).await?;
    }
    Ok(db)
}

pub fn catalog() -> Catalog {
    Catalog::new()
        .entity(
            EntityDef::new("users", "users")
                .has_many("messages", "messages", "sender_id")
                .has_many("received", "messages", "recipient_id"),
        )
        .entity(
            EntityDef::new("messages", "messages")
                .belongs_to("sender", "users", "sender_id", "id")
                .belongs_to("recipient", "users", "recipient_id", "id"),
        )
}

pub fn contexts() -> ContextRegistry {
    let user_filters = FilterContext::new().operation("last_name_in", 1, |query, names| {
        query.where_in("last_name", names.iter().map(String::as_str));
    });
    let message_filters = FilterContext::new().nullary("content_not_empty", |query| {
        query.filter("content", FilterOperator::Neq, "");
    });

    ContextRegistry::builder()
        .filter(
            "users",
            vec![
                user_filters,
                FilterContext::attributes(&["email", "last_name"]),
                FilterContext::timestamps(),
            ],
        )
        .filter("messages", message_filters)
        .sort(
            "users",
            vec![
                SortContext::attributes(&["first_name", "last_name"]),
                SortContext::timestamps(),
            ],
        )
        .sort("messages", SortContext::timestamps())
        .with("users", ["messages", "messages.recipient"])
        .with("messages", [WithContext::new().allow("sender").deny("recipient")])
        .build()
}

pub async fn setup_test_app() -> Router {
    let db = setup_test_db()
        .await
        .expect("Failed to setup test database");
    let state = RestState::new(SeaOrmExecutor::new(db), catalog(), contexts());
    rest_routes(state)
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
