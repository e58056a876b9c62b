use super::*;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use shared::{domain::DraftPlate, error::ErrorCode};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServerState {
    plates: Arc<Mutex<Vec<Plate>>>,
    received: Arc<Mutex<Vec<(String, Value)>>>,
}

fn plate(id: i64, name: &str) -> Plate {
    Plate {
        id: PlateId(id),
        name: name.into(),
        image: format!("https://img.example/{id}.png"),
        price: "12.50".into(),
        description: format!("{name} description"),
        available: true,
    }
}

fn soup_draft() -> DraftPlate {
    DraftPlate {
        name: "Soup".into(),
        image: "u1".into(),
        price: "9.90".into(),
        description: "d".into(),
    }
}

async fn handle_list(State(state): State<ServerState>) -> Json<Vec<Plate>> {
    Json(state.plates.lock().await.clone())
}

async fn handle_create(State(state): State<ServerState>, Json(body): Json<Value>) -> Json<Value> {
    state
        .received
        .lock()
        .await
        .push(("POST /foods".to_string(), body.clone()));
    let mut created = body;
    created["id"] = json!(7);
    Json(created)
}

async fn handle_update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state
        .received
        .lock()
        .await
        .push((format!("POST /foods/{id}"), body.clone()));
    let mut echoed = body["food"].clone();
    echoed["id"] = json!(id);
    Json(echoed)
}

async fn handle_delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let mut plates = state.plates.lock().await;
    let before = plates.len();
    plates.retain(|plate| plate.id.0 != id);
    if plates.len() == before {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "code": "not_found", "message": format!("no food {id}") })),
        )
            .into_response();
    }
    StatusCode::OK.into_response()
}

async fn spawn_foods_server(plates: Vec<Plate>) -> anyhow::Result<(String, ServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServerState {
        plates: Arc::new(Mutex::new(plates)),
        received: Arc::default(),
    };
    let app = Router::new()
        .route("/foods", get(handle_list).post(handle_create))
        .route("/foods/:id", post(handle_update).delete(handle_delete))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

#[tokio::test]
async fn list_plates_returns_backend_order() {
    let (server_url, _state) = spawn_foods_server(vec![plate(2, "B"), plate(1, "A")])
        .await
        .expect("spawn server");
    let api = HttpFoodsApi::new(&server_url).expect("api");

    let plates = api.list_plates().await.expect("list");
    let ids: Vec<i64> = plates.iter().map(|plate| plate.id.0).collect();
    assert_eq!(ids, vec![2, 1]);
    assert_eq!(plates[1].name, "A");
}

#[tokio::test]
async fn create_plate_posts_flat_draft_marked_available() {
    let (server_url, state) = spawn_foods_server(Vec::new()).await.expect("spawn server");
    let api = HttpFoodsApi::new(&server_url).expect("api");

    let created = api
        .create_plate(&CreatePlateRequest::new(soup_draft()))
        .await
        .expect("create");
    assert_eq!(created.id, PlateId(7));
    assert!(created.available);

    let received = state.received.lock().await;
    let (route, body) = &received[0];
    assert_eq!(route, "POST /foods");
    assert_eq!(
        body,
        &json!({
            "name": "Soup",
            "image": "u1",
            "price": "9.90",
            "description": "d",
            "available": true,
        })
    );
}

#[tokio::test]
async fn update_plate_posts_nested_food_to_plate_path() {
    let (server_url, state) = spawn_foods_server(vec![plate(3, "A")])
        .await
        .expect("spawn server");
    let api = HttpFoodsApi::new(&server_url).expect("api");

    let fields = api
        .update_plate(
            PlateId(3),
            &UpdatePlateRequest {
                food: soup_draft(),
                available: false,
            },
        )
        .await
        .expect("update");
    assert_eq!(fields.name, "Soup");
    assert_eq!(fields.price, "9.90");

    let received = state.received.lock().await;
    let (route, body) = &received[0];
    assert_eq!(route, "POST /foods/3");
    assert_eq!(body["food"]["description"], "d");
    assert_eq!(body["available"], false);
}

#[tokio::test]
async fn delete_plate_removes_on_backend() {
    let (server_url, state) = spawn_foods_server(vec![plate(1, "A"), plate(2, "B")])
        .await
        .expect("spawn server");
    let api = HttpFoodsApi::new(&server_url).expect("api");

    api.delete_plate(PlateId(1)).await.expect("delete");

    let remaining = state.plates.lock().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, PlateId(2));
}

#[tokio::test]
async fn non_success_status_surfaces_api_exception() {
    let (server_url, _state) = spawn_foods_server(Vec::new()).await.expect("spawn server");
    let api = HttpFoodsApi::new(&server_url).expect("api");

    let err = api.delete_plate(PlateId(404)).await.expect_err("must fail");
    let exception = err
        .downcast_ref::<ApiException>()
        .expect("api exception in chain");
    assert_eq!(exception.status, 404);
    assert_eq!(exception.code, ErrorCode::NotFound);
    assert_eq!(exception.message, "no food 404");
}

#[tokio::test]
async fn unreachable_backend_is_an_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let api = HttpFoodsApi::with_timeout(&format!("http://{addr}"), Duration::from_secs(2))
        .expect("api");
    assert!(api.list_plates().await.is_err());
}

#[test]
fn base_url_keeps_path_prefix() {
    let api = HttpFoodsApi::new("http://localhost:3333/api").expect("api");
    assert_eq!(api.base_url().as_str(), "http://localhost:3333/api/");
    assert_eq!(
        api.food_url(PlateId(5)).expect("url").as_str(),
        "http://localhost:3333/api/foods/5"
    );
    assert_eq!(
        api.foods_url().expect("url").as_str(),
        "http://localhost:3333/api/foods"
    );
}

#[test]
fn rejects_empty_and_unparseable_base_urls() {
    assert!(normalize_base_url("   ").is_err());
    assert!(normalize_base_url("not a url").is_err());
    assert!(normalize_base_url("mailto:chef@example.com").is_err());
}
