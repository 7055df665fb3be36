use super::*;
use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};
use shared::domain::{Coordinates, EyeColor, HairColor};
use shared::protocol::{FilterOperator, PageState, SortOrder, SortSpec};
use tokio::{
    net::TcpListener,
    sync::{mpsc, oneshot, Mutex},
};

async fn spawn_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn sample_person(id: i64, name: &str) -> Person {
    Person {
        id: PersonId(id),
        name: name.to_string(),
        coordinates: Coordinates { x: 1, y: 2 },
        creation_date: None,
        height: Some(1.8),
        eye_color: EyeColor::Blue,
        hair_color: Some(HairColor::Brown),
        nationality: Some(Country::Italy),
        location: None,
    }
}

#[derive(Debug)]
struct CapturedSearch {
    query: HashMap<String, String>,
    callback: Option<String>,
    body: serde_json::Value,
}

#[derive(Clone)]
struct SearchState {
    tx: Arc<Mutex<Option<oneshot::Sender<CapturedSearch>>>>,
    respond_accepted: bool,
}

async fn handle_search(
    State(state): State<SearchState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    let callback = headers
        .get(CALLBACK_URL_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    if let Some(tx) = state.tx.lock().await.take() {
        let _ = tx.send(CapturedSearch {
            query,
            callback,
            body,
        });
    }

    if state.respond_accepted {
        (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({
                "taskId": "task-42",
                "message": "Search task accepted",
                "estimatedCompletion": "2024-03-01T10:05:00Z"
            })),
        )
    } else {
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "people": [sample_person(1, "Ada")],
                "page": 0,
                "pageSize": 10,
                "totalPages": 1,
                "totalCount": 1
            })),
        )
    }
}

async fn spawn_search_server(
    respond_accepted: bool,
) -> (String, oneshot::Receiver<CapturedSearch>) {
    let (tx, rx) = oneshot::channel();
    let state = SearchState {
        tx: Arc::new(Mutex::new(Some(tx))),
        respond_accepted,
    };
    let app = Router::new()
        .route("/people/search", post(handle_search))
        .with_state(state);
    (spawn_server(app).await, rx)
}

#[tokio::test]
async fn sync_search_sends_clauses_in_body_and_metadata_in_query() {
    let (server_url, captured_rx) = spawn_search_server(false).await;
    let client = PeopleClient::new(server_url);

    let clauses = vec![
        FilterClause::new("name", FilterOperator::Eq, "Ada"),
        FilterClause::new("", FilterOperator::Eq, "incomplete"),
        FilterClause::new("height", FilterOperator::Gte, "170"),
    ];
    let sort = SortSpec {
        field: "height".to_string(),
        order: SortOrder::Desc,
    };
    let request = build_search_request(
        &clauses,
        Some(sort),
        PageState { index: 2, size: 5 },
        None,
    );

    let outcome = client.search(&request).await.expect("search");
    let page = match outcome {
        SearchOutcome::Sync(page) => page,
        other => panic!("expected sync outcome, got {other:?}"),
    };
    assert_eq!(page.total_count, 1);
    assert_eq!(page.people.len(), 1);

    let captured = captured_rx.await.expect("captured request");
    assert_eq!(captured.query.get("sortBy").map(String::as_str), Some("height"));
    assert_eq!(captured.query.get("sortOrder").map(String::as_str), Some("desc"));
    assert_eq!(captured.query.get("page").map(String::as_str), Some("2"));
    assert_eq!(captured.query.get("pageSize").map(String::as_str), Some("5"));
    assert!(captured.callback.is_none());

    let sent_filters = captured.body["filters"].as_array().expect("filters array");
    assert_eq!(sent_filters.len(), 2, "inactive clause must be dropped");
    assert_eq!(sent_filters[0]["field"], "name");
    assert_eq!(sent_filters[1]["operator"], "gte");
}

#[tokio::test]
async fn search_with_callback_url_yields_accepted_task() {
    let (server_url, captured_rx) = spawn_search_server(true).await;
    let client = PeopleClient::new(server_url);

    let request = build_search_request(
        &[],
        None,
        PageState::default(),
        Some("http://callback.example/hook"),
    );
    let outcome = client.search(&request).await.expect("search");
    let accepted = match outcome {
        SearchOutcome::Accepted(accepted) => accepted,
        other => panic!("expected accepted outcome, got {other:?}"),
    };
    assert_eq!(accepted.task_id, "task-42");

    let captured = captured_rx.await.expect("captured request");
    assert_eq!(
        captured.callback.as_deref(),
        Some("http://callback.example/hook")
    );
}

#[tokio::test]
async fn sync_search_tolerates_missing_body_fields() {
    let app = Router::new().route(
        "/people/search",
        post(|| async { (StatusCode::OK, Json(serde_json::json!({}))) }),
    );
    let client = PeopleClient::new(spawn_server(app).await);

    let request = build_search_request(&[], None, PageState::default(), None);
    let outcome = client.search(&request).await.expect("search");
    match outcome {
        SearchOutcome::Sync(page) => {
            assert_eq!(page.total_count, 0);
            assert!(page.people.is_empty());
        }
        other => panic!("expected sync outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn search_surfaces_backend_error_payload() {
    let app = Router::new().route(
        "/people/search",
        post(|| async {
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({
                    "code": 422,
                    "message": "Invalid sortBy field: bogus",
                    "time": "2024-03-01T10:00:00Z"
                })),
            )
        }),
    );
    let client = PeopleClient::new(spawn_server(app).await);

    let request = build_search_request(&[], None, PageState::default(), None);
    let err = client.search(&request).await.expect_err("must fail");
    match err {
        ClientError::Api { status, error } => {
            assert_eq!(status, 422);
            assert_eq!(error.message, "Invalid sortBy field: bogus");
            assert_eq!(error.code, Some(422));
            assert!(error.time.is_some());
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn list_sends_page_sort_and_active_filters() {
    let (tx, rx) = oneshot::channel();
    let tx = Arc::new(Mutex::new(Some(tx)));
    let app = Router::new().route(
        "/people",
        get({
            let tx = tx.clone();
            move |Query(params): Query<HashMap<String, String>>| async move {
                if let Some(tx) = tx.lock().await.take() {
                    let _ = tx.send(params);
                }
                Json(serde_json::json!({
                    "people": [],
                    "totalPages": 0,
                    "totalCount": 0
                }))
            }
        }),
    );
    let client = PeopleClient::new(spawn_server(app).await);

    let query = ListQuery {
        page: 1,
        page_size: 20,
        sort_by: "coordinates.x".to_string(),
        sort_order: SortOrder::Desc,
        filters: vec![
            ("name".to_string(), "Ada".to_string()),
            ("eyeColor".to_string(), String::new()),
        ],
    };
    client.list(&query).await.expect("list");

    let params = rx.await.expect("captured params");
    assert_eq!(params.get("page").map(String::as_str), Some("1"));
    assert_eq!(params.get("pageSize").map(String::as_str), Some("20"));
    assert_eq!(params.get("sortBy").map(String::as_str), Some("coordinates.x"));
    assert_eq!(params.get("sortOrder").map(String::as_str), Some("desc"));
    assert_eq!(params.get("name").map(String::as_str), Some("Ada"));
    assert!(!params.contains_key("eyeColor"), "empty filter must be dropped");
}

#[tokio::test]
async fn create_patch_and_delete_round_trip() {
    let app = Router::new()
        .route(
            "/people",
            post(|Json(body): Json<NewPerson>| async move {
                let created = Person {
                    id: PersonId(99),
                    name: body.name,
                    coordinates: body.coordinates,
                    creation_date: None,
                    height: body.height,
                    eye_color: body.eye_color,
                    hair_color: body.hair_color,
                    nationality: body.nationality,
                    location: body.location,
                };
                (StatusCode::CREATED, Json(created))
            }),
        )
        .route(
            "/people/:id",
            patch(|Path(id): Path<i64>, Json(patch): Json<PersonPatch>| async move {
                let mut person = sample_person(id, "Ada");
                if let Some(name) = patch.name {
                    person.name = name;
                }
                Json(person)
            })
            .delete(|Path(_id): Path<i64>| async { StatusCode::NO_CONTENT }),
        );
    let client = PeopleClient::new(spawn_server(app).await);

    let created = client
        .create(&NewPerson {
            name: "Grace".to_string(),
            coordinates: Coordinates { x: 3, y: 4 },
            height: None,
            eye_color: EyeColor::Orange,
            hair_color: None,
            nationality: None,
            location: None,
        })
        .await
        .expect("create");
    assert_eq!(created.id, PersonId(99));
    assert_eq!(created.name, "Grace");

    let patch = PersonPatch {
        name: Some("Grace H".to_string()),
        ..PersonPatch::default()
    };
    let updated = client.update(PersonId(99), &patch).await.expect("update");
    assert_eq!(updated.name, "Grace H");

    client.delete(PersonId(99)).await.expect("delete");
}

#[tokio::test]
async fn empty_patch_is_rejected_before_any_network_call() {
    // Port 9 (discard) would fail with a transport error if a request left
    // the process; validation must fire first.
    let client = PeopleClient::new("http://127.0.0.1:9");
    let err = client
        .update(PersonId(1), &PersonPatch::default())
        .await
        .expect_err("must fail");
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn located_beyond_sends_coordinate_query() {
    let (tx, rx) = oneshot::channel();
    let tx = Arc::new(Mutex::new(Some(tx)));
    let app = Router::new().route(
        "/people/location/greater",
        get({
            let tx = tx.clone();
            move |Query(params): Query<HashMap<String, String>>| async move {
                if let Some(tx) = tx.lock().await.take() {
                    let _ = tx.send(params);
                }
                Json(serde_json::json!({"people": [], "totalCount": 0}))
            }
        }),
    );
    let client = PeopleClient::new(spawn_server(app).await);

    let selector = LocationSelector { x: 1, y: -2, z: 3 };
    client.located_beyond(&selector).await.expect("query");

    let params = rx.await.expect("captured params");
    assert_eq!(params.get("x").map(String::as_str), Some("1"));
    assert_eq!(params.get("y").map(String::as_str), Some("-2"));
    assert_eq!(params.get("z").map(String::as_str), Some("3"));
}

#[tokio::test]
async fn delete_by_nationality_targets_the_bulk_endpoint() {
    let app = Router::new().route(
        "/people/nationality/:nationality",
        delete(|Path(nationality): Path<String>| async move {
            assert_eq!(nationality, "NORTH_KOREA");
            StatusCode::NO_CONTENT
        }),
    );
    let client = PeopleClient::new(spawn_server(app).await);
    client
        .delete_by_nationality(Country::NorthKorea)
        .await
        .expect("bulk delete");
}

struct GatedBackend {
    gates: Mutex<VecDeque<oneshot::Receiver<PeoplePage>>>,
    started: mpsc::UnboundedSender<ListQuery>,
}

#[async_trait]
impl ListBackend for GatedBackend {
    async fn fetch_page(&self, query: ListQuery) -> Result<PeoplePage, ClientError> {
        let gate = self
            .gates
            .lock()
            .await
            .pop_front()
            .expect("a gate per fetch");
        let _ = self.started.send(query);
        Ok(gate.await.expect("gate resolved"))
    }
}

#[tokio::test]
async fn stale_response_loses_to_the_latest_dispatch() {
    let (started_tx, mut started_rx) = mpsc::unbounded_channel();
    let (gate_a_tx, gate_a_rx) = oneshot::channel();
    let (gate_b_tx, gate_b_rx) = oneshot::channel();
    let session = Arc::new(ListSession::new(GatedBackend {
        gates: Mutex::new(VecDeque::from([gate_a_rx, gate_b_rx])),
        started: started_tx,
    }));

    // Dispatch A (page 0), then B (page 1) while A is still in flight.
    let task_a = tokio::spawn({
        let session = session.clone();
        async move { session.go_to_page(0).await }
    });
    started_rx.recv().await.expect("dispatch A issued");

    let task_b = tokio::spawn({
        let session = session.clone();
        async move { session.go_to_page(1).await }
    });
    started_rx.recv().await.expect("dispatch B issued");

    // Resolve B first, then let A trickle in late.
    gate_b_tx
        .send(PeoplePage {
            total_pages: 5,
            total_count: 222,
            ..PeoplePage::default()
        })
        .expect("resolve B");
    task_b.await.expect("join B").expect("B succeeds");

    gate_a_tx
        .send(PeoplePage {
            total_pages: 9,
            total_count: 111,
            ..PeoplePage::default()
        })
        .expect("resolve A");
    task_a.await.expect("join A").expect("A discarded silently");

    let state = session.snapshot().await;
    assert_eq!(state.page, 1, "state must reflect B");
    assert_eq!(state.total_count, 222, "stale A must not overwrite B");
    assert_eq!(state.total_pages, 5);
    assert_eq!(state.phase, Phase::Idle);
}

#[tokio::test]
async fn session_setters_refetch_with_updated_parameters() {
    let queries = Arc::new(Mutex::new(Vec::new()));
    struct RecordingBackend {
        queries: Arc<Mutex<Vec<ListQuery>>>,
    }

    #[async_trait]
    impl ListBackend for RecordingBackend {
        async fn fetch_page(&self, query: ListQuery) -> Result<PeoplePage, ClientError> {
            self.queries.lock().await.push(query);
            Ok(PeoplePage {
                total_pages: 3,
                total_count: 25,
                ..PeoplePage::default()
            })
        }
    }

    let session = ListSession::new(RecordingBackend {
        queries: queries.clone(),
    });

    session.go_to_page(2).await.expect("page");
    session.set_filter("name", "Ada").await.expect("filter");
    session.set_sort("height").await.expect("sort");
    session.set_sort("height").await.expect("sort again");

    let recorded = queries.lock().await;
    assert_eq!(recorded.len(), 4);
    assert_eq!(recorded[0].page, 2);
    // Filter change resets the page and carries the filter.
    assert_eq!(recorded[1].page, 0);
    assert_eq!(
        recorded[1].filters,
        vec![("name".to_string(), "Ada".to_string())]
    );
    // First sort click: ascending; second: descending.
    assert_eq!(recorded[2].sort_by, "height");
    assert_eq!(recorded[2].sort_order, SortOrder::Asc);
    assert_eq!(recorded[3].sort_order, SortOrder::Desc);
}

#[tokio::test]
async fn demography_fan_out_records_each_outcome_independently() {
    let requests_seen = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route(
            "/demography/hair-color/:color/percentage",
            get({
                let requests_seen = requests_seen.clone();
                move |Path(color): Path<String>| {
                    let requests_seen = requests_seen.clone();
                    async move {
                        requests_seen.fetch_add(1, Ordering::SeqCst);
                        if color == "RED" {
                            Err((
                                StatusCode::INTERNAL_SERVER_ERROR,
                                Json(serde_json::json!({
                                    "code": 500,
                                    "message": "demography backend unavailable"
                                })),
                            ))
                        } else {
                            Ok(Json(12.5f64))
                        }
                    }
                }
            }),
        )
        .route(
            "/demography/eye-color/:color",
            get(|Path(_color): Path<String>| async { Json(7i64) }),
        );
    let client = DemographyClient::new(spawn_server(app).await);

    let hair = [
        HairColor::Green,
        HairColor::Red,
        HairColor::Yellow,
        HairColor::Brown,
    ];
    let snapshot = client.gather(&hair, &[EyeColor::Blue]).await;

    assert_eq!(requests_seen.load(Ordering::SeqCst), 4);
    assert_eq!(snapshot.hair.len(), 4);
    let successes = snapshot
        .hair
        .iter()
        .filter(|stat| stat.outcome.is_ok())
        .count();
    assert_eq!(successes, 3);

    let failed = snapshot
        .hair
        .iter()
        .find(|stat| stat.outcome.is_err())
        .expect("one failed category");
    assert_eq!(failed.category, HairColor::Red);
    match failed.outcome.as_ref().expect_err("recorded error") {
        ClientError::Api { status, error } => {
            assert_eq!(*status, 500);
            assert_eq!(error.message, "demography backend unavailable");
        }
        other => panic!("expected api error, got {other:?}"),
    }

    assert_eq!(snapshot.eye.len(), 1);
    assert_eq!(*snapshot.eye[0].outcome.as_ref().expect("count"), 7);
}
