use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use super::health;
use super::members;
use super::middleware::{logging_middleware, metrics_middleware};
use super::projects;
use super::state::AppState;
use super::teams;

/// Create the full router with application state
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .route("/", get(teams::list_teams))
        // Teams and their members
        .route("/teams", get(teams::list_teams).post(teams::create_team))
        .route(
            "/teams/{id}",
            get(teams::show_team)
                .put(teams::update_team)
                .patch(teams::update_team)
                .delete(teams::delete_team),
        )
        .route(
            "/teams/{id}/members",
            get(teams::team_members).post(teams::create_team_member),
        )
        .route(
            "/teams/{id}/members/{member_id}",
            get(members::show_member)
                .put(members::update_member)
                .patch(members::update_member)
                .delete(members::delete_member),
        )
        // Members
        .route("/members", get(members::list_members))
        .route(
            "/members/{id}",
            get(members::show_member)
                .put(members::update_member)
                .patch(members::update_member)
                .delete(members::delete_member),
        )
        .route("/members/{id}/edit_team", get(members::edit_team))
        // Projects
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/{id}",
            get(projects::show_project)
                .put(projects::update_project)
                .patch(projects::update_project)
                .delete(projects::delete_project),
        )
        .route("/projects/{id}/members", get(projects::project_members))
        .route("/projects/{id}/project_members", get(projects::project_members))
        .route("/projects/{id}/add_member", post(projects::add_member));

    if let Some(metrics) = &state.metrics {
        if metrics.path().starts_with('/') {
            router = router.route(metrics.path(), get(metrics_handler));
        }
    }

    router
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

/// Prometheus exposition text
async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(metrics) => (
            [(CONTENT_TYPE, "text/plain; version=0.0.4")],
            metrics.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{HeaderMap, Method, Request},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::api::flash::{Flash, FlashKind};
    use crate::domain::{MembershipRepository, Store};
    use crate::infrastructure::storage::{FailurePoint, InMemoryStore};

    struct TestApp {
        router: Router,
        state: AppState,
    }

    struct TestResponse {
        status: StatusCode,
        headers: HeaderMap,
        body: String,
    }

    impl TestResponse {
        fn json(&self) -> Value {
            serde_json::from_str(&self.body).unwrap()
        }

        fn header(&self, name: &str) -> Option<&str> {
            self.headers.get(name).and_then(|v| v.to_str().ok())
        }
    }

    impl TestApp {
        fn new() -> Self {
            Self::with_store(InMemoryStore::new())
        }

        fn with_store(store: InMemoryStore) -> Self {
            let state = AppState::new(Arc::new(store));
            Self {
                router: create_router(state.clone()),
                state,
            }
        }

        async fn send(&self, request: Request<Body>) -> TestResponse {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let headers = response.headers().clone();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

            TestResponse {
                status,
                headers,
                body: String::from_utf8(bytes.to_vec()).unwrap(),
            }
        }

        async fn json(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
            let builder = Request::builder()
                .method(method)
                .uri(uri)
                .header("accept", "application/json");

            let request = match body {
                Some(body) => builder
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string())),
                None => builder.body(Body::empty()),
            };

            self.send(request.unwrap()).await
        }

        async fn get(&self, uri: &str) -> TestResponse {
            self.json(Method::GET, uri, None).await
        }

        async fn post(&self, uri: &str, body: Value) -> TestResponse {
            self.json(Method::POST, uri, Some(body)).await
        }

        async fn create_team(&self, name: &str) -> i64 {
            let response = self.post("/teams", json!({"name": name})).await;
            assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
            response.json()["team"]["id"].as_i64().unwrap()
        }

        async fn create_member(&self, team: i64, first: &str, last: &str) -> i64 {
            let response = self
                .post(
                    &format!("/teams/{}/members", team),
                    json!({"first_name": first, "last_name": last}),
                )
                .await;
            assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
            response.json()["member"]["id"].as_i64().unwrap()
        }
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = TestApp::new();

        assert_eq!(app.get("/health").await.status, StatusCode::OK);
        assert_eq!(app.get("/live").await.status, StatusCode::OK);
        assert_eq!(app.get("/ready").await.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_request_id_is_returned() {
        let app = TestApp::new();
        let response = app.get("/health").await;

        assert!(response.header("x-request-id").is_some());
    }

    #[tokio::test]
    async fn test_teams_paginate_by_eight() {
        let app = TestApp::new();
        for i in 1..=10 {
            app.create_team(&format!("Team {}", i)).await;
        }

        let first = app.get("/teams").await;
        assert_eq!(first.status, StatusCode::OK);
        assert_eq!(first.header("x-total-count"), Some("10"));
        assert_eq!(first.header("x-per-page"), Some("8"));
        let names: Vec<String> = first
            .json()
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names.len(), 8);
        assert_eq!(names[0], "Team 1");
        assert_eq!(names[7], "Team 8");

        let second = app.get("/teams?page=2").await;
        assert_eq!(second.header("x-page"), Some("2"));
        assert_eq!(
            second.json(),
            json!([{"id": 9, "name": "Team 9"}, {"id": 10, "name": "Team 10"}])
        );

        let garbage = app.get("/teams?page=zero").await;
        assert_eq!(garbage.header("x-page"), Some("1"));
    }

    #[tokio::test]
    async fn test_huge_page_is_an_empty_page() {
        let app = TestApp::new();
        app.create_team("Alpha").await;

        for uri in [
            "/teams?page=18446744073709551615",
            "/members?page=18446744073709551615",
            "/projects?page=18446744073709551615",
        ] {
            let response = app.get(uri).await;
            assert_eq!(response.status, StatusCode::OK, "{}", uri);
            assert_eq!(response.json(), json!([]), "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_params_nested_under_root_key() {
        let app = TestApp::new();

        let team = app.post("/teams", json!({"team": {"name": "Alpha"}})).await;
        assert_eq!(team.status, StatusCode::CREATED, "{}", team.body);
        assert_eq!(team.json()["team"]["name"], "Alpha");

        let member = app
            .post(
                "/teams/1/members",
                json!({"member": {"first_name": "Ada", "last_name": "Lovelace"}}),
            )
            .await;
        assert_eq!(member.status, StatusCode::CREATED, "{}", member.body);

        let project = app
            .post("/projects", json!({"project": {"name": "Apollo", "member_ids": [1]}}))
            .await;
        assert_eq!(project.status, StatusCode::CREATED, "{}", project.body);
        assert_eq!(project.json()["project"]["members"][0]["first_name"], "Ada");

        let request = Request::builder()
            .method(Method::PATCH)
            .uri("/teams/1")
            .header("accept", "application/json")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("team%5Bname%5D=Alpha+Squad"))
            .unwrap();
        let renamed = app.send(request).await;
        assert_eq!(renamed.status, StatusCode::OK, "{}", renamed.body);
        assert_eq!(renamed.json()["name"], "Alpha Squad");
    }

    #[tokio::test]
    async fn test_duplicate_team_name_is_rejected() {
        let app = TestApp::new();
        app.create_team("Alpha").await;

        let response = app.post("/teams", json!({"name": "Alpha"})).await;
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json(), json!({"name": ["has already been taken"]}));

        let response = app.post("/teams", json!({"name": "alpha"})).await;
        assert_eq!(response.status, StatusCode::CREATED);

        assert_eq!(app.get("/teams").await.header("x-total-count"), Some("2"));
    }

    #[tokio::test]
    async fn test_duplicate_project_name_is_rejected() {
        let app = TestApp::new();
        assert_eq!(
            app.post("/projects", json!({"name": "Apollo"})).await.status,
            StatusCode::CREATED
        );

        let response = app.post("/projects", json!({"name": "Apollo"})).await;
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json()["name"][0], "has already been taken");
        assert_eq!(app.get("/projects").await.header("x-total-count"), Some("1"));
    }

    #[tokio::test]
    async fn test_blank_member_names_are_rejected() {
        let app = TestApp::new();
        let team = app.create_team("Alpha").await;

        let response = app
            .post(
                &format!("/teams/{}/members", team),
                json!({"first_name": "", "last_name": "Lovelace"}),
            )
            .await;

        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json(), json!({"first_name": ["can't be blank"]}));
        assert_eq!(app.get("/members").await.header("x-total-count"), Some("0"));
    }

    #[tokio::test]
    async fn test_team_member_listing() {
        let app = TestApp::new();
        let alpha = app.create_team("Alpha").await;
        let ada = app.create_member(alpha, "Ada", "Lovelace").await;

        let response = app.get(&format!("/teams/{}/members", alpha)).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.json(),
            json!([{
                "id": ada,
                "first_name": "Ada",
                "last_name": "Lovelace",
                "city": null,
                "state": null,
                "country": null,
                "team_id": alpha
            }])
        );
    }

    #[tokio::test]
    async fn test_member_lookup_by_nested_path() {
        let app = TestApp::new();
        let alpha = app.create_team("Alpha").await;
        let beta = app.create_team("Beta").await;
        let ada = app.create_member(alpha, "Ada", "Lovelace").await;

        let nested = app.get(&format!("/teams/{}/members/{}", alpha, ada)).await;
        assert_eq!(nested.status, StatusCode::OK);
        assert_eq!(nested.json(), app.get(&format!("/members/{}", ada)).await.json());

        let wrong_team = app.get(&format!("/teams/{}/members/{}", beta, ada)).await;
        assert_eq!(wrong_team.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_project_has_no_members() {
        let app = TestApp::new();

        let created = app.post("/projects", json!({"name": "Apollo"})).await;
        assert_eq!(created.status, StatusCode::CREATED);
        assert_eq!(created.json()["project"]["members"], json!([]));
        let location = created.header("location").unwrap().to_string();

        let fetched = app.get(&location).await;
        assert_eq!(fetched.json(), json!({"id": 1, "name": "Apollo", "members": []}));
    }

    #[tokio::test]
    async fn test_deleting_project_keeps_its_members() {
        let app = TestApp::new();
        let team = app.create_team("Navy").await;
        let grace = app.create_member(team, "Grace", "Hopper").await;

        let created = app
            .post("/projects", json!({"name": "Apollo", "member_ids": [grace]}))
            .await;
        let apollo = created.json()["project"]["id"].as_i64().unwrap();
        assert_eq!(created.json()["project"]["members"][0]["first_name"], "Grace");

        let deleted = app
            .json(Method::DELETE, &format!("/projects/{}", apollo), None)
            .await;
        assert_eq!(deleted.status, StatusCode::NO_CONTENT);

        let member = app.get(&format!("/members/{}", grace)).await;
        assert_eq!(member.status, StatusCode::OK);
        assert_eq!(member.json()["first_name"], "Grace");

        let mut tx = app.state.store.begin().await.unwrap();
        let links = tx.all_memberships().await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].project_id(), None);
        assert_eq!(links[0].member_id().map(|m| m.value()), Some(grace));
    }

    #[tokio::test]
    async fn test_deleting_team_cascades_to_members() {
        let app = TestApp::new();
        let team = app.create_team("Alpha").await;
        let ada = app.create_member(team, "Ada", "Lovelace").await;
        app.post("/projects", json!({"name": "Apollo", "member_ids": [ada]}))
            .await;

        let deleted = app.json(Method::DELETE, &format!("/teams/{}", team), None).await;
        assert_eq!(deleted.status, StatusCode::NO_CONTENT);

        assert_eq!(app.get(&format!("/members/{}", ada)).await.status, StatusCode::NOT_FOUND);
        assert_eq!(app.get("/projects/1/members").await.json(), json!([]));
    }

    #[tokio::test]
    async fn test_failed_team_delete_keeps_every_row() {
        let store = InMemoryStore::new();
        let app = TestApp::with_store(store.clone());
        let team = app.create_team("Alpha").await;
        let ada = app.create_member(team, "Ada", "Lovelace").await;
        let grace = app.create_member(team, "Grace", "Hopper").await;
        app.post("/projects", json!({"name": "Apollo", "member_ids": [ada, grace]}))
            .await;

        let failing = TestApp::with_store(store.with_failure(FailurePoint::DeleteMembership));

        let response = failing
            .json(Method::DELETE, &format!("/teams/{}", team), None)
            .await;
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json()["error"]["type"], "delete_error");

        let request = Request::builder()
            .method(Method::DELETE)
            .uri(format!("/teams/{}", team))
            .body(Body::empty())
            .unwrap();
        let redirected = failing.send(request).await;
        assert_eq!(redirected.status, StatusCode::SEE_OTHER);
        assert_eq!(redirected.header("location"), Some("/teams"));
        let cookie = redirected.header("set-cookie").unwrap();
        let flash = Flash::decode(cookie.split(';').next().unwrap().trim_start_matches("flash="));
        assert_eq!(flash.map(|flash| flash.kind), Some(FlashKind::Alert));

        assert_eq!(app.get(&format!("/teams/{}", team)).await.status, StatusCode::OK);
        let members = app.get(&format!("/teams/{}/members", team)).await.json();
        assert_eq!(members.as_array().unwrap().len(), 2);
        let linked = app.get("/projects/1/members").await.json();
        assert_eq!(linked.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_applies_supplied_fields_only() {
        let app = TestApp::new();
        let team = app.create_team("Alpha").await;
        let ada = app.create_member(team, "Ada", "Lovelace").await;

        let response = app
            .json(
                Method::PATCH,
                &format!("/members/{}", ada),
                Some(json!({"city": "London"})),
            )
            .await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json()["city"], "London");
        assert_eq!(response.json()["first_name"], "Ada");
    }

    #[tokio::test]
    async fn test_moving_member_between_teams() {
        let app = TestApp::new();
        let alpha = app.create_team("Alpha").await;
        let beta = app.create_team("Beta").await;
        let ada = app.create_member(alpha, "Ada", "Lovelace").await;

        let choice = app.get(&format!("/members/{}/edit_team", ada)).await;
        assert_eq!(choice.json()["teams"].as_array().unwrap().len(), 2);

        let moved = app
            .json(
                Method::PATCH,
                &format!("/members/{}", ada),
                Some(json!({"team_id": beta})),
            )
            .await;
        assert_eq!(moved.json()["team_id"], beta);

        let missing = app
            .json(
                Method::PATCH,
                &format!("/members/{}", ada),
                Some(json!({"team_id": 99})),
            )
            .await;
        assert_eq!(missing.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(missing.json(), json!({"team": ["must exist"]}));
    }

    #[tokio::test]
    async fn test_add_member_does_not_duplicate_links() {
        let app = TestApp::new();
        let team = app.create_team("Alpha").await;
        let ada = app.create_member(team, "Ada", "Lovelace").await;
        app.post("/projects", json!({"name": "Apollo"})).await;

        for _ in 0..2 {
            let response = app
                .post("/projects/1/add_member", json!({"member_id": ada}))
                .await;
            assert_eq!(response.status, StatusCode::OK);
        }

        let members = app.get("/projects/1/members").await.json();
        assert_eq!(members.as_array().unwrap().len(), 1);

        let unknown = app.post("/projects/1/add_member", json!({"member_id": 42})).await;
        assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_member_ids_are_invalid() {
        let app = TestApp::new();

        let response = app
            .post("/projects", json!({"name": "Apollo", "member_ids": [7]}))
            .await;

        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json(), json!({"member_ids": ["is invalid"]}));
    }

    #[tokio::test]
    async fn test_project_members_is_always_json() {
        let app = TestApp::new();
        app.post("/projects", json!({"name": "Apollo"})).await;

        let request = Request::builder()
            .uri("/projects/1/members")
            .body(Body::empty())
            .unwrap();
        let response = app.send(request).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.json(), json!([]));
    }

    #[tokio::test]
    async fn test_missing_rows_are_not_found() {
        let app = TestApp::new();

        for uri in ["/teams/99", "/teams/abc", "/members/99", "/projects/99"] {
            let response = app.get(uri).await;
            assert_eq!(response.status, StatusCode::NOT_FOUND, "{}", uri);
            assert_eq!(response.json()["error"]["type"], "not_found_error");
        }

        let delete = app.json(Method::DELETE, "/teams/99", None).await;
        assert_eq!(delete.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_html_create_redirects_with_flash() {
        let app = TestApp::new();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/teams")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("name=Alpha"))
            .unwrap();
        let created = app.send(request).await;

        assert_eq!(created.status, StatusCode::SEE_OTHER);
        assert_eq!(created.header("location"), Some("/teams/1"));
        let cookie = created.header("set-cookie").unwrap().split(';').next().unwrap().to_string();
        assert_eq!(
            Flash::decode(cookie.trim_start_matches("flash=")),
            Some(Flash::notice("Team was successfully created."))
        );

        let request = Request::builder()
            .uri("/teams/1")
            .header("cookie", cookie)
            .body(Body::empty())
            .unwrap();
        let page = app.send(request).await;

        assert_eq!(page.status, StatusCode::OK);
        assert!(page.body.contains("Team was successfully created."));
        assert!(page.body.contains("<dd>Alpha</dd>"));
        assert!(page.header("set-cookie").unwrap().contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_html_missing_row_redirects_with_alert() {
        let app = TestApp::new();

        let request = Request::builder()
            .uri("/projects/5")
            .body(Body::empty())
            .unwrap();
        let response = app.send(request).await;

        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), Some("/projects"));
        assert!(response.header("set-cookie").unwrap().starts_with("flash="));
    }

    #[tokio::test]
    async fn test_html_validation_renders_errors() {
        let app = TestApp::new();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/teams")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("name="))
            .unwrap();
        let response = app.send(request).await;

        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.body.contains("name can&#39;t be blank"));
    }

    #[tokio::test]
    async fn test_format_query_overrides_accept() {
        let app = TestApp::new();
        app.create_team("Alpha").await;

        let request = Request::builder()
            .uri("/?format=json")
            .header("accept", "text/html")
            .body(Body::empty())
            .unwrap();
        let response = app.send(request).await;

        assert_eq!(response.json(), json!([{"id": 1, "name": "Alpha"}]));

        let request = Request::builder()
            .uri("/teams?format=%4A%53%4F%4E")
            .body(Body::empty())
            .unwrap();
        let encoded = app.send(request).await;

        assert_eq!(encoded.header("content-type"), Some("application/json"));
    }
}
