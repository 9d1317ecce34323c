//! Control surface: health, scheduler diagnostics, id lookup and link
//! expansion over HTTP.

use crate::error::NotifyError;
use crate::identity;
use crate::notify::{self, Phase};
use crate::ports::{ChatBackend, TrackedMembers, ZwiftBackend};
use crate::state::AppState;
use crate::types::chat::OutgoingMessage;
use crate::zwift::event_links;

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{error, info};

pub fn app<Z, C, M>(state: AppState<Z, C, M>) -> Router
where
    Z: ZwiftBackend,
    C: ChatBackend,
    M: TrackedMembers,
{
    Router::new()
        .route("/health", get(health))
        .route("/api/schedule", get(schedule::<Z, C, M>))
        .route("/api/zwiftid", get(zwift_id::<Z, C, M>))
        .route("/api/expand", post(expand::<Z, C, M>))
        .with_state(state)
}

pub(crate) async fn health() -> &'static str {
    "ok"
}

fn rfc3339(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| at.to_string())
}

#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(err: NotifyError) -> ApiError {
    error!(error = %err, "request failed");
    let status = match err {
        NotifyError::Fetch(_) | NotifyError::Chat(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

#[derive(Serialize)]
pub(crate) struct ScheduleResponse {
    pub(crate) server_time: String,
    pub(crate) phase: Phase,
    pub(crate) target: Option<String>,
    pub(crate) seconds_until_next_check: Option<i64>,
    pub(crate) last_fired: Option<String>,
    pub(crate) last_error: Option<String>,
    pub(crate) cycles: u64,
    pub(crate) description: String,
}

pub(crate) async fn schedule<Z, C, M>(
    State(state): State<AppState<Z, C, M>>,
) -> Json<ScheduleResponse>
where
    Z: ZwiftBackend,
    C: ChatBackend,
    M: TrackedMembers,
{
    let now = OffsetDateTime::now_utc();
    let snapshot = state.schedule.snapshot();
    Json(ScheduleResponse {
        server_time: rfc3339(now),
        phase: snapshot.phase,
        target: snapshot.target.map(rfc3339),
        seconds_until_next_check: snapshot
            .target
            .map(|target| (target - now).whole_seconds().max(0)),
        last_fired: snapshot.last_fired.map(rfc3339),
        last_error: snapshot.last_error,
        cycles: snapshot.cycles,
        description: state.schedule.describe(now),
    })
}

#[derive(Debug, Deserialize)]
pub(crate) struct LookupQuery {
    #[serde(default)]
    pub(crate) q: String,
}

#[derive(Serialize)]
pub(crate) struct LookupResponse {
    pub(crate) reply: String,
}

pub(crate) async fn zwift_id<Z, C, M>(
    State(state): State<AppState<Z, C, M>>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<LookupResponse>, ApiError>
where
    Z: ZwiftBackend,
    C: ChatBackend,
    M: TrackedMembers,
{
    let queries: Vec<String> = query.q.split_whitespace().map(str::to_string).collect();
    if queries.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "q must name at least one rider.".to_string(),
            }),
        ));
    }
    let reply = identity::lookup_reply(&queries, &state.chat, &state.zwift, &state.zwift)
        .await
        .map_err(|err| api_error(err.into()))?;
    Ok(Json(LookupResponse { reply }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExpandRequest {
    pub(crate) content: String,
}

#[derive(Serialize)]
pub(crate) struct ExpandResponse {
    pub(crate) replies: Vec<OutgoingMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) check_target: Option<String>,
}

/// Renders one reply per event link in a message body.
pub(crate) async fn expand<Z, C, M>(
    State(state): State<AppState<Z, C, M>>,
    Json(request): Json<ExpandRequest>,
) -> Result<Json<ExpandResponse>, ApiError>
where
    Z: ZwiftBackend,
    C: ChatBackend,
    M: TrackedMembers,
{
    let links = event_links(&request.content);
    let mut replies = Vec::with_capacity(links.len());
    if !links.is_empty() {
        let tracked = state
            .members
            .load()
            .map_err(|err| api_error(err.into()))?;
        let emojis = state.emojis.get_or_empty(&state.chat).await;
        for link in &links {
            info!(event_id = link.id, "expanding event link");
            let reply = notify::prepare_event_message(&state, link, &tracked, emojis)
                .await
                .map_err(api_error)?;
            replies.push(reply);
        }
    }

    let check_target = request
        .content
        .contains("check-target")
        .then(|| match state.schedule.snapshot().target {
            Some(target) => rfc3339(target),
            None => "not scheduled".to_string(),
        });
    Ok(Json(ExpandResponse {
        replies,
        check_target,
    }))
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::testing::{FakeChat, FakeMembers, FakeZwift, test_state};
    use crate::types::rider::{RaceSignup, RiderProfile, RiderSummary};
    use crate::zwift::event::tests::sample_event;
    use axum::body::Body;
    use axum::body::to_bytes;
    use axum::http::Request;
    use axum::http::header::CONTENT_TYPE;
    use serde_json::Value as JsonValue;
    use serde_json::from_slice as json_from_slice;
    use time::macros::datetime;
    use tower::ServiceExt;

    fn zwift() -> FakeZwift {
        FakeZwift::default()
            .with_team(vec![RiderSummary {
                id: 399078,
                name: "Mick van Dijk".to_string(),
            }])
            .with_profile(RiderProfile {
                id: 399078,
                name: "Mick van Dijk".to_string(),
                signups: Vec::new(),
            })
            .with_event(4123456, sample_event())
            .with_roster(
                4123456,
                vec![
                    RaceSignup {
                        id: 399078,
                        name: "Mick van Dijk".to_string(),
                        team_id: Some(13264),
                        category: "A".to_string(),
                    },
                    RaceSignup {
                        id: 5,
                        name: "Stranger".to_string(),
                        team_id: Some(1),
                        category: "B".to_string(),
                    },
                ],
            )
    }

    fn router() -> Router {
        app(test_state(zwift(), FakeChat::default(), FakeMembers::new(vec![399078])))
    }

    async fn json_body(response: axum::response::Response) -> JsonValue {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        json_from_slice(&body).expect("json body")
    }

    fn expand_request(content: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/expand")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({ "content": content }).to_string(),
            ))
            .expect("request")
    }

    #[tokio::test]
    async fn app__should_return_ok_on_health_endpoint() {
        // When
        let response = router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        assert_eq!(body.as_ref(), b"ok");
    }

    #[tokio::test]
    async fn schedule__should_report_target_and_phase() {
        // Given
        let state = test_state(zwift(), FakeChat::default(), FakeMembers::new(vec![]));
        state.schedule.waiting(datetime!(2099-01-14 18:00 +1));

        // When
        let response = app(state)
            .oneshot(Request::builder().uri("/api/schedule").body(Body::empty()).unwrap())
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["phase"], "waiting");
        assert_eq!(body["target"], "2099-01-14T18:00:00+01:00");
        assert!(body["seconds_until_next_check"].as_i64().expect("seconds") > 0);
        assert_eq!(body["cycles"], 0);
    }

    #[tokio::test]
    async fn zwift_id__should_reply_per_query() {
        // When
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/api/zwiftid?q=mick%20nobody")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(
            body["reply"],
            "mick: 399078 (Mick van Dijk)\nnobody: Not found or too many results"
        );
    }

    #[tokio::test]
    async fn zwift_id__should_reject_empty_query() {
        // When
        let response = router()
            .oneshot(Request::builder().uri("/api/zwiftid").body(Body::empty()).unwrap())
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn expand__should_render_linked_events_with_filtered_roster() {
        // When
        let response = router()
            .oneshot(expand_request(
                "who is in? https://www.zwift.com/eu/events/view/4123456?eventSecret=ab12",
            ))
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let replies = body["replies"].as_array().expect("replies");
        assert_eq!(replies.len(), 1);
        let embed = &replies[0]["embeds"][0];
        assert_eq!(embed["title"], r"Backpedal \| Tuesday Race");
        let signups = embed["fields"]
            .as_array()
            .expect("fields")
            .iter()
            .find(|field| field["name"] == "Signups")
            .expect("signups field");
        assert_eq!(signups["value"], "A Mick van Dijk");
        assert!(body.get("check_target").is_none());
    }

    #[tokio::test]
    async fn expand__should_answer_check_target() {
        // When
        let response = router()
            .oneshot(expand_request("check-target"))
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["replies"].as_array().map(Vec::len), Some(0));
        assert_eq!(body["check_target"], "not scheduled");
    }

    #[tokio::test]
    async fn expand__should_return_bad_gateway_when_event_fetch_fails() {
        // When
        let response = router()
            .oneshot(expand_request("https://zwift.com/events/view/77"))
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert!(body["error"].as_str().expect("error").contains("404"));
    }
}
