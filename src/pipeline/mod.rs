//! Request pipeline
//!
//! The middleware chain as an explicit state machine: stages run in a
//! fixed order, each returning a [`StageOutcome`] that passes the request
//! forward, terminates with a response, or fails. The driver dispatches
//! accordingly, funnels every failure into the startup-selected error
//! renderer, and emits one access log entry per request.

pub mod body;
pub mod context;
pub mod statics;

pub use context::{from_hyper, Outgoing, ParsedBody, RequestContext};

use crate::error::HttpError;
use crate::logger::{self, AccessLogEntry};
use crate::routes;
use crate::state::AppState;
use crate::views::ViewLocals;
use std::time::Instant;

/// Result of one pipeline stage.
#[derive(Debug)]
pub enum StageOutcome {
    /// Pass control to the next stage.
    Continue(RequestContext),
    /// Terminate the chain with a response.
    Respond(Outgoing),
    /// Short-circuit to the error renderer.
    Fail(RequestContext, HttpError),
}

/// Drive a request through the full chain and produce the response.
pub async fn handle(ctx: RequestContext, state: &AppState) -> Outgoing {
    let started = Instant::now();
    let mut entry = AccessLogEntry::new(
        ctx.remote_addr
            .map_or_else(|| "-".to_string(), |a| a.to_string()),
        ctx.method.to_string(),
        ctx.path.clone(),
    );
    entry.query = ctx.query.clone();
    entry.http_version = ctx.http_version.clone();

    let outgoing = run_stages(ctx, state).await;

    // Logged once the response is fully determined, so error-driven
    // status codes show up accurately.
    if state.settings.logging.access_log {
        entry.status = outgoing.status;
        entry.body_bytes = outgoing.body.len();
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, state.settings.access_log_format());
    }

    outgoing
}

/// The fixed stage order. First `Respond` wins; first `Fail` goes to the
/// error renderer; a request no stage claims becomes a 404.
async fn run_stages(ctx: RequestContext, state: &AppState) -> Outgoing {
    // 1. JSON body parse
    let ctx = match body::parse_json(ctx) {
        StageOutcome::Continue(ctx) => ctx,
        StageOutcome::Respond(out) => return out,
        StageOutcome::Fail(ctx, err) => return render_error(state, &ctx, err).await,
    };

    // 2. URL-encoded body parse
    let ctx = match body::parse_form(ctx) {
        StageOutcome::Continue(ctx) => ctx,
        StageOutcome::Respond(out) => return out,
        StageOutcome::Fail(ctx, err) => return render_error(state, &ctx, err).await,
    };

    // 3. Static file serve
    let ctx = match statics::serve(ctx, &state.settings.app.public_dir).await {
        StageOutcome::Continue(ctx) => ctx,
        StageOutcome::Respond(out) => return out,
        StageOutcome::Fail(ctx, err) => return render_error(state, &ctx, err).await,
    };

    // 4. View-locals injection
    let ctx = inject_locals(ctx, state);

    // 5. Route dispatch
    let ctx = match routes::dispatch(ctx, state).await {
        StageOutcome::Continue(ctx) => ctx,
        StageOutcome::Respond(out) => return out,
        StageOutcome::Fail(ctx, err) => return render_error(state, &ctx, err).await,
    };

    // 6. Nothing claimed the request: synthesize the 404.
    render_error(state, &ctx, HttpError::not_found()).await
}

fn inject_locals(mut ctx: RequestContext, state: &AppState) -> RequestContext {
    ctx.locals = Some(ViewLocals::from_settings(&state.settings));
    ctx
}

/// Render a failure through the active error strategy.
///
/// Output is JSON when a router pre-set a JSON response content type,
/// HTML otherwise; the request `Accept` header plays no part.
pub async fn render_error(state: &AppState, ctx: &RequestContext, err: HttpError) -> Outgoing {
    let err = if state.settings.env.is_development() && err.stack.is_none() {
        err.with_captured_stack()
    } else {
        err
    };

    let body = state.error_renderer.body(&err);
    let status = body.code;

    if ctx.wants_json_response() {
        let json = crate::http::json::pretty(&body, state.settings.http.json_spaces)
            .unwrap_or_else(|_| format!("{{\"code\": {status}}}"));
        Outgoing::json(status, json)
    } else {
        let locals = ctx
            .locals
            .clone()
            .unwrap_or_else(|| ViewLocals::from_settings(&state.settings));
        let html = state.views.render_error(&body, &locals).await;
        Outgoing::html(status, html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::store::{Question, Survey, SurveyStore};
    use hyper::Method;

    fn test_state(node_env: Option<&str>) -> AppState {
        let mut settings = Settings::load_from(None, None, node_env).unwrap();
        settings.logging.access_log = false;
        let surveys = SurveyStore::from_surveys(vec![Survey {
            id: "s1".to_string(),
            title: "Customer feedback".to_string(),
            description: None,
            questions: vec![Question {
                id: "q1".to_string(),
                prompt: "How did we do?".to_string(),
                required: true,
            }],
        }]);
        AppState::new(settings, surveys)
    }

    #[tokio::test]
    async fn unknown_path_renders_html_404() {
        let state = test_state(None);
        let ctx = RequestContext::new(Method::GET, "/no/such/page");
        let out = handle(ctx, &state).await;
        assert_eq!(out.status, 404);
        assert_eq!(out.content_type, "text/html; charset=utf-8");
        let html = String::from_utf8_lossy(&out.body).into_owned();
        assert!(html.contains("Page not Found"));
    }

    #[tokio::test]
    async fn unknown_api_path_renders_json_404() {
        let state = test_state(None);
        let ctx = RequestContext::new(Method::GET, "/api/v1/bogus");
        let out = handle(ctx, &state).await;
        assert_eq!(out.status, 404);
        assert_eq!(out.content_type, "application/json");
        let parsed: serde_json::Value = serde_json::from_slice(&out.body).unwrap();
        assert_eq!(parsed["code"], 404);
        assert_eq!(parsed["message"], "Page not Found");
        assert!(parsed.get("stack").is_none());
    }

    #[tokio::test]
    async fn development_json_errors_carry_a_stack() {
        let state = test_state(Some("development"));
        let ctx = RequestContext::new(Method::GET, "/api/v1/bogus");
        let out = handle(ctx, &state).await;
        let parsed: serde_json::Value = serde_json::from_slice(&out.body).unwrap();
        assert_eq!(parsed["code"], 404);
        assert!(parsed["stack"].is_string());
    }

    #[tokio::test]
    async fn json_error_body_uses_four_space_indentation() {
        let state = test_state(None);
        let ctx = RequestContext::new(Method::GET, "/api/v1/bogus");
        let out = handle(ctx, &state).await;
        assert_eq!(
            &out.body[..],
            b"{\n    \"code\": 404,\n    \"message\": \"Page not Found\"\n}"
        );
    }

    #[tokio::test]
    async fn malformed_json_body_is_a_400() {
        let state = test_state(None);
        let ctx = RequestContext::new(Method::POST, "/surveys/s1")
            .with_body("application/json", "{broken");
        let out = handle(ctx, &state).await;
        assert_eq!(out.status, 400);
        // No content type was pre-set, so the HTML path is taken.
        assert_eq!(out.content_type, "text/html; charset=utf-8");
    }

    #[tokio::test]
    async fn static_files_win_over_routes_and_404() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("about"), "static beats routing").unwrap();

        let mut state = test_state(None);
        state.settings.app.public_dir = dir.path().to_str().unwrap().to_string();

        // A path the pages router would otherwise own.
        let ctx = RequestContext::new(Method::GET, "/about");
        let out = handle(ctx, &state).await;
        assert_eq!(out.status, 200);
        assert_eq!(&out.body[..], b"static beats routing");

        // And a path nothing owns is still exempt from the 404 handler.
        let ctx = RequestContext::new(Method::GET, "/about");
        assert_eq!(handle(ctx, &state).await.status, 200);
    }

    #[tokio::test]
    async fn home_page_is_served() {
        let state = test_state(None);
        let ctx = RequestContext::new(Method::GET, "/");
        let out = handle(ctx, &state).await;
        assert_eq!(out.status, 200);
        assert!(String::from_utf8_lossy(&out.body).contains("/surveys/s1"));
    }

    #[tokio::test]
    async fn form_submission_flows_end_to_end() {
        let state = test_state(None);
        let ctx = RequestContext::new(Method::POST, "/surveys/s1")
            .with_body("application/x-www-form-urlencoded", "q1=very+good");
        let out = handle(ctx, &state).await;
        assert_eq!(out.status, 200);
        assert_eq!(state.surveys.response_count("s1").await, 1);
    }

    #[tokio::test]
    async fn production_html_errors_have_no_stack() {
        let state = test_state(None);
        let ctx = RequestContext::new(Method::GET, "/no/such/page");
        let out = handle(ctx, &state).await;
        assert!(!String::from_utf8_lossy(&out.body).contains("<pre>"));
    }
}
