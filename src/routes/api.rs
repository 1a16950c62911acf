//! API router, mounted under `/api/v1`
//!
//! Pre-sets a JSON response content type on entry so that every outcome
//! on this mount, including errors raised later in the pipeline, renders
//! as JSON. Success bodies are pretty-printed per the `json_spaces`
//! setting.

use crate::error::HttpError;
use crate::http::json;
use crate::http::JSON_CONTENT_TYPE;
use crate::pipeline::context::{Outgoing, RequestContext};
use crate::pipeline::StageOutcome;
use crate::routes::answers_from_body;
use crate::state::AppState;
use crate::store::{SubmitError, Survey};
use hyper::Method;
use serde::Serialize;

#[derive(Serialize)]
struct SurveySummary<'a> {
    id: &'a str,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    questions: usize,
    responses: usize,
}

#[derive(Serialize)]
struct SurveyDetail<'a> {
    #[serde(flatten)]
    survey: &'a Survey,
    responses: usize,
}

pub async fn route(mut ctx: RequestContext, state: &AppState) -> StageOutcome {
    let Some(sub) = ctx.path.strip_prefix("/api/v1") else {
        return StageOutcome::Continue(ctx);
    };
    // Mount boundary: the prefix must be the whole path or be followed
    // by a slash, so /api/v1xyz belongs to another mount.
    if !sub.is_empty() && !sub.starts_with('/') {
        return StageOutcome::Continue(ctx);
    }
    let sub = sub.trim_end_matches('/').to_string();

    // From here on every response, error renders included, is JSON.
    ctx.response_content_type = Some(JSON_CONTENT_TYPE.to_string());

    if ctx.method == Method::GET && sub == "/health" {
        return respond_json(ctx, state, 200, &serde_json::json!({"status": "ok"}));
    }

    if ctx.method == Method::GET && sub == "/surveys" {
        let mut summaries = Vec::new();
        for survey in state.surveys.all() {
            summaries.push(SurveySummary {
                id: &survey.id,
                title: &survey.title,
                description: survey.description.as_deref(),
                questions: survey.questions.len(),
                responses: state.surveys.response_count(&survey.id).await,
            });
        }
        return respond_json(ctx, state, 200, &summaries);
    }

    if let Some(id) = sub.strip_prefix("/surveys/") {
        if ctx.method == Method::GET && !id.contains('/') {
            let id = id.to_string();
            return match state.surveys.get(&id) {
                Some(survey) => {
                    let detail = SurveyDetail {
                        survey,
                        responses: state.surveys.response_count(&id).await,
                    };
                    respond_json(ctx, state, 200, &detail)
                }
                None => StageOutcome::Fail(
                    ctx,
                    HttpError::new(404, format!("Survey '{id}' not found")),
                ),
            };
        }

        if ctx.method == Method::POST {
            if let Some(id) = id.strip_suffix("/responses") {
                if !id.contains('/') {
                    let id = id.to_string();
                    return submit(ctx, state, &id).await;
                }
            }
        }
    }

    // Unmatched api path: fall through to the 404 stage, which will
    // render as JSON because of the pre-set content type.
    StageOutcome::Continue(ctx)
}

async fn submit(ctx: RequestContext, state: &AppState, id: &str) -> StageOutcome {
    let answers = match answers_from_body(&ctx.parsed_body) {
        Ok(answers) => answers,
        Err(err) => return StageOutcome::Fail(ctx, err),
    };

    match state.surveys.submit(id, answers).await {
        Ok(response) => respond_json(ctx, state, 201, &response),
        Err(SubmitError::UnknownSurvey(_)) => StageOutcome::Fail(
            ctx,
            HttpError::new(404, format!("Survey '{id}' not found")),
        ),
        Err(SubmitError::MissingAnswer(question)) => StageOutcome::Fail(
            ctx,
            HttpError::bad_request(format!("missing required answer for question '{question}'")),
        ),
    }
}

fn respond_json<T: Serialize>(
    ctx: RequestContext,
    state: &AppState,
    status: u16,
    value: &T,
) -> StageOutcome {
    match json::pretty(value, state.settings.http.json_spaces) {
        Ok(body) => StageOutcome::Respond(Outgoing::json(status, body)),
        Err(e) => StageOutcome::Fail(
            ctx,
            HttpError::internal(format!("failed to serialize response: {e}")),
        ),
    }
}
