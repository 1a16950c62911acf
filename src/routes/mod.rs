//! Route modules and dispatch
//!
//! Routers are tried in mount order: index, pages, and surveys own paths
//! under `/`; the api router owns `/api/v1`. A router that does not
//! recognize the path passes the request to the next mount.

pub mod api;
pub mod index;
pub mod pages;
pub mod surveys;

use crate::error::HttpError;
use crate::pipeline::context::{ParsedBody, RequestContext};
use crate::pipeline::StageOutcome;
use crate::state::AppState;
use crate::views::ViewLocals;
use std::collections::HashMap;

/// Try each mounted router in order.
pub async fn dispatch(ctx: RequestContext, state: &AppState) -> StageOutcome {
    let ctx = match index::route(ctx, state).await {
        StageOutcome::Continue(ctx) => ctx,
        other => return other,
    };
    let ctx = match pages::route(ctx, state).await {
        StageOutcome::Continue(ctx) => ctx,
        other => return other,
    };
    let ctx = match surveys::route(ctx, state).await {
        StageOutcome::Continue(ctx) => ctx,
        other => return other,
    };
    api::route(ctx, state).await
}

/// Locals for a handler; the injection stage normally populated them,
/// but errors raised before that stage still need a set to render with.
pub(crate) fn locals_of(ctx: &RequestContext, state: &AppState) -> ViewLocals {
    ctx.locals
        .clone()
        .unwrap_or_else(|| ViewLocals::from_settings(&state.settings))
}

/// Extract survey answers from a parsed request body.
///
/// Form bodies map fields directly to answers. JSON bodies may either
/// nest them under an `answers` object or provide them at the top level.
pub(crate) fn answers_from_body(
    body: &ParsedBody,
) -> Result<HashMap<String, String>, HttpError> {
    match body {
        ParsedBody::None => Ok(HashMap::new()),
        ParsedBody::Form(fields) => Ok(fields.clone()),
        ParsedBody::Json(value) => {
            let object = match value.get("answers") {
                Some(answers) => answers,
                None => value,
            };
            let Some(map) = object.as_object() else {
                return Err(HttpError::bad_request(
                    "expected a JSON object of answers",
                ));
            };
            Ok(map
                .iter()
                .map(|(k, v)| {
                    let text = match v.as_str() {
                        Some(s) => s.to_string(),
                        None => v.to_string(),
                    };
                    (k.clone(), text)
                })
                .collect())
        }
    }
}
