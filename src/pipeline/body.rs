//! Request body parsing stages
//!
//! JSON and urlencoded-form parsing, each a no-op unless the request
//! declares the matching content type. Malformed payloads fail the
//! pipeline with a 400 error.

use crate::error::HttpError;
use crate::pipeline::context::{ParsedBody, RequestContext};
use crate::pipeline::StageOutcome;
use percent_encoding::percent_decode_str;
use std::collections::HashMap;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// JSON body parse stage.
pub fn parse_json(mut ctx: RequestContext) -> StageOutcome {
    if ctx.content_type.as_deref() != Some(crate::http::JSON_CONTENT_TYPE) || ctx.body.is_empty() {
        return StageOutcome::Continue(ctx);
    }

    match serde_json::from_slice(&ctx.body) {
        Ok(value) => {
            ctx.parsed_body = ParsedBody::Json(value);
            StageOutcome::Continue(ctx)
        }
        Err(e) => {
            let err = HttpError::bad_request(format!("malformed JSON body: {e}"));
            StageOutcome::Fail(ctx, err)
        }
    }
}

/// URL-encoded form body parse stage.
pub fn parse_form(mut ctx: RequestContext) -> StageOutcome {
    if ctx.content_type.as_deref() != Some(FORM_CONTENT_TYPE) || ctx.body.is_empty() {
        return StageOutcome::Continue(ctx);
    }

    match decode_form(&ctx.body) {
        Ok(fields) => {
            ctx.parsed_body = ParsedBody::Form(fields);
            StageOutcome::Continue(ctx)
        }
        Err(reason) => {
            let err = HttpError::bad_request(format!("malformed form body: {reason}"));
            StageOutcome::Fail(ctx, err)
        }
    }
}

/// Decode an `application/x-www-form-urlencoded` body into a field map.
fn decode_form(body: &[u8]) -> Result<HashMap<String, String>, String> {
    let text = std::str::from_utf8(body).map_err(|e| e.to_string())?;

    let mut fields = HashMap::new();
    for pair in text.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        fields.insert(decode_component(key)?, decode_component(value)?);
    }
    Ok(fields)
}

fn decode_component(raw: &str) -> Result<String, String> {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|c| c.into_owned())
        .map_err(|e| e.to_string())
}
