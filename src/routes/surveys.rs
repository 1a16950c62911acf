//! Surveys router: HTML survey forms and form submission.

use crate::error::HttpError;
use crate::pipeline::context::{Outgoing, RequestContext};
use crate::pipeline::StageOutcome;
use crate::routes::{answers_from_body, locals_of};
use crate::state::AppState;
use crate::store::{SubmitError, Survey};
use crate::views::escape_html;
use hyper::Method;

pub async fn route(ctx: RequestContext, state: &AppState) -> StageOutcome {
    let Some(rest) = ctx.path.strip_prefix("/surveys/") else {
        return StageOutcome::Continue(ctx);
    };
    let id = rest.trim_end_matches('/').to_string();
    if id.is_empty() || id.contains('/') {
        return StageOutcome::Continue(ctx);
    }

    match ctx.method {
        Method::GET => show_form(ctx, state, &id).await,
        Method::POST => submit(ctx, state, &id).await,
        _ => StageOutcome::Continue(ctx),
    }
}

async fn show_form(ctx: RequestContext, state: &AppState, id: &str) -> StageOutcome {
    let Some(survey) = state.surveys.get(id) else {
        return StageOutcome::Fail(ctx, HttpError::new(404, format!("Survey '{id}' not found")));
    };

    let locals = locals_of(&ctx, state);
    let content = build_form(survey);
    let html = state
        .views
        .render_html(
            "survey",
            &locals,
            &[("title", survey.title.clone())],
            &[("content", content)],
        )
        .await;
    StageOutcome::Respond(Outgoing::html(200, html))
}

async fn submit(ctx: RequestContext, state: &AppState, id: &str) -> StageOutcome {
    let answers = match answers_from_body(&ctx.parsed_body) {
        Ok(answers) => answers,
        Err(err) => return StageOutcome::Fail(ctx, err),
    };

    match state.surveys.submit(id, answers).await {
        Ok(_) => {
            let locals = locals_of(&ctx, state);
            let title = state
                .surveys
                .get(id)
                .map_or_else(|| id.to_string(), |s| s.title.clone());
            let content = format!(
                "<p>Your response to \u{201c}{}\u{201d} was recorded.</p>",
                escape_html(&title)
            );
            let html = state
                .views
                .render_html(
                    "thanks",
                    &locals,
                    &[("title", "Thank you".to_string())],
                    &[("content", content)],
                )
                .await;
            StageOutcome::Respond(Outgoing::html(200, html))
        }
        Err(SubmitError::UnknownSurvey(_)) => {
            StageOutcome::Fail(ctx, HttpError::new(404, format!("Survey '{id}' not found")))
        }
        Err(SubmitError::MissingAnswer(question)) => StageOutcome::Fail(
            ctx,
            HttpError::bad_request(format!("missing required answer for question '{question}'")),
        ),
    }
}

/// Build the HTML form for a survey's questions.
fn build_form(survey: &Survey) -> String {
    let mut fields = String::new();
    if let Some(description) = &survey.description {
        fields.push_str(&format!("<p>{}</p>\n", escape_html(description)));
    }
    for question in &survey.questions {
        let id = escape_html(&question.id);
        fields.push_str(&format!(
            "<label for=\"{id}\">{}</label>\n<input type=\"text\" id=\"{id}\" name=\"{id}\"{}>\n",
            escape_html(&question.prompt),
            if question.required { " required" } else { "" },
        ));
    }
    format!(
        "<form method=\"post\" action=\"/surveys/{}\">\n{fields}<button type=\"submit\">Submit</button>\n</form>",
        escape_html(&survey.id)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::context::ParsedBody;
    use crate::settings::Settings;
    use crate::store::{Question, SurveyStore};
    use std::collections::HashMap;

    fn test_state() -> AppState {
        let settings = Settings::load_from(None, None, None).unwrap();
        let surveys = SurveyStore::from_surveys(vec![Survey {
            id: "s1".to_string(),
            title: "Customer feedback".to_string(),
            description: Some("Tell us how we did.".to_string()),
            questions: vec![Question {
                id: "q1".to_string(),
                prompt: "How did we do?".to_string(),
                required: true,
            }],
        }]);
        AppState::new(settings, surveys)
    }

    #[tokio::test]
    async fn get_renders_form_with_questions() {
        let state = test_state();
        let ctx = RequestContext::new(Method::GET, "/surveys/s1");
        match route(ctx, &state).await {
            StageOutcome::Respond(out) => {
                let html = String::from_utf8_lossy(&out.body).into_owned();
                assert!(html.contains("action=\"/surveys/s1\""));
                assert!(html.contains("How did we do?"));
                assert!(html.contains("required"));
            }
            other => panic!("expected Respond, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_survey_fails_with_404() {
        let state = test_state();
        let ctx = RequestContext::new(Method::GET, "/surveys/missing");
        match route(ctx, &state).await {
            StageOutcome::Fail(_, err) => assert_eq!(err.status, Some(404)),
            other => panic!("expected Fail, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn post_with_form_answers_records_response() {
        let state = test_state();
        let mut ctx = RequestContext::new(Method::POST, "/surveys/s1");
        let mut fields = HashMap::new();
        fields.insert("q1".to_string(), "great".to_string());
        ctx.parsed_body = ParsedBody::Form(fields);

        match route(ctx, &state).await {
            StageOutcome::Respond(out) => {
                assert_eq!(out.status, 200);
                let html = String::from_utf8_lossy(&out.body).into_owned();
                assert!(html.contains("Thank you") || html.contains("recorded"));
            }
            other => panic!("expected Respond, got {other:?}"),
        }
        assert_eq!(state.surveys.response_count("s1").await, 1);
    }

    #[tokio::test]
    async fn post_without_required_answer_fails_with_400() {
        let state = test_state();
        let ctx = RequestContext::new(Method::POST, "/surveys/s1");
        match route(ctx, &state).await {
            StageOutcome::Fail(_, err) => {
                assert_eq!(err.status, Some(400));
                assert!(err.message.contains("q1"));
            }
            other => panic!("expected Fail, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn nested_paths_pass_through() {
        let state = test_state();
        let ctx = RequestContext::new(Method::GET, "/surveys/s1/edit");
        assert!(matches!(
            route(ctx, &state).await,
            StageOutcome::Continue(_)
        ));
    }
}
