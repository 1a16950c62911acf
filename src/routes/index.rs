//! Index router: the home page listing available surveys.

use crate::pipeline::context::{Outgoing, RequestContext};
use crate::pipeline::StageOutcome;
use crate::routes::locals_of;
use crate::state::AppState;
use crate::views::escape_html;
use hyper::Method;

pub async fn route(ctx: RequestContext, state: &AppState) -> StageOutcome {
    if ctx.method != Method::GET || ctx.path != "/" {
        return StageOutcome::Continue(ctx);
    }

    let locals = locals_of(&ctx, state);

    let mut items = String::new();
    for survey in state.surveys.all() {
        items.push_str(&format!(
            "<li><a href=\"/surveys/{}\">{}</a></li>\n",
            escape_html(&survey.id),
            escape_html(&survey.title)
        ));
    }
    let content = if items.is_empty() {
        "<p>No surveys are available right now.</p>".to_string()
    } else {
        format!("<ul class=\"surveys\">\n{items}</ul>")
    };

    let html = state
        .views
        .render_html(
            "home",
            &locals,
            &[("title", "Surveys".to_string())],
            &[("content", content)],
        )
        .await;
    StageOutcome::Respond(Outgoing::html(200, html))
}
