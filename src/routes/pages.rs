//! Pages router: static-content pages rendered through the view layer.

use crate::pipeline::context::{Outgoing, RequestContext};
use crate::pipeline::StageOutcome;
use crate::routes::locals_of;
use crate::state::AppState;
use hyper::Method;

pub async fn route(ctx: RequestContext, state: &AppState) -> StageOutcome {
    if ctx.method != Method::GET {
        return StageOutcome::Continue(ctx);
    }

    let (view, title) = match ctx.path.as_str() {
        "/about" => ("about", "About"),
        "/contact" => ("contact", "Contact"),
        _ => return StageOutcome::Continue(ctx),
    };

    let locals = locals_of(&ctx, state);
    let html = state
        .views
        .render(view, &locals, &[("title", title.to_string())])
        .await;
    StageOutcome::Respond(Outgoing::html(200, html))
}
