//! Static file stage
//!
//! Serves files under the public root before route dispatch; a miss
//! passes the request through. Traversal outside the public root is
//! rejected via canonicalized path comparison.

use crate::http::{cache, mime};
use crate::logger;
use crate::pipeline::context::{Outgoing, RequestContext};
use crate::pipeline::StageOutcome;
use hyper::Method;
use std::path::Path;
use tokio::fs;

/// Serve the request path from the public directory, or pass through.
pub async fn serve(ctx: RequestContext, public_dir: &str) -> StageOutcome {
    if ctx.method != Method::GET {
        return StageOutcome::Continue(ctx);
    }

    match load_public_file(public_dir, &ctx.path).await {
        Some((content, content_type)) => {
            let etag = cache::generate_etag(&content);
            if cache::check_etag_match(ctx.if_none_match.as_deref(), &etag) {
                return StageOutcome::Respond(Outgoing::not_modified(etag));
            }
            StageOutcome::Respond(Outgoing::static_file(content, content_type, etag))
        }
        None => StageOutcome::Continue(ctx),
    }
}

/// Load a file under the public root for a request path.
///
/// Returns `None` on miss, directory paths, or traversal attempts.
async fn load_public_file(public_dir: &str, path: &str) -> Option<(Vec<u8>, &'static str)> {
    // Remove leading slash and prevent directory traversal
    let clean_path = path.trim_start_matches('/').replace("..", "");
    if clean_path.is_empty() {
        return None;
    }

    let file_path = Path::new(public_dir).join(&clean_path);

    // Security: ensure file_path is within the public root
    let public_canonical = Path::new(public_dir).canonicalize().ok()?;
    let Ok(file_canonical) = file_path.canonicalize() else {
        return None;
    };
    if !file_canonical.starts_with(&public_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            path,
            file_canonical.display()
        ));
        return None;
    }
    if file_canonical.is_dir() {
        return None;
    }

    let content = fs::read(&file_canonical).await.ok()?;
    let content_type = mime::get_content_type(file_canonical.extension().and_then(|e| e.to_str()));
    Some((content, content_type))
}
