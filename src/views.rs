//! View rendering module
//!
//! Templates are HTML files in the views directory using `$variable`
//! substitution. Every template sees the per-request [`ViewLocals`];
//! page handlers add their own variables on top. A missing template
//! file falls back to a built-in minimal page so rendering never fails.

use crate::error::ErrorBody;
use crate::settings::Settings;
use std::path::PathBuf;
use tokio::fs;

const LIVERELOAD_SCRIPT: &str =
    r#"<script src="http://localhost:35729/livereload.js"></script>"#;

/// Template variables available to every view, derived from settings at
/// request time and discarded after the response is produced.
#[derive(Debug, Clone)]
pub struct ViewLocals {
    pub livereload: bool,
    pub environment: String,
    pub tracking: Option<String>,
    pub tracking_domain: Option<String>,
    pub support_email: Option<String>,
}

impl ViewLocals {
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            livereload: settings.env.is_development(),
            environment: settings.env.as_str().to_string(),
            tracking: settings.app.tracking_id.clone(),
            tracking_domain: settings.app.tracking_domain.clone(),
            support_email: settings.app.support_email.clone(),
        }
    }
}

/// Template loader and renderer bound to a views directory.
#[derive(Debug, Clone)]
pub struct Views {
    dir: PathBuf,
}

impl Views {
    #[must_use]
    pub fn new(dir: &str) -> Self {
        Self {
            dir: PathBuf::from(dir),
        }
    }

    /// Render `<dir>/<name>.html` with locals and page variables.
    /// Variable values are HTML-escaped.
    pub async fn render(
        &self,
        name: &str,
        locals: &ViewLocals,
        vars: &[(&str, String)],
    ) -> String {
        self.render_html(name, locals, vars, &[]).await
    }

    /// Like [`render`](Self::render), with additional variables whose
    /// values are inserted as-is. Callers must escape embedded user data
    /// themselves (see [`escape_html`]).
    pub async fn render_html(
        &self,
        name: &str,
        locals: &ViewLocals,
        vars: &[(&str, String)],
        html_vars: &[(&str, String)],
    ) -> String {
        let path = self.dir.join(format!("{name}.html"));
        let template = match fs::read_to_string(&path).await {
            Ok(t) => t,
            Err(_) => builtin_template(name),
        };
        let rendered = substitute_raw(&template, html_vars);
        substitute(&rendered, locals, vars)
    }

    /// Render the error view from a renderer-produced body.
    pub async fn render_error(&self, body: &ErrorBody, locals: &ViewLocals) -> String {
        let stack = match &body.stack {
            Some(stack) => format!("<pre>{}</pre>", escape_html(stack)),
            None => String::new(),
        };
        let vars = [
            ("code", body.code.to_string()),
            ("message", body.message.clone()),
        ];
        self.render_html("error", locals, &vars, &[("stack", stack)])
            .await
    }
}

/// Built-in fallback when a template file is missing.
fn builtin_template(name: &str) -> String {
    match name {
        "error" => String::from(
            r"<!DOCTYPE html>
<html>
<head><title>Error $code</title></head>
<body>
<h1>$code</h1>
<p>$message</p>
$stack
</body>
</html>",
        ),
        _ => String::from(
            r"<!DOCTYPE html>
<html>
<head><title>$title</title>$livereload</head>
<body>
<h1>$title</h1>
$content
</body>
</html>",
        ),
    }
}

/// Apply locals and page variables to a template.
///
/// Page variable values are HTML-escaped. Longer variable names are
/// replaced first to avoid partial replacement.
fn substitute(template: &str, locals: &ViewLocals, vars: &[(&str, String)]) -> String {
    let mut result = template.to_string();

    result = result.replace(
        "$livereload",
        if locals.livereload {
            LIVERELOAD_SCRIPT
        } else {
            ""
        },
    );
    // $trackingDomain must come before $tracking
    result = result.replace(
        "$trackingDomain",
        &escape_html(locals.tracking_domain.as_deref().unwrap_or("")),
    );
    result = result.replace(
        "$tracking",
        &escape_html(locals.tracking.as_deref().unwrap_or("")),
    );
    result = result.replace(
        "$supportEmail",
        &escape_html(locals.support_email.as_deref().unwrap_or("")),
    );
    result = result.replace("$environment", &escape_html(&locals.environment));

    for (name, value) in vars {
        result = result.replace(&format!("${name}"), &escape_html(value));
    }

    result
}

/// Replace variables without escaping. Only for values escaped by the
/// caller (rendered sub-fragments).
fn substitute_raw(template: &str, vars: &[(&str, String)]) -> String {
    let mut result = template.to_string();
    for (name, value) in vars {
        result = result.replace(&format!("${name}"), value);
    }
    result
}

/// Escape special characters for HTML text content.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorRenderer, HttpError};
    use std::io::Write;

    fn dev_locals() -> ViewLocals {
        ViewLocals {
            livereload: true,
            environment: "development".to_string(),
            tracking: Some("UA-12345-6".to_string()),
            tracking_domain: Some("example.com".to_string()),
            support_email: Some("help@example.com".to_string()),
        }
    }

    fn prod_locals() -> ViewLocals {
        ViewLocals {
            livereload: false,
            environment: "production".to_string(),
            tracking: None,
            tracking_domain: None,
            support_email: None,
        }
    }

    #[tokio::test]
    async fn renders_template_file_with_locals() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("home.html")).unwrap();
        write!(
            file,
            "<p>env=$environment mail=$supportEmail ga=$tracking@$trackingDomain</p>"
        )
        .unwrap();

        let views = Views::new(dir.path().to_str().unwrap());
        let html = views.render("home", &dev_locals(), &[]).await;
        assert_eq!(
            html,
            "<p>env=development mail=help@example.com ga=UA-12345-6@example.com</p>"
        );
    }

    #[tokio::test]
    async fn livereload_script_only_in_development() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("home.html"), "$livereload").unwrap();

        let views = Views::new(dir.path().to_str().unwrap());
        let dev = views.render("home", &dev_locals(), &[]).await;
        assert!(dev.contains("livereload.js"));

        let prod = views.render("home", &prod_locals(), &[]).await;
        assert_eq!(prod, "");
    }

    #[tokio::test]
    async fn missing_template_falls_back() {
        let views = Views::new("no/such/dir");
        let html = views
            .render("home", &prod_locals(), &[("title", "Home".to_string())])
            .await;
        assert!(html.contains("<h1>Home</h1>"));
    }

    #[tokio::test]
    async fn error_view_includes_code_and_message() {
        let views = Views::new("no/such/dir");
        let body = ErrorRenderer::Production.body(&HttpError::not_found());
        let html = views.render_error(&body, &prod_locals()).await;
        assert!(html.contains("404"));
        assert!(html.contains("Page not Found"));
        assert!(!html.contains("<pre>"));
    }

    #[tokio::test]
    async fn error_view_shows_stack_when_present() {
        let views = Views::new("no/such/dir");
        let err = HttpError::internal("boom").with_captured_stack();
        let body = ErrorRenderer::Development.body(&err);
        let html = views.render_error(&body, &dev_locals()).await;
        assert!(html.contains("<pre>"));
    }

    #[test]
    fn html_is_escaped_in_variables() {
        let out = substitute(
            "$title",
            &prod_locals(),
            &[("title", "<script>".to_string())],
        );
        assert_eq!(out, "&lt;script&gt;");
    }
}
