//! Landing pages for the hosted checkout redirects

use axum::{extract::Query, response::Html};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SuccessParams {
    #[serde(default)]
    pub session_id: Option<String>,
}

const PAGE_STYLE: &str = "font-family: system-ui; display: flex; justify-content: center; \
    align-items: center; height: 100vh; margin: 0; background: #f4f1ea;";

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>{title}</title></head>
<body style="{style}">
    <main style="background: white; padding: 48px; border-radius: 12px; text-align: center;">
        <h1>{title}</h1>
        {body}
    </main>
</body>
</html>
"#,
        title = title,
        style = PAGE_STYLE,
        body = body
    ))
}

/// Keep the echoed session id to the characters Stripe uses
fn sanitize(session_id: &str) -> String {
    session_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .take(255)
        .collect()
}

pub async fn checkout_success(Query(params): Query<SuccessParams>) -> Html<String> {
    let session_id = params
        .session_id
        .as_deref()
        .map(sanitize)
        .unwrap_or_else(|| "unknown".to_string());

    page(
        "Thank you for your order",
        &format!(
            "<p>Reference: <code>{}</code></p>\
             <p style=\"color: #555;\">Your payment is being confirmed.</p>",
            session_id
        ),
    )
}

pub async fn checkout_cancel() -> Html<String> {
    page(
        "Checkout cancelled",
        "<p style=\"color: #555;\">Your cart is still saved. No charges were made.</p>",
    )
}
