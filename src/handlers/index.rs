use axum::response::Html;

const INDEX_PAGE: &str = r#"<html>
<head><title>SendGrid Stats Exporter</title></head>
<body>
<h1>SendGrid Stats Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
</body>
</html>
"#;

/// GET /
pub async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}
