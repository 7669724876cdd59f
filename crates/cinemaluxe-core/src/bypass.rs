//! Protector link bypass
//!
//! The site hides real links behind "protector" pages. Two schemes are in
//! use: a base64-encoded link embedded in the page source, and a hidden
//! form whose POST answers with the target in a `Location` header. Both
//! are tried in order; anything that goes wrong falls back to returning
//! the input URL unchanged, so callers always get something to render.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::client::CinemaluxeClient;
use crate::error::Result;

/// Resolves a protector URL to its target, or returns it unchanged
///
/// Infallible by contract: callers cannot tell "already direct" from
/// "could not resolve" without re-checking the URL shape themselves.
pub(crate) async fn resolve(client: &CinemaluxeClient, url: &str) -> String {
    match try_resolve(client, url).await {
        Ok(Some(resolved)) if !resolved.is_empty() => resolved,
        Ok(_) => url.to_string(),
        Err(err) => {
            debug!(url, "bypass fell back to input: {err}");
            url.to_string()
        }
    }
}

async fn try_resolve(client: &CinemaluxeClient, url: &str) -> Result<Option<String>> {
    let body = client.fetch_page(url).await?;

    if let Some(link) = decode_embedded_link(&body) {
        return Ok(Some(link));
    }

    if let Some(form) = extract_protector_form(&body) {
        return client.post_form(&form.post_url, &form.fields()).await;
    }

    Ok(None)
}

/// Scheme one: a `"link":"<base64>"` field in the page source
///
/// The value carries JSON-escaped slashes; decode failures or an empty
/// payload fall through to the next scheme.
fn decode_embedded_link(body: &str) -> Option<String> {
    let Ok(re) = Regex::new(r#""link":"([^"]+)""#) else {
        return None;
    };
    let encoded = re.captures(body)?.get(1)?.as_str().replace("\\/", "/");
    let decoded = STANDARD.decode(encoded).ok()?;
    let link = String::from_utf8(decoded).ok()?;

    if link.is_empty() { None } else { Some(link) }
}

/// Scheme two: the hidden soralink form
///
/// Requires all three markers on the page: the AJAX endpoint, the `item`
/// object literal, and the action token.
#[derive(Debug)]
struct ProtectorForm {
    post_url: String,
    action: String,
    item: Value,
}

impl ProtectorForm {
    /// Form fields in the order the site's own script submits them
    ///
    /// Missing item fields default to an empty string (or false for the
    /// `new` flag); numeric values are stringified.
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("token", text_field(&self.item, "token")),
            ("id", text_field(&self.item, "id")),
            ("time", text_field(&self.item, "time")),
            ("post", text_field(&self.item, "post")),
            ("redirect", text_field(&self.item, "redirect")),
            ("cacha", text_field(&self.item, "cacha")),
            ("new", bool_field(&self.item, "new").to_string()),
            ("link", text_field(&self.item, "link")),
            ("action", self.action.clone()),
        ]
    }
}

fn extract_protector_form(body: &str) -> Option<ProtectorForm> {
    let post_url = first_capture(body, r#""soralink_ajaxurl":"([^"]+)""#)?.replace("\\/", "/");
    let raw_item = first_capture(body, r"(?s)var\s+item\s*=\s*(\{.*?\});")?;
    let action = first_capture(body, r#""soralink_z"\s*:\s*"([^"]+)""#)?;
    let item = parse_item_object(&raw_item)?;

    Some(ProtectorForm {
        post_url,
        action,
        item,
    })
}

fn first_capture(body: &str, pattern: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    Some(re.captures(body)?.get(1)?.as_str().to_string())
}

/// Parses the `item` object literal, tolerating one statement wrapper
///
/// The literal sometimes arrives wrapped in its surrounding statement
/// (`var item = {...};`). One sanitizing pass strips that; anything still
/// unparseable abandons the form scheme.
fn parse_item_object(raw: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str(raw) {
        return Some(value);
    }
    serde_json::from_str(&strip_statement_wrapper(raw)).ok()
}

fn strip_statement_wrapper(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_decl = match Regex::new(r"^var\s+\w+\s*=\s*") {
        Ok(re) => re.replace(trimmed, "").into_owned(),
        Err(_) => trimmed.to_string(),
    };
    without_decl.trim_end_matches(';').trim().to_string()
}

fn text_field(item: &Value, key: &str) -> String {
    match item.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn bool_field(item: &Value, key: &str) -> bool {
    item.get(key).and_then(Value::as_bool).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;
    use crate::config::SiteConfig;
    use url::Url;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> CinemaluxeClient {
        let site = SiteConfig {
            base_url: Url::parse(&server.uri()).expect("mock server URI parses"),
            ..SiteConfig::default()
        };
        let config = ClientConfig {
            requests_per_second: 100.0,
            timeout_secs: 5,
            max_retries: 0,
        };
        CinemaluxeClient::with_config(site, config).expect("client builds")
    }

    // -----------------------------------------------------------------------
    // decode_embedded_link
    // -----------------------------------------------------------------------

    #[test]
    fn test_decode_embedded_link() {
        let body = r#"<script>{"link":"aHR0cHM6Ly9leGFtcGxlLmNvbS92aWRlby5tcDQ="}</script>"#;
        assert_eq!(
            decode_embedded_link(body).as_deref(),
            Some("https://example.com/video.mp4")
        );
    }

    #[test]
    fn test_decode_embedded_link_unescapes_slashes() {
        // encoding of "https://example.com/video.mp4?t=1&q=ab?", whose
        // base64 itself contains slashes the page JSON-escapes
        let body = r#"{"link":"aHR0cHM6Ly9leGFtcGxlLmNvbS92aWRlby5tcDQ\/dD0xJnE9YWI\/"}"#;
        assert_eq!(
            decode_embedded_link(body).as_deref(),
            Some("https://example.com/video.mp4?t=1&q=ab?")
        );
    }

    #[test]
    fn test_decode_embedded_link_rejects_invalid_base64() {
        let body = r#"{"link":"!!not base64!!"}"#;
        assert!(decode_embedded_link(body).is_none());
    }

    #[test]
    fn test_decode_embedded_link_absent() {
        assert!(decode_embedded_link("<html><body>nothing here</body></html>").is_none());
    }

    // -----------------------------------------------------------------------
    // protector form extraction
    // -----------------------------------------------------------------------

    const PROTECTOR_PAGE: &str = r#"
    <script>
        var settings = {"soralink_ajaxurl":"https:\/\/cinemalux.zip\/wp-admin\/admin-ajax.php","soralink_z":"protector_action"};
        var item = {"token":"tok123","id":42,"time":"1700000000","post":"99","redirect":"https:\/\/cinemalux.zip\/r","cacha":"c1","new":true,"link":"https://protected.example/abc"};
    </script>
    "#;

    #[test]
    fn test_extract_protector_form() {
        let form = extract_protector_form(PROTECTOR_PAGE).expect("all markers present");
        assert_eq!(
            form.post_url,
            "https://cinemalux.zip/wp-admin/admin-ajax.php"
        );
        assert_eq!(form.action, "protector_action");

        let fields = form.fields();
        assert!(fields.contains(&("token", "tok123".to_string())));
        assert!(fields.contains(&("id", "42".to_string())));
        assert!(fields.contains(&("new", "true".to_string())));
        assert!(fields.contains(&("action", "protector_action".to_string())));
    }

    #[test]
    fn test_extract_protector_form_needs_all_markers() {
        let missing_action = r#"
            {"soralink_ajaxurl":"https://x/ajax"}
            var item = {"token":"t"};
        "#;
        assert!(extract_protector_form(missing_action).is_none());

        let missing_item = r#"
            {"soralink_ajaxurl":"https://x/ajax","soralink_z":"go"}
        "#;
        assert!(extract_protector_form(missing_item).is_none());
    }

    #[test]
    fn test_fields_default_when_missing() {
        let form = ProtectorForm {
            post_url: "https://x/ajax".to_string(),
            action: "go".to_string(),
            item: serde_json::json!({"token": "t"}),
        };

        let fields = form.fields();
        assert!(fields.contains(&("token", "t".to_string())));
        assert!(fields.contains(&("id", String::new())));
        assert!(fields.contains(&("new", "false".to_string())));
    }

    #[test]
    fn test_parse_item_object_sanitizes_statement_wrapper() {
        let wrapped = r#"var item = {"token":"t","new":false};"#;
        let value = parse_item_object(wrapped).expect("sanitizing pass recovers");
        assert_eq!(value["token"], "t");

        let clean = r#"{"token":"t"}"#;
        assert!(parse_item_object(clean).is_some());
    }

    #[test]
    fn test_parse_item_object_gives_up_on_garbage() {
        assert!(parse_item_object("var item = {broken;").is_none());
        assert!(parse_item_object("").is_none());
    }

    // -----------------------------------------------------------------------
    // resolve — end to end against a mock site
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_resolve_decodes_embedded_link() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/protected"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<script>{"link":"aHR0cHM6Ly9leGFtcGxlLmNvbS92aWRlby5tcDQ="}</script>"#,
            ))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let url = format!("{}/protected", server.uri());
        let resolved = resolve(&client, &url).await;

        assert_eq!(resolved, "https://example.com/video.mp4");
    }

    #[tokio::test]
    async fn test_resolve_submits_protector_form() {
        let server = MockServer::start().await;
        let page = format!(
            concat!(
                "<script>",
                r#"var settings = {{"soralink_ajaxurl":"{base}\/wp-admin\/admin-ajax.php","soralink_z":"protector_go"}};"#,
                r#"var item = {{"token":"tok","id":7,"time":"1700000000","post":"99","redirect":"","cacha":"","new":true,"link":"https://protected.example/abc"}};"#,
                "</script>",
            ),
            base = server.uri().replace('/', "\\/"),
        );
        Mock::given(method("GET"))
            .and(path("/protected"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/wp-admin/admin-ajax.php"))
            .and(body_string_contains("token=tok"))
            .and(body_string_contains("id=7"))
            .and(body_string_contains("new=true"))
            .and(body_string_contains("action=protector_go"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", "https://cdn.example/x.m3u8"),
            )
            .mount(&server)
            .await;

        let client = test_client(&server);
        let url = format!("{}/protected", server.uri());
        let resolved = resolve(&client, &url).await;

        assert_eq!(resolved, "https://cdn.example/x.m3u8");
    }

    #[tokio::test]
    async fn test_resolve_form_without_location_returns_input() {
        let server = MockServer::start().await;
        let page = format!(
            concat!(
                "<script>",
                r#"var settings = {{"soralink_ajaxurl":"{base}\/ajax","soralink_z":"go"}};"#,
                r#"var item = {{"token":"t","new":false,"link":"x"}};"#,
                "</script>",
            ),
            base = server.uri().replace('/', "\\/"),
        );
        Mock::given(method("GET"))
            .and(path("/protected"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/ajax"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let url = format!("{}/protected", server.uri());
        assert_eq!(resolve(&client, &url).await, url);
    }

    #[tokio::test]
    async fn test_resolve_without_markers_returns_input() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/plain"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html><body>plain page</body></html>"),
            )
            .mount(&server)
            .await;

        let client = test_client(&server);
        let url = format!("{}/plain", server.uri());
        assert_eq!(resolve(&client, &url).await, url);
    }

    #[tokio::test]
    async fn test_resolve_on_fetch_error_returns_input() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let url = format!("{}/broken", server.uri());
        assert_eq!(resolve(&client, &url).await, url);
    }

    #[tokio::test]
    async fn test_resolve_accepts_arbitrary_strings() {
        let server = MockServer::start().await;
        let client = test_client(&server);

        // unfetchable inputs still come back unchanged, never a panic
        assert_eq!(resolve(&client, "").await, "");
        assert_eq!(resolve(&client, "::::").await, "::::");
        assert_eq!(
            resolve(&client, "https://127.0.0.1:1/nothing-listens").await,
            "https://127.0.0.1:1/nothing-listens"
        );
    }
}
