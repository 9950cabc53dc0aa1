//! Cross-origin access for the browser frontend.

use axum::http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Origin allowed when nothing else is configured (the frontend dev server).
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

/// Picks the allowed origins.
///
/// An explicit comma-separated list wins, then the `CORS_ORIGINS` variable
/// (also comma-separated), then `FRONTEND_ORIGIN` or `FRONTEND_URL`, then
/// [`DEFAULT_CORS_ORIGIN`]. `env` looks up a variable by name.
pub fn resolve_cors_origins(
    explicit: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Vec<String> {
    let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    if let Some(list) = explicit.map(str::to_string).or_else(|| non_empty(env("CORS_ORIGINS"))) {
        return split_origins(&list);
    }

    match non_empty(env("FRONTEND_ORIGIN")).or_else(|| non_empty(env("FRONTEND_URL"))) {
        Some(origin) => vec![origin.trim().to_string()],
        None => vec![DEFAULT_CORS_ORIGIN.to_string()],
    }
}

fn split_origins(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

/// Builds a layer admitting `origins` with credentials, any method and any
/// request header. Origins that are not valid header values are skipped.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("Ignoring invalid CORS origin {origin:?}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_to_frontend_dev_server() {
        assert_eq!(resolve_cors_origins(None, env(&[])), vec![DEFAULT_CORS_ORIGIN]);
    }

    #[test]
    fn cors_origins_variable_is_split() {
        let origins = resolve_cors_origins(
            None,
            env(&[
                ("CORS_ORIGINS", " https://a.example , https://b.example,,"),
                ("FRONTEND_ORIGIN", "https://ignored.example"),
            ]),
        );
        assert_eq!(origins, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn frontend_origin_then_url() {
        assert_eq!(
            resolve_cors_origins(
                None,
                env(&[
                    ("FRONTEND_ORIGIN", "https://app.example"),
                    ("FRONTEND_URL", "https://url.example"),
                ])
            ),
            vec!["https://app.example"]
        );
        assert_eq!(
            resolve_cors_origins(None, env(&[("FRONTEND_URL", "https://url.example")])),
            vec!["https://url.example"]
        );
    }

    #[test]
    fn explicit_list_wins() {
        let origins = resolve_cors_origins(
            Some("http://127.0.0.1:3000"),
            env(&[("CORS_ORIGINS", "https://a.example")]),
        );
        assert_eq!(origins, vec!["http://127.0.0.1:3000"]);
    }
}
