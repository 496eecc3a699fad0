use tracing_subscriber::{fmt, EnvFilter};

/// Load dotenv and initialize structured tracing based on RUST_LOG.
///
/// Env file lookup order:
/// - explicit paths via ENV_FILE, ENVFILE, DOTENV_PATH
/// - `.envfile` in the working directory
/// - `.env` discovery (working directory and parents)
/// - `.env` next to the executable or any of its parent directories
///
/// Returns a description of where the environment was loaded from.
pub fn init_tracing() -> String {
    let env_source = load_env_file();

    // Initialize tracing (respects RUST_LOG potentially provided by the env file)
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=info".into());
    let subscriber = fmt().with_env_filter(EnvFilter::new(filter)).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    tracing::info!("Environment loaded from: {}", env_source);
    env_source
}

fn load_env_file() -> String {
    for key in ["ENV_FILE", "ENVFILE", "DOTENV_PATH"] {
        if let Ok(p) = std::env::var(key) {
            let p = p.trim();
            if !p.is_empty()
                && std::path::Path::new(p).is_file()
                && dotenvy::from_filename(p).is_ok()
            {
                return format!("{p} ({key})");
            }
        }
    }

    if std::path::Path::new(".envfile").is_file() && dotenvy::from_filename(".envfile").is_ok() {
        return ".envfile".into();
    }

    if let Ok(path) = dotenvy::dotenv() {
        return path.display().to_string();
    }

    if let Ok(exe) = std::env::current_exe() {
        let mut dir_opt = exe.parent();
        while let Some(dir) = dir_opt {
            let candidate = dir.join(".env");
            if candidate.is_file() && dotenvy::from_filename(&candidate).is_ok() {
                return candidate.display().to_string();
            }
            dir_opt = dir.parent();
        }
    }

    "none".into()
}

/// Get the bind address for the HTTP server from env or default to 0.0.0.0:8088.
pub fn env_bind_addr() -> String {
    std::env::var("BIND_ADDR")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "0.0.0.0:8088".into())
}

fn truthy(v: &str) -> bool {
    let v = v.trim().to_ascii_lowercase();
    v == "1" || v == "true" || v == "yes" || v == "on"
}

/// Build an HTTP client honoring proxy and timeout environment variables.
///
/// Environment:
/// - CHAT2MEDIA_NO_PROXY = 1|true|yes|on  -> disable all proxies
/// - CHAT2MEDIA_PROXY_URL = <url>         -> proxy for all schemes
/// - HTTP_PROXY / http_proxy              -> HTTP proxy
/// - HTTPS_PROXY / https_proxy            -> HTTPS proxy
/// - CHAT2MEDIA_HTTP_TIMEOUT_SECONDS      -> per-request timeout (u64); unset means none
pub fn build_http_client_from_env() -> reqwest::Client {
    let mut builder = reqwest::Client::builder();

    if let Ok(secs) = std::env::var("CHAT2MEDIA_HTTP_TIMEOUT_SECONDS") {
        if let Ok(n) = secs.trim().parse::<u64>() {
            builder = builder.timeout(std::time::Duration::from_secs(n));
        }
    }

    let no_proxy = std::env::var("CHAT2MEDIA_NO_PROXY")
        .map(|v| truthy(&v))
        .unwrap_or(false);

    if no_proxy {
        builder = builder.no_proxy();
    } else {
        if let Ok(url) = std::env::var("CHAT2MEDIA_PROXY_URL") {
            let u = url.trim();
            if !u.is_empty() {
                if let Ok(p) = reqwest::Proxy::all(u) {
                    builder = builder.proxy(p);
                }
            }
        }
        if let Ok(http_p) = std::env::var("HTTP_PROXY").or_else(|_| std::env::var("http_proxy")) {
            let u = http_p.trim();
            if !u.is_empty() {
                if let Ok(p) = reqwest::Proxy::http(u) {
                    builder = builder.proxy(p);
                }
            }
        }
        if let Ok(https_p) = std::env::var("HTTPS_PROXY").or_else(|_| std::env::var("https_proxy"))
        {
            let u = https_p.trim();
            if !u.is_empty() {
                if let Ok(p) = reqwest::Proxy::https(u) {
                    builder = builder.proxy(p);
                }
            }
        }
    }

    builder = builder.user_agent(format!("chat2media/{}", env!("CARGO_PKG_VERSION")));

    builder.build().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "falling back to default HTTP client");
        reqwest::Client::new()
    })
}

/// Build a CORS layer from environment variables.
///
/// Environment variables:
/// - CORS_ALLOWED_ORIGINS: "*" or comma-separated origins (e.g., "https://a.com, https://b.com")
/// - CORS_ALLOWED_METHODS: "*" or comma-separated methods (e.g., "GET,POST,OPTIONS")
/// - CORS_ALLOWED_HEADERS: "*" or comma-separated request header names
/// - CORS_ALLOW_CREDENTIALS: enable with 1,true,yes,on
/// - CORS_MAX_AGE: max age in seconds (u64)
///
/// Defaults are permissive (Any).
pub fn cors_layer_from_env() -> tower_http::cors::CorsLayer {
    use std::time::Duration;
    use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};

    let mut layer = CorsLayer::new();

    let origins = csv_env("CORS_ALLOWED_ORIGINS", |p| http::HeaderValue::from_str(p).ok());
    layer = match origins {
        Some(vals) => layer.allow_origin(AllowOrigin::list(vals)),
        None => layer.allow_origin(Any),
    };

    let methods = csv_env("CORS_ALLOWED_METHODS", |p| {
        http::Method::from_bytes(p.to_ascii_uppercase().as_bytes()).ok()
    });
    layer = match methods {
        Some(vals) => layer.allow_methods(AllowMethods::list(vals)),
        None => layer.allow_methods(Any),
    };

    let headers = csv_env("CORS_ALLOWED_HEADERS", |p| {
        http::header::HeaderName::try_from(p).ok()
    });
    layer = match headers {
        Some(vals) => layer.allow_headers(AllowHeaders::list(vals)),
        None => layer.allow_headers(Any),
    };

    if std::env::var("CORS_ALLOW_CREDENTIALS")
        .map(|v| truthy(&v))
        .unwrap_or(false)
    {
        layer = layer.allow_credentials(true);
    }

    if let Ok(secs) = std::env::var("CORS_MAX_AGE") {
        if let Ok(n) = secs.trim().parse::<u64>() {
            layer = layer.max_age(Duration::from_secs(n));
        }
    }

    layer
}

/// Parse a comma-separated env var. `None` means "any": unset, `*`, or nothing parsable.
fn csv_env<T>(key: &str, parse: impl Fn(&str) -> Option<T>) -> Option<Vec<T>> {
    let raw = std::env::var(key).ok()?;
    let s = raw.trim();
    if s == "*" {
        return None;
    }
    let vals: Vec<T> = s
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .filter_map(parse)
        .collect();
    if vals.is_empty() {
        None
    } else {
        Some(vals)
    }
}
