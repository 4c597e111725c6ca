//! Deployment profile flags.

/// Env var naming the deployment environment (`production` turns on secure cookies).
pub const ENV_DEPLOYMENT: &str = "FLASHME_ENV";

/// Env var forcing the `Secure` cookie attribute on or off regardless of environment.
pub const ENV_SECURE_COOKIES: &str = "FLASHME_SECURE_COOKIES";

/// Parse a human-friendly boolean env flag value.
///
/// Accepted truthy values:
/// - `1`
/// - `true`
/// - `yes`
/// - `on`
pub fn parse_bool_flag(raw: Option<&str>, default: bool) -> bool {
    raw.map(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
    .unwrap_or(default)
}

/// Whether session cookies should carry `Secure`.
///
/// An explicit [`ENV_SECURE_COOKIES`] value wins; otherwise production deployments are secure.
pub fn secure_cookies(deployment: Option<&str>, secure_flag: Option<&str>) -> bool {
    let production = deployment
        .map(|d| d.trim().eq_ignore_ascii_case("production"))
        .unwrap_or(false);
    parse_bool_flag(secure_flag.filter(|s| !s.trim().is_empty()), production)
}
