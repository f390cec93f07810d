//! Login redirects and return targets.

/// Login surface of the console.
pub const LOGIN_PATH: &str = "/login";

/// Where authenticated users land when they may not view the requested page.
pub const DEFAULT_LANDING_PATH: &str = "/dashboard";

/// Query parameter carrying the return target on the login surface.
pub const NEXT_PARAM: &str = "next";

/// `/login?next=<target>` with `target` percent-encoded once.
pub fn login_redirect(target: &str) -> String {
    format!("{LOGIN_PATH}?{NEXT_PARAM}={}", urlencoding::encode(target))
}

/// Whether `location` (path with optional query) is on the login surface.
pub fn is_login_surface(location: &str) -> bool {
    path_of(location).starts_with(LOGIN_PATH)
}

/// Path part of a location, without query or fragment.
pub fn path_of(location: &str) -> &str {
    location
        .split(['?', '#'])
        .next()
        .unwrap_or(location)
}

/// The decoded `next` parameter of `location`, when it is a same-origin path.
///
/// Anything that could leave the console (`//host`, `https://…`, a value not
/// starting with `/`) is ignored.
pub fn return_target(location: &str) -> Option<String> {
    let query = location.split_once('?')?.1;
    let query = query.split('#').next().unwrap_or(query);

    let raw = query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        (key == NEXT_PARAM).then_some(value)
    })?;

    let decoded = urlencoding::decode(&raw.replace('+', " ")).ok()?.into_owned();
    let safe = decoded.starts_with('/') && !decoded.starts_with("//") && !decoded.contains('\\');
    safe.then_some(decoded)
}
