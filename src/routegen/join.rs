// src/routegen/join.rs

/// Join an endpoint base path and a handler sub path.
///
/// An empty or `"/"` sub path maps to the base path itself. Otherwise
/// exactly one `/` ends up between the two parts: a doubled slash is
/// collapsed and a missing one inserted.
///
/// ```
/// use hotserve::routegen::join_paths;
///
/// assert_eq!(join_paths("/api/", "hello"), "/api/hello");
/// assert_eq!(join_paths("/api", "/hello"), "/api/hello");
/// assert_eq!(join_paths("/api", ""), "/api");
/// ```
pub fn join_paths(base: &str, sub: &str) -> String {
    if sub.is_empty() || sub == "/" {
        return base.to_string();
    }
    match (base.ends_with('/'), sub.starts_with('/')) {
        (true, true) => format!("{base}{}", &sub[1..]),
        (false, false) => format!("{base}/{sub}"),
        _ => format!("{base}{sub}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_base() {
        assert_eq!(join_paths("/", "hello"), "/hello");
        assert_eq!(join_paths("/", "/hello"), "/hello");
        assert_eq!(join_paths("/", ""), "/");
        assert_eq!(join_paths("/", "/"), "/");
    }

    #[test]
    fn only_the_boundary_is_touched() {
        assert_eq!(join_paths("/a/", "/b/"), "/a/b/");
        assert_eq!(join_paths("/a", "b//c"), "/a/b//c");
    }
}
