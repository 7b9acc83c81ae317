//! Filesystem-style path resolution for synthesized context paths.
//!
//! Context paths are built by resolving a registration key against the
//! configured base path, the way `path.resolve` works on POSIX systems:
//!
//! - an absolute key replaces the base entirely
//! - `.` and empty segments are dropped
//! - `..` removes the previous segment but never climbs above `/`
//! - the result never carries a trailing slash, except for `/` itself
//!
//! A relative base is anchored at `/`; there is no working directory on the
//! HTTP side to resolve it against.

/// Resolve `segment` against `base`, producing a normalized absolute path.
pub fn resolve(base: &str, segment: &str) -> String {
    let joined = if segment.starts_with('/') {
        segment.to_string()
    } else {
        format!("{}/{}", base, segment)
    };

    normalize(&joined)
}

/// Normalize a path into absolute form with `.`/`..` collapsed.
pub fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    format!("/{}", segments.join("/"))
}
