//! URI resolution for job inputs and file-URI-typed options.
//!
//! In local mode the service reads directly from the client's filesystem,
//! so paths are resolved against a `file:` base built from the current
//! working directory. Otherwise the service only ever sees an uploaded
//! payload, so each path is carried as an opaque, unresolved URI.

use anyhow::{Context, Result};
use url::Url;

/// Build the resolution base for local mode: `file:<cwd>/`.
pub fn local_base(cwd: &std::path::Path) -> Result<Url> {
    let slashed = to_forward_slashes(&cwd.to_string_lossy());
    let with_trailing = if slashed.ends_with('/') { slashed } else { format!("{slashed}/") };
    Url::parse(&format!("file:{with_trailing}")).context("building local resolution base")
}

fn to_forward_slashes(s: &str) -> String {
    s.replace('\\', "/")
}

/// Resolve a comma-separated path list into URIs.
///
/// `base` is `Some` in local mode (resolve each path against it) and `None`
/// otherwise (wrap each path as an opaque URI). A parse failure on any
/// single path aborts the whole list.
pub fn resolve_paths(raw: &str, base: Option<&Url>) -> Result<Vec<String>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|path| resolve_one(path, base))
        .collect()
}

fn resolve_one(path: &str, base: Option<&Url>) -> Result<String> {
    let slashed = to_forward_slashes(path);
    match base {
        Some(base) => {
            let resolved = base
                .join(&slashed)
                .with_context(|| format!("resolving '{path}' against base URI"))?;
            Ok(resolved.to_string())
        }
        // No base to resolve against: carry the path verbatim as an opaque
        // reference, the server will match it against the uploaded payload.
        None => Ok(slashed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_base_has_file_scheme_and_trailing_slash() {
        let base = local_base(std::path::Path::new("/home/user/work")).unwrap();
        assert_eq!(base.as_str(), "file:///home/user/work/");
    }

    #[test]
    fn resolves_relative_path_against_local_base() {
        let base = local_base(std::path::Path::new("/home/user/work")).unwrap();
        let resolved = resolve_paths("input.xml", Some(&base)).unwrap();
        assert_eq!(resolved, vec!["file:///home/user/work/input.xml".to_string()]);
    }

    #[test]
    fn resolves_comma_separated_list() {
        let base = local_base(std::path::Path::new("/home/user/work")).unwrap();
        let resolved = resolve_paths("a.xml, b.xml", Some(&base)).unwrap();
        assert_eq!(resolved.len(), 2);
        assert!(resolved[0].ends_with("a.xml"));
        assert!(resolved[1].ends_with("b.xml"));
    }

    #[test]
    fn non_local_mode_wraps_opaque_without_resolution() {
        let resolved = resolve_paths("some/relative/path.xml", None).unwrap();
        assert_eq!(resolved, vec!["some/relative/path.xml".to_string()]);
    }

    #[test]
    fn windows_separators_are_normalized() {
        let resolved = resolve_paths(r"some\relative\path.xml", None).unwrap();
        assert_eq!(resolved, vec!["some/relative/path.xml".to_string()]);
    }
}
