//! core::paths
//!
//! Canonicalization of file-store paths into repository paths.
//!
//! # Canonical form
//!
//! The remote service addresses items by a repository-relative path:
//! forward slashes, leading `/`, no physical-root prefix, no `~`
//! virtual-root marker. [`canonicalize`] produces that form from whatever
//! the underlying store reports as a file's full path.
//!
//! Canonicalization is infallible: if the physical root cannot be
//! stripped (the store handed back a path outside it), the path passes
//! through otherwise-normalized. The existence probe downstream will miss
//! and the mirroring attempt gets logged; the save itself is unaffected.
//!
//! # Example
//!
//! ```
//! use gitmirror::core::paths::canonicalize;
//!
//! let canonical = canonicalize(
//!     r"C:\Fancy\Root\Some.Web\App_Data\UmbracoForms\Data\Forms\b79a.json",
//!     r"C:\Fancy\Root\Some.Web",
//! );
//! assert_eq!(canonical, "/App_Data/UmbracoForms/Data/Forms/b79a.json");
//! ```

/// Convert a full path from the underlying store into the canonical
/// repository-relative path.
///
/// Steps, in order: normalize separators to `/` (both in the path and in
/// the root before comparing), strip the physical root prefix, strip a
/// leading `~` virtual-root marker, ensure a leading `/`.
pub fn canonicalize(full_path: &str, physical_root: &str) -> String {
    let path = full_path.replace('\\', "/");
    let root = physical_root.replace('\\', "/");

    let stripped = match path.strip_prefix(&root) {
        Some(rest) if !root.is_empty() => rest,
        _ => path.as_str(),
    };

    let stripped = stripped.trim_start_matches('~');

    if stripped.starts_with('/') {
        stripped.to_string()
    } else {
        format!("/{stripped}")
    }
}

/// Name of the directory immediately containing the file at
/// `canonical_path`, if any.
///
/// Used by the rich commit-message policy to label the entity type
/// (`/Forms/x.json` lives under `Forms`).
pub fn parent_directory_name(canonical_path: &str) -> Option<&str> {
    let (dir, _file) = canonical_path.rsplit_once('/')?;
    match dir.rsplit_once('/') {
        Some((_, name)) if !name.is_empty() => Some(name),
        _ if !dir.is_empty() && !dir.contains('/') => Some(dir),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_windows_physical_root() {
        let canonical = canonicalize(
            r"C:\Fancy\Root\Some.Web\App_Data\UmbracoForms\Data\Forms\b79a3cc8.json",
            r"C:\Fancy\Root\Some.Web",
        );
        assert_eq!(
            canonical,
            "/App_Data/UmbracoForms/Data/Forms/b79a3cc8.json"
        );
    }

    #[test]
    fn strips_unix_physical_root() {
        let canonical = canonicalize("/srv/app/media/images/logo.png", "/srv/app");
        assert_eq!(canonical, "/media/images/logo.png");
    }

    #[test]
    fn strips_virtual_root_marker() {
        let canonical = canonicalize("~/App_Data/Forms/a.json", "/srv/app");
        assert_eq!(canonical, "/App_Data/Forms/a.json");
    }

    #[test]
    fn unknown_root_passes_through_normalized() {
        let canonical = canonicalize(r"D:\Other\place\file.json", r"C:\Fancy\Root");
        assert_eq!(canonical, "/D:/Other/place/file.json");
    }

    #[test]
    fn empty_root_is_a_no_op_strip() {
        let canonical = canonicalize("/App_Data/file.json", "");
        assert_eq!(canonical, "/App_Data/file.json");
    }

    #[test]
    fn parent_directory_of_nested_path() {
        assert_eq!(
            parent_directory_name("/App_Data/UmbracoForms/Data/Forms/b79a.json"),
            Some("Forms")
        );
        assert_eq!(
            parent_directory_name("/App_Data/UmbracoForms/Data/Workflows/x.json"),
            Some("Workflows")
        );
    }

    #[test]
    fn parent_directory_of_shallow_paths() {
        assert_eq!(parent_directory_name("/file.json"), None);
        assert_eq!(parent_directory_name("file.json"), None);
        assert_eq!(parent_directory_name("Forms/file.json"), Some("Forms"));
    }
}
