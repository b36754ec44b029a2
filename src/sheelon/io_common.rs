use std::path::Path;

/// The path of a file next to `path`, with `prefix` added to the file name.
///
/// `data/metadata.yml` with the prefix `meta-` gives `data/meta-metadata.yml`.
pub fn prefixed_path(path: &str, prefix: &str) -> String {
    let p = Path::new(path);
    let file_name = p
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    p.with_file_name(format!("{}{}", prefix, file_name))
        .display()
        .to_string()
}
