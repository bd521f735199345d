use std::path::{Path, PathBuf};

/// Insert `suffix` between the file stem and its extension.
///
/// `dir/file1.txt` with `_new` becomes `dir/file1_new.txt`.
pub fn get_suffixed_fname(original: &Path, suffix: &str) -> PathBuf {
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let file_name = match original.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };

    original.with_file_name(file_name)
}

/// Hidden sibling path used while a file is rewritten in place:
/// `out/flowdir.tif` becomes `out/.flowdir.sd8-<pid>.tif`.
pub fn temp_sibling(path: &Path, tag: &str) -> PathBuf {
    let marker = format!(".{}-{}", tag, std::process::id());
    let suffixed = get_suffixed_fname(path, &marker);
    let name = match suffixed.file_name() {
        Some(name) => format!(".{}", name.to_string_lossy()),
        None => marker,
    };
    suffixed.with_file_name(name)
}
