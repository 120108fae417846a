use std::ffi::OsString;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Reduce a name received from the outside (header, URL, archive) to a
/// single path component. Returns `None` when nothing usable is left.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let name = name.trim().trim_matches('"').replace('\\', "/");
    match Path::new(&name).components().next_back()? {
        Component::Normal(last) => {
            let last = last.to_string_lossy().trim().to_string();
            (!last.is_empty()).then_some(last)
        }
        _ => None,
    }
}

/// Find a path that does not exist yet, starting with `original` and then
/// trying `name_1.ext`, `name_2.ext`, ... in order.
pub fn unique_file_path(original: &Path) -> io::Result<PathBuf> {
    let dir = original.parent().unwrap_or_else(|| Path::new(""));
    let stem = original.file_stem().map(OsString::from).unwrap_or_default();
    let extension = original.extension();

    let mut path = original.to_path_buf();
    let mut count = 1u64;
    loop {
        match path.symlink_metadata() {
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(path),
            Err(e) => return Err(e),
            Ok(_) => {}
        }

        let mut name = stem.clone();
        name.push(format!("_{count}"));
        if let Some(ext) = extension {
            name.push(".");
            name.push(ext);
        }
        path = dir.join(name);
        count += 1;
    }
}
