/// Remote staging directory for a packaged model version.
///
/// The version string is used verbatim; trimming of the trailing newline
/// happens where the version file is read.
pub fn staging_path(base_path: &str, version: &str) -> String {
    format!("{base_path}/staging/{version}")
}

/// Production directory for a version, relative to the remote base path.
/// The deploy command `cd`s into the base path first.
pub fn prod_relative(version: &str) -> String {
    format!("./prod/{version}")
}
