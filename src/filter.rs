//! Eligibility rules for class files and jars.
//!
//! A class is eligible for rewriting when it is a compiled `.class` file that
//! is not one of the identifier classes the Android build generates (`R`,
//! `R2`, their inner classes, and `BuildConfig`). Matching is literal.

use std::path::Path;

const CLASS_SUFFIX: &str = ".class";
const JAR_SUFFIX: &str = ".jar";

/// Jar produced by the resource compiler; it only holds generated `R` classes.
const GENERATED_RESOURCES_JAR: &str = "R.jar";

fn is_generated_class(name: &str) -> bool {
    name.contains("R$")
        || name.contains("R2$")
        || name.contains("R.class")
        || name.contains("R2.class")
        || name == "BuildConfig.class"
}

pub fn is_eligible_class(name: &str) -> bool {
    name.ends_with(CLASS_SUFFIX) && !is_generated_class(name)
}

/// Same as [`is_eligible_class`] on the file name, but only for regular files.
pub fn is_eligible_class_file(path: &Path) -> bool {
    path.is_file()
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_eligible_class)
}

/// A jar is worth opening when it is a non-empty `.jar` file other than the
/// generated resources jar. Anything else is copied as-is.
pub fn is_rewritable_jar(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let non_empty = path.metadata().map(|m| m.is_file() && m.len() > 0).unwrap_or(false);
    non_empty && name != GENERATED_RESOURCES_JAR && name.ends_with(JAR_SUFFIX)
}
