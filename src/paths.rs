//
//  paths.rs
//  Archlint
//
//  Created by hak (tharun)
//

use std::path::{Component, Path};

/// Normalize separators to forward slashes.
pub fn to_posix(value: &str) -> String {
    value.replace('\\', "/")
}

/// Express `target` relative to `root`, forward-slash separated.
/// Targets outside `root` come back with leading `..` segments.
pub fn relative_to(root: &Path, target: &Path) -> String {
    if let Ok(stripped) = target.strip_prefix(root) {
        return components_to_string(stripped);
    }

    let root_parts: Vec<Component<'_>> = root.components().collect();
    let target_parts: Vec<Component<'_>> = target.components().collect();

    let mut shared = 0;
    while shared < root_parts.len()
        && shared < target_parts.len()
        && root_parts[shared] == target_parts[shared]
    {
        shared += 1;
    }

    let mut parts: Vec<String> = Vec::new();
    for _ in shared..root_parts.len() {
        parts.push("..".to_string());
    }
    for component in &target_parts[shared..] {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }
    parts.join("/")
}

fn components_to_string(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
