use indexmap::IndexSet;
use serde::Serialize;

use super::Explorer;
use crate::paths;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FolderContents {
    pub folders: IndexSet<String>,
    pub files: IndexSet<String>,
}

impl FolderContents {
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.files.is_empty()
    }
}

impl Explorer {
    /// Names of the items directly inside `path`. A child counts as a folder when
    /// some key continues past its segment, so implicit folders are listed too.
    pub fn folder_contents(&self, path: &str) -> FolderContents {
        let folder = paths::as_folder(path);
        let mut contents = FolderContents::default();
        for key in self.items.keys() {
            let rest = match key.strip_prefix(folder.as_ref()) {
                Some(rest) if !rest.is_empty() => rest,
                _ => continue,
            };
            match rest.split_once(paths::SEPARATOR) {
                Some((name, _)) => {
                    contents.folders.insert(name.to_string());
                }
                None => {
                    contents.files.insert(rest.to_string());
                }
            }
        }
        contents
    }

    /// Every file with content, in map order, for the build step.
    pub fn build_artifacts(&self) -> Vec<(&str, &str)> {
        self.items
            .iter()
            .filter_map(|(path, item)| match item.content.as_deref() {
                Some(content) if !content.is_empty() => Some((path.as_str(), content)),
                _ => None,
            })
            .collect()
    }
}
