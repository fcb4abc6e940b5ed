use serde::Serialize;

use super::Explorer;

/// The file being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileView<'a> {
    pub path: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab<'a> {
    pub path: &'a str,
    pub content: &'a str,
    pub is_current: bool,
}

impl Explorer {
    pub fn current_file(&self) -> Option<FileView<'_>> {
        self.items.iter().find_map(|(path, item)| match (&item.content, item.is_current) {
            (Some(content), true) => Some(FileView { path, content }),
            _ => None,
        })
    }

    /// Focus `new_path`, opening a tab for it. Missing paths and folders are ignored.
    pub fn change_current_file(&mut self, new_path: &str) {
        let is_file = self.items.get(new_path).map_or(false, |item| item.is_file());
        if !is_file {
            tracing::debug!("Cannot focus {}, no such file", new_path);
            return;
        }
        for (path, item) in self.items.iter_mut() {
            if path == new_path {
                item.is_current = true;
                item.is_open_in_tabs = true;
            } else {
                item.is_current = false;
            }
        }
    }

    /// Open tabs in map order.
    pub fn tabs(&self) -> Vec<Tab<'_>> {
        self.items
            .iter()
            .filter(|(_, item)| item.is_open_in_tabs)
            .filter_map(|(path, item)| {
                item.content.as_deref().map(|content| Tab {
                    path,
                    content,
                    is_current: item.is_current,
                })
            })
            .collect()
    }

    pub fn change_current_file_to_last_tab(&mut self) {
        let last = self
            .items
            .iter()
            .rev()
            .find(|(_, item)| item.is_open_in_tabs && item.is_file())
            .map(|(path, _)| path.clone());
        match last {
            Some(path) => self.change_current_file(&path),
            None => {
                for item in self.items.values_mut() {
                    item.is_current = false;
                }
            }
        }
    }

    /// Close the tab for `path`. Focus always moves to whichever tab is now last.
    pub fn remove_from_tabs(&mut self, path: &str) {
        if let Some(item) = self.items.get_mut(path) {
            item.is_open_in_tabs = false;
            item.is_current = false;
        }
        self.change_current_file_to_last_tab();
    }
}
