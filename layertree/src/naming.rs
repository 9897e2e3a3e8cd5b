//! Unique names for top-level source folders.

use std::collections::HashSet;

use crate::host::Host;

/// Assigns display titles to top-level folders for one load session.
///
/// Missing titles become `folder_1`, `folder_2`, ... and repeated titles get a
/// `_(duplicate #N)` suffix with N starting at 2. The first use of a title is
/// always kept as-is.
///
/// Titles are compared the way the tree displays them, with `_` read as a
/// space, so `a_b` and `a b` collide. Every returned name is remembered,
/// including synthesized ones.
#[derive(Debug)]
pub struct FolderNamer {
    used: HashSet<String>,
    assigned_counter: u32,
    duplicate_counter: u32,
}

impl Default for FolderNamer {
    fn default() -> Self {
        Self::new()
    }
}

impl FolderNamer {
    pub fn new() -> Self {
        Self {
            used: HashSet::new(),
            assigned_counter: 0,
            duplicate_counter: 1,
        }
    }

    /// Returns a title whose display text no earlier call in this session
    /// has returned.
    ///
    /// Collisions are reported to the host and are not fatal.
    pub fn unique_title(&mut self, title: Option<&str>, host: &dyn Host) -> String {
        let name = match title {
            None => loop {
                self.assigned_counter += 1;
                let candidate = format!("folder_{}", self.assigned_counter);
                if !self.is_used(&candidate) {
                    break candidate;
                }
            },
            Some(title) if self.is_used(title) => {
                host.error(
                    "",
                    "Cannot have multiple top-level folders with the same name. Appending duplicate notice.",
                );
                loop {
                    self.duplicate_counter += 1;
                    let candidate = format!("{}_(duplicate #{})", title, self.duplicate_counter);
                    if !self.is_used(&candidate) {
                        break candidate;
                    }
                }
            }
            Some(title) => title.to_string(),
        };
        self.used.insert(display_key(&name));
        name
    }

    fn is_used(&self, name: &str) -> bool {
        self.used.contains(&display_key(name))
    }
}

/// Text the tree shows for a folder name.
fn display_key(name: &str) -> String {
    name.replace('_', " ")
}
