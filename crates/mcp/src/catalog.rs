// Tool documentation catalogs. The demo's whole point lives here: two
// catalogs describe the exact same four operations, one carefully and
// one badly. A catalog is pure data attached to the tools at
// construction; nothing at runtime branches on which one was chosen.

use std::str::FromStr;

/// Documentation for one action: its advertised name, its description,
/// and a description per parameter (keyed by the canonical parameter
/// name).
#[derive(Debug, Clone)]
pub struct ActionDocs {
    pub name: &'static str,
    pub description: &'static str,
    params: &'static [(&'static str, &'static str)],
}

impl ActionDocs {
    /// Documentation text for a parameter, empty if the catalog has none.
    pub fn param(&self, key: &str) -> &'static str {
        self.params
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, doc)| *doc)
            .unwrap_or("")
    }
}

/// Documentation for the full action surface.
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    pub create: ActionDocs,
    pub list: ActionDocs,
    pub update: ActionDocs,
    pub delete: ActionDocs,
}

impl ToolCatalog {
    /// Carefully documented catalog: descriptive names, a purpose line
    /// per tool, and a description for every parameter.
    pub fn descriptive() -> Self {
        Self {
            create: ActionDocs {
                name: "create_todo",
                description: "Add a new task to the todo list with specified details.",
                params: &[
                    ("title", "Brief description of the task to be done"),
                    ("description", "Additional details or context about the task"),
                    ("priority", "Task importance: 'low', 'medium', or 'high'"),
                ],
            },
            list: ActionDocs {
                name: "list_todos",
                description: "Retrieve todos filtered by completion status.",
                params: &[("status", "Filter tasks by: 'all', 'completed', or 'pending'")],
            },
            update: ActionDocs {
                name: "update_todo",
                description: "Modify an existing todo's properties or mark it complete.",
                params: &[
                    ("id", "The ID number of the task to modify"),
                    ("title", "New title for the task"),
                    ("description", "New description or details"),
                    ("priority", "New priority: 'low', 'medium', or 'high'"),
                    ("completed", "Mark as done (true) or not done (false)"),
                ],
            },
            delete: ActionDocs {
                name: "delete_todo",
                description: "Remove a task from the list permanently.",
                params: &[("id", "The ID number of the task to remove")],
            },
        }
    }

    /// Deliberately bad catalog: abbreviated names, one-word
    /// descriptions, no parameter documentation at all. Schemas and
    /// behavior are identical to the descriptive catalog; only the
    /// text an assistant can learn from is degraded.
    pub fn terse() -> Self {
        Self {
            create: ActionDocs {
                name: "create",
                description: "Create.",
                params: &[],
            },
            list: ActionDocs {
                name: "list",
                description: "List.",
                params: &[],
            },
            update: ActionDocs {
                name: "update",
                description: "Update.",
                params: &[],
            },
            delete: ActionDocs {
                name: "delete",
                description: "Delete.",
                params: &[],
            },
        }
    }

    /// The four actions in their fixed semantic order.
    pub fn actions(&self) -> [&ActionDocs; 4] {
        [&self.create, &self.list, &self.update, &self.delete]
    }
}

/// Which catalog a server instance advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocsProfile {
    #[default]
    Descriptive,
    Terse,
}

impl DocsProfile {
    pub fn catalog(&self) -> ToolCatalog {
        match self {
            DocsProfile::Descriptive => ToolCatalog::descriptive(),
            DocsProfile::Terse => ToolCatalog::terse(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocsProfile::Descriptive => "descriptive",
            DocsProfile::Terse => "terse",
        }
    }
}

impl std::fmt::Display for DocsProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocsProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "descriptive" => Ok(DocsProfile::Descriptive),
            "terse" => Ok(DocsProfile::Terse),
            other => Err(format!(
                "invalid docs profile '{}', expected 'descriptive' or 'terse'",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_lookup() {
        let catalog = ToolCatalog::descriptive();
        assert_eq!(
            catalog.create.param("title"),
            "Brief description of the task to be done"
        );
        assert_eq!(catalog.create.param("nonexistent"), "");

        // The terse catalog documents nothing.
        let catalog = ToolCatalog::terse();
        assert_eq!(catalog.create.param("title"), "");
    }

    #[test]
    fn test_profile_parsing() {
        assert_eq!("terse".parse::<DocsProfile>().unwrap(), DocsProfile::Terse);
        assert_eq!(
            "descriptive".parse::<DocsProfile>().unwrap(),
            DocsProfile::Descriptive
        );
        assert!("good".parse::<DocsProfile>().is_err());
    }
}
