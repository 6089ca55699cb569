// Saved launch configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub executable_path: String,
    #[serde(default)]
    pub arguments: Option<String>,
    pub interface_id: String,
}

impl Profile {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        executable_path: impl Into<String>,
        interface_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            executable_path: executable_path.into(),
            arguments: None,
            interface_id: interface_id.into(),
        }
    }

    pub fn with_arguments(mut self, arguments: impl Into<String>) -> Self {
        self.arguments = Some(arguments.into());
        self
    }
}
