//! Server configuration and the virtual file system tree.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::{HfsError, Result};
use crate::session::Session;

/// Key selection for [`Session::get_config`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFilter {
    /// Return only these keys.
    pub only: Vec<String>,
    /// Return everything except these keys.
    pub omit: Vec<String>,
}

impl ConfigFilter {
    pub fn only<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            only: keys.into_iter().map(Into::into).collect(),
            omit: Vec::new(),
        }
    }

    pub fn omit<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            only: Vec::new(),
            omit: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Repeated `only=`/`omit=` pairs.
    fn to_query(&self) -> Vec<(String, String)> {
        self.only
            .iter()
            .map(|k| ("only".to_string(), k.clone()))
            .chain(self.omit.iter().map(|k| ("omit".to_string(), k.clone())))
            .collect()
    }
}

/// Who a VFS permission applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Who {
    /// Everyone or no one.
    Flag(bool),
    /// Listed accounts and groups.
    Accounts(Vec<String>),
    /// A keyword such as `*` (any account) or `can_see`.
    Keyword(String),
    Other(Value),
}

/// A node of the virtual file system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VfsNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Disk path the node maps to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<VfsNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_see: Option<Who>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_read: Option<Who>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_list: Option<Who>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_upload: Option<Who>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_delete: Option<Who>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_archive: Option<Who>,
    /// Remaining node properties, kept as sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VfsNode {
    /// Name shown for the node: its own name, else the last component of
    /// its source.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or_else(|| {
            self.source
                .as_deref()
                .map(|s| s.trim_end_matches(['/', '\\']))
                .and_then(|s| s.rsplit(['/', '\\']).next())
                .filter(|s| !s.is_empty())
        })
    }

    /// Descendant at `path` (`a/b`), matched by display name.
    pub fn find(&self, path: &str) -> Option<&VfsNode> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(self, |node, segment| {
                node.children
                    .iter()
                    .find(|child| child.display_name() == Some(segment))
            })
    }

    /// Build the root from the `vfs` config value. A bare array is taken as
    /// the root's children; a missing value is an empty root.
    fn from_config_value(value: Option<Value>) -> Result<Self> {
        match value {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(Value::Array(children)) => Ok(Self {
                children: serde_json::from_value(Value::Array(children))?,
                ..Default::default()
            }),
            Some(value @ Value::Object(_)) => Ok(serde_json::from_value(value)?),
            Some(other) => Err(HfsError::Protocol(format!(
                "Unexpected vfs value: {}",
                other
            ))),
        }
    }
}

impl Session {
    /// Read server configuration.
    pub async fn get_config(&self, filter: &ConfigFilter) -> Result<Map<String, Value>> {
        self.api_get("get_config", filter.to_query()).await
    }

    /// Write configuration keys. The server merges them into its config.
    pub async fn set_config(&self, values: Map<String, Value>) -> Result<()> {
        let keys: Vec<&String> = values.keys().collect();
        debug!(?keys, "set_config");
        self.api_post("set_config", json!({ "values": values }))
            .await?;
        Ok(())
    }

    /// The virtual file system tree with its permission settings.
    pub async fn get_vfs(&self) -> Result<VfsNode> {
        let mut config = self.get_config(&ConfigFilter::only(["vfs"])).await?;
        VfsNode::from_config_value(config.remove("vfs"))
    }
}
