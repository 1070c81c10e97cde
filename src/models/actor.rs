use serde::{Deserialize, Serialize};

/// Requesting principal, supplied by the authorization layer.
///
/// Searches without an actor are anonymous and only see released records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Sees every record regardless of status or container grants
    #[serde(default)]
    pub sysadmin: bool,
    /// Containers the actor may read, including unreleased content
    #[serde(default)]
    pub readable_containers: Vec<String>,
}

impl Actor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            sysadmin: true,
            ..Self::new(id)
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_readable_containers<I, S>(mut self, containers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.readable_containers
            .extend(containers.into_iter().map(Into::into));
        self
    }

    pub fn can_read_container(&self, container_id: &str) -> bool {
        self.sysadmin || self.readable_containers.iter().any(|c| c == container_id)
    }
}
