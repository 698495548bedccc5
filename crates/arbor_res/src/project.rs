//! Projects - one namespace, one nexus, one gate

use crate::asset::AssetType;
use crate::namespace::Namespace;
use crate::reference::Reference;
use crate::registry::AssetRegistry;
use arbor_core::Services;
use arbor_transact::{CommitGate, Nexus, NexusConfig};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Project configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Undo history settings
    pub history: NexusConfig,
}

/// An open project: the asset namespace, the nexus that mutates it, and the
/// services shared by the modules working on it
pub struct Project {
    namespace: Namespace,
    nexus: Nexus,
    services: Services,
}

impl Project {
    /// Create an empty project
    pub fn new(config: ProjectConfig, registry: AssetRegistry) -> Self {
        Self::with_services(config, registry, Services::empty())
    }

    /// Create an empty project with a frozen service set
    pub fn with_services(config: ProjectConfig, registry: AssetRegistry, services: Services) -> Self {
        let gate = CommitGate::new();
        log::debug!(
            "New project ({} asset types, {} services, history {:?})",
            registry.len(),
            services.len(),
            config.history.history_bound()
        );
        Self {
            nexus: Nexus::with_gate(config.history, gate.clone()),
            namespace: Namespace::new(gate, registry),
            services,
        }
    }

    /// The asset namespace
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// The transaction nexus
    pub fn nexus(&self) -> &Nexus {
        &self.nexus
    }

    /// Shared services
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// A typed reference into the namespace
    pub fn reference<T: AssetType>(&self, path: &str) -> Reference<T> {
        self.namespace.reference(path)
    }
}

impl fmt::Debug for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Project")
            .field("namespace", &self.namespace)
            .field("nexus", &self.nexus)
            .field("services", &self.services)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::{ServiceKey, ServicesBuilder};

    struct Selection(Vec<String>);

    const SELECTION: ServiceKey<Selection> = ServiceKey::new("selection");

    #[test]
    fn test_config_from_json() {
        let config: ProjectConfig = serde_json::from_str(r#"{"history":{"max_history":5}}"#).unwrap();
        assert_eq!(config.history.max_history, 5);

        let config: ProjectConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ProjectConfig::default());
    }

    #[test]
    fn test_shares_one_gate() {
        let project = Project::new(ProjectConfig::default(), AssetRegistry::new());
        assert!(project.namespace().gate().same_as(project.nexus().gate()));
    }

    #[test]
    fn test_services() {
        let services = ServicesBuilder::new()
            .with(SELECTION, Selection(vec!["root/a".into()]))
            .unwrap()
            .build();
        let project = Project::with_services(ProjectConfig::default(), AssetRegistry::new(), services);

        assert_eq!(project.services().get(SELECTION).unwrap().0, vec!["root/a"]);
    }
}
