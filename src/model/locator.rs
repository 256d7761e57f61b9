use std::path::{Path, PathBuf};

use super::naming::snake_case;

/// Maps a `(version, group)` pair to the hand-written model source file.
pub trait SourceLocator {
    fn locate(&self, version: &str, group: &str) -> PathBuf;
}

/// Default layout: `<root>/pkg/api/<version>/<group_snake>.go`.
#[derive(Debug, Clone)]
pub struct ApiSourceLocator {
    root: PathBuf,
}

impl ApiSourceLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ApiSourceLocator { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SourceLocator for ApiSourceLocator {
    fn locate(&self, version: &str, group: &str) -> PathBuf {
        self.root
            .join("pkg")
            .join("api")
            .join(version)
            .join(format!("{}.go", snake_case(group)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let locator = ApiSourceLocator::new("/work/threeport");
        assert_eq!(
            locator.locate("v1", "KubernetesRuntime"),
            Path::new("/work/threeport/pkg/api/v1/kubernetes_runtime.go")
        );
        assert_eq!(locator.root(), Path::new("/work/threeport"));
    }
}
