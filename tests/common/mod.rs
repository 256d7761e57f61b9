#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod project {
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;
    use threeport_sdk::config::{parse_config, SdkConfig};

    pub const BASE_MODULE: &str = "github.com/threeport/threeport";

    /// A throwaway Go project on disk: `go.mod`, an SDK config and model
    /// sources under `pkg/api/<version>/`.
    pub struct TestProject {
        dir: TempDir,
    }

    impl TestProject {
        pub fn new(module: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            fs::write(
                dir.path().join("go.mod"),
                format!("module {module}\n\ngo 1.21\n"),
            )
            .unwrap();
            TestProject { dir }
        }

        pub fn base() -> Self {
            Self::new(BASE_MODULE)
        }

        pub fn root(&self) -> &Path {
            self.dir.path()
        }

        pub fn config_path(&self) -> PathBuf {
            self.root().join("sdk-config.yaml")
        }

        pub fn with_config(self, yaml: &str) -> Self {
            fs::write(self.config_path(), yaml).unwrap();
            self
        }

        /// Write the model source for `file_stem` (the snake-cased group) at `version`.
        pub fn with_source(self, version: &str, file_stem: &str, src: &str) -> Self {
            self.write(&format!("pkg/api/{version}/{file_stem}.go"), src);
            self
        }

        pub fn config(&self) -> SdkConfig {
            parse_config(&fs::read_to_string(self.config_path()).unwrap()).unwrap()
        }

        pub fn write(&self, rel: &str, content: &str) {
            let path = self.root().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }

        pub fn read(&self, rel: &str) -> String {
            fs::read_to_string(self.root().join(rel))
                .unwrap_or_else(|e| panic!("{rel}: {e}"))
        }

        pub fn exists(&self, rel: &str) -> bool {
            self.root().join(rel).exists()
        }
    }
}

pub mod fixtures {
    pub const WORKLOAD_CONFIG: &str = r#"
ApiNamespace: workloads.example.io
ImageRepo: ghcr.io/example
ApiObjectGroups:
  - Name: Workload
    Objects:
      - Name: WorkloadDefinition
        Versions: [v0]
        Reconcilable: true
        Tptctl:
          Enabled: true
      - Name: WorkloadInstance
        Versions: [v0]
        Reconcilable: true
      - Name: WorkloadEvent
        Versions: [v0]
        ExcludeRoute: true
"#;

    pub const WORKLOAD_SRC: &str = r#"package v0

import "gorm.io/datatypes"

// WorkloadDefinition is the configuration for a workload.
type WorkloadDefinition struct {
	Common         `swaggerignore:"true" mapstructure:",squash"`
	Reconciliation `mapstructure:",squash"`
	Definition     `mapstructure:",squash"`

	// The workload's YAML manifest.
	YAMLDocument *string `json:"YAMLDocument,omitempty" query:"yamldocument" validate:"required"`
}

// WorkloadInstance is a deployed workload.
type WorkloadInstance struct {
	Common         `swaggerignore:"true" mapstructure:",squash"`
	Reconciliation `mapstructure:",squash"`
	Instance       `mapstructure:",squash"`

	WorkloadDefinitionID *uint `json:"WorkloadDefinitionID,omitempty" query:"workloaddefinitionid" validate:"required"`
}

// WorkloadEvent is a Kubernetes event for a workload.
type WorkloadEvent struct {
	Common `swaggerignore:"true" mapstructure:",squash"`

	Message *string         `json:"Message,omitempty" validate:"optional"`
	Data    *datatypes.JSON `json:"Data,omitempty" persist:"false"`
}

func (w *WorkloadEvent) String() string {
	if w.Message == nil {
		return "{}"
	}
	return *w.Message
}
"#;
}
