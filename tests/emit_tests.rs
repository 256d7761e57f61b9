#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use common::fixtures::{WORKLOAD_CONFIG, WORKLOAD_SRC};
use common::project::TestProject;
use std::collections::BTreeSet;
use std::path::PathBuf;
use threeport_sdk::generator::{
    create_api_objects, generate_project, sync_project, GenerateOptions, Stage,
};
use threeport_sdk::model::RunContext;

const HELM_GROUP: &str = r#"  - Name: Helm
    Objects:
      - Name: HelmRelease
        Versions: [v0]
"#;

const HELM_SRC: &str = r#"package v0

// HelmRelease is a release of a helm chart.
type HelmRelease struct {
	Common `swaggerignore:"true" mapstructure:",squash"`

	Name  *string `json:"Name,omitempty" query:"name" validate:"required"`
	Chart *string `json:"Chart,omitempty" query:"chart" validate:"required"`
}
"#;

fn workload() -> TestProject {
    TestProject::new("github.com/example/workloads")
        .with_config(WORKLOAD_CONFIG)
        .with_source("v0", "workload", WORKLOAD_SRC)
}

fn paths(items: &[&str]) -> BTreeSet<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}

#[test]
fn test_extension_project_detected_from_go_mod() {
    let project = workload();
    let ctx = RunContext::detect(project.root(), None).unwrap();
    assert!(ctx.is_extension());

    let report = generate_project(&project.config(), &ctx, &GenerateOptions::default()).unwrap();
    assert_eq!(report.written.len(), 15);

    let handlers = project.read("pkg/api-server/v0/handlers/workload_gen.go");
    assert!(handlers.contains("api \"github.com/example/workloads/pkg/api/v0\""));
    assert!(handlers.contains("iapi \"github.com/threeport/threeport/pkg/api-server/v0\""));

    let registry = project.read("pkg/api-server/v0/routes/routes_gen.go");
    assert!(registry.contains("WorkloadDefinition"));
    assert!(!registry.contains("WorkloadEvent"));

    let database = project.read("pkg/api-server/v0/database/database_gen.go");
    assert!(database.contains("&api.WorkloadEvent{}"));

    let main = project.read("cmd/workload-controller/main_gen.go");
    assert!(main.contains("workload \"github.com/example/workloads/internal/workload\""));
    assert!(project.exists("internal/workload/workload_definition.go"));
    assert!(project.exists("internal/workload/workload_instance.go"));
    assert!(!project.exists("internal/workload/workload_event.go"));
}

#[test]
fn test_regeneration_is_stable() {
    let project = workload();
    let ctx = RunContext::detect(project.root(), None).unwrap();
    let config = project.config();

    generate_project(&config, &ctx, &GenerateOptions::default()).unwrap();
    let first = project.read("pkg/client/v0/workload_gen.go");
    project.write(
        "internal/workload/workload_definition.go",
        "package workload\n\n// hand written\n",
    );

    let report = generate_project(&config, &ctx, &GenerateOptions::default()).unwrap();
    assert_eq!(project.read("pkg/client/v0/workload_gen.go"), first);
    assert_eq!(
        project.read("internal/workload/workload_definition.go"),
        "package workload\n\n// hand written\n"
    );
    assert_eq!(
        report.skipped.iter().cloned().collect::<BTreeSet<_>>(),
        paths(&[
            "cmd/tptctl/cmd/workload_output.go",
            "internal/workload/workload_definition.go",
            "internal/workload/workload_instance.go",
        ])
    );
}

#[test]
fn test_only_runs_selected_stages() {
    let project = workload();
    let ctx = RunContext::detect(project.root(), None).unwrap();
    let options = GenerateOptions {
        only: vec![Stage::ApiModel],
        ..GenerateOptions::default()
    };

    let report = generate_project(&project.config(), &ctx, &options).unwrap();
    assert_eq!(
        report.written.iter().cloned().collect::<BTreeSet<_>>(),
        paths(&[
            "pkg/api/v0/workload_gen.go",
            "pkg/api/v0/notifications_gen.go",
            "pkg/api-server/v0/versions/workload_gen.go",
        ])
    );
    assert!(!project.exists("pkg/client/v0/workload_gen.go"));
}

#[test]
fn test_sync_removes_output_of_dropped_group() {
    let project = TestProject::new("github.com/example/workloads")
        .with_config(&format!("{WORKLOAD_CONFIG}{HELM_GROUP}"))
        .with_source("v0", "workload", WORKLOAD_SRC)
        .with_source("v0", "helm", HELM_SRC);
    let ctx = RunContext::detect(project.root(), None).unwrap();

    let first = sync_project(&project.config(), &ctx, false).unwrap();
    assert!(first.pruned.is_empty());
    assert!(project.exists("pkg/client/v0/helm_gen.go"));

    project.write("sdk-config.yaml", WORKLOAD_CONFIG);
    project.write("internal/version/version_gen.go", "package version\n");
    let dry = sync_project(&project.config(), &ctx, true).unwrap();
    assert!(project.exists("pkg/client/v0/helm_gen.go"));

    let outcome = sync_project(&project.config(), &ctx, false).unwrap();
    let expected = paths(&[
        "pkg/api/v0/helm_gen.go",
        "pkg/api-server/v0/versions/helm_gen.go",
        "pkg/api-server/v0/routes/helm_gen.go",
        "pkg/api-server/v0/handlers/helm_gen.go",
        "pkg/client/v0/helm_gen.go",
    ]);
    assert_eq!(dry.pruned.iter().cloned().collect::<BTreeSet<_>>(), expected);
    assert_eq!(outcome.pruned.iter().cloned().collect::<BTreeSet<_>>(), expected);
    for rel in &expected {
        assert!(!project.root().join(rel).exists(), "{} survived", rel.display());
    }
    // hand-written model sources are never pruned
    assert!(project.exists("pkg/api/v0/helm.go"));
    // neither are _gen.go files no emitter writes
    assert!(project.exists("internal/version/version_gen.go"));
    assert!(!project
        .read("pkg/api-server/v0/database/database_gen.go")
        .contains("HelmRelease"));
}

#[test]
fn test_create_then_generate() {
    let project =
        TestProject::base().with_config(&format!("DatabaseMigrationOrder: []\n{WORKLOAD_CONFIG}"));
    let ctx = RunContext::detect(project.root(), None).unwrap();
    assert!(!ctx.is_extension());
    let config = project.config();

    let created = create_api_objects(&config, &ctx, false).unwrap();
    assert_eq!(created.written, vec![PathBuf::from("pkg/api/v0/workload.go")]);
    let scaffold = project.read("pkg/api/v0/workload.go");
    assert!(scaffold.contains("type WorkloadEvent struct"));

    // a second create leaves the edited source alone
    project.write("pkg/api/v0/workload.go", WORKLOAD_SRC);
    let again = create_api_objects(&config, &ctx, false).unwrap();
    assert!(again.written.is_empty());
    assert_eq!(again.skipped, vec![PathBuf::from("pkg/api/v0/workload.go")]);

    let report = generate_project(&config, &ctx, &GenerateOptions::default()).unwrap();
    assert_eq!(report.written.len(), 15);
    let client = project.read("pkg/client/v0/workload_gen.go");
    assert!(client.contains("github.com/threeport/threeport/pkg/api/v0"));
}
