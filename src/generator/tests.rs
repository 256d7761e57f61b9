#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::*;
use crate::config::{parse_config, SdkConfig};
use crate::inspect::{parse_go_source, Marker};
use crate::model::{ObjectModel, RunContext};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const GATEWAY_CONFIG: &str = r#"
ApiNamespace: gateways.example.io
DatabaseMigrationOrder: []
ImageRepo: ghcr.io/example
ApiObjectGroups:
  - Name: Gateway
    Objects:
      - Name: GatewayDefinition
        Versions: [v0]
        Reconcilable: true
      - Name: GatewayInstance
        Versions: [v0]
        Reconcilable: true
        DisableNotificationPersistence: true
      - Name: DomainName
        Versions: [v0]
        LoadAssociationsFromDb: true
"#;

const GATEWAY_SRC: &str = r#"package v0

// GatewayDefinition defines a gateway.
// +threeport-sdk:tptctl-enabled
// +threeport-sdk:tptctl-config-path
type GatewayDefinition struct {
	Common         `swaggerignore:"true" mapstructure:",squash"`
	Reconciliation `mapstructure:",squash"`
	Definition     `mapstructure:",squash"`

	TcpPort *int `json:"TcpPort,omitempty" query:"tcpport" validate:"optional"`
}

// GatewayInstance is a deployed gateway.
type GatewayInstance struct {
	Common         `swaggerignore:"true" mapstructure:",squash"`
	Reconciliation `mapstructure:",squash"`
	Instance       `mapstructure:",squash"`

	Data *datatypes.JSON `json:"Data,omitempty" persist:"false"`
}

// DomainName is a DNS name routed to a gateway.
type DomainName struct {
	Common `swaggerignore:"true" mapstructure:",squash"`

	Name *string `json:"Name,omitempty" validate:"required"`
}
"#;

fn project() -> (tempfile::TempDir, SdkConfig) {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("pkg/api/v0/gateway.go");
    fs::create_dir_all(source.parent().unwrap()).unwrap();
    fs::write(&source, GATEWAY_SRC).unwrap();
    (dir, parse_config(GATEWAY_CONFIG).unwrap())
}

fn model(root: &Path, config: &SdkConfig) -> ObjectModel {
    build_model(config, &RunContext::base(root)).unwrap()
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap_or_else(|e| panic!("{rel}: {e}"))
}

/// Text of one Go function, from its signature up to the next handler.
fn go_func<'a>(content: &'a str, signature: &str) -> &'a str {
    let start = content
        .find(signature)
        .unwrap_or_else(|| panic!("missing {signature}"));
    let rest = &content[start..];
    let end = rest[signature.len()..]
        .find("\nfunc ")
        .map_or(rest.len(), |i| i + signature.len());
    &rest[..end]
}

fn snapshot(root: &Path) -> BTreeMap<PathBuf, String> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
            (rel, fs::read_to_string(e.path()).unwrap())
        })
        .collect()
}

#[test]
fn test_default_emitters_in_stage_order() {
    let pipeline = Pipeline::with_defaults();
    let stages: Vec<Stage> = pipeline.emitters().iter().map(|e| e.stage).collect();
    let mut sorted = stages.clone();
    sorted.sort();
    assert_eq!(stages, sorted);
    assert_eq!(pipeline.emitters().len(), 14);

    let scaffolds: Vec<&str> = pipeline
        .emitters()
        .iter()
        .filter(|e| e.mode == WriteMode::Scaffold)
        .map(|e| e.name)
        .collect();
    assert_eq!(scaffolds, vec!["tptctl-output", "reconciler-stub"]);
}

#[test]
fn test_only_filters_stages() {
    let pipeline = Pipeline::with_defaults().only(&[Stage::Database, Stage::Client]);
    let names: Vec<&str> = pipeline.emitters().iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["database-init", "client"]);

    assert_eq!(Pipeline::with_defaults().only(&[]).emitters().len(), 14);
}

#[test]
fn test_expand_path_placeholders() {
    let (dir, config) = project();
    let model = model(dir.path(), &config);

    let group = Target::Group {
        model: &model,
        group: &model.groups[0],
    };
    assert_eq!(
        expand_path("cmd/{controller}/main_gen.go", &group).unwrap(),
        Path::new("cmd/gateway-controller/main_gen.go")
    );
    assert_eq!(
        expand_path("internal/{package}/reconcilers_gen.go", &group).unwrap(),
        Path::new("internal/gateway/reconcilers_gen.go")
    );

    let err = expand_path("pkg/api/{version}/x.go", &group).unwrap_err();
    assert!(err.to_string().contains("{version}"));
    assert!(expand_path("pkg/{nope}.go", &group).is_err());
    assert!(expand_path("pkg/{group", &group).is_err());

    let stubs = Target::all(&model, Granularity::ReconciledObject);
    let paths: Vec<PathBuf> = stubs
        .iter()
        .map(|t| expand_path("internal/{package}/{object}.go", t).unwrap())
        .collect();
    assert_eq!(
        paths,
        vec![
            PathBuf::from("internal/gateway/gateway_definition.go"),
            PathBuf::from("internal/gateway/gateway_instance.go"),
        ]
    );
}

#[test]
fn test_generate_writes_every_artifact() {
    let (dir, config) = project();
    let root = dir.path();
    let report =
        generate_project(&config, &RunContext::base(root), &GenerateOptions::default()).unwrap();

    let expected = [
        "pkg/api/v0/gateway_gen.go",
        "pkg/api/v0/notifications_gen.go",
        "pkg/api-server/v0/versions/gateway_gen.go",
        "pkg/api-server/v0/routes/gateway_gen.go",
        "pkg/api-server/v0/routes/routes_gen.go",
        "pkg/api-server/v0/handlers/gateway_gen.go",
        "pkg/api-server/v0/database/database_gen.go",
        "pkg/client/v0/gateway_gen.go",
        "cmd/tptctl/cmd/gateway_gen.go",
        "cmd/tptctl/cmd/gateway_output.go",
        "cmd/gateway-controller/main_gen.go",
        "internal/gateway/reconcilers_gen.go",
        "internal/gateway/gateway_definition.go",
        "internal/gateway/gateway_instance.go",
        "cmd/gateway-controller/image/Dockerfile",
    ];
    assert_eq!(report.written.len(), expected.len());
    for rel in expected {
        assert!(root.join(rel).is_file(), "{rel} not written");
    }
    assert!(report.skipped.is_empty());

    let api = read(root, "pkg/api/v0/gateway_gen.go");
    assert!(api.starts_with("// generated by 'threeport-sdk gen' - do not edit"));
    assert!(api.contains("ObjectTypeGatewayDefinition ObjectType = \"GatewayDefinition\""));
    assert!(api.contains("GatewayStreamName = \"GatewayStream\""));
    assert!(api.contains("PathDomainNames = \"/v0/domain-names\""));
    assert!(api.contains("func (t *DomainName) Version() string"));

    let database = read(root, "pkg/api-server/v0/database/database_gen.go");
    let order: Vec<usize> = ["&api.DomainName{}", "&api.GatewayDefinition{}", "&api.GatewayInstance{}"]
        .iter()
        .map(|n| database.find(n).unwrap())
        .collect();
    assert!(order.windows(2).all(|w| w[0] < w[1]));

    let main = read(root, "cmd/gateway-controller/main_gen.go");
    assert!(main.contains("Name:                 \"GatewayDefinitionReconciler\""));
    assert!(main.contains("ReconcileFunc:        gateway.GatewayInstanceReconciler"));
    let instance_config = &main[main.find("\"GatewayInstanceReconciler\"").unwrap()..];
    assert!(instance_config.contains("Durable:              false"));

    let dockerfile = read(root, "cmd/gateway-controller/image/Dockerfile");
    assert!(dockerfile.contains("ghcr.io/example"));
}

#[test]
fn test_handlers_follow_object_flags() {
    let (dir, config) = project();
    let root = dir.path();
    generate_project(&config, &RunContext::base(root), &GenerateOptions::default()).unwrap();
    let handlers = read(root, "pkg/api-server/v0/handlers/gateway_gen.go");

    // unique names are enforced for objects with a name field
    let add_domain = go_func(&handlers, "func (h Handler) AddDomainName(");
    assert!(add_domain.contains("h.DB.Where(\"name = ?\", domainName.Name)"));
    assert!(!add_domain.contains("NotificationPayload"));

    // reconciled objects notify their controller
    let add_def = go_func(&handlers, "func (h Handler) AddGatewayDefinition(");
    assert!(add_def.contains("api.GatewayDefinitionCreateSubject"));

    // associations are preloaded only where configured
    let get_domain = go_func(&handlers, "func (h Handler) GetDomainName(");
    assert!(get_domain.contains("Preload(gorm_clause.Associations)"));
    let get_def = go_func(&handlers, "func (h Handler) GetGatewayDefinition(");
    assert!(!get_def.contains("Preload"));
    assert!(handlers.contains("gorm_clause \"gorm.io/gorm/clause\""));
}

#[test]
fn test_unpersisted_data_skips_latest_object_fetch() {
    let (dir, config) = project();
    let root = dir.path();
    generate_project(&config, &RunContext::base(root), &GenerateOptions::default()).unwrap();
    let handlers = read(root, "pkg/api-server/v0/handlers/gateway_gen.go");

    let update_def = go_func(&handlers, "func (h Handler) UpdateGatewayDefinition(");
    assert!(update_def.contains("fetch the latest object"));

    let update_inst = go_func(&handlers, "func (h Handler) UpdateGatewayInstance(");
    assert!(!update_inst.contains("fetch the latest object"));
    assert!(update_inst.contains("api.GatewayInstanceUpdateSubject"));
}

#[test]
fn test_generation_is_deterministic() {
    let (dir, config) = project();
    let root = dir.path();
    let ctx = RunContext::base(root);

    generate_project(&config, &ctx, &GenerateOptions::default()).unwrap();
    let first = snapshot(root);
    let report = generate_project(&config, &ctx, &GenerateOptions::default()).unwrap();
    let second = snapshot(root);

    assert_eq!(first, second);
    // scaffolds from the first run are left alone
    assert_eq!(report.skipped.len(), 3);
}

#[test]
fn test_scaffolds_are_never_overwritten() {
    let (dir, config) = project();
    let root = dir.path();
    let ctx = RunContext::base(root);
    generate_project(&config, &ctx, &GenerateOptions::default()).unwrap();

    let stub = root.join("internal/gateway/gateway_definition.go");
    fs::write(&stub, "package gateway\n\n// hand written\n").unwrap();
    let generated = root.join("internal/gateway/reconcilers_gen.go");
    fs::write(&generated, "stale").unwrap();

    let report = generate_project(&config, &ctx, &GenerateOptions::default()).unwrap();
    assert_eq!(fs::read_to_string(&stub).unwrap(), "package gateway\n\n// hand written\n");
    assert_ne!(fs::read_to_string(&generated).unwrap(), "stale");
    assert!(report
        .skipped
        .contains(&PathBuf::from("internal/gateway/gateway_definition.go")));
}

#[test]
fn test_extension_rewrites_project_imports() {
    let (dir, config) = project();
    let root = dir.path();
    let ctx = RunContext::extension(root, "github.com/acme/gateways");
    generate_project(&config, &ctx, &GenerateOptions::default()).unwrap();

    let handlers = read(root, "pkg/api-server/v0/handlers/gateway_gen.go");
    assert!(handlers.contains("api \"github.com/acme/gateways/pkg/api/v0\""));
    assert!(handlers.contains("iapi \"github.com/threeport/threeport/pkg/api-server/v0\""));
    assert!(!handlers.contains("\"github.com/threeport/threeport/pkg/api/v0\""));

    let main = read(root, "cmd/gateway-controller/main_gen.go");
    assert!(main.contains("gateway \"github.com/acme/gateways/internal/gateway\""));
    assert!(main.contains("controller \"github.com/threeport/threeport/pkg/controller/v0\""));

    let commands = read(root, "cmd/tptctl/cmd/gateway_gen.go");
    assert!(commands.contains("client_v0 \"github.com/acme/gateways/pkg/client/v0\""));
}

#[test]
fn test_tptctl_commands_follow_markers() {
    let (dir, config) = project();
    let root = dir.path();
    generate_project(&config, &RunContext::base(root), &GenerateOptions::default()).unwrap();

    let commands = read(root, "cmd/tptctl/cmd/gateway_gen.go");
    assert!(commands.contains("var GetGatewayDefinitionsCmd = &cobra.Command{"));
    assert!(commands.contains("var CreateGatewayDefinitionCmd = &cobra.Command{"));
    assert!(commands.contains("yaml \"gopkg.in/yaml.v2\""));
    assert!(!commands.contains("DomainName"));

    let output = read(root, "cmd/tptctl/cmd/gateway_output.go");
    assert!(output.contains("func outputGatewayDefinitionsCmd("));
}

#[test]
fn test_dry_run_writes_nothing() {
    let (dir, config) = project();
    let root = dir.path();
    let options = GenerateOptions {
        dry_run: true,
        ..GenerateOptions::default()
    };
    let report = generate_project(&config, &RunContext::base(root), &options).unwrap();

    assert!(report.written.is_empty());
    assert_eq!(report.would_write.len(), 15);
    assert!(!root.join("pkg/api/v0/gateway_gen.go").exists());
}

#[test]
fn test_sync_prunes_stale_output() {
    let (dir, config) = project();
    let root = dir.path();
    let ctx = RunContext::base(root);
    let retired = root.join("pkg/client/v0/retired_gen.go");
    fs::create_dir_all(retired.parent().unwrap()).unwrap();
    fs::write(&retired, "package v0\n").unwrap();

    let outcome = sync_project(&config, &ctx, false).unwrap();
    assert_eq!(outcome.pruned, vec![PathBuf::from("pkg/client/v0/retired_gen.go")]);
    assert!(!retired.exists());
    assert!(root.join("pkg/client/v0/gateway_gen.go").exists());
    assert!(root.join("pkg/api/v0/gateway.go").exists());
}

fn failing_render(_: &Target<'_>, _: &RunContext) -> anyhow::Result<String> {
    anyhow::bail!("template exploded")
}

fn describe_render(target: &Target<'_>, _: &RunContext) -> anyhow::Result<String> {
    Ok(target.describe())
}

fn always(_: &Target<'_>) -> bool {
    true
}

fn test_emitter(
    name: &'static str,
    stage: Stage,
    path: &'static str,
    render: fn(&Target<'_>, &RunContext) -> anyhow::Result<String>,
) -> EmitterSpec {
    EmitterSpec {
        name,
        stage,
        granularity: Granularity::Version,
        mode: WriteMode::Overwrite,
        path,
        applies: always,
        render,
    }
}

#[test]
fn test_failure_policies() {
    let (dir, config) = project();
    let root = dir.path();
    let ctx = RunContext::base(root);
    let model = model(root, &config);
    let emitters = vec![
        test_emitter("broken", Stage::ApiModel, "broken/{version}.txt", failing_render),
        test_emitter("fine", Stage::Routes, "fine/{version}.txt", describe_render),
    ];

    let mut writer = FileWriter::new(root);
    let err = Pipeline::new(emitters.clone())
        .run(&model, &ctx, &mut writer)
        .unwrap_err();
    assert!(format!("{err:#}").contains("template exploded"));
    assert!(!root.join("fine/v0.txt").exists());

    let mut writer = FileWriter::new(root);
    let err = Pipeline::new(emitters)
        .policy(FailurePolicy::CollectAll)
        .run(&model, &ctx, &mut writer)
        .unwrap_err();
    assert_eq!(err.to_string(), "1 emitter(s) failed: broken");
    assert_eq!(read(root, "fine/v0.txt"), "v0");
}

#[test]
fn test_overlapping_emitters_are_rejected() {
    let (dir, config) = project();
    let root = dir.path();
    let model = model(root, &config);
    let emitters = vec![
        test_emitter("first", Stage::ApiModel, "out/{version}.txt", describe_render),
        test_emitter("second", Stage::Client, "out/{version}.txt", describe_render),
    ];

    let mut writer = FileWriter::new(root);
    let err = Pipeline::new(emitters)
        .run(&model, &RunContext::base(root), &mut writer)
        .unwrap_err();
    assert!(err.to_string().contains("both produce out/v0.txt"));
}

#[test]
fn test_scaffolded_sources_build_a_model() {
    let config = parse_config(
        r#"
ApiNamespace: gateways.example.io
DatabaseMigrationOrder: []
ApiObjectGroups:
  - Name: Gateway
    Objects:
      - Name: GatewayDefinition
        Versions: [v0, v1]
        Reconcilable: true
        Tptctl: {Enabled: true}
      - Name: GatewayInstance
        Versions: [v0]
        Reconcilable: true
      - Name: DomainName
        Versions: [v0]
        AllowDuplicateModelNames: true
"#,
    )
    .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let ctx = RunContext::base(dir.path());

    let report = create_api_objects(&config, &ctx, false).unwrap();
    assert_eq!(
        report.written,
        vec![
            PathBuf::from("pkg/api/v0/gateway.go"),
            PathBuf::from("pkg/api/v1/gateway.go"),
        ]
    );

    let v0 = read(dir.path(), "pkg/api/v0/gateway.go");
    let facts = parse_go_source(&v0, Path::new("gateway.go")).unwrap();
    let def = facts.get("GatewayDefinition").unwrap();
    assert!(def.has_marker(Marker::Reconciler));
    assert!(def.has_marker(Marker::TptctlEnabled));
    assert!(def.reconciled_field);
    assert!(facts.get("DomainName").unwrap().has_marker(Marker::AllowDuplicateNames));

    let model = build_model(&config, &ctx).unwrap();
    let domain = model.object("DomainName", "v0").unwrap();
    assert!(domain.name_field && domain.allow_duplicate_names);
    // pairing looks at the whole group, not one version
    assert!(model.object("GatewayDefinition", "v0").unwrap().defined_instance);
    assert!(model.object("GatewayDefinition", "v1").unwrap().defined_instance);

    // a second run leaves the edited sources alone
    let again = create_api_objects(&config, &ctx, false).unwrap();
    assert!(again.written.is_empty());
    assert_eq!(again.skipped.len(), 2);
}
