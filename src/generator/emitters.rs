//! The default emitter table and its render functions.

use anyhow::anyhow;
use askama::Template;
use std::collections::BTreeSet;

use super::emitter::{EmitterSpec, Granularity, Stage, Target, WriteMode};
use super::templates::{
    go_quote, tagged_objects, ApiObjectTemplate, ClientTemplate, ControllerMainTemplate,
    DatabaseTemplate, DockerfileTemplate, GoImport, HandlersTemplate, NotificationsTemplate,
    ObjectView, ReconcilerStubTemplate, ReconcilerView, ReconcilersTemplate,
    RouteRegistryTemplate, RoutesTemplate, TaggedFieldsTemplate, TptctlCommandsTemplate,
    TptctlObjectView, TptctlOutputTemplate, VersionAliases,
};
use crate::model::{camel_case, ApiObject, ApiObjectGroup, ReconciledObject, RunContext};

const NOTIFICATIONS_PKG: &str = "pkg/notifications/v0";
const API_SERVER_LIB_PKG: &str = "pkg/api-server/v0";
const CLIENT_LIB_PKG: &str = "pkg/client/lib/v0";
const CLI_LIB_PKG: &str = "pkg/cli/v0";
const CONTROLLER_LIB_PKG: &str = "pkg/controller/v0";

/// Every built-in emitter, in stage order.
pub static DEFAULT_EMITTERS: &[EmitterSpec] = &[
    EmitterSpec {
        name: "api-object",
        stage: Stage::ApiModel,
        granularity: Granularity::VersionGroup,
        mode: WriteMode::Overwrite,
        path: "pkg/api/{version}/{group}_gen.go",
        applies: always,
        render: render_api_object,
    },
    EmitterSpec {
        name: "notifications",
        stage: Stage::ApiModel,
        granularity: Granularity::Version,
        mode: WriteMode::Overwrite,
        path: "pkg/api/{version}/notifications_gen.go",
        applies: always,
        render: render_notifications,
    },
    EmitterSpec {
        name: "tagged-fields",
        stage: Stage::ApiModel,
        granularity: Granularity::VersionGroup,
        mode: WriteMode::Overwrite,
        path: "pkg/api-server/{version}/versions/{group}_gen.go",
        applies: always,
        render: render_tagged_fields,
    },
    EmitterSpec {
        name: "routes",
        stage: Stage::Routes,
        granularity: Granularity::VersionGroup,
        mode: WriteMode::Overwrite,
        path: "pkg/api-server/{version}/routes/{group}_gen.go",
        applies: has_routes,
        render: render_routes,
    },
    EmitterSpec {
        name: "route-registry",
        stage: Stage::Routes,
        granularity: Granularity::Version,
        mode: WriteMode::Overwrite,
        path: "pkg/api-server/{version}/routes/routes_gen.go",
        applies: has_routes,
        render: render_route_registry,
    },
    EmitterSpec {
        name: "handlers",
        stage: Stage::Handlers,
        granularity: Granularity::VersionGroup,
        mode: WriteMode::Overwrite,
        path: "pkg/api-server/{version}/handlers/{group}_gen.go",
        applies: has_routes,
        render: render_handlers,
    },
    EmitterSpec {
        name: "database-init",
        stage: Stage::Database,
        granularity: Granularity::Version,
        mode: WriteMode::Overwrite,
        path: "pkg/api-server/{version}/database/database_gen.go",
        applies: has_db_objects,
        render: render_database,
    },
    EmitterSpec {
        name: "client",
        stage: Stage::Client,
        granularity: Granularity::VersionGroup,
        mode: WriteMode::Overwrite,
        path: "pkg/client/{version}/{group}_gen.go",
        applies: has_routes,
        render: render_client,
    },
    EmitterSpec {
        name: "tptctl-commands",
        stage: Stage::Tptctl,
        granularity: Granularity::Group,
        mode: WriteMode::Overwrite,
        path: "cmd/tptctl/cmd/{group}_gen.go",
        applies: has_tptctl_objects,
        render: render_tptctl_commands,
    },
    EmitterSpec {
        name: "tptctl-output",
        stage: Stage::Tptctl,
        granularity: Granularity::Group,
        mode: WriteMode::Scaffold,
        path: "cmd/tptctl/cmd/{group}_output.go",
        applies: has_tptctl_objects,
        render: render_tptctl_output,
    },
    EmitterSpec {
        name: "controller-main",
        stage: Stage::Controller,
        granularity: Granularity::Group,
        mode: WriteMode::Overwrite,
        path: "cmd/{controller}/main_gen.go",
        applies: has_reconcilers,
        render: render_controller_main,
    },
    EmitterSpec {
        name: "reconcilers",
        stage: Stage::Controller,
        granularity: Granularity::Group,
        mode: WriteMode::Overwrite,
        path: "internal/{package}/reconcilers_gen.go",
        applies: has_reconcilers,
        render: render_reconcilers,
    },
    EmitterSpec {
        name: "reconciler-stub",
        stage: Stage::Controller,
        granularity: Granularity::ReconciledObject,
        mode: WriteMode::Scaffold,
        path: "internal/{package}/{object}.go",
        applies: always,
        render: render_reconciler_stub,
    },
    EmitterSpec {
        name: "dockerfile",
        stage: Stage::Controller,
        granularity: Granularity::Group,
        mode: WriteMode::Overwrite,
        path: "cmd/{controller}/image/Dockerfile",
        applies: has_reconcilers,
        render: render_dockerfile,
    },
];

fn always(_: &Target<'_>) -> bool {
    true
}

fn has_routes(target: &Target<'_>) -> bool {
    match *target {
        Target::Version { config, .. } => !config.route_names.is_empty(),
        Target::VersionGroup { group, .. } => routable(&group.objects).next().is_some(),
        _ => false,
    }
}

fn has_db_objects(target: &Target<'_>) -> bool {
    matches!(*target, Target::Version { config, .. } if !config.database_init_names.is_empty())
}

fn has_tptctl_objects(target: &Target<'_>) -> bool {
    match *target {
        Target::Group { group, .. } => group.tptctl_enabled() && !tptctl_objects(group).is_empty(),
        _ => false,
    }
}

fn has_reconcilers(target: &Target<'_>) -> bool {
    match *target {
        Target::Group { group, .. } => group.has_reconcilers(),
        _ => false,
    }
}

fn routable(objects: &[ApiObject]) -> impl Iterator<Item = &ApiObject> {
    objects.iter().filter(|o| !o.exclude_route)
}

fn views<'a>(objects: impl Iterator<Item = &'a ApiObject>) -> anyhow::Result<Vec<ObjectView<'a>>> {
    objects.map(ObjectView::new).collect()
}

fn unexpected(target: &Target<'_>) -> anyhow::Error {
    anyhow!("Emitter does not support target {}", target.describe())
}

/// Latest version of each tptctl-enabled object that has a client.
fn tptctl_objects(group: &ApiObjectGroup) -> Vec<TptctlObjectView<'_>> {
    group
        .latest_objects()
        .into_iter()
        .filter(|o| o.tptctl_commands && !o.exclude_route)
        .map(|obj| TptctlObjectView {
            obj,
            s: &obj.symbols,
            aliases: VersionAliases::new(&obj.version),
            plural_variable: camel_case(&obj.symbols.plural),
        })
        .collect()
}

fn reconciler_view<'a>(
    group: &'a ApiObjectGroup,
    reconciled: &ReconciledObject,
) -> anyhow::Result<ReconcilerView<'a>> {
    let version = reconciled
        .latest_version()
        .ok_or_else(|| anyhow!("Reconciled object {} has no versions", reconciled.name))?;
    let obj = group
        .objects_in(version)
        .find(|o| o.type_name == reconciled.name)
        .ok_or_else(|| {
            anyhow!(
                "Reconciled object {} has no {version} entry in group {}",
                reconciled.name,
                group.name
            )
        })?;
    Ok(ReconcilerView {
        obj,
        s: &obj.symbols,
        aliases: VersionAliases::new(version),
        durable: !reconciled.disable_notification_persistence,
        concurrency_flag: format!("{}-concurrent-reconciles", obj.symbols.tptctl_command),
        concurrency_var: format!("{}ConcurrentReconciles", obj.symbols.variable),
    })
}

fn reconciler_views(group: &ApiObjectGroup) -> anyhow::Result<Vec<ReconcilerView<'_>>> {
    group
        .reconciled_objects
        .iter()
        .map(|r| reconciler_view(group, r))
        .collect()
}

fn api_import(ctx: &RunContext, version: &str) -> String {
    ctx.import_path(&format!("pkg/api/{version}"))
}

fn api_alias_imports<'a>(
    ctx: &RunContext,
    aliases: impl Iterator<Item = &'a VersionAliases>,
) -> BTreeSet<GoImport> {
    aliases
        .map(|a| GoImport::new(a.api.clone(), api_import(ctx, &a.version)))
        .collect()
}

fn std_imports(paths: &[&str]) -> BTreeSet<GoImport> {
    paths.iter().map(|p| GoImport::new("", *p)).collect()
}

fn render_api_object(target: &Target<'_>, ctx: &RunContext) -> anyhow::Result<String> {
    let Target::VersionGroup { version, group, .. } = *target else {
        return Err(unexpected(target));
    };
    Ok(ApiObjectTemplate {
        version: &version.version,
        stream_name: &group.naming.stream_name,
        q_stream: go_quote(&format!("{}Stream", group.naming.controller_domain))?,
        notifications_import: ctx.base_import_path(NOTIFICATIONS_PKG),
        objects: views(group.objects.iter())?,
    }
    .render()?)
}

fn render_notifications(target: &Target<'_>, _ctx: &RunContext) -> anyhow::Result<String> {
    let Target::Version { version, .. } = *target else {
        return Err(unexpected(target));
    };
    Ok(NotificationsTemplate {
        version: &version.version,
        streams: version
            .groups
            .iter()
            .map(|g| g.naming.stream_name.as_str())
            .collect(),
        reconciled: version.objects().filter(|o| o.reconciler).collect(),
    }
    .render()?)
}

fn render_tagged_fields(target: &Target<'_>, ctx: &RunContext) -> anyhow::Result<String> {
    let Target::VersionGroup { version, group, .. } = *target else {
        return Err(unexpected(target));
    };
    let objects: Vec<&ApiObject> = group.objects.iter().collect();
    Ok(TaggedFieldsTemplate {
        version: &version.version,
        q_version: go_quote(&version.version)?,
        group: &group.name,
        domain: &group.naming.controller_domain,
        api_import: api_import(ctx, &version.version),
        objects: tagged_objects(&group.struct_tags, &objects)?,
    }
    .render()?)
}

fn render_routes(target: &Target<'_>, ctx: &RunContext) -> anyhow::Result<String> {
    let Target::VersionGroup { version, group, .. } = *target else {
        return Err(unexpected(target));
    };
    Ok(RoutesTemplate {
        group: &group.name,
        domain: &group.naming.controller_domain,
        api_import: api_import(ctx, &version.version),
        handlers_import: ctx.import_path(&format!("pkg/api-server/{}/handlers", version.version)),
        objects: views(routable(&group.objects))?,
    }
    .render()?)
}

fn render_route_registry(target: &Target<'_>, ctx: &RunContext) -> anyhow::Result<String> {
    let Target::Version { version, config, .. } = *target else {
        return Err(unexpected(target));
    };
    Ok(RouteRegistryTemplate {
        version: &version.version,
        handlers_import: ctx.import_path(&format!("pkg/api-server/{}/handlers", version.version)),
        domains: version
            .groups
            .iter()
            .filter(|g| routable(&g.objects).next().is_some())
            .map(|g| g.naming.controller_domain.as_str())
            .collect(),
        route_names: config
            .route_names
            .iter()
            .map(|n| go_quote(n))
            .collect::<anyhow::Result<_>>()?,
    }
    .render()?)
}

fn render_handlers(target: &Target<'_>, ctx: &RunContext) -> anyhow::Result<String> {
    let Target::VersionGroup { version, group, .. } = *target else {
        return Err(unexpected(target));
    };
    let objects = views(routable(&group.objects))?;

    let mut imports = std_imports(&["errors", "net/http"]);
    imports.insert(GoImport::new("echo", "github.com/labstack/echo/v4"));
    imports.insert(GoImport::new("gorm", "gorm.io/gorm"));
    imports.insert(GoImport::new("iapi", ctx.base_import_path(API_SERVER_LIB_PKG)));
    imports.insert(GoImport::new("api", api_import(ctx, &version.version)));
    if objects.iter().any(|o| o.obj.reconciler) {
        imports.insert(GoImport::new("", "time"));
        imports.insert(GoImport::new(
            "notifications",
            ctx.base_import_path(NOTIFICATIONS_PKG),
        ));
    }
    if objects.iter().any(|o| o.obj.db_load_associations) {
        imports.insert(GoImport::new("gorm_clause", "gorm.io/gorm/clause"));
    }

    Ok(HandlersTemplate { imports, objects }.render()?)
}

fn render_database(target: &Target<'_>, ctx: &RunContext) -> anyhow::Result<String> {
    let Target::Version { version, config, .. } = *target else {
        return Err(unexpected(target));
    };
    Ok(DatabaseTemplate {
        version: &version.version,
        api_import: api_import(ctx, &version.version),
        names: &config.database_init_names,
    }
    .render()?)
}

fn render_client(target: &Target<'_>, ctx: &RunContext) -> anyhow::Result<String> {
    let Target::VersionGroup { version, group, .. } = *target else {
        return Err(unexpected(target));
    };
    Ok(ClientTemplate {
        version: &version.version,
        api_import: api_import(ctx, &version.version),
        client_lib_import: ctx.base_import_path(CLIENT_LIB_PKG),
        objects: views(routable(&group.objects))?,
    }
    .render()?)
}

fn render_tptctl_commands(target: &Target<'_>, ctx: &RunContext) -> anyhow::Result<String> {
    let Target::Group { group, .. } = *target else {
        return Err(unexpected(target));
    };
    let objects = tptctl_objects(group);

    let mut imports = std_imports(&["os"]);
    imports.insert(GoImport::new("cobra", "github.com/spf13/cobra"));
    imports.insert(GoImport::new("cli", ctx.base_import_path(CLI_LIB_PKG)));
    for o in &objects {
        imports.insert(GoImport::new(
            o.aliases.client.clone(),
            ctx.import_path(&format!("pkg/client/{}", o.aliases.version)),
        ));
        if o.obj.tptctl_config_path {
            imports.insert(GoImport::new(
                o.aliases.api.clone(),
                api_import(ctx, &o.aliases.version),
            ));
            imports.insert(GoImport::new("yaml", "gopkg.in/yaml.v2"));
        }
        if o.obj.tptctl_config_path || o.obj.name_field {
            imports.insert(GoImport::new("", "fmt"));
        }
    }

    Ok(TptctlCommandsTemplate { imports, objects }.render()?)
}

fn render_tptctl_output(target: &Target<'_>, ctx: &RunContext) -> anyhow::Result<String> {
    let Target::Group { group, .. } = *target else {
        return Err(unexpected(target));
    };
    let objects = tptctl_objects(group);

    let mut imports = std_imports(&["fmt", "os", "text/tabwriter"]);
    imports.extend(api_alias_imports(ctx, objects.iter().map(|o| &o.aliases)));

    Ok(TptctlOutputTemplate { imports, objects }.render()?)
}

fn render_controller_main(target: &Target<'_>, ctx: &RunContext) -> anyhow::Result<String> {
    let Target::Group { group, .. } = *target else {
        return Err(unexpected(target));
    };
    let reconcilers = reconciler_views(group)?;
    let stream_alias = reconcilers
        .iter()
        .map(|r| &r.aliases)
        .max_by(|a, b| crate::config::compare_versions(&a.version, &b.version))
        .map(|a| a.api.clone())
        .ok_or_else(|| anyhow!("Group {} has no reconcilers", group.name))?;
    let package = &group.naming.controller_package_name;

    let mut imports = std_imports(&["flag", "fmt", "os"]);
    imports.insert(GoImport::new("nats", "github.com/nats-io/nats.go"));
    imports.insert(GoImport::new(
        "controller",
        ctx.base_import_path(CONTROLLER_LIB_PKG),
    ));
    imports.insert(GoImport::new(
        package.clone(),
        ctx.import_path(&format!("internal/{package}")),
    ));
    imports.extend(api_alias_imports(ctx, reconcilers.iter().map(|r| &r.aliases)));

    Ok(ControllerMainTemplate {
        controller_name: &group.naming.controller_name,
        domain: &group.naming.controller_domain,
        package,
        stream_name: &group.naming.stream_name,
        stream_alias,
        imports,
        reconcilers,
    }
    .render()?)
}

fn render_reconcilers(target: &Target<'_>, ctx: &RunContext) -> anyhow::Result<String> {
    let Target::Group { group, .. } = *target else {
        return Err(unexpected(target));
    };
    let reconcilers = reconciler_views(group)?;

    let mut imports = std_imports(&["fmt"]);
    imports.insert(GoImport::new(
        "controller",
        ctx.base_import_path(CONTROLLER_LIB_PKG),
    ));
    imports.insert(GoImport::new(
        "notifications",
        ctx.base_import_path(NOTIFICATIONS_PKG),
    ));
    imports.extend(api_alias_imports(ctx, reconcilers.iter().map(|r| &r.aliases)));

    Ok(ReconcilersTemplate {
        package: &group.naming.controller_package_name,
        imports,
        reconcilers,
    }
    .render()?)
}

fn render_reconciler_stub(target: &Target<'_>, ctx: &RunContext) -> anyhow::Result<String> {
    let Target::ReconciledObject { group, object, .. } = *target else {
        return Err(unexpected(target));
    };
    let reconciler = reconciler_view(group, object)?;

    let mut imports = BTreeSet::new();
    imports.insert(GoImport::new("logr", "github.com/go-logr/logr"));
    imports.insert(GoImport::new(
        "controller",
        ctx.base_import_path(CONTROLLER_LIB_PKG),
    ));
    imports.extend(api_alias_imports(ctx, std::iter::once(&reconciler.aliases)));

    Ok(ReconcilerStubTemplate {
        package: &group.naming.controller_package_name,
        imports,
        reconciler,
    }
    .render()?)
}

fn render_dockerfile(target: &Target<'_>, _ctx: &RunContext) -> anyhow::Result<String> {
    let Target::Group { model, group } = *target else {
        return Err(unexpected(target));
    };
    Ok(DockerfileTemplate {
        controller_name: &group.naming.controller_name,
        image_repo: &model.image_repo,
    }
    .render()?)
}
