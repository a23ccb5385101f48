//! Strata Cloud Manager CLI binary.
//!
//! A command-line interface for browsing and deleting SCM configuration
//! objects.

use clap::Parser;
use scmapi::cli::{Cli, Command, ResourceKind};
use scmapi::{
    AddressGroupResponse, AddressResponse, ContainerQuery, ListOptions, PrettyPrint, Resource,
    ResourceService, ResponseModel, ScmClient, SecurityRuleResponse, SecurityZoneResponse,
    ServiceResponse, TagResponse,
};
use serde::Serialize;
use std::process::ExitCode;
use tabled::{Table, Tabled};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Run `$body` with `$svc` bound to the service for `$kind`.
macro_rules! with_service {
    ($client:expr, $kind:expr, $rulebase:expr, $svc:ident => $body:expr) => {
        match $kind {
            ResourceKind::Address => {
                let $svc = $client.addresses();
                $body
            }
            ResourceKind::AddressGroup => {
                let $svc = $client.address_groups();
                $body
            }
            ResourceKind::Tag => {
                let $svc = $client.tags();
                $body
            }
            ResourceKind::Service => {
                let $svc = $client.services();
                $body
            }
            ResourceKind::SecurityZone => {
                let $svc = $client.security_zones();
                $body
            }
            ResourceKind::SecurityRule => {
                let $svc = $client.security_rules($rulebase.into());
                $body
            }
        }
    };
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let client = match ScmClient::from_env().await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!(
                "Hint: Set SCM_CLIENT_ID, SCM_CLIENT_SECRET and SCM_TSG_ID environment variables"
            );
            return ExitCode::FAILURE;
        }
    };

    match run(&client, cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(client: &ScmClient, cli: Cli) -> scmapi::Result<()> {
    let json = cli.json;
    match cli.command {
        Command::List {
            resource,
            container,
            exact_match,
            max_limit,
            rulebase,
        } => {
            let container = ContainerQuery::from(container);
            with_service!(client, resource, rulebase, svc => {
                handle_list(svc, container, exact_match, max_limit, json).await
            })
        }
        Command::Get {
            resource,
            id,
            rulebase,
        } => with_service!(client, resource, rulebase, svc => handle_get(svc, id, json).await),
        Command::Fetch {
            resource,
            name,
            container,
            rulebase,
        } => {
            let container = ContainerQuery::from(container);
            with_service!(client, resource, rulebase, svc => {
                handle_fetch(svc, &name, &container, json).await
            })
        }
        Command::Delete {
            resource,
            id,
            rulebase,
        } => with_service!(client, resource, rulebase, svc => {
            svc.delete(id).await?;
            if json {
                println!("{}", serde_json::json!({ "deleted": id }));
            } else {
                println!("Deleted {}", id);
            }
            Ok(())
        }),
    }
}

async fn handle_list<R>(
    service: ResourceService<R>,
    container: ContainerQuery,
    exact_match: bool,
    max_limit: Option<i64>,
    json: bool,
) -> scmapi::Result<()>
where
    R: Resource,
    R::Response: Summary,
{
    let service = service.with_max_limit(max_limit)?;
    let mut options = ListOptions::new(container);
    options.exact_match = exact_match;

    let items = service.list(&options).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        let rows: Vec<ObjectRow> = items.iter().map(ObjectRow::from_item).collect();
        println!("{}", Table::new(rows));
        println!("\n{} {} object(s)", items.len(), R::NAME);
    }
    Ok(())
}

async fn handle_get<R>(service: ResourceService<R>, id: Uuid, json: bool) -> scmapi::Result<()>
where
    R: Resource,
    R::Response: PrettyPrint,
{
    let item = service.get(id).await?;
    output_single(&item, json)
}

async fn handle_fetch<R>(
    service: ResourceService<R>,
    name: &str,
    container: &ContainerQuery,
    json: bool,
) -> scmapi::Result<()>
where
    R: Resource,
    R::Response: PrettyPrint,
{
    let item = service.fetch(name, container).await?;
    output_single(&item, json)
}

fn output_single<T: Serialize + PrettyPrint>(item: &T, json: bool) -> scmapi::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(item)?);
    } else {
        println!("{}", item.pretty_print());
    }
    Ok(())
}

// Table row types for non-JSON output

/// One-line description of an object for table output.
trait Summary: ResponseModel + PrettyPrint {
    fn summary(&self) -> String;
}

impl Summary for AddressResponse {
    fn summary(&self) -> String {
        self.address_type()
            .map(|(kind, value)| format!("{} {}", kind.field(), value))
            .unwrap_or_default()
    }
}

impl Summary for AddressGroupResponse {
    fn summary(&self) -> String {
        match (&self.static_members, &self.dynamic) {
            (Some(members), _) => format!("static ({} members)", members.len()),
            (None, Some(dynamic)) => format!("dynamic {}", dynamic.filter),
            (None, None) => String::new(),
        }
    }
}

impl Summary for TagResponse {
    fn summary(&self) -> String {
        self.color.clone().unwrap_or_default()
    }
}

impl Summary for ServiceResponse {
    fn summary(&self) -> String {
        match (self.protocol.name(), self.protocol.port()) {
            (Some(protocol), Some(port)) => format!("{protocol}/{port}"),
            _ => String::new(),
        }
    }
}

impl Summary for SecurityZoneResponse {
    fn summary(&self) -> String {
        self.network
            .as_ref()
            .and_then(|n| n.mode())
            .unwrap_or_default()
            .to_string()
    }
}

impl Summary for SecurityRuleResponse {
    fn summary(&self) -> String {
        let action = self
            .action
            .and_then(|a| serde_json::to_value(a).ok())
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        if self.disabled {
            format!("{action} (disabled)")
        } else {
            action
        }
    }
}

#[derive(Tabled)]
struct ObjectRow {
    id: String,
    name: String,
    container: String,
    summary: String,
}

impl ObjectRow {
    fn from_item<T: Summary>(item: &T) -> Self {
        Self {
            id: item.id().to_string(),
            name: item.name().to_string(),
            container: item
                .container()
                .first()
                .map(|(kind, name)| format!("{kind}:{name}"))
                .unwrap_or_default(),
            summary: item.summary(),
        }
    }
}
