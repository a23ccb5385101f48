//! CLI argument parsing types.
//!
//! This module provides the command-line interface structure for the scm binary.

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::container::ContainerQuery;
use crate::models::Rulebase;

/// Strata Cloud Manager command-line interface.
#[derive(Parser, Debug)]
#[command(name = "scm", about = "Strata Cloud Manager configuration CLI", version)]
pub struct Cli {
    /// Output results as JSON instead of a table.
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every object of a type in a container.
    List {
        /// The type of object to list.
        resource: ResourceKind,

        #[command(flatten)]
        container: ContainerArgs,

        /// Only objects defined directly in the container.
        #[arg(long)]
        exact_match: bool,

        /// Page size used while collecting results.
        #[arg(long)]
        max_limit: Option<i64>,

        /// Rulebase for security rules.
        #[arg(long, value_enum, default_value = "pre")]
        rulebase: RulebaseArg,
    },

    /// Get a single object by id.
    Get {
        /// The type of object to get.
        resource: ResourceKind,

        /// Object id.
        id: uuid::Uuid,

        /// Rulebase for security rules.
        #[arg(long, value_enum, default_value = "pre")]
        rulebase: RulebaseArg,
    },

    /// Fetch a single object by name within a container.
    Fetch {
        /// The type of object to fetch.
        resource: ResourceKind,

        /// Object name.
        name: String,

        #[command(flatten)]
        container: ContainerArgs,

        /// Rulebase for security rules.
        #[arg(long, value_enum, default_value = "pre")]
        rulebase: RulebaseArg,
    },

    /// Delete an object by id.
    Delete {
        /// The type of object to delete.
        resource: ResourceKind,

        /// Object id.
        id: uuid::Uuid,

        /// Rulebase for security rules.
        #[arg(long, value_enum, default_value = "pre")]
        rulebase: RulebaseArg,
    },
}

/// Exactly one of `--folder`, `--snippet` or `--device`.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct ContainerArgs {
    #[arg(long)]
    pub folder: Option<String>,

    #[arg(long)]
    pub snippet: Option<String>,

    #[arg(long)]
    pub device: Option<String>,
}

impl From<ContainerArgs> for ContainerQuery {
    fn from(args: ContainerArgs) -> Self {
        Self {
            folder: args.folder,
            snippet: args.snippet,
            device: args.device,
        }
    }
}

/// Object types that can be operated on.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    /// Address objects.
    #[value(alias = "addresses")]
    Address,
    /// Address groups.
    #[value(alias = "address-groups")]
    AddressGroup,
    /// Tags.
    #[value(alias = "tags")]
    Tag,
    /// Service objects.
    #[value(alias = "services")]
    Service,
    /// Security zones.
    #[value(alias = "zones", alias = "security-zones")]
    SecurityZone,
    /// Security rules.
    #[value(alias = "rules", alias = "security-rules")]
    SecurityRule,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RulebaseArg {
    Pre,
    Post,
}

impl From<RulebaseArg> for Rulebase {
    fn from(arg: RulebaseArg) -> Self {
        match arg {
            RulebaseArg::Pre => Rulebase::Pre,
            RulebaseArg::Post => Rulebase::Post,
        }
    }
}
