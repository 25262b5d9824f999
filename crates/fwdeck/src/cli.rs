//! Clap derive structures for the `fwdeck` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use fwdeck_core::{Action, Chain, NatType, Policy, Protocol};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// fwdeck -- control deck for a Linux firewall/NAT service
#[derive(Debug, Parser)]
#[command(
    name = "fwdeck",
    version,
    about = "Manage firewall rules, NAT, zones and interfaces from the command line",
    long_about = "Edit the stored ruleset of a firewall control plane, reorder it,\n\
        then apply it to the kernel atomically or roll back to the last snapshot.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Profile to use
    #[arg(long, short = 'p', env = "FWDECK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Control-plane URL (overrides profile)
    #[arg(long, short = 'u', env = "FWDECK_URL", global = true)]
    pub url: Option<String>,

    /// API key (overrides profile)
    #[arg(long, env = "FWDECK_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Config file path
    #[arg(long, env = "FWDECK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FWDECK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "FWDECK_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "FWDECK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage packet-filter rules
    #[command(alias = "r")]
    Rules(RulesArgs),

    /// Manage NAT rules
    Nat(NatArgs),

    /// Manage zones
    #[command(alias = "z")]
    Zones(ZonesArgs),

    /// Manage interface-to-zone assignments
    #[command(alias = "if")]
    Interfaces(InterfacesArgs),

    /// Show or change global forwarding / NAT settings
    Settings(SettingsArgs),

    /// Show per-rule packet and byte counters
    Counters,

    /// Apply the stored ruleset to the kernel
    Apply,

    /// Restore the last-known-good ruleset
    Rollback,

    /// Check that the control plane is reachable
    Health,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Ordering (shared by rules and NAT) ───────────────────────────────

/// Where to move an entry in its ordering domain.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct MoveTarget {
    /// Zero-based position to move to
    #[arg(long)]
    pub to: Option<usize>,

    /// Take the slot of this entry
    #[arg(long)]
    pub onto: Option<String>,
}

// ── Rules ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub command: RulesCommand,
}

#[derive(Debug, Subcommand)]
pub enum RulesCommand {
    /// List rules in evaluation order
    #[command(alias = "ls")]
    List {
        /// Only rules on this chain
        #[arg(long)]
        chain: Option<Chain>,
    },

    /// Show one rule
    Get { id: String },

    /// Create a rule at the end of the order
    Create {
        #[command(flatten)]
        fields: RuleFields,

        /// Create from JSON file (overrides individual flags)
        #[arg(long, short = 'F')]
        from_file: Option<PathBuf>,
    },

    /// Update fields of an existing rule
    Update {
        id: String,

        #[command(flatten)]
        fields: RuleFields,

        /// Load the update payload from JSON file
        #[arg(long, short = 'F')]
        from_file: Option<PathBuf>,
    },

    /// Enable a rule
    Enable { id: String },

    /// Disable a rule
    Disable { id: String },

    /// Delete a rule
    #[command(alias = "rm")]
    Delete { id: String },

    /// Move a rule and write the new order back
    #[command(alias = "mv")]
    Move {
        id: String,

        #[command(flatten)]
        target: MoveTarget,
    },
}

#[derive(Debug, Default, Args)]
pub struct RuleFields {
    /// INPUT, OUTPUT or FORWARD
    #[arg(long)]
    pub chain: Option<Chain>,

    /// tcp, udp, icmp or all
    #[arg(long)]
    pub protocol: Option<Protocol>,

    /// Source address or CIDR
    #[arg(long)]
    pub src: Option<String>,

    /// Destination address or CIDR
    #[arg(long)]
    pub dst: Option<String>,

    /// Source port or range
    #[arg(long)]
    pub src_port: Option<String>,

    /// Destination port or range
    #[arg(long)]
    pub dst_port: Option<String>,

    /// ACCEPT, DROP, REJECT or LOG
    #[arg(long)]
    pub action: Option<Action>,

    /// Enable/disable the rule
    #[arg(long, action = clap::ArgAction::Set)]
    pub enabled: Option<bool>,

    /// Free-form comment (max 128 characters)
    #[arg(long)]
    pub comment: Option<String>,
}

// ── NAT ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct NatArgs {
    #[command(subcommand)]
    pub command: NatCommand,
}

#[derive(Debug, Subcommand)]
pub enum NatCommand {
    /// List NAT rules in evaluation order
    #[command(alias = "ls")]
    List,

    /// Show one NAT rule
    Get { id: String },

    /// Create a NAT rule at the end of the order
    Create {
        #[command(flatten)]
        fields: NatFields,

        #[arg(long, short = 'F')]
        from_file: Option<PathBuf>,
    },

    /// Update fields of an existing NAT rule
    Update {
        id: String,

        #[command(flatten)]
        fields: NatFields,

        #[arg(long, short = 'F')]
        from_file: Option<PathBuf>,
    },

    /// Enable a NAT rule
    Enable { id: String },

    /// Disable a NAT rule
    Disable { id: String },

    /// Delete a NAT rule
    #[command(alias = "rm")]
    Delete { id: String },

    /// Move a NAT rule and write the new order back
    #[command(alias = "mv")]
    Move {
        id: String,

        #[command(flatten)]
        target: MoveTarget,
    },
}

#[derive(Debug, Default, Args)]
pub struct NatFields {
    /// Rule name
    #[arg(long)]
    pub name: Option<String>,

    /// SNAT or DNAT
    #[arg(long = "type")]
    pub nat_type: Option<NatType>,

    /// tcp, udp, icmp or all
    #[arg(long)]
    pub protocol: Option<Protocol>,

    /// Inbound interface
    #[arg(long)]
    pub in_interface: Option<String>,

    /// Outbound interface
    #[arg(long)]
    pub out_interface: Option<String>,

    #[arg(long)]
    pub source_ip: Option<String>,

    #[arg(long)]
    pub source_port: Option<String>,

    #[arg(long)]
    pub dest_ip: Option<String>,

    #[arg(long)]
    pub dest_port: Option<String>,

    /// Translated address
    #[arg(long = "to-ip")]
    pub natto_ip: Option<String>,

    /// Translated port
    #[arg(long = "to-port")]
    pub natto_port: Option<String>,

    #[arg(long)]
    pub comment: Option<String>,

    #[arg(long, action = clap::ArgAction::Set)]
    pub enabled: Option<bool>,
}

// ── Zones ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ZonesArgs {
    #[command(subcommand)]
    pub command: ZonesCommand,
}

#[derive(Debug, Subcommand)]
pub enum ZonesCommand {
    /// List zones
    #[command(alias = "ls")]
    List,

    /// Show one zone
    Get { id: String },

    /// Create a zone
    Create {
        name: String,

        #[arg(long)]
        description: Option<String>,

        /// Zone target (default REJECT)
        #[arg(long)]
        target: Option<Policy>,

        /// Inbound default policy (default REJECT)
        #[arg(long = "in")]
        in_policy: Option<Policy>,

        /// Outbound default policy (default ACCEPT)
        #[arg(long = "out")]
        out_policy: Option<Policy>,
    },

    /// Update a zone
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        target: Option<Policy>,

        #[arg(long = "in")]
        in_policy: Option<Policy>,

        #[arg(long = "out")]
        out_policy: Option<Policy>,
    },

    /// Delete a zone
    #[command(alias = "rm")]
    Delete { id: String },
}

// ── Interfaces ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct InterfacesArgs {
    #[command(subcommand)]
    pub command: InterfacesCommand,
}

#[derive(Debug, Subcommand)]
pub enum InterfacesCommand {
    /// List interface assignments
    #[command(alias = "ls")]
    List,

    /// Show one interface
    Get { id: String },

    /// Assign an interface to a zone
    Create {
        /// Kernel interface name (e.g. eth0)
        name: String,

        /// Zone name (default "public")
        #[arg(long)]
        zone: Option<String>,

        #[arg(long, action = clap::ArgAction::Set)]
        enabled: Option<bool>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Update an interface assignment
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        zone: Option<String>,

        #[arg(long, action = clap::ArgAction::Set)]
        enabled: Option<bool>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Remove an interface assignment
    #[command(alias = "rm")]
    Delete { id: String },
}

// ── Settings ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Show global settings
    Show,

    /// Change global settings
    #[command(group(
        clap::ArgGroup::new("flags").required(true).multiple(true)
    ))]
    Set {
        /// Kernel IP forwarding
        #[arg(long, group = "flags", action = clap::ArgAction::Set)]
        ip_forwarding: Option<bool>,

        /// NAT processing
        #[arg(long, group = "flags", action = clap::ArgAction::Set)]
        nat: Option<bool>,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (url, api_key, api_key_env, insecure, timeout, ca_cert, reorder)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
