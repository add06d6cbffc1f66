//! Gigvora Access CLI — `gva` command.
//!
//! Validates permission matrices and resolves, checks, and explains
//! authorizations against them from the shell.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::debug;
use serde::Serialize;

use gigvora_access::audit::{explain, AuthorizationSnapshot};
use gigvora_access::config::LOAD_MODE_ENV;
use gigvora_access::query::{query_memberships, query_permissions, MembershipQuery, PermissionQuery};
use gigvora_access::time::micros_to_rfc3339;
use gigvora_access::{
    resolve, AccessConfig, AuthorizationRequest, AuthorizationState, LoadMode, PermissionMatrix,
    PermissionRegistry,
};

// ── CLI structure ─────────────────────────────────────────────────────────────

/// Gigvora Access CLI — inspect the permission matrix and resolve
/// memberships into permissions.
#[derive(Parser, Debug)]
#[command(
    name = "gva",
    about = "Gigvora Access CLI",
    version,
    long_about = "gva — Gigvora Access CLI\n\nValidate permission matrices, list memberships and permissions,\nand resolve, check, or explain an actor's authorization."
)]
struct Cli {
    /// Permission matrix file (default: $GIGVORA_PERMISSION_MATRIX or the embedded matrix)
    #[arg(long, global = true)]
    matrix: Option<PathBuf>,

    /// Drop invalid matrix entries instead of failing (overrides $GIGVORA_PERMISSION_MODE)
    #[arg(long, global = true, conflicts_with = "strict")]
    lenient: bool,

    /// Fail on any matrix issue (overrides $GIGVORA_PERMISSION_MODE)
    #[arg(long, global = true)]
    strict: bool,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Memberships and explicit grants shared by resolving commands.
#[derive(clap::Args, Debug)]
struct ActorArgs {
    /// Membership keys or aliases (comma-separated or repeated)
    #[arg(short, long = "membership", value_delimiter = ',')]
    memberships: Vec<String>,

    /// Explicitly granted permission keys (comma-separated or repeated)
    #[arg(short, long = "grant", value_delimiter = ',')]
    grants: Vec<String>,
}

impl ActorArgs {
    fn request(&self) -> AuthorizationRequest {
        AuthorizationRequest::new()
            .memberships(self.memberships.iter().cloned())
            .grants(self.grants.iter().cloned())
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the permission matrix
    Validate,

    /// List memberships
    Memberships {
        /// Only memberships in this tier
        #[arg(long)]
        tier: Option<String>,

        /// Only memberships that grant this permission
        #[arg(long)]
        granting: Option<String>,
    },

    /// List permissions
    Permissions {
        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        surface: Option<String>,

        /// Key pattern (e.g. wallet:*)
        #[arg(long)]
        pattern: Option<String>,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Resolve an actor's permissions
    Resolve {
        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Check whether an actor holds a permission (exit 1 when denied)
    Check {
        /// Permission key to check
        permission: String,

        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Explain why an actor does or does not hold a permission
    Explain {
        /// Permission key to explain
        permission: String,

        #[command(flatten)]
        actor: ActorArgs,
    },
}

// ── Main entry point ──────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match config_from(&cli) {
        Ok(config) => run(&cli, &config),
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli, config: &AccessConfig) -> Result<()> {
    let json = cli.json;
    let verbose = cli.verbose;

    match &cli.command {
        Commands::Validate => cmd_validate(config, json),
        Commands::Memberships { tier, granting } => {
            let registry = load_registry(config)?;
            let query = MembershipQuery {
                tier: tier.clone(),
                granting: granting.clone(),
            };
            cmd_memberships(&registry, &query, json, verbose)
        }
        Commands::Permissions {
            category,
            surface,
            pattern,
            limit,
        } => {
            let registry = load_registry(config)?;
            let query = PermissionQuery {
                category: category.clone(),
                surface: surface.clone(),
                pattern: pattern.clone(),
                limit: *limit,
                ..Default::default()
            };
            cmd_permissions(&registry, &query, json, verbose)
        }
        Commands::Resolve { actor } => {
            let registry = load_registry(config)?;
            cmd_resolve(&registry, &actor.request(), json, verbose)
        }
        Commands::Check { permission, actor } => {
            let registry = load_registry(config)?;
            cmd_check(&registry, &actor.request(), permission, json)
        }
        Commands::Explain { permission, actor } => {
            let registry = load_registry(config)?;
            cmd_explain(&registry, &actor.request(), permission, json)
        }
    }
}

// ── Configuration helpers ─────────────────────────────────────────────────────

fn config_from(cli: &Cli) -> Result<AccessConfig> {
    let mode_flag = if cli.strict {
        Some(LoadMode::Strict)
    } else if cli.lenient {
        Some(LoadMode::Lenient)
    } else {
        None
    };

    // A mode flag wins, so the environment's mode is not even parsed.
    let mut config = AccessConfig::from_lookup(|name| {
        if mode_flag.is_some() && name == LOAD_MODE_ENV {
            return None;
        }
        std::env::var(name).ok()
    })
    .context("failed to read configuration")?;

    if let Some(path) = &cli.matrix {
        config = config.with_matrix_path(path);
    }
    if let Some(mode) = mode_flag {
        config = config.with_mode(mode);
    }
    debug!(
        "permission matrix {} in {} mode",
        matrix_label(&config),
        config.mode
    );
    Ok(config)
}

fn load_registry(config: &AccessConfig) -> Result<PermissionRegistry> {
    config
        .load_registry()
        .context("failed to load permission registry")
}

fn matrix_label(config: &AccessConfig) -> String {
    config
        .matrix_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<embedded>".to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{out}");
    Ok(())
}

// ── Command implementations ───────────────────────────────────────────────────

/// `gva validate`
fn cmd_validate(config: &AccessConfig, json: bool) -> Result<()> {
    let matrix: PermissionMatrix = config
        .load_matrix()
        .context("failed to load permission matrix")?;
    let report = matrix.validate();
    let fingerprint = matrix.fingerprint()?;

    if json {
        print_json(&serde_json::json!({
            "matrix": matrix_label(config),
            "fingerprint": fingerprint,
            "permissions": matrix.permissions.len(),
            "memberships": matrix.memberships.len(),
            "issues": report.issues,
        }))?;
    } else {
        println!("Matrix: {}", matrix_label(config));
        println!("  Fingerprint: {fingerprint}");
        println!("  Permissions: {}", matrix.permissions.len());
        println!("  Memberships: {}", matrix.memberships.len());
        if report.is_clean() {
            println!("  Issues:      none");
        } else {
            println!("  Issues ({}):", report.issues.len());
            for issue in &report.issues {
                println!("    - {issue}");
            }
        }
    }

    if !report.is_clean() && config.mode == LoadMode::Strict {
        return Err(anyhow!(
            "matrix has {} issue(s); rerun with --lenient to drop them",
            report.issues.len()
        ));
    }

    Ok(())
}

/// `gva memberships [--tier T] [--granting P]`
fn cmd_memberships(
    registry: &PermissionRegistry,
    query: &MembershipQuery,
    json: bool,
    verbose: bool,
) -> Result<()> {
    let memberships = query_memberships(registry, query);

    if json {
        return print_json(&memberships);
    }

    println!("Memberships ({}):", memberships.len());
    if memberships.is_empty() {
        println!("  (none)");
        return Ok(());
    }
    println!("  {:<22} {:<12} {:<24} PERMISSIONS", "KEY", "TIER", "LABEL");
    println!("  {}", "-".repeat(80));
    for membership in memberships {
        let granted = if membership.grant_all {
            "* (grant all)".to_string()
        } else {
            membership.permissions.len().to_string()
        };
        println!(
            "  {:<22} {:<12} {:<24} {}",
            membership.key,
            membership.tier,
            membership.display_label(),
            granted
        );
        if verbose {
            if !membership.aliases.is_empty() {
                let aliases: Vec<&str> = membership.aliases.iter().map(|a| a.as_str()).collect();
                println!("    Aliases: {}", aliases.join(", "));
            }
            for permission in &membership.permissions {
                println!("    - {permission}");
            }
        }
    }

    Ok(())
}

/// `gva permissions [--category C] [--surface S] [--pattern P] [--limit N]`
fn cmd_permissions(
    registry: &PermissionRegistry,
    query: &PermissionQuery,
    json: bool,
    verbose: bool,
) -> Result<()> {
    let permissions = query_permissions(registry, query);

    if json {
        return print_json(&permissions);
    }

    println!("Permissions ({}):", permissions.len());
    if permissions.is_empty() {
        println!("  (none)");
        return Ok(());
    }
    println!("  {:<30} {:<14} LABEL", "KEY", "CATEGORY");
    println!("  {}", "-".repeat(80));
    for permission in permissions {
        println!(
            "  {:<30} {:<14} {}",
            permission.key,
            permission.category,
            permission.display_label()
        );
        if verbose {
            if !permission.implies.is_empty() {
                let implies: Vec<&str> = permission.implies.iter().map(|k| k.as_str()).collect();
                println!("    Implies:    {}", implies.join(", "));
            }
            if !permission.surfaces.is_empty() {
                println!("    Surfaces:   {}", permission.surfaces.join(", "));
            }
            if !permission.escalation_path.is_empty() {
                let path: Vec<&str> = permission
                    .escalation_path
                    .iter()
                    .map(|m| m.as_str())
                    .collect();
                println!("    Escalation: {}", path.join(" → "));
            }
        }
    }

    Ok(())
}

/// `gva resolve -m KEY[,KEY] [-g PERM[,PERM]]`
fn cmd_resolve(
    registry: &PermissionRegistry,
    request: &AuthorizationRequest,
    json: bool,
    verbose: bool,
) -> Result<()> {
    let state = resolve(registry, request);

    if json {
        let snapshot = AuthorizationSnapshot::capture(&state);
        println!("{}", snapshot.to_json_pretty()?);
        return Ok(());
    }

    print_unknown(&state);

    let memberships: Vec<&str> = state.memberships.iter().map(|m| m.as_str()).collect();
    println!(
        "Memberships: {}",
        if memberships.is_empty() {
            "(none)".to_string()
        } else {
            memberships.join(", ")
        }
    );
    if state.grant_all {
        println!("Grant all:   yes");
    }
    println!("Permissions ({}):", state.permissions.len());
    for (key, sources) in &state.sources {
        let sources: Vec<String> = sources.iter().map(ToString::to_string).collect();
        println!("  {:<30} via {}", key.as_str(), sources.join(", "));
    }

    if verbose {
        println!();
        println!("Fingerprint: {}", state.fingerprint);
        println!("Resolved:    {}", micros_to_rfc3339(state.resolved_at));
    }

    Ok(())
}

/// `gva check PERMISSION -m … [-g …]`
fn cmd_check(
    registry: &PermissionRegistry,
    request: &AuthorizationRequest,
    permission: &str,
    json: bool,
) -> Result<()> {
    let state = resolve(registry, request);
    let allowed = state.has_permission(permission);

    if json {
        print_json(&serde_json::json!({
            "permission": permission,
            "allowed": allowed,
            "known": registry.contains_permission(permission),
        }))?;
    } else {
        print_unknown(&state);
        println!("{permission}: {}", if allowed { "allowed" } else { "denied" });
    }

    state.require(permission)?;
    Ok(())
}

/// `gva explain PERMISSION -m … [-g …]`
fn cmd_explain(
    registry: &PermissionRegistry,
    request: &AuthorizationRequest,
    permission: &str,
    json: bool,
) -> Result<()> {
    let state = resolve(registry, request);
    let explanation = explain(registry, &state, permission)
        .ok_or_else(|| anyhow!("unknown permission '{permission}'"))?;

    if json {
        return print_json(&explanation);
    }

    print_unknown(&state);
    println!("Permission: {} ({})", explanation.permission, explanation.label);
    println!(
        "  Granted:  {}{}",
        if explanation.granted { "yes" } else { "no" },
        if explanation.via_grant_all {
            " (grant all)"
        } else {
            ""
        }
    );
    if !explanation.sources.is_empty() {
        let sources: Vec<String> = explanation.sources.iter().map(ToString::to_string).collect();
        println!("  Sources:  {}", sources.join(", "));
    }
    if !explanation.implied_by.is_empty() {
        let parents: Vec<&str> = explanation.implied_by.iter().map(|k| k.as_str()).collect();
        println!("  Implied by: {}", parents.join(", "));
    }
    if !explanation.escalation_path.is_empty() {
        let path: Vec<&str> = explanation
            .escalation_path
            .iter()
            .map(|m| m.as_str())
            .collect();
        println!("  Escalation path: {}", path.join(" → "));
    }
    if !explanation.escalation_candidates.is_empty() {
        let candidates: Vec<&str> = explanation
            .escalation_candidates
            .iter()
            .map(|m| m.as_str())
            .collect();
        println!("  Request from: {}", candidates.join(", "));
    }

    Ok(())
}

fn print_unknown(state: &AuthorizationState) {
    for key in &state.unknown_memberships {
        eprintln!("warning: unknown membership '{key}' ignored");
    }
    for key in &state.unknown_permissions {
        eprintln!("warning: unknown permission '{key}' ignored");
    }
}
