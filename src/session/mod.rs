//! One authenticated SSH invocation, end to end.
//!
//! The SSH transport stays outside the process: sshd authenticates the key
//! and a ForceCommand entry invokes the binary with the caller's key line,
//! leaving the client command in `SSH_ORIGINAL_COMMAND`. [`dispatch`] is the
//! whole session: ban check, command parse, user upsert, one store call,
//! rendered response.

mod commands;
mod render;

pub use commands::{PrCommands, PsCommands, RepoCommands, SessionCli, SessionCommand};
pub use render::{EventRow, PrRow};

use std::io::{Read, Write};

use clap::Parser;

use crate::acl::{self, Actor};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::rangediff::{self, DiffCommit};
use crate::store::{PatchsetOp, Store};
use crate::types::{PatchRequest, Repo, Status};

pub fn dispatch(
    store: &dyn Store,
    config: &Config,
    pubkey: &str,
    ip: Option<&str>,
    command: &str,
    stdin: &mut dyn Read,
    stdout: &mut dyn Write,
) -> Result<()> {
    let fingerprint = acl::canonicalize_pubkey(pubkey)?;
    if store.is_banned(&fingerprint, ip)? {
        return Err(Error::Unauthorized);
    }

    let cli = SessionCli::try_parse_from(command.split_whitespace())
        .map_err(|e| Error::BadRequest(e.to_string()))?;

    let user = store.upsert_user(&fingerprint, &acl::suggest_name(pubkey))?;
    let actor = Actor::new(user, acl::is_admin(&config.admins, &fingerprint));
    tracing::info!(user = %actor.user.name, admin = actor.is_admin, command, "session");

    match cli.command {
        SessionCommand::Logs { pr, repo } => logs(store, config, &actor, pr, repo, stdout),
        SessionCommand::Repo { command } => match command {
            RepoCommands::Create { name, description } => {
                repo_create(store, config, &actor, &name, description.as_deref(), stdout)
            }
        },
        SessionCommand::Pr { command } => match command {
            PrCommands::Ls { repo } => pr_ls(store, config, &actor, repo, stdout),
            PrCommands::Create { repo } => pr_create(store, config, &actor, &repo, stdin, stdout),
            PrCommands::Print { pr_id } => pr_print(store, pr_id, stdout),
            PrCommands::Summary { pr_id } => pr_summary(store, config, pr_id, stdout),
            PrCommands::Diff { pr_id } => pr_diff(store, pr_id, stdout),
            PrCommands::Accept { pr_id } => {
                pr_set_status(store, &actor, pr_id, Status::Accepted, stdout)
            }
            PrCommands::Close { pr_id } => {
                pr_set_status(store, &actor, pr_id, Status::Closed, stdout)
            }
            PrCommands::Reopen { pr_id } => {
                pr_set_status(store, &actor, pr_id, Status::Open, stdout)
            }
            PrCommands::Edit { pr_id, title } => {
                pr_edit(store, &actor, pr_id, &title.join(" "), stdout)
            }
            PrCommands::Add {
                pr_id,
                review,
                replace,
                accept,
                close,
            } => pr_add(store, &actor, pr_id, review, replace, accept, close, stdin, stdout),
        },
        SessionCommand::Ps { command } => match command {
            PsCommands::Rm { patchset_id } => ps_rm(store, &actor, patchset_id, stdout),
        },
    }
}

fn load_pr(store: &dyn Store, pr_id: i64) -> Result<(PatchRequest, Repo)> {
    let pr = store.get_patch_request_by_id(pr_id)?.ok_or(Error::NotFound)?;
    let repo = store.get_repo_by_id(pr.repo_id)?.ok_or(Error::NotFound)?;
    Ok((pr, repo))
}

fn user_name(store: &dyn Store, user_id: i64) -> Result<String> {
    Ok(store
        .get_user_by_id(user_id)?
        .map(|u| u.name)
        .unwrap_or_else(|| format!("user#{user_id}")))
}

/// Resolves an `owner/name` spec; a bare name means the actor's namespace.
fn resolve_repo(store: &dyn Store, actor: &Actor, spec: &str) -> Result<Repo> {
    let (owner_id, name) = match spec.split_once('/') {
        Some((owner, name)) => {
            let owner = store.get_user_by_name(owner)?.ok_or(Error::NotFound)?;
            (owner.id, name)
        }
        None => (actor.user.id, spec),
    };
    store
        .get_repo_by_owner_and_name(owner_id, name)?
        .ok_or(Error::NotFound)
}

fn pr_row(store: &dyn Store, pr: PatchRequest, repo: &Repo) -> Result<PrRow> {
    let owner = user_name(store, repo.user_id)?;
    let submitter = user_name(store, pr.user_id)?;
    Ok(PrRow {
        pr,
        repo: format!("{owner}/{}", repo.name),
        submitter,
    })
}

fn logs(
    store: &dyn Store,
    config: &Config,
    actor: &Actor,
    pr: Option<i64>,
    repo: Option<String>,
    stdout: &mut dyn Write,
) -> Result<()> {
    let events = if let Some(pr_id) = pr {
        store.get_events_by_pr(pr_id)?
    } else if let Some(spec) = repo {
        let repo = resolve_repo(store, actor, &spec)?;
        store.get_events_by_repo(repo.id)?
    } else if actor.is_admin {
        store.get_events()?
    } else {
        store.get_events_by_user(actor.user.id)?
    };

    let rows = events
        .into_iter()
        .map(|event| {
            Ok(EventRow {
                user: user_name(store, event.user_id)?,
                event,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    render::write_events(stdout, config, &rows)
}

fn repo_create(
    store: &dyn Store,
    config: &Config,
    actor: &Actor,
    name: &str,
    description: Option<&str>,
    stdout: &mut dyn Write,
) -> Result<()> {
    if !actor.can_create_repo(config.create_repo) {
        return Err(Error::Unauthorized);
    }
    let repo = store.create_repo(actor.user.id, name, description)?;
    writeln!(stdout, "created repo {}/{}", actor.user.name, repo.name)?;
    Ok(())
}

fn pr_ls(
    store: &dyn Store,
    config: &Config,
    actor: &Actor,
    repo: Option<String>,
    stdout: &mut dyn Write,
) -> Result<()> {
    let prs = match repo {
        Some(spec) => {
            let repo = resolve_repo(store, actor, &spec)?;
            store.get_patch_requests_by_repo(repo.id)?
        }
        None => store.get_patch_requests()?,
    };

    let mut rows = Vec::with_capacity(prs.len());
    for pr in prs {
        let repo = store.get_repo_by_id(pr.repo_id)?.ok_or(Error::NotFound)?;
        rows.push(pr_row(store, pr, &repo)?);
    }
    render::write_pr_list(stdout, config, &rows)
}

fn pr_create(
    store: &dyn Store,
    config: &Config,
    actor: &Actor,
    spec: &str,
    stdin: &mut dyn Read,
    stdout: &mut dyn Write,
) -> Result<()> {
    let repo = match resolve_repo(store, actor, spec) {
        Ok(repo) => repo,
        // A missing repo in the actor's own namespace is created on the fly
        // when policy allows; anything else stays not-found.
        Err(Error::NotFound) => {
            let (owner, name) = spec.split_once('/').unwrap_or((actor.user.name.as_str(), spec));
            if owner != actor.user.name || !actor.can_create_repo(config.create_repo) {
                return Err(Error::NotFound);
            }
            store.create_repo(actor.user.id, name, None)?
        }
        Err(e) => return Err(e),
    };

    let mut stream = String::new();
    stdin.read_to_string(&mut stream)?;
    let pr = store.submit_patch_request(repo.id, actor.user.id, &stream)?;
    writeln!(stdout, "created pr #{}: {}", pr.id, pr.name)?;
    Ok(())
}

fn pr_print(store: &dyn Store, pr_id: i64, stdout: &mut dyn Write) -> Result<()> {
    let (pr, _) = load_pr(store, pr_id)?;
    let patchset = store
        .get_patchsets_by_pr(pr.id)?
        .into_iter()
        .last()
        .ok_or(Error::NotFound)?;
    let patches = store.get_patches_by_patchset(patchset.id)?;
    render::write_raw(stdout, &patches)
}

fn pr_summary(
    store: &dyn Store,
    config: &Config,
    pr_id: i64,
    stdout: &mut dyn Write,
) -> Result<()> {
    let (pr, repo) = load_pr(store, pr_id)?;
    let row = pr_row(store, pr, &repo)?;

    let mut patchsets = Vec::new();
    for patchset in store.get_patchsets_by_pr(pr_id)? {
        let patches = store.get_patches_by_patchset(patchset.id)?;
        patchsets.push((patchset, patches));
    }
    render::write_summary(stdout, config, &row, &patchsets)
}

fn pr_diff(store: &dyn Store, pr_id: i64, stdout: &mut dyn Write) -> Result<()> {
    let (pr, _) = load_pr(store, pr_id)?;
    let patchsets = store.get_patchsets_by_pr(pr.id)?;

    let commits = |patchset_id: i64| -> Result<Vec<DiffCommit>> {
        store
            .get_patches_by_patchset(patchset_id)?
            .iter()
            .map(DiffCommit::from_patch)
            .collect()
    };

    let (old, new) = match patchsets.as_slice() {
        [] => return Err(Error::NotFound),
        [only] => (Vec::new(), commits(only.id)?),
        [.., prev, last] => (commits(prev.id)?, commits(last.id)?),
    };

    let entries = rangediff::range_diff(&old, &new);
    render::write_range_diff(stdout, &entries)
}

fn pr_set_status(
    store: &dyn Store,
    actor: &Actor,
    pr_id: i64,
    status: Status,
    stdout: &mut dyn Write,
) -> Result<()> {
    let (pr, repo) = load_pr(store, pr_id)?;
    let allowed = match status {
        Status::Accepted => actor.can_review(&pr, &repo),
        _ => actor.can_modify(&pr, &repo),
    };
    if !allowed {
        return Err(Error::Unauthorized);
    }
    store.update_patch_request_status(pr_id, actor.user.id, status)?;
    writeln!(stdout, "pr #{pr_id} is now {status}")?;
    Ok(())
}

fn pr_edit(
    store: &dyn Store,
    actor: &Actor,
    pr_id: i64,
    title: &str,
    stdout: &mut dyn Write,
) -> Result<()> {
    let (pr, repo) = load_pr(store, pr_id)?;
    if !actor.can_modify(&pr, &repo) {
        return Err(Error::Unauthorized);
    }
    store.update_patch_request_name(pr_id, actor.user.id, title)?;
    writeln!(stdout, "pr #{pr_id} renamed to: {title}")?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn pr_add(
    store: &dyn Store,
    actor: &Actor,
    pr_id: i64,
    review: bool,
    replace: bool,
    accept: bool,
    close: bool,
    stdin: &mut dyn Read,
    stdout: &mut dyn Write,
) -> Result<()> {
    let (pr, repo) = load_pr(store, pr_id)?;

    let op = if review {
        PatchsetOp::Review
    } else if replace {
        PatchsetOp::Replace
    } else {
        PatchsetOp::Normal
    };
    let allowed = match op {
        PatchsetOp::Review => actor.can_review(&pr, &repo),
        _ => actor.can_add_patchset(&pr, &repo),
    };
    if !allowed {
        return Err(Error::Unauthorized);
    }
    if accept && !actor.can_review(&pr, &repo) {
        return Err(Error::Unauthorized);
    }
    if close && !actor.can_modify(&pr, &repo) {
        return Err(Error::Unauthorized);
    }

    let mut stream = String::new();
    stdin.read_to_string(&mut stream)?;
    let inserted = store.submit_patchset(pr_id, actor.user.id, op, &stream)?;
    if inserted.is_empty() {
        writeln!(stdout, "pr #{pr_id} already contains these patches")?;
    } else {
        writeln!(stdout, "added patchset to pr #{pr_id} ({} patches)", inserted.len())?;
    }

    if accept {
        store.update_patch_request_status(pr_id, actor.user.id, Status::Accepted)?;
        writeln!(stdout, "pr #{pr_id} is now accepted")?;
    } else if close {
        store.update_patch_request_status(pr_id, actor.user.id, Status::Closed)?;
        writeln!(stdout, "pr #{pr_id} is now closed")?;
    }
    Ok(())
}

fn ps_rm(store: &dyn Store, actor: &Actor, patchset_id: i64, stdout: &mut dyn Write) -> Result<()> {
    let patchset = store
        .get_patchset_by_id(patchset_id)?
        .ok_or(Error::NotFound)?;
    if !actor.can_delete_patchset(&patchset) {
        return Err(Error::Unauthorized);
    }
    store.delete_patchset(actor.user.id, patchset.patch_request_id, patchset.id)?;
    writeln!(stdout, "deleted patchset {patchset_id}")?;
    Ok(())
}
