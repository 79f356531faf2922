mod flags;
mod repl;

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use triplestore::config::Config;
use triplestore::{PrefixMapping, TripleStore};

use crate::flags::{Triplestore, TriplestoreCmd};
use crate::repl::Command;

/// Applies `--data` and `--prefix name=iri` on top of the loaded config.
fn apply_flags(
    config: &mut Config,
    data: Option<PathBuf>,
    prefixes: &[String],
) -> Result<PrefixMapping> {
    if let Some(data) = data {
        config.store.path = data;
    }
    let mut mapping = config.prefix_mapping();
    for binding in prefixes {
        let (prefix, iri) = binding
            .split_once('=')
            .with_context(|| format!("prefix binding {binding:?} should be name=iri"))?;
        mapping.set_mapping(prefix, iri);
    }
    Ok(mapping)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();

    let flags = Triplestore::from_env_or_exit();

    let mut config = match &flags.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let mapping = apply_flags(&mut config, flags.data, &flags.prefix)?;

    let store = config.open_store()?;
    debug!(target: "lifecycle", path = %config.store.path.display(), "opened store");
    let mut st = TripleStore::with_mapping(store, mapping);

    let command = match flags.subcommand {
        TriplestoreCmd::Repl(_) => {
            return repl::run(&mut st, io::stdin().lock(), io::stdout().lock());
        }
        TriplestoreCmd::Push(cmd) => Command::Push {
            subject: cmd.subject,
            property: cmd.property,
            object: cmd.object,
        },
        TriplestoreCmd::Remove(cmd) => Command::Remove {
            subject: cmd.subject,
            property: cmd.property,
        },
        TriplestoreCmd::Subjects(cmd) => Command::Subjects {
            property: cmd.property,
            value: cmd.value,
        },
        TriplestoreCmd::Properties(cmd) => Command::Properties {
            subject: cmd.subject,
        },
        TriplestoreCmd::Values(cmd) => Command::Values {
            subject: cmd.subject,
            property: cmd.property,
        },
        TriplestoreCmd::Show(_) => Command::Show,
        TriplestoreCmd::Dump(_) => Command::Dump,
    };
    repl::execute(&mut st, command, &mut io::stdout().lock())
}
