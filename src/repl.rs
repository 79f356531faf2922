use std::io::{BufRead, Write};
use std::str::FromStr;

use anyhow::{Context, Error, Result, bail};
use tracing::warn;
use triplestore::{KvStore, TripleStore};

const USAGE: &str = "commands: push S P O | remove S P | subjects P V | properties S | values S P \
                     | prefix NAME IRI | show | dump | quit (use - for an absent argument)";

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Push {
        subject: String,
        property: String,
        object: String,
    },
    Remove {
        subject: Option<String>,
        property: Option<String>,
    },
    Subjects {
        property: Option<String>,
        value: Option<String>,
    },
    Properties {
        subject: Option<String>,
    },
    Values {
        subject: Option<String>,
        property: Option<String>,
    },
    Prefix {
        prefix: String,
        iri: String,
    },
    Show,
    Dump,
    Help,
    Quit,
}

/// Splits off the first whitespace delimited word.
fn next_word(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_start();
    if line.is_empty() {
        return None;
    }
    Some(line.split_once(char::is_whitespace).unwrap_or((line, "")))
}

fn optional(word: Option<&str>) -> Option<String> {
    word.filter(|word| *word != "-").map(str::to_owned)
}

struct Words<'a>(&'a str);

impl<'a> Words<'a> {
    fn next(&mut self) -> Option<&'a str> {
        let (word, rest) = next_word(self.0)?;
        self.0 = rest;
        Some(word)
    }
    fn required(&mut self, name: &str) -> Result<String> {
        self.next()
            .map(str::to_owned)
            .with_context(|| format!("missing {name}"))
    }
    fn rest(&self) -> &'a str {
        self.0.trim()
    }
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(line: &str) -> Result<Command> {
        let mut words = Words(line);
        let Some(verb) = words.next() else {
            bail!("empty command");
        };
        let command = match verb {
            "push" => {
                let subject = words.required("subject")?;
                let property = words.required("property")?;
                // the object may contain spaces
                let object = words.rest().to_owned();
                if object.is_empty() {
                    bail!("missing object");
                }
                return Ok(Command::Push {
                    subject,
                    property,
                    object,
                });
            }
            "remove" | "rm" => Command::Remove {
                subject: optional(words.next()),
                property: optional(words.next()),
            },
            "subjects" => Command::Subjects {
                property: optional(words.next()),
                value: optional(words.next()),
            },
            "properties" => Command::Properties {
                subject: optional(words.next()),
            },
            "values" => Command::Values {
                subject: optional(words.next()),
                property: optional(words.next()),
            },
            "prefix" => Command::Prefix {
                prefix: words.required("prefix name")?,
                iri: words.required("IRI")?,
            },
            "show" => Command::Show,
            "dump" => Command::Dump,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => bail!("unknown command {verb:?}"),
        };
        if !words.rest().is_empty() {
            bail!("unexpected arguments {:?}", words.rest());
        }
        Ok(command)
    }
}

pub(crate) fn execute<S: KvStore>(
    st: &mut TripleStore<S>,
    command: Command,
    out: &mut impl Write,
) -> Result<()> {
    let lines = match command {
        Command::Push {
            subject,
            property,
            object,
        } => {
            st.push(&subject, &property, &object)?;
            vec![]
        }
        Command::Remove { subject, property } => {
            st.remove(subject.as_deref(), property.as_deref())?;
            vec![]
        }
        Command::Subjects { property, value } => {
            st.get_subjects(property.as_deref(), value.as_deref())?
        }
        Command::Properties { subject } => st.get_properties(subject.as_deref())?,
        Command::Values { subject, property } => {
            st.get_values(subject.as_deref(), property.as_deref())?
        }
        Command::Prefix { prefix, iri } => {
            st.set_mapping(prefix, iri);
            vec![]
        }
        Command::Show => {
            st.show_to(&mut *out)?;
            vec![]
        }
        Command::Dump => st.triples()?.iter().map(ToString::to_string).collect(),
        Command::Help => vec![USAGE.to_owned()],
        Command::Quit => vec![],
    };
    for line in lines {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

pub(crate) fn run<S: KvStore>(
    st: &mut TripleStore<S>,
    input: impl BufRead,
    mut out: impl Write,
) -> Result<()> {
    out.write_all(b"> ")?;
    out.flush()?;
    for line in input.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            match line.parse::<Command>() {
                Ok(Command::Quit) => break,
                Ok(command) => {
                    if let Err(error) = execute(st, command, &mut out) {
                        warn!(target: "repl", %error, "command failed");
                        writeln!(out, "error: {error}")?;
                    }
                }
                Err(error) => writeln!(out, "error: {error}")?,
            }
        }
        out.write_all(b"> ")?;
        out.flush()?;
    }
    Ok(())
}
