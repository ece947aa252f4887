//! Clap derive structures and filter parsing for `ovnlb-db-sync`.

use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;
use tracing::warn;

const DEBUG_FLAG: &str = "--debug";

/// ovnlb-db-sync -- converge OVN load balancers with the load-balancing API
#[derive(Debug, Parser)]
#[command(
    name = "ovnlb-db-sync",
    version,
    about = "Sync OVN load balancer state with the load-balancing API",
    long_about = "Reads every load balancer matching the given filters from the \
        load-balancing API and emits the change requests that converge the OVN \
        backend to it, one JSON line per request.\n\n\
        Filters are forwarded verbatim to the list call, e.g.\n\
        ovnlb-db-sync project_id=p1 provider=ovn"
)]
pub struct Cli {
    /// Log at debug level
    #[arg(long)]
    pub debug: bool,

    /// Config file path (defaults to the platform config dir)
    #[arg(long, short = 'c', value_name = "PATH", env = "OVNLB_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,

    /// Load balancer list filters as key=value pairs
    #[arg(
        value_name = "KEY=VALUE",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub filters: Vec<String>,
}

impl Cli {
    /// `--debug` is honored anywhere on the command line, including among
    /// the filters.
    pub fn debug_requested(&self) -> bool {
        self.debug || self.filters.iter().any(|arg| arg == DEBUG_FLAG)
    }
}

/// Turn raw `key=value` arguments into list filters.
///
/// Arguments without `=` are logged and skipped. A repeated key keeps its
/// first position and its last value.
pub fn parse_filters(args: &[String]) -> Vec<(String, String)> {
    let mut filters: Vec<(String, String)> = Vec::new();
    for arg in args.iter().filter(|arg| *arg != DEBUG_FLAG) {
        let Some((key, value)) = arg.split_once('=') else {
            warn!(
                "Unsupported argument '{arg}', add load balancer list filter with \
                 <project_id>=<project1> <key2>=<value2>... etc. Ignore argument {arg}"
            );
            continue;
        };
        match filters.iter_mut().find(|(k, _)| k == key) {
            Some(existing) => value.clone_into(&mut existing.1),
            None => filters.push((key.to_owned(), value.to_owned())),
        }
    }
    filters
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn key_value_pairs_become_filters() {
        let filters = parse_filters(&args(&["project_id=p1", "key2value", "name=a=b"]));
        assert_eq!(
            filters,
            vec![
                ("project_id".to_owned(), "p1".to_owned()),
                ("name".to_owned(), "a=b".to_owned()),
            ]
        );
    }

    #[test]
    fn repeated_key_keeps_last_value() {
        let filters = parse_filters(&args(&["provider=amphora", "project_id=p1", "provider=ovn"]));
        assert_eq!(
            filters,
            vec![
                ("provider".to_owned(), "ovn".to_owned()),
                ("project_id".to_owned(), "p1".to_owned()),
            ]
        );
    }

    #[test]
    fn debug_among_filters_is_a_flag() {
        let cli = Cli::parse_from(["ovnlb-db-sync", "project_id=p1", "--debug"]);
        assert!(cli.debug_requested());
        assert_eq!(parse_filters(&cli.filters).len(), 1);

        let cli = Cli::parse_from(["ovnlb-db-sync", "--debug", "project_id=p1"]);
        assert!(cli.debug);
        assert_eq!(cli.filters, args(&["project_id=p1"]));
    }
}
