use clap::builder::PossibleValuesParser;
use clap::{Args, Parser, Subcommand};
use parprint_core::domain::AVAILABLE_QUEUES;
use parprint_core::remote::ssh::{DEFAULT_HOST, DEFAULT_PORT};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Print at NUS SoC in parallel", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct DocArgs {
    /// path to folder containing files to print
    #[arg(short = 'f', long)]
    pub local_filepath: PathBuf,

    /// printer selections; printer i gets the i-th slice of every file
    #[arg(
        short,
        long,
        num_args = 1..,
        value_parser = PossibleValuesParser::new(AVAILABLE_QUEUES.iter().copied()),
        default_values = ["psts-sx", "pstsb-sx", "pstsc-sx"]
    )]
    pub printers: Vec<String>,

    /// files to print (with or without .pdf)
    #[arg(value_name = "F", required = true)]
    pub files: Vec<String>,
}

#[derive(Args, Debug)]
pub struct PrintArgs {
    #[command(flatten)]
    pub docs: DocArgs,

    /// subdir of the file folder to store chunked files
    #[arg(short = 'd', long, default_value = "chunks")]
    pub local_dest: String,

    /// path to remote dir to store chunked files
    #[arg(short = 'r', long, default_value = "~/par_temp")]
    pub remote_dest: String,

    #[arg(long, env = "PARPRINT_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// login name; prompted for when absent
    #[arg(short, long, env = "PARPRINT_USER")]
    pub user: Option<String>,

    /// sessions to open up front; files are spread across them
    #[arg(long, default_value_t = 1)]
    pub sessions: usize,

    /// upper bound on --sessions
    #[arg(long, default_value_t = 200)]
    pub session_cap: usize,

    /// handshakes in flight at once
    #[arg(long, default_value_t = 5)]
    pub connect_width: usize,

    /// remote PDF to PostScript converter
    #[arg(long, default_value = "pdf2ps")]
    pub converter: String,

    /// remote print submission command
    #[arg(long, default_value = "lpr")]
    pub print_program: String,

    /// fail the run when a remote step exits non-zero
    #[arg(long)]
    pub strict: bool,

    /// print the remote commands instead of connecting
    #[arg(long, conflicts_with = "local")]
    pub dry_run: bool,

    /// run the remote steps on this machine (already on the print host)
    #[arg(long)]
    pub local: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split files across printers and print them
    Print(PrintArgs),

    /// Show which pages each printer would get, as JSON
    Plan(DocArgs),

    /// List selectable printer queues
    Queues,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn print_defaults() {
        let cli = Cli::try_parse_from(["parprint", "print", "-f", "docs", "lecture1", "lecture2"]).unwrap();
        let Commands::Print(a) = cli.command else {
            panic!("expected print");
        };
        assert_eq!(a.docs.printers, vec!["psts-sx", "pstsb-sx", "pstsc-sx"]);
        assert_eq!(a.docs.files, vec!["lecture1", "lecture2"]);
        assert_eq!(a.local_dest, "chunks");
        assert_eq!(a.remote_dest, "~/par_temp");
        assert_eq!(a.sessions, 1);
        assert_eq!(a.session_cap, 200);
        assert_eq!(a.connect_width, 5);
        assert!(!a.strict && !a.dry_run && !a.local);
    }

    #[test]
    fn printers_from_allow_list_only() {
        let ok = Cli::try_parse_from(["parprint", "plan", "-f", "d", "-p", "psc008-dx", "psc011-nb", "--", "x"]);
        assert!(ok.is_ok());
        let bad = Cli::try_parse_from(["parprint", "plan", "-f", "d", "-p", "lobby-sx", "--", "x"]);
        assert!(bad.is_err());
    }

    #[test]
    fn files_are_required() {
        assert!(Cli::try_parse_from(["parprint", "print", "-f", "docs"]).is_err());
    }

    #[test]
    fn dry_run_and_local_conflict() {
        let r = Cli::try_parse_from(["parprint", "print", "-f", "d", "--dry-run", "--local", "x"]);
        assert!(r.is_err());
    }
}
