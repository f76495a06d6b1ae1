use clap::{Arg, Command};

pub const SUM_CMD: &str = "sum";

/// Creates the sum CLI Command object
pub fn create_sum_cli() -> Command {
    Command::new(SUM_CMD)
        .about("Sum every counter in a k-mer count dump")
        .arg(
            Arg::new("database")
                .long("database")
                .short('d')
                .help("Path to the k-mer count dump")
                .required(true),
        )
}
