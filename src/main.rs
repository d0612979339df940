//! twinscan - duplicate file finder
//!
//! Entry point for the twinscan CLI application.

use clap::Parser;
use twinscan::{
    cli::Cli,
    error::{ExitCode, StructuredError},
    runtime::Runtime,
};

fn main() {
    let cli = Cli::parse();
    let json_errors = cli.json_errors;
    let runtime = Runtime::initialize(cli.verbose, cli.quiet);

    let exit_code = match twinscan::run_app(cli, &runtime) {
        Ok(code) => code,
        Err(err) => {
            let exit_code = ExitCode::for_error(&err);

            if json_errors {
                let structured = StructuredError::new(&err, exit_code);
                match serde_json::to_string(&structured) {
                    Ok(json) => eprintln!("{}", json),
                    Err(_) => eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err),
                }
            } else {
                eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err);
            }
            exit_code
        }
    };

    runtime.shutdown();
    std::process::exit(exit_code.as_i32());
}
