extern crate rbac_atlas_cli;

use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    match rbac_atlas_cli::run(args) {
        Ok(()) => process::exit(0),
        Err((usage, error)) => {
            eprintln!("{}\n", usage);
            eprintln!("error: {}", error);
            process::exit(1);
        }
    }
}
