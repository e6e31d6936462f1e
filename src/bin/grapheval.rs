use std::process::ExitCode;

fn main() -> ExitCode {
    match grapheval::cli::main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
