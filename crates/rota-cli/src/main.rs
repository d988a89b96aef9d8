use std::process::ExitCode;

fn main() -> ExitCode {
    match rota_core::run(std::env::args_os().collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("rota: {err:#}");
            ExitCode::FAILURE
        }
    }
}
