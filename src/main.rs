use std::process::ExitCode;

use localfs::output as out;
use localfs::StoreError;

mod app;
mod logging;

fn main() -> ExitCode {
    let args = localfs::cli::parse();
    match app::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<StoreError>() {
            Some(se) => {
                out::print_error(&out::describe_error(se));
                if se.is_canceled() { ExitCode::from(130) } else { ExitCode::FAILURE }
            }
            None => {
                out::print_error(&format!("{e:#}"));
                ExitCode::FAILURE
            }
        },
    }
}
