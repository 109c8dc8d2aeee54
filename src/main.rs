use std::process::ExitCode;

use hwpx_batch::action::cli::process_args;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    match process_args(args) {
        Ok(report) => {
            log::info!("run finished, output folder: {}", report.output_dir);
            println!(
                "Conversion finished: {} succeeded, {} failed. Output is in {}",
                report.result.succeeded, report.result.failed, report.output_dir
            );
            if report.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
