use std::process::ExitCode;

use mapquill::app::MapquillApp;
use mapquill::cli::CliArgs;

fn main() -> ExitCode {
    mapquill::logger::init();

    // Headless mode: any CLI flag routes here before a window exists.
    if CliArgs::is_cli_mode() {
        return mapquill::cli::run();
    }

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 720.0]),
        ..Default::default()
    };
    match eframe::run_native(
        "Mapquill",
        options,
        Box::new(|cc| Box::new(MapquillApp::new(cc))),
    ) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("mapquill: window creation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
