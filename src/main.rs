use bubble_board::gui::frontend::BubbleApp;
use bubble_board::persistence::persist::{FileStore, KeyValueStore, MemoryStore};
use bubble_board::persistence::settings::AppSettings;

use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let settings = AppSettings::load();
    let storage_dir = settings.storage_dir();
    let store: Box<dyn KeyValueStore> = match FileStore::open(&storage_dir) {
        Ok(store) => {
            log::info!("tasks stored in {}", storage_dir.display());
            Box::new(store)
        }
        Err(e) => {
            // keep the board usable, nothing will outlive the session
            log::error!("cannot open storage at {}: {e}; using memory only", storage_dir.display());
            Box::new(MemoryStore::new())
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([480.0, 360.0])
            .with_resizable(true),
        ..Default::default()
    };
    eframe::run_native(
        "Bubble-Board",
        options,
        Box::new(move |cc| Ok(Box::new(BubbleApp::new(cc, settings, store)) as Box<dyn eframe::App>)),
    )
}
