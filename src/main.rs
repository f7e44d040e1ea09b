mod app;
mod canvas;
mod capture;
mod recognition;
mod tex;
mod ui;

use gtk4::glib;
use libadwaita as adw;

use adw::prelude::*;

const APP_ID: &str = "org.example.TexSnap";

fn main() -> glib::ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app = adw::Application::builder().application_id(APP_ID).build();

    app.connect_activate(ui::build_ui);
    app.run()
}
