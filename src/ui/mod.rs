pub mod clipboard;
pub mod dialogs;
pub mod handlers;

pub use clipboard::{ClipboardManager, TexDelimiter};
pub use handlers::connect_all_handlers;

use gtk4 as gtk;
use libadwaita as adw;
use log::{debug, warn};

use adw::prelude::*;
use gtk::{Align, Orientation};
use std::cell::RefCell;
use std::rc::Rc;

use crate::app::config::ICON_NAME;
use crate::app::{AppConfig, AppState, DisplayFrame};

const WINDOW_WIDTH: i32 = 600;

/// Widgets the handlers need to reach
#[derive(Clone)]
pub struct UiComponents {
    pub app: adw::Application,
    pub window: adw::ApplicationWindow,
    pub preview: gtk::Picture,
    pub source: gtk::Picture,
    pub status: gtk::Label,
    pub entry: gtk::Entry,
    pub raw_btn: gtk::Button,
    pub inline_btn: gtk::Button,
    pub block_btn: gtk::Button,
    pub open_btn: gtk::Button,
    pub snap_btn: gtk::Button,
    pub draw_btn: gtk::Button,
}

impl UiComponents {
    /// Enable or disable the buttons that start a recognition
    pub fn set_sources_sensitive(&self, sensitive: bool) {
        self.open_btn.set_sensitive(sensitive);
        self.snap_btn.set_sensitive(sensitive);
        self.draw_btn.set_sensitive(sensitive);
    }
}

pub fn build_ui(app: &adw::Application) {
    let config = AppConfig::from_env();
    install_icon(&config);
    let frame = config.frame;
    let state = Rc::new(RefCell::new(AppState::new(config)));

    let preview = gtk::Picture::builder()
        .halign(Align::Center)
        .valign(Align::Center)
        .build();
    let source = gtk::Picture::builder()
        .halign(Align::Center)
        .valign(Align::Center)
        .build();

    let status = gtk::Label::builder()
        .halign(Align::Start)
        .wrap(true)
        .build();
    status.add_css_class("warning");

    let entry = gtk::Entry::builder()
        .placeholder_text("Enter Your Tex Here")
        .hexpand(true)
        .build();

    let raw_btn = gtk::Button::with_mnemonic("_Raw");
    let inline_btn = gtk::Button::with_mnemonic("_Inline");
    let block_btn = gtk::Button::with_mnemonic("_Block");
    let open_btn = gtk::Button::with_mnemonic("_Open");
    let snap_btn = gtk::Button::with_mnemonic("_Snap");
    let draw_btn = gtk::Button::with_mnemonic("_Draw");
    snap_btn.add_css_class("suggested-action");

    let content = gtk::Box::builder()
        .orientation(Orientation::Vertical)
        .spacing(8)
        .margin_top(11)
        .margin_bottom(11)
        .margin_start(11)
        .margin_end(11)
        .build();
    content.append(&framed(&preview, frame));
    content.append(&status);
    content.append(&entry);
    content.append(&button_row(&[&raw_btn, &inline_btn, &block_btn]));
    content.append(&framed(&source, frame));
    content.append(&button_row(&[&open_btn, &snap_btn, &draw_btn]));

    let layout = gtk::Box::builder()
        .orientation(Orientation::Vertical)
        .build();
    layout.append(&adw::HeaderBar::new());
    layout.append(&content);

    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("MathPix+")
        .content(&layout)
        .default_width(WINDOW_WIDTH)
        .resizable(false)
        .build();

    let components = UiComponents {
        app: app.clone(),
        window: window.clone(),
        preview,
        source,
        status,
        entry,
        raw_btn,
        inline_btn,
        block_btn,
        open_btn,
        snap_btn,
        draw_btn,
    };

    connect_all_handlers(&state, &components);
    handlers::show_startup_sample(&state, &components);

    window.present();
}

/// Fixed-size frame with `picture` centred in it
fn framed(picture: &gtk::Picture, frame: DisplayFrame) -> gtk::Frame {
    let holder = gtk::Box::builder()
        .orientation(Orientation::Vertical)
        .halign(Align::Center)
        .valign(Align::Center)
        .build();
    holder.append(picture);

    let area = gtk::Box::builder()
        .orientation(Orientation::Vertical)
        .width_request(frame.width)
        .height_request(frame.height)
        .build();
    holder.set_vexpand(true);
    area.append(&holder);

    gtk::Frame::builder().child(&area).build()
}

fn button_row(buttons: &[&gtk::Button]) -> gtk::Box {
    let row = gtk::Box::builder()
        .orientation(Orientation::Horizontal)
        .spacing(6)
        .homogeneous(true)
        .build();
    for button in buttons {
        row.append(*button);
    }
    row
}

fn install_icon(config: &AppConfig) {
    let Some(display) = gtk::gdk::Display::default() else {
        warn!("No display, skipping icon setup");
        return;
    };
    if !config.assets_dir.is_dir() {
        warn!("Assets directory {:?} not found", config.assets_dir);
        return;
    }
    gtk::IconTheme::for_display(&display).add_search_path(&config.assets_dir);
    gtk::Window::set_default_icon_name(ICON_NAME);
    debug!("Using icons from {:?}", config.assets_dir);
}
