use gtk::{gdk, gio, glib};
use gtk4 as gtk;
use log::{debug, error, info, warn};

use gtk::gdk_pixbuf::Pixbuf;
use gtk4::prelude::*;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use crate::app::{AppState, PreviewImage, ShortcutConfig, Status, TexOutcome};
use crate::canvas::present_canvas_window;
use crate::capture::{capture_primary_monitor, present_capture_window};
use crate::recognition::Recognition;
use crate::ui::dialogs::open_image_dialog;
use crate::ui::{ClipboardManager, TexDelimiter, UiComponents};

pub fn connect_all_handlers(state: &Rc<RefCell<AppState>>, ui: &UiComponents) {
    connect_tex_changed(state, ui);
    connect_copy_handler(state, ui, &ui.raw_btn, TexDelimiter::Raw);
    connect_copy_handler(state, ui, &ui.inline_btn, TexDelimiter::Inline);
    connect_copy_handler(state, ui, &ui.block_btn, TexDelimiter::Block);
    connect_open_handler(state, ui);
    connect_snap_handler(state, ui);
    connect_draw_handler(state, ui);
    connect_drop_handler(state, ui);
}

pub fn connect_tex_changed(state: &Rc<RefCell<AppState>>, ui: &UiComponents) {
    ui.entry.connect_changed({
        let state = state.clone();
        let ui = ui.clone();
        move |entry| {
            let text = entry.text();
            let outcome = state.borrow_mut().apply_tex(&text);
            match outcome {
                TexOutcome::Rendered(preview) => show_preview(&ui, &preview),
                TexOutcome::Cleared | TexOutcome::Failed => {
                    ui.preview.set_paintable(None::<&gdk::Texture>);
                }
                TexOutcome::Invalid => {}
            }
            refresh_status(&state, &ui);
        }
    });
}

fn connect_copy_handler(
    state: &Rc<RefCell<AppState>>,
    ui: &UiComponents,
    button: &gtk::Button,
    delimiter: TexDelimiter,
) {
    button.connect_clicked({
        let state = state.clone();
        let ui = ui.clone();
        move |_| {
            let tex = ui.entry.text();
            ClipboardManager::from_widget(&ui.window).copy_tex(&tex, delimiter);
            state.borrow_mut().status = Status::Copied;
            refresh_status(&state, &ui);
        }
    });
}

fn connect_open_handler(state: &Rc<RefCell<AppState>>, ui: &UiComponents) {
    ui.open_btn.connect_clicked({
        let state = state.clone();
        let ui = ui.clone();
        move |_| {
            let state = state.clone();
            let ui = ui.clone();
            glib::spawn_future_local(async move {
                let dialog = open_image_dialog();
                match dialog.open_future(Some(&ui.window)).await {
                    Ok(file) => match file.path() {
                        Some(path) => recognize_file(&state, &ui, path),
                        None => warn!("Selected file {} is not local", file.uri()),
                    },
                    Err(e) => debug!("Open dialog dismissed: {}", e),
                }
            });
        }
    });
}

fn connect_snap_handler(state: &Rc<RefCell<AppState>>, ui: &UiComponents) {
    ui.snap_btn.connect_clicked({
        let state = state.clone();
        let ui = ui.clone();
        move |_| snap(&state, &ui)
    });
}

/// Hide the main window, grab the screen and let the user pick a region
pub fn snap(state: &Rc<RefCell<AppState>>, ui: &UiComponents) {
    ui.window.set_visible(false);

    let context = glib::MainContext::default();
    while context.pending() {
        context.iteration(false);
    }
    std::thread::sleep(Duration::from_millis(200));

    let screenshot = match capture_primary_monitor() {
        Ok(screenshot) => screenshot,
        Err(e) => {
            error!("Failed to capture screen: {}", e);
            state.borrow_mut().status = Status::CaptureFailed;
            refresh_status(state, ui);
            ui.window.set_visible(true);
            return;
        }
    };

    let output = state.borrow().config.capture_path();
    present_capture_window(&ui.app, screenshot, output, ShortcutConfig::default(), {
        let state = state.clone();
        let ui = ui.clone();
        move |result| {
            ui.window.set_visible(true);
            if let Some(path) = result {
                recognize_file(&state, &ui, path);
            }
        }
    });
}

fn connect_draw_handler(state: &Rc<RefCell<AppState>>, ui: &UiComponents) {
    ui.draw_btn.connect_clicked({
        let state = state.clone();
        let ui = ui.clone();
        move |_| {
            let output = state.borrow().config.canvas_path();
            present_canvas_window(&ui.app, output, ShortcutConfig::default(), {
                let state = state.clone();
                let ui = ui.clone();
                move |result| {
                    if let Some(path) = result {
                        recognize_file(&state, &ui, path);
                    }
                }
            });
        }
    });
}

fn connect_drop_handler(state: &Rc<RefCell<AppState>>, ui: &UiComponents) {
    let drop_target = gtk::DropTarget::new(gdk::FileList::static_type(), gdk::DragAction::COPY);
    drop_target.connect_drop({
        let state = state.clone();
        let ui = ui.clone();
        move |_, value, _, _| {
            let files = match value.get::<gdk::FileList>() {
                Ok(files) => files.files(),
                Err(e) => {
                    warn!("Unexpected drop payload: {}", e);
                    return false;
                }
            };
            match files.first().and_then(|file| file.path()) {
                Some(path) => {
                    info!("Dropped {:?}", path);
                    recognize_file(&state, &ui, path);
                    true
                }
                None => false,
            }
        }
    });
    ui.window.add_controller(drop_target);
}

/// Send `path` to the recognition service without blocking the main loop
pub fn recognize_file(state: &Rc<RefCell<AppState>>, ui: &UiComponents, path: PathBuf) {
    let Some(client) = state.borrow_mut().begin_recognition() else {
        info!("Recognition busy or unavailable, ignoring {:?}", path);
        return;
    };
    info!("Sending {:?} to {}", path, client.endpoint());
    ui.set_sources_sensitive(false);
    refresh_status(state, ui);

    let state = state.clone();
    let ui = ui.clone();
    glib::spawn_future_local(async move {
        let result = gio::spawn_blocking(move || client.recognize(&path)).await;
        state.borrow_mut().finish_recognition();

        match result {
            Ok(Ok(Some(recognition))) => show_recognition(&state, &ui, recognition),
            Ok(Ok(None)) => {}
            Ok(Err(e)) => {
                error!("Recognition failed: {}", e);
                state.borrow_mut().status = Status::RecognitionFailed;
            }
            Err(_) => {
                error!("Recognition task panicked");
                state.borrow_mut().status = Status::RecognitionFailed;
            }
        }

        ui.set_sources_sensitive(true);
        refresh_status(&state, &ui);
    });
}

/// Show the built-in sample without calling the service
pub fn show_startup_sample(state: &Rc<RefCell<AppState>>, ui: &UiComponents) {
    let sample = state.borrow().sample_recognition();
    show_recognition(state, ui, sample);
}

fn show_recognition(state: &Rc<RefCell<AppState>>, ui: &UiComponents, recognition: Recognition) {
    show_source_image(state, ui, &recognition.source);

    let latex = state.borrow_mut().accept_recognition(recognition);
    // Runs the change handler, which re-renders the preview
    ui.entry.set_text(&latex);

    state.borrow_mut().apply_confidence_advisory();
    refresh_status(state, ui);
}

fn show_source_image(state: &Rc<RefCell<AppState>>, ui: &UiComponents, path: &Path) {
    let Some((_, width, height)) = Pixbuf::file_info(path) else {
        warn!("Cannot read source image {:?}", path);
        ui.source.set_paintable(None::<&gdk::Texture>);
        return;
    };
    let Some((display_width, display_height)) =
        state.borrow().config.frame.fit(width as f64, height as f64)
    else {
        warn!("Source image {:?} has no area", path);
        return;
    };

    match load_texture(path, display_width, display_height) {
        Ok(texture) => {
            ui.source.set_paintable(Some(&texture));
            ui.source.set_size_request(display_width, display_height);
        }
        Err(e) => {
            error!("Failed to load source image {:?}: {}", path, e);
            ui.source.set_paintable(None::<&gdk::Texture>);
        }
    }
}

fn show_preview(ui: &UiComponents, preview: &PreviewImage) {
    match load_texture(&preview.path, preview.display_width, preview.display_height) {
        Ok(texture) => {
            ui.preview.set_paintable(Some(&texture));
            ui.preview
                .set_size_request(preview.display_width, preview.display_height);
        }
        Err(e) => {
            error!("Failed to load preview {:?}: {}", preview.path, e);
            ui.preview.set_paintable(None::<&gdk::Texture>);
        }
    }
}

fn load_texture(path: &Path, width: i32, height: i32) -> Result<gdk::Texture, glib::Error> {
    let pixbuf = Pixbuf::from_file_at_scale(path, width, height, false)?;
    Ok(gdk::Texture::for_pixbuf(&pixbuf))
}

fn refresh_status(state: &Rc<RefCell<AppState>>, ui: &UiComponents) {
    ui.status.set_label(state.borrow().status.text());
}
