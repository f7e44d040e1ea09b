//! Fullscreen overlay for dragging out a screen region

use gtk4 as gtk;
use libadwaita as adw;
use log::{debug, error, info, warn};

use gtk::gdk_pixbuf::Pixbuf;
use gtk::glib;
use gtk::{DrawingArea, EventControllerKey, GestureClick, GestureDrag};
use gtk4::prelude::*;
use image::RgbaImage;
use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;

use super::screen::rgba_to_pixbuf;
use super::CaptureSession;
use crate::app::{Action, ShortcutConfig};

const SHADOW_ALPHA: f64 = 100.0 / 255.0;

type Completion = Rc<dyn Fn(Option<PathBuf>)>;

/// Show the capture overlay over `screenshot`.
///
/// `on_finished` runs exactly once: with the saved file on confirm, with
/// `None` when the overlay is dismissed.
pub fn present_capture_window<F>(
    app: &adw::Application,
    screenshot: RgbaImage,
    output: PathBuf,
    shortcuts: ShortcutConfig,
    on_finished: F,
) where
    F: Fn(Option<PathBuf>) + 'static,
{
    let pixbuf = rgba_to_pixbuf(&screenshot);
    let session = Rc::new(RefCell::new(CaptureSession::new(screenshot)));

    let drawing_area = DrawingArea::builder().hexpand(true).vexpand(true).build();
    drawing_area.set_cursor_from_name(Some("crosshair"));
    drawing_area.set_draw_func({
        let session = session.clone();
        move |_, cr, width, _| {
            if let Err(e) = draw_overlay(&session.borrow(), &pixbuf, cr, width) {
                warn!("Failed to paint capture overlay: {}", e);
            }
        }
    });

    let hint = osd_hint(&format!(
        "{}   Right click: Reset",
        shortcuts.hint(&[Action::Confirm, Action::Cancel])
    ));

    let overlay = gtk::Overlay::builder().child(&drawing_area).build();
    overlay.add_overlay(&hint);

    let window = gtk::Window::builder()
        .application(app)
        .title("MathPix+ - Capture")
        .decorated(false)
        .child(&overlay)
        .build();

    let done = Rc::new(Cell::new(false));
    let on_finished: Completion = Rc::new(on_finished);
    let finish: Completion = Rc::new(move |result: Option<PathBuf>| {
        if !done.replace(true) {
            on_finished(result);
        }
    });

    connect_selection_handlers(&session, &drawing_area);
    connect_key_handler(&session, &window, &drawing_area, output, shortcuts, &finish);

    window.connect_close_request({
        let finish = finish.clone();
        move |_| {
            finish(None);
            glib::Propagation::Proceed
        }
    });

    window.fullscreen();
    window.present();
}

/// Key hint floating over a fullscreen window; pointer events go through it
pub fn osd_hint(text: &str) -> gtk::Label {
    let hint = gtk::Label::builder()
        .label(text)
        .halign(gtk::Align::Center)
        .valign(gtk::Align::Start)
        .margin_top(12)
        .build();
    hint.add_css_class("osd");
    hint.set_can_target(false);
    hint
}

fn connect_selection_handlers(session: &Rc<RefCell<CaptureSession>>, drawing_area: &DrawingArea) {
    let drag = GestureDrag::new();

    drag.connect_drag_begin({
        let session = session.clone();
        let drawing_area = drawing_area.clone();
        move |_, x, y| {
            session.borrow_mut().press(x, y);
            drawing_area.queue_draw();
        }
    });

    drag.connect_drag_update({
        let session = session.clone();
        let drawing_area = drawing_area.clone();
        move |gesture, offset_x, offset_y| {
            if let Some((start_x, start_y)) = gesture.start_point() {
                session
                    .borrow_mut()
                    .drag_to(start_x + offset_x, start_y + offset_y);
                drawing_area.queue_draw();
            }
        }
    });

    drag.connect_drag_end({
        let session = session.clone();
        let drawing_area = drawing_area.clone();
        move |gesture, offset_x, offset_y| {
            if let Some((start_x, start_y)) = gesture.start_point() {
                session
                    .borrow_mut()
                    .release(start_x + offset_x, start_y + offset_y);
                drawing_area.queue_draw();
            }
        }
    });

    drawing_area.add_controller(drag);

    let right_click = GestureClick::new();
    right_click.set_button(3);
    right_click.connect_pressed({
        let session = session.clone();
        let drawing_area = drawing_area.clone();
        move |_, _, _, _| {
            session.borrow_mut().reset();
            drawing_area.queue_draw();
        }
    });
    drawing_area.add_controller(right_click);
}

fn connect_key_handler(
    session: &Rc<RefCell<CaptureSession>>,
    window: &gtk::Window,
    drawing_area: &DrawingArea,
    output: PathBuf,
    shortcuts: ShortcutConfig,
    finish: &Completion,
) {
    let keys = EventControllerKey::new();
    keys.connect_key_pressed({
        let session = session.clone();
        let window = window.clone();
        let drawing_area = drawing_area.clone();
        let finish = finish.clone();
        move |_, key, _, modifiers| match shortcuts.get_action(key, modifiers) {
            Some(Action::Cancel) => {
                debug!("Capture cancelled");
                finish(None);
                window.close();
                glib::Propagation::Stop
            }
            Some(Action::Confirm) => {
                let session = session.borrow();
                if session.is_pressed() {
                    debug!("Ignoring confirm while the selection is being dragged");
                    return glib::Propagation::Stop;
                }
                let widget_width = drawing_area.width().max(1) as f64;
                let scale = session.screenshot().width() as f64 / widget_width;

                match session.save(&output, scale) {
                    Ok(true) => finish(Some(output.clone())),
                    Ok(false) => {
                        info!("Capture confirmed without a selection");
                        finish(None);
                    }
                    Err(e) => {
                        error!("Failed to save capture: {}", e);
                        finish(None);
                    }
                }
                drop(session);
                window.close();
                glib::Propagation::Stop
            }
            _ => glib::Propagation::Proceed,
        }
    });
    window.add_controller(keys);
}

fn draw_overlay(
    session: &CaptureSession,
    pixbuf: &Pixbuf,
    cr: &gtk::cairo::Context,
    width: i32,
) -> Result<(), gtk::cairo::Error> {
    let scale = width as f64 / pixbuf.width().max(1) as f64;

    cr.save()?;
    cr.scale(scale, scale);
    cr.set_source_pixbuf(pixbuf, 0.0, 0.0);
    cr.paint()?;
    cr.restore()?;

    cr.set_source_rgba(0.0, 0.0, 0.0, SHADOW_ALPHA);
    cr.paint()?;

    if let Some(sel) = session.selection() {
        let rect = sel.rectangle();
        let rx = rect.x() as f64;
        let ry = rect.y() as f64;
        let rw = rect.width() as f64;
        let rh = rect.height() as f64;

        // Selected region without the shadow
        cr.save()?;
        cr.rectangle(rx, ry, rw, rh);
        cr.clip();
        cr.scale(scale, scale);
        cr.set_source_pixbuf(pixbuf, 0.0, 0.0);
        cr.paint()?;
        cr.restore()?;

        cr.set_source_rgb(0.0, 0.0, 0.0);
        cr.set_line_width(2.0);
        cr.rectangle(rx, ry, rw, rh);
        cr.stroke()?;
    }

    Ok(())
}
