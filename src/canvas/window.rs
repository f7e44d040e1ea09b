//! Fullscreen freehand drawing window

use gtk4 as gtk;
use libadwaita as adw;
use log::{debug, error, warn};

use gtk::gdk_pixbuf::Pixbuf;
use gtk::glib;
use gtk::{DrawingArea, EventControllerKey, GestureDrag};
use gtk4::prelude::*;
use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;

use super::Canvas;
use crate::app::{Action, ShortcutConfig};
use crate::capture::overlay::osd_hint;
use crate::capture::screen::rgb_to_pixbuf;

type Completion = Rc<dyn Fn(Option<PathBuf>)>;

/// Raster plus the pixbuf last painted from it
struct CanvasView {
    canvas: Canvas,
    pixbuf: Option<Pixbuf>,
}

impl CanvasView {
    fn pixbuf(&mut self) -> Pixbuf {
        let dirty = self.canvas.take_dirty();
        match self.pixbuf {
            Some(ref pixbuf) if !dirty => pixbuf.clone(),
            _ => {
                let pixbuf = rgb_to_pixbuf(self.canvas.raster());
                self.pixbuf = Some(pixbuf.clone());
                pixbuf
            }
        }
    }
}

/// Show the drawing window.
///
/// `on_finished` runs exactly once: with the saved file on confirm, with
/// `None` when the window is dismissed.
pub fn present_canvas_window<F>(
    app: &adw::Application,
    output: PathBuf,
    shortcuts: ShortcutConfig,
    on_finished: F,
) where
    F: Fn(Option<PathBuf>) + 'static,
{
    let view = Rc::new(RefCell::new(CanvasView {
        canvas: Canvas::new(1, 1),
        pixbuf: None,
    }));

    let drawing_area = DrawingArea::builder().hexpand(true).vexpand(true).build();
    drawing_area.set_cursor_from_name(Some("crosshair"));
    drawing_area.set_draw_func({
        let view = view.clone();
        move |_, cr, width, height| {
            let mut view = view.borrow_mut();
            view.canvas.resize(width.max(1) as u32, height.max(1) as u32);
            let pixbuf = view.pixbuf();
            cr.set_source_pixbuf(&pixbuf, 0.0, 0.0);
            if let Err(e) = cr.paint() {
                warn!("Failed to paint canvas: {}", e);
            }
        }
    });

    let hint = osd_hint(&shortcuts.hint(&[Action::Confirm, Action::Clear, Action::Cancel]));

    let overlay = gtk::Overlay::builder().child(&drawing_area).build();
    overlay.add_overlay(&hint);

    let window = gtk::Window::builder()
        .application(app)
        .title("MathPix+ - Canvas")
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

    connect_stroke_handlers(&view, &drawing_area);
    connect_key_handler(&view, &window, &drawing_area, output, shortcuts, &finish);

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

fn connect_stroke_handlers(view: &Rc<RefCell<CanvasView>>, drawing_area: &DrawingArea) {
    let drag = GestureDrag::new();
    drag.set_button(1);

    drag.connect_drag_begin({
        let view = view.clone();
        let drawing_area = drawing_area.clone();
        move |_, x, y| {
            view.borrow_mut().canvas.begin_stroke(x, y);
            drawing_area.queue_draw();
        }
    });

    drag.connect_drag_update({
        let view = view.clone();
        let drawing_area = drawing_area.clone();
        move |gesture, offset_x, offset_y| {
            if let Some((start_x, start_y)) = gesture.start_point() {
                view.borrow_mut()
                    .canvas
                    .extend_stroke(start_x + offset_x, start_y + offset_y);
                drawing_area.queue_draw();
            }
        }
    });

    drag.connect_drag_end({
        let view = view.clone();
        let drawing_area = drawing_area.clone();
        move |gesture, offset_x, offset_y| {
            if let Some((start_x, start_y)) = gesture.start_point() {
                view.borrow_mut()
                    .canvas
                    .end_stroke(start_x + offset_x, start_y + offset_y);
                drawing_area.queue_draw();
            }
        }
    });

    drawing_area.add_controller(drag);
}

fn connect_key_handler(
    view: &Rc<RefCell<CanvasView>>,
    window: &gtk::Window,
    drawing_area: &DrawingArea,
    output: PathBuf,
    shortcuts: ShortcutConfig,
    finish: &Completion,
) {
    let keys = EventControllerKey::new();
    keys.connect_key_pressed({
        let view = view.clone();
        let window = window.clone();
        let drawing_area = drawing_area.clone();
        let finish = finish.clone();
        move |_, key, _, modifiers| match shortcuts.get_action(key, modifiers) {
            Some(Action::Clear) => {
                debug!("Canvas cleared");
                view.borrow_mut().canvas.clear();
                drawing_area.queue_draw();
                glib::Propagation::Stop
            }
            Some(Action::Cancel) => {
                view.borrow_mut().canvas.clear();
                finish(None);
                window.close();
                glib::Propagation::Stop
            }
            Some(Action::Confirm) => {
                let saved = view.borrow().canvas.save(&output);
                view.borrow_mut().canvas.clear();
                match saved {
                    Ok(()) => finish(Some(output.clone())),
                    Err(e) => {
                        error!("Failed to save canvas: {}", e);
                        finish(None);
                    }
                }
                window.close();
                glib::Propagation::Stop
            }
            None => glib::Propagation::Proceed,
        }
    });
    window.add_controller(keys);
}
